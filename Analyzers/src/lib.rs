//! Polish stage.
//!
//! Two readability rewrites over the recovered tree: promote a local
//! variable's first assignment into its declaration, and swap literal
//! arguments of well-known builtins for the engine's named constants.
//! Nothing here changes behavior of the emitted source.

use task::ast::{AssignOp, NodeId, NodeKind, Storage};
use task::module::Module;
use task::pcode::Opcode;

type ConstantGroup = &'static [(&'static str, i32)];

static GAME: ConstantGroup = &[
  ("GAME_SINGLE_PLAYER", 0),
  ("GAME_NET_COOPERATIVE", 1),
  ("GAME_NET_DEATHMATCH", 2),
  ("GAME_TITLE_MAP", 3),
];

static SIDE: ConstantGroup = &[("SIDE_FRONT", 0), ("SIDE_BACK", 1)];

static TEXTURE: ConstantGroup = &[
  ("TEXTURE_TOP", 0),
  ("TEXTURE_MIDDLE", 1),
  ("TEXTURE_BOTTOM", 2),
];

/// Positional constant groups of `SetLineTexture`; `None` leaves the
/// argument alone.
static SET_LINE_TEXTURE_ARGS: &[Option<ConstantGroup>] =
  &[None, Some(SIDE), Some(TEXTURE), None];

/// Performs the polish stage over every script body.
pub fn analyze(module: &mut Module) {
  for index in 0..module.scripts.len() {
    if let Some(block) = module.scripts[index].block {
      analyze_block(module, block);
    }
  }
}

fn analyze_block(module: &mut Module, block: NodeId) {
  let stmts = match module.ast.get(block) {
    NodeKind::Block(node) => node.stmts.clone(),
    _ => return,
  };
  for (i, &stmt) in stmts.iter().enumerate() {
    if let Some(replacement) = analyze_stmt(module, stmt) {
      if let NodeKind::Block(node) = module.ast.get_mut(block) {
        node.stmts[i] = replacement;
      }
    }
  }
}

fn analyze_stmt(module: &mut Module, stmt: NodeId) -> Option<NodeId> {
  match module.ast.get(stmt) {
    NodeKind::If(node) => {
      let (cond, body, else_body) = (node.cond, node.body, node.else_body);
      analyze_operand(module, cond, true);
      analyze_block(module, body);
      if let Some(else_body) = else_body {
        analyze_block(module, else_body);
      }
      None
    }
    NodeKind::Switch(node) => {
      let (cond, body) = (node.cond, node.body);
      analyze_operand(module, cond, true);
      analyze_block(module, body);
      None
    }
    NodeKind::While(node) | NodeKind::DoWhile(node) => {
      let (cond, body) = (node.cond, node.body);
      analyze_operand(module, cond, true);
      analyze_block(module, body);
      None
    }
    NodeKind::For(node) => {
      let (cond, post, body) = (node.cond, node.post.clone(), node.body);
      analyze_operand(module, cond, true);
      for expr in post {
        analyze_operand(module, expr, true);
      }
      analyze_block(module, body);
      None
    }
    NodeKind::Return(Some(value)) => {
      let value = *value;
      analyze_operand(module, value, true);
      None
    }
    NodeKind::ExprStmt(expr) => {
      let expr = *expr;
      analyze_operand(module, expr, true).replacement
    }
    _ => None,
  }
}

#[derive(Default)]
struct ExprResult {
  constants: Option<ConstantGroup>,
  replacement: Option<NodeId>,
}

/// Walks an expression tree. `reading` is true when the visited operand's
/// value is observed; reads mark their variable as used, which blocks a
/// later first-assignment promotion.
fn analyze_operand(module: &mut Module, node: NodeId, reading: bool) -> ExprResult {
  match module.ast.get(node) {
    NodeKind::Binary(binary) => {
      let (lside, rside) = (binary.lside, binary.rside);
      let lres = analyze_operand(module, lside, true);
      analyze_operand(module, rside, true);
      if let Some(constants) = lres.constants {
        substitute_literal(module, node, rside, constants);
      }
      ExprResult::default()
    }
    NodeKind::Assign(assign) => {
      let (op, lside, rside) = (assign.op, assign.lside, assign.rside);
      analyze_operand(module, rside, true);
      let target = match module.ast.get(lside) {
        NodeKind::VarUsage(id) => Some(*id),
        _ => None,
      };
      match target {
        Some(id) if op == AssignOp::Simple => {
          let var = module.vars.get(id);
          if var.storage == Storage::Local && !var.array && !var.declared && !var.used {
            let var = module.vars.get_mut(id);
            var.initz = Some(rside);
            var.declared = true;
            let replacement = module.ast.push(NodeKind::VarDec(id));
            return ExprResult {
              replacement: Some(replacement),
              ..ExprResult::default()
            };
          }
        }
        Some(id) => {
          // A compound assignment reads its target.
          module.vars.get_mut(id).used = true;
        }
        None => {
          analyze_operand(module, lside, op != AssignOp::Simple);
        }
      }
      ExprResult::default()
    }
    NodeKind::Unary(unary) => {
      let operand = unary.operand;
      analyze_operand(module, operand, true);
      ExprResult::default()
    }
    NodeKind::Inc(inc) => {
      let operand = inc.operand;
      analyze_operand(module, operand, true);
      ExprResult::default()
    }
    NodeKind::Subscript(subscript) => {
      let (lside, index) = (subscript.lside, subscript.index);
      analyze_operand(module, lside, reading);
      analyze_operand(module, index, true);
      ExprResult::default()
    }
    NodeKind::Paren(inner) => {
      let inner = *inner;
      let result = analyze_operand(module, inner, reading);
      ExprResult {
        constants: result.constants,
        replacement: None,
      }
    }
    NodeKind::Call(_) => analyze_call(module, node),
    NodeKind::StrCpyCall(call) => {
      let children = [
        call.array,
        call.array_offset,
        call.array_length,
        call.string,
        call.offset,
      ];
      for child in children {
        analyze_operand(module, child, true);
      }
      ExprResult::default()
    }
    NodeKind::PalTrans(trans) => {
      let mut children = vec![trans.number];
      for range in &trans.ranges {
        children.push(range.begin);
        children.push(range.end);
        use task::ast::PalRangeValue::*;
        match &range.value {
          Colon { begin, end } => children.extend([*begin, *end]),
          Rgb {
            red1,
            green1,
            blue1,
            red2,
            green2,
            blue2,
            ..
          } => children.extend([*red1, *green1, *blue1, *red2, *green2, *blue2]),
          Colorisation { red, green, blue } => children.extend([*red, *green, *blue]),
          Tint {
            amount,
            red,
            green,
            blue,
          } => children.extend([*amount, *red, *green, *blue]),
        }
      }
      for child in children {
        analyze_operand(module, child, true);
      }
      ExprResult::default()
    }
    NodeKind::VarUsage(id) => {
      let id = *id;
      if reading {
        module.vars.get_mut(id).used = true;
      }
      ExprResult::default()
    }
    _ => ExprResult::default(),
  }
}

fn analyze_call(module: &mut Module, node: NodeId) -> ExprResult {
  let (callee, args, item_values) = match module.ast.get(node) {
    NodeKind::Call(call) => (
      call.callee,
      call.args.clone(),
      call
        .format_items
        .as_ref()
        .map(|items| items.iter().map(|item| item.value).collect::<Vec<_>>())
        .unwrap_or_default(),
    ),
    _ => return ExprResult::default(),
  };
  for value in item_values {
    analyze_operand(module, value, true);
  }
  for &arg in &args {
    analyze_operand(module, arg, true);
  }
  let mut result = ExprResult::default();
  if let task::ast::Callee::Ded(index) = callee {
    if Some(index) == ded_index(module, Opcode::SetLineTexture) {
      decompose_args(module, &args, SET_LINE_TEXTURE_ARGS);
    } else if Some(index) == ded_index(module, Opcode::GameType) {
      result.constants = Some(GAME);
    }
  }
  result
}

fn ded_index(module: &Module, opcode: Opcode) -> Option<usize> {
  module.builtins.ded_func(opcode).map(|(index, _)| index)
}

/// Swaps literal arguments for their named constants, group by positional
/// argument.
fn decompose_args(module: &mut Module, args: &[NodeId], groups: &[Option<ConstantGroup>]) {
  for (&arg, group) in args.iter().zip(groups) {
    let group = match group {
      Some(group) => group,
      None => continue,
    };
    let value = match module.ast.get(arg) {
      NodeKind::Literal(value) => *value,
      _ => continue,
    };
    if let Some(&(name, _)) = group.iter().find(|&&(_, v)| v == value) {
      *module.ast.get_mut(arg) = NodeKind::NameUsage(name);
    }
  }
}

/// Replaces a binary's literal right side with a named constant from the
/// group its left side implies.
fn substitute_literal(module: &mut Module, binary: NodeId, rside: NodeId, group: ConstantGroup) {
  let value = match module.ast.get(rside) {
    NodeKind::Literal(value) => *value,
    _ => return,
  };
  if let Some(&(name, _)) = group.iter().find(|&&(_, v)| v == value) {
    let usage = module.ast.push(NodeKind::NameUsage(name));
    if let NodeKind::Binary(node) = module.ast.get_mut(binary) {
      node.rside = usage;
    }
  }
}
