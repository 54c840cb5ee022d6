//! Expression recovery: a second pass of the stack simulation that builds
//! operand trees instead of counting depth.

use task::ast::{
  AssignNode, AssignOp, BinaryNode, BinaryOp, Callee, CallNode, FormatCast, FormatItem,
  FormatItemArray, IncNode, NodeId, NodeKind, PalRange, PalRangeValue, PalTransNode, StrCpyNode,
  SubscriptNode, UnaryNode, UnaryOp, Var,
};
use task::errors::{bail, diag_err, diag_internal_err, TaskResult};
use task::note::Note;
use task::pcode::{Body, Opcode};
use task::{MAX_GLOBAL_VARS, MAX_MAP_VARS, MAX_WORLD_VARS};

use crate::aspec::ASPECS;
use crate::{Context, Recovery};

/// Operator binding strength, matching the source language's C-style
/// grammar. Popping an operand that binds looser than its new parent wraps
/// it in parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
  Bottom,
  Assign,
  LogOr,
  LogAnd,
  BitOr,
  BitXor,
  BitAnd,
  Eq,
  Lt,
  Shift,
  Add,
  Mul,
  Top,
}

#[derive(Clone, Copy)]
struct Operand {
  node: NodeId,
  precedence: Precedence,
}

struct FormatFrame {
  func: Option<usize>,
  items: Vec<FormatItem>,
  args_start: usize,
}

struct PalTransBuilder {
  number: NodeId,
  ranges: Vec<PalRange>,
}

pub(crate) struct ExprRecovery {
  pos: usize,
  end: usize,
  done: bool,
  stack: Vec<Operand>,
  frames: Vec<FormatFrame>,
  trans: Option<PalTransBuilder>,
}

impl<'m> Recovery<'m> {
  /// Recovers the expression spanning `[start, end]` and returns its root.
  pub(crate) fn recover_expr(
    &mut self,
    body: &Body,
    start: usize,
    end: usize,
  ) -> TaskResult<NodeId> {
    let mut er = ExprRecovery {
      pos: start,
      end,
      done: false,
      stack: vec![],
      frames: vec![],
      trans: None,
    };
    self.examine_expr(body, &mut er)?;
    let root = self.pop(&mut er, Precedence::Bottom)?;
    if !er.stack.is_empty() {
      diag_internal_err("operand stack not empty at end of expression");
      return bail();
    }
    Ok(root)
  }

  fn examine_expr(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    while er.pos <= er.end && !er.done {
      self.recover_operand(body, er)?;
    }
    er.done = false;
    Ok(())
  }

  fn push(&mut self, er: &mut ExprRecovery, node: NodeId, precedence: Precedence) {
    er.stack.push(Operand { node, precedence });
  }

  fn pop(&mut self, er: &mut ExprRecovery, parent: Precedence) -> TaskResult<NodeId> {
    let operand = match er.stack.pop() {
      Some(operand) => operand,
      None => {
        diag_internal_err("attempting to pop operand, but stack size is 0");
        return bail();
      }
    };
    if operand.precedence < parent {
      Ok(self.module.ast.push(NodeKind::Paren(operand.node)))
    } else {
      Ok(operand.node)
    }
  }

  fn pop_expr(&mut self, er: &mut ExprRecovery) -> TaskResult<NodeId> {
    self.pop(er, Precedence::Bottom)
  }

  fn recover_operand(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let opcode = body.opcode(er.pos);
    match opcode {
      OrLogical | AndLogical | OrBitwise | EorBitwise | AndBitwise | Eq | Ne | Lt | Le | Gt
      | Ge | LShift | RShift | Add | Subtract | Multiply | Divide | Modulus => {
        self.recover_binary(body, er)
      }
      NegateLogical | NegateBinary => self.recover_unary(body, er),
      UnaryMinus => self.recover_minus(er),
      IncScriptVar | IncMapVar | IncWorldVar | IncGlobalVar | DecScriptVar | DecMapVar
      | DecWorldVar | DecGlobalVar => self.recover_inc(body, er),
      IncScriptArray | IncMapArray | IncWorldArray | IncGlobalArray | DecScriptArray
      | DecMapArray | DecWorldArray | DecGlobalArray => self.recover_array_inc(body, er),
      _ if var_assign_op(opcode).is_some() => self.recover_assign(body, er),
      _ if array_assign_op(opcode).is_some() => self.recover_assign_array(body, er),
      Lspec1 | Lspec2 | Lspec3 | Lspec4 | Lspec5 | Lspec1Direct | Lspec2Direct | Lspec3Direct
      | Lspec4Direct | Lspec5Direct | Lspec1DirectB | Lspec2DirectB | Lspec3DirectB
      | Lspec4DirectB | Lspec5DirectB | Lspec5Result | Lspec5Ex | Lspec5ExResult => {
        self.recover_call_aspec(body, er)
      }
      CallFunc => self.recover_call_ext(body, er),
      Call | CallDiscard => self.recover_call_user(body, er),
      PushNumber | PushByte | Push2Bytes | Push3Bytes | Push4Bytes | Push5Bytes | PushBytes => {
        self.recover_literal(body, er)
      }
      Dup => self.examine_dup(er),
      PushScriptVar | PushMapVar | PushWorldVar | PushGlobalVar => {
        self.examine_pushvar(body, er)
      }
      PushScriptArray | PushMapArray | PushWorldArray | PushGlobalArray => {
        self.examine_pusharray(body, er)
      }
      BeginPrint => self.examine_beginprint(body, er),
      PrintString | PrintNumber | PrintCharacter | PrintFixed | PrintName | PrintLocalized
      | PrintBind | PrintBinary | PrintHex => self.examine_printvalue(body, er),
      PrintMapCharArray | PrintMapChRange | PrintWorldCharArray | PrintWorldChRange
      | PrintGlobalCharArray | PrintGlobalChRange => self.examine_printarray(body, er),
      MoreHudMessage => {
        let size = er.stack.len();
        match er.frames.last_mut() {
          Some(frame) => frame.args_start = size,
          None => {
            diag_internal_err("format-item separator outside a print block");
            return bail();
          }
        }
        er.pos += 1;
        Ok(())
      }
      OptHudMessage => {
        er.pos += 1;
        Ok(())
      }
      EndPrint | EndPrintBold | EndHudMessage | EndHudMessageBold | EndLog | SaveString => {
        self.examine_endprint(body, er)
      }
      StrCpyToMapChRange | StrCpyToWorldChRange | StrCpyToGlobalChRange => {
        self.examine_strcpy(er)
      }
      StartTranslation => self.examine_starttranslation(er),
      TranslationRange1 | TranslationRange2 | TranslationRange3 | TranslationRange4
      | TranslationRange5 => self.examine_translationrange(body, er),
      EndTranslation => self.examine_endtranslation(er),
      TagString => {
        er.pos += 1;
        Ok(())
      }
      Drop => {
        // A stray result drop; the value it discards stays on the operand
        // stack only when it is the whole statement's value.
        if er.stack.len() > 1 && er.frames.is_empty() && er.trans.is_none() {
          self.pop(er, Precedence::Bottom)?;
        }
        er.pos += 1;
        Ok(())
      }
      _ => {
        if self.module.builtins.ded_func(opcode).is_some() {
          if is_ded_direct(opcode) {
            self.recover_call_ded_direct(body, er)
          } else {
            self.recover_call_ded(body, er)
          }
        } else {
          diag_internal_err(format!(
            "unhandled pcode {:?} in expression recovery",
            opcode
          ));
          bail()
        }
      }
    }
  }

  fn recover_binary(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let op = match body.opcode(er.pos) {
      AndLogical => BinaryOp::LogAnd,
      OrLogical => BinaryOp::LogOr,
      OrBitwise => BinaryOp::BitOr,
      EorBitwise => BinaryOp::BitXor,
      AndBitwise => BinaryOp::BitAnd,
      Eq => BinaryOp::Eq,
      Ne => BinaryOp::Neq,
      Lt => BinaryOp::Lt,
      Le => BinaryOp::Lte,
      Gt => BinaryOp::Gt,
      Ge => BinaryOp::Gte,
      LShift => BinaryOp::ShiftL,
      RShift => BinaryOp::ShiftR,
      Add => BinaryOp::Add,
      Subtract => BinaryOp::Sub,
      Multiply => BinaryOp::Mul,
      Divide => BinaryOp::Div,
      Modulus => BinaryOp::Mod,
      _ => unreachable!("not a binary opcode"),
    };
    let precedence = binary_precedence(op);
    let rside = self.pop(er, precedence)?;
    let lside = self.pop(er, precedence)?;
    let node = self
      .module
      .ast
      .push(NodeKind::Binary(BinaryNode { op, lside, rside }));
    self.push(er, node, precedence);
    er.pos += 1;
    Ok(())
  }

  fn recover_unary(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let operand = self.pop(er, Precedence::Top)?;
    let op = match body.opcode(er.pos) {
      Opcode::NegateLogical => UnaryOp::LogicalNot,
      Opcode::NegateBinary => UnaryOp::BitwiseNot,
      _ => unreachable!("not a unary opcode"),
    };
    let node = self.module.ast.push(NodeKind::Unary(UnaryNode { op, operand }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_minus(&mut self, er: &mut ExprRecovery) -> TaskResult<()> {
    let mut operand = self.pop(er, Precedence::Top)?;
    // Keep `- -x` and `- --x` from fusing into a single token.
    let parenthesize = match self.module.ast.get(operand) {
      NodeKind::Unary(unary) => unary.op == UnaryOp::Minus,
      NodeKind::Inc(inc) => inc.decrement && !inc.post,
      _ => false,
    };
    if parenthesize {
      operand = self.module.ast.push(NodeKind::Paren(operand));
    }
    let node = self.module.ast.push(NodeKind::Unary(UnaryNode {
      op: UnaryOp::Minus,
      operand,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_inc(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let decrement = matches!(
      body.opcode(er.pos),
      DecScriptVar | DecMapVar | DecWorldVar | DecGlobalVar
    );
    let operand = self.recover_var(body, er.pos)?;
    let node = self.module.ast.push(NodeKind::Inc(IncNode {
      decrement,
      post: false,
      operand,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    // A pre-increment used as a value rereads the slot right after.
    if matches!(
      body.opcode(er.pos),
      PushScriptVar | PushMapVar | PushWorldVar | PushGlobalVar
    ) {
      er.pos += 1;
    }
    Ok(())
  }

  fn recover_array_inc(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let decrement = matches!(
      body.opcode(er.pos),
      DecScriptArray | DecMapArray | DecWorldArray | DecGlobalArray
    );
    let lside = self.recover_var(body, er.pos)?;
    let index = self.pop_expr(er)?;
    let subscript = self
      .module
      .ast
      .push(NodeKind::Subscript(SubscriptNode { lside, index }));
    let node = self.module.ast.push(NodeKind::Inc(IncNode {
      decrement,
      post: false,
      operand: subscript,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    if matches!(
      body.opcode(er.pos),
      PushScriptArray | PushMapArray | PushWorldArray | PushGlobalArray
    ) {
      er.pos += 1;
    }
    Ok(())
  }

  fn examine_pushvar(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let operand = self.recover_var(body, er.pos)?;
    er.pos += 1;
    match body.opcode(er.pos) {
      IncScriptVar | IncMapVar | IncWorldVar | IncGlobalVar | DecScriptVar | DecMapVar
      | DecWorldVar | DecGlobalVar => {
        let decrement = matches!(
          body.opcode(er.pos),
          DecScriptVar | DecMapVar | DecWorldVar | DecGlobalVar
        );
        let node = self.module.ast.push(NodeKind::Inc(IncNode {
          decrement,
          post: true,
          operand,
        }));
        self.push(er, node, Precedence::Top);
        er.pos += 1;
      }
      _ => self.push(er, operand, Precedence::Top),
    }
    Ok(())
  }

  fn examine_pusharray(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let lside = self.recover_var(body, er.pos)?;
    let index = self.pop_expr(er)?;
    let node = self
      .module
      .ast
      .push(NodeKind::Subscript(SubscriptNode { lside, index }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_assign(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let op = var_assign_op(body.opcode(er.pos)).unwrap_or(AssignOp::Simple);
    let lside = self.recover_var(body, er.pos)?;
    let rside = self.pop(er, Precedence::Assign)?;
    let node = self
      .module
      .ast
      .push(NodeKind::Assign(AssignNode { op, lside, rside }));
    self.push(er, node, Precedence::Assign);
    er.pos += 1;
    Ok(())
  }

  fn recover_assign_array(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let op = array_assign_op(body.opcode(er.pos)).unwrap_or(AssignOp::Simple);
    let rside = self.pop(er, Precedence::Assign)?;
    let var = self.recover_var(body, er.pos)?;
    let index = self.pop_expr(er)?;
    let lside = self
      .module
      .ast
      .push(NodeKind::Subscript(SubscriptNode { lside: var, index }));
    let node = self
      .module
      .ast
      .push(NodeKind::Assign(AssignNode { op, lside, rside }));
    self.push(er, node, Precedence::Assign);
    er.pos += 1;
    Ok(())
  }

  fn recover_call_aspec(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    if matches!(body.pcodes[er.pos].notes.last(), Some(Note::InternFunc(_))) {
      return self.recover_call_intern(body, er);
    }
    let opcode = body.opcode(er.pos);
    let direct = matches!(
      opcode,
      Lspec1Direct
        | Lspec2Direct
        | Lspec3Direct
        | Lspec4Direct
        | Lspec5Direct
        | Lspec1DirectB
        | Lspec2DirectB
        | Lspec3DirectB
        | Lspec4DirectB
        | Lspec5DirectB
    );
    let generic_args = body.generic_args(er.pos);
    let id = generic_args[0];
    let callee = match ASPECS.get(id.max(0) as usize) {
      Some(&name) if !name.is_empty() && id >= 0 => Callee::Aspec(name),
      _ => Callee::UnknownAspec(id),
    };
    let mut args = vec![];
    if direct {
      for &value in &generic_args[1..] {
        args.push(self.module.ast.push(NodeKind::Literal(value)));
      }
    } else {
      let num_args = match opcode {
        Lspec1 | Lspec2 | Lspec3 | Lspec4 | Lspec5 => {
          (opcode as u16 - Lspec1 as u16) as usize + 1
        }
        Lspec5Result | Lspec5Ex | Lspec5ExResult => 5,
        _ => unreachable!("not an action-special opcode"),
      };
      for _ in 0..num_args {
        let arg = self.pop_expr(er)?;
        args.push(arg);
      }
      args.reverse();
    }
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee,
      direct,
      format_items: None,
      args,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    self.module.calls_aspec = true;
    Ok(())
  }

  fn recover_call_ext(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    if matches!(body.pcodes[er.pos].notes.last(), Some(Note::InternFunc(_))) {
      return self.recover_call_intern(body, er);
    }
    let generic_args = body.generic_args(er.pos);
    let (argc, id) = (generic_args[0], generic_args[1]);
    let callee = match self.module.builtins.ext_func(id) {
      Some((index, _)) => Callee::Ext(index),
      None => Callee::UnknownExt(id),
    };
    let mut args = vec![];
    for _ in 0..argc {
      let arg = self.pop_expr(er)?;
      args.push(arg);
    }
    args.reverse();
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee,
      direct: false,
      format_items: None,
      args,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    self.module.calls_ext = true;
    Ok(())
  }

  /// Builds the composite call for a recognized idiom and skips the
  /// instructions it covers.
  fn recover_call_intern(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let (func, exit) = match body.pcodes[er.pos].notes.last() {
      Some(Note::InternFunc(note)) => (note.func, note.exit),
      _ => {
        diag_internal_err("missing internal-function note");
        return bail();
      }
    };
    let second = self.pop_expr(er)?;
    let first = self.pop_expr(er)?;
    // The idiom duplicates the script argument for the wait; the copy goes
    // nowhere in source form.
    self.pop_expr(er)?;
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee: Callee::Intern(func),
      direct: false,
      format_items: None,
      args: vec![first, second],
    }));
    self.push(er, node, Precedence::Top);
    er.pos = exit;
    Ok(())
  }

  fn recover_call_ded(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let opcode = body.opcode(er.pos);
    let (index, max_param) = match self.module.builtins.ded_func(opcode) {
      Some((index, func)) => (index, func.max_param),
      None => unreachable!("dispatch guaranteed a dedicated function"),
    };
    let mut args = vec![];
    for _ in 0..max_param {
      let arg = self.pop_expr(er)?;
      args.push(arg);
    }
    args.reverse();
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee: Callee::Ded(index),
      direct: false,
      format_items: None,
      args,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_call_ded_direct(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let opcode = body.opcode(er.pos);
    let index = match self.module.builtins.ded_func(opcode) {
      Some((index, _)) => index,
      None => unreachable!("dispatch guaranteed a dedicated function"),
    };
    let mut args = vec![];
    for &value in body.generic_args(er.pos) {
      args.push(self.module.ast.push(NodeKind::Literal(value)));
    }
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee: Callee::Ded(index),
      direct: true,
      format_items: None,
      args,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_call_user(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let index = body.generic_args(er.pos)[0] as u32;
    let (position, max_param) = match self.module.find_func(index) {
      Some(position) => (position, self.module.funcs[position].max_param),
      None => {
        diag_internal_err(format!("call of unknown function {}", index));
        return bail();
      }
    };
    let mut args = vec![];
    for _ in 0..max_param {
      let arg = self.pop(er, Precedence::Top)?;
      args.push(arg);
    }
    args.reverse();
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee: Callee::User(position),
      direct: false,
      format_items: None,
      args,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn recover_literal(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let args = body.generic_args(er.pos);
    // The first argument of a byte-string push is its count.
    let args = if body.opcode(er.pos) == Opcode::PushBytes {
      &args[1..]
    } else {
      args
    };
    for &value in args {
      let node = self.module.ast.push(NodeKind::Literal(value));
      self.push(er, node, Precedence::Top);
    }
    er.pos += 1;
    Ok(())
  }

  fn examine_dup(&mut self, er: &mut ExprRecovery) -> TaskResult<()> {
    let top = match er.stack.last() {
      Some(&top) => top,
      None => {
        diag_internal_err("duplicating an operand, but stack size is 0");
        return bail();
      }
    };
    er.stack.push(top);
    er.pos += 1;
    Ok(())
  }

  fn examine_beginprint(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    er.frames.push(FormatFrame {
      func: None,
      items: vec![],
      args_start: 0,
    });
    er.pos += 1;
    self.examine_expr(body, er)?;
    let frame = er.frames.pop().unwrap();
    let func = match frame.func {
      Some(func) => func,
      None => {
        diag_internal_err("print block without a terminator");
        return bail();
      }
    };
    let num_regular = er.stack.len().saturating_sub(frame.args_start);
    let mut args = vec![];
    for _ in 0..num_regular {
      let arg = self.pop_expr(er)?;
      args.push(arg);
    }
    args.reverse();
    let node = self.module.ast.push(NodeKind::Call(CallNode {
      callee: Callee::Format(func),
      direct: false,
      format_items: Some(frame.items),
      args,
    }));
    self.push(er, node, Precedence::Top);
    Ok(())
  }

  fn examine_printvalue(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let value = self.pop_expr(er)?;
    let cast = match body.opcode(er.pos) {
      PrintNumber => FormatCast::Decimal,
      PrintString => FormatCast::String,
      PrintCharacter => FormatCast::Char,
      PrintFixed => FormatCast::Fixed,
      PrintName => FormatCast::Name,
      PrintLocalized => FormatCast::LocalString,
      PrintBind => FormatCast::Key,
      PrintBinary => FormatCast::Binary,
      PrintHex => FormatCast::Hex,
      _ => unreachable!("not a print opcode"),
    };
    match er.frames.last_mut() {
      Some(frame) => frame.items.push(FormatItem {
        cast,
        value,
        extra: None,
      }),
      None => {
        diag_internal_err("format item outside a print block");
        return bail();
      }
    }
    er.pos += 1;
    Ok(())
  }

  fn examine_printarray(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let opcode = body.opcode(er.pos);
    let extra = match opcode {
      PrintMapChRange | PrintWorldChRange | PrintGlobalChRange => {
        let length = self.pop_expr(er)?;
        let offset = self.pop_expr(er)?;
        Some(FormatItemArray { offset, length })
      }
      _ => None,
    };
    let array_node = self.pop_expr(er)?;
    let sub_idx = self.pop_expr(er)?;
    let index = match self.module.ast.get(array_node) {
      NodeKind::Literal(value) => *value as u32,
      _ => {
        diag_err("printed array is not identified by a literal");
        return bail();
      }
    };
    let var = match opcode {
      PrintMapCharArray | PrintMapChRange => {
        self.materialize_table_var(TableScope::Map, index)?
      }
      PrintWorldCharArray | PrintWorldChRange => {
        self.materialize_table_var(TableScope::WorldArray, index)?
      }
      PrintGlobalCharArray | PrintGlobalChRange => {
        self.materialize_table_var(TableScope::GlobalArray, index)?
      }
      _ => unreachable!("not a print-array opcode"),
    };
    let mut root = self.module.ast.push(NodeKind::VarUsage(var));
    let zero_index = matches!(self.module.ast.get(sub_idx), NodeKind::Literal(0));
    if !zero_index {
      root = self.module.ast.push(NodeKind::Subscript(SubscriptNode {
        lside: root,
        index: sub_idx,
      }));
    }
    match er.frames.last_mut() {
      Some(frame) => frame.items.push(FormatItem {
        cast: FormatCast::Array,
        value: root,
        extra,
      }),
      None => {
        diag_internal_err("format item outside a print block");
        return bail();
      }
    }
    er.pos += 1;
    Ok(())
  }

  fn examine_endprint(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    let opcode = body.opcode(er.pos);
    let func = match self.module.builtins.format_func(opcode) {
      Some((index, _)) => index,
      None => {
        diag_internal_err(format!("no format function for terminator {:?}", opcode));
        return bail();
      }
    };
    match er.frames.last_mut() {
      Some(frame) => frame.func = Some(func),
      None => {
        diag_internal_err("print terminator outside a print block");
        return bail();
      }
    }
    er.done = true;
    er.pos += 1;
    Ok(())
  }

  fn examine_strcpy(&mut self, er: &mut ExprRecovery) -> TaskResult<()> {
    let offset = self.pop_expr(er)?;
    let string = self.pop_expr(er)?;
    let array_length = self.pop_expr(er)?;
    let array_offset = self.pop_expr(er)?;
    let array = self.pop_expr(er)?;
    self.pop_expr(er)?;
    let node = self.module.ast.push(NodeKind::StrCpyCall(StrCpyNode {
      array,
      array_offset,
      array_length,
      string,
      offset,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    Ok(())
  }

  fn examine_starttranslation(&mut self, er: &mut ExprRecovery) -> TaskResult<()> {
    if er.trans.is_some() {
      diag_internal_err("nested palette translation");
      return bail();
    }
    let number = self.pop_expr(er)?;
    er.trans = Some(PalTransBuilder {
      number,
      ranges: vec![],
    });
    er.pos += 1;
    Ok(())
  }

  fn examine_translationrange(&mut self, body: &Body, er: &mut ExprRecovery) -> TaskResult<()> {
    use Opcode::*;
    let value = match body.opcode(er.pos) {
      TranslationRange1 => {
        let end = self.pop_expr(er)?;
        let begin = self.pop_expr(er)?;
        PalRangeValue::Colon { begin, end }
      }
      TranslationRange2 | TranslationRange3 => {
        let saturated = body.opcode(er.pos) == TranslationRange3;
        let blue2 = self.pop_expr(er)?;
        let green2 = self.pop_expr(er)?;
        let red2 = self.pop_expr(er)?;
        let blue1 = self.pop_expr(er)?;
        let green1 = self.pop_expr(er)?;
        let red1 = self.pop_expr(er)?;
        PalRangeValue::Rgb {
          saturated,
          red1,
          green1,
          blue1,
          red2,
          green2,
          blue2,
        }
      }
      TranslationRange4 => {
        let blue = self.pop_expr(er)?;
        let green = self.pop_expr(er)?;
        let red = self.pop_expr(er)?;
        PalRangeValue::Colorisation { red, green, blue }
      }
      TranslationRange5 => {
        let blue = self.pop_expr(er)?;
        let green = self.pop_expr(er)?;
        let red = self.pop_expr(er)?;
        let amount = self.pop_expr(er)?;
        PalRangeValue::Tint {
          amount,
          red,
          green,
          blue,
        }
      }
      _ => unreachable!("not a translation-range opcode"),
    };
    let end = self.pop_expr(er)?;
    let begin = self.pop_expr(er)?;
    match &mut er.trans {
      Some(trans) => trans.ranges.push(PalRange { begin, end, value }),
      None => {
        diag_internal_err("translation range outside a translation block");
        return bail();
      }
    }
    er.pos += 1;
    Ok(())
  }

  fn examine_endtranslation(&mut self, er: &mut ExprRecovery) -> TaskResult<()> {
    let trans = match er.trans.take() {
      Some(trans) => trans,
      None => {
        diag_internal_err("translation terminator outside a translation block");
        return bail();
      }
    };
    let node = self.module.ast.push(NodeKind::PalTrans(PalTransNode {
      number: trans.number,
      ranges: trans.ranges,
    }));
    self.push(er, node, Precedence::Top);
    er.pos += 1;
    er.done = true;
    Ok(())
  }

  /// Resolves the variable slot an instruction addresses, creating the
  /// variable on first use.
  fn recover_var(&mut self, body: &Body, pos: usize) -> TaskResult<NodeId> {
    let opcode = body.opcode(pos);
    let index = body.generic_args(pos)[0] as u32;
    let scope = match var_scope(opcode) {
      Some(scope) => scope,
      None => {
        diag_internal_err(format!("opcode {:?} does not address a variable", opcode));
        return bail();
      }
    };
    let id = match scope {
      VarScope::ScriptVar => self.materialize_local_var(index, false)?,
      VarScope::ScriptArray => self.materialize_local_var(index, true)?,
      VarScope::MapVar | VarScope::MapArray => {
        self.materialize_table_var(TableScope::Map, index)?
      }
      VarScope::WorldVar => self.materialize_table_var(TableScope::World, index)?,
      VarScope::WorldArray => self.materialize_table_var(TableScope::WorldArray, index)?,
      VarScope::GlobalVar => self.materialize_table_var(TableScope::Global, index)?,
      VarScope::GlobalArray => self.materialize_table_var(TableScope::GlobalArray, index)?,
    };
    Ok(self.module.ast.push(NodeKind::VarUsage(id)))
  }

  fn materialize_local_var(&mut self, index: u32, array: bool) -> TaskResult<task::ast::VarId> {
    let (slots, what) = match (&self.context, array) {
      (Context::Script(i), false) => (&mut self.module.scripts[*i].vars, "script variable"),
      (Context::Script(i), true) => (&mut self.module.scripts[*i].arrays, "script array"),
      (Context::Func(i), false) => (&mut self.module.funcs[*i].vars, "function variable"),
      (Context::Func(i), true) => (&mut self.module.funcs[*i].arrays, "function array"),
    };
    if index as usize >= slots.len() {
      diag_err(format!("invalid {}: {}", what, index));
      return bail();
    }
    if let Some(id) = slots[index as usize] {
      return Ok(id);
    }
    let mut var = Var::new();
    var.index = index;
    var.array = array;
    let id = self.module.vars.push(var);
    let slots = match (&self.context, array) {
      (Context::Script(i), false) => &mut self.module.scripts[*i].vars,
      (Context::Script(i), true) => &mut self.module.scripts[*i].arrays,
      (Context::Func(i), false) => &mut self.module.funcs[*i].vars,
      (Context::Func(i), true) => &mut self.module.funcs[*i].arrays,
    };
    slots[index as usize] = Some(id);
    Ok(id)
  }

  fn materialize_table_var(
    &mut self,
    scope: TableScope,
    index: u32,
  ) -> TaskResult<task::ast::VarId> {
    use task::ast::Storage;
    let (capacity, what) = match scope {
      TableScope::Map => (MAX_MAP_VARS, "map variable"),
      TableScope::World => (MAX_WORLD_VARS, "world variable"),
      TableScope::WorldArray => (MAX_WORLD_VARS, "world array"),
      TableScope::Global => (MAX_GLOBAL_VARS, "global variable"),
      TableScope::GlobalArray => (MAX_GLOBAL_VARS, "global array"),
    };
    if index as usize >= capacity {
      diag_err(format!("invalid {}: {}", what, index));
      return bail();
    }
    let slot = match scope {
      TableScope::Map => &mut self.module.map_vars[index as usize],
      TableScope::World => &mut self.module.world_vars[index as usize],
      TableScope::WorldArray => &mut self.module.world_arrays[index as usize],
      TableScope::Global => &mut self.module.global_vars[index as usize],
      TableScope::GlobalArray => &mut self.module.global_arrays[index as usize],
    };
    if let Some(id) = *slot {
      return Ok(id);
    }
    let mut var = Var::new();
    var.index = index;
    match scope {
      TableScope::Map => var.storage = Storage::Map,
      TableScope::World => var.storage = Storage::World,
      TableScope::WorldArray => {
        var.storage = Storage::World;
        var.array = true;
      }
      TableScope::Global => var.storage = Storage::Global,
      TableScope::GlobalArray => {
        var.storage = Storage::Global;
        var.array = true;
      }
    }
    let id = self.module.vars.push(var);
    let slot = match scope {
      TableScope::Map => &mut self.module.map_vars[index as usize],
      TableScope::World => &mut self.module.world_vars[index as usize],
      TableScope::WorldArray => &mut self.module.world_arrays[index as usize],
      TableScope::Global => &mut self.module.global_vars[index as usize],
      TableScope::GlobalArray => &mut self.module.global_arrays[index as usize],
    };
    *slot = Some(id);
    Ok(id)
  }
}

#[derive(Clone, Copy)]
enum TableScope {
  Map,
  World,
  WorldArray,
  Global,
  GlobalArray,
}

enum VarScope {
  ScriptVar,
  ScriptArray,
  MapVar,
  MapArray,
  WorldVar,
  WorldArray,
  GlobalVar,
  GlobalArray,
}

fn var_scope(opcode: Opcode) -> Option<VarScope> {
  use Opcode::*;
  Some(match opcode {
    PushScriptVar | AssignScriptVar | AddScriptVar | SubScriptVar | MulScriptVar
    | DivScriptVar | ModScriptVar | AndScriptVar | EorScriptVar | OrScriptVar | LsScriptVar
    | RsScriptVar | IncScriptVar | DecScriptVar => VarScope::ScriptVar,
    PushScriptArray | AssignScriptArray | AddScriptArray | SubScriptArray | MulScriptArray
    | DivScriptArray | ModScriptArray | AndScriptArray | EorScriptArray | OrScriptArray
    | LsScriptArray | RsScriptArray | IncScriptArray | DecScriptArray => VarScope::ScriptArray,
    PushMapVar | AssignMapVar | AddMapVar | SubMapVar | MulMapVar | DivMapVar | ModMapVar
    | AndMapVar | EorMapVar | OrMapVar | LsMapVar | RsMapVar | IncMapVar | DecMapVar => {
      VarScope::MapVar
    }
    PushMapArray | AssignMapArray | AddMapArray | SubMapArray | MulMapArray | DivMapArray
    | ModMapArray | AndMapArray | EorMapArray | OrMapArray | LsMapArray | RsMapArray
    | IncMapArray | DecMapArray => VarScope::MapArray,
    PushWorldVar | AssignWorldVar | AddWorldVar | SubWorldVar | MulWorldVar | DivWorldVar
    | ModWorldVar | AndWorldVar | EorWorldVar | OrWorldVar | LsWorldVar | RsWorldVar
    | IncWorldVar | DecWorldVar => VarScope::WorldVar,
    PushWorldArray | AssignWorldArray | AddWorldArray | SubWorldArray | MulWorldArray
    | DivWorldArray | ModWorldArray | AndWorldArray | EorWorldArray | OrWorldArray
    | LsWorldArray | RsWorldArray | IncWorldArray | DecWorldArray => VarScope::WorldArray,
    PushGlobalVar | AssignGlobalVar | AddGlobalVar | SubGlobalVar | MulGlobalVar
    | DivGlobalVar | ModGlobalVar | AndGlobalVar | EorGlobalVar | OrGlobalVar | LsGlobalVar
    | RsGlobalVar | IncGlobalVar | DecGlobalVar => VarScope::GlobalVar,
    PushGlobalArray | AssignGlobalArray | AddGlobalArray | SubGlobalArray | MulGlobalArray
    | DivGlobalArray | ModGlobalArray | AndGlobalArray | EorGlobalArray | OrGlobalArray
    | LsGlobalArray | RsGlobalArray | IncGlobalArray | DecGlobalArray => VarScope::GlobalArray,
    _ => return None,
  })
}

fn var_assign_op(opcode: Opcode) -> Option<AssignOp> {
  use Opcode::*;
  Some(match opcode {
    AssignScriptVar | AssignMapVar | AssignWorldVar | AssignGlobalVar => AssignOp::Simple,
    AddScriptVar | AddMapVar | AddWorldVar | AddGlobalVar => AssignOp::Add,
    SubScriptVar | SubMapVar | SubWorldVar | SubGlobalVar => AssignOp::Sub,
    MulScriptVar | MulMapVar | MulWorldVar | MulGlobalVar => AssignOp::Mul,
    DivScriptVar | DivMapVar | DivWorldVar | DivGlobalVar => AssignOp::Div,
    ModScriptVar | ModMapVar | ModWorldVar | ModGlobalVar => AssignOp::Mod,
    AndScriptVar | AndMapVar | AndWorldVar | AndGlobalVar => AssignOp::BitAnd,
    EorScriptVar | EorMapVar | EorWorldVar | EorGlobalVar => AssignOp::BitXor,
    OrScriptVar | OrMapVar | OrWorldVar | OrGlobalVar => AssignOp::BitOr,
    LsScriptVar | LsMapVar | LsWorldVar | LsGlobalVar => AssignOp::ShiftL,
    RsScriptVar | RsMapVar | RsWorldVar | RsGlobalVar => AssignOp::ShiftR,
    _ => return None,
  })
}

fn array_assign_op(opcode: Opcode) -> Option<AssignOp> {
  use Opcode::*;
  Some(match opcode {
    AssignScriptArray | AssignMapArray | AssignWorldArray | AssignGlobalArray => {
      AssignOp::Simple
    }
    AddScriptArray | AddMapArray | AddWorldArray | AddGlobalArray => AssignOp::Add,
    SubScriptArray | SubMapArray | SubWorldArray | SubGlobalArray => AssignOp::Sub,
    MulScriptArray | MulMapArray | MulWorldArray | MulGlobalArray => AssignOp::Mul,
    DivScriptArray | DivMapArray | DivWorldArray | DivGlobalArray => AssignOp::Div,
    ModScriptArray | ModMapArray | ModWorldArray | ModGlobalArray => AssignOp::Mod,
    AndScriptArray | AndMapArray | AndWorldArray | AndGlobalArray => AssignOp::BitAnd,
    EorScriptArray | EorMapArray | EorWorldArray | EorGlobalArray => AssignOp::BitXor,
    OrScriptArray | OrMapArray | OrWorldArray | OrGlobalArray => AssignOp::BitOr,
    LsScriptArray | LsMapArray | LsWorldArray | LsGlobalArray => AssignOp::ShiftL,
    RsScriptArray | RsMapArray | RsWorldArray | RsGlobalArray => AssignOp::ShiftR,
    _ => return None,
  })
}

fn binary_precedence(op: BinaryOp) -> Precedence {
  match op {
    BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => Precedence::Mul,
    BinaryOp::Add | BinaryOp::Sub => Precedence::Add,
    BinaryOp::ShiftL | BinaryOp::ShiftR => Precedence::Shift,
    BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => Precedence::Lt,
    BinaryOp::Eq | BinaryOp::Neq => Precedence::Eq,
    BinaryOp::BitAnd => Precedence::BitAnd,
    BinaryOp::BitXor => Precedence::BitXor,
    BinaryOp::BitOr => Precedence::BitOr,
    BinaryOp::LogAnd => Precedence::LogAnd,
    BinaryOp::LogOr => Precedence::LogOr,
  }
}

fn is_ded_direct(opcode: Opcode) -> bool {
  use Opcode::*;
  matches!(
    opcode,
    DelayDirect
      | DelayDirectB
      | RandomDirect
      | RandomDirectB
      | ThingCountDirect
      | TagWaitDirect
      | PolyWaitDirect
      | ChangeFloorDirect
      | ChangeCeilingDirect
      | ScriptWaitDirect
      | ConsoleCommandDirect
      | SetGravityDirect
      | SetAirControlDirect
      | GiveInventoryDirect
      | TakeInventoryDirect
      | CheckInventoryDirect
      | SpawnDirect
      | SpawnSpotDirect
      | SetMusicDirect
      | LocalSetMusicDirect
      | SetFontDirect
  )
}
