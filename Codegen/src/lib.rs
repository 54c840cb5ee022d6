//! Publishing stage: prints the recovered tree back as source text.
//!
//! The emitter never mutates a node; subtrees shared through `DUP` handling
//! simply print twice.

use std::fmt::Write as FmtWrite;

use task::ast::{
  AssignOp, BinaryOp, Callee, FormatCast, NodeId, NodeKind, PalRangeValue, Storage, UnaryOp,
  Var, VarId,
};
use task::module::{script_flag, script_type, Module, ObjectRef};
use task::pcode::PcodeArgs;

/// Amount of spaces per indentation level.
const INDENT_WIDTH: usize = 3;

pub struct Codegen<'m> {
  module: &'m Module,
  indent_level: usize,
  got_newline: bool,
  out: String,
}

/// Emits the whole module as source text.
pub fn publish(module: &Module) -> String {
  let mut codegen = Codegen {
    module,
    indent_level: 0,
    got_newline: false,
    out: String::new(),
  };
  codegen.write_dircs();
  codegen.write_global_vars();
  codegen.write_world_vars();
  codegen.write_map_vars();
  codegen.write_objects();
  codegen.out
}

impl<'m> Codegen<'m> {
  fn write(&mut self, text: impl AsRef<str>) {
    if self.got_newline {
      for _ in 0..self.indent_level * INDENT_WIDTH {
        self.out.push(' ');
      }
      self.got_newline = false;
    }
    self.out.push_str(text.as_ref());
  }

  fn write_nl(&mut self) {
    self.out.push('\n');
    self.got_newline = true;
  }

  fn indent(&mut self) {
    self.indent_level += 1;
  }

  fn dedent(&mut self) {
    self.indent_level -= 1;
  }

  fn write_dircs(&mut self) {
    if self.module.importable {
      self.write(format!("#library \"{}\"", self.module.library_name));
      self.write_nl();
      self.write_nl();
    }
    if !self.module.compact {
      self.write("#nocompact");
      self.write_nl();
    }
    if !self.module.wadauthor {
      // A library has #nowadauthor implicitly enabled, and a module with no
      // scripts has nothing for the directive to affect.
      if !self.module.importable && !self.module.scripts.is_empty() {
        self.write("#nowadauthor");
        self.write_nl();
      }
    }
    if self.module.encrypt_str {
      self.write("#encryptstrings");
      self.write_nl();
      self.write_nl();
    }
    if self.module.uses_zcommon_file() {
      self.write("#include \"zcommon.acs\"");
      self.write_nl();
      self.write_nl();
    }
    for import in &self.module.imports {
      self.write(format!("#import \"{}.acs\"", import));
      self.write_nl();
    }
  }

  fn write_global_vars(&mut self) {
    for slot in self.module.global_vars.iter().flatten() {
      self.visit_var_dec(*slot);
    }
    for slot in self.module.global_arrays.iter().flatten() {
      self.visit_var_dec(*slot);
    }
    self.write_nl();
  }

  fn write_world_vars(&mut self) {
    for slot in self.module.world_vars.iter().flatten() {
      self.visit_var_dec(*slot);
    }
    for slot in self.module.world_arrays.iter().flatten() {
      self.visit_var_dec(*slot);
    }
    self.write_nl();
  }

  fn write_map_vars(&mut self) {
    let mut any = false;
    for slot in self.module.map_vars.iter().flatten() {
      self.visit_var_dec(*slot);
      any = true;
    }
    if any {
      self.write_nl();
    }
  }

  fn visit_var_dec(&mut self, id: VarId) {
    let var = self.module.vars.get(id);
    if var.imported {
      self.write("// ");
    }
    match var.storage {
      Storage::World => self.write("world "),
      Storage::Global => self.write("global "),
      _ => {}
    }
    match var.spec {
      task::ast::Spec::Str => self.write("str"),
      _ => self.write("int"),
    }
    self.write(" ");
    if matches!(var.storage, Storage::World | Storage::Global) {
      self.write(format!("{}:", var.index));
    }
    self.write_var_name(var);
    if var.array {
      if var.dim_length > 0 {
        self.write(format!("[ {} ]", var.dim_length));
      } else {
        self.write("[]");
      }
    }
    if let Some(initz) = var.initz {
      self.write(" = ");
      self.emit_operand(initz);
    } else if !var.values.is_empty() {
      self.write(" = { ");
      let mut index = 0;
      for (i, value) in var.values.iter().enumerate() {
        while index < value.index {
          self.write_value(value.string, 0);
          self.write(", ");
          index += 1;
        }
        self.write_value(value.string, value.value);
        index += 1;
        if i + 1 < var.values.len() {
          self.write(", ");
        }
      }
      self.write(" }");
    }
    self.write(";");
    self.write_nl();
  }

  fn write_value(&mut self, string: bool, value: i32) {
    if string {
      match self.module.lookup_string(value as u32) {
        Some(text) => {
          let text = text.to_string();
          self.write(format!("\"{}\"", text));
        }
        None => self.write(format!("{}", value)),
      }
    } else {
      self.write(format!("{}", value));
    }
  }

  fn write_objects(&mut self) {
    for (i, &object) in self.module.objects.iter().enumerate() {
      match object {
        ObjectRef::Script(index) => self.show_script(index),
        ObjectRef::Func(index) => self.write_func(index),
      }
      if i + 1 < self.module.objects.len() {
        self.write_nl();
      }
    }
  }

  fn show_script(&mut self, index: usize) {
    let script = &self.module.scripts[index];
    self.write("script ");
    if script.named_script {
      self.write(format!("\"{}\" ", script.name));
    } else {
      self.write(format!("{} ", script.number));
    }
    if script.num_param > 0 {
      self.write("( ");
      for i in 0..script.num_param as usize {
        self.write("int ");
        match script.vars.get(i).copied().flatten() {
          Some(id) => {
            let var = self.module.vars.get(id);
            self.write_var_name(var);
          }
          None => self.write(format!("var{}", i)),
        }
        if i + 1 < script.num_param as usize {
          self.write(", ");
        }
      }
      self.write(" ) ");
    } else if script.script_type == script_type::CLOSED {
      self.write("( void ) ");
    }
    let keyword = match script.script_type {
      script_type::OPEN => Some("open"),
      script_type::ENTER => Some("enter"),
      script_type::DEATH => Some("death"),
      script_type::DISCONNECT => Some("disconnect"),
      script_type::EVENT => Some("event"),
      _ => None,
    };
    if let Some(keyword) = keyword {
      self.write(format!("{} ", keyword));
    }
    if script.flags & script_flag::NET != 0 {
      self.write("net ");
    }
    if script.flags & script_flag::CLIENTSIDE != 0 {
      self.write("clientside ");
    }
    if let Some(block) = script.block {
      self.emit_block(block);
    }
  }

  fn write_func(&mut self, index: usize) {
    let func = &self.module.funcs[index];
    self.write("function");
    self.write(if func.returns_value { " int" } else { " void" });
    self.write(" ");
    if !func.name.is_empty() {
      self.write(func.name.clone());
    } else {
      self.write(format!("Func{}", func.index));
    }
    self.write("( ");
    if func.max_param > 0 {
      for i in 0..func.max_param {
        self.write(format!("int var{}", i));
        if i + 1 < func.max_param {
          self.write(", ");
        }
      }
    } else {
      self.write("void");
    }
    self.write(" )");
    self.write(" ");
    if let Some(block) = func.block {
      self.emit_block(block);
    }
  }

  fn emit_block(&mut self, block: NodeId) {
    let stmts = match self.module.ast.get(block) {
      NodeKind::Block(node) => node.stmts.clone(),
      _ => return,
    };
    if stmts.is_empty() {
      self.write("{ }");
      self.write_nl();
      return;
    }
    self.write("{");
    self.indent();
    self.write_nl();
    for stmt in stmts {
      self.visit_stmt(stmt);
    }
    self.dedent();
    self.write("}");
    self.write_nl();
  }

  fn visit_stmt(&mut self, stmt: NodeId) {
    match self.module.ast.get(stmt) {
      NodeKind::VarDec(id) => self.visit_var_dec(*id),
      NodeKind::If(_) => self.emit_if(stmt),
      NodeKind::Switch(node) => {
        let (cond, body) = (node.cond, node.body);
        self.write("switch ");
        self.emit_cond(cond);
        self.emit_block(body);
      }
      NodeKind::CaseLabel(node) => {
        let (value, default_case) = (node.value, node.default_case);
        self.dedent();
        if default_case {
          self.write("default:");
        } else {
          self.write(format!("case {}:", value));
        }
        self.write_nl();
        self.indent();
      }
      NodeKind::While(node) => {
        let (cond, body, until) = (node.cond, node.body, node.until);
        self.write(if until { "until " } else { "while " });
        self.emit_cond(cond);
        self.emit_block(body);
      }
      NodeKind::DoWhile(node) => {
        let (cond, body, until) = (node.cond, node.body, node.until);
        self.write("do ");
        self.emit_block(body);
        self.write(if until { "until ( " } else { "while ( " });
        self.emit_operand(cond);
        self.write(" );");
        self.write_nl();
      }
      NodeKind::For(node) => {
        let (cond, post, body) = (node.cond, node.post.clone(), node.body);
        self.write("for ( ; ");
        self.emit_operand(cond);
        self.write("; ");
        for (i, expr) in post.iter().enumerate() {
          self.emit_operand(*expr);
          if i + 1 < post.len() {
            self.write(", ");
          }
        }
        self.write(" ) ");
        self.emit_block(body);
      }
      NodeKind::Jump(kind) => {
        match kind {
          task::ast::JumpKind::Break => self.write("break;"),
          task::ast::JumpKind::Continue => self.write("continue;"),
        }
        self.write_nl();
      }
      NodeKind::ScriptJump(kind) => {
        match kind {
          task::ast::ScriptJumpKind::Restart => self.write("restart;"),
          task::ast::ScriptJumpKind::Suspend => self.write("suspend;"),
          task::ast::ScriptJumpKind::Terminate => self.write("terminate;"),
        }
        self.write_nl();
      }
      NodeKind::Return(value) => {
        let value = *value;
        self.write("return");
        if let Some(value) = value {
          self.write(" ");
          self.emit_operand(value);
        }
        self.write(";");
        self.write_nl();
      }
      NodeKind::InlineAsm(node) => {
        self.write(format!("// > {}", node.opcode as u16));
        self.write_nl();
      }
      NodeKind::ExprStmt(expr) => {
        let expr = *expr;
        self.emit_operand(expr);
        self.write(";");
        self.write_nl();
      }
      _ => {
        // Statement position holds only the kinds above.
        self.write("// ?");
        self.write_nl();
      }
    }
  }

  fn emit_if(&mut self, stmt: NodeId) {
    let (cond, body, else_body) = match self.module.ast.get(stmt) {
      NodeKind::If(node) => (node.cond, node.body, node.else_body),
      _ => return,
    };
    self.write("if ");
    self.emit_cond(cond);
    self.emit_block(body);
    if let Some(else_body) = else_body {
      // An else holding a single if chains as `else if`.
      let else_if = match self.module.ast.get(else_body) {
        NodeKind::Block(block) if block.stmts.len() == 1 => {
          let only = block.stmts[0];
          match self.module.ast.get(only) {
            NodeKind::If(_) => Some(only),
            _ => None,
          }
        }
        _ => None,
      };
      self.write("else ");
      match else_if {
        Some(nested) => self.emit_if(nested),
        None => self.emit_block(else_body),
      }
    }
  }

  fn emit_cond(&mut self, expr: NodeId) {
    self.write("( ");
    self.emit_operand(expr);
    self.write(" ) ");
  }

  fn emit_operand(&mut self, node: NodeId) {
    match self.module.ast.get(node) {
      NodeKind::Binary(binary) => {
        let (op, lside, rside) = (binary.op, binary.lside, binary.rside);
        self.emit_operand(lside);
        let text = match op {
          BinaryOp::LogOr => "||",
          BinaryOp::LogAnd => "&&",
          BinaryOp::BitOr => "|",
          BinaryOp::BitXor => "^",
          BinaryOp::BitAnd => "&",
          BinaryOp::Eq => "==",
          BinaryOp::Neq => "!=",
          BinaryOp::Lt => "<",
          BinaryOp::Lte => "<=",
          BinaryOp::Gt => ">",
          BinaryOp::Gte => ">=",
          BinaryOp::ShiftL => "<<",
          BinaryOp::ShiftR => ">>",
          BinaryOp::Add => "+",
          BinaryOp::Sub => "-",
          BinaryOp::Mul => "*",
          BinaryOp::Div => "/",
          BinaryOp::Mod => "%",
        };
        self.write(format!(" {} ", text));
        self.emit_operand(rside);
      }
      NodeKind::Assign(assign) => {
        let (op, lside, rside) = (assign.op, assign.lside, assign.rside);
        self.emit_operand(lside);
        let text = match op {
          AssignOp::Simple => "=",
          AssignOp::Add => "+=",
          AssignOp::Sub => "-=",
          AssignOp::Mul => "*=",
          AssignOp::Div => "/=",
          AssignOp::Mod => "%=",
          AssignOp::ShiftL => "<<=",
          AssignOp::ShiftR => ">>=",
          AssignOp::BitAnd => "&=",
          AssignOp::BitXor => "^=",
          AssignOp::BitOr => "|=",
        };
        self.write(format!(" {} ", text));
        self.emit_operand(rside);
      }
      NodeKind::Unary(unary) => {
        let (op, operand) = (unary.op, unary.operand);
        match op {
          UnaryOp::Minus => self.write("-"),
          UnaryOp::LogicalNot => {
            self.write("!");
            let nested_not = matches!(
              self.module.ast.get(operand),
              NodeKind::Unary(inner) if inner.op == UnaryOp::LogicalNot
            );
            if !nested_not {
              self.write(" ");
            }
          }
          UnaryOp::BitwiseNot => self.write("~"),
        }
        self.emit_operand(operand);
      }
      NodeKind::Inc(inc) => {
        let (decrement, post, operand) = (inc.decrement, inc.post, inc.operand);
        let text = if decrement { "--" } else { "++" };
        if post {
          self.emit_operand(operand);
          self.write(text);
        } else {
          self.write(text);
          self.emit_operand(operand);
        }
      }
      NodeKind::Subscript(subscript) => {
        let (lside, index) = (subscript.lside, subscript.index);
        self.emit_operand(lside);
        self.write("[ ");
        self.emit_operand(index);
        self.write(" ]");
      }
      NodeKind::Call(_) => self.emit_call(node),
      NodeKind::Literal(value) => {
        let value = *value;
        self.write(format!("{}", value));
      }
      NodeKind::NameUsage(name) => {
        let name = *name;
        self.write(name);
      }
      NodeKind::VarUsage(id) => {
        let var = self.module.vars.get(*id);
        self.write_var_name(var);
      }
      NodeKind::StrCpyCall(call) => {
        let (array, array_offset, array_length, string, offset) = (
          call.array,
          call.array_offset,
          call.array_length,
          call.string,
          call.offset,
        );
        self.write("StrCpy( a: ( ");
        self.emit_operand(array);
        self.write(", ");
        self.emit_operand(array_offset);
        self.write(", ");
        self.emit_operand(array_length);
        self.write(" ), ");
        self.emit_operand(string);
        self.write(", ");
        self.emit_operand(offset);
        self.write(" )");
      }
      NodeKind::Paren(contents) => {
        let contents = *contents;
        self.write("( ");
        self.emit_operand(contents);
        self.write(" )");
      }
      NodeKind::PalTrans(_) => self.visit_paltrans(node),
      _ => {
        self.write("// ?");
      }
    }
  }

  fn callee_name(&self, callee: Callee) -> String {
    match callee {
      Callee::Aspec(name) => name.to_string(),
      Callee::Ded(index) => self.module.builtins.deds[index].name.to_string(),
      Callee::Format(index) => self.module.builtins.formats[index].name.to_string(),
      Callee::Ext(index) => self.module.builtins.exts[index].name.to_string(),
      Callee::Intern(index) => self.module.builtins.interns[index].name.to_string(),
      Callee::User(index) => {
        let func = &self.module.funcs[index];
        if !func.name.is_empty() {
          func.name.clone()
        } else {
          format!("Func{}", func.index)
        }
      }
      Callee::UnknownAspec(id) => format!("// ActionSpecial_{}", id),
      Callee::UnknownExt(id) => format!("// ExtFunc_{}", id),
    }
  }

  fn emit_call(&mut self, node: NodeId) {
    let (callee, direct, args, has_items) = match self.module.ast.get(node) {
      NodeKind::Call(call) => (
        call.callee,
        call.direct,
        call.args.clone(),
        call.format_items.is_some(),
      ),
      _ => return,
    };
    let name = self.callee_name(callee);
    self.write(name);
    self.write("(");
    if has_items {
      self.write_format_item_list(node, !args.is_empty());
    } else if direct {
      self.write(" ");
      self.write("const:");
    }
    if !args.is_empty() {
      self.write(" ");
      for (i, arg) in args.iter().enumerate() {
        self.emit_operand(*arg);
        if i + 1 < args.len() {
          self.write(", ");
        }
      }
      self.write(" ");
    }
    self.write(")");
  }

  fn write_format_item_list(&mut self, call: NodeId, has_args: bool) {
    self.write(" ");
    let items: Vec<(FormatCast, NodeId, Option<(NodeId, NodeId)>)> =
      match self.module.ast.get(call) {
        NodeKind::Call(node) => node
          .format_items
          .iter()
          .flatten()
          .map(|item| {
            (
              item.cast,
              item.value,
              item.extra.as_ref().map(|extra| (extra.offset, extra.length)),
            )
          })
          .collect(),
        _ => vec![],
      };
    for (i, &(cast, value, extra)) in items.iter().enumerate() {
      self.write_format_item(cast, value, extra);
      if i + 1 < items.len() {
        self.write(", ");
      }
    }
    if has_args {
      self.write(";");
    } else {
      self.write(" ");
    }
  }

  fn write_format_item(
    &mut self,
    cast: FormatCast,
    value: NodeId,
    extra: Option<(NodeId, NodeId)>,
  ) {
    if cast == FormatCast::Array {
      self.write("a: ");
      match extra {
        Some((offset, length)) => {
          self.write("( ");
          self.emit_operand(value);
          self.write(", ");
          self.emit_operand(offset);
          self.write(", ");
          self.emit_operand(length);
          self.write(" )");
        }
        None => self.emit_operand(value),
      }
      return;
    }
    let text = match cast {
      FormatCast::Decimal => "d",
      FormatCast::String => "s",
      FormatCast::Char => "c",
      FormatCast::Fixed => "f",
      FormatCast::Name => "n",
      FormatCast::LocalString => "l",
      FormatCast::Key => "k",
      FormatCast::Binary => "b",
      FormatCast::Hex => "x",
      FormatCast::Array => "a",
    };
    self.write(format!("{}: ", text));
    match cast {
      FormatCast::String | FormatCast::LocalString | FormatCast::Key => {
        if let NodeKind::Literal(index) = self.module.ast.get(value) {
          if let Some(string) = self.module.lookup_string(*index as u32) {
            let string = string.to_string();
            self.write(format!("\"{}\"", string));
            return;
          }
        }
        self.emit_operand(value);
      }
      FormatCast::Char => {
        if let NodeKind::Literal(ch) = self.module.ast.get(value) {
          let ch = *ch;
          if (0x20..=0x7e).contains(&ch) {
            self.write(format!("'{}'", ch as u8 as char));
            return;
          }
        }
        self.emit_operand(value);
      }
      _ => self.emit_operand(value),
    }
  }

  fn visit_paltrans(&mut self, node: NodeId) {
    let (number, count) = match self.module.ast.get(node) {
      NodeKind::PalTrans(trans) => (trans.number, trans.ranges.len()),
      _ => return,
    };
    self.write("CreateTranslation( ");
    self.emit_operand(number);
    if count > 0 {
      self.write(", ");
    }
    for i in 0..count {
      enum RangeParts {
        Colon(NodeId, NodeId),
        Rgb(bool, [NodeId; 6]),
        Colorisation([NodeId; 3]),
        Tint(NodeId, [NodeId; 3]),
      }
      let (begin, end, parts) = match self.module.ast.get(node) {
        NodeKind::PalTrans(trans) => {
          let range = &trans.ranges[i];
          let parts = match &range.value {
            PalRangeValue::Colon { begin, end } => RangeParts::Colon(*begin, *end),
            PalRangeValue::Rgb {
              saturated,
              red1,
              green1,
              blue1,
              red2,
              green2,
              blue2,
            } => RangeParts::Rgb(*saturated, [*red1, *green1, *blue1, *red2, *green2, *blue2]),
            PalRangeValue::Colorisation { red, green, blue } => {
              RangeParts::Colorisation([*red, *green, *blue])
            }
            PalRangeValue::Tint {
              amount,
              red,
              green,
              blue,
            } => RangeParts::Tint(*amount, [*red, *green, *blue]),
          };
          (range.begin, range.end, parts)
        }
        _ => return,
      };
      self.emit_operand(begin);
      self.write(":");
      self.emit_operand(end);
      self.write("=");
      match parts {
        RangeParts::Colon(begin, end) => {
          self.emit_operand(begin);
          self.write(":");
          self.emit_operand(end);
        }
        RangeParts::Rgb(saturated, [red1, green1, blue1, red2, green2, blue2]) => {
          if saturated {
            self.write("%");
          }
          self.write("[ ");
          self.emit_operand(red1);
          self.write(", ");
          self.emit_operand(green1);
          self.write(", ");
          self.emit_operand(blue1);
          self.write(" ]:[ ");
          self.emit_operand(red2);
          self.write(", ");
          self.emit_operand(green2);
          self.write(", ");
          self.emit_operand(blue2);
          self.write(" ]");
        }
        RangeParts::Colorisation([red, green, blue]) => {
          self.write("#[ ");
          self.emit_operand(red);
          self.write(", ");
          self.emit_operand(green);
          self.write(", ");
          self.emit_operand(blue);
          self.write(" ]");
        }
        RangeParts::Tint(amount, [red, green, blue]) => {
          self.write("@");
          self.emit_operand(amount);
          self.write("[ ");
          self.emit_operand(red);
          self.write(", ");
          self.emit_operand(green);
          self.write(", ");
          self.emit_operand(blue);
          self.write(" ]");
        }
      }
      if i + 1 < count {
        self.write(", ");
      }
    }
    self.write(" )");
  }

  fn write_var_name(&mut self, var: &Var) {
    if !var.name.is_empty() {
      let name = var.name.clone();
      self.write(name);
    } else {
      let storage = match var.storage {
        Storage::Map => "map",
        Storage::World => "world",
        Storage::Global => "global",
        Storage::Local => "",
      };
      let layout = if var.array { "array" } else { "var" };
      self.write(format!("{}{}{}", storage, layout, var.index));
    }
  }
}

/// Dumps the decoded instruction stream of every script and function, one
/// instruction per line with its object-file position.
pub fn disassemble(module: &Module) -> String {
  let mut out = String::new();
  for script in &module.scripts {
    writeln!(out, "script {} ------------", script.number).expect("could not write to output");
    show_body(&mut out, &script.body);
  }
  for func in &module.funcs {
    let name = if func.name.is_empty() {
      format!("Func{}", func.index)
    } else {
      func.name.clone()
    };
    writeln!(out, "function {} ------------", name).expect("could not write to output");
    show_body(&mut out, &func.body);
  }
  out
}

fn show_body(out: &mut String, body: &task::pcode::Body) {
  // The trailing synthetic sentinel is not part of the stream.
  let real = body.pcodes.len().saturating_sub(1);
  for pcode in &body.pcodes[..real] {
    let name = format!("{:?}", pcode.opcode).to_uppercase();
    write!(out, "{:05} {}", pcode.obj_pos, name).expect("could not write to output");
    match &pcode.args {
      PcodeArgs::None => {}
      PcodeArgs::Jump(jump) => {
        write!(out, " --> {}", jump.destination_obj_pos).expect("could not write to output");
      }
      PcodeArgs::Case(case) => {
        write!(out, " {} --> {}", case.value, case.destination_obj_pos).expect("could not write to output");
      }
      PcodeArgs::SortedCase(cases) => {
        for case in cases {
          write!(out, " {} --> {}", case.value, case.destination_obj_pos).expect("could not write to output");
        }
      }
      PcodeArgs::Generic(args) => {
        for value in args {
          write!(out, " {}", value).expect("could not write to output");
        }
      }
    }
    writeln!(out).expect("could not write to output");
  }
}
