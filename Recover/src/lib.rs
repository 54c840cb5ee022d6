//! Recovery stage.
//!
//! Turns annotated instruction ranges into the syntax tree. Statements come
//! from notes; expressions from a second, tree-building pass of the stack
//! simulation. Anything neither stage understands survives as an
//! inline-assembly comment.

use task::ast::{
  BlockNode, CaseLabelNode, ForStmtNode, IfStmtNode, InlineAsmNode, JumpKind, LoopStmtNode,
  NodeId, NodeKind, ScriptJumpKind, SwitchStmtNode, Var,
};
use task::errors::{bail, diag_internal_err, TaskResult};
use task::module::{script_type, Module};
use task::note::{JumpNote, Note};
use task::pcode::{Body, Opcode, PcodeArgs};

mod aspec;
mod expr;

/// Performs the recovery stage.
pub fn recover(module: &mut Module) -> TaskResult<()> {
  for index in 0..module.scripts.len() {
    recover_script_params(module, index);
    let mut body = std::mem::take(&mut module.scripts[index].body);
    let mut recovery = Recovery {
      module: &mut *module,
      context: Context::Script(index),
    };
    let result = recovery.recover_body(&mut body);
    module.scripts[index].body = body;
    module.scripts[index].block = Some(result?);
  }
  for index in 0..module.funcs.len() {
    let mut body = std::mem::take(&mut module.funcs[index].body);
    let mut recovery = Recovery {
      module: &mut *module,
      context: Context::Func(index),
    };
    let result = recovery.recover_body(&mut body);
    module.funcs[index].body = body;
    module.funcs[index].block = Some(result?);
  }
  Ok(())
}

/// Parameters of some script types have conventional names.
fn recover_script_params(module: &mut Module, index: usize) {
  let (num_param, kind) = {
    let script = &module.scripts[index];
    (script.num_param as usize, script.script_type)
  };
  for param in 0..num_param.min(module.scripts[index].vars.len()) {
    let mut var = Var::new();
    var.index = param as u32;
    let name = match (kind, param) {
      (script_type::DISCONNECT, 0) => Some("player"),
      (script_type::EVENT, 0) => Some("type"),
      (script_type::EVENT, 1) => Some("arg1"),
      (script_type::EVENT, 2) => Some("arg2"),
      _ => None,
    };
    if let Some(name) = name {
      var.name = name.to_string();
    }
    let id = module.vars.push(var);
    module.scripts[index].vars[param] = Some(id);
  }
}

pub(crate) enum Context {
  Script(usize),
  Func(usize),
}

pub(crate) struct Recovery<'m> {
  pub(crate) module: &'m mut Module,
  pub(crate) context: Context,
}

impl<'m> Recovery<'m> {
  fn recover_body(&mut self, body: &mut Body) -> TaskResult<NodeId> {
    if body.is_empty() {
      return Ok(self.module.ast.push(NodeKind::Block(BlockNode::default())));
    }
    let range = body.full_range();
    self.recover_block(body, range.start, range.end)
  }

  pub(crate) fn recover_block(
    &mut self,
    body: &mut Body,
    start: usize,
    end: usize,
  ) -> TaskResult<NodeId> {
    let mut stmts = vec![];
    let mut pos = start;
    while pos <= end {
      let (node, next) = self.recover_stmt(body, pos)?;
      if let Some(node) = node {
        stmts.push(node);
      }
      pos = next;
    }
    Ok(self.module.ast.push(NodeKind::Block(BlockNode { stmts })))
  }

  /// Recovers one statement; returns the node (if any) and the position of
  /// the next statement.
  fn recover_stmt(
    &mut self,
    body: &mut Body,
    pos: usize,
  ) -> TaskResult<(Option<NodeId>, usize)> {
    // The topmost note wins; internal-function notes belong to expression
    // recovery and stay attached.
    let note = match body.pcodes[pos].notes.last() {
      None | Some(Note::InternFunc(_)) => None,
      Some(_) => body.pcodes[pos].notes.pop(),
    };
    if let Some(note) = note {
      return self.recover_noted_stmt(body, pos, note);
    }
    match body.opcode(pos) {
      Opcode::Terminate => Ok((
        Some(self.module.ast.push(NodeKind::ScriptJump(ScriptJumpKind::Terminate))),
        pos + 1,
      )),
      Opcode::Restart => Ok((
        Some(self.module.ast.push(NodeKind::ScriptJump(ScriptJumpKind::Restart))),
        pos + 1,
      )),
      Opcode::Suspend => Ok((
        Some(self.module.ast.push(NodeKind::ScriptJump(ScriptJumpKind::Suspend))),
        pos + 1,
      )),
      Opcode::ReturnVoid => Ok((Some(self.module.ast.push(NodeKind::Return(None))), pos + 1)),
      Opcode::Nop => Ok((None, pos + 1)),
      _ => Ok((Some(self.recover_inline_asm(body, pos)), pos + 1)),
    }
  }

  fn recover_noted_stmt(
    &mut self,
    body: &mut Body,
    pos: usize,
    note: Note,
  ) -> TaskResult<(Option<NodeId>, usize)> {
    match note {
      Note::If(note) => {
        let cond = self.recover_expr(body, note.cond_start, note.cond_end)?;
        let if_body = self.recover_block(body, note.body_start, note.body_end)?;
        let else_body = match note.else_body {
          Some((start, end)) => Some(self.recover_block(body, start, end)?),
          None => None,
        };
        let node = self.module.ast.push(NodeKind::If(IfStmtNode {
          cond,
          body: if_body,
          else_body,
        }));
        Ok((Some(node), note.exit))
      }
      Note::Switch(note) => {
        let cond = self.recover_expr(body, note.cond_start, note.cond_end)?;
        let switch_body = self.recover_block(body, note.body_start, note.body_end)?;
        let node = self.module.ast.push(NodeKind::Switch(SwitchStmtNode {
          cond,
          body: switch_body,
        }));
        Ok((Some(node), note.exit))
      }
      Note::Case(note) => {
        // The label does not consume the instruction; the arm's own notes
        // follow at the same position.
        let node = self.module.ast.push(NodeKind::CaseLabel(CaseLabelNode {
          value: note.value,
          default_case: note.default_case,
        }));
        Ok((Some(node), pos))
      }
      Note::Loop(note) => {
        let cond = self.recover_expr(body, note.cond_start, note.cond_end)?;
        let loop_body = self.recover_block(body, note.body_start, note.body_end)?;
        let node = self.module.ast.push(NodeKind::While(LoopStmtNode {
          cond,
          body: loop_body,
          until: note.until,
        }));
        Ok((Some(node), note.exit))
      }
      Note::Do(note) => {
        let cond = self.recover_expr(body, note.cond_start, note.cond_end)?;
        let loop_body = self.recover_block(body, note.body_start, note.body_end)?;
        let node = self.module.ast.push(NodeKind::DoWhile(LoopStmtNode {
          cond,
          body: loop_body,
          until: note.until,
        }));
        Ok((Some(node), note.exit))
      }
      Note::For(note) => {
        let cond = self.recover_expr(body, note.cond_start, note.cond_end)?;
        let mut post = vec![];
        for &(start, end) in &note.post {
          post.push(self.recover_expr(body, start, end)?);
        }
        let for_body = self.recover_block(body, note.body_start, note.body_end)?;
        let node = self.module.ast.push(NodeKind::For(ForStmtNode {
          cond,
          post,
          body: for_body,
        }));
        Ok((Some(node), note.exit))
      }
      Note::Jump(note) => {
        let kind = match note {
          JumpNote::Break => JumpKind::Break,
          JumpNote::Continue => JumpKind::Continue,
        };
        Ok((Some(self.module.ast.push(NodeKind::Jump(kind))), pos + 1))
      }
      Note::Return(note) => {
        let value = self.recover_expr(body, note.expr_start, note.expr_end)?;
        let node = self.module.ast.push(NodeKind::Return(Some(value)));
        Ok((Some(node), note.exit))
      }
      Note::ExprStmt(note) => {
        let expr = self.recover_expr(body, note.expr_start, note.expr_end)?;
        let node = self.module.ast.push(NodeKind::ExprStmt(expr));
        Ok((Some(node), note.exit))
      }
      Note::InternFunc(_) => {
        diag_internal_err("internal-function note reached statement recovery");
        bail()
      }
    }
  }

  fn recover_inline_asm(&mut self, body: &Body, pos: usize) -> NodeId {
    let pcode = &body.pcodes[pos];
    let args = match &pcode.args {
      PcodeArgs::None => vec![],
      PcodeArgs::Jump(jump) => vec![jump.destination_obj_pos],
      PcodeArgs::Case(case) => vec![case.value, case.destination_obj_pos],
      PcodeArgs::SortedCase(cases) => cases
        .iter()
        .flat_map(|case| [case.value, case.destination_obj_pos])
        .collect(),
      PcodeArgs::Generic(args) => args.clone(),
    };
    self.module.ast.push(NodeKind::InlineAsm(InlineAsmNode {
      opcode: pcode.opcode,
      args,
    }))
  }
}
