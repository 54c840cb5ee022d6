//! Structural notes.
//!
//! The annotator attaches these to instructions; the recoverer consumes them
//! to build nested statements without re-deriving control flow. Every range
//! is an inclusive pair of instruction indices inside one body.

/// A high-level construct recognized at an instruction.
#[derive(Debug, Clone)]
pub enum Note {
  If(IfNote),
  Switch(SwitchNote),
  Case(CaseNote),
  Loop(LoopNote),
  Do(DoNote),
  For(ForNote),
  Jump(JumpNote),
  Return(ReturnNote),
  ExprStmt(ExprStmtNote),
  InternFunc(InternFuncNote),
}

#[derive(Debug, Clone)]
pub struct IfNote {
  pub cond_start: usize,
  pub cond_end: usize,
  pub body_start: usize,
  pub body_end: usize,
  pub else_body: Option<(usize, usize)>,
  pub exit: usize,
}

#[derive(Debug, Clone)]
pub struct SwitchNote {
  pub cond_start: usize,
  pub cond_end: usize,
  pub body_start: usize,
  pub body_end: usize,
  pub exit: usize,
}

#[derive(Debug, Clone)]
pub struct CaseNote {
  pub value: i32,
  pub default_case: bool,
}

#[derive(Debug, Clone)]
pub struct LoopNote {
  pub cond_start: usize,
  pub cond_end: usize,
  pub body_start: usize,
  pub body_end: usize,
  pub exit: usize,
  /// True when the loop repeats while the condition is false.
  pub until: bool,
}

#[derive(Debug, Clone)]
pub struct DoNote {
  pub cond_start: usize,
  pub cond_end: usize,
  pub body_start: usize,
  pub body_end: usize,
  pub exit: usize,
  pub until: bool,
}

#[derive(Debug, Clone)]
pub struct ForNote {
  pub cond_start: usize,
  pub cond_end: usize,
  /// Expression ranges of the post list, in source order.
  pub post: Vec<(usize, usize)>,
  pub body_start: usize,
  pub body_end: usize,
  pub exit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpNote {
  Break,
  Continue,
}

#[derive(Debug, Clone)]
pub struct ReturnNote {
  pub expr_start: usize,
  pub expr_end: usize,
  pub exit: usize,
}

#[derive(Debug, Clone)]
pub struct ExprStmtNote {
  pub expr_start: usize,
  pub expr_end: usize,
  pub exit: usize,
}

/// A recognized multi-instruction idiom collapsing into one synthetic call.
#[derive(Debug, Clone)]
pub struct InternFuncNote {
  /// Index into the internal-function catalog.
  pub func: usize,
  pub exit: usize,
}
