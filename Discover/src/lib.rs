//! Annotation stage.
//!
//! Walks each body looking for the instruction shapes the compiler emits for
//! structured statements, and records what it finds as notes for the
//! recoverer. Expression boundaries come from a typed stack simulation; a
//! sequence that fails to simulate is simply not an expression, and the scan
//! advances one instruction.

use task::errors::{bail, diag_err, TaskResult};
use task::module::Module;
use task::note::{
  CaseNote, DoNote, ExprStmtNote, ForNote, IfNote, InternFuncNote, JumpNote, LoopNote, Note,
  ReturnNote, SwitchNote,
};
use task::pcode::{Body, Opcode};

mod simulate;

pub(crate) use simulate::ExprShape;

/// Performs the annotation stage.
pub fn annotate(module: &mut Module) -> TaskResult<()> {
  for index in 0..module.scripts.len() {
    let mut body = std::mem::take(&mut module.scripts[index].body);
    let result = examine_body(module, &mut body);
    module.scripts[index].body = body;
    result?;
  }
  for index in 0..module.funcs.len() {
    let mut body = std::mem::take(&mut module.funcs[index].body);
    let result = examine_body(module, &mut body);
    module.funcs[index].body = body;
    result?;
  }
  Ok(())
}

fn examine_body(module: &Module, body: &mut Body) -> TaskResult<()> {
  if body.is_empty() {
    return Ok(());
  }
  let range = body.full_range();
  let discovery = Discovery { module };
  let root = Scope {
    parent: None,
    break_target: None,
    continue_target: None,
  };
  discovery.examine_block(body, range.start, range.end, &root)
}

/// Break and continue targets of the enclosing constructs, as a parent
/// chain borrowed down the recursion.
struct Scope<'p> {
  parent: Option<&'p Scope<'p>>,
  break_target: Option<usize>,
  continue_target: Option<usize>,
}

impl<'p> Scope<'p> {
  fn nearest_break(&self) -> Option<usize> {
    let mut scope = Some(self);
    while let Some(current) = scope {
      if current.break_target.is_some() {
        return current.break_target;
      }
      scope = current.parent;
    }
    None
  }

  fn nearest_continue(&self) -> Option<usize> {
    let mut scope = Some(self);
    while let Some(current) = scope {
      if current.continue_target.is_some() {
        return current.continue_target;
      }
      scope = current.parent;
    }
    None
  }
}

pub(crate) struct Discovery<'m> {
  pub(crate) module: &'m Module,
}

impl<'m> Discovery<'m> {
  fn examine_block(
    &self,
    body: &mut Body,
    start: usize,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<()> {
    let mut pos = start;
    while pos <= end {
      pos = self.examine_stmt(body, pos, end, scope)?;
    }
    Ok(())
  }

  /// Examines one statement starting at `pos`; returns the position of the
  /// next statement.
  fn examine_stmt(
    &self,
    body: &mut Body,
    pos: usize,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    match body.opcode(pos) {
      Opcode::Goto => Ok(self.examine_goto(body, pos, scope)),
      _ => self.examine_expr(body, pos, end, scope),
    }
  }

  fn examine_goto(&self, body: &mut Body, pos: usize, scope: &Scope) -> usize {
    let destination = body.jump(pos).destination;
    if scope.nearest_break() == Some(destination) {
      body.pcodes[pos].notes.push(Note::Jump(JumpNote::Break));
    } else if scope.nearest_continue() == Some(destination) {
      body.pcodes[pos].notes.push(Note::Jump(JumpNote::Continue));
    }
    // A forward goto that is neither break nor continue has no statement
    // counterpart; it surfaces as inline assembly.
    pos + 1
  }

  fn examine_expr(
    &self,
    body: &mut Body,
    pos: usize,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let shape = match self.simulate_expr(body, pos, end)? {
      Some(shape) => shape,
      None => return Ok(pos + 1),
    };
    if shape.exit > end {
      return Ok(self.examine_expr_stmt(body, &shape));
    }
    match body.opcode(shape.exit) {
      Opcode::IfGoto => self.examine_expr_ifgoto(body, &shape, scope),
      Opcode::IfNotGoto => self.examine_expr_ifnotgoto(body, &shape, end, scope),
      Opcode::Goto => self.examine_expr_goto(body, &shape, end, scope),
      Opcode::ReturnVal => Ok(self.examine_returnval(body, &shape)),
      _ => Ok(self.examine_expr_stmt(body, &shape)),
    }
  }

  fn examine_expr_ifgoto(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    scope: &Scope,
  ) -> TaskResult<usize> {
    if let Some(exit) = self.discover_for(body, shape, scope)? {
      return Ok(exit);
    }
    let destination = body.jump(shape.exit).destination;
    if destination > 0 && body.opcode(destination - 1) == Opcode::Goto {
      let back_jump = destination - 1;
      if body.jump(back_jump).destination == shape.start {
        return self.examine_while(body, shape, scope);
      }
    }
    if destination < shape.exit {
      return self.examine_do(body, shape, scope);
    }
    // An upward conditional jump outside any loop shape; leave it to the
    // inline-assembly fallback.
    Ok(shape.start + 1)
  }

  fn examine_expr_ifnotgoto(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let destination = body.jump(shape.exit).destination;
    if destination > shape.exit {
      let mut while_stmt = false;
      if body.opcode(destination - 1) == Opcode::Goto {
        while_stmt = body.jump(destination - 1).destination == shape.start;
      }
      if while_stmt {
        self.examine_while(body, shape, scope)
      } else {
        self.examine_if(body, shape, end, scope)
      }
    } else {
      self.examine_do(body, shape, scope)
    }
  }

  /// The `for` shape: cond, conditional jump into the body, exit jump, the
  /// post list, a back jump to the cond, the body, a jump to the post list.
  fn discover_for(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    scope: &Scope,
  ) -> TaskResult<Option<usize>> {
    if body.opcode(shape.exit + 1) != Opcode::Goto {
      return Ok(None);
    }
    let exit_jump = shape.exit + 1;
    let exit = body.jump(exit_jump).destination;
    if exit == 0 || body.opcode(exit - 1) != Opcode::Goto {
      return Ok(None);
    }
    let post_jump = exit - 1;
    if post_jump == 0 || body.jump(post_jump).destination != exit_jump + 1 {
      return Ok(None);
    }
    let cond_dest = body.jump(shape.exit).destination;
    if cond_dest == 0 || body.opcode(cond_dest - 1) != Opcode::Goto {
      return Ok(None);
    }
    let cond_jump = cond_dest - 1;
    if body.jump(cond_jump).destination != shape.start {
      return Ok(None);
    }
    // The instructions between the exit jump and the back jump must parse
    // as one or more expressions: the post list.
    let mut post = vec![];
    let mut start = exit_jump + 1;
    while start != cond_jump {
      let post_expr = match self.simulate_expr(body, start, cond_jump - 1)? {
        Some(post_expr) => post_expr,
        None => return Ok(None),
      };
      post.push((post_expr.start, post_expr.end));
      start = post_expr.exit;
    }
    let note = ForNote {
      cond_start: shape.start,
      cond_end: shape.end,
      post,
      body_start: cond_jump + 1,
      body_end: post_jump - 1,
      exit,
    };
    let body_start = note.body_start;
    let body_end = note.body_end;
    let continue_target = exit_jump + 1;
    body.pcodes[shape.start].notes.push(Note::For(note));
    let child = Scope {
      parent: Some(scope),
      break_target: Some(exit),
      continue_target: Some(continue_target),
    };
    self.examine_block(body, body_start, body_end, &child)?;
    Ok(Some(exit))
  }

  fn examine_while(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let destination = body.jump(shape.exit).destination;
    let cond_jump = destination - 1;
    let note = LoopNote {
      cond_start: shape.start,
      cond_end: shape.end,
      body_start: shape.exit + 1,
      body_end: cond_jump - 1,
      exit: cond_jump + 1,
      until: body.opcode(shape.exit) == Opcode::IfGoto,
    };
    let (body_start, body_end, exit) = (note.body_start, note.body_end, note.exit);
    body.pcodes[shape.start].notes.push(Note::Loop(note));
    let child = Scope {
      parent: Some(scope),
      break_target: Some(exit),
      continue_target: Some(shape.start),
    };
    self.examine_block(body, body_start, body_end, &child)?;
    Ok(exit)
  }

  fn examine_if(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let destination = body.jump(shape.exit).destination;
    let mut note = IfNote {
      cond_start: shape.start,
      cond_end: shape.end,
      body_start: shape.exit + 1,
      body_end: destination - 1,
      else_body: None,
      exit: destination,
    };
    let in_or_past = |idx: usize| idx <= end + 1;
    if in_or_past(destination) && body.opcode(destination - 1) == Opcode::Goto {
      let exit_jump = destination - 1;
      let exit_dest = body.jump(exit_jump).destination;
      if in_or_past(exit_dest) && (exit_dest > exit_jump || exit_dest == destination) {
        note.else_body = Some((destination, exit_dest - 1));
        note.body_end = exit_jump - 1;
        note.exit = exit_dest;
      }
    }
    let body_range = (note.body_start, note.body_end);
    let else_range = note.else_body;
    let exit = note.exit;
    body.pcodes[shape.start].notes.push(Note::If(note));
    self.examine_block(body, body_range.0, body_range.1, scope)?;
    if let Some((else_start, else_end)) = else_range {
      self.examine_block(body, else_start, else_end, scope)?;
    }
    Ok(exit)
  }

  fn examine_do(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    scope: &Scope,
  ) -> TaskResult<usize> {
    if shape.start == 0 {
      // A self-looping condition with no body in front of it; emit the
      // condition as a plain statement.
      return Ok(self.examine_expr_stmt(body, shape));
    }
    let note = DoNote {
      cond_start: shape.start,
      cond_end: shape.end,
      body_start: body.jump(shape.exit).destination,
      body_end: shape.start - 1,
      exit: shape.exit + 1,
      until: body.opcode(shape.exit) == Opcode::IfNotGoto,
    };
    let (body_start, body_end, exit) = (note.body_start, note.body_end, note.exit);
    let child = Scope {
      parent: Some(scope),
      break_target: Some(exit),
      continue_target: Some(shape.start),
    };
    self.examine_block(body, body_start, body_end, &child)?;
    // Attached after the body walk, so the recoverer sees the do-note on
    // top of whatever the body's first statement attached here.
    body.pcodes[body_start].notes.push(Note::Do(note));
    Ok(exit)
  }

  fn examine_expr_goto(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let destination = body.jump(shape.exit).destination;
    match body.opcode(destination) {
      Opcode::CaseGoto | Opcode::CaseGotoSorted | Opcode::Drop => {
        self.examine_switch(body, shape, end, scope)
      }
      _ => Ok(self.examine_expr_stmt(body, shape)),
    }
  }

  fn examine_switch(
    &self,
    body: &mut Body,
    shape: &ExprShape,
    end: usize,
    scope: &Scope,
  ) -> TaskResult<usize> {
    let table = body.jump(shape.exit).destination;
    let body_start = shape.exit + 1;
    let body_end = table - 2;
    // Walk the case table, collecting value/target pairs.
    let mut cases: Vec<(i32, usize)> = vec![];
    let mut pos = table;
    if body.opcode(table) == Opcode::CaseGotoSorted {
      for case in body.sorted_case_jump(table) {
        cases.push((case.value, case.destination));
      }
      pos += 1;
    } else {
      while pos <= end && body.opcode(pos) == Opcode::CaseGoto {
        let case = body.case_jump(pos);
        cases.push((case.value, case.destination));
        pos += 1;
      }
    }
    // Skip the discriminant drop.
    pos += 1;
    // An optional trailing jump names the default case.
    let mut default_case = None;
    if pos <= end && body.opcode(pos) == Opcode::Goto {
      let destination = body.jump(pos).destination;
      if destination <= end {
        default_case = Some(destination);
        pos += 1;
      }
    }
    let exit = pos;
    body.pcodes[shape.start].notes.push(Note::Switch(SwitchNote {
      cond_start: shape.start,
      cond_end: shape.end,
      body_start,
      body_end,
      exit,
    }));
    let child = Scope {
      parent: Some(scope),
      break_target: Some(exit),
      continue_target: None,
    };
    self.examine_block(body, body_start, body_end, &child)?;
    if let Some(target) = default_case {
      body.pcodes[target].notes.push(Note::Case(CaseNote {
        value: 0,
        default_case: true,
      }));
    }
    for (value, target) in cases {
      body.pcodes[target].notes.push(Note::Case(CaseNote {
        value,
        default_case: false,
      }));
    }
    Ok(exit)
  }

  fn examine_returnval(&self, body: &mut Body, shape: &ExprShape) -> usize {
    let note = ReturnNote {
      expr_start: shape.start,
      expr_end: shape.end,
      exit: shape.exit + 1,
    };
    let exit = note.exit;
    body.pcodes[shape.start].notes.push(Note::Return(note));
    exit
  }

  fn examine_expr_stmt(&self, body: &mut Body, shape: &ExprShape) -> usize {
    let mut note = ExprStmtNote {
      expr_start: shape.start,
      expr_end: shape.end,
      exit: shape.exit,
    };
    // A discarded call result leaves a drop behind; it belongs to this
    // statement.
    if note.exit < body.pcodes.len() && body.opcode(note.exit) == Opcode::Drop {
      note.exit += 1;
    }
    let exit = note.exit;
    body.pcodes[shape.start].notes.push(Note::ExprStmt(note));
    exit
  }

  /// Attaches an internal-function note unless the instruction already
  /// carries one; the simulator may visit a range more than once.
  pub(crate) fn attach_intern_note(&self, body: &mut Body, at: usize, func: usize, exit: usize) {
    if matches!(body.pcodes[at].notes.last(), Some(Note::InternFunc(_))) {
      return;
    }
    body.pcodes[at]
      .notes
      .push(Note::InternFunc(InternFuncNote { func, exit }));
  }

  pub(crate) fn call_user_func(&self, index: i32, discard: bool) -> TaskResult<Option<u32>> {
    let func = match self.module.find_func(index as u32) {
      Some(position) => &self.module.funcs[position],
      None => return Ok(None),
    };
    if !discard && !func.returns_value {
      diag_err(
        "encountered a `call` instruction whose argument is a function that has a void \
         return type",
      );
      return bail();
    }
    Ok(Some(func.max_param))
  }
}
