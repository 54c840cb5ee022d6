//! Typed stack simulation for expression discovery.
//!
//! Runs the operand-stack effect of each instruction without building any
//! tree. An expression is discovered when the stack settles back to empty
//! outside print and translation brackets, or holds exactly one value in
//! front of a recognized consumer. Anything else is a rejection, not an
//! error: the annotator falls back to single-instruction advancement.

use task::builtin::{
  EXTFUNC_ACS_NAMED_EXECUTE, INTERN_ACS_EXECUTE_WAIT, INTERN_ACS_NAMED_EXECUTE_WAIT,
};
use task::errors::TaskResult;
use task::pcode::{Body, Opcode};

use crate::Discovery;

/// Action-special number of `Acs_Execute`; paired with a following
/// `SCRIPTWAIT` it collapses into `ACS_ExecuteWait`.
const ASPEC_ACS_EXECUTE: i32 = 80;

/// Boundaries of a discovered expression: `[start, end]` inclusive, with
/// `exit` the first instruction past it.
#[derive(Debug, Clone)]
pub(crate) struct ExprShape {
  pub start: usize,
  pub end: usize,
  pub exit: usize,
}

struct Sim {
  pos: usize,
  stack_size: i32,
  print_depth: i32,
  translation: bool,
  more_args: i32,
  more_args_given: bool,
  optional_args: i32,
  optional_args_given: bool,
  done: bool,
  rejected: bool,
}

impl Sim {
  fn push(&mut self, amount: i32) {
    self.stack_size += amount;
  }

  fn pop(&mut self, amount: i32) {
    if self.stack_size >= amount {
      self.stack_size -= amount;
    } else {
      self.rejected = true;
    }
  }

  fn reject(&mut self) {
    self.rejected = true;
  }

  fn next(&mut self) {
    self.pos += 1;
  }
}

impl<'m> Discovery<'m> {
  /// Simulates from `start`; `end` bounds the statement, though a print or
  /// translation bracket may legitimately run up to the consumer just past
  /// it. Returns `None` when the sequence is not an expression.
  pub(crate) fn simulate_expr(
    &self,
    body: &mut Body,
    start: usize,
    end: usize,
  ) -> TaskResult<Option<ExprShape>> {
    let _ = end;
    let mut sim = Sim {
      pos: start,
      stack_size: 0,
      print_depth: 0,
      translation: false,
      more_args: 0,
      more_args_given: false,
      optional_args: 0,
      optional_args_given: false,
      done: false,
      rejected: false,
    };
    while !sim.done {
      if sim.pos >= body.pcodes.len() {
        return Ok(None);
      }
      self.step(body, &mut sim)?;
      if sim.rejected {
        return Ok(None);
      }
      if sim.stack_size == 0 && sim.print_depth == 0 && !sim.translation {
        sim.done = true;
      }
    }
    Ok(Some(ExprShape {
      start,
      end: sim.pos - 1,
      exit: sim.pos,
    }))
  }

  fn step(&self, body: &mut Body, sim: &mut Sim) -> TaskResult<()> {
    use Opcode::*;
    let opcode = body.opcode(sim.pos);
    match opcode {
      PushNumber | PushByte => {
        sim.push(1);
        sim.next();
      }
      Push2Bytes | Push3Bytes | Push4Bytes | Push5Bytes => {
        sim.push((opcode as u16 - Push2Bytes as u16) as i32 + 2);
        sim.next();
      }
      PushBytes => {
        sim.push(body.generic_args(sim.pos)[0]);
        sim.next();
      }
      Dup => {
        if sim.stack_size == 0 {
          sim.reject();
          return Ok(());
        }
        sim.push(1);
        sim.next();
      }
      Drop => {
        if sim.stack_size > 1 && sim.print_depth == 0 && !sim.translation {
          sim.pop(1);
        }
        sim.next();
      }
      PushScriptVar | PushMapVar | PushWorldVar | PushGlobalVar => {
        sim.push(1);
        sim.next();
        // A push followed by an increment of the same slot is a post-inc;
        // the increment belongs to this operand.
        if sim.pos < body.pcodes.len()
          && matches!(body.opcode(sim.pos), IncScriptVar | IncMapVar | IncWorldVar)
        {
          sim.next();
        }
      }
      PushScriptArray | PushMapArray | PushWorldArray | PushGlobalArray => {
        sim.pop(1);
        sim.push(1);
        sim.next();
      }
      UnaryMinus | NegateLogical | NegateBinary | TagString => {
        sim.pop(1);
        sim.push(1);
        sim.next();
      }
      IncScriptVar | IncMapVar | IncWorldVar | IncGlobalVar | DecScriptVar | DecMapVar
      | DecWorldVar | DecGlobalVar => {
        sim.next();
        // Pre-inc used as a value pushes the slot right after.
        if sim.pos < body.pcodes.len()
          && matches!(body.opcode(sim.pos), PushScriptVar | PushMapVar | PushWorldVar)
        {
          sim.push(1);
          sim.next();
        }
      }
      IncScriptArray | IncMapArray | IncWorldArray | IncGlobalArray | DecScriptArray
      | DecMapArray | DecWorldArray | DecGlobalArray => {
        sim.pop(1);
        sim.next();
        if sim.pos < body.pcodes.len()
          && matches!(
            body.opcode(sim.pos),
            PushScriptArray | PushMapArray | PushWorldArray
          )
        {
          sim.pop(1);
          sim.push(1);
          sim.next();
        }
      }
      _ if is_var_assign(opcode) => {
        sim.pop(1);
        sim.next();
        if sim.stack_size == 0 {
          sim.done = true;
        }
      }
      _ if is_array_assign(opcode) => {
        sim.pop(2);
        sim.next();
      }
      OrLogical | AndLogical | OrBitwise | EorBitwise | AndBitwise | Eq | Ne | Lt | Le | Gt
      | Ge | LShift | RShift | Add | Subtract | Multiply | Divide | Modulus => {
        sim.pop(2);
        sim.push(1);
        sim.next();
      }
      BeginPrint => {
        sim.print_depth += 1;
        sim.next();
      }
      PrintString | PrintNumber | PrintCharacter | PrintName | PrintFixed | PrintLocalized
      | PrintBind | PrintBinary | PrintHex => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.pop(1);
        sim.next();
      }
      PrintMapCharArray | PrintWorldCharArray | PrintGlobalCharArray => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.pop(2);
        sim.next();
      }
      PrintMapChRange | PrintWorldChRange | PrintGlobalChRange => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.pop(4);
        sim.next();
      }
      EndPrint | EndPrintBold | EndLog => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.print_depth -= 1;
        sim.next();
      }
      SaveString => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.print_depth -= 1;
        sim.push(1);
        sim.next();
      }
      MoreHudMessage => {
        if sim.print_depth == 0 {
          sim.reject();
          return Ok(());
        }
        sim.more_args = sim.stack_size;
        sim.more_args_given = true;
        sim.next();
      }
      OptHudMessage => {
        if sim.print_depth == 0 || !sim.more_args_given {
          sim.reject();
          return Ok(());
        }
        sim.optional_args = sim.stack_size;
        sim.optional_args_given = true;
        sim.next();
      }
      EndHudMessage | EndHudMessageBold => {
        if sim.print_depth == 0 || !sim.more_args_given {
          sim.reject();
          return Ok(());
        }
        if sim.optional_args_given {
          sim.pop(sim.stack_size - sim.optional_args);
        }
        sim.pop(sim.stack_size - sim.more_args);
        sim.next();
        sim.print_depth -= 1;
      }
      StrCpyToMapChRange | StrCpyToWorldChRange | StrCpyToGlobalChRange => {
        sim.pop(6);
        sim.push(1);
        sim.next();
      }
      Lspec1 | Lspec2 | Lspec3 | Lspec4 | Lspec5 => {
        self.examine_call_aspec(body, sim)?;
      }
      Lspec5Ex => {
        sim.pop(5);
        sim.next();
      }
      Lspec1Direct | Lspec2Direct | Lspec3Direct | Lspec4Direct | Lspec5Direct
      | Lspec1DirectB | Lspec2DirectB | Lspec3DirectB | Lspec4DirectB | Lspec5DirectB => {
        sim.next();
        if sim.stack_size == 0 {
          sim.done = true;
        } else {
          sim.reject();
        }
      }
      Lspec5Result | Lspec5ExResult => {
        sim.pop(5);
        sim.push(1);
        sim.next();
      }
      Call | CallDiscard => {
        let index = body.generic_args(sim.pos)[0];
        match self.call_user_func(index, opcode == CallDiscard)? {
          Some(max_param) => {
            sim.pop(max_param as i32);
            if opcode == Call {
              sim.push(1);
            }
            sim.next();
          }
          None => sim.reject(),
        }
      }
      CallFunc => {
        self.examine_call_ext(body, sim);
      }
      StartTranslation => {
        if sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.pop(1);
        sim.next();
        sim.translation = true;
      }
      TranslationRange1 => {
        if !sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.pop(4);
        sim.next();
      }
      TranslationRange2 | TranslationRange3 => {
        if !sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.pop(8);
        sim.next();
      }
      TranslationRange4 => {
        if !sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.pop(5);
        sim.next();
      }
      TranslationRange5 => {
        if !sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.pop(6);
        sim.next();
      }
      EndTranslation => {
        if !sim.translation {
          sim.reject();
          return Ok(());
        }
        sim.next();
        sim.translation = false;
        sim.done = true;
      }
      _ => {
        if let Some((_, func)) = self.module.builtins.ded_func(opcode) {
          if is_ded_direct(opcode) {
            // Arguments travel inline, not on the stack.
            if func.returns_value() {
              sim.push(1);
            }
          } else {
            sim.pop(func.max_param as i32);
            if func.returns_value() {
              sim.push(1);
            }
          }
          sim.next();
          if sim.stack_size == 0 {
            sim.done = true;
          }
        } else if sim.stack_size == 1 && sim.print_depth == 0 && !sim.translation {
          // An unrecognized consumer of the single value ends the
          // expression, e.g. a conditional jump.
          sim.done = true;
        } else {
          sim.reject();
        }
      }
    }
    Ok(())
  }

  fn examine_call_aspec(&self, body: &mut Body, sim: &mut Sim) -> TaskResult<()> {
    let lspec = sim.pos;
    let opcode = body.opcode(lspec);
    let id = body.generic_args(lspec)[0];
    sim.pop((opcode as u16 - Opcode::Lspec1 as u16) as i32 + 1);
    sim.next();
    if id == ASPEC_ACS_EXECUTE
      && sim.pos < body.pcodes.len()
      && body.opcode(sim.pos) == Opcode::ScriptWait
    {
      sim.pop(1);
      sim.next();
      self.attach_intern_note(body, lspec, INTERN_ACS_EXECUTE_WAIT, sim.pos);
    }
    if sim.stack_size == 0 {
      sim.done = true;
    } else {
      sim.reject();
    }
    Ok(())
  }

  fn examine_call_ext(&self, body: &mut Body, sim: &mut Sim) {
    let callfunc = sim.pos;
    let args = body.generic_args(callfunc);
    let (argc, id) = (args[0], args[1]);
    sim.pop(argc);
    sim.push(1);
    sim.next();
    if id == EXTFUNC_ACS_NAMED_EXECUTE
      && sim.pos + 1 < body.pcodes.len()
      && body.opcode(sim.pos) == Opcode::Drop
      && body.opcode(sim.pos + 1) == Opcode::ScriptWaitNamed
    {
      sim.pop(2);
      sim.next();
      sim.next();
      self.attach_intern_note(body, callfunc, INTERN_ACS_NAMED_EXECUTE_WAIT, sim.pos);
    }
  }
}

fn is_var_assign(opcode: Opcode) -> bool {
  use Opcode::*;
  matches!(
    opcode,
    AssignScriptVar
      | AddScriptVar
      | SubScriptVar
      | MulScriptVar
      | DivScriptVar
      | ModScriptVar
      | AndScriptVar
      | EorScriptVar
      | OrScriptVar
      | LsScriptVar
      | RsScriptVar
      | AssignMapVar
      | AddMapVar
      | SubMapVar
      | MulMapVar
      | DivMapVar
      | ModMapVar
      | AndMapVar
      | EorMapVar
      | OrMapVar
      | LsMapVar
      | RsMapVar
      | AssignWorldVar
      | AddWorldVar
      | SubWorldVar
      | MulWorldVar
      | DivWorldVar
      | ModWorldVar
      | AndWorldVar
      | EorWorldVar
      | OrWorldVar
      | LsWorldVar
      | RsWorldVar
      | AssignGlobalVar
      | AddGlobalVar
      | SubGlobalVar
      | MulGlobalVar
      | DivGlobalVar
      | ModGlobalVar
      | AndGlobalVar
      | EorGlobalVar
      | OrGlobalVar
      | LsGlobalVar
      | RsGlobalVar
  )
}

fn is_array_assign(opcode: Opcode) -> bool {
  use Opcode::*;
  matches!(
    opcode,
    AssignScriptArray
      | AddScriptArray
      | SubScriptArray
      | MulScriptArray
      | DivScriptArray
      | ModScriptArray
      | AndScriptArray
      | EorScriptArray
      | OrScriptArray
      | LsScriptArray
      | RsScriptArray
      | AssignMapArray
      | AddMapArray
      | SubMapArray
      | MulMapArray
      | DivMapArray
      | ModMapArray
      | AndMapArray
      | EorMapArray
      | OrMapArray
      | LsMapArray
      | RsMapArray
      | AssignWorldArray
      | AddWorldArray
      | SubWorldArray
      | MulWorldArray
      | DivWorldArray
      | ModWorldArray
      | AndWorldArray
      | EorWorldArray
      | OrWorldArray
      | LsWorldArray
      | RsWorldArray
      | AssignGlobalArray
      | AddGlobalArray
      | SubGlobalArray
      | MulGlobalArray
      | DivGlobalArray
      | ModGlobalArray
      | AndGlobalArray
      | EorGlobalArray
      | OrGlobalArray
      | LsGlobalArray
      | RsGlobalArray
  )
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
