//! Instruction decoding and jump patching.

use num_traits::FromPrimitive;

use task::errors::{bail, diag_err, TaskResult};
use task::module::Module;
use task::pcode::{Body, CaseArgs, JumpArgs, Opcode, Pcode, PcodeArgs};

use crate::Cursor;

/// Decodes one body's byte range into an instruction list. `base` is the
/// absolute file offset of the range; instruction identities are absolute
/// positions. A synthetic `Terminate` sentinel positioned at the end of the
/// range is appended last.
pub(crate) fn read_pcode_list(data: &[u8], base: u32, small_code: bool) -> TaskResult<Body> {
  let mut cursor = Cursor::new(data, "object file".to_string());
  let mut body = Body::default();
  while cursor.has_data() {
    read_pcode(&mut body, &mut cursor, base, small_code)?;
  }
  body.pcodes.push(Pcode::new(
    Opcode::Terminate,
    base + data.len() as u32,
    PcodeArgs::None,
  ));
  Ok(body)
}

fn read_pcode(
  body: &mut Body,
  cursor: &mut Cursor,
  base: u32,
  small_code: bool,
) -> TaskResult<()> {
  let obj_pos = base + cursor.pos() as u32;
  let opcode = read_opcode(cursor, obj_pos, small_code)?;
  let args = match opcode {
    Opcode::Goto | Opcode::IfGoto | Opcode::IfNotGoto => PcodeArgs::Jump(JumpArgs {
      destination_obj_pos: cursor.read_i32()?,
      destination: 0,
    }),
    Opcode::CaseGoto => {
      let value = cursor.read_i32()?;
      let destination_obj_pos = cursor.read_i32()?;
      PcodeArgs::Case(CaseArgs {
        value,
        destination_obj_pos,
        destination: 0,
      })
    }
    Opcode::CaseGotoSorted => read_sorted_case_table(cursor, base)?,
    Opcode::PushBytes => {
      let count = cursor.read_u8()?;
      let mut args = vec![count as i32];
      for _ in 0..count {
        args.push(cursor.read_u8()? as i32);
      }
      PcodeArgs::Generic(args)
    }
    _ => read_generic(cursor, opcode, small_code)?,
  };
  body.pcodes.push(Pcode::new(opcode, obj_pos, args));
  Ok(())
}

fn read_opcode(cursor: &mut Cursor, obj_pos: u32, small_code: bool) -> TaskResult<Opcode> {
  let raw = if small_code {
    let mut raw = cursor.read_u8()? as i32;
    if raw >= 240 {
      raw += cursor.read_u8()? as i32;
    }
    raw
  } else {
    cursor.read_i32()?
  };
  let opcode = match u16::try_from(raw).ok().and_then(Opcode::from_u16) {
    Some(opcode) => opcode,
    None => {
      diag_err(format!(
        "encountered unknown pcode (opcode: {}) at position {}",
        raw, obj_pos
      ));
      return bail();
    }
  };
  Ok(opcode)
}

/// The sorted case table is 4-byte aligned relative to the object file, then
/// a count followed by that many `(value, destination)` pairs.
fn read_sorted_case_table(cursor: &mut Cursor, base: u32) -> TaskResult<PcodeArgs> {
  let abs = base as usize + cursor.pos();
  let aligned = (abs + 3) & !0x3;
  cursor.set_pos(cursor.pos() + (aligned - abs));
  let count = cursor.read_i32()?;
  let mut cases = Vec::with_capacity(count.max(0) as usize);
  for _ in 0..count {
    let value = cursor.read_i32()?;
    let destination_obj_pos = cursor.read_i32()?;
    cases.push(CaseArgs {
      value,
      destination_obj_pos,
      destination: 0,
    });
  }
  Ok(PcodeArgs::SortedCase(cases))
}

fn read_generic(cursor: &mut Cursor, opcode: Opcode, small_code: bool) -> TaskResult<PcodeArgs> {
  let count = opcode.arg_count();
  if count == 0 {
    return Ok(PcodeArgs::None);
  }
  let mut args = Vec::with_capacity(count as usize);
  for arg_number in 0..count {
    args.push(read_generic_arg(cursor, opcode, arg_number, small_code)?);
  }
  Ok(PcodeArgs::Generic(args))
}

fn read_generic_arg(
  cursor: &mut Cursor,
  opcode: Opcode,
  arg_number: u32,
  small_code: bool,
) -> TaskResult<i32> {
  use Opcode::*;
  match opcode {
    // Inline literal arguments of the byte-packed instruction families.
    PushByte | Push2Bytes | Push3Bytes | Push4Bytes | Push5Bytes | Lspec1DirectB
    | Lspec2DirectB | Lspec3DirectB | Lspec4DirectB | Lspec5DirectB | DelayDirectB
    | RandomDirectB => Ok(cursor.read_u8()? as i32),
    // The special number shrinks in compact mode; the literal arguments
    // that follow stay full-width.
    Lspec1Direct | Lspec2Direct | Lspec3Direct | Lspec4Direct | Lspec5Direct => {
      if small_code && arg_number == 0 {
        Ok(cursor.read_u8()? as i32)
      } else {
        cursor.read_i32()
      }
    }
    CallFunc => {
      if small_code {
        // Argument-count field, then function-index field.
        if arg_number == 0 {
          Ok(cursor.read_u8()? as i32)
        } else {
          Ok(cursor.read_i16()? as i32)
        }
      } else {
        cursor.read_i32()
      }
    }
    // Always full-width: the stack-literal push and the direct arguments of
    // dedicated functions.
    PushNumber | DelayDirect | RandomDirect | ThingCountDirect | TagWaitDirect
    | PolyWaitDirect | ChangeFloorDirect | ChangeCeilingDirect | ScriptWaitDirect
    | ConsoleCommandDirect | SetGravityDirect | SetAirControlDirect | GiveInventoryDirect
    | TakeInventoryDirect | CheckInventoryDirect | SpawnDirect | SpawnSpotDirect
    | SetMusicDirect | LocalSetMusicDirect | SetStyleDirect | SetFontDirect | Lspec5Ex
    | Lspec5ExResult => cursor.read_i32(),
    // Slot indexes, special numbers, and function indexes pack into a byte
    // in compact mode.
    _ => {
      if small_code {
        Ok(cursor.read_u8()? as i32)
      } else {
        cursor.read_i32()
      }
    }
  }
}

/// Connects every jump to its destination instruction, in every body.
pub(crate) fn patch(module: &mut Module) -> TaskResult<()> {
  for script in &mut module.scripts {
    patch_body(&mut script.body)?;
  }
  for func in &mut module.funcs {
    patch_body(&mut func.body)?;
  }
  Ok(())
}

fn patch_body(body: &mut Body) -> TaskResult<()> {
  let positions: Vec<u32> = body.pcodes.iter().map(|pcode| pcode.obj_pos).collect();
  for idx in 0..body.pcodes.len() {
    match &mut body.pcodes[idx].args {
      PcodeArgs::Jump(jump) => {
        jump.destination = find_destination(&positions, idx, jump.destination_obj_pos)?;
      }
      PcodeArgs::Case(case) => {
        case.destination = find_destination(&positions, idx, case.destination_obj_pos)?;
      }
      PcodeArgs::SortedCase(cases) => {
        for case in cases {
          case.destination = find_destination(&positions, idx, case.destination_obj_pos)?;
        }
      }
      _ => {}
    }
  }
  Ok(())
}

/// Searches forward of the jump when the target is at a greater position,
/// else from the body start. The sentinel is a valid target: a jump to the
/// exact end of the body resolves to it.
fn find_destination(positions: &[u32], jump_idx: usize, obj_pos: i32) -> TaskResult<usize> {
  let found = if obj_pos > positions[jump_idx] as i32 {
    (jump_idx + 1..positions.len()).find(|&i| positions[i] as i32 == obj_pos)
  } else {
    (0..=jump_idx).find(|&i| positions[i] as i32 == obj_pos)
  };
  match found {
    Some(idx) => Ok(idx),
    None => {
      diag_err(format!(
        "jump at position {} targets position {}, but no instruction is there",
        positions[jump_idx], obj_pos
      ));
      bail()
    }
  }
}
