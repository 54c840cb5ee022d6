use num_derive::FromPrimitive;

use crate::note::Note;

/// The instruction set of the ACS virtual machine.
///
/// **NOTE:** The declaration order mirrors the engine's pcode numbering.
/// Reordering members changes the on-disk opcode values and breaks every
/// object file ever compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum Opcode {
  // 0
  Nop,
  Terminate,
  Suspend,
  PushNumber,
  Lspec1,
  Lspec2,
  Lspec3,
  Lspec4,
  Lspec5,
  Lspec1Direct,
  // 10
  Lspec2Direct,
  Lspec3Direct,
  Lspec4Direct,
  Lspec5Direct,
  Add,
  Subtract,
  Multiply,
  Divide,
  Modulus,
  Eq,
  // 20
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
  AssignScriptVar,
  AssignMapVar,
  AssignWorldVar,
  PushScriptVar,
  PushMapVar,
  // 30
  PushWorldVar,
  AddScriptVar,
  AddMapVar,
  AddWorldVar,
  SubScriptVar,
  SubMapVar,
  SubWorldVar,
  MulScriptVar,
  MulMapVar,
  MulWorldVar,
  // 40
  DivScriptVar,
  DivMapVar,
  DivWorldVar,
  ModScriptVar,
  ModMapVar,
  ModWorldVar,
  IncScriptVar,
  IncMapVar,
  IncWorldVar,
  DecScriptVar,
  // 50
  DecMapVar,
  DecWorldVar,
  Goto,
  IfGoto,
  Drop,
  Delay,
  DelayDirect,
  Random,
  RandomDirect,
  ThingCount,
  // 60
  ThingCountDirect,
  TagWait,
  TagWaitDirect,
  PolyWait,
  PolyWaitDirect,
  ChangeFloor,
  ChangeFloorDirect,
  ChangeCeiling,
  ChangeCeilingDirect,
  Restart,
  // 70
  AndLogical,
  OrLogical,
  AndBitwise,
  OrBitwise,
  EorBitwise,
  NegateLogical,
  LShift,
  RShift,
  UnaryMinus,
  IfNotGoto,
  // 80
  LineSide,
  ScriptWait,
  ScriptWaitDirect,
  ClearLineSpecial,
  CaseGoto,
  BeginPrint,
  EndPrint,
  PrintString,
  PrintNumber,
  PrintCharacter,
  // 90
  PlayerCount,
  GameType,
  GameSkill,
  Timer,
  SectorSound,
  AmbientSound,
  SoundSequence,
  SetLineTexture,
  SetLineBlocking,
  SetLineSpecial,
  // 100
  ThingSound,
  EndPrintBold,
  ActivatorSound,
  LocalAmbientSound,
  SetLineMonsterBlocking,
  PlayerBlueSkull,
  PlayerRedSkull,
  PlayerYellowSkull,
  PlayerMasterSkull,
  PlayerBlueCard,
  // 110
  PlayerRedCard,
  PlayerYellowCard,
  PlayerMasterCard,
  PlayerBlackSkull,
  PlayerSilverSkull,
  PlayerGoldSkull,
  PlayerBlackCard,
  PlayerSilverCard,
  IsNetworkGame,
  PlayerTeam,
  // 120
  PlayerHealth,
  PlayerArmorPoints,
  PlayerFrags,
  PlayerExpert,
  BlueTeamCount,
  RedTeamCount,
  BlueTeamScore,
  RedTeamScore,
  IsOneFlagCtf,
  GetInvasionWave,
  // 130
  GetInvasionState,
  PrintName,
  MusicChange,
  ConsoleCommandDirect,
  ConsoleCommand,
  SinglePlayer,
  FixedMul,
  FixedDiv,
  SetGravity,
  SetGravityDirect,
  // 140
  SetAirControl,
  SetAirControlDirect,
  ClearInventory,
  GiveInventory,
  GiveInventoryDirect,
  TakeInventory,
  TakeInventoryDirect,
  CheckInventory,
  CheckInventoryDirect,
  Spawn,
  // 150
  SpawnDirect,
  SpawnSpot,
  SpawnSpotDirect,
  SetMusic,
  SetMusicDirect,
  LocalSetMusic,
  LocalSetMusicDirect,
  PrintFixed,
  PrintLocalized,
  MoreHudMessage,
  // 160
  OptHudMessage,
  EndHudMessage,
  EndHudMessageBold,
  SetStyle,
  SetStyleDirect,
  SetFont,
  SetFontDirect,
  PushByte,
  Lspec1DirectB,
  Lspec2DirectB,
  // 170
  Lspec3DirectB,
  Lspec4DirectB,
  Lspec5DirectB,
  DelayDirectB,
  RandomDirectB,
  PushBytes,
  Push2Bytes,
  Push3Bytes,
  Push4Bytes,
  Push5Bytes,
  // 180
  SetThingSpecial,
  AssignGlobalVar,
  PushGlobalVar,
  AddGlobalVar,
  SubGlobalVar,
  MulGlobalVar,
  DivGlobalVar,
  ModGlobalVar,
  IncGlobalVar,
  DecGlobalVar,
  // 190
  FadeTo,
  FadeRange,
  CancelFade,
  PlayMovie,
  SetFloorTrigger,
  SetCeilingTrigger,
  GetActorX,
  GetActorY,
  GetActorZ,
  StartTranslation,
  // 200
  TranslationRange1,
  TranslationRange2,
  EndTranslation,
  Call,
  CallDiscard,
  ReturnVoid,
  ReturnVal,
  PushMapArray,
  AssignMapArray,
  AddMapArray,
  // 210
  SubMapArray,
  MulMapArray,
  DivMapArray,
  ModMapArray,
  IncMapArray,
  DecMapArray,
  Dup,
  Swap,
  WriteToIni,
  GetFromIni,
  // 220
  Sin,
  Cos,
  VectorAngle,
  CheckWeapon,
  SetWeapon,
  TagString,
  PushWorldArray,
  AssignWorldArray,
  AddWorldArray,
  SubWorldArray,
  // 230
  MulWorldArray,
  DivWorldArray,
  ModWorldArray,
  IncWorldArray,
  DecWorldArray,
  PushGlobalArray,
  AssignGlobalArray,
  AddGlobalArray,
  SubGlobalArray,
  MulGlobalArray,
  // 240
  DivGlobalArray,
  ModGlobalArray,
  IncGlobalArray,
  DecGlobalArray,
  SetMarineWeapon,
  SetActorProperty,
  GetActorProperty,
  PlayerNumber,
  ActivatorTid,
  SetMarineSprite,
  // 250
  GetScreenWidth,
  GetScreenHeight,
  ThingProjectile2,
  StrLen,
  SetHudSize,
  GetCvar,
  CaseGotoSorted,
  SetResultValue,
  GetLineRowOffset,
  GetActorFloorZ,
  // 260
  GetActorAngle,
  GetSectorFloorZ,
  GetSectorCeilingZ,
  Lspec5Result,
  GetSigilPieces,
  GetLevelInfo,
  ChangeSky,
  PlayerInGame,
  PlayerIsBot,
  SetCameraToTexture,
  // 270
  EndLog,
  GetAmmoCapacity,
  SetAmmoCapacity,
  PrintMapCharArray,
  PrintWorldCharArray,
  PrintGlobalCharArray,
  SetActorAngle,
  GrabInput,
  SetMousePointer,
  MoveMousePointer,
  // 280
  SpawnProjectile,
  GetSectorLightLevel,
  GetActorCeilingZ,
  SetActorPosition,
  ClearActorInventory,
  GiveActorInventory,
  TakeActorInventory,
  CheckActorInventory,
  ThingCountName,
  SpawnSpotFacing,
  // 290
  PlayerClass,
  AndScriptVar,
  AndMapVar,
  AndWorldVar,
  AndGlobalVar,
  AndMapArray,
  AndWorldArray,
  AndGlobalArray,
  EorScriptVar,
  EorMapVar,
  // 300
  EorWorldVar,
  EorGlobalVar,
  EorMapArray,
  EorWorldArray,
  EorGlobalArray,
  OrScriptVar,
  OrMapVar,
  OrWorldVar,
  OrGlobalVar,
  OrMapArray,
  // 310
  OrWorldArray,
  OrGlobalArray,
  LsScriptVar,
  LsMapVar,
  LsWorldVar,
  LsGlobalVar,
  LsMapArray,
  LsWorldArray,
  LsGlobalArray,
  RsScriptVar,
  // 320
  RsMapVar,
  RsWorldVar,
  RsGlobalVar,
  RsMapArray,
  RsWorldArray,
  RsGlobalArray,
  GetPlayerInfo,
  ChangeLevel,
  SectorDamage,
  ReplaceTextures,
  // 330
  NegateBinary,
  GetActorPitch,
  SetActorPitch,
  PrintBind,
  SetActorState,
  ThingDamage2,
  UseInventory,
  UseActorInventory,
  CheckActorCeilingTexture,
  CheckActorFloorTexture,
  // 340
  GetActorLightLevel,
  SetMugShotState,
  ThingCountSector,
  ThingCountNameSector,
  CheckPlayerCamera,
  MorphActor,
  UnmorphActor,
  GetPlayerInput,
  ClassifyActor,
  PrintBinary,
  // 350
  PrintHex,
  CallFunc,
  SaveString,
  PrintMapChRange,
  PrintWorldChRange,
  PrintGlobalChRange,
  StrCpyToMapChRange,
  StrCpyToWorldChRange,
  StrCpyToGlobalChRange,
  PushFunction,
  // 360
  CallStack,
  ScriptWaitNamed,
  TranslationRange3,
  GotoStack,
  AssignScriptArray,
  PushScriptArray,
  AddScriptArray,
  SubScriptArray,
  MulScriptArray,
  DivScriptArray,
  // 370
  ModScriptArray,
  IncScriptArray,
  DecScriptArray,
  AndScriptArray,
  EorScriptArray,
  OrScriptArray,
  LsScriptArray,
  RsScriptArray,
  PrintScriptCharArray,
  PrintScriptChRange,
  // 380
  StrCpyToScriptChRange,
  Lspec5Ex,
  Lspec5ExResult,
  TranslationRange4,
  TranslationRange5,
}

impl Opcode {
  /// Number of declared integer arguments of a generic instruction.
  ///
  /// `PushBytes` and the sorted case table carry a count-prefixed payload and
  /// are decoded separately; jumps and case jumps likewise have dedicated
  /// readers. Everything not listed here has no arguments.
  pub fn arg_count(self) -> u32 {
    use Opcode::*;
    match self {
      Lspec1Direct => 2,
      Lspec2Direct => 3,
      Lspec3Direct => 4,
      Lspec4Direct => 5,
      Lspec5Direct => 6,
      Lspec1DirectB => 2,
      Lspec2DirectB => 3,
      Lspec3DirectB => 4,
      Lspec4DirectB => 5,
      Lspec5DirectB => 6,
      PushNumber | PushByte => 1,
      Push2Bytes => 2,
      Push3Bytes => 3,
      Push4Bytes => 4,
      Push5Bytes => 5,
      Lspec1 | Lspec2 | Lspec3 | Lspec4 | Lspec5 => 1,
      Lspec5Result | Lspec5Ex | Lspec5ExResult => 1,
      Call | CallDiscard | PushFunction => 1,
      CallFunc => 2,
      DelayDirect | DelayDirectB => 1,
      RandomDirect | RandomDirectB => 2,
      ThingCountDirect => 2,
      TagWaitDirect | PolyWaitDirect | ScriptWaitDirect => 1,
      ChangeFloorDirect | ChangeCeilingDirect => 2,
      ConsoleCommandDirect => 3,
      SetGravityDirect | SetAirControlDirect => 1,
      GiveInventoryDirect | TakeInventoryDirect => 2,
      CheckInventoryDirect => 1,
      SpawnDirect => 6,
      SpawnSpotDirect => 4,
      SetMusicDirect | LocalSetMusicDirect => 3,
      SetStyleDirect | SetFontDirect => 1,
      _ if self.is_var_access() => 1,
      _ => 0,
    }
  }

  /// Whether the opcode reads or writes a variable or array slot. All of
  /// these carry a single slot-index argument.
  pub fn is_var_access(self) -> bool {
    use Opcode::*;
    matches!(
      self,
      AssignScriptVar
        | AssignMapVar
        | AssignWorldVar
        | AssignGlobalVar
        | PushScriptVar
        | PushMapVar
        | PushWorldVar
        | PushGlobalVar
        | AddScriptVar
        | AddMapVar
        | AddWorldVar
        | AddGlobalVar
        | SubScriptVar
        | SubMapVar
        | SubWorldVar
        | SubGlobalVar
        | MulScriptVar
        | MulMapVar
        | MulWorldVar
        | MulGlobalVar
        | DivScriptVar
        | DivMapVar
        | DivWorldVar
        | DivGlobalVar
        | ModScriptVar
        | ModMapVar
        | ModWorldVar
        | ModGlobalVar
        | IncScriptVar
        | IncMapVar
        | IncWorldVar
        | IncGlobalVar
        | DecScriptVar
        | DecMapVar
        | DecWorldVar
        | DecGlobalVar
        | AndScriptVar
        | AndMapVar
        | AndWorldVar
        | AndGlobalVar
        | EorScriptVar
        | EorMapVar
        | EorWorldVar
        | EorGlobalVar
        | OrScriptVar
        | OrMapVar
        | OrWorldVar
        | OrGlobalVar
        | LsScriptVar
        | LsMapVar
        | LsWorldVar
        | LsGlobalVar
        | RsScriptVar
        | RsMapVar
        | RsWorldVar
        | RsGlobalVar
        | PushScriptArray
        | PushMapArray
        | PushWorldArray
        | PushGlobalArray
        | AssignScriptArray
        | AssignMapArray
        | AssignWorldArray
        | AssignGlobalArray
        | AddScriptArray
        | AddMapArray
        | AddWorldArray
        | AddGlobalArray
        | SubScriptArray
        | SubMapArray
        | SubWorldArray
        | SubGlobalArray
        | MulScriptArray
        | MulMapArray
        | MulWorldArray
        | MulGlobalArray
        | DivScriptArray
        | DivMapArray
        | DivWorldArray
        | DivGlobalArray
        | ModScriptArray
        | ModMapArray
        | ModWorldArray
        | ModGlobalArray
        | IncScriptArray
        | IncMapArray
        | IncWorldArray
        | IncGlobalArray
        | DecScriptArray
        | DecMapArray
        | DecWorldArray
        | DecGlobalArray
        | AndScriptArray
        | AndMapArray
        | AndWorldArray
        | AndGlobalArray
        | EorScriptArray
        | EorMapArray
        | EorWorldArray
        | EorGlobalArray
        | OrScriptArray
        | OrMapArray
        | OrWorldArray
        | OrGlobalArray
        | LsScriptArray
        | LsMapArray
        | LsWorldArray
        | LsGlobalArray
        | RsScriptArray
        | RsMapArray
        | RsWorldArray
        | RsGlobalArray
    )
  }

  /// Whether the opcode is one of the three plain jumps.
  pub fn is_jump(self) -> bool {
    matches!(self, Opcode::Goto | Opcode::IfGoto | Opcode::IfNotGoto)
  }
}

/// Object-file position of the synthetic sentinel appended after each body.
/// Past every real instruction, so range-end comparisons stay uniform.
pub const SENTINEL_OBJ_POS: u32 = u32::MAX;

/// Argument payload of a decoded instruction.
#[derive(Debug, Clone)]
pub enum PcodeArgs {
  None,
  Jump(JumpArgs),
  Case(CaseArgs),
  SortedCase(Vec<CaseArgs>),
  Generic(Vec<i32>),
}

/// A jump target, as read and as patched.
#[derive(Debug, Clone)]
pub struct JumpArgs {
  pub destination_obj_pos: i32,
  /// Index of the destination instruction inside the body. Valid after
  /// patching.
  pub destination: usize,
}

/// One `(value, destination)` pair of a case table.
#[derive(Debug, Clone)]
pub struct CaseArgs {
  pub value: i32,
  pub destination_obj_pos: i32,
  pub destination: usize,
}

/// A decoded instruction.
#[derive(Debug, Clone)]
pub struct Pcode {
  pub opcode: Opcode,
  pub obj_pos: u32,
  pub args: PcodeArgs,
  /// Structural notes, most recently attached last. The recoverer consumes
  /// from the back.
  pub notes: Vec<Note>,
}

impl Pcode {
  pub fn new(opcode: Opcode, obj_pos: u32, args: PcodeArgs) -> Self {
    Pcode {
      opcode,
      obj_pos,
      args,
      notes: vec![],
    }
  }
}

/// The decoded instruction list of one script or function body. The last
/// entry is always the synthetic sentinel.
#[derive(Debug, Clone, Default)]
pub struct Body {
  pub pcodes: Vec<Pcode>,
}

impl Body {
  /// A body holding nothing but the sentinel decodes no statements.
  pub fn is_empty(&self) -> bool {
    self.pcodes.len() < 2
  }

  /// The range covering every real instruction, sentinel excluded.
  pub fn full_range(&self) -> PcodeRange {
    PcodeRange::new(0, self.pcodes.len().saturating_sub(2))
  }

  pub fn get(&self, idx: usize) -> &Pcode {
    &self.pcodes[idx]
  }

  pub fn opcode(&self, idx: usize) -> Opcode {
    self.pcodes[idx].opcode
  }

  pub fn jump(&self, idx: usize) -> &JumpArgs {
    match &self.pcodes[idx].args {
      PcodeArgs::Jump(jump) => jump,
      _ => unreachable!("instruction at {} is not a jump", idx),
    }
  }

  pub fn case_jump(&self, idx: usize) -> &CaseArgs {
    match &self.pcodes[idx].args {
      PcodeArgs::Case(case) => case,
      _ => unreachable!("instruction at {} is not a case jump", idx),
    }
  }

  pub fn sorted_case_jump(&self, idx: usize) -> &[CaseArgs] {
    match &self.pcodes[idx].args {
      PcodeArgs::SortedCase(cases) => cases,
      _ => unreachable!("instruction at {} is not a sorted case jump", idx),
    }
  }

  /// Integer arguments of a generic instruction; empty for argument-less
  /// opcodes.
  pub fn generic_args(&self, idx: usize) -> &[i32] {
    match &self.pcodes[idx].args {
      PcodeArgs::Generic(args) => args,
      PcodeArgs::None => &[],
      _ => unreachable!("instruction at {} is not generic", idx),
    }
  }
}

/// An inclusive sub-range of a body. Instructions are stored in strictly
/// increasing object-file position, so index comparisons are equivalent to
/// position comparisons.
#[derive(Debug, Clone, Copy)]
pub struct PcodeRange {
  pub start: usize,
  pub end: usize,
}

impl PcodeRange {
  pub fn new(start: usize, end: usize) -> Self {
    PcodeRange { start, end }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use num_traits::FromPrimitive;

  #[test]
  fn opcode_numbering_is_stable() {
    assert_eq!(Opcode::from_u16(0), Some(Opcode::Nop));
    assert_eq!(Opcode::from_u16(1), Some(Opcode::Terminate));
    assert_eq!(Opcode::from_u16(3), Some(Opcode::PushNumber));
    assert_eq!(Opcode::from_u16(4), Some(Opcode::Lspec1));
    assert_eq!(Opcode::from_u16(52), Some(Opcode::Goto));
    assert_eq!(Opcode::from_u16(53), Some(Opcode::IfGoto));
    assert_eq!(Opcode::from_u16(79), Some(Opcode::IfNotGoto));
    assert_eq!(Opcode::from_u16(84), Some(Opcode::CaseGoto));
    assert_eq!(Opcode::from_u16(167), Some(Opcode::PushByte));
    assert_eq!(Opcode::from_u16(203), Some(Opcode::Call));
    assert_eq!(Opcode::from_u16(216), Some(Opcode::Dup));
    assert_eq!(Opcode::from_u16(256), Some(Opcode::CaseGotoSorted));
    assert_eq!(Opcode::from_u16(263), Some(Opcode::Lspec5Result));
    assert_eq!(Opcode::from_u16(270), Some(Opcode::EndLog));
    assert_eq!(Opcode::from_u16(330), Some(Opcode::NegateBinary));
    assert_eq!(Opcode::from_u16(351), Some(Opcode::CallFunc));
    assert_eq!(Opcode::from_u16(361), Some(Opcode::ScriptWaitNamed));
    assert_eq!(Opcode::from_u16(384), Some(Opcode::TranslationRange5));
    assert_eq!(Opcode::from_u16(385), None);
  }

  #[test]
  fn arg_counts_match_pcode_encoding() {
    assert_eq!(Opcode::PushNumber.arg_count(), 1);
    assert_eq!(Opcode::Lspec5Direct.arg_count(), 6);
    assert_eq!(Opcode::CallFunc.arg_count(), 2);
    assert_eq!(Opcode::AssignScriptVar.arg_count(), 1);
    assert_eq!(Opcode::RsGlobalArray.arg_count(), 1);
    assert_eq!(Opcode::Add.arg_count(), 0);
    assert_eq!(Opcode::Terminate.arg_count(), 0);
  }
}
