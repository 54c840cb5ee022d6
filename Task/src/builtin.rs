//! The builtin-function catalog.
//!
//! Each engine builtin is declared once as a `(name, format, key)` record;
//! the key is an opcode for dedicated and format functions, a CallFunc id
//! for extension functions, and a small ordinal for the synthetic internal
//! functions. Format strings follow the engine convention: an optional
//! return-type character, `;`, required parameter characters, `;`, optional
//! parameter characters. Type characters: `i` int, `r` raw, `f` fixed,
//! `b` bool, `s` string.

use hashbrown::HashMap;

use crate::ast::Spec;
use crate::errors::{bail, diag_internal_err, TaskResult};
use crate::pcode::Opcode;

/// A dedicated function: identity is its opcode.
struct DedDef {
  name: &'static str,
  format: &'static str,
  opcode: Opcode,
}

/// A format (print-family) function: identity is its terminator opcode.
struct FormatDef {
  name: &'static str,
  format: &'static str,
  opcode: Opcode,
}

/// An extension function: identity is its CallFunc id.
struct ExtDef {
  name: &'static str,
  format: &'static str,
  id: u16,
}

/// Ordinal of the `ACS_ExecuteWait` internal function.
pub const INTERN_ACS_EXECUTE_WAIT: usize = 0;
/// Ordinal of the `ACS_NamedExecuteWait` internal function.
pub const INTERN_ACS_NAMED_EXECUTE_WAIT: usize = 1;

static DEDS: &[DedDef] = &[
  DedDef { name: "Delay", format: ";i", opcode: Opcode::Delay },
  DedDef { name: "Random", format: "i;ii", opcode: Opcode::Random },
  DedDef { name: "ThingCount", format: "i;i;i", opcode: Opcode::ThingCount },
  DedDef { name: "TagWait", format: ";i", opcode: Opcode::TagWait },
  DedDef { name: "PolyWait", format: ";i", opcode: Opcode::PolyWait },
  DedDef { name: "ChangeFloor", format: ";is", opcode: Opcode::ChangeFloor },
  DedDef { name: "ChangeCeiling", format: ";is", opcode: Opcode::ChangeCeiling },
  DedDef { name: "LineSide", format: "i", opcode: Opcode::LineSide },
  DedDef { name: "ScriptWait", format: ";i", opcode: Opcode::ScriptWait },
  DedDef { name: "ClearLineSpecial", format: "", opcode: Opcode::ClearLineSpecial },
  DedDef { name: "PlayerCount", format: "i", opcode: Opcode::PlayerCount },
  DedDef { name: "GameType", format: "i", opcode: Opcode::GameType },
  DedDef { name: "GameSkill", format: "i", opcode: Opcode::GameSkill },
  DedDef { name: "Timer", format: "i", opcode: Opcode::Timer },
  DedDef { name: "SectorSound", format: ";si", opcode: Opcode::SectorSound },
  DedDef { name: "AmbientSound", format: ";si", opcode: Opcode::AmbientSound },
  DedDef { name: "SoundSequence", format: ";s", opcode: Opcode::SoundSequence },
  DedDef { name: "SetLineTexture", format: ";iiis", opcode: Opcode::SetLineTexture },
  DedDef { name: "SetLineBlocking", format: ";ii", opcode: Opcode::SetLineBlocking },
  DedDef { name: "SetLineSpecial", format: ";ii;rrrrr", opcode: Opcode::SetLineSpecial },
  DedDef { name: "ThingSound", format: ";isi", opcode: Opcode::ThingSound },
  DedDef { name: "ActivatorSound", format: ";si", opcode: Opcode::ActivatorSound },
  DedDef { name: "LocalAmbientSound", format: ";si", opcode: Opcode::LocalAmbientSound },
  DedDef { name: "SetLineMonsterBlocking", format: ";ii", opcode: Opcode::SetLineMonsterBlocking },
  DedDef { name: "IsNetworkGame", format: "b", opcode: Opcode::IsNetworkGame },
  DedDef { name: "PlayerTeam", format: "i", opcode: Opcode::PlayerTeam },
  DedDef { name: "PlayerHealth", format: "i", opcode: Opcode::PlayerHealth },
  DedDef { name: "PlayerArmorPoints", format: "i", opcode: Opcode::PlayerArmorPoints },
  DedDef { name: "PlayerFrags", format: "i", opcode: Opcode::PlayerFrags },
  DedDef { name: "BlueCount", format: "i", opcode: Opcode::BlueTeamCount },
  DedDef { name: "BlueTeamCount", format: "i", opcode: Opcode::BlueTeamCount },
  DedDef { name: "RedCount", format: "i", opcode: Opcode::RedTeamCount },
  DedDef { name: "RedTeamCount", format: "i", opcode: Opcode::RedTeamCount },
  DedDef { name: "BlueScore", format: "i", opcode: Opcode::BlueTeamScore },
  DedDef { name: "BlueTeamScore", format: "i", opcode: Opcode::BlueTeamScore },
  DedDef { name: "RedScore", format: "i", opcode: Opcode::RedTeamScore },
  DedDef { name: "RedTeamScore", format: "i", opcode: Opcode::RedTeamScore },
  DedDef { name: "IsOneFlagCtf", format: "b", opcode: Opcode::IsOneFlagCtf },
  DedDef { name: "GetInvasionWave", format: "i", opcode: Opcode::GetInvasionWave },
  DedDef { name: "GetInvasionState", format: "i", opcode: Opcode::GetInvasionState },
  DedDef { name: "Music_Change", format: ";si", opcode: Opcode::MusicChange },
  DedDef { name: "ConsoleCommand", format: ";s;ii", opcode: Opcode::ConsoleCommand },
  DedDef { name: "SinglePlayer", format: "b", opcode: Opcode::SinglePlayer },
  DedDef { name: "FixedMul", format: "f;ff", opcode: Opcode::FixedMul },
  DedDef { name: "FixedDiv", format: "f;ff", opcode: Opcode::FixedDiv },
  DedDef { name: "SetGravity", format: ";f", opcode: Opcode::SetGravity },
  DedDef { name: "SetAirControl", format: ";f", opcode: Opcode::SetAirControl },
  DedDef { name: "ClearInventory", format: "", opcode: Opcode::ClearInventory },
  DedDef { name: "GiveInventory", format: ";si", opcode: Opcode::GiveInventory },
  DedDef { name: "TakeInventory", format: ";si", opcode: Opcode::TakeInventory },
  DedDef { name: "CheckInventory", format: "i;s", opcode: Opcode::CheckInventory },
  DedDef { name: "Spawn", format: "i;sfff;ii", opcode: Opcode::Spawn },
  DedDef { name: "SpawnSpot", format: "i;si;ii", opcode: Opcode::SpawnSpot },
  DedDef { name: "SetMusic", format: ";s;ii", opcode: Opcode::SetMusic },
  DedDef { name: "LocalSetMusic", format: ";s;ii", opcode: Opcode::LocalSetMusic },
  DedDef { name: "SetFont", format: ";s", opcode: Opcode::SetFont },
  DedDef { name: "SetThingSpecial", format: ";ii;rrrrr", opcode: Opcode::SetThingSpecial },
  DedDef { name: "FadeTo", format: ";iiiff", opcode: Opcode::FadeTo },
  DedDef { name: "FadeRange", format: ";iiifiiiff", opcode: Opcode::FadeRange },
  DedDef { name: "CancelFade", format: "", opcode: Opcode::CancelFade },
  DedDef { name: "PlayMovie", format: "i;s", opcode: Opcode::PlayMovie },
  DedDef { name: "SetFloorTrigger", format: ";iii;rrrrr", opcode: Opcode::SetFloorTrigger },
  DedDef { name: "SetCeilingTrigger", format: ";iii;rrrrr", opcode: Opcode::SetCeilingTrigger },
  DedDef { name: "GetActorX", format: "f;i", opcode: Opcode::GetActorX },
  DedDef { name: "GetActorY", format: "f;i", opcode: Opcode::GetActorY },
  DedDef { name: "GetActorZ", format: "f;i", opcode: Opcode::GetActorZ },
  DedDef { name: "Sin", format: "f;f", opcode: Opcode::Sin },
  DedDef { name: "Cos", format: "f;f", opcode: Opcode::Cos },
  DedDef { name: "VectorAngle", format: "f;ff", opcode: Opcode::VectorAngle },
  DedDef { name: "CheckWeapon", format: "b;s", opcode: Opcode::CheckWeapon },
  DedDef { name: "SetWeapon", format: "b;s", opcode: Opcode::SetWeapon },
  DedDef { name: "SetMarineWeapon", format: ";ii", opcode: Opcode::SetMarineWeapon },
  DedDef { name: "SetActorProperty", format: ";iir", opcode: Opcode::SetActorProperty },
  DedDef { name: "GetActorProperty", format: "r;ii", opcode: Opcode::GetActorProperty },
  DedDef { name: "PlayerNumber", format: "i", opcode: Opcode::PlayerNumber },
  DedDef { name: "ActivatorTid", format: "i", opcode: Opcode::ActivatorTid },
  DedDef { name: "SetMarineSprite", format: ";is", opcode: Opcode::SetMarineSprite },
  DedDef { name: "GetScreenWidth", format: "i", opcode: Opcode::GetScreenWidth },
  DedDef { name: "GetScreenHeight", format: "i", opcode: Opcode::GetScreenHeight },
  DedDef { name: "Thing_Projectile2", format: ";iiiiiii", opcode: Opcode::ThingProjectile2 },
  DedDef { name: "StrLen", format: "i;s", opcode: Opcode::StrLen },
  DedDef { name: "SetHudSize", format: ";iib", opcode: Opcode::SetHudSize },
  DedDef { name: "GetCvar", format: "i;s", opcode: Opcode::GetCvar },
  DedDef { name: "SetResultValue", format: ";i", opcode: Opcode::SetResultValue },
  DedDef { name: "GetLinerowOffset", format: "i", opcode: Opcode::GetLineRowOffset },
  DedDef { name: "GetActorFloorZ", format: "f;i", opcode: Opcode::GetActorFloorZ },
  DedDef { name: "GetActorAngle", format: "f;i", opcode: Opcode::GetActorAngle },
  DedDef { name: "GetSectorFloorZ", format: "f;iii", opcode: Opcode::GetSectorFloorZ },
  DedDef { name: "GetSectorCeilingZ", format: "f;iii", opcode: Opcode::GetSectorCeilingZ },
  DedDef { name: "GetSigilPieces", format: "i", opcode: Opcode::GetSigilPieces },
  DedDef { name: "GetLevelInfo", format: "i;i", opcode: Opcode::GetLevelInfo },
  DedDef { name: "ChangeSky", format: ";ss", opcode: Opcode::ChangeSky },
  DedDef { name: "PlayerInGame", format: "b;i", opcode: Opcode::PlayerInGame },
  DedDef { name: "PlayerIsBot", format: "b;i", opcode: Opcode::PlayerIsBot },
  DedDef { name: "setcameratotexture", format: ";isi", opcode: Opcode::SetCameraToTexture },
  DedDef { name: "GetAmmoCapacity", format: "i;s", opcode: Opcode::GetAmmoCapacity },
  DedDef { name: "SetAmmoCapacity", format: ";si", opcode: Opcode::SetAmmoCapacity },
  DedDef { name: "SetActorAngle", format: ";if", opcode: Opcode::SetActorAngle },
  DedDef { name: "SpawnProjectile", format: ";isiiiii", opcode: Opcode::SpawnProjectile },
  DedDef { name: "GetSectorLightLevel", format: "i;i", opcode: Opcode::GetSectorLightLevel },
  DedDef { name: "GetActorCeilingZ", format: "f;i", opcode: Opcode::GetActorCeilingZ },
  DedDef { name: "SetActorPosition", format: "b;ifffb", opcode: Opcode::SetActorPosition },
  DedDef { name: "ClearActorInventory", format: ";i", opcode: Opcode::ClearActorInventory },
  DedDef { name: "GiveActorInventory", format: ";isi", opcode: Opcode::GiveActorInventory },
  DedDef { name: "TakeActorInventory", format: ";isi", opcode: Opcode::TakeActorInventory },
  DedDef { name: "CheckActorInventory", format: "i;is", opcode: Opcode::CheckActorInventory },
  DedDef { name: "ThingCountName", format: "i;si", opcode: Opcode::ThingCountName },
  DedDef { name: "SpawnSpotFacing", format: "i;si;i", opcode: Opcode::SpawnSpotFacing },
  DedDef { name: "PlayerClass", format: "i;i", opcode: Opcode::PlayerClass },
  DedDef { name: "GetPlayerInfo", format: "i;ii", opcode: Opcode::GetPlayerInfo },
  DedDef { name: "ChangeLevel", format: ";sii;i", opcode: Opcode::ChangeLevel },
  DedDef { name: "SectorDamage", format: ";iissi", opcode: Opcode::SectorDamage },
  DedDef { name: "ReplaceTextures", format: ";ss;i", opcode: Opcode::ReplaceTextures },
  DedDef { name: "GetActorPitch", format: "f;i", opcode: Opcode::GetActorPitch },
  DedDef { name: "SetActorPitch", format: ";if", opcode: Opcode::SetActorPitch },
  DedDef { name: "SetActorState", format: "i;is;b", opcode: Opcode::SetActorState },
  DedDef { name: "Thing_Damage2", format: "i;iis", opcode: Opcode::ThingDamage2 },
  DedDef { name: "UseInventory", format: "i;s", opcode: Opcode::UseInventory },
  DedDef { name: "UseActorInventory", format: "i;is", opcode: Opcode::UseActorInventory },
  DedDef { name: "CheckActorCeilingTexture", format: "b;is", opcode: Opcode::CheckActorCeilingTexture },
  DedDef { name: "CheckActorFloorTexture", format: "b;is", opcode: Opcode::CheckActorFloorTexture },
  DedDef { name: "GetActorLightLevel", format: "i;i", opcode: Opcode::GetActorLightLevel },
  DedDef { name: "SetMugShotState", format: ";s", opcode: Opcode::SetMugShotState },
  DedDef { name: "ThingCountSector", format: "i;iii", opcode: Opcode::ThingCountSector },
  DedDef { name: "ThingCountNameSector", format: "i;sii", opcode: Opcode::ThingCountNameSector },
  DedDef { name: "CheckPlayerCamera", format: "i;i", opcode: Opcode::CheckPlayerCamera },
  DedDef { name: "MorphActor", format: "i;i;ssiiss", opcode: Opcode::MorphActor },
  DedDef { name: "UnmorphActor", format: "i;i;i", opcode: Opcode::UnmorphActor },
  DedDef { name: "GetPlayerInput", format: "i;ii", opcode: Opcode::GetPlayerInput },
  DedDef { name: "ClassifyActor", format: "i;i", opcode: Opcode::ClassifyActor },
  DedDef { name: "NamedScriptWait", format: ";s", opcode: Opcode::ScriptWaitNamed },
];

static FORMATS: &[FormatDef] = &[
  FormatDef { name: "Print", format: "", opcode: Opcode::EndPrint },
  FormatDef { name: "PrintBold", format: "", opcode: Opcode::EndPrintBold },
  FormatDef { name: "HudMessage", format: ";iiifff;fff", opcode: Opcode::EndHudMessage },
  FormatDef { name: "HudMessageBold", format: ";iiifff;fff", opcode: Opcode::EndHudMessageBold },
  FormatDef { name: "Log", format: "", opcode: Opcode::EndLog },
  FormatDef { name: "StrParam", format: "s", opcode: Opcode::SaveString },
];

/// CallFunc id of `Acs_NamedExecute`; the annotator watches for it.
pub const EXTFUNC_ACS_NAMED_EXECUTE: i32 = 39;

static EXTS: &[ExtDef] = &[
  ExtDef { name: "GetLineUDMFInt", format: "i;is", id: 1 },
  ExtDef { name: "GetLineUDMFFixed", format: "f;is", id: 2 },
  ExtDef { name: "GetThingUDMFInt", format: "i;is", id: 3 },
  ExtDef { name: "GetThingUDMFFixed", format: "f;is", id: 4 },
  ExtDef { name: "GetSectorUDMFInt", format: "i;is", id: 5 },
  ExtDef { name: "GetSectorUDMFFixed", format: "f;is", id: 6 },
  ExtDef { name: "GetSideUDMFInt", format: "i;ibs", id: 7 },
  ExtDef { name: "GetSideUDMFFixed", format: "f;ibs", id: 8 },
  ExtDef { name: "GetActorVelX", format: "f;i", id: 9 },
  ExtDef { name: "GetActorVelY", format: "f;i", id: 10 },
  ExtDef { name: "GetActorVelZ", format: "f;i", id: 11 },
  ExtDef { name: "SetActivator", format: "b;i;i", id: 12 },
  ExtDef { name: "SetActivatorToTarget", format: "b;i", id: 13 },
  ExtDef { name: "GetActorViewHeight", format: "f;i", id: 14 },
  ExtDef { name: "GetChar", format: "i;si", id: 15 },
  ExtDef { name: "GetAirSupply", format: "i;i", id: 16 },
  ExtDef { name: "SetAirSupply", format: "b;ii", id: 17 },
  ExtDef { name: "SetSkyScrollSpeed", format: ";if", id: 18 },
  ExtDef { name: "GetArmorType", format: "i;si", id: 19 },
  ExtDef { name: "SpawnSpotForced", format: "i;si;ii", id: 20 },
  ExtDef { name: "SpawnSpotFacingForced", format: "i;si;i", id: 21 },
  ExtDef { name: "CheckActorProperty", format: "b;iir", id: 22 },
  ExtDef { name: "SetActorVelocity", format: "b;ifffbb", id: 23 },
  ExtDef { name: "SetUserVariable", format: ";isr", id: 24 },
  ExtDef { name: "GetUserVariable", format: "r;is", id: 25 },
  ExtDef { name: "Radius_Quake2", format: ";iiiiis", id: 26 },
  ExtDef { name: "CheckActorClass", format: "b;is", id: 27 },
  ExtDef { name: "SetUserArray", format: ";isir", id: 28 },
  ExtDef { name: "GetUserArray", format: "r;isi", id: 29 },
  ExtDef { name: "SoundSequenceOnActor", format: ";is", id: 30 },
  ExtDef { name: "SoundSequenceOnSector", format: ";isi", id: 31 },
  ExtDef { name: "SoundSequenceOnPolyobj", format: ";is", id: 32 },
  ExtDef { name: "GetPolyobjX", format: "f;i", id: 33 },
  ExtDef { name: "GetPolyobjY", format: "f;i", id: 34 },
  ExtDef { name: "CheckSight", format: "b;iii", id: 35 },
  ExtDef { name: "SpawnForced", format: "i;sfff;ii", id: 36 },
  ExtDef { name: "AnnouncerSound", format: ";si", id: 37 },
  ExtDef { name: "SetPoier", format: "b;ii;ii", id: 38 },
  ExtDef { name: "Acs_NamedExecute", format: "b;si;rrr", id: 39 },
  ExtDef { name: "Acs_NamedSuspend", format: "b;si", id: 40 },
  ExtDef { name: "Acs_NamedTerminate", format: "b;si", id: 41 },
  ExtDef { name: "Acs_NamedLockedExecute", format: "b;sirrr", id: 42 },
  ExtDef { name: "Acs_NamedLockedExecuteDoor", format: "b;sirrr", id: 43 },
  ExtDef { name: "Acs_NamedExecuteWithResult", format: "i;s;rrrr", id: 44 },
  ExtDef { name: "Acs_NamedExecuteAlways", format: "b;si;rrr", id: 45 },
  ExtDef { name: "UniqueTid", format: "i;;ii", id: 46 },
  ExtDef { name: "IsTidUsed", format: "b;i", id: 47 },
  ExtDef { name: "Sqrt", format: "i;i", id: 48 },
  ExtDef { name: "FixedSqrt", format: "f;f", id: 49 },
  ExtDef { name: "VectorLength", format: "i;ii", id: 50 },
  ExtDef { name: "SetHudClipRect", format: ";iiii;ib", id: 51 },
  ExtDef { name: "SetHudWrapWidth", format: ";i", id: 52 },
  ExtDef { name: "SetCVar", format: "b;si", id: 53 },
  ExtDef { name: "GetUserCVar", format: "i;is", id: 54 },
  ExtDef { name: "SetUserCVar", format: "b;isi", id: 55 },
  ExtDef { name: "GetCVarString", format: "s;s", id: 56 },
  ExtDef { name: "SetCVarString", format: "b;ss", id: 57 },
  ExtDef { name: "GetUserCVarString", format: "s;is", id: 58 },
  ExtDef { name: "SetUserCVarString", format: "b;iss", id: 59 },
  ExtDef { name: "LineAttack", format: ";iffi;ssfii", id: 60 },
  ExtDef { name: "PlaySound", format: ";is;ifbfb", id: 61 },
  ExtDef { name: "StopSound", format: ";i;i", id: 62 },
  ExtDef { name: "Strcmp", format: "i;ss;i", id: 63 },
  ExtDef { name: "Stricmp", format: "i;ss;i", id: 64 },
  ExtDef { name: "Strcasecmp", format: "i;ss;i", id: 64 },
  ExtDef { name: "StrLeft", format: "s;si", id: 65 },
  ExtDef { name: "StrRight", format: "s;si", id: 66 },
  ExtDef { name: "StrMid", format: "s;sii", id: 67 },
  ExtDef { name: "GetActorClass", format: "s;i", id: 68 },
  ExtDef { name: "GetWeapon", format: "s;", id: 69 },
  ExtDef { name: "SoundVolume", format: ";iif", id: 70 },
  ExtDef { name: "PlayActorSound", format: ";ii;ifbf", id: 71 },
  ExtDef { name: "SpawnDecal", format: "i;is;ifff", id: 72 },
  ExtDef { name: "CheckFont", format: "b;s", id: 73 },
  ExtDef { name: "DropItem", format: "i;is;ii", id: 74 },
  ExtDef { name: "CheckFlag", format: "b;is", id: 75 },
  ExtDef { name: "SetLineActivation", format: ";ii", id: 76 },
  ExtDef { name: "GetLineActivation", format: "i;i", id: 77 },
  ExtDef { name: "GetActorPowerupTics", format: "i;is", id: 78 },
  ExtDef { name: "ChangeActorAngle", format: ";if;b", id: 79 },
  ExtDef { name: "ChangeActorPitch", format: ";if;b", id: 80 },
  ExtDef { name: "GetArmorInfo", format: "i;i", id: 81 },
  ExtDef { name: "DropInventory", format: ";is", id: 82 },
  ExtDef { name: "PickActor", format: "b;ifffi;iib", id: 83 },
  ExtDef { name: "IsPoierEqual", format: "b;ii;ii", id: 84 },
  ExtDef { name: "CanRaiseActor", format: "b;i", id: 85 },
  ExtDef { name: "SetActorTeleFog", format: ";iss", id: 86 },
  ExtDef { name: "SwapActorTeleFog", format: "i;i", id: 87 },
  ExtDef { name: "SetActorRoll", format: ";if", id: 88 },
  ExtDef { name: "ChangeActorRoll", format: ";if;b", id: 89 },
  ExtDef { name: "GetActorRoll", format: "f;i", id: 90 },
  ExtDef { name: "QuakeEx", format: "b;iiiiiiis;ifffiiff", id: 91 },
  ExtDef { name: "Warp", format: "b;iffffi;sbfff", id: 92 },
  ExtDef { name: "GetMaxInventory", format: "i;is", id: 93 },
  ExtDef { name: "SetSectorDamage", format: ";ii;sii", id: 94 },
  ExtDef { name: "SetSectorTerrain", format: ";iis", id: 95 },
  ExtDef { name: "SpawnParticle", format: ";i;biifffffffffiii", id: 96 },
  ExtDef { name: "SetMusicVolume", format: ";f", id: 97 },
  ExtDef { name: "CheckProximity", format: "b;ssf;iii", id: 98 },
  ExtDef { name: "CheckActorState", format: "b;is;b", id: 99 },
  ExtDef { name: "ResetMap", format: "b;", id: 100 },
  ExtDef { name: "PlayerIsSpectator", format: "b;i", id: 101 },
  ExtDef { name: "ConsolePlayerNumber", format: "i;", id: 102 },
  ExtDef { name: "GetTeamProperty", format: "i;ii", id: 103 },
  ExtDef { name: "GetPlayerLivesLeft", format: "i;i", id: 104 },
  ExtDef { name: "SetPlayerLivesLeft", format: "b;ii", id: 105 },
  ExtDef { name: "KickFromGame", format: "b;is", id: 106 },
  ExtDef { name: "GetGamemodeState", format: "i;", id: 107 },
  ExtDef { name: "SetDBEntry", format: ";ssi", id: 108 },
  ExtDef { name: "GetDBEntry", format: "i;ss", id: 109 },
  ExtDef { name: "SetDBEntryString", format: ";sss", id: 110 },
  ExtDef { name: "GetDBEntryString", format: "s;ss", id: 111 },
  ExtDef { name: "IncrementDBEntry", format: ";ssi", id: 112 },
  ExtDef { name: "PlayerIsLoggedIn", format: "b;i", id: 113 },
  ExtDef { name: "GetPlayerAccountName", format: "s;i", id: 114 },
  ExtDef { name: "SortDBEntries", format: "i;siib", id: 115 },
  ExtDef { name: "CountDBResults", format: "i;i", id: 116 },
  ExtDef { name: "FreeDBResults", format: ";i", id: 117 },
  ExtDef { name: "GetDBResultKeyString", format: "s;ii", id: 118 },
  ExtDef { name: "GetDBResultValueString", format: "s;ii", id: 119 },
  ExtDef { name: "GetDBResultValue", format: "i;ii", id: 120 },
  ExtDef { name: "GetDBEntryRank", format: "i;ssb", id: 121 },
  ExtDef { name: "RequestScriptPuke", format: "i;i;iiii", id: 122 },
  ExtDef { name: "BeginDBTransaction", format: "", id: 123 },
  ExtDef { name: "EndDBTransaction", format: "", id: 124 },
  ExtDef { name: "GetDBEntries", format: "i;s", id: 125 },
  ExtDef { name: "NamedRequestScriptPuke", format: "i;s;iiii", id: 126 },
  ExtDef { name: "SystemTime", format: "i;", id: 127 },
  ExtDef { name: "GetTimeProperty", format: "i;ii;b", id: 128 },
  ExtDef { name: "Strftime", format: "s;is;b", id: 129 },
  ExtDef { name: "CheckClass", format: "b;s", id: 200 },
  ExtDef { name: "DamageActor", format: "i;iiiiis", id: 201 },
  ExtDef { name: "SetActorFlag", format: "i;isb", id: 202 },
  ExtDef { name: "SetTranslation", format: ";is", id: 203 },
  ExtDef { name: "GetActorFloorTexture", format: "s;i", id: 204 },
  ExtDef { name: "GetActorFloorTerrain", format: "s;i", id: 205 },
  ExtDef { name: "StrArg", format: "i;s", id: 206 },
  ExtDef { name: "Floor", format: "f;f", id: 207 },
  ExtDef { name: "Round", format: "f;f", id: 208 },
  ExtDef { name: "Ceil", format: "f;f", id: 209 },
  ExtDef {
    name: "ScriptCall",
    format: "r;ss;\
      rrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrr\
      rrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrrr",
    id: 210,
  },
  ExtDef { name: "StartSlideShow", format: ";s", id: 211 },
  ExtDef { name: "GetLineX", format: "f;iff", id: 300 },
  ExtDef { name: "GetLineY", format: "f;iff", id: 301 },
  ExtDef { name: "SetSectorGlow", format: ";iiiiii", id: 400 },
  ExtDef { name: "SetFogDensity", format: ";ii", id: 401 },
  ExtDef { name: "GetTeamScore", format: "i;i", id: 19620 },
  ExtDef { name: "SetTeamScore", format: ";ii", id: 19621 },
];

static INTERNS: &[ExtDef] = &[
  ExtDef { name: "ACS_ExecuteWait", format: ";i;rrrr", id: 0 },
  ExtDef { name: "ACS_NamedExecuteWait", format: ";s;rrrr", id: 1 },
];

/// A builtin entry with its format string resolved into arity and types.
#[derive(Debug)]
pub struct BuiltinFunc {
  pub name: &'static str,
  pub min_param: u32,
  pub max_param: u32,
  pub return_spec: Spec,
}

impl BuiltinFunc {
  pub fn returns_value(&self) -> bool {
    self.return_spec != Spec::Void
  }
}

/// The resolved catalog, built once at startup.
pub struct Builtins {
  pub deds: Vec<BuiltinFunc>,
  pub formats: Vec<BuiltinFunc>,
  pub exts: Vec<BuiltinFunc>,
  pub interns: Vec<BuiltinFunc>,
  ded_by_opcode: HashMap<u16, usize>,
  format_by_opcode: HashMap<u16, usize>,
  ext_by_id: HashMap<i32, usize>,
}

impl Builtins {
  pub fn create() -> TaskResult<Builtins> {
    let mut builtins = Builtins {
      deds: Vec::with_capacity(DEDS.len()),
      formats: Vec::with_capacity(FORMATS.len()),
      exts: Vec::with_capacity(EXTS.len()),
      interns: Vec::with_capacity(INTERNS.len()),
      ded_by_opcode: HashMap::new(),
      format_by_opcode: HashMap::new(),
      ext_by_id: HashMap::new(),
    };
    for (i, def) in DEDS.iter().enumerate() {
      builtins.deds.push(parse_format(def.name, def.format)?);
      builtins.ded_by_opcode.entry(def.opcode as u16).or_insert(i);
    }
    for (i, def) in FORMATS.iter().enumerate() {
      builtins.formats.push(parse_format(def.name, def.format)?);
      builtins.format_by_opcode.insert(def.opcode as u16, i);
    }
    for (i, def) in EXTS.iter().enumerate() {
      builtins.exts.push(parse_format(def.name, def.format)?);
      builtins.ext_by_id.entry(def.id as i32).or_insert(i);
    }
    for def in INTERNS {
      builtins.interns.push(parse_format(def.name, def.format)?);
    }
    Ok(builtins)
  }

  /// Looks up a dedicated function by opcode. Direct variants resolve to
  /// their base opcode first.
  pub fn ded_func(&self, opcode: Opcode) -> Option<(usize, &BuiltinFunc)> {
    let opcode = base_ded_opcode(opcode);
    let index = *self.ded_by_opcode.get(&(opcode as u16))?;
    Some((index, &self.deds[index]))
  }

  /// Looks up a format function by its terminator opcode.
  pub fn format_func(&self, opcode: Opcode) -> Option<(usize, &BuiltinFunc)> {
    let index = *self.format_by_opcode.get(&(opcode as u16))?;
    Some((index, &self.formats[index]))
  }

  /// Looks up an extension function by CallFunc id.
  pub fn ext_func(&self, id: i32) -> Option<(usize, &BuiltinFunc)> {
    let index = *self.ext_by_id.get(&id)?;
    Some((index, &self.exts[index]))
  }

  pub fn intern_func(&self, ordinal: usize) -> &BuiltinFunc {
    &self.interns[ordinal]
  }
}

/// Maps a `*DIRECT`/`*DIRECTB` opcode to the stack-argument opcode that
/// names the same dedicated function.
pub fn base_ded_opcode(opcode: Opcode) -> Opcode {
  use Opcode::*;
  match opcode {
    DelayDirect | DelayDirectB => Delay,
    RandomDirect | RandomDirectB => Random,
    ThingCountDirect => ThingCount,
    TagWaitDirect => TagWait,
    PolyWaitDirect => PolyWait,
    ChangeFloorDirect => ChangeFloor,
    ChangeCeilingDirect => ChangeCeiling,
    ScriptWaitDirect => ScriptWait,
    ConsoleCommandDirect => ConsoleCommand,
    SetGravityDirect => SetGravity,
    SetAirControlDirect => SetAirControl,
    GiveInventoryDirect => GiveInventory,
    TakeInventoryDirect => TakeInventory,
    CheckInventoryDirect => CheckInventory,
    SpawnDirect => Spawn,
    SpawnSpotDirect => SpawnSpot,
    SetMusicDirect => SetMusic,
    LocalSetMusicDirect => LocalSetMusic,
    SetFontDirect => SetFont,
    _ => opcode,
  }
}

fn parse_format(name: &'static str, format: &str) -> TaskResult<BuiltinFunc> {
  let mut func = BuiltinFunc {
    name,
    min_param: 0,
    max_param: 0,
    return_spec: Spec::Void,
  };
  let mut chars = format.chars().peekable();
  if let Some(&ch) = chars.peek() {
    if ch != ';' {
      let spec = spec_from_char(name, ch)?;
      // The source language has no typed builtins; every non-void return
      // collapses to raw.
      func.return_spec = if spec == Spec::Void { Spec::Void } else { Spec::Raw };
      chars.next();
    }
  }
  let mut optional = false;
  if chars.peek() == Some(&';') {
    chars.next();
    for ch in chars {
      if ch == ';' {
        optional = true;
        continue;
      }
      spec_from_char(name, ch)?;
      if !optional {
        func.min_param += 1;
      }
      func.max_param += 1;
    }
  }
  Ok(func)
}

fn spec_from_char(name: &str, ch: char) -> TaskResult<Spec> {
  match ch {
    'i' => Ok(Spec::Int),
    'r' => Ok(Spec::Raw),
    'f' => Ok(Spec::Fixed),
    'b' => Ok(Spec::Bool),
    's' => Ok(Spec::Str),
    _ => {
      diag_internal_err(format!(
        "invalid type character `{}` in declaration of builtin function {}",
        ch, name
      ));
      bail()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_parses_cleanly() {
    let builtins = Builtins::create().expect("catalog must parse");
    assert_eq!(builtins.deds.len(), DEDS.len());
    assert_eq!(builtins.formats.len(), FORMATS.len());
    assert_eq!(builtins.exts.len(), EXTS.len());
    assert_eq!(builtins.interns.len(), 2);
  }

  #[test]
  fn ded_lookup_follows_direct_variants() {
    let builtins = Builtins::create().unwrap();
    let (_, delay) = builtins.ded_func(Opcode::Delay).unwrap();
    assert_eq!(delay.name, "Delay");
    assert_eq!(delay.max_param, 1);
    let (_, also_delay) = builtins.ded_func(Opcode::DelayDirectB).unwrap();
    assert_eq!(also_delay.name, "Delay");
    assert!(builtins.ded_func(Opcode::Add).is_none());
  }

  #[test]
  fn format_string_arity() {
    let builtins = Builtins::create().unwrap();
    let (_, hud) = builtins.format_func(Opcode::EndHudMessage).unwrap();
    assert_eq!(hud.min_param, 6);
    assert_eq!(hud.max_param, 9);
    let (_, spawn) = builtins.ded_func(Opcode::Spawn).unwrap();
    assert_eq!(spawn.min_param, 4);
    assert_eq!(spawn.max_param, 6);
    assert!(spawn.returns_value());
    let (_, delay) = builtins.ded_func(Opcode::Delay).unwrap();
    assert!(!delay.returns_value());
  }

  #[test]
  fn ext_lookup_by_id() {
    let builtins = Builtins::create().unwrap();
    let (_, named_execute) = builtins.ext_func(EXTFUNC_ACS_NAMED_EXECUTE).unwrap();
    assert_eq!(named_execute.name, "Acs_NamedExecute");
    let (_, team_score) = builtins.ext_func(19620).unwrap();
    assert_eq!(team_score.name, "GetTeamScore");
    assert!(builtins.ext_func(150).is_none());
  }
}
