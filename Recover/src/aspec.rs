//! Action-special names, indexed by special number. Empty entries are gaps
//! in the engine's numbering; a call through a gap surfaces as an unknown
//! callee.

pub(crate) static ASPECS: [&str; 280] = [
  // 0
  "",
  "Polyobj_StartLine",
  "Polyobj_RotateLeft",
  "Polyobj_RotateRight",
  "Polyobj_Move",
  "Polyobj_ExplicitLine",
  "Polyobj_MoveTimes8",
  "Polyobj_DoorSwing",
  "Polyobj_DoorSlide",
  "Line_Horizon",
  // 10
  "Door_Close",
  "Door_Open",
  "Door_Raise",
  "Door_LockedRaise",
  "Door_Animated",
  "Autosave",
  "Transfer_WallLight",
  "Thing_Raise",
  "StartConversation",
  "Thing_Stop",
  // 20
  "Floor_LowerByValue",
  "Floor_LowerToLowest",
  "Floor_LowerToNearest",
  "Floor_RaiseByValue",
  "Floor_RaiseToHighest",
  "Floor_RaiseToNearest",
  "Stairs_BuildDown",
  "Stairs_BuildUp",
  "Floor_RaiseAndCrush",
  "Pillar_Build",
  // 30
  "Pillar_Open",
  "Stairs_BuildDownSync",
  "Stairs_BuildUpSync",
  "ForceField",
  "ClearForceField",
  "Floor_RaiseByValueTimes8",
  "Floor_LowerByValueTimes8",
  "Floor_MoveToValue",
  "Ceiling_Waggle",
  "Teleport_ZombieChanger",
  // 40
  "Ceiling_LowerByValue",
  "Ceiling_RaiseByValue",
  "Ceiling_CrushAndRaise",
  "Ceiling_LowerAndCrush",
  "Ceiling_CrushStop",
  "Ceiling_CrushRaiseAndStay",
  "Floor_CrushStop",
  "Ceiling_MoveToValue",
  "Sector_Attach3dMidTex",
  "GlassBreak",
  // 50
  "ExtraFloor_LightOnly",
  "Sector_SetLink",
  "Scroll_Wall",
  "Line_SetTextureOffset",
  "Sector_ChangeFlags",
  "Line_SetBlocking",
  "Line_SetTextureScale",
  "Sector_SetPortal",
  "Sector_CopyScroller",
  "Polyobj_Or_MoveToSpot",
  // 60
  "Plat_PerpetualRaise",
  "Plat_Stop",
  "Plat_DownWaitUpStay",
  "Plat_DownByValue",
  "Plat_UpWaitDownStay",
  "Plat_UpByValue",
  "Floor_LowerInstant",
  "Floor_RaiseInstant",
  "Floor_MoveToValueTimes8",
  "Ceiling_MoveToValueTimes8",
  // 70
  "Teleport",
  "Teleport_NoFog",
  "ThrustThing",
  "DamageThing",
  "Teleport_NewMap",
  "Teleport_EndGame",
  "TeleportOther",
  "TeleportGroup",
  "TeleportInSector",
  "Thing_SetConversation",
  // 80
  "Acs_Execute",
  "Acs_Suspend",
  "Acs_Terminate",
  "Acs_LockedExecute",
  "Acs_ExecuteWithResult",
  "Acs_LockedExecuteDoor",
  "Polyobj_MoveToSpot",
  "Polyobj_Stop",
  "Polyobj_MoveTo",
  "Polyobj_Or_MoveTo",
  // 90
  "Polyobj_Or_RotateLeft",
  "Polyobj_Or_RotateRight",
  "Polyobj_Or_Move",
  "Polyobj_Or_MoveTimes8",
  "Pillar_BuildAndCrush",
  "FloorAndCeiling_LowerByValue",
  "FloorAndCeiling_RaiseByValue",
  "Ceiling_LowerAndCrushDist",
  "Sector_SetTranslucent",
  "Floor_RaiseAndCrushDoom",
  // 100
  "Scroll_Texture_Left",
  "Scroll_Texture_Right",
  "Scroll_Texture_Up",
  "Scroll_Texture_Down",
  "Ceiling_CrushAndRaiseSilentDist",
  "Door_WaitRaise",
  "Door_WaitClose",
  "Line_SetPortalTarget",
  "",
  "Light_ForceLightning",
  // 110
  "Light_RaiseByValue",
  "Light_LowerByValue",
  "Light_ChangeToValue",
  "Light_Fade",
  "Light_Glow",
  "Light_Flicker",
  "Light_Strobe",
  "Light_Stop",
  "Plane_Copy",
  "Thing_Damage",
  // 120
  "Radius_Quake",
  "Line_SetIdentification",
  "",
  "",
  "",
  "Thing_Move",
  "",
  "Thing_SetSpecial",
  "ThrustThingZ",
  "UsePuzzleItem",
  // 130
  "Thing_Activate",
  "Thing_Deactivate",
  "Thing_Remove",
  "Thing_Destroy",
  "Thing_Projectile",
  "Thing_Spawn",
  "Thing_ProjectileGravity",
  "Thing_SpawnNoFog",
  "Floor_Waggle",
  "Thing_SpawnFacing",
  // 140
  "Sector_ChangeSound",
  "",
  "",
  "",
  "",
  "Player_SetTeam",
  "",
  "",
  "",
  "",
  // 150
  "",
  "",
  "Team_Score",
  "Team_GivePoints",
  "Teleport_NoStop",
  "",
  "",
  "SetGlobalFogParameter",
  "Fs_Excute",
  "Sector_SetPlaneReflection",
  // 160
  "Sector_Set3dFloor",
  "Sector_SetContents",
  "",
  "",
  "",
  "",
  "",
  "",
  "Ceiling_CrushAndRaiseDist",
  "Generic_Crusher2",
  // 170
  "Sector_SetCeilingScale2",
  "Sector_SetFloorScale2",
  "Plat_UpNearestWaitDownStay",
  "NoiseAlert",
  "SendToCommunicator",
  "Thing_ProjectileIntercept",
  "Thing_ChangeTid",
  "Thing_Hate",
  "Thing_ProjectileAimed",
  "ChangeSkill",
  // 180
  "Thing_SetTranslation",
  "Plane_Align",
  "Line_Mirror",
  "Line_AlignCeiling",
  "Line_AlignFloor",
  "Sector_SetRotation",
  "Sector_SetCeilingPanning",
  "Sector_SetFloorPanning",
  "Sector_SetCeilingScale",
  "Sector_SetFloorScale",
  // 190
  "Static_Init",
  "SetPlayerProperty",
  "Ceiling_LowerToHighestFloor",
  "Ceiling_LowerInstant",
  "Ceiling_RaiseInstant",
  "Ceiling_CrushRaiseAndStayA",
  "Ceiling_CrushAndRaiseA",
  "Ceiling_CrushAndRaiseSilentA",
  "Ceiling_RaiseByValueTimes8",
  "Ceiling_LowerByValueTimes8",
  // 200
  "Generic_Floor",
  "Generic_Ceiling",
  "Generic_Door",
  "Generic_Lift",
  "Generic_Stairs",
  "Generic_Crusher",
  "Plat_DownWaitUpStayLip",
  "Plat_PerpetualRaiseLip",
  "TranslucentLine",
  "Transfer_Heights",
  // 210
  "Transfer_FloorLight",
  "Transfer_CeilingLight",
  "Sector_SetColor",
  "Sector_SetFade",
  "Sector_SetDamage",
  "Teleport_Line",
  "Sector_SetGravity",
  "Stairs_BuildUpDoom",
  "Sector_SetWind",
  "Sector_SetFriction",
  // 220
  "Sector_SetCurrent",
  "Scroll_Texture_Both",
  "Scroll_Texture_Model",
  "Scroll_Floor",
  "Scroll_Ceiling",
  "Scroll_Texture_Offsets",
  "Acs_ExecuteAlways",
  "PointPush_SetForce",
  "Plat_RaiseAndStayTx0",
  "Thing_SetGoal",
  // 230
  "Plat_UpByValueStayTx",
  "Plat_ToggleCeiling",
  "Light_StrobeDoom",
  "Light_MinNeighbor",
  "Light_MaxNeighbor",
  "Floor_TransferTrigger",
  "Floor_TransferNumeric",
  "ChangeCamera",
  "Floor_RaiseToLowestCeiling",
  "Floor_RaiseByValueTxTy",
  // 240
  "Floor_RaiseByTexture",
  "Floor_LowerToLowestTxTy",
  "Floor_LowerToHighest",
  "Exit_Normal",
  "Exit_Secret",
  "Elevator_RaiseToNearest",
  "Elevator_MoveToFloor",
  "Elevator_LowerToNearest",
  "HealThing",
  "Door_CloseWaitOpen",
  // 250
  "Floor_Donut",
  "FloorAndCeiling_LowerRaise",
  "Ceiling_RaiseToNearest",
  "Ceiling_LowerToLowest",
  "Ceiling_LowerToFloor",
  "Ceiling_CrushRaiseAndStaySilA",
  "Floor_LowerToHighestEE",
  "Floor_RaiseToLowest",
  "Floor_LowerToLowestCeiling",
  "Floor_RaiseToCeiling",
  // 260
  "Floor_ToCeilingInstant",
  "Floor_LowerByTexture",
  "Ceiling_RaiseToHighest",
  "Ceiling_ToHighestInstant",
  "Ceiling_LowerToNearest",
  "Ceiling_RaiseToLowest",
  "Ceiling_RaiseToHighestFloor",
  "Ceiling_ToFloorInstant",
  "Ceiling_RaiseByTexture",
  "Ceiling_LowerByTexture",
  // 270
  "Stairs_BuildDownDoom",
  "Stairs_BuildUpDoomSync",
  "Stairs_BuildDownDoomSync",
  "Stairs_BuildUpDoomCrush",
  "Door_AnimatedClose",
  "Floor_Stop",
  "Ceiling_Stop",
  "Sector_SetFloorGlow",
  "Sector_SetCeilingGlow",
  "",
];
