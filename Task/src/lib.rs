pub mod ast;
pub mod builtin;
pub mod errors;
pub mod module;
pub mod note;
pub mod pcode;

/// The current version of the decompiler.
pub const VERSION: &str = "0.1.0";

/// Capacity of the map-variable table of a module.
pub const MAX_MAP_VARS: usize = 128;
/// Capacity of the world-variable and world-array tables.
pub const MAX_WORLD_VARS: usize = 256;
/// Capacity of the global-variable and global-array tables.
pub const MAX_GLOBAL_VARS: usize = 64;
/// Variable slots reserved for a script when no `SVCT` chunk overrides it.
pub const DEFAULT_SCRIPT_VARS: usize = 20;
