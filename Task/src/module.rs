//! The decompilation state shared by every pipeline stage.

use crate::ast::{AstArena, NodeId, Var, VarArena, VarId};
use crate::builtin::Builtins;
use crate::errors::TaskResult;
use crate::pcode::Body;
use crate::{MAX_GLOBAL_VARS, MAX_MAP_VARS, MAX_WORLD_VARS};

/// Script activation types with dedicated source keywords. Other values are
/// preserved numerically.
pub mod script_type {
  pub const CLOSED: u32 = 0;
  pub const OPEN: u32 = 1;
  pub const DEATH: u32 = 3;
  pub const ENTER: u32 = 4;
  pub const DISCONNECT: u32 = 14;
  pub const EVENT: u32 = 16;
}

/// Script flag bits understood by this version.
pub mod script_flag {
  pub const NET: u32 = 0x1;
  pub const CLIENTSIDE: u32 = 0x2;
}

/// One script entry point.
pub struct Script {
  pub number: i32,
  pub name: String,
  pub named_script: bool,
  pub script_type: u32,
  pub flags: u32,
  pub num_param: u32,
  pub offset: u32,
  pub end_offset: u32,
  /// Local variable slots; capacity from `SVCT` or the default.
  pub vars: Vec<Option<VarId>>,
  /// Local array slots from `SARY`.
  pub arrays: Vec<Option<VarId>>,
  pub body: Body,
  /// Recovered statement block; present after recovery.
  pub block: Option<NodeId>,
}

impl Script {
  pub fn new() -> Self {
    Script {
      number: 0,
      name: String::new(),
      named_script: false,
      script_type: script_type::CLOSED,
      flags: 0,
      num_param: 0,
      offset: 0,
      end_offset: 0,
      vars: vec![],
      arrays: vec![],
      body: Body::default(),
      block: None,
    }
  }

  pub fn reserve_vars(&mut self, count: usize) {
    self.vars = vec![None; count];
  }
}

impl Default for Script {
  fn default() -> Self {
    Script::new()
  }
}

/// One user function from the `FUNC` chunk.
pub struct UserFunc {
  pub name: String,
  pub index: u32,
  pub min_param: u32,
  pub max_param: u32,
  pub returns_value: bool,
  pub offset: u32,
  pub end_offset: u32,
  pub vars: Vec<Option<VarId>>,
  pub arrays: Vec<Option<VarId>>,
  pub body: Body,
  pub block: Option<NodeId>,
}

/// An entry of the offset-sorted object list. Scripts and functions emit in
/// the order their bodies appear in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRef {
  Script(usize),
  Func(usize),
}

/// Everything known about the module being decompiled.
pub struct Module {
  pub library_name: String,
  pub objects: Vec<ObjectRef>,
  pub scripts: Vec<Script>,
  pub funcs: Vec<UserFunc>,
  pub map_vars: [Option<VarId>; MAX_MAP_VARS],
  pub world_vars: [Option<VarId>; MAX_WORLD_VARS],
  pub world_arrays: [Option<VarId>; MAX_WORLD_VARS],
  pub global_vars: [Option<VarId>; MAX_GLOBAL_VARS],
  pub global_arrays: [Option<VarId>; MAX_GLOBAL_VARS],
  pub strings: Vec<String>,
  pub imports: Vec<String>,
  pub encrypt_str: bool,
  pub importable: bool,
  pub compact: bool,
  pub wadauthor: bool,
  pub calls_aspec: bool,
  pub calls_ext: bool,
  pub vars: VarArena,
  pub ast: AstArena,
  pub builtins: Builtins,
}

impl Module {
  pub fn new() -> TaskResult<Module> {
    Ok(Module {
      library_name: String::new(),
      objects: vec![],
      scripts: vec![],
      funcs: vec![],
      map_vars: [None; MAX_MAP_VARS],
      world_vars: [None; MAX_WORLD_VARS],
      world_arrays: [None; MAX_WORLD_VARS],
      global_vars: [None; MAX_GLOBAL_VARS],
      global_arrays: [None; MAX_GLOBAL_VARS],
      strings: vec![],
      imports: vec![],
      encrypt_str: false,
      importable: false,
      compact: false,
      wadauthor: false,
      calls_aspec: false,
      calls_ext: false,
      vars: VarArena::default(),
      ast: AstArena::default(),
      builtins: Builtins::create()?,
    })
  }

  /// The generated source needs the engine header when any action special
  /// or extension function is referenced.
  pub fn uses_zcommon_file(&self) -> bool {
    self.calls_aspec || self.calls_ext
  }

  pub fn find_script(&self, number: i32) -> Option<usize> {
    self.scripts.iter().position(|script| script.number == number)
  }

  pub fn find_func(&self, index: u32) -> Option<usize> {
    self.funcs.iter().position(|func| func.index == index)
  }

  pub fn lookup_string(&self, index: u32) -> Option<&str> {
    self.strings.get(index as usize).map(String::as_str)
  }

  /// Gets the map variable at `index`, materializing an unnamed one when the
  /// slot is still empty. `index` must be within the table.
  pub fn reserve_map_var(&mut self, index: u32) -> VarId {
    use crate::ast::Storage;
    if let Some(id) = self.map_vars[index as usize] {
      return id;
    }
    let mut var = Var::new();
    var.storage = Storage::Map;
    var.index = index;
    let id = self.vars.push(var);
    self.map_vars[index as usize] = Some(id);
    id
  }

  /// Inserts an object into the emission list, keeping body-offset order.
  pub fn append_object(&mut self, object: ObjectRef) {
    let offset = self.object_offset(object);
    let at = self
      .objects
      .iter()
      .position(|&other| self.object_offset(other) > offset)
      .unwrap_or(self.objects.len());
    self.objects.insert(at, object);
  }

  pub fn object_offset(&self, object: ObjectRef) -> u32 {
    match object {
      ObjectRef::Script(i) => self.scripts[i].offset,
      ObjectRef::Func(i) => self.funcs[i].offset,
    }
  }
}
