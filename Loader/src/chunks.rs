//! Chunk directory readers and the zero-era directory path.

use std::path::Path;

use task::ast::{InitValue, NodeKind, Spec, Var};
use task::errors::{bail, diag_err, diag_note, diag_warn, TaskResult};
use task::module::{script_flag, ObjectRef, Script, UserFunc};
use task::{DEFAULT_SCRIPT_VARS, MAX_MAP_VARS};

use crate::decode::read_pcode_list;
use crate::{chunk_string, Chunk, Cursor, Loader};

impl<'a> Loader<'a> {
  pub(crate) fn read_acse_object(&mut self) -> TaskResult<()> {
    let dir = self.directory_offset as usize;
    self.expect_data(dir, 4)?;
    let num_scripts = crate::read_u32_at(self.data, dir) as i32;
    if num_scripts > 0 {
      self.expect_data(dir + 4, 12)?;
      self.end_offset = crate::read_u32_at(self.data, dir + 8);
    } else {
      self.end_offset = self.chunk_offset;
    }
    self.read_scripts()?;
    self.read_funcs()?;
    self.determine_end_of_objects();
    self.read_script_body_list()?;
    self.read_func_body_list()?;
    self.read_strings()?;
    self.read_map_vars()?;
    self.read_local_arrays()?;
    self.read_mexp()?;
    self.read_load()?;
    self.read_mimp()?;
    self.read_aimp()?;
    self.read_mstr()?;
    self.read_astr()?;
    // A module compiled without #nowadauthor carries a populated dummy
    // directory for BEHAVIOR lumps; libraries never do.
    if !self.module.importable && num_scripts > 0 {
      self.module.wadauthor = true;
    }
    Ok(())
  }

  fn read_scripts(&mut self) -> TaskResult<()> {
    self.read_sptr()?;
    self.read_sflg()?;
    self.read_svct()?;
    self.reserve_default_script_space();
    self.read_script_names()
  }

  fn read_sptr(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("SPTR", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = chunk.size / 8;
    for _ in 0..count {
      let mut script = Script::new();
      script.number = cursor.read_i16()? as i32;
      script.script_type = cursor.read_u8()? as u32;
      script.num_param = cursor.read_u8()? as u32;
      script.offset = cursor.read_u32()?;
      self.module.scripts.push(script);
      let index = self.module.scripts.len() - 1;
      self.module.append_object(ObjectRef::Script(index));
    }
    Ok(())
  }

  fn read_sflg(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("SFLG", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = chunk.size / 4;
    for _ in 0..count {
      let number = cursor.read_i16()? as i32;
      let mut flags = cursor.read_u16()? as u32;
      match self.module.find_script(number) {
        Some(index) => {
          let script = &mut self.module.scripts[index];
          for flag in [script_flag::NET, script_flag::CLIENTSIDE] {
            if flags & flag != 0 {
              script.flags |= flag;
              flags &= !flag;
            }
          }
          if flags != 0 {
            diag_warn(format!(
              "script {} contains at least one unknown script flag",
              number
            ));
          }
        }
        None => {
          diag_warn(format!(
            "{} chunk has an entry for script {}, but there is no such script",
            chunk.name, number
          ));
        }
      }
    }
    Ok(())
  }

  fn read_svct(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("SVCT", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = chunk.size / 4;
    for _ in 0..count {
      let number = cursor.read_i16()? as i32;
      let size = cursor.read_u16()? as usize;
      match self.module.find_script(number) {
        Some(index) => self.module.scripts[index].reserve_vars(size),
        None => diag_warn(format!(
          "{} chunk has an entry for script {}, but there is no such script",
          chunk.name, number
        )),
      }
    }
    Ok(())
  }

  fn reserve_default_script_space(&mut self) {
    for script in &mut self.module.scripts {
      if script.vars.is_empty() {
        script.reserve_vars(DEFAULT_SCRIPT_VARS);
      }
    }
  }

  fn read_script_names(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("SNAM", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = cursor.read_u32()?;
    if cursor.remaining() < count as usize * 4 {
      diag_err(format!(
        "{} chunk gives a number of script name offsets ({}) that cannot possibly fit \
         in the chunk",
        chunk.name, count
      ));
      return bail();
    }
    // Named scripts count down from -1 in chunk order.
    let mut script_number = -1;
    for i in 0..count {
      let offset = cursor.read_u32()? as usize;
      if offset >= chunk.data.len() {
        diag_err(format!(
          "string offset in position {} of {} chunk points outside of chunk data range",
          i, chunk.name
        ));
        return bail();
      }
      if let Some(index) = self.module.find_script(script_number) {
        let script = &mut self.module.scripts[index];
        script.name = chunk_string(chunk.data, offset);
        script.named_script = true;
      }
      script_number -= 1;
    }
    Ok(())
  }

  fn read_funcs(&mut self) -> TaskResult<()> {
    self.read_func_chunk()?;
    self.read_fnam()
  }

  fn read_func_chunk(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("FUNC", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = chunk.size / 8;
    for i in 0..count {
      let params = cursor.read_u8()? as u32;
      let size = cursor.read_u8()? as u32;
      let value = cursor.read_u8()?;
      cursor.read_u8()?; // padding
      let offset = cursor.read_u32()?;
      let num_vars = (params + size) as usize;
      let func = UserFunc {
        name: String::new(),
        index: i as u32,
        min_param: params,
        max_param: params,
        returns_value: value != 0,
        offset,
        end_offset: offset,
        vars: vec![None; num_vars],
        arrays: vec![],
        body: Default::default(),
        block: None,
      };
      self.module.funcs.push(func);
      let index = self.module.funcs.len() - 1;
      self.module.append_object(ObjectRef::Func(index));
    }
    Ok(())
  }

  fn read_fnam(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("FNAM", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = cursor.read_i32()?;
    let mut index = 0;
    while index < self.module.funcs.len() && (index as i32) < count {
      let offset = cursor.read_i32()? as usize;
      self.module.funcs[index].name = chunk_string(chunk.data, offset);
      index += 1;
    }
    Ok(())
  }

  /// Each object's body ends where its successor begins; the last object
  /// ends at the position recorded by the directory.
  pub(crate) fn determine_end_of_objects(&mut self) {
    let objects = self.module.objects.clone();
    for (i, &object) in objects.iter().enumerate() {
      let end_offset = match objects.get(i + 1) {
        Some(&next) => self.module.object_offset(next),
        None => self.end_offset,
      };
      match object {
        ObjectRef::Script(index) => self.module.scripts[index].end_offset = end_offset,
        ObjectRef::Func(index) => self.module.funcs[index].end_offset = end_offset,
      }
    }
  }

  pub(crate) fn read_script_body_list(&mut self) -> TaskResult<()> {
    for index in 0..self.module.scripts.len() {
      let (offset, end_offset) = {
        let script = &self.module.scripts[index];
        (script.offset, script.end_offset)
      };
      let body = self.read_body(offset, end_offset)?;
      self.module.scripts[index].body = body;
    }
    Ok(())
  }

  fn read_func_body_list(&mut self) -> TaskResult<()> {
    for index in 0..self.module.funcs.len() {
      let (offset, end_offset) = {
        let func = &self.module.funcs[index];
        (func.offset, func.end_offset)
      };
      let body = self.read_body(offset, end_offset)?;
      self.module.funcs[index].body = body;
    }
    Ok(())
  }

  fn read_body(&self, offset: u32, end_offset: u32) -> TaskResult<task::pcode::Body> {
    let start = offset as usize;
    let end = end_offset as usize;
    if start > self.data.len() || end > self.data.len() || start > end {
      diag_err(format!(
        "body range [{}, {}) lies outside the object file",
        offset, end_offset
      ));
      return bail();
    }
    read_pcode_list(&self.data[start..end], offset, self.small_code)
  }

  fn read_strings(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("STRL", None)? {
      Some(chunk) => chunk,
      None => match self.find_chunk("STRE", None)? {
        Some(chunk) => {
          self.module.encrypt_str = true;
          chunk
        }
        None => return Ok(()),
      },
    };
    let mut cursor = chunk.cursor();
    if cursor.remaining() < 12 {
      diag_err(format!(
        "cannot read string-count portion of {} chunk because it is smaller than expected",
        chunk.name
      ));
      return bail();
    }
    cursor.read_i32()?;
    let count = cursor.read_u32()?;
    cursor.read_i32()?;
    if cursor.remaining() < count as usize * 4 {
      diag_err(format!(
        "{} chunk gives {} string offsets but is too small to contain that many offsets",
        chunk.name, count
      ));
      return bail();
    }
    let encrypted = self.module.encrypt_str;
    for i in 0..count {
      let offset = cursor.read_u32()?;
      if offset as usize >= chunk.data.len() {
        diag_err(format!(
          "string offset in position {} of {} chunk points outside of chunk data range",
          i, chunk.name
        ));
        return bail();
      }
      self
        .module
        .strings
        .push(read_string(&chunk, offset, encrypted)?);
    }
    Ok(())
  }

  fn read_map_vars(&mut self) -> TaskResult<()> {
    self.read_mini()?;
    self.read_aray()?;
    self.read_aini()?;
    self.reserve_unspecified_vars();
    Ok(())
  }

  fn read_mini(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("MINI", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let mut index = cursor.read_u32()?;
    let count = (chunk.size.saturating_sub(4)) / 4;
    for _ in 0..count {
      let value = cursor.read_i32()?;
      if index as usize >= MAX_MAP_VARS {
        diag_warn(format!(
          "{} chunk initializes a variable with index {}, which is greater than the \
           maximum index {}",
          chunk.name,
          index,
          MAX_MAP_VARS - 1
        ));
        break;
      }
      let id = self.module.reserve_map_var(index);
      if value != 0 {
        let initz = self.module.ast.push(NodeKind::Literal(value));
        self.module.vars.get_mut(id).initz = Some(initz);
      }
      index += 1;
    }
    Ok(())
  }

  fn read_aray(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("ARAY", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = chunk.size / 8;
    for i in 0..count {
      let index = cursor.read_u32()?;
      let size = cursor.read_u32()?;
      if index as usize >= MAX_MAP_VARS {
        diag_err(format!(
          "entry {} of {} chunk specifies an array with index {}, which is greater than \
           the maximum index {}",
          i,
          chunk.name,
          index,
          MAX_MAP_VARS - 1
        ));
        return bail();
      }
      let id = self.module.reserve_map_var(index);
      let var = self.module.vars.get_mut(id);
      var.dim_length = size;
      var.array = true;
    }
    Ok(())
  }

  fn read_aini(&mut self) -> TaskResult<()> {
    let mut found = self.find_chunk("AINI", None)?;
    while let Some(chunk) = found {
      self.read_aini_chunk(&chunk)?;
      found = self.next_chunk(&chunk)?;
    }
    Ok(())
  }

  fn read_aini_chunk(&mut self, chunk: &Chunk) -> TaskResult<()> {
    let mut cursor = chunk.cursor();
    let index = cursor.read_u32()?;
    if index as usize >= MAX_MAP_VARS {
      diag_warn(format!(
        "{} chunk specifies an array with index {}, which is greater than the maximum \
         index {}",
        chunk.name,
        index,
        MAX_MAP_VARS - 1
      ));
      diag_note(format!(
        "will abort reading {} chunk for array {}",
        chunk.name, index
      ));
      return Ok(());
    }
    let id = match self.module.map_vars[index as usize] {
      Some(id) if self.module.vars.get(id).array => id,
      _ => {
        diag_warn(format!(
          "{} chunk specifies an array with index {}, but there is no such array",
          chunk.name, index
        ));
        diag_note(format!(
          "will abort reading {} chunk for array {}",
          chunk.name, index
        ));
        return Ok(());
      }
    };
    let count = (chunk.size.saturating_sub(4) / 4) as u32;
    if count > self.module.vars.get(id).dim_length {
      let dim_length = self.module.vars.get(id).dim_length;
      diag_warn(format!(
        "{} chunk for array {} specifies {} initializers, but array has {} elements",
        chunk.name, index, count, dim_length
      ));
      diag_note(format!("will change size of array {} to {}", index, count));
      self.module.vars.get_mut(id).dim_length = count;
    }
    let mut values = vec![];
    for i in 0..count {
      let value = cursor.read_i32()?;
      if value != 0 {
        values.push(InitValue {
          index: i as i32,
          value,
          string: false,
        });
      }
    }
    self.module.vars.get_mut(id).values = values;
    Ok(())
  }

  /// Map variables below the highest declared one exist even when no chunk
  /// mentions them; the slots count.
  fn reserve_unspecified_vars(&mut self) {
    let mut last_var = 0;
    for (i, slot) in self.module.map_vars.iter().enumerate() {
      if slot.is_some() {
        last_var = i;
      }
    }
    for i in 0..last_var {
      self.module.reserve_map_var(i as u32);
    }
  }

  fn read_local_arrays(&mut self) -> TaskResult<()> {
    self.read_sary()?;
    self.read_fary()
  }

  fn read_sary(&mut self) -> TaskResult<()> {
    let mut found = self.find_chunk("SARY", None)?;
    while let Some(chunk) = found {
      self.read_sary_chunk(&chunk)?;
      found = self.next_chunk(&chunk)?;
    }
    Ok(())
  }

  fn read_sary_chunk(&mut self, chunk: &Chunk) -> TaskResult<()> {
    let mut cursor = chunk.cursor();
    let number = cursor.read_i16()? as i32;
    let script = match self.module.find_script(number) {
      Some(index) => index,
      None => {
        diag_warn(format!(
          "found {} chunk for script {}, but there is no such script",
          chunk.name, number
        ));
        diag_note(format!(
          "will abort reading {} chunk for script {}",
          chunk.name, number
        ));
        return Ok(());
      }
    };
    let count = chunk.size.saturating_sub(2) / 4;
    if count == 0 {
      return Ok(());
    }
    let mut arrays = vec![];
    for i in 0..count {
      let size = cursor.read_u32()?;
      let mut var = Var::new();
      var.index = i as u32;
      var.dim_length = size;
      var.array = true;
      arrays.push(Some(self.module.vars.push(var)));
    }
    self.module.scripts[script].arrays = arrays;
    Ok(())
  }

  fn read_fary(&mut self) -> TaskResult<()> {
    let mut found = self.find_chunk("FARY", None)?;
    while let Some(chunk) = found {
      self.read_fary_chunk(&chunk)?;
      found = self.next_chunk(&chunk)?;
    }
    Ok(())
  }

  fn read_fary_chunk(&mut self, chunk: &Chunk) -> TaskResult<()> {
    let mut cursor = chunk.cursor();
    let index = cursor.read_u16()? as u32;
    let func = match self.module.find_func(index) {
      Some(position) => position,
      None => {
        diag_warn(format!(
          "found {} chunk for function {}, but there is no such function",
          chunk.name, index
        ));
        diag_note(format!(
          "will abort reading {} chunk for function {}",
          chunk.name, index
        ));
        return Ok(());
      }
    };
    let count = chunk.size.saturating_sub(2) / 4;
    if count == 0 {
      return Ok(());
    }
    let mut arrays = vec![];
    for i in 0..count {
      let size = cursor.read_u32()?;
      let mut var = Var::new();
      var.index = i as u32;
      var.dim_length = size;
      var.array = true;
      arrays.push(Some(self.module.vars.push(var)));
    }
    self.module.funcs[func].arrays = arrays;
    Ok(())
  }

  fn read_mexp(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("MEXP", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    let count = cursor.read_u32()?;
    for i in 0..count {
      let offset = cursor.read_u32()? as usize;
      if i as usize >= MAX_MAP_VARS {
        break;
      }
      let id = self.module.reserve_map_var(i);
      if offset != 0 {
        self.module.vars.get_mut(id).name = chunk_string(chunk.data, offset);
      }
    }
    self.module.importable = true;
    self.determine_library_name();
    Ok(())
  }

  fn determine_library_name(&mut self) {
    if let Some(filename) = Path::new(self.object_file).file_name() {
      let filename = filename.to_string_lossy();
      let stem = filename.split('.').next().unwrap_or("");
      self.module.library_name = stem.to_string();
    }
  }

  fn read_load(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("LOAD", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut start = 0;
    for (i, &ch) in chunk.data.iter().enumerate() {
      if ch == 0 {
        if i > start {
          let name = String::from_utf8_lossy(&chunk.data[start..i]).into_owned();
          self.module.imports.push(name);
        }
        start = i + 1;
      }
    }
    Ok(())
  }

  fn read_mimp(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("MIMP", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let min_size = match chunk.size.checked_sub(4) {
      Some(size) => size,
      None => return Ok(()),
    };
    let mut i = 0;
    while i < min_size {
      let index = crate::read_u32_at(chunk.data, i);
      i += 4;
      let start = i;
      while i < chunk.size && chunk.data[i] != 0 {
        i += 1;
      }
      if (index as usize) < MAX_MAP_VARS {
        let id = self.module.reserve_map_var(index);
        let var = self.module.vars.get_mut(id);
        var.name = String::from_utf8_lossy(&chunk.data[start..i]).into_owned();
        var.imported = true;
      } else {
        diag_warn(format!(
          "{} chunk imports a variable with index {}, which is greater than the maximum \
           index {}",
          chunk.name,
          index,
          MAX_MAP_VARS - 1
        ));
      }
      i += 1;
    }
    Ok(())
  }

  fn read_aimp(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("AIMP", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let min_size = match chunk.size.checked_sub(8) {
      Some(size) => size,
      None => return Ok(()),
    };
    let mut i = 4;
    while i < min_size {
      let index = crate::read_u32_at(chunk.data, i);
      i += 4;
      let size = crate::read_u32_at(chunk.data, i);
      i += 4;
      let start = i;
      while i < chunk.size && chunk.data[i] != 0 {
        i += 1;
      }
      if (index as usize) < MAX_MAP_VARS {
        let id = self.module.reserve_map_var(index);
        let var = self.module.vars.get_mut(id);
        var.name = String::from_utf8_lossy(&chunk.data[start..i]).into_owned();
        var.dim_length = size;
        var.array = true;
        var.imported = true;
      } else {
        diag_warn(format!(
          "{} chunk imports an array with index {}, which is greater than the maximum \
           index {}",
          chunk.name,
          index,
          MAX_MAP_VARS - 1
        ));
      }
      i += 1;
    }
    Ok(())
  }

  fn read_mstr(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("MSTR", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    for _ in 0..chunk.size / 4 {
      let index = cursor.read_u32()?;
      if (index as usize) < MAX_MAP_VARS {
        let id = self.module.reserve_map_var(index);
        self.module.vars.get_mut(id).spec = Spec::Str;
      }
    }
    Ok(())
  }

  fn read_astr(&mut self) -> TaskResult<()> {
    let chunk = match self.find_chunk("ASTR", None)? {
      Some(chunk) => chunk,
      None => return Ok(()),
    };
    let mut cursor = chunk.cursor();
    for _ in 0..chunk.size / 4 {
      let index = cursor.read_u32()?;
      if (index as usize) < MAX_MAP_VARS {
        let id = self.module.reserve_map_var(index);
        for value in &mut self.module.vars.get_mut(id).values {
          value.string = true;
        }
      }
    }
    Ok(())
  }

  // The zero-era format has no chunks: a flat script directory at the header
  // offset, with the string table inline after it.
  pub(crate) fn read_zero_object(&mut self) -> TaskResult<()> {
    self.read_zero_script_list()?;
    self.read_zero_string_table()?;
    self.determine_end_of_objects();
    self.read_script_body_list()
  }

  fn read_zero_script_list(&mut self) -> TaskResult<()> {
    let dir = self.directory_offset as usize;
    if dir > self.data.len() {
      diag_err("object file gives an offset that points beyond the boundaries of the object file");
      return bail();
    }
    let mut cursor = Cursor::new(&self.data[dir..], "object file".to_string());
    let num_scripts = cursor.read_i32()?;
    for _ in 0..num_scripts {
      let number = cursor.read_u32()?;
      let offset = cursor.read_u32()?;
      let num_param = cursor.read_u32()?;
      let mut script = Script::new();
      // Type and number share the field in this format.
      script.number = (number % 1000) as i32;
      script.script_type = number / 1000;
      script.num_param = num_param;
      script.offset = offset;
      script.reserve_vars(DEFAULT_SCRIPT_VARS);
      self.module.scripts.push(script);
      let index = self.module.scripts.len() - 1;
      self.module.append_object(ObjectRef::Script(index));
    }
    self.string_offset = (dir + cursor.pos()) as u32;
    self.end_offset = self.directory_offset;
    Ok(())
  }

  fn read_zero_string_table(&mut self) -> TaskResult<()> {
    let start = self.string_offset as usize;
    if start > self.data.len() {
      diag_err("object file gives an offset that points beyond the boundaries of the object file");
      return bail();
    }
    let mut cursor = Cursor::new(&self.data[start..], "object file".to_string());
    let count = cursor.read_u32()?;
    for i in 0..count {
      let offset = cursor.read_u32()?;
      self.expect_offset_in_object_file(offset)?;
      self.module.strings.push(chunk_string(self.data, offset as usize));
      if i == 0 {
        // The first string sits right past the last body.
        self.end_offset = offset;
      }
    }
    Ok(())
  }
}

fn read_string(chunk: &Chunk, offset: u32, encrypted: bool) -> TaskResult<String> {
  let mut bytes = vec![];
  let mut pos = offset as usize;
  loop {
    if pos >= chunk.data.len() {
      diag_err(format!(
        "unterminated string at offset {} of {} chunk",
        offset, chunk.name
      ));
      return bail();
    }
    let mut ch = chunk.data[pos];
    if encrypted {
      ch = decrypt_ch(offset, (pos - offset as usize) as u32, ch);
    }
    if ch == 0 {
      break;
    }
    bytes.push(ch);
    pos += 1;
  }
  Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn decrypt_ch(string_offset: u32, ch_pos: u32, ch: u8) -> u8 {
  const ENCRYPTION_CONSTANT: u32 = 157135;
  ch ^ (ENCRYPTION_CONSTANT
    .wrapping_mul(string_offset)
    .wrapping_add(ch_pos / 2)) as u8
}

#[cfg(test)]
mod tests {
  use super::decrypt_ch;

  #[test]
  fn decryption_is_an_involution() {
    for (offset, pos, ch) in [(12, 0, b'h'), (12, 1, b'i'), (977, 30, 0u8)] {
      let encrypted = decrypt_ch(offset, pos, ch);
      assert_eq!(decrypt_ch(offset, pos, encrypted), ch);
    }
  }
}
