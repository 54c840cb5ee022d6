//! End-to-end tests over synthetic object files.
//!
//! Each test assembles a small module in memory, runs the pipeline, and
//! checks the published source.

use task::module::Module;

/// Little-endian byte assembler for test modules.
#[derive(Default)]
struct Builder {
  bytes: Vec<u8>,
}

impl Builder {
  fn u8(&mut self, value: u8) -> &mut Self {
    self.bytes.push(value);
    self
  }

  fn u16(&mut self, value: u16) -> &mut Self {
    self.bytes.extend_from_slice(&value.to_le_bytes());
    self
  }

  fn u32(&mut self, value: u32) -> &mut Self {
    self.bytes.extend_from_slice(&value.to_le_bytes());
    self
  }

  fn tag(&mut self, name: &str) -> &mut Self {
    self.bytes.extend_from_slice(name.as_bytes());
    self
  }
}

/// A full-width instruction stream: every opcode and argument is a 32-bit
/// word.
fn words(values: &[u32]) -> Vec<u8> {
  let mut builder = Builder::default();
  for &value in values {
    builder.u32(value);
  }
  builder.bytes
}

fn chunk(name: &str, payload: &[u8]) -> Vec<u8> {
  let mut builder = Builder::default();
  builder.tag(name).u32(payload.len() as u32);
  builder.bytes.extend_from_slice(payload);
  builder.bytes
}

/// One `SPTR` entry: number, type, parameter count, body offset.
fn sptr(entries: &[(i16, u8, u8, u32)]) -> Vec<u8> {
  let mut payload = Builder::default();
  for &(number, script_type, num_param, offset) in entries {
    payload
      .u16(number as u16)
      .u8(script_type)
      .u8(num_param)
      .u32(offset);
  }
  chunk("SPTR", &payload.bytes)
}

/// Builds an indirect chunk-format module: header, bodies, chunk region,
/// chunk-offset marker, and the old-style directory whose first entry caps
/// the body region.
fn indirect_module(bodies: &[u8], chunks: &[u8], compact: bool) -> Vec<u8> {
  let bodies_end = 8 + bodies.len() as u32;
  let marker_offset = bodies_end + chunks.len() as u32;
  let dir_offset = marker_offset + 8;
  let mut builder = Builder::default();
  builder.tag("ACS\0").u32(dir_offset);
  builder.bytes.extend_from_slice(bodies);
  builder.bytes.extend_from_slice(chunks);
  builder.u32(bodies_end);
  builder.tag(if compact { "ACSe" } else { "ACSE" });
  // Dummy directory: one entry whose offset marks the end of the bodies.
  builder.u32(1).u32(1).u32(bodies_end).u32(0);
  builder.bytes
}

fn load(data: &[u8]) -> Module {
  let mut module = Module::new().expect("catalog must build");
  loader::load(&mut module, data, "test.o").expect("loading must succeed");
  module
}

fn decompile(data: &[u8]) -> String {
  let mut module = load(data);
  discover::annotate(&mut module).expect("annotation must succeed");
  recover::recover(&mut module).expect("recovery must succeed");
  analyzers::analyze(&mut module);
  codegen::publish(&module)
}

// Opcodes used by the test bodies.
const PCD_TERMINATE: u32 = 1;
const PCD_SUSPEND: u32 = 2;
const PCD_PUSHNUMBER: u32 = 3;
const PCD_LSPEC1: u32 = 4;
const PCD_LSPEC2: u32 = 5;
const PCD_SCRIPTWAIT: u32 = 81;
const PCD_DUP: u32 = 216;
const PCD_EQ: u32 = 19;
const PCD_LT: u32 = 21;
const PCD_ASSIGNSCRIPTVAR: u32 = 25;
const PCD_PUSHSCRIPTVAR: u32 = 28;
const PCD_INCSCRIPTVAR: u32 = 46;
const PCD_PUSHGLOBALVAR: u32 = 182;
const PCD_INCGLOBALVAR: u32 = 188;
const PCD_GOTO: u32 = 52;
const PCD_DROP: u32 = 54;
const PCD_DELAY: u32 = 55;
const PCD_IFNOTGOTO: u32 = 79;
const PCD_CASEGOTO: u32 = 84;
const PCD_BEGINPRINT: u32 = 85;
const PCD_ENDPRINT: u32 = 86;
const PCD_PRINTSTRING: u32 = 87;
const PCD_PRINTNUMBER: u32 = 88;
const PCD_GAMETYPE: u32 = 91;

#[test]
fn minimal_script() {
  let bodies = words(&[PCD_PUSHNUMBER, 42, PCD_LSPEC1, 1, PCD_TERMINATE]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("script 1 ( void )"), "{}", output);
  assert!(output.contains("Polyobj_StartLine( 42 );"), "{}", output);
  assert!(output.contains("terminate;"), "{}", output);
  assert!(output.contains("#nocompact"), "{}", output);
  // An action-special call pulls in the engine header.
  assert!(output.contains("#include \"zcommon.acs\""), "{}", output);
}

#[test]
fn do_until_loop() {
  let bodies = words(&[
    PCD_PUSHNUMBER,
    5,
    PCD_DELAY,
    PCD_PUSHSCRIPTVAR,
    0,
    PCD_PUSHNUMBER,
    10,
    PCD_LT,
    PCD_IFNOTGOTO,
    8,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("do {"), "{}", output);
  assert!(output.contains("Delay( 5 );"), "{}", output);
  assert!(output.contains("until ( var0 < 10 );"), "{}", output);
}

#[test]
fn while_loop_with_increment() {
  let bodies = words(&[
    PCD_PUSHSCRIPTVAR,
    0,
    PCD_PUSHNUMBER,
    10,
    PCD_LT,
    PCD_IFNOTGOTO,
    52,
    PCD_INCSCRIPTVAR,
    0,
    PCD_GOTO,
    8,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("while ( var0 < 10 ) {"), "{}", output);
  assert!(output.contains("++var0;"), "{}", output);
}

#[test]
fn switch_with_cases_and_default() {
  let bodies = words(&[
    PCD_PUSHSCRIPTVAR, 0, // 8
    PCD_GOTO, 84, // 16
    PCD_PUSHNUMBER, 1, // 24: case 1 arm
    PCD_DELAY, // 32
    PCD_GOTO, 120, // 36: break
    PCD_PUSHNUMBER, 2, // 44: case 2 arm
    PCD_DELAY, // 52
    PCD_GOTO, 120, // 56: break
    PCD_PUSHNUMBER, 3, // 64: default arm
    PCD_DELAY, // 72
    PCD_GOTO, 120, // 76
    PCD_CASEGOTO, 1, 24, // 84
    PCD_CASEGOTO, 2, 44, // 96
    PCD_DROP, // 108
    PCD_GOTO, 64, // 112: default jump
    PCD_TERMINATE, // 120
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("switch ( var0 ) {"), "{}", output);
  assert!(output.contains("case 1:"), "{}", output);
  assert!(output.contains("case 2:"), "{}", output);
  assert!(output.contains("default:"), "{}", output);
  assert!(output.contains("break;"), "{}", output);
  assert!(output.contains("Delay( 3 );"), "{}", output);
}

#[test]
fn print_block() {
  let bodies = words(&[
    PCD_BEGINPRINT,
    PCD_PUSHNUMBER,
    7,
    PCD_PRINTNUMBER,
    PCD_PUSHNUMBER,
    0,
    PCD_PRINTSTRING,
    PCD_ENDPRINT,
    PCD_TERMINATE,
  ]);
  let mut chunks = sptr(&[(1, 0, 0, 8)]);
  // STRL: pad, count, pad, one offset, then the string data.
  let mut strings = Builder::default();
  strings.u32(0).u32(1).u32(0).u32(16).tag("hi").u8(0);
  chunks.extend_from_slice(&chunk("STRL", &strings.bytes));
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("Print( d: 7, s: \"hi\" );"), "{}", output);
}

#[test]
fn encrypted_strings() {
  // A library-style module with no scripts: header, then one STRE chunk.
  let mut strings = Builder::default();
  strings.u32(0).u32(1).u32(0).u32(16);
  for (i, ch) in [b'h', b'i', 0u8].into_iter().enumerate() {
    let key = 157135u32.wrapping_mul(16).wrapping_add(i as u32 / 2);
    strings.u8(ch ^ key as u8);
  }
  let stre = chunk("STRE", &strings.bytes);
  let mut builder = Builder::default();
  builder.tag("ACSE").u32(8);
  builder.bytes.extend_from_slice(&stre);
  let module = load(&builder.bytes);
  assert_eq!(module.strings, vec!["hi".to_string()]);
  assert!(module.encrypt_str);
  let output = codegen::publish(&module);
  assert!(output.contains("#encryptstrings"), "{}", output);
}

#[test]
fn named_constant_substitution() {
  let bodies = words(&[
    PCD_GAMETYPE, // 8
    PCD_PUSHNUMBER, 1, // 12
    PCD_EQ, // 20
    PCD_IFNOTGOTO, 36, // 24
    PCD_SUSPEND, // 32
    PCD_TERMINATE, // 36
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(
    output.contains("if ( GameType() == GAME_NET_COOPERATIVE ) {"),
    "{}",
    output
  );
  assert!(output.contains("suspend;"), "{}", output);
}

#[test]
fn first_assignment_promotion() {
  let bodies = words(&[
    PCD_PUSHNUMBER,
    5,
    PCD_ASSIGNSCRIPTVAR,
    0,
    PCD_PUSHSCRIPTVAR,
    0,
    PCD_DELAY,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("int var0 = 5;"), "{}", output);
  assert!(output.contains("Delay( var0 );"), "{}", output);
}

#[test]
fn global_var_increment_fusion() {
  // A global slot read fused with its increment, in both orders: the
  // post-inc push-then-inc shape and the pre-inc inc-then-push shape.
  let bodies = words(&[
    PCD_PUSHGLOBALVAR,
    0,
    PCD_INCGLOBALVAR,
    0,
    PCD_ASSIGNSCRIPTVAR,
    0,
    PCD_INCGLOBALVAR,
    0,
    PCD_PUSHGLOBALVAR,
    0,
    PCD_ASSIGNSCRIPTVAR,
    1,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("int var0 = globalvar0++;"), "{}", output);
  assert!(output.contains("++globalvar0;"), "{}", output);
  assert!(output.contains("int var1 = globalvar0;"), "{}", output);
}

#[test]
fn compact_code_decoding() {
  // Compact stream: one-byte opcodes, byte-packed literals.
  let bodies = vec![167u8, 42, 55, 1]; // PUSHBYTE 42; DELAY; TERMINATE
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, true));
  assert!(output.contains("Delay( 42 );"), "{}", output);
  assert!(!output.contains("#nocompact"), "{}", output);
}

#[test]
fn empty_body_emits_empty_block() {
  let bodies = vec![];
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("script 1 ( void ) { }"), "{}", output);
}

#[test]
fn open_script_keyword() {
  let bodies = words(&[PCD_TERMINATE]);
  let chunks = sptr(&[(1, 1, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("script 1 open {"), "{}", output);
}

#[test]
fn instruction_positions_are_monotone() {
  let bodies = words(&[PCD_PUSHNUMBER, 42, PCD_LSPEC1, 1, PCD_TERMINATE]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let module = load(&indirect_module(&bodies, &chunks, false));
  let body = &module.scripts[0].body;
  for pair in body.pcodes.windows(2) {
    assert!(pair[0].obj_pos < pair[1].obj_pos);
  }
}

#[test]
fn emission_is_idempotent() {
  let bodies = words(&[
    PCD_PUSHNUMBER,
    5,
    PCD_ASSIGNSCRIPTVAR,
    0,
    PCD_PUSHSCRIPTVAR,
    0,
    PCD_DELAY,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let mut module = load(&indirect_module(&bodies, &chunks, false));
  discover::annotate(&mut module).unwrap();
  recover::recover(&mut module).unwrap();
  analyzers::analyze(&mut module);
  let first = codegen::publish(&module);
  let second = codegen::publish(&module);
  assert_eq!(first, second);
}

#[test]
fn disassembly_lists_the_stream() {
  let bodies = words(&[PCD_PUSHNUMBER, 42, PCD_LSPEC1, 1, PCD_TERMINATE]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let module = load(&indirect_module(&bodies, &chunks, false));
  let listing = codegen::disassemble(&module);
  assert!(listing.contains("PUSHNUMBER 42"), "{}", listing);
  assert!(listing.contains("LSPEC1 1"), "{}", listing);
}

#[test]
fn zero_era_module() {
  // The earliest container: flat directory at the header offset, with the
  // script type packed into the number, and an inline string table.
  let body = words(&[PCD_PUSHNUMBER, 42, PCD_LSPEC1, 1, PCD_TERMINATE]);
  let dir_offset = 8 + body.len() as u32;
  let mut builder = Builder::default();
  builder.tag("ACS\0").u32(dir_offset);
  builder.bytes.extend_from_slice(&body);
  builder.u32(1).u32(1001).u32(8).u32(0);
  builder.u32(0); // empty string table
  let output = decompile(&builder.bytes);
  assert!(output.contains("script 1 open {"), "{}", output);
  assert!(output.contains("Polyobj_StartLine( 42 );"), "{}", output);
}

#[test]
fn execute_wait_idiom() {
  // Acs_Execute with a duplicated script number and a trailing wait
  // collapses into the composite call.
  let bodies = words(&[
    PCD_PUSHNUMBER,
    5,
    PCD_DUP,
    PCD_PUSHNUMBER,
    0,
    PCD_LSPEC2,
    80,
    PCD_SCRIPTWAIT,
    PCD_TERMINATE,
  ]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let output = decompile(&indirect_module(&bodies, &chunks, false));
  assert!(output.contains("ACS_ExecuteWait( 5, 0 );"), "{}", output);
}

#[test]
fn unknown_format_is_rejected() {
  let mut builder = Builder::default();
  builder.tag("WXYZ").u32(8);
  let mut module = Module::new().unwrap();
  assert!(loader::load(&mut module, &builder.bytes, "test.o").is_err());
}

#[test]
fn unresolvable_jump_is_rejected() {
  // A goto into the middle of an instruction.
  let bodies = words(&[PCD_GOTO, 11, PCD_TERMINATE]);
  let chunks = sptr(&[(1, 0, 0, 8)]);
  let mut module = Module::new().unwrap();
  assert!(loader::load(&mut module, &indirect_module(&bodies, &chunks, false), "test.o").is_err());
}
