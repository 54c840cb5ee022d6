use std::process::ExitCode;
use std::{env, fs};

use task::errors::diag_err;
use task::module::Module;

struct Options {
  object_file: Option<String>,
  source_file: Option<String>,
  disassemble: bool,
}

fn main() -> ExitCode {
  // structure: deacs <flags?> <object-file> <output-file?>
  let args = env::args().collect::<Vec<String>>();
  let options = read_options(&args);
  match options.object_file {
    Some(_) => {
      let ok = if options.disassemble {
        disassemble(&options)
      } else {
        decompile(&options)
      };
      if ok {
        ExitCode::SUCCESS
      } else {
        ExitCode::FAILURE
      }
    }
    None => {
      print_usage(&args[0]);
      ExitCode::FAILURE
    }
  }
}

fn read_options(args: &[String]) -> Options {
  let mut options = Options {
    object_file: None,
    source_file: None,
    disassemble: false,
  };
  let mut rest = &args[1..];
  while let Some(arg) = rest.first() {
    let option = match arg.strip_prefix('-') {
      Some(option) => option,
      None => break,
    };
    rest = &rest[1..];
    match option {
      "a" => options.disassemble = true,
      _ => {
        println!("error: unknown option: {}", option);
        return options;
      }
    }
  }
  if let Some(file) = rest.first() {
    options.object_file = Some(file.clone());
    options.source_file = rest.get(1).cloned();
  }
  options
}

fn print_usage(path: &str) {
  println!(
    "Usage: {} [options] <object-file> [output-file]\n\
     Options:\n\
    \x20 -a    Disassemble",
    path
  );
}

fn load_module(options: &Options) -> Option<Module> {
  let object_file = options.object_file.as_deref().unwrap_or_default();
  let data = match fs::read(object_file) {
    Ok(data) => data,
    Err(_) => {
      diag_err(format!("failed to open object file: \"{}\"", object_file));
      return None;
    }
  };
  let mut module = Module::new().ok()?;
  loader::load(&mut module, &data, object_file).ok()?;
  Some(module)
}

fn disassemble(options: &Options) -> bool {
  let module = match load_module(options) {
    Some(module) => module,
    None => return false,
  };
  print!("{}", codegen::disassemble(&module));
  true
}

fn decompile(options: &Options) -> bool {
  let mut module = match load_module(options) {
    Some(module) => module,
    None => return false,
  };
  if discover::annotate(&mut module).is_err() {
    return false;
  }
  if recover::recover(&mut module).is_err() {
    return false;
  }
  analyzers::analyze(&mut module);
  let text = codegen::publish(&module);
  match &options.source_file {
    Some(source_file) => {
      if fs::write(source_file, text).is_err() {
        println!("error: failed to open output file");
        return false;
      }
    }
    None => print!("{}", text),
  }
  true
}
