use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use pl0tac::error::IoSnafu;
use pl0tac::{CompileResult, Options, listing};
use snafu::ResultExt;

const USAGE: &str = "usage: {program} [--symbols] [--first-address N] [--first-temp N] \
                     [--max-digits N] [--max-depth N] <file>";

#[derive(Debug, PartialEq)]
struct Cli {
  path: PathBuf,
  symbols: bool,
  options: Options,
}

impl Cli {
  fn parse(args: &[String]) -> Result<Self, String> {
    let mut path = None;
    let mut symbols = false;
    let mut options = Options::default();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
      match arg.as_str() {
        "--symbols" => symbols = true,
        "--first-address" => options.first_address = number(arg, args.next())?,
        "--first-temp" => options.first_temp = number(arg, args.next())?,
        "--max-digits" => options.max_digits = number(arg, args.next())?,
        "--max-depth" => options.max_depth = number(arg, args.next())?,
        flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
        file if path.is_none() => path = Some(PathBuf::from(file)),
        extra => return Err(format!("unexpected argument {extra}")),
      }
    }

    let path = path.ok_or_else(|| "missing source file".to_string())?;
    Ok(Self {
      path,
      symbols,
      options,
    })
  }
}

fn number(flag: &str, value: Option<&String>) -> Result<usize, String> {
  let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
  value
    .parse()
    .map_err(|err| format!("invalid value for {flag}: {value} ({err})"))
}

/// Compile the file and print the results. Returns whether the program was
/// free of diagnostics.
fn run(cli: &Cli) -> CompileResult<bool> {
  let source = fs::read_to_string(&cli.path).context(IoSnafu {
    path: cli.path.clone(),
  })?;
  log::info!("read {} bytes from {}", source.len(), cli.path.display());

  let compilation = pl0tac::compile(&source, &cli.options)?;
  print!("{}", listing::render(&compilation));
  if cli.symbols {
    print!("{}", listing::render_symbols(&compilation.symbols));
  }

  for diagnostic in &compilation.diagnostics {
    eprintln!("{diagnostic}");
  }
  if !compilation.is_clean() {
    eprintln!("{} error(s) in program", compilation.diagnostics.len());
  }
  Ok(compilation.is_clean())
}

fn main() {
  #[cfg(debug_assertions)]
  pretty_env_logger::init_timed();

  let args: Vec<String> = env::args().collect();
  let program = args.first().map(String::as_str).unwrap_or("pl0tac");

  let cli = match Cli::parse(args.get(1..).unwrap_or_default()) {
    Ok(cli) => cli,
    Err(message) => {
      eprintln!("{message}");
      eprintln!("{}", USAGE.replace("{program}", program));
      process::exit(2);
    }
  };

  match run(&cli) {
    Ok(true) => {}
    Ok(false) => process::exit(1),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
