//! Run an Intcode program.
//!
//! Usage: `intcode <PROGRAM> [--input 1,2] [--line TEXT] [--ascii] [--interactive]`

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use intcode::ascii;
use intcode::memory::Word;
use intcode::program::Program;
use intcode::trace::{LogTracer, NoTrace, Tracer};
use intcode::vm::{Process, State};

#[derive(Parser, Debug)]
#[command(name = "intcode")]
#[command(about = "Run an Intcode program until it halts")]
struct Args {
  /// Program file (comma-separated integers), or `-` for stdin
  program: PathBuf,

  /// Input values, comma-separated. May be repeated.
  #[arg(short, long = "input")]
  inputs: Vec<String>,

  /// Input line sent as ASCII codes plus a newline. May be repeated.
  #[arg(short, long = "line")]
  lines: Vec<String>,

  /// Print output as ASCII text; values outside ASCII are printed as numbers
  #[arg(long)]
  ascii: bool,

  /// Total memory cells (defaults to program length plus a large headroom)
  #[arg(long)]
  capacity: Option<usize>,

  /// Give up after this many instructions
  #[arg(long = "max-steps")]
  max_steps: Option<u64>,

  /// Read more input from stdin whenever the program waits for it
  #[arg(long)]
  interactive: bool,

  /// Log every executed instruction
  #[arg(long)]
  trace: bool,
}

fn main() {
  let args = Args::parse();
  init_logging(args.trace);

  if let Err(err) = run(&args) {
    error!("{err:#}");
    process::exit(1);
  }
}

fn init_logging(trace: bool) {
  let default = if trace { "info,intcode=trace" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();
}

fn run(args: &Args) -> Result<()> {
  let from_stdin = args.program.as_os_str() == "-";
  if from_stdin && args.interactive {
    bail!("--interactive needs stdin, so the program must come from a file");
  }

  let program = load_program(&args.program, from_stdin)?;
  info!("Loaded {} cells from {}", program.len(), args.program.display());

  let mut process = match args.capacity {
    Some(capacity) => Process::with_capacity(&program, [], capacity)?,
    None => Process::new(&program, []),
  };
  for input in &args.inputs {
    process.extend_input(parse_values(input)?);
  }
  for line in &args.lines {
    ascii::push_line(&mut process, line);
  }

  let mut tracer: Box<dyn Tracer> = if args.trace {
    Box::new(LogTracer)
  } else {
    Box::new(NoTrace)
  };
  let stdin = io::stdin();
  let mut stdin = stdin.lock();

  loop {
    let state = match args.max_steps {
      Some(limit) => {
        let remaining = limit.saturating_sub(process.executed());
        process.run_for(remaining, tracer.as_mut())?
      }
      None => process.run_to_interrupt_traced(tracer.as_mut())?,
    };
    print_output(&mut process, args.ascii)?;

    match state {
      State::Halted => break,
      State::WaitingForInput if args.interactive => {
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
          bail!("program is waiting for input but stdin is closed");
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if args.ascii {
          ascii::push_line(&mut process, line);
        } else {
          process.extend_input(parse_values(line)?);
        }
      }
      State::WaitingForInput => bail!("program is waiting for input at {}", process.ip()),
      State::Running => bail!(
        "step limit of {} reached at {}",
        args.max_steps.unwrap_or_default(),
        process.ip()
      ),
      State::Faulted(fault) => return Err(fault.into()),
    }
  }

  info!("Halted after {} instructions", process.executed());
  Ok(())
}

fn load_program(path: &Path, from_stdin: bool) -> Result<Program> {
  let text = if from_stdin {
    let mut text = String::new();
    io::stdin()
      .read_to_string(&mut text)
      .context("reading program from stdin")?;
    text
  } else {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
  };
  text
    .parse()
    .with_context(|| format!("parsing {}", path.display()))
}

/// Integers separated by commas or whitespace.
fn parse_values(text: &str) -> Result<Vec<Word>> {
  text
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|token| !token.is_empty())
    .map(|token| {
      token
        .parse::<Word>()
        .with_context(|| format!("invalid input value {token:?}"))
    })
    .collect()
}

fn print_output(process: &mut Process, as_text: bool) -> Result<()> {
  let mut stdout = io::stdout().lock();
  if as_text {
    let decoded = ascii::drain_text(process);
    stdout.write_all(decoded.text.as_bytes())?;
    for value in decoded.values {
      writeln!(stdout, "{value}")?;
    }
  } else {
    for value in process.drain_output() {
      writeln!(stdout, "{value}")?;
    }
  }
  stdout.flush()?;
  Ok(())
}
