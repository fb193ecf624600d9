//! Per-instruction observation.
//!
//! A [`Tracer`] is handed to a single run call, so tracing can be switched on
//! for one run and off for the next without touching the process.

use std::fmt;

use crate::instruction::Instruction;
use crate::memory::Word;

/// A parameter after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
  /// A value that was read.
  Value(Word),
  /// An address that was written to.
  Address(usize),
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Value(v) => write!(f, "{v}"),
      Self::Address(a) => write!(f, "@{a}"),
    }
  }
}

/// One retired instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
  /// Pointer the instruction was fetched from.
  pub ip: usize,
  /// Relative base after the instruction.
  pub relative_base: Word,
  pub instruction: Instruction,
  /// Parameter cells as they appear in memory.
  pub raw: [Word; 3],
  /// Resolved parameters, `None` where a parameter was not resolved (past the
  /// arity, or a jump target that was not taken).
  pub operands: [Option<Operand>; 3],
  /// Pointer after the instruction.
  pub next_ip: usize,
}

impl Step {
  pub fn operands(&self) -> impl Iterator<Item = Operand> + '_ {
    self.operands.iter().flatten().copied()
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{:>6} (rb {:>6}) {:<3}",
      self.ip, self.relative_base, self.instruction.opcode
    )?;
    for (mode, raw) in self.instruction.params().iter().zip(self.raw) {
      write!(f, " {mode}{raw}")?;
    }
    f.write_str(" |")?;
    for operand in self.operands() {
      write!(f, " {operand}")?;
    }
    write!(f, " -> {}", self.next_ip)
  }
}

/// Observer of retired instructions.
pub trait Tracer {
  /// Called once per instruction, after its effects are applied.
  fn on_step(&mut self, step: &Step);

  /// When false the machine skips building [`Step`]s altogether.
  fn enabled(&self) -> bool {
    true
  }
}

/// Tracer that observes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl Tracer for NoTrace {
  fn on_step(&mut self, _step: &Step) {}

  fn enabled(&self) -> bool {
    false
  }
}

/// Emits every step as a `trace`-level event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
  fn on_step(&mut self, step: &Step) {
    tracing::trace!(target: "intcode::trace", "{step}");
  }

  fn enabled(&self) -> bool {
    tracing::enabled!(target: "intcode::trace", tracing::Level::TRACE)
  }
}

/// Records every step, mostly useful in tests.
impl Tracer for Vec<Step> {
  fn on_step(&mut self, step: &Step) {
    self.push(*step);
  }
}
