use tracing::debug;

use crate::instruction::{DecodeError, Instruction};
use crate::io::{InputQueue, OutputLog};
use crate::memory::{Memory, Word};
use crate::opcode::{Mode, Opcode};
use crate::trace::{NoTrace, Operand, Step, Tracer};

/// Scratch cells added above the program by [`Process::new`].
///
/// Intcode programs routinely address far past their own length, so the
/// default is generous.
pub const DEFAULT_HEADROOM: usize = 900_000;

/// Where a process is in its lifecycle.
///
/// `Halted` and `Faulted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  Running,
  /// Suspended at an input instruction with nothing queued. Pointer and
  /// memory are exactly as they were before that instruction.
  WaitingForInput,
  Halted,
  Faulted(Fault),
}

impl State {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Halted | Self::Faulted(_))
  }
}

/// A fatal execution error. The process that raised it is unusable afterwards.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  #[error("address {address} is outside of memory ({capacity} cells)")]
  OutOfBounds { address: Word, capacity: usize },

  #[error("unknown opcode {opcode} at {ip}")]
  UnknownOpcode { opcode: Word, ip: usize },

  #[error("unknown addressing mode {mode} at {ip}")]
  UnknownAddressingMode { mode: Word, ip: usize },

  #[error("immediate-mode write target at {ip}")]
  InvalidWriteTarget { ip: usize },

  #[error("arithmetic overflow at {ip}")]
  Overflow { ip: usize },
}

/// An error returned to the caller of a [`Process`] operation.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  #[error(transparent)]
  Fault(#[from] Fault),

  #[error("machine has faulted: {0}")]
  Faulted(Fault),

  #[error("machine is halted")]
  MachineHalted,

  #[error("no more output to read")]
  NoMoreOutput,

  #[error("program of {program} cells does not fit in {capacity} cells")]
  CapacityTooSmall { program: usize, capacity: usize },
}

/// A single Intcode machine: memory, registers, I/O queues and run state.
///
/// ```
/// use intcode::vm::{Process, State};
///
/// // echo one value
/// let mut process = Process::new(&[3, 5, 4, 5, 99, 0], []);
/// assert_eq!(process.run_to_interrupt().unwrap(), State::WaitingForInput);
/// process.push_input(42);
/// assert_eq!(process.run_to_interrupt().unwrap(), State::Halted);
/// assert_eq!(process.next_output().unwrap(), 42);
/// ```
#[derive(Debug, Clone)]
pub struct Process {
  ip: usize,
  relative_base: Word,
  memory: Memory,
  input: InputQueue,
  output: OutputLog,
  state: State,
  executed: u64,
}

impl Process {
  /// Load a program with [`DEFAULT_HEADROOM`] cells of scratch space.
  pub fn new<P, I>(program: P, inputs: I) -> Self
  where
    P: AsRef<[Word]>,
    I: IntoIterator<Item = Word>,
  {
    let memory = Memory::with_headroom(program.as_ref(), DEFAULT_HEADROOM);
    Self::load(memory, inputs)
  }

  /// Load a program into exactly `capacity` cells.
  pub fn with_capacity<P, I>(program: P, inputs: I, capacity: usize) -> Result<Self, Error>
  where
    P: AsRef<[Word]>,
    I: IntoIterator<Item = Word>,
  {
    let program = program.as_ref();
    let memory = Memory::new(program, capacity).ok_or(Error::CapacityTooSmall {
      program: program.len(),
      capacity,
    })?;
    Ok(Self::load(memory, inputs))
  }

  fn load<I>(memory: Memory, inputs: I) -> Self
  where
    I: IntoIterator<Item = Word>,
  {
    Self {
      ip: 0,
      relative_base: 0,
      memory,
      input: inputs.into_iter().collect(),
      output: OutputLog::new(),
      state: State::Running,
      executed: 0,
    }
  }

  pub fn state(&self) -> State {
    self.state
  }

  pub fn ip(&self) -> usize {
    self.ip
  }

  pub fn relative_base(&self) -> Word {
    self.relative_base
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  /// Direct access to memory, for patching a program before it runs.
  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  /// Number of instructions retired so far.
  pub fn executed(&self) -> u64 {
    self.executed
  }

  pub fn input(&self) -> &InputQueue {
    &self.input
  }

  pub fn output(&self) -> &OutputLog {
    &self.output
  }

  /// Queue a value for the input opcode.
  pub fn push_input(&mut self, value: Word) {
    self.input.push(value);
  }

  pub fn extend_input<I>(&mut self, values: I)
  where
    I: IntoIterator<Item = Word>,
  {
    self.input.extend(values);
  }

  pub fn has_more_output(&self) -> bool {
    self.output.has_next()
  }

  /// Read the next unread output value.
  pub fn next_output(&mut self) -> Result<Word, Error> {
    self.output.next_value().ok_or(Error::NoMoreOutput)
  }

  /// Every unread output value, marking them read.
  pub fn drain_output(&mut self) -> &[Word] {
    self.output.drain()
  }

  /// The complete output log, read or not.
  pub fn outputs(&self) -> &[Word] {
    self.output.all()
  }

  /// Run until the machine halts, faults, or waits for input.
  ///
  /// Returns [`State::Halted`] or [`State::WaitingForInput`]. Faults are
  /// returned as errors and leave the process in [`State::Faulted`].
  pub fn run_to_interrupt(&mut self) -> Result<State, Error> {
    self.run_to_interrupt_traced(&mut NoTrace)
  }

  /// [`Process::run_to_interrupt`], reporting every retired instruction to
  /// `tracer`.
  pub fn run_to_interrupt_traced<T>(&mut self, tracer: &mut T) -> Result<State, Error>
  where
    T: Tracer + ?Sized,
  {
    loop {
      match self.step_traced(tracer)? {
        State::Running => continue,
        state => return Ok(state),
      }
    }
  }

  /// Run at most `budget` instructions. Returns [`State::Running`] if the
  /// budget ran out before anything else happened.
  pub fn run_for<T>(&mut self, budget: u64, tracer: &mut T) -> Result<State, Error>
  where
    T: Tracer + ?Sized,
  {
    for _ in 0..budget {
      match self.step_traced(tracer)? {
        State::Running => continue,
        state => return Ok(state),
      }
    }
    self.guard()?;
    Ok(self.state)
  }

  /// Execute a single instruction.
  pub fn step(&mut self) -> Result<State, Error> {
    self.step_traced(&mut NoTrace)
  }

  pub fn step_traced<T>(&mut self, tracer: &mut T) -> Result<State, Error>
  where
    T: Tracer + ?Sized,
  {
    self.guard()?;
    let before = self.state;
    match self.execute(tracer) {
      Ok(state) => {
        if state != before {
          debug!(ip = self.ip, ?state, executed = self.executed, "state changed");
        }
        self.state = state;
        Ok(state)
      }
      Err(fault) => {
        debug!(ip = self.ip, %fault, executed = self.executed, "process faulted");
        self.state = State::Faulted(fault);
        Err(fault.into())
      }
    }
  }

  // terminal states never run again
  fn guard(&self) -> Result<(), Error> {
    match self.state {
      State::Halted => Err(Error::MachineHalted),
      State::Faulted(fault) => Err(Error::Faulted(fault)),
      State::Running | State::WaitingForInput => Ok(()),
    }
  }

  fn execute<T>(&mut self, tracer: &mut T) -> Result<State, Fault>
  where
    T: Tracer + ?Sized,
  {
    let mut task = Task::fetch(self)?;
    let state = task.run()?;
    if state != State::WaitingForInput && tracer.enabled() {
      tracer.on_step(&task.step());
    }
    Ok(state)
  }
}

/// One instruction in flight. Effects on memory and I/O are applied directly;
/// the pointer only moves once the instruction completes.
struct Task<'vm> {
  vm: &'vm mut Process,
  ip: usize,
  instruction: Instruction,
  raw: [Word; 3],
  operands: [Option<Operand>; 3],
  next_ip: usize,
}

impl<'vm> Task<'vm> {
  fn fetch(vm: &'vm mut Process) -> Result<Self, Fault> {
    let ip = vm.ip;
    let word = vm.memory.read_at(ip, 0)?;
    let instruction = Instruction::decode(word).map_err(|e| match e {
      DecodeError::UnknownOpcode(opcode) => Fault::UnknownOpcode { opcode, ip },
      DecodeError::UnknownMode(mode) => Fault::UnknownAddressingMode { mode, ip },
    })?;
    let mut raw = [0; 3];
    for (i, cell) in raw.iter_mut().enumerate().take(instruction.arity()) {
      *cell = vm.memory.read_at(ip, i + 1)?;
    }
    Ok(Self {
      vm,
      ip,
      instruction,
      raw,
      operands: [None; 3],
      next_ip: ip + instruction.width(),
    })
  }

  fn run(&mut self) -> Result<State, Fault> {
    let state = match self.instruction.opcode {
      Opcode::Add => arithmetic(self, Word::checked_add)?,
      Opcode::Multiply => arithmetic(self, Word::checked_mul)?,
      Opcode::Input => input(self)?,
      Opcode::Output => output(self)?,
      Opcode::JumpIfTrue => jump_if(self, |v| v != 0)?,
      Opcode::JumpIfFalse => jump_if(self, |v| v == 0)?,
      Opcode::LessThan => compare(self, |a, b| a < b)?,
      Opcode::Equals => compare(self, |a, b| a == b)?,
      Opcode::AdjustRelativeBase => adjust_relative_base(self)?,
      Opcode::Halt => halt(self),
    };
    if state != State::WaitingForInput {
      self.vm.ip = self.next_ip;
      self.vm.executed += 1;
    }
    Ok(state)
  }

  fn overflow(&self) -> Fault {
    Fault::Overflow { ip: self.ip }
  }

  fn relative(&self, offset: Word) -> Result<Word, Fault> {
    offset
      .checked_add(self.vm.relative_base)
      .ok_or_else(|| self.overflow())
  }

  /// Effective value of parameter `i`.
  fn load(&mut self, i: usize) -> Result<Word, Fault> {
    let raw = self.raw[i];
    let value = match self.instruction.modes[i] {
      Mode::Position => self.vm.memory.read(raw)?,
      Mode::Immediate => raw,
      Mode::Relative => self.vm.memory.read(self.relative(raw)?)?,
    };
    self.operands[i] = Some(Operand::Value(value));
    Ok(value)
  }

  /// Effective address of parameter `i` as a write target.
  fn target(&mut self, i: usize) -> Result<Word, Fault> {
    let raw = self.raw[i];
    let address = match self.instruction.modes[i] {
      Mode::Position => raw,
      Mode::Relative => self.relative(raw)?,
      Mode::Immediate => return Err(Fault::InvalidWriteTarget { ip: self.ip }),
    };
    let index = self.vm.memory.check(address)?;
    self.operands[i] = Some(Operand::Address(index));
    Ok(address)
  }

  fn store(&mut self, i: usize, value: Word) -> Result<(), Fault> {
    let address = self.target(i)?;
    self.vm.memory.write(address, value)
  }

  fn jump(&mut self, target: Word) -> Result<(), Fault> {
    self.next_ip = self.vm.memory.check(target)?;
    Ok(())
  }

  fn step(&self) -> Step {
    Step {
      ip: self.ip,
      relative_base: self.vm.relative_base,
      instruction: self.instruction,
      raw: self.raw,
      operands: self.operands,
      next_ip: self.next_ip,
    }
  }
}

// m[c] ← load(a) ∘ load(b)
fn arithmetic(task: &mut Task<'_>, op: fn(Word, Word) -> Option<Word>) -> Result<State, Fault> {
  let a = task.load(0)?;
  let b = task.load(1)?;
  let value = op(a, b).ok_or_else(|| task.overflow())?;
  task.store(2, value)?;
  Ok(State::Running)
}

// m[a] ← pop(input), or suspend without touching anything
fn input(task: &mut Task<'_>) -> Result<State, Fault> {
  if task.vm.input.is_empty() {
    return Ok(State::WaitingForInput);
  }
  let address = task.target(0)?;
  let Some(value) = task.vm.input.pop() else {
    return Ok(State::WaitingForInput);
  };
  task.vm.memory.write(address, value)?;
  Ok(State::Running)
}

// push(output, load(a))
fn output(task: &mut Task<'_>) -> Result<State, Fault> {
  let value = task.load(0)?;
  task.vm.output.push(value);
  Ok(State::Running)
}

// if cond(load(a)) : pc ← load(b)
fn jump_if(task: &mut Task<'_>, cond: fn(Word) -> bool) -> Result<State, Fault> {
  let value = task.load(0)?;
  if cond(value) {
    let target = task.load(1)?;
    task.jump(target)?;
  }
  Ok(State::Running)
}

// m[c] ← cmp(load(a), load(b)) ? 1 : 0
fn compare(task: &mut Task<'_>, cmp: fn(Word, Word) -> bool) -> Result<State, Fault> {
  let a = task.load(0)?;
  let b = task.load(1)?;
  task.store(2, Word::from(cmp(a, b)))?;
  Ok(State::Running)
}

// rb ← rb + load(a)
fn adjust_relative_base(task: &mut Task<'_>) -> Result<State, Fault> {
  let delta = task.load(0)?;
  task.vm.relative_base = task.relative(delta)?;
  Ok(State::Running)
}

// (stop execution), the pointer stays on the halt
fn halt(task: &mut Task<'_>) -> State {
  task.next_ip = task.ip;
  State::Halted
}
