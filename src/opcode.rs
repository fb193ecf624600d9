use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
  /// Adds two values and stores the sum.
  ///
  /// | Operation | Semantics/RTL          | Width |
  /// |-----------|------------------------|-------|
  /// | Add       | `m[c] ← load(a) + load(b)` | 4 |
  Add = 1,

  /// Multiplies two values and stores the product.
  ///
  /// | Operation | Semantics/RTL          | Width |
  /// |-----------|------------------------|-------|
  /// | Multiply  | `m[c] ← load(a) × load(b)` | 4 |
  Multiply = 2,

  /// Takes one value from the front of the input queue.
  ///
  /// If the queue is empty the process suspends here and the instruction is
  /// retried, untouched, on the next run.
  ///
  /// | Operation | Semantics/RTL      | Width |
  /// |-----------|--------------------|-------|
  /// | Input     | `m[a] ← pop(input)` | 2 |
  Input = 3,

  /// Appends a value to the output log.
  ///
  /// | Operation | Semantics/RTL             | Width |
  /// |-----------|---------------------------|-------|
  /// | Output    | `push(output, load(a))`   | 2 |
  Output = 4,

  /// | Operation  | Semantics/RTL                      | Width |
  /// |------------|------------------------------------|-------|
  /// | JumpIfTrue | `if load(a) ≠ 0 : pc ← load(b)`    | 3 |
  JumpIfTrue = 5,

  /// | Operation   | Semantics/RTL                      | Width |
  /// |-------------|------------------------------------|-------|
  /// | JumpIfFalse | `if load(a) = 0 : pc ← load(b)`    | 3 |
  JumpIfFalse = 6,

  /// | Operation | Semantics/RTL                       | Width |
  /// |-----------|-------------------------------------|-------|
  /// | LessThan  | `m[c] ← load(a) < load(b) ? 1 : 0`  | 4 |
  LessThan = 7,

  /// | Operation | Semantics/RTL                       | Width |
  /// |-----------|-------------------------------------|-------|
  /// | Equals    | `m[c] ← load(a) = load(b) ? 1 : 0`  | 4 |
  Equals = 8,

  /// The only way to move the relative base.
  ///
  /// | Operation          | Semantics/RTL     | Width |
  /// |--------------------|-------------------|-------|
  /// | AdjustRelativeBase | `rb ← rb + load(a)` | 2 |
  AdjustRelativeBase = 9,

  /// | Operation | Semantics/RTL      | Width |
  /// |-----------|--------------------|-------|
  /// | Halt      | `(stop execution)` | 1 |
  Halt = 99,
}

impl Opcode {
  /// Number of parameters following the instruction word.
  pub const fn arity(self) -> usize {
    match self {
      Self::Add | Self::Multiply | Self::LessThan | Self::Equals => 3,
      Self::JumpIfTrue | Self::JumpIfFalse => 2,
      Self::Input | Self::Output | Self::AdjustRelativeBase => 1,
      Self::Halt => 0,
    }
  }

  /// Index (0-based) of the parameter this opcode writes through, if any.
  pub const fn destination(self) -> Option<usize> {
    match self {
      Self::Add | Self::Multiply | Self::LessThan | Self::Equals => Some(2),
      Self::Input => Some(0),
      _ => None,
    }
  }

  /// Short mnemonic used in traces.
  pub const fn mnemonic(self) -> &'static str {
    match self {
      Self::Add => "ADD",
      Self::Multiply => "MUL",
      Self::Input => "IN",
      Self::Output => "OUT",
      Self::JumpIfTrue => "JNZ",
      Self::JumpIfFalse => "JZ",
      Self::LessThan => "LT",
      Self::Equals => "EQ",
      Self::AdjustRelativeBase => "ARB",
      Self::Halt => "HLT",
    }
  }

  /// Every opcode the machine understands.
  pub const ALL: [Opcode; 10] = [
    Self::Add,
    Self::Multiply,
    Self::Input,
    Self::Output,
    Self::JumpIfTrue,
    Self::JumpIfFalse,
    Self::LessThan,
    Self::Equals,
    Self::AdjustRelativeBase,
    Self::Halt,
  ];
}

impl TryFrom<i64> for Opcode {
  type Error = i64;

  fn try_from(code: i64) -> Result<Self, Self::Error> {
    match code {
      1 => Ok(Self::Add),
      2 => Ok(Self::Multiply),
      3 => Ok(Self::Input),
      4 => Ok(Self::Output),
      5 => Ok(Self::JumpIfTrue),
      6 => Ok(Self::JumpIfFalse),
      7 => Ok(Self::LessThan),
      8 => Ok(Self::Equals),
      9 => Ok(Self::AdjustRelativeBase),
      99 => Ok(Self::Halt),
      other => Err(other),
    }
  }
}

impl fmt::Display for Opcode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.mnemonic())
  }
}

/// How a parameter is turned into a value or an address.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
  /// The parameter is an address: `m[p]`.
  #[default]
  Position = 0,
  /// The parameter is the value itself. Never valid as a write target.
  Immediate = 1,
  /// The parameter is an offset from the relative base: `m[p + rb]`.
  Relative = 2,
}

impl Mode {
  pub const ALL: [Mode; 3] = [Self::Position, Self::Immediate, Self::Relative];
}

impl TryFrom<i64> for Mode {
  type Error = i64;

  fn try_from(digit: i64) -> Result<Self, Self::Error> {
    match digit {
      0 => Ok(Self::Position),
      1 => Ok(Self::Immediate),
      2 => Ok(Self::Relative),
      other => Err(other),
    }
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let tag = match self {
      Self::Position => "P",
      Self::Immediate => "I",
      Self::Relative => "R",
    };
    f.write_str(tag)
  }
}
