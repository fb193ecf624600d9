use crate::memory::Word;
use crate::opcode::{Mode, Opcode};

/// A decoded instruction word.
///
/// Mode digits beyond the opcode's arity are kept when they are valid and
/// read as [`Mode::Position`] otherwise; they are never used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
  pub opcode: Opcode,
  pub modes: [Mode; 3],
}

/// Why an instruction word could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
  UnknownOpcode(Word),
  UnknownMode(Word),
}

impl Instruction {
  pub fn new(opcode: Opcode, modes: [Mode; 3]) -> Self {
    Self { opcode, modes }
  }

  /// Split a word into opcode and parameter modes.
  ///
  /// `opcode = w mod 100`, `mode_i = (w / 10^(i+1)) mod 10`. Division
  /// truncates, so negative words decode to negative opcodes and are rejected.
  pub fn decode(word: Word) -> Result<Self, DecodeError> {
    let opcode = Opcode::try_from(word % 100).map_err(DecodeError::UnknownOpcode)?;
    let mut modes = [Mode::Position; 3];
    let mut digits = word / 100;
    for (i, mode) in modes.iter_mut().enumerate() {
      let digit = digits % 10;
      *mode = if i < opcode.arity() {
        Mode::try_from(digit).map_err(DecodeError::UnknownMode)?
      } else {
        Mode::try_from(digit).unwrap_or_default()
      };
      digits /= 10;
    }
    Ok(Self { opcode, modes })
  }

  /// Inverse of [`Instruction::decode`].
  pub fn encode(&self) -> Word {
    self
      .modes
      .iter()
      .rev()
      .fold(0, |acc, &mode| acc * 10 + mode as Word)
      * 100
      + self.opcode as Word
  }

  pub fn arity(&self) -> usize {
    self.opcode.arity()
  }

  /// Number of cells the instruction occupies, word included.
  pub fn width(&self) -> usize {
    self.arity() + 1
  }

  /// Modes of the parameters the opcode actually takes.
  pub fn params(&self) -> &[Mode] {
    &self.modes[..self.arity()]
  }
}
