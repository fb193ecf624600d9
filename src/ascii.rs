//! Text adapter for programs that talk in ASCII.
//!
//! These helpers sit outside the machine: they only turn strings into input
//! values and output values back into strings.

use crate::memory::Word;
use crate::vm::Process;

const NEWLINE: Word = b'\n' as Word;

/// One input value per character of `line`, followed by a newline.
pub fn encode_line(line: &str) -> impl Iterator<Item = Word> + '_ {
  line
    .chars()
    .map(|c| Word::from(u32::from(c)))
    .chain(std::iter::once(NEWLINE))
}

/// Queue `line` as a newline-terminated command.
pub fn push_line(process: &mut Process, line: &str) {
  process.extend_input(encode_line(line));
}

/// Output split into printable text and the values that are not ASCII.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
  pub text: String,
  /// Values outside `0..=127`, in output order.
  pub values: Vec<Word>,
}

pub fn decode(values: &[Word]) -> Decoded {
  let mut decoded = Decoded::default();
  for &value in values {
    match u8::try_from(value) {
      Ok(byte) if byte.is_ascii() => decoded.text.push(char::from(byte)),
      _ => decoded.values.push(value),
    }
  }
  decoded
}

/// Decode everything the process has output but nobody has read yet.
pub fn drain_text(process: &mut Process) -> Decoded {
  decode(process.drain_output())
}
