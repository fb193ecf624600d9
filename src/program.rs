use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;

use crate::memory::Word;

/// An Intcode program image, as loaded into the low cells of memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
  words: Vec<Word>,
}

impl Program {
  pub fn words(&self) -> &[Word] {
    &self.words
  }
}

impl From<Vec<Word>> for Program {
  fn from(words: Vec<Word>) -> Self {
    Self { words }
  }
}

impl From<&[Word]> for Program {
  fn from(words: &[Word]) -> Self {
    Self {
      words: words.to_vec(),
    }
  }
}

impl AsRef<[Word]> for Program {
  fn as_ref(&self) -> &[Word] {
    &self.words
  }
}

impl Deref for Program {
  type Target = [Word];

  fn deref(&self) -> &Self::Target {
    &self.words
  }
}

/// A token in program text that is not an integer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid integer {token:?} at position {index}")]
pub struct ParseProgramError {
  /// Zero-based position of the token in the sequence.
  pub index: usize,
  pub token: String,
  #[source]
  pub source: ParseIntError,
}

/// Comma-separated integers. Whitespace around each token is ignored, as is a
/// single trailing comma. Blank text is the empty program.
impl FromStr for Program {
  type Err = ParseProgramError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    let text = text.trim();
    if text.is_empty() {
      return Ok(Self::default());
    }
    let text = text.strip_suffix(',').unwrap_or(text);
    let words = text
      .split(',')
      .enumerate()
      .map(|(index, token)| {
        let token = token.trim();
        token.parse::<Word>().map_err(|source| ParseProgramError {
          index,
          token: token.to_owned(),
          source,
        })
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self { words })
  }
}
