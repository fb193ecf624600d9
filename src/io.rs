use std::collections::VecDeque;

use crate::memory::Word;

/// Values waiting to be consumed by the input opcode, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputQueue {
  values: VecDeque<Word>,
}

impl InputQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, value: Word) {
    self.values.push_back(value);
  }

  pub fn pop(&mut self) -> Option<Word> {
    self.values.pop_front()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Word> {
    self.values.iter()
  }
}

impl Extend<Word> for InputQueue {
  fn extend<I: IntoIterator<Item = Word>>(&mut self, iter: I) {
    self.values.extend(iter);
  }
}

impl FromIterator<Word> for InputQueue {
  fn from_iter<I: IntoIterator<Item = Word>>(iter: I) -> Self {
    Self {
      values: iter.into_iter().collect(),
    }
  }
}

/// Everything the program has output, plus a cursor marking what has been
/// read so far. Entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputLog {
  values: Vec<Word>,
  cursor: usize,
}

impl OutputLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, value: Word) {
    self.values.push(value);
  }

  /// Whether the cursor has anything left to read.
  pub fn has_next(&self) -> bool {
    self.cursor < self.values.len()
  }

  /// Read the value under the cursor and advance past it.
  pub fn next_value(&mut self) -> Option<Word> {
    let value = self.values.get(self.cursor).copied()?;
    self.cursor += 1;
    Some(value)
  }

  /// Values not read yet; the cursor moves to the end.
  pub fn drain(&mut self) -> &[Word] {
    let start = self.cursor;
    self.cursor = self.values.len();
    &self.values[start..]
  }

  /// Values not read yet, without moving the cursor.
  pub fn pending(&self) -> &[Word] {
    &self.values[self.cursor..]
  }

  /// The whole log, regardless of the cursor.
  pub fn all(&self) -> &[Word] {
    &self.values
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod input {
    use super::*;

    #[test]
    fn fifo() {
      let mut queue: InputQueue = [1, 2].into_iter().collect();
      queue.push(3);
      assert_eq!(queue.len(), 3);
      assert_eq!(queue.pop(), Some(1));
      assert_eq!(queue.pop(), Some(2));
      queue.extend([4, 5]);
      assert_eq!(queue.pop(), Some(3));
      assert_eq!(queue.pop(), Some(4));
      assert_eq!(queue.pop(), Some(5));
      assert_eq!(queue.pop(), None);
      assert!(queue.is_empty());
    }
  }

  mod output {
    use super::*;

    #[test]
    fn cursor_advances_one_at_a_time() {
      let mut log = OutputLog::new();
      assert!(!log.has_next());
      assert_eq!(log.next_value(), None);
      log.push(10);
      log.push(20);
      assert!(log.has_next());
      assert_eq!(log.next_value(), Some(10));
      assert_eq!(log.cursor(), 1);
      assert_eq!(log.next_value(), Some(20));
      assert_eq!(log.next_value(), None);
      assert_eq!(log.all(), &[10, 20]);
    }

    #[test]
    fn drain_and_pending() {
      let mut log = OutputLog::new();
      log.push(1);
      log.push(2);
      assert_eq!(log.next_value(), Some(1));
      assert_eq!(log.pending(), &[2]);
      log.push(3);
      assert_eq!(log.drain(), &[2, 3]);
      assert!(log.drain().is_empty());
      assert!(!log.has_next());
      assert_eq!(log.all(), &[1, 2, 3]);
    }
  }
}
