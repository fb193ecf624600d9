use std::ops::Index;

use crate::vm::Fault;

/// A single memory cell.
pub type Word = i64;

/// Linearly addressed, fixed-capacity memory.
///
/// The program is copied into the low cells and everything above it is zeroed
/// scratch space. Memory never grows after construction, so an address outside
/// `0..capacity` is always a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
  cells: Vec<Word>,
}

impl Memory {
  /// Create memory holding `program` followed by zeroes, `capacity` cells in
  /// total. Returns `None` if the program does not fit.
  pub fn new(program: &[Word], capacity: usize) -> Option<Self> {
    if program.len() > capacity {
      return None;
    }
    let mut cells = vec![0; capacity];
    cells[..program.len()].copy_from_slice(program);
    Some(Self { cells })
  }

  /// Create memory holding `program` followed by `headroom` zeroed cells.
  pub fn with_headroom(program: &[Word], headroom: usize) -> Self {
    let mut cells = Vec::with_capacity(program.len() + headroom);
    cells.extend_from_slice(program);
    cells.resize(program.len() + headroom, 0);
    Self { cells }
  }

  pub fn capacity(&self) -> usize {
    self.cells.len()
  }

  /// Validate an address, converting it to an index.
  pub fn check(&self, address: Word) -> Result<usize, Fault> {
    usize::try_from(address)
      .ok()
      .filter(|&index| index < self.cells.len())
      .ok_or(Fault::OutOfBounds {
        address,
        capacity: self.cells.len(),
      })
  }

  pub fn read(&self, address: Word) -> Result<Word, Fault> {
    let index = self.check(address)?;
    Ok(self.cells[index])
  }

  /// Overwrite a cell in place. Instruction words are ordinary cells, so this
  /// is also how programs modify their own code.
  pub fn write(&mut self, address: Word, value: Word) -> Result<(), Fault> {
    let index = self.check(address)?;
    self.cells[index] = value;
    Ok(())
  }

  /// Read the cell at `base + offset`, where `base` is already a valid index.
  pub(crate) fn read_at(&self, base: usize, offset: usize) -> Result<Word, Fault> {
    let address = base
      .checked_add(offset)
      .and_then(|a| Word::try_from(a).ok())
      .unwrap_or(Word::MAX);
    self.read(address)
  }

  pub fn as_slice(&self) -> &[Word] {
    &self.cells
  }
}

impl Index<usize> for Memory {
  type Output = Word;

  fn index(&self, index: usize) -> &Self::Output {
    &self.cells[index]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_pads_with_zeroes() {
    let memory = Memory::new(&[1, 2, 3], 8).unwrap();
    assert_eq!(memory.capacity(), 8);
    assert_eq!(memory.as_slice(), &[1, 2, 3, 0, 0, 0, 0, 0]);
  }

  #[test]
  fn with_headroom() {
    let memory = Memory::with_headroom(&[4, 5], 3);
    assert_eq!(memory.as_slice(), &[4, 5, 0, 0, 0]);
  }

  #[test]
  fn new_rejects_oversized_program() {
    assert!(Memory::new(&[1, 2, 3], 2).is_none());
    assert!(Memory::new(&[1, 2, 3], 3).is_some());
  }

  #[test]
  fn read_write_in_bounds() {
    let mut memory = Memory::new(&[99], 4).unwrap();
    assert_eq!(memory.read(3), Ok(0));
    memory.write(3, -17).unwrap();
    assert_eq!(memory.read(3), Ok(-17));
    assert_eq!(memory[3], -17);
  }

  #[test]
  fn out_of_bounds() {
    let mut memory = Memory::new(&[99], 4).unwrap();
    let fault = Fault::OutOfBounds {
      address: 4,
      capacity: 4,
    };
    assert_eq!(memory.read(4), Err(fault));
    assert_eq!(memory.write(4, 1), Err(fault));
    assert_eq!(
      memory.read(-1),
      Err(Fault::OutOfBounds {
        address: -1,
        capacity: 4
      })
    );
    // nothing was touched
    assert_eq!(memory.as_slice(), &[99, 0, 0, 0]);
  }

  #[test]
  fn read_at_offset() {
    let memory = Memory::new(&[5, 6, 7], 3).unwrap();
    assert_eq!(memory.read_at(1, 1), Ok(7));
    assert!(memory.read_at(2, 1).is_err());
  }
}
