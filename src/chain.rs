//! Processes wired output-to-input.
//!
//! Stages never share memory. After each turn a stage's unread output is
//! moved, in order, onto the input queue of the next stage; with feedback on,
//! the last stage feeds the first. Because every hand-off is FIFO the final
//! output does not depend on how many instructions each turn runs.

use tracing::debug;

use crate::memory::Word;
use crate::trace::NoTrace;
use crate::vm::{Error, Process, State};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
  #[error("a chain needs at least one stage")]
  Empty,

  #[error("stage {stage} failed")]
  Stage {
    stage: usize,
    #[source]
    source: Error,
  },
}

#[derive(Debug, Clone)]
pub struct Chain {
  stages: Vec<Process>,
  feedback: bool,
  quantum: Option<u64>,
  output: Vec<Word>,
}

impl Chain {
  pub fn new(stages: Vec<Process>) -> Result<Self, ChainError> {
    if stages.is_empty() {
      return Err(ChainError::Empty);
    }
    Ok(Self {
      stages,
      feedback: false,
      quantum: None,
      output: Vec::new(),
    })
  }

  /// Route the last stage's output back into the first stage.
  pub fn with_feedback(mut self, feedback: bool) -> Self {
    self.feedback = feedback;
    self
  }

  /// Limit each turn to `quantum` instructions instead of running every stage
  /// until it is interrupted.
  pub fn with_quantum(mut self, quantum: u64) -> Self {
    self.quantum = Some(quantum.max(1));
    self
  }

  pub fn stages(&self) -> &[Process] {
    &self.stages
  }

  /// Queue a value on the first stage.
  pub fn push_input(&mut self, value: Word) {
    self.stages[0].push_input(value);
  }

  /// Everything the last stage has output so far.
  pub fn outputs(&self) -> &[Word] {
    &self.output
  }

  /// Round-robin over the stages until every one has halted or none of them
  /// can move.
  ///
  /// Returns [`State::Halted`] once all stages are halted, or
  /// [`State::WaitingForInput`] when the live stages are all starved. In the
  /// latter case more input can be pushed and the chain run again.
  pub fn run(&mut self) -> Result<State, ChainError> {
    let mut rounds = 0u64;
    loop {
      rounds += 1;
      let mut progressed = false;
      for index in 0..self.stages.len() {
        let stage = &mut self.stages[index];
        if stage.state() != State::Halted {
          let before = stage.executed();
          let result = match self.quantum {
            Some(quantum) => stage.run_for(quantum, &mut NoTrace),
            None => stage.run_to_interrupt(),
          };
          result.map_err(|source| ChainError::Stage {
            stage: index,
            source,
          })?;
          progressed |= stage.executed() != before;
        }
        self.forward(index);
      }

      if self.stages.iter().all(|s| s.state() == State::Halted) {
        debug!(rounds, outputs = self.output.len(), "chain halted");
        return Ok(State::Halted);
      }
      if !progressed {
        debug!(rounds, "chain waiting for input");
        return Ok(State::WaitingForInput);
      }
    }
  }

  fn forward(&mut self, index: usize) {
    let values = self.stages[index].drain_output().to_vec();
    if values.is_empty() {
      return;
    }
    if index + 1 < self.stages.len() {
      self.stages[index + 1].extend_input(values);
      return;
    }
    self.output.extend_from_slice(&values);
    if self.feedback {
      self.stages[0].extend_input(values);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use proptest::prelude::*;

  use crate::vm::Fault;

  const AMPLIFIER: [Word; 17] = [
    3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0,
  ];

  #[rustfmt::skip]
  const FEEDBACK_AMPLIFIER: [Word; 29] = [
    3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26,
    27, 4, 27, 1001, 28, -1, 28, 1005, 28, 6, 99, 0, 0, 5,
  ];

  fn amplifiers(program: &[Word], phases: &[Word]) -> Chain {
    let stages = phases
      .iter()
      .map(|&phase| Process::with_capacity(program, [phase], program.len()).unwrap())
      .collect();
    Chain::new(stages).unwrap()
  }

  #[test]
  fn empty() {
    assert_eq!(Chain::new(Vec::new()).unwrap_err(), ChainError::Empty);
  }

  #[test]
  fn linear() {
    let mut chain = amplifiers(&AMPLIFIER, &[4, 3, 2, 1, 0]);
    chain.push_input(0);
    assert_eq!(chain.run(), Ok(State::Halted));
    assert_eq!(chain.outputs(), &[43210]);
  }

  #[test]
  fn feedback_loop() {
    let mut chain = amplifiers(&FEEDBACK_AMPLIFIER, &[9, 8, 7, 6, 5]).with_feedback(true);
    chain.push_input(0);
    assert_eq!(chain.run(), Ok(State::Halted));
    assert_eq!(chain.outputs().last(), Some(&139629729));
  }

  #[test]
  fn waits_then_resumes() {
    let echo: [Word; 6] = [3, 5, 4, 5, 99, 0];
    let stages = vec![
      Process::with_capacity(echo, [], 6).unwrap(),
      Process::with_capacity(echo, [], 6).unwrap(),
    ];
    let mut chain = Chain::new(stages).unwrap();
    assert_eq!(chain.run(), Ok(State::WaitingForInput));
    assert!(chain.outputs().is_empty());
    chain.push_input(11);
    assert_eq!(chain.run(), Ok(State::Halted));
    assert_eq!(chain.outputs(), &[11]);
  }

  #[test]
  fn stage_fault() {
    let stages = vec![
      Process::with_capacity([104, 1, 99], [], 3).unwrap(),
      Process::with_capacity([42], [], 1).unwrap(),
    ];
    let mut chain = Chain::new(stages).unwrap();
    assert_eq!(
      chain.run(),
      Err(ChainError::Stage {
        stage: 1,
        source: Error::Fault(Fault::UnknownOpcode { opcode: 42, ip: 0 }),
      })
    );
  }

  proptest! {
    #[test]
    fn quantum_does_not_change_output(quantum in 1u64..40) {
      let mut whole = amplifiers(&FEEDBACK_AMPLIFIER, &[9, 7, 8, 5, 6]).with_feedback(true);
      whole.push_input(0);
      prop_assert_eq!(whole.run(), Ok(State::Halted));

      let mut sliced = amplifiers(&FEEDBACK_AMPLIFIER, &[9, 7, 8, 5, 6])
        .with_feedback(true)
        .with_quantum(quantum);
      sliced.push_input(0);
      prop_assert_eq!(sliced.run(), Ok(State::Halted));
      prop_assert_eq!(whole.outputs(), sliced.outputs());
    }
  }
}
