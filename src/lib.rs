//! An Intcode virtual machine
//!
//! Programs are flat arrays of signed integers. Each instruction word carries
//! an opcode in its two lowest decimal digits and one addressing mode per
//! parameter in the digits above that. A [`Process`](vm::Process) owns its
//! memory, registers and I/O queues, and runs until it halts, faults, or needs
//! input that has not been supplied yet. In the last case it can be resumed
//! later without replaying anything.
//!
//! ```
//! use intcode::program::Program;
//! use intcode::vm::{Process, State};
//!
//! let program: Program = "3,9,8,9,10,9,4,9,99,-1,8".parse().unwrap();
//! let mut process = Process::new(&program, [8]);
//! assert_eq!(process.run_to_interrupt().unwrap(), State::Halted);
//! assert_eq!(process.next_output().unwrap(), 1);
//! ```

pub mod ascii;
pub mod chain;
pub mod instruction;
pub mod io;
pub mod memory;
pub mod opcode;
pub mod program;
pub mod trace;
pub mod vm;
