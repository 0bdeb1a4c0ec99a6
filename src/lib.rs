//! # Intcode VM
//!
//! A small virtual machine for Intcode programs: integer instructions with
//! position, immediate and relative addressing over sparse, unbounded
//! memory.
//!
//! A machine that reaches an input instruction with nothing queued does not
//! block. It reports [`MachineState::AwaitingInput`] and returns control to
//! the host, which can append input and resume later. Hosts build
//! pipelines of machines on top of [`Machine::run_until_blocked`] and
//! [`Machine::append_input`].

pub mod machine;
pub mod program;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use machine::{Machine, MachineState, MachineError, Memory, Registers, Instruction, Snapshot, RunReport};
pub use machine::{Tracer, TraceEvent, LogTracer};
pub use program::{parse_program, load_program, save_program, disassemble, ProgramError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
