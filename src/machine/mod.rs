//! The Intcode machine.
//!
//! - sparse, zero-filled memory of signed 64-bit cells
//! - two registers: program counter and relative base
//! - ten opcodes with position, immediate and relative addressing
//! - cooperative suspension when an input instruction finds no input

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;
pub mod trace;

pub use memory::Memory;
pub use registers::Registers;
pub use decode::{AddrMode, DecodeError, Instruction, Opcode, Param};
pub use execute::{Effect, Machine, MachineError, MachineState, RunReport, Snapshot};
pub use trace::{LogTracer, NullTracer, TraceEvent, TraceLog, Tracer};
