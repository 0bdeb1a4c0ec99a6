//! Program text and listings.
//!
//! This module provides:
//! - a loader for Intcode program text (comma separated integers)
//! - a disassembler (memory → readable listing)

pub mod source;
pub mod disasm;

pub use source::{parse_program, load_program, save_program, ProgramError};
pub use disasm::{disassemble, disassemble_at};
