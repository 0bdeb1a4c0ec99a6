//! TUI debugger for the Intcode VM.
//!
//! Provides an interactive terminal-based debugger with:
//! - Disassembly around the program counter, with breakpoints
//! - Register, input queue and output panels
//! - Memory view
//! - Step/run/pause controls and an input prompt for suspended machines

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
