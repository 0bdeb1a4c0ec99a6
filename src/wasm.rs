//! WebAssembly bindings for the Intcode VM.
//!
//! This module provides JavaScript-friendly wrappers around the core machine.
//! Values cross the boundary as `BigInt`s.

use wasm_bindgen::prelude::*;
use js_sys::BigInt64Array;
use crate::machine::{Machine, NullTracer};
use crate::program::{parse_program, disasm::disassemble_at};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmMachine {
    machine: Machine,
    program: Vec<i64>,
}

#[wasm_bindgen]
impl WasmMachine {
    /// Create a machine with no program loaded.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            machine: Machine::new(&[], []),
            program: Vec::new(),
        }
    }

    /// Load a program from source text. Returns the number of words.
    #[wasm_bindgen]
    pub fn load_source(&mut self, source: &str) -> Result<usize, JsError> {
        let program = parse_program(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        let len = program.len();
        self.machine = Machine::new(&program, []);
        self.program = program;

        Ok(len)
    }

    /// Step one instruction. Returns the value emitted, if any.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<Option<i64>, JsError> {
        self.machine.step()
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Run for at most `max_steps` instructions. Returns the values emitted.
    #[wasm_bindgen]
    pub fn run(&mut self, max_steps: u32) -> Result<BigInt64Array, JsError> {
        let report = self.machine.run_limited(u64::from(max_steps), &mut NullTracer)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(BigInt64Array::from(&report.outputs[..]))
    }

    /// Run until halted or awaiting input. Returns the values emitted.
    #[wasm_bindgen]
    pub fn run_until_blocked(&mut self) -> Result<BigInt64Array, JsError> {
        let report = self.machine.run_until_blocked()
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(BigInt64Array::from(&report.outputs[..]))
    }

    /// Queue input values.
    #[wasm_bindgen]
    pub fn append_input(&mut self, values: Vec<i64>) -> Result<(), JsError> {
        self.machine.append_input(values)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }

    /// Reset the machine to the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.machine = Machine::new(&self.program, []);
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.machine.state())
    }

    /// Check if the machine is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.machine.is_halted()
    }

    /// Instructions executed so far.
    #[wasm_bindgen]
    pub fn steps(&self) -> u64 {
        self.machine.steps()
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.machine.regs.pc
    }

    /// Get relative base.
    #[wasm_bindgen]
    pub fn relative_base(&self) -> i64 {
        self.machine.regs.relative_base
    }

    /// Get a memory cell.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> i64 {
        self.machine.mem.get(addr)
    }

    /// Get a window of memory.
    #[wasm_bindgen]
    pub fn memory_window(&self, start: usize, count: usize) -> BigInt64Array {
        BigInt64Array::from(&self.machine.mem.dump(start, count)[..])
    }

    /// Every value emitted so far.
    #[wasm_bindgen]
    pub fn outputs(&self) -> BigInt64Array {
        BigInt64Array::from(self.machine.outputs())
    }

    /// Disassemble the instruction at an address.
    #[wasm_bindgen]
    pub fn disassemble_at(&self, addr: usize) -> String {
        disassemble_at(&self.machine.mem, addr).0
    }

    /// Get the whole machine state as a JSON string.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.machine.snapshot())
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse program text and return its word count.
#[wasm_bindgen]
pub fn wasm_parse(source: &str) -> Result<usize, JsError> {
    let program = parse_program(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(program.len())
}
