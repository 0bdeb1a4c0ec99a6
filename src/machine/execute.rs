//! Execution engine for Intcode.
//!
//! Implements the fetch-decode-execute cycle, the ten instruction
//! behaviors and the cooperative suspend/resume contract: a machine whose
//! next instruction is an input with nothing queued reports
//! [`MachineState::AwaitingInput`] and refuses to step until the host
//! appends input. Nothing is mutated while suspended.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use crate::machine::{Memory, Registers};
use crate::machine::decode::{self, DecodeError, Instruction, Opcode};
use crate::machine::trace::{NullTracer, TraceEvent, Tracer};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    /// The next instruction can run.
    Runnable,
    /// The next instruction is an input and the queue is empty.
    AwaitingInput,
    /// A halt instruction has run. Terminal.
    Halted,
}

/// What one instruction did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// A computed value was written to memory.
    Store { addr: usize, value: i64 },
    /// An input value was consumed and written to memory.
    Input { addr: usize, value: i64 },
    /// A value was emitted.
    Output(i64),
    /// A conditional jump was taken.
    Jump { target: usize },
    /// A conditional jump fell through.
    Skip,
    /// The relative base moved to `base`.
    AdjustBase { base: i64 },
    /// The machine halted.
    Halt,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Store { addr, value } => write!(f, "[{}] <- {}", addr, value),
            Effect::Input { addr, value } => write!(f, "[{}] <- input {}", addr, value),
            Effect::Output(value) => write!(f, "output {}", value),
            Effect::Jump { target } => write!(f, "pc <- {}", target),
            Effect::Skip => write!(f, "no jump"),
            Effect::AdjustBase { base } => write!(f, "rb <- {}", base),
            Effect::Halt => write!(f, "halt"),
        }
    }
}

/// Result of a run call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Values emitted during this call.
    pub outputs: Vec<i64>,
    /// State the machine was left in.
    pub state: MachineState,
    /// Instructions executed during this call.
    pub steps: u64,
}

impl RunReport {
    fn new() -> Self {
        Self {
            outputs: Vec::new(),
            state: MachineState::Runnable,
            steps: 0,
        }
    }
}

/// Point-in-time view of a machine, for debugging and checkpointing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Non-zero memory cells.
    pub memory: BTreeMap<usize, i64>,
    pub pc: usize,
    pub relative_base: i64,
    /// Queued, unconsumed input.
    pub input: Vec<i64>,
    /// Every value emitted so far.
    pub outputs: Vec<i64>,
    pub halted: bool,
    pub awaiting_input: bool,
    pub steps: u64,
}

/// An Intcode machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    /// Registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    input: VecDeque<i64>,
    outputs: Vec<i64>,
    halted: bool,
    steps: u64,
    last_instr: Option<Instruction>,
}

impl Machine {
    /// Create a machine with `program[i]` at address `i` and an initial
    /// input queue.
    pub fn new(program: &[i64], input: impl IntoIterator<Item = i64>) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::from_program(program),
            input: input.into_iter().collect(),
            outputs: Vec::new(),
            halted: false,
            steps: 0,
            last_instr: None,
        }
    }

    /// Rebuild a machine from a snapshot.
    pub fn restore(snapshot: &Snapshot) -> Self {
        let mut mem = Memory::new();
        for (&addr, &value) in &snapshot.memory {
            mem.set(addr, value);
        }
        Self {
            regs: Registers {
                pc: snapshot.pc,
                relative_base: snapshot.relative_base,
            },
            mem,
            input: snapshot.input.iter().copied().collect(),
            outputs: snapshot.outputs.clone(),
            halted: snapshot.halted,
            steps: snapshot.steps,
            last_instr: None,
        }
    }

    /// Current blocking condition. Never mutates.
    pub fn state(&self) -> MachineState {
        if self.halted {
            MachineState::Halted
        } else if self.input.is_empty() && self.next_is_input() {
            MachineState::AwaitingInput
        } else {
            MachineState::Runnable
        }
    }

    /// Peek at the operation code only, so an undecodable word does not
    /// hide a pending input.
    fn next_is_input(&self) -> bool {
        let word = self.mem.get(self.regs.pc);
        word >= 0 && word % 100 == Opcode::Input.code()
    }

    /// Queue input values.
    pub fn append_input(&mut self, values: impl IntoIterator<Item = i64>) -> Result<(), MachineError> {
        if self.halted {
            return Err(MachineError::InputAfterHalt);
        }
        self.input.extend(values);
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns the value emitted, if the instruction was an output.
    pub fn step(&mut self) -> Result<Option<i64>, MachineError> {
        self.step_traced(&mut NullTracer)
    }

    /// [`step`](Self::step) with a trace side-channel.
    pub fn step_traced(&mut self, tracer: &mut dyn Tracer) -> Result<Option<i64>, MachineError> {
        let state = self.state();
        if state != MachineState::Runnable {
            return Err(MachineError::NotRunnable(state));
        }

        // Fetch + decode
        let pc = self.regs.pc;
        let instr = decode::decode(&self.mem, &self.regs)
            .map_err(|source| MachineError::Decode { pc, source })?;

        // Execute
        let effect = self.execute(&instr)?;

        self.steps += 1;
        self.last_instr = Some(instr);

        tracer.trace(&TraceEvent::Executed { pc, instruction: instr, effect });
        if self.state() == MachineState::AwaitingInput {
            tracer.trace(&TraceEvent::Suspended { pc: self.regs.pc });
        }

        Ok(match effect {
            Effect::Output(value) => Some(value),
            _ => None,
        })
    }

    /// Run until the machine halts, returning every value emitted.
    ///
    /// Stops with [`MachineError::InputRequired`] instead of spinning if the
    /// program asks for input that is not queued; whatever was emitted
    /// before that stays available through [`outputs`](Self::outputs).
    pub fn run_to_halt(&mut self) -> Result<Vec<i64>, MachineError> {
        self.run_to_halt_traced(&mut NullTracer)
    }

    /// [`run_to_halt`](Self::run_to_halt) with a trace side-channel.
    pub fn run_to_halt_traced(&mut self, tracer: &mut dyn Tracer) -> Result<Vec<i64>, MachineError> {
        let report = self.run_until_blocked_traced(tracer)?;
        match report.state {
            MachineState::Halted => Ok(report.outputs),
            _ => Err(MachineError::InputRequired { pc: self.regs.pc }),
        }
    }

    /// Run until the machine halts or needs input.
    ///
    /// Calling this on a machine that is already blocked is not an error;
    /// it returns an empty report.
    pub fn run_until_blocked(&mut self) -> Result<RunReport, MachineError> {
        self.run_until_blocked_traced(&mut NullTracer)
    }

    /// [`run_until_blocked`](Self::run_until_blocked) with a trace side-channel.
    pub fn run_until_blocked_traced(&mut self, tracer: &mut dyn Tracer) -> Result<RunReport, MachineError> {
        self.run_limited(u64::MAX, tracer)
    }

    /// Run for at most `max_steps` instructions, stopping early if the
    /// machine halts or needs input.
    pub fn run_limited(&mut self, max_steps: u64, tracer: &mut dyn Tracer) -> Result<RunReport, MachineError> {
        let mut report = RunReport::new();

        while report.steps < max_steps && self.state() == MachineState::Runnable {
            if let Some(value) = self.step_traced(tracer)? {
                report.outputs.push(value);
            }
            report.steps += 1;
        }

        report.state = self.state();
        Ok(report)
    }

    /// Execute a decoded instruction.
    ///
    /// Every fallible check happens before the first mutation, so an error
    /// leaves memory and registers as they were.
    fn execute(&mut self, instr: &Instruction) -> Result<Effect, MachineError> {
        let pc = self.regs.pc;
        let (a, b) = (instr.value(0), instr.value(1));

        let effect = match instr.op {
            Opcode::Add => {
                let value = a.checked_add(b).ok_or(MachineError::Overflow { pc })?;
                self.store(instr, 2, value)?
            }

            Opcode::Mul => {
                let value = a.checked_mul(b).ok_or(MachineError::Overflow { pc })?;
                self.store(instr, 2, value)?
            }

            Opcode::Input => {
                let addr = self.write_target(instr, 0)?;
                let value = self.input.pop_front().ok_or(MachineError::InputRequired { pc })?;
                self.mem.set(addr, value);
                Effect::Input { addr, value }
            }

            Opcode::Output => {
                self.outputs.push(a);
                Effect::Output(a)
            }

            Opcode::JumpIfTrue => self.branch(a != 0, b)?,

            Opcode::JumpIfFalse => self.branch(a == 0, b)?,

            Opcode::LessThan => self.store(instr, 2, i64::from(a < b))?,

            Opcode::Equals => self.store(instr, 2, i64::from(a == b))?,

            Opcode::AdjustBase => {
                let base = self.regs.adjust_base(a).ok_or(MachineError::Overflow { pc })?;
                Effect::AdjustBase { base }
            }

            Opcode::Halt => {
                self.halted = true;
                Effect::Halt
            }
        };

        match effect {
            Effect::Jump { target } => self.regs.jump(target),
            Effect::Halt => {}
            _ => {
                self.regs.advance_pc(instr.width());
            }
        }

        Ok(effect)
    }

    fn write_target(&self, instr: &Instruction, param: usize) -> Result<usize, MachineError> {
        instr.target(param).ok_or(MachineError::ImmediateWrite {
            pc: self.regs.pc,
            param,
        })
    }

    fn store(&mut self, instr: &Instruction, param: usize, value: i64) -> Result<Effect, MachineError> {
        let addr = self.write_target(instr, param)?;
        self.mem.set(addr, value);
        Ok(Effect::Store { addr, value })
    }

    fn branch(&self, taken: bool, target: i64) -> Result<Effect, MachineError> {
        if !taken {
            return Ok(Effect::Skip);
        }
        let target = usize::try_from(target).map_err(|_| MachineError::InvalidJump {
            pc: self.regs.pc,
            target,
        })?;
        Ok(Effect::Jump { target })
    }

    /// Point-in-time view of the whole machine.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            memory: self.mem.cells().collect(),
            pc: self.regs.pc,
            relative_base: self.regs.relative_base,
            input: self.input.iter().copied().collect(),
            outputs: self.outputs.clone(),
            halted: self.halted,
            awaiting_input: self.state() == MachineState::AwaitingInput,
            steps: self.steps,
        }
    }

    /// Every value emitted so far.
    pub fn outputs(&self) -> &[i64] {
        &self.outputs
    }

    /// Queued, unconsumed input.
    pub fn pending_input(&self) -> impl Iterator<Item = i64> + '_ {
        self.input.iter().copied()
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Check if the machine can step.
    pub fn is_runnable(&self) -> bool {
        self.state() == MachineState::Runnable
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state())
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .field("input", &self.input)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine not runnable: {0:?}")]
    NotRunnable(MachineState),

    #[error("input required at pc {pc} but the input queue is empty")]
    InputRequired { pc: usize },

    #[error("cannot append input to a halted machine")]
    InputAfterHalt,

    #[error("decode error at pc {pc}: {source}")]
    Decode {
        pc: usize,
        #[source]
        source: DecodeError,
    },

    #[error("parameter {param} of the instruction at pc {pc} is immediate and cannot be written")]
    ImmediateWrite { pc: usize, param: usize },

    #[error("jump at pc {pc} to negative address {target}")]
    InvalidJump { pc: usize, target: i64 },

    #[error("arithmetic overflow at pc {pc}")]
    Overflow { pc: usize },
}
