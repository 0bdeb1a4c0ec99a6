//! Execution tracing.
//!
//! The machine never logs on its own. Hosts that want a trace pass a
//! [`Tracer`] to the `*_traced` entry points on [`Machine`](crate::Machine);
//! any `FnMut(&TraceEvent)` closure works, and [`LogTracer`] forwards every
//! event to `tracing`.

use std::fmt;
use crate::machine::decode::Instruction;
use crate::machine::execute::Effect;

/// Something that happened inside the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// One instruction ran.
    Executed {
        pc: usize,
        instruction: Instruction,
        effect: Effect,
    },
    /// The next instruction needs input that is not queued.
    Suspended { pc: usize },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Executed { pc, instruction, effect } => {
                write!(f, "{:04}: {:<28} {}", pc, instruction, effect)
            }
            TraceEvent::Suspended { pc } => write!(f, "{:04}: awaiting input", pc),
        }
    }
}

/// Receives trace events.
pub trait Tracer {
    fn trace(&mut self, event: &TraceEvent);
}

impl<F: FnMut(&TraceEvent)> Tracer for F {
    fn trace(&mut self, event: &TraceEvent) {
        self(event)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTracer;

impl Tracer for NullTracer {
    #[inline]
    fn trace(&mut self, _event: &TraceEvent) {}
}

/// Forwards events to `tracing` at TRACE level (suspensions at DEBUG).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl Tracer for LogTracer {
    fn trace(&mut self, event: &TraceEvent) {
        match event {
            TraceEvent::Executed { pc, .. } => tracing::trace!(pc = *pc, "{}", event),
            TraceEvent::Suspended { pc } => tracing::debug!(pc = *pc, "machine awaiting input"),
        }
    }
}

/// Collects the rendered trace lines (handy in tests and the debugger).
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    pub lines: Vec<String>,
}

impl Tracer for TraceLog {
    fn trace(&mut self, event: &TraceEvent) {
        self.lines.push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Machine;

    #[test]
    fn test_closure_tracer_sees_every_step() {
        let mut machine = Machine::new(&[1, 0, 0, 0, 99], []);
        let mut pcs = Vec::new();
        let mut tracer = |event: &TraceEvent| {
            if let TraceEvent::Executed { pc, .. } = event {
                pcs.push(*pc);
            }
        };
        machine.run_until_blocked_traced(&mut tracer).unwrap();
        assert_eq!(pcs, vec![0, 4]);
    }

    #[test]
    fn test_trace_log_renders_effects() {
        let mut machine = Machine::new(&[1002, 4, 3, 4, 33], []);
        let mut log = TraceLog::default();
        machine.step_traced(&mut log).unwrap();
        assert_eq!(log.lines.len(), 1);
        assert!(log.lines[0].starts_with("0000: MUL [4] 3 [4]"));
        assert!(log.lines[0].ends_with("[4] <- 99"));
    }

    #[test]
    fn test_suspension_is_traced() {
        let mut machine = Machine::new(&[4, 0, 3, 0, 99], []);
        let mut log = TraceLog::default();
        machine.run_until_blocked_traced(&mut log).unwrap();
        assert_eq!(log.lines.last().map(String::as_str), Some("0002: awaiting input"));
    }

    #[test]
    fn test_halt_is_not_traced_as_suspension() {
        let mut machine = Machine::new(&[1, 0, 0, 0, 99], []);
        let mut log = TraceLog::default();
        machine.run_until_blocked_traced(&mut log).unwrap();
        assert_eq!(log.lines.len(), 2);
        assert!(log.lines[1].starts_with("0004: HLT"));
    }
}
