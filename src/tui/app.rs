//! Debugger application state and logic.

use crate::machine::{Machine, MachineState, TraceLog};
use crate::program::parse_program;
use crate::program::disasm::disassemble_at;
use std::collections::HashSet;

/// Trace lines kept for the status history.
const TRACE_HISTORY: usize = 200;

/// Widest instruction, in cells.
const MAX_WIDTH: usize = 4;

/// Words shown per memory row.
pub const WORDS_PER_ROW: usize = 8;

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub machine: Machine,
    /// Program as loaded, for reset.
    pub program: Vec<i64>,
    /// Input queued at start-up (re-queued on reset).
    pub initial_input: Vec<i64>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
    /// Typing input for the machine?
    pub input_mode: bool,
    /// Text typed at the input prompt.
    pub input_buffer: String,
    /// Recent trace lines.
    pub trace: TraceLog,
    /// Breakpoint to ignore once when resuming from it.
    resume_from: Option<usize>,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<i64>, initial_input: Vec<i64>) -> Self {
        let machine = Machine::new(&program, initial_input.iter().copied());

        Self {
            machine,
            program,
            initial_input,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step, 'r' to run, 'i' to enter input, 'q' to quit.".into(),
            mem_scroll: 0,
            input_mode: false,
            input_buffer: String::new(),
            trace: TraceLog::default(),
            resume_from: None,
        }
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        match self.machine.state() {
            MachineState::Runnable => {}
            MachineState::AwaitingInput => {
                self.status = "Awaiting input. Press 'i' to enter values.".into();
                self.running = false;
                return;
            }
            MachineState::Halted => {
                self.status = format!("Halted after {} steps", self.machine.steps());
                self.running = false;
                return;
            }
        }

        let pc = self.machine.regs.pc;
        let (disasm, _) = disassemble_at(&self.machine.mem, pc);
        match self.machine.step_traced(&mut self.trace) {
            Ok(output) => {
                self.status = match output {
                    Some(value) => format!("PC={:04}: {}  => output {}", pc, disasm, value),
                    None => format!("PC={:04}: {}", pc, disasm),
                };
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
            }
        }

        if self.trace.lines.len() > TRACE_HISTORY {
            let excess = self.trace.lines.len() - TRACE_HISTORY;
            self.trace.lines.drain(..excess);
        }
    }

    /// Run until halt, input, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.resume_from = Some(self.machine.regs.pc);
        self.status = "Running...".into();
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        let pc = self.machine.regs.pc;
        if self.breakpoints.contains(&pc) && self.resume_from != Some(pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", pc);
            return;
        }
        self.resume_from = None;

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.machine.regs.pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reset machine to initial state.
    pub fn reset(&mut self) {
        self.machine = Machine::new(&self.program, self.initial_input.iter().copied());
        self.running = false;
        self.trace.lines.clear();
        self.status = "Reset. Ready.".into();
    }

    /// Open the input prompt.
    pub fn begin_input(&mut self) {
        self.running = false;
        self.input_mode = true;
        self.input_buffer.clear();
    }

    /// Queue the values typed at the prompt.
    pub fn submit_input(&mut self) {
        self.input_mode = false;
        let values = match parse_program(&self.input_buffer) {
            Ok(values) => values,
            Err(e) => {
                self.status = format!("Bad input: {}", e);
                return;
            }
        };
        let count = values.len();
        self.status = match self.machine.append_input(values) {
            Ok(()) => format!("Queued {} value(s)", count),
            Err(e) => format!("Error: {}", e),
        };
        self.input_buffer.clear();
    }

    /// Close the input prompt without queueing anything.
    pub fn cancel_input(&mut self) {
        self.input_mode = false;
        self.input_buffer.clear();
        self.status = "Input cancelled.".into();
    }

    /// Get disassembly around current PC.
    ///
    /// Instruction boundaries come from a linear sweep that starts a few
    /// instructions' worth of cells before the PC, restarted at the PC so
    /// it is always on a boundary.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let mem = &self.machine.mem;
        let pc = self.machine.regs.pc;

        let mut before = Vec::new();
        let mut addr = pc.saturating_sub(lines * MAX_WIDTH);
        while addr < pc {
            let (text, width) = disassemble_at(mem, addr);
            before.push((addr, text, false));
            addr += width;
        }
        let keep = lines / 2;
        let skip = before.len().saturating_sub(keep);
        let mut listing: Vec<_> = before.into_iter().skip(skip).collect();

        let mut addr = pc;
        while listing.len() < lines {
            let (text, width) = disassemble_at(mem, addr);
            listing.push((addr, text, addr == pc));
            addr += width;
        }

        listing
    }

    /// The instruction most recently executed, as disassembly.
    pub fn last_executed(&self) -> String {
        self.machine
            .last_instruction()
            .map(|instr| instr.to_string())
            .unwrap_or_else(|| "-".into())
    }

    /// Memory rows starting at the scroll offset.
    pub fn memory_rows(&self, rows: usize) -> Vec<(usize, Vec<i64>)> {
        (self.mem_scroll..self.mem_scroll + rows)
            .map(|row| {
                let start = row * WORDS_PER_ROW;
                (start, self.machine.mem.dump(start, WORDS_PER_ROW))
            })
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<i64>, initial_input: Vec<i64>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program, initial_input);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.input_mode {
                        match key.code {
                            KeyCode::Enter => app.submit_input(),
                            KeyCode::Esc => app.cancel_input(),
                            KeyCode::Backspace => {
                                app.input_buffer.pop();
                            }
                            KeyCode::Char(c) => app.input_buffer.push(c),
                            _ => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => app.should_quit = true,
                            KeyCode::Char('s') => {
                                app.running = false;
                                app.step();
                            }
                            KeyCode::Char('r') => app.run(),
                            KeyCode::Char('p') => {
                                app.running = false;
                                app.status = "Paused.".into();
                            }
                            KeyCode::Char('b') => app.toggle_breakpoint(),
                            KeyCode::Char('x') => app.reset(),
                            KeyCode::Char('i') => app.begin_input(),
                            KeyCode::Up => {
                                app.mem_scroll = app.mem_scroll.saturating_sub(1);
                            }
                            KeyCode::Down => {
                                app.mem_scroll += 1;
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        // Tick for continuous running
        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_halt() {
        let mut app = DebuggerApp::new(vec![1, 0, 0, 0, 99], vec![]);
        assert_eq!(app.last_executed(), "-");
        app.step();
        assert!(app.status.contains("ADD"));
        assert_eq!(app.last_executed(), "ADD [0] [0] [0]");
        app.step();
        app.step();
        assert!(app.status.starts_with("Halted"));
        assert_eq!(app.trace.lines.len(), 2);
    }

    #[test]
    fn test_input_prompt_resumes_machine() {
        let mut app = DebuggerApp::new(vec![3, 0, 4, 0, 99], vec![]);
        app.step();
        assert!(app.status.starts_with("Awaiting input"));

        app.begin_input();
        app.input_buffer.push_str("7");
        app.submit_input();
        assert_eq!(app.machine.state(), MachineState::Runnable);

        app.run();
        while app.running {
            app.tick();
        }
        assert_eq!(app.machine.outputs(), &[7]);
    }

    #[test]
    fn test_breakpoint_stops_run() {
        let mut app = DebuggerApp::new(vec![1101, 1, 1, 9, 104, 5, 99], vec![]);
        app.step();
        app.toggle_breakpoint();
        assert!(app.breakpoints.contains(&4));
        app.reset();

        app.run();
        while app.running {
            app.tick();
        }
        assert_eq!(app.machine.regs.pc, 4);
        assert!(app.status.starts_with("Breakpoint"));

        // Resuming steps past the breakpoint.
        app.run();
        while app.running {
            app.tick();
        }
        assert!(app.machine.is_halted());
    }

    #[test]
    fn test_disassembly_window() {
        let app = DebuggerApp::new(vec![1101, 1, 1, 9, 104, 5, 99], vec![]);
        let listing = app.get_disassembly(3);
        assert_eq!(listing.len(), 3);
        assert_eq!(listing[0].0, 0);
        assert!(listing[0].2);
        assert_eq!(listing[1].1, "OUT 5");
        assert_eq!(listing[2].1, "HLT");
    }

    #[test]
    fn test_disassembly_after_far_jump() {
        let mut app = DebuggerApp::new(vec![1105, 1, 20_000_000], vec![]);
        app.step();
        assert_eq!(app.machine.regs.pc, 20_000_000);

        let listing = app.get_disassembly(20);
        assert_eq!(listing.len(), 20);
        assert_eq!(listing[10], (20_000_000, "DATA 0".to_string(), true));
        assert!(listing[0].0 >= 20_000_000 - 20 * MAX_WIDTH);
    }
}
