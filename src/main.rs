//! Intcode VM - CLI Entry Point
//!
//! Commands:
//! - `intcode run <program>` - Run a program, optionally prompting for input
//! - `intcode pipe <program> --phases ..` - Chain copies of a program
//! - `intcode snapshot <program>` - Run until blocked and dump the state as JSON
//! - `intcode disasm <program>` - Disassemble a program
//! - `intcode fmt <program>` - Rewrite a program file in canonical form
//! - `intcode debug <program>` - Interactive debugger

use clap::{Parser, Subcommand};
use intcode::{Machine, MachineState, LogTracer, Tracer};
use intcode::machine::NullTracer;
use std::io::{BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "intcode")]
#[command(version = "0.1.0")]
#[command(about = "An Intcode virtual machine with suspend/resume on input")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts or needs input
    Run {
        /// Path to the program file
        program: String,
        /// Comma separated input values
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "100000000")]
        max_steps: u64,
        /// Log every executed instruction (to stderr)
        #[arg(short, long)]
        trace: bool,
        /// Prompt on stdin whenever the program needs input
        #[arg(long)]
        interactive: bool,
    },
    /// Chain one machine per phase value, output to input
    Pipe {
        /// Path to the program file
        program: String,
        /// Comma separated phase values, one machine each
        #[arg(short, long)]
        phases: String,
        /// First value fed into the chain
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        seed: i64,
        /// Feed the last machine's output back into the first until it halts
        #[arg(short, long)]
        feedback: bool,
    },
    /// Run until blocked and print the machine state as JSON
    Snapshot {
        /// Path to the program file
        program: String,
        /// Comma separated input values
        #[arg(short, long)]
        input: Option<String>,
        /// Maximum number of instructions to run
        #[arg(short, long, default_value = "100000000")]
        max_steps: u64,
    },
    /// Disassemble a program
    Disasm {
        /// Path to the program file
        program: String,
    },
    /// Rewrite a program file in canonical form
    Fmt {
        /// Path to the program file
        program: String,
        /// Write here instead of overwriting the input
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Interactive debugger
    Debug {
        /// Path to the program file
        program: String,
        /// Comma separated input values
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(trace);

    match cli.command {
        Commands::Run { program, input, max_steps, trace, interactive } => {
            run_program(&program, input.as_deref(), max_steps, trace, interactive);
        }
        Commands::Pipe { program, phases, seed, feedback } => {
            pipe_program(&program, &phases, seed, feedback);
        }
        Commands::Snapshot { program, input, max_steps } => {
            snapshot_program(&program, input.as_deref(), max_steps);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
        Commands::Fmt { program, output } => {
            format_file(&program, output.as_deref());
        }
        Commands::Debug { program, input } => {
            debug_program(&program, input.as_deref());
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG`; `--trace` defaults the crate to TRACE.
fn init_logging(trace: bool) {
    let default = if trace { "intcode=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_or_exit(path: &str) -> Vec<i64> {
    match intcode::load_program(path) {
        Ok(program) if program.is_empty() => {
            eprintln!("❌ {} contains no program", path);
            std::process::exit(1);
        }
        Ok(program) => {
            tracing::debug!(path, words = program.len(), "loaded program");
            program
        }
        Err(e) => {
            eprintln!("❌ Failed to load {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

fn parse_values_or_exit(text: Option<&str>) -> Vec<i64> {
    match intcode::parse_program(text.unwrap_or("")) {
        Ok(values) => values,
        Err(e) => {
            eprintln!("❌ Invalid value list: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_program(path: &str, input: Option<&str>, max_steps: u64, trace: bool, interactive: bool) {
    let program = load_or_exit(path);
    let mut machine = Machine::new(&program, parse_values_or_exit(input));

    let mut log_tracer = LogTracer;
    let mut null_tracer = NullTracer;
    let tracer: &mut dyn Tracer = if trace { &mut log_tracer } else { &mut null_tracer };

    let stdin = std::io::stdin();
    let mut remaining = max_steps;

    loop {
        let report = match machine.run_limited(remaining, tracer) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("❌ Machine error: {}", e);
                std::process::exit(1);
            }
        };
        remaining -= report.steps;
        for value in &report.outputs {
            println!("{}", value);
        }

        match report.state {
            MachineState::Halted => break,
            MachineState::AwaitingInput if interactive => {
                eprint!("input> ");
                let _ = std::io::stderr().flush();
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => {
                        eprintln!();
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("❌ Failed to read input: {}", e);
                        std::process::exit(1);
                    }
                }
                let values = match intcode::parse_program(&line) {
                    Ok(values) => values,
                    Err(e) => {
                        eprintln!("⚠️  {}", e);
                        continue;
                    }
                };
                if let Err(e) = machine.append_input(values) {
                    eprintln!("❌ {}", e);
                    std::process::exit(1);
                }
            }
            MachineState::AwaitingInput => {
                eprintln!("⏸  Awaiting input at pc {}. Use --input or --interactive.", machine.regs.pc);
                break;
            }
            MachineState::Runnable => {
                eprintln!("⚠️  Reached max steps limit ({}). Use --max-steps to increase.", max_steps);
                break;
            }
        }
    }

    eprintln!("State: {:?} after {} steps", machine.state(), machine.steps());
}

fn pipe_program(path: &str, phases: &str, seed: i64, feedback: bool) {
    let program = load_or_exit(path);
    let phases = parse_values_or_exit(Some(phases));
    if phases.is_empty() {
        eprintln!("❌ --phases needs at least one value");
        std::process::exit(1);
    }

    let mut machines: Vec<Machine> = phases
        .iter()
        .map(|&phase| Machine::new(&program, [phase]))
        .collect();
    let mut signal = vec![seed];
    let mut last = None;

    loop {
        let mut progress = 0;
        for (stage, machine) in machines.iter_mut().enumerate() {
            if !machine.is_halted() {
                if let Err(e) = machine.append_input(signal.drain(..)) {
                    eprintln!("❌ Stage {}: {}", stage, e);
                    std::process::exit(1);
                }
            }
            let report = match machine.run_until_blocked() {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("❌ Stage {}: {}", stage, e);
                    std::process::exit(1);
                }
            };
            tracing::debug!(stage, outputs = ?report.outputs, state = ?report.state, "stage blocked");
            progress += report.steps;
            signal = report.outputs;
        }
        if let Some(&value) = signal.last() {
            last = Some(value);
        }

        let finished = machines.last().map_or(true, Machine::is_halted);
        if !feedback || finished {
            break;
        }
        if progress == 0 {
            eprintln!("❌ Pipeline stalled: every machine is waiting for input");
            std::process::exit(1);
        }
    }

    match last {
        Some(value) => println!("{}", value),
        None => {
            eprintln!("⚠️  The last machine produced no output");
            std::process::exit(1);
        }
    }
}

fn snapshot_program(path: &str, input: Option<&str>, max_steps: u64) {
    let program = load_or_exit(path);
    let mut machine = Machine::new(&program, parse_values_or_exit(input));

    if let Err(e) = machine.run_limited(max_steps, &mut NullTracer) {
        eprintln!("❌ Machine error: {}", e);
        std::process::exit(1);
    }

    match serde_json::to_string_pretty(&machine.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("❌ Failed to serialize snapshot: {}", e);
            std::process::exit(1);
        }
    }
}

fn disassemble_file(path: &str) {
    let program = load_or_exit(path);
    print!("{}", intcode::disassemble(&program));
}

fn format_file(path: &str, output: Option<&str>) {
    let program = load_or_exit(path);
    let target = output.unwrap_or(path);

    if let Err(e) = intcode::save_program(target, &program) {
        eprintln!("❌ Failed to write {}: {}", target, e);
        std::process::exit(1);
    }
    eprintln!("✅ Wrote {} words to {}", program.len(), target);
}

#[cfg(feature = "tui")]
fn debug_program(path: &str, input: Option<&str>) {
    let program = load_or_exit(path);
    let input = parse_values_or_exit(input);

    if let Err(e) = intcode::run_debugger(program, input) {
        eprintln!("❌ Debugger error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str, _input: Option<&str>) {
    eprintln!("❌ This build has no debugger. Rebuild with --features tui.");
    std::process::exit(1);
}
