use std::fs;
use std::io::{stdin, BufRead};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use asmplay::io::Terminal;
use asmplay::output::{file_message, message, MsgColor};
use asmplay::{is_sentinel, Engine, Instruction, Program, RunError};

/// asmplay is a playground for a small subset of x86 assembly.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run. Reads the program from stdin otherwise
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `.asm` file and dump the registers afterwards
    Run {
        /// `.asm` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Do not echo keys read by `INT 0x16`
        #[arg(long)]
        no_echo: bool,
    },
    /// Decode every line of a `.asm` file without running it
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Print the labels defined by a `.asm` file
    Labels {
        /// File to inspect
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    asmplay::env::init();
    env_logger::init();

    let echo = asmplay::env::is_echo_enabled();
    match args.command {
        Some(Command::Run {
            name,
            minimal,
            no_echo,
        }) => {
            let program = load(&name, minimal)?;
            execute(program, minimal, echo && !no_echo)
        }
        Some(Command::Check { name }) => {
            let program = load(&name, false)?;
            check(&program)?;
            message(MsgColor::Green, "Success", "no errors found!");
            Ok(())
        }
        Some(Command::Labels { name }) => {
            let program = load(&name, true)?;
            for (label, addr) in program.labels() {
                println!("{addr:04X} {label}");
            }
            Ok(())
        }
        None => match args.path {
            Some(path) => {
                let program = load(&path, false)?;
                execute(program, false, echo)
            }
            None => {
                println!("Enter assembly instructions (type 'RUN' to execute):");
                let program = read_interactive()?;
                execute(program, false, echo)
            }
        },
    }
}

fn load(name: &Path, minimal: bool) -> Result<Program> {
    if !minimal {
        file_message(MsgColor::Green, "Loading", name);
    }
    let src = fs::read_to_string(name).into_diagnostic()?;
    Ok(Program::from_source(&src))
}

/// Collect lines from stdin until `RUN` or end of input.
fn read_interactive() -> Result<Program> {
    let mut lines = Vec::new();
    for line in stdin().lock().lines() {
        let line = line.into_diagnostic()?;
        if is_sentinel(&line) {
            break;
        }
        lines.push(line);
    }
    Ok(Program::load(lines))
}

fn execute(program: Program, minimal: bool, echo: bool) -> Result<()> {
    if !minimal {
        let count = format!("{} instruction(s)", program.len());
        message(MsgColor::Green, "Running", &count);
    }
    let mut engine = Engine::new(program, Terminal::new(echo));
    let result = engine.run();
    engine.io_mut().start_new_line();
    if let Err(err) = result {
        if !minimal {
            let at = format!("fault at {:#06X}", err.ip);
            message(MsgColor::Red, "Aborted", &at);
        }
        return Err(err.into());
    }
    println!("{}", engine.snapshot());
    if !minimal {
        message(MsgColor::Cyan, "Halted", "instruction pointer left the program");
    }
    Ok(())
}

/// Decode faults only. Operands naming labels are resolved at run time.
fn check(program: &Program) -> Result<(), RunError> {
    for (ip, text) in program.instructions().enumerate() {
        Instruction::decode(text).map_err(|fault| RunError {
            ip,
            instruction: text.to_string(),
            fault,
        })?;
    }
    Ok(())
}
