use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

// Fatal faults

/// Raised while decoding or executing an instruction. Aborts the run.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum Fault {
    #[error("Malformed operand `{token}`")]
    #[diagnostic(
        code(operand::malformed),
        help("operands are registers, `0x` hex literals, decimal literals, labels or `[...]` memory references")
    )]
    MalformedOperand { token: String },

    #[error("Cannot write to operand `{token}`")]
    #[diagnostic(
        code(operand::unwritable),
        help("only registers, half-registers and memory references can be written to")
    )]
    UnwritableOperand { token: String },

    #[error("Read from unmapped memory address {address:#06X}")]
    #[diagnostic(
        code(memory::unmapped),
        help("memory is only readable after a `MOV [...]` or `DB` has written to it")
    )]
    UnmappedMemory { address: usize },

    #[error("Memory address {value} is negative")]
    #[diagnostic(code(memory::negative))]
    NegativeAddress { value: i32 },

    #[error("Memory reference `{token}` is nested")]
    #[diagnostic(
        code(operand::nested),
        help("a memory reference must contain a register, literal or label")
    )]
    NestedMemory { token: String },

    #[error("Both operands of `{opcode}` refer to memory")]
    #[diagnostic(
        code(operand::memory_pair),
        help("move the value through a register first")
    )]
    MemoryToMemory { opcode: &'static str },

    #[error("`{opcode}` expects {expected} operand(s), found {found}")]
    #[diagnostic(code(operand::missing))]
    MissingOperand {
        opcode: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Malformed interrupt number `{token}`")]
    #[diagnostic(
        code(interrupt::malformed),
        help("interrupt numbers are hexadecimal, like `0x10` or `16`")
    )]
    MalformedInterrupt { token: String },

    #[error("`DB {label}` is missing a string literal")]
    #[diagnostic(code(db::string), help("define strings like `DB msg \"Hello\"`"))]
    MalformedString { label: String },

    #[error("Input closed while waiting for a key")]
    #[diagnostic(code(io::input))]
    InputClosed,
}

/// A fault together with where it happened.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
#[error("Execution aborted at {ip:#06X}: `{instruction}`")]
#[diagnostic(code(runtime::fault))]
pub struct RunError {
    pub ip: usize,
    pub instruction: String,
    #[source]
    #[diagnostic_source]
    pub fault: Fault,
}

// Non-fatal conditions

/// Reported through [`crate::io::Io::report`], execution carries on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    UnknownInstruction { instruction: String },
    UnknownInterrupt { number: u32 },
    UnhandledFunction { interrupt: u32, function: u8 },
    UnknownLabel { label: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownInstruction { instruction } => {
                write!(f, "Unknown instruction: {}", instruction)
            }
            Self::UnknownInterrupt { number } => write!(f, "Unknown interrupt: {:#04X}", number),
            Self::UnhandledFunction {
                interrupt,
                function,
            } => write!(
                f,
                "Unhandled INT {:#04X} function: AH={:02X}",
                interrupt, function
            ),
            Self::UnknownLabel { label } => write!(f, "Unknown label: {}", label),
        }
    }
}
