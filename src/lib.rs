// Loading
mod loader;
pub use loader::{is_sentinel, Program, RUN_SENTINEL};
mod instr;
pub use instr::{tokenize, Condition, Instruction};
mod operand;
pub use operand::{Operand, Resolver};
mod symbol;
pub use symbol::{Half, LabelTable, Register};

// Running
mod runtime;
pub use runtime::{Engine, Status};
mod state;
pub use state::CpuState;
mod flags;
pub use flags::Flags;
pub mod interrupt;
pub use interrupt::{InterruptHandler, InterruptTable};
pub mod io;
pub mod output;
pub use output::Snapshot;

mod error;
pub use error::{Fault, RunError, Warning};

pub mod env;

