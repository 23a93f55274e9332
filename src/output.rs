use std::fmt;
use std::path::Path;

use colored::Colorize;

use crate::state::CpuState;
use crate::symbol::{half_name, Half, Register};

pub const SEPARATOR_WIDTH: usize = 40;

/// Final register and flag values, as handed to the report step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub ax: u16,
    pub bx: u16,
    pub cx: u16,
    pub dx: u16,
    pub ip: usize,
    pub zero: bool,
    pub greater: bool,
    pub less: bool,
}

impl Snapshot {
    pub fn of(cpu: &CpuState) -> Self {
        let flags = cpu.flags();
        Snapshot {
            ax: cpu.reg(Register::Ax),
            bx: cpu.reg(Register::Bx),
            cx: cpu.reg(Register::Cx),
            dx: cpu.reg(Register::Dx),
            ip: cpu.ip(),
            zero: flags.zero(),
            greater: flags.greater(),
            less: flags.less(),
        }
    }

    fn regs(&self) -> [(Register, u16); 4] {
        [
            (Register::Ax, self.ax),
            (Register::Bx, self.bx),
            (Register::Cx, self.cx),
            (Register::Dx, self.dx),
        ]
    }
}

/// Register dump framed by separator lines.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", separator())?;
        for (reg, val) in self.regs() {
            writeln!(
                f,
                "{}: {:04X} ({}: {:02X}, {}: {:02X})",
                reg,
                val,
                half_name(reg, Half::High),
                val >> 8,
                half_name(reg, Half::Low),
                val & 0xFF,
            )?;
        }
        writeln!(f, "IP: {:04X}", self.ip)?;
        writeln!(f, "ZeroFlag: {}", bool_word(self.zero))?;
        writeln!(f, "GreaterFlag: {}", bool_word(self.greater))?;
        writeln!(f, "LessFlag: {}", bool_word(self.less))?;
        write!(f, "{}", separator())
    }
}

pub fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

fn bool_word(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

// Status lines for the command line shell

pub enum MsgColor {
    Green,
    Cyan,
    Red,
}

pub fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

pub fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}
