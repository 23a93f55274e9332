use std::fmt;
use std::str::FromStr;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

/// Label name -> address. Data and code addresses share one space.
pub type LabelTable = IndexMap<String, usize, FxBuildHasher>;

pub fn new_label_table() -> LabelTable {
    IndexMap::with_hasher(FxBuildHasher::default())
}

/// One of the four 16-bit general purpose registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Register {
    Ax,
    Bx,
    Cx,
    Dx,
}

/// Which byte of a register a half-register names.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Half {
    High,
    Low,
}

impl Register {
    pub const ALL: [Register; 4] = [Register::Ax, Register::Bx, Register::Cx, Register::Dx];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Letter shared by the full and half names, `A` for `AX`/`AH`/`AL`.
    fn letter(self) -> char {
        match self {
            Register::Ax => 'A',
            Register::Bx => 'B',
            Register::Cx => 'C',
            Register::Dx => 'D',
        }
    }

    fn from_letter(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'A' => Some(Register::Ax),
            'B' => Some(Register::Bx),
            'C' => Some(Register::Cx),
            'D' => Some(Register::Dx),
            _ => None,
        }
    }

    /// Parse `AX`..`DX` or `AH`..`DL`, case-insensitively.
    /// A `None` half means the full register.
    pub fn parse_name(name: &str) -> Option<(Register, Option<Half>)> {
        let mut chars = name.chars();
        let (Some(first), Some(second), None) = (chars.next(), chars.next(), chars.next()) else {
            return None;
        };
        let reg = Register::from_letter(first)?;
        let half = match second.to_ascii_uppercase() {
            'X' => None,
            'H' => Some(Half::High),
            'L' => Some(Half::Low),
            _ => return None,
        };
        Some((reg, half))
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}X", self.letter())
    }
}

impl FromStr for Register {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Register::parse_name(s) {
            Some((reg, None)) => Ok(reg),
            _ => Err(()),
        }
    }
}

/// Name of a half-register, e.g. `AH`.
pub fn half_name(reg: Register, half: Half) -> String {
    let suffix = match half {
        Half::High => 'H',
        Half::Low => 'L',
    };
    format!("{}{}", reg.letter(), suffix)
}
