use std::fmt;

use crate::error::Fault;
use crate::state::CpuState;
use crate::symbol::{half_name, Half, LabelTable, Register};

/// Syntactic form of a single operand token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Reg(Register),
    Half(Register, Half),
    /// `0x` prefixed literal
    Imm(i32),
    /// Label, or a decimal literal when no label of that name exists.
    /// Resolved at execution time since `DB` can bind labels mid-run.
    Name(String),
    /// `[...]` reference into data memory
    Mem(Box<Operand>),
}

impl Operand {
    pub fn parse(token: &str) -> Result<Operand, Fault> {
        if token.len() >= 2 && token.starts_with('[') && token.ends_with(']') {
            let inner = Operand::parse(token[1..token.len() - 1].trim())?;
            if inner.is_memory() {
                return Err(Fault::NestedMemory {
                    token: token.to_string(),
                });
            }
            return Ok(Operand::Mem(Box::new(inner)));
        }
        if let Some((reg, half)) = Register::parse_name(token) {
            return Ok(match half {
                None => Operand::Reg(reg),
                Some(half) => Operand::Half(reg, half),
            });
        }
        if let Some(hex) = token.strip_prefix("0x") {
            return is_hex_digits(hex)
                .then(|| i32::from_str_radix(hex, 16).ok())
                .flatten()
                .map(Operand::Imm)
                .ok_or_else(|| Fault::MalformedOperand {
                    token: token.to_string(),
                });
        }
        if token.is_empty() {
            return Err(Fault::MalformedOperand {
                token: token.to_string(),
            });
        }
        Ok(Operand::Name(token.to_string()))
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Mem(_))
    }
}

/// `from_str_radix` also takes a leading sign, so check the digits first.
pub(crate) fn is_hex_digits(digits: &str) -> bool {
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Half(reg, half) => write!(f, "{}", half_name(*reg, *half)),
            Operand::Imm(val) => write!(f, "{:#X}", val),
            Operand::Name(name) => write!(f, "{}", name),
            Operand::Mem(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// Reads and writes operands against CPU state and the label table.
pub struct Resolver<'a> {
    cpu: &'a mut CpuState,
    labels: &'a LabelTable,
}

impl<'a> Resolver<'a> {
    pub fn new(cpu: &'a mut CpuState, labels: &'a LabelTable) -> Self {
        Resolver { cpu, labels }
    }

    pub fn read(&self, operand: &Operand) -> Result<i32, Fault> {
        match operand {
            Operand::Reg(reg) => Ok(self.cpu.reg(*reg) as i32),
            Operand::Half(reg, half) => Ok(self.cpu.half(*reg, *half) as i32),
            Operand::Imm(val) => Ok(*val),
            Operand::Name(name) => self.resolve_name(name),
            Operand::Mem(inner) => {
                let address = self.address(inner)?;
                Ok(self.cpu.load(address)? as i32)
            }
        }
    }

    /// Registers take the low 16 bits, half-registers and memory the low 8.
    pub fn write(&mut self, operand: &Operand, val: i32) -> Result<(), Fault> {
        match operand {
            Operand::Reg(reg) => self.cpu.set_reg(*reg, val as u16),
            Operand::Half(reg, half) => self.cpu.set_half(*reg, *half, (val & 0xFF) as u8),
            Operand::Mem(inner) => {
                let address = self.address(inner)?;
                self.cpu.store(address, (val & 0xFF) as u8);
            }
            Operand::Imm(_) | Operand::Name(_) => {
                return Err(Fault::UnwritableOperand {
                    token: operand.to_string(),
                })
            }
        }
        Ok(())
    }

    fn address(&self, inner: &Operand) -> Result<usize, Fault> {
        let value = self.read(inner)?;
        usize::try_from(value).map_err(|_| Fault::NegativeAddress { value })
    }

    /// Label addresses win over decimal literals of the same spelling.
    fn resolve_name(&self, name: &str) -> Result<i32, Fault> {
        let malformed = || Fault::MalformedOperand {
            token: name.to_string(),
        };
        match self.labels.get(name) {
            Some(&address) => i32::try_from(address).map_err(|_| malformed()),
            None => name.parse::<i32>().map_err(|_| malformed()),
        }
    }
}
