use std::collections::HashMap;

use fxhash::FxBuildHasher;

use crate::error::Fault;
use crate::flags::Flags;
use crate::symbol::{Half, Register};

/// Sparse, byte addressed data memory. Only written addresses exist.
type DataMemory = HashMap<usize, u8, FxBuildHasher>;

/// Represents complete CPU state during a run.
#[derive(Clone, Debug, Default)]
pub struct CpuState {
    /// AX, BX, CX, DX
    reg: [u16; 4],
    /// Index of the next instruction table entry
    ip: usize,
    flags: Flags,
    mem: DataMemory,
}

impl CpuState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reg(&self, reg: Register) -> u16 {
        self.reg[reg.index()]
    }

    pub fn set_reg(&mut self, reg: Register, val: u16) {
        self.reg[reg.index()] = val;
    }

    pub fn half(&self, reg: Register, half: Half) -> u8 {
        let val = self.reg(reg);
        match half {
            Half::High => (val >> 8) as u8,
            Half::Low => (val & 0xFF) as u8,
        }
    }

    /// Replace one byte of `reg`, leaving the other byte untouched.
    pub fn set_half(&mut self, reg: Register, half: Half, val: u8) {
        let old = self.reg(reg);
        let new = match half {
            Half::High => (old & 0x00FF) | ((val as u16) << 8),
            Half::Low => (old & 0xFF00) | val as u16,
        };
        self.set_reg(reg, new);
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn set_ip(&mut self, ip: usize) {
        self.ip = ip;
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Read a byte that was previously written. Absent addresses fault.
    pub fn load(&self, address: usize) -> Result<u8, Fault> {
        self.mem
            .get(&address)
            .copied()
            .ok_or(Fault::UnmappedMemory { address })
    }

    pub fn store(&mut self, address: usize, val: u8) {
        self.mem.insert(address, val);
    }

    /// Byte at `address`, if it was ever written.
    pub fn peek(&self, address: usize) -> Option<u8> {
        self.mem.get(&address).copied()
    }
}
