use std::collections::HashMap;
use std::fmt;

use fxhash::FxBuildHasher;
use log::debug;

use crate::error::{Fault, Warning};
use crate::io::{self, Io};
use crate::state::CpuState;
use crate::symbol::{Half, Register};

pub const VIDEO: u32 = 0x10;
pub const KEYBOARD: u32 = 0x16;

/// `AH` selector for teletype output under [`VIDEO`].
pub const TELETYPE: u8 = 0x0E;

/// Simulated service routine, selected by interrupt number.
pub trait InterruptHandler {
    fn handle(&mut self, cpu: &mut CpuState, io: &mut dyn Io) -> Result<(), Fault>;
}

impl<F> InterruptHandler for F
where
    F: FnMut(&mut CpuState, &mut dyn Io) -> Result<(), Fault>,
{
    fn handle(&mut self, cpu: &mut CpuState, io: &mut dyn Io) -> Result<(), Fault> {
        self(cpu, io)
    }
}

/// Interrupt vector table.
pub struct InterruptTable {
    handlers: HashMap<u32, Box<dyn InterruptHandler>, FxBuildHasher>,
}

impl InterruptTable {
    /// Table with no handlers at all.
    pub fn empty() -> Self {
        InterruptTable {
            handlers: HashMap::with_hasher(FxBuildHasher::default()),
        }
    }

    /// Install `handler` for `number`, returning any handler it replaces.
    pub fn register(
        &mut self,
        number: u32,
        handler: impl InterruptHandler + 'static,
    ) -> Option<Box<dyn InterruptHandler>> {
        debug!("registered handler for INT {number:#04X}");
        self.handlers.insert(number, Box::new(handler))
    }

    pub fn is_registered(&self, number: u32) -> bool {
        self.handlers.contains_key(&number)
    }

    /// Run the handler for `number`. Unregistered numbers are reported, not fatal.
    pub fn dispatch(
        &mut self,
        number: u32,
        cpu: &mut CpuState,
        io: &mut dyn Io,
    ) -> Result<(), Fault> {
        match self.handlers.get_mut(&number) {
            Some(handler) => handler.handle(cpu, io),
            None => {
                io::report(io, &Warning::UnknownInterrupt { number });
                Ok(())
            }
        }
    }
}

impl Default for InterruptTable {
    fn default() -> Self {
        let mut table = InterruptTable::empty();
        table.register(VIDEO, Teletype);
        table.register(KEYBOARD, Keyboard);
        table
    }
}

impl fmt::Debug for InterruptTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut numbers: Vec<_> = self.handlers.keys().collect();
        numbers.sort();
        f.debug_struct("InterruptTable")
            .field("registered", &numbers)
            .finish()
    }
}

/// INT 0x10: video services. Only teletype output is implemented.
#[derive(Debug, Default, Clone, Copy)]
pub struct Teletype;

impl InterruptHandler for Teletype {
    fn handle(&mut self, cpu: &mut CpuState, io: &mut dyn Io) -> Result<(), Fault> {
        match cpu.half(Register::Ax, Half::High) {
            TELETYPE => io.put_char(cpu.half(Register::Ax, Half::Low) as char),
            function => io::report(io, &Warning::UnhandledFunction {
                interrupt: VIDEO,
                function,
            }),
        }
        Ok(())
    }
}

/// INT 0x16: wait for a key and place its code in `AL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keyboard;

impl InterruptHandler for Keyboard {
    fn handle(&mut self, cpu: &mut CpuState, io: &mut dyn Io) -> Result<(), Fault> {
        let ch = io.get_char()?;
        cpu.set_half(Register::Ax, Half::Low, (ch as u32 & 0xFF) as u8);
        Ok(())
    }
}
