use log::{debug, trace};

use crate::error::{Fault, RunError, Warning};
use crate::instr::{Condition, Instruction};
use crate::interrupt::InterruptTable;
use crate::io::{self, Io};
use crate::loader::Program;
use crate::operand::{Operand, Resolver};
use crate::output::Snapshot;
use crate::state::CpuState;
use crate::symbol::LabelTable;

/// Outcome of a single [`Engine::step`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    /// IP points past the instruction table
    Halted,
}

/// Fetch/decode/execute engine for one program run.
#[derive(Debug)]
pub struct Engine<I: Io> {
    program: Program,
    /// Starts as the loader's table, `DB` adds to it
    labels: LabelTable,
    cpu: CpuState,
    interrupts: InterruptTable,
    io: I,
}

impl<I: Io> Engine<I> {
    pub fn new(program: Program, io: I) -> Self {
        Self::with_interrupts(program, io, InterruptTable::default())
    }

    pub fn with_interrupts(program: Program, io: I, interrupts: InterruptTable) -> Self {
        Engine {
            labels: program.labels().clone(),
            program,
            cpu: CpuState::new(),
            interrupts,
            io,
        }
    }

    /// Run until the instruction pointer leaves the table or a fault aborts.
    pub fn run(&mut self) -> Result<(), RunError> {
        while self.step()? == Status::Running {}
        Ok(())
    }

    /// Execute the instruction at IP, if there is one.
    pub fn step(&mut self) -> Result<Status, RunError> {
        let ip = self.cpu.ip();
        let Some(text) = self.program.get(ip).map(str::to_string) else {
            return Ok(Status::Halted);
        };
        trace!("{ip:#06X}: {text}");
        let fault = |fault| RunError {
            ip,
            instruction: text.clone(),
            fault,
        };
        let instr = Instruction::decode(&text).map_err(fault)?;
        // PC incremented before instruction is performed
        self.cpu.set_ip(ip + 1);
        self.execute(ip, instr).map_err(fault)?;
        Ok(Status::Running)
    }

    /// `ip` is the address the instruction was fetched from.
    fn execute(&mut self, ip: usize, instr: Instruction) -> Result<(), Fault> {
        match instr {
            Instruction::Nop => {}
            Instruction::Mov { dest, src } => {
                let val = self.resolver().read(&src)?;
                self.resolver().write(&dest, val)?;
            }
            Instruction::Add { dest, src } => self.apply(&dest, &src, i32::wrapping_add)?,
            Instruction::Sub { dest, src } => self.apply(&dest, &src, i32::wrapping_sub)?,
            Instruction::Inc(dest) => self.apply(&dest, &Operand::Imm(1), i32::wrapping_add)?,
            Instruction::Dec(dest) => self.apply(&dest, &Operand::Imm(1), i32::wrapping_sub)?,
            Instruction::Cmp { lhs, rhs } => {
                let resolver = self.resolver();
                let (lhs, rhs) = (resolver.read(&lhs)?, resolver.read(&rhs)?);
                self.cpu.flags_mut().compare(lhs, rhs);
            }
            Instruction::Jump { cond, target } => self.jump(cond, &target),
            Instruction::Int(number) => {
                self.interrupts
                    .dispatch(number, &mut self.cpu, &mut self.io)?;
            }
            Instruction::Db { label, text } => self.define_string(ip, label, &text),
            Instruction::Unknown(instruction) => {
                self.report(Warning::UnknownInstruction { instruction });
            }
        }
        Ok(())
    }

    fn resolver(&mut self) -> Resolver<'_> {
        Resolver::new(&mut self.cpu, &self.labels)
    }

    /// `dest := op(dest, src)`
    fn apply(
        &mut self,
        dest: &Operand,
        src: &Operand,
        op: fn(i32, i32) -> i32,
    ) -> Result<(), Fault> {
        let mut resolver = self.resolver();
        let val = op(resolver.read(dest)?, resolver.read(src)?);
        resolver.write(dest, val)
    }

    fn jump(&mut self, cond: Condition, target: &str) {
        if !cond.holds(self.cpu.flags()) {
            return;
        }
        match self.labels.get(target) {
            Some(&addr) => self.cpu.set_ip(addr),
            None => self.report(Warning::UnknownLabel {
                label: target.to_string(),
            }),
        }
    }

    fn define_string(&mut self, addr: usize, label: String, text: &str) {
        debug!("DB `{label}` at {addr:#06X}, {} byte(s)", text.chars().count() + 1);
        let mut len = 0;
        for (offset, ch) in text.chars().enumerate() {
            self.cpu.store(addr + offset, (ch as u32 & 0xFF) as u8);
            len = offset + 1;
        }
        self.cpu.store(addr + len, 0);
        self.labels.insert(label, addr);
    }

    fn report(&mut self, warning: Warning) {
        io::report(&mut self.io, &warning);
    }

    pub fn cpu(&self) -> &CpuState {
        &self.cpu
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn interrupts_mut(&mut self) -> &mut InterruptTable {
        &mut self.interrupts
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(&self.cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Buffered;
    use crate::symbol::{Half, Register};

    fn engine(lines: &[&str]) -> Engine<Buffered> {
        Engine::new(Program::load(lines), Buffered::new())
    }

    fn run(lines: &[&str]) -> Engine<Buffered> {
        let mut engine = engine(lines);
        engine.run().unwrap();
        engine
    }

    #[test]
    fn moves_between_registers_and_halves() {
        let engine = run(&["MOV AX, 0x10", "MOV BX, AX", "MOV CH, 0x05", "MOV CL, 0x02"]);
        let cpu = engine.cpu();
        assert_eq!(cpu.reg(Register::Ax), 16);
        assert_eq!(cpu.reg(Register::Bx), 16);
        assert_eq!(cpu.reg(Register::Cx), 0x0502);

        let engine = run(&["MOV AH, 0x05", "MOV AL, 0x02", "MOV AL, 0xFF"]);
        assert_eq!(engine.cpu().half(Register::Ax, Half::High), 0x05);
        assert_eq!(engine.cpu().reg(Register::Ax), 0x05FF);
    }

    #[test]
    fn arithmetic_wraps_and_leaves_flags() {
        let engine = run(&[
            "MOV AX, 5",
            "CMP AX, 5",
            "ADD AX, 3",
            "SUB BX, 1",
            "INC CX",
            "DEC DX",
            "DEC DX",
        ]);
        let cpu = engine.cpu();
        assert_eq!(cpu.reg(Register::Ax), 8);
        assert_eq!(cpu.reg(Register::Bx), 0xFFFF);
        assert_eq!(cpu.reg(Register::Cx), 1);
        assert_eq!(cpu.reg(Register::Dx), 0xFFFE);
        assert!(cpu.flags().zero());
        assert!(!cpu.flags().greater());
        assert!(!cpu.flags().less());
    }

    #[test]
    fn half_register_arithmetic_stays_in_its_byte() {
        let engine = run(&["MOV AX, 0x12FF", "INC AL", "DEC AH"]);
        assert_eq!(engine.cpu().reg(Register::Ax), 0x1100);
    }

    #[test]
    fn jump_lands_on_labelled_instruction() {
        let engine = run(&["JMP skip", "MOV AX, 1", "skip: MOV BX, 2"]);
        assert_eq!(engine.cpu().reg(Register::Ax), 0);
        assert_eq!(engine.cpu().reg(Register::Bx), 2);
    }

    #[test]
    fn conditional_jumps_follow_last_compare() {
        let cases = [
            ("JE", 3, 3, true),
            ("JE", 3, 4, false),
            ("JNE", 3, 4, true),
            ("JNE", 4, 4, false),
            ("JG", 5, 3, true),
            ("JG", 3, 5, false),
            ("JL", 3, 5, true),
            ("JL", 5, 5, false),
        ];
        for (op, lhs, rhs, taken) in cases {
            let cmp = format!("CMP {lhs}, {rhs}");
            let jump = format!("{op} target");
            let mut engine = engine(&[cmp.as_str(), jump.as_str(), "MOV AX, 1", "target: MOV BX, 1"]);
            engine.step().unwrap();
            engine.step().unwrap();
            let expected_ip = if taken { 3 } else { 2 };
            assert_eq!(engine.cpu().ip(), expected_ip, "{cmp} / {jump}");
        }
    }

    #[test]
    fn unknown_label_falls_through() {
        let engine = run(&["JMP nowhere", "MOV AX, 1"]);
        assert_eq!(engine.cpu().reg(Register::Ax), 1);
        assert_eq!(
            engine.io().warnings(),
            &[Warning::UnknownLabel {
                label: "nowhere".into()
            }]
        );
    }

    #[test]
    fn unknown_instruction_is_skipped() {
        let engine = run(&["PUSH AX", "MOV CX, 7"]);
        assert_eq!(engine.cpu().reg(Register::Cx), 7);
        assert_eq!(
            engine.io().warnings(),
            &[Warning::UnknownInstruction {
                instruction: "PUSH AX".into()
            }]
        );
    }

    #[test]
    fn db_writes_null_terminated_string() {
        let engine = run(&["MOV AX, 1", "DB greet \"Hi\"", "MOV BX, greet"]);
        let base = *engine.labels().get("greet").unwrap();
        assert_eq!(base, 1);
        let cpu = engine.cpu();
        assert_eq!(cpu.peek(base), Some(b'H'));
        assert_eq!(cpu.peek(base + 1), Some(b'i'));
        assert_eq!(cpu.peek(base + 2), Some(0));
        assert_eq!(cpu.reg(Register::Bx), 1);
    }

    #[test]
    fn memory_round_trips_through_registers() {
        let engine = run(&[
            "MOV BX, 0x20",
            "MOV [BX], 0x141",
            "MOV CL, [BX]",
            "ADD [BX], 1",
            "MOV DX, [0x20]",
        ]);
        let cpu = engine.cpu();
        assert_eq!(cpu.reg(Register::Cx), 0x41);
        assert_eq!(cpu.reg(Register::Dx), 0x42);
    }

    #[test]
    fn unmapped_memory_read_aborts() {
        let mut engine = engine(&["MOV AX, 1", "MOV AX, [0x99]", "MOV BX, 1"]);
        let err = engine.run().unwrap_err();
        assert_eq!(err.ip, 1);
        assert_eq!(err.fault, Fault::UnmappedMemory { address: 0x99 });
        assert_eq!(engine.cpu().reg(Register::Bx), 0);
    }

    #[test]
    fn malformed_operand_aborts() {
        let mut engine = engine(&["MOV AX, banana"]);
        let err = engine.run().unwrap_err();
        assert_eq!(
            err.fault,
            Fault::MalformedOperand {
                token: "banana".into()
            }
        );
        assert_eq!(err.instruction, "MOV AX, banana");
    }

    #[test]
    fn teletype_output_reaches_io() {
        let engine = run(&["MOV AH, 0x0E", "MOV AL, 0x48", "INT 0x10", "MOV AL, 0x69", "INT 10"]);
        assert_eq!(engine.io().output(), "Hi");
    }

    #[test]
    fn keyboard_input_lands_in_al() {
        let mut engine = Engine::new(
            Program::load(["MOV AH, 0x77", "INT 0x16"]),
            Buffered::with_input("k"),
        );
        engine.run().unwrap();
        assert_eq!(engine.cpu().reg(Register::Ax), 0x7700 | b'k' as u16);
    }

    mod capture {
        use std::cell::RefCell;
        use std::sync::Once;

        use log::{Level, Log, Metadata, Record};

        thread_local! {
            static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
        }

        /// Collects `warn!` records per test thread.
        struct Capture;

        impl Log for Capture {
            fn enabled(&self, metadata: &Metadata) -> bool {
                metadata.level() <= Level::Warn
            }

            fn log(&self, record: &Record) {
                if record.level() == Level::Warn {
                    WARNINGS.with_borrow_mut(|logged| logged.push(record.args().to_string()));
                }
            }

            fn flush(&self) {}
        }

        static CAPTURE: Capture = Capture;
        static INSTALL: Once = Once::new();

        pub fn start() {
            INSTALL.call_once(|| {
                log::set_logger(&CAPTURE).expect("no other logger in unit tests");
                log::set_max_level(log::LevelFilter::Warn);
            });
            WARNINGS.with_borrow_mut(Vec::clear);
        }

        pub fn logged() -> Vec<String> {
            WARNINGS.with_borrow(Vec::clone)
        }
    }

    #[test]
    fn every_warning_is_logged() {
        capture::start();
        let engine = run(&["FOO", "INT 0x21", "MOV AH, 1", "INT 0x10", "JMP nowhere"]);
        let reported: Vec<String> = engine
            .io()
            .warnings()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(reported.len(), 4);
        assert_eq!(capture::logged(), reported);
    }

    #[test]
    fn step_halts_past_end() {
        let mut engine = engine(&["INC AX"]);
        assert_eq!(engine.step(), Ok(Status::Running));
        assert_eq!(engine.step(), Ok(Status::Halted));
        assert_eq!(engine.step(), Ok(Status::Halted));
        assert_eq!(engine.cpu().ip(), 1);
    }

    #[test]
    fn empty_program_halts_immediately() {
        let mut engine = engine(&[]);
        assert_eq!(engine.step(), Ok(Status::Halted));
    }
}
