use log::debug;

use crate::symbol::{new_label_table, LabelTable};

/// Line that ends program input.
pub const RUN_SENTINEL: &str = "RUN";

/// Loaded program: instruction table plus label table.
///
/// Addresses are line positions in the source, so label-only and blank
/// lines keep their slot as empty instructions.
#[derive(Clone, Debug, Default)]
pub struct Program {
    instructions: Vec<String>,
    labels: LabelTable,
}

impl Program {
    /// Load every line, with no sentinel handling.
    pub fn load<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut program = Program {
            instructions: Vec::new(),
            labels: new_label_table(),
        };
        for (addr, line) in lines.into_iter().enumerate() {
            let line = strip_comment(line.as_ref());
            let instr = match line.split_once(':') {
                Some((label, rest)) => {
                    let label = label.trim();
                    debug!("label `{label}` bound to {addr:#06X}");
                    // Redefinitions silently win
                    program.labels.insert(label.to_string(), addr);
                    rest.trim()
                }
                None => line,
            };
            program.instructions.push(instr.to_string());
        }
        program
    }

    /// Load source text, stopping at a `RUN` line or the end of the text.
    pub fn from_source(src: &str) -> Self {
        Program::load(src.lines().take_while(|line| !is_sentinel(line)))
    }

    /// Instruction text at `addr`, `None` past the end of the table.
    pub fn get(&self, addr: usize) -> Option<&str> {
        self.instructions.get(addr).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn instructions(&self) -> impl Iterator<Item = &str> {
        self.instructions.iter().map(String::as_str)
    }
}

/// Whether `line` ends program input (comments ignored, any case).
pub fn is_sentinel(line: &str) -> bool {
    strip_comment(line).trim().eq_ignore_ascii_case(RUN_SENTINEL)
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}
