use std::collections::VecDeque;
use std::io::{stdin, stdout, IsTerminal, Read, Write};

use console::Term;
use log::warn;

use crate::error::{Fault, Warning};

/// Everything the engine exchanges with the outside world.
pub trait Io {
    /// Character emitted by teletype output.
    fn put_char(&mut self, ch: char);
    /// Blocking read of one key.
    fn get_char(&mut self) -> Result<char, Fault>;
    /// Non-fatal diagnostic.
    fn report(&mut self, warning: &Warning);
}

/// Log `warning` and hand it to `io`. Every non-fatal condition goes through here.
pub fn report(io: &mut dyn Io, warning: &Warning) {
    warn!("{warning}");
    io.report(warning);
}

/// In-memory collaborator for tests and embedding.
#[derive(Debug, Default)]
pub struct Buffered {
    input: VecDeque<char>,
    output: String,
    warnings: Vec<Warning>,
}

impl Buffered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: &str) -> Self {
        Buffered {
            input: input.chars().collect(),
            ..Self::default()
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

impl Io for Buffered {
    fn put_char(&mut self, ch: char) {
        self.output.push(ch);
    }

    fn get_char(&mut self) -> Result<char, Fault> {
        self.input.pop_front().ok_or(Fault::InputClosed)
    }

    fn report(&mut self, warning: &Warning) {
        self.warnings.push(warning.clone());
    }
}

/// Process stdout/stdin. Keys are read unbuffered when stdin is a terminal.
#[derive(Debug)]
pub struct Terminal {
    echo: bool,
    /// Whether the last character written ended a line
    line_start: bool,
}

impl Terminal {
    pub fn new(echo: bool) -> Self {
        Terminal {
            echo,
            line_start: true,
        }
    }

    /// Start a fresh line unless output already sits at one.
    pub fn start_new_line(&mut self) {
        if !self.line_start {
            self.put_char('\n');
        }
    }
}

impl Io for Terminal {
    fn put_char(&mut self, ch: char) {
        print!("{ch}");
        let _ = stdout().flush();
        self.line_start = ch == '\n';
    }

    fn get_char(&mut self) -> Result<char, Fault> {
        let ch = read_input().ok_or(Fault::InputClosed)?;
        if self.echo {
            self.put_char(ch);
        }
        Ok(ch)
    }

    fn report(&mut self, warning: &Warning) {
        self.start_new_line();
        println!("{warning}");
        self.line_start = true;
    }
}

// Read one character from stdin or unbuffered terminal
fn read_input() -> Option<char> {
    if stdin().is_terminal() {
        Term::stdout().read_char().ok()
    } else {
        let mut buf = [0; 1];
        stdin().read_exact(&mut buf).ok()?;
        Some(buf[0] as char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_reads_in_order_then_closes() {
        let mut io = Buffered::with_input("ab");
        assert_eq!(io.get_char(), Ok('a'));
        assert_eq!(io.get_char(), Ok('b'));
        assert_eq!(io.get_char(), Err(Fault::InputClosed));
    }

    #[test]
    fn buffered_collects_output_and_warnings() {
        let mut io = Buffered::new();
        io.put_char('H');
        io.put_char('i');
        io.report(&Warning::UnknownLabel {
            label: "nope".into(),
        });
        assert_eq!(io.output(), "Hi");
        assert_eq!(io.warnings().len(), 1);
    }
}
