use crate::error::Fault;
use crate::flags::Flags;
use crate::operand::{is_hex_digits, Operand};

/// Test if a character separates tokens. Commas count as whitespace.
pub(crate) fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Split an instruction into tokens, dropping empty ones.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split(is_separator).filter(|tok| !tok.is_empty()).collect()
}

/// Flag predicate gating a jump.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
    Always,
    Equal,
    NotEqual,
    Greater,
    Less,
}

impl Condition {
    pub fn holds(self, flags: Flags) -> bool {
        match self {
            Condition::Always => true,
            Condition::Equal => flags.zero(),
            Condition::NotEqual => !flags.zero(),
            Condition::Greater => flags.greater(),
            Condition::Less => flags.less(),
        }
    }
}

/// A decoded instruction line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    /// Blank line or label-only line
    Nop,
    Mov { dest: Operand, src: Operand },
    Add { dest: Operand, src: Operand },
    Sub { dest: Operand, src: Operand },
    Inc(Operand),
    Dec(Operand),
    Cmp { lhs: Operand, rhs: Operand },
    /// `JMP`, `JE`, `JNE`, `JG` and `JL`
    Jump { cond: Condition, target: String },
    Int(u32),
    /// Bind `label` to the current address and store `text` there, null terminated
    Db { label: String, text: String },
    /// Reported and skipped
    Unknown(String),
}

impl Instruction {
    pub fn decode(line: &str) -> Result<Instruction, Fault> {
        let tokens = tokenize(line);
        let Some(first) = tokens.first() else {
            return Ok(Instruction::Nop);
        };
        let args = &tokens[1..];
        let instr = match first.to_ascii_uppercase().as_str() {
            "MOV" => {
                let (dest, src) = binary("MOV", args)?;
                Instruction::Mov { dest, src }
            }
            "ADD" => {
                let (dest, src) = binary("ADD", args)?;
                Instruction::Add { dest, src }
            }
            "SUB" => {
                let (dest, src) = binary("SUB", args)?;
                Instruction::Sub { dest, src }
            }
            "CMP" => {
                let (lhs, rhs) = binary("CMP", args)?;
                Instruction::Cmp { lhs, rhs }
            }
            "INC" => Instruction::Inc(Operand::parse(operands::<1>("INC", args)?[0])?),
            "DEC" => Instruction::Dec(Operand::parse(operands::<1>("DEC", args)?[0])?),
            "JMP" => jump("JMP", Condition::Always, args)?,
            "JE" => jump("JE", Condition::Equal, args)?,
            "JNE" => jump("JNE", Condition::NotEqual, args)?,
            "JG" => jump("JG", Condition::Greater, args)?,
            "JL" => jump("JL", Condition::Less, args)?,
            "INT" => {
                let [token] = operands::<1>("INT", args)?;
                Instruction::Int(parse_interrupt(token)?)
            }
            "DB" => {
                let [label] = operands::<1>("DB", args)?;
                let text = string_literal(line, first, label).ok_or_else(|| {
                    Fault::MalformedString {
                        label: label.to_string(),
                    }
                })?;
                Instruction::Db {
                    label: label.to_string(),
                    text,
                }
            }
            _ => Instruction::Unknown(line.trim().to_string()),
        };
        Ok(instr)
    }
}

/// First `N` operands. Surplus operands are ignored.
fn operands<'a, const N: usize>(
    opcode: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], Fault> {
    if args.len() < N {
        return Err(Fault::MissingOperand {
            opcode,
            expected: N,
            found: args.len(),
        });
    }
    let mut out = [""; N];
    out.copy_from_slice(&args[..N]);
    Ok(out)
}

fn binary(opcode: &'static str, args: &[&str]) -> Result<(Operand, Operand), Fault> {
    let [lhs, rhs] = operands::<2>(opcode, args)?;
    let (lhs, rhs) = (Operand::parse(lhs)?, Operand::parse(rhs)?);
    if lhs.is_memory() && rhs.is_memory() {
        return Err(Fault::MemoryToMemory { opcode });
    }
    Ok((lhs, rhs))
}

fn jump(opcode: &'static str, cond: Condition, args: &[&str]) -> Result<Instruction, Fault> {
    let [target] = operands::<1>(opcode, args)?;
    Ok(Instruction::Jump {
        cond,
        target: target.to_string(),
    })
}

/// Interrupt numbers are hex, with or without a `0x` prefix.
fn parse_interrupt(token: &str) -> Result<u32, Fault> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    is_hex_digits(digits)
        .then(|| u32::from_str_radix(digits, 16).ok())
        .flatten()
        .ok_or_else(|| Fault::MalformedInterrupt {
            token: token.to_string(),
        })
}

/// Text of a `DB` string: everything from the first `"` after the label,
/// with surrounding quotes trimmed. Spaces and commas inside are kept.
fn string_literal(line: &str, opcode: &str, label: &str) -> Option<String> {
    let after_op = &line[line.find(opcode)? + opcode.len()..];
    let after_label = after_op[after_op.find(label)? + label.len()..].trim();
    let quoted = &after_label[after_label.find('"')?..];
    Some(quoted.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Half, Register};

    fn decode(line: &str) -> Instruction {
        Instruction::decode(line).unwrap()
    }

    #[test]
    fn tokenizes_on_whitespace_and_commas() {
        assert_eq!(tokenize("  MOV AX,BX , 1 "), vec!["MOV", "AX", "BX", "1"]);
        assert!(tokenize(" ,, ").is_empty());
    }

    #[test]
    fn blank_lines_are_nops() {
        assert_eq!(decode(""), Instruction::Nop);
        assert_eq!(decode("   \t"), Instruction::Nop);
    }

    #[test]
    fn opcodes_are_case_insensitive() {
        assert_eq!(
            decode("mov ah, 0x0E"),
            Instruction::Mov {
                dest: Operand::Half(Register::Ax, Half::High),
                src: Operand::Imm(0x0E),
            }
        );
        assert_eq!(decode("Inc cx"), Instruction::Inc(Operand::Reg(Register::Cx)));
    }

    #[test]
    fn decodes_jumps() {
        assert_eq!(
            decode("JNE loop"),
            Instruction::Jump {
                cond: Condition::NotEqual,
                target: "loop".into()
            }
        );
        assert_eq!(
            decode("jmp end"),
            Instruction::Jump {
                cond: Condition::Always,
                target: "end".into()
            }
        );
    }

    #[test]
    fn decodes_interrupt_numbers_as_hex() {
        assert_eq!(decode("INT 0x10"), Instruction::Int(0x10));
        assert_eq!(decode("INT 16"), Instruction::Int(0x16));
        assert_eq!(
            Instruction::decode("INT zz"),
            Err(Fault::MalformedInterrupt { token: "zz".into() })
        );
        for line in ["INT -10", "INT +10", "INT 0x-10", "INT 0x"] {
            assert!(Instruction::decode(line).is_err(), "{line}");
        }
    }

    #[test]
    fn decodes_db_strings_with_spaces() {
        assert_eq!(
            decode("DB greet \"Hello, world\"  "),
            Instruction::Db {
                label: "greet".into(),
                text: "Hello, world".into()
            }
        );
        assert_eq!(
            decode("db empty \"\""),
            Instruction::Db {
                label: "empty".into(),
                text: "".into()
            }
        );
        assert_eq!(
            Instruction::decode("DB msg"),
            Err(Fault::MalformedString { label: "msg".into() })
        );
    }

    #[test]
    fn unknown_opcodes_keep_their_text() {
        assert_eq!(
            decode("  PUSH AX "),
            Instruction::Unknown("PUSH AX".into())
        );
    }

    #[test]
    fn rejects_missing_and_paired_memory_operands() {
        assert_eq!(
            Instruction::decode("MOV AX"),
            Err(Fault::MissingOperand {
                opcode: "MOV",
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            Instruction::decode("JE"),
            Err(Fault::MissingOperand {
                opcode: "JE",
                expected: 1,
                found: 0
            })
        );
        assert_eq!(
            Instruction::decode("MOV [AX], [BX]"),
            Err(Fault::MemoryToMemory { opcode: "MOV" })
        );
    }

    #[test]
    fn surplus_operands_are_ignored() {
        assert_eq!(decode("DEC DX, AX"), Instruction::Dec(Operand::Reg(Register::Dx)));
    }

    #[test]
    fn conditions_follow_flags() {
        let mut flags = Flags::default();
        flags.compare(5, 3);
        assert!(Condition::Greater.holds(flags));
        assert!(Condition::NotEqual.holds(flags));
        assert!(!Condition::Equal.holds(flags));
        assert!(!Condition::Less.holds(flags));
        assert!(Condition::Always.holds(flags));
    }
}
