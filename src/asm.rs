//! Line assembler: `MNEMONIC Rd OPERAND` text to 16-bit words.
//!
//! Operands may be separated by whitespace or commas. The second operand is
//! `Rn` for register forms, a decimal/hex immediate for immediate and shift
//! forms, and `[imm]` (brackets optional) for LDR/STR. Lines starting with
//! `#` and anything after `;` are comments; blank lines emit nothing.

use crate::instructions::{by_mnemonic, Format};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("line {line}: unknown mnemonic `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },
    #[error("line {line}: bad register `{token}` (expected R0..R63)")]
    BadRegister { line: usize, token: String },
    #[error("line {line}: bad immediate `{token}` (expected {min}..={max})")]
    BadImmediate {
        line: usize,
        token: String,
        min: i32,
        max: i32,
    },
    #[error("line {line}: `{mnemonic}` expects two operands")]
    MissingOperand { line: usize, mnemonic: String },
    #[error("line {line}: unexpected operand `{token}`")]
    TrailingOperand { line: usize, token: String },
}

/// Pack the three fields of an instruction word.
pub fn encode(opcode: u8, r1: u8, low: u8) -> u16 {
    (u16::from(opcode & 0xF) << 12) | (u16::from(r1 & 0x3F) << 6) | u16::from(low & 0x3F)
}

fn parse_int(s: &str) -> Option<i32> {
    let t = s.trim().trim_start_matches('#');
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    if body.starts_with(['-', '+']) {
        return None;
    }
    let v = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i32::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i32>().ok()?
    };
    Some(if neg { -v } else { v })
}

fn parse_reg(token: &str, line: usize) -> Result<u8, AsmError> {
    token
        .strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| n < 64)
        .ok_or_else(|| AsmError::BadRegister {
            line,
            token: token.to_string(),
        })
}

fn parse_field(token: &str, line: usize, min: i32, max: i32) -> Result<u8, AsmError> {
    match parse_int(token) {
        Some(v) if (min..=max).contains(&v) => Ok((v & 0x3F) as u8),
        _ => Err(AsmError::BadImmediate {
            line,
            token: token.to_string(),
            min,
            max,
        }),
    }
}

/// Assemble one source line. `line` is 1-based and only used in errors.
pub fn assemble_line(text: &str, line: usize) -> Result<Option<u16>, AsmError> {
    if text.trim_start().starts_with('#') {
        return Ok(None);
    }
    let code = text.split(';').next().unwrap_or("");
    let mut tokens = code
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());

    let Some(mnemonic) = tokens.next() else {
        return Ok(None);
    };
    let desc = by_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownMnemonic {
        line,
        mnemonic: mnemonic.to_string(),
    })?;
    let missing = || AsmError::MissingOperand {
        line,
        mnemonic: desc.mnemonic.to_string(),
    };
    let r1 = parse_reg(tokens.next().ok_or_else(missing)?, line)?;
    let second = tokens.next().ok_or_else(missing)?;
    if let Some(extra) = tokens.next() {
        return Err(AsmError::TrailingOperand {
            line,
            token: extra.to_string(),
        });
    }

    let low = match desc.format {
        Format::RegReg => parse_reg(second, line)?,
        Format::RegImm => parse_field(second, line, -32, 63)?,
        Format::RegShift => parse_field(second, line, 0, 63)?,
        Format::Mem => {
            let inner = second
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .unwrap_or(second);
            parse_field(inner, line, -32, 63)?
        }
    };
    Ok(Some(encode(desc.opcode, r1, low)))
}

pub fn assemble(source: &str) -> Result<Vec<u16>, AsmError> {
    let mut words = Vec::new();
    for (i, text) in source.lines().enumerate() {
        if let Some(word) = assemble_line(text, i + 1)? {
            words.push(word);
        }
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_reference_program() {
        let src = "\
MOVI R1 5
MOVI R2 3
ADD R1 R2
SUB R1 R2
MUL R1 R2
ANDI R1 2
EOR R1 R2
BEQZ R1 2
MOVI R3 0
MOVI R3 7
STR R3 6
LDR R4 6
SAL R4 1
SAR R4 1
";
        let words = assemble(src).unwrap();
        assert_eq!(
            words,
            vec![
                0x3045, 0x3083, 0x0042, 0x1042, 0x2042, 0x5042, 0x6042, 0x4042, 0x30C0, 0x30C7,
                0xB0C6, 0xA106, 0x8101, 0x9101,
            ]
        );
    }

    #[test]
    fn negative_immediates_are_six_bit_twos_complement() {
        assert_eq!(assemble_line("MOVI R1 -1", 1).unwrap(), Some(0x307F));
        assert_eq!(assemble_line("BEQZ R0, -32", 1).unwrap(), Some(0x4020));
        assert_eq!(assemble_line("movi r1, 0x1f", 1).unwrap(), Some(0x305F));
    }

    #[test]
    fn comments_and_blank_lines_emit_nothing() {
        assert_eq!(assemble_line("", 1).unwrap(), None);
        assert_eq!(assemble_line("   # header", 1).unwrap(), None);
        assert_eq!(assemble_line("; note", 1).unwrap(), None);
        assert_eq!(assemble_line("ADD R1, R2 ; sum", 1).unwrap(), Some(0x0042));
    }

    #[test]
    fn reports_line_numbers() {
        let err = assemble("MOVI R1 5\nJMP R1 2\n").unwrap_err();
        assert_eq!(
            err,
            AsmError::UnknownMnemonic {
                line: 2,
                mnemonic: "JMP".into()
            }
        );
        assert!(matches!(
            assemble_line("ADD R1 R64", 3),
            Err(AsmError::BadRegister { line: 3, .. })
        ));
        assert!(matches!(
            assemble_line("SAL R1 -1", 4),
            Err(AsmError::BadImmediate { line: 4, .. })
        ));
        assert!(matches!(
            assemble_line("MOVI R1", 5),
            Err(AsmError::MissingOperand { line: 5, .. })
        ));
        assert!(matches!(
            assemble_line("MOVI R1 2 3", 6),
            Err(AsmError::TrailingOperand { line: 6, .. })
        ));
    }
}
