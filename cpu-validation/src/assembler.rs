//! Text-to-bytes boundary used for the priming prologue and the arithmetic sweep.

use lockstep65_core::opcodes::{self, AddressingMode, Mnemonic};

use crate::error::AssemblerError;

pub trait Assembler {
    /// Assemble `statements` in order, as if placed at `origin`.
    fn assemble(&self, statements: &[&str], origin: u16) -> Result<Vec<u8>, AssemblerError>;
}

/// One instruction per statement in canonical syntax: `LDA #$00`, `STA $10,X`,
/// `LDA ($20),Y`, `ASL A`, `JMP ($1234)`. Numbers are `$` hex or decimal. Branch
/// operands are absolute targets. No labels, no expressions.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatementAssembler;

/// Parsed operand before the final encoding is picked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    /// `value`, `value,X`, `value,Y`; `short` when written as a one-byte literal.
    Direct { value: u16, short: bool, index: Index },
    IndexedIndirect(u8),
    IndirectIndexed(u8),
    Indirect(u16),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Index {
    None,
    X,
    Y,
}

impl Assembler for StatementAssembler {
    fn assemble(&self, statements: &[&str], origin: u16) -> Result<Vec<u8>, AssemblerError> {
        let mut out = Vec::new();
        for statement in statements {
            let pc = origin.wrapping_add(out.len() as u16);
            out.extend(assemble_statement(statement, pc)?);
        }
        Ok(out)
    }
}

fn assemble_statement(statement: &str, pc: u16) -> Result<Vec<u8>, AssemblerError> {
    let text = statement.trim();
    let (name, rest) = match text.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (text, ""),
    };
    let mnemonic = Mnemonic::from_name(name).ok_or_else(|| AssemblerError::UnknownMnemonic {
        statement: statement.to_string(),
    })?;
    let invalid = || AssemblerError::InvalidOperand {
        statement: statement.to_string(),
    };
    let no_encoding = || AssemblerError::NoEncoding {
        statement: statement.to_string(),
    };

    if let Some(opcode) = opcodes::encode(mnemonic, AddressingMode::Relative) {
        let target = parse_number(rest).ok_or_else(invalid)?;
        let offset = target as i32 - (pc as i32 + 2);
        let offset = i8::try_from(offset).map_err(|_| AssemblerError::BranchOutOfRange {
            statement: statement.to_string(),
        })?;
        return Ok(vec![opcode, offset as u8]);
    }

    let operand = parse_operand(rest).ok_or_else(invalid)?;
    let encode = |mode| opcodes::encode(mnemonic, mode).map(|op| (op, mode));

    let (opcode, mode) = match operand {
        // A bare shift means the accumulator form
        Operand::None => encode(AddressingMode::Implicit)
            .or_else(|| encode(AddressingMode::Accumulator)),
        Operand::Accumulator => encode(AddressingMode::Accumulator),
        Operand::Immediate(_) => encode(AddressingMode::Immediate),
        Operand::Direct {
            value,
            short,
            index,
        } => {
            let (zp_mode, abs_mode) = match index {
                Index::None => (AddressingMode::ZeroPage, AddressingMode::Absolute),
                Index::X => (AddressingMode::ZeroPageX, AddressingMode::AbsoluteX),
                Index::Y => (AddressingMode::ZeroPageY, AddressingMode::AbsoluteY),
            };
            let zero_page = if short && value <= 0xFF {
                encode(zp_mode)
            } else {
                None
            };
            zero_page.or_else(|| encode(abs_mode))
        }
        Operand::IndexedIndirect(_) => encode(AddressingMode::IndexedIndirect),
        Operand::IndirectIndexed(_) => encode(AddressingMode::IndirectIndexed),
        Operand::Indirect(_) => encode(AddressingMode::Indirect),
    }
    .ok_or_else(no_encoding)?;

    let mut bytes = vec![opcode];
    match operand {
        Operand::None | Operand::Accumulator => {}
        Operand::Immediate(v) | Operand::IndexedIndirect(v) | Operand::IndirectIndexed(v) => {
            bytes.push(v)
        }
        Operand::Direct { value, .. } | Operand::Indirect(value) => {
            if mode.operand_len() == 1 {
                bytes.push(value as u8);
            } else {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
    }
    Ok(bytes)
}

fn parse_operand(text: &str) -> Option<Operand> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let upper = text.to_ascii_uppercase();

    if upper.is_empty() {
        return Some(Operand::None);
    }
    if upper == "A" {
        return Some(Operand::Accumulator);
    }
    if let Some(imm) = upper.strip_prefix('#') {
        return byte(imm).map(Operand::Immediate);
    }
    if let Some(inner) = upper.strip_prefix('(') {
        if let Some(zp) = inner.strip_suffix(",X)") {
            return byte(zp).map(Operand::IndexedIndirect);
        }
        if let Some(zp) = inner.strip_suffix("),Y") {
            return byte(zp).map(Operand::IndirectIndexed);
        }
        return inner
            .strip_suffix(')')
            .and_then(parse_number)
            .map(Operand::Indirect);
    }

    let (value, index) = if let Some(v) = upper.strip_suffix(",X") {
        (v, Index::X)
    } else if let Some(v) = upper.strip_suffix(",Y") {
        (v, Index::Y)
    } else {
        (upper.as_str(), Index::None)
    };
    let short = match value.strip_prefix('$') {
        Some(hex) => hex.len() <= 2,
        None => true,
    };
    Some(Operand::Direct {
        value: parse_number(value)?,
        short,
        index,
    })
}

fn byte(text: &str) -> Option<u8> {
    parse_number(text).and_then(|v| u8::try_from(v).ok())
}

/// `$`-prefixed hex or plain decimal.
fn parse_number(text: &str) -> Option<u16> {
    match text.strip_prefix('$') {
        Some(hex) => u16::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(statements: &[&str]) -> Vec<u8> {
        StatementAssembler.assemble(statements, 0x2000).unwrap()
    }

    #[test]
    fn priming_prologue() {
        let bytes = asm(&[
            "clc", "cli", "cld", "clv", "lda #$00", "pha", "plp", "ldx #$ff", "txs",
            "lda #$00", "ldx #$00", "ldy #$00",
        ]);
        assert_eq!(
            bytes,
            vec![
                0x18, 0x58, 0xD8, 0xB8, 0xA9, 0x00, 0x48, 0x28, 0xA2, 0xFF, 0x9A, 0xA9, 0x00,
                0xA2, 0x00, 0xA0, 0x00
            ]
        );
    }

    #[test]
    fn addressing_forms() {
        assert_eq!(asm(&["STA $10,X"]), vec![0x95, 0x10]);
        assert_eq!(asm(&["sta $3004,x"]), vec![0x9D, 0x04, 0x30]);
        assert_eq!(asm(&["LDA ($20),Y"]), vec![0xB1, 0x20]);
        assert_eq!(asm(&["STA ($20,X)"]), vec![0x81, 0x20]);
        assert_eq!(asm(&["ASL A"]), vec![0x0A]);
        assert_eq!(asm(&["ASL"]), vec![0x0A]);
        assert_eq!(asm(&["JMP ($10FF)"]), vec![0x6C, 0xFF, 0x10]);
        assert_eq!(asm(&["adc #1"]), vec![0x69, 0x01]);
        // Long-form literal stays absolute
        assert_eq!(asm(&["LDA $0010"]), vec![0xAD, 0x10, 0x00]);
        // No LDA zp,Y: falls back to absolute,Y
        assert_eq!(asm(&["LDA $10,Y"]), vec![0xB9, 0x10, 0x00]);
    }

    #[test]
    fn branches_take_absolute_targets() {
        assert_eq!(asm(&["BNE $2012"]), vec![0xD0, 0x10]);
        assert_eq!(asm(&["nop", "beq $2000"]), vec![0xEA, 0xF0, 0xFD]);
        assert!(matches!(
            StatementAssembler.assemble(&["bne $3000"], 0x2000),
            Err(AssemblerError::BranchOutOfRange { .. })
        ));
    }

    #[test]
    fn errors_name_the_statement() {
        assert_eq!(
            StatementAssembler.assemble(&["lda #$00", "frob #1"], 0),
            Err(AssemblerError::UnknownMnemonic {
                statement: "frob #1".to_string()
            })
        );
        assert!(matches!(
            StatementAssembler.assemble(&["lda #$100"], 0),
            Err(AssemblerError::InvalidOperand { .. })
        ));
        assert!(matches!(
            StatementAssembler.assemble(&["sta #$01"], 0),
            Err(AssemblerError::NoEncoding { .. })
        ));
    }
}
