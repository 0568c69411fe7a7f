//! 6502 disassembler
//!
//! Formats one instruction from raw bytes using the shared opcode table. Used by the
//! reference adapter to cross-check generated instruction lengths and by mismatch reports.

use crate::opcodes::{self, AddressingMode};

/// Result of disassembling an instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Raw instruction bytes as hex string (e.g., "95 10")
    pub bytes: String,
    /// Mnemonic with operand in canonical syntax (e.g., "STA $10,X")
    pub text: String,
    /// Length of the instruction in bytes
    pub length: usize,
}

/// Disassemble the instruction starting at `bytes[0]`, located at address `pc`.
///
/// `pc` only matters for relative branches, whose target is printed absolute.
/// Missing operand bytes (short slice) are treated as zero.
pub fn disassemble(bytes: &[u8], pc: u16) -> Disassembly {
    let Some(&opcode) = bytes.first() else {
        return Disassembly {
            bytes: String::new(),
            text: "???".to_string(),
            length: 0,
        };
    };

    let info = opcodes::lookup(opcode);
    let length = info.length() as usize;
    let byte_at = |i: usize| bytes.get(i).copied().unwrap_or(0);
    let lo = byte_at(1);
    let word = u16::from_le_bytes([lo, byte_at(2)]);

    let operand = match info.mode {
        AddressingMode::Implicit => String::new(),
        AddressingMode::Accumulator => "A".to_string(),
        AddressingMode::Immediate => format!("#${lo:02X}"),
        AddressingMode::ZeroPage => format!("${lo:02X}"),
        AddressingMode::ZeroPageX => format!("${lo:02X},X"),
        AddressingMode::ZeroPageY => format!("${lo:02X},Y"),
        AddressingMode::Absolute => format!("${word:04X}"),
        AddressingMode::AbsoluteX => format!("${word:04X},X"),
        AddressingMode::AbsoluteY => format!("${word:04X},Y"),
        AddressingMode::IndexedIndirect => format!("(${lo:02X},X)"),
        AddressingMode::IndirectIndexed => format!("(${lo:02X}),Y"),
        AddressingMode::Indirect => format!("(${word:04X})"),
        AddressingMode::Relative => {
            let target = pc.wrapping_add(2).wrapping_add(lo as i8 as i16 as u16);
            format!("${target:04X}")
        }
    };

    let name = info.mnemonic.name();
    let text = if operand.is_empty() {
        name.to_string()
    } else {
        format!("{name} {operand}")
    };

    let shown = (0..length)
        .map(|i| format!("{:02X}", byte_at(i)))
        .collect::<Vec<_>>()
        .join(" ");

    Disassembly {
        bytes: shown,
        text,
        length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_operand_shape() {
        assert_eq!(disassemble(&[0x69, 0x01], 0).text, "ADC #$01");
        assert_eq!(disassemble(&[0x95, 0x10], 0).text, "STA $10,X");
        assert_eq!(disassemble(&[0xB6, 0x10], 0).text, "LDX $10,Y");
        assert_eq!(disassemble(&[0x9D, 0x04, 0x30], 0).text, "STA $3004,X");
        assert_eq!(disassemble(&[0x81, 0x20], 0).text, "STA ($20,X)");
        assert_eq!(disassemble(&[0x91, 0x20], 0).text, "STA ($20),Y");
        assert_eq!(disassemble(&[0x6C, 0xFF, 0x10], 0).text, "JMP ($10FF)");
        assert_eq!(disassemble(&[0x0A], 0).text, "ASL A");
        assert_eq!(disassemble(&[0xEA], 0).text, "NOP");
    }

    #[test]
    fn relative_branch_targets_are_absolute() {
        assert_eq!(disassemble(&[0xD0, 0xFE], 0x2000).text, "BNE $2000");
        assert_eq!(disassemble(&[0xF0, 0x10], 0x2000).text, "BEQ $2012");
    }

    #[test]
    fn length_follows_addressing_mode() {
        assert_eq!(disassemble(&[0xEA], 0).length, 1);
        assert_eq!(disassemble(&[0xA9, 0x00], 0).length, 2);
        assert_eq!(disassemble(&[0x8D, 0x00, 0x30], 0).length, 3);
        assert_eq!(disassemble(&[0x8D, 0x00, 0x30], 0).bytes, "8D 00 30");
    }

    #[test]
    fn empty_input_is_unknown() {
        let d = disassemble(&[], 0);
        assert_eq!(d.length, 0);
        assert_eq!(d.text, "???");
    }
}
