//! NMOS 6502 opcode metadata.
//!
//! One [`OpcodeInfo`] per opcode byte, covering the documented instruction set and the
//! undocumented encodings. Per-mnemonic properties live on [`Mnemonic`] so the reference
//! CPU, the disassembler, the statement assembler and the instruction generator all agree
//! on a single source of truth.

use serde::{Deserialize, Serialize};

/// Rule by which an instruction's operand bytes become an effective address or value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingMode {
    Implicit,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// `(zp,X)`
    IndexedIndirect,
    /// `(zp),Y`
    IndirectIndexed,
    Relative,
    Indirect,
}

impl AddressingMode {
    pub const ALL: [AddressingMode; 13] = [
        AddressingMode::Implicit,
        AddressingMode::Accumulator,
        AddressingMode::Immediate,
        AddressingMode::ZeroPage,
        AddressingMode::ZeroPageX,
        AddressingMode::ZeroPageY,
        AddressingMode::Absolute,
        AddressingMode::AbsoluteX,
        AddressingMode::AbsoluteY,
        AddressingMode::IndexedIndirect,
        AddressingMode::IndirectIndexed,
        AddressingMode::Relative,
        AddressingMode::Indirect,
    ];

    /// Total instruction length in bytes, opcode included.
    pub const fn length(self) -> u8 {
        match self {
            Self::Implicit | Self::Accumulator => 1,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative => 2,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 3,
        }
    }

    pub const fn operand_len(self) -> usize {
        self.length() as usize - 1
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Implicit => "implicit",
            Self::Accumulator => "accumulator",
            Self::Immediate => "immediate",
            Self::ZeroPage => "zero-page",
            Self::ZeroPageX => "zero-page x",
            Self::ZeroPageY => "zero-page y",
            Self::Absolute => "absolute",
            Self::AbsoluteX => "absolute x",
            Self::AbsoluteY => "absolute y",
            Self::IndexedIndirect => "indirect x",
            Self::IndirectIndexed => "indirect y",
            Self::Relative => "relative",
            Self::Indirect => "indirect",
        }
    }
}

/// Instruction family. Undocumented NMOS families are included so every opcode byte
/// decodes to something nameable.
#[rustfmt::skip]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Undocumented
    Alr, Anc, Ane, Arr, Dcp, Isc, Jam, Las, Lax, Lxa, Rla, Rra, Sax, Sbx,
    Sha, Shx, Shy, Slo, Sre, Tas,
}

/// Per-mnemonic behaviour summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MnemonicInfo {
    /// Reads its operand from memory or the immediate byte.
    pub reads_operand: bool,
    /// Writes the effective address (memory-form read-modify-write and stores).
    pub writes_memory: bool,
    /// Architecturally defined (documented) family.
    pub legal: bool,
}

impl Mnemonic {
    #[rustfmt::skip]
    pub const fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
            Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
            Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA", Alr => "ALR", Anc => "ANC", Ane => "ANE", Arr => "ARR",
            Dcp => "DCP", Isc => "ISC", Jam => "JAM", Las => "LAS", Lax => "LAX",
            Lxa => "LXA", Rla => "RLA", Rra => "RRA", Sax => "SAX", Sbx => "SBX",
            Sha => "SHA", Shx => "SHX", Shy => "SHY", Slo => "SLO", Sre => "SRE",
            Tas => "TAS",
        }
    }

    /// Case-insensitive lookup by three-letter name.
    pub fn from_name(name: &str) -> Option<Mnemonic> {
        let upper = name.to_ascii_uppercase();
        OPCODES
            .iter()
            .map(|info| info.mnemonic)
            .find(|m| m.name() == upper)
    }

    pub const fn info(self) -> MnemonicInfo {
        use Mnemonic::*;
        let (reads_operand, writes_memory) = match self {
            Adc | And | Bit | Cmp | Cpx | Cpy | Eor | Lda | Ldx | Ldy | Ora | Sbc => (true, false),
            Asl | Lsr | Rol | Ror | Inc | Dec => (true, true),
            Sta | Stx | Sty => (false, true),
            Slo | Rla | Sre | Rra | Dcp | Isc => (true, true),
            Sax | Sha | Shx | Shy | Tas => (false, true),
            Alr | Anc | Ane | Arr | Las | Lax | Lxa | Sbx => (true, false),
            _ => (false, false),
        };
        let legal = !matches!(
            self,
            Alr | Anc | Ane | Arr | Dcp | Isc | Jam | Las | Lax | Lxa | Rla | Rra | Sax | Sbx
                | Sha | Shx | Shy | Slo | Sre | Tas
        );
        MnemonicInfo {
            reads_operand,
            writes_memory,
            legal,
        }
    }

    /// Jumps, subroutine calls/returns and software interrupts.
    pub const fn is_control_transfer(self) -> bool {
        matches!(
            self,
            Mnemonic::Jmp | Mnemonic::Jsr | Mnemonic::Rts | Mnemonic::Rti | Mnemonic::Brk
        )
    }
}

/// Static description of one opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    /// Base cycle count, before page-crossing or branch-taken penalties.
    pub cycles: u8,
    pub undocumented: bool,
}

impl OpcodeInfo {
    pub const fn length(&self) -> u8 {
        self.mode.length()
    }

    /// True when executing this opcode stores to its effective address.
    pub const fn writes_memory(&self) -> bool {
        self.mnemonic.info().writes_memory && !matches!(self.mode, AddressingMode::Accumulator)
    }
}

const fn op(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        undocumented: false,
    }
}

const fn undoc(mnemonic: Mnemonic, mode: AddressingMode, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        cycles,
        undocumented: true,
    }
}

/// Look up the metadata for an opcode byte.
#[inline]
pub fn lookup(opcode: u8) -> &'static OpcodeInfo {
    &OPCODES[opcode as usize]
}

/// Find the opcode byte for a mnemonic/mode pair, preferring the documented encoding.
pub fn encode(mnemonic: Mnemonic, mode: AddressingMode) -> Option<u8> {
    let mut fallback = None;
    for (opcode, info) in OPCODES.iter().enumerate() {
        if info.mnemonic == mnemonic && info.mode == mode {
            if !info.undocumented {
                return Some(opcode as u8);
            }
            fallback.get_or_insert(opcode as u8);
        }
    }
    fallback
}

use AddressingMode::*;
use Mnemonic::*;

#[rustfmt::skip]
pub static OPCODES: [OpcodeInfo; 256] = [
    /* 0x00 */ op(Brk, Implicit, 7),
    /* 0x01 */ op(Ora, IndexedIndirect, 6),
    /* 0x02 */ undoc(Jam, Implicit, 0),
    /* 0x03 */ undoc(Slo, IndexedIndirect, 8),
    /* 0x04 */ undoc(Nop, ZeroPage, 3),
    /* 0x05 */ op(Ora, ZeroPage, 3),
    /* 0x06 */ op(Asl, ZeroPage, 5),
    /* 0x07 */ undoc(Slo, ZeroPage, 5),
    /* 0x08 */ op(Php, Implicit, 3),
    /* 0x09 */ op(Ora, Immediate, 2),
    /* 0x0A */ op(Asl, Accumulator, 2),
    /* 0x0B */ undoc(Anc, Immediate, 2),
    /* 0x0C */ undoc(Nop, Absolute, 4),
    /* 0x0D */ op(Ora, Absolute, 4),
    /* 0x0E */ op(Asl, Absolute, 6),
    /* 0x0F */ undoc(Slo, Absolute, 6),
    /* 0x10 */ op(Bpl, Relative, 2),
    /* 0x11 */ op(Ora, IndirectIndexed, 5),
    /* 0x12 */ undoc(Jam, Implicit, 0),
    /* 0x13 */ undoc(Slo, IndirectIndexed, 8),
    /* 0x14 */ undoc(Nop, ZeroPageX, 4),
    /* 0x15 */ op(Ora, ZeroPageX, 4),
    /* 0x16 */ op(Asl, ZeroPageX, 6),
    /* 0x17 */ undoc(Slo, ZeroPageX, 6),
    /* 0x18 */ op(Clc, Implicit, 2),
    /* 0x19 */ op(Ora, AbsoluteY, 4),
    /* 0x1A */ undoc(Nop, Implicit, 2),
    /* 0x1B */ undoc(Slo, AbsoluteY, 7),
    /* 0x1C */ undoc(Nop, AbsoluteX, 4),
    /* 0x1D */ op(Ora, AbsoluteX, 4),
    /* 0x1E */ op(Asl, AbsoluteX, 7),
    /* 0x1F */ undoc(Slo, AbsoluteX, 7),
    /* 0x20 */ op(Jsr, Absolute, 6),
    /* 0x21 */ op(And, IndexedIndirect, 6),
    /* 0x22 */ undoc(Jam, Implicit, 0),
    /* 0x23 */ undoc(Rla, IndexedIndirect, 8),
    /* 0x24 */ op(Bit, ZeroPage, 3),
    /* 0x25 */ op(And, ZeroPage, 3),
    /* 0x26 */ op(Rol, ZeroPage, 5),
    /* 0x27 */ undoc(Rla, ZeroPage, 5),
    /* 0x28 */ op(Plp, Implicit, 4),
    /* 0x29 */ op(And, Immediate, 2),
    /* 0x2A */ op(Rol, Accumulator, 2),
    /* 0x2B */ undoc(Anc, Immediate, 2),
    /* 0x2C */ op(Bit, Absolute, 4),
    /* 0x2D */ op(And, Absolute, 4),
    /* 0x2E */ op(Rol, Absolute, 6),
    /* 0x2F */ undoc(Rla, Absolute, 6),
    /* 0x30 */ op(Bmi, Relative, 2),
    /* 0x31 */ op(And, IndirectIndexed, 5),
    /* 0x32 */ undoc(Jam, Implicit, 0),
    /* 0x33 */ undoc(Rla, IndirectIndexed, 8),
    /* 0x34 */ undoc(Nop, ZeroPageX, 4),
    /* 0x35 */ op(And, ZeroPageX, 4),
    /* 0x36 */ op(Rol, ZeroPageX, 6),
    /* 0x37 */ undoc(Rla, ZeroPageX, 6),
    /* 0x38 */ op(Sec, Implicit, 2),
    /* 0x39 */ op(And, AbsoluteY, 4),
    /* 0x3A */ undoc(Nop, Implicit, 2),
    /* 0x3B */ undoc(Rla, AbsoluteY, 7),
    /* 0x3C */ undoc(Nop, AbsoluteX, 4),
    /* 0x3D */ op(And, AbsoluteX, 4),
    /* 0x3E */ op(Rol, AbsoluteX, 7),
    /* 0x3F */ undoc(Rla, AbsoluteX, 7),
    /* 0x40 */ op(Rti, Implicit, 6),
    /* 0x41 */ op(Eor, IndexedIndirect, 6),
    /* 0x42 */ undoc(Jam, Implicit, 0),
    /* 0x43 */ undoc(Sre, IndexedIndirect, 8),
    /* 0x44 */ undoc(Nop, ZeroPage, 3),
    /* 0x45 */ op(Eor, ZeroPage, 3),
    /* 0x46 */ op(Lsr, ZeroPage, 5),
    /* 0x47 */ undoc(Sre, ZeroPage, 5),
    /* 0x48 */ op(Pha, Implicit, 3),
    /* 0x49 */ op(Eor, Immediate, 2),
    /* 0x4A */ op(Lsr, Accumulator, 2),
    /* 0x4B */ undoc(Alr, Immediate, 2),
    /* 0x4C */ op(Jmp, Absolute, 3),
    /* 0x4D */ op(Eor, Absolute, 4),
    /* 0x4E */ op(Lsr, Absolute, 6),
    /* 0x4F */ undoc(Sre, Absolute, 6),
    /* 0x50 */ op(Bvc, Relative, 2),
    /* 0x51 */ op(Eor, IndirectIndexed, 5),
    /* 0x52 */ undoc(Jam, Implicit, 0),
    /* 0x53 */ undoc(Sre, IndirectIndexed, 8),
    /* 0x54 */ undoc(Nop, ZeroPageX, 4),
    /* 0x55 */ op(Eor, ZeroPageX, 4),
    /* 0x56 */ op(Lsr, ZeroPageX, 6),
    /* 0x57 */ undoc(Sre, ZeroPageX, 6),
    /* 0x58 */ op(Cli, Implicit, 2),
    /* 0x59 */ op(Eor, AbsoluteY, 4),
    /* 0x5A */ undoc(Nop, Implicit, 2),
    /* 0x5B */ undoc(Sre, AbsoluteY, 7),
    /* 0x5C */ undoc(Nop, AbsoluteX, 4),
    /* 0x5D */ op(Eor, AbsoluteX, 4),
    /* 0x5E */ op(Lsr, AbsoluteX, 7),
    /* 0x5F */ undoc(Sre, AbsoluteX, 7),
    /* 0x60 */ op(Rts, Implicit, 6),
    /* 0x61 */ op(Adc, IndexedIndirect, 6),
    /* 0x62 */ undoc(Jam, Implicit, 0),
    /* 0x63 */ undoc(Rra, IndexedIndirect, 8),
    /* 0x64 */ undoc(Nop, ZeroPage, 3),
    /* 0x65 */ op(Adc, ZeroPage, 3),
    /* 0x66 */ op(Ror, ZeroPage, 5),
    /* 0x67 */ undoc(Rra, ZeroPage, 5),
    /* 0x68 */ op(Pla, Implicit, 4),
    /* 0x69 */ op(Adc, Immediate, 2),
    /* 0x6A */ op(Ror, Accumulator, 2),
    /* 0x6B */ undoc(Arr, Immediate, 2),
    /* 0x6C */ op(Jmp, Indirect, 5),
    /* 0x6D */ op(Adc, Absolute, 4),
    /* 0x6E */ op(Ror, Absolute, 6),
    /* 0x6F */ undoc(Rra, Absolute, 6),
    /* 0x70 */ op(Bvs, Relative, 2),
    /* 0x71 */ op(Adc, IndirectIndexed, 5),
    /* 0x72 */ undoc(Jam, Implicit, 0),
    /* 0x73 */ undoc(Rra, IndirectIndexed, 8),
    /* 0x74 */ undoc(Nop, ZeroPageX, 4),
    /* 0x75 */ op(Adc, ZeroPageX, 4),
    /* 0x76 */ op(Ror, ZeroPageX, 6),
    /* 0x77 */ undoc(Rra, ZeroPageX, 6),
    /* 0x78 */ op(Sei, Implicit, 2),
    /* 0x79 */ op(Adc, AbsoluteY, 4),
    /* 0x7A */ undoc(Nop, Implicit, 2),
    /* 0x7B */ undoc(Rra, AbsoluteY, 7),
    /* 0x7C */ undoc(Nop, AbsoluteX, 4),
    /* 0x7D */ op(Adc, AbsoluteX, 4),
    /* 0x7E */ op(Ror, AbsoluteX, 7),
    /* 0x7F */ undoc(Rra, AbsoluteX, 7),
    /* 0x80 */ undoc(Nop, Immediate, 2),
    /* 0x81 */ op(Sta, IndexedIndirect, 6),
    /* 0x82 */ undoc(Nop, Immediate, 2),
    /* 0x83 */ undoc(Sax, IndexedIndirect, 6),
    /* 0x84 */ op(Sty, ZeroPage, 3),
    /* 0x85 */ op(Sta, ZeroPage, 3),
    /* 0x86 */ op(Stx, ZeroPage, 3),
    /* 0x87 */ undoc(Sax, ZeroPage, 3),
    /* 0x88 */ op(Dey, Implicit, 2),
    /* 0x89 */ undoc(Nop, Immediate, 2),
    /* 0x8A */ op(Txa, Implicit, 2),
    /* 0x8B */ undoc(Ane, Immediate, 2),
    /* 0x8C */ op(Sty, Absolute, 4),
    /* 0x8D */ op(Sta, Absolute, 4),
    /* 0x8E */ op(Stx, Absolute, 4),
    /* 0x8F */ undoc(Sax, Absolute, 4),
    /* 0x90 */ op(Bcc, Relative, 2),
    /* 0x91 */ op(Sta, IndirectIndexed, 6),
    /* 0x92 */ undoc(Jam, Implicit, 0),
    /* 0x93 */ undoc(Sha, IndirectIndexed, 6),
    /* 0x94 */ op(Sty, ZeroPageX, 4),
    /* 0x95 */ op(Sta, ZeroPageX, 4),
    /* 0x96 */ op(Stx, ZeroPageY, 4),
    /* 0x97 */ undoc(Sax, ZeroPageY, 4),
    /* 0x98 */ op(Tya, Implicit, 2),
    /* 0x99 */ op(Sta, AbsoluteY, 5),
    /* 0x9A */ op(Txs, Implicit, 2),
    /* 0x9B */ undoc(Tas, AbsoluteY, 5),
    /* 0x9C */ undoc(Shy, AbsoluteX, 5),
    /* 0x9D */ op(Sta, AbsoluteX, 5),
    /* 0x9E */ undoc(Shx, AbsoluteY, 5),
    /* 0x9F */ undoc(Sha, AbsoluteY, 5),
    /* 0xA0 */ op(Ldy, Immediate, 2),
    /* 0xA1 */ op(Lda, IndexedIndirect, 6),
    /* 0xA2 */ op(Ldx, Immediate, 2),
    /* 0xA3 */ undoc(Lax, IndexedIndirect, 6),
    /* 0xA4 */ op(Ldy, ZeroPage, 3),
    /* 0xA5 */ op(Lda, ZeroPage, 3),
    /* 0xA6 */ op(Ldx, ZeroPage, 3),
    /* 0xA7 */ undoc(Lax, ZeroPage, 3),
    /* 0xA8 */ op(Tay, Implicit, 2),
    /* 0xA9 */ op(Lda, Immediate, 2),
    /* 0xAA */ op(Tax, Implicit, 2),
    /* 0xAB */ undoc(Lxa, Immediate, 2),
    /* 0xAC */ op(Ldy, Absolute, 4),
    /* 0xAD */ op(Lda, Absolute, 4),
    /* 0xAE */ op(Ldx, Absolute, 4),
    /* 0xAF */ undoc(Lax, Absolute, 4),
    /* 0xB0 */ op(Bcs, Relative, 2),
    /* 0xB1 */ op(Lda, IndirectIndexed, 5),
    /* 0xB2 */ undoc(Jam, Implicit, 0),
    /* 0xB3 */ undoc(Lax, IndirectIndexed, 5),
    /* 0xB4 */ op(Ldy, ZeroPageX, 4),
    /* 0xB5 */ op(Lda, ZeroPageX, 4),
    /* 0xB6 */ op(Ldx, ZeroPageY, 4),
    /* 0xB7 */ undoc(Lax, ZeroPageY, 4),
    /* 0xB8 */ op(Clv, Implicit, 2),
    /* 0xB9 */ op(Lda, AbsoluteY, 4),
    /* 0xBA */ op(Tsx, Implicit, 2),
    /* 0xBB */ undoc(Las, AbsoluteY, 4),
    /* 0xBC */ op(Ldy, AbsoluteX, 4),
    /* 0xBD */ op(Lda, AbsoluteX, 4),
    /* 0xBE */ op(Ldx, AbsoluteY, 4),
    /* 0xBF */ undoc(Lax, AbsoluteY, 4),
    /* 0xC0 */ op(Cpy, Immediate, 2),
    /* 0xC1 */ op(Cmp, IndexedIndirect, 6),
    /* 0xC2 */ undoc(Nop, Immediate, 2),
    /* 0xC3 */ undoc(Dcp, IndexedIndirect, 8),
    /* 0xC4 */ op(Cpy, ZeroPage, 3),
    /* 0xC5 */ op(Cmp, ZeroPage, 3),
    /* 0xC6 */ op(Dec, ZeroPage, 5),
    /* 0xC7 */ undoc(Dcp, ZeroPage, 5),
    /* 0xC8 */ op(Iny, Implicit, 2),
    /* 0xC9 */ op(Cmp, Immediate, 2),
    /* 0xCA */ op(Dex, Implicit, 2),
    /* 0xCB */ undoc(Sbx, Immediate, 2),
    /* 0xCC */ op(Cpy, Absolute, 4),
    /* 0xCD */ op(Cmp, Absolute, 4),
    /* 0xCE */ op(Dec, Absolute, 6),
    /* 0xCF */ undoc(Dcp, Absolute, 6),
    /* 0xD0 */ op(Bne, Relative, 2),
    /* 0xD1 */ op(Cmp, IndirectIndexed, 5),
    /* 0xD2 */ undoc(Jam, Implicit, 0),
    /* 0xD3 */ undoc(Dcp, IndirectIndexed, 8),
    /* 0xD4 */ undoc(Nop, ZeroPageX, 4),
    /* 0xD5 */ op(Cmp, ZeroPageX, 4),
    /* 0xD6 */ op(Dec, ZeroPageX, 6),
    /* 0xD7 */ undoc(Dcp, ZeroPageX, 6),
    /* 0xD8 */ op(Cld, Implicit, 2),
    /* 0xD9 */ op(Cmp, AbsoluteY, 4),
    /* 0xDA */ undoc(Nop, Implicit, 2),
    /* 0xDB */ undoc(Dcp, AbsoluteY, 7),
    /* 0xDC */ undoc(Nop, AbsoluteX, 4),
    /* 0xDD */ op(Cmp, AbsoluteX, 4),
    /* 0xDE */ op(Dec, AbsoluteX, 7),
    /* 0xDF */ undoc(Dcp, AbsoluteX, 7),
    /* 0xE0 */ op(Cpx, Immediate, 2),
    /* 0xE1 */ op(Sbc, IndexedIndirect, 6),
    /* 0xE2 */ undoc(Nop, Immediate, 2),
    /* 0xE3 */ undoc(Isc, IndexedIndirect, 8),
    /* 0xE4 */ op(Cpx, ZeroPage, 3),
    /* 0xE5 */ op(Sbc, ZeroPage, 3),
    /* 0xE6 */ op(Inc, ZeroPage, 5),
    /* 0xE7 */ undoc(Isc, ZeroPage, 5),
    /* 0xE8 */ op(Inx, Implicit, 2),
    /* 0xE9 */ op(Sbc, Immediate, 2),
    /* 0xEA */ op(Nop, Implicit, 2),
    /* 0xEB */ undoc(Sbc, Immediate, 2),
    /* 0xEC */ op(Cpx, Absolute, 4),
    /* 0xED */ op(Sbc, Absolute, 4),
    /* 0xEE */ op(Inc, Absolute, 6),
    /* 0xEF */ undoc(Isc, Absolute, 6),
    /* 0xF0 */ op(Beq, Relative, 2),
    /* 0xF1 */ op(Sbc, IndirectIndexed, 5),
    /* 0xF2 */ undoc(Jam, Implicit, 0),
    /* 0xF3 */ undoc(Isc, IndirectIndexed, 8),
    /* 0xF4 */ undoc(Nop, ZeroPageX, 4),
    /* 0xF5 */ op(Sbc, ZeroPageX, 4),
    /* 0xF6 */ op(Inc, ZeroPageX, 6),
    /* 0xF7 */ undoc(Isc, ZeroPageX, 6),
    /* 0xF8 */ op(Sed, Implicit, 2),
    /* 0xF9 */ op(Sbc, AbsoluteY, 4),
    /* 0xFA */ undoc(Nop, Implicit, 2),
    /* 0xFB */ undoc(Isc, AbsoluteY, 7),
    /* 0xFC */ undoc(Nop, AbsoluteX, 4),
    /* 0xFD */ op(Sbc, AbsoluteX, 4),
    /* 0xFE */ op(Inc, AbsoluteX, 7),
    /* 0xFF */ undoc(Isc, AbsoluteX, 7),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_count_is_151() {
        let documented = OPCODES.iter().filter(|info| !info.undocumented).count();
        assert_eq!(documented, 151);
    }

    #[test]
    fn undocumented_opcodes_never_use_documented_only_families() {
        for (opcode, info) in OPCODES.iter().enumerate() {
            if !info.mnemonic.info().legal {
                assert!(info.undocumented, "opcode {opcode:02X} marked documented");
            }
        }
    }

    #[test]
    fn encode_prefers_documented_encoding() {
        assert_eq!(encode(Sbc, Immediate), Some(0xE9));
        assert_eq!(encode(Nop, Implicit), Some(0xEA));
        assert_eq!(encode(Sta, Immediate), None);
    }

    #[test]
    fn accumulator_shifts_do_not_write_memory() {
        assert!(!lookup(0x0A).writes_memory());
        assert!(lookup(0x06).writes_memory());
        assert!(lookup(0x95).writes_memory());
        assert!(!lookup(0xB5).writes_memory());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Mnemonic::from_name("lda"), Some(Lda));
        assert_eq!(Mnemonic::from_name("TxS"), Some(Txs));
        assert_eq!(Mnemonic::from_name("xyz"), None);
    }
}
