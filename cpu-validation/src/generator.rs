//! Random single-instruction generator.
//!
//! Opcodes are rejection-sampled from the whole byte range and filtered down to
//! documented, non-branching, non-control-transfer instructions. Operands are synthesized
//! per addressing mode, and for stores the effective address is predicted from the
//! current index registers and zero page so the harness knows which byte to compare.

use std::fmt;

use lockstep65_core::cpu::CpuState;
use lockstep65_core::opcodes::{self, AddressingMode, Mnemonic, OpcodeInfo};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GeneratorError;

/// High byte of every generated absolute operand.
pub const ABSOLUTE_PAGE: u8 = 0x30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub operands: Vec<u8>,
    pub mode: AddressingMode,
    pub mnemonic: Mnemonic,
    /// Address the instruction will write, if it writes memory.
    pub store_address: Option<u16>,
    pub description: String,
}

impl Instruction {
    /// Build an instruction from raw bytes. Operand bytes missing from `bytes` are zero.
    pub fn from_bytes(bytes: &[u8], store_address: Option<u16>) -> Self {
        let opcode = bytes.first().copied().unwrap_or(0);
        let info = opcodes::lookup(opcode);
        let operands = (1..info.length() as usize)
            .map(|i| bytes.get(i).copied().unwrap_or(0))
            .collect();
        Self::assemble(opcode, info, operands, store_address)
    }

    fn assemble(
        opcode: u8,
        info: &OpcodeInfo,
        operands: Vec<u8>,
        store_address: Option<u16>,
    ) -> Self {
        let shown = std::iter::once(opcode)
            .chain(operands.iter().copied())
            .map(|b| format!("${b:02x}"))
            .collect::<Vec<_>>()
            .join(", ");
        let description = format!(
            "{} ({}): [{shown}]",
            info.mnemonic.name().to_ascii_lowercase(),
            info.mode.name()
        );
        Self {
            opcode,
            operands,
            mode: info.mode,
            mnemonic: info.mnemonic,
            store_address,
            description,
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.operands.len());
        bytes.push(self.opcode);
        bytes.extend_from_slice(&self.operands);
        bytes
    }

    /// Encoded length in bytes, opcode included.
    pub fn length(&self) -> usize {
        1 + self.operands.len()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Whether an opcode may be emitted: documented, legal, no relative or indirect
/// addressing, and no jump, call, return or break.
pub fn is_testable(info: &OpcodeInfo) -> bool {
    info.mnemonic.info().legal
        && !info.undocumented
        && !matches!(info.mode, AddressingMode::Relative | AddressingMode::Indirect)
        && !info.mnemonic.is_control_transfer()
}

/// Effective address written by a store in `mode`.
///
/// Zero-page indexed forms wrap within page zero. Absolute indexed forms do not wrap
/// (they may cross a page). Indirect forms fetch their pointer from `zero_page`, whose
/// two pointer bytes wrap within page zero as the hardware does.
pub fn predict_store_address(
    opcode: u8,
    mode: AddressingMode,
    operands: &[u8],
    x: u8,
    y: u8,
    zero_page: &[u8; 256],
) -> Result<u16, GeneratorError> {
    let lo = operands.first().copied().unwrap_or(0);
    let hi = operands.get(1).copied().unwrap_or(0);
    let word = u16::from_le_bytes([lo, hi]);
    let pointer = |zp: u8| {
        u16::from_le_bytes([zero_page[zp as usize], zero_page[zp.wrapping_add(1) as usize]])
    };

    let address = match mode {
        AddressingMode::ZeroPage => lo as u16,
        AddressingMode::ZeroPageX => lo.wrapping_add(x) as u16,
        AddressingMode::ZeroPageY => lo.wrapping_add(y) as u16,
        AddressingMode::Absolute => word,
        AddressingMode::AbsoluteX => word.wrapping_add(x as u16),
        AddressingMode::AbsoluteY => word.wrapping_add(y as u16),
        AddressingMode::IndexedIndirect => pointer(lo.wrapping_add(x)),
        AddressingMode::IndirectIndexed => pointer(lo).wrapping_add(y as u16),
        AddressingMode::Implicit
        | AddressingMode::Accumulator
        | AddressingMode::Immediate
        | AddressingMode::Relative
        | AddressingMode::Indirect => {
            return Err(GeneratorError::UnsupportedMode { opcode, mode });
        }
    };
    Ok(address)
}

pub struct InstructionGenerator<R: Rng = StdRng> {
    rng: R,
    max_attempts: u32,
    absolute_page: u8,
}

impl InstructionGenerator<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> InstructionGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            absolute_page: ABSOLUTE_PAGE,
        }
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn absolute_page(mut self, page: u8) -> Self {
        self.absolute_page = page;
        self
    }

    /// Draw opcode bytes until one is testable, giving up after `max_attempts`.
    pub fn sample_opcode(&mut self) -> Result<u8, GeneratorError> {
        self.sample_opcode_where(is_testable)
    }

    fn sample_opcode_where(
        &mut self,
        accept: impl Fn(&OpcodeInfo) -> bool,
    ) -> Result<u8, GeneratorError> {
        for _ in 0..self.max_attempts {
            let opcode: u8 = self.rng.r#gen();
            if accept(opcode_info(opcode)) {
                return Ok(opcode);
            }
        }
        Err(GeneratorError::NoCandidate {
            attempts: self.max_attempts,
        })
    }

    /// Produce one random testable instruction for the given machine state.
    pub fn generate(
        &mut self,
        state: &CpuState,
        zero_page: &[u8; 256],
    ) -> Result<Instruction, GeneratorError> {
        let opcode = self.sample_opcode()?;
        self.synthesize(opcode, state, zero_page)
    }

    /// Fill in operand bytes for `opcode` and predict its store address.
    pub fn synthesize(
        &mut self,
        opcode: u8,
        state: &CpuState,
        zero_page: &[u8; 256],
    ) -> Result<Instruction, GeneratorError> {
        let info = opcode_info(opcode);
        let operands = match info.mode {
            AddressingMode::Implicit | AddressingMode::Accumulator => Vec::new(),
            AddressingMode::Immediate
            | AddressingMode::ZeroPage
            | AddressingMode::ZeroPageX
            | AddressingMode::ZeroPageY
            | AddressingMode::IndexedIndirect
            | AddressingMode::IndirectIndexed => vec![self.rng.r#gen()],
            AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY => {
                vec![self.rng.r#gen(), self.absolute_page]
            }
            AddressingMode::Relative | AddressingMode::Indirect => {
                return Err(GeneratorError::UnsupportedMode {
                    opcode,
                    mode: info.mode,
                });
            }
        };

        let store_address = if info.writes_memory() {
            Some(predict_store_address(
                opcode,
                info.mode,
                &operands,
                state.x,
                state.y,
                zero_page,
            )?)
        } else {
            None
        };

        Ok(Instruction::assemble(opcode, info, operands, store_address))
    }
}

fn opcode_info(opcode: u8) -> &'static OpcodeInfo {
    opcodes::lookup(opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_PAGE: [u8; 256] = [0; 256];

    #[test]
    fn excluded_opcodes_are_never_testable() {
        for opcode in [0x00, 0x20, 0x40, 0x4C, 0x60, 0x6C, 0x10, 0xF0, 0xA7, 0x02] {
            assert!(!is_testable(opcodes::lookup(opcode)), "{opcode:02x}");
        }
        for opcode in [0x69, 0xE9, 0x95, 0x0A, 0xEA, 0x81, 0x91] {
            assert!(is_testable(opcodes::lookup(opcode)), "{opcode:02x}");
        }
    }

    #[test]
    fn description_format() {
        let instr = Instruction::from_bytes(&[0x95, 0x10], Some(0x15));
        assert_eq!(instr.description, "sta (zero-page x): [$95, $10]");
        assert_eq!(instr.length(), 2);
    }

    #[test]
    fn absolute_operands_pin_high_byte() {
        let mut generator = InstructionGenerator::from_seed(7);
        let state = CpuState::default();
        for _ in 0..64 {
            let instr = generator.synthesize(0x9D, &state, &ZERO_PAGE).unwrap(); // STA abs,X
            assert_eq!(instr.operands[1], ABSOLUTE_PAGE);
            assert_eq!(
                instr.store_address,
                Some(u16::from_le_bytes([instr.operands[0], ABSOLUTE_PAGE]))
            );
        }
    }

    #[test]
    fn relative_and_indirect_synthesis_is_a_configuration_error() {
        let mut generator = InstructionGenerator::from_seed(1);
        let state = CpuState::default();
        assert_eq!(
            generator.synthesize(0xD0, &state, &ZERO_PAGE),
            Err(GeneratorError::UnsupportedMode {
                opcode: 0xD0,
                mode: AddressingMode::Relative
            })
        );
        assert!(generator.synthesize(0x6C, &state, &ZERO_PAGE).is_err());
    }

    #[test]
    fn exhausted_attempts_fail() {
        let mut generator = InstructionGenerator::from_seed(3).max_attempts(50);
        assert_eq!(
            generator.sample_opcode_where(|_| false),
            Err(GeneratorError::NoCandidate { attempts: 50 })
        );
    }

    #[test]
    fn same_seed_same_stream() {
        let state = CpuState::default();
        let mut a = InstructionGenerator::from_seed(42);
        let mut b = InstructionGenerator::from_seed(42);
        for _ in 0..100 {
            assert_eq!(
                a.generate(&state, &ZERO_PAGE).unwrap(),
                b.generate(&state, &ZERO_PAGE).unwrap()
            );
        }
    }

    #[test]
    fn indirect_pointers_come_from_zero_page() {
        let mut zp = [0u8; 256];
        zp[0x15] = 0x34;
        zp[0x16] = 0x12;
        zp[0xFF] = 0xF0;
        zp[0x00] = 0x30;
        // (zp,X): pointer at $10 + 5
        assert_eq!(
            predict_store_address(0x81, AddressingMode::IndexedIndirect, &[0x10], 5, 0, &zp),
            Ok(0x1234)
        );
        // (zp),Y: pointer at $FF wraps to $00 for its high byte; +Y crosses a page
        assert_eq!(
            predict_store_address(0x91, AddressingMode::IndirectIndexed, &[0xFF], 0, 0x20, &zp),
            Ok(0x3110)
        );
    }

    #[test]
    fn non_store_modes_are_rejected() {
        assert!(
            predict_store_address(0x69, AddressingMode::Immediate, &[1], 0, 0, &ZERO_PAGE)
                .is_err()
        );
    }
}
