//! Instruction-stepped NMOS 6502.
//!
//! Executes every documented opcode, decimal mode included. Undocumented opcodes are
//! refused rather than emulated: this core is the trusted side of a comparison and only
//! answers for behaviour it is sure of.

mod addressing;
mod alu;
mod execute;

use thiserror::Error;

use crate::core::Bus;
use crate::cpu::state::{CpuState, CpuStateTrait};
use crate::opcodes;

pub(crate) use addressing::Operand;

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StatusFlag {
    C = 0x01, // Carry
    Z = 0x02, // Zero
    I = 0x04, // Interrupt Disable
    D = 0x08, // Decimal
    B = 0x10, // Break
    U = 0x20, // Unused (always 1 when pushed)
    V = 0x40, // Overflow
    N = 0x80, // Negative
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("undocumented opcode ${opcode:02x} at ${pc:04x}")]
    UndocumentedOpcode { opcode: u8, pc: u16 },
}

pub struct M6502 {
    // Registers
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub p: u8,

    /// Instructions retired since construction.
    pub(crate) retired: u64,
}

impl M6502 {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            p: 0x24, // I=1, U=1
            retired: 0,
        }
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: StatusFlag, set: bool) {
        if set {
            self.p |= flag as u8;
        } else {
            self.p &= !(flag as u8);
        }
    }

    #[inline]
    pub(crate) fn flag(&self, flag: StatusFlag) -> bool {
        self.p & (flag as u8) != 0
    }

    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Fetch, decode and execute one instruction at PC. Returns the cycle count,
    /// including page-crossing and branch penalties.
    pub fn step_instruction<B: Bus + ?Sized>(&mut self, bus: &mut B) -> Result<u32, CpuError> {
        let pc = self.pc;
        let opcode = bus.read(pc);
        let info = opcodes::lookup(opcode);
        if info.undocumented {
            return Err(CpuError::UndocumentedOpcode { opcode, pc });
        }

        self.pc = pc.wrapping_add(1);
        let operand = self.resolve_operand(info.mode, bus);
        let extra = self.execute(info.mnemonic, operand, bus);
        self.retired += 1;
        Ok(info.cycles as u32 + extra)
    }
}

impl Default for M6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuStateTrait for M6502 {
    type Snapshot = CpuState;

    fn snapshot(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            p: self.p,
        }
    }
}
