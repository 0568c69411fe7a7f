//! CPU state snapshot types and traits

use serde::{Deserialize, Serialize};

/// Trait for CPU types that can provide state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
}

/// Flags compared between emulators: N, V, Z, C.
///
/// B, D and I are left out of equality checks; arithmetic test instructions do not
/// exercise them meaningfully.
pub const FLAG_COMPARE_MASK: u8 = 0xC3;

/// M6502 architectural register snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuState {
    pub a: u8,   // Accumulator
    pub x: u8,   // X index register
    pub y: u8,   // Y index register
    pub pc: u16, // Program counter
    pub sp: u8,  // Stack pointer (0x0100 based)
    pub p: u8,   // Status register (flags)
}

impl CpuState {
    /// Compare registers exactly and flags under `flag_mask`.
    pub fn matches(&self, other: &CpuState, flag_mask: u8) -> bool {
        self.a == other.a
            && self.x == other.x
            && self.y == other.y
            && self.pc == other.pc
            && self.sp == other.sp
            && (self.p & flag_mask) == (other.p & flag_mask)
    }
}

/// Render a status byte as `$c3 [NVZC]`, masked.
pub fn format_flags(p: u8, mask: u8) -> String {
    let flags = p & mask;
    let mut names = String::new();
    for (bit, name) in [
        (0x80, 'N'),
        (0x40, 'V'),
        (0x10, 'B'),
        (0x08, 'D'),
        (0x04, 'I'),
        (0x02, 'Z'),
        (0x01, 'C'),
    ] {
        if flags & bit != 0 {
            names.push(name);
        }
    }
    format!("${flags:02x} [{names}]")
}
