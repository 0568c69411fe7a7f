// Re-export state types
pub mod state;
pub use state::{CpuState, CpuStateTrait, FLAG_COMPARE_MASK};

pub mod m6502;
pub use m6502::M6502;
