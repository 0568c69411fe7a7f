pub mod core;
pub mod cpu;
pub mod disasm;
pub mod opcodes;
