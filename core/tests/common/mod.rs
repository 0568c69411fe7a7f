#![allow(dead_code)]

use lockstep65_core::core::FlatBus;
use lockstep65_core::cpu::m6502::M6502;

/// Fresh CPU with PC at `origin` and `program` loaded there.
pub fn setup(origin: u16, program: &[u8]) -> (M6502, FlatBus) {
    let mut cpu = M6502::new();
    let mut bus = FlatBus::new();
    bus.load(origin, program);
    cpu.pc = origin;
    (cpu, bus)
}

/// Execute `n` instructions, returning the total cycle count.
pub fn run(cpu: &mut M6502, bus: &mut FlatBus, n: usize) -> u32 {
    (0..n)
        .map(|_| {
            cpu.step_instruction(bus)
                .unwrap_or_else(|e| panic!("step failed: {e}"))
        })
        .sum()
}
