use lockstep65_core::cpu::m6502::StatusFlag;
mod common;
use common::{run, setup};

const C: u8 = StatusFlag::C as u8;
const B: u8 = StatusFlag::B as u8;
const U: u8 = StatusFlag::U as u8;

#[test]
fn test_pha_pla() {
    let (mut cpu, mut bus) = setup(0, &[0x48, 0xA9, 0x00, 0x68]);
    cpu.a = 0x9C;
    cpu.sp = 0xFF;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x01FF], 0x9C);
    assert_eq!(cpu.sp, 0xFE);
    run(&mut cpu, &mut bus, 2);
    assert_eq!(cpu.a, 0x9C);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_php_pushes_b_and_u() {
    let (mut cpu, mut bus) = setup(0, &[0x08]);
    cpu.p = C;
    cpu.sp = 0xFF;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x01FF], C | B | U);
    assert_eq!(cpu.p, C);
}

#[test]
fn test_plp_clears_b_sets_u() {
    let (mut cpu, mut bus) = setup(0, &[0x28]);
    cpu.sp = 0xFE;
    bus.memory[0x01FF] = 0xFF;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.p, 0xFF & !B);
}

#[test]
fn test_prologue_leaves_clean_state() {
    // clc, cli, cld, clv, lda #$00, pha, plp, ldx #$ff, txs, lda #$00, ldx #$00, ldy #$00
    let program = [
        0x18, 0x58, 0xD8, 0xB8, 0xA9, 0x00, 0x48, 0x28, 0xA2, 0xFF, 0x9A, 0xA9, 0x00, 0xA2,
        0x00, 0xA0, 0x00,
    ];
    let (mut cpu, mut bus) = setup(0x2000, &program);
    cpu.a = 0x55;
    cpu.p = 0xFF;
    run(&mut cpu, &mut bus, 12);
    assert_eq!((cpu.a, cpu.x, cpu.y, cpu.sp), (0, 0, 0, 0xFF));
    assert_eq!(cpu.p & 0xC3, 0x02);
    assert_eq!(cpu.pc, 0x2000 + program.len() as u16);
}

#[test]
fn test_stack_pointer_wraps() {
    let (mut cpu, mut bus) = setup(0, &[0x48]);
    cpu.sp = 0x00;
    cpu.a = 0x12;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x0100], 0x12);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_jsr_rts() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x20, 0x00, 0x30]); // JSR $3000
    bus.memory[0x3000] = 0x60; // RTS
    cpu.sp = 0xFF;
    let cycles = run(&mut cpu, &mut bus, 1);
    assert_eq!(cycles, 6);
    assert_eq!(cpu.pc, 0x3000);
    // Return address minus one
    assert_eq!(bus.memory[0x01FF], 0x20);
    assert_eq!(bus.memory[0x01FE], 0x02);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc, 0x2003);
    assert_eq!(cpu.sp, 0xFF);
}

#[test]
fn test_brk_rti() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x00, 0xEA]);
    bus.memory[0xFFFE] = 0x00;
    bus.memory[0xFFFF] = 0x40;
    bus.memory[0x4000] = 0x40; // RTI
    cpu.sp = 0xFF;
    cpu.p = U | C;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc, 0x4000);
    assert_eq!(bus.memory[0x01FD], U | C | B);
    assert_eq!(cpu.p & StatusFlag::I as u8, StatusFlag::I as u8);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.pc, 0x2002);
    assert_eq!(cpu.p, U | C);
}
