use lockstep65_core::cpu::m6502::StatusFlag;
mod common;
use common::{run, setup};

const Z: u8 = StatusFlag::Z as u8;
const N: u8 = StatusFlag::N as u8;

#[test]
fn test_lda_imm_flags() {
    let (mut cpu, mut bus) = setup(0, &[0xA9, 0x00, 0xA9, 0x80]);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.p & (Z | N), Z);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.p & (Z | N), N);
}

#[test]
fn test_ldx_zp_y_wraps_in_page_zero() {
    let (mut cpu, mut bus) = setup(0x2000, &[0xB6, 0xF0]); // LDX $F0,Y
    bus.memory[0x0010] = 0x5A;
    cpu.y = 0x20;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(cpu.x, 0x5A);
}

#[test]
fn test_sta_zp_x() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x95, 0x10]); // STA $10,X
    cpu.a = 0x77;
    cpu.x = 0x05;
    let cycles = run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x15], 0x77);
    assert_eq!(cycles, 4);
}

#[test]
fn test_sta_zp_x_wraps() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x95, 0xFF]);
    cpu.a = 0x11;
    cpu.x = 0x02;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x01], 0x11);
    assert_eq!(bus.memory[0x101], 0x00);
}

#[test]
fn test_sta_abs_y_crosses_page_without_penalty() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x99, 0xF0, 0x30]); // STA $30F0,Y
    cpu.a = 0x42;
    cpu.y = 0x20;
    let cycles = run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x3110], 0x42);
    assert_eq!(cycles, 5);
}

#[test]
fn test_sta_ind_x_pointer_wraps() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x81, 0xFE]); // STA ($FE,X)
    cpu.x = 0x01;
    bus.memory[0xFF] = 0x34;
    bus.memory[0x00] = 0x12;
    cpu.a = 0x99;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x1234], 0x99);
}

#[test]
fn test_sta_ind_y() {
    let (mut cpu, mut bus) = setup(0x2000, &[0x91, 0x40]); // STA ($40),Y
    bus.memory[0x40] = 0xFF;
    bus.memory[0x41] = 0x30;
    cpu.y = 0x01;
    cpu.a = 0xAB;
    let cycles = run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x3100], 0xAB);
    assert_eq!(cycles, 6);
}

#[test]
fn test_stx_sty_do_not_touch_flags() {
    let (mut cpu, mut bus) = setup(0, &[0x86, 0x20, 0x84, 0x21]);
    cpu.x = 0x00;
    cpu.y = 0x80;
    let before = cpu.p;
    run(&mut cpu, &mut bus, 2);
    assert_eq!(bus.memory[0x21], 0x80);
    assert_eq!(cpu.p, before);
}

#[test]
fn test_transfers() {
    // TAX, INX, TXA, TAY, DEY, TYA
    let (mut cpu, mut bus) = setup(0, &[0xAA, 0xE8, 0x8A, 0xA8, 0x88, 0x98]);
    cpu.a = 0x7F;
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(cpu.p & N, N);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(cpu.a, 0x7F);
    assert_eq!(cpu.y, 0x7F);
}

#[test]
fn test_inc_dec_memory() {
    let (mut cpu, mut bus) = setup(0, &[0xE6, 0x30, 0xCE, 0x00, 0x31]); // INC $30; DEC $3100
    bus.memory[0x30] = 0xFF;
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x30], 0x00);
    assert_eq!(cpu.p & Z, Z);
    run(&mut cpu, &mut bus, 1);
    assert_eq!(bus.memory[0x3100], 0xFF);
    assert_eq!(cpu.p & N, N);
}

#[test]
fn test_undocumented_opcode_is_refused() {
    let (mut cpu, mut bus) = setup(0x2000, &[0xA7, 0x10]); // LAX $10
    let err = cpu.step_instruction(&mut bus).unwrap_err();
    assert_eq!(
        err.to_string(),
        "undocumented opcode $a7 at $2000".to_string()
    );
    assert_eq!(cpu.pc, 0x2000);
    assert_eq!(cpu.retired(), 0);
}
