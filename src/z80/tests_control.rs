//! Jumps, calls, returns and loads that move PC, including agreement
//! between the disassembler's reported length and the engine's actual PC
//! delta with every condition forced both ways.

use super::test_utils::create_cpu;
use super::*;
use crate::disasm::disassemble;

#[test]
fn test_jp_unconditional() {
    let mut c = create_cpu(&[0xC3, 0x00, 0x80]);
    assert_eq!(c.step().unwrap(), 10);
    assert_eq!(c.regs.pc, 0x8000);
}

#[test]
fn test_jp_hl() {
    let mut c = create_cpu(&[0xE9]);
    c.regs.set_hl(0x1234);
    c.step().unwrap();
    assert_eq!(c.regs.pc, 0x1234);
}

#[test]
fn test_jr_backwards() {
    let mut c = create_cpu(&[0x00, 0x18, 0xFD]); // NOP; JR -3
    c.step().unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.pc, 0); // 3 + (-3)
}

#[test]
fn test_jr_cc_not_taken_advances_two() {
    let mut c = create_cpu(&[0x20, 0x10]); // JR NZ, +16
    c.regs.set_flag(flags::ZERO, true);
    assert_eq!(c.step().unwrap(), 7);
    assert_eq!(c.regs.pc, 2);
}

#[test]
fn test_djnz_loops_until_b_zero() {
    let mut c = create_cpu(&[0x10, 0xFE]); // DJNZ -2 (self)
    c.regs.b = 3;
    assert_eq!(c.step().unwrap(), 13);
    assert_eq!(c.regs.pc, 0);
    c.step().unwrap();
    assert_eq!(c.regs.pc, 0);
    assert_eq!(c.step().unwrap(), 8); // B hits 0, falls through
    assert_eq!(c.regs.pc, 2);
    assert_eq!(c.regs.b, 0);
}

#[test]
fn test_call_and_ret() {
    let mut c = create_cpu(&[0xCD, 0x00, 0x40]);
    c.regs.sp = 0x8000;
    c.bus.write8(0x4000, 0xC9).unwrap(); // RET
    assert_eq!(c.step().unwrap(), 17);
    assert_eq!(c.regs.pc, 0x4000);
    assert_eq!(c.bus.read16(0x7FFE).unwrap(), 0x0003);
    assert_eq!(c.step().unwrap(), 10);
    assert_eq!(c.regs.pc, 0x0003);
    assert_eq!(c.regs.sp, 0x8000);
}

#[test]
fn test_ret_cc_timing() {
    let mut c = create_cpu(&[0xC8]); // RET Z
    c.regs.sp = 0x8000;
    c.regs.set_flag(flags::ZERO, false);
    assert_eq!(c.step().unwrap(), 5);
    assert_eq!(c.regs.pc, 1);
}

#[test]
fn test_rst_pushes_return() {
    let mut c = create_cpu(&[0xFF]); // RST 38h
    c.regs.sp = 0x8000;
    assert_eq!(c.step().unwrap(), 11);
    assert_eq!(c.regs.pc, 0x0038);
    assert_eq!(c.bus.read16(0x7FFE).unwrap(), 0x0001);
}

#[test]
fn test_push_pop_round_trip() {
    let mut c = create_cpu(&[0xC5, 0xD1]); // PUSH BC; POP DE
    c.regs.sp = 0x8000;
    c.regs.set_bc(0xBEEF);
    c.step().unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.de(), 0xBEEF);
    assert_eq!(c.regs.sp, 0x8000);
}

#[test]
fn test_ex_sp_hl() {
    let mut c = create_cpu(&[0xE3]);
    c.regs.sp = 0x8000;
    c.regs.set_hl(0x1234);
    c.bus.write16(0x8000, 0x5678).unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.hl(), 0x5678);
    assert_eq!(c.bus.read16(0x8000).unwrap(), 0x1234);
}

#[test]
fn test_exchange_ops_are_independent() {
    let mut c = create_cpu(&[0x08, 0xD9]); // EX AF, AF'; EXX
    c.regs.a = 1;
    c.regs.b = 2;
    c.regs.a_prime = 3;
    c.regs.b_prime = 4;
    c.step().unwrap();
    // EX AF, AF' leaves the general bank alone
    assert_eq!(c.regs.a, 3);
    assert_eq!(c.regs.b, 2);
    c.step().unwrap();
    // EXX leaves AF alone
    assert_eq!(c.regs.a, 3);
    assert_eq!(c.regs.b, 4);
}

/// Run one conditional at address 0 with the relevant flag forced to
/// `flag_value` and check that, when not taken, the engine's PC delta is
/// exactly the disassembler's reported length.
fn assert_length_agreement(program: &[u8], flag: u8, flag_value: bool, taken: bool) {
    let mut c = create_cpu(program);
    c.regs.sp = 0x8000;
    c.regs.set_flag(flag, flag_value);
    let len = disassemble(&c.bus, 0).unwrap().len;
    c.step().unwrap();
    if taken {
        assert_ne!(c.regs.pc, len, "taken branch should leave the encoding");
    } else {
        assert_eq!(c.regs.pc, len, "not-taken branch must fall through");
    }
}

#[test]
fn test_conditional_length_agreement_both_ways() {
    // JP NZ, 0x4000
    assert_length_agreement(&[0xC2, 0x00, 0x40], flags::ZERO, true, false);
    assert_length_agreement(&[0xC2, 0x00, 0x40], flags::ZERO, false, true);
    // CALL C, 0x4000
    assert_length_agreement(&[0xDC, 0x00, 0x40], flags::CARRY, false, false);
    assert_length_agreement(&[0xDC, 0x00, 0x40], flags::CARRY, true, true);
    // JR Z, +8
    assert_length_agreement(&[0x28, 0x08], flags::ZERO, false, false);
    assert_length_agreement(&[0x28, 0x08], flags::ZERO, true, true);
    // RET PE
    assert_length_agreement(&[0xE8], flags::PARITY, false, false);
    assert_length_agreement(&[0xE8], flags::PARITY, true, true);
}

#[test]
fn test_loads_and_stores() {
    let mut c = create_cpu(&[
        0x01, 0x34, 0x12, // LD BC, 0x1234
        0x02, // LD (BC), A
        0x3A, 0x34, 0x12, // LD A, (0x1234)
    ]);
    c.regs.a = 0x77;
    c.step().unwrap();
    assert_eq!(c.regs.bc(), 0x1234);
    c.step().unwrap();
    c.regs.a = 0;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x77);
}

#[test]
fn test_ld_16_indirect() {
    let mut c = create_cpu(&[0x22, 0x00, 0x40, 0x2A, 0x00, 0x40]); // LD (nn), HL; LD HL, (nn)
    c.regs.set_hl(0xCAFE);
    c.step().unwrap();
    assert_eq!(c.bus.read16(0x4000).unwrap(), 0xCAFE);
    c.regs.set_hl(0);
    c.step().unwrap();
    assert_eq!(c.regs.hl(), 0xCAFE);
}
