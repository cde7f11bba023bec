//! CB-prefix rotates, shifts and bit operations.

use super::test_utils::create_cpu;
use super::*;

#[test]
fn test_rlc_register() {
    let mut c = create_cpu(&[0xCB, 0x00]); // RLC B
    c.regs.b = 0x80;
    assert_eq!(c.step().unwrap(), 8);
    assert_eq!(c.regs.b, 0x01);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(!c.regs.get_flag(flags::ZERO));
}

#[test]
fn test_rl_through_carry() {
    let mut c = create_cpu(&[0xCB, 0x10]); // RL B
    c.regs.b = 0x80;
    c.regs.set_flag(flags::CARRY, false);
    c.step().unwrap();
    assert_eq!(c.regs.b, 0x00);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::PARITY));
}

#[test]
fn test_sra_keeps_sign() {
    let mut c = create_cpu(&[0xCB, 0x2F]); // SRA A
    c.regs.a = 0x81;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0xC0);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::SIGN));
}

#[test]
fn test_srl_clears_sign() {
    let mut c = create_cpu(&[0xCB, 0x3F]); // SRL A
    c.regs.a = 0x81;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x40);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(!c.regs.get_flag(flags::SIGN));
}

#[test]
fn test_sll_feeds_one() {
    let mut c = create_cpu(&[0xCB, 0x37]); // SLL A (undocumented)
    c.regs.a = 0x01;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x03);
    assert!(!c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_memory_operand_timing() {
    let mut c = create_cpu(&[0xCB, 0x06]); // RLC (HL)
    c.regs.set_hl(0x4000);
    c.bus.write8(0x4000, 0x42).unwrap();
    assert_eq!(c.step().unwrap(), 15);
    assert_eq!(c.bus.read8(0x4000).unwrap(), 0x84);
}

#[test]
fn test_bit_sets_zero_from_tested_bit() {
    let mut c = create_cpu(&[0xCB, 0x40, 0xCB, 0x48]); // BIT 0, B; BIT 1, B
    c.regs.b = 0x02;
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    c.step().unwrap();
    assert!(!c.regs.get_flag(flags::ZERO));
}

#[test]
fn test_bit_preserves_carry() {
    let mut c = create_cpu(&[0xCB, 0x47]); // BIT 0, A
    c.regs.a = 1;
    c.regs.set_flag(flags::CARRY, true);
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_res_and_set() {
    let mut c = create_cpu(&[0xCB, 0x87, 0xCB, 0xFF]); // RES 0, A; SET 7, A
    c.regs.a = 0x01;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x00);
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x80);
}

#[test]
fn test_bit_memory_timing() {
    let mut c = create_cpu(&[0xCB, 0x7E]); // BIT 7, (HL)
    c.regs.set_hl(0x4000);
    c.bus.write8(0x4000, 0x80).unwrap();
    assert_eq!(c.step().unwrap(), 12);
    assert!(!c.regs.get_flag(flags::ZERO));
}
