//! 8-bit and 16-bit arithmetic, logicals and the flag laws.

use super::test_utils::create_cpu;
use super::*;

// ============ ADD A, r ============
#[test]
fn test_add_zero() {
    let mut c = create_cpu(&[0x80]);
    c.regs.a = 0;
    c.regs.b = 0;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0);
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(!c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_add_signed_overflow_sets_pv() {
    // 0x7F + 1: carry into bit 7 but not out of it
    let mut c = create_cpu(&[0x80]);
    c.regs.a = 0x7F;
    c.regs.b = 1;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x80);
    assert!(c.regs.get_flag(flags::PARITY));
    assert!(c.regs.get_flag(flags::SIGN));
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    assert!(!c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_add_carry_out_without_overflow() {
    // 0xFF + 1: carry out of bit 7 but no signed overflow
    let mut c = create_cpu(&[0x80]);
    c.regs.a = 0xFF;
    c.regs.b = 1;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(!c.regs.get_flag(flags::PARITY));
}

#[test]
fn test_adc_uses_carry_in() {
    let mut c = create_cpu(&[0x88]);
    c.regs.a = 0x10;
    c.regs.b = 0x01;
    c.regs.set_flag(flags::CARRY, true);
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x12);
}

#[test]
fn test_add_a_hl_memory_operand() {
    let mut c = create_cpu(&[0x86]);
    c.regs.a = 2;
    c.regs.set_hl(0x4000);
    c.bus.write8(0x4000, 3).unwrap();
    assert_eq!(c.step().unwrap(), 7);
    assert_eq!(c.regs.a, 5);
}

// ============ SUB / CP ============
#[test]
fn test_sub_borrow() {
    let mut c = create_cpu(&[0x90]);
    c.regs.a = 0;
    c.regs.b = 1;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0xFF);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::SIGN));
    assert!(c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_cp_sets_flags_without_storing() {
    // CP 1 with A=0: borrow, sign, N; A unchanged
    let mut c = create_cpu(&[0xFE, 0x01]);
    c.regs.a = 0;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::SIGN));
    assert!(c.regs.get_flag(flags::ADD_SUB));
    assert!(!c.regs.get_flag(flags::ZERO));
}

#[test]
fn test_sbc_overflow() {
    // 0x80 - 1: signed overflow (i8::MIN - 1)
    let mut c = create_cpu(&[0x98]);
    c.regs.a = 0x80;
    c.regs.b = 1;
    c.regs.set_flag(flags::CARRY, false);
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x7F);
    assert!(c.regs.get_flag(flags::PARITY));
    assert!(c.regs.get_flag(flags::HALF_CARRY));
}

// ============ Logicals ============
#[test]
fn test_and_sets_half_carry_and_parity() {
    let mut c = create_cpu(&[0xA0]);
    c.regs.a = 0x0F;
    c.regs.b = 0x03;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x03);
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    assert!(c.regs.get_flag(flags::PARITY)); // 0x03 has even parity
    assert!(!c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_xor_self_clears_a() {
    let mut c = create_cpu(&[0xAF]);
    c.regs.a = 0x5A;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0);
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::PARITY));
    assert!(!c.regs.get_flag(flags::HALF_CARRY));
}

#[test]
fn test_or_even_parity_result() {
    let mut c = create_cpu(&[0xB0]);
    c.regs.a = 0x01;
    c.regs.b = 0x02;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x03);
    assert!(c.regs.get_flag(flags::PARITY));
}

// ============ INC / DEC ============
#[test]
fn test_inc_preserves_carry() {
    let mut c = create_cpu(&[0x3C]);
    c.regs.a = 0x0F;
    c.regs.set_flag(flags::CARRY, true);
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x10);
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    assert!(c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_inc_overflow_at_7f() {
    let mut c = create_cpu(&[0x3C]);
    c.regs.a = 0x7F;
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::PARITY));
}

#[test]
fn test_dec_overflow_at_80() {
    let mut c = create_cpu(&[0x3D]);
    c.regs.a = 0x80;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x7F);
    assert!(c.regs.get_flag(flags::PARITY));
    assert!(c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_inc_16_touches_no_flags() {
    let mut c = create_cpu(&[0x03]);
    c.regs.set_bc(0xFFFF);
    c.regs.f = 0;
    c.step().unwrap();
    assert_eq!(c.regs.bc(), 0);
    assert_eq!(c.regs.f, 0);
}

// ============ 16-bit ADD ============
#[test]
fn test_add_hl_only_touches_c_h_n() {
    let mut c = create_cpu(&[0x09]);
    c.regs.set_hl(0x0FFF);
    c.regs.set_bc(0x0001);
    c.regs.set_flag(flags::ZERO, true);
    c.regs.set_flag(flags::SIGN, true);
    c.step().unwrap();
    assert_eq!(c.regs.hl(), 0x1000);
    assert!(c.regs.get_flag(flags::HALF_CARRY)); // carry out of bit 11
    assert!(!c.regs.get_flag(flags::CARRY));
    assert!(!c.regs.get_flag(flags::ADD_SUB));
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::SIGN));
}

#[test]
fn test_add_hl_carry_out() {
    let mut c = create_cpu(&[0x19]);
    c.regs.set_hl(0xFFFF);
    c.regs.set_de(0x0001);
    c.step().unwrap();
    assert_eq!(c.regs.hl(), 0);
    assert!(c.regs.get_flag(flags::CARRY));
}

// ============ Accumulator one-byte ops ============
#[test]
fn test_rlca_wraps_bit7_into_carry() {
    let mut c = create_cpu(&[0x07]);
    c.regs.a = 0x81;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x03);
    assert!(c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_rra_rotates_through_carry() {
    let mut c = create_cpu(&[0x1F]);
    c.regs.a = 0x02;
    c.regs.set_flag(flags::CARRY, true);
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x81);
    assert!(!c.regs.get_flag(flags::CARRY));
}

#[test]
fn test_cpl_sets_h_and_n() {
    let mut c = create_cpu(&[0x2F]);
    c.regs.a = 0x0F;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0xF0);
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    assert!(c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_daa_after_bcd_add() {
    // 0x15 + 0x27 = 0x3C, DAA corrects to 0x42
    let mut c = create_cpu(&[0x80, 0x27]);
    c.regs.a = 0x15;
    c.regs.b = 0x27;
    c.step().unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x42);
}

#[test]
fn test_daa_half_carry_tracks_low_nibble_correction() {
    // 0x15 + 0x27: the binary add leaves H clear, but the low nibble (0xC)
    // needs a +6 adjust, which DAA must report in H
    let mut c = create_cpu(&[0x80, 0x27]);
    c.regs.a = 0x15;
    c.regs.b = 0x27;
    c.step().unwrap();
    assert!(!c.regs.get_flag(flags::HALF_CARRY));
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x42);
    assert!(c.regs.get_flag(flags::HALF_CARRY));
    assert!(!c.regs.get_flag(flags::CARRY));

    // 0x22 + 0x33 = 0x55 is already valid BCD: no correction, H clear
    let mut c = create_cpu(&[0x80, 0x27]);
    c.regs.a = 0x22;
    c.regs.b = 0x33;
    c.step().unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x55);
    assert!(!c.regs.get_flag(flags::HALF_CARRY));
}

#[test]
fn test_daa_high_correction_sets_carry() {
    // 0x90 + 0x20 = 0xB0: high nibble out of range, +0x60 wraps to 0x10
    // with carry out; no low-nibble adjust, so H stays clear
    let mut c = create_cpu(&[0x80, 0x27]);
    c.regs.a = 0x90;
    c.regs.b = 0x20;
    c.step().unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x10);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(!c.regs.get_flag(flags::HALF_CARRY));
}

#[test]
fn test_scf_ccf() {
    let mut c = create_cpu(&[0x37, 0x3F]);
    c.regs.set_flag(flags::CARRY, false);
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::CARRY));
    c.step().unwrap();
    assert!(!c.regs.get_flag(flags::CARRY));
    // CCF copies the old carry into H
    assert!(c.regs.get_flag(flags::HALF_CARRY));
}

#[test]
fn test_neg() {
    let mut c = create_cpu(&[0xED, 0x44]);
    c.regs.a = 1;
    c.step().unwrap();
    assert_eq!(c.regs.a, 0xFF);
    assert!(c.regs.get_flag(flags::CARRY));
    assert!(c.regs.get_flag(flags::ADD_SUB));
}
