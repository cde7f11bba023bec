//! Block transfer, compare and I/O families, including the repeat forms'
//! PC rewind behavior.

use super::test_utils::create_cpu;
use super::*;

#[test]
fn test_ldi_moves_one_byte() {
    let mut c = create_cpu(&[0xED, 0xA0]);
    c.regs.set_hl(0x4000);
    c.regs.set_de(0x5000);
    c.regs.set_bc(2);
    c.bus.write8(0x4000, 0x99).unwrap();
    assert_eq!(c.step().unwrap(), 16);
    assert_eq!(c.bus.read8(0x5000).unwrap(), 0x99);
    assert_eq!(c.regs.hl(), 0x4001);
    assert_eq!(c.regs.de(), 0x5001);
    assert_eq!(c.regs.bc(), 1);
    assert!(c.regs.get_flag(flags::PARITY)); // BC still non-zero
    assert_eq!(c.regs.pc, 2);
}

#[test]
fn test_ldd_walks_backwards() {
    let mut c = create_cpu(&[0xED, 0xA8]);
    c.regs.set_hl(0x4000);
    c.regs.set_de(0x5000);
    c.regs.set_bc(1);
    c.bus.write8(0x4000, 0x42).unwrap();
    c.step().unwrap();
    assert_eq!(c.bus.read8(0x5000).unwrap(), 0x42);
    assert_eq!(c.regs.hl(), 0x3FFF);
    assert_eq!(c.regs.de(), 0x4FFF);
    assert!(!c.regs.get_flag(flags::PARITY)); // counter exhausted
}

#[test]
fn test_ldir_with_bc_3_transfers_exactly_3() {
    let mut c = create_cpu(&[0xED, 0xB0]);
    c.regs.set_hl(0x4000);
    c.regs.set_de(0x5000);
    c.regs.set_bc(3);
    c.bus.load(0x4000, &[1, 2, 3]).unwrap();

    // Two iterations rewind PC onto the instruction
    assert_eq!(c.step().unwrap(), 21);
    assert_eq!(c.regs.pc, 0);
    assert_eq!(c.step().unwrap(), 21);
    assert_eq!(c.regs.pc, 0);
    // Final iteration falls through
    assert_eq!(c.step().unwrap(), 16);
    assert_eq!(c.regs.pc, 2);

    assert_eq!(c.regs.bc(), 0);
    assert!(!c.regs.get_flag(flags::PARITY));
    assert_eq!(c.bus.read8(0x5000).unwrap(), 1);
    assert_eq!(c.bus.read8(0x5001).unwrap(), 2);
    assert_eq!(c.bus.read8(0x5002).unwrap(), 3);
}

#[test]
fn test_cpi_compares_without_storing() {
    let mut c = create_cpu(&[0xED, 0xA1]);
    c.regs.a = 5;
    c.regs.set_hl(0x4000);
    c.regs.set_bc(2);
    c.bus.write8(0x4000, 5).unwrap();
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::ADD_SUB));
    assert_eq!(c.regs.a, 5);
    assert_eq!(c.regs.hl(), 0x4001);
    assert_eq!(c.regs.bc(), 1);
}

#[test]
fn test_cpir_stops_on_match() {
    let mut c = create_cpu(&[0xED, 0xB1]);
    c.regs.a = 3;
    c.regs.set_hl(0x4000);
    c.regs.set_bc(10);
    c.bus.load(0x4000, &[1, 2, 3, 4]).unwrap();

    c.step().unwrap(); // 1: no match, repeat
    assert_eq!(c.regs.pc, 0);
    c.step().unwrap(); // 2: no match
    assert_eq!(c.step().unwrap(), 16); // 3: match, stop
    assert_eq!(c.regs.pc, 2);
    assert!(c.regs.get_flag(flags::ZERO));
    assert_eq!(c.regs.hl(), 0x4003);
    assert_eq!(c.regs.bc(), 7);
    assert!(c.regs.get_flag(flags::PARITY)); // counter not exhausted
}

#[test]
fn test_ini_counts_down_b() {
    let mut c = create_cpu(&[0xED, 0xA2]);
    c.regs.b = 2;
    c.regs.c = 0x10;
    c.regs.set_hl(0x4000);
    c.bus.io_write8(0x10, 0xAB).unwrap();
    c.step().unwrap();
    assert_eq!(c.bus.read8(0x4000).unwrap(), 0xAB);
    assert_eq!(c.regs.b, 1);
    assert_eq!(c.regs.hl(), 0x4001);
    assert!(!c.regs.get_flag(flags::ZERO));
    assert!(c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_otir_repeats_until_b_zero() {
    let mut c = create_cpu(&[0xED, 0xB3]);
    c.regs.b = 2;
    c.regs.c = 0x20;
    c.regs.set_hl(0x4000);
    c.bus.load(0x4000, &[0x11, 0x22]).unwrap();

    assert_eq!(c.step().unwrap(), 21);
    assert_eq!(c.regs.pc, 0);
    assert_eq!(c.bus.io_read8(0x20).unwrap(), 0x11);
    assert_eq!(c.step().unwrap(), 16);
    assert_eq!(c.regs.pc, 2);
    assert_eq!(c.bus.io_read8(0x20).unwrap(), 0x22);
    assert_eq!(c.regs.b, 0);
    assert!(c.regs.get_flag(flags::ZERO));
}

#[test]
fn test_outd_walks_backwards() {
    let mut c = create_cpu(&[0xED, 0xAB]);
    c.regs.b = 1;
    c.regs.c = 0x30;
    c.regs.set_hl(0x4000);
    c.bus.write8(0x4000, 0x55).unwrap();
    c.step().unwrap();
    assert_eq!(c.bus.io_read8(0x30).unwrap(), 0x55);
    assert_eq!(c.regs.hl(), 0x3FFF);
    assert_eq!(c.regs.b, 0);
}
