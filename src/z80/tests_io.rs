//! Port I/O through the bus's independent port space.

use super::test_utils::create_cpu;
use super::*;
use crate::bus::BusError;

#[test]
fn test_out_n_a() {
    let mut c = create_cpu(&[0xD3, 0x42]); // OUT (0x42), A
    c.regs.a = 0x99;
    assert_eq!(c.step().unwrap(), 11);
    assert_eq!(c.bus.io_read8(0x42).unwrap(), 0x99);
    // The memory space is untouched
    assert_eq!(c.bus.read8(0x42).unwrap(), 0x00);
}

#[test]
fn test_in_a_n() {
    let mut c = create_cpu(&[0xDB, 0x10]); // IN A, (0x10)
    c.bus.io_write8(0x10, 0x5A).unwrap();
    c.step().unwrap();
    assert_eq!(c.regs.a, 0x5A);
}

#[test]
fn test_in_r_c_sets_flags() {
    let mut c = create_cpu(&[0xED, 0x50]); // IN D, (C)
    c.regs.c = 0x07;
    c.bus.io_write8(0x07, 0x80).unwrap();
    c.regs.set_flag(flags::ADD_SUB, true);
    assert_eq!(c.step().unwrap(), 12);
    assert_eq!(c.regs.d, 0x80);
    assert!(c.regs.get_flag(flags::SIGN));
    assert!(!c.regs.get_flag(flags::ZERO));
    assert!(!c.regs.get_flag(flags::PARITY)); // one bit set, odd parity
    assert!(!c.regs.get_flag(flags::ADD_SUB));
}

#[test]
fn test_in_c_flags_only() {
    let mut c = create_cpu(&[0xED, 0x70]); // IN (C)
    c.regs.c = 0x07;
    c.bus.io_write8(0x07, 0x00).unwrap();
    let saved = c.regs.clone();
    c.step().unwrap();
    assert!(c.regs.get_flag(flags::ZERO));
    // No register received the byte
    assert_eq!(c.regs.b, saved.b);
    assert_eq!(c.regs.a, saved.a);
}

#[test]
fn test_out_c_r() {
    let mut c = create_cpu(&[0xED, 0x61]); // OUT (C), H
    c.regs.c = 0x20;
    c.regs.h = 0x77;
    assert_eq!(c.step().unwrap(), 12);
    assert_eq!(c.bus.io_read8(0x20).unwrap(), 0x77);
}

#[test]
fn test_out_c_zero() {
    let mut c = create_cpu(&[0xED, 0x71]); // OUT (C), 0
    c.regs.c = 0x20;
    c.bus.io_write8(0x20, 0xFF).unwrap();
    c.step().unwrap();
    assert_eq!(c.bus.io_read8(0x20).unwrap(), 0x00);
}

#[test]
fn test_unmapped_port_fails() {
    // No I/O region at all
    let mut bus = crate::bus::Bus::new();
    bus.map_memory(crate::bus::Region::new(
        0x0000,
        0x1_0000,
        Box::new(crate::bus::Ram::new(0x1_0000)),
    ))
    .unwrap();
    bus.load(0, &[0xDB, 0x10]).unwrap();
    let mut c = Cpu::new(bus);
    assert_eq!(
        c.step().unwrap_err(),
        CpuError::Bus(BusError::Unmapped { addr: 0x10 })
    );
}
