//! 0xCB prefix: rotates, shifts and the BIT/RES/SET families. The indexed
//! variant shared by the DD CB / FD CB sub-escapes lives here too.

use log::trace;

use crate::z80::{flags, Cpu, CpuError};

pub(super) fn execute_cb_prefix(cpu: &mut Cpu) -> Result<u32, CpuError> {
    let opcode = cpu.fetch8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;

    match x {
        0 => {
            // Rotate/shift r
            let val = cpu.get_reg(z)?;
            let result = rotate_shift(cpu, y, val);
            cpu.set_reg(z, result)?;
            Ok(if z == 6 { 15 } else { 8 })
        }
        1 => {
            // BIT y, r
            let val = cpu.get_reg(z)?;
            bit_test(cpu, y, val);
            Ok(if z == 6 { 12 } else { 8 })
        }
        2 => {
            // RES y, r
            let val = cpu.get_reg(z)?;
            cpu.set_reg(z, val & !(1 << y))?;
            Ok(if z == 6 { 15 } else { 8 })
        }
        _ => {
            // SET y, r
            let val = cpu.get_reg(z)?;
            cpu.set_reg(z, val | 1 << y)?;
            Ok(if z == 6 { 15 } else { 8 })
        }
    }
}

/// DD CB d op / FD CB d op body. The operand always comes from memory at
/// `addr`; for the undocumented encodings with z != 6 the result is also
/// copied into the named register.
pub(super) fn execute_indexed_cb(cpu: &mut Cpu, opcode: u8, addr: u16) -> Result<u32, CpuError> {
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let val = cpu.read8(addr)?;

    match x {
        0 => {
            let result = rotate_shift(cpu, y, val);
            cpu.write8(addr, result)?;
            if z != 6 {
                cpu.regs.set8(z, result);
            }
            Ok(23)
        }
        1 => {
            // BIT y, (IX/IY+d): no writeback regardless of z
            bit_test(cpu, y, val);
            Ok(20)
        }
        2 => {
            let result = val & !(1 << y);
            cpu.write8(addr, result)?;
            if z != 6 {
                cpu.regs.set8(z, result);
            }
            Ok(23)
        }
        _ => {
            let result = val | 1 << y;
            cpu.write8(addr, result)?;
            if z != 6 {
                cpu.regs.set8(z, result);
            }
            Ok(23)
        }
    }
}

/// The eight rotate/shift variants keyed by `y`. Sets C from the shifted-out
/// bit, then the common S/Z/P/H/N pattern.
fn rotate_shift(cpu: &mut Cpu, y: u8, val: u8) -> u8 {
    let result = match y {
        0 => {
            // RLC
            let carry = val & 0x80 != 0;
            cpu.regs.set_flag(flags::CARRY, carry);
            val << 1 | u8::from(carry)
        }
        1 => {
            // RRC
            let carry = val & 0x01 != 0;
            cpu.regs.set_flag(flags::CARRY, carry);
            val >> 1 | if carry { 0x80 } else { 0 }
        }
        2 => {
            // RL
            let old_carry = cpu.regs.get_flag(flags::CARRY);
            cpu.regs.set_flag(flags::CARRY, val & 0x80 != 0);
            val << 1 | u8::from(old_carry)
        }
        3 => {
            // RR
            let old_carry = cpu.regs.get_flag(flags::CARRY);
            cpu.regs.set_flag(flags::CARRY, val & 0x01 != 0);
            val >> 1 | if old_carry { 0x80 } else { 0 }
        }
        4 => {
            // SLA
            cpu.regs.set_flag(flags::CARRY, val & 0x80 != 0);
            val << 1
        }
        5 => {
            // SRA: arithmetic, bit 7 sticks
            cpu.regs.set_flag(flags::CARRY, val & 0x01 != 0);
            val >> 1 | (val & 0x80)
        }
        6 => {
            // SLL: undocumented shift that feeds a 1 into bit 0
            trace!("SLL executed (undocumented encoding)");
            cpu.regs.set_flag(flags::CARRY, val & 0x80 != 0);
            val << 1 | 1
        }
        _ => {
            // SRL
            cpu.regs.set_flag(flags::CARRY, val & 0x01 != 0);
            val >> 1
        }
    };
    cpu.regs.set_flag(flags::HALF_CARRY, false);
    cpu.regs.set_flag(flags::ADD_SUB, false);
    cpu.regs.set_sz_flags(result);
    cpu.regs.set_parity_flag(result);
    result
}

fn bit_test(cpu: &mut Cpu, y: u8, val: u8) {
    cpu.regs.set_flag(flags::ZERO, val >> y & 1 == 0);
    cpu.regs.set_flag(flags::HALF_CARRY, true);
    cpu.regs.set_flag(flags::ADD_SUB, false);
}
