//! Z80 decode-execute engine.
//!
//! One `step` fetches, decodes and executes exactly one instruction at PC
//! and returns its nominal T-state count. Dispatch follows the standard
//! x/y/z bit-field decomposition of the base table, with the four prefix
//! escapes (0xCB, 0xED, 0xDD, 0xFD) each handled in its own module.

use thiserror::Error;

use crate::bus::{Bus, BusError};
use crate::isa::IndexMode;

#[macro_use]
mod macros;

pub mod registers;

mod op_cb;
mod op_ed;
mod op_general;
mod op_index;

pub use registers::{flags, Registers};

#[cfg(test)]
pub(crate) mod test_utils;

#[cfg(test)]
mod tests_alu;
#[cfg(test)]
mod tests_block;
#[cfg(test)]
mod tests_cb;
#[cfg(test)]
mod tests_control;
#[cfg(test)]
mod tests_io;


/// Failure raised by one engine step (or by the disassembler, which shares
/// the dispatch tables).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    /// The byte pattern at `addr` has no defined semantics.
    #[error("invalid opcode {} at {addr:#06x}", format_bytes(bytes))]
    InvalidOpcode { addr: u16, bytes: Vec<u8> },

    /// A bus access during execution failed.
    #[error(transparent)]
    Bus(#[from] BusError),
}

fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One CPU instance: register file plus exclusively-owned bus.
#[derive(Debug)]
pub struct Cpu {
    pub regs: Registers,
    pub bus: Bus,
}

impl Cpu {
    pub fn new(bus: Bus) -> Self {
        Self {
            regs: Registers::new(),
            bus,
        }
    }

    pub fn reset(&mut self) {
        self.regs.reset();
    }

    // ========== Fetch and memory helpers ==========

    pub(crate) fn fetch8(&mut self) -> Result<u8, BusError> {
        let byte = self.bus.read8(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        Ok(byte)
    }

    pub(crate) fn fetch16(&mut self) -> Result<u16, BusError> {
        let low = self.fetch8()?;
        let high = self.fetch8()?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    pub(crate) fn read8(&self, addr: u16) -> Result<u8, BusError> {
        self.bus.read8(addr)
    }

    pub(crate) fn write8(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        self.bus.write8(addr, value)
    }

    pub(crate) fn read16(&self, addr: u16) -> Result<u16, BusError> {
        self.bus.read16(addr)
    }

    pub(crate) fn write16(&mut self, addr: u16, value: u16) -> Result<(), BusError> {
        self.bus.write16(addr, value)
    }

    pub(crate) fn push(&mut self, value: u16) -> Result<(), BusError> {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        self.write16(self.regs.sp, value)
    }

    pub(crate) fn pop(&mut self) -> Result<u16, BusError> {
        let value = self.read16(self.regs.sp)?;
        self.regs.sp = self.regs.sp.wrapping_add(2);
        Ok(value)
    }

    /// Read the `r`-field operand: a register, or memory at HL for code 6.
    pub(crate) fn get_reg(&self, code: u8) -> Result<u8, BusError> {
        if code == 6 {
            self.read8(self.regs.hl())
        } else {
            Ok(self.regs.get8(code))
        }
    }

    pub(crate) fn set_reg(&mut self, code: u8, value: u8) -> Result<(), BusError> {
        if code == 6 {
            self.write8(self.regs.hl(), value)
        } else {
            self.regs.set8(code, value);
            Ok(())
        }
    }

    /// Build the `InvalidOpcode` error for the instruction whose encoded
    /// bytes (already fetched) are `bytes`.
    pub(crate) fn invalid_op(&self, bytes: &[u8]) -> CpuError {
        CpuError::InvalidOpcode {
            addr: self.regs.pc.wrapping_sub(bytes.len() as u16),
            bytes: bytes.to_vec(),
        }
    }

    // ========== ALU helpers ==========
    //
    // All arithmetic is computed in a widened unsigned domain so carry-out
    // falls out of the result; half-carry is carry out of bit 3 (bit 11 for
    // the 16-bit forms). P/V is signed overflow for add/subtract and even
    // parity for the logical group.

    pub(crate) fn add_a(&mut self, value: u8, with_carry: bool) {
        let carry = u16::from(with_carry && self.regs.get_flag(flags::CARRY));
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let result = a + v + carry;

        let half_carry = (a & 0x0F) + (v & 0x0F) + carry > 0x0F;
        let overflow = (a ^ result) & (v ^ result) & 0x80 != 0;

        self.regs.a = result as u8;
        self.regs.set_flag(flags::CARRY, result > 0xFF);
        self.regs.set_flag(flags::HALF_CARRY, half_carry);
        self.regs.set_flag(flags::PARITY, overflow);
        self.regs.set_flag(flags::ADD_SUB, false);
        self.regs.set_sz_flags(self.regs.a);
    }

    pub(crate) fn sub_a(&mut self, value: u8, with_carry: bool, store: bool) {
        let carry = u16::from(with_carry && self.regs.get_flag(flags::CARRY));
        let a = u16::from(self.regs.a);
        let v = u16::from(value);
        let result = a.wrapping_sub(v).wrapping_sub(carry);

        let half_carry = (a & 0x0F) < (v & 0x0F) + carry;
        let overflow = (a ^ v) & (a ^ result) & 0x80 != 0;

        self.regs.set_flag(flags::CARRY, result > 0xFF);
        self.regs.set_flag(flags::HALF_CARRY, half_carry);
        self.regs.set_flag(flags::PARITY, overflow);
        self.regs.set_flag(flags::ADD_SUB, true);

        if store {
            self.regs.a = result as u8;
        }
        self.regs.set_sz_flags(result as u8);
    }

    pub(crate) fn and_a(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.set_flag(flags::CARRY, false);
        self.regs.set_flag(flags::HALF_CARRY, true);
        self.regs.set_flag(flags::ADD_SUB, false);
        self.regs.set_sz_flags(self.regs.a);
        self.regs.set_parity_flag(self.regs.a);
    }

    pub(crate) fn or_a(&mut self, value: u8) {
        self.regs.a |= value;
        self.regs.set_flag(flags::CARRY, false);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
        self.regs.set_sz_flags(self.regs.a);
        self.regs.set_parity_flag(self.regs.a);
    }

    pub(crate) fn xor_a(&mut self, value: u8) {
        self.regs.a ^= value;
        self.regs.set_flag(flags::CARRY, false);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
        self.regs.set_sz_flags(self.regs.a);
        self.regs.set_parity_flag(self.regs.a);
    }

    /// 8-bit ALU dispatch by the `y` field, shared by the register,
    /// immediate and indexed forms.
    pub(crate) fn alu_a(&mut self, op: u8, value: u8) {
        match op & 0x07 {
            0 => self.add_a(value, false),
            1 => self.add_a(value, true),
            2 => self.sub_a(value, false, true),
            3 => self.sub_a(value, true, true),
            4 => self.and_a(value),
            5 => self.xor_a(value),
            6 => self.or_a(value),
            _ => self.sub_a(value, false, false), // CP
        }
    }

    pub(crate) fn inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.set_flag(flags::HALF_CARRY, value & 0x0F == 0x0F);
        self.regs.set_flag(flags::PARITY, value == 0x7F);
        self.regs.set_flag(flags::ADD_SUB, false);
        self.regs.set_sz_flags(result);
        result
    }

    pub(crate) fn dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.set_flag(flags::HALF_CARRY, value & 0x0F == 0x00);
        self.regs.set_flag(flags::PARITY, value == 0x80);
        self.regs.set_flag(flags::ADD_SUB, true);
        self.regs.set_sz_flags(result);
        result
    }

    /// ADD HL,rp (or ADD IX/IY,rp under a prefix): touches only C, H and N.
    pub(crate) fn add16(&mut self, mode: IndexMode, value: u16) {
        let target = u32::from(self.regs.index(mode));
        let v = u32::from(value);
        let result = target + v;

        self.regs.set_flag(flags::CARRY, result > 0xFFFF);
        self.regs
            .set_flag(flags::HALF_CARRY, (target & 0x0FFF) + (v & 0x0FFF) > 0x0FFF);
        self.regs.set_flag(flags::ADD_SUB, false);

        self.regs.set_index(mode, result as u16);
    }

    // ========== Accumulator rotates ==========

    pub(crate) fn rlca(&mut self) {
        let carry = self.regs.a & 0x80 != 0;
        self.regs.a = self.regs.a << 1 | u8::from(carry);
        self.regs.set_flag(flags::CARRY, carry);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
    }

    pub(crate) fn rrca(&mut self) {
        let carry = self.regs.a & 0x01 != 0;
        self.regs.a = self.regs.a >> 1 | if carry { 0x80 } else { 0 };
        self.regs.set_flag(flags::CARRY, carry);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
    }

    pub(crate) fn rla(&mut self) {
        let old_carry = self.regs.get_flag(flags::CARRY);
        let new_carry = self.regs.a & 0x80 != 0;
        self.regs.a = self.regs.a << 1 | u8::from(old_carry);
        self.regs.set_flag(flags::CARRY, new_carry);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
    }

    pub(crate) fn rra(&mut self) {
        let old_carry = self.regs.get_flag(flags::CARRY);
        let new_carry = self.regs.a & 0x01 != 0;
        self.regs.a = self.regs.a >> 1 | if old_carry { 0x80 } else { 0 };
        self.regs.set_flag(flags::CARRY, new_carry);
        self.regs.set_flag(flags::HALF_CARRY, false);
        self.regs.set_flag(flags::ADD_SUB, false);
    }

    /// Adjust A to valid BCD based on the N, H and C flags. H afterwards
    /// reflects whether the low nibble was corrected.
    pub(crate) fn daa(&mut self) {
        let mut correction: u8 = 0;
        let mut carry = self.regs.get_flag(flags::CARRY);

        if self.regs.get_flag(flags::ADD_SUB) {
            if self.regs.get_flag(flags::HALF_CARRY) {
                correction |= 0x06;
            }
            if carry {
                correction |= 0x60;
            }
            self.regs.a = self.regs.a.wrapping_sub(correction);
        } else {
            if self.regs.get_flag(flags::HALF_CARRY) || (self.regs.a & 0x0F) > 9 {
                correction |= 0x06;
            }
            if carry || self.regs.a > 0x99 {
                correction |= 0x60;
                carry = true;
            }
            self.regs.a = self.regs.a.wrapping_add(correction);
        }

        self.regs.set_flag(flags::CARRY, carry);
        self.regs.set_flag(flags::HALF_CARRY, (correction & 0x06) != 0);
        self.regs.set_sz_flags(self.regs.a);
        self.regs.set_parity_flag(self.regs.a);
    }

    // ========== Execution ==========

    /// Execute exactly one instruction at PC. On `InvalidOpcode` the PC is
    /// restored to the instruction start; a mid-instruction `BusError`
    /// leaves whatever side effects already happened.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let start = self.regs.pc;
        match self.step_inner() {
            Err(err @ CpuError::InvalidOpcode { .. }) => {
                self.regs.pc = start;
                Err(err)
            }
            other => other,
        }
    }

    fn step_inner(&mut self) -> Result<u32, CpuError> {
        if self.regs.halted {
            // HALT burns 4 T-states per call without fetching.
            return Ok(4);
        }

        self.regs.refresh();

        let opcode = self.fetch8()?;
        let x = (opcode >> 6) & 0x03;
        let y = (opcode >> 3) & 0x07;
        let z = opcode & 0x07;
        let p = (y >> 1) & 0x03;
        let q = y & 0x01;

        match x {
            0 => op_general::execute_x0(self, y, z, p, q),
            1 => op_general::execute_x1(self, y, z),
            2 => op_general::execute_x2(self, y, z),
            _ => op_general::execute_x3(self, y, z, p, q),
        }
    }

    // ========== Interrupt delivery ==========
    //
    // No controller is modeled; the external driver decides when a line is
    // asserted and calls these.

    /// Deliver a maskable interrupt with `vector` on the data bus. Returns
    /// the T-states consumed, 0 if interrupts are disabled.
    pub fn interrupt(&mut self, vector: u8) -> Result<u32, CpuError> {
        if !self.regs.iff1 {
            return Ok(0);
        }
        self.regs.halted = false;
        self.regs.iff1 = false;
        self.regs.iff2 = false;

        match self.regs.im {
            // Mode 0 executes the byte on the bus; the only bytes delivered
            // in practice are the RST encodings, so the restart target is
            // taken from the byte's y field. Mode 1 is a fixed RST 38h.
            0 | 1 => {
                let target = if self.regs.im == 0 {
                    u16::from(vector & 0x38)
                } else {
                    0x0038
                };
                self.push(self.regs.pc)?;
                self.regs.pc = target;
                Ok(13)
            }
            _ => {
                // Mode 2: vector table indirection through the I register.
                let entry = u16::from(self.regs.i) << 8 | u16::from(vector);
                let target = self.read16(entry)?;
                self.push(self.regs.pc)?;
                self.regs.pc = target;
                Ok(19)
            }
        }
    }

    /// Deliver a non-maskable interrupt (fixed target 0x0066).
    pub fn non_maskable_interrupt(&mut self) -> Result<u32, CpuError> {
        self.regs.halted = false;
        self.regs.iff2 = self.regs.iff1;
        self.regs.iff1 = false;
        self.push(self.regs.pc)?;
        self.regs.pc = 0x0066;
        Ok(11)
    }
}
