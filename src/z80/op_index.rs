//! 0xDD / 0xFD prefix: the IX/IY forms. The prefixed table reuses the base
//! decode with HL replaced by the index register, `(HL)` replaced by the
//! displaced memory operand, and H/L replaced by the index halves in the
//! undocumented register encodings. Bytes the prefix does not redefine are
//! invalid rather than falling back to the unprefixed instruction.

use crate::isa::IndexMode;
use crate::z80::{op_cb, Cpu, CpuError};

fn prefix_byte(mode: IndexMode) -> u8 {
    match mode {
        IndexMode::Iy => 0xFD,
        _ => 0xDD,
    }
}

/// Read the 8-bit register field with H/L mapped to the index halves.
fn get8_half(cpu: &Cpu, mode: IndexMode, code: u8) -> u8 {
    match (mode, code) {
        (IndexMode::Ix, 4) => cpu.regs.ixh(),
        (IndexMode::Ix, 5) => cpu.regs.ixl(),
        (IndexMode::Iy, 4) => cpu.regs.iyh(),
        (IndexMode::Iy, 5) => cpu.regs.iyl(),
        _ => cpu.regs.get8(code),
    }
}

fn set8_half(cpu: &mut Cpu, mode: IndexMode, code: u8, value: u8) {
    match (mode, code) {
        (IndexMode::Ix, 4) => cpu.regs.set_ixh(value),
        (IndexMode::Ix, 5) => cpu.regs.set_ixl(value),
        (IndexMode::Iy, 4) => cpu.regs.set_iyh(value),
        (IndexMode::Iy, 5) => cpu.regs.set_iyl(value),
        _ => cpu.regs.set8(code, value),
    }
}

/// Fetch the displacement byte and form the effective address.
fn fetch_displaced(cpu: &mut Cpu, mode: IndexMode) -> Result<u16, CpuError> {
    let d = cpu.fetch8()? as i8;
    Ok(cpu.regs.index(mode).wrapping_add(d as u16))
}

pub(super) fn execute_index_prefix(cpu: &mut Cpu, mode: IndexMode) -> Result<u32, CpuError> {
    let opcode = cpu.fetch8()?;
    match opcode {
        0x09 | 0x19 | 0x29 | 0x39 => {
            // ADD IX, rp (rp's HL slot is the index register itself)
            let p = (opcode >> 4) & 0x03;
            let rp = cpu.regs.get16(p, mode);
            cpu.add16(mode, rp);
            Ok(15)
        }
        0x21 => {
            // LD IX, nn
            let nn = cpu.fetch16()?;
            cpu.regs.set_index(mode, nn);
            Ok(14)
        }
        0x22 => {
            // LD (nn), IX
            let addr = cpu.fetch16()?;
            cpu.write16(addr, cpu.regs.index(mode))?;
            Ok(20)
        }
        0x2A => {
            // LD IX, (nn)
            let addr = cpu.fetch16()?;
            let val = cpu.read16(addr)?;
            cpu.regs.set_index(mode, val);
            Ok(20)
        }
        0x23 => {
            let ix = cpu.regs.index(mode);
            cpu.regs.set_index(mode, ix.wrapping_add(1));
            Ok(10)
        }
        0x2B => {
            let ix = cpu.regs.index(mode);
            cpu.regs.set_index(mode, ix.wrapping_sub(1));
            Ok(10)
        }
        0x24 | 0x25 | 0x2C | 0x2D => {
            // INC/DEC IXH and IXL (undocumented)
            let code = (opcode >> 3) & 0x07;
            let val = get8_half(cpu, mode, code);
            let result = if opcode & 0x01 == 0 {
                cpu.inc8(val)
            } else {
                cpu.dec8(val)
            };
            set8_half(cpu, mode, code, result);
            Ok(8)
        }
        0x26 | 0x2E => {
            // LD IXH/IXL, n (undocumented)
            let code = (opcode >> 3) & 0x07;
            let n = cpu.fetch8()?;
            set8_half(cpu, mode, code, n);
            Ok(11)
        }
        0x34 => {
            // INC (IX+d)
            let addr = fetch_displaced(cpu, mode)?;
            let val = cpu.read8(addr)?;
            let result = cpu.inc8(val);
            cpu.write8(addr, result)?;
            Ok(23)
        }
        0x35 => {
            // DEC (IX+d)
            let addr = fetch_displaced(cpu, mode)?;
            let val = cpu.read8(addr)?;
            let result = cpu.dec8(val);
            cpu.write8(addr, result)?;
            Ok(23)
        }
        0x36 => {
            // LD (IX+d), n: displacement precedes the immediate
            let addr = fetch_displaced(cpu, mode)?;
            let n = cpu.fetch8()?;
            cpu.write8(addr, n)?;
            Ok(19)
        }
        0x76 => Err(cpu.invalid_op(&[prefix_byte(mode), opcode])),
        0x40..=0x7F => execute_index_ld(cpu, mode, opcode),
        0x80..=0xBF => execute_index_alu(cpu, mode, opcode),
        0xCB => {
            // DD CB d op: displacement comes before the final opcode
            let addr = fetch_displaced(cpu, mode)?;
            let sub = cpu.fetch8()?;
            op_cb::execute_indexed_cb(cpu, sub, addr)
        }
        0xE1 => {
            // POP IX
            let val = cpu.pop()?;
            cpu.regs.set_index(mode, val);
            Ok(14)
        }
        0xE3 => {
            // EX (SP), IX
            let val = cpu.read16(cpu.regs.sp)?;
            cpu.write16(cpu.regs.sp, cpu.regs.index(mode))?;
            cpu.regs.set_index(mode, val);
            Ok(23)
        }
        0xE5 => {
            // PUSH IX
            cpu.push(cpu.regs.index(mode))?;
            Ok(15)
        }
        0xE9 => {
            // JP (IX)
            cpu.regs.pc = cpu.regs.index(mode);
            Ok(8)
        }
        0xF9 => {
            // LD SP, IX
            cpu.regs.sp = cpu.regs.index(mode);
            Ok(10)
        }
        _ => Err(cpu.invalid_op(&[prefix_byte(mode), opcode])),
    }
}

/// The prefixed LD r,r' block. When either side is the memory operand the
/// other side names a plain register; otherwise H/L mean the index halves.
fn execute_index_ld(cpu: &mut Cpu, mode: IndexMode, opcode: u8) -> Result<u32, CpuError> {
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;

    if y == 6 {
        // LD (IX+d), r
        let addr = fetch_displaced(cpu, mode)?;
        let val = cpu.regs.get8(z);
        cpu.write8(addr, val)?;
        Ok(19)
    } else if z == 6 {
        // LD r, (IX+d)
        let addr = fetch_displaced(cpu, mode)?;
        let val = cpu.read8(addr)?;
        cpu.regs.set8(y, val);
        Ok(19)
    } else {
        let val = get8_half(cpu, mode, z);
        set8_half(cpu, mode, y, val);
        Ok(8)
    }
}

fn execute_index_alu(cpu: &mut Cpu, mode: IndexMode, opcode: u8) -> Result<u32, CpuError> {
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;

    if z == 6 {
        // ALU A, (IX+d)
        let addr = fetch_displaced(cpu, mode)?;
        let val = cpu.read8(addr)?;
        cpu.alu_a(y, val);
        Ok(19)
    } else {
        let val = get8_half(cpu, mode, z);
        cpu.alu_a(y, val);
        Ok(8)
    }
}
