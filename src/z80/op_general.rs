//! Base-table (unprefixed) instruction execution, split by the `x` field.

use crate::isa::IndexMode;
use crate::z80::{flags, op_cb, op_ed, op_index, Cpu, CpuError};

/// x=0: relative jumps, 16-bit loads/arithmetic, indirect loads, INC/DEC,
/// immediates and the accumulator/flag one-byte ops.
pub(super) fn execute_x0(cpu: &mut Cpu, y: u8, z: u8, p: u8, q: u8) -> Result<u32, CpuError> {
    dispatch_z!(
        z,
        execute_x0_control(cpu, y),
        execute_x0_ld_add_rp(cpu, p, q),
        execute_x0_indirect(cpu, p, q),
        execute_x0_inc_dec_rp(cpu, p, q),
        execute_x0_inc_r(cpu, y),
        execute_x0_dec_r(cpu, y),
        execute_x0_ld_r_n(cpu, y),
        execute_x0_accum_flags(cpu, y)
    )
}

fn execute_x0_control(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    match y {
        0 => Ok(4), // NOP
        1 => {
            // EX AF, AF'
            cpu.regs.exchange_af();
            Ok(4)
        }
        2 => {
            // DJNZ d: taken → PC := (address after the 2-byte op) + d
            let d = cpu.fetch8()? as i8;
            cpu.regs.b = cpu.regs.b.wrapping_sub(1);
            if cpu.regs.b != 0 {
                cpu.regs.pc = cpu.regs.pc.wrapping_add(d as u16);
                Ok(13)
            } else {
                Ok(8)
            }
        }
        3 => {
            // JR d
            let d = cpu.fetch8()? as i8;
            cpu.regs.pc = cpu.regs.pc.wrapping_add(d as u16);
            Ok(12)
        }
        _ => {
            // JR cc, d (cc limited to NZ/Z/NC/C)
            let d = cpu.fetch8()? as i8;
            if cpu.regs.condition(y - 4) {
                cpu.regs.pc = cpu.regs.pc.wrapping_add(d as u16);
                Ok(12)
            } else {
                Ok(7)
            }
        }
    }
}

fn execute_x0_ld_add_rp(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    if q == 0 {
        // LD rp, nn
        let nn = cpu.fetch16()?;
        cpu.regs.set16(p, IndexMode::Hl, nn);
        Ok(10)
    } else {
        // ADD HL, rp
        let rp = cpu.regs.get16(p, IndexMode::Hl);
        cpu.add16(IndexMode::Hl, rp);
        Ok(11)
    }
}

fn execute_x0_indirect(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    match (p, q) {
        (0, 0) => {
            // LD (BC), A
            cpu.write8(cpu.regs.bc(), cpu.regs.a)?;
            Ok(7)
        }
        (0, _) => {
            // LD A, (BC)
            cpu.regs.a = cpu.read8(cpu.regs.bc())?;
            Ok(7)
        }
        (1, 0) => {
            // LD (DE), A
            cpu.write8(cpu.regs.de(), cpu.regs.a)?;
            Ok(7)
        }
        (1, _) => {
            // LD A, (DE)
            cpu.regs.a = cpu.read8(cpu.regs.de())?;
            Ok(7)
        }
        (2, 0) => {
            // LD (nn), HL
            let addr = cpu.fetch16()?;
            cpu.write16(addr, cpu.regs.hl())?;
            Ok(16)
        }
        (2, _) => {
            // LD HL, (nn)
            let addr = cpu.fetch16()?;
            let val = cpu.read16(addr)?;
            cpu.regs.set_hl(val);
            Ok(16)
        }
        (_, 0) => {
            // LD (nn), A
            let addr = cpu.fetch16()?;
            cpu.write8(addr, cpu.regs.a)?;
            Ok(13)
        }
        _ => {
            // LD A, (nn)
            let addr = cpu.fetch16()?;
            cpu.regs.a = cpu.read8(addr)?;
            Ok(13)
        }
    }
}

fn execute_x0_inc_dec_rp(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    // INC/DEC rp: no flags touched
    let rp = cpu.regs.get16(p, IndexMode::Hl);
    let result = if q == 0 {
        rp.wrapping_add(1)
    } else {
        rp.wrapping_sub(1)
    };
    cpu.regs.set16(p, IndexMode::Hl, result);
    Ok(6)
}

fn execute_x0_inc_r(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let val = cpu.get_reg(y)?;
    let result = cpu.inc8(val);
    cpu.set_reg(y, result)?;
    Ok(if y == 6 { 11 } else { 4 })
}

fn execute_x0_dec_r(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let val = cpu.get_reg(y)?;
    let result = cpu.dec8(val);
    cpu.set_reg(y, result)?;
    Ok(if y == 6 { 11 } else { 4 })
}

fn execute_x0_ld_r_n(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let n = cpu.fetch8()?;
    cpu.set_reg(y, n)?;
    Ok(if y == 6 { 10 } else { 7 })
}

fn execute_x0_accum_flags(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    match y {
        0 => cpu.rlca(),
        1 => cpu.rrca(),
        2 => cpu.rla(),
        3 => cpu.rra(),
        4 => cpu.daa(),
        5 => {
            // CPL
            cpu.regs.a = !cpu.regs.a;
            cpu.regs.set_flag(flags::HALF_CARRY, true);
            cpu.regs.set_flag(flags::ADD_SUB, true);
        }
        6 => {
            // SCF
            cpu.regs.set_flag(flags::CARRY, true);
            cpu.regs.set_flag(flags::HALF_CARRY, false);
            cpu.regs.set_flag(flags::ADD_SUB, false);
        }
        _ => {
            // CCF
            let c = cpu.regs.get_flag(flags::CARRY);
            cpu.regs.set_flag(flags::HALF_CARRY, c);
            cpu.regs.set_flag(flags::CARRY, !c);
            cpu.regs.set_flag(flags::ADD_SUB, false);
        }
    }
    Ok(4)
}

/// x=1: the LD r,r' block, with HALT in the (HL),(HL) slot.
pub(super) fn execute_x1(cpu: &mut Cpu, y: u8, z: u8) -> Result<u32, CpuError> {
    if y == 6 && z == 6 {
        cpu.regs.halted = true;
        Ok(4)
    } else {
        let val = cpu.get_reg(z)?;
        cpu.set_reg(y, val)?;
        Ok(if y == 6 || z == 6 { 7 } else { 4 })
    }
}

/// x=2: 8-bit ALU over the register field.
pub(super) fn execute_x2(cpu: &mut Cpu, y: u8, z: u8) -> Result<u32, CpuError> {
    let val = cpu.get_reg(z)?;
    cpu.alu_a(y, val);
    Ok(if z == 6 { 7 } else { 4 })
}

/// x=3: conditional flow, stack ops, I/O, exchanges and the prefix escapes.
pub(super) fn execute_x3(cpu: &mut Cpu, y: u8, z: u8, p: u8, q: u8) -> Result<u32, CpuError> {
    dispatch_z!(
        z,
        execute_x3_ret_cc(cpu, y),
        execute_x3_pop_misc(cpu, p, q),
        execute_x3_jp_cc(cpu, y),
        execute_x3_jp_io_ex(cpu, y),
        execute_x3_call_cc(cpu, y),
        execute_x3_push_call_prefix(cpu, p, q),
        execute_x3_alu_n(cpu, y),
        execute_x3_rst(cpu, y)
    )
}

fn execute_x3_ret_cc(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // RET cc: false → fall through past the single byte, true → pop PC
    if cpu.regs.condition(y) {
        cpu.regs.pc = cpu.pop()?;
        Ok(11)
    } else {
        Ok(5)
    }
}

fn execute_x3_pop_misc(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    if q == 0 {
        // POP rp2
        let val = cpu.pop()?;
        cpu.regs.set16_af(p, IndexMode::Hl, val);
        return Ok(10);
    }
    match p {
        0 => {
            // RET
            cpu.regs.pc = cpu.pop()?;
            Ok(10)
        }
        1 => {
            // EXX
            cpu.regs.exchange_banks();
            Ok(4)
        }
        2 => {
            // JP (HL)
            cpu.regs.pc = cpu.regs.hl();
            Ok(4)
        }
        _ => {
            // LD SP, HL
            cpu.regs.sp = cpu.regs.hl();
            Ok(6)
        }
    }
}

fn execute_x3_jp_cc(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // JP cc, nn: fetching the target advances PC past the 3-byte encoding,
    // so the not-taken case needs no correction.
    let nn = cpu.fetch16()?;
    if cpu.regs.condition(y) {
        cpu.regs.pc = nn;
    }
    Ok(10)
}

fn execute_x3_jp_io_ex(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    match y {
        0 => {
            // JP nn
            cpu.regs.pc = cpu.fetch16()?;
            Ok(10)
        }
        1 => op_cb::execute_cb_prefix(cpu),
        2 => {
            // OUT (n), A
            let port = cpu.fetch8()?;
            cpu.bus.io_write8(port, cpu.regs.a)?;
            Ok(11)
        }
        3 => {
            // IN A, (n)
            let port = cpu.fetch8()?;
            cpu.regs.a = cpu.bus.io_read8(port)?;
            Ok(11)
        }
        4 => {
            // EX (SP), HL
            let val = cpu.read16(cpu.regs.sp)?;
            cpu.write16(cpu.regs.sp, cpu.regs.hl())?;
            cpu.regs.set_hl(val);
            Ok(19)
        }
        5 => {
            // EX DE, HL
            let de = cpu.regs.de();
            let hl = cpu.regs.hl();
            cpu.regs.set_de(hl);
            cpu.regs.set_hl(de);
            Ok(4)
        }
        6 => {
            // DI
            cpu.regs.iff1 = false;
            cpu.regs.iff2 = false;
            Ok(4)
        }
        _ => {
            // EI
            cpu.regs.iff1 = true;
            cpu.regs.iff2 = true;
            Ok(4)
        }
    }
}

fn execute_x3_call_cc(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // CALL cc, nn: false → +3 via the fetch, true → push return, jump
    let nn = cpu.fetch16()?;
    if cpu.regs.condition(y) {
        cpu.push(cpu.regs.pc)?;
        cpu.regs.pc = nn;
        Ok(17)
    } else {
        Ok(10)
    }
}

fn execute_x3_push_call_prefix(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    if q == 0 {
        // PUSH rp2
        let val = cpu.regs.get16_af(p, IndexMode::Hl);
        cpu.push(val)?;
        return Ok(11);
    }
    match p {
        0 => {
            // CALL nn
            let nn = cpu.fetch16()?;
            cpu.push(cpu.regs.pc)?;
            cpu.regs.pc = nn;
            Ok(17)
        }
        1 => op_index::execute_index_prefix(cpu, IndexMode::Ix),
        2 => op_ed::execute_ed_prefix(cpu),
        _ => op_index::execute_index_prefix(cpu, IndexMode::Iy),
    }
}

fn execute_x3_alu_n(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let n = cpu.fetch8()?;
    cpu.alu_a(y, n);
    Ok(7)
}

fn execute_x3_rst(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    cpu.push(cpu.regs.pc)?;
    cpu.regs.pc = u16::from(y) * 8;
    Ok(11)
}
