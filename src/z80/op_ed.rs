//! 0xED prefix: extended loads, 16-bit carry arithmetic, interrupt-state
//! ops, RRD/RLD and the block transfer/compare/I/O families.
//!
//! Slots with no defined semantics (x=0, x=3 and the unused x=2 rows) fail
//! with `InvalidOpcode` instead of degrading to NOP.

use crate::isa::IndexMode;
use crate::z80::{flags, Cpu, CpuError};

pub(super) fn execute_ed_prefix(cpu: &mut Cpu) -> Result<u32, CpuError> {
    let opcode = cpu.fetch8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = (y >> 1) & 0x03;
    let q = y & 0x01;

    match x {
        1 => dispatch_z!(
            z,
            execute_in_r_c(cpu, y),
            execute_out_c_r(cpu, y),
            execute_sbc_adc_hl(cpu, p, q),
            execute_ld_rp_indirect(cpu, p, q),
            execute_neg(cpu),
            execute_retn_reti(cpu, q),
            execute_im(cpu, y),
            execute_misc(cpu, y, opcode)
        ),
        2 if y >= 4 && z < 4 => dispatch_z!(
            z,
            execute_ldi_ldd(cpu, y),
            execute_cpi_cpd(cpu, y),
            execute_ini_ind(cpu, y),
            execute_outi_outd(cpu, y),
            unreachable!(),
            unreachable!(),
            unreachable!(),
            unreachable!()
        ),
        _ => Err(cpu.invalid_op(&[0xED, opcode])),
    }
}

fn execute_in_r_c(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // IN r, (C); y=6 is the undocumented flags-only form
    let val = cpu.bus.io_read8(cpu.regs.c)?;
    if y != 6 {
        cpu.regs.set8(y, val);
    }
    cpu.regs.set_sz_flags(val);
    cpu.regs.set_parity_flag(val);
    cpu.regs.set_flag(flags::HALF_CARRY, false);
    cpu.regs.set_flag(flags::ADD_SUB, false);
    Ok(12)
}

fn execute_out_c_r(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // OUT (C), r; y=6 is the undocumented OUT (C), 0
    let val = if y == 6 { 0 } else { cpu.regs.get8(y) };
    cpu.bus.io_write8(cpu.regs.c, val)?;
    Ok(12)
}

fn execute_sbc_adc_hl(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    let hl = u32::from(cpu.regs.hl());
    let rp = u32::from(cpu.regs.get16(p, IndexMode::Hl));
    let c = u32::from(cpu.regs.get_flag(flags::CARRY));

    let result = if q == 0 {
        // SBC HL, rp
        let result = hl.wrapping_sub(rp).wrapping_sub(c);
        cpu.regs.set_flag(flags::ADD_SUB, true);
        // Half borrow out of bit 11
        let h_check = (hl & 0xFFF).wrapping_sub(rp & 0xFFF).wrapping_sub(c);
        cpu.regs.set_flag(flags::HALF_CARRY, h_check > 0xFFF);
        let overflow = (hl ^ rp) & (hl ^ result) & 0x8000 != 0;
        cpu.regs.set_flag(flags::PARITY, overflow);
        result
    } else {
        // ADC HL, rp
        let result = hl + rp + c;
        cpu.regs.set_flag(flags::ADD_SUB, false);
        cpu.regs
            .set_flag(flags::HALF_CARRY, (hl & 0xFFF) + (rp & 0xFFF) + c > 0xFFF);
        let overflow = !(hl ^ rp) & (hl ^ result) & 0x8000 != 0;
        cpu.regs.set_flag(flags::PARITY, overflow);
        result
    };

    cpu.regs.set_flag(flags::CARRY, result > 0xFFFF);
    cpu.regs.set_flag(flags::ZERO, result & 0xFFFF == 0);
    cpu.regs.set_flag(flags::SIGN, result & 0x8000 != 0);
    cpu.regs.set_hl(result as u16);
    Ok(15)
}

fn execute_ld_rp_indirect(cpu: &mut Cpu, p: u8, q: u8) -> Result<u32, CpuError> {
    let nn = cpu.fetch16()?;
    if q == 0 {
        // LD (nn), rp
        cpu.write16(nn, cpu.regs.get16(p, IndexMode::Hl))?;
    } else {
        // LD rp, (nn)
        let val = cpu.read16(nn)?;
        cpu.regs.set16(p, IndexMode::Hl, val);
    }
    Ok(20)
}

fn execute_neg(cpu: &mut Cpu) -> Result<u32, CpuError> {
    let a = cpu.regs.a;
    cpu.regs.a = 0;
    cpu.sub_a(a, false, true);
    Ok(8)
}

fn execute_retn_reti(cpu: &mut Cpu, q: u8) -> Result<u32, CpuError> {
    if q == 0 {
        // RETN restores the pre-NMI interrupt enable
        cpu.regs.iff1 = cpu.regs.iff2;
    }
    cpu.regs.pc = cpu.pop()?;
    Ok(14)
}

fn execute_im(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    cpu.regs.im = match y & 0x03 {
        0 | 1 => 0,
        2 => 1,
        _ => 2,
    };
    Ok(8)
}

fn execute_misc(cpu: &mut Cpu, y: u8, opcode: u8) -> Result<u32, CpuError> {
    match y {
        0 => {
            // LD I, A
            cpu.regs.i = cpu.regs.a;
            Ok(9)
        }
        1 => {
            // LD R, A
            cpu.regs.r = cpu.regs.a;
            Ok(9)
        }
        2 => {
            // LD A, I: P/V reflects IFF2
            cpu.regs.a = cpu.regs.i;
            cpu.regs.set_sz_flags(cpu.regs.a);
            let iff2 = cpu.regs.iff2;
            cpu.regs.set_flag(flags::PARITY, iff2);
            cpu.regs.set_flag(flags::HALF_CARRY, false);
            cpu.regs.set_flag(flags::ADD_SUB, false);
            Ok(9)
        }
        3 => {
            // LD A, R
            cpu.regs.a = cpu.regs.r;
            cpu.regs.set_sz_flags(cpu.regs.a);
            let iff2 = cpu.regs.iff2;
            cpu.regs.set_flag(flags::PARITY, iff2);
            cpu.regs.set_flag(flags::HALF_CARRY, false);
            cpu.regs.set_flag(flags::ADD_SUB, false);
            Ok(9)
        }
        4 => {
            // RRD: low nibble of (HL) into A, A's low nibble into the high
            // nibble of (HL)
            let hl = cpu.regs.hl();
            let m = cpu.read8(hl)?;
            let new_m = cpu.regs.a << 4 | m >> 4;
            cpu.regs.a = (cpu.regs.a & 0xF0) | (m & 0x0F);
            cpu.write8(hl, new_m)?;
            cpu.regs.set_sz_flags(cpu.regs.a);
            cpu.regs.set_parity_flag(cpu.regs.a);
            cpu.regs.set_flag(flags::HALF_CARRY, false);
            cpu.regs.set_flag(flags::ADD_SUB, false);
            Ok(18)
        }
        5 => {
            // RLD: the opposite rotation through the same three nibbles
            let hl = cpu.regs.hl();
            let m = cpu.read8(hl)?;
            let new_m = m << 4 | (cpu.regs.a & 0x0F);
            cpu.regs.a = (cpu.regs.a & 0xF0) | m >> 4;
            cpu.write8(hl, new_m)?;
            cpu.regs.set_sz_flags(cpu.regs.a);
            cpu.regs.set_parity_flag(cpu.regs.a);
            cpu.regs.set_flag(flags::HALF_CARRY, false);
            cpu.regs.set_flag(flags::ADD_SUB, false);
            Ok(18)
        }
        _ => Err(cpu.invalid_op(&[0xED, opcode])),
    }
}

// ========== Block families ==========
//
// Each call performs one transfer/compare and steps the implicit counter;
// the repeating forms rewind PC over their own 2-byte encoding while the
// counter says to continue, and advance past themselves at termination.

fn execute_ldi_ldd(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let hl = cpu.regs.hl();
    let de = cpu.regs.de();
    let val = cpu.read8(hl)?;
    cpu.write8(de, val)?;

    let bc = cpu.regs.bc().wrapping_sub(1);
    cpu.regs.set_bc(bc);

    let (new_hl, new_de) = if y & 1 == 0 {
        (hl.wrapping_add(1), de.wrapping_add(1)) // LDI
    } else {
        (hl.wrapping_sub(1), de.wrapping_sub(1)) // LDD
    };
    cpu.regs.set_hl(new_hl);
    cpu.regs.set_de(new_de);

    cpu.regs.set_flag(flags::PARITY, bc != 0);
    cpu.regs.set_flag(flags::HALF_CARRY, false);
    cpu.regs.set_flag(flags::ADD_SUB, false);

    // LDIR/LDDR
    if y >= 6 && bc != 0 {
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
        Ok(21)
    } else {
        Ok(16)
    }
}

fn execute_cpi_cpd(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    let hl = cpu.regs.hl();
    let val = cpu.read8(hl)?;
    let result = cpu.regs.a.wrapping_sub(val);

    let bc = cpu.regs.bc().wrapping_sub(1);
    cpu.regs.set_bc(bc);

    let new_hl = if y & 1 == 0 {
        hl.wrapping_add(1) // CPI
    } else {
        hl.wrapping_sub(1) // CPD
    };
    cpu.regs.set_hl(new_hl);

    let half = (cpu.regs.a & 0x0F) < (val & 0x0F);
    cpu.regs.set_flag(flags::ZERO, result == 0);
    cpu.regs.set_flag(flags::SIGN, result & 0x80 != 0);
    cpu.regs.set_flag(flags::HALF_CARRY, half);
    cpu.regs.set_flag(flags::PARITY, bc != 0);
    cpu.regs.set_flag(flags::ADD_SUB, true);

    // CPIR/CPDR also stop on match
    if y >= 6 && bc != 0 && result != 0 {
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
        Ok(21)
    } else {
        Ok(16)
    }
}

fn execute_ini_ind(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // INI (y=4), IND (y=5), INIR (y=6), INDR (y=7): B is the counter
    let hl = cpu.regs.hl();
    let io_val = cpu.bus.io_read8(cpu.regs.c)?;
    cpu.write8(hl, io_val)?;

    let b = cpu.regs.b.wrapping_sub(1);
    cpu.regs.b = b;

    let new_hl = if y & 1 == 0 {
        hl.wrapping_add(1)
    } else {
        hl.wrapping_sub(1)
    };
    cpu.regs.set_hl(new_hl);

    cpu.regs.set_flag(flags::ZERO, b == 0);
    cpu.regs.set_flag(flags::ADD_SUB, true);

    if y >= 6 && b != 0 {
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
        Ok(21)
    } else {
        Ok(16)
    }
}

fn execute_outi_outd(cpu: &mut Cpu, y: u8) -> Result<u32, CpuError> {
    // OUTI (y=4), OUTD (y=5), OTIR (y=6), OTDR (y=7)
    let hl = cpu.regs.hl();
    let val = cpu.read8(hl)?;
    cpu.bus.io_write8(cpu.regs.c, val)?;

    let b = cpu.regs.b.wrapping_sub(1);
    cpu.regs.b = b;

    let new_hl = if y & 1 == 0 {
        hl.wrapping_add(1)
    } else {
        hl.wrapping_sub(1)
    };
    cpu.regs.set_hl(new_hl);

    cpu.regs.set_flag(flags::ZERO, b == 0);
    cpu.regs.set_flag(flags::ADD_SUB, true);

    if y >= 6 && b != 0 {
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
        Ok(21)
    } else {
        Ok(16)
    }
}
