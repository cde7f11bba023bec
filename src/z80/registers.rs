//! The CPU-visible register file: main bank, shadow bank, index registers,
//! stack/program counters, flag byte and interrupt state.

use serde::{Deserialize, Serialize};

use crate::isa::IndexMode;

/// Flag bits in the F register.
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001; // C
    pub const ADD_SUB: u8 = 0b0000_0010; // N
    pub const PARITY: u8 = 0b0000_0100; // P/V - parity or overflow
    pub const HALF_CARRY: u8 = 0b0001_0000; // H
    pub const ZERO: u8 = 0b0100_0000; // Z
    pub const SIGN: u8 = 0b1000_0000; // S
}

/// Full register state of one CPU instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registers {
    // Main bank
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Shadow bank
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    pub sp: u16,
    pub pc: u16,

    // Interrupt vector base and memory refresh
    pub i: u8,
    pub r: u8,

    // Interrupt flip-flops and mode (0, 1 or 2)
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,

    pub halted: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_prime: 0,
            f_prime: 0,
            b_prime: 0,
            c_prime: 0,
            d_prime: 0,
            e_prime: 0,
            h_prime: 0,
            l_prime: 0,
            ix: 0,
            iy: 0,
            sp: 0xFFFF,
            pc: 0,
            i: 0,
            r: 0,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
        }
    }

    /// Reset to power-on state. The general banks keep their contents, as
    /// on hardware.
    pub fn reset(&mut self) {
        self.a = 0xFF;
        self.f = 0xFF;
        self.pc = 0;
        self.sp = 0xFFFF;
        self.i = 0;
        self.r = 0;
        self.iff1 = false;
        self.iff2 = false;
        self.im = 0;
        self.halted = false;
    }

    // ========== Pair views ==========

    pub fn af(&self) -> u16 {
        u16::from(self.a) << 8 | u16::from(self.f)
    }

    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.f = val as u8;
    }

    pub fn bc(&self) -> u16 {
        u16::from(self.b) << 8 | u16::from(self.c)
    }

    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn de(&self) -> u16 {
        u16::from(self.d) << 8 | u16::from(self.e)
    }

    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn hl(&self) -> u16 {
        u16::from(self.h) << 8 | u16::from(self.l)
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }

    pub fn ixh(&self) -> u8 {
        (self.ix >> 8) as u8
    }

    pub fn ixl(&self) -> u8 {
        self.ix as u8
    }

    pub fn set_ixh(&mut self, val: u8) {
        self.ix = (self.ix & 0x00FF) | u16::from(val) << 8;
    }

    pub fn set_ixl(&mut self, val: u8) {
        self.ix = (self.ix & 0xFF00) | u16::from(val);
    }

    pub fn iyh(&self) -> u8 {
        (self.iy >> 8) as u8
    }

    pub fn iyl(&self) -> u8 {
        self.iy as u8
    }

    pub fn set_iyh(&mut self, val: u8) {
        self.iy = (self.iy & 0x00FF) | u16::from(val) << 8;
    }

    pub fn set_iyl(&mut self, val: u8) {
        self.iy = (self.iy & 0xFF00) | u16::from(val);
    }

    // ========== Code-indexed access ==========

    /// Read the 8-bit register with `r`-field code `code`. Code 6 is the
    /// memory operand and is the caller's job to resolve through the bus.
    pub fn get8(&self, code: u8) -> u8 {
        match code & 0x07 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("register code 6 is the memory operand"),
        }
    }

    pub fn set8(&mut self, code: u8, value: u8) {
        match code & 0x07 {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            7 => self.a = value,
            _ => unreachable!("register code 6 is the memory operand"),
        }
    }

    /// Read the `rp`-field pair, with HL substituted by IX/IY under an
    /// index prefix.
    pub fn get16(&self, code: u8, mode: IndexMode) -> u16 {
        match code & 0x03 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.index(mode),
            _ => self.sp,
        }
    }

    pub fn set16(&mut self, code: u8, mode: IndexMode, value: u16) {
        match code & 0x03 {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_index(mode, value),
            _ => self.sp = value,
        }
    }

    /// Read the `rp2`-field pair (the PUSH/POP table: AF instead of SP).
    pub fn get16_af(&self, code: u8, mode: IndexMode) -> u16 {
        match code & 0x03 {
            3 => self.af(),
            c => self.get16(c, mode),
        }
    }

    pub fn set16_af(&mut self, code: u8, mode: IndexMode, value: u16) {
        match code & 0x03 {
            3 => self.set_af(value),
            c => self.set16(c, mode, value),
        }
    }

    /// The 16-bit register selected by `mode` itself: HL, IX or IY.
    pub fn index(&self, mode: IndexMode) -> u16 {
        match mode {
            IndexMode::Hl => self.hl(),
            IndexMode::Ix => self.ix,
            IndexMode::Iy => self.iy,
        }
    }

    pub fn set_index(&mut self, mode: IndexMode, value: u16) {
        match mode {
            IndexMode::Hl => self.set_hl(value),
            IndexMode::Ix => self.ix = value,
            IndexMode::Iy => self.iy = value,
        }
    }

    // ========== Flags ==========

    pub fn get_flag(&self, flag: u8) -> bool {
        (self.f & flag) != 0
    }

    pub fn set_flag(&mut self, flag: u8, value: bool) {
        if value {
            self.f |= flag;
        } else {
            self.f &= !flag;
        }
    }

    pub fn set_sz_flags(&mut self, value: u8) {
        self.set_flag(flags::ZERO, value == 0);
        self.set_flag(flags::SIGN, (value & 0x80) != 0);
    }

    pub fn set_parity_flag(&mut self, value: u8) {
        self.set_flag(flags::PARITY, crate::isa::parity(value));
    }

    /// Evaluate the `cc` condition field against the flag byte.
    pub fn condition(&self, cc: u8) -> bool {
        match cc & 0x07 {
            0 => !self.get_flag(flags::ZERO),   // NZ
            1 => self.get_flag(flags::ZERO),    // Z
            2 => !self.get_flag(flags::CARRY),  // NC
            3 => self.get_flag(flags::CARRY),   // C
            4 => !self.get_flag(flags::PARITY), // PO
            5 => self.get_flag(flags::PARITY),  // PE
            6 => !self.get_flag(flags::SIGN),   // P
            _ => self.get_flag(flags::SIGN),    // M
        }
    }

    // ========== Shadow exchange ==========
    //
    // Two independent operations, never combined: EX AF,AF' touches only
    // the accumulator/flag pair, EXX swaps the six general registers.

    pub fn exchange_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
    }

    pub fn exchange_banks(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
    }

    /// Bump the memory-refresh counter, preserving bit 7.
    pub fn refresh(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }
}
