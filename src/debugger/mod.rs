//! Debugger facade over one CPU instance.
//!
//! Owns the `Cpu` by composition and exposes name-based register access,
//! delegated disassembly/assembly and single-stepping, so a front end never
//! touches engine internals directly.

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::asm::{self, SyntaxError};
use crate::disasm::{self, Disassembly};
use crate::z80::{Cpu, CpuError};


/// A component whose state can be snapshotted and restored as JSON.
pub trait Debuggable {
    fn read_state(&self) -> Value;

    fn write_state(&mut self, state: &Value);
}

/// Failure of a name-based register access. Distinct from `CpuError`: these
/// are driver mistakes, not emulated-machine faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebugError {
    #[error("unknown register `{0}`")]
    UnknownRegister(String),

    #[error("{value:#x} does not fit in {name} ({bits} bits)")]
    ValueOutOfRange { name: String, value: u32, bits: u8 },
}

/// Registers addressable by name, with their widths in bits.
const REGISTERS: &[(&str, u8)] = &[
    ("A", 8),
    ("F", 8),
    ("B", 8),
    ("C", 8),
    ("D", 8),
    ("E", 8),
    ("H", 8),
    ("L", 8),
    ("A'", 8),
    ("F'", 8),
    ("B'", 8),
    ("C'", 8),
    ("D'", 8),
    ("E'", 8),
    ("H'", 8),
    ("L'", 8),
    ("I", 8),
    ("R", 8),
    ("AF", 16),
    ("BC", 16),
    ("DE", 16),
    ("HL", 16),
    ("IX", 16),
    ("IY", 16),
    ("SP", 16),
    ("PC", 16),
];

pub struct Debugger {
    cpu: Cpu,
}

impl Debugger {
    pub fn new(cpu: Cpu) -> Self {
        Self { cpu }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Every register name `register_value` understands.
    pub fn register_names(&self) -> Vec<&'static str> {
        REGISTERS.iter().map(|&(name, _)| name).collect()
    }

    /// Width of the named register in bits.
    pub fn register_size(&self, name: &str) -> Result<u8, DebugError> {
        let upper = name.to_ascii_uppercase();
        REGISTERS
            .iter()
            .find(|&&(n, _)| n == upper)
            .map(|&(_, bits)| bits)
            .ok_or(DebugError::UnknownRegister(upper))
    }

    pub fn register_value(&self, name: &str) -> Result<u32, DebugError> {
        let regs = &self.cpu.regs;
        let value = match name.to_ascii_uppercase().as_str() {
            "A" => u32::from(regs.a),
            "F" => u32::from(regs.f),
            "B" => u32::from(regs.b),
            "C" => u32::from(regs.c),
            "D" => u32::from(regs.d),
            "E" => u32::from(regs.e),
            "H" => u32::from(regs.h),
            "L" => u32::from(regs.l),
            "A'" => u32::from(regs.a_prime),
            "F'" => u32::from(regs.f_prime),
            "B'" => u32::from(regs.b_prime),
            "C'" => u32::from(regs.c_prime),
            "D'" => u32::from(regs.d_prime),
            "E'" => u32::from(regs.e_prime),
            "H'" => u32::from(regs.h_prime),
            "L'" => u32::from(regs.l_prime),
            "I" => u32::from(regs.i),
            "R" => u32::from(regs.r),
            "AF" => u32::from(regs.af()),
            "BC" => u32::from(regs.bc()),
            "DE" => u32::from(regs.de()),
            "HL" => u32::from(regs.hl()),
            "IX" => u32::from(regs.ix),
            "IY" => u32::from(regs.iy),
            "SP" => u32::from(regs.sp),
            "PC" => u32::from(regs.pc),
            other => return Err(DebugError::UnknownRegister(other.into())),
        };
        Ok(value)
    }

    pub fn set_register_value(&mut self, name: &str, value: u32) -> Result<(), DebugError> {
        let upper = name.to_ascii_uppercase();
        let bits = self.register_size(&upper)?;
        let max = if bits == 8 { 0xFF } else { 0xFFFF };
        if value > max {
            return Err(DebugError::ValueOutOfRange {
                name: upper,
                value,
                bits,
            });
        }

        let regs = &mut self.cpu.regs;
        let v8 = value as u8;
        let v16 = value as u16;
        match upper.as_str() {
            "A" => regs.a = v8,
            "F" => regs.f = v8,
            "B" => regs.b = v8,
            "C" => regs.c = v8,
            "D" => regs.d = v8,
            "E" => regs.e = v8,
            "H" => regs.h = v8,
            "L" => regs.l = v8,
            "A'" => regs.a_prime = v8,
            "F'" => regs.f_prime = v8,
            "B'" => regs.b_prime = v8,
            "C'" => regs.c_prime = v8,
            "D'" => regs.d_prime = v8,
            "E'" => regs.e_prime = v8,
            "H'" => regs.h_prime = v8,
            "L'" => regs.l_prime = v8,
            "I" => regs.i = v8,
            "R" => regs.r = v8,
            "AF" => regs.set_af(v16),
            "BC" => regs.set_bc(v16),
            "DE" => regs.set_de(v16),
            "HL" => regs.set_hl(v16),
            "IX" => regs.ix = v16,
            "IY" => regs.iy = v16,
            "SP" => regs.sp = v16,
            "PC" => regs.pc = v16,
            _ => unreachable!("register_size validated the name"),
        }
        Ok(())
    }

    /// Disassemble the instruction at `addr`: its text and encoded length.
    pub fn code_and_length(&self, addr: u16) -> Result<Disassembly, CpuError> {
        disasm::disassemble(&self.cpu.bus, addr)
    }

    /// Assemble one line of text into its encoding.
    pub fn translate(&self, line: &str) -> Result<Vec<u8>, SyntaxError> {
        asm::assemble(line)
    }

    /// Execute one instruction at PC.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        self.cpu.step()
    }
}

impl Debuggable for Debugger {
    fn read_state(&self) -> Value {
        serde_json::to_value(&self.cpu.regs).unwrap()
    }

    fn write_state(&mut self, state: &Value) {
        match serde_json::from_value(state.clone()) {
            Ok(regs) => self.cpu.regs = regs,
            Err(e) => warn!("Failed to restore register state: {e}"),
        }
    }
}
