//! Argon80 - An instrumentable Z80 CPU core
//!
//! This library provides an instruction-level Z80 engine, a region-based
//! bus, and a matched disassembler/assembler pair behind a debugger facade.

pub mod asm;
pub mod bus;
pub mod debugger;
pub mod disasm;
pub mod isa;
pub mod z80;

pub use bus::{Bus, BusError, Device, MapError, Region};
pub use debugger::{DebugError, Debugger};
pub use z80::{Cpu, CpuError, Registers};
