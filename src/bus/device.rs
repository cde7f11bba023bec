//! Byte-addressed devices that back bus regions.

use std::cell::Cell;

/// The byte accessor behind a [`super::Region`]. Offsets are relative to the
/// region's low bound.
///
/// Reads take `&self` so that read-only consumers (the disassembler) stay
/// read-only by construction; a device whose reads have side effects models
/// them with interior mutability.
pub trait Device {
    fn read(&self, offset: u16) -> u8;
    fn write(&mut self, offset: u16, value: u8);
}

/// Plain RAM.
#[derive(Debug, Clone)]
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
        }
    }
}

impl Device for Ram {
    fn read(&self, offset: u16) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, offset: u16, value: u8) {
        if let Some(slot) = self.data.get_mut(offset as usize) {
            *slot = value;
        }
    }
}

/// ROM image. Usually mapped through [`super::Region::read_only`]; writes
/// that do reach it are dropped.
#[derive(Debug, Clone)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
        }
    }
}

impl Device for Rom {
    fn read(&self, offset: u16) -> u8 {
        self.data.get(offset as usize).copied().unwrap_or(0xFF)
    }

    fn write(&mut self, _offset: u16, _value: u8) {}
}

/// Single-byte port latch: reads return the last written value and count
/// accesses, so tests can assert side-effect-exact delivery.
#[derive(Debug, Default)]
pub struct Latch {
    value: Cell<u8>,
    reads: Cell<u32>,
    writes: Cell<u32>,
}

impl Latch {
    pub fn new(value: u8) -> Self {
        Self {
            value: Cell::new(value),
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    pub fn value(&self) -> u8 {
        self.value.get()
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl Device for Latch {
    fn read(&self, _offset: u16) -> u8 {
        self.reads.set(self.reads.get() + 1);
        self.value.get()
    }

    fn write(&mut self, _offset: u16, value: u8) {
        self.writes.set(self.writes.get() + 1);
        self.value.set(value);
    }
}

// A latch is all-Cell, so a shared handle can be mapped into the bus while
// the caller keeps another handle for inspection.
impl Device for std::rc::Rc<Latch> {
    fn read(&self, offset: u16) -> u8 {
        Latch::read(self, offset)
    }

    fn write(&mut self, _offset: u16, value: u8) {
        self.writes.set(self.writes.get() + 1);
        self.value.set(value);
    }
}
