//! Address-range-bound bus with ordered memory and I/O region lists.
//!
//! The CPU sees two independent address spaces: a 64KB memory space and a
//! 256-port I/O space. Each space is an ordered list of non-overlapping
//! regions; an access is handled by the first (and, by construction, only)
//! region whose range contains the address. Resolution returns an internal
//! `Option`; `BusError` is reserved for genuine failures and never drives
//! region fallback.

use log::debug;
use thiserror::Error;

pub mod device;

pub use device::{Device, Latch, Ram, Rom};


/// Failure raised by a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// No region covers the address.
    #[error("unmapped address {addr:#06x}")]
    Unmapped { addr: u16 },

    /// The region covering the address is not readable.
    #[error("address {addr:#06x} is not readable")]
    NotReadable { addr: u16 },

    /// The region covering the address is not writable.
    #[error("address {addr:#06x} is not writable")]
    NotWritable { addr: u16 },

    /// The region covering the address does not support the access width.
    #[error("unsupported {width}-bit access at {addr:#06x}")]
    UnsupportedWidth { addr: u16, width: u8 },
}

/// Failure raised while registering a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// The new region's range intersects an already-registered region.
    #[error("region [{low:#06x}, {high:#06x}) overlaps an existing region")]
    Overlap { low: u16, high: u32 },

    /// The region's range is empty.
    #[error("region [{low:#06x}, {high:#06x}) is empty")]
    EmptyRange { low: u16, high: u32 },
}

/// One mapped address range and the device behind it.
pub struct Region {
    /// Inclusive low bound.
    low: u16,
    /// Exclusive high bound; `u32` so `[0, 0x10000)` covers the full space.
    high: u32,
    readable: bool,
    writable: bool,
    little_endian: bool,
    bit_size: u8,
    device: Box<dyn Device>,
}

impl Region {
    /// A readable+writable 8-bit little-endian region over `device`.
    pub fn new(low: u16, high: u32, device: Box<dyn Device>) -> Self {
        Self {
            low,
            high,
            readable: true,
            writable: true,
            little_endian: true,
            bit_size: 8,
            device,
        }
    }

    /// Same range and device, but rejecting writes.
    pub fn read_only(low: u16, high: u32, device: Box<dyn Device>) -> Self {
        Self {
            writable: false,
            ..Self::new(low, high, device)
        }
    }

    /// Same range and device, but rejecting reads.
    pub fn write_only(low: u16, high: u32, device: Box<dyn Device>) -> Self {
        Self {
            readable: false,
            ..Self::new(low, high, device)
        }
    }

    pub fn low(&self) -> u16 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    pub fn is_readable(&self) -> bool {
        self.readable
    }

    pub fn is_writeable(&self) -> bool {
        self.writable
    }

    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    pub fn bit_size(&self) -> u8 {
        self.bit_size
    }

    fn contains(&self, addr: u16) -> bool {
        addr >= self.low && (addr as u32) < self.high
    }

    fn overlaps(&self, low: u16, high: u32) -> bool {
        (low as u32) < self.high && (self.low as u32) < high
    }

    /// Read `width` bits at `addr`. Only 8-bit accesses reach the device;
    /// the bus decomposes wider memory accesses before calling this.
    pub fn read_n(&self, addr: u16, width: u8) -> Result<u8, BusError> {
        if !self.readable {
            return Err(BusError::NotReadable { addr });
        }
        if width != self.bit_size {
            return Err(BusError::UnsupportedWidth { addr, width });
        }
        Ok(self.device.read(addr - self.low))
    }

    /// Write `width` bits at `addr`.
    pub fn write_n(&mut self, addr: u16, value: u8, width: u8) -> Result<(), BusError> {
        if !self.writable {
            return Err(BusError::NotWritable { addr });
        }
        if width != self.bit_size {
            return Err(BusError::UnsupportedWidth { addr, width });
        }
        self.device.write(addr - self.low, value);
        Ok(())
    }

    pub fn read8(&self, addr: u16) -> Result<u8, BusError> {
        self.read_n(addr, 8)
    }

    pub fn write8(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        self.write_n(addr, value, 8)
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("low", &self.low)
            .field("high", &self.high)
            .field("readable", &self.readable)
            .field("writable", &self.writable)
            .finish()
    }
}

/// The CPU-facing bus: ordered memory regions plus ordered I/O regions.
#[derive(Debug, Default)]
pub struct Bus {
    memory: Vec<Region>,
    io: Vec<Region>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a memory region. Overlap with an existing memory region is
    /// rejected so that address resolution can match at most one region.
    pub fn map_memory(&mut self, region: Region) -> Result<(), MapError> {
        Self::map(&mut self.memory, region, "memory")
    }

    /// Register an I/O region over the 8-bit port space.
    pub fn map_io(&mut self, region: Region) -> Result<(), MapError> {
        Self::map(&mut self.io, region, "io")
    }

    fn map(list: &mut Vec<Region>, region: Region, space: &str) -> Result<(), MapError> {
        if region.high <= region.low as u32 {
            return Err(MapError::EmptyRange {
                low: region.low,
                high: region.high,
            });
        }
        if let Some(existing) = list.iter().find(|r| r.overlaps(region.low, region.high)) {
            return Err(MapError::Overlap {
                low: existing.low,
                high: existing.high,
            });
        }
        debug!(
            "mapped {} region [{:#06x}, {:#07x})",
            space, region.low, region.high
        );
        list.push(region);
        Ok(())
    }

    /// Internal lookup: `None` means "no region", which only the access
    /// layer turns into `BusError::Unmapped`.
    fn resolve(list: &[Region], addr: u16) -> Option<usize> {
        list.iter().position(|r| r.contains(addr))
    }

    pub fn read8(&self, addr: u16) -> Result<u8, BusError> {
        match Self::resolve(&self.memory, addr) {
            Some(i) => self.memory[i].read8(addr),
            None => Err(BusError::Unmapped { addr }),
        }
    }

    pub fn write8(&mut self, addr: u16, value: u8) -> Result<(), BusError> {
        match Self::resolve(&self.memory, addr) {
            Some(i) => self.memory[i].write8(addr, value),
            None => Err(BusError::Unmapped { addr }),
        }
    }

    /// 16-bit read: two 8-bit accesses, low byte first. Not atomic; the two
    /// halves may resolve to different regions.
    pub fn read16(&self, addr: u16) -> Result<u16, BusError> {
        let low = self.read8(addr)?;
        let high = self.read8(addr.wrapping_add(1))?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    /// 16-bit write: low byte first.
    pub fn write16(&mut self, addr: u16, value: u16) -> Result<(), BusError> {
        self.write8(addr, value as u8)?;
        self.write8(addr.wrapping_add(1), (value >> 8) as u8)
    }

    pub fn io_read8(&self, port: u8) -> Result<u8, BusError> {
        let addr = u16::from(port);
        match Self::resolve(&self.io, addr) {
            Some(i) => self.io[i].read8(addr),
            None => Err(BusError::Unmapped { addr }),
        }
    }

    pub fn io_write8(&mut self, port: u8, value: u8) -> Result<(), BusError> {
        let addr = u16::from(port);
        match Self::resolve(&self.io, addr) {
            Some(i) => self.io[i].write8(addr, value),
            None => Err(BusError::Unmapped { addr }),
        }
    }

    /// The I/O path only carries 8-bit transfers; wider widths fail before
    /// any region is consulted, distinctly from "unmapped".
    pub fn io_read16(&self, port: u8) -> Result<u16, BusError> {
        Err(BusError::UnsupportedWidth {
            addr: u16::from(port),
            width: 16,
        })
    }

    pub fn io_write16(&mut self, port: u8, _value: u16) -> Result<(), BusError> {
        Err(BusError::UnsupportedWidth {
            addr: u16::from(port),
            width: 16,
        })
    }

    /// Convenience used by tests and loaders: copy `bytes` into whatever
    /// regions cover `[addr, addr + bytes.len())`.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) -> Result<(), BusError> {
        for (i, &b) in bytes.iter().enumerate() {
            self.write8(addr.wrapping_add(i as u16), b)?;
        }
        Ok(())
    }
}
