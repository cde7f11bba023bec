use crate::bus::{Bus, Ram, Region};
use crate::z80::Cpu;

/// A CPU over 64KB of RAM with `program` loaded at 0, plus a RAM-backed
/// port space so I/O instructions have somewhere to land.
pub fn create_cpu(program: &[u8]) -> Cpu {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut bus = Bus::new();
    bus.map_memory(Region::new(0x0000, 0x1_0000, Box::new(Ram::new(0x1_0000))))
        .unwrap();
    bus.map_io(Region::new(0x00, 0x100, Box::new(Ram::new(0x100))))
        .unwrap();
    bus.load(0, program).unwrap();
    Cpu::new(bus)
}
