//! Instruction disassembler.
//!
//! Mirrors the engine's dispatch exactly: the same x/y/z decomposition, the
//! same four prefix escapes and the same invalid set. The reported length is
//! the encoded length, which for conditional flow equals the byte count the
//! engine consumes on the not-taken path. All reads go through `&Bus`, so
//! disassembly cannot disturb device state.

use crate::bus::{Bus, BusError};
use crate::isa::{self, IndexMode, ALU_NAMES, COND_NAMES, PAIR2_NAMES, PAIR_NAMES, ROT_NAMES};
use crate::z80::CpuError;


/// One decoded instruction: canonical text plus encoded length in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub text: String,
    pub len: u16,
}

/// Decode the instruction at `addr`.
pub fn disassemble(bus: &Bus, addr: u16) -> Result<Disassembly, CpuError> {
    let mut cursor = Cursor::new(bus, addr);
    let text = decode(&mut cursor)?;
    Ok(Disassembly {
        text,
        len: cursor.len(),
    })
}

/// Read-only walk over the instruction bytes, remembering what was read so
/// invalid encodings can report themselves.
struct Cursor<'a> {
    bus: &'a Bus,
    addr: u16,
    bytes: Vec<u8>,
}

impl<'a> Cursor<'a> {
    fn new(bus: &'a Bus, addr: u16) -> Self {
        Self {
            bus,
            addr,
            bytes: Vec::with_capacity(4),
        }
    }

    fn next8(&mut self) -> Result<u8, BusError> {
        let byte = self
            .bus
            .read8(self.addr.wrapping_add(self.bytes.len() as u16))?;
        self.bytes.push(byte);
        Ok(byte)
    }

    fn next16(&mut self) -> Result<u16, BusError> {
        let low = self.next8()?;
        let high = self.next8()?;
        Ok(u16::from(high) << 8 | u16::from(low))
    }

    fn len(&self) -> u16 {
        self.bytes.len() as u16
    }

    fn invalid(&self) -> CpuError {
        CpuError::InvalidOpcode {
            addr: self.addr,
            bytes: self.bytes.clone(),
        }
    }
}

fn hex8(n: u8) -> String {
    format!("0x{n:02X}")
}

fn hex16(n: u16) -> String {
    format!("0x{n:04X}")
}

/// The ALU family keeps the accumulator operand explicit for ADD/ADC/SBC
/// and implicit for the rest, as assemblers conventionally write it.
fn alu_text(y: u8, operand: &str) -> String {
    match y & 0x07 {
        0 | 1 | 3 => format!("{} A, {}", ALU_NAMES[(y & 0x07) as usize], operand),
        _ => format!("{} {}", ALU_NAMES[(y & 0x07) as usize], operand),
    }
}

/// `(IX+d)` / `(IX-d)` with a signed decimal displacement.
fn displaced(mode: IndexMode, d: i8) -> String {
    let v = i16::from(d);
    if v < 0 {
        format!("({}-{})", mode.pair_name(), -v)
    } else {
        format!("({}+{})", mode.pair_name(), v)
    }
}

fn decode(c: &mut Cursor) -> Result<String, CpuError> {
    let opcode = c.next8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = (y >> 1) & 0x03;
    let q = y & 0x01;

    match x {
        0 => decode_x0(c, y, z, p, q),
        1 => {
            if y == 6 && z == 6 {
                Ok("HALT".into())
            } else {
                Ok(format!(
                    "LD {}, {}",
                    isa::reg8_name(y, IndexMode::Hl),
                    isa::reg8_name(z, IndexMode::Hl)
                ))
            }
        }
        2 => Ok(alu_text(y, isa::reg8_name(z, IndexMode::Hl))),
        _ => decode_x3(c, y, z, p, q),
    }
}

fn decode_x0(c: &mut Cursor, y: u8, z: u8, p: u8, q: u8) -> Result<String, CpuError> {
    let text = match z {
        0 => match y {
            0 => "NOP".into(),
            1 => "EX AF, AF'".into(),
            2 => format!("DJNZ {}", c.next8()? as i8),
            3 => format!("JR {}", c.next8()? as i8),
            _ => format!("JR {}, {}", COND_NAMES[(y - 4) as usize], c.next8()? as i8),
        },
        1 => {
            if q == 0 {
                format!("LD {}, {}", PAIR_NAMES[p as usize], hex16(c.next16()?))
            } else {
                format!("ADD HL, {}", PAIR_NAMES[p as usize])
            }
        }
        2 => match (p, q) {
            (0, 0) => "LD (BC), A".into(),
            (0, _) => "LD A, (BC)".into(),
            (1, 0) => "LD (DE), A".into(),
            (1, _) => "LD A, (DE)".into(),
            (2, 0) => format!("LD ({}), HL", hex16(c.next16()?)),
            (2, _) => format!("LD HL, ({})", hex16(c.next16()?)),
            (_, 0) => format!("LD ({}), A", hex16(c.next16()?)),
            _ => format!("LD A, ({})", hex16(c.next16()?)),
        },
        3 => {
            if q == 0 {
                format!("INC {}", PAIR_NAMES[p as usize])
            } else {
                format!("DEC {}", PAIR_NAMES[p as usize])
            }
        }
        4 => format!("INC {}", isa::reg8_name(y, IndexMode::Hl)),
        5 => format!("DEC {}", isa::reg8_name(y, IndexMode::Hl)),
        6 => format!(
            "LD {}, {}",
            isa::reg8_name(y, IndexMode::Hl),
            hex8(c.next8()?)
        ),
        _ => ["RLCA", "RRCA", "RLA", "RRA", "DAA", "CPL", "SCF", "CCF"][y as usize].into(),
    };
    Ok(text)
}

fn decode_x3(c: &mut Cursor, y: u8, z: u8, p: u8, q: u8) -> Result<String, CpuError> {
    let text = match z {
        0 => format!("RET {}", COND_NAMES[y as usize]),
        1 => {
            if q == 0 {
                format!("POP {}", PAIR2_NAMES[p as usize])
            } else {
                match p {
                    0 => "RET".into(),
                    1 => "EXX".into(),
                    2 => "JP (HL)".into(),
                    _ => "LD SP, HL".into(),
                }
            }
        }
        2 => format!("JP {}, {}", COND_NAMES[y as usize], hex16(c.next16()?)),
        3 => match y {
            0 => format!("JP {}", hex16(c.next16()?)),
            1 => return decode_cb(c),
            2 => format!("OUT ({}), A", hex8(c.next8()?)),
            3 => format!("IN A, ({})", hex8(c.next8()?)),
            4 => "EX (SP), HL".into(),
            5 => "EX DE, HL".into(),
            6 => "DI".into(),
            _ => "EI".into(),
        },
        4 => format!("CALL {}, {}", COND_NAMES[y as usize], hex16(c.next16()?)),
        5 => {
            if q == 0 {
                format!("PUSH {}", PAIR2_NAMES[p as usize])
            } else {
                match p {
                    0 => format!("CALL {}", hex16(c.next16()?)),
                    1 => return decode_index(c, IndexMode::Ix),
                    2 => return decode_ed(c),
                    _ => return decode_index(c, IndexMode::Iy),
                }
            }
        }
        6 => alu_text(y, &hex8(c.next8()?)),
        _ => format!("RST {}", hex8(y * 8)),
    };
    Ok(text)
}

fn decode_cb(c: &mut Cursor) -> Result<String, CpuError> {
    let opcode = c.next8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let reg = isa::reg8_name(z, IndexMode::Hl);

    Ok(match x {
        0 => format!("{} {}", ROT_NAMES[y as usize], reg),
        1 => format!("BIT {y}, {reg}"),
        2 => format!("RES {y}, {reg}"),
        _ => format!("SET {y}, {reg}"),
    })
}

fn decode_ed(c: &mut Cursor) -> Result<String, CpuError> {
    let opcode = c.next8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let p = (y >> 1) & 0x03;
    let q = y & 0x01;

    match x {
        1 => {
            let text = match z {
                0 => {
                    if y == 6 {
                        "IN (C)".into()
                    } else {
                        format!("IN {}, (C)", isa::reg8_name(y, IndexMode::Hl))
                    }
                }
                1 => {
                    if y == 6 {
                        "OUT (C), 0".into()
                    } else {
                        format!("OUT (C), {}", isa::reg8_name(y, IndexMode::Hl))
                    }
                }
                2 => {
                    if q == 0 {
                        format!("SBC HL, {}", PAIR_NAMES[p as usize])
                    } else {
                        format!("ADC HL, {}", PAIR_NAMES[p as usize])
                    }
                }
                3 => {
                    if q == 0 {
                        format!("LD ({}), {}", hex16(c.next16()?), PAIR_NAMES[p as usize])
                    } else {
                        format!("LD {}, ({})", PAIR_NAMES[p as usize], hex16(c.next16()?))
                    }
                }
                4 => "NEG".into(),
                5 => {
                    if q == 0 {
                        "RETN".into()
                    } else {
                        "RETI".into()
                    }
                }
                6 => format!(
                    "IM {}",
                    match y & 0x03 {
                        0 | 1 => 0,
                        2 => 1,
                        _ => 2,
                    }
                ),
                _ => match y {
                    0 => "LD I, A".into(),
                    1 => "LD R, A".into(),
                    2 => "LD A, I".into(),
                    3 => "LD A, R".into(),
                    4 => "RRD".into(),
                    5 => "RLD".into(),
                    _ => return Err(c.invalid()),
                },
            };
            Ok(text)
        }
        2 if y >= 4 && z < 4 => {
            const BLOCK: [[&str; 4]; 4] = [
                ["LDI", "CPI", "INI", "OUTI"],
                ["LDD", "CPD", "IND", "OUTD"],
                ["LDIR", "CPIR", "INIR", "OTIR"],
                ["LDDR", "CPDR", "INDR", "OTDR"],
            ];
            Ok(BLOCK[(y - 4) as usize][z as usize].into())
        }
        _ => Err(c.invalid()),
    }
}

fn decode_index(c: &mut Cursor, mode: IndexMode) -> Result<String, CpuError> {
    let opcode = c.next8()?;
    let ix = mode.pair_name();

    Ok(match opcode {
        0x09 | 0x19 | 0x29 | 0x39 => {
            let p = (opcode >> 4) & 0x03;
            // The rp table's HL slot names the index register itself
            let rp = if p == 2 { ix } else { PAIR_NAMES[p as usize] };
            format!("ADD {ix}, {rp}")
        }
        0x21 => format!("LD {ix}, {}", hex16(c.next16()?)),
        0x22 => format!("LD ({}), {ix}", hex16(c.next16()?)),
        0x2A => format!("LD {ix}, ({})", hex16(c.next16()?)),
        0x23 => format!("INC {ix}"),
        0x2B => format!("DEC {ix}"),
        0x24 | 0x25 | 0x2C | 0x2D => {
            let half = isa::reg8_name((opcode >> 3) & 0x07, mode);
            if opcode & 0x01 == 0 {
                format!("INC {half}")
            } else {
                format!("DEC {half}")
            }
        }
        0x26 | 0x2E => {
            let half = isa::reg8_name((opcode >> 3) & 0x07, mode);
            format!("LD {half}, {}", hex8(c.next8()?))
        }
        0x34 => format!("INC {}", displaced(mode, c.next8()? as i8)),
        0x35 => format!("DEC {}", displaced(mode, c.next8()? as i8)),
        0x36 => {
            let mem = displaced(mode, c.next8()? as i8);
            format!("LD {mem}, {}", hex8(c.next8()?))
        }
        0x76 => return Err(c.invalid()),
        0x40..=0x7F => {
            let y = (opcode >> 3) & 0x07;
            let z = opcode & 0x07;
            if y == 6 {
                let mem = displaced(mode, c.next8()? as i8);
                format!("LD {mem}, {}", isa::reg8_name(z, IndexMode::Hl))
            } else if z == 6 {
                let mem = displaced(mode, c.next8()? as i8);
                format!("LD {}, {mem}", isa::reg8_name(y, IndexMode::Hl))
            } else {
                format!("LD {}, {}", isa::reg8_name(y, mode), isa::reg8_name(z, mode))
            }
        }
        0x80..=0xBF => {
            let y = (opcode >> 3) & 0x07;
            let z = opcode & 0x07;
            if z == 6 {
                let mem = displaced(mode, c.next8()? as i8);
                alu_text(y, &mem)
            } else {
                alu_text(y, isa::reg8_name(z, mode))
            }
        }
        0xCB => {
            let mem = displaced(mode, c.next8()? as i8);
            return decode_indexed_cb(c, &mem);
        }
        0xE1 => format!("POP {ix}"),
        0xE3 => format!("EX (SP), {ix}"),
        0xE5 => format!("PUSH {ix}"),
        0xE9 => format!("JP ({ix})"),
        0xF9 => format!("LD SP, {ix}"),
        _ => return Err(c.invalid()),
    })
}

/// DD CB / FD CB. The undocumented z != 6 encodings also copy the result
/// into a register; render that as a trailing operand.
fn decode_indexed_cb(c: &mut Cursor, mem: &str) -> Result<String, CpuError> {
    let opcode = c.next8()?;
    let x = (opcode >> 6) & 0x03;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;
    let copy = if z == 6 || x == 1 {
        String::new()
    } else {
        format!(", {}", isa::reg8_name(z, IndexMode::Hl))
    };

    Ok(match x {
        0 => format!("{} {mem}{copy}", ROT_NAMES[y as usize]),
        1 => format!("BIT {y}, {mem}"),
        2 => format!("RES {y}, {mem}{copy}"),
        _ => format!("SET {y}, {mem}{copy}"),
    })
}
