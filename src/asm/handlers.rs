//! Encoding handlers, one per mnemonic family, behind a static match.

use super::{Operand, SyntaxError};
use crate::isa::{IndexMode, ALU_NAMES, ROT_NAMES};

/// Every mnemonic the assembler accepts.
const MNEMONICS: &[&str] = &[
    "ADC", "ADD", "AND", "BIT", "CALL", "CCF", "CP", "CPD", "CPDR", "CPI", "CPIR", "CPL", "DAA",
    "DEC", "DI", "DJNZ", "EI", "EX", "EXX", "HALT", "IM", "IN", "INC", "IND", "INDR", "INI",
    "INIR", "JP", "JR", "LD", "LDD", "LDDR", "LDI", "LDIR", "NEG", "NOP", "OR", "OTDR", "OTIR",
    "OUT", "OUTD", "OUTI", "POP", "PUSH", "RES", "RET", "RETI", "RETN", "RL", "RLA", "RLC",
    "RLCA", "RLD", "RR", "RRA", "RRC", "RRCA", "RRD", "RST", "SBC", "SCF", "SET", "SLA", "SLL",
    "SRA", "SRL", "SUB", "XOR",
];

/// The registry's key set, for tooling that wants to enumerate it.
pub fn mnemonics() -> &'static [&'static str] {
    MNEMONICS
}

pub(super) fn encode(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match mnemonic {
        "NOP" => fixed(mnemonic, ops, &[0x00]),
        "HALT" => fixed(mnemonic, ops, &[0x76]),
        "DI" => fixed(mnemonic, ops, &[0xF3]),
        "EI" => fixed(mnemonic, ops, &[0xFB]),
        "EXX" => fixed(mnemonic, ops, &[0xD9]),
        "DAA" => fixed(mnemonic, ops, &[0x27]),
        "CPL" => fixed(mnemonic, ops, &[0x2F]),
        "SCF" => fixed(mnemonic, ops, &[0x37]),
        "CCF" => fixed(mnemonic, ops, &[0x3F]),
        "RLCA" => fixed(mnemonic, ops, &[0x07]),
        "RRCA" => fixed(mnemonic, ops, &[0x0F]),
        "RLA" => fixed(mnemonic, ops, &[0x17]),
        "RRA" => fixed(mnemonic, ops, &[0x1F]),
        "NEG" => fixed(mnemonic, ops, &[0xED, 0x44]),
        "RETI" => fixed(mnemonic, ops, &[0xED, 0x4D]),
        "RETN" => fixed(mnemonic, ops, &[0xED, 0x45]),
        "RRD" => fixed(mnemonic, ops, &[0xED, 0x67]),
        "RLD" => fixed(mnemonic, ops, &[0xED, 0x6F]),
        "LDI" => fixed(mnemonic, ops, &[0xED, 0xA0]),
        "CPI" => fixed(mnemonic, ops, &[0xED, 0xA1]),
        "INI" => fixed(mnemonic, ops, &[0xED, 0xA2]),
        "OUTI" => fixed(mnemonic, ops, &[0xED, 0xA3]),
        "LDD" => fixed(mnemonic, ops, &[0xED, 0xA8]),
        "CPD" => fixed(mnemonic, ops, &[0xED, 0xA9]),
        "IND" => fixed(mnemonic, ops, &[0xED, 0xAA]),
        "OUTD" => fixed(mnemonic, ops, &[0xED, 0xAB]),
        "LDIR" => fixed(mnemonic, ops, &[0xED, 0xB0]),
        "CPIR" => fixed(mnemonic, ops, &[0xED, 0xB1]),
        "INIR" => fixed(mnemonic, ops, &[0xED, 0xB2]),
        "OTIR" => fixed(mnemonic, ops, &[0xED, 0xB3]),
        "LDDR" => fixed(mnemonic, ops, &[0xED, 0xB8]),
        "CPDR" => fixed(mnemonic, ops, &[0xED, 0xB9]),
        "INDR" => fixed(mnemonic, ops, &[0xED, 0xBA]),
        "OTDR" => fixed(mnemonic, ops, &[0xED, 0xBB]),
        "LD" => ld(mnemonic, ops),
        "PUSH" => push_pop(mnemonic, ops, 0xC5),
        "POP" => push_pop(mnemonic, ops, 0xC1),
        "EX" => ex(mnemonic, ops),
        "ADD" | "ADC" | "SUB" | "SBC" | "AND" | "XOR" | "OR" | "CP" => alu(mnemonic, ops),
        "INC" => inc_dec(mnemonic, ops, true),
        "DEC" => inc_dec(mnemonic, ops, false),
        "RLC" | "RRC" | "RL" | "RR" | "SLA" | "SRA" | "SLL" | "SRL" => rotate(mnemonic, ops),
        "BIT" | "RES" | "SET" => bit_res_set(mnemonic, ops),
        "JP" => jp(mnemonic, ops),
        "JR" => jr(mnemonic, ops),
        "DJNZ" => djnz(mnemonic, ops),
        "CALL" => call(mnemonic, ops),
        "RET" => ret(mnemonic, ops),
        "RST" => rst(mnemonic, ops),
        "IN" => in_port(mnemonic, ops),
        "OUT" => out_port(mnemonic, ops),
        "IM" => im(mnemonic, ops),
        _ => Err(SyntaxError::UnknownMnemonic(mnemonic.into())),
    }
}

// ========== Shared helpers ==========

fn prefix(mode: IndexMode) -> u8 {
    match mode {
        IndexMode::Iy => 0xFD,
        _ => 0xDD,
    }
}

fn expect(
    mnemonic: &str,
    ops: &[Operand],
    expected: usize,
    desc: &'static str,
) -> Result<(), SyntaxError> {
    if ops.len() == expected {
        Ok(())
    } else {
        Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: desc,
            got: ops.len(),
        })
    }
}

fn invalid(mnemonic: &str, op: &Operand) -> SyntaxError {
    SyntaxError::InvalidOperand {
        mnemonic: mnemonic.into(),
        operand: op.to_string(),
    }
}

fn imm8(value: i32) -> Result<u8, SyntaxError> {
    u8::try_from(value).map_err(|_| SyntaxError::OutOfRange {
        value,
        what: "an 8-bit immediate",
    })
}

fn imm16(value: i32) -> Result<[u8; 2], SyntaxError> {
    let nn = u16::try_from(value).map_err(|_| SyntaxError::OutOfRange {
        value,
        what: "a 16-bit immediate",
    })?;
    Ok([nn as u8, (nn >> 8) as u8])
}

fn disp8(value: i32) -> Result<u8, SyntaxError> {
    i8::try_from(value)
        .map(|d| d as u8)
        .map_err(|_| SyntaxError::OutOfRange {
            value,
            what: "a relative displacement",
        })
}

/// Condition code of an operand, accepting `C` (the register) as carry.
fn cond_of(op: &Operand) -> Option<u8> {
    match *op {
        Operand::Cond(cc) => Some(cc),
        Operand::Reg(1) => Some(3),
        _ => None,
    }
}

fn fixed(mnemonic: &str, ops: &[Operand], bytes: &[u8]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 0, "no")?;
    Ok(bytes.to_vec())
}

// ========== Families ==========

fn ld(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 2, "2")?;
    let (dst, src) = (&ops[0], &ops[1]);
    match (*dst, *src) {
        // Accumulator specials
        (Operand::Reg(7), Operand::MemBc) => Ok(vec![0x0A]),
        (Operand::Reg(7), Operand::MemDe) => Ok(vec![0x1A]),
        (Operand::Reg(7), Operand::MemImm(nn)) => Ok(vec![0x3A, nn as u8, (nn >> 8) as u8]),
        (Operand::MemBc, Operand::Reg(7)) => Ok(vec![0x02]),
        (Operand::MemDe, Operand::Reg(7)) => Ok(vec![0x12]),
        (Operand::MemImm(nn), Operand::Reg(7)) => Ok(vec![0x32, nn as u8, (nn >> 8) as u8]),
        (Operand::Reg(7), Operand::RegI) => Ok(vec![0xED, 0x57]),
        (Operand::Reg(7), Operand::RegR) => Ok(vec![0xED, 0x5F]),
        (Operand::RegI, Operand::Reg(7)) => Ok(vec![0xED, 0x47]),
        (Operand::RegR, Operand::Reg(7)) => Ok(vec![0xED, 0x4F]),

        // 8-bit register forms
        (Operand::Reg(y), Operand::Reg(z)) => Ok(vec![0x40 | y << 3 | z]),
        (Operand::Reg(y), Operand::MemHl) => Ok(vec![0x46 | y << 3]),
        (Operand::MemHl, Operand::Reg(z)) => Ok(vec![0x70 | z]),
        (Operand::Reg(y), Operand::Imm(v)) => Ok(vec![0x06 | y << 3, imm8(v)?]),
        (Operand::MemHl, Operand::Imm(v)) => Ok(vec![0x36, imm8(v)?]),
        (Operand::Reg(y), Operand::Displaced(mode, d)) => {
            Ok(vec![prefix(mode), 0x46 | y << 3, d as u8])
        }
        (Operand::Displaced(mode, d), Operand::Reg(z)) => {
            Ok(vec![prefix(mode), 0x70 | z, d as u8])
        }
        (Operand::Displaced(mode, d), Operand::Imm(v)) => {
            Ok(vec![prefix(mode), 0x36, d as u8, imm8(v)?])
        }

        // Index halves (H/L are not addressable under the prefix)
        (Operand::IndexHalf(mode, y), Operand::Imm(v)) => {
            Ok(vec![prefix(mode), 0x06 | y << 3, imm8(v)?])
        }
        (Operand::IndexHalf(m1, y), Operand::IndexHalf(m2, z)) if m1 == m2 => {
            Ok(vec![prefix(m1), 0x40 | y << 3 | z])
        }
        (Operand::IndexHalf(mode, y), Operand::Reg(z)) if z != 4 && z != 5 => {
            Ok(vec![prefix(mode), 0x40 | y << 3 | z])
        }
        (Operand::Reg(y), Operand::IndexHalf(mode, z)) if y != 4 && y != 5 => {
            Ok(vec![prefix(mode), 0x40 | y << 3 | z])
        }

        // 16-bit loads
        (Operand::Pair(p), Operand::Imm(v)) => {
            let [lo, hi] = imm16(v)?;
            Ok(vec![0x01 | p << 4, lo, hi])
        }
        (Operand::Ix, Operand::Imm(v)) => {
            let [lo, hi] = imm16(v)?;
            Ok(vec![0xDD, 0x21, lo, hi])
        }
        (Operand::Iy, Operand::Imm(v)) => {
            let [lo, hi] = imm16(v)?;
            Ok(vec![0xFD, 0x21, lo, hi])
        }
        (Operand::Pair(2), Operand::MemImm(nn)) => Ok(vec![0x2A, nn as u8, (nn >> 8) as u8]),
        (Operand::MemImm(nn), Operand::Pair(2)) => Ok(vec![0x22, nn as u8, (nn >> 8) as u8]),
        (Operand::Pair(p), Operand::MemImm(nn)) => {
            Ok(vec![0xED, 0x4B | p << 4, nn as u8, (nn >> 8) as u8])
        }
        (Operand::MemImm(nn), Operand::Pair(p)) => {
            Ok(vec![0xED, 0x43 | p << 4, nn as u8, (nn >> 8) as u8])
        }
        (Operand::Ix, Operand::MemImm(nn)) => Ok(vec![0xDD, 0x2A, nn as u8, (nn >> 8) as u8]),
        (Operand::MemImm(nn), Operand::Ix) => Ok(vec![0xDD, 0x22, nn as u8, (nn >> 8) as u8]),
        (Operand::Iy, Operand::MemImm(nn)) => Ok(vec![0xFD, 0x2A, nn as u8, (nn >> 8) as u8]),
        (Operand::MemImm(nn), Operand::Iy) => Ok(vec![0xFD, 0x22, nn as u8, (nn >> 8) as u8]),
        (Operand::Pair(3), Operand::Pair(2)) => Ok(vec![0xF9]),
        (Operand::Pair(3), Operand::Ix) => Ok(vec![0xDD, 0xF9]),
        (Operand::Pair(3), Operand::Iy) => Ok(vec![0xFD, 0xF9]),

        _ => Err(invalid(mnemonic, src)),
    }
}

fn push_pop(mnemonic: &str, ops: &[Operand], base: u8) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 1, "1")?;
    match ops[0] {
        Operand::Pair(p) if p < 3 => Ok(vec![base | p << 4]),
        Operand::Af => Ok(vec![base | 0x30]),
        Operand::Ix => Ok(vec![0xDD, base | 0x20]),
        Operand::Iy => Ok(vec![0xFD, base | 0x20]),
        ref op => Err(invalid(mnemonic, op)),
    }
}

fn ex(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 2, "2")?;
    match (ops[0], ops[1]) {
        (Operand::Af, Operand::AfPrime) => Ok(vec![0x08]),
        (Operand::Pair(1), Operand::Pair(2)) => Ok(vec![0xEB]),
        (Operand::MemSp, Operand::Pair(2)) => Ok(vec![0xE3]),
        (Operand::MemSp, Operand::Ix) => Ok(vec![0xDD, 0xE3]),
        (Operand::MemSp, Operand::Iy) => Ok(vec![0xFD, 0xE3]),
        _ => Err(invalid(mnemonic, &ops[1])),
    }
}

fn alu(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    let op_index = ALU_NAMES.iter().position(|&n| n == mnemonic).unwrap() as u8;

    // ADD/ADC/SBC spell the destination; the rest are accumulator-implicit.
    match mnemonic {
        "ADD" | "ADC" | "SBC" => {
            expect(mnemonic, ops, 2, "2")?;
            match ops[0] {
                Operand::Reg(7) => alu_src(mnemonic, op_index, &ops[1]),
                Operand::Pair(2) => alu16(mnemonic, &ops[1]),
                Operand::Ix | Operand::Iy if mnemonic == "ADD" => add_index(mnemonic, ops),
                ref op => Err(invalid(mnemonic, op)),
            }
        }
        _ => {
            expect(mnemonic, ops, 1, "1")?;
            alu_src(mnemonic, op_index, &ops[0])
        }
    }
}

fn alu_src(mnemonic: &str, op_index: u8, src: &Operand) -> Result<Vec<u8>, SyntaxError> {
    match *src {
        Operand::Reg(r) => Ok(vec![0x80 | op_index << 3 | r]),
        Operand::MemHl => Ok(vec![0x80 | op_index << 3 | 6]),
        Operand::Imm(v) => Ok(vec![0xC6 | op_index << 3, imm8(v)?]),
        Operand::Displaced(mode, d) => Ok(vec![prefix(mode), 0x86 | op_index << 3, d as u8]),
        Operand::IndexHalf(mode, r) => Ok(vec![prefix(mode), 0x80 | op_index << 3 | r]),
        ref op => Err(invalid(mnemonic, op)),
    }
}

/// ADD/ADC/SBC HL, rp.
fn alu16(mnemonic: &str, src: &Operand) -> Result<Vec<u8>, SyntaxError> {
    let p = match *src {
        Operand::Pair(p) => p,
        ref op => return Err(invalid(mnemonic, op)),
    };
    match mnemonic {
        "ADD" => Ok(vec![0x09 | p << 4]),
        "ADC" => Ok(vec![0xED, 0x4A | p << 4]),
        _ => Ok(vec![0xED, 0x42 | p << 4]),
    }
}

/// ADD IX, rp. The rp table's HL slot names the index register itself.
fn add_index(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    let pfx = if ops[0] == Operand::Ix { 0xDD } else { 0xFD };
    let p = match (ops[0], ops[1]) {
        (_, Operand::Pair(p)) if p != 2 => p,
        (Operand::Ix, Operand::Ix) | (Operand::Iy, Operand::Iy) => 2,
        _ => return Err(invalid(mnemonic, &ops[1])),
    };
    Ok(vec![pfx, 0x09 | p << 4])
}

fn inc_dec(mnemonic: &str, ops: &[Operand], inc: bool) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 1, "1")?;
    let (r8, rp, ix) = if inc {
        (0x04, 0x03, 0x23)
    } else {
        (0x05, 0x0B, 0x2B)
    };
    match ops[0] {
        Operand::Reg(r) => Ok(vec![r8 | r << 3]),
        Operand::MemHl => Ok(vec![r8 | 6 << 3]),
        Operand::Pair(p) => Ok(vec![rp | p << 4]),
        Operand::Ix => Ok(vec![0xDD, ix]),
        Operand::Iy => Ok(vec![0xFD, ix]),
        Operand::IndexHalf(mode, r) => Ok(vec![prefix(mode), r8 | r << 3]),
        Operand::Displaced(mode, d) => Ok(vec![prefix(mode), r8 | 6 << 3, d as u8]),
        ref op => Err(invalid(mnemonic, op)),
    }
}

fn rotate(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    let rot = ROT_NAMES.iter().position(|&n| n == mnemonic).unwrap() as u8;
    match ops {
        [op] => match *op {
            Operand::Reg(r) => Ok(vec![0xCB, rot << 3 | r]),
            Operand::MemHl => Ok(vec![0xCB, rot << 3 | 6]),
            Operand::Displaced(mode, d) => {
                Ok(vec![prefix(mode), 0xCB, d as u8, rot << 3 | 6])
            }
            ref op => Err(invalid(mnemonic, op)),
        },
        // Undocumented copy form: result also lands in the register
        [Operand::Displaced(mode, d), Operand::Reg(z)] => {
            Ok(vec![prefix(*mode), 0xCB, *d as u8, rot << 3 | *z])
        }
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "1 or 2",
            got: ops.len(),
        }),
    }
}

fn bit_res_set(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    let base: u8 = match mnemonic {
        "BIT" => 0x40,
        "RES" => 0x80,
        _ => 0xC0,
    };
    let bit = match ops.first() {
        Some(&Operand::Imm(v)) if (0..=7).contains(&v) => v as u8,
        Some(&Operand::Imm(v)) => {
            return Err(SyntaxError::OutOfRange {
                value: v,
                what: "a bit number",
            })
        }
        Some(op) => return Err(invalid(mnemonic, op)),
        None => {
            return Err(SyntaxError::OperandCount {
                mnemonic: mnemonic.into(),
                expected: "2 or 3",
                got: 0,
            })
        }
    };
    match &ops[1..] {
        [Operand::Reg(r)] => Ok(vec![0xCB, base | bit << 3 | *r]),
        [Operand::MemHl] => Ok(vec![0xCB, base | bit << 3 | 6]),
        [Operand::Displaced(mode, d)] => {
            Ok(vec![prefix(*mode), 0xCB, *d as u8, base | bit << 3 | 6])
        }
        // RES/SET copy form; BIT has no writeback to copy
        [Operand::Displaced(mode, d), Operand::Reg(z)] if mnemonic != "BIT" => {
            Ok(vec![prefix(*mode), 0xCB, *d as u8, base | bit << 3 | *z])
        }
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "2 or 3",
            got: ops.len(),
        }),
    }
}

fn jp(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match ops {
        [Operand::Imm(v)] => {
            let [lo, hi] = imm16(*v)?;
            Ok(vec![0xC3, lo, hi])
        }
        [Operand::MemHl] => Ok(vec![0xE9]),
        [Operand::Displaced(mode, 0)] => Ok(vec![prefix(*mode), 0xE9]),
        [cc, Operand::Imm(v)] => {
            let cc = cond_of(cc).ok_or_else(|| invalid(mnemonic, cc))?;
            let [lo, hi] = imm16(*v)?;
            Ok(vec![0xC2 | cc << 3, lo, hi])
        }
        [op] => Err(invalid(mnemonic, op)),
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "1 or 2",
            got: ops.len(),
        }),
    }
}

fn jr(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match ops {
        [Operand::Imm(v)] => Ok(vec![0x18, disp8(*v)?]),
        [cc, Operand::Imm(v)] => {
            let cc = cond_of(cc).ok_or_else(|| invalid(mnemonic, cc))?;
            if cc >= 4 {
                // Only NZ/Z/NC/C exist in the relative form
                return Err(invalid(mnemonic, &ops[0]));
            }
            Ok(vec![0x20 | cc << 3, disp8(*v)?])
        }
        [op] => Err(invalid(mnemonic, op)),
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "1 or 2",
            got: ops.len(),
        }),
    }
}

fn djnz(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 1, "1")?;
    match ops[0] {
        Operand::Imm(v) => Ok(vec![0x10, disp8(v)?]),
        ref op => Err(invalid(mnemonic, op)),
    }
}

fn call(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match ops {
        [Operand::Imm(v)] => {
            let [lo, hi] = imm16(*v)?;
            Ok(vec![0xCD, lo, hi])
        }
        [cc, Operand::Imm(v)] => {
            let cc = cond_of(cc).ok_or_else(|| invalid(mnemonic, cc))?;
            let [lo, hi] = imm16(*v)?;
            Ok(vec![0xC4 | cc << 3, lo, hi])
        }
        [op] => Err(invalid(mnemonic, op)),
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "1 or 2",
            got: ops.len(),
        }),
    }
}

fn ret(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match ops {
        [] => Ok(vec![0xC9]),
        [cc] => {
            let cc = cond_of(cc).ok_or_else(|| invalid(mnemonic, cc))?;
            Ok(vec![0xC0 | cc << 3])
        }
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "0 or 1",
            got: ops.len(),
        }),
    }
}

fn rst(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 1, "1")?;
    match ops[0] {
        Operand::Imm(v) if (0..=0x38).contains(&v) && v % 8 == 0 => {
            Ok(vec![0xC7 | v as u8])
        }
        Operand::Imm(v) => Err(SyntaxError::OutOfRange {
            value: v,
            what: "a restart target",
        }),
        ref op => Err(invalid(mnemonic, op)),
    }
}

fn in_port(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    match ops {
        // Flags-only form
        [Operand::PortC] => Ok(vec![0xED, 0x70]),
        [Operand::Reg(7), Operand::MemImm(port)] => {
            let port = port_imm(*port)?;
            Ok(vec![0xDB, port])
        }
        [Operand::Reg(r), Operand::PortC] => Ok(vec![0xED, 0x40 | *r << 3]),
        [_, op] => Err(invalid(mnemonic, op)),
        _ => Err(SyntaxError::OperandCount {
            mnemonic: mnemonic.into(),
            expected: "1 or 2",
            got: ops.len(),
        }),
    }
}

fn out_port(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 2, "2")?;
    match (ops[0], ops[1]) {
        (Operand::MemImm(port), Operand::Reg(7)) => {
            let port = port_imm(port)?;
            Ok(vec![0xD3, port])
        }
        (Operand::PortC, Operand::Reg(r)) => Ok(vec![0xED, 0x41 | r << 3]),
        // The undocumented constant-source form drives zero onto the bus
        (Operand::PortC, Operand::Imm(0)) => Ok(vec![0xED, 0x71]),
        (Operand::PortC, Operand::Imm(v)) => Err(SyntaxError::OutOfRange {
            value: v,
            what: "an OUT (C) source (only 0 encodes)",
        }),
        _ => Err(invalid(mnemonic, &ops[1])),
    }
}

fn port_imm(port: u16) -> Result<u8, SyntaxError> {
    u8::try_from(port).map_err(|_| SyntaxError::OutOfRange {
        value: i32::from(port),
        what: "a port number",
    })
}

fn im(mnemonic: &str, ops: &[Operand]) -> Result<Vec<u8>, SyntaxError> {
    expect(mnemonic, ops, 1, "1")?;
    match ops[0] {
        Operand::Imm(0) => Ok(vec![0xED, 0x46]),
        Operand::Imm(1) => Ok(vec![0xED, 0x56]),
        Operand::Imm(2) => Ok(vec![0xED, 0x5E]),
        Operand::Imm(v) => Err(SyntaxError::OutOfRange {
            value: v,
            what: "an interrupt mode",
        }),
        ref op => Err(invalid(mnemonic, op)),
    }
}
