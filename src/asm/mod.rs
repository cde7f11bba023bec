//! Single-line assembler, the inverse of the disassembler.
//!
//! One line is "MNEMONIC" or "MNEMONIC op1[, op2[, op3]]". The tokenizer
//! classifies each operand syntactically; the handler for the mnemonic then
//! checks operand classes and numeric ranges and emits the encoding. The
//! handler registry is a static match in `handlers`, so the encodable set is
//! fixed at compile time and enumerable via `mnemonics()`.

use std::fmt;

use thiserror::Error;

use crate::isa::IndexMode;

mod handlers;


pub use handlers::mnemonics;

/// Why a line failed to assemble. Each variant names the offending piece.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("empty line")]
    Empty,

    #[error("unknown mnemonic `{0}`")]
    UnknownMnemonic(String),

    #[error("`{mnemonic}` takes {expected} operand(s), got {got}")]
    OperandCount {
        mnemonic: String,
        expected: &'static str,
        got: usize,
    },

    #[error("cannot parse operand `{0}`")]
    BadOperand(String),

    #[error("operand `{operand}` is not valid for `{mnemonic}`")]
    InvalidOperand { mnemonic: String, operand: String },

    #[error("{value} is out of range for {what}")]
    OutOfRange { value: i32, what: &'static str },
}

/// Syntactic operand classes. `C` always parses as the register; handlers
/// expecting a condition accept it as the carry condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// 8-bit register by `r`-field code (6 never appears; `(HL)` is MemHl).
    Reg(u8),
    /// Register pair by `rp`-field code.
    Pair(u8),
    Af,
    AfPrime,
    Ix,
    Iy,
    /// IXH/IXL/IYH/IYL with the underlying `r`-field code (4 or 5).
    IndexHalf(IndexMode, u8),
    /// The interrupt-vector and refresh registers.
    RegI,
    RegR,
    /// Condition code (never C; see `Reg`).
    Cond(u8),
    /// Numeric literal.
    Imm(i32),
    MemHl,
    MemBc,
    MemDe,
    MemSp,
    /// `(IX+d)` / `(IY+d)`; bare `(IX)` parses with d = 0.
    Displaced(IndexMode, i8),
    /// `(nn)` with a numeric inner.
    MemImm(u16),
    /// `(C)`, the register-indirect port.
    PortC,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operand::Reg(r) => f.write_str(crate::isa::reg8_name(r, IndexMode::Hl)),
            Operand::Pair(p) => f.write_str(crate::isa::PAIR_NAMES[(p & 3) as usize]),
            Operand::Af => f.write_str("AF"),
            Operand::AfPrime => f.write_str("AF'"),
            Operand::Ix => f.write_str("IX"),
            Operand::Iy => f.write_str("IY"),
            Operand::IndexHalf(mode, r) => f.write_str(crate::isa::reg8_name(r, mode)),
            Operand::RegI => f.write_str("I"),
            Operand::RegR => f.write_str("R"),
            Operand::Cond(cc) => f.write_str(crate::isa::COND_NAMES[(cc & 7) as usize]),
            Operand::Imm(v) => write!(f, "{v}"),
            Operand::MemHl => f.write_str("(HL)"),
            Operand::MemBc => f.write_str("(BC)"),
            Operand::MemDe => f.write_str("(DE)"),
            Operand::MemSp => f.write_str("(SP)"),
            Operand::Displaced(mode, d) => {
                let v = i16::from(d);
                if v < 0 {
                    write!(f, "({}-{})", mode.pair_name(), -v)
                } else {
                    write!(f, "({}+{})", mode.pair_name(), v)
                }
            }
            Operand::MemImm(nn) => write!(f, "(0x{nn:04X})"),
            Operand::PortC => f.write_str("(C)"),
        }
    }
}

/// Assemble one line into its encoding.
pub fn assemble(line: &str) -> Result<Vec<u8>, SyntaxError> {
    let (mnemonic, operands) = tokenize(line)?;
    handlers::encode(&mnemonic, &operands)
}

fn tokenize(line: &str) -> Result<(String, Vec<Operand>), SyntaxError> {
    let upper = line.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(SyntaxError::Empty);
    }

    let (mnemonic, rest) = match upper.split_once(char::is_whitespace) {
        Some((m, r)) => (m, r.trim()),
        None => (upper.as_str(), ""),
    };

    let mut operands = Vec::new();
    if !rest.is_empty() {
        for part in rest.split(',') {
            operands.push(parse_operand(part.trim())?);
        }
    }
    Ok((mnemonic.to_string(), operands))
}

fn parse_operand(text: &str) -> Result<Operand, SyntaxError> {
    if text.is_empty() {
        return Err(SyntaxError::BadOperand(text.into()));
    }

    if let Some(inner) = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .map(str::trim)
    {
        return parse_indirect(inner, text);
    }

    if let Some(r) = crate::isa::reg8_code(text) {
        return Ok(Operand::Reg(r));
    }
    match text {
        "AF" => return Ok(Operand::Af),
        "AF'" => return Ok(Operand::AfPrime),
        "IX" => return Ok(Operand::Ix),
        "IY" => return Ok(Operand::Iy),
        "IXH" => return Ok(Operand::IndexHalf(IndexMode::Ix, 4)),
        "IXL" => return Ok(Operand::IndexHalf(IndexMode::Ix, 5)),
        "IYH" => return Ok(Operand::IndexHalf(IndexMode::Iy, 4)),
        "IYL" => return Ok(Operand::IndexHalf(IndexMode::Iy, 5)),
        "I" => return Ok(Operand::RegI),
        "R" => return Ok(Operand::RegR),
        _ => {}
    }
    if let Some(p) = crate::isa::pair_code(text) {
        return Ok(Operand::Pair(p));
    }
    if let Some(cc) = crate::isa::cond_code(text) {
        return Ok(Operand::Cond(cc));
    }
    parse_number(text)
        .map(Operand::Imm)
        .ok_or_else(|| SyntaxError::BadOperand(text.into()))
}

fn parse_indirect(inner: &str, original: &str) -> Result<Operand, SyntaxError> {
    match inner {
        "HL" => return Ok(Operand::MemHl),
        "BC" => return Ok(Operand::MemBc),
        "DE" => return Ok(Operand::MemDe),
        "SP" => return Ok(Operand::MemSp),
        "C" => return Ok(Operand::PortC),
        "IX" => return Ok(Operand::Displaced(IndexMode::Ix, 0)),
        "IY" => return Ok(Operand::Displaced(IndexMode::Iy, 0)),
        _ => {}
    }

    for (name, mode) in [("IX", IndexMode::Ix), ("IY", IndexMode::Iy)] {
        if let Some(rest) = inner.strip_prefix(name) {
            let d = parse_number(rest.trim())
                .ok_or_else(|| SyntaxError::BadOperand(original.into()))?;
            if !(-128..=127).contains(&d) {
                return Err(SyntaxError::OutOfRange {
                    value: d,
                    what: "index displacement",
                });
            }
            return Ok(Operand::Displaced(mode, d as i8));
        }
    }

    let nn = parse_number(inner).ok_or_else(|| SyntaxError::BadOperand(original.into()))?;
    if !(0..=0xFFFF).contains(&nn) {
        return Err(SyntaxError::OutOfRange {
            value: nn,
            what: "address",
        });
    }
    Ok(Operand::MemImm(nn as u16))
}

/// Decimal, `0x` hex or `$` hex, with an optional leading sign. The line
/// has already been uppercased, so the hex prefix arrives as `0X`.
fn parse_number(text: &str) -> Option<i32> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0X") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(hex) = body.strip_prefix('$') {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).ok()
}
