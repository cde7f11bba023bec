//! Shared encoding tables for the register-select bit fields.
//!
//! The engine, disassembler and assembler all read these tables, so the
//! three renditions of the instruction set agree on register numbering by
//! construction instead of by discipline.

/// 8-bit register field `r` (codes 0..=7). Code 6 is the memory operand
/// `(HL)`; the register file never resolves it.
pub const REG8_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];

/// Register-pair field `rp` (codes 0..=3) as used by 16-bit loads and
/// arithmetic. Code 2 is substituted by IX/IY under an index prefix.
pub const PAIR_NAMES: [&str; 4] = ["BC", "DE", "HL", "SP"];

/// Register-pair field `rp2` (codes 0..=3) as used by PUSH/POP.
pub const PAIR2_NAMES: [&str; 4] = ["BC", "DE", "HL", "AF"];

/// Condition field `cc` (codes 0..=7).
pub const COND_NAMES: [&str; 8] = ["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"];

/// CB-prefix rotate/shift family, by the `y` field.
pub const ROT_NAMES: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];

/// 8-bit ALU family, by the `y` field of the base table.
pub const ALU_NAMES: [&str; 8] = ["ADD", "ADC", "SUB", "SBC", "AND", "XOR", "OR", "CP"];

/// Which index register a prefixed dispatch is working through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    Hl,
    Ix,
    Iy,
}

impl IndexMode {
    /// Name of the 16-bit register standing in for HL.
    pub fn pair_name(self) -> &'static str {
        match self {
            IndexMode::Hl => "HL",
            IndexMode::Ix => "IX",
            IndexMode::Iy => "IY",
        }
    }
}

/// Look up an `r`-field code by register name. `(HL)` is not included; the
/// memory operand is classified separately by every consumer.
pub fn reg8_code(name: &str) -> Option<u8> {
    match name {
        "B" => Some(0),
        "C" => Some(1),
        "D" => Some(2),
        "E" => Some(3),
        "H" => Some(4),
        "L" => Some(5),
        "A" => Some(7),
        _ => None,
    }
}

/// Look up an `rp`-field code by pair name.
pub fn pair_code(name: &str) -> Option<u8> {
    PAIR_NAMES.iter().position(|&n| n == name).map(|i| i as u8)
}

/// Look up an `rp2`-field code by pair name.
pub fn pair2_code(name: &str) -> Option<u8> {
    PAIR2_NAMES.iter().position(|&n| n == name).map(|i| i as u8)
}

/// Look up a `cc`-field code by condition name.
pub fn cond_code(name: &str) -> Option<u8> {
    COND_NAMES.iter().position(|&n| n == name).map(|i| i as u8)
}

/// Name of the `r`-field code `r`, with H/L renamed to the index-register
/// halves under a DD/FD prefix (the undocumented forms).
pub fn reg8_name(r: u8, mode: IndexMode) -> &'static str {
    match (mode, r) {
        (IndexMode::Ix, 4) => "IXH",
        (IndexMode::Ix, 5) => "IXL",
        (IndexMode::Iy, 4) => "IYH",
        (IndexMode::Iy, 5) => "IYL",
        _ => REG8_NAMES[(r & 0x07) as usize],
    }
}

/// Even byte parity, the P/V sense used by the logical instructions.
pub fn parity(value: u8) -> bool {
    value.count_ones() % 2 == 0
}
