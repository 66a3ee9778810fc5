//! The 6502 opcode table.
//!
//! Every documented NMOS 6502 instruction is listed once per addressing mode it
//! supports, with its opcode byte, its length in bytes and its cycle counts.
//! [`InstructionTable`] indexes the rows by mnemonic and mode; it holds no
//! mutable state and is shared by reference between assemblies.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
}

impl AddressingMode {
    pub fn name(&self) -> &'static str {
        use AddressingMode::*;
        match self {
            Implied     => "implied",
            Accumulator => "accumulator",
            Immediate   => "immediate",
            ZeroPage    => "zero_page",
            ZeroPageX   => "zero_page_x",
            ZeroPageY   => "zero_page_y",
            Relative    => "relative",
            Absolute    => "absolute",
            AbsoluteX   => "absolute_x",
            AbsoluteY   => "absolute_y",
            Indirect    => "indirect",
            IndirectX   => "indirect_x",
            IndirectY   => "indirect_y",
        }
    }

    /// Modes whose operand is a full 16-bit address.
    pub fn is_absolute_family(&self) -> bool {
        use AddressingMode::*;
        matches!(self, Absolute | AbsoluteX | AbsoluteY | Indirect)
    }
}

impl Display for AddressingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Encoding metadata for one (mnemonic, addressing mode) pair.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct InstructionInfo {
    pub name: &'static str,
    pub mode: AddressingMode,
    pub opcode: u8,
    /// Length of the encoded instruction in bytes (1-3).
    pub length: u8,
    pub cycles: u8,
    /// Extra cycles when indexing or branching crosses a page boundary.
    pub page_cycles: u8,
    /// Extra cycles when a branch is taken.
    pub branch_cycles: u8,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LookupError {
    InvalidInstruction { name: String },
    InvalidAddressingMode { name: String, mode: AddressingMode },
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::InvalidInstruction { name } =>
                write!(f, "Invalid instruction: {}", name),
            LookupError::InvalidAddressingMode { name, mode } =>
                write!(f, "Invalid addressing mode for {}: {}", name, mode),
        }
    }
}

pub struct InstructionTable {
    by_name: HashMap<&'static str, HashMap<AddressingMode, InstructionInfo>>,
}

impl InstructionTable {
    /// The documented instruction set of the NMOS 6502.
    pub fn mos6502() -> Self {
        Self::from_rows(OPCODES)
    }

    fn from_rows(rows: &[OpcodeRow]) -> Self {
        let mut by_name: HashMap<_, HashMap<_, _>> = HashMap::new();
        for &(name, mode, opcode, length, cycles, page_cycles, branch_cycles) in rows {
            let info = InstructionInfo { name, mode, opcode, length, cycles, page_cycles, branch_cycles };
            by_name.entry(name).or_default().insert(mode, info);
        }
        Self { by_name }
    }

    /// Looks up `name` (in any case) in the given addressing mode.
    pub fn get(&self, name: &str, mode: AddressingMode) -> Result<InstructionInfo, LookupError> {
        let lower = name.to_ascii_lowercase();
        let modes = self.by_name.get(lower.as_str())
            .ok_or_else(|| LookupError::InvalidInstruction { name: name.to_string() })?;
        modes.get(&mode)
            .copied()
            .ok_or_else(|| LookupError::InvalidAddressingMode { name: lower, mode })
    }

    pub fn is_mnemonic(&self, name: &str) -> bool {
        self.by_name.contains_key(name.to_ascii_lowercase().as_str())
    }

    /// Every row of the table, ordered by mnemonic, then mode.
    pub fn iter(&self) -> impl Iterator<Item=&InstructionInfo> {
        let mut infos = self.by_name.values()
            .flat_map(|modes| modes.values())
            .collect::<Vec<_>>();
        infos.sort_by_key(|info| (info.name, info.mode));
        infos.into_iter()
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for InstructionTable {
    fn default() -> Self {
        Self::mos6502()
    }
}

// (mnemonic, mode, opcode, length, cycles, page cycles, branch cycles)
type OpcodeRow = (&'static str, AddressingMode, u8, u8, u8, u8, u8);

use AddressingMode::*;

const OPCODES: &[OpcodeRow] = &[
    ("adc", Immediate,   0x69, 2, 2, 0, 0),
    ("adc", ZeroPage,    0x65, 2, 3, 0, 0),
    ("adc", ZeroPageX,   0x75, 2, 4, 0, 0),
    ("adc", Absolute,    0x6D, 3, 4, 0, 0),
    ("adc", AbsoluteX,   0x7D, 3, 4, 1, 0),
    ("adc", AbsoluteY,   0x79, 3, 4, 1, 0),
    ("adc", IndirectX,   0x61, 2, 6, 0, 0),
    ("adc", IndirectY,   0x71, 2, 5, 1, 0),

    ("and", Immediate,   0x29, 2, 2, 0, 0),
    ("and", ZeroPage,    0x25, 2, 3, 0, 0),
    ("and", ZeroPageX,   0x35, 2, 4, 0, 0),
    ("and", Absolute,    0x2D, 3, 4, 0, 0),
    ("and", AbsoluteX,   0x3D, 3, 4, 1, 0),
    ("and", AbsoluteY,   0x39, 3, 4, 1, 0),
    ("and", IndirectX,   0x21, 2, 6, 0, 0),
    ("and", IndirectY,   0x31, 2, 5, 1, 0),

    ("asl", Accumulator, 0x0A, 1, 2, 0, 0),
    ("asl", ZeroPage,    0x06, 2, 5, 0, 0),
    ("asl", ZeroPageX,   0x16, 2, 6, 0, 0),
    ("asl", Absolute,    0x0E, 3, 6, 0, 0),
    ("asl", AbsoluteX,   0x1E, 3, 7, 0, 0),

    ("bcc", Relative,    0x90, 2, 2, 1, 1),
    ("bcs", Relative,    0xB0, 2, 2, 1, 1),
    ("beq", Relative,    0xF0, 2, 2, 1, 1),

    ("bit", ZeroPage,    0x24, 2, 3, 0, 0),
    ("bit", Absolute,    0x2C, 3, 4, 0, 0),

    ("bmi", Relative,    0x30, 2, 2, 1, 1),
    ("bne", Relative,    0xD0, 2, 2, 1, 1),
    ("bpl", Relative,    0x10, 2, 2, 1, 1),

    ("brk", Implied,     0x00, 1, 7, 0, 0),

    ("bvc", Relative,    0x50, 2, 2, 1, 1),
    ("bvs", Relative,    0x70, 2, 2, 1, 1),

    ("clc", Implied,     0x18, 1, 2, 0, 0),
    ("cld", Implied,     0xD8, 1, 2, 0, 0),
    ("cli", Implied,     0x58, 1, 2, 0, 0),
    ("clv", Implied,     0xB8, 1, 2, 0, 0),

    ("cmp", Immediate,   0xC9, 2, 2, 0, 0),
    ("cmp", ZeroPage,    0xC5, 2, 3, 0, 0),
    ("cmp", ZeroPageX,   0xD5, 2, 4, 0, 0),
    ("cmp", Absolute,    0xCD, 3, 4, 0, 0),
    ("cmp", AbsoluteX,   0xDD, 3, 4, 1, 0),
    ("cmp", AbsoluteY,   0xD9, 3, 4, 1, 0),
    ("cmp", IndirectX,   0xC1, 2, 6, 0, 0),
    ("cmp", IndirectY,   0xD1, 2, 5, 1, 0),

    ("cpx", Immediate,   0xE0, 2, 2, 0, 0),
    ("cpx", ZeroPage,    0xE4, 2, 3, 0, 0),
    ("cpx", Absolute,    0xEC, 3, 4, 0, 0),

    ("cpy", Immediate,   0xC0, 2, 2, 0, 0),
    ("cpy", ZeroPage,    0xC4, 2, 3, 0, 0),
    ("cpy", Absolute,    0xCC, 3, 4, 0, 0),

    ("dec", ZeroPage,    0xC6, 2, 5, 0, 0),
    ("dec", ZeroPageX,   0xD6, 2, 6, 0, 0),
    ("dec", Absolute,    0xCE, 3, 6, 0, 0),
    ("dec", AbsoluteX,   0xDE, 3, 7, 0, 0),

    ("dex", Implied,     0xCA, 1, 2, 0, 0),
    ("dey", Implied,     0x88, 1, 2, 0, 0),

    ("eor", Immediate,   0x49, 2, 2, 0, 0),
    ("eor", ZeroPage,    0x45, 2, 3, 0, 0),
    ("eor", ZeroPageX,   0x55, 2, 4, 0, 0),
    ("eor", Absolute,    0x4D, 3, 4, 0, 0),
    ("eor", AbsoluteX,   0x5D, 3, 4, 1, 0),
    ("eor", AbsoluteY,   0x59, 3, 4, 1, 0),
    ("eor", IndirectX,   0x41, 2, 6, 0, 0),
    ("eor", IndirectY,   0x51, 2, 5, 1, 0),

    ("inc", ZeroPage,    0xE6, 2, 5, 0, 0),
    ("inc", ZeroPageX,   0xF6, 2, 6, 0, 0),
    ("inc", Absolute,    0xEE, 3, 6, 0, 0),
    ("inc", AbsoluteX,   0xFE, 3, 7, 0, 0),

    ("inx", Implied,     0xE8, 1, 2, 0, 0),
    ("iny", Implied,     0xC8, 1, 2, 0, 0),

    ("jmp", Absolute,    0x4C, 3, 3, 0, 0),
    ("jmp", Indirect,    0x6C, 3, 5, 0, 0),

    ("jsr", Absolute,    0x20, 3, 6, 0, 0),

    ("lda", Immediate,   0xA9, 2, 2, 0, 0),
    ("lda", ZeroPage,    0xA5, 2, 3, 0, 0),
    ("lda", ZeroPageX,   0xB5, 2, 4, 0, 0),
    ("lda", Absolute,    0xAD, 3, 4, 0, 0),
    ("lda", AbsoluteX,   0xBD, 3, 4, 1, 0),
    ("lda", AbsoluteY,   0xB9, 3, 4, 1, 0),
    ("lda", IndirectX,   0xA1, 2, 6, 0, 0),
    ("lda", IndirectY,   0xB1, 2, 5, 1, 0),

    ("ldx", Immediate,   0xA2, 2, 2, 0, 0),
    ("ldx", ZeroPage,    0xA6, 2, 3, 0, 0),
    ("ldx", ZeroPageY,   0xB6, 2, 4, 0, 0),
    ("ldx", Absolute,    0xAE, 3, 4, 0, 0),
    ("ldx", AbsoluteY,   0xBE, 3, 4, 1, 0),

    ("ldy", Immediate,   0xA0, 2, 2, 0, 0),
    ("ldy", ZeroPage,    0xA4, 2, 3, 0, 0),
    ("ldy", ZeroPageX,   0xB4, 2, 4, 0, 0),
    ("ldy", Absolute,    0xAC, 3, 4, 0, 0),
    ("ldy", AbsoluteX,   0xBC, 3, 4, 1, 0),

    ("lsr", Accumulator, 0x4A, 1, 2, 0, 0),
    ("lsr", ZeroPage,    0x46, 2, 5, 0, 0),
    ("lsr", ZeroPageX,   0x56, 2, 6, 0, 0),
    ("lsr", Absolute,    0x4E, 3, 6, 0, 0),
    ("lsr", AbsoluteX,   0x5E, 3, 7, 0, 0),

    ("nop", Implied,     0xEA, 1, 2, 0, 0),

    ("ora", Immediate,   0x09, 2, 2, 0, 0),
    ("ora", ZeroPage,    0x05, 2, 3, 0, 0),
    ("ora", ZeroPageX,   0x15, 2, 4, 0, 0),
    ("ora", Absolute,    0x0D, 3, 4, 0, 0),
    ("ora", AbsoluteX,   0x1D, 3, 4, 1, 0),
    ("ora", AbsoluteY,   0x19, 3, 4, 1, 0),
    ("ora", IndirectX,   0x01, 2, 6, 0, 0),
    ("ora", IndirectY,   0x11, 2, 5, 1, 0),

    ("pha", Implied,     0x48, 1, 3, 0, 0),
    ("php", Implied,     0x08, 1, 3, 0, 0),
    ("pla", Implied,     0x68, 1, 4, 0, 0),
    ("plp", Implied,     0x28, 1, 4, 0, 0),

    ("rol", Accumulator, 0x2A, 1, 2, 0, 0),
    ("rol", ZeroPage,    0x26, 2, 5, 0, 0),
    ("rol", ZeroPageX,   0x36, 2, 6, 0, 0),
    ("rol", Absolute,    0x2E, 3, 6, 0, 0),
    ("rol", AbsoluteX,   0x3E, 3, 7, 0, 0),

    ("ror", Accumulator, 0x6A, 1, 2, 0, 0),
    ("ror", ZeroPage,    0x66, 2, 5, 0, 0),
    ("ror", ZeroPageX,   0x76, 2, 6, 0, 0),
    ("ror", Absolute,    0x6E, 3, 6, 0, 0),
    ("ror", AbsoluteX,   0x7E, 3, 7, 0, 0),

    ("rti", Implied,     0x40, 1, 6, 0, 0),
    ("rts", Implied,     0x60, 1, 6, 0, 0),

    ("sbc", Immediate,   0xE9, 2, 2, 0, 0),
    ("sbc", ZeroPage,    0xE5, 2, 3, 0, 0),
    ("sbc", ZeroPageX,   0xF5, 2, 4, 0, 0),
    ("sbc", Absolute,    0xED, 3, 4, 0, 0),
    ("sbc", AbsoluteX,   0xFD, 3, 4, 1, 0),
    ("sbc", AbsoluteY,   0xF9, 3, 4, 1, 0),
    ("sbc", IndirectX,   0xE1, 2, 6, 0, 0),
    ("sbc", IndirectY,   0xF1, 2, 5, 1, 0),

    ("sec", Implied,     0x38, 1, 2, 0, 0),
    ("sed", Implied,     0xF8, 1, 2, 0, 0),
    ("sei", Implied,     0x78, 1, 2, 0, 0),

    ("sta", ZeroPage,    0x85, 2, 3, 0, 0),
    ("sta", ZeroPageX,   0x95, 2, 4, 0, 0),
    ("sta", Absolute,    0x8D, 3, 4, 0, 0),
    ("sta", AbsoluteX,   0x9D, 3, 5, 0, 0),
    ("sta", AbsoluteY,   0x99, 3, 5, 0, 0),
    ("sta", IndirectX,   0x81, 2, 6, 0, 0),
    ("sta", IndirectY,   0x91, 2, 6, 0, 0),

    ("stx", ZeroPage,    0x86, 2, 3, 0, 0),
    ("stx", ZeroPageY,   0x96, 2, 4, 0, 0),
    ("stx", Absolute,    0x8E, 3, 4, 0, 0),

    ("sty", ZeroPage,    0x84, 2, 3, 0, 0),
    ("sty", ZeroPageX,   0x94, 2, 4, 0, 0),
    ("sty", Absolute,    0x8C, 3, 4, 0, 0),

    ("tax", Implied,     0xAA, 1, 2, 0, 0),
    ("tay", Implied,     0xA8, 1, 2, 0, 0),
    ("tsx", Implied,     0xBA, 1, 2, 0, 0),
    ("txa", Implied,     0x8A, 1, 2, 0, 0),
    ("txs", Implied,     0x9A, 1, 2, 0, 0),
    ("tya", Implied,     0x98, 1, 2, 0, 0),
];
