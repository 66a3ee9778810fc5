//! A two-pass assembler for the MOS 6502.
//!
//! The assembler takes a parse tree (see [`ast`]), usually produced by
//! [`parse::parse`], and runs it through a series of passes:
//!
//! 1. [translation](ir::ir1_linear_forms) into labels, instructions and commands,
//!    folding constants and choosing addressing modes;
//! 2. [address assignment](ir::ir2_placed_forms), executing `.org` and `.byte`;
//! 3. [label resolution](ir::ir3_resolved_forms) against the
//!    [label table](analysis::symbol_table);
//! 4. [encoding](ir::ir4_encoded_forms) into bytes.
//!
//! The result is a list of [`Assembled`] records which [`layer`] can turn into
//! hex strings, listings or memory segments.
//!
//! ```
//! # use mos6502_assembler::{assemble, layer, parse::parse};
//! let root = parse(".org $1000\nmy_routine:\n  ldx #10\n@loop:\n  dex\n  bne @loop").unwrap();
//! let assembled = assemble(&root).unwrap();
//! assert_eq!(layer::to_hex_string(&assembled), "A20ACAD0FD");
//! ```

pub mod ast;
pub mod instructions;
pub mod error;
pub mod scope;
pub mod ir;
pub mod analysis;
pub mod assemble;
pub mod parse;
pub mod layer;

pub use assemble::{assemble, Assembled, Assembler};
pub use error::Error;

/// How forgiving the assembler is about questionable but unambiguous input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeniencyLevel {
    /// Labels may be redefined; the last definition wins.
    Lenient,
    Strict,
}

impl LeniencyLevel {
    pub fn duplicate_labels_allowed(&self) -> bool {
        match self {
            LeniencyLevel::Lenient => true,
            LeniencyLevel::Strict => false,
        }
    }
}

impl Default for LeniencyLevel {
    fn default() -> Self {
        LeniencyLevel::Lenient
    }
}
