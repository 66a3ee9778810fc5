use std::fmt::{Display, Formatter, Result};
use std::sync::Arc;

use annotate_snippets::display_list::{DisplayList, FormatOptions};
use annotate_snippets::snippet::{Annotation, AnnotationType, Slice, Snippet, SourceAnnotation};

use crate::ast::SourceLine;
use crate::instructions::{AddressingMode, LookupError};

pub type Line = Option<Arc<SourceLine>>;

/// Everything that can stop an assembly. The first error aborts the run.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// A constant was assigned an identifier that isn't bound.
    UndefinedIdentifier { identifier: String, line: Line },
    InvalidInstruction { mnemonic: String, line: Line },
    InvalidAddressingMode { mnemonic: String, mode: AddressingMode, line: Line },
    OperandRange { reason: OperandRangeReason, line: Line },
    InvalidCommand { name: String, reason: InvalidCommandReason, line: Line },
    /// An operand never resolved to a label.
    DanglingReference { identifier: String, local: bool, line: Line },
    /// Only raised under [`LeniencyLevel::Strict`](crate::LeniencyLevel::Strict).
    DuplicateLabel { name: String, local: bool, line: Line },
    ProgramCounterOverflow { address: u32, line: Line },
    /// Unexpected node shapes. Always a bug in whatever produced the input.
    InternalConsistency { message: String, line: Line },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OperandRangeReason {
    Immediate { value: i32 },
    AddressExpected,
    Address { value: i32, max: i32 },
    Branch { offset: i32 },
    Byte { value: i32 },
}

impl Display for OperandRangeReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use OperandRangeReason::*;
        match self {
            Immediate { value } => write!(f, "immediate values must be between 0 and 255 (was: {})", value),
            AddressExpected => write!(f, "expected an address for this addressing mode"),
            Address { value, max } => write!(f, "address {} is outside 0..={:#X}", value, max),
            Branch { offset } => write!(f, "branch offset {} is outside -128..=127", offset),
            Byte { value } => write!(f, "byte values must be between 0 and 255 (was: {})", value),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InvalidCommandReason {
    Unknown,
    OrgExpectsSingleNumber,
    ByteExpectsValues,
    UnencodableCharacter { character: char },
}

impl Display for InvalidCommandReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        use InvalidCommandReason::*;
        match self {
            Unknown => write!(f, "unknown command"),
            OrgExpectsSingleNumber => write!(f, "expects a single numeric address"),
            ByteExpectsValues => write!(f, "expects one or more numbers or strings"),
            UnencodableCharacter { character } => write!(f, "cannot encode {:?} as a single byte", character),
        }
    }
}

impl Error {
    pub(crate) fn lookup(error: LookupError, line: Line) -> Self {
        match error {
            LookupError::InvalidInstruction { name } =>
                Error::InvalidInstruction { mnemonic: name, line },
            LookupError::InvalidAddressingMode { name, mode } =>
                Error::InvalidAddressingMode { mnemonic: name, mode, line },
        }
    }

    pub(crate) fn internal(message: impl Into<String>, line: Line) -> Self {
        Error::InternalConsistency { message: message.into(), line }
    }

    pub fn line(&self) -> Option<&SourceLine> {
        use Error::*;
        match self {
            UndefinedIdentifier { line, .. }
            | InvalidInstruction { line, .. }
            | InvalidAddressingMode { line, .. }
            | OperandRange { line, .. }
            | InvalidCommand { line, .. }
            | DanglingReference { line, .. }
            | DuplicateLabel { line, .. }
            | ProgramCounterOverflow { line, .. }
            | InternalConsistency { line, .. } => line.as_deref(),
        }
    }

    pub fn message(&self) -> String {
        use Error::*;
        match self {
            UndefinedIdentifier { identifier, .. } =>
                format!("'{}' is not defined.", identifier),
            InvalidInstruction { mnemonic, .. } =>
                format!("Invalid instruction: {}", mnemonic),
            InvalidAddressingMode { mnemonic, mode, .. } =>
                format!("Invalid addressing mode for {}: {}", mnemonic, mode),
            OperandRange { reason, .. } =>
                format!("Operand out of range: {}", reason),
            InvalidCommand { name, reason, .. } =>
                format!("Invalid command \".{}\": {}", name, reason),
            DanglingReference { identifier, local, .. } =>
                format!("Unable to resolve label '{}{}'", if *local { "@" } else { "" }, identifier),
            DuplicateLabel { name, local, .. } =>
                format!("Label '{}{}' is defined more than once", if *local { "@" } else { "" }, name),
            ProgramCounterOverflow { address, .. } =>
                format!("Program counter overflowed the address space ({:#X})", address),
            InternalConsistency { message, .. } =>
                format!("Internal error: {}", message),
        }
    }

    /// Renders the error as a diagnostic pointing at its source line.
    pub fn render(&self, origin: Option<&str>, color: bool) -> String {
        render_diagnostic(&self.message(), self.line(), origin, color)
    }
}

/// A line the parser couldn't make sense of.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    pub line: SourceLine,
    pub message: String,
}

impl ParseError {
    pub fn render(&self, origin: Option<&str>, color: bool) -> String {
        render_diagnostic(&self.message, Some(&self.line), origin, color)
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Parse Error, {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Character range of the statement within its line; annotate-snippets counts chars, not bytes.
fn statement_range(line: &SourceLine) -> Option<(usize, usize)> {
    if line.assembly.is_empty() {
        return None;
    }
    let start = line.text.find(line.assembly.as_str())?;
    let start = line.text[..start].chars().count();
    Some((start, start + line.assembly.chars().count()))
}

fn render_diagnostic(message: &str, line: Option<&SourceLine>, origin: Option<&str>, color: bool) -> String {
    let title = Some(Annotation {
        id: None,
        label: Some(message),
        annotation_type: AnnotationType::Error,
    });

    let mut slices = Vec::new();
    if let Some(line) = line {
        let annotations = statement_range(line)
            .map(|range| SourceAnnotation {
                range,
                label: "here",
                annotation_type: AnnotationType::Error,
            })
            .into_iter()
            .collect();
        slices.push(Slice {
            source: line.text.as_str(),
            line_start: line.number,
            origin,
            fold: false,
            annotations,
        });
    }

    let snippet = Snippet {
        title,
        footer: vec![],
        slices,
        opt: FormatOptions { color, ..Default::default() },
    };
    DisplayList::from(snippet).to_string()
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.line() {
            Some(line) => write!(f, "Assembly Error, {}: {}", line, self.message()),
            None => write!(f, "Assembly Error: {}", self.message()),
        }
    }
}

impl std::error::Error for Error {}
