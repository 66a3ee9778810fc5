use log::{debug, info};

use crate::analysis::symbol_table::build_label_table;
use crate::ast::{ParseNode, SourceLine};
use crate::error::Error;
use crate::instructions::InstructionTable;
use crate::ir::ir1_linear_forms::translate;
use crate::ir::ir2_placed_forms::assign_addresses;
use crate::ir::ir3_resolved_forms::resolve_labels;
use crate::ir::ir4_encoded_forms::{self, encode, EncodedForm};
use crate::scope::Scope;
use crate::LeniencyLevel;

pub type Label = ir4_encoded_forms::Label;
pub type Instruction = ir4_encoded_forms::Instruction;
pub type ByteArray = ir4_encoded_forms::ByteArray;

/// One record of assembled output, in source order.
#[derive(Clone, Debug, PartialEq)]
pub enum Assembled {
    Label(Label),
    Instruction(Instruction),
    Bytes(ByteArray),
}

impl Assembled {
    pub fn address(&self) -> u16 {
        match self {
            Assembled::Label(label) => label.address,
            Assembled::Instruction(instruction) => instruction.address,
            Assembled::Bytes(bytes) => bytes.address,
        }
    }

    /// The bytes this record occupies in memory. Labels occupy none.
    pub fn bytes(&self) -> &[u8] {
        match self {
            Assembled::Label(_) => &[],
            Assembled::Instruction(instruction) => &instruction.bytes,
            Assembled::Bytes(bytes) => &bytes.bytes,
        }
    }

    pub fn line(&self) -> Option<&SourceLine> {
        match self {
            Assembled::Label(label) => label.line.as_deref(),
            Assembled::Instruction(instruction) => instruction.line.as_deref(),
            Assembled::Bytes(bytes) => bytes.line.as_deref(),
        }
    }
}

/// Runs the assembly passes over parse trees.
///
/// An `Assembler` holds no state between runs; assembling the same tree twice
/// gives the same records.
pub struct Assembler<'t> {
    instructions: &'t InstructionTable,
    leniency: LeniencyLevel,
}

impl<'t> Assembler<'t> {
    pub fn new(instructions: &'t InstructionTable, leniency: LeniencyLevel) -> Self {
        Self { instructions, leniency }
    }

    pub fn leniency(&self) -> LeniencyLevel {
        self.leniency
    }

    /// Assembles a `statementList` into records, stopping at the first error.
    pub fn assemble(&self, root: &ParseNode) -> Result<Vec<Assembled>, Error> {
        let mut scope = Scope::new();
        let linear = translate(root, &mut scope, self.instructions)?;
        let placed = assign_addresses(linear)?;
        let labels = build_label_table(&placed, self.leniency)?;
        debug!("{} labels defined", labels.len());
        let resolved = resolve_labels(placed, &labels);
        let encoded = encode(resolved)?;

        let assembled = encoded.into_iter()
            .map(check_resolved)
            .collect::<Result<Vec<_>, _>>()?;
        info!("assembled {} records ({} bytes)",
            assembled.len(), assembled.iter().map(|record| record.bytes().len()).sum::<usize>());
        Ok(assembled)
    }
}

/// Rejects instructions whose operand never resolved to a label.
fn check_resolved(form: EncodedForm) -> Result<Assembled, Error> {
    match form {
        EncodedForm::Label(label) => Ok(Assembled::Label(label)),
        EncodedForm::Bytes(bytes) => Ok(Assembled::Bytes(bytes)),
        EncodedForm::Instruction(instruction) => {
            if instruction.bytes.is_empty() {
                let identifier = instruction.operand.as_ref()
                    .and_then(|operand| operand.unresolved_name())
                    .unwrap_or_default()
                    .to_string();
                return Err(Error::DanglingReference {
                    identifier,
                    local: instruction.local_label,
                    line: instruction.line,
                });
            }
            Ok(Assembled::Instruction(instruction))
        }
    }
}

/// Assembles `root` for the NMOS 6502 with the default [`LeniencyLevel`].
pub fn assemble(root: &ParseNode) -> Result<Vec<Assembled>, Error> {
    let instructions = InstructionTable::mos6502();
    Assembler::new(&instructions, LeniencyLevel::default()).assemble(root)
}
