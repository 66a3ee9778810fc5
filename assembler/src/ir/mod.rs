/// The series of intermediate representations (IRs)
/// the parse tree passes through on its way to bytes.
/// Each pass consumes the previous IR and produces the next,
/// so a later pass can't see a record the earlier passes haven't finished.

/// This pass lowers the parse tree into a linear list of labels,
/// instructions and commands, folding constants and choosing addressing modes.
pub mod ir1_linear_forms;

/// This pass executes commands and assigns every label, instruction and
/// data block its address.
pub mod ir2_placed_forms;

/// This pass substitutes label addresses (or branch distances) into operands.
pub mod ir3_resolved_forms;

/// This pass encodes each instruction into its final bytes.
pub mod ir4_encoded_forms;

/// A fully known value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Number(i32),
    Immediate(i32),
    String(String),
}

/// An operand either has a value or still names something
/// (usually a label) that isn't known yet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    Resolved(Value),
    Unresolved(String),
}

impl Operand {
    pub fn number(value: i32) -> Self {
        Operand::Resolved(Value::Number(value))
    }

    pub fn unresolved_name(&self) -> Option<&str> {
        match self {
            Operand::Unresolved(name) => Some(name.as_str()),
            Operand::Resolved(_) => None,
        }
    }
}
