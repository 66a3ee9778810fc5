use log::debug;
use num_traits::ToPrimitive;

use crate::error::{Error, InvalidCommandReason, Line, OperandRangeReason};
use crate::instructions::InstructionInfo;
use crate::ir::ir1_linear_forms::{self, LinearForm};
use crate::ir::{Operand, Value};

/// One past the last addressable byte.
pub const ADDRESS_SPACE: u32 = 0x1_0000;

#[derive(Clone, Debug, PartialEq)]
pub enum PlacedForm {
    Label(Label),
    Instruction(Instruction),
    Bytes(ByteArray),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub address: u16,
    pub name: String,
    pub local: bool,
    pub line: Line,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub address: u16,
    pub info: InstructionInfo,
    pub operand: Option<Operand>,
    pub local_label: bool,
    pub line: Line,
}

/// Raw data emitted by `.byte`.
#[derive(Clone, Debug, PartialEq)]
pub struct ByteArray {
    pub address: u16,
    pub bytes: Vec<u8>,
    pub line: Line,
}

impl PlacedForm {
    pub fn address(&self) -> u16 {
        match self {
            PlacedForm::Label(label) => label.address,
            PlacedForm::Instruction(instruction) => instruction.address,
            PlacedForm::Bytes(bytes) => bytes.address,
        }
    }
}

/// Walks the forms with a location counter starting at 0, executing commands as it goes.
///
/// Commands are consumed here: `.org` moves the counter and `.byte` becomes a [`ByteArray`].
/// Any record that would start at or extend past the end of the address space
/// is a [`Error::ProgramCounterOverflow`].
pub fn assign_addresses(forms: Vec<LinearForm>) -> Result<Vec<PlacedForm>, Error> {
    let mut counter: u32 = 0;
    let mut placed = Vec::with_capacity(forms.len());
    for form in forms {
        match form {
            LinearForm::Label(ir1_linear_forms::Label { name, local, line }) => {
                let address = place(counter, 0, &line)?;
                placed.push(PlacedForm::Label(Label { address, name, local, line }));
            }
            LinearForm::Instruction(ir1_linear_forms::Instruction { info, operand, local_label, line }) => {
                let length = u32::from(info.length);
                let address = place(counter, length, &line)?;
                counter += length;
                placed.push(PlacedForm::Instruction(Instruction { address, info, operand, local_label, line }));
            }
            LinearForm::Command(command) => {
                match command.name.to_ascii_lowercase().as_str() {
                    "org" => {
                        counter = u32::from(origin(&command)?);
                        debug!("origin set to ${:04X}", counter);
                    }
                    "byte" | "byt" => {
                        let bytes = data_bytes(&command)?;
                        let length = bytes.len() as u32;
                        let address = place(counter, length, &command.line)?;
                        counter += length;
                        placed.push(PlacedForm::Bytes(ByteArray { address, bytes, line: command.line }));
                    }
                    _ => return Err(invalid_command(command, InvalidCommandReason::Unknown)),
                }
            }
        }
    }
    debug!("placed {} forms, location counter ended at ${:04X}", placed.len(), counter);
    Ok(placed)
}

/// Checks a record of `length` bytes starting at `counter` fits the address space.
fn place(counter: u32, length: u32, line: &Line) -> Result<u16, Error> {
    let end = counter + length;
    if end > ADDRESS_SPACE {
        return Err(Error::ProgramCounterOverflow { address: end, line: line.clone() });
    }
    counter.to_u16()
        .ok_or_else(|| Error::ProgramCounterOverflow { address: counter, line: line.clone() })
}

fn origin(command: &ir1_linear_forms::Command) -> Result<u16, Error> {
    match command.params.as_slice() {
        [Operand::Resolved(Value::Number(address))] => address.to_u16()
            .ok_or_else(|| invalid_command(command.clone(), InvalidCommandReason::OrgExpectsSingleNumber)),
        _ => Err(invalid_command(command.clone(), InvalidCommandReason::OrgExpectsSingleNumber)),
    }
}

fn data_bytes(command: &ir1_linear_forms::Command) -> Result<Vec<u8>, Error> {
    if command.params.is_empty() {
        return Err(invalid_command(command.clone(), InvalidCommandReason::ByteExpectsValues));
    }

    let mut bytes = Vec::new();
    for param in &command.params {
        match param {
            Operand::Resolved(Value::Number(value)) => {
                let byte = value.to_u8().ok_or_else(|| Error::OperandRange {
                    reason: OperandRangeReason::Byte { value: *value },
                    line: command.line.clone(),
                })?;
                bytes.push(byte);
            }
            Operand::Resolved(Value::String(string)) => {
                for character in string.chars() {
                    let byte = u32::from(character).to_u8().ok_or_else(|| invalid_command(
                        command.clone(),
                        InvalidCommandReason::UnencodableCharacter { character }))?;
                    bytes.push(byte);
                }
            }
            Operand::Resolved(Value::Immediate(_)) | Operand::Unresolved(_) => {
                return Err(invalid_command(command.clone(), InvalidCommandReason::ByteExpectsValues));
            }
        }
    }
    Ok(bytes)
}

fn invalid_command(command: ir1_linear_forms::Command, reason: InvalidCommandReason) -> Error {
    Error::InvalidCommand { name: command.name, reason, line: command.line }
}
