use log::trace;
use num_traits::ToPrimitive;

use crate::error::{Error, Line, OperandRangeReason};
use crate::instructions::{AddressingMode, InstructionInfo};
use crate::ir::ir3_resolved_forms::{self, ResolvedForm};
use crate::ir::{Operand, Value};

pub type Label = ir3_resolved_forms::Label;
pub type ByteArray = ir3_resolved_forms::ByteArray;

#[derive(Clone, Debug, PartialEq)]
pub enum EncodedForm {
    Label(Label),
    Instruction(Instruction),
    Bytes(ByteArray),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub address: u16,
    pub info: InstructionInfo,
    pub operand: Option<Operand>,
    pub local_label: bool,
    /// Empty if the operand never resolved.
    pub bytes: Vec<u8>,
    pub line: Line,
}

pub fn encode(forms: Vec<ResolvedForm>) -> Result<Vec<EncodedForm>, Error> {
    let mut encoded = Vec::with_capacity(forms.len());
    for form in forms {
        encoded.push(match form {
            ResolvedForm::Label(label) => EncodedForm::Label(label),
            ResolvedForm::Bytes(bytes) => EncodedForm::Bytes(bytes),
            ResolvedForm::Instruction(instruction) => {
                let ir3_resolved_forms::Instruction { address, info, operand, local_label, line } = instruction;
                let bytes = encode_instruction(&info, operand.as_ref(), &line)?;
                trace!("${:04X} {} {} -> {:02X?}", address, info.name, info.mode, bytes);
                EncodedForm::Instruction(Instruction { address, info, operand, local_label, bytes, line })
            }
        });
    }
    Ok(encoded)
}

/// Encodes one instruction, checking its operand fits the addressing mode.
///
/// Unresolved operands encode to no bytes at all. Operand-taking modes without
/// an operand are an internal error.
pub fn encode_instruction(info: &InstructionInfo, operand: Option<&Operand>, line: &Line) -> Result<Vec<u8>, Error> {
    use AddressingMode::*;

    let value = match (info.mode, operand) {
        (Implied, _) | (Accumulator, _) => return Ok(vec![info.opcode]),
        (mode, None) => return Err(Error::internal(
            format!("{} {} expects an operand", info.name, mode), line.clone())),
        (_, Some(operand)) => operand,
    };

    let value = match value {
        Operand::Unresolved(_) => return Ok(Vec::new()),
        Operand::Resolved(Value::Number(value)) => *value,
        Operand::Resolved(Value::Immediate(value)) => *value,
        Operand::Resolved(Value::String(_)) => return Err(out_of_range(OperandRangeReason::AddressExpected, line)),
    };

    let bytes = match info.mode {
        Implied | Accumulator => vec![info.opcode],
        Immediate => {
            let operand = value.to_u8()
                .ok_or_else(|| out_of_range(OperandRangeReason::Immediate { value }, line))?;
            vec![info.opcode, operand]
        }
        ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY => {
            let operand = value.to_u8()
                .ok_or_else(|| out_of_range(OperandRangeReason::Address { value, max: 0xFF }, line))?;
            vec![info.opcode, operand]
        }
        Absolute | AbsoluteX | AbsoluteY | Indirect => {
            let address = value.to_u16()
                .ok_or_else(|| out_of_range(OperandRangeReason::Address { value, max: 0xFFFF }, line))?;
            let [low, high] = address.to_le_bytes();
            vec![info.opcode, low, high]
        }
        Relative => {
            // Branches count from the end of the instruction.
            let offset = value.saturating_sub(i32::from(info.length));
            let displacement = offset.to_i8()
                .ok_or_else(|| out_of_range(OperandRangeReason::Branch { offset }, line))?;
            vec![info.opcode, displacement as u8]
        }
    };
    Ok(bytes)
}

fn out_of_range(reason: OperandRangeReason, line: &Line) -> Error {
    Error::OperandRange { reason, line: line.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::InstructionTable;
    use pretty_assertions::assert_eq;

    fn encode_one(name: &str, mode: AddressingMode, operand: Option<Operand>) -> Result<Vec<u8>, Error> {
        let info = InstructionTable::mos6502().get(name, mode).unwrap();
        encode_instruction(&info, operand.as_ref(), &None)
    }

    #[test]
    fn encodes_each_operand_width() {
        assert_eq!(encode_one("rts", AddressingMode::Implied, None), Ok(vec![0x60]));
        assert_eq!(encode_one("lsr", AddressingMode::Accumulator, None), Ok(vec![0x4A]));
        assert_eq!(
            encode_one("lda", AddressingMode::Immediate, Some(Operand::Resolved(Value::Immediate(0x10)))),
            Ok(vec![0xA9, 0x10]));
        assert_eq!(encode_one("sta", AddressingMode::ZeroPage, Some(Operand::number(0x20))), Ok(vec![0x85, 0x20]));
        assert_eq!(encode_one("lda", AddressingMode::IndirectY, Some(Operand::number(0x20))), Ok(vec![0xB1, 0x20]));
        assert_eq!(encode_one("jmp", AddressingMode::Absolute, Some(Operand::number(0x1234))), Ok(vec![0x4C, 0x34, 0x12]));
        assert_eq!(encode_one("jmp", AddressingMode::Indirect, Some(Operand::number(0xFFFC))), Ok(vec![0x6C, 0xFC, 0xFF]));
    }

    #[test]
    fn branch_offsets() {
        assert_eq!(encode_one("bne", AddressingMode::Relative, Some(Operand::number(-1))), Ok(vec![0xD0, 0xFD]));
        assert_eq!(encode_one("beq", AddressingMode::Relative, Some(Operand::number(2))), Ok(vec![0xF0, 0x00]));
        assert_eq!(encode_one("bcc", AddressingMode::Relative, Some(Operand::number(129))), Ok(vec![0x90, 0x7F]));
        assert_eq!(encode_one("bcc", AddressingMode::Relative, Some(Operand::number(-126))), Ok(vec![0x90, 0x80]));
        assert_eq!(
            encode_one("bcc", AddressingMode::Relative, Some(Operand::number(130))),
            Err(Error::OperandRange { reason: OperandRangeReason::Branch { offset: 128 }, line: None }));
        assert_eq!(
            encode_one("bcc", AddressingMode::Relative, Some(Operand::number(-127))),
            Err(Error::OperandRange { reason: OperandRangeReason::Branch { offset: -129 }, line: None }));
    }

    #[test]
    fn out_of_range_operands() {
        assert_eq!(
            encode_one("lda", AddressingMode::ZeroPage, Some(Operand::number(-1))),
            Err(Error::OperandRange { reason: OperandRangeReason::Address { value: -1, max: 0xFF }, line: None }));
        assert_eq!(
            encode_one("jmp", AddressingMode::Absolute, Some(Operand::number(0x10000))),
            Err(Error::OperandRange { reason: OperandRangeReason::Address { value: 0x10000, max: 0xFFFF }, line: None }));
        assert_eq!(
            encode_one("lda", AddressingMode::Immediate, Some(Operand::Resolved(Value::Immediate(300)))),
            Err(Error::OperandRange { reason: OperandRangeReason::Immediate { value: 300 }, line: None }));
    }

    #[test]
    fn missing_operand_is_an_internal_error() {
        assert!(matches!(
            encode_one("lda", AddressingMode::Absolute, None),
            Err(Error::InternalConsistency { .. })));
        assert!(matches!(
            encode_one("bne", AddressingMode::Relative, None),
            Err(Error::InternalConsistency { .. })));
    }

    #[test]
    fn unresolved_operands_encode_to_nothing() {
        assert_eq!(
            encode_one("jmp", AddressingMode::Absolute, Some(Operand::Unresolved("nowhere".to_string()))),
            Ok(vec![]));
    }
}
