use log::debug;

use crate::analysis::symbol_table::LabelTable;
use crate::error::Line;
use crate::instructions::{AddressingMode, InstructionInfo};
use crate::ir::ir2_placed_forms::{self, PlacedForm};
use crate::ir::Operand;

pub type Label = ir2_placed_forms::Label;
pub type ByteArray = ir2_placed_forms::ByteArray;

#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedForm {
    Label(Label),
    Instruction(Instruction),
    Bytes(ByteArray),
}

/// An instruction whose label operand has been replaced by a number, if the label exists.
/// Operands naming labels that don't exist stay unresolved for the encoder to report.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub address: u16,
    pub info: InstructionInfo,
    pub operand: Option<Operand>,
    pub local_label: bool,
    pub line: Line,
}

/// Substitutes label addresses into operands.
///
/// Relative instructions receive the raw distance `label - address`;
/// absolute, absolute indexed and indirect instructions receive the label's address.
/// Labels are never substituted into zero page modes.
pub fn resolve_labels(forms: Vec<PlacedForm>, labels: &LabelTable) -> Vec<ResolvedForm> {
    let mut unresolved = 0;
    let resolved = forms.into_iter()
        .map(|form| match form {
            PlacedForm::Label(label) => ResolvedForm::Label(label),
            PlacedForm::Bytes(bytes) => ResolvedForm::Bytes(bytes),
            PlacedForm::Instruction(instruction) => {
                let instruction = resolve_instruction(instruction, labels);
                if let Some(Operand::Unresolved(_)) = instruction.operand {
                    unresolved += 1;
                }
                ResolvedForm::Instruction(instruction)
            }
        })
        .collect::<Vec<_>>();
    debug!("resolved labels against {} definitions, {} operands left unresolved", labels.len(), unresolved);
    resolved
}

fn resolve_instruction(instruction: ir2_placed_forms::Instruction, labels: &LabelTable) -> Instruction {
    let ir2_placed_forms::Instruction { address, info, operand, local_label, line } = instruction;
    let operand = operand.map(|operand| match operand {
        Operand::Unresolved(name) => match labels.get(&name, local_label) {
            Some(target) if info.mode == AddressingMode::Relative =>
                Operand::number(i32::from(target) - i32::from(address)),
            Some(target) if info.mode.is_absolute_family() => Operand::number(i32::from(target)),
            _ => Operand::Unresolved(name),
        },
        resolved => resolved,
    });
    Instruction { address, info, operand, local_label, line }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::InstructionTable;
    use crate::LeniencyLevel;
    use crate::analysis::symbol_table::build_label_table;
    use pretty_assertions::assert_eq;

    fn label(name: &str, local: bool, address: u16) -> PlacedForm {
        PlacedForm::Label(Label { address, name: name.to_string(), local, line: None })
    }

    fn instruction(address: u16, name: &str, mode: AddressingMode, operand: &str, local_label: bool) -> PlacedForm {
        let info = InstructionTable::mos6502().get(name, mode).unwrap();
        PlacedForm::Instruction(ir2_placed_forms::Instruction {
            address,
            info,
            operand: Some(Operand::Unresolved(operand.to_string())),
            local_label,
            line: None,
        })
    }

    fn operands(forms: Vec<PlacedForm>) -> Vec<Option<Operand>> {
        let labels = build_label_table(&forms, LeniencyLevel::Lenient).unwrap();
        resolve_labels(forms, &labels).into_iter()
            .filter_map(|form| match form {
                ResolvedForm::Instruction(instruction) => Some(instruction.operand),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn absolute_operands_get_addresses() {
        let forms = vec![
            label("start", false, 0x1000),
            instruction(0x1000, "jmp", AddressingMode::Absolute, "start", false),
            instruction(0x1003, "jmp", AddressingMode::Indirect, "start", false),
            instruction(0x1006, "lda", AddressingMode::AbsoluteX, "start", false),
        ];
        assert_eq!(operands(forms), vec![
            Some(Operand::number(0x1000)),
            Some(Operand::number(0x1000)),
            Some(Operand::number(0x1000)),
        ]);
    }

    #[test]
    fn relative_operands_get_distances() {
        let forms = vec![
            label("loop", true, 0x1002),
            instruction(0x1003, "bne", AddressingMode::Relative, "loop", true),
            instruction(0x1005, "beq", AddressingMode::Relative, "done", true),
            label("done", true, 0x1010),
        ];
        assert_eq!(operands(forms), vec![Some(Operand::number(-1)), Some(Operand::number(0x0B))]);
    }

    #[test]
    fn zero_page_modes_are_not_resolved() {
        let forms = vec![
            label("pointer", false, 0x10),
            instruction(0, "lda", AddressingMode::IndirectY, "pointer", false),
        ];
        assert_eq!(operands(forms), vec![Some(Operand::Unresolved("pointer".to_string()))]);
    }

    #[test]
    fn namespace_follows_the_operand() {
        let forms = vec![
            label("x", false, 0x20),
            instruction(0, "jmp", AddressingMode::Absolute, "x", true),
        ];
        assert_eq!(operands(forms), vec![Some(Operand::Unresolved("x".to_string()))]);
    }
}
