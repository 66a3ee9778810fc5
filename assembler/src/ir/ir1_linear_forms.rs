use log::debug;

use crate::ast::{NodeKind, OperandSyntax, ParseNode};
use crate::error::{Error, Line, OperandRangeReason};
use crate::instructions::{AddressingMode, InstructionInfo, InstructionTable};
use crate::ir::{Operand, Value};
use crate::scope::Scope;

#[derive(Clone, Debug, PartialEq)]
pub enum LinearForm {
    Label(Label),
    Instruction(Instruction),
    Command(Command),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub name: String,
    pub local: bool,
    pub line: Line,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub info: InstructionInfo,
    pub operand: Option<Operand>,
    /// The operand names a local (`@name`) label.
    pub local_label: bool,
    pub line: Line,
}

/// A directive invocation, left uninterpreted until addresses are assigned.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub name: String,
    pub params: Vec<Operand>,
    pub line: Line,
}

/// Lowers a `statementList` into linear forms, binding constants into `scope` as it goes.
pub fn translate(root: &ParseNode, scope: &mut Scope, table: &InstructionTable) -> Result<Vec<LinearForm>, Error> {
    if !matches!(root.kind, NodeKind::StatementList(_)) {
        return Err(Error::internal(
            format!("expected a statementList at the root, found {}", root.kind.type_name()),
            root.line.clone()));
    }

    let mut forms = Vec::new();
    Translator { scope: &mut *scope, table }.statement(root, &mut forms)?;
    debug!("translated {} linear forms ({} constants bound)", forms.len(), scope.len());
    Ok(forms)
}

struct Translator<'a> {
    scope: &'a mut Scope,
    table: &'a InstructionTable,
}

impl<'a> Translator<'a> {
    fn statement(&mut self, node: &ParseNode, forms: &mut Vec<LinearForm>) -> Result<(), Error> {
        let line = node.line.clone();
        match &node.kind {
            NodeKind::StatementList(statements) => {
                for statement in statements {
                    self.statement(statement, forms)?;
                }
            }
            NodeKind::Assignment { identifier, value } => {
                match self.value(value)? {
                    Operand::Unresolved(name) => {
                        return Err(Error::UndefinedIdentifier { identifier: name, line });
                    }
                    Operand::Resolved(value) => {
                        self.scope.bind(identifier.clone(), value);
                    }
                }
            }
            NodeKind::Command { name, params } => {
                let params = params.iter()
                    .map(|param| self.value(param))
                    .collect::<Result<Vec<_>, _>>()?;
                forms.push(LinearForm::Command(Command { name: name.clone(), params, line }));
            }
            NodeKind::Label { name } => {
                forms.push(LinearForm::Label(Label { name: name.clone(), local: false, line }));
            }
            NodeKind::LocalLabel { name } => {
                forms.push(LinearForm::Label(Label { name: name.clone(), local: true, line }));
            }
            NodeKind::Instruction { name, syntax, operand } => {
                let instruction = self.instruction(name, *syntax, operand.as_deref(), line)?;
                forms.push(LinearForm::Instruction(instruction));
            }

            // No wildcard: a new node kind has to be handled here
            NodeKind::Identifier(_)
            | NodeKind::Immediate(_)
            | NodeKind::Number(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::ExpressionList(_) => {
                return Err(Error::internal(
                    format!("unexpected {} node in statement position", node.kind.type_name()),
                    line));
            }
        }
        Ok(())
    }

    fn value(&self, node: &ParseNode) -> Result<Operand, Error> {
        match &node.kind {
            NodeKind::Identifier(name) => Ok(
                match self.scope.get(name) {
                    Some(value) => Operand::Resolved(value.clone()),
                    None => Operand::Unresolved(name.clone()),
                }),
            NodeKind::Immediate(value) => {
                if (0..=0xFF).contains(value) {
                    Ok(Operand::Resolved(Value::Immediate(*value)))
                } else {
                    Err(Error::OperandRange {
                        reason: OperandRangeReason::Immediate { value: *value },
                        line: node.line.clone(),
                    })
                }
            }
            NodeKind::Number(value) => Ok(Operand::number(*value)),
            NodeKind::StringLiteral(value) => Ok(Operand::Resolved(Value::String(value.clone()))),

            NodeKind::Assignment { .. }
            | NodeKind::Command { .. }
            | NodeKind::Label { .. }
            | NodeKind::LocalLabel { .. }
            | NodeKind::Instruction { .. }
            | NodeKind::ExpressionList(_)
            | NodeKind::StatementList(_) => Err(Error::internal(
                format!("unexpected {} node in value position", node.kind.type_name()),
                node.line.clone())),
        }
    }

    fn instruction(&self, name: &str, syntax: OperandSyntax, operand: Option<&ParseNode>, line: Line) -> Result<Instruction, Error> {
        if !self.table.is_mnemonic(name) {
            return Err(Error::InvalidInstruction { mnemonic: name.to_string(), line });
        }

        if operand.is_some() && !syntax.takes_operand() {
            return Err(Error::internal(format!("{:?} instruction '{}' has an operand", syntax, name), line));
        }

        let mut local_label = false;
        let (mode, operand) = match (syntax, operand) {
            (OperandSyntax::Implicit, _) => (AddressingMode::Implied, None),
            (OperandSyntax::Accumulator, _) => (AddressingMode::Accumulator, None),
            (OperandSyntax::Expression, Some(node)) => {
                let value = self.value(node)?;
                let mode = match &value {
                    Operand::Resolved(Value::Number(n)) =>
                        if *n <= 0xFF { AddressingMode::ZeroPage } else { AddressingMode::Absolute },
                    Operand::Resolved(Value::Immediate(_)) => AddressingMode::Immediate,
                    // Assume it's a global label
                    Operand::Unresolved(_) => AddressingMode::Absolute,
                    Operand::Resolved(Value::String(_)) => return Err(address_expected(&line)),
                };
                (mode, Some(value))
            }
            (OperandSyntax::Indirect, Some(node)) => (AddressingMode::Indirect, Some(self.address(node, &line)?)),
            (OperandSyntax::IndirectX, Some(node)) => (AddressingMode::IndirectX, Some(self.address(node, &line)?)),
            (OperandSyntax::IndirectY, Some(node)) => (AddressingMode::IndirectY, Some(self.address(node, &line)?)),
            (OperandSyntax::XIndex, Some(node)) => {
                let value = self.address(node, &line)?;
                (indexed_mode(&value, AddressingMode::ZeroPageX, AddressingMode::AbsoluteX), Some(value))
            }
            (OperandSyntax::YIndex, Some(node)) => {
                let value = self.address(node, &line)?;
                (indexed_mode(&value, AddressingMode::ZeroPageY, AddressingMode::AbsoluteY), Some(value))
            }
            (OperandSyntax::LocalLabel, Some(node)) => {
                let label = match &node.kind {
                    NodeKind::Identifier(label) => label.clone(),
                    other => return Err(Error::internal(
                        format!("local label operand must be an identifier, found {}", other.type_name()),
                        line)),
                };
                local_label = true;
                let mode = if is_jump(name) { AddressingMode::Absolute } else { AddressingMode::Relative };
                (mode, Some(Operand::Unresolved(label)))
            }
            (OperandSyntax::Relative, Some(node)) => {
                match self.value(node)? {
                    Operand::Resolved(Value::Number(offset)) =>
                        (AddressingMode::Relative, Some(Operand::number(offset))),
                    Operand::Unresolved(identifier) =>
                        return Err(Error::UndefinedIdentifier { identifier, line }),
                    Operand::Resolved(_) => return Err(address_expected(&line)),
                }
            }
            (_, None) => return Err(Error::internal(
                format!("{:?} instruction '{}' has no operand", syntax, name), line)),
        };

        let info = self.table.get(name, mode)
            .map_err(|e| Error::lookup(e, line.clone()))?;
        Ok(Instruction { info, operand, local_label, line })
    }

    /// Translates an operand that must name a memory location.
    fn address(&self, node: &ParseNode, line: &Line) -> Result<Operand, Error> {
        match self.value(node)? {
            Operand::Resolved(Value::Immediate(_)) | Operand::Resolved(Value::String(_)) =>
                Err(address_expected(line)),
            operand => Ok(operand),
        }
    }
}

fn indexed_mode(operand: &Operand, zero_page: AddressingMode, absolute: AddressingMode) -> AddressingMode {
    match operand {
        Operand::Resolved(Value::Number(n)) if *n <= 0xFF => zero_page,
        _ => absolute,
    }
}

/// A local label used by an unconditional jump is an absolute target rather than a branch offset.
fn is_jump(name: &str) -> bool {
    name.eq_ignore_ascii_case("jmp")
}

fn address_expected(line: &Line) -> Error {
    Error::OperandRange { reason: OperandRangeReason::AddressExpected, line: line.clone() }
}
