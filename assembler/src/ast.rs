//! The parse tree consumed by the assembler.
//!
//! A program is a single [`ParseNode`] of kind [`NodeKind::StatementList`].
//! Its children are statements (assignments, commands, labels and
//! instructions), which in turn hold value nodes (identifiers, immediates,
//! numbers and string literals). The tree is usually produced by
//! [`parse`](crate::parse::parse), but any producer that builds these shapes
//! can feed the assembler directly:
//!
//! ```
//! # use mos6502_assembler::ast::*;
//! let root = ParseNode::statement_list(vec![
//!     ParseNode::label("endless"),
//!     ParseNode::instruction("jmp", OperandSyntax::Expression, Some(ParseNode::identifier("endless"))),
//! ]);
//! let assembled = mos6502_assembler::assemble(&root).unwrap();
//! assert_eq!(mos6502_assembler::layer::to_hex_string(&assembled), "4C0000");
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The source line a parse node came from. Only used for diagnostics.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct SourceLine {
    /// 1-based line number in the source file.
    pub number: usize,
    /// The line as written, without its line terminator.
    pub text: String,
    /// The line with comments and surrounding whitespace removed.
    pub assembly: String,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>, assembly: impl Into<String>) -> Self {
        Self { number, text: text.into(), assembly: assembly.into() }
    }
}

impl Display for SourceLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {} near \"{}\"", self.number, self.assembly)
    }
}

/// How an instruction's operand was written.
///
/// The syntax alone does not always determine the addressing mode;
/// [`Expression`](OperandSyntax::Expression), [`XIndex`](OperandSyntax::XIndex) and
/// [`YIndex`](OperandSyntax::YIndex) are narrowed to zero page or absolute modes
/// once the operand's value is known.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperandSyntax {
    /// No operand (`rts`).
    Implicit,
    /// `lsr A`
    Accumulator,
    /// `lda #$10`, `lda $10`, `lda $1000`, `jmp label`
    Expression,
    /// `jmp ($1000)`
    Indirect,
    /// `lda ($10,x)`
    IndirectX,
    /// `lda ($10),y`
    IndirectY,
    /// `lda $10,x`
    XIndex,
    /// `lda $10,y`
    YIndex,
    /// `bne @loop`
    LocalLabel,
    /// `bne *-2`
    Relative,
}

impl OperandSyntax {
    pub fn takes_operand(&self) -> bool {
        !matches!(self, OperandSyntax::Implicit | OperandSyntax::Accumulator)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Assignment { identifier: String, value: Box<ParseNode> },
    Command { name: String, params: Vec<ParseNode> },
    Label { name: String },
    LocalLabel { name: String },
    Instruction { name: String, syntax: OperandSyntax, operand: Option<Box<ParseNode>> },
    Identifier(String),
    Immediate(i32),
    Number(i32),
    StringLiteral(String),
    ExpressionList(Vec<ParseNode>),
    StatementList(Vec<ParseNode>),
}

impl NodeKind {
    /// The node type's name as it appears in diagnostics.
    pub fn type_name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Assignment { .. }     => "assignment",
            Command { .. }        => "command",
            Label { .. }          => "label",
            LocalLabel { .. }     => "localLabel",
            Instruction { .. }    => "instruction",
            Identifier(_)         => "identifier",
            Immediate(_)          => "immediate",
            Number(_)             => "number",
            StringLiteral(_)      => "stringLiteral",
            ExpressionList(_)     => "expressionList",
            StatementList(_)      => "statementList",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub line: Option<Arc<SourceLine>>,
}

impl From<NodeKind> for ParseNode {
    fn from(kind: NodeKind) -> Self {
        Self { kind, line: None }
    }
}

impl ParseNode {
    pub fn assignment(identifier: impl Into<String>, value: ParseNode) -> Self {
        NodeKind::Assignment { identifier: identifier.into(), value: Box::new(value) }.into()
    }

    pub fn command(name: impl Into<String>, params: Vec<ParseNode>) -> Self {
        NodeKind::Command { name: name.into(), params }.into()
    }

    pub fn label(name: impl Into<String>) -> Self {
        NodeKind::Label { name: name.into() }.into()
    }

    pub fn local_label(name: impl Into<String>) -> Self {
        NodeKind::LocalLabel { name: name.into() }.into()
    }

    pub fn instruction(name: impl Into<String>, syntax: OperandSyntax, operand: Option<ParseNode>) -> Self {
        NodeKind::Instruction { name: name.into(), syntax, operand: operand.map(Box::new) }.into()
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        NodeKind::Identifier(name.into()).into()
    }

    pub fn immediate(value: i32) -> Self {
        NodeKind::Immediate(value).into()
    }

    pub fn number(value: i32) -> Self {
        NodeKind::Number(value).into()
    }

    pub fn string_literal(value: impl Into<String>) -> Self {
        NodeKind::StringLiteral(value.into()).into()
    }

    pub fn expression_list(expressions: Vec<ParseNode>) -> Self {
        NodeKind::ExpressionList(expressions).into()
    }

    pub fn statement_list(statements: Vec<ParseNode>) -> Self {
        NodeKind::StatementList(statements).into()
    }

    /// Attaches `line` to this node and every node below it.
    pub fn with_line(mut self, line: Arc<SourceLine>) -> Self {
        use NodeKind::*;
        self.kind = match self.kind {
            Assignment { identifier, value } =>
                Assignment { identifier, value: Box::new(value.with_line(line.clone())) },
            Command { name, params } =>
                Command { name, params: with_lines(params, &line) },
            Instruction { name, syntax, operand } =>
                Instruction { name, syntax, operand: operand.map(|o| Box::new(o.with_line(line.clone()))) },
            ExpressionList(expressions) => ExpressionList(with_lines(expressions, &line)),
            StatementList(statements) => StatementList(with_lines(statements, &line)),
            leaf => leaf,
        };
        self.line = Some(line);
        self
    }

    pub fn source_line(&self) -> Option<&SourceLine> {
        self.line.as_deref()
    }
}

fn with_lines(nodes: Vec<ParseNode>, line: &Arc<SourceLine>) -> Vec<ParseNode> {
    nodes.into_iter()
        .map(|node| node.with_line(line.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn with_line_reaches_every_child() {
        let line = Arc::new(SourceLine::new(3, "  lda ($10),y ; load", "lda ($10),y"));
        let node = ParseNode::instruction("lda", OperandSyntax::IndirectY, Some(ParseNode::number(0x10)))
            .with_line(line.clone());

        assert_eq!(node.source_line(), Some(&*line));
        match node.kind {
            NodeKind::Instruction { operand: Some(operand), .. } => {
                assert_eq!(operand.source_line(), Some(&*line));
            }
            other => panic!("unexpected node: {:?}", other),
        }
    }

    #[test]
    fn source_line_display() {
        let line = SourceLine::new(12, "foo", "foo");
        assert_eq!(line.to_string(), "line 12 near \"foo\"");
    }
}
