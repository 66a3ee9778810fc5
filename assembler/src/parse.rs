//! Turns assembly source text into a parse tree.
//!
//! Parsing works one line at a time. Comments (`;` to end of line) and
//! surrounding whitespace are stripped, blank lines are skipped, and each
//! remaining line becomes one or two statements (a label may share its line
//! with a statement). Every node remembers the [`SourceLine`] it came from.
//!
//! ```
//! # use mos6502_assembler::ast::*;
//! # use mos6502_assembler::parse::parse;
//! let root = parse("start: lda #$10 ; load\n  bne @start").unwrap();
//! match root.kind {
//!     NodeKind::StatementList(statements) => {
//!         assert_eq!(statements.len(), 3);
//!         assert_eq!(statements[0].kind, NodeKind::Label { name: "start".to_string() });
//!         assert_eq!(statements[1].source_line().unwrap().number, 1);
//!         assert_eq!(statements[2].source_line().unwrap().assembly, "bne @start");
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! A source with bad lines fails with one [`ParseError`] per bad line.

use std::sync::Arc;

use log::debug;
use regex::{Captures, Regex};

use crate::ast::{OperandSyntax, ParseNode, SourceLine};
use crate::error::ParseError;

/// Parses `source` with a fresh [`LineParser`].
pub fn parse(source: &str) -> Result<ParseNode, Vec<ParseError>> {
    LineParser::new().parse(source)
}

pub struct LineParser {
    assignment: Regex,
    label: Regex,
    command: Regex,
    instruction: Regex,

    accumulator: Regex,
    local_label: Regex,
    relative: Regex,
    indirect_x: Regex,
    indirect_y: Regex,
    indirect: Regex,
    x_index: Regex,
    y_index: Regex,

    immediate: Regex,
    hex: Regex,
    binary: Regex,
    decimal: Regex,
    string: Regex,
    identifier: Regex,
}

const IDENTIFIER: &str = r"[A-Za-z_][A-Za-z0-9_]*";

impl LineParser {
    pub fn new() -> Self {
        let id = IDENTIFIER;
        Self {
            assignment:  anchored(&format!(r"({})\s*=\s*(.+)", id)),
            label:       anchored(&format!(r"(@?)({}):\s*(.*)", id)),
            command:     anchored(&format!(r"\.({})(.*)", id)),
            instruction: anchored(r"([A-Za-z]{3})(?:\s+(.+))?"),

            accumulator: anchored(r"(?i)a"),
            local_label: anchored(&format!(r"@({})", id)),
            relative:    anchored(r"\*\s*([+-])\s*(\S+)"),
            indirect_x:  anchored(r"(?i)\(\s*(.+?)\s*,\s*x\s*\)"),
            indirect_y:  anchored(r"(?i)\(\s*(.+?)\s*\)\s*,\s*y"),
            indirect:    anchored(r"\(\s*(.+?)\s*\)"),
            x_index:     anchored(r"(?i)(.+?)\s*,\s*x"),
            y_index:     anchored(r"(?i)(.+?)\s*,\s*y"),

            immediate:   anchored(r"#\s*(.+)"),
            hex:         anchored(r"\$([0-9A-Fa-f]+)"),
            binary:      anchored(r"%([01]+)"),
            decimal:     anchored(r"([0-9]+)"),
            string:      anchored(r#""((?:[^"\\]|\\.)*)""#),
            identifier:  anchored(id),
        }
    }

    /// Parses every line, collecting the errors of all bad lines.
    pub fn parse(&self, source: &str) -> Result<ParseNode, Vec<ParseError>> {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        for (index, text) in source.split('\n').enumerate() {
            let text = text.strip_suffix('\r').unwrap_or(text);
            let assembly = strip_comment(text).trim();
            if assembly.is_empty() {
                continue;
            }

            let line = Arc::new(SourceLine::new(index + 1, text, assembly));
            match self.parse_line(assembly) {
                Ok(nodes) => statements.extend(nodes.into_iter().map(|node| node.with_line(line.clone()))),
                Err(message) => errors.push(ParseError { line: (*line).clone(), message }),
            }
        }

        if !errors.is_empty() {
            debug!("{} lines failed to parse", errors.len());
            return Err(errors);
        }
        Ok(ParseNode::statement_list(statements))
    }

    /// Parses one stripped, non-empty line into its statements.
    pub fn parse_line(&self, assembly: &str) -> Result<Vec<ParseNode>, String> {
        if let Some(captures) = self.label.captures(assembly) {
            let name = &captures[2];
            let label = if captures[1].is_empty() {
                ParseNode::label(name)
            } else {
                ParseNode::local_label(name)
            };
            let rest = captures[3].trim();
            let mut nodes = vec![label];
            if !rest.is_empty() {
                nodes.push(self.statement(rest)?);
            }
            return Ok(nodes);
        }
        Ok(vec![self.statement(assembly)?])
    }

    fn statement(&self, text: &str) -> Result<ParseNode, String> {
        if let Some(captures) = self.assignment.captures(text) {
            return Ok(ParseNode::assignment(&captures[1], self.value(captures[2].trim())?));
        }
        if let Some(captures) = self.command.captures(text) {
            let name = captures[1].to_ascii_lowercase();
            let params = self.params(captures[2].trim())?;
            return Ok(ParseNode::command(name, params));
        }
        if let Some(captures) = self.instruction.captures(text) {
            let name = captures[1].to_ascii_lowercase();
            return match captures.get(2) {
                None => Ok(ParseNode::instruction(name, OperandSyntax::Implicit, None)),
                Some(operand) => {
                    let (syntax, operand) = self.operand(operand.as_str().trim())?;
                    Ok(ParseNode::instruction(name, syntax, operand))
                }
            };
        }
        Err(format!("expected a label, assignment, command or instruction, found \"{}\"", text))
    }

    fn params(&self, text: &str) -> Result<Vec<ParseNode>, String> {
        let inner = if text.starts_with('(') {
            text.strip_prefix('(')
                .and_then(|inner| inner.strip_suffix(')'))
                .ok_or_else(|| format!("unbalanced parentheses in \"{}\"", text))?
                .trim()
        } else {
            text
        };
        if inner.is_empty() {
            return Ok(Vec::new());
        }
        split_params(inner)?.into_iter()
            .map(|param| self.value(param.trim()))
            .collect()
    }

    fn operand(&self, text: &str) -> Result<(OperandSyntax, Option<ParseNode>), String> {
        use OperandSyntax::*;

        if self.accumulator.is_match(text) {
            return Ok((Accumulator, None));
        }
        if let Some(captures) = self.local_label.captures(text) {
            return Ok((LocalLabel, Some(ParseNode::identifier(&captures[1]))));
        }
        if let Some(captures) = self.relative.captures(text) {
            let magnitude = self.number(&captures[2])
                .ok_or_else(|| format!("expected a number after '*{}', found \"{}\"", &captures[1], &captures[2]))??;
            let offset = if &captures[1] == "-" { -magnitude } else { magnitude };
            return Ok((Relative, Some(ParseNode::number(offset))));
        }

        let indexed: [(&Regex, OperandSyntax); 5] = [
            (&self.indirect_x, IndirectX),
            (&self.indirect_y, IndirectY),
            (&self.indirect, Indirect),
            (&self.x_index, XIndex),
            (&self.y_index, YIndex),
        ];
        for (pattern, syntax) in indexed.iter() {
            if let Some(captures) = pattern.captures(text) {
                return Ok((*syntax, Some(self.value(&captures[1])?)));
            }
        }

        Ok((Expression, Some(self.value(text)?)))
    }

    fn value(&self, text: &str) -> Result<ParseNode, String> {
        if let Some(captures) = self.immediate.captures(text) {
            let value = self.number(captures[1].trim())
                .ok_or_else(|| format!("expected a number after '#', found \"{}\"", &captures[1]))??;
            return Ok(ParseNode::immediate(value));
        }
        if let Some(number) = self.number(text) {
            return Ok(ParseNode::number(number?));
        }
        if let Some(captures) = self.string.captures(text) {
            return Ok(ParseNode::string_literal(unescape(&captures[1])));
        }
        if self.identifier.is_match(text) {
            return Ok(ParseNode::identifier(text));
        }
        Err(format!("expected a number, string or identifier, found \"{}\"", text))
    }

    /// `None` if `text` isn't shaped like a number at all.
    fn number(&self, text: &str) -> Option<Result<i32, String>> {
        let to_i32 = |captures: Captures, radix| {
            i32::from_str_radix(&captures[1], radix)
                .map_err(|_| format!("number \"{}\" is too large", text))
        };
        if let Some(captures) = self.hex.captures(text) {
            return Some(to_i32(captures, 16));
        }
        if let Some(captures) = self.binary.captures(text) {
            return Some(to_i32(captures, 2));
        }
        if let Some(captures) = self.decimal.captures(text) {
            return Some(to_i32(captures, 10));
        }
        None
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{})$", pattern)).expect("Invalid regex")
}

/// Drops everything from the first `;` that isn't inside a string literal.
fn strip_comment(text: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ';' if !in_string => return &text[..index],
            _ => {}
        }
    }
    text
}

/// Splits on commas outside string literals.
fn split_params(text: &str) -> Result<Vec<&str>, String> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;
    for (index, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                params.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if in_string {
        return Err(format!("unterminated string in \"{}\"", text));
    }
    params.push(&text[start..]);
    Ok(params)
}

fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => unescaped.push('\n'),
                Some('r') => unescaped.push('\r'),
                Some('t') => unescaped.push('\t'),
                Some('0') => unescaped.push('\0'),
                Some(other) => unescaped.push(other),
                None => unescaped.push('\\'),
            },
            c => unescaped.push(c),
        }
    }
    unescaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use pretty_assertions::assert_eq;

    fn line(assembly: &str) -> Vec<ParseNode> {
        LineParser::new().parse_line(assembly).unwrap()
    }

    fn single(assembly: &str) -> ParseNode {
        let mut nodes = line(assembly);
        assert_eq!(nodes.len(), 1);
        nodes.remove(0)
    }

    #[test]
    fn assignments() {
        assert_eq!(single("foo = $1000"), ParseNode::assignment("foo", ParseNode::number(0x1000)));
        assert_eq!(single("foo = bar"), ParseNode::assignment("foo", ParseNode::identifier("bar")));
        assert_eq!(single("foo = #%10000001"), ParseNode::assignment("foo", ParseNode::immediate(129)));
        assert_eq!(single("greeting=\"hi\""), ParseNode::assignment("greeting", ParseNode::string_literal("hi")));
    }

    #[test]
    fn commands() {
        assert_eq!(single(".NES_HACKER"), ParseNode::command("nes_hacker", vec![]));
        assert_eq!(single(".hello(#1, $2, foo)"), ParseNode::command("hello", vec![
            ParseNode::immediate(1),
            ParseNode::number(2),
            ParseNode::identifier("foo"),
        ]));
        assert_eq!(single(".org $C000"), ParseNode::command("org", vec![ParseNode::number(0xC000)]));
        assert_eq!(single(".byte \"a,b\", 0"), ParseNode::command("byte", vec![
            ParseNode::string_literal("a,b"),
            ParseNode::number(0),
        ]));
    }

    #[test]
    fn labels() {
        assert_eq!(single("start:"), ParseNode::label("start"));
        assert_eq!(single("@loop:"), ParseNode::local_label("loop"));
        assert_eq!(line("@loop: dex"), vec![
            ParseNode::local_label("loop"),
            ParseNode::instruction("dex", OperandSyntax::Implicit, None),
        ]);
    }

    #[test]
    fn instruction_syntaxes() {
        use OperandSyntax::*;
        let ins = |name: &str, syntax, operand| ParseNode::instruction(name, syntax, Some(operand));

        assert_eq!(single("ror"), ParseNode::instruction("ror", Implicit, None));
        assert_eq!(single("LSR A"), ParseNode::instruction("lsr", Accumulator, None));
        assert_eq!(single("ldx #$10"), ins("ldx", Expression, ParseNode::immediate(0x10)));
        assert_eq!(single("lsr $FA"), ins("lsr", Expression, ParseNode::number(0xFA)));
        assert_eq!(single("lda $10,x"), ins("lda", XIndex, ParseNode::number(0x10)));
        assert_eq!(single("ldx table, Y"), ins("ldx", YIndex, ParseNode::identifier("table")));
        assert_eq!(single("jmp ($FFFC)"), ins("jmp", Indirect, ParseNode::number(0xFFFC)));
        assert_eq!(single("lda ($FF,X)"), ins("lda", IndirectX, ParseNode::number(0xFF)));
        assert_eq!(single("lda ($AA),Y"), ins("lda", IndirectY, ParseNode::number(0xAA)));
        assert_eq!(single("bne @loop"), ins("bne", LocalLabel, ParseNode::identifier("loop")));
        assert_eq!(single("bcc *+4"), ins("bcc", Relative, ParseNode::number(4)));
        assert_eq!(single("bcs * - 2"), ins("bcs", Relative, ParseNode::number(-2)));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(single(r#".byte "say \"hi\"\\""#), ParseNode::command("byte", vec![
            ParseNode::string_literal("say \"hi\"\\"),
        ]));
    }

    #[test]
    fn source_lines_are_attached() {
        let root = parse("\n  ; only a comment\n\tnop ; does nothing\r\n").unwrap();
        match root.kind {
            NodeKind::StatementList(statements) => {
                assert_eq!(statements.len(), 1);
                let line = statements[0].source_line().unwrap();
                assert_eq!(line, &SourceLine::new(3, "\tnop ; does nothing", "nop"));
            }
            other => panic!("expected a statementList, got {:?}", other),
        }
    }

    #[test]
    fn comments_inside_strings_are_kept() {
        assert_eq!(strip_comment(r#".byte ";" ; trailing"#), r#".byte ";" "#);
    }

    #[test]
    fn errors_are_collected_per_line() {
        let errors = parse("lda #\nnop\n.byte \"open\n!!!").unwrap_err();
        assert_eq!(errors.iter().map(|error| error.line.number).collect::<Vec<_>>(), vec![1, 3, 4]);
    }

    #[test]
    fn oversized_numbers_are_errors() {
        assert!(LineParser::new().parse_line("lda $FFFFFFFFFF").is_err());
    }
}
