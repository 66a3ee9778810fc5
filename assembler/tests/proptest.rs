//! Property-based tests using proptest.

use mos6502_assembler::ast::{OperandSyntax, ParseNode};
use mos6502_assembler::error::{Error, OperandRangeReason};
use mos6502_assembler::instructions::{AddressingMode, InstructionTable};
use mos6502_assembler::ir::Operand;
use mos6502_assembler::ir::ir4_encoded_forms::encode_instruction;
use mos6502_assembler::parse::parse;
use mos6502_assembler::{assemble, Assembled};
use proptest::prelude::*;

fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::char::range('\0', '\x7f'), 0..128)
        .prop_map(|v| v.into_iter().collect())
}

fn branch_mnemonic() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["bcc", "bcs", "beq", "bmi", "bne", "bpl", "bvc", "bvs"])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Parsing and assembling arbitrary text never panics.
    #[test]
    fn no_panic_on_arbitrary_source(source in arb_source()) {
        if let Ok(root) = parse(&source) {
            let _ = assemble(&root);
        }
    }

    /// A branch over `gap` bytes encodes `gap` as its displacement when it fits in a signed byte.
    #[test]
    fn forward_branch_displacement(branch in branch_mnemonic(), gap in 0usize..200) {
        let mut statements = vec![
            ParseNode::instruction(branch, OperandSyntax::LocalLabel, Some(ParseNode::identifier("target"))),
        ];
        statements.extend((0..gap).map(|_| ParseNode::instruction("nop", OperandSyntax::Implicit, None)));
        statements.push(ParseNode::local_label("target"));

        let result = assemble(&ParseNode::statement_list(statements));
        if gap <= 127 {
            let assembled = result.unwrap();
            prop_assert_eq!(assembled[0].bytes()[1], gap as u8);
        } else {
            let is_branch_error = matches!(result,
                Err(Error::OperandRange { reason: OperandRangeReason::Branch { .. }, .. }));
            prop_assert!(is_branch_error);
        }
    }

    /// The displacement is the distance to the target minus the instruction's length.
    #[test]
    fn relative_displacement_law(distance in -200i32..200) {
        let table = InstructionTable::mos6502();
        let info = table.get("bne", AddressingMode::Relative).unwrap();
        let result = encode_instruction(&info, Some(&Operand::number(distance)), &None);
        let offset = distance - 2;
        if (-128..=127).contains(&offset) {
            prop_assert_eq!(result.unwrap(), vec![0xD0, offset as i8 as u8]);
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Absolute operands are always emitted little-endian.
    #[test]
    fn absolute_operands_are_little_endian(address in 0x100u16..=0xFFFF) {
        let root = ParseNode::statement_list(vec![
            ParseNode::instruction("jmp", OperandSyntax::Expression, Some(ParseNode::number(i32::from(address)))),
        ]);
        let assembled = assemble(&root).unwrap();
        let [low, high] = address.to_le_bytes();
        prop_assert_eq!(assembled[0].bytes(), &[0x4C, low, high][..]);
    }
}

/// Every row of the table encodes to its declared length, starting with its opcode.
#[test]
fn every_opcode_encodes_to_its_length() {
    let table = InstructionTable::mos6502();
    for info in table.iter() {
        let operand = match info.mode {
            AddressingMode::Implied | AddressingMode::Accumulator => None,
            _ => Some(Operand::number(2)),
        };
        let bytes = encode_instruction(info, operand.as_ref(), &None).unwrap();
        assert_eq!(bytes.len(), usize::from(info.length), "{} {}", info.name, info.mode);
        assert_eq!(bytes[0], info.opcode, "{} {}", info.name, info.mode);
    }
}

/// Records come back in source order with non-decreasing addresses inside one origin.
#[test]
fn addresses_follow_lengths() {
    let root = parse("start:\n lda #1\n sta $0200\n rts\n .byte 1, 2\nend:").unwrap();
    let assembled = assemble(&root).unwrap();
    let mut expected = 0u16;
    for record in &assembled {
        assert_eq!(record.address(), expected);
        expected += record.bytes().len() as u16;
    }
    assert!(matches!(assembled.last(), Some(Assembled::Label(label)) if label.address == 8));
}
