use std::collections::HashMap;

use log::warn;

use crate::error::Error;
use crate::ir::ir2_placed_forms::PlacedForm;
use crate::LeniencyLevel;

/// Label addresses, with local (`@name`) and global labels in separate namespaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelTable {
    local: HashMap<String, u16>,
    global: HashMap<String, u16>,
}

impl LabelTable {
    pub fn get(&self, name: &str, local: bool) -> Option<u16> {
        let namespace = if local { &self.local } else { &self.global };
        namespace.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.global.is_empty()
    }
}

/// Records the address of every label in `forms`.
///
/// A label defined twice keeps its last address when duplicates are allowed,
/// and is a [`Error::DuplicateLabel`] otherwise.
pub fn build_label_table(forms: &[PlacedForm], leniency: LeniencyLevel) -> Result<LabelTable, Error> {
    let mut table = LabelTable::default();
    for form in forms {
        if let PlacedForm::Label(label) = form {
            let namespace = if label.local { &mut table.local } else { &mut table.global };
            if let Some(previous) = namespace.insert(label.name.clone(), label.address) {
                if !leniency.duplicate_labels_allowed() {
                    return Err(Error::DuplicateLabel {
                        name: label.name.clone(),
                        local: label.local,
                        line: label.line.clone(),
                    });
                }
                warn!("label '{}{}' redefined: ${:04X} replaces ${:04X}",
                    if label.local { "@" } else { "" }, label.name, label.address, previous);
            }
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ir2_placed_forms::Label;
    use pretty_assertions::assert_eq;

    fn label(name: &str, local: bool, address: u16) -> PlacedForm {
        PlacedForm::Label(Label { address, name: name.to_string(), local, line: None })
    }

    #[test]
    fn namespaces_are_separate() {
        let forms = vec![label("loop", true, 0x10), label("loop", false, 0x20)];
        let table = build_label_table(&forms, LeniencyLevel::Lenient).unwrap();
        assert_eq!(table.get("loop", true), Some(0x10));
        assert_eq!(table.get("loop", false), Some(0x20));
        assert_eq!(table.get("other", false), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn label_at_zero_is_found() {
        let table = build_label_table(&[label("start", false, 0)], LeniencyLevel::Lenient).unwrap();
        assert_eq!(table.get("start", false), Some(0));
    }

    #[test]
    fn lenient_duplicates_keep_the_last_address() {
        let forms = vec![label("x", false, 1), label("x", false, 2)];
        let table = build_label_table(&forms, LeniencyLevel::Lenient).unwrap();
        assert_eq!(table.get("x", false), Some(2));
    }

    #[test]
    fn strict_duplicates_are_errors() {
        let forms = vec![label("x", true, 1), label("x", true, 2)];
        assert_eq!(
            build_label_table(&forms, LeniencyLevel::Strict),
            Err(Error::DuplicateLabel { name: "x".to_string(), local: true, line: None }));
    }
}
