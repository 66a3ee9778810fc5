use std::collections::HashMap;

use crate::ir::Value;

/// Constants bound by assignments, in one flat namespace.
///
/// Only fully resolved values can be bound, so looking a name up never
/// yields another name.
#[derive(Debug, Default)]
pub struct Scope {
    constants: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Default::default()
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.constants.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_write_wins() {
        let mut scope = Scope::new();
        assert_eq!(scope.bind("foo", Value::Number(1)), None);
        assert_eq!(scope.bind("foo", Value::Immediate(2)), Some(Value::Number(1)));
        assert_eq!(scope.get("foo"), Some(&Value::Immediate(2)));
        assert_eq!(scope.get("bar"), None);
        assert_eq!(scope.len(), 1);
    }
}
