use std::collections::HashMap;

use crate::types::{SqlValue, TypeHint};

/// One named binding: an advisory type hint plus the bound values.
///
/// A placeholder bound to k values expands to k comma-joined positional
/// markers at every occurrence, in the order the values were supplied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Binding {
    hint: TypeHint,
    values: Vec<SqlValue>,
}

impl Binding {
    pub(crate) fn hint(&self) -> TypeHint {
        self.hint
    }

    pub(crate) fn values(&self) -> &[SqlValue] {
        &self.values
    }
}

/// Current name -> value(s) assignments for the active template.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bindings {
    map: HashMap<String, Binding>,
}

impl Bindings {
    /// Assign values to a name, replacing any prior binding wholesale.
    /// An empty value list binds a single NULL.
    pub(crate) fn set(&mut self, name: impl Into<String>, hint: TypeHint, mut values: Vec<SqlValue>) {
        if values.is_empty() {
            values.push(SqlValue::Null);
        }
        self.map.insert(name.into(), Binding { hint, values });
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Binding> {
        self.map.get(name)
    }

    /// Drop every binding. Invoked when the template changes.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
    }
}
