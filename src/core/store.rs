//! The session value store
//!
//! Holds the checklist plus every other form value under a composite
//! [`ValueKey`]. The store owns all sub-tables; persistence only reads it
//! or builds a fresh one.

use std::collections::BTreeMap;

use crate::core::key::{ContextId, FieldId, ValueKey};
use crate::core::value::{Scalar, Table, Value};
use crate::entities::checklist::ChecklistTable;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStore {
    pub checklist: ChecklistTable,
    entries: BTreeMap<ValueKey, Value>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ValueKey) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &ValueKey) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn set(&mut self, key: ValueKey, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &ValueKey) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &ValueKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Scalar as text; empty when unset or not a scalar
    pub fn text(&self, key: &ValueKey) -> String {
        self.get(key)
            .and_then(Value::as_scalar)
            .map(Scalar::as_text)
            .unwrap_or_default()
    }

    pub fn set_scalar(&mut self, key: ValueKey, scalar: impl Into<Scalar>) {
        self.set(key, Value::Scalar(scalar.into()));
    }

    pub fn table(&self, key: &ValueKey) -> Option<&Table> {
        self.get(key).and_then(Value::as_table)
    }

    /// Table under `key`, creating it with `init` on first access
    pub fn table_or_insert_with(&mut self, key: ValueKey, init: impl FnOnce() -> Table) -> &mut Table {
        let slot = self
            .entries
            .entry(key)
            .and_modify(|v| {
                if !matches!(v, Value::Table(_)) {
                    *v = Value::Table(Table::default());
                }
            })
            .or_insert_with(|| Value::Table(init()));
        match slot {
            Value::Table(t) => t,
            // Non-table values were replaced above
            _ => unreachable!(),
        }
    }

    pub fn list(&self, key: &ValueKey) -> &[String] {
        self.get(key).and_then(Value::as_list).unwrap_or_default()
    }

    pub fn set_list(&mut self, key: ValueKey, items: Vec<String>) {
        self.set(key, Value::List(items));
    }

    /// Shorthand for a workplace-wide text field
    pub fn global_text(&self, field: FieldId) -> String {
        self.text(&ValueKey::global(field))
    }

    /// Drop every entry owned by `context`, returning how many were removed
    pub fn remove_context(&mut self, context: &ContextId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.context != context);
        before - self.entries.len()
    }

    /// Every key/value pair in key order
    pub fn entries(&self) -> impl Iterator<Item = (&ValueKey, &Value)> {
        self.entries.iter()
    }

    /// Distinct contexts that own at least one entry
    pub fn contexts(&self) -> Vec<ContextId> {
        let mut out: Vec<ContextId> = Vec::new();
        for key in self.entries.keys() {
            if out.last() != Some(&key.context) && !out.contains(&key.context) {
                out.push(key.context.clone());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.checklist.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults_to_empty() {
        let store = ValueStore::new();
        assert_eq!(store.global_text(FieldId::Location), "");
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = ValueStore::new();
        let key = ValueKey::unit(FieldId::Surveyor, "포장반");
        store.set_scalar(key.clone(), "홍길동");
        store.set_scalar(key.clone(), "김철수");
        assert_eq!(store.text(&key), "김철수");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_context_only_touches_owner() {
        let mut store = ValueStore::new();
        store.set_scalar(ValueKey::unit(FieldId::Surveyor, "a"), "x");
        store.set_scalar(ValueKey::unit(FieldId::JobName, "a"), "y");
        store.set_scalar(ValueKey::unit(FieldId::Surveyor, "b"), "z");
        store.set_scalar(ValueKey::global(FieldId::Location), "서울");

        assert_eq!(store.remove_context(&ContextId::unit("a")), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.text(&ValueKey::unit(FieldId::Surveyor, "b")), "z");
    }

    #[test]
    fn test_table_or_insert_with_seeds_once() {
        let mut store = ValueStore::new();
        let key = ValueKey::unit(FieldId::WorkConditions, "a");
        store
            .table_or_insert_with(key.clone(), || Table::new(["x"]))
            .push_blank();
        let table = store.table_or_insert_with(key.clone(), || Table::new(["never"]));
        assert_eq!(table.columns(), ["x"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_contexts_are_distinct() {
        let mut store = ValueStore::new();
        store.set_scalar(ValueKey::unit(FieldId::Surveyor, "a"), "x");
        store.set_scalar(ValueKey::unit(FieldId::JobName, "a"), "y");
        store.set_scalar(ValueKey::investigation(FieldId::DetailedJob, "정밀조사_1"), "z");
        assert_eq!(store.contexts().len(), 2);
    }
}
