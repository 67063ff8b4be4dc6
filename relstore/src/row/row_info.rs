//! `RowInfo`: the column layout for a row type, partitioned into key and
//! value columns (spec §3). A primary `RowInfo` is authored directly; a
//! secondary one borrows additional key columns from its primary so the
//! primary key always appears somewhere in a secondary's key, guaranteeing
//! join-back is always possible.

use super::column::Column;
use crate::error::RowError;

#[derive(Debug, Clone, PartialEq)]
pub struct RowInfo {
    key: Vec<Column>,
    value: Vec<Column>,
}

impl RowInfo {
    pub fn new(key: Vec<Column>, value: Vec<Column>) -> Result<Self, RowError> {
        let mut seen = std::collections::HashSet::new();
        for c in key.iter().chain(value.iter()) {
            if !seen.insert(c.name.as_str()) {
                return Err(RowError::DuplicateColumn(c.name.clone()));
            }
        }
        Ok(RowInfo { key, value })
    }

    pub fn key_columns(&self) -> &[Column] { &self.key }
    pub fn value_columns(&self) -> &[Column] { &self.value }

    /// Every column, key columns first in their concatenation order, then
    /// value columns — the order invariant (b): "key order is stable".
    pub fn columns(&self) -> impl Iterator<Item = &Column> { self.key.iter().chain(self.value.iter()) }

    pub fn column(&self, name: &str) -> Option<&Column> { self.columns().find(|c| c.name == name) }

    pub fn column_index(&self, name: &str) -> Option<usize> { self.columns().position(|c| c.name == name) }

    pub fn len(&self) -> usize { self.key.len() + self.value.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Derive a secondary `RowInfo`: its key is `descriptor` (by name, drawn
    /// from this row's columns) followed by any primary key column not
    /// already named in `descriptor`, so the primary key is always a
    /// (possibly trailing) subset of the secondary key — invariant (c).
    pub fn derive_secondary(&self, descriptor: &[String]) -> Result<RowInfo, RowError> {
        let mut key = Vec::with_capacity(descriptor.len() + self.key.len());
        for name in descriptor {
            let col = self.column(name).ok_or_else(|| RowError::UnknownColumn(name.clone()))?;
            key.push(col.clone());
        }
        for pk in &self.key {
            if !descriptor.contains(&pk.name) {
                key.push(pk.clone());
            }
        }
        let key_names: std::collections::HashSet<&str> = key.iter().map(|c| c.name.as_str()).collect();
        let value: Vec<Column> = self.columns().filter(|c| !key_names.contains(c.name.as_str())).cloned().collect();
        RowInfo::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relquery::ValueType;

    fn sample() -> RowInfo {
        RowInfo::new(
            vec![Column::new("id", ValueType::I32)],
            vec![Column::new("name", ValueType::String), Column::new("age", ValueType::I32)],
        )
        .unwrap()
    }

    #[test]
    fn union_of_key_and_value_is_full_column_set() {
        let info = sample();
        let names: Vec<&str> = info.columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "age"]);
    }

    #[test]
    fn duplicate_column_name_is_rejected() {
        let err = RowInfo::new(vec![Column::new("id", ValueType::I32)], vec![Column::new("id", ValueType::String)]);
        assert!(matches!(err, Err(RowError::DuplicateColumn(_))));
    }

    #[test]
    fn secondary_key_always_includes_primary_key() {
        let primary = sample();
        let secondary = primary.derive_secondary(&["name".to_string()]).unwrap();
        let key_names: Vec<&str> = secondary.key_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(key_names, vec!["name", "id"]);
        let value_names: Vec<&str> = secondary.value_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(value_names, vec!["age"]);
    }
}
