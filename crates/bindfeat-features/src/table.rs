//! In-memory feature table.
//!
//! A `FeatureTable` is an ordered list of rows over an ordered list of columns.
//! Column order is insertion order and survives every transformation in this
//! crate. One column is designated as the key; it is an ordinary member of the
//! column list, so manifests and output include it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use bindfeat_common::{FeatureError, Result, SchemaError};

/// A single cell. Loaded cells are always `Text`; `Int` only appears for
/// derived columns and `Missing` only for unmatched left-join cells or failed
/// identifier extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Missing,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Missing => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    name: String,
    key: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl FeatureTable {
    /// Build a table, checking that column names are unique, the key column
    /// exists and every row has one cell per column.
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self> {
        let name = name.into();
        let key = key.into();

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: name,
                    column: column.clone(),
                }
                .into());
            }
        }
        if !seen.contains(key.as_str()) {
            return Err(SchemaError::MissingKeyColumn { table: name, column: key }.into());
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(FeatureError::parse(
                &name,
                format!("row {} has {} cells, expected {}", i + 1, row.len(), columns.len()),
            ));
        }

        Ok(Self { name, key, columns, rows })
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows(name: &str, key: &str, columns: &[&str], rows: &[&[&str]]) -> Result<Self> {
        Self::new(
            name,
            key,
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|v| Value::from(*v)).collect())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn key_index(&self) -> usize {
        // Every constructor and mutator keeps the key column present.
        self.column_index(&self.key).unwrap_or(0)
    }

    /// Values of one column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn key_values(&self) -> impl Iterator<Item = &Value> + '_ {
        let idx = self.key_index();
        self.rows.iter().map(move |r| &r[idx])
    }

    /// Distinct non-missing key values, sorted.
    pub fn key_set(&self) -> BTreeSet<String> {
        self.key_values()
            .filter(|v| !v.is_missing())
            .map(|v| v.to_string())
            .collect()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_key(&mut self, key: &str) -> Result<()> {
        if !self.has_column(key) {
            return Err(SchemaError::MissingKeyColumn {
                table: self.name.clone(),
                column: key.to_string(),
            }
            .into());
        }
        self.key = key.to_string();
        Ok(())
    }

    /// Rename a column, following the key designation if the key is renamed.
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return Ok(());
        }
        let idx = self.column_index(from).ok_or_else(|| SchemaError::MissingColumn {
            table: self.name.clone(),
            column: from.to_string(),
        })?;
        if self.has_column(to) {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: to.to_string(),
            }
            .into());
        }
        self.columns[idx] = to.to_string();
        if self.key == from {
            self.key = to.to_string();
        }
        Ok(())
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        if self.has_column(name) {
            return Err(SchemaError::DuplicateColumn {
                table: self.name.clone(),
                column: name.to_string(),
            }
            .into());
        }
        self.check_length(name, values.len())?;
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    /// Replace the values of an existing column in place.
    pub fn replace_column(&mut self, name: &str, values: Vec<Value>) -> Result<()> {
        let idx = self.column_index(name).ok_or_else(|| SchemaError::MissingColumn {
            table: self.name.clone(),
            column: name.to_string(),
        })?;
        self.check_length(name, values.len())?;
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(())
    }

    /// Remove a non-key column, returning its values. `None` when the column
    /// is absent or is the key.
    pub fn drop_column(&mut self, name: &str) -> Option<Vec<Value>> {
        if name == self.key {
            return None;
        }
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|r| r.remove(idx)).collect())
    }

    /// Keep the columns for which `keep` returns true. The key column is always kept.
    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        let mask: Vec<bool> = self
            .columns
            .iter()
            .map(|c| *c == self.key || keep(c))
            .collect();
        if mask.iter().all(|&k| k) {
            return;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &mask);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &mask);
        }
    }

    /// Key values occurring more than once, in order of first occurrence.
    /// Missing keys are ignored.
    pub fn duplicate_keys(&self) -> Vec<String> {
        let mut counts: HashMap<&Value, usize> = HashMap::new();
        let mut order: Vec<&Value> = Vec::new();
        for value in self.key_values().filter(|v| !v.is_missing()) {
            let count = counts.entry(value).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push(value);
            }
        }
        order.into_iter().map(|v| v.to_string()).collect()
    }

    pub fn ensure_unique_key(&self) -> Result<()> {
        match self.duplicate_keys().into_iter().next() {
            Some(key) => Err(SchemaError::DuplicateKey {
                table: self.name.clone(),
                column: self.key.clone(),
                key,
            }
            .into()),
            None => Ok(()),
        }
    }

    fn check_length(&self, column: &str, len: usize) -> Result<()> {
        if len != self.rows.len() {
            return Err(FeatureError::parse(
                &self.name,
                format!(
                    "column '{column}' has {len} values, table has {} rows",
                    self.rows.len()
                ),
            ));
        }
        Ok(())
    }
}

fn retain_by_mask<T>(items: Vec<T>, mask: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(mask)
        .filter_map(|(item, &keep)| keep.then_some(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proteins() -> FeatureTable {
        FeatureTable::from_rows(
            "protein_features",
            "proteinName",
            &["proteinName", "helix", "sheet"],
            &[&["P1", "0.4", "0.1"], &["P2", "0.2", "0.5"]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_missing_key() {
        let err = FeatureTable::from_rows("t", "proteinName", &["cluster_name"], &[]).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Schema(SchemaError::MissingKeyColumn { .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_columns() {
        let err = FeatureTable::from_rows("t", "k", &["k", "a", "a"], &[]).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Schema(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = FeatureTable::from_rows("t", "k", &["k", "a"], &[&["x"]]).unwrap_err();
        assert!(matches!(err, FeatureError::Parse { .. }));
    }

    #[test]
    fn test_rename_key_follows_key() {
        let mut table = FeatureTable::from_rows("t", "Cluster_Name", &["Cluster_Name", "a"], &[])
            .unwrap();
        table.rename_column("Cluster_Name", "proteinName").unwrap();
        assert_eq!(table.key(), "proteinName");
        assert_eq!(table.columns(), &["proteinName".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_rename_onto_existing_column_fails() {
        let mut table = proteins();
        assert!(table.rename_column("helix", "sheet").is_err());
    }

    #[test]
    fn test_retain_columns_keeps_key_and_order() {
        let mut table = proteins();
        table.retain_columns(|c| c == "sheet");
        assert_eq!(table.columns(), &["proteinName".to_string(), "sheet".to_string()]);
        assert_eq!(table.rows()[1], vec![Value::from("P2"), Value::from("0.5")]);
    }

    #[test]
    fn test_drop_column_refuses_key() {
        let mut table = proteins();
        assert!(table.drop_column("proteinName").is_none());
        assert_eq!(
            table.drop_column("helix"),
            Some(vec![Value::from("0.4"), Value::from("0.2")])
        );
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_duplicate_keys_in_first_occurrence_order() {
        let table = FeatureTable::from_rows(
            "t",
            "k",
            &["k"],
            &[&["b"], &["a"], &["b"], &["a"], &["b"], &["c"]],
        )
        .unwrap();
        assert_eq!(table.duplicate_keys(), vec!["b".to_string(), "a".to_string()]);
        assert!(matches!(
            table.ensure_unique_key(),
            Err(FeatureError::Schema(SchemaError::DuplicateKey { ref key, .. })) if key == "b"
        ));
    }

    #[test]
    fn test_push_column_length_checked() {
        let mut table = proteins();
        assert!(table.push_column("label", vec![Value::Int(1)]).is_err());
        table
            .push_column("label", vec![Value::Int(1), Value::Int(0)])
            .unwrap();
        assert_eq!(table.columns().last().unwrap(), "label");
    }

    #[test]
    fn test_missing_displays_empty() {
        assert_eq!(Value::Missing.to_string(), "");
        assert_eq!(Value::Int(7).to_string(), "7");
    }
}
