//! Column allow-listing.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use bindfeat_common::{Result, SchemaError};

use crate::table::FeatureTable;

/// The set of column names permitted to survive a projection. Order is not
/// significant; the projected table keeps its own column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// One column name per line. Surrounding whitespace is trimmed and blank lines skipped.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SchemaError::MissingSource(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)?;
        let list = Self::parse(&content);
        debug!("Allow-list {:?}: {} columns", path, list.len());
        Ok(list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add a name, e.g. an identifier column that must always survive.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Allow-listed names absent from `table`.
    pub fn absent_from<'a>(&'a self, table: &FeatureTable) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|n| !table.has_column(n))
            .map(String::as_str)
            .collect()
    }
}

/// Drop every column not in `allow`, always keeping the key. Entries naming
/// columns the table does not have are ignored.
pub fn project(mut table: FeatureTable, allow: &AllowList) -> FeatureTable {
    let absent = allow.absent_from(&table).len();
    let before = table.column_count();
    table.retain_columns(|c| allow.contains(c));
    debug!(
        "Projected {}: {} -> {} columns ({} allow-listed names absent)",
        table.name(),
        before,
        table.column_count(),
        absent
    );
    table
}
