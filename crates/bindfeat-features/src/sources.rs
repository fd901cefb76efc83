//! Category-aware source loading.
//!
//! Every input file is declared with an explicit [`TableCategory`]. The
//! category decides the canonical key the table is joined on and whether the
//! key must be unique right after loading.

use std::fmt;

use regex::Regex;
use tracing::{debug, warn};

use bindfeat_common::{FeatureError, IdentifierExtraction, KeyColumns, Result, SchemaError, SourceSpec};

use crate::loader::load_table;
use crate::projection::{project, AllowList};
use crate::table::{FeatureTable, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCategory {
    /// Protein structural features, keyed by protein
    Protein,
    /// Protein–ligand docking observations, keyed by protein, many rows per protein
    Docking,
    /// Molecular descriptors, keyed by molecule
    Descriptor,
    /// Binding pocket features, keyed by protein
    Pocket,
}

impl TableCategory {
    pub fn canonical_key<'a>(&self, keys: &'a KeyColumns) -> &'a str {
        match self {
            TableCategory::Descriptor => &keys.molecule,
            TableCategory::Protein | TableCategory::Docking | TableCategory::Pocket => &keys.protein,
        }
    }

    /// Whether the key must be unique as loaded. Descriptor keys are only
    /// unique after deduplication, docking keys never are.
    pub fn unique_on_load(&self) -> bool {
        matches!(self, TableCategory::Protein | TableCategory::Pocket)
    }
}

impl fmt::Display for TableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableCategory::Protein => "protein",
            TableCategory::Docking => "docking",
            TableCategory::Descriptor => "descriptor",
            TableCategory::Pocket => "pocket",
        };
        f.write_str(s)
    }
}

/// Load one source and normalise it to its category's canonical key.
///
/// Steps: load with the declared key (or the extraction column), extract
/// identifiers when configured, rename the key to the canonical name, apply
/// the per-source column allow-list, then check key uniqueness if the
/// category requires it.
pub fn load_source(
    category: TableCategory,
    spec: &SourceSpec,
    keys: &KeyColumns,
    strict_keys: bool,
) -> Result<FeatureTable> {
    let canonical = category.canonical_key(keys);
    let file_key = spec.key.as_deref().unwrap_or(canonical);

    let mut table = match spec.extract {
        Some(ref extraction) => {
            let mut table = load_table(&spec.path, &extraction.column, spec.resolved_delimiter())?;
            extract_identifiers(&mut table, extraction, keys)?;
            table.set_key(file_key)?;
            table
        }
        None => load_table(&spec.path, file_key, spec.resolved_delimiter())?,
    };

    if file_key != canonical {
        debug!("{}: renaming key '{}' to '{}'", table.name(), file_key, canonical);
        table.rename_column(file_key, canonical)?;
    }

    if let Some(ref columns) = spec.columns {
        let mut allow = AllowList::new(columns.iter().cloned());
        if category == TableCategory::Docking {
            allow.insert(keys.molecule.clone());
        }
        table = project(table, &allow);
    }

    if category.unique_on_load() {
        check_unique(&table, strict_keys)?;
    }

    debug!(
        "Loaded {} source {}: {} rows x {} columns",
        category,
        table.name(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Enforce key uniqueness, or only warn about it when not strict.
pub fn check_unique(table: &FeatureTable, strict_keys: bool) -> Result<()> {
    if strict_keys {
        return table.ensure_unique_key();
    }
    let duplicates = table.duplicate_keys();
    if !duplicates.is_empty() {
        warn!(
            "{}: {} duplicated key values in '{}' (first: {}); joins will fan out",
            table.name(),
            duplicates.len(),
            table.key(),
            duplicates[0]
        );
    }
    Ok(())
}

/// Add protein and molecule identifier columns parsed out of a filename-like
/// column. Rows the patterns do not match get `Missing`. Existing columns with
/// the target names are overwritten.
pub fn extract_identifiers(
    table: &mut FeatureTable,
    extraction: &IdentifierExtraction,
    keys: &KeyColumns,
) -> Result<()> {
    let protein_re = compile(&extraction.protein_pattern)?;
    let molecule_re = compile(&extraction.molecule_pattern)?;

    let source = table
        .column_values(&extraction.column)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: table.name().to_string(),
            column: extraction.column.clone(),
        })?;
    let proteins: Vec<Value> = source.iter().map(|v| capture(&protein_re, v)).collect();
    let molecules: Vec<Value> = source.iter().map(|v| capture(&molecule_re, v)).collect();

    let unmatched = proteins
        .iter()
        .chain(molecules.iter())
        .filter(|v| v.is_missing())
        .count();
    if unmatched > 0 {
        warn!(
            "{}: {} identifiers could not be extracted from '{}'",
            table.name(),
            unmatched,
            extraction.column
        );
    }

    set_or_push(table, &keys.protein, proteins)?;
    set_or_push(table, &keys.molecule, molecules)?;
    Ok(())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| FeatureError::Config(format!("invalid identifier pattern '{pattern}': {e}")))
}

fn capture(re: &Regex, value: &Value) -> Value {
    value
        .as_str()
        .and_then(|text| re.captures(text))
        .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| Value::Text(m.as_str().to_string()))
        .unwrap_or(Value::Missing)
}

fn set_or_push(table: &mut FeatureTable, column: &str, values: Vec<Value>) -> Result<()> {
    if table.has_column(column) {
        table.replace_column(column, values)
    } else {
        table.push_column(column, values)
    }
}
