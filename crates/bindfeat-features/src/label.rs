//! Binary activity label from ligand identifiers.

use tracing::warn;

use bindfeat_common::{Result, SchemaError};

use crate::table::{FeatureTable, Value};

/// `1` when `identifier` contains `pattern` (case-sensitive), else `0`.
pub fn label_for(identifier: &Value, pattern: &str) -> i64 {
    match identifier {
        Value::Text(s) if s.contains(pattern) => 1,
        _ => 0,
    }
}

/// Append the label column computed from `column`. Must run after all joins.
///
/// An existing column called `label_name` (raw docking exports carry one) is
/// removed first, so the derived label is always the last column.
pub fn derive_label(
    mut table: FeatureTable,
    column: &str,
    pattern: &str,
    label_name: &str,
) -> Result<FeatureTable> {
    let idx = table.column_index(column).ok_or_else(|| SchemaError::MissingColumn {
        table: table.name().to_string(),
        column: column.to_string(),
    })?;

    let labels: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| Value::Int(label_for(&row[idx], pattern)))
        .collect();

    if table.has_column(label_name) {
        if label_name == table.key() || label_name == column {
            return Err(SchemaError::DuplicateColumn {
                table: table.name().to_string(),
                column: label_name.to_string(),
            }
            .into());
        }
        warn!(
            "{} already has a '{}' column; replacing it with the derived label",
            table.name(),
            label_name
        );
        table.drop_column(label_name);
    }
    table.push_column(label_name, labels)?;
    Ok(table)
}
