//! Duplicate molecule identifier resolution for descriptor tables.
//!
//! The same molecule can appear on several descriptor rows (conformers,
//! re-exports). Identifiers without the separator are grouped by their exact
//! text: the first row of a group keeps its identifier and the k-th row
//! (k = 2, 3, ...) becomes `<id><sep>k`. Identifiers that already contain the
//! separator are left alone and do not count towards any group.

use std::collections::HashMap;

use tracing::debug;

use bindfeat_common::Result;

use crate::table::{FeatureTable, Value};

/// Counts from one deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Rows whose identifier received a suffix
    pub renamed: usize,
    /// Rows skipped because the identifier already contained the separator
    pub presuffixed: usize,
}

/// Compute the deduplicated identifier column. `None` entries (missing
/// identifiers) pass through unchanged.
pub fn deduplicate_identifiers(
    ids: &[Option<&str>],
    separator: char,
) -> (Vec<Option<String>>, DedupReport) {
    let mut report = DedupReport::default();
    let mut occurrences: HashMap<&str, usize> = HashMap::new();

    let out = ids
        .iter()
        .map(|id| {
            let id = (*id)?;
            if id.contains(separator) {
                report.presuffixed += 1;
                return Some(id.to_string());
            }
            let n = occurrences.entry(id).or_insert(0);
            *n += 1;
            if *n == 1 {
                Some(id.to_string())
            } else {
                report.renamed += 1;
                Some(format!("{id}{separator}{n}"))
            }
        })
        .collect();

    (out, report)
}

/// Deduplicate the key column of a descriptor table. No rows are dropped and
/// no other column is touched.
pub fn deduplicate_key(mut table: FeatureTable, separator: char) -> Result<(FeatureTable, DedupReport)> {
    let key = table.key().to_string();
    let current: Vec<Value> = table.key_values().cloned().collect();
    let ids: Vec<Option<&str>> = current.iter().map(Value::as_str).collect();
    let (renamed, report) = deduplicate_identifiers(&ids, separator);

    let values = current
        .iter()
        .zip(renamed)
        .map(|(old, new)| match new {
            Some(id) => Value::Text(id),
            None => old.clone(),
        })
        .collect();
    table.replace_column(&key, values)?;

    debug!(
        "Deduplicated '{}' in {}: {} renamed, {} pre-suffixed",
        key,
        table.name(),
        report.renamed,
        report.presuffixed
    );
    Ok((table, report))
}
