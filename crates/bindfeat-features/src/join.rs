//! Key-based joins between feature tables.
//!
//! Joins are hash joins on a named column. Output rows follow the left
//! operand's row order, and for each left row the right operand's matching rows
//! in their own order, so results are deterministic. Output columns are the
//! left columns followed by the right columns minus the join column. Non-key
//! names present on both sides get `_x` / `_y` suffixes.
//!
//! `Missing` key values never match.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use bindfeat_common::{FeatureError, Result};

use crate::table::{FeatureTable, Value};

pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep only left rows with at least one match.
    Inner,
    /// Keep every left row; unmatched rows get `Missing` right-side cells.
    Left,
}

/// Row counts around one join, used for cardinality reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    pub output_rows: usize,
    /// Left rows without any matching right row
    pub unmatched_left: usize,
}

pub fn join(left: &FeatureTable, right: &FeatureTable, on: &str, kind: JoinKind) -> Result<FeatureTable> {
    join_with_stats(left, right, on, kind).map(|(table, _)| table)
}

pub fn join_with_stats(
    left: &FeatureTable,
    right: &FeatureTable,
    on: &str,
    kind: JoinKind,
) -> Result<(FeatureTable, JoinStats)> {
    let l_on = left
        .column_index(on)
        .ok_or_else(|| FeatureError::join_key(left.name(), on))?;
    let r_on = right
        .column_index(on)
        .ok_or_else(|| FeatureError::join_key(right.name(), on))?;

    let mut index: HashMap<&Value, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        let k = &row[r_on];
        if !k.is_missing() {
            index.entry(k).or_default().push(i);
        }
    }

    let right_cols: Vec<usize> = (0..right.column_count()).filter(|&i| i != r_on).collect();
    let left_names: HashSet<&str> = left
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| *c != on)
        .collect();
    let overlap: HashSet<&str> = right_cols
        .iter()
        .map(|&i| right.columns()[i].as_str())
        .filter(|c| left_names.contains(c))
        .collect();

    let mut columns: Vec<String> = left
        .columns()
        .iter()
        .map(|c| suffixed(c, &overlap, LEFT_SUFFIX))
        .collect();
    columns.extend(
        right_cols
            .iter()
            .map(|&i| suffixed(&right.columns()[i], &overlap, RIGHT_SUFFIX)),
    );

    let mut rows = Vec::with_capacity(left.row_count());
    let mut unmatched_left = 0;
    for row in left.rows() {
        match index.get(&row[l_on]) {
            Some(matches) => {
                for &m in matches {
                    let mut out = Vec::with_capacity(columns.len());
                    out.extend(row.iter().cloned());
                    out.extend(right_cols.iter().map(|&i| right.rows()[m][i].clone()));
                    rows.push(out);
                }
            }
            None => {
                unmatched_left += 1;
                if kind == JoinKind::Left {
                    let mut out = Vec::with_capacity(columns.len());
                    out.extend(row.iter().cloned());
                    out.extend(right_cols.iter().map(|_| Value::Missing));
                    rows.push(out);
                }
            }
        }
    }

    if !overlap.is_empty() {
        let mut names: Vec<&str> = overlap.into_iter().collect();
        names.sort_unstable();
        debug!(
            "Joining {} with {}: suffixed overlapping columns {:?}",
            left.name(),
            right.name(),
            names
        );
    }

    let stats = JoinStats {
        left_rows: left.row_count(),
        right_rows: right.row_count(),
        output_rows: rows.len(),
        unmatched_left,
    };
    let name = format!("{}+{}", left.name(), right.name());
    let table = FeatureTable::new(name, on, columns, rows)?;
    Ok((table, stats))
}

/// Fold protein-keyed tables left to right with inner joins on `on`.
/// The surviving key set is the intersection of all input key sets.
/// Returns `None` for an empty input.
pub fn consolidate(tables: Vec<FeatureTable>, on: &str) -> Result<Option<FeatureTable>> {
    let mut iter = tables.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(None);
    };
    if !acc.has_column(on) {
        return Err(FeatureError::join_key(acc.name(), on));
    }
    acc.set_key(on)?;
    for table in iter {
        acc = join(&acc, &table, on, JoinKind::Inner)?;
    }
    Ok(Some(acc))
}

fn suffixed(name: &str, overlap: &HashSet<&str>, suffix: &str) -> String {
    if overlap.contains(name) {
        format!("{name}{suffix}")
    } else {
        name.to_string()
    }
}
