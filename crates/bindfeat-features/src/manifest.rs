//! Per-stage column manifests and cardinality warnings.
//!
//! The manifest log is a side output only. Nothing in the join or label logic
//! reads it.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::join::JoinStats;
use crate::table::FeatureTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Raw docking observations
    Docking,
    /// Consolidated protein features
    Protein,
    /// Docking rows with protein features attached
    ProteinDrug,
    /// Binding pocket features
    Pocket,
    /// Descriptor table after dedup and projection
    Descriptors,
    /// Final labelled table
    Final,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Docking => "docking",
            Stage::Protein => "protein",
            Stage::ProteinDrug => "protein_drug",
            Stage::Pocket => "pocket",
            Stage::Descriptors => "descriptors",
            Stage::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageManifest {
    pub stage: Stage,
    pub table: String,
    pub key: String,
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Non-fatal anomalies surfaced to the operator. They are never corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageWarning {
    EmptyResult { stage: Stage },
    RowsDropped { stage: Stage, before: usize, after: usize },
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageWarning::EmptyResult { stage } => {
                write!(f, "stage '{stage}' produced an empty table; check that input keys overlap")
            }
            StageWarning::RowsDropped { stage, before, after } => write!(
                f,
                "stage '{stage}' kept {after} of {before} rows; unmatched rows were dropped by the inner join"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestLog {
    stages: Vec<StageManifest>,
    warnings: Vec<StageWarning>,
}

impl ManifestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the column list and row count of a stage's table.
    pub fn record(&mut self, stage: Stage, table: &FeatureTable) {
        info!(
            "Stage {}: {} rows x {} columns",
            stage,
            table.row_count(),
            table.column_count()
        );
        self.stages.push(StageManifest {
            stage,
            table: table.name().to_string(),
            key: table.key().to_string(),
            columns: table.columns().to_vec(),
            rows: table.row_count(),
        });
        if table.is_empty() {
            self.push_warning(StageWarning::EmptyResult { stage });
        }
    }

    /// Report rows an inner join dropped from its left operand, and an empty
    /// result when the join dropped all of them.
    pub fn record_join(&mut self, stage: Stage, stats: &JoinStats) {
        if stats.unmatched_left > 0 {
            self.push_warning(StageWarning::RowsDropped {
                stage,
                before: stats.left_rows,
                after: stats.output_rows,
            });
        }
        if stats.output_rows == 0 && stats.left_rows > 0 {
            self.push_warning(StageWarning::EmptyResult { stage });
        }
    }

    pub fn stages(&self) -> &[StageManifest] {
        &self.stages
    }

    pub fn warnings(&self) -> &[StageWarning] {
        &self.warnings
    }

    pub fn get(&self, stage: Stage) -> Option<&StageManifest> {
        self.stages.iter().find(|m| m.stage == stage)
    }

    pub fn has_empty_result(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, StageWarning::EmptyResult { .. }))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn push_warning(&mut self, warning: StageWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_keeps_column_order() {
        let table = FeatureTable::from_rows(
            "protein",
            "proteinName",
            &["proteinName", "z", "a"],
            &[&["P1", "1", "2"]],
        )
        .unwrap();
        let mut log = ManifestLog::new();
        log.record(Stage::Protein, &table);
        let manifest = log.get(Stage::Protein).unwrap();
        assert_eq!(manifest.columns, vec!["proteinName", "z", "a"]);
        assert_eq!(manifest.rows, 1);
        assert!(log.warnings().is_empty());
    }

    #[test]
    fn test_empty_table_warns() {
        let table = FeatureTable::from_rows("final", "moleculeName", &["moleculeName"], &[]).unwrap();
        let mut log = ManifestLog::new();
        log.record(Stage::Final, &table);
        assert!(log.has_empty_result());
        assert_eq!(
            log.warnings()[0],
            StageWarning::EmptyResult { stage: Stage::Final }
        );
    }

    #[test]
    fn test_dropped_rows_warn() {
        let mut log = ManifestLog::new();
        log.record_join(
            Stage::Descriptors,
            &JoinStats { left_rows: 5, right_rows: 3, output_rows: 2, unmatched_left: 3 },
        );
        assert_eq!(
            log.warnings(),
            &[StageWarning::RowsDropped { stage: Stage::Descriptors, before: 5, after: 2 }]
        );
    }

    #[test]
    fn test_join_dropping_every_row_warns_for_its_stage() {
        let mut log = ManifestLog::new();
        log.record_join(
            Stage::Pocket,
            &JoinStats { left_rows: 2, right_rows: 1, output_rows: 0, unmatched_left: 2 },
        );
        assert_eq!(
            log.warnings(),
            &[
                StageWarning::RowsDropped { stage: Stage::Pocket, before: 2, after: 0 },
                StageWarning::EmptyResult { stage: Stage::Pocket },
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut log = ManifestLog::new();
        log.record_join(
            Stage::Pocket,
            &JoinStats { left_rows: 2, right_rows: 1, output_rows: 1, unmatched_left: 1 },
        );
        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(json["warnings"][0]["kind"], "rows_dropped");
        assert_eq!(json["warnings"][0]["stage"], "pocket");
    }
}
