//! Orchestrator for the feature aggregation pipeline.
//!
//! Stage order:
//! 1. protein tables folded with inner joins on the protein key (stage A)
//! 2. docking rows left-joined with the consolidated protein features (stage B)
//! 3. pocket features inner-joined on the protein key, when supplied
//! 4. descriptors deduplicated, projected and inner-joined on the molecule key (stage C)
//! 5. label derived from the molecule identifier
//!
//! Protein annotations are optional per docking row (left join) while
//! molecular descriptors are mandatory (inner join).

use std::time::Instant;

use tracing::{debug, info, warn};

use bindfeat_common::{FeatureError, PipelineConfig, Result, SchemaError};

use crate::dedup::deduplicate_key;
use crate::join::{consolidate, join, join_with_stats, JoinKind};
use crate::label::derive_label;
use crate::manifest::{ManifestLog, Stage};
use crate::projection::{project, AllowList};
use crate::sources::{check_unique, load_source, TableCategory};
use crate::table::FeatureTable;

/// Tables handed to the pipeline, already keyed by their canonical keys.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub docking: FeatureTable,
    pub protein: Vec<FeatureTable>,
    pub pocket: Option<FeatureTable>,
    pub descriptors: Option<FeatureTable>,
    pub allow_list: Option<AllowList>,
}

impl PipelineInputs {
    pub fn new(docking: FeatureTable) -> Self {
        Self {
            docking,
            protein: Vec::new(),
            pocket: None,
            descriptors: None,
            allow_list: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: FeatureTable,
    pub manifests: ManifestLog,
}

pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load every configured source, then run all stages.
    pub fn run(&self) -> Result<PipelineOutput> {
        let started = Instant::now();
        let inputs = self.load_inputs()?;
        let output = self.run_tables(inputs)?;
        info!(
            "Pipeline finished in {} ms: {} rows x {} columns",
            started.elapsed().as_millis(),
            output.table.row_count(),
            output.table.column_count()
        );
        Ok(output)
    }

    /// Load and normalise all sources. Every path is checked before any file
    /// is read, so a missing input fails before any work is done.
    pub fn load_inputs(&self) -> Result<PipelineInputs> {
        for path in self.config.source_paths() {
            if !path.exists() {
                return Err(SchemaError::MissingSource(path.to_path_buf()).into());
            }
        }

        let keys = &self.config.keys;
        let strict = self.config.strict_keys;
        let sources = &self.config.sources;

        let docking_spec = sources
            .docking
            .as_ref()
            .ok_or_else(|| FeatureError::Config("a docking source is required".to_string()))?;
        let started = Instant::now();
        let docking = load_source(TableCategory::Docking, docking_spec, keys, strict)?;
        info!("Binding features parsed in {} ms", started.elapsed().as_millis());

        let started = Instant::now();
        let protein = sources
            .protein
            .iter()
            .map(|spec| load_source(TableCategory::Protein, spec, keys, strict))
            .collect::<Result<Vec<_>>>()?;
        if !protein.is_empty() {
            info!(
                "{} protein feature tables parsed in {} ms",
                protein.len(),
                started.elapsed().as_millis()
            );
        }

        let pocket = match sources.pocket {
            Some(ref spec) => {
                let started = Instant::now();
                let table = load_source(TableCategory::Pocket, spec, keys, strict)?;
                info!("Binding pocket features parsed in {} ms", started.elapsed().as_millis());
                Some(table)
            }
            None => None,
        };

        let descriptors = match sources.descriptors {
            Some(ref spec) => {
                let started = Instant::now();
                let table = load_source(TableCategory::Descriptor, spec, keys, strict)?;
                info!("Drug features parsed in {} ms", started.elapsed().as_millis());
                Some(table)
            }
            None => None,
        };

        let allow_list = self
            .config
            .descriptor_allow_list
            .as_deref()
            .map(AllowList::from_file)
            .transpose()?;

        Ok(PipelineInputs {
            docking,
            protein,
            pocket,
            descriptors,
            allow_list,
        })
    }

    /// Run all stages over tables already in memory.
    pub fn run_tables(&self, inputs: PipelineInputs) -> Result<PipelineOutput> {
        let keys = &self.config.keys;
        let mut log = ManifestLog::new();

        let PipelineInputs {
            docking,
            protein,
            pocket,
            descriptors,
            allow_list,
        } = inputs;

        // Key columns are checked before the first join runs.
        if !docking.has_column(&keys.protein) && (!protein.is_empty() || pocket.is_some()) {
            return Err(FeatureError::join_key(docking.name(), &keys.protein));
        }
        if descriptors.is_some() && !docking.has_column(&keys.molecule) {
            return Err(FeatureError::join_key(docking.name(), &keys.molecule));
        }
        log.record(Stage::Docking, &docking);

        // Stage A + B
        let started = Instant::now();
        let mut current = match consolidate(protein, &keys.protein)? {
            Some(protein) => {
                let protein = protein.with_name("protein_features");
                log.record(Stage::Protein, &protein);
                join(&docking, &protein, &keys.protein, JoinKind::Left)?
            }
            None => {
                debug!("No protein feature tables supplied");
                docking
            }
        }
        .with_name("protein_drug_features");
        log.record(Stage::ProteinDrug, &current);
        info!("Protein features attached in {} ms", started.elapsed().as_millis());

        if let Some(pocket) = pocket {
            let pocket = pocket.with_name("pocket_features");
            log.record(Stage::Pocket, &pocket);
            let (joined, stats) = join_with_stats(&current, &pocket, &keys.protein, JoinKind::Inner)?;
            log.record_join(Stage::Pocket, &stats);
            current = joined.with_name("protein_drug_pocket_features");
        }

        // Stage C
        match descriptors {
            Some(descriptors) => {
                let started = Instant::now();
                let descriptors = self
                    .prepare_descriptors(descriptors, allow_list.as_ref())?
                    .with_name("drug_features");
                log.record(Stage::Descriptors, &descriptors);
                let (joined, stats) =
                    join_with_stats(&current, &descriptors, &keys.molecule, JoinKind::Inner)?;
                log.record_join(Stage::Descriptors, &stats);
                current = joined;
                info!("Drug features attached in {} ms", started.elapsed().as_millis());
            }
            None => warn!("No descriptor table supplied; output carries no molecular descriptors"),
        }

        let labelled = derive_label(
            current.with_name(self.config.output.name.clone()),
            self.config.label_column(),
            &self.config.label.pattern,
            &self.config.label.name,
        )?;
        log.record(Stage::Final, &labelled);

        Ok(PipelineOutput {
            table: labelled,
            manifests: log,
        })
    }

    /// Descriptor path: deduplicate identifiers, project to the allow-list,
    /// then require a unique key.
    pub fn prepare_descriptors(
        &self,
        table: FeatureTable,
        allow_list: Option<&AllowList>,
    ) -> Result<FeatureTable> {
        let (table, report) = deduplicate_key(table, self.config.dedup.separator_char())?;
        if report.renamed > 0 {
            info!("Renamed {} duplicated molecule identifiers", report.renamed);
        }
        let table = match allow_list {
            Some(allow) => project(table, allow),
            None => table,
        };
        check_unique(&table, self.config.strict_keys)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindfeat_common::SourceSpec;
    use pretty_assertions::assert_eq;

    use crate::manifest::StageWarning;
    use crate::table::Value;

    fn config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.sources.docking = Some(SourceSpec::new("docking.csv"));
        config
    }

    fn docking() -> FeatureTable {
        FeatureTable::from_rows(
            "docking",
            "proteinName",
            &["proteinName", "moleculeName", "dockingEnergy"],
            &[
                &["P1", "M1_active", "-9.0"],
                &["P2", "M2_decoy", "-5.0"],
                &["P3", "M1_active", "-7.5"],
            ],
        )
        .unwrap()
    }

    fn descriptors() -> FeatureTable {
        FeatureTable::from_rows(
            "descriptors",
            "moleculeName",
            &["moleculeName", "MW", "logP"],
            &[&["M1_active", "300", "1.1"], &["M2_decoy", "250", "2.0"]],
        )
        .unwrap()
    }

    #[test]
    fn test_protein_features_left_joined() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.protein.push(
            FeatureTable::from_rows("p", "proteinName", &["proteinName", "helix"], &[&["P1", "0.3"]])
                .unwrap(),
        );
        let out = pipeline.run_tables(inputs).unwrap();
        // No descriptor stage: every docking row survives, unmatched features are missing.
        assert_eq!(out.table.row_count(), 3);
        assert_eq!(out.table.rows()[1][3], Value::Missing);
        assert_eq!(
            out.table.columns(),
            &["proteinName", "moleculeName", "dockingEnergy", "helix", "label"].map(String::from)
        );
    }

    #[test]
    fn test_descriptor_stage_is_inner() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.descriptors = Some(
            FeatureTable::from_rows(
                "descriptors",
                "moleculeName",
                &["moleculeName", "MW"],
                &[&["M1_active", "300"], &["M9", "1"]],
            )
            .unwrap(),
        );
        let out = pipeline.run_tables(inputs).unwrap();
        assert_eq!(out.table.row_count(), 2);
        assert_eq!(out.table.key(), "moleculeName");
        assert!(out.manifests.warnings().iter().any(|w| matches!(
            w,
            StageWarning::RowsDropped { stage: Stage::Descriptors, before: 3, after: 2 }
        )));
    }

    #[test]
    fn test_pocket_stage_is_inner() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.pocket = Some(
            FeatureTable::from_rows(
                "pocket",
                "proteinName",
                &["proteinName", "volume"],
                &[&["P1", "410.2"], &["P3", "388.0"]],
            )
            .unwrap(),
        );
        inputs.descriptors = Some(descriptors());
        let out = pipeline.run_tables(inputs).unwrap();
        assert_eq!(out.table.key_set().into_iter().collect::<Vec<_>>(), vec!["M1_active"]);
        assert_eq!(out.table.row_count(), 2);
        assert!(out.manifests.get(Stage::Pocket).is_some());
    }

    #[test]
    fn test_descriptor_duplicates_resolved_before_join() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let table = FeatureTable::from_rows(
            "descriptors",
            "moleculeName",
            &["moleculeName", "MW", "junk"],
            &[&["M1", "300", "x"], &["M1", "301", "y"]],
        )
        .unwrap();
        let allow = AllowList::new(["MW"]);
        let out = pipeline.prepare_descriptors(table, Some(&allow)).unwrap();
        assert_eq!(out.columns(), &["moleculeName", "MW"].map(String::from));
        assert_eq!(out.key_set().into_iter().collect::<Vec<_>>(), vec!["M1", "M1_2"]);
    }

    #[test]
    fn test_separator_collision_is_duplicate_key() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let table = FeatureTable::from_rows(
            "descriptors",
            "moleculeName",
            &["moleculeName"],
            &[&["M1"], &["M1_2"], &["M1"]],
        )
        .unwrap();
        let err = pipeline.prepare_descriptors(table, None).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::Schema(SchemaError::DuplicateKey { ref key, .. }) if key == "M1_2"
        ));
    }

    #[test]
    fn test_docking_without_molecule_column_fails_before_joins() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let docking = FeatureTable::from_rows("docking", "proteinName", &["proteinName"], &[&["P1"]])
            .unwrap();
        let mut inputs = PipelineInputs::new(docking);
        inputs.descriptors = Some(descriptors());
        let err = pipeline.run_tables(inputs).unwrap_err();
        assert!(matches!(err, FeatureError::JoinKey { .. }));
    }

    #[test]
    fn test_pocket_join_emptying_table_is_reported_for_pocket_stage() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.pocket = Some(
            FeatureTable::from_rows("pocket", "proteinName", &["proteinName", "volume"], &[&["P9", "1.0"]])
                .unwrap(),
        );
        inputs.descriptors = Some(descriptors());
        let out = pipeline.run_tables(inputs).unwrap();
        assert!(out.table.is_empty());
        let warnings = out.manifests.warnings();
        assert!(warnings.contains(&StageWarning::RowsDropped { stage: Stage::Pocket, before: 3, after: 0 }));
        assert!(warnings.contains(&StageWarning::EmptyResult { stage: Stage::Pocket }));
        assert!(warnings.contains(&StageWarning::EmptyResult { stage: Stage::Final }));
    }

    #[test]
    fn test_disjoint_protein_tables_give_empty_protein_stage() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.protein.push(
            FeatureTable::from_rows("a", "proteinName", &["proteinName", "helix"], &[&["P1", "0.3"]])
                .unwrap(),
        );
        inputs.protein.push(
            FeatureTable::from_rows("b", "proteinName", &["proteinName", "sasa"], &[&["P2", "900"]])
                .unwrap(),
        );
        let out = pipeline.run_tables(inputs).unwrap();

        assert_eq!(
            out.manifests.warnings(),
            &[StageWarning::EmptyResult { stage: Stage::Protein }]
        );
        assert_eq!(out.manifests.get(Stage::Protein).unwrap().rows, 0);
        // Stage B is a left join: every docking row survives with missing protein cells
        assert_eq!(out.table.row_count(), 3);
        for column in ["helix", "sasa"] {
            assert!(out.table.column_values(column).unwrap().iter().all(|v| v.is_missing()));
        }
    }

    #[test]
    fn test_disjoint_descriptors_give_empty_result_warning() {
        let pipeline = FeaturePipeline::new(config()).unwrap();
        let mut inputs = PipelineInputs::new(docking());
        inputs.descriptors = Some(
            FeatureTable::from_rows("d", "moleculeName", &["moleculeName", "MW"], &[&["Z", "1"]])
                .unwrap(),
        );
        let out = pipeline.run_tables(inputs).unwrap();
        assert!(out.table.is_empty());
        assert!(out.manifests.has_empty_result());
        assert_eq!(out.table.columns().last().unwrap(), "label");
    }
}
