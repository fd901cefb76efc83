//! Writing the final table and per-stage manifests.
//!
//! Every file is staged as a temporary file inside the output directory and
//! only persisted once all of them were written. If persisting one fails,
//! the ones already in place are removed again.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use bindfeat_common::OutputConfig;
use bindfeat_features::{FeatureTable, PipelineOutput, Stage};

/// File name of the column manifest for a stage.
pub fn manifest_file_name(stage: Stage, output_name: &str) -> String {
    match stage {
        Stage::Docking => "binding_features.csv".to_string(),
        Stage::Protein => "protein_features_list.csv".to_string(),
        Stage::ProteinDrug => "protein_drug_features_list.csv".to_string(),
        Stage::Pocket => "pocket_features_list.csv".to_string(),
        Stage::Descriptors => "drug_features_list.csv".to_string(),
        Stage::Final => format!("{output_name}_features_list.csv"),
    }
}

/// Write the table (and manifests, if enabled). Returns the written paths.
pub fn write_outputs(config: &OutputConfig, output: &PipelineOutput) -> anyhow::Result<Vec<PathBuf>> {
    let dir = &config.dir;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {dir:?}"))?;

    let mut staged: Vec<(NamedTempFile, PathBuf)> = Vec::new();

    let table_path = dir.join(format!("{}.csv", config.name));
    staged.push((stage_table(dir, &output.table)?, table_path));

    if config.manifests {
        for manifest in output.manifests.stages() {
            let path = dir.join(manifest_file_name(manifest.stage, &config.name));
            staged.push((stage_column_list(dir, &manifest.columns)?, path));
        }
        let json = output
            .manifests
            .to_json()
            .context("Failed to serialise manifest summary")?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        staged.push((tmp, dir.join(format!("{}_manifest.json", config.name))));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (tmp, path) in staged {
        if let Err(e) = tmp.persist(&path) {
            remove_written(&written);
            return Err(e).with_context(|| format!("Failed to write {path:?}"));
        }
        debug!(path = %path.display(), "Output written");
        written.push(path);
    }
    info!(files = written.len(), dir = %dir.display(), "Outputs written");
    Ok(written)
}

/// Roll back files persisted before a later one failed.
fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), "Failed to remove partial output: {e}");
        }
    }
}

/// Missing cells are written as empty fields.
fn stage_table(dir: &Path, table: &FeatureTable) -> anyhow::Result<NamedTempFile> {
    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::Writer::from_writer(tmp);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush table {}: {}", table.name(), e.error()))
}

fn stage_column_list(dir: &Path, columns: &[String]) -> anyhow::Result<NamedTempFile> {
    let tmp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::Writer::from_writer(tmp);
    writer.write_record(["index", "column"])?;
    for (i, column) in columns.iter().enumerate() {
        writer.write_record([i.to_string().as_str(), column.as_str()])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush column list: {}", e.error()))
}
