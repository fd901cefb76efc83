//! Shared testing utilities for the bindfeat workspace.
//!
//! Fixture files live in a temporary directory removed on drop.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create fixture directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_csv(&self, name: &str, header: &[&str], rows: &[&[&str]]) -> PathBuf {
        self.write_delimited(name, b',', header, rows)
    }

    pub fn write_tsv(&self, name: &str, header: &[&str], rows: &[&[&str]]) -> PathBuf {
        self.write_delimited(name, b'\t', header, rows)
    }

    pub fn write_delimited(&self, name: &str, delimiter: u8, header: &[&str], rows: &[&[&str]]) -> PathBuf {
        let path = self.join(name);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(&path)
            .expect("failed to create fixture file");
        writer.write_record(header).expect("failed to write header");
        for row in rows {
            writer.write_record(*row).expect("failed to write row");
        }
        writer.flush().expect("failed to flush fixture file");
        path
    }

    /// Write raw text, e.g. an allow-list or a deliberately malformed table.
    pub fn write_text(&self, name: &str, content: &str) -> PathBuf {
        let path = self.join(name);
        std::fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Default for FixtureDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a comma-delimited file back as header + rows of strings.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("failed to open csv");
    let header = reader
        .headers()
        .expect("failed to read header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("bad record").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// Paths of the standard three-protein end-to-end scenario.
pub struct Scenario {
    pub fixtures: FixtureDir,
    pub protein: Vec<PathBuf>,
    pub docking: PathBuf,
    pub descriptors: PathBuf,
    pub pocket: PathBuf,
    pub allow_list: PathBuf,
}

/// Three protein tables with two disjoint feature columns each over
/// {P1, P2, P3}; a docking table with rows for {P1, P2}; a tab-delimited
/// descriptor table keyed by `NAME` covering the docked molecules (one of
/// them duplicated) plus an undocked one; a pocket table; an allow-list
/// naming one absent descriptor.
pub fn scenario() -> Scenario {
    let fixtures = FixtureDir::new();
    let protein = vec![
        fixtures.write_csv(
            "protein_features_2struc.csv",
            &["proteinName", "helix", "sheet"],
            &[&["P1", "0.41", "0.12"], &["P2", "0.22", "0.35"], &["P3", "0.30", "0.30"]],
        ),
        fixtures.write_csv(
            "protein_features_coach_avg.csv",
            &["proteinName", "coach_score", "coach_sites"],
            &[&["P3", "0.7", "2"], &["P2", "0.5", "1"], &["P1", "0.9", "3"]],
        ),
        fixtures.write_csv(
            "protein_features_surface.csv",
            &["proteinName", "sasa", "charge"],
            &[&["P1", "1200.5", "-3"], &["P2", "980.0", "1"], &["P3", "1100.1", "0"]],
        ),
    ];
    let docking = fixtures.write_csv(
        "docking.csv",
        &["proteinName", "moleculeName", "dockingEnergy", "mmgbsaEnergy"],
        &[
            &["P1", "CHEMBL123_active", "-9.4", "-41.2"],
            &["P2", "CHEMBL456_decoy", "-6.1", "-20.3"],
        ],
    );
    let descriptors = fixtures.write_tsv(
        "MolecularDescriptors.tsv",
        &["NAME", "MW", "logP", "TPSA"],
        &[
            &["CHEMBL123_active", "312.4", "2.1", "78.3"],
            &["CHEMBL456_decoy", "287.3", "3.4", "45.0"],
            &["CHEMBL789", "400.0", "1.0", "90.0"],
            &["CHEMBL789", "401.0", "1.1", "91.0"],
        ],
    );
    let pocket = fixtures.write_csv(
        "pocket_features.csv",
        &["proteinName", "pocket_volume"],
        &[&["P1", "512.0"], &["P2", "330.5"], &["P3", "120.0"]],
    );
    let allow_list = fixtures.write_text("keep_descriptors.txt", "MW\nlogP\nnRotB\n");

    Scenario {
        fixtures,
        protein,
        docking,
        descriptors,
        pocket,
        allow_list,
    }
}
