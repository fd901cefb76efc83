//! Pipeline configuration.
//!
//! Everything the aggregation pipeline needs is declared here and passed into
//! the pipeline entry point: input sources per category, canonical key names,
//! the descriptor allow-list and the output destination. Nothing downstream
//! reads process arguments or environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Canonical key column names
    #[serde(default)]
    pub keys: KeyColumns,

    /// Input tables per category
    #[serde(default)]
    pub sources: Sources,

    /// File listing which molecular descriptors to keep (one per line)
    #[serde(default)]
    pub descriptor_allow_list: Option<PathBuf>,

    /// Treat duplicate keys in unique-keyed tables as fatal
    #[serde(default = "default_true")]
    pub strict_keys: bool,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub label: LabelConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keys: KeyColumns::default(),
            sources: Sources::default(),
            descriptor_allow_list: None,
            strict_keys: true,
            dedup: DedupConfig::default(),
            label: LabelConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

fn default_true() -> bool { true }

// ── Keys ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyColumns {
    /// Protein / receptor cluster identifier
    #[serde(default = "default_protein_key")]
    pub protein: String,

    /// Small-molecule ligand identifier
    #[serde(default = "default_molecule_key")]
    pub molecule: String,
}

fn default_protein_key() -> String { "proteinName".to_string() }
fn default_molecule_key() -> String { "moleculeName".to_string() }

impl Default for KeyColumns {
    fn default() -> Self {
        Self {
            protein: default_protein_key(),
            molecule: default_molecule_key(),
        }
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sources {
    /// Protein-keyed feature tables, consolidated left to right
    #[serde(default)]
    pub protein: Vec<SourceSpec>,

    /// Protein–ligand docking / binding affinity observations
    pub docking: Option<SourceSpec>,

    /// Molecular descriptor table
    pub descriptors: Option<SourceSpec>,

    /// Binding pocket features
    pub pocket: Option<SourceSpec>,
}

/// One delimited input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    pub path: PathBuf,

    /// Key column as named in the file; renamed to the canonical key after loading.
    #[serde(default)]
    pub key: Option<String>,

    /// Field delimiter. Inferred from the file extension when absent.
    #[serde(default)]
    pub delimiter: Option<Delimiter>,

    /// Columns to keep after loading. The key column is always kept.
    #[serde(default)]
    pub columns: Option<Vec<String>>,

    /// Identifier extraction from a filename-like column (docking exports).
    #[serde(default)]
    pub extract: Option<IdentifierExtraction>,
}

impl SourceSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: None,
            delimiter: None,
            columns: None,
            extract: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Delimiter to use: declared, or inferred from the extension.
    pub fn resolved_delimiter(&self) -> Delimiter {
        self.delimiter.unwrap_or_else(|| Delimiter::for_path(&self.path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    pub fn for_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") | Some("txt") => Delimiter::Tab,
            _ => Delimiter::Comma,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Regex-based extraction of protein and molecule identifiers from one column.
/// Capture group 1 is used when present, otherwise the whole match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierExtraction {
    #[serde(default = "default_extract_column")]
    pub column: String,
    #[serde(default = "default_protein_pattern")]
    pub protein_pattern: String,
    #[serde(default = "default_molecule_pattern")]
    pub molecule_pattern: String,
}

fn default_extract_column() -> String { "Filename".to_string() }
fn default_protein_pattern() -> String { r"(...._cluster\d+)".to_string() }
fn default_molecule_pattern() -> String { r"cluster\d+_(\w+)".to_string() }

impl Default for IdentifierExtraction {
    fn default() -> Self {
        Self {
            column: default_extract_column(),
            protein_pattern: default_protein_pattern(),
            molecule_pattern: default_molecule_pattern(),
        }
    }
}

// ── Dedup / Label / Output ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String { "_".to_string() }

impl Default for DedupConfig {
    fn default() -> Self {
        Self { separator: default_separator() }
    }
}

impl DedupConfig {
    /// The separator as a single character. Validated by [`PipelineConfig::validate`].
    pub fn separator_char(&self) -> char {
        self.separator.chars().next().unwrap_or('_')
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Identifier column to match against. Defaults to the molecule key.
    #[serde(default)]
    pub column: Option<String>,

    /// Case-sensitive substring marking a positive example
    #[serde(default = "default_label_pattern")]
    pub pattern: String,

    /// Name of the derived label column
    #[serde(default = "default_label_name")]
    pub name: String,
}

fn default_label_pattern() -> String { "active".to_string() }
fn default_label_name() -> String { "label".to_string() }

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            column: None,
            pattern: default_label_pattern(),
            name: default_label_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Base name of the output table (without extension)
    #[serde(default = "default_output_name")]
    pub name: String,

    /// Write per-stage manifest files
    #[serde(default = "default_true")]
    pub manifests: bool,

    /// Exit with an error when the final table has no rows
    #[serde(default)]
    pub fail_on_empty: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from(".") }
fn default_output_name() -> String { "feature_table".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            name: default_output_name(),
            manifests: true,
            fail_on_empty: false,
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from a TOML file
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FeatureError::Config(format!("{path:?}: {e}")))
    }

    /// Load from a YAML file
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| FeatureError::Config(format!("{path:?}: {e}")))
    }

    /// Load from a JSON file
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| FeatureError::Config(format!("{path:?}: {e}")))
    }

    /// Load by file extension (`.yaml`/`.yml`, `.json`, otherwise TOML).
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Self::from_toml(path),
        }
    }

    /// Identifier column the label is derived from.
    pub fn label_column(&self) -> &str {
        self.label.column.as_deref().unwrap_or(&self.keys.molecule)
    }

    /// Every input path, in pipeline order.
    pub fn source_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = Vec::new();
        if let Some(ref docking) = self.sources.docking {
            paths.push(&docking.path);
        }
        paths.extend(self.sources.protein.iter().map(|s| s.path.as_path()));
        if let Some(ref pocket) = self.sources.pocket {
            paths.push(&pocket.path);
        }
        if let Some(ref descriptors) = self.sources.descriptors {
            paths.push(&descriptors.path);
        }
        if let Some(ref allow) = self.descriptor_allow_list {
            paths.push(allow);
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.docking.is_none() {
            return Err(FeatureError::Config(
                "a docking source is required (sources.docking)".to_string(),
            ));
        }
        if self.keys.protein.is_empty() || self.keys.molecule.is_empty() {
            return Err(FeatureError::Config("key column names must not be empty".to_string()));
        }
        if self.keys.protein == self.keys.molecule {
            return Err(FeatureError::Config(format!(
                "protein and molecule keys must differ (both '{}')",
                self.keys.protein
            )));
        }
        if self.dedup.separator.chars().count() != 1 {
            return Err(FeatureError::Config(format!(
                "dedup.separator must be a single character, got '{}'",
                self.dedup.separator
            )));
        }
        if self.label.pattern.is_empty() {
            return Err(FeatureError::Config("label.pattern must not be empty".to_string()));
        }
        if self.label.name.is_empty() {
            return Err(FeatureError::Config("label.name must not be empty".to_string()));
        }
        if self.output.name.is_empty() {
            return Err(FeatureError::Config("output.name must not be empty".to_string()));
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
