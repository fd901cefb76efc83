//! Command-line arguments and their mapping onto `PipelineConfig`.
//! A config file (`--config` or BINDFEAT_CONFIG) is read first; flags override it.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bindfeat_common::{PipelineConfig, SourceSpec};

#[derive(Debug, Parser)]
#[command(
    name = "bindfeat",
    version,
    about = "Aggregate protein-ligand binding features into one labelled table"
)]
pub struct Cli {
    /// Pipeline config file (TOML, YAML or JSON)
    #[arg(long, env = "BINDFEAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Protein feature tables, consolidated in the given order
    #[arg(short = 'p', long = "protein", num_args = 1..)]
    pub protein: Vec<PathBuf>,

    /// Key column of the protein tables as named in the files (e.g. Cluster_Name).
    /// One name applies to every table; several pair up with `--protein` in order.
    #[arg(long = "protein-key", num_args = 1..)]
    pub protein_key: Vec<String>,

    /// Protein-ligand docking features
    #[arg(long)]
    pub docking: Option<PathBuf>,

    /// Molecular descriptor table
    #[arg(short = 'm', long)]
    pub descriptors: Option<PathBuf>,

    /// Key column of the descriptor table as named in the file (e.g. NAME)
    #[arg(long)]
    pub descriptor_key: Option<String>,

    /// Binding pocket features
    #[arg(long)]
    pub pocket: Option<PathBuf>,

    /// File listing which molecular descriptors to keep
    #[arg(long)]
    pub feats: Option<PathBuf>,

    /// Output directory for the table and manifests
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Output table name, without extension
    #[arg(short = 'o', long)]
    pub output_name: Option<String>,

    /// Skip writing per-stage manifest files
    #[arg(long)]
    pub no_manifests: bool,

    /// Fail without writing output when the final table is empty
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Only warn about duplicate keys in protein, pocket and descriptor tables
    #[arg(long)]
    pub lenient_keys: bool,
}

mod tests;

impl Cli {
    pub fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match self.config {
            Some(ref path) => PipelineConfig::from_file(path)
                .with_context(|| format!("Failed to load config {path:?}"))?,
            None => PipelineConfig::default(),
        };
        self.apply(&mut config)?;
        Ok(config)
    }

    fn apply(self, config: &mut PipelineConfig) -> anyhow::Result<()> {
        if !self.protein.is_empty() {
            config.sources.protein = self.protein.into_iter().map(SourceSpec::new).collect();
        }
        match self.protein_key.len() {
            0 => {}
            1 => {
                for spec in &mut config.sources.protein {
                    spec.key = Some(self.protein_key[0].clone());
                }
            }
            n if n == config.sources.protein.len() => {
                for (spec, key) in config.sources.protein.iter_mut().zip(self.protein_key) {
                    spec.key = Some(key);
                }
            }
            n => anyhow::bail!(
                "--protein-key given {n} times for {} protein tables; give one name or one per table",
                config.sources.protein.len()
            ),
        }
        if let Some(path) = self.docking {
            config.sources.docking = Some(SourceSpec::new(path));
        }
        if let Some(path) = self.descriptors {
            let mut spec = SourceSpec::new(path);
            spec.key = self.descriptor_key;
            config.sources.descriptors = Some(spec);
        } else if let (Some(key), Some(spec)) = (self.descriptor_key, config.sources.descriptors.as_mut()) {
            spec.key = Some(key);
        }
        if let Some(path) = self.pocket {
            config.sources.pocket = Some(SourceSpec::new(path));
        }
        if let Some(path) = self.feats {
            config.descriptor_allow_list = Some(path);
        }
        if let Some(dir) = self.out_dir {
            config.output.dir = dir;
        }
        if let Some(name) = self.output_name {
            config.output.name = name;
        }
        if self.no_manifests {
            config.output.manifests = false;
        }
        if self.fail_on_empty {
            config.output.fail_on_empty = true;
        }
        if self.lenient_keys {
            config.strict_keys = false;
        }
        Ok(())
    }
}
