//! bindfeat-features - Feature aggregation for protein–ligand binding prediction.
//!
//! Joins independently produced feature tables into one wide, labelled table:
//! 1. Loading delimited sources keyed by protein or molecule identifiers
//! 2. Resolving duplicate molecule identifiers in descriptor tables
//! 3. Projecting descriptor columns to an allow-list
//! 4. Consolidating protein features and attaching them to docking rows
//! 5. Attaching binding pocket and molecular descriptor features
//! 6. Deriving the binary activity label
//! 7. Recording per-stage column manifests
//!
//! # Example
//!
//! ```rust,no_run
//! use bindfeat_common::PipelineConfig;
//! use bindfeat_features::FeaturePipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::from_file("bindfeat.toml".as_ref())?;
//!     let output = FeaturePipeline::new(config)?.run()?;
//!     println!("{} rows", output.table.row_count());
//!     Ok(())
//! }
//! ```

pub mod table;
pub mod loader;
pub mod sources;
pub mod dedup;
pub mod projection;
pub mod join;
pub mod label;
pub mod manifest;
pub mod pipeline;

pub use manifest::{ManifestLog, Stage, StageManifest, StageWarning};
pub use pipeline::{FeaturePipeline, PipelineInputs, PipelineOutput};
pub use projection::AllowList;
pub use sources::TableCategory;
pub use table::{FeatureTable, Value};
