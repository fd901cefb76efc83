//! bindfeat-common: shared error taxonomy and pipeline configuration for the bindfeat crates.

pub mod error;
pub mod pipeline_config;

// Re-export commonly used types
pub use error::{ErrorKind, FeatureError, Result, SchemaError};
pub use pipeline_config::{
    Delimiter, IdentifierExtraction, KeyColumns, LabelConfig, OutputConfig, PipelineConfig,
    SourceSpec, Sources,
};
