//! Error types for the feature aggregation pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeatureError>;

/// Schema problems in a loaded or projected table. Always fatal.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Source file not found: {0:?}")]
    MissingSource(PathBuf),

    #[error("Key column '{column}' not found in table '{table}'")]
    MissingKeyColumn { table: String, column: String },

    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Duplicate key '{key}' in column '{column}' of table '{table}'")]
    DuplicateKey {
        table: String,
        column: String,
        key: String,
    },

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Parse error in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Join key error: column '{column}' missing from table '{table}'")]
    JoinKey { table: String, column: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by collaborators to decide exit codes and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Schema,
    Parse,
    JoinKey,
    Config,
    Io,
}

impl FeatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeatureError::Schema(_) => ErrorKind::Schema,
            FeatureError::Parse { .. } => ErrorKind::Parse,
            FeatureError::JoinKey { .. } => ErrorKind::JoinKey,
            FeatureError::Config(_) => ErrorKind::Config,
            FeatureError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        FeatureError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn join_key(table: impl Into<String>, column: impl Into<String>) -> Self {
        FeatureError::JoinKey {
            table: table.into(),
            column: column.into(),
        }
    }
}
