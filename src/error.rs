use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup failures while building [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: String },
    #[error("invalid TOML in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid config value for '{field}': {message}")]
    Validation { field: String, message: String },
    #[error("required environment variable '{0}' is not set")]
    MissingEnv(&'static str),
}

/// Errors raised while loading, reconciling, aggregating or writing outputs.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("column '{column}' not found")]
    MissingColumn { column: String },
    #[error("extract {path} does not share the schema of the previous extracts")]
    SchemaMismatch { path: String },
    #[error("unrecognised AfC band label '{0}'")]
    UnrecognisedBand(String),
    #[error("unparseable date '{0}'")]
    InvalidDate(String),
    #[error("invalid value '{value}' in column '{column}'")]
    InvalidNumber { column: String, value: String },
    #[error("invalid lookup row {line}: {reason}")]
    InvalidLookup { line: u64, reason: String },
    #[error("table is not grouped by dimension '{0}'")]
    UnknownDimension(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
