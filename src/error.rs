use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DexError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config value: {0}")]
    InvalidConfig(String),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("catalog returned status {status}: {message}")]
    CatalogStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("unable to derive cache key: {0}")]
    CacheKey(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("no rows to export; the table header cannot be derived from an empty row set")]
    #[diagnostic(help("check that the species list returned at least one entry"))]
    EmptyTable,
}
