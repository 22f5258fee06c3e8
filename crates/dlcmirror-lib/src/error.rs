use crate::download::FetchError;
use crate::manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid mirror root URL {url}: {source}")]
    MirrorRoot {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {reason}")]
    ClientSetup { reason: String },

    #[error("Failed to fetch root manifest: {0}")]
    RootManifestFetch(#[source] FetchError),

    #[error("Root manifest is unusable: {0}")]
    RootManifest(#[source] ManifestError),

    #[error("Failed to write {path}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("Failed to set up logging at {path}: {reason}")]
    LoggingSetup { path: PathBuf, reason: String },

    #[error("CLI argument validation failed: {details}")]
    CliArgumentValidation { details: String },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}
