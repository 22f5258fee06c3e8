use std::path::PathBuf;
use thiserror::Error;

/// Failure that makes a whole manifest unusable.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to open manifest archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read manifest archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Manifest archive {path} does not contain {entry}")]
    MissingEntry { path: PathBuf, entry: String },

    #[error("Manifest archive {path} contains no entries")]
    EmptyArchive { path: PathBuf },

    #[error("Manifest entry {entry} is not valid UTF-8")]
    Encoding { entry: String },

    #[error("Manifest entry {entry} is not well-formed XML: {source}")]
    Xml {
        entry: String,
        #[source]
        source: roxmltree::Error,
    },
}

/// A structurally unexpected element. Logged and collected, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestMalformed {
    #[error("[{source_name}] IndexFile element without 'index' attribute (line {line})")]
    MissingIndexAttribute { source_name: String, line: u32 },

    #[error("[{source_name}] Package element has {count} FileName children, expected 1 (line {line})")]
    FileNameCount {
        source_name: String,
        line: u32,
        count: usize,
    },

    #[error("[{source_name}] FileName element without 'val' attribute (line {line})")]
    MissingValAttribute { source_name: String, line: u32 },

    #[error("[{source_name}] Reference {reference:?} does not form a valid URL: {reason}")]
    InvalidReference {
        source_name: String,
        reference: String,
        reason: String,
    },

    #[error("[{source_name}] Archive contains {count} entries, expected 1")]
    ExtraEntries { source_name: String, count: usize },
}
