use std::path::PathBuf;
use thiserror::Error;

/// Structural misconfiguration of rules or presets, raised before any document is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid segment '{segment}' in path '{path}'")]
    InvalidPath { path: String, segment: String },

    #[error("table '{table}' column '{column}': field path '{path}' may not contain list expansion")]
    ExpansionInFieldPath {
        table: String,
        column: String,
        path: String,
    },

    #[error("table '{table}' column '{column}': parent source needs an anchor with an enclosing list element, got '{anchor}'")]
    NoEnclosingItem {
        table: String,
        column: String,
        anchor: String,
    },

    #[error("table '{table}' column '{column}': ordinal source needs an anchor ending in a list expansion, got '{anchor}'")]
    NoOrdinal {
        table: String,
        column: String,
        anchor: String,
    },

    #[error("table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("unknown preset '{name}', expected one of: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why one input document was skipped
#[derive(Debug, Error)]
pub enum DocumentErrorKind {
    #[error("read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("missing top-level key '{0}'")]
    MissingKey(String),
}

/// A single input document that could not be used; the batch continues without it
#[derive(Debug, Error)]
#[error("document {label}: {kind}")]
pub struct DocumentError {
    /// File name, line number or other caller-chosen label
    pub label: String,
    pub kind: DocumentErrorKind,
}

impl DocumentError {
    pub fn new(label: impl Into<String>, kind: DocumentErrorKind) -> Self {
        DocumentError {
            label: label.into(),
            kind,
        }
    }
}

/// A destination that could not be created or written
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
