//! Core error types.

use std::path::Path;

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while loading, validating or storing archive records.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("archive '{0}' has both a legacy and a YAML document")]
    ConflictingDocuments(String),

    #[error("unsupported document extension: {0}")]
    UnsupportedExtension(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_document(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
