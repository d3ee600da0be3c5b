//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the persistence layer.
///
/// Read queries never produce these; they degrade to empty collections.
/// Mutations and exports report them to the caller, including a store that
/// exists but cannot be parsed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} exists but could not be parsed: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported export format: {0}")]
    InvalidFormat(String),

    #[error("Analysis not found: {0}")]
    NotFound(String),

    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
