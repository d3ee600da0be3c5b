//! Storage medium abstraction for analysis records.

use crate::models::AnalysisRecord;
use crate::store::{JsonDocument, StoreError};
use std::path::PathBuf;

/// A whole-collection record repository.
///
/// Mutations are read-modify-write cycles over the full collection, so two
/// concurrent writers race and the last one wins.
pub trait RecordRepository {
    /// Load every record in append order. Unreadable storage yields an
    /// empty collection.
    fn load(&self) -> Vec<AnalysisRecord>;

    /// Load every record ahead of a mutation. Missing storage is an empty
    /// collection; storage that exists but cannot be read is an error, so the
    /// caller never overwrites records it failed to load.
    fn load_for_update(&self) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Replace the stored collection.
    fn replace(&self, records: &[AnalysisRecord]) -> Result<(), StoreError>;
}

/// Records kept in a single `analyses.json` document.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    document: JsonDocument,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }
}

impl RecordRepository for JsonFileRepository {
    fn load(&self) -> Vec<AnalysisRecord> {
        self.document.read().unwrap_or_default()
    }

    fn load_for_update(&self) -> Result<Vec<AnalysisRecord>, StoreError> {
        Ok(self.document.read_strict()?.unwrap_or_default())
    }

    fn replace(&self, records: &[AnalysisRecord]) -> Result<(), StoreError> {
        self.document.write(records)
    }
}
