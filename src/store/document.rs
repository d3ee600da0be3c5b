//! Single-file JSON documents.
//!
//! Each persisted concern (analyses, settings, metrics) is one pretty-printed
//! JSON document. Writes go through a temp file in the same directory and an
//! atomic rename, so a failed write leaves the previous document intact.

use crate::store::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

/// A JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the document. Missing, unreadable or corrupt documents yield `None`.
    pub fn read<T: DeserializeOwned>(&self) -> Option<T> {
        match self.read_strict() {
            Ok(value) => value,
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Read the document, telling a missing file (`Ok(None)`) apart from one
    /// that exists but cannot be read or parsed.
    pub fn read_strict<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        if !self.path.exists() {
            debug!("Document {} does not exist yet", self.path.display());
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Replace the document with `value`.
    pub fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize {
            path: self.path.clone(),
            source: e,
        })?;

        let mut temp =
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let temp_path = temp.path().to_path_buf();
        temp.write_all(json.as_bytes())
            .map_err(|e| StoreError::io(&temp_path, e))?;
        temp.flush().map_err(|e| StoreError::io(&temp_path, e))?;
        temp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_document_reads_none() {
        let dir = TempDir::new().unwrap();
        let doc = JsonDocument::new(dir.path().join("missing.json"));
        assert!(doc.read::<Vec<String>>().is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let doc = JsonDocument::new(dir.path().join("nested").join("doc.json"));

        doc.write(&vec!["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(
            doc.read::<Vec<String>>(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_corrupt_document_reads_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{ not json").unwrap();

        let doc = JsonDocument::new(&path);
        assert!(doc.read::<Vec<String>>().is_none());
        assert!(matches!(
            doc.read_strict::<Vec<String>>(),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_strict_read_of_missing_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let doc = JsonDocument::new(dir.path().join("missing.json"));
        assert!(matches!(doc.read_strict::<Vec<String>>(), Ok(None)));
    }

    #[test]
    fn test_unwritable_location_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let doc = JsonDocument::new(blocker.join("doc.json"));
        let result = doc.write(&vec![1, 2, 3]);
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
