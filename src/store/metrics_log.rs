//! Bounded log of operational metrics snapshots (`metrics.json`).

use crate::models::MetricsSnapshot;
use crate::store::{JsonDocument, StoreError};
use chrono::Utc;
use std::path::PathBuf;

/// Snapshots kept; older entries are evicted first.
pub const MAX_SNAPSHOTS: usize = 100;

#[derive(Debug, Clone)]
pub struct MetricsLog {
    document: JsonDocument,
    capacity: usize,
}

impl MetricsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
            capacity: MAX_SNAPSHOTS,
        }
    }

    /// Stamp and append a snapshot, evicting the oldest past capacity.
    pub fn append(&self, mut snapshot: MetricsSnapshot) -> Result<(), StoreError> {
        snapshot.timestamp = Some(Utc::now());

        let mut snapshots = self.load();
        snapshots.push(snapshot);

        if snapshots.len() > self.capacity {
            let excess = snapshots.len() - self.capacity;
            snapshots.drain(..excess);
        }

        self.document.write(&snapshots)
    }

    /// All stored snapshots, oldest first.
    pub fn load(&self) -> Vec<MetricsSnapshot> {
        self.document.read().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisStatus, PriorityLevel};
    use tempfile::TempDir;

    fn snapshot(duration_ms: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: None,
            backend: "Simulation".to_string(),
            status: AnalysisStatus::Simulated,
            duration_ms,
            global_score: 6.9,
            priority_level: PriorityLevel::High,
            report_chars: 2048,
        }
    }

    #[test]
    fn test_append_stamps_timestamp() {
        let dir = TempDir::new().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics.json"));

        log.append(snapshot(12)).unwrap();

        let stored = log.load();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].timestamp.is_some());
        assert_eq!(stored[0].duration_ms, 12);
    }

    #[test]
    fn test_bounded_oldest_evicted() {
        let dir = TempDir::new().unwrap();
        let log = MetricsLog::new(dir.path().join("metrics.json"));

        for i in 0..(MAX_SNAPSHOTS as u64 + 5) {
            log.append(snapshot(i)).unwrap();
        }

        let stored = log.load();
        assert_eq!(stored.len(), MAX_SNAPSHOTS);
        assert_eq!(stored[0].duration_ms, 5);
        assert_eq!(stored[MAX_SNAPSHOTS - 1].duration_ms, MAX_SNAPSHOTS as u64 + 4);
    }
}
