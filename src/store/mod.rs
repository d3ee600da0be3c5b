//! Persistence for analyses, dashboard settings and metrics snapshots.
//!
//! Each concern is a separate JSON document inside the data directory.

pub mod analyses;
pub mod document;
pub mod error;
pub mod export;
pub mod metrics_log;
pub mod repository;
pub mod settings;

pub use analyses::AnalysisStore;
pub use document::JsonDocument;
pub use error::StoreError;
pub use export::{ExportFormat, ExportOutput};
pub use metrics_log::MetricsLog;
pub use repository::{JsonFileRepository, RecordRepository};
pub use settings::{DashboardSettings, SettingsStore};

use std::path::{Path, PathBuf};

/// Layout of the data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analyses_path(&self) -> PathBuf {
        self.root.join("analyses.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.root.join("metrics.json")
    }

    pub fn spreadsheet_path(&self) -> PathBuf {
        self.root.join("analyses_export.xlsx")
    }

    /// Analysis store backed by `analyses.json`.
    pub fn analysis_store(&self) -> AnalysisStore<JsonFileRepository> {
        AnalysisStore::new(
            JsonFileRepository::new(self.analyses_path()),
            self.spreadsheet_path(),
        )
    }

    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::new(self.settings_path())
    }

    pub fn metrics_log(&self) -> MetricsLog {
        MetricsLog::new(self.metrics_path())
    }
}
