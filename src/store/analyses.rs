//! The analysis store.
//!
//! An append/delete log of analysis records with query and aggregation
//! operations on top. Records are never mutated once stored, and metrics
//! are re-extracted from the content on every query.

use crate::analysis::{self, Comparison};
use crate::models::{
    AnalysisRecord, DashboardStats, ListedAnalysis, NewAnalysis, PriorityLevel,
};
use crate::store::export::{self, ExportFormat, ExportOutput};
use crate::store::{RecordRepository, StoreError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Query and mutation facade over a [`RecordRepository`].
pub struct AnalysisStore<R: RecordRepository> {
    repository: R,
    spreadsheet_path: PathBuf,
}

impl<R: RecordRepository> AnalysisStore<R> {
    /// Create a store. Spreadsheet exports are written to `spreadsheet_path`.
    pub fn new(repository: R, spreadsheet_path: impl Into<PathBuf>) -> Self {
        Self {
            repository,
            spreadsheet_path: spreadsheet_path.into(),
        }
    }

    /// Append a record, assigning an id and timestamp when absent.
    ///
    /// Fails without writing when the existing store cannot be read.
    pub fn save(&self, analysis: NewAnalysis) -> Result<AnalysisRecord, StoreError> {
        let mut records = self.repository.load_for_update().map_err(|e| {
            error!("Refusing to save over an unreadable store: {}", e);
            e
        })?;

        let id = match analysis.id {
            Some(id) => id,
            None => generate_id(&records),
        };

        let record = AnalysisRecord {
            id,
            content: analysis.content,
            created_at: analysis.created_at.unwrap_or_else(Utc::now),
            metadata: analysis.metadata,
        };

        records.push(record.clone());

        if let Err(e) = self.repository.replace(&records) {
            error!("Failed to save analysis {}: {}", record.id, e);
            return Err(e);
        }

        info!("Saved analysis {}", record.id);
        Ok(record)
    }

    /// All records in storage order, with display titles.
    pub fn list_all(&self) -> Vec<ListedAnalysis> {
        analysis::annotate(self.repository.load())
    }

    pub fn get_by_id(&self, id: &str) -> Option<AnalysisRecord> {
        self.repository.load().into_iter().find(|r| r.id == id)
    }

    /// Remove every record with this id. Returns how many were removed;
    /// an unknown id is a no-op.
    pub fn delete_by_id(&self, id: &str) -> Result<usize, StoreError> {
        let mut records = self.repository.load_for_update().map_err(|e| {
            error!("Refusing to delete from an unreadable store: {}", e);
            e
        })?;
        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = before - records.len();

        if removed == 0 {
            debug!("No analysis with id {}, nothing to delete", id);
            return Ok(0);
        }

        if let Err(e) = self.repository.replace(&records) {
            error!("Failed to delete analysis {}: {}", id, e);
            return Err(e);
        }

        info!("Deleted analysis {}", id);
        Ok(removed)
    }

    pub fn filter_by_priority(&self, level: PriorityLevel) -> Vec<ListedAnalysis> {
        analysis::filter_by_priority(&self.list_all(), level)
    }

    pub fn filter_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<ListedAnalysis> {
        analysis::filter_by_date_range(&self.list_all(), start, end)
    }

    pub fn search(&self, query: &str) -> Vec<ListedAnalysis> {
        analysis::search(&self.list_all(), query)
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        analysis::dashboard_stats(&self.list_all())
    }

    /// Number of analyses scoring at or above an alert threshold.
    pub fn alert_count(&self, threshold: f64) -> usize {
        analysis::count_at_or_above(&self.list_all(), threshold)
    }

    /// Compare stored analyses by id. Unknown ids are reported as
    /// [`StoreError::NotFound`]; at least two analyses are required.
    pub fn compare(&self, ids: &[String]) -> Result<Comparison, StoreError> {
        let all = self.list_all();
        let mut selected = Vec::with_capacity(ids.len());

        for id in ids {
            let found = all
                .iter()
                .find(|a| &a.record.id == id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            selected.push(found.clone());
        }

        if selected.len() < 2 {
            return Err(StoreError::NotFound(
                "at least two analyses are needed for a comparison".to_string(),
            ));
        }

        Ok(analysis::compare(&selected))
    }

    /// Serialize every record in the requested format.
    pub fn export(&self, format: ExportFormat) -> Result<ExportOutput, StoreError> {
        let analyses = self.list_all();

        match format {
            ExportFormat::Json => export::to_json(&analyses).map(ExportOutput::Text),
            ExportFormat::Csv => Ok(ExportOutput::Text(export::to_csv(&analyses))),
            ExportFormat::Spreadsheet => {
                export::to_spreadsheet(&analyses, &self.spreadsheet_path).map(ExportOutput::File)
            }
        }
    }
}

/// Short random id, unique within the current collection.
fn generate_id(existing: &[AnalysisRecord]) -> String {
    loop {
        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        if !existing.iter().any(|r| r.id == id) {
            return id;
        }
    }
}
