//! End-to-end analysis: dispatch, extract, persist, record.

use crate::backend::{AnalysisOutcome, Dispatcher};
use crate::models::{
    AnalysisRecord, AnalysisRequest, ExtractedMetrics, MetricsSnapshot, NewAnalysis,
};
use crate::report::extract_metrics;
use crate::store::{AnalysisStore, MetricsLog, RecordRepository, StoreError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub outcome: AnalysisOutcome,
    pub metrics: ExtractedMetrics,
    /// The stored record, unless persistence was skipped.
    pub record: Option<AnalysisRecord>,
    pub duration: Duration,
}

pub struct AnalysisPipeline<R: RecordRepository> {
    dispatcher: Dispatcher,
    store: AnalysisStore<R>,
    metrics_log: MetricsLog,
}

impl<R: RecordRepository> AnalysisPipeline<R> {
    pub fn new(dispatcher: Dispatcher, store: AnalysisStore<R>, metrics_log: MetricsLog) -> Self {
        Self {
            dispatcher,
            store,
            metrics_log,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one analysis.
    ///
    /// Backend failures never fail the run (the outcome carries the inline
    /// error report). Only a failed save is returned as an error; a failed
    /// metrics snapshot is logged and ignored.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        persist: bool,
    ) -> Result<PipelineResult, StoreError> {
        let weight_sum = request.weights.sum();
        if weight_sum > 1.0 + f64::EPSILON {
            warn!(
                "Weights sum to {:.2}; the global score is not normalised and may exceed 10",
                weight_sum
            );
        }

        let start = Instant::now();
        let outcome = self.dispatcher.analyze(request).await;
        let duration = start.elapsed();

        let metrics = extract_metrics(&outcome.report);
        debug!(
            "Extracted global score {:.1} ({}) in {:?}",
            metrics.global_score, metrics.priority_level, duration
        );

        let record = if persist {
            let mut metadata = request.to_metadata();
            metadata.insert("backend".into(), outcome.backend.clone().into());
            metadata.insert("status".into(), outcome.status.to_string().into());

            Some(
                self.store
                    .save(NewAnalysis::new(outcome.report.clone()).with_metadata(metadata))?,
            )
        } else {
            debug!("Persistence skipped");
            None
        };

        let snapshot = MetricsSnapshot {
            timestamp: None,
            backend: outcome.backend.clone(),
            status: outcome.status,
            duration_ms: duration.as_millis() as u64,
            global_score: metrics.global_score,
            priority_level: metrics.priority_level,
            report_chars: outcome.report.chars().count(),
        };

        if let Err(e) = self.metrics_log.append(snapshot) {
            warn!("Failed to record metrics snapshot: {}", e);
        }

        Ok(PipelineResult {
            outcome,
            metrics,
            record,
            duration,
        })
    }
}
