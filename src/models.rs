//! Data models for strategic analyses.
//!
//! This module contains the core data structures shared by the backends,
//! the report parser and the analysis store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form record metadata (focus area, urgency, company size, model...).
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Strategic domain the analysis should focus on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    Competition,
    Market,
    Technology,
    Regulation,
    General,
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusArea::Competition => write!(f, "Concurrence"),
            FocusArea::Market => write!(f, "Marché"),
            FocusArea::Technology => write!(f, "Technologie"),
            FocusArea::Regulation => write!(f, "Réglementation"),
            FocusArea::General => write!(f, "Général"),
        }
    }
}

/// How urgent the caller considers the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Critical,
    High,
    Moderate,
    Low,
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrgencyLevel::Critical => write!(f, "Critique"),
            UrgencyLevel::High => write!(f, "Élevé"),
            UrgencyLevel::Moderate => write!(f, "Modéré"),
            UrgencyLevel::Low => write!(f, "Faible"),
        }
    }
}

/// Size of the company the analysis is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Sme,
    LargeEnterprise,
    Multinational,
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanySize::Startup => write!(f, "Startup"),
            CompanySize::Sme => write!(f, "PME"),
            CompanySize::LargeEnterprise => write!(f, "Grande Entreprise"),
            CompanySize::Multinational => write!(f, "Multinationale"),
        }
    }
}

/// Priority band derived from a global score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    #[default]
    Moderate,
    High,
    Critical,
}

impl PriorityLevel {
    /// All bands, highest first.
    pub const ALL: [PriorityLevel; 4] = [
        PriorityLevel::Critical,
        PriorityLevel::High,
        PriorityLevel::Moderate,
        PriorityLevel::Low,
    ];

    /// Band a global score. Lower bounds are inclusive, first match wins.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            PriorityLevel::Critical
        } else if score >= 6.5 {
            PriorityLevel::High
        } else if score >= 5.0 {
            PriorityLevel::Moderate
        } else {
            PriorityLevel::Low
        }
    }

    /// Label written into reports.
    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::Critical => "CRITIQUE",
            PriorityLevel::High => "ÉLEVÉ",
            PriorityLevel::Moderate => "MODÉRÉ",
            PriorityLevel::Low => "FAIBLE",
        }
    }

    /// Parse a report token. Accepts the report labels with or without
    /// accents as well as the English band names.
    pub fn from_label(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "CRITIQUE" | "CRITICAL" => Some(PriorityLevel::Critical),
            "ÉLEVÉ" | "ELEVE" | "HIGH" => Some(PriorityLevel::High),
            "MODÉRÉ" | "MODERE" | "MODERATE" => Some(PriorityLevel::Moderate),
            "FAIBLE" | "LOW" => Some(PriorityLevel::Low),
            _ => None,
        }
    }

    /// Returns an emoji representation of the band.
    pub fn emoji(&self) -> &'static str {
        match self {
            PriorityLevel::Low => "🟢",
            PriorityLevel::Moderate => "🟡",
            PriorityLevel::High => "🟠",
            PriorityLevel::Critical => "🔴",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The five scoring criteria, in weight order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Impact,
    Urgency,
    Complexity,
    Risk,
    Reliability,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::Impact,
        Criterion::Urgency,
        Criterion::Complexity,
        Criterion::Risk,
        Criterion::Reliability,
    ];

    /// Fixed label used in the scoring table.
    pub fn label(&self) -> &'static str {
        match self {
            Criterion::Impact => "Impact Business",
            Criterion::Urgency => "Urgence Temporelle",
            Criterion::Complexity => "Complexité Exécution",
            Criterion::Risk => "Risque Concurrentiel",
            Criterion::Reliability => "Fiabilité Source",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Criterion::Impact => 0,
            Criterion::Urgency => 1,
            Criterion::Complexity => 2,
            Criterion::Risk => 3,
            Criterion::Reliability => 4,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One score per criterion, 0-10.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CriterionScores {
    pub impact: f64,
    pub urgency: f64,
    pub complexity: f64,
    pub risk: f64,
    pub reliability: f64,
}

impl CriterionScores {
    pub fn from_array(scores: [f64; 5]) -> Self {
        Self {
            impact: scores[0],
            urgency: scores[1],
            complexity: scores[2],
            risk: scores[3],
            reliability: scores[4],
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.impact,
            self.urgency,
            self.complexity,
            self.risk,
            self.reliability,
        ]
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.as_array()[criterion.index()]
    }

    pub fn set(&mut self, criterion: Criterion, value: f64) {
        match criterion {
            Criterion::Impact => self.impact = value,
            Criterion::Urgency => self.urgency = value,
            Criterion::Complexity => self.complexity = value,
            Criterion::Risk => self.risk = value,
            Criterion::Reliability => self.reliability = value,
        }
    }

    /// Weighted sum of the scores. Not normalised by the sum of weights.
    pub fn weighted_sum(&self, weights: &Weights) -> f64 {
        self.as_array()
            .iter()
            .zip(weights.as_array().iter())
            .map(|(s, w)| s * w)
            .sum()
    }
}

/// Ordered weights for the five criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Weights([f64; 5]);

impl Default for Weights {
    fn default() -> Self {
        Self([0.3, 0.25, 0.2, 0.15, 0.1])
    }
}

impl Weights {
    pub fn new(weights: [f64; 5]) -> Self {
        Self(weights)
    }

    pub fn as_array(&self) -> [f64; 5] {
        self.0
    }

    pub fn get(&self, criterion: Criterion) -> f64 {
        self.0[criterion.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Check that every weight lies in (0, 1].
    pub fn validate_range(&self) -> Result<(), String> {
        for (criterion, weight) in Criterion::ALL.iter().zip(self.0.iter()) {
            if !(*weight > 0.0 && *weight <= 1.0) {
                return Err(format!(
                    "Weight for {} must be in (0, 1], got {}",
                    criterion, weight
                ));
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for Weights {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let array: [f64; 5] = values
            .try_into()
            .map_err(|v: Vec<f64>| format!("Expected exactly 5 weights, got {}", v.len()))?;
        Ok(Self::new(array))
    }
}

impl From<Weights> for Vec<f64> {
    fn from(weights: Weights) -> Self {
        weights.0.to_vec()
    }
}

/// Everything a backend needs to produce a report.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub content: String,
    pub focus_area: FocusArea,
    pub urgency_level: UrgencyLevel,
    pub company_size: CompanySize,
    /// Backend selector, e.g. "Claude-3-Sonnet", "GPT-4" or "Simulation".
    pub model_name: String,
    pub weights: Weights,
}

impl AnalysisRequest {
    /// Metadata persisted alongside the generated report.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("focus_area".into(), self.focus_area.to_string().into());
        metadata.insert("urgency_level".into(), self.urgency_level.to_string().into());
        metadata.insert("company_size".into(), self.company_size.to_string().into());
        metadata.insert("model".into(), self.model_name.clone().into());
        metadata
    }
}

/// How an analysis was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// A real provider answered.
    Completed,
    /// The simulated scorer produced the report.
    Simulated,
    /// A real provider failed; the report holds the error text.
    BackendFailed,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Simulated => write!(f, "simulated"),
            AnalysisStatus::BackendFailed => write!(f, "backend_failed"),
        }
    }
}

/// A persisted analysis. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub content: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A record about to be saved. Missing id/timestamp are assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewAnalysis {
    pub id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub content: String,
    pub metadata: Metadata,
}

impl NewAnalysis {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A record annotated with its display title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedAnalysis {
    #[serde(flatten)]
    pub record: AnalysisRecord,
    pub title: String,
}

/// Metrics recovered from a report's text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetrics {
    pub global_score: f64,
    pub priority_level: PriorityLevel,
    pub scores: CriterionScores,
}

impl Default for ExtractedMetrics {
    fn default() -> Self {
        Self {
            global_score: 0.0,
            priority_level: PriorityLevel::Moderate,
            scores: CriterionScores::default(),
        }
    }
}

/// Count of analyses per priority band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriorityHistogram {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl PriorityHistogram {
    pub fn record(&mut self, level: PriorityLevel) {
        match level {
            PriorityLevel::Critical => self.critical += 1,
            PriorityLevel::High => self.high += 1,
            PriorityLevel::Moderate => self.moderate += 1,
            PriorityLevel::Low => self.low += 1,
        }
    }

    pub fn get(&self, level: PriorityLevel) -> usize {
        match level {
            PriorityLevel::Critical => self.critical,
            PriorityLevel::High => self.high,
            PriorityLevel::Moderate => self.moderate,
            PriorityLevel::Low => self.low,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }
}

/// Dashboard statistics recomputed from every stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_analyses: usize,
    /// Mean of the parseable global scores, rounded to one decimal.
    pub average_score: f64,
    pub critical_priorities: usize,
    /// Synthetic ROI: sum of global scores times a fixed per-point value.
    pub estimated_roi: f64,
    /// Up to the last 10 parseable global scores, in storage order.
    pub recent_scores: Vec<f64>,
    pub priority_distribution: PriorityHistogram,
    /// Up to the last 5 stored analyses, in storage order.
    pub recent_analyses: Vec<ListedAnalysis>,
}

/// Operational snapshot recorded after each analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Set by the log when the snapshot is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub backend: String,
    pub status: AnalysisStatus,
    pub duration_ms: u64,
    pub global_score: f64,
    pub priority_level: PriorityLevel,
    pub report_chars: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_banding_boundaries() {
        assert_eq!(PriorityLevel::from_score(8.0), PriorityLevel::Critical);
        assert_eq!(PriorityLevel::from_score(7.999), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_score(6.5), PriorityLevel::High);
        assert_eq!(PriorityLevel::from_score(6.499), PriorityLevel::Moderate);
        assert_eq!(PriorityLevel::from_score(5.0), PriorityLevel::Moderate);
        assert_eq!(PriorityLevel::from_score(4.999), PriorityLevel::Low);
        assert_eq!(PriorityLevel::from_score(12.0), PriorityLevel::Critical);
    }

    #[test]
    fn test_priority_from_label() {
        assert_eq!(PriorityLevel::from_label("CRITIQUE"), Some(PriorityLevel::Critical));
        assert_eq!(PriorityLevel::from_label("ÉLEVÉ"), Some(PriorityLevel::High));
        assert_eq!(PriorityLevel::from_label("ELEVE"), Some(PriorityLevel::High));
        assert_eq!(PriorityLevel::from_label("modéré"), Some(PriorityLevel::Moderate));
        assert_eq!(PriorityLevel::from_label("LOW"), Some(PriorityLevel::Low));
        assert_eq!(PriorityLevel::from_label("HAUTE"), None);
    }

    #[test]
    fn test_priority_label_round_trip() {
        for level in PriorityLevel::ALL {
            assert_eq!(PriorityLevel::from_label(level.label()), Some(level));
        }
    }

    #[test]
    fn test_weights_try_from() {
        let weights = Weights::try_from(vec![0.3, 0.25, 0.2, 0.15, 0.1]).unwrap();
        assert_eq!(weights, Weights::default());
        assert!(Weights::try_from(vec![0.5, 0.5]).is_err());
    }

    #[test]
    fn test_weights_range() {
        assert!(Weights::default().validate_range().is_ok());
        assert!(Weights::new([0.0, 0.2, 0.2, 0.2, 0.2]).validate_range().is_err());
        assert!(Weights::new([1.5, 0.2, 0.2, 0.2, 0.2]).validate_range().is_err());
        assert!(Weights::new([1.0, 1.0, 1.0, 1.0, 1.0]).validate_range().is_ok());
    }

    #[test]
    fn test_weighted_sum_is_not_normalised() {
        let scores = CriterionScores::from_array([8.0, 6.0, 4.0, 2.0, 10.0]);
        let weights = Weights::new([1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!((scores.weighted_sum(&weights) - 30.0).abs() < 1e-9);

        let weights = Weights::new([0.3, 0.25, 0.2, 0.15, 0.1]);
        let expected = 8.0 * 0.3 + 6.0 * 0.25 + 4.0 * 0.2 + 2.0 * 0.15 + 10.0 * 0.1;
        assert!((scores.weighted_sum(&weights) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_record_serializes_timestamp_as_date() {
        let record = AnalysisRecord {
            id: "abc12345".to_string(),
            content: "# Report".to_string(),
            created_at: Utc::now(),
            metadata: Metadata::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("date").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_histogram() {
        let mut histogram = PriorityHistogram::default();
        histogram.record(PriorityLevel::Critical);
        histogram.record(PriorityLevel::Low);
        histogram.record(PriorityLevel::Low);
        assert_eq!(histogram.get(PriorityLevel::Low), 2);
        assert_eq!(histogram.total(), 3);
    }
}
