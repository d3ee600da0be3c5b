//! Analysis aggregation and statistics.
//!
//! This module provides the dashboard statistics, the query filters and the
//! multi-analysis comparison. Metrics are re-extracted from each report's
//! content every time.

use crate::models::{
    AnalysisRecord, Criterion, DashboardStats, ExtractedMetrics, ListedAnalysis, PriorityHistogram,
    PriorityLevel,
};
use crate::report::{extract_metrics, title_from_report};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Synthetic ROI value of one global score point.
pub const ROI_PER_POINT: f64 = 100_000.0;

/// Number of global scores kept in the score trend.
pub const RECENT_SCORES: usize = 10;

/// Number of analyses listed as recent.
pub const RECENT_ANALYSES: usize = 5;

/// Maximum spread between analyses still considered a consensus.
pub const CONSENSUS_SPREAD: f64 = 1.0;

/// Attach display titles to records, preserving storage order.
pub fn annotate(records: Vec<AnalysisRecord>) -> Vec<ListedAnalysis> {
    records
        .into_iter()
        .map(|record| {
            let title = title_from_report(&record.content);
            ListedAnalysis { record, title }
        })
        .collect()
}

/// Compute dashboard statistics.
///
/// Reports whose global score cannot be parsed (0.0) are left out of the
/// mean, the trend and the ROI, but still count towards the total and the
/// priority histogram (under their default band).
pub fn dashboard_stats(analyses: &[ListedAnalysis]) -> DashboardStats {
    let mut scores = Vec::new();
    let mut distribution = PriorityHistogram::default();

    for analysis in analyses {
        let metrics = extract_metrics(&analysis.record.content);
        if metrics.global_score > 0.0 {
            scores.push(metrics.global_score);
        }
        distribution.record(metrics.priority_level);
    }

    let total: f64 = scores.iter().sum();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        round_one_decimal(total / scores.len() as f64)
    };

    DashboardStats {
        total_analyses: analyses.len(),
        average_score,
        critical_priorities: distribution.critical,
        estimated_roi: total * ROI_PER_POINT,
        recent_scores: last_n(&scores, RECENT_SCORES),
        priority_distribution: distribution,
        recent_analyses: last_n(analyses, RECENT_ANALYSES),
    }
}

fn last_n<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    items[items.len().saturating_sub(n)..].to_vec()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Analyses whose extracted priority band is `level`.
pub fn filter_by_priority(
    analyses: &[ListedAnalysis],
    level: PriorityLevel,
) -> Vec<ListedAnalysis> {
    analyses
        .iter()
        .filter(|a| extract_metrics(&a.record.content).priority_level == level)
        .cloned()
        .collect()
}

/// Analyses created within `[start, end]`, both ends inclusive.
pub fn filter_by_date_range(
    analyses: &[ListedAnalysis],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<ListedAnalysis> {
    analyses
        .iter()
        .filter(|a| start <= a.record.created_at && a.record.created_at <= end)
        .cloned()
        .collect()
}

/// Case-insensitive substring search over title and content.
pub fn search(analyses: &[ListedAnalysis], query: &str) -> Vec<ListedAnalysis> {
    let query = query.to_lowercase();

    analyses
        .iter()
        .filter(|a| {
            a.title.to_lowercase().contains(&query)
                || a.record.content.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Number of analyses whose global score reaches `threshold`.
pub fn count_at_or_above(analyses: &[ListedAnalysis], threshold: f64) -> usize {
    analyses
        .iter()
        .filter(|a| extract_metrics(&a.record.content).global_score >= threshold)
        .count()
}

/// One analysis taking part in a comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparedAnalysis {
    pub id: String,
    pub title: String,
    pub metrics: ExtractedMetrics,
}

/// Spread of one criterion across the compared analyses.
#[derive(Debug, Clone, Serialize)]
pub struct CriterionComparison {
    pub criterion: Criterion,
    pub min: f64,
    pub max: f64,
    pub spread: f64,
    pub consensus: bool,
}

/// Side-by-side comparison of several analyses.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub analyses: Vec<ComparedAnalysis>,
    pub criteria: Vec<CriterionComparison>,
    pub global_spread: f64,
}

impl Comparison {
    pub fn consensus(&self) -> impl Iterator<Item = &CriterionComparison> {
        self.criteria.iter().filter(|c| c.consensus)
    }

    pub fn divergences(&self) -> impl Iterator<Item = &CriterionComparison> {
        self.criteria.iter().filter(|c| !c.consensus)
    }
}

/// Compare the extracted metrics of the given analyses.
pub fn compare(analyses: &[ListedAnalysis]) -> Comparison {
    let compared: Vec<ComparedAnalysis> = analyses
        .iter()
        .map(|a| ComparedAnalysis {
            id: a.record.id.clone(),
            title: a.title.clone(),
            metrics: extract_metrics(&a.record.content),
        })
        .collect();

    let criteria = Criterion::ALL
        .iter()
        .map(|criterion| {
            let (min, max) = min_max(compared.iter().map(|c| c.metrics.scores.get(*criterion)));
            let spread = max - min;
            CriterionComparison {
                criterion: *criterion,
                min,
                max,
                spread,
                consensus: spread <= CONSENSUS_SPREAD,
            }
        })
        .collect();

    let (min, max) = min_max(compared.iter().map(|c| c.metrics.global_score));

    Comparison {
        analyses: compared,
        criteria,
        global_spread: max - min,
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min.is_finite() && max.is_finite() {
        (min, max)
    } else {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use chrono::TimeZone;

    fn report(title: &str, score: f64) -> String {
        format!(
            "# 📈 ANALYSE STRATÉGIQUE - {}\n\
             | **Impact Business** | {:.1}/10 | x |\n\
             **🎯 SCORE GLOBAL DE PRIORITÉ : {:.1}/10 - Niveau : {}**\n",
            title,
            score,
            score,
            PriorityLevel::from_score(score)
        )
    }

    fn listed(id: &str, content: String, day: u32) -> ListedAnalysis {
        let record = AnalysisRecord {
            id: id.to_string(),
            content,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            metadata: Metadata::new(),
        };
        annotate(vec![record]).remove(0)
    }

    fn sample() -> Vec<ListedAnalysis> {
        vec![
            listed("a1", report("Fusion bancaire", 8.5), 1),
            listed("a2", report("Nouvelle régulation", 7.2), 2),
            listed("a3", report("Lancement produit", 6.8), 3),
        ]
    }

    #[test]
    fn test_dashboard_stats() {
        let stats = dashboard_stats(&sample());

        assert_eq!(stats.total_analyses, 3);
        assert!((stats.average_score - 7.5).abs() < 1e-9);
        assert_eq!(stats.critical_priorities, 1);
        assert_eq!(stats.priority_distribution.high, 2);
        assert!((stats.estimated_roi - 22.5 * ROI_PER_POINT).abs() < 1e-3);
        assert_eq!(stats.recent_scores, vec![8.5, 7.2, 6.8]);
        assert_eq!(stats.recent_analyses.len(), 3);
    }

    #[test]
    fn test_dashboard_stats_empty() {
        let stats = dashboard_stats(&[]);

        assert_eq!(stats.total_analyses, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.estimated_roi, 0.0);
        assert!(stats.recent_scores.is_empty());
        assert_eq!(stats.priority_distribution.total(), 0);
    }

    #[test]
    fn test_dashboard_stats_skips_unparseable_scores() {
        let mut analyses = sample();
        analyses.push(listed("a4", "Erreur GPT-4 API: timeout".to_string(), 4));

        let stats = dashboard_stats(&analyses);

        assert_eq!(stats.total_analyses, 4);
        assert!((stats.average_score - 7.5).abs() < 1e-9);
        assert_eq!(stats.recent_scores.len(), 3);
        assert_eq!(stats.priority_distribution.moderate, 1);
    }

    #[test]
    fn test_recent_windows_keep_storage_order() {
        let analyses: Vec<_> = (1..=12)
            .map(|i| listed(&format!("id{}", i), report("x", i as f64 * 0.5 + 2.0), i))
            .collect();

        let stats = dashboard_stats(&analyses);

        assert_eq!(stats.recent_scores.len(), RECENT_SCORES);
        assert_eq!(stats.recent_scores[0], 3.5);
        assert_eq!(stats.recent_scores[9], 8.0);
        let ids: Vec<_> = stats.recent_analyses.iter().map(|a| a.record.id.as_str()).collect();
        assert_eq!(ids, vec!["id8", "id9", "id10", "id11", "id12"]);
    }

    #[test]
    fn test_filter_by_priority() {
        let critical = filter_by_priority(&sample(), PriorityLevel::Critical);
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].record.id, "a1");

        assert!(filter_by_priority(&sample(), PriorityLevel::Low).is_empty());
    }

    #[test]
    fn test_filter_by_date_range_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();

        let found = filter_by_date_range(&sample(), start, end);
        let ids: Vec<_> = found.iter().map(|a| a.record.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        assert_eq!(search(&sample(), "RÉGULATION").len(), 1);
        assert_eq!(search(&sample(), "score global").len(), 3);
        assert!(search(&sample(), "introuvable").is_empty());
    }

    #[test]
    fn test_count_at_or_above() {
        assert_eq!(count_at_or_above(&sample(), 7.2), 2);
        assert_eq!(count_at_or_above(&sample(), 9.0), 0);
    }

    #[test]
    fn test_compare() {
        let comparison = compare(&sample());

        assert_eq!(comparison.analyses.len(), 3);
        assert!((comparison.global_spread - 1.7).abs() < 1e-9);

        let impact = &comparison.criteria[0];
        assert_eq!(impact.criterion, Criterion::Impact);
        assert_eq!(impact.max, 8.5);
        assert_eq!(impact.min, 6.8);
        assert!(!impact.consensus);

        // Criteria absent from every report are all 0.0, hence a consensus.
        assert_eq!(comparison.consensus().count(), 4);
        assert_eq!(comparison.divergences().count(), 1);
    }
}
