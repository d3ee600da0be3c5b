//! Metric extraction from generated reports.
//!
//! Reports are rendered prose, not a serialization format, so metrics are
//! recovered with a small pattern grammar over the fixed labels:
//!
//! ```text
//! global   := "SCORE GLOBAL DE PRIORITÉ :" markup* NUMBER "/10"
//! priority := "Niveau :" markup* UPPERCASE_WORD
//! score    := LABEL <any text, across lines> NUMBER "/10"
//! markup   := whitespace | "*" | "["
//! NUMBER   := digits ("." digits)?
//! ```
//!
//! Each rule is matched independently against its first occurrence. A rule
//! that does not match leaves its documented default in place, so
//! extraction never fails.

use crate::models::{Criterion, ExtractedMetrics, PriorityLevel};
use crate::report::generator::TITLE_PREFIX;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Title returned when a report has no heading line.
pub const UNTITLED: &str = "Analyse sans titre";

static GLOBAL_SCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"SCORE GLOBAL DE PRIORITÉ :[\s*\[]*(\d+(?:\.\d+)?)/10").expect("valid regex")
});

static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Niveau :[\s*\[]*(\p{Lu}+)").expect("valid regex"));

static CRITERION_RES: Lazy<Vec<(Criterion, Regex)>> = Lazy::new(|| {
    Criterion::ALL
        .iter()
        .map(|criterion| {
            let pattern = format!(r"(?s){}.*?(\d+(?:\.\d+)?)/10", regex::escape(criterion.label()));
            (*criterion, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

/// Extract metrics from report text. Pure and idempotent.
pub fn extract_metrics(report: &str) -> ExtractedMetrics {
    let mut metrics = ExtractedMetrics::default();

    if let Some(score) = capture_number(&GLOBAL_SCORE_RE, report) {
        metrics.global_score = score;
    }

    if let Some(token) = PRIORITY_RE
        .captures(report)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        match PriorityLevel::from_label(token) {
            Some(level) => metrics.priority_level = level,
            None => debug!("Unrecognised priority token '{}', keeping default", token),
        }
    }

    for (criterion, re) in CRITERION_RES.iter() {
        if let Some(score) = capture_number(re, report) {
            metrics.scores.set(*criterion, score);
        }
    }

    metrics
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Display title of a stored report: the first `#` heading, with the
/// standard report prefix stripped.
pub fn title_from_report(content: &str) -> String {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix(TITLE_PREFIX) {
            return rest.trim().to_string();
        }
        if line.starts_with('#') {
            return line.replace('#', "").trim().to_string();
        }
    }
    UNTITLED.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_REPORT: &str = r#"# 📈 ANALYSE STRATÉGIQUE - Rachat d'un concurrent
**🗓️ Date d'Analyse :** 2024-05-02 10:15 | **🔍 Analyste IA :** Claude-3-Sonnet

## 📊 SCORING STRATÉGIQUE
| Critère | Score | Justification |
|---------|-------|---------------|
| **Impact Business** | 8.5/10 | Fort potentiel |
| **Urgence Temporelle** | 9/10 | Fenêtre courte |
| **Complexité Exécution** | 4.2/10 | Intégration simple |
| **Risque Concurrentiel** | 7.1/10 | Menace directe |
| **Fiabilité Source** | 6.0/10 | Presse spécialisée |

**🎯 SCORE GLOBAL DE PRIORITÉ :** 7.6/10 - **Niveau : ÉLEVÉ**
"#;

    #[test]
    fn test_extract_full_report() {
        let metrics = extract_metrics(SAMPLE_REPORT);

        assert_eq!(metrics.global_score, 7.6);
        assert_eq!(metrics.priority_level, PriorityLevel::High);
        assert_eq!(metrics.scores.impact, 8.5);
        assert_eq!(metrics.scores.urgency, 9.0);
        assert_eq!(metrics.scores.complexity, 4.2);
        assert_eq!(metrics.scores.risk, 7.1);
        assert_eq!(metrics.scores.reliability, 6.0);
    }

    #[test]
    fn test_extract_is_idempotent() {
        assert_eq!(extract_metrics(SAMPLE_REPORT), extract_metrics(SAMPLE_REPORT));
    }

    #[test]
    fn test_missing_global_line_uses_defaults() {
        let text = "| **Impact Business** | 8.5/10 | Fort potentiel |\nrien d'autre";
        let metrics = extract_metrics(text);

        assert_eq!(metrics.global_score, 0.0);
        assert_eq!(metrics.priority_level, PriorityLevel::Moderate);
        assert_eq!(metrics.scores.impact, 8.5);
        assert_eq!(metrics.scores.urgency, 0.0);
    }

    #[test]
    fn test_empty_and_error_text() {
        assert_eq!(extract_metrics(""), ExtractedMetrics::default());
        assert_eq!(
            extract_metrics("Erreur Claude API: connection refused"),
            ExtractedMetrics::default()
        );
    }

    #[test]
    fn test_plain_global_line() {
        let text = "SCORE GLOBAL DE PRIORITÉ : 8.25/10 - Niveau : CRITIQUE";
        let metrics = extract_metrics(text);
        assert_eq!(metrics.global_score, 8.25);
        assert_eq!(metrics.priority_level, PriorityLevel::Critical);
    }

    #[test]
    fn test_bracketed_values() {
        let text = "**🎯 SCORE GLOBAL DE PRIORITÉ :** [6.4/10] - **Niveau : [MODÉRÉ]**";
        let metrics = extract_metrics(text);
        assert_eq!(metrics.global_score, 6.4);
        assert_eq!(metrics.priority_level, PriorityLevel::Moderate);
    }

    #[test]
    fn test_unknown_priority_token_keeps_default() {
        let text = "Niveau : URGENTISSIME";
        assert_eq!(extract_metrics(text).priority_level, PriorityLevel::Moderate);
    }

    #[test]
    fn test_score_across_line_breaks() {
        let text = "Impact Business\n\nLe potentiel est estimé à\n7.7/10 selon nos sources.";
        assert_eq!(extract_metrics(text).scores.impact, 7.7);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "Fiabilité Source : 3/10\nFiabilité Source : 9/10";
        assert_eq!(extract_metrics(text).scores.reliability, 3.0);
    }

    #[test]
    fn test_title_from_report() {
        assert_eq!(title_from_report(SAMPLE_REPORT), "Rachat d'un concurrent");
        assert_eq!(title_from_report("intro\n## Autre titre\n"), "Autre titre");
        assert_eq!(title_from_report("pas de titre"), UNTITLED);
    }
}
