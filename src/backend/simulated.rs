//! Deterministic-shape simulated scorer.
//!
//! Produces a complete report without any network access. Base scores are
//! adjusted by urgency and company size, optionally perturbed by uniform
//! noise, then clamped to [0, 10].

use crate::backend::AnalysisBackend;
use crate::models::{
    AnalysisRequest, CompanySize, Criterion, CriterionScores, PriorityLevel, UrgencyLevel,
};
use crate::report::{render_report, ReportContext};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Selector that always routes to the simulated scorer.
pub const SIMULATION_SELECTOR: &str = "Simulation";

/// Analyst name written in simulated reports.
pub const SIMULATED_ANALYST: &str = "Modèle Simulé";

/// Title used when the content has no usable first line.
pub const FALLBACK_TITLE: &str = "Analyse Stratégique";

/// Longest first line (in characters, exclusive) accepted as a title.
const MAX_TITLE_CHARS: usize = 100;

/// Impact, Urgency, Complexity, Risk, Reliability.
const BASE_SCORES: [f64; 5] = [7.5, 6.8, 5.2, 6.5, 7.0];

/// Half-width of the uniform noise added to each score.
const NOISE_AMPLITUDE: f64 = 0.5;

/// Source of score noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    /// Fresh entropy on every call.
    Random,
    /// Same noise for every call, seeded from the value.
    Seeded(u64),
    /// No noise; scores are exact base values plus adjustments.
    Disabled,
}

/// Report generator used when no real provider handles the selector.
#[derive(Debug, Clone)]
pub struct SimulatedScorer {
    noise: NoiseMode,
}

impl Default for SimulatedScorer {
    fn default() -> Self {
        Self::new(NoiseMode::Random)
    }
}

impl SimulatedScorer {
    pub fn new(noise: NoiseMode) -> Self {
        Self { noise }
    }

    /// Criterion scores for the given context, before weighting.
    pub fn scores(&self, urgency: UrgencyLevel, company_size: CompanySize) -> CriterionScores {
        let mut scores = CriterionScores::from_array(BASE_SCORES);

        match urgency {
            UrgencyLevel::Critical => adjust(&mut scores, Criterion::Urgency, 2.0),
            UrgencyLevel::High => adjust(&mut scores, Criterion::Urgency, 1.0),
            UrgencyLevel::Moderate | UrgencyLevel::Low => {}
        }

        match company_size {
            CompanySize::Startup => {
                adjust(&mut scores, Criterion::Complexity, -1.0);
                adjust(&mut scores, Criterion::Impact, 1.0);
            }
            CompanySize::Multinational => {
                adjust(&mut scores, Criterion::Complexity, 1.0);
                adjust(&mut scores, Criterion::Risk, 0.5);
            }
            CompanySize::Sme | CompanySize::LargeEnterprise => {}
        }

        match self.noise {
            NoiseMode::Disabled => {}
            NoiseMode::Seeded(seed) => apply_noise(&mut scores, &mut StdRng::seed_from_u64(seed)),
            NoiseMode::Random => apply_noise(&mut scores, &mut rand::thread_rng()),
        }

        for criterion in Criterion::ALL {
            scores.set(criterion, scores.get(criterion).clamp(0.0, 10.0));
        }

        scores
    }

    /// Generate the full report for a request.
    pub fn generate(&self, request: &AnalysisRequest) -> String {
        let scores = self.scores(request.urgency_level, request.company_size);
        let global_score = scores.weighted_sum(&request.weights);
        let priority = PriorityLevel::from_score(global_score);

        debug!(
            "Simulated scores {:?}, global {:.2} ({})",
            scores.as_array(),
            global_score,
            priority
        );

        render_report(&ReportContext {
            title: title_from_content(&request.content),
            date: Local::now(),
            analyst: SIMULATED_ANALYST.to_string(),
            focus_area: request.focus_area,
            urgency_level: request.urgency_level,
            company_size: request.company_size,
            scores,
            global_score,
            priority,
        })
    }
}

fn adjust(scores: &mut CriterionScores, criterion: Criterion, delta: f64) {
    scores.set(criterion, scores.get(criterion) + delta);
}

fn apply_noise<R: Rng>(scores: &mut CriterionScores, rng: &mut R) {
    for criterion in Criterion::ALL {
        let noise = rng.gen_range(-NOISE_AMPLITUDE..=NOISE_AMPLITUDE);
        adjust(scores, criterion, noise);
    }
}

/// First non-blank line shorter than 100 characters, trimmed.
pub fn title_from_content(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && line.chars().count() < MAX_TITLE_CHARS)
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

#[async_trait]
impl AnalysisBackend for SimulatedScorer {
    fn name(&self) -> &str {
        SIMULATION_SELECTOR
    }

    fn is_simulated(&self) -> bool {
        true
    }

    async fn analyze(&self, _prompt: &str, request: &AnalysisRequest) -> Result<String> {
        Ok(self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FocusArea, Weights};
    use crate::report::extract_metrics;

    fn request(content: &str, urgency: UrgencyLevel, size: CompanySize) -> AnalysisRequest {
        AnalysisRequest {
            content: content.to_string(),
            focus_area: FocusArea::Technology,
            urgency_level: urgency,
            company_size: size,
            model_name: SIMULATION_SELECTOR.to_string(),
            weights: Weights::default(),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_startup_adjustments_without_noise() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let scores = scorer.scores(UrgencyLevel::Moderate, CompanySize::Startup);

        assert_close(scores.impact, 8.5);
        assert_close(scores.urgency, 6.8);
        assert_close(scores.complexity, 4.2);
        assert_close(scores.risk, 6.5);
        assert_close(scores.reliability, 7.0);
    }

    #[test]
    fn test_low_urgency_startup_without_noise() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let scores = scorer.scores(UrgencyLevel::Low, CompanySize::Startup);

        assert_close(scores.complexity, 4.2);
        assert_close(scores.impact, 8.5);
        assert_close(scores.urgency, 6.8);
        assert_eq!(scores, scorer.scores(UrgencyLevel::Moderate, CompanySize::Startup));
    }

    #[test]
    fn test_critical_multinational_adjustments() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let scores = scorer.scores(UrgencyLevel::Critical, CompanySize::Multinational);

        assert_close(scores.urgency, 8.8);
        assert_close(scores.complexity, 6.2);
        assert_close(scores.risk, 7.0);
    }

    #[test]
    fn test_high_urgency_adds_one() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let scores = scorer.scores(UrgencyLevel::High, CompanySize::Sme);
        assert_close(scores.urgency, 7.8);
    }

    #[test]
    fn test_global_score_is_weighted_sum() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let scores = scorer.scores(UrgencyLevel::Moderate, CompanySize::Startup);

        // 8.5*0.3 + 6.8*0.25 + 4.2*0.2 + 6.5*0.15 + 7.0*0.1
        assert_close(scores.weighted_sum(&Weights::default()), 6.765);
    }

    #[test]
    fn test_noise_stays_in_bounds() {
        let scorer = SimulatedScorer::new(NoiseMode::Random);
        for _ in 0..50 {
            let scores = scorer.scores(UrgencyLevel::Critical, CompanySize::Multinational);
            for (value, base) in scores.as_array().iter().zip([7.5, 8.8, 6.2, 7.0, 7.0]) {
                assert!((0.0..=10.0).contains(value));
                assert!((value - base).abs() <= NOISE_AMPLITUDE + 1e-9);
            }
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let scorer = SimulatedScorer::new(NoiseMode::Seeded(42));
        let first = scorer.scores(UrgencyLevel::Low, CompanySize::Sme);
        let second = scorer.scores(UrgencyLevel::Low, CompanySize::Sme);
        assert_eq!(first, second);
    }

    #[test]
    fn test_title_from_content() {
        assert_eq!(title_from_content("\n  Rachat de X par Y  \nsuite"), "Rachat de X par Y");
        assert_eq!(title_from_content(""), FALLBACK_TITLE);
        assert_eq!(title_from_content(&"a".repeat(100)), FALLBACK_TITLE);
        assert_eq!(title_from_content(&format!("{}\ncourt", "a".repeat(150))), "court");
    }

    #[test]
    fn test_generated_report_round_trips_through_extractor() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let report = scorer.generate(&request(
            "Annonce de partenariat\nDétails...",
            UrgencyLevel::Moderate,
            CompanySize::Startup,
        ));

        assert!(report.starts_with("# 📈 ANALYSE STRATÉGIQUE - Annonce de partenariat"));
        assert!(report.contains("**🔍 Analyste IA :** Modèle Simulé"));

        let metrics = extract_metrics(&report);
        assert_close(metrics.global_score, 6.8);
        assert_eq!(metrics.priority_level, PriorityLevel::High);
        assert_close(metrics.scores.complexity, 4.2);
        assert_close(metrics.scores.impact, 8.5);
    }

    #[test]
    fn test_empty_content_still_produces_report() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let report = scorer.generate(&request("", UrgencyLevel::Low, CompanySize::Sme));
        assert!(report.starts_with("# 📈 ANALYSE STRATÉGIQUE - Analyse Stratégique"));
    }

    #[tokio::test]
    async fn test_backend_trait_ignores_prompt() {
        let scorer = SimulatedScorer::new(NoiseMode::Disabled);
        let req = request("Titre", UrgencyLevel::Low, CompanySize::Sme);

        let report = scorer.analyze("unused", &req).await.unwrap();
        assert!(scorer.is_simulated());
        assert_eq!(scorer.name(), "Simulation");
        assert!(report.contains("SCORE GLOBAL DE PRIORITÉ"));
    }
}
