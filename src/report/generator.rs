//! Markdown report generation.
//!
//! This module renders the fixed-section strategic analysis report. Every
//! section heading and the scoring labels are anchors the extractor and the
//! store rely on, so their wording must not drift.

use crate::models::{
    CompanySize, Criterion, CriterionScores, FocusArea, PriorityLevel, UrgencyLevel,
};
use chrono::{DateTime, Local};

/// Heading prefix of every report; the display title follows it.
pub const TITLE_PREFIX: &str = "# 📈 ANALYSE STRATÉGIQUE -";

/// Label of the global score line.
pub const GLOBAL_SCORE_LABEL: &str = "SCORE GLOBAL DE PRIORITÉ :";

/// Values substituted into the report template.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub title: String,
    pub date: DateTime<Local>,
    pub analyst: String,
    pub focus_area: FocusArea,
    pub urgency_level: UrgencyLevel,
    pub company_size: CompanySize,
    pub scores: CriterionScores,
    pub global_score: f64,
    pub priority: PriorityLevel,
}

/// Render a complete report.
pub fn render_report(ctx: &ReportContext) -> String {
    let mut output = String::new();

    output.push_str(&generate_header_section(ctx));
    output.push_str(&generate_synthesis_section(ctx));
    output.push_str(&generate_scoring_section(ctx));
    output.push_str(&generate_mapping_section(ctx));
    output.push_str(&generate_recommendations_section(ctx));
    output.push_str(&generate_monitoring_section(ctx));
    output.push_str(&generate_alerts_section(ctx));
    output.push_str(&generate_comparison_metadata_section());

    output
}

/// Title line plus the date / analyst metadata line.
fn generate_header_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str(&format!("{} {}\n", TITLE_PREFIX, ctx.title));
    section.push_str(&format!(
        "**🗓️ Date d'Analyse :** {} | **🔍 Analyste IA :** {}\n\n",
        ctx.date.format("%Y-%m-%d %H:%M"),
        ctx.analyst
    ));

    section
}

fn generate_synthesis_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## 🎯 SYNTHÈSE EXÉCUTIVE\n");
    section.push_str(&format!(
        "Analyse stratégique automatisée du contenu fourni, adaptée au contexte {} dans le domaine {}.\n",
        ctx.company_size, ctx.focus_area
    ));
    section.push_str(&format!(
        "Impact business estimé avec niveau d'urgence {}.\n\n",
        ctx.urgency_level.to_string().to_lowercase()
    ));

    section
}

/// Scoring table and the global score line.
fn generate_scoring_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## 📊 SCORING STRATÉGIQUE\n");
    section.push_str("| Critère | Score | Justification |\n");
    section.push_str("|---------|-------|---------------|\n");

    for criterion in Criterion::ALL {
        section.push_str(&format!(
            "| **{}** | {:.1}/10 | {} |\n",
            criterion.label(),
            ctx.scores.get(criterion),
            justification(criterion, ctx)
        ));
    }

    section.push_str(&format!(
        "\n**🎯 {} {:.1}/10 - Niveau : {}**\n\n",
        GLOBAL_SCORE_LABEL, ctx.global_score, ctx.priority
    ));

    section
}

fn justification(criterion: Criterion, ctx: &ReportContext) -> String {
    match criterion {
        Criterion::Impact => format!("Potentiel financier significatif pour {}", ctx.company_size),
        Criterion::Urgency => format!(
            "Fenêtre d'action {} identifiée",
            ctx.urgency_level.to_string().to_lowercase()
        ),
        Criterion::Complexity => format!("Faisabilité adaptée à {}", ctx.company_size),
        Criterion::Risk => format!("Positionnement dans {}", ctx.focus_area),
        Criterion::Reliability => "Qualité des données analysées".to_string(),
    }
}

fn generate_mapping_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## 🏢 MAPPING CONCURRENTIEL\n");
    section.push_str("### Acteurs Principaux\n");
    section.push_str(&format!(
        "- **[Acteur Principal]** : Position dominante dans {}\n",
        ctx.focus_area
    ));
    section.push_str("- **[Nouveau Entrant]** : Innovation disruptive détectée\n\n");
    section.push_str("### Dynamiques Sectorielles\n");
    section.push_str(&format!(
        "- **[Tendance 1]** : Évolution rapide du marché {}\n",
        ctx.focus_area
    ));
    section.push_str("- **[Tendance 2]** : Transformation technologique en cours\n\n");

    section
}

/// A ranked strategic option.
struct StrategicOption {
    name: &'static str,
    priority: &'static str,
    action: String,
    timeline: &'static str,
    resources: &'static str,
    roi: &'static str,
}

fn strategic_options(ctx: &ReportContext) -> [StrategicOption; 3] {
    [
        StrategicOption {
            name: "Stratégie Offensive",
            priority: "HAUTE",
            action: format!("Investissement immédiat dans {}", ctx.focus_area),
            timeline: "3-6 mois",
            resources: "15-25% du budget innovation",
            roi: "150-200% sur 18 mois",
        },
        StrategicOption {
            name: "Stratégie Défensive",
            priority: "MOYENNE",
            action: "Renforcement des capacités existantes".to_string(),
            timeline: "6-12 mois",
            resources: "10-15% du budget opérationnel",
            roi: "80-120% sur 24 mois",
        },
        StrategicOption {
            name: "Stratégie d'Observation",
            priority: "BASSE",
            action: "Monitoring et veille concurrentielle".to_string(),
            timeline: "12-18 mois",
            resources: "5-8% du budget R&D",
            roi: "40-60% sur 36 mois",
        },
    ]
}

fn generate_recommendations_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## 🚀 RECOMMANDATIONS STRATÉGIQUES\n\n");

    for (i, option) in strategic_options(ctx).iter().enumerate() {
        section.push_str(&format!(
            "### Option {} : {} - **[PRIORITÉ : {}]**\n",
            i + 1,
            option.name,
            option.priority
        ));
        section.push_str(&format!("- **Action** : {}\n", option.action));
        section.push_str(&format!("- **Timeline** : {}\n", option.timeline));
        section.push_str(&format!("- **Ressources** : {}\n", option.resources));
        section.push_str(&format!("- **ROI Estimé** : {}\n\n", option.roi));
    }

    section
}

fn generate_monitoring_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## 📈 MÉTRIQUES DE SUIVI PROPOSÉES\n");
    section.push_str(&format!(
        "- **KPI Principal** : Part de marché dans {}\n",
        ctx.focus_area
    ));
    section.push_str("- **KPI Secondaire** : Taux d'adoption des innovations\n");
    section.push_str("- **Fréquence de Monitoring** : Hebdomadaire\n\n");

    section
}

fn generate_alerts_section(ctx: &ReportContext) -> String {
    let mut section = String::new();

    section.push_str("## ⚠️ SIGNAUX D'ALERTE\n");
    section.push_str(&format!(
        "- **Signal 1** : Nouvelle réglementation dans {}\n",
        ctx.focus_area
    ));
    section.push_str("- **Signal 2** : Entrée de nouveaux concurrents majeurs\n\n");

    section
}

fn generate_comparison_metadata_section() -> String {
    let mut section = String::new();

    section.push_str("## 🔍 MÉTADONNÉES POUR COMPARAISON IA\n");
    section.push_str("- **Niveau de Confiance** : Moyen\n");
    section.push_str("- **Données Manquantes** : Informations détaillées sur les concurrents\n");
    section.push_str("- **Biais Potentiels** : Analyse basée sur données simulées\n");

    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_context() -> ReportContext {
        ReportContext {
            title: "Amazon accélère sur l'IA générative".to_string(),
            date: Local::now(),
            analyst: "Modèle Simulé".to_string(),
            focus_area: FocusArea::Technology,
            urgency_level: UrgencyLevel::High,
            company_size: CompanySize::LargeEnterprise,
            scores: CriterionScores::from_array([7.5, 7.8, 5.2, 6.5, 7.0]),
            global_score: 7.02,
            priority: PriorityLevel::High,
        }
    }

    #[test]
    fn test_render_report_sections_in_order() {
        let report = render_report(&create_test_context());

        let anchors = [
            "# 📈 ANALYSE STRATÉGIQUE - Amazon accélère sur l'IA générative",
            "## 🎯 SYNTHÈSE EXÉCUTIVE",
            "## 📊 SCORING STRATÉGIQUE",
            "SCORE GLOBAL DE PRIORITÉ :",
            "## 🏢 MAPPING CONCURRENTIEL",
            "## 🚀 RECOMMANDATIONS STRATÉGIQUES",
            "## 📈 MÉTRIQUES DE SUIVI PROPOSÉES",
            "## ⚠️ SIGNAUX D'ALERTE",
            "## 🔍 MÉTADONNÉES POUR COMPARAISON IA",
        ];

        let mut cursor = 0;
        for anchor in anchors {
            let pos = report[cursor..]
                .find(anchor)
                .unwrap_or_else(|| panic!("missing or misplaced section: {}", anchor));
            cursor += pos + anchor.len();
        }
    }

    #[test]
    fn test_scoring_rows() {
        let section = generate_scoring_section(&create_test_context());

        assert!(section.contains("| **Impact Business** | 7.5/10 |"));
        assert!(section.contains("| **Urgence Temporelle** | 7.8/10 |"));
        assert!(section.contains("| **Complexité Exécution** | 5.2/10 |"));
        assert!(section.contains("| **Risque Concurrentiel** | 6.5/10 |"));
        assert!(section.contains("| **Fiabilité Source** | 7.0/10 |"));
        assert!(section.contains("SCORE GLOBAL DE PRIORITÉ : 7.0/10 - Niveau : ÉLEVÉ"));
    }

    #[test]
    fn test_three_ranked_options() {
        let section = generate_recommendations_section(&create_test_context());

        assert_eq!(section.matches("### Option").count(), 3);
        assert_eq!(section.matches("- **ROI Estimé**").count(), 3);
        assert!(section.contains("Investissement immédiat dans Technologie"));
    }

    #[test]
    fn test_header_metadata_line() {
        let header = generate_header_section(&create_test_context());
        assert!(header.contains("**🔍 Analyste IA :** Modèle Simulé"));
    }
}
