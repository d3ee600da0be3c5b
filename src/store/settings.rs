//! Dashboard settings document (`config.json`).

use crate::store::{JsonDocument, StoreError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Score thresholds used to raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_critical")]
    pub critical: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_moderate")]
    pub moderate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            critical: default_critical(),
            high: default_high(),
            moderate: default_moderate(),
        }
    }
}

fn default_critical() -> f64 {
    8.0
}

fn default_high() -> f64 {
    6.0
}

fn default_moderate() -> f64 {
    4.0
}

/// Per-provider enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderToggles {
    #[serde(default = "default_true")]
    pub claude_enabled: bool,
    #[serde(default = "default_true")]
    pub gpt4_enabled: bool,
    #[serde(default)]
    pub gemini_enabled: bool,
}

impl Default for ProviderToggles {
    fn default() -> Self {
        Self {
            claude_enabled: true,
            gpt4_enabled: true,
            gemini_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Operator-editable dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default)]
    pub thresholds: AlertThresholds,

    #[serde(default = "default_monitoring_frequency")]
    pub monitoring_frequency: String,

    #[serde(default = "default_export_format")]
    pub export_format: String,

    #[serde(default)]
    pub ai_models: ProviderToggles,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            monitoring_frequency: default_monitoring_frequency(),
            export_format: default_export_format(),
            ai_models: ProviderToggles::default(),
        }
    }
}

fn default_monitoring_frequency() -> String {
    "Hebdomadaire".to_string()
}

fn default_export_format() -> String {
    "JSON".to_string()
}

/// Loads and saves [`DashboardSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    document: JsonDocument,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    /// Stored settings, or defaults when missing or unreadable.
    pub fn load(&self) -> DashboardSettings {
        self.document.read().unwrap_or_else(|| {
            debug!("Using default dashboard settings");
            DashboardSettings::default()
        })
    }

    pub fn save(&self, settings: &DashboardSettings) -> Result<(), StoreError> {
        self.document.write(settings)
    }
}
