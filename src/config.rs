//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.stratintel.toml` files.

use crate::backend::NoiseMode;
use crate::models::Weights;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".stratintel.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Real LLM providers.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Simulated scorer settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Defaults for new analyses.
    #[serde(default)]
    pub analysis: AnalysisDefaults,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory holding analyses.json, config.json and metrics.json.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            verbose: false,
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

/// The real providers a backend can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
}

impl ProviderKind {
    /// Model selector that routes an analysis to this provider.
    pub fn default_selector(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "Claude-3-Sonnet",
            ProviderKind::OpenAi => "GPT-4",
        }
    }

    fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::OpenAi => "https://api.openai.com",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-3-sonnet-20240229",
            ProviderKind::OpenAi => "gpt-4",
        }
    }
}

/// Per-provider settings as written in the config file.
///
/// Unset string fields fall back to the provider's defaults, see
/// [`ProviderConfig::resolve`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider may be used at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model selector routed to this provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API key given inline (the environment variable is preferred).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Provider model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Maximum tokens in the response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            selector: None,
            api_key_env: None,
            api_key: None,
            base_url: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.3
}

/// Provider settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub enabled: bool,
    pub selector: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

impl ProviderConfig {
    /// Apply the provider defaults and look up the API key.
    pub fn resolve(&self, kind: ProviderKind) -> ProviderSettings {
        let api_key_env = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_api_key_env().to_string());

        let api_key = std::env::var(&api_key_env)
            .ok()
            .or_else(|| self.api_key.clone())
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            debug!("No API key found for {:?} (looked up {})", kind, api_key_env);
        }

        ProviderSettings {
            kind,
            enabled: self.enabled,
            selector: self
                .selector
                .clone()
                .unwrap_or_else(|| kind.default_selector().to_string()),
            api_key,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_seconds: self.timeout_seconds,
        }
    }
}

/// Real provider settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub anthropic: ProviderConfig,

    #[serde(default)]
    pub openai: ProviderConfig,
}

/// Simulated scorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Add uniform noise to the simulated scores.
    #[serde(default = "default_true")]
    pub noise: bool,

    /// Fixed noise seed, for reproducible reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            noise: true,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn noise_mode(&self) -> NoiseMode {
        match (self.noise, self.seed) {
            (false, _) => NoiseMode::Disabled,
            (true, Some(seed)) => NoiseMode::Seeded(seed),
            (true, None) => NoiseMode::Random,
        }
    }
}

/// Defaults applied to `analyze` when not given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDefaults {
    /// Backend selector.
    #[serde(default = "default_model")]
    pub model: String,

    /// Criterion weights (Impact, Urgency, Complexity, Risk, Reliability).
    #[serde(default)]
    pub weights: Weights,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            weights: Weights::default(),
        }
    }
}

fn default_model() -> String {
    "Simulation".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data_dir) = args.data_dir {
            self.general.data_dir = data_dir.display().to_string();
        }

        if let Some(seed) = args.seed {
            self.simulation.seed = Some(seed);
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    pub fn provider_settings(&self) -> [ProviderSettings; 2] {
        [
            self.providers.anthropic.resolve(ProviderKind::Anthropic),
            self.providers.openai.resolve(ProviderKind::OpenAi),
        ]
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.data_dir, "data");
        assert_eq!(config.analysis.model, "Simulation");
        assert_eq!(config.analysis.weights, Weights::default());
        assert_eq!(config.simulation.noise_mode(), NoiseMode::Random);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
data_dir = "/var/lib/stratintel"
verbose = true

[providers.anthropic]
enabled = false
model = "claude-3-opus-20240229"
timeout_seconds = 120

[simulation]
seed = 42

[analysis]
model = "GPT-4"
weights = [0.2, 0.2, 0.2, 0.2, 0.2]
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.data_dir, "/var/lib/stratintel");
        assert!(config.general.verbose);
        assert!(!config.providers.anthropic.enabled);
        assert_eq!(config.providers.anthropic.timeout_seconds, Some(120));
        assert_eq!(config.providers.openai.max_tokens, 4000);
        assert_eq!(config.simulation.noise_mode(), NoiseMode::Seeded(42));
        assert_eq!(config.analysis.model, "GPT-4");
        assert!((config.analysis.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_weight_count_rejected() {
        let toml_content = r#"
[analysis]
weights = [0.5, 0.5]
"#;
        assert!(toml::from_str::<Config>(toml_content).is_err());
    }

    #[test]
    fn test_resolve_applies_provider_defaults() {
        let provider = ProviderConfig {
            api_key_env: Some("STRATINTEL_TEST_UNSET_KEY".to_string()),
            base_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };

        let settings = provider.resolve(ProviderKind::OpenAi);
        assert_eq!(settings.selector, "GPT-4");
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.base_url, "http://localhost:8080");
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_resolve_inline_api_key() {
        let provider = ProviderConfig {
            api_key_env: Some("STRATINTEL_TEST_UNSET_KEY_2".to_string()),
            api_key: Some("sk-inline".to_string()),
            ..Default::default()
        };

        let settings = provider.resolve(ProviderKind::Anthropic);
        assert_eq!(settings.api_key.as_deref(), Some("sk-inline"));
        assert_eq!(settings.selector, "Claude-3-Sonnet");
        assert_eq!(settings.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_disabled_noise() {
        let simulation = SimulationConfig {
            noise: false,
            seed: Some(7),
        };
        assert_eq!(simulation.noise_mode(), NoiseMode::Disabled);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[providers.anthropic]"));
        assert!(toml_str.contains("[analysis]"));
    }
}
