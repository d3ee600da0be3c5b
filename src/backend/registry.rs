//! Backend registry and dispatch policy.

use crate::backend::{
    build_craft_prompt, AnalysisBackend, AnalysisOutcome, AnthropicBackend, OpenAiBackend,
    SimulatedScorer,
};
use crate::config::{Config, ProviderKind, ProviderSettings};
use crate::models::{AnalysisRequest, AnalysisStatus};
use crate::store::settings::ProviderToggles;
use anyhow::Result;
use chrono::Local;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Model selectors mapped to configured backends, plus the simulated
/// fallback used for every other selector.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn AnalysisBackend>>,
    fallback: Box<dyn AnalysisBackend>,
}

impl BackendRegistry {
    pub fn new(fallback: Box<dyn AnalysisBackend>) -> Self {
        Self {
            backends: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, selector: impl Into<String>, backend: Box<dyn AnalysisBackend>) {
        let selector = selector.into();
        debug!("Registered backend {} for selector {}", backend.name(), selector);
        self.backends.insert(selector, backend);
    }

    /// Build the registry from configuration and dashboard toggles.
    ///
    /// A provider is registered only when it is enabled in the config file,
    /// its dashboard toggle is on, and an API key was found.
    pub fn from_config(config: &Config, toggles: &ProviderToggles) -> Result<Self> {
        let mut registry = Self::new(Box::new(SimulatedScorer::new(
            config.simulation.noise_mode(),
        )));

        for settings in config.provider_settings() {
            let toggled_on = match settings.kind {
                ProviderKind::Anthropic => toggles.claude_enabled,
                ProviderKind::OpenAi => toggles.gpt4_enabled,
            };

            if !settings.enabled || !toggled_on {
                debug!("{:?} provider disabled", settings.kind);
                continue;
            }

            let Some(api_key) = settings.api_key.clone() else {
                debug!("{:?} provider has no API key, not registered", settings.kind);
                continue;
            };

            let selector = settings.selector.clone();
            registry.register(selector, build_backend(settings, api_key)?);
        }

        Ok(registry)
    }

    /// Backend for a selector, or the simulated fallback.
    pub fn resolve(&self, selector: &str) -> &dyn AnalysisBackend {
        self.backends
            .get(selector)
            .map(|b| b.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Configured selectors, sorted.
    pub fn selectors(&self) -> Vec<&str> {
        let mut selectors: Vec<&str> = self.backends.keys().map(|s| s.as_str()).collect();
        selectors.sort_unstable();
        selectors
    }
}

fn build_backend(settings: ProviderSettings, api_key: String) -> Result<Box<dyn AnalysisBackend>> {
    Ok(match settings.kind {
        ProviderKind::Anthropic => Box::new(AnthropicBackend::new(settings, api_key)?),
        ProviderKind::OpenAi => Box::new(OpenAiBackend::new(settings, api_key)?),
    })
}

/// Runs one analysis through the registry.
///
/// Never fails: a provider error becomes an inline error report with
/// [`AnalysisStatus::BackendFailed`].
pub struct Dispatcher {
    registry: BackendRegistry,
}

impl Dispatcher {
    pub fn new(registry: BackendRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let prompt = build_craft_prompt(request, Local::now());
        let backend = self.registry.resolve(&request.model_name);

        if backend.is_simulated() {
            info!(
                "No configured provider for '{}', using simulated analysis",
                request.model_name
            );
        } else {
            info!("Dispatching analysis to {}", backend.name());
        }

        match backend.analyze(&prompt, request).await {
            Ok(report) => AnalysisOutcome {
                report,
                backend: backend.name().to_string(),
                status: if backend.is_simulated() {
                    AnalysisStatus::Simulated
                } else {
                    AnalysisStatus::Completed
                },
            },
            Err(e) => {
                warn!("{} analysis failed: {:#}", backend.name(), e);
                AnalysisOutcome {
                    report: format!("Erreur {} API: {:#}", backend.name(), e),
                    backend: backend.name().to_string(),
                    status: AnalysisStatus::BackendFailed,
                }
            }
        }
    }
}
