//! Analysis backends.
//!
//! Every backend (real provider or simulated scorer) sits behind the
//! [`AnalysisBackend`] trait. The [`BackendRegistry`] maps model selectors to
//! backends and the [`Dispatcher`] applies the fallback and inline-error
//! policy.

pub mod anthropic;
pub mod openai;
pub mod prompt;
pub mod registry;
pub mod simulated;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use prompt::build_craft_prompt;
pub use registry::{BackendRegistry, Dispatcher};
pub use simulated::{NoiseMode, SimulatedScorer};

use crate::models::{AnalysisRequest, AnalysisStatus};
use anyhow::Result;
use async_trait::async_trait;

/// A pluggable analysis implementation.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Display name, used in logs and in inline error reports.
    fn name(&self) -> &str;

    /// Whether the backend produces reports without calling a provider.
    fn is_simulated(&self) -> bool {
        false
    }

    /// Produce the report text for a request.
    ///
    /// `prompt` is the CRAFT prompt built from `request`; simulated
    /// backends may ignore it and work from the request directly.
    async fn analyze(&self, prompt: &str, request: &AnalysisRequest) -> Result<String>;
}

/// What a dispatch produced. `report` is always present, even on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub report: String,
    pub backend: String,
    pub status: AnalysisStatus,
}

/// Build the shared HTTP client for a provider.
fn http_client(timeout_seconds: Option<u64>) -> Result<reqwest::Client> {
    use anyhow::Context;

    let mut builder = reqwest::Client::builder();
    if let Some(seconds) = timeout_seconds {
        builder = builder.timeout(std::time::Duration::from_secs(seconds));
    }
    builder.build().context("Failed to create HTTP client")
}

/// Map a transport error to a readable message.
fn describe_send_error(
    error: reqwest::Error,
    provider: &str,
    base_url: &str,
    timeout_seconds: Option<u64>,
) -> anyhow::Error {
    if error.is_timeout() {
        anyhow::anyhow!(
            "Request timed out after {}s",
            timeout_seconds.unwrap_or_default()
        )
    } else if error.is_connect() {
        anyhow::anyhow!("Cannot connect to {} at {}", provider, base_url)
    } else {
        anyhow::anyhow!("Failed to send request: {}", error)
    }
}
