//! Anthropic Messages API client.

use crate::backend::{describe_send_error, http_client, AnalysisBackend};
use crate::config::ProviderSettings;
use crate::models::AnalysisRequest;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first text block.
    fn into_text(self) -> Result<String> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .context("Claude response contained no text block")
    }
}

/// Backend for the `Claude-3-Sonnet` selector.
pub struct AnthropicBackend {
    settings: ProviderSettings,
    api_key: String,
    http_client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(settings: ProviderSettings, api_key: String) -> Result<Self> {
        let http_client = http_client(settings.timeout_seconds)?;
        Ok(Self {
            settings,
            api_key,
            http_client,
        })
    }
}

#[async_trait]
impl AnalysisBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "Claude"
    }

    async fn analyze(&self, prompt: &str, _request: &AnalysisRequest) -> Result<String> {
        let url = format!("{}/v1/messages", self.settings.base_url);

        let request = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending {} prompt chars to {}", prompt.len(), url);

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                describe_send_error(
                    e,
                    "Anthropic",
                    &self.settings.base_url,
                    self.settings.timeout_seconds,
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Anthropic API error {}: {}", status, body));
        }

        let messages: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic response")?;

        messages.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ProviderKind};
    use crate::models::{CompanySize, FocusArea, UrgencyLevel, Weights};

    #[test]
    fn test_request_serialization() {
        let request = MessagesRequest {
            model: "claude-3-sonnet-20240229",
            max_tokens: 4000,
            temperature: 0.3,
            messages: vec![Message {
                role: "user",
                content: "Bonjour",
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-sonnet-20240229");
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Bonjour");
    }

    #[test]
    fn test_response_text_extraction() {
        let body = r##"{
            "id": "msg_01",
            "type": "message",
            "content": [{"type": "text", "text": "# 📈 ANALYSE STRATÉGIQUE - Test"}],
            "stop_reason": "end_turn"
        }"##;

        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "# 📈 ANALYSE STRATÉGIQUE - Test");
    }

    #[test]
    fn test_response_without_text_block() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(response.into_text().is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_reported() {
        let settings = ProviderConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            timeout_seconds: Some(5),
            ..Default::default()
        }
        .resolve(ProviderKind::Anthropic);

        let backend = AnthropicBackend::new(settings, "test-key".to_string()).unwrap();
        let request = AnalysisRequest {
            content: "x".to_string(),
            focus_area: FocusArea::General,
            urgency_level: UrgencyLevel::Low,
            company_size: CompanySize::Sme,
            model_name: "Claude-3-Sonnet".to_string(),
            weights: Weights::default(),
        };

        let err = backend.analyze("prompt", &request).await.unwrap_err();
        assert!(!err.to_string().is_empty());
        assert_eq!(backend.name(), "Claude");
        assert!(!backend.is_simulated());
    }
}
