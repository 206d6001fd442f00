//! Anthropic Messages API client.

use super::{ChatModel, MessageRequest, MessageResponse};
use crate::config::AnthropicSettings;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    /// Create a client with an explicit key, base URL and request timeout.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from settings, reading the key from `ANTHROPIC_API_KEY`.
    pub fn from_settings(settings: &AnthropicSettings) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SyllabusError::Config("ANTHROPIC_API_KEY not set".to_string()))?;

        Self::new(
            &api_key,
            &settings.base_url,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[async_trait]
impl ChatModel for AnthropicClient {
    #[instrument(skip_all, fields(model = %request.model, messages = request.messages.len()))]
    async fn create_message(&self, request: &MessageRequest) -> Result<MessageResponse> {
        let response = self
            .http
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyllabusError::ModelApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessageResponse = response
            .json()
            .await
            .map_err(|e| SyllabusError::Model(format!("Invalid response body: {}", e)))?;

        debug!(
            "Model stopped with {:?} ({} blocks)",
            parsed.stop_reason,
            parsed.content.len()
        );
        Ok(parsed)
    }
}
