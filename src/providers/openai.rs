//! OpenAI generator implementation
//!
//! Sends each prompt as a single user turn to an OpenAI-compatible
//! chat completions endpoint

use super::{BackendError, BackendResult, Generator};
use crate::config::settings::OpenAIConfig;
use crate::models::openai::*;
use crate::utils::logging::preview;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// OpenAI-compatible generator
#[derive(Debug, Clone)]
pub struct OpenAIGenerator {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIGenerator {
    /// Create a new generator from backend settings
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("logsift/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Build the request URL
    fn build_url(&self) -> String {
        let base_url = self.config.base_url.trim_end_matches('/');
        format!("{}/chat/completions", base_url)
    }

    fn build_request(&self, prompt: &str) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
        }
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> BackendResult<String> {
        debug!(
            "Sending chat completion request ({} chars): {}",
            prompt.chars().count(),
            preview(prompt, 120)
        );

        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request(prompt))
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                error!("OpenAI API error: {:?}", error_response.error);
                return Err(BackendError::Api(error_response.error.message));
            }

            error!("OpenAI API request failed: {} - {}", status, error_text);
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Request(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = openai_response
            .first_text()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(BackendError::EmptyResponse)?;

        debug!("OpenAI request completed: {}", preview(&text, 120));
        Ok(text)
    }
}
