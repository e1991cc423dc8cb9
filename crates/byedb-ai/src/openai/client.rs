//! OpenAI-compatible client struct, request building, and response parsing.

use std::time::Duration;

use crate::{LlmError, LlmResponse, TokenUsage};

use super::config::OpenAiConfig;

pub struct OpenAiClient {
    pub(crate) name: String,
    pub(crate) config: OpenAiConfig,
    pub(crate) http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(name: impl Into<String>, config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Transient(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            name: name.into(),
            config,
            http,
        })
    }

    pub(crate) fn api_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    pub(crate) fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
        })
    }

    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, LlmError> {
        let message = json["choices"]
            .as_array()
            .and_then(|c| c.first())
            .map(|choice| &choice["message"])
            .ok_or_else(|| LlmError::Transient("no choices in response".to_string()))?;

        // A null content is a legitimate (empty) completion.
        let text = message["content"].as_str().unwrap_or_default().to_string();

        let usage = &json["usage"];
        let prompt_tokens = usage["prompt_tokens"].as_u64().unwrap_or(0);
        let total_tokens = usage["total_tokens"].as_u64().unwrap_or_else(|| {
            prompt_tokens + usage["completion_tokens"].as_u64().unwrap_or(0)
        });

        Ok(LlmResponse {
            text,
            usage: TokenUsage::new(prompt_tokens, total_tokens),
        })
    }
}
