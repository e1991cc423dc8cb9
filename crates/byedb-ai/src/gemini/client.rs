//! Gemini client struct, request building, and response parsing.

use std::time::Duration;

use crate::{LlmError, LlmResponse, TokenUsage};

use super::config::GeminiConfig;

pub(crate) const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client.
pub struct GeminiClient {
    pub(crate) name: String,
    pub(crate) config: GeminiConfig,
    pub(crate) http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(name: impl Into<String>, config: GeminiConfig) -> Result<Self, LlmError> {
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
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.config.model)
    }

    /// Build the JSON request body for a single-prompt generation.
    pub(crate) fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            }
        })
    }

    /// Parse a `generateContent` response.
    pub(crate) fn parse_response(&self, json: serde_json::Value) -> Result<LlmResponse, LlmError> {
        let first = json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| {
                let reason = json["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("no candidates in response");
                LlmError::Transient(reason.to_string())
            })?;

        let text: String = first["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        let meta = &json["usageMetadata"];
        let prompt_tokens = meta["promptTokenCount"].as_u64().unwrap_or(0);
        let total_tokens = meta["totalTokenCount"].as_u64().unwrap_or_else(|| {
            prompt_tokens + meta["candidatesTokenCount"].as_u64().unwrap_or(0)
        });

        Ok(LlmResponse {
            text,
            usage: TokenUsage::new(prompt_tokens, total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new("g", GeminiConfig::new("k").with_model("gemini-test")).unwrap()
    }

    #[test]
    fn url_names_model() {
        assert!(client().api_url().ends_with("/gemini-test:generateContent"));
    }

    #[test]
    fn body_wraps_prompt() {
        let body = client().build_request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn parses_text_and_usage() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hi " }, { "text": "there" }] } }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10 }
        });
        let resp = client().parse_response(json).unwrap();
        assert_eq!(resp.text, "Hi there");
        assert_eq!(resp.usage, TokenUsage::new(7, 10));
    }

    #[test]
    fn total_falls_back_to_sum() {
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "x" }] } }],
            "usageMetadata": { "promptTokenCount": 4, "candidatesTokenCount": 2 }
        });
        assert_eq!(client().parse_response(json).unwrap().usage.total_tokens, 6);
    }

    #[test]
    fn blocked_prompt_is_transient() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = client().parse_response(json).unwrap_err();
        assert_eq!(err, LlmError::Transient("SAFETY".into()));
    }
}
