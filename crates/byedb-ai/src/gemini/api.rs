//! LlmBackend implementation for GeminiClient.

use async_trait::async_trait;
use tracing::debug;

use crate::{mask_credential, LlmBackend, LlmError, LlmResponse};

use super::client::GeminiClient;

#[async_trait]
impl LlmBackend for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn masked_credential(&self) -> String {
        mask_credential(&self.config.api_key)
    }

    async fn generate(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let body = self.build_request_body(prompt);
        let url = self.api_url();

        debug!(backend = %self.name, model = %self.config.model, "Gemini API request");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::network(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Transient(format!("invalid response body: {e}")))?;

        self.parse_response(json)
    }
}
