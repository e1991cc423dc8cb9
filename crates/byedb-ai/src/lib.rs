//! Language-model side of ByeDB.
//!
//! Provides:
//! - Gemini and OpenAI-compatible backend adapters
//! - A cost-weighted [`BackendPool`] with failover between backends
//! - The database tool catalogue and the tool-call parser
//! - Bounded conversation memory and prompt construction
//! - The agent execution engine that drives one question to completion

pub mod dispatcher;
pub mod engine;
pub mod gemini;
pub mod memory;
pub mod openai;
pub mod prompt;
pub mod token_tracker;
pub mod tools;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use byedb_config::schema::{BackendConfig, BackendKind};
use serde::{Deserialize, Serialize};

pub use dispatcher::{BackendPool, BackendStatus, PoolSnapshot};
pub use engine::{
    AgentEngine, ExecutionContext, PendingToolCall, ToolInvocation, TurnReport, TurnStatus,
};
pub use gemini::{GeminiClient, GeminiConfig};
pub use memory::{Conversation, ConversationMemory, ConversationTurn, TurnRole};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use token_tracker::TokenTracker;
pub use tools::{ModelReply, ToolCall, ToolError, ToolKind, ToolOutput, ToolRequest};

/// One language-model provider endpoint.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Unique name within a pool, used for load accounting and logs.
    fn name(&self) -> &str;

    /// The credential with everything but its tail masked.
    fn masked_credential(&self) -> String;

    async fn generate(&self, prompt: &str) -> Result<LlmResponse, LlmError>;
}

/// Anything that can turn a prompt into text. [`BackendPool`] is the
/// production implementation; tests substitute scripted generators.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse, DispatchError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            total_tokens,
        }
    }

    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Classified provider failure. Every variant triggers failover.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("authentication denied: {0}")]
    AuthDenied(String),
    #[error("provider error: {0}")]
    Transient(String),
}

impl LlmError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}: {}", truncate_body(body));
        match status {
            429 => LlmError::RateLimited(message),
            401 | 403 => LlmError::AuthDenied(message),
            _ => LlmError::Transient(message),
        }
    }

    pub(crate) fn network(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Transient(format!("request timed out: {err}"))
        } else {
            LlmError::Transient(format!("network error: {err}"))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no language-model backend is available")]
    NoBackends,
    #[error("all backends failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: usize, last: LlmError },
    #[error("duplicate backend name '{0}'")]
    DuplicateBackend(String),
    #[error("failed to set up backend '{name}': {reason}")]
    Setup { name: String, reason: String },
}

const MAX_ERROR_BODY: usize = 300;

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= MAX_ERROR_BODY {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{cut}...")
    }
}

/// Mask a credential down to its last four characters.
pub fn mask_credential(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("****{tail}")
}

/// Build the adapter a config entry describes.
pub fn backend_from_config(
    config: &BackendConfig,
    timeout: Duration,
) -> Result<Arc<dyn LlmBackend>, DispatchError> {
    let setup = |e: LlmError| DispatchError::Setup {
        name: config.name.clone(),
        reason: e.to_string(),
    };
    let backend: Arc<dyn LlmBackend> = match config.kind {
        BackendKind::Gemini => {
            let client_config = GeminiConfig::new(&config.api_key)
                .with_model(&config.model)
                .with_timeout(timeout);
            Arc::new(GeminiClient::new(&config.name, client_config).map_err(setup)?)
        }
        BackendKind::OpenAi => {
            let mut client_config = OpenAiConfig::new(&config.api_key)
                .with_model(&config.model)
                .with_timeout(timeout);
            if let Some(url) = &config.base_url {
                client_config = client_config.with_base_url(url);
            }
            Arc::new(OpenAiClient::new(&config.name, client_config).map_err(setup)?)
        }
    };
    Ok(backend)
}
