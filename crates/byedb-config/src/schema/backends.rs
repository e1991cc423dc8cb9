//! Language-model backend entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which wire protocol a backend speaks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum BackendKind {
    #[default]
    Gemini,
    /// Any OpenAI-compatible `chat/completions` endpoint.
    #[serde(alias = "openai_compatible")]
    OpenAi,
}

impl BackendKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini-2.5-flash",
            BackendKind::OpenAi => "gpt-4o",
        }
    }

    /// Relative cost factor used when the entry does not set one.
    pub fn default_weight(&self) -> f64 {
        match self {
            BackendKind::Gemini => 1.0,
            BackendKind::OpenAi => 10.0,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Gemini => write!(f, "gemini"),
            BackendKind::OpenAi => write!(f, "openai"),
        }
    }
}

/// One configured backend.
///
/// `model` and `weight` fall back to the defaults of the entry's `kind`
/// when omitted.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "RawBackendConfig")]
pub struct BackendConfig {
    pub name: String,
    pub kind: BackendKind,
    pub api_key: String,
    pub model: String,
    /// Relative cost factor, must be positive.
    pub weight: f64,
    /// Endpoint override. Only used by OpenAI-compatible backends.
    pub base_url: Option<String>,
}

impl BackendConfig {
    pub fn new(name: impl Into<String>, kind: BackendKind, api_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            weight: kind.default_weight(),
            base_url: None,
        }
    }
}

/// On-disk shape, before kind defaults are applied.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawBackendConfig {
    name: String,
    kind: BackendKind,
    api_key: String,
    model: Option<String>,
    weight: Option<f64>,
    base_url: Option<String>,
}

impl From<RawBackendConfig> for BackendConfig {
    fn from(raw: RawBackendConfig) -> Self {
        let mut config = BackendConfig::new(raw.name, raw.kind, raw.api_key);
        if let Some(model) = raw.model {
            config.model = model;
        }
        if let Some(weight) = raw.weight {
            config.weight = weight;
        }
        config.base_url = raw.base_url;
        config
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("weight", &self.weight)
            .field("base_url", &self.base_url)
            .finish()
    }
}
