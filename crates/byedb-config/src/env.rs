//! Backend credentials supplied through environment variables.
//!
//! `GEMINI_API_KEY_LIST` and `GITHUB_TOKEN_LIST` hold comma separated keys;
//! every non-empty key becomes one backend. `OPENAI_BASE_URL` overrides the
//! endpoint used for the GitHub-token backends.

use tracing::debug;

use crate::schema::{BackendConfig, BackendKind, ByedbConfig};

pub const GEMINI_KEYS_VAR: &str = "GEMINI_API_KEY_LIST";
pub const GITHUB_TOKENS_VAR: &str = "GITHUB_TOKEN_LIST";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://models.github.ai/inference";

/// Build backend entries from the given variable lookup.
///
/// Takes a lookup function rather than reading the process environment so
/// callers (and tests) control the source.
pub fn backends_from_vars(lookup: impl Fn(&str) -> Option<String>) -> Vec<BackendConfig> {
    let mut backends = Vec::new();

    if let Some(list) = lookup(GEMINI_KEYS_VAR) {
        for (i, key) in split_keys(&list).enumerate() {
            backends.push(BackendConfig::new(
                format!("gemini-env-{}", i + 1),
                BackendKind::Gemini,
                key,
            ));
        }
    }

    if let Some(list) = lookup(GITHUB_TOKENS_VAR) {
        let base_url = lookup(OPENAI_BASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        for (i, key) in split_keys(&list).enumerate() {
            let mut backend =
                BackendConfig::new(format!("openai-env-{}", i + 1), BackendKind::OpenAi, key);
            backend.base_url = Some(base_url.clone());
            backends.push(backend);
        }
    }

    backends
}

/// Append backends declared in the process environment to `config`.
pub fn apply_env_backends(config: &mut ByedbConfig) {
    let extra = backends_from_vars(|name| std::env::var(name).ok());
    if !extra.is_empty() {
        debug!(count = extra.len(), "adding backends from environment");
    }
    config.backends.extend(extra);
}

fn split_keys(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|k| !k.is_empty())
}
