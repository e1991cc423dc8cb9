//! Configuration schema types for ByeDB.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults below.

mod agent;
mod backends;
mod dispatch;
mod sessions;
mod system;

pub use agent::*;
pub use backends::*;
pub use dispatch::*;
pub use sessions::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ByedbConfig {
    pub backends: Vec<BackendConfig>,
    pub dispatch: DispatchConfig,
    pub sessions: SessionsConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use byedb_common::{AuthDeniedPolicy, Mode};

    #[test]
    fn default_config_has_no_backends() {
        let config = ByedbConfig::default();
        assert!(config.backends.is_empty());
    }

    #[test]
    fn default_dispatch() {
        let config = ByedbConfig::default();
        assert_eq!(config.dispatch.max_attempts, 3);
        assert_eq!(config.dispatch.timeout_secs, 60);
        assert_eq!(config.dispatch.auth_denied, AuthDeniedPolicy::Skip);
    }

    #[test]
    fn default_sessions() {
        let config = ByedbConfig::default();
        assert_eq!(config.sessions.capacity, 50);
        assert_eq!(config.sessions.pending_ttl_secs, 1800);
    }

    #[test]
    fn default_agent() {
        let config = ByedbConfig::default();
        assert_eq!(config.agent.max_depth, 20);
        assert_eq!(config.agent.memory_capacity, 5);
        assert_eq!(config.agent.default_mode, Mode::Agent);
    }

    #[test]
    fn default_logging() {
        let config = ByedbConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(!config.logging.json);
        assert_eq!(config.logging.level.directive(), "byedb=info");
    }

    #[test]
    fn backend_defaults_follow_kind() {
        let gemini = BackendConfig::new("g", BackendKind::Gemini, "key");
        assert_eq!(gemini.model, "gemini-2.5-flash");
        assert!((gemini.weight - 1.0).abs() < f64::EPSILON);

        let openai = BackendConfig::new("o", BackendKind::OpenAi, "key");
        assert_eq!(openai.model, "gpt-4o");
        assert!((openai.weight - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn backend_debug_redacts_key() {
        let backend = BackendConfig::new("g", BackendKind::Gemini, "super-secret-key");
        let debug = format!("{backend:?}");
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml_str = r#"
[[backends]]
name = "primary"
kind = "openai"
api_key = "abc"
weight = 2.5

[agent]
max_depth = 7
default_mode = "ask"

[dispatch]
auth_denied = "disable"
"#;
        let config: ByedbConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backends.len(), 1);
        let backend = &config.backends[0];
        assert_eq!(backend.kind, BackendKind::OpenAi);
        assert!((backend.weight - 2.5).abs() < f64::EPSILON);
        assert_eq!(backend.model, "gpt-4o");
        assert_eq!(config.agent.max_depth, 7);
        assert_eq!(config.agent.memory_capacity, 5);
        assert_eq!(config.agent.default_mode, Mode::Ask);
        assert_eq!(config.dispatch.auth_denied, AuthDeniedPolicy::Disable);
        assert_eq!(config.dispatch.max_attempts, 3);
        assert_eq!(config.sessions.capacity, 50);
    }

    #[test]
    fn omitted_model_and_weight_follow_kind() {
        let toml_str = r#"
[[backends]]
name = "o"
kind = "openai"
api_key = "k"

[[backends]]
name = "g"
api_key = "k"
model = "gemini-2.5-pro"
"#;
        let config: ByedbConfig = toml::from_str(toml_str).unwrap();
        let openai = &config.backends[0];
        assert_eq!(openai.model, "gpt-4o");
        assert!((openai.weight - 10.0).abs() < f64::EPSILON);
        let gemini = &config.backends[1];
        assert_eq!(gemini.kind, BackendKind::Gemini);
        assert_eq!(gemini.model, "gemini-2.5-pro");
        assert!((gemini.weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = ByedbConfig::default();
        config
            .backends
            .push(BackendConfig::new("g", BackendKind::Gemini, "k"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ByedbConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backends[0].name, "g");
        assert_eq!(parsed.sessions.capacity, 50);
    }
}
