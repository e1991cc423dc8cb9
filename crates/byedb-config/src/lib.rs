//! ByeDB configuration system.
//!
//! Provides TOML-based configuration with an environment overlay for
//! backend credentials and full validation. All config sections use
//! sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use byedb_config::{load_config, config_to_json};
//!
//! let config = load_config().expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ByedbConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use byedb_common::ConfigError;

/// Load config from the platform default path and add backends declared in
/// the environment.
pub fn load_config() -> Result<ByedbConfig, ConfigError> {
    let mut config = toml_loader::load_default()?;
    env::apply_env_backends(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Same as [`load_config`] but reads an explicit file.
pub fn load_config_from(path: &Path) -> Result<ByedbConfig, ConfigError> {
    let mut config = toml_loader::load_from_path(path)?;
    env::apply_env_backends(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string with credentials masked.
pub fn config_to_json(config: &ByedbConfig) -> String {
    let mut redacted = config.clone();
    for backend in &mut redacted.backends {
        backend.api_key = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BackendConfig, BackendKind};

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&ByedbConfig::default());
        assert!(json.contains("\"backends\""));
        assert!(json.contains("\"dispatch\""));
        assert!(json.contains("\"sessions\""));
        assert!(json.contains("\"agent\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_to_json_masks_keys() {
        let mut config = ByedbConfig::default();
        config
            .backends
            .push(BackendConfig::new("g", BackendKind::Gemini, "very-secret"));
        let json = config_to_json(&config);
        assert!(!json.contains("very-secret"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_from_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[agent]
max_depth = 4
"#,
        )
        .unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.agent.max_depth, 4);
    }
}
