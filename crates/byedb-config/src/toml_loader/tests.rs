//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use crate::schema::{BackendKind, ByedbConfig};
use byedb_common::ConfigError;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_byedb_config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[[backends]]
name = "flash"
kind = "gemini"
api_key = "k"

[sessions]
capacity = 8
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.backends.len(), 1);
    assert_eq!(config.backends[0].kind, BackendKind::Gemini);
    assert_eq!(config.sessions.capacity, 8);
    // Defaults preserved
    assert_eq!(config.agent.max_depth, 20);
    assert_eq!(config.dispatch.max_attempts, 3);
}

#[test]
fn openai_entry_without_model_gets_openai_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[[backends]]
name = "gh"
kind = "openai"
api_key = "k"
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    let backend = &config.backends[0];
    assert_eq!(backend.kind, BackendKind::OpenAi);
    assert_eq!(backend.model, "gpt-4o");
    assert!((backend.weight - 10.0).abs() < f64::EPSILON);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn load_config_with_invalid_values_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[agent]
max_depth = 0
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.agent.max_depth, 20);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("byedb").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert!(config.backends.is_empty());
    assert_eq!(config.sessions.capacity, 50);
}

#[test]
fn default_config_toml_is_valid() {
    let config: ByedbConfig = toml::from_str(&default_config_toml()).unwrap();
    assert_eq!(config.agent.memory_capacity, 5);
}

#[test]
fn default_config_path_is_reasonable() {
    if let Ok(path) = default_config_path() {
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("byedb"));
        assert!(path_str.ends_with("config.toml"));
    }
}
