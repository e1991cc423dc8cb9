//! Full configuration validation.
//!
//! Each domain has its own submodule; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod backends;
mod helpers;
mod misc;


use crate::schema::ByedbConfig;
use byedb_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ByedbConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    backends::validate_backends(&mut errors, config);
    misc::validate_dispatch(&mut errors, config);
    misc::validate_sessions(&mut errors, config);
    misc::validate_agent(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
