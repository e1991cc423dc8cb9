//! Validation for the dispatch, sessions, and agent sections.

use crate::schema::ByedbConfig;

use super::helpers::validate_range;

pub(crate) fn validate_dispatch(errors: &mut Vec<String>, config: &ByedbConfig) {
    validate_range(
        errors,
        "dispatch.max_attempts",
        config.dispatch.max_attempts,
        1,
        10,
    );
    validate_range(
        errors,
        "dispatch.timeout_secs",
        config.dispatch.timeout_secs,
        1,
        600,
    );
}

pub(crate) fn validate_sessions(errors: &mut Vec<String>, config: &ByedbConfig) {
    validate_range(
        errors,
        "sessions.capacity",
        config.sessions.capacity,
        1,
        10_000,
    );
}

pub(crate) fn validate_agent(errors: &mut Vec<String>, config: &ByedbConfig) {
    validate_range(errors, "agent.max_depth", config.agent.max_depth, 1, 100);
    validate_range(
        errors,
        "agent.memory_capacity",
        config.agent.memory_capacity,
        1,
        50,
    );
}
