//! Agent loop settings.

use byedb_common::Mode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Generation steps allowed per question (valid range: 1-100).
    pub max_depth: u32,
    /// Completed conversations kept for prompt context (valid range: 1-50).
    pub memory_capacity: u32,
    pub default_mode: Mode,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            memory_capacity: 5,
            default_mode: Mode::Agent,
        }
    }
}
