//! Dispatcher tuning.

use byedb_common::AuthDeniedPolicy;
use serde::{Deserialize, Serialize};

/// How one generation request is spread across backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Attempt ceiling per call (valid range: 1-10). The effective ceiling
    /// is also capped by the number of configured backends.
    pub max_attempts: u32,
    /// Per-backend request timeout in seconds (valid range: 1-600).
    pub timeout_secs: u32,
    pub auth_denied: AuthDeniedPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 60,
            auth_denied: AuthDeniedPolicy::Skip,
        }
    }
}
