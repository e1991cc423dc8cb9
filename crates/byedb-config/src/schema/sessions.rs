use serde::{Deserialize, Serialize};

/// Per-user session cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Maximum resident sessions (valid range: 1-10000).
    pub capacity: u32,
    /// Seconds a suspended turn may wait for approval. 0 disables expiry.
    pub pending_ttl_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            pending_ttl_secs: 1800,
        }
    }
}
