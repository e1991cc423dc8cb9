//! Token usage tracking per backend.
//!
//! A backend's accumulated load is the sum of `total_tokens` over its
//! successful calls. It only ever grows.

use std::collections::HashMap;

use crate::TokenUsage;

/// Counters for one backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Accumulated load (tokens consumed by successful calls).
    pub load: u64,
    pub prompt_tokens: u64,
    pub calls: u64,
    pub failures: u64,
}

/// Tracks cumulative token usage across all backends of a pool.
pub struct TokenTracker {
    /// Total usage across all backends.
    total: TokenUsage,
    by_backend: HashMap<String, BackendStats>,
    call_count: u64,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self {
            total: TokenUsage::default(),
            by_backend: HashMap::new(),
            call_count: 0,
        }
    }

    /// Record usage from a successful call.
    pub fn record(&mut self, backend: &str, usage: &TokenUsage) {
        self.total.add(usage);
        self.call_count += 1;

        let entry = self.by_backend.entry(backend.to_string()).or_default();
        entry.load = entry.load.saturating_add(usage.total_tokens);
        entry.prompt_tokens = entry.prompt_tokens.saturating_add(usage.prompt_tokens);
        entry.calls += 1;
    }

    /// Record a failed call. Load is untouched.
    pub fn record_failure(&mut self, backend: &str) {
        self.by_backend
            .entry(backend.to_string())
            .or_default()
            .failures += 1;
    }

    pub fn load(&self, backend: &str) -> u64 {
        self.by_backend.get(backend).map_or(0, |s| s.load)
    }

    pub fn for_backend(&self, backend: &str) -> BackendStats {
        self.by_backend.get(backend).copied().unwrap_or_default()
    }

    pub fn total_tokens(&self) -> u64 {
        self.total.total_tokens
    }

    /// Number of successful calls.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }
}

impl Default for TokenTracker {
    fn default() -> Self {
        Self::new()
    }
}
