//! Backend pool: cost-weighted least-load selection with failover.
//!
//! Each `generate` call picks the untried backend with the smallest
//! `load × weight`, calls it, and on failure moves on to the next
//! candidate until one succeeds, every backend has been tried, or the
//! attempt ceiling `min(max_attempts, backend_count)` is reached.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use byedb_common::AuthDeniedPolicy;
use byedb_config::ByedbConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::token_tracker::TokenTracker;
use crate::{backend_from_config, DispatchError, Generator, LlmBackend, LlmError, LlmResponse};

struct Slot {
    backend: Arc<dyn LlmBackend>,
    weight: f64,
    disabled: AtomicBool,
}

impl Slot {
    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }
}

/// Point-in-time view of one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub name: String,
    pub credential: String,
    pub weight: f64,
    pub load: u64,
    pub calls: u64,
    pub failures: u64,
    pub disabled: bool,
}

/// Point-in-time view of the whole pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSnapshot {
    pub backends: Vec<BackendStatus>,
    pub total_tokens: u64,
}

/// The set of configured backends plus their shared load counters.
pub struct BackendPool {
    slots: Vec<Slot>,
    tracker: Mutex<TokenTracker>,
    max_attempts: usize,
    call_timeout: Duration,
    auth_policy: AuthDeniedPolicy,
}

impl BackendPool {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            tracker: Mutex::new(TokenTracker::new()),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            call_timeout: Self::DEFAULT_TIMEOUT,
            auth_policy: AuthDeniedPolicy::default(),
        }
    }

    /// Build the pool described by `config.backends` and `config.dispatch`.
    pub fn from_config(config: &ByedbConfig) -> Result<Self, DispatchError> {
        let timeout = Duration::from_secs(u64::from(config.dispatch.timeout_secs));
        let mut pool = Self::new()
            .with_max_attempts(config.dispatch.max_attempts as usize)
            .with_timeout(timeout)
            .with_auth_policy(config.dispatch.auth_denied);

        for entry in &config.backends {
            let backend = backend_from_config(entry, timeout)?;
            pool.add_backend(backend, entry.weight)?;
        }

        info!(
            backends = pool.len(),
            max_attempts = pool.max_attempts,
            "backend pool ready"
        );
        Ok(pool)
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_auth_policy(mut self, policy: AuthDeniedPolicy) -> Self {
        self.auth_policy = policy;
        self
    }

    /// Register a backend. Names must be unique and weights positive.
    pub fn add_backend(
        &mut self,
        backend: Arc<dyn LlmBackend>,
        weight: f64,
    ) -> Result<(), DispatchError> {
        let name = backend.name().to_string();
        if self.slots.iter().any(|s| s.backend.name() == name) {
            return Err(DispatchError::DuplicateBackend(name));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(DispatchError::Setup {
                name,
                reason: format!("weight must be a positive number, got {weight}"),
            });
        }
        debug!(backend = %name, weight, "backend registered");
        self.slots.push(Slot {
            backend,
            weight,
            disabled: AtomicBool::new(false),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Tokens consumed by every successful call so far.
    pub fn total_tokens(&self) -> u64 {
        self.tracker().total_tokens()
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        let tracker = self.tracker();
        let backends = self
            .slots
            .iter()
            .map(|slot| {
                let name = slot.backend.name();
                let stats = tracker.for_backend(name);
                BackendStatus {
                    name: name.to_string(),
                    credential: slot.backend.masked_credential(),
                    weight: slot.weight,
                    load: stats.load,
                    calls: stats.calls,
                    failures: stats.failures,
                    disabled: slot.is_disabled(),
                }
            })
            .collect();
        PoolSnapshot {
            backends,
            total_tokens: tracker.total_tokens(),
        }
    }

    fn tracker(&self) -> MutexGuard<'_, TokenTracker> {
        self.tracker.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Index of the untried, enabled backend with the lowest `load × weight`.
    /// Ties go to the backend registered first.
    ///
    /// Nothing is reserved here: load is only recorded once a call returns,
    /// so concurrent dispatches may all pick the same backend.
    fn select(&self, tried: &[bool]) -> Option<usize> {
        let tracker = self.tracker();
        let mut best: Option<(usize, f64)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            if tried[idx] || slot.is_disabled() {
                continue;
            }
            let key = tracker.load(slot.backend.name()) as f64 * slot.weight;
            if best.map_or(true, |(_, best_key)| key < best_key) {
                best = Some((idx, key));
            }
        }
        best.map(|(idx, _)| idx)
    }

    async fn call_backend(&self, slot: &Slot, prompt: &str) -> Result<LlmResponse, LlmError> {
        match tokio::time::timeout(self.call_timeout, slot.backend.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Transient(format!(
                "timed out after {}s",
                self.call_timeout.as_secs_f64()
            ))),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<LlmResponse, DispatchError> {
        let ceiling = self.max_attempts.min(self.slots.len());
        let mut tried = vec![false; self.slots.len()];
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < ceiling {
            let Some(idx) = self.select(&tried) else {
                break;
            };
            tried[idx] = true;
            attempts += 1;

            let slot = &self.slots[idx];
            let name = slot.backend.name();
            debug!(backend = %name, attempt = attempts, "dispatching prompt");

            match self.call_backend(slot, prompt).await {
                Ok(response) => {
                    self.tracker().record(name, &response.usage);
                    debug!(
                        backend = %name,
                        tokens = response.usage.total_tokens,
                        "backend call succeeded"
                    );
                    return Ok(response);
                }
                Err(err) => {
                    self.tracker().record_failure(name);
                    warn!(backend = %name, attempt = attempts, error = %err, "backend call failed");
                    if matches!(err, LlmError::AuthDenied(_))
                        && self.auth_policy == AuthDeniedPolicy::Disable
                    {
                        slot.disabled.store(true, Ordering::Release);
                        warn!(backend = %name, "backend disabled after credential rejection");
                    }
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(last) => Err(DispatchError::Exhausted { attempts, last }),
            None => Err(DispatchError::NoBackends),
        }
    }
}

impl Default for BackendPool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for BackendPool {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse, DispatchError> {
        BackendPool::generate(self, prompt).await
    }
}
