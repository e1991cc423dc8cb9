//! Engine-facing operations for request handlers.

use std::sync::Arc;
use std::time::Duration;

use byedb_ai::{Generator, TurnReport};
use byedb_common::{new_correlation_id, Mode, UserId};
use byedb_config::ByedbConfig;
use tracing::{info, info_span, Instrument};

use crate::cache::SessionCache;
use crate::provider::DatabaseProvider;
use crate::SessionError;

/// Entry point shared by every request handler.
///
/// Built once at startup with its collaborators passed in explicitly.
/// A request that finds its session evicted while waiting for the engine
/// looks the user up again, so it never runs on a closed session.
pub struct QueryService {
    cache: SessionCache,
    generator: Arc<dyn Generator>,
    pending_ttl: Duration,
}

impl QueryService {
    pub fn new(cache: SessionCache, generator: Arc<dyn Generator>) -> Self {
        Self {
            cache,
            generator,
            pending_ttl: Duration::ZERO,
        }
    }

    /// Wire a service from configuration around the given generator and
    /// database provider.
    pub fn from_config(
        config: &ByedbConfig,
        generator: Arc<dyn Generator>,
        provider: Arc<dyn DatabaseProvider>,
    ) -> Self {
        let cache = SessionCache::new(
            config.sessions.capacity as usize,
            provider,
            config.agent.clone(),
        );
        Self::new(cache, generator)
            .with_pending_ttl(Duration::from_secs(config.sessions.pending_ttl_secs))
    }

    /// How long a pending operation may wait for a decision. Zero disables
    /// expiry.
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Run a new question for `user_id`.
    pub async fn submit_question(
        &self,
        user_id: &UserId,
        question: &str,
        mode: Mode,
    ) -> Result<TurnReport, SessionError> {
        let span = info_span!("turn", user = %user_id, id = %new_correlation_id());
        async {
            loop {
                let session = self.cache.get_or_create(user_id).await?;
                let Some(mut engine) = session.engine().await else {
                    continue;
                };
                engine.expire_pending(self.pending_ttl);
                let report = engine
                    .submit(self.generator.as_ref(), session.database(), question, mode)
                    .await;
                info!(status = ?report.status, tools = report.tool_calls.len(), "turn finished");
                return Ok::<_, SessionError>(report);
            }
        }
        .instrument(span)
        .await
    }

    /// Approve or reject the user's pending operation.
    pub async fn confirm_pending(
        &self,
        user_id: &UserId,
        approve: bool,
    ) -> Result<TurnReport, SessionError> {
        let span = info_span!("confirm", user = %user_id, id = %new_correlation_id(), approve);
        async {
            loop {
                let Some(session) = self.cache.get(user_id).await else {
                    return Ok::<_, SessionError>(TurnReport::nothing_pending());
                };
                let Some(mut engine) = session.engine().await else {
                    continue;
                };
                engine.expire_pending(self.pending_ttl);
                let report = engine
                    .resume(self.generator.as_ref(), session.database(), approve)
                    .await;
                info!(status = ?report.status, "confirmation handled");
                return Ok(report);
            }
        }
        .instrument(span)
        .await
    }

    /// Forget the user's past conversations and any pending operation.
    pub async fn clear_memory(&self, user_id: &UserId) {
        while let Some(session) = self.cache.get(user_id).await {
            if let Some(mut engine) = session.engine().await {
                engine.clear_memory();
                info!(user = %user_id, "memory cleared");
                return;
            }
        }
    }

    /// Stored conversations as pretty JSON, oldest first.
    pub async fn memory_summary(&self, user_id: &UserId) -> Vec<String> {
        while let Some(session) = self.cache.get(user_id).await {
            if let Some(engine) = session.engine().await {
                return engine.memory_summary();
            }
        }
        Vec::new()
    }

    /// Tables in the user's database.
    pub async fn list_tables(&self, user_id: &UserId) -> Result<Vec<String>, SessionError> {
        loop {
            let session = self.cache.get_or_create(user_id).await?;
            let Some(_engine) = session.engine().await else {
                continue;
            };
            return Ok(session.database().list_tables().await?);
        }
    }

    /// Drop the user's session and database.
    pub async fn delete_user(&self, user_id: &UserId) -> bool {
        self.cache.delete(user_id).await
    }

    pub async fn shutdown(&self) {
        self.cache.close_all().await;
    }
}
