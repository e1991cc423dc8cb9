//! One user's session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use byedb_ai::AgentEngine;
use byedb_common::UserId;
use byedb_db::Database;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// A user's database plus the engine that works on it.
///
/// The engine sits behind an async mutex held for a whole turn, so requests
/// for the same user run one at a time against the database.
pub struct Session {
    user_id: UserId,
    db: Arc<dyn Database>,
    engine: Mutex<AgentEngine>,
    /// Set when the session leaves the cache. A request that was queued on
    /// the engine lock must not run on it afterwards.
    closed: AtomicBool,
}

impl Session {
    pub fn new(user_id: UserId, db: Arc<dyn Database>, engine: AgentEngine) -> Self {
        Self {
            user_id,
            db,
            engine: Mutex::new(engine),
            closed: AtomicBool::new(false),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn database(&self) -> &dyn Database {
        self.db.as_ref()
    }

    /// Exclusive access to the engine for the duration of one request.
    ///
    /// Returns `None` when the session was removed from the cache while the
    /// caller waited; the caller should look the user up again.
    pub async fn engine(&self) -> Option<MutexGuard<'_, AgentEngine>> {
        let guard = self.engine.lock().await;
        if self.is_closed() {
            debug!(user = %self.user_id, "session closed while waiting");
            return None;
        }
        Some(guard)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Flag the session as gone. Called while it is removed from the cache.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Release the database once any in-flight request has finished.
    pub async fn close(&self) {
        self.mark_closed();
        let _engine = self.engine.lock().await;
        self.db.close().await;
        debug!(user = %self.user_id, "session closed");
    }
}
