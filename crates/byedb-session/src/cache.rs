//! LRU-bounded map from user to session.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use byedb_ai::AgentEngine;
use byedb_common::UserId;
use byedb_config::schema::AgentConfig;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::provider::DatabaseProvider;
use crate::session::Session;
use crate::SessionError;

/// Sessions plus their recency order. `order` runs from least to most
/// recently used and always holds exactly the keys of `sessions`.
#[derive(Default)]
struct LruState {
    sessions: HashMap<UserId, Arc<Session>>,
    order: VecDeque<UserId>,
}

impl LruState {
    /// Look up and promote to most recently used.
    fn touch(&mut self, user_id: &UserId) -> Option<Arc<Session>> {
        let session = self.sessions.get(user_id).cloned()?;
        if let Some(pos) = self.order.iter().position(|id| id == user_id) {
            if let Some(id) = self.order.remove(pos) {
                self.order.push_back(id);
            }
        }
        Some(session)
    }

    fn insert(&mut self, user_id: UserId, session: Arc<Session>) {
        self.order.push_back(user_id.clone());
        self.sessions.insert(user_id, session);
    }

    fn pop_lru(&mut self) -> Option<Arc<Session>> {
        let user_id = self.order.pop_front()?;
        let session = self.sessions.remove(&user_id)?;
        session.mark_closed();
        Some(session)
    }

    fn remove(&mut self, user_id: &UserId) -> Option<Arc<Session>> {
        let session = self.sessions.remove(user_id)?;
        self.order.retain(|id| id != user_id);
        session.mark_closed();
        Some(session)
    }
}

/// Bounded cache of live sessions.
///
/// Lookup, promotion, insertion and eviction all happen under one lock, so
/// a session can never be evicted between being found and being promoted.
/// Evicted sessions are flagged closed while still under that lock and have
/// their database closed before the call returns.
pub struct SessionCache {
    capacity: usize,
    state: Mutex<LruState>,
    provider: Arc<dyn DatabaseProvider>,
    agent: AgentConfig,
}

impl SessionCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, provider: Arc<dyn DatabaseProvider>, agent: AgentConfig) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
            provider,
            agent,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, user_id: &UserId) -> bool {
        self.state.lock().await.sessions.contains_key(user_id)
    }

    /// Cached users, least recently used first.
    pub async fn users(&self) -> Vec<UserId> {
        self.state.lock().await.order.iter().cloned().collect()
    }

    /// Return the user's session, promoting it, without creating one.
    pub async fn get(&self, user_id: &UserId) -> Option<Arc<Session>> {
        self.state.lock().await.touch(user_id)
    }

    /// Return the user's session, creating it (and evicting the least
    /// recently used one when full) if needed.
    pub async fn get_or_create(&self, user_id: &UserId) -> Result<Arc<Session>, SessionError> {
        let (session, evicted) = {
            let mut state = self.state.lock().await;
            if let Some(session) = state.touch(user_id) {
                return Ok(session);
            }

            let db = self.provider.open(user_id).await?;
            let engine = AgentEngine::from_config(&self.agent);
            let session = Arc::new(Session::new(user_id.clone(), db, engine));

            let evicted = if state.sessions.len() >= self.capacity {
                state.pop_lru()
            } else {
                None
            };
            state.insert(user_id.clone(), Arc::clone(&session));
            debug!(user = %user_id, sessions = state.sessions.len(), "session created");
            (session, evicted)
        };

        if let Some(old) = evicted {
            info!(user = %old.user_id(), "evicting least recently used session");
            old.close().await;
        }
        Ok(session)
    }

    /// Remove and close the user's session. Returns false if there was none.
    pub async fn delete(&self, user_id: &UserId) -> bool {
        let removed = self.state.lock().await.remove(user_id);
        match removed {
            Some(session) => {
                info!(user = %user_id, "session deleted");
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// Close every session, e.g. on shutdown.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Session>> = {
            let mut state = self.state.lock().await;
            state.order.clear();
            state
                .sessions
                .drain()
                .map(|(_, s)| {
                    s.mark_closed();
                    s
                })
                .collect()
        };
        for session in drained {
            session.close().await;
        }
    }
}
