//! Per-user sessions for ByeDB.
//!
//! A [`Session`] bundles one user's private database with their agent
//! engine. [`SessionCache`] bounds how many sessions live at once, evicting
//! the least recently used. [`QueryService`] is the facade request handlers
//! call: submit a question, confirm or reject a pending operation, clear
//! memory.

pub mod cache;
pub mod provider;
pub mod service;
pub mod session;

use byedb_db::DbError;

pub use cache::SessionCache;
pub use provider::{DatabaseProvider, InMemorySqlite};
pub use service::QueryService;
pub use session::Session;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to open session database: {0}")]
    Database(#[from] DbError),
}

impl From<SessionError> for byedb_common::ByedbError {
    fn from(err: SessionError) -> Self {
        byedb_common::ByedbError::Session(err.to_string())
    }
}
