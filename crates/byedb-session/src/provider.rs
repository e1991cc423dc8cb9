//! Where session databases come from.

use std::sync::Arc;

use async_trait::async_trait;
use byedb_common::UserId;
use byedb_db::{Database, DbError, SqliteDatabase};
use tracing::debug;

/// Opens the private database of a newly created session.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    async fn open(&self, user_id: &UserId) -> Result<Arc<dyn Database>, DbError>;
}

/// Gives every session a fresh, empty in-memory SQLite database.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemorySqlite;

#[async_trait]
impl DatabaseProvider for InMemorySqlite {
    async fn open(&self, user_id: &UserId) -> Result<Arc<dyn Database>, DbError> {
        let db = SqliteDatabase::connect_in_memory().await?;
        debug!(user = %user_id, "opened in-memory database");
        Ok(Arc::new(db))
    }
}
