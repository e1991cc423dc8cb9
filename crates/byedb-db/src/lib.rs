//! Database collaborator for ByeDB sessions.
//!
//! The agent only talks to storage through the [`Database`] trait:
//! run SQL, list tables, describe a table. [`SqliteDatabase`] is the
//! shipped implementation, one private in-memory database per session.

pub mod sqlite;
pub mod statements;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use sqlite::SqliteDatabase;
pub use statements::{is_read_only, split_statements};

/// One result row, column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result of running one (possibly multi-statement) SQL string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    /// Rows produced by every row-returning statement, in order.
    pub rows: Vec<Row>,
    /// Rows changed by the non-returning statements.
    pub rows_affected: u64,
    /// Number of statements executed.
    pub statements: usize,
}

/// Column descriptor returned by [`Database::get_table_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("failed to open database: {0}")]
    Connect(String),
    #[error("{0}")]
    Query(String),
    #[error("database is closed")]
    Closed,
}

/// Request/response interface to one user's database.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run one or more `;`-separated statements atomically.
    async fn execute(&self, sql: &str) -> Result<QueryOutput, DbError>;

    /// Names of user tables.
    async fn list_tables(&self) -> Result<Vec<String>, DbError>;

    async fn get_table_info(&self, table_name: &str) -> Result<Vec<ColumnInfo>, DbError>;

    /// Release the underlying connection. Later calls fail with [`DbError::Closed`].
    async fn close(&self);
}
