//! SQLite implementation of [`Database`] backed by an sqlx pool.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use crate::statements::{returns_rows, split_statements};
use crate::{ColumnInfo, Database, DbError, QueryOutput};

/// A session-private SQLite database.
///
/// The pool holds exactly one connection that never idles out, so an
/// in-memory database lives exactly as long as this value (or until
/// [`Database::close`]).
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open a fresh, empty in-memory database.
    pub async fn connect_in_memory() -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::Connect(e.to_string()))?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self, DbError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connect(e.to_string()))?;
        Ok(Self { pool })
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.pool.is_closed() {
            Err(DbError::Closed)
        } else {
            Ok(())
        }
    }
}

fn query_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::PoolClosed => DbError::Closed,
        sqlx::Error::Database(db) => DbError::Query(db.message().to_string()),
        other => DbError::Query(other.to_string()),
    }
}

/// Quote an identifier for interpolation into SQL text.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn row_to_json(row: &SqliteRow) -> crate::Row {
    let mut map = serde_json::Map::new();
    for column in row.columns() {
        map.insert(column.name().to_string(), decode_column(row, column.ordinal()));
    }
    map
}

fn decode_column(row: &SqliteRow, idx: usize) -> Value {
    let type_name = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_ascii_uppercase(),
        Err(_) => return Value::Null,
    };

    match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => row
            .try_get_unchecked::<i64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "REAL" | "NUMERIC" => row
            .try_get_unchecked::<f64, _>(idx)
            .map(Value::from)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get_unchecked::<Vec<u8>, _>(idx)
            .map(|bytes| {
                let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
                Value::String(format!("x'{hex}'"))
            })
            .unwrap_or(Value::Null),
        _ => row
            .try_get_unchecked::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn execute(&self, sql: &str) -> Result<QueryOutput, DbError> {
        self.ensure_open()?;
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Err(DbError::Query("no SQL statement to execute".into()));
        }

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await.map_err(query_error)?;
        let mut output = QueryOutput::default();

        for statement in &statements {
            debug!(statement = %statement, "sqlite execute");
            if returns_rows(statement) {
                let rows = sqlx::query(statement.as_str())
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(query_error)?;
                output.rows.extend(rows.iter().map(row_to_json));
            } else {
                let result = sqlx::query(statement.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(query_error)?;
                output.rows_affected += result.rows_affected();
            }
            output.statements += 1;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(output)
    }

    async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        self.ensure_open()?;
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(query_error))
            .collect()
    }

    async fn get_table_info(&self, table_name: &str) -> Result<Vec<ColumnInfo>, DbError> {
        self.ensure_open()?;
        let sql = format!("PRAGMA table_info({})", quote_identifier(table_name));
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        if rows.is_empty() {
            return Err(DbError::Query(format!("no such table: {table_name}")));
        }

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get("name").map_err(query_error)?,
                    data_type: row.try_get("type").map_err(query_error)?,
                    not_null: row.try_get::<i64, _>("notnull").map_err(query_error)? != 0,
                    default_value: row.try_get("dflt_value").map_err(query_error)?,
                    primary_key: row.try_get::<i64, _>("pk").map_err(query_error)? != 0,
                })
            })
            .collect()
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            debug!("sqlite database closed");
        }
    }
}
