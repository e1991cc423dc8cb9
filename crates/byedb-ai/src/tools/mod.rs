//! Database tools the agent can invoke.
//!
//! The model names a tool and passes one argument object. [`ToolRequest`]
//! turns that loose call into a typed request, rejecting unknown names,
//! and runs it against a [`Database`].

mod definitions;
mod parser;

pub use definitions::ToolKind;
pub use parser::{parse_reply, ModelReply, ToolCall};

use byedb_db::{is_read_only, Database, DbError, Row};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Function {0} not recognized.")]
    UnrecognizedTool(String),
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
    #[error("Error executing SQL: {0}")]
    Database(#[from] DbError),
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    ExecuteSql { text: String },
    QuerySql { text: String },
    GetSchemaInfo { table_name: Option<String> },
}

/// What a successful tool run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ToolOutput {
    pub message: String,
    /// Rows returned by SQL tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    pub rows_affected: u64,
    /// Structured schema description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ToolRequest {
    pub fn from_call(call: &ToolCall) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(&call.name)
            .ok_or_else(|| ToolError::UnrecognizedTool(call.name.clone()))?;
        let args = normalize_arguments(&call.arguments);

        Ok(match kind {
            ToolKind::ExecuteSql => ToolRequest::ExecuteSql {
                text: sql_text(kind, &args)?,
            },
            ToolKind::QuerySql => ToolRequest::QuerySql {
                text: sql_text(kind, &args)?,
            },
            ToolKind::GetSchemaInfo => ToolRequest::GetSchemaInfo {
                table_name: args
                    .get("table_name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            },
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolRequest::ExecuteSql { .. } => ToolKind::ExecuteSql,
            ToolRequest::QuerySql { .. } => ToolKind::QuerySql,
            ToolRequest::GetSchemaInfo { .. } => ToolKind::GetSchemaInfo,
        }
    }

    /// Mutating requests must be approved before they run. A `query_sql`
    /// whose text writes is treated like `execute_sql`.
    pub fn requires_approval(&self) -> bool {
        if self.kind().always_mutating() {
            return true;
        }
        match self {
            ToolRequest::QuerySql { text } => !is_read_only(text),
            ToolRequest::ExecuteSql { .. } | ToolRequest::GetSchemaInfo { .. } => false,
        }
    }

    pub async fn execute(&self, db: &dyn Database) -> Result<ToolOutput, ToolError> {
        debug!(tool = self.kind().name(), "executing tool");
        match self {
            ToolRequest::ExecuteSql { text } => {
                let out = db.execute(text).await?;
                Ok(ToolOutput {
                    message: format!("Successfully executed: {text}"),
                    rows: Some(out.rows),
                    rows_affected: out.rows_affected,
                    schema: None,
                })
            }
            ToolRequest::QuerySql { text } => {
                let out = db.execute(text).await?;
                Ok(ToolOutput {
                    message: format!("Query executed: {text}"),
                    rows: Some(out.rows),
                    rows_affected: out.rows_affected,
                    schema: None,
                })
            }
            ToolRequest::GetSchemaInfo { table_name: None } => {
                let tables = db.list_tables().await?;
                Ok(ToolOutput {
                    message: format!("{} table(s) in the database", tables.len()),
                    schema: Some(serde_json::json!({ "tables": tables })),
                    ..ToolOutput::default()
                })
            }
            ToolRequest::GetSchemaInfo {
                table_name: Some(table),
            } => {
                let columns = db.get_table_info(table).await?;
                Ok(ToolOutput {
                    message: format!("Schema of table {table}"),
                    schema: Some(serde_json::json!({ "table": table, "columns": columns })),
                    ..ToolOutput::default()
                })
            }
        }
    }
}

/// Result object fed back to the model.
pub fn result_json(outcome: &Result<ToolOutput, ToolError>) -> Value {
    match outcome {
        Ok(output) => {
            let data = match (&output.rows, &output.schema) {
                (Some(rows), _) => serde_json::to_value(rows).unwrap_or(Value::Null),
                (None, Some(schema)) => schema.clone(),
                (None, None) => Value::Null,
            };
            serde_json::json!({
                "success": true,
                "result": output.message,
                "rows_affected": output.rows_affected,
                "data": data,
            })
        }
        Err(err) => serde_json::json!({
            "success": false,
            "error": err.to_string(),
        }),
    }
}

/// Models sometimes send the argument object as a JSON-encoded string.
fn normalize_arguments(arguments: &Value) -> serde_json::Map<String, Value> {
    match arguments {
        Value::Object(map) => map.clone(),
        Value::String(s) => serde_json::from_str::<serde_json::Map<String, Value>>(s)
            .unwrap_or_default(),
        _ => serde_json::Map::new(),
    }
}

fn sql_text(kind: ToolKind, args: &serde_json::Map<String, Value>) -> Result<String, ToolError> {
    args.get("text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: kind.name(),
            reason: "expected a non-empty string argument 'text'".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byedb_db::SqliteDatabase;

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            name: name.into(),
            arguments,
        }
    }

    #[test]
    fn unknown_tool_is_unrecognized() {
        let err = ToolRequest::from_call(&call("drop_db", serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, ToolError::UnrecognizedTool(ref n) if n == "drop_db"));
        assert_eq!(err.to_string(), "Function drop_db not recognized.");
    }

    #[test]
    fn sql_tools_need_text() {
        let err = ToolRequest::from_call(&call("query_sql", serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "query_sql", .. }));
        let err = ToolRequest::from_call(&call("execute_sql", serde_json::json!({"text": "  "})))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[test]
    fn string_encoded_arguments_are_accepted() {
        let req = ToolRequest::from_call(&call(
            "query_sql",
            Value::String(r#"{"text": "SELECT 1"}"#.into()),
        ))
        .unwrap();
        assert_eq!(req, ToolRequest::QuerySql { text: "SELECT 1".into() });
    }

    #[test]
    fn blank_table_name_means_list() {
        let req = ToolRequest::from_call(&call(
            "get_schema_info",
            serde_json::json!({"table_name": " "}),
        ))
        .unwrap();
        assert_eq!(req, ToolRequest::GetSchemaInfo { table_name: None });
    }

    #[test]
    fn approval_classification() {
        let exec = ToolRequest::ExecuteSql { text: "SELECT 1".into() };
        let read = ToolRequest::QuerySql { text: "SELECT * FROM t".into() };
        let sneaky = ToolRequest::QuerySql { text: "DELETE FROM t".into() };
        let schema = ToolRequest::GetSchemaInfo { table_name: None };
        assert!(exec.requires_approval());
        assert!(!read.requires_approval());
        assert!(sneaky.requires_approval());
        assert!(!schema.requires_approval());
    }

    #[tokio::test]
    async fn executes_against_database() {
        let db = SqliteDatabase::connect_in_memory().await.unwrap();
        ToolRequest::ExecuteSql {
            text: "CREATE TABLE pets (name TEXT); INSERT INTO pets VALUES ('rex')".into(),
        }
        .execute(&db)
        .await
        .unwrap();

        let out = ToolRequest::QuerySql { text: "SELECT name FROM pets".into() }
            .execute(&db)
            .await
            .unwrap();
        assert_eq!(out.rows.as_ref().unwrap()[0]["name"], "rex");

        let out = ToolRequest::GetSchemaInfo { table_name: None }
            .execute(&db)
            .await
            .unwrap();
        assert_eq!(out.schema.unwrap()["tables"][0], "pets");

        let out = ToolRequest::GetSchemaInfo { table_name: Some("pets".into()) }
            .execute(&db)
            .await
            .unwrap();
        assert_eq!(out.schema.unwrap()["columns"][0]["type"], "TEXT");
    }

    #[tokio::test]
    async fn database_errors_become_tool_errors() {
        let db = SqliteDatabase::connect_in_memory().await.unwrap();
        let outcome = ToolRequest::QuerySql { text: "SELECT * FROM missing".into() }
            .execute(&db)
            .await;
        let json = result_json(&outcome);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("missing"));
    }

    #[test]
    fn result_json_for_rows() {
        let mut row = Row::new();
        row.insert("n".into(), Value::from(3));
        let outcome = Ok(ToolOutput {
            message: "Query executed: SELECT 3 AS n".into(),
            rows: Some(vec![row]),
            ..ToolOutput::default()
        });
        let json = result_json(&outcome);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0]["n"], 3);
    }
}
