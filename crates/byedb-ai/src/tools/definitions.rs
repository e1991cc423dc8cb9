//! The closed set of database tools the model may call.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Statements that change data or schema. Always needs approval.
    ExecuteSql,
    /// Read-only queries.
    QuerySql,
    /// List tables, or describe one.
    GetSchemaInfo,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::ExecuteSql, ToolKind::QuerySql, ToolKind::GetSchemaInfo];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::ExecuteSql => "execute_sql",
            ToolKind::QuerySql => "query_sql",
            ToolKind::GetSchemaInfo => "get_schema_info",
        }
    }

    /// Look up a tool by the name the model used.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Call signature as shown to the model.
    pub fn signature(&self) -> &'static str {
        match self {
            ToolKind::ExecuteSql => "execute_sql(text)",
            ToolKind::QuerySql => "query_sql(text)",
            ToolKind::GetSchemaInfo => "get_schema_info(table_name?)",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::ExecuteSql => {
                "Execute SQL commands that modify the database (INSERT, UPDATE, DELETE, CREATE TABLE, etc.). Requires user confirmation."
            }
            ToolKind::QuerySql => {
                "Query the database for information (SELECT statements). Safe and no confirmation needed."
            }
            ToolKind::GetSchemaInfo => {
                "List all tables, or describe the columns of one table when table_name is given."
            }
        }
    }

    /// Whether every call of this kind needs approval regardless of its text.
    pub fn always_mutating(&self) -> bool {
        matches!(self, ToolKind::ExecuteSql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(ToolKind::from_name("drop_everything"), None);
        assert_eq!(ToolKind::from_name("EXECUTE_SQL"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn only_execute_sql_is_always_mutating() {
        assert!(ToolKind::ExecuteSql.always_mutating());
        assert!(!ToolKind::QuerySql.always_mutating());
        assert!(!ToolKind::GetSchemaInfo.always_mutating());
    }
}
