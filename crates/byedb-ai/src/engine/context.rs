//! State of one in-flight question.

use byedb_common::{new_id, Mode};
use byedb_db::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::{Conversation, ConversationTurn};
use crate::tools::{result_json, ToolCall, ToolError, ToolOutput};
use crate::TokenUsage;

/// A tool call performed (or proposed) during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: Value,
    /// Absent while the call is still awaiting approval or was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// A mutating call waiting for the user's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    pub created_at: DateTime<Utc>,
}

impl PendingToolCall {
    pub fn new(call: &ToolCall) -> Self {
        Self {
            id: new_id(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn to_call(&self) -> ToolCall {
        ToolCall {
            name: self.name.clone(),
            arguments: self.arguments.clone(),
        }
    }

    pub fn to_invocation(&self) -> ToolInvocation {
        ToolInvocation {
            name: self.name.clone(),
            arguments: self.arguments.clone(),
            result: None,
        }
    }

    /// Seconds since the call was proposed.
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

/// Everything one user turn accumulates across generation steps and
/// suspend/resume round trips. Serializable so a suspended turn can be
/// stored and resumed elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub id: String,
    pub question: String,
    pub mode: Mode,
    /// Tool calls and results rendered for the prompt.
    pub context_log: String,
    pub conversation: Conversation,
    pub tool_calls: Vec<ToolInvocation>,
    pub pending: Option<PendingToolCall>,
    /// Generation steps taken so far.
    pub depth: u32,
    pub usage: TokenUsage,
    /// Rows from the most recent successful SQL tool.
    pub last_data: Option<Vec<Row>>,
    pub started_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(question: impl Into<String>, mode: Mode) -> Self {
        let question = question.into();
        Self {
            id: new_id(),
            conversation: vec![ConversationTurn::user(question.clone())],
            question,
            mode,
            context_log: String::new(),
            tool_calls: Vec::new(),
            pending: None,
            depth: 0,
            usage: TokenUsage::default(),
            last_data: None,
            started_at: Utc::now(),
        }
    }

    /// Log a finished tool call so the next prompt sees its outcome.
    pub(crate) fn record_tool(&mut self, call: &ToolCall, outcome: Result<ToolOutput, ToolError>) {
        let result = result_json(&outcome);
        self.context_log.push_str(&format!(
            "\nFunction call: {}({})\nResult: {}\n",
            call.name, call.arguments, result
        ));
        self.conversation
            .push(ConversationTurn::tool(result.to_string()));
        if let Ok(ToolOutput {
            rows: Some(rows), ..
        }) = outcome
        {
            self.last_data = Some(rows);
        }
        self.tool_calls.push(ToolInvocation {
            name: call.name.clone(),
            arguments: call.arguments.clone(),
            result: Some(result),
        });
    }

    /// Every invocation so far, plus the pending proposal if any.
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        let mut calls = self.tool_calls.clone();
        if let Some(pending) = &self.pending {
            calls.push(pending.to_invocation());
        }
        calls
    }
}
