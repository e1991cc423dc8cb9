//! What a turn hands back to the caller.

use byedb_db::Row;
use serde::{Deserialize, Serialize};

use super::context::{ExecutionContext, PendingToolCall, ToolInvocation};
use crate::TokenUsage;

pub const CONFIRMATION_REQUIRED: &str = "Confirmation Required";
pub const DEPTH_EXCEEDED_MESSAGE: &str =
    "Maximum function call iterations reached. Please refine your query or try again.";
pub const CANCELLED_MESSAGE: &str = "Execution cancelled. The pending operation was not run.";
pub const NOTHING_PENDING_MESSAGE: &str = "No pending operation to confirm.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The model answered in plain text.
    Completed,
    /// A mutating tool call awaits approval.
    PendingApproval,
    DepthExceeded,
    /// The user rejected the pending call.
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReport {
    pub success: bool,
    pub status: TurnStatus,
    pub response: String,
    pub tool_calls: Vec<ToolInvocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    pub usage: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingToolCall>,
}

impl TurnReport {
    fn from_context(
        context: &ExecutionContext,
        success: bool,
        status: TurnStatus,
        response: impl Into<String>,
    ) -> Self {
        Self {
            success,
            status,
            response: response.into(),
            tool_calls: context.invocations(),
            data: context.last_data.clone(),
            usage: context.usage,
            pending: context.pending.clone(),
        }
    }

    pub(crate) fn completed(context: &ExecutionContext, text: &str) -> Self {
        Self::from_context(context, true, TurnStatus::Completed, text)
    }

    pub(crate) fn pending(context: &ExecutionContext) -> Self {
        Self::from_context(
            context,
            true,
            TurnStatus::PendingApproval,
            CONFIRMATION_REQUIRED,
        )
    }

    pub(crate) fn depth_exceeded(context: &ExecutionContext) -> Self {
        Self::from_context(
            context,
            false,
            TurnStatus::DepthExceeded,
            DEPTH_EXCEEDED_MESSAGE,
        )
    }

    /// `rejected` is the call the user declined; it is listed without a result.
    pub(crate) fn cancelled(context: &ExecutionContext, rejected: &PendingToolCall) -> Self {
        let mut report =
            Self::from_context(context, false, TurnStatus::Cancelled, CANCELLED_MESSAGE);
        report.tool_calls.push(rejected.to_invocation());
        report
    }

    pub(crate) fn failed(context: &ExecutionContext, message: impl Into<String>) -> Self {
        Self::from_context(context, false, TurnStatus::Failed, message)
    }

    pub fn nothing_pending() -> Self {
        Self {
            success: false,
            status: TurnStatus::Failed,
            response: NOTHING_PENDING_MESSAGE.to_string(),
            tool_calls: Vec::new(),
            data: None,
            usage: TokenUsage::default(),
            pending: None,
        }
    }

    pub fn requires_approval(&self) -> bool {
        self.status == TurnStatus::PendingApproval
    }
}
