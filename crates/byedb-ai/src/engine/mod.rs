//! Agent execution engine.
//!
//! One question moves through generate → tool call → execute (or wait for
//! approval) → generate again, until the model answers in plain text, the
//! depth guard trips, or the user rejects a pending operation.

mod agent;
mod context;
mod report;

pub use agent::AgentEngine;
pub use context::{ExecutionContext, PendingToolCall, ToolInvocation};
pub use report::{
    TurnReport, TurnStatus, CANCELLED_MESSAGE, CONFIRMATION_REQUIRED, DEPTH_EXCEEDED_MESSAGE,
    NOTHING_PENDING_MESSAGE,
};

#[cfg(test)]
mod tests;
