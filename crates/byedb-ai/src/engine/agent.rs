//! The agent control loop.

use std::time::Duration;

use byedb_common::Mode;
use byedb_config::schema::AgentConfig;
use byedb_db::Database;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::context::{ExecutionContext, PendingToolCall};
use super::report::TurnReport;
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::prompt::build_prompt;
use crate::tools::{parse_reply, ModelReply, ToolCall, ToolRequest};
use crate::Generator;

/// Drives questions to completion for one session.
///
/// Holds the session's conversation memory and at most one suspended
/// [`ExecutionContext`]. Nothing runs between calls: a suspended turn only
/// moves on when [`resume`](Self::resume) is called.
pub struct AgentEngine {
    memory: ConversationMemory,
    suspended: Option<ExecutionContext>,
    max_depth: u32,
}

enum Step {
    Continue,
    Finished(TurnReport),
}

impl AgentEngine {
    pub const DEFAULT_MAX_DEPTH: u32 = 20;

    /// A `max_depth` of zero is raised to one.
    pub fn new(max_depth: u32, memory_capacity: usize) -> Self {
        Self {
            memory: ConversationMemory::new(memory_capacity),
            suspended: None,
            max_depth: max_depth.max(1),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.max_depth, config.memory_capacity as usize)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// The suspended turn, if one is awaiting approval.
    pub fn suspended(&self) -> Option<&ExecutionContext> {
        self.suspended.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingToolCall> {
        self.suspended.as_ref().and_then(|ctx| ctx.pending.as_ref())
    }

    /// Reinstate a previously suspended turn, replacing any current one.
    pub fn restore(&mut self, context: ExecutionContext) {
        self.suspended = Some(context);
    }

    /// Forget past conversations and any suspended turn.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
        if self.suspended.take().is_some() {
            debug!("suspended turn discarded with memory");
        }
    }

    /// Stored conversations rendered as pretty JSON, oldest first. A
    /// conversation that fails to serialize is logged and left out.
    pub fn memory_summary(&self) -> Vec<String> {
        self.memory
            .all()
            .filter_map(|c| match serde_json::to_string_pretty(c) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!(error = %e, "skipping conversation in memory summary");
                    None
                }
            })
            .collect()
    }

    /// Drop the suspended turn when its pending call is older than `ttl`.
    /// A zero `ttl` never expires anything.
    pub fn expire_pending(&mut self, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        let now = Utc::now();
        let expired = self
            .pending()
            .is_some_and(|p| p.age_secs(now) >= ttl.as_secs() as i64);
        if expired {
            self.suspended = None;
            info!(ttl_secs = ttl.as_secs(), "pending operation expired");
        }
        expired
    }

    /// Start a new turn for `question`. A turn still awaiting approval is
    /// abandoned.
    pub async fn submit(
        &mut self,
        generator: &dyn Generator,
        db: &dyn Database,
        question: &str,
        mode: Mode,
    ) -> TurnReport {
        if let Some(stale) = self.suspended.take() {
            warn!(turn = %stale.id, "new question abandons the turn awaiting approval");
        }
        let context = ExecutionContext::new(question, mode);
        debug!(turn = %context.id, %mode, "turn started");
        self.run(generator, db, context).await
    }

    /// Resolve the pending call of the suspended turn.
    pub async fn resume(
        &mut self,
        generator: &dyn Generator,
        db: &dyn Database,
        approve: bool,
    ) -> TurnReport {
        let Some(mut context) = self.suspended.take() else {
            return TurnReport::nothing_pending();
        };
        let Some(pending) = context.pending.take() else {
            return TurnReport::nothing_pending();
        };

        if !approve {
            info!(turn = %context.id, tool = %pending.name, "pending operation rejected");
            return TurnReport::cancelled(&context, &pending);
        }

        info!(turn = %context.id, tool = %pending.name, "pending operation approved");
        let call = pending.to_call();
        let outcome = match ToolRequest::from_call(&call) {
            Ok(request) => request.execute(db).await,
            Err(e) => Err(e),
        };
        context.record_tool(&call, outcome);
        self.run(generator, db, context).await
    }

    async fn run(
        &mut self,
        generator: &dyn Generator,
        db: &dyn Database,
        mut context: ExecutionContext,
    ) -> TurnReport {
        while context.depth < self.max_depth {
            context.depth += 1;
            match self.step(generator, db, &mut context).await {
                Step::Continue => {}
                Step::Finished(report) => return report,
            }
        }

        warn!(turn = %context.id, depth = context.depth, "depth limit reached");
        TurnReport::depth_exceeded(&context)
    }

    /// One generation step and whatever tool work it asks for.
    async fn step(
        &mut self,
        generator: &dyn Generator,
        db: &dyn Database,
        context: &mut ExecutionContext,
    ) -> Step {
        let prompt = build_prompt(&self.memory, context);
        debug!(turn = %context.id, step = context.depth, "generating");

        let response = match generator.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(turn = %context.id, error = %e, "generation failed");
                return Step::Finished(TurnReport::failed(context, e.to_string()));
            }
        };
        context.usage.add(&response.usage);

        let reply = match context.mode {
            Mode::Agent => parse_reply(&response.text),
            Mode::Ask => ModelReply::Text(response.text.trim().to_string()),
        };

        match reply {
            ModelReply::Text(text) => {
                context.conversation.push(ConversationTurn::assistant(text.clone()));
                self.memory.append(context.conversation.clone());
                debug!(turn = %context.id, steps = context.depth, "turn completed");
                Step::Finished(TurnReport::completed(context, &text))
            }
            ModelReply::ToolCall(call) => self.handle_call(db, context, call).await,
        }
    }

    async fn handle_call(
        &mut self,
        db: &dyn Database,
        context: &mut ExecutionContext,
        call: ToolCall,
    ) -> Step {
        debug!(turn = %context.id, tool = %call.name, "tool call detected");
        let request = match ToolRequest::from_call(&call) {
            Ok(request) => request,
            Err(e) => {
                // Fed back to the model so it can correct itself.
                debug!(turn = %context.id, error = %e, "rejected tool call");
                context.record_tool(&call, Err(e));
                return Step::Continue;
            }
        };

        if request.requires_approval() {
            context.pending = Some(PendingToolCall::new(&call));
            let report = TurnReport::pending(context);
            info!(turn = %context.id, tool = %call.name, "awaiting approval");
            self.suspended = Some(context.clone());
            return Step::Finished(report);
        }

        let outcome = request.execute(db).await;
        context.record_tool(&call, outcome);
        Step::Continue
    }
}

impl Default for AgentEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DEPTH, ConversationMemory::DEFAULT_CAPACITY)
    }
}
