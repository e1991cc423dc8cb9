use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use byedb_common::Mode;
use byedb_db::{Database, SqliteDatabase};
use chrono::Utc;

use super::*;
use crate::{DispatchError, Generator, LlmError, LlmResponse, TokenUsage};

/// Replays scripted replies and records every prompt it sees.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, DispatchError>>>,
    /// Returned once the script runs out.
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn repeating(reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: DispatchError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([Err(err)])),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn prompt(&self, i: usize) -> String {
        self.prompts.lock().unwrap()[i].clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse, DispatchError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        let text = match next {
            Some(reply) => reply?,
            None => self
                .fallback
                .clone()
                .unwrap_or_else(|| "script exhausted".to_string()),
        };
        Ok(LlmResponse {
            text,
            usage: TokenUsage::new(10, 15),
        })
    }
}

fn call(name: &str, text: &str) -> String {
    serde_json::json!({
        "function_call": { "name": name, "arguments": { "text": text } }
    })
    .to_string()
}

async fn db_with_users() -> SqliteDatabase {
    let db = SqliteDatabase::connect_in_memory().await.unwrap();
    db.execute(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO users (name) VALUES ('ada'), ('bob');",
    )
    .await
    .unwrap();
    db
}

async fn user_count(db: &SqliteDatabase) -> i64 {
    let out = db.execute("SELECT COUNT(*) AS n FROM users").await.unwrap();
    out.rows[0]["n"].as_i64().unwrap()
}

#[tokio::test]
async fn direct_answer_completes_and_is_remembered() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec!["Hello there."]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "hi", Mode::Agent).await;

    assert!(report.success);
    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(report.response, "Hello there.");
    assert!(report.tool_calls.is_empty());
    assert_eq!(report.usage, TokenUsage::new(10, 15));
    assert_eq!(engine.memory().len(), 1);
    assert!(engine.suspended().is_none());
}

#[tokio::test]
async fn read_only_tool_runs_immediately_and_loop_continues() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![
        call("query_sql", "SELECT name FROM users ORDER BY id").as_str(),
        "There are two users: ada and bob.",
    ]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "who are my users?", Mode::Agent).await;

    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(gen.calls(), 2);
    assert_eq!(report.tool_calls.len(), 1);
    assert_eq!(report.tool_calls[0].name, "query_sql");
    assert_eq!(report.data.as_ref().unwrap()[1]["name"], "bob");
    assert_eq!(report.usage, TokenUsage::new(20, 30));
    // The second prompt carries the first tool's result.
    let second = gen.prompt(1);
    assert!(second.contains("Previous function results:"));
    assert!(second.contains("\"ada\""));
}

#[tokio::test]
async fn mutating_call_waits_for_approval_and_runs_on_confirm() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![
        call("execute_sql", "INSERT INTO users (name) VALUES ('cy')").as_str(),
        "Added cy.",
    ]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "add cy", Mode::Agent).await;
    assert!(report.requires_approval());
    assert_eq!(report.response, CONFIRMATION_REQUIRED);
    assert_eq!(report.pending.as_ref().unwrap().name, "execute_sql");
    assert!(report.tool_calls[0].result.is_none());
    assert_eq!(user_count(&db).await, 2, "nothing runs before approval");
    assert_eq!(gen.calls(), 1, "no generation while suspended");

    let report = engine.resume(&gen, &db, true).await;
    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(report.response, "Added cy.");
    assert_eq!(user_count(&db).await, 3);
    assert_eq!(report.tool_calls.len(), 1);
    assert_eq!(report.tool_calls[0].result.as_ref().unwrap()["success"], true);
    assert!(engine.pending().is_none());
    assert_eq!(engine.memory().len(), 1);
}

#[tokio::test]
async fn rejected_call_never_runs() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![call("execute_sql", "DELETE FROM users").as_str()]);
    let mut engine = AgentEngine::new(5, 3);

    engine.submit(&gen, &db, "wipe users", Mode::Agent).await;
    let report = engine.resume(&gen, &db, false).await;

    assert!(!report.success);
    assert_eq!(report.status, TurnStatus::Cancelled);
    assert_eq!(report.response, CANCELLED_MESSAGE);
    assert_eq!(report.tool_calls.len(), 1);
    assert!(report.pending.is_none());
    assert_eq!(user_count(&db).await, 2);
    assert!(engine.suspended().is_none());
    assert!(engine.memory().is_empty());
    assert_eq!(gen.calls(), 1);
}

#[tokio::test]
async fn writing_query_sql_is_gated_too() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![call("query_sql", "DROP TABLE users").as_str()]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "drop it", Mode::Agent).await;
    assert!(report.requires_approval());
    assert_eq!(db.list_tables().await.unwrap(), vec!["users"]);
}

#[tokio::test]
async fn setting_pragma_through_query_sql_needs_approval() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![
        call("query_sql", "PRAGMA user_version(7)").as_str(),
        "ok",
    ]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "bump version", Mode::Agent).await;
    assert!(report.requires_approval());
    let out = db.execute("PRAGMA user_version").await.unwrap();
    assert_eq!(out.rows[0]["user_version"], 0);
}

#[tokio::test]
async fn resume_without_pending_reports_nothing_pending() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![]);
    let mut engine = AgentEngine::default();

    let report = engine.resume(&gen, &db, true).await;
    assert!(!report.success);
    assert_eq!(report.response, NOTHING_PENDING_MESSAGE);
    assert_eq!(gen.calls(), 0);
}

#[tokio::test]
async fn depth_guard_stops_after_exactly_max_depth_steps() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::repeating(call("query_sql", "SELECT 1").as_str());
    let mut engine = AgentEngine::new(3, 3);

    let report = engine.submit(&gen, &db, "loop forever", Mode::Agent).await;

    assert_eq!(report.status, TurnStatus::DepthExceeded);
    assert!(!report.success);
    assert_eq!(report.response, DEPTH_EXCEEDED_MESSAGE);
    assert_eq!(gen.calls(), 3);
    assert_eq!(report.tool_calls.len(), 3);
    assert!(engine.memory().is_empty());
}

#[tokio::test]
async fn depth_counts_steps_across_resume() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![
        call("query_sql", "SELECT 1").as_str(),
        call("execute_sql", "INSERT INTO users (name) VALUES ('x')").as_str(),
        call("query_sql", "SELECT 2").as_str(),
        "never reached",
    ]);
    let mut engine = AgentEngine::new(3, 3);

    let report = engine.submit(&gen, &db, "q", Mode::Agent).await;
    assert!(report.requires_approval());
    assert_eq!(engine.suspended().unwrap().depth, 2);

    let report = engine.resume(&gen, &db, true).await;
    assert_eq!(report.status, TurnStatus::DepthExceeded);
    assert_eq!(gen.calls(), 3);
}

#[tokio::test]
async fn unknown_tool_is_fed_back_and_loop_continues() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![call("drop_database", "now").as_str(), "Sorry, done."]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "q", Mode::Agent).await;

    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(report.tool_calls[0].result.as_ref().unwrap()["success"], false);
    assert!(gen.prompt(1).contains("Function drop_database not recognized."));
}

#[tokio::test]
async fn malformed_tool_call_is_plain_text() {
    let db = db_with_users().await;
    let broken = r#"{"function_call": {"name": "query_sql", "arguments": "#;
    let gen = ScriptedGenerator::new(vec![broken]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "q", Mode::Agent).await;
    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(report.response, broken);
}

#[tokio::test]
async fn ask_mode_never_calls_tools() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![call("execute_sql", "DELETE FROM users").as_str()]);
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "how would I delete?", Mode::Ask).await;

    assert_eq!(report.status, TurnStatus::Completed);
    assert!(report.response.contains("DELETE FROM users"));
    assert_eq!(user_count(&db).await, 2);
    assert!(gen.prompt(0).contains("Do NOT execute"));
}

#[tokio::test]
async fn dispatch_failure_fails_the_turn() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::failing(DispatchError::Exhausted {
        attempts: 2,
        last: LlmError::RateLimited("quota exceeded".into()),
    });
    let mut engine = AgentEngine::new(5, 3);

    let report = engine.submit(&gen, &db, "q", Mode::Agent).await;
    assert_eq!(report.status, TurnStatus::Failed);
    assert!(report.response.contains("quota exceeded"));
    assert!(engine.memory().is_empty());
    assert!(engine.suspended().is_none());
}

#[tokio::test]
async fn new_submit_abandons_pending_turn() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![call("execute_sql", "DELETE FROM users").as_str(), "ok"]);
    let mut engine = AgentEngine::new(5, 3);

    engine.submit(&gen, &db, "wipe", Mode::Agent).await;
    assert!(engine.pending().is_some());

    let report = engine.submit(&gen, &db, "never mind", Mode::Agent).await;
    assert_eq!(report.status, TurnStatus::Completed);
    assert!(engine.pending().is_none());
    assert_eq!(user_count(&db).await, 2);
}

#[tokio::test]
async fn memory_feeds_later_prompts_and_stays_bounded() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec!["a1", "a2", "a3", "a4"]);
    let mut engine = AgentEngine::new(5, 2);

    for q in ["q1", "q2", "q3", "q4"] {
        engine.submit(&gen, &db, q, Mode::Agent).await;
    }

    assert_eq!(engine.memory().len(), 2);
    let last = gen.prompt(3);
    assert!(last.contains("user: q2\nassistant: a2"));
    assert!(last.contains("user: q3\nassistant: a3"));
    assert!(!last.contains("user: q1"));
    let summary = engine.memory_summary();
    assert_eq!(summary.len(), 2);
    let oldest: serde_json::Value = serde_json::from_str(&summary[0]).unwrap();
    assert_eq!(oldest[0]["content"], "q3");
    assert_eq!(oldest[1]["content"], "a3");
}

#[tokio::test]
async fn suspended_turn_can_be_restored_from_json() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec![
        call("execute_sql", "INSERT INTO users (name) VALUES ('dee')").as_str(),
        "done",
    ]);
    let mut first = AgentEngine::new(5, 3);
    first.submit(&gen, &db, "add dee", Mode::Agent).await;

    let json = serde_json::to_string(first.suspended().unwrap()).unwrap();
    let mut second = AgentEngine::new(5, 3);
    second.restore(serde_json::from_str(&json).unwrap());

    let report = second.resume(&gen, &db, true).await;
    assert_eq!(report.status, TurnStatus::Completed);
    assert_eq!(user_count(&db).await, 3);
}

#[tokio::test]
async fn clear_memory_discards_pending_turn() {
    let db = db_with_users().await;
    let gen = ScriptedGenerator::new(vec!["a", call("execute_sql", "DELETE FROM users").as_str()]);
    let mut engine = AgentEngine::new(5, 3);

    engine.submit(&gen, &db, "q1", Mode::Agent).await;
    engine.submit(&gen, &db, "q2", Mode::Agent).await;
    assert!(engine.pending().is_some());

    engine.clear_memory();
    assert!(engine.memory().is_empty());
    assert!(engine.pending().is_none());
}

#[test]
fn stale_pending_call_expires() {
    let mut engine = AgentEngine::default();
    let mut context = ExecutionContext::new("q", Mode::Agent);
    let mut pending = PendingToolCall::new(&crate::tools::ToolCall {
        name: "execute_sql".into(),
        arguments: serde_json::json!({ "text": "DELETE FROM t" }),
    });
    pending.created_at = Utc::now() - chrono::Duration::seconds(120);
    context.pending = Some(pending);
    engine.restore(context);

    assert!(!engine.expire_pending(Duration::ZERO));
    assert!(!engine.expire_pending(Duration::from_secs(600)));
    assert!(engine.pending().is_some());
    assert!(engine.expire_pending(Duration::from_secs(60)));
    assert!(engine.suspended().is_none());
}
