//! Prompt construction for one generation step.
//!
//! Layout: mode preamble, previous conversations, the current question,
//! the tool results gathered so far in this turn, then `Response:`.

use std::fmt::Write as _;

use byedb_common::Mode;

use crate::engine::ExecutionContext;
use crate::memory::ConversationMemory;
use crate::tools::ToolKind;

const AGENT_INTRO: &str = "You are an expert SQL assistant and an AI Agent from ByeDB.AI. \
You have access to the user's SQLite database.\n\n\
You must respond with function calls when the user asks for database operations.\n\n";

const AGENT_GUIDELINES: &str = "Guidelines:
- Use `execute_sql` for statements that modify the database (INSERT, UPDATE, DELETE, CREATE TABLE, etc.)
- Use `query_sql` for SELECT statements and data inspection
- Use `get_schema_info` when you need to know which tables or columns exist
- If the user's request is unclear, ask for clarification
- Always analyze the data before providing insights
- If a function failed, don't keep retrying
- If the user asks to visualise data, prefer a markdown table
- Prefer a single function call with a longer SQL string over many small calls
- Do not repeat the same function and arguments unless necessary
- Call exactly one function per response, or answer in plain text

When you need to call a function, respond with a JSON object in this format:
{
    \"function_call\": {
        \"name\": \"function_name\",
        \"arguments\": {\"parameter\": \"value\"}
    }
}

";

const ASK_PREAMBLE: &str = "You are an expert SQL assistant and an AI Agent from ByeDB.AI. \
Your job is to help write SQL queries and explain database operations.

- Do NOT execute or suggest any function calls.
- Simply write or explain SQL queries based on the user's question.
- Be concise and clear. Return only helpful text or code as needed.

";

fn preamble(mode: Mode) -> String {
    match mode {
        Mode::Agent => {
            let mut text = String::from(AGENT_INTRO);
            text.push_str("Available functions:\n");
            for (i, kind) in ToolKind::ALL.iter().enumerate() {
                let _ = writeln!(text, "{}. {}: {}", i + 1, kind.signature(), kind.description());
            }
            text.push('\n');
            text.push_str(AGENT_GUIDELINES);
            text
        }
        Mode::Ask => ASK_PREAMBLE.to_string(),
    }
}

pub fn build_prompt(memory: &ConversationMemory, context: &ExecutionContext) -> String {
    let mut prompt = preamble(context.mode);

    if !memory.is_empty() {
        prompt.push_str("Previous conversations:\n");
        for (i, conversation) in memory.all().enumerate() {
            let _ = writeln!(prompt, "Conversation {}:", i + 1);
            for turn in conversation {
                let _ = writeln!(prompt, "{}: {}", turn.role, turn.content);
            }
            prompt.push('\n');
        }
    }

    let _ = writeln!(prompt, "Current question: {}", context.question);

    if !context.context_log.is_empty() {
        prompt.push_str("\nPrevious function results:\n");
        prompt.push_str(&context.context_log);
    }

    prompt.push_str("\nResponse:");
    prompt
}
