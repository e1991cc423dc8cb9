//! Interpretation of raw model output.
//!
//! A reply is a tool call when it contains a JSON object of the form
//! `{"function_call": {"name": ..., "arguments": {...}}}`, possibly wrapped
//! in prose or a code fence. Anything else, including malformed JSON, is
//! plain text.

use serde::{Deserialize, Serialize};

/// A tool call exactly as the model requested it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: serde_json::Value,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Text(String),
    ToolCall(ToolCall),
}

#[derive(Deserialize)]
struct Envelope {
    function_call: ToolCall,
}

pub fn parse_reply(raw: &str) -> ModelReply {
    let text = raw.trim();
    if text.to_ascii_lowercase().contains("function_call") {
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if end > start {
                if let Ok(envelope) = serde_json::from_str::<Envelope>(&text[start..=end]) {
                    return ModelReply::ToolCall(envelope.function_call);
                }
            }
        }
    }
    ModelReply::Text(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_text() {
        assert_eq!(
            parse_reply("  There are 3 users.  "),
            ModelReply::Text("There are 3 users.".into())
        );
    }

    #[test]
    fn bare_json_call() {
        let reply = parse_reply(
            r#"{"function_call": {"name": "query_sql", "arguments": {"text": "SELECT 1"}}}"#,
        );
        match reply {
            ModelReply::ToolCall(call) => {
                assert_eq!(call.name, "query_sql");
                assert_eq!(call.arguments["text"], "SELECT 1");
            }
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn fenced_call_with_prose() {
        let reply = parse_reply(
            "Sure, let me check.\n```json\n{\n  \"function_call\": {\n    \"name\": \"get_schema_info\",\n    \"arguments\": {}\n  }\n}\n```",
        );
        assert!(matches!(reply, ModelReply::ToolCall(call) if call.name == "get_schema_info"));
    }

    #[test]
    fn missing_arguments_default_to_empty_object() {
        let reply = parse_reply(r#"{"function_call": {"name": "get_schema_info"}}"#);
        match reply {
            ModelReply::ToolCall(call) => assert!(call.arguments.as_object().unwrap().is_empty()),
            other => panic!("expected tool call, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_degrades_to_text() {
        let raw = r#"{"function_call": {"name": "query_sql", "arguments": {"text": "SELECT 1"}"#;
        assert_eq!(parse_reply(raw), ModelReply::Text(raw.to_string()));
    }

    #[test]
    fn json_without_envelope_is_text() {
        let raw = r#"{"name": "query_sql", "note": "function_call missing"}"#;
        assert!(matches!(parse_reply(raw), ModelReply::Text(_)));
    }

    #[test]
    fn mention_without_braces_is_text() {
        assert!(matches!(
            parse_reply("I could use a function_call here but will not."),
            ModelReply::Text(_)
        ));
    }
}
