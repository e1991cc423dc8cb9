//! SQL text helpers: statement splitting and read-only classification.
//!
//! These operate on raw text only. They understand quoting and comments
//! well enough to split scripts the model writes, not full SQL grammar.

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Code,
    Quoted(char),
    Bracket,
    LineComment,
    BlockComment,
}

/// Split `sql` on top-level `;`, dropping empty and comment-only pieces.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut state = Scan::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Scan::Code => match c {
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                    continue;
                }
                '\'' | '"' | '`' => {
                    state = Scan::Quoted(c);
                    has_code = true;
                }
                '[' => {
                    state = Scan::Bracket;
                    has_code = true;
                }
                '-' if chars.peek() == Some(&'-') => state = Scan::LineComment,
                '/' if chars.peek() == Some(&'*') => state = Scan::BlockComment,
                c if !c.is_whitespace() => has_code = true,
                _ => {}
            },
            Scan::Quoted(q) => {
                // A doubled quote is an escaped quote; the scanner re-enters the
                // quoted state on the second character.
                if c == q {
                    state = Scan::Code;
                }
            }
            Scan::Bracket => {
                if c == ']' {
                    state = Scan::Code;
                }
            }
            Scan::LineComment => {
                if c == '\n' {
                    state = Scan::Code;
                }
            }
            Scan::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = Scan::Code;
                    continue;
                }
            }
        }
        current.push(c);
    }

    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}

/// Strip leading whitespace, comments and opening parentheses.
fn strip_leading_noise(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start().trim_start_matches('(');
        if let Some(rest) = trimmed.strip_prefix("--") {
            s = rest.split_once('\n').map(|(_, tail)| tail).unwrap_or("");
        } else if let Some(rest) = trimmed.strip_prefix("/*") {
            s = rest.split_once("*/").map(|(_, tail)| tail).unwrap_or("");
        } else {
            return trimmed;
        }
    }
}

fn first_keyword(statement: &str) -> String {
    strip_leading_noise(statement)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

fn words(statement: &str) -> impl Iterator<Item = String> + '_ {
    statement
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_uppercase())
}

/// Pragmas that only describe the schema. Every other pragma may change
/// settings or data, including the `PRAGMA name(value)` call form.
const INTROSPECTION_PRAGMAS: &[&str] = &[
    "table_info",
    "table_xinfo",
    "index_list",
    "index_info",
    "foreign_key_list",
];

/// Name of the pragma in `PRAGMA [schema.]name ...`, lowercased.
fn pragma_name(statement: &str) -> Option<String> {
    let rest = strip_leading_noise(statement).get("PRAGMA".len()..)?;
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect();
    let name = name.rsplit('.').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_ascii_lowercase())
}

const WRITE_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "CREATE", "DROP", "ALTER", "ATTACH", "DETACH",
    "VACUUM", "REINDEX",
];

/// Whether a single statement only reads data.
fn statement_is_read_only(statement: &str) -> bool {
    match first_keyword(statement).as_str() {
        "SELECT" | "VALUES" | "EXPLAIN" => true,
        "WITH" => !words(statement).any(|w| WRITE_KEYWORDS.contains(&w.as_str())),
        "PRAGMA" => pragma_name(statement)
            .is_some_and(|name| INTROSPECTION_PRAGMAS.contains(&name.as_str())),
        _ => false,
    }
}

/// True when every statement in `sql` only reads data. Empty input is not
/// considered read-only.
pub fn is_read_only(sql: &str) -> bool {
    let statements = split_statements(sql);
    !statements.is_empty() && statements.iter().all(|s| statement_is_read_only(s))
}

/// Whether executing `statement` yields a row set.
pub(crate) fn returns_rows(statement: &str) -> bool {
    statement_is_read_only(statement)
        || first_keyword(statement) == "PRAGMA"
        || words(statement).any(|w| w == "RETURNING")
}
