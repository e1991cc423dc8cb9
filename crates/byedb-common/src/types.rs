use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the agent answers a question.
///
/// `Agent` lets the model call database tools; `Ask` forbids tool calls and
/// asks for a plain explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Mode {
    #[default]
    Agent,
    Ask,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Agent => write!(f, "agent"),
            Mode::Ask => write!(f, "ask"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Mode::Agent),
            "ask" => Ok(Mode::Ask),
            other => Err(format!("unknown mode '{other}' (expected agent or ask)")),
        }
    }
}

/// What the dispatcher does with a backend whose credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum AuthDeniedPolicy {
    /// Skip the backend for the rest of the current call only.
    #[default]
    Skip,
    /// Exclude the backend from every future selection.
    Disable,
}
