//! Bounded memory of completed conversations.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    /// Output of a tool invocation.
    Tool,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
            TurnRole::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Tool,
            content: content.into(),
        }
    }
}

/// One completed exchange, in order.
pub type Conversation = Vec<ConversationTurn>;

/// FIFO of the last `capacity` conversations.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    capacity: usize,
    conversations: VecDeque<Conversation>,
}

impl ConversationMemory {
    pub const DEFAULT_CAPACITY: usize = 5;

    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            conversations: VecDeque::with_capacity(capacity),
        }
    }

    /// Store a conversation, dropping the oldest when full.
    pub fn append(&mut self, conversation: Conversation) {
        if self.conversations.len() == self.capacity {
            self.conversations.pop_front();
        }
        self.conversations.push_back(conversation);
    }

    /// Stored conversations, oldest first.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Conversation> + '_ {
        self.conversations.iter()
    }

    pub fn clear(&mut self) {
        self.conversations.clear();
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(n: usize) -> Conversation {
        vec![
            ConversationTurn::user(format!("q{n}")),
            ConversationTurn::assistant(format!("a{n}")),
        ]
    }

    #[test]
    fn keeps_last_k_oldest_first() {
        let mut memory = ConversationMemory::new(3);
        for n in 1..=4 {
            memory.append(conversation(n));
        }
        assert_eq!(memory.len(), 3);
        let firsts: Vec<_> = memory.all().map(|c| c[0].content.as_str()).collect();
        assert_eq!(firsts, vec!["q2", "q3", "q4"]);
    }

    #[test]
    fn under_capacity_keeps_everything() {
        let mut memory = ConversationMemory::new(5);
        memory.append(conversation(1));
        memory.append(conversation(2));
        assert_eq!(memory.all().len(), 2);
    }

    #[test]
    fn clear_empties() {
        let mut memory = ConversationMemory::default();
        memory.append(conversation(1));
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.capacity(), ConversationMemory::DEFAULT_CAPACITY);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut memory = ConversationMemory::new(0);
        memory.append(conversation(1));
        memory.append(conversation(2));
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.all().next().unwrap()[0].content, "q2");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::tool("{}")).unwrap();
        assert!(json.contains("\"role\":\"tool\""));
    }
}
