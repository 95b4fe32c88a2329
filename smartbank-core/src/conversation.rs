//! Conversation data model
//!
//! A `Conversation` is the literal prompt history: turn order is the order the
//! model sees. Turns are owned by exactly one conversation; moving a
//! conversation between the active slot and the archive clones it.

use chrono::{DateTime, Local};
use llm::{ChatMessage, Role};

/// Preview length in characters, before the ellipsis.
const PREVIEW_CHARS: usize = 40;

/// One message in a conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// The `{role, content}` pair sent to the model.
    pub fn to_message(&self) -> ChatMessage {
        ChatMessage::new(self.role, self.content.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Every turn as a model message, oldest first.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns.iter().map(Turn::to_message).collect()
    }

    /// Sidebar preview: the first line of the first user turn (or of the
    /// first turn when nobody has spoken yet), cut at 40 characters.
    pub fn preview(&self) -> String {
        let source = self
            .turns
            .iter()
            .find(|t| t.role == Role::User)
            .or_else(|| self.turns.first())
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        let first_line = source.trim().split('\n').next().unwrap_or_default();
        if first_line.chars().count() > PREVIEW_CHARS {
            let cut: String = first_line.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", cut)
        } else {
            first_line.to_string()
        }
    }
}

impl FromIterator<Turn> for Conversation {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

/// A conversation moved to the session's history panel.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchivedConversation {
    pub id: i64,
    pub title: String,
    pub preview: String,
    pub archived_at: DateTime<Local>,
    pub conversation: Conversation,
}
