//! Message and Transcript domain types.
//!
//! These are the value objects that flow between the chat front end,
//! the agent loop and the completion provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// An ordered transcript with a dedicated system slot.
///
/// The system message lives outside the history list, so there is always
/// exactly one and it always comes first in [`Transcript::messages`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    system: Message,
    history: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript whose system prompt is `system_prompt`.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            system: Message::system(system_prompt),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the system message. Never fails, never appends.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.updated_at = Utc::now();
        self.system = Message::system(prompt);
    }

    pub fn system_prompt(&self) -> &str {
        &self.system.content
    }

    /// Append a user or assistant message.
    ///
    /// A system message pushed here replaces the system slot instead.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        if message.role == Role::System {
            self.system = message;
        } else {
            self.history.push(message);
        }
    }

    /// Rewrite the content of history message `index` in place.
    ///
    /// Returns `false` when the index is out of range.
    pub fn set_content(&mut self, index: usize, content: impl Into<String>) -> bool {
        match self.history.get_mut(index) {
            Some(message) => {
                message.content = content.into();
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Drop every message except the system prompt.
    pub fn reset(&mut self) {
        self.updated_at = Utc::now();
        self.history.clear();
    }

    /// Non-system messages in conversation order.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// The full transcript, system message first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.system).chain(self.history.iter())
    }

    /// Total number of messages including the system message.
    pub fn len(&self) -> usize {
        self.history.len() + 1
    }

    /// A transcript always holds its system message, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The messages sent to the model for a window of `history_len`.
    ///
    /// The system message always takes the first slot; the remaining
    /// `history_len - 1` slots hold the most recent history messages.
    pub fn window(&self, history_len: NonZeroUsize) -> Vec<Message> {
        let tail = history_len.get() - 1;
        let start = self.history.len().saturating_sub(tail);
        let mut out = Vec::with_capacity(tail.min(self.history.len()) + 1);
        out.push(self.system.clone());
        out.extend(self.history[start..].iter().cloned());
        out
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new("")
    }
}
