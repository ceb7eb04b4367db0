//! Conversation: a transcript bound to a model and a completion provider.

use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::message::{Message, Role, Transcript};
use crate::provider::{Provider, ProviderRequest};

/// One chat session: a transcript plus the engine that answers it.
///
/// Each user session owns its own instance; nothing here is global.
pub struct Conversation {
    id: String,
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: Option<u32>,
    transcript: Transcript,
}

impl Conversation {
    /// Create a conversation with an empty system prompt.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            provider,
            model: model.into(),
            max_tokens: None,
            transcript: Transcript::default(),
        }
    }

    /// Cap the number of tokens per completion.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Start with `prompt` as the system message.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.transcript.set_system_prompt(prompt);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Replace the system message; visible to every later completion.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.transcript.set_system_prompt(prompt);
    }

    /// Truncate the transcript back to the system message.
    pub fn reset(&mut self) {
        self.transcript.reset();
    }

    /// Append `content` as `role`, ask the model, record and return its reply.
    ///
    /// Only `history_len` messages go out (see [`Transcript::window`]).
    /// Transport errors are returned untouched; the appended message stays.
    pub async fn send(
        &mut self,
        role: Role,
        content: impl Into<String>,
        temperature: f32,
        history_len: NonZeroUsize,
    ) -> Result<String, ProviderError> {
        self.transcript.push(Message::new(role, content));

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: self.transcript.window(history_len),
            temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            conversation_id = %self.id,
            provider = self.provider.name(),
            outbound = request.messages.len(),
            transcript = self.transcript.len(),
            "Requesting completion"
        );

        let response = self.provider.complete(request).await?;
        let reply = response.message.content.trim().to_string();
        self.transcript.push(Message::assistant(&reply));
        Ok(reply)
    }
}
