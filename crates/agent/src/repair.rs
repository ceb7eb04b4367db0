//! Structured-output repair.
//!
//! Model output that fails to decode is sent back to the model, together
//! with the schema and the decode error, and the reply is decoded again.
//! Each repair call runs in its own short-lived conversation so the
//! caller's transcript never sees the fix-up traffic.

use std::num::NonZeroUsize;
use std::sync::Arc;

use autochat_core::conversation::Conversation;
use autochat_core::error::{ProviderError, RepairExhausted};
use autochat_core::message::Role;
use autochat_core::provider::Provider;
use autochat_core::schema::OutputSchema;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompts;

/// Why [`StructuredOutputRepairer::parse`] gave up.
#[derive(Debug, Error)]
pub enum RepairError {
    /// A repair request could not be completed.
    #[error(transparent)]
    Transport(#[from] ProviderError),

    /// Every attempt produced output that still failed to decode.
    #[error(transparent)]
    Exhausted(#[from] RepairExhausted),
}

impl From<RepairError> for autochat_core::Error {
    fn from(err: RepairError) -> Self {
        match err {
            RepairError::Transport(e) => e.into(),
            RepairError::Exhausted(e) => e.into(),
        }
    }
}

/// A successfully decoded value.
#[derive(Debug, Clone)]
pub struct Repaired<T> {
    pub value: T,
    /// The text that finally decoded.
    pub text: String,
    /// Decode attempts made, the first one included.
    pub decode_attempts: u32,
}

impl<T> Repaired<T> {
    /// Whether the value needed at least one repair round.
    pub fn was_repaired(&self) -> bool {
        self.decode_attempts > 1
    }
}

/// Decodes model text into a schema, asking the model to fix failures.
pub struct StructuredOutputRepairer {
    provider: Arc<dyn Provider>,
    model: String,
    max_retries: u32,
    temperature: f32,
    history_len: NonZeroUsize,
}

impl StructuredOutputRepairer {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_retries: Self::DEFAULT_MAX_RETRIES,
            temperature: Self::DEFAULT_TEMPERATURE,
            history_len: NonZeroUsize::new(15).unwrap_or(NonZeroUsize::MIN),
        }
    }

    /// Repair rounds allowed after the first decode fails.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_history_len(mut self, len: NonZeroUsize) -> Self {
        self.history_len = len;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decode `raw` with the configured retry budget.
    pub async fn parse<T>(&self, raw: &str, schema: &OutputSchema<T>) -> Result<Repaired<T>, RepairError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        self.parse_with_retries(raw, schema, self.max_retries).await
    }

    /// Decode `raw`, making at most `max_retries` repair requests.
    ///
    /// A model that never produces valid output costs exactly
    /// `max_retries` requests and `max_retries + 1` decodes.
    pub async fn parse_with_retries<T>(
        &self,
        raw: &str,
        schema: &OutputSchema<T>,
        max_retries: u32,
    ) -> Result<Repaired<T>, RepairError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        let schema_text = schema.to_pretty_string();
        let mut fixer: Option<Conversation> = None;
        let mut candidate = raw.to_string();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match schema.decode(&candidate) {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "Model output repaired");
                    }
                    return Ok(Repaired {
                        value,
                        text: candidate,
                        decode_attempts: attempts,
                    });
                }
                Err(error) => error,
            };

            let repairs_made = attempts - 1;
            if repairs_made >= max_retries {
                warn!(attempts, error = %error, "Giving up on model output");
                return Err(RepairExhausted {
                    original: raw.to_string(),
                    last_candidate: candidate,
                    last_error: error,
                    attempts,
                }
                .into());
            }

            warn!(
                attempt = attempts,
                max_retries,
                error = %error,
                candidate = %candidate,
                "Model output failed to decode, requesting a fix"
            );

            let conversation = fixer.get_or_insert_with(|| {
                Conversation::new(self.provider.clone(), self.model.clone())
                    .with_system_prompt(prompts::REPAIR_SYSTEM_PROMPT)
            });
            candidate = conversation
                .send(
                    Role::User,
                    prompts::fix_request(&schema_text, &candidate, &error.message),
                    self.temperature,
                    self.history_len,
                )
                .await?;
        }
    }
}
