//! Error types for the autochat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each failure class of the agent has its own enum; the top-level
//! [`Error`] wraps them all.

use thiserror::Error;

/// The top-level error type for all autochat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion transport errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Structured output errors ---
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Repair(#[from] RepairExhausted),
}

/// The completion capability failed (network, auth, rate limit, bad status).
///
/// Never retried by the core; propagated to whoever called `send`.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Model output did not match the expected schema.
///
/// The message is meant to be pasted verbatim into a repair prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecodeError {
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every repair round failed to produce decodable output.
#[derive(Debug, Clone, Error)]
#[error(
    "Failed to repair with retries after {attempts} attempts.\nOriginal input: {original}\nLast attempted input: {last_candidate}\nLast error: {last_error}"
)]
pub struct RepairExhausted {
    /// The raw text the repairer was first handed.
    pub original: String,
    /// The last candidate the model produced.
    pub last_candidate: String,
    /// Decode error of the last candidate.
    pub last_error: DecodeError,
    /// Number of decode attempts made (initial + repaired).
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool is registered for the action tag the model chose.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool backend unavailable: {0}")]
    Backend(String),
}
