//! # autochat core
//!
//! Domain types, traits, and error definitions for the autochat assistant.
//! This crate knows nothing about HTTP or Todoist. It defines the model
//! that the provider, tool and agent crates implement against.
//!
//! - [`Transcript`] / [`Conversation`]: role-tagged history with a
//!   dedicated system slot, and the "append and complete" operation.
//! - [`Provider`]: the completion capability.
//! - [`Action`] / [`ReactResponse`]: the closed set of agent actions.
//! - [`OutputSchema`]: schema derivation and decoding of model output.
//! - [`Tool`] / [`ToolRegistry`]: side-effecting operations keyed by action tag.

pub mod action;
pub mod conversation;
pub mod error;
pub mod message;
pub mod provider;
pub mod schema;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use action::{Action, ReactResponse};
pub use conversation::Conversation;
pub use error::{DecodeError, Error, ProviderError, RepairExhausted, ToolError};
pub use message::{Message, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use schema::OutputSchema;
pub use tool::{Tool, ToolRegistry, ToolResult};
