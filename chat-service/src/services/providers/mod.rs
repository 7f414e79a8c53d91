//! Completion provider abstraction.
//!
//! The chat flow depends on this trait for the next assistant message;
//! provider failures never propagate into the cache — the controller
//! substitutes a fallback reply instead.

pub mod groq;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ChatMessage;

/// Fallback assistant content substituted when the provider fails.
pub const COMPLETION_FALLBACK: &str = "No response";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Empty completion")]
    EmptyCompletion,

    #[error("Network error: {0}")]
    NetworkError(String),
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the next assistant message for an ordered conversation.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ProviderError>;
}
