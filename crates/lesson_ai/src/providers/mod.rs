//! AI provider trait and implementations.
//!
//! Each provider module exposes a struct that implements [`AiProvider`].

pub mod openai;
pub mod scripted;

use async_trait::async_trait;

use crate::types::{ChatRequest, ChatResponse};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that any provider may return.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited")]
    RateLimit,

    #[error("Invalid API key")]
    InvalidKey,

    #[error("Timeout")]
    Timeout,

    #[error("Provider error: {0}")]
    Other(String),
}

impl From<ProviderError> for lesson_core::LessonError {
    fn from(err: ProviderError) -> Self {
        lesson_core::LessonError::Provider(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Request/response interface to a language model. No streaming.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Human-readable display name.
    fn name(&self) -> &str;

    /// Whether the provider is configured well enough to accept requests.
    async fn is_available(&self) -> bool;

    /// Non-streaming completion.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}
