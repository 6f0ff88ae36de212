//! Scripted provider for tests and offline runs.
//!
//! Answers come from a handler closure (or a fixed queue) instead of the
//! network; every request is recorded for later inspection.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use super::{AiProvider, ProviderError};
use crate::types::{ChatRequest, ChatResponse, FinishReason, TokenUsage};

type Handler = Box<dyn Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync>;

pub struct ScriptedProvider {
    handler: Handler,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Answer every request with `handler(request)`.
    pub fn with_handler(
        handler: impl Fn(&ChatRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer requests with `responses` in order; errors once they run out.
    pub fn from_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(responses.into_iter().map(Into::into).collect());
        Self::with_handler(move |_| {
            queue
                .lock()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("ScriptedProvider: no response left".into()))
        })
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().push(request.clone());
        let content = (self.handler)(request)?;
        Ok(ChatResponse {
            content,
            model: request.model.clone(),
            usage: TokenUsage::default(),
            finish_reason: FinishReason::Stop,
        })
    }
}
