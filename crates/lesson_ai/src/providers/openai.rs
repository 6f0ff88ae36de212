//! OpenAI provider (GPT-4o and other vision-capable chat models).
//!
//! Uses raw `reqwest` with the OpenAI `/chat/completions` endpoint. Messages
//! that carry images are sent as content-part arrays (`text` + `image_url`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AiProvider, ProviderError};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, FinishReason, MessageRole, TokenUsage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// OpenAI API provider.
pub struct OpenAIProvider {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    ///
    /// Pass an empty string for `api_key` to create an unavailable provider.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.into(), REQUEST_TIMEOUT_SECS)
    }

    /// Create a provider with a custom base URL (useful for proxies / Azure).
    pub fn with_base_url(api_key: String, base_url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: if api_key.is_empty() {
                None
            } else {
                Some(api_key)
            },
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Returns `true` for reasoning models (o1, o3, o4) that don't accept
    /// `temperature` or standard `max_tokens`.
    fn is_reasoning_model(model: &str) -> bool {
        model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4")
    }

    /// Plain string content, or a content-part array when images are attached.
    fn message_content(message: &ChatMessage) -> serde_json::Value {
        if message.images.is_empty() {
            return serde_json::Value::String(message.content.clone());
        }

        let mut parts = Vec::with_capacity(message.images.len() + 1);
        parts.push(serde_json::json!({ "type": "text", "text": message.content }));
        for image in &message.images {
            parts.push(serde_json::json!({
                "type": "image_url",
                "image_url": { "url": image.data_url() }
            }));
        }
        serde_json::Value::Array(parts)
    }

    /// Convert generic messages to the OpenAI wire format.
    fn convert_messages(
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> Vec<OpenAIMessage> {
        let mut out = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system_prompt {
            out.push(OpenAIMessage {
                role: "system".into(),
                content: serde_json::Value::String(sys.to_string()),
            });
        }

        for m in messages {
            let role = match m.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            out.push(OpenAIMessage {
                role: role.into(),
                content: Self::message_content(m),
            });
        }

        out
    }

    /// Build the JSON request body.
    fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let is_reasoning = Self::is_reasoning_model(&request.model);

        OpenAIChatRequest {
            model: request.model.clone(),
            messages: Self::convert_messages(&request.messages, request.system_prompt.as_deref()),
            stream: false,
            // Reasoning models use `max_completion_tokens` instead.
            max_tokens: if is_reasoning {
                None
            } else {
                Some(request.max_tokens)
            },
            max_completion_tokens: if is_reasoning {
                Some(request.max_tokens)
            } else {
                None
            },
            temperature: if is_reasoning {
                None
            } else {
                request.temperature
            },
        }
    }

    /// Get the API key or return an error.
    fn require_key(&self) -> Result<&str, ProviderError> {
        self.api_key.as_deref().ok_or(ProviderError::InvalidKey)
    }

    /// Send a POST to the chat completions endpoint.
    async fn post_completions(
        &self,
        body: &OpenAIChatRequest,
    ) -> Result<reqwest::Response, ProviderError> {
        let key = self.require_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        // Map HTTP error codes to typed errors.
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::InvalidKey);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimit);
        }
        if status == reqwest::StatusCode::REQUEST_TIMEOUT
            || status == reqwest::StatusCode::GATEWAY_TIMEOUT
        {
            return Err(ProviderError::Timeout);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Other(format!("OpenAI API error {status}: {text}")));
        }

        Ok(resp)
    }

    /// Turn a decoded completion into a [`ChatResponse`].
    fn into_chat_response(data: ChatCompletionResponse) -> Result<ChatResponse, ProviderError> {
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Other("No choices in OpenAI response".into()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let usage = data
            .usage
            .map(|u| {
                let p = u.prompt_tokens.unwrap_or(0);
                let c = u.completion_tokens.unwrap_or(0);
                TokenUsage {
                    prompt_tokens: p,
                    completion_tokens: c,
                    total_tokens: u.total_tokens.unwrap_or(p + c),
                }
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            model: data.model,
            usage,
            finish_reason,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn is_available(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = self.build_body(request);
        debug!(
            "OpenAI request: model={} max_tokens={} images={}",
            request.model,
            request.max_tokens,
            request.image_count()
        );
        let resp = self.post_completions(&body).await?;

        let data: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Other(format!("JSON parse error: {e}")))?;

        Self::into_chat_response(data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageAttachment;

    fn sample_request(model: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::text(MessageRole::User, "Hello")],
            model: model.into(),
            max_tokens: 1200,
            temperature: Some(0.7),
            system_prompt: None,
        }
    }

    fn attachment() -> ImageAttachment {
        ImageAttachment {
            mime_type: "image/jpeg".into(),
            data_base64: "QUJD".into(),
        }
    }

    #[test]
    fn build_body_standard_model() {
        let provider = OpenAIProvider::new("sk-test".into());
        let body = provider.build_body(&sample_request("gpt-4o"));

        assert_eq!(body.model, "gpt-4o");
        assert_eq!(body.max_tokens, Some(1200));
        assert!(body.max_completion_tokens.is_none());
        assert_eq!(body.temperature, Some(0.7));
        assert!(!body.stream);
    }

    #[test]
    fn build_body_reasoning_model() {
        let provider = OpenAIProvider::new("sk-test".into());
        let body = provider.build_body(&sample_request("o3-mini"));

        assert!(body.max_tokens.is_none());
        assert_eq!(body.max_completion_tokens, Some(1200));
        assert!(body.temperature.is_none());
    }

    #[test]
    fn text_only_message_is_plain_string() {
        let provider = OpenAIProvider::new("sk-test".into());
        let json = serde_json::to_value(provider.build_body(&sample_request("gpt-4o"))).unwrap();

        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn image_message_becomes_content_parts() {
        let provider = OpenAIProvider::new("sk-test".into());
        let mut req = sample_request("gpt-4o");
        req.messages = vec![ChatMessage::user_with_images(
            "Plan this",
            vec![attachment(), attachment()],
        )];
        let json = serde_json::to_value(provider.build_body(&req)).unwrap();

        let parts = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "Plan this");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,QUJD");
    }

    #[test]
    fn system_prompt_is_prepended() {
        let provider = OpenAIProvider::new("sk-test".into());
        let mut req = sample_request("gpt-4o");
        req.system_prompt = Some("You are a teacher.".into());
        let body = provider.build_body(&req);

        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].role, "user");
    }

    #[test]
    fn completion_response_maps_fields() {
        let raw = r#"{
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"content": "[{}]"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let data: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let resp = OpenAIProvider::into_chat_response(data).unwrap();

        assert_eq!(resp.content, "[{}]");
        assert_eq!(resp.model, "gpt-4o-2024-08-06");
        assert_eq!(resp.finish_reason, FinishReason::Length);
        assert_eq!(resp.usage.total_tokens, 15);
    }

    #[test]
    fn completion_without_choices_is_error() {
        let data: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(OpenAIProvider::into_chat_response(data).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider =
            OpenAIProvider::with_base_url("k".into(), "http://localhost:8080/v1/".into(), 5);
        assert_eq!(provider.base_url, "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn is_available_depends_on_key() {
        assert!(OpenAIProvider::new("sk-test".into()).is_available().await);
        assert!(!OpenAIProvider::new(String::new()).is_available().await);
    }

    #[tokio::test]
    async fn chat_without_key_fails_before_network() {
        let provider = OpenAIProvider::new(String::new());
        let err = provider.chat(&sample_request("gpt-4o")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidKey));
    }
}
