//! Lesson body breakdown: one text-only call per day.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use lesson_core::{BodyExpander, LessonBreakdown, LessonError, LessonStage};

use crate::extract::sanitize_response;
use crate::prompts::{self, stage_range};
use crate::providers::AiProvider;
use crate::types::{ChatMessage, ChatRequest, MessageRole};

/// Decode a breakdown reply.
///
/// `duration` may come back as a number and `materials` as a single string;
/// both are normalised. The supplied `activity` replaces whatever the model
/// echoed. An empty or missing stage list is a schema error.
pub fn parse_breakdown(raw: &str, activity: &str) -> Result<LessonBreakdown, LessonError> {
    let cleaned = sanitize_response(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| LessonError::Parse(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(LessonError::Schema(
            "expected a JSON object for the lesson breakdown".into(),
        ));
    };

    let stages = match map.get("stages") {
        Some(Value::Array(items)) => items
            .iter()
            .map(stage_from_value)
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(LessonError::Schema(
                "lesson breakdown has no 'stages' list".into(),
            ));
        }
    };
    if stages.is_empty() {
        return Err(LessonError::Schema("lesson breakdown has no stages".into()));
    }

    let materials = match map.get("materials") {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) => s
            .split([',', '\n'])
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };

    Ok(LessonBreakdown {
        title: required_text(&map, "title")?,
        duration: required_text(&map, "duration")?,
        focus: required_text(&map, "focus")?,
        materials,
        activity: activity.trim().to_string(),
        stages,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_text(map: &Map<String, Value>, key: &str) -> Result<String, LessonError> {
    map.get(key)
        .and_then(scalar_text)
        .ok_or_else(|| LessonError::Schema(format!("lesson breakdown: missing field '{key}'")))
}

fn stage_from_value(value: &Value) -> Result<LessonStage, LessonError> {
    let Value::Object(map) = value else {
        return Err(LessonError::Schema("lesson stage is not an object".into()));
    };
    Ok(LessonStage {
        stage: required_text(map, "stage")?,
        detail: required_text(map, "detail")?,
    })
}

/// Ask `provider` to split `raw_body` into timed stages.
pub async fn expand_lesson_body(
    provider: &dyn AiProvider,
    model: &str,
    max_tokens: u32,
    raw_body: &str,
    duration_minutes: u32,
    activity: &str,
) -> Result<LessonBreakdown, LessonError> {
    let request = ChatRequest {
        messages: vec![ChatMessage::text(
            MessageRole::User,
            prompts::render_breakdown_prompt(raw_body, duration_minutes, activity),
        )],
        model: model.to_string(),
        max_tokens,
        temperature: None,
        system_prompt: None,
    };

    debug!("Expanding lesson body ({duration_minutes} min) with {model}");
    let response = provider.chat(&request).await?;
    let breakdown = parse_breakdown(&response.content, activity)?;

    let expected = stage_range(duration_minutes);
    let got = u32::try_from(breakdown.stages.len()).unwrap_or(u32::MAX);
    if !expected.contains(got) {
        warn!(
            "Breakdown for {duration_minutes} min has {got} stage(s), expected {}",
            expected.describe()
        );
    }
    Ok(breakdown)
}

/// [`BodyExpander`] backed by a model provider.
#[derive(Clone)]
pub struct LessonBodyExpander {
    provider: Arc<dyn AiProvider>,
    model: String,
    max_tokens: u32,
}

impl LessonBodyExpander {
    pub fn new(provider: Arc<dyn AiProvider>, model: String, max_tokens: u32) -> Self {
        Self {
            provider,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl BodyExpander for LessonBodyExpander {
    async fn expand(
        &self,
        raw_body: &str,
        duration_minutes: u32,
        activity: &str,
    ) -> Result<LessonBreakdown, LessonError> {
        expand_lesson_body(
            self.provider.as_ref(),
            &self.model,
            self.max_tokens,
            raw_body,
            duration_minutes,
            activity,
        )
        .await
    }
}
