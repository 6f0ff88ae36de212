//! Content extraction: photos in, lesson-plan records out.

use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use lesson_core::{DaySlot, LessonConfig, LessonError, LessonPlanRecord};

use crate::expand::LessonBodyExpander;
use crate::image::ImageAttachment;
use crate::prompts;
use crate::providers::AiProvider;
use crate::types::{ChatMessage, ChatRequest};

/// Strip code fences from a model reply.
///
/// Every backtick and every literal `json` substring is removed, wherever it
/// occurs, and the result is trimmed. This also erases `json` inside values.
pub fn sanitize_response(raw: &str) -> String {
    raw.replace('`', "").replace("json", "").trim().to_string()
}

/// Sanitize and decode a reply into records.
///
/// Malformed JSON is a [`LessonError::Parse`]; JSON of the wrong shape (not an
/// array, an element that is not an object, a missing or non-string field) is
/// a [`LessonError::Schema`].
pub fn parse_lesson_plans(raw: &str) -> Result<Vec<LessonPlanRecord>, LessonError> {
    let cleaned = sanitize_response(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| LessonError::Parse(e.to_string()))?;

    let Value::Array(items) = value else {
        return Err(LessonError::Schema(
            "expected a JSON array of lesson plans".into(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| record_from_value(i, item))
        .collect()
}

fn record_from_value(index: usize, item: &Value) -> Result<LessonPlanRecord, LessonError> {
    let Value::Object(map) = item else {
        return Err(LessonError::Schema(format!(
            "lesson plan {index} is not an object"
        )));
    };

    let field = |key: &str| -> Result<String, LessonError> {
        match map.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(LessonError::Schema(format!(
                "lesson plan {index}: field '{key}' is not a string"
            ))),
            None => Err(LessonError::Schema(format!(
                "lesson plan {index}: missing field '{key}'"
            ))),
        }
    };

    let duration = if map.contains_key("Duration") {
        field("Duration")?
    } else {
        field("duration")?
    };

    Ok(LessonPlanRecord {
        terminology: field("terminology")?,
        aims_and_objective: field("aims_and_objective")?,
        introduction: field("introduction")?,
        lesson_body: field("lesson_body")?,
        duration,
        conclusion: field("conclusion")?,
        assessment: field("assessment")?,
        answers: field("answers")?,
    })
}

/// Drives both model calls over one provider.
#[derive(Clone)]
pub struct LessonExtractor {
    provider: Arc<dyn AiProvider>,
    vision_model: String,
    text_model: String,
    max_tokens_per_plan: u32,
    breakdown_max_tokens: u32,
}

impl LessonExtractor {
    pub fn new(provider: Arc<dyn AiProvider>, config: &LessonConfig) -> Self {
        Self {
            provider,
            vision_model: config.vision_model.clone(),
            text_model: config.text_model.clone(),
            max_tokens_per_plan: config.max_tokens_per_plan,
            breakdown_max_tokens: config.breakdown_max_tokens,
        }
    }

    /// Expander for the lesson body cells, sharing this extractor's provider.
    pub fn body_expander(&self) -> LessonBodyExpander {
        LessonBodyExpander::new(
            Arc::clone(&self.provider),
            self.text_model.clone(),
            self.breakdown_max_tokens,
        )
    }

    /// One vision call for all requested days.
    ///
    /// A reply with more or fewer records than `days` is returned as is; the
    /// populator fills whatever pairs up.
    pub async fn extract_lesson_plans(
        &self,
        images: Vec<ImageAttachment>,
        days: &[DaySlot],
        question_count: u8,
    ) -> Result<Vec<LessonPlanRecord>, LessonError> {
        let durations: Vec<u32> = days.iter().map(|d| d.duration_minutes).collect();
        let prompt = prompts::render_lesson_plan_prompt(days.len(), question_count, &durations);
        let day_count = u32::try_from(days.len()).unwrap_or(u32::MAX);

        let request = ChatRequest {
            messages: vec![ChatMessage::user_with_images(prompt, images)],
            model: self.vision_model.clone(),
            max_tokens: self.max_tokens_per_plan.saturating_mul(day_count.max(1)),
            temperature: None,
            system_prompt: None,
        };

        info!(
            "Requesting {} lesson plan(s) from {} ({}, {} image(s))",
            days.len(),
            self.provider.name(),
            request.model,
            request.image_count()
        );
        let response = self.provider.chat(&request).await?;
        let records = parse_lesson_plans(&response.content)?;

        if records.len() != days.len() {
            warn!(
                "Model returned {} lesson plan(s) for {} requested day(s)",
                records.len(),
                days.len()
            );
        }
        Ok(records)
    }
}
