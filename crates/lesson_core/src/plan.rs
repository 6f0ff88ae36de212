//! Domain types shared by the extractor, the populator, and the front end.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::LessonError;

/// Shortest lesson the form accepts, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 10;
pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 10;

// ---------------------------------------------------------------------------
// Model output
// ---------------------------------------------------------------------------

/// One lesson plan as returned by the model for a single day.
///
/// Every field is one or more newline-joined lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlanRecord {
    pub terminology: String,
    pub aims_and_objective: String,
    pub introduction: String,
    pub lesson_body: String,
    #[serde(alias = "Duration")]
    pub duration: String,
    pub conclusion: String,
    pub assessment: String,
    pub answers: String,
}

impl LessonPlanRecord {
    /// JSON keys the model is told to emit, in prompt order.
    pub const FIELD_NAMES: [&'static str; 8] = [
        "terminology",
        "aims_and_objective",
        "introduction",
        "lesson_body",
        "Duration",
        "conclusion",
        "assessment",
        "answers",
    ];
}

/// Which record field feeds a flat numbered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Assessment,
    Answers,
}

impl RecordField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::Answers => "answers",
        }
    }

    pub fn get(self, record: &LessonPlanRecord) -> &str {
        match self {
            Self::Assessment => &record.assessment,
            Self::Answers => &record.answers,
        }
    }
}

/// Timed decomposition of one lesson body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonBreakdown {
    pub title: String,
    pub duration: String,
    pub focus: String,
    pub materials: Vec<String>,
    pub activity: String,
    pub stages: Vec<LessonStage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonStage {
    pub stage: String,
    pub detail: String,
}

/// Turns a raw lesson body into a [`LessonBreakdown`].
///
/// Implemented over a model provider in `lesson_ai`; the populator only sees
/// this trait.
#[async_trait]
pub trait BodyExpander: Send + Sync {
    async fn expand(
        &self,
        raw_body: &str,
        duration_minutes: u32,
        activity: &str,
    ) -> Result<LessonBreakdown, LessonError>;
}

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// The four values of a template's introduction table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroFields {
    pub teacher: String,
    pub course: String,
    pub unit: String,
    pub week: String,
}

impl IntroFields {
    pub fn is_complete(&self) -> bool {
        [&self.teacher, &self.course, &self.unit, &self.week]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

/// One requested day of lessons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlot {
    /// Anchor text of the day's table, e.g. `MONDAY`.
    pub day: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub activity: String,
}

impl DaySlot {
    pub fn new(day: impl Into<String>, duration_minutes: u32, activity: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            duration_minutes,
            activity: activity.into(),
        }
    }
}

/// Everything one processing run needs from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRequest {
    pub intro: IntroFields,
    pub days: Vec<DaySlot>,
    pub question_count: u8,
    pub images: Vec<PathBuf>,
}

impl LessonRequest {
    /// Checks the required form fields. Images are not checked here: a request
    /// without images still updates the introduction tables.
    pub fn validate(&self) -> Result<(), LessonError> {
        if !self.intro.is_complete() || self.days.is_empty() {
            return Err(LessonError::InvalidInput("All fields are required".into()));
        }
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.question_count) {
            return Err(LessonError::InvalidInput(format!(
                "Question count must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {}",
                self.question_count
            )));
        }
        if let Some(slot) = self
            .days
            .iter()
            .find(|d| d.duration_minutes < MIN_DURATION_MINUTES)
        {
            return Err(LessonError::InvalidInput(format!(
                "Duration for {} must be at least {MIN_DURATION_MINUTES} minutes",
                slot.day
            )));
        }
        Ok(())
    }

    pub fn day_names(&self) -> Vec<String> {
        self.days.iter().map(|d| d.day.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> LessonRequest {
        LessonRequest {
            intro: IntroFields {
                teacher: "BEN".into(),
                course: "AP COMPUTER SCIENCE".into(),
                unit: "ONE DIMENSIONAL ARRAYS".into(),
                week: "19".into(),
            },
            days: vec![DaySlot::new("MONDAY", 60, "Pair programming")],
            question_count: 3,
            images: vec![],
        }
    }

    #[test]
    fn test_record_accepts_capitalised_duration_key() {
        let json = r#"{
            "terminology": "array",
            "aims_and_objective": "SWBAT declare an array",
            "introduction": "warmer",
            "lesson_body": "body",
            "Duration": "60 minutes",
            "conclusion": "review",
            "assessment": "q1",
            "answers": "a1"
        }"#;
        let record: LessonPlanRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.duration, "60 minutes");
    }

    #[test]
    fn test_record_field_selects_value() {
        let record = LessonPlanRecord {
            terminology: String::new(),
            aims_and_objective: String::new(),
            introduction: String::new(),
            lesson_body: String::new(),
            duration: String::new(),
            conclusion: String::new(),
            assessment: "What is an index?".into(),
            answers: "A position".into(),
        };
        assert_eq!(RecordField::Assessment.get(&record), "What is an index?");
        assert_eq!(RecordField::Answers.get(&record), "A position");
        assert_eq!(RecordField::Answers.key(), "answers");
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert!(sample_request().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_intro_field() {
        let mut req = sample_request();
        req.intro.week = "  ".into();
        let err = req.validate().unwrap_err();
        assert_eq!(err.user_message(), "All fields are required");
    }

    #[test]
    fn test_validate_rejects_no_days() {
        let mut req = sample_request();
        req.days.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_question_count_bounds() {
        let mut req = sample_request();
        req.question_count = 0;
        assert!(req.validate().is_err());
        req.question_count = 11;
        assert!(req.validate().is_err());
        req.question_count = 10;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_duration() {
        let mut req = sample_request();
        req.days.push(DaySlot::new("TUESDAY", 5, ""));
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("TUESDAY"));
    }
}
