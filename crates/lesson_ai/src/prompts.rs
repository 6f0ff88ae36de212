//! Prompt text for the two model calls: plan extraction from photos and the
//! per-day lesson body breakdown.

use std::ops::RangeInclusive;

use lesson_core::LessonPlanRecord;

/// Inclusive bounds on the number of stages a lesson body is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRange {
    pub min: u32,
    pub max: u32,
}

impl StageRange {
    pub fn contains(&self, count: u32) -> bool {
        (self.min..=self.max).contains(&count)
    }

    pub fn as_range(&self) -> RangeInclusive<u32> {
        self.min..=self.max
    }

    /// "5" or "6 to 8".
    pub fn describe(&self) -> String {
        if self.min == self.max {
            self.min.to_string()
        } else {
            format!("{} to {}", self.min, self.max)
        }
    }
}

/// How many stages a lesson of `minutes` should have.
pub fn stage_range(minutes: u32) -> StageRange {
    let (min, max) = match minutes {
        90.. => (6, 8),
        60..=89 => (5, 5),
        40..=59 => (3, 4),
        _ => (3, 3),
    };
    StageRange { min, max }
}

/// `60 minutes`, `60 minutes and 90 minutes`, `30 minutes, 60 minutes and 90 minutes`.
pub fn format_durations(durations: &[u32]) -> String {
    let parts: Vec<String> = durations.iter().map(|d| format!("{d} minutes")).collect();
    match parts.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

/// Instruction sent with the photos. One record per requested day.
pub fn render_lesson_plan_prompt(
    day_count: usize,
    question_count: u8,
    durations: &[u32],
) -> String {
    let plans = if day_count == 1 {
        "1 lesson plan".to_string()
    } else {
        format!("{day_count} lesson plans")
    };
    let durations = format_durations(durations);
    let [terminology, aims, introduction, body, duration, conclusion, assessment, answers] =
        LessonPlanRecord::FIELD_NAMES;

    format!(
        r#"I need {plans} according to provided images using Bloom's Taxonomy.
Design lesson plans for {durations} respectively.
Duration must be same as provided, adjust lesson plan according to time duration.

Identify the following items from all provided images:
- KEY CONCEPTS & TERMINOLOGY
- Aims and Objectives
- Introduction (Opening routines, warmer, topic lead-in etc.)
- Lesson Body (Stages, activities, focus etc.)
- Duration
- Conclusion (Closing routines & wrap up, e.g. homework setting, review, summary etc.)
- Assessment ({question_count} questions for students for assessment from the topic)
- Exact answers of assessment questions

Your response should start with JSON object.
Do not include any explanations, only provide {day_count} RFC8259 compliant JSON response following this format without deviation.
[{{"{terminology}": "key concepts and terminology separated by new line",
"{aims}": "Aims and objectives separated by new line. Each line should start with SWBAT",
"{introduction}": "opening routines, warmer, topic lead-in etc separated by new line",
"{body}": "stages, activities, focus etc and should be a bit long e.g 4 to 5 lines",
"{duration}": "lecture duration in minutes",
"{conclusion}": "closing routines & wrap up, e.g. homework setting, review, summary etc separated by new line",
"{assessment}": "{question_count} questions for students for assessment from the topic separated by new line",
"{answers}": "Exact answers of assessment questions separated by new line"}}]

Make sure that values must be in string.
Don't repeat terminologies for each day.
Don't change any key.
Don't forget to use Bloom's Taxonomy while creating lesson plans.
Don't forget any instruction mentioned above.
"#
    )
}

/// Instruction for splitting one lesson body into timed stages. Text only.
pub fn render_breakdown_prompt(raw_body: &str, duration_minutes: u32, activity: &str) -> String {
    let stages = stage_range(duration_minutes).describe();
    let activity = if activity.trim().is_empty() {
        "none supplied"
    } else {
        activity.trim()
    };

    format!(
        r#"Break the following lesson body into a timed lesson of {duration_minutes} minutes.
Use exactly {stages} stages. Each stage label should include its time allocation in minutes.
The teacher's planned activity is: {activity}

Lesson body:
{raw_body}

Respond with one RFC8259 compliant JSON object and nothing else, following this format without deviation:
{{"title": "short lesson title",
"duration": "{duration_minutes} minutes",
"focus": "the main learning focus in one sentence",
"materials": ["material one", "material two"],
"activity": "the planned activity",
"stages": [{{"stage": "stage label with minutes", "detail": "what the teacher and students do"}}]}}

Make sure that every value except materials and stages is a string.
"#
    )
}
