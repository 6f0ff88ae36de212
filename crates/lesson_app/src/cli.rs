//! Command-line arguments for `lesson-planner`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use lesson_core::{DaySlot, IntroFields, LessonRequest};

/// Generate lesson plan, assessment and marking guide documents from photos
/// of instructional material.
#[derive(Parser, Debug)]
#[command(name = "lesson-planner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fill the three templates from uploaded photos.
    Generate(GenerateArgs),

    /// List the day tables offered by the lesson plan template.
    Days(DaysArgs),

    /// Write starter templates that match the expected table layout.
    InitTemplates(InitTemplatesArgs),

    /// Print the sanitized form of a saved model response.
    Sanitize(SanitizeArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long)]
    pub teacher: String,

    #[arg(long)]
    pub course: String,

    #[arg(long)]
    pub unit: String,

    #[arg(long)]
    pub week: String,

    /// Day to plan, as DAY:MINUTES or DAY:MINUTES:ACTIVITY. Repeat per day.
    #[arg(
        long = "day",
        value_name = "DAY:MINUTES[:ACTIVITY]",
        value_parser = parse_day_slot,
        required = true
    )]
    pub days: Vec<DaySlot>,

    /// Assessment questions per lesson.
    #[arg(long, default_value_t = 5)]
    pub questions: u8,

    /// Directory holding the three template files.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Directory the generated documents are written to.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Vision model used for extraction.
    #[arg(long)]
    pub model: Option<String>,

    /// Photos of the instructional material (PNG or JPEG).
    #[arg(value_name = "IMAGE")]
    pub images: Vec<PathBuf>,
}

impl GenerateArgs {
    pub fn to_request(&self) -> LessonRequest {
        LessonRequest {
            intro: IntroFields {
                teacher: self.teacher.clone(),
                course: self.course.clone(),
                unit: self.unit.clone(),
                week: self.week.clone(),
            },
            days: self.days.clone(),
            question_count: self.questions,
            images: self.images.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct DaysArgs {
    #[arg(long)]
    pub templates: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InitTemplatesArgs {
    /// Target directory (defaults to the configured template directory).
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SanitizeArgs {
    pub file: PathBuf,
}

/// `MONDAY:60` or `monday:45:Group quiz`. The day is upper-cased to match
/// template anchors; the activity may itself contain colons.
pub fn parse_day_slot(raw: &str) -> Result<DaySlot, String> {
    let mut parts = raw.splitn(3, ':');
    let day = parts.next().map(str::trim).unwrap_or_default();
    if day.is_empty() {
        return Err(format!("missing day name in '{raw}'"));
    }
    let minutes = parts
        .next()
        .ok_or_else(|| format!("missing duration in '{raw}', expected DAY:MINUTES"))?
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid duration in '{raw}': {e}"))?;
    let activity = parts.next().map(str::trim).unwrap_or_default();

    Ok(DaySlot::new(day.to_uppercase(), minutes, activity))
}
