pub mod config;
pub mod error;
pub mod logging;
pub mod plan;

pub use config::LessonConfig;
pub use error::{ErrorCategory, LessonError};
pub use plan::{
    BodyExpander, DaySlot, IntroFields, LessonBreakdown, LessonPlanRecord, LessonRequest,
    LessonStage, MAX_QUESTIONS, MIN_DURATION_MINUTES, MIN_QUESTIONS, RecordField,
};
