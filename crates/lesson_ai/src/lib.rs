pub mod expand;
pub mod extract;
pub mod image;
pub mod prompts;
pub mod providers;
pub mod types;

// Re-export core types at crate root for convenience.
pub use expand::{LessonBodyExpander, expand_lesson_body, parse_breakdown};
pub use extract::{LessonExtractor, parse_lesson_plans, sanitize_response};
pub use self::image::{ImageAttachment, prepare_attachment, prepare_attachments};
pub use prompts::{StageRange, stage_range};
pub use providers::openai::OpenAIProvider;
pub use providers::scripted::ScriptedProvider;
pub use providers::{AiProvider, ProviderError};
pub use types::*;
