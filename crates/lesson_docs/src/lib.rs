// Template-backed document generation: lesson plan, assessment, marking guide.

pub mod document;
pub mod layout;
pub mod populate;
pub mod scaffold;
pub mod store;

pub use document::DocTemplate;
pub use layout::OutputKind;
pub use populate::{populate_assessment_or_marking_guide, populate_lesson_plan};
pub use store::{TableRef, TemplateSet, TemplateStore};
