//! Orchestration for the `lesson-planner` binary.

pub mod cli;
pub mod pipeline;

pub use pipeline::{GeneratedFiles, NO_IMAGES_MESSAGE, Pipeline, openai_provider};
