use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every way a lesson-planning run can fail.
#[derive(Error, Debug)]
pub enum LessonError {
    #[error("File access error ({}): {message}", path.display())]
    FileAccess { path: PathBuf, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Population error: {0}")]
    Population(String),

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("Image error ({}): {message}", path.display())]
    Image { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Something the user supplied is missing or out of range.
    UserError,
    /// The model call failed or returned something unusable.
    ProviderError,
    /// Template or output file I/O, document structure.
    SystemError,
    /// Invalid or missing configuration.
    ConfigError,
}

impl ErrorCategory {
    /// Process exit status for a failed run in this category.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::SystemError => 1,
            Self::UserError => 2,
            Self::ConfigError => 3,
            Self::ProviderError => 4,
        }
    }

    pub fn is_user_error(self) -> bool {
        matches!(self, Self::UserError)
    }
}

impl LessonError {
    pub fn file_access(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::FileAccess {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn image(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::Image {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileAccess { .. } => ErrorCategory::SystemError,
            Self::Parse(_) => ErrorCategory::ProviderError,
            Self::Schema(_) => ErrorCategory::ProviderError,
            Self::Population(_) => ErrorCategory::SystemError,
            Self::Provider(_) => ErrorCategory::ProviderError,
            Self::Image { .. } => ErrorCategory::UserError,
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::InvalidInput(_) => ErrorCategory::UserError,
        }
    }

    /// Returns a user-friendly message.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileAccess { path, .. } => {
                format!(
                    "Could not access {}. Check that it exists and is writable.",
                    path.display()
                )
            }
            Self::Parse(_) => "The model did not return valid JSON. Try again.".into(),
            Self::Schema(msg) => format!("The model response was incomplete: {msg}"),
            Self::Population(msg) => format!("Could not fill the template: {msg}"),
            Self::Provider(msg) => format!("AI service error: {msg}"),
            Self::Image { path, .. } => format!("Could not read image {}", path.display()),
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::InvalidInput(msg) => msg.clone(),
        }
    }
}
