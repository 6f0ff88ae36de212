use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TEMPLATE_DIR: &str = "LESSON_PLANNER_TEMPLATE_DIR";
pub const ENV_OUTPUT_DIR: &str = "LESSON_PLANNER_OUTPUT_DIR";
pub const ENV_MODEL: &str = "LESSON_PLANNER_MODEL";

// ---------------------------------------------------------------------------
// LessonConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.lesson_planner/config.json`.
///
/// The API key is **never** written to the JSON file; it comes from the
/// `OPENAI_API_KEY` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,

    // Models
    pub vision_model: String,
    pub text_model: String,
    /// Completion budget per requested lesson plan.
    pub max_tokens_per_plan: u32,
    pub breakdown_max_tokens: u32,
    pub request_timeout_secs: u64,

    // Files
    pub template_dir: PathBuf,
    pub output_dir: PathBuf,

    // General
    pub log_level: String,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            vision_model: "gpt-4o".into(),
            text_model: "gpt-4o-mini".into(),
            max_tokens_per_plan: 600,
            breakdown_max_tokens: 1024,
            request_timeout_secs: 120,
            template_dir: PathBuf::from("sample_templates"),
            output_dir: PathBuf::from("."),
            log_level: "info".into(),
        }
    }
}

impl LessonConfig {
    /// Returns the base config directory: `~/.lesson_planner/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".lesson_planner"))
    }

    /// Returns the config file path: `~/.lesson_planner/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.lesson_planner/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk (creating the default file if missing), then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path (the API key is excluded).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Applies environment-style overrides from `lookup`. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.openai_api_key = Some(key);
        }
        if let Some(dir) = get(ENV_TEMPLATE_DIR) {
            self.template_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.vision_model = model;
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}
