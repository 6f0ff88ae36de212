use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use lesson_ai::sanitize_response;
use lesson_app::cli::{Cli, Command, DaysArgs, GenerateArgs, InitTemplatesArgs, SanitizeArgs};
use lesson_app::{Pipeline, openai_provider};
use lesson_core::{ErrorCategory, LessonConfig, LessonError, logging};
use lesson_docs::scaffold::write_starter_templates;
use lesson_docs::store::available_days;
use lesson_docs::{OutputKind, TemplateStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, config_warning) = match LessonConfig::load() {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = LessonConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            (config, Some(e))
        }
    };

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.log_level.clone());
    let _log_guard = match logging::init_logging(&level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };
    info!("Starting lesson-planner v{VERSION}");
    if let Some(e) = config_warning {
        warn!("Could not load config, using defaults: {e:#}");
    }

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (message, code) = match err.downcast_ref::<LessonError>() {
                Some(lesson_err) => {
                    let category = lesson_err.category();
                    if category.is_user_error() {
                        warn!("{err:#}");
                    } else {
                        error!("[{category:?}] {err:#}");
                    }
                    (lesson_err.user_message(), category.exit_code())
                }
                None => {
                    error!("{err:#}");
                    (format!("{err:#}"), ErrorCategory::SystemError.exit_code())
                }
            };
            eprintln!("Error: {message}");
            ExitCode::from(code)
        }
    }
}

async fn run(command: Command, config: LessonConfig) -> Result<()> {
    match command {
        Command::Generate(args) => generate(args, config).await,
        Command::Days(args) => days(args, &config),
        Command::InitTemplates(args) => init_templates(args, &config),
        Command::Sanitize(args) => sanitize(args),
    }
}

async fn generate(args: GenerateArgs, mut config: LessonConfig) -> Result<()> {
    if let Some(dir) = &args.templates {
        config.template_dir = dir.clone();
    }
    if let Some(dir) = &args.output {
        config.output_dir = dir.clone();
    }
    if let Some(model) = &args.model {
        config.vision_model = model.clone();
    }

    let request = args.to_request();
    let provider = openai_provider(&config)?;
    let store = TemplateStore::new(config.template_dir.clone());
    let pipeline = Pipeline::new(store, provider, config);

    let files = pipeline.run(&request).await?;
    for path in files.iter() {
        println!("{}", path.display());
    }
    Ok(())
}

fn days(args: DaysArgs, config: &LessonConfig) -> Result<()> {
    let dir = args.templates.unwrap_or_else(|| config.template_dir.clone());
    let template = TemplateStore::new(dir).load(OutputKind::LessonPlan)?;
    for day in available_days(&template) {
        println!("{day}");
    }
    Ok(())
}

fn init_templates(args: InitTemplatesArgs, config: &LessonConfig) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| config.template_dir.clone());
    for path in write_starter_templates(&dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn sanitize(args: SanitizeArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    println!("{}", sanitize_response(&raw));
    Ok(())
}
