//! One processing run: templates in, three filled documents out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use lesson_ai::{AiProvider, LessonExtractor, OpenAIProvider, prepare_attachments};
use lesson_core::{LessonConfig, LessonError, LessonRequest, RecordField};
use lesson_docs::store::{find_tables_by_anchor_text, persist, write_intro_fields};
use lesson_docs::{
    OutputKind, TemplateStore, populate_assessment_or_marking_guide, populate_lesson_plan,
};

/// Shown when a run is started before any photo is supplied.
pub const NO_IMAGES_MESSAGE: &str = "Please upload images first";

/// Paths of the documents written by a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub lesson_plan: PathBuf,
    pub assessment: PathBuf,
    pub marking_guide: PathBuf,
}

impl GeneratedFiles {
    fn in_dir(dir: &Path) -> Self {
        Self {
            lesson_plan: dir.join(OutputKind::LessonPlan.output_file_name()),
            assessment: dir.join(OutputKind::Assessment.output_file_name()),
            marking_guide: dir.join(OutputKind::MarkingGuide.output_file_name()),
        }
    }

    pub fn get(&self, kind: OutputKind) -> &Path {
        match kind {
            OutputKind::LessonPlan => &self.lesson_plan,
            OutputKind::Assessment => &self.assessment,
            OutputKind::MarkingGuide => &self.marking_guide,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        OutputKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}

/// OpenAI provider built from the configured key, base URL and timeout.
pub fn openai_provider(config: &LessonConfig) -> Result<Arc<dyn AiProvider>, LessonError> {
    if !config.has_api_key() {
        return Err(LessonError::Config(format!(
            "{} is not set; export it before generating lesson plans",
            lesson_core::config::ENV_API_KEY
        )));
    }
    Ok(Arc::new(OpenAIProvider::with_base_url(
        config.openai_api_key.clone().unwrap_or_default(),
        config.openai_base_url.clone(),
        config.request_timeout_secs,
    )))
}

/// Handles shared by every step of a run.
pub struct Pipeline {
    store: TemplateStore,
    provider: Arc<dyn AiProvider>,
    config: LessonConfig,
}

impl Pipeline {
    pub fn new(store: TemplateStore, provider: Arc<dyn AiProvider>, config: LessonConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Validate, fill the introduction tables, extract, then populate and
    /// persist all three documents.
    ///
    /// The introduction tables are written and persisted before the image
    /// check, so a run without photos still leaves updated headers behind.
    pub async fn run(&self, request: &LessonRequest) -> Result<GeneratedFiles, LessonError> {
        request.validate()?;

        let mut templates = self.store.load_templates()?;
        let output_dir = self.output_dir();
        std::fs::create_dir_all(output_dir)
            .map_err(|e| LessonError::file_access(output_dir, e))?;
        let files = GeneratedFiles::in_dir(output_dir);

        for kind in OutputKind::ALL {
            let template = templates.get_mut(kind);
            write_intro_fields(template, &request.intro)?;
            persist(template, files.get(kind))?;
        }
        info!(
            "Introduction written for {} / {} (week {})",
            request.intro.course, request.intro.unit, request.intro.week
        );

        let day_tables =
            find_tables_by_anchor_text(&templates.lesson_plan, &request.day_names());
        info!(
            "Found {} of {} requested day tables",
            day_tables.len(),
            request.days.len()
        );

        if request.images.is_empty() {
            return Err(LessonError::InvalidInput(NO_IMAGES_MESSAGE.into()));
        }
        let attachments = prepare_attachments(&request.images)?;

        let extractor = LessonExtractor::new(Arc::clone(&self.provider), &self.config);
        let records = extractor
            .extract_lesson_plans(attachments, &request.days, request.question_count)
            .await?;

        let expander = extractor.body_expander();
        populate_lesson_plan(
            &mut templates.lesson_plan,
            &day_tables,
            &records,
            &request.days,
            &expander,
            &files.lesson_plan,
        )
        .await?;
        populate_assessment_or_marking_guide(
            &mut templates.assessment,
            &records,
            RecordField::Assessment,
            &files.assessment,
        )?;
        populate_assessment_or_marking_guide(
            &mut templates.marking_guide,
            &records,
            RecordField::Answers,
            &files.marking_guide,
        )?;

        info!("Run complete: {} record(s) written", records.len());
        Ok(files)
    }
}
