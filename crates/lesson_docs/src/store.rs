//! Template Store: loads the three templates and addresses their tables.

use lesson_core::{IntroFields, LessonError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::document::DocTemplate;
use crate::layout::{
    ANCHOR_CELL, INTRO_COURSE, INTRO_TABLE, INTRO_TEACHER, INTRO_UNIT, INTRO_WEEK, OutputKind,
    is_weekday,
};

/// Index of a table inside a [`DocTemplate`], in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRef(usize);

impl TableRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The three templates of one processing run.
///
/// Loaded fresh per run and passed explicitly between steps.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    pub lesson_plan: DocTemplate,
    pub assessment: DocTemplate,
    pub marking_guide: DocTemplate,
}

impl TemplateSet {
    pub fn get_mut(&mut self, kind: OutputKind) -> &mut DocTemplate {
        match kind {
            OutputKind::LessonPlan => &mut self.lesson_plan,
            OutputKind::Assessment => &mut self.assessment,
            OutputKind::MarkingGuide => &mut self.marking_guide,
        }
    }
}

/// Fixed template directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    template_dir: PathBuf,
}

impl TemplateStore {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn template_path(&self, kind: OutputKind) -> PathBuf {
        self.template_dir.join(kind.template_file_name())
    }

    pub fn load(&self, kind: OutputKind) -> Result<DocTemplate, LessonError> {
        DocTemplate::open(self.template_path(kind))
    }

    /// Open all three templates. Fails if any one is missing or unreadable.
    pub fn load_templates(&self) -> Result<TemplateSet, LessonError> {
        let set = TemplateSet {
            lesson_plan: self.load(OutputKind::LessonPlan)?,
            assessment: self.load(OutputKind::Assessment)?,
            marking_guide: self.load(OutputKind::MarkingGuide)?,
        };
        info!("Loaded templates from {}", self.template_dir.display());
        Ok(set)
    }
}

fn anchor_text(template: &DocTemplate, table: usize) -> Option<String> {
    template
        .cell_text(table, ANCHOR_CELL)
        .map(|t| t.trim().to_string())
}

/// For each candidate in order, the first table whose anchor cell matches it
/// (case-insensitive). Candidates without a table are skipped.
pub fn find_tables_by_anchor_text<S: AsRef<str>>(
    template: &DocTemplate,
    candidates: &[S],
) -> Vec<TableRef> {
    let anchors: Vec<Option<String>> = (0..template.table_count())
        .map(|i| anchor_text(template, i))
        .collect();

    candidates
        .iter()
        .filter_map(|candidate| {
            let wanted = candidate.as_ref().trim();
            let found = anchors.iter().position(|anchor| {
                anchor
                    .as_deref()
                    .is_some_and(|a| a.eq_ignore_ascii_case(wanted))
            });
            if found.is_none() {
                debug!("No table anchored at {wanted:?} in {}", template.path().display());
            }
            found.map(TableRef)
        })
        .collect()
}

/// Anchor texts of the day tables a template offers, in template order.
pub fn available_days(template: &DocTemplate) -> Vec<String> {
    (0..template.table_count())
        .filter_map(|i| anchor_text(template, i))
        .filter(|anchor| is_weekday(anchor))
        .collect()
}

/// Write teacher, course, unit and week into the introduction table.
pub fn write_intro_fields(
    template: &mut DocTemplate,
    fields: &IntroFields,
) -> Result<(), LessonError> {
    template.set_cell_text(INTRO_TABLE, INTRO_TEACHER, &fields.teacher)?;
    template.set_cell_text(INTRO_TABLE, INTRO_COURSE, &fields.course)?;
    template.set_cell_text(INTRO_TABLE, INTRO_UNIT, &fields.unit)?;
    template.set_cell_text(INTRO_TABLE, INTRO_WEEK, &fields.week)?;
    Ok(())
}

/// Serialize `template` to `output_path`, overwriting any existing file.
pub fn persist(template: &DocTemplate, output_path: &Path) -> Result<(), LessonError> {
    template.persist(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaffold::{lesson_plan_template, write_starter_templates};

    fn lesson_plan(days: &[&str]) -> DocTemplate {
        DocTemplate::from_docx("LESSON_PLAN_TEMPLATE.docx", lesson_plan_template(days))
    }

    fn sample_intro() -> IntroFields {
        IntroFields {
            teacher: "BEN".into(),
            course: "AP COMPUTER SCIENCE".into(),
            unit: "ONE DIMENSIONAL ARRAYS".into(),
            week: "19".into(),
        }
    }

    #[test]
    fn test_find_tables_follows_candidate_order() {
        let doc = lesson_plan(&["MONDAY", "TUESDAY", "WEDNESDAY"]);
        let found = find_tables_by_anchor_text(&doc, &["WEDNESDAY", "MONDAY"]);
        assert_eq!(found, vec![TableRef(4), TableRef(2)]);
    }

    #[test]
    fn test_find_tables_is_case_insensitive() {
        let doc = lesson_plan(&["Monday", "TUESDAY"]);
        let found = find_tables_by_anchor_text(&doc, &["monday", "Tuesday"]);
        assert_eq!(found.iter().map(|t| t.index()).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_find_tables_skips_missing_days() {
        let doc = lesson_plan(&["MONDAY", "FRIDAY"]);
        let found = find_tables_by_anchor_text(&doc, &["MONDAY", "THURSDAY", "FRIDAY"]);
        assert_eq!(found, vec![TableRef(2), TableRef(3)]);
        assert!(find_tables_by_anchor_text(&doc, &["SUNDAY"]).is_empty());
    }

    #[test]
    fn test_available_days_excludes_other_tables() {
        let doc = lesson_plan(&["MONDAY", "WEDNESDAY"]);
        assert_eq!(available_days(&doc), vec!["MONDAY", "WEDNESDAY"]);
    }

    #[test]
    fn test_load_templates_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(tmp.path());
        let err = store.load_templates().unwrap_err();
        match err {
            LessonError::FileAccess { path, .. } => {
                assert!(path.ends_with("LESSON_PLAN_TEMPLATE.docx"))
            }
            other => panic!("expected FileAccess, got {other:?}"),
        }
    }

    #[test]
    fn test_load_templates_one_missing_fails() {
        let tmp = tempfile::tempdir().unwrap();
        write_starter_templates(tmp.path()).unwrap();
        std::fs::remove_file(tmp.path().join("MARKING_GUIDE_TEMPLATE.docx")).unwrap();

        let err = TemplateStore::new(tmp.path()).load_templates().unwrap_err();
        assert!(matches!(err, LessonError::FileAccess { .. }));
    }

    #[test]
    fn test_intro_fields_round_trip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        write_starter_templates(tmp.path()).unwrap();
        let store = TemplateStore::new(tmp.path());
        let mut set = store.load_templates().unwrap();

        write_intro_fields(&mut set.lesson_plan, &sample_intro()).unwrap();
        // Persist over the template itself so a reload sees the values.
        persist(&set.lesson_plan, &store.template_path(OutputKind::LessonPlan)).unwrap();

        let reloaded = store.load_templates().unwrap();
        let doc = &reloaded.lesson_plan;
        assert_eq!(doc.cell_text(INTRO_TABLE, INTRO_TEACHER).as_deref(), Some("BEN"));
        assert_eq!(
            doc.cell_text(INTRO_TABLE, INTRO_COURSE).as_deref(),
            Some("AP COMPUTER SCIENCE")
        );
        assert_eq!(
            doc.cell_text(INTRO_TABLE, INTRO_UNIT).as_deref(),
            Some("ONE DIMENSIONAL ARRAYS")
        );
        assert_eq!(doc.cell_text(INTRO_TABLE, INTRO_WEEK).as_deref(), Some("19"));
        // Labels are left alone.
        assert_eq!(
            doc.cell_text(INTRO_TABLE, crate::layout::CellPos::new(0, 0)).as_deref(),
            Some("Teacher:")
        );
    }

    #[test]
    fn test_write_intro_fields_without_tables_fails() {
        let mut doc = DocTemplate::from_docx("empty.docx", docx_rs::Docx::new());
        let err = write_intro_fields(&mut doc, &sample_intro()).unwrap_err();
        assert!(matches!(err, LessonError::Population(_)));
    }
}
