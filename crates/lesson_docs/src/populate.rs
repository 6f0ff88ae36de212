//! Table Populator: writes model output into the loaded templates.

use docx_rs::Paragraph;
use lesson_core::{
    BodyExpander, DaySlot, LessonBreakdown, LessonError, LessonPlanRecord, MIN_DURATION_MINUTES,
    RecordField,
};
use std::path::Path;
use tracing::{info, warn};

use crate::document::{DocTemplate, bold_paragraph, labelled_paragraph, text_paragraph};
use crate::layout::{
    DAY_AIMS, DAY_CONCLUSION, DAY_INTRODUCTION, DAY_LESSON_BODY, TERMINOLOGY_CELL,
    TERMINOLOGY_TABLE,
};
use crate::store::TableRef;

/// Fill the day tables of the lesson plan and persist it to `output`.
///
/// Table `i` receives record `i`. Tables without a record, and records without
/// a table, are left alone; a count mismatch is logged but is not an error.
pub async fn populate_lesson_plan(
    doc: &mut DocTemplate,
    day_tables: &[TableRef],
    records: &[LessonPlanRecord],
    days: &[DaySlot],
    expander: &dyn BodyExpander,
    output: &Path,
) -> Result<(), LessonError> {
    if day_tables.len() != records.len() {
        warn!(
            "{} day tables but {} lesson plan records; only {} will be filled",
            day_tables.len(),
            records.len(),
            day_tables.len().min(records.len())
        );
    }

    let mut terminology = String::new();
    for (i, table) in day_tables.iter().enumerate() {
        let Some(record) = records.get(i) else {
            continue;
        };
        let table = table.index();

        terminology.push_str(&record.terminology);
        terminology.push('\n');

        doc.set_cell_text(table, DAY_AIMS, &record.aims_and_objective)?;
        doc.set_cell_text(table, DAY_INTRODUCTION, &record.introduction)?;
        doc.set_cell_text(table, DAY_CONCLUSION, &record.conclusion)?;

        let (duration, activity) = match days.get(i) {
            Some(slot) => (slot.duration_minutes, slot.activity.as_str()),
            None => (parse_minutes(&record.duration), ""),
        };
        let breakdown = expander
            .expand(&record.lesson_body, duration, activity)
            .await?;
        doc.set_cell_paragraphs(table, DAY_LESSON_BODY, render_breakdown(&breakdown))?;
    }

    doc.set_cell_text(TERMINOLOGY_TABLE, TERMINOLOGY_CELL, &terminology)?;
    doc.persist(output)?;
    info!("Lesson plan written to {}", output.display());
    Ok(())
}

/// Append the named field of every record as numbered paragraphs and persist
/// the document to `output`.
pub fn populate_assessment_or_marking_guide(
    doc: &mut DocTemplate,
    records: &[LessonPlanRecord],
    field: RecordField,
    output: &Path,
) -> Result<(), LessonError> {
    let lines = numbered_lines(records, field);
    for line in &lines {
        doc.append_paragraph(text_paragraph(line));
    }
    doc.persist(output)?;
    info!(
        "{} numbered {} lines written to {}",
        lines.len(),
        field.key(),
        output.display()
    );
    Ok(())
}

/// `"1. ..."`, `"2. ..."` for every line of `field` across records.
///
/// Blank fragments at the end of the combined text are dropped; blank lines
/// between questions keep their number.
pub fn numbered_lines(records: &[LessonPlanRecord], field: RecordField) -> Vec<String> {
    let mut combined = String::new();
    for record in records {
        let text = field.get(record);
        combined.push_str(text);
        if !text.ends_with('\n') {
            combined.push('\n');
        }
    }

    let mut lines: Vec<&str> = combined
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .collect()
}

/// Bold label / value paragraph pairs, then one `Stage N - <label>: <detail>`
/// paragraph per stage.
pub fn render_breakdown(breakdown: &LessonBreakdown) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let scalar_fields = [
        ("Title", breakdown.title.clone()),
        ("Duration", breakdown.duration.clone()),
        ("Focus", breakdown.focus.clone()),
        ("Materials", breakdown.materials.join(", ")),
        ("Activity", breakdown.activity.clone()),
    ];
    for (label, value) in scalar_fields {
        paragraphs.push(bold_paragraph(&format!("{label}:")));
        paragraphs.push(text_paragraph(&value));
    }

    paragraphs.push(bold_paragraph("Stages:"));
    for (i, stage) in breakdown.stages.iter().enumerate() {
        let label = format!("Stage {} - {}: ", i + 1, stage.stage);
        paragraphs.push(labelled_paragraph(&label, &stage.detail));
    }
    paragraphs
}

/// Leading integer of a duration string such as `"45 minutes"`.
fn parse_minutes(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse()
        .map_or(MIN_DURATION_MINUTES, |m: u32| m.max(MIN_DURATION_MINUTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ANCHOR_CELL, CellPos};
    use crate::scaffold::{flat_template, lesson_plan_template};
    use crate::store::find_tables_by_anchor_text;
    use async_trait::async_trait;
    use lesson_core::LessonStage;
    use std::sync::Mutex;

    /// Returns one stage per `duration / 15` minutes and remembers its calls.
    #[derive(Default)]
    struct CountingExpander {
        calls: Mutex<Vec<(String, u32, String)>>,
    }

    #[async_trait]
    impl BodyExpander for CountingExpander {
        async fn expand(
            &self,
            raw_body: &str,
            duration_minutes: u32,
            activity: &str,
        ) -> Result<LessonBreakdown, LessonError> {
            self.calls.lock().unwrap().push((
                raw_body.to_string(),
                duration_minutes,
                activity.to_string(),
            ));
            let stages = (1..=duration_minutes / 15)
                .map(|n| LessonStage {
                    stage: format!("Part {n}"),
                    detail: format!("detail {n}"),
                })
                .collect();
            Ok(LessonBreakdown {
                title: "Arrays".into(),
                duration: format!("{duration_minutes} minutes"),
                focus: "Indexing".into(),
                materials: vec!["Laptop".into(), "Worksheet".into()],
                activity: activity.to_string(),
                stages,
            })
        }
    }

    struct FailingExpander;

    #[async_trait]
    impl BodyExpander for FailingExpander {
        async fn expand(&self, _: &str, _: u32, _: &str) -> Result<LessonBreakdown, LessonError> {
            Err(LessonError::Parse("expected value at line 1 column 1".into()))
        }
    }

    fn record(n: usize) -> LessonPlanRecord {
        LessonPlanRecord {
            terminology: format!("term {n}"),
            aims_and_objective: format!("SWBAT aim {n}"),
            introduction: format!("intro {n}"),
            lesson_body: format!("body {n}"),
            duration: "45 minutes".into(),
            conclusion: format!("conclusion {n}"),
            assessment: format!("q{n}"),
            answers: format!("a{n}"),
        }
    }

    fn slots(days: &[&str]) -> Vec<DaySlot> {
        days.iter()
            .map(|d| DaySlot::new(*d, 60, format!("{d} activity")))
            .collect()
    }

    #[tokio::test]
    async fn test_populates_only_tables_with_records() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("lesson_plan.docx");
        let days = ["MONDAY", "TUESDAY", "WEDNESDAY"];
        let mut doc = DocTemplate::from_docx("lp.docx", lesson_plan_template(&days));
        let tables = find_tables_by_anchor_text(&doc, &days);
        let expander = CountingExpander::default();

        populate_lesson_plan(
            &mut doc,
            &tables,
            &[record(1), record(2)],
            &slots(&days),
            &expander,
            &out,
        )
        .await
        .unwrap();

        let reopened = DocTemplate::open(&out).unwrap();
        let monday = tables[0].index();
        let wednesday = tables[2].index();
        assert_eq!(
            reopened.cell_text(monday, DAY_AIMS).as_deref(),
            Some("SWBAT aim 1")
        );
        assert_eq!(
            reopened.cell_text(tables[1].index(), DAY_CONCLUSION).as_deref(),
            Some("conclusion 2")
        );
        // Third table untouched.
        for pos in [DAY_AIMS, DAY_INTRODUCTION, DAY_LESSON_BODY, DAY_CONCLUSION] {
            assert_eq!(reopened.cell_text(wednesday, pos).as_deref(), Some(""));
        }
        assert_eq!(
            reopened.cell_text(wednesday, ANCHOR_CELL).as_deref(),
            Some("WEDNESDAY")
        );
        assert_eq!(
            reopened.cell_text(TERMINOLOGY_TABLE, TERMINOLOGY_CELL).as_deref(),
            Some("term 1\nterm 2\n")
        );
        assert_eq!(expander.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_extra_records_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("lesson_plan.docx");
        let mut doc = DocTemplate::from_docx("lp.docx", lesson_plan_template(&["MONDAY"]));
        let tables = find_tables_by_anchor_text(&doc, &["MONDAY"]);
        let expander = CountingExpander::default();

        populate_lesson_plan(
            &mut doc,
            &tables,
            &[record(1), record(2), record(3)],
            &slots(&["MONDAY"]),
            &expander,
            &out,
        )
        .await
        .unwrap();

        assert_eq!(expander.calls.lock().unwrap().len(), 1);
        assert_eq!(
            doc.cell_text(TERMINOLOGY_TABLE, TERMINOLOGY_CELL).as_deref(),
            Some("term 1\n")
        );
    }

    #[tokio::test]
    async fn test_lesson_body_cell_renders_breakdown() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("lesson_plan.docx");
        let mut doc = DocTemplate::from_docx("lp.docx", lesson_plan_template(&["MONDAY"]));
        let tables = find_tables_by_anchor_text(&doc, &["MONDAY"]);
        let expander = CountingExpander::default();

        populate_lesson_plan(
            &mut doc,
            &tables,
            &[record(1)],
            &slots(&["MONDAY"]),
            &expander,
            &out,
        )
        .await
        .unwrap();

        let calls = expander.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            ("body 1".to_string(), 60, "MONDAY activity".to_string())
        );

        let body = doc.cell_text(tables[0].index(), DAY_LESSON_BODY).unwrap();
        assert!(body.starts_with("Title:\nArrays\nDuration:\n60 minutes"));
        assert!(body.contains("Materials:\nLaptop, Worksheet"));
        assert!(body.contains("Activity:\nMONDAY activity"));
        for n in 1..=4 {
            assert!(
                body.contains(&format!("Stage {n} - Part {n}: detail {n}")),
                "{body}"
            );
        }
        assert!(!body.contains("Stage 5"));
    }

    #[tokio::test]
    async fn test_expander_failure_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("lesson_plan.docx");
        let mut doc = DocTemplate::from_docx("lp.docx", lesson_plan_template(&["MONDAY"]));
        let tables = find_tables_by_anchor_text(&doc, &["MONDAY"]);

        let err = populate_lesson_plan(
            &mut doc,
            &tables,
            &[record(1)],
            &slots(&["MONDAY"]),
            &FailingExpander,
            &out,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LessonError::Parse(_)));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_short_day_table_is_population_error() {
        use docx_rs::{Docx, Table, TableCell, TableRow};

        let cell = |t: &str| TableCell::new().add_paragraph(text_paragraph(t));
        let docx = Docx::new()
            .add_table(Table::new(vec![TableRow::new(vec![cell("intro")])]))
            .add_table(Table::new(vec![TableRow::new(vec![cell("terms")])]))
            .add_table(Table::new(vec![TableRow::new(vec![
                cell("MONDAY"),
                cell(""),
            ])]));
        let mut doc = DocTemplate::from_docx("broken.docx", docx);
        let tables = find_tables_by_anchor_text(&doc, &["MONDAY"]);
        let tmp = tempfile::tempdir().unwrap();

        let err = populate_lesson_plan(
            &mut doc,
            &tables,
            &[record(1)],
            &slots(&["MONDAY"]),
            &CountingExpander::default(),
            &tmp.path().join("out.docx"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LessonError::Population(_)));
    }

    #[test]
    fn test_numbered_lines_across_records() {
        let mut first = record(1);
        first.assessment = "q1\nq2".into();
        let mut second = record(2);
        second.assessment = "q3".into();

        assert_eq!(
            numbered_lines(&[first, second], RecordField::Assessment),
            vec!["1. q1", "2. q2", "3. q3"]
        );
    }

    #[test]
    fn test_numbered_lines_drops_trailing_empty_fragments() {
        let mut first = record(1);
        first.answers = "a1\n".into();
        let mut second = record(2);
        second.answers = "a2\r\na3\n\n  \n".into();

        assert_eq!(
            numbered_lines(&[first, second], RecordField::Answers),
            vec!["1. a1", "2. a2", "3. a3"]
        );
        assert!(numbered_lines(&[], RecordField::Answers).is_empty());
    }

    #[test]
    fn test_numbered_lines_keeps_interior_blank_lines() {
        let mut first = record(1);
        first.answers = "a1\n\na2".into();

        assert_eq!(
            numbered_lines(&[first], RecordField::Answers),
            vec!["1. a1", "2. ", "3. a2"]
        );
    }

    #[test]
    fn test_populate_assessment_appends_numbered_paragraphs() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("assessment.docx");
        let mut doc = DocTemplate::from_docx("a.docx", flat_template("ASSESSMENT"));
        let mut first = record(1);
        first.assessment = "q1\nq2".into();
        let mut second = record(2);
        second.assessment = "q3".into();

        populate_assessment_or_marking_guide(
            &mut doc,
            &[first, second],
            RecordField::Assessment,
            &out,
        )
        .unwrap();

        let reopened = DocTemplate::open(&out).unwrap();
        let numbered: Vec<String> = reopened
            .body_paragraph_texts()
            .into_iter()
            .filter(|t| t.chars().next().is_some_and(|c| c.is_ascii_digit()))
            .collect();
        assert_eq!(numbered, vec!["1. q1", "2. q2", "3. q3"]);
        // Intro table still present.
        assert_eq!(
            reopened.cell_text(0, CellPos::new(0, 0)).as_deref(),
            Some("Teacher:")
        );
    }

    #[test]
    fn test_marking_guide_uses_answers() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("marking_guide.docx");
        let mut doc = DocTemplate::from_docx("m.docx", flat_template("MARKING GUIDE"));

        populate_assessment_or_marking_guide(&mut doc, &[record(7)], RecordField::Answers, &out)
            .unwrap();
        assert!(doc.body_paragraph_texts().contains(&"1. a7".to_string()));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes("45 minutes"), 45);
        assert_eq!(parse_minutes("about an hour"), MIN_DURATION_MINUTES);
        assert_eq!(parse_minutes("5"), MIN_DURATION_MINUTES);
    }
}
