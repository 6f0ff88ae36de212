//! Starter templates matching the layout in [`crate::layout`].

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use lesson_core::LessonError;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::document::{DocTemplate, text_paragraph};
use crate::layout::{OutputKind, WEEKDAYS};

/// Row labels of a day table, below the anchor row.
pub const DAY_ROW_LABELS: [&str; 4] = [
    "Aims and Objectives",
    "Introduction",
    "Lesson Body",
    "Conclusion",
];

pub const TERMINOLOGY_HEADER: &str = "KEY CONCEPTS & TERMINOLOGY";

fn cell(text: &str) -> TableCell {
    TableCell::new().add_paragraph(text_paragraph(text))
}

fn bold_cell(text: &str) -> TableCell {
    let run = Run::new().add_text(text).bold().size(22); // 11pt
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

fn title(text: &str) -> Paragraph {
    let run = Run::new().add_text(text).bold().size(36); // 18pt
    Paragraph::new().add_run(run)
}

/// Two rows of label/value pairs: Teacher, Course / Unit and Title, Week.
fn intro_table() -> Table {
    Table::new(vec![
        TableRow::new(vec![bold_cell("Teacher:"), cell(""), bold_cell("Course:"), cell("")]),
        TableRow::new(vec![
            bold_cell("Unit and Title:"),
            cell(""),
            bold_cell("Week:"),
            cell(""),
        ]),
    ])
}

fn terminology_table() -> Table {
    Table::new(vec![
        TableRow::new(vec![bold_cell(TERMINOLOGY_HEADER)]),
        TableRow::new(vec![cell("")]),
    ])
}

fn day_table(day: &str) -> Table {
    let mut rows = vec![TableRow::new(vec![bold_cell(day), cell("")])];
    rows.extend(
        DAY_ROW_LABELS
            .iter()
            .map(|label| TableRow::new(vec![bold_cell(label), cell("")])),
    );
    Table::new(rows)
}

/// Lesson plan template with one day table per entry of `days`.
pub fn lesson_plan_template(days: &[&str]) -> Docx {
    let mut docx = Docx::new()
        .add_paragraph(title("LESSON PLAN"))
        .add_table(intro_table())
        .add_paragraph(Paragraph::new())
        .add_table(terminology_table());
    for day in days {
        docx = docx.add_paragraph(Paragraph::new()).add_table(day_table(day));
    }
    docx
}

/// Assessment or marking guide template: title, intro table, then an empty
/// body the numbered lines are appended to.
pub fn flat_template(heading: &str) -> Docx {
    Docx::new()
        .add_paragraph(title(heading))
        .add_table(intro_table())
        .add_paragraph(Paragraph::new())
}

/// Build the starter document for `kind`, using Monday to Friday for the
/// lesson plan.
pub fn starter_template(kind: OutputKind) -> Docx {
    match kind {
        OutputKind::LessonPlan => lesson_plan_template(&WEEKDAYS[..5]),
        OutputKind::Assessment => flat_template("ASSESSMENT"),
        OutputKind::MarkingGuide => flat_template("MARKING GUIDE"),
    }
}

/// Write all three starter templates into `dir`, creating it if needed.
pub fn write_starter_templates(dir: &Path) -> Result<Vec<PathBuf>, LessonError> {
    std::fs::create_dir_all(dir).map_err(|e| LessonError::file_access(dir, e))?;

    let mut written = Vec::with_capacity(OutputKind::ALL.len());
    for kind in OutputKind::ALL {
        let path = dir.join(kind.template_file_name());
        DocTemplate::from_docx(&path, starter_template(kind)).persist(&path)?;
        written.push(path);
    }
    info!("Wrote {} starter templates to {}", written.len(), dir.display());
    Ok(written)
}
