//! In-memory view of a `.docx` file as an ordered list of tables.

use docx_rs::{
    BreakType, DocumentChild, Docx, Paragraph, ParagraphChild, Run, RunChild, Table, TableCell,
    TableCellContent, TableChild, TableRowChild, Text, read_docx,
};
use lesson_core::LessonError;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::layout::CellPos;

/// A loaded template. Identity is the path it was read from.
#[derive(Debug, Clone)]
pub struct DocTemplate {
    path: PathBuf,
    docx: Docx,
}

impl DocTemplate {
    /// Read and parse a `.docx` file.
    ///
    /// `read_docx` hands back decoded run text while the writer emits text
    /// as stored, so body text is re-escaped here to match documents built
    /// in memory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LessonError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| LessonError::file_access(path, e))?;
        let mut docx = read_docx(&bytes)
            .map_err(|e| LessonError::file_access(path, format!("not a readable DOCX: {e}")))?;
        for child in &mut docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => escape_paragraph(p),
                DocumentChild::Table(t) => escape_table(t),
                _ => {}
            }
        }
        debug!("Opened template {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            docx,
        })
    }

    /// Wrap an already-built document (used for generated templates).
    pub fn from_docx(path: impl Into<PathBuf>, docx: Docx) -> Self {
        Self {
            path: path.into(),
            docx,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -----------------------------------------------------------------------
    // Tables
    // -----------------------------------------------------------------------

    fn tables(&self) -> impl Iterator<Item = &Table> {
        self.docx.document.children.iter().filter_map(|child| match child {
            DocumentChild::Table(table) => {
                let table: &Table = table;
                Some(table)
            }
            _ => None,
        })
    }

    fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.docx
            .document
            .children
            .iter_mut()
            .filter_map(|child| match child {
                DocumentChild::Table(table) => {
                    let table: &mut Table = table;
                    Some(table)
                }
                _ => None,
            })
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    #[allow(irrefutable_let_patterns)]
    fn cell(&self, table: usize, pos: CellPos) -> Option<&TableCell> {
        let table = self.tables().nth(table)?;
        let TableChild::TableRow(row) = table.rows.get(pos.row)? else {
            return None;
        };
        let TableRowChild::TableCell(cell) = row.cells.get(pos.cell)? else {
            return None;
        };
        Some(cell)
    }

    #[allow(irrefutable_let_patterns)]
    fn cell_mut(&mut self, table: usize, pos: CellPos) -> Option<&mut TableCell> {
        let table = self.tables_mut().nth(table)?;
        let TableChild::TableRow(row) = table.rows.get_mut(pos.row)? else {
            return None;
        };
        let TableRowChild::TableCell(cell) = row.cells.get_mut(pos.cell)? else {
            return None;
        };
        Some(cell)
    }

    /// Text of a cell: its paragraphs joined with `\n`. `None` when the
    /// position does not exist.
    pub fn cell_text(&self, table: usize, pos: CellPos) -> Option<String> {
        let cell = self.cell(table, pos)?;
        let paragraphs: Vec<String> = cell
            .children
            .iter()
            .filter_map(|content| match content {
                TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                _ => None,
            })
            .collect();
        Some(paragraphs.join("\n"))
    }

    /// Replace a cell's contents with `text`; `\n` becomes a line break.
    pub fn set_cell_text(
        &mut self,
        table: usize,
        pos: CellPos,
        text: &str,
    ) -> Result<(), LessonError> {
        self.set_cell_paragraphs(table, pos, vec![text_paragraph(text)])
    }

    /// Replace a cell's contents with the given paragraphs, keeping the cell's
    /// own properties (width, borders, shading).
    pub fn set_cell_paragraphs(
        &mut self,
        table: usize,
        pos: CellPos,
        paragraphs: Vec<Paragraph>,
    ) -> Result<(), LessonError> {
        let path = self.path.clone();
        let target = self.cell_mut(table, pos).ok_or_else(|| {
            LessonError::Population(format!(
                "{}: table {table} has no cell at row {} column {}",
                path.display(),
                pos.row,
                pos.cell
            ))
        })?;

        let mut fresh = TableCell::new();
        fresh.property = target.property.clone();
        for paragraph in paragraphs {
            fresh = fresh.add_paragraph(paragraph);
        }
        *target = fresh;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Body paragraphs
    // -----------------------------------------------------------------------

    /// Append a paragraph at the end of the document body.
    pub fn append_paragraph(&mut self, paragraph: Paragraph) {
        let docx = std::mem::replace(&mut self.docx, Docx::new());
        self.docx = docx.add_paragraph(paragraph);
    }

    /// Text of every top-level paragraph, in order (tables excluded).
    pub fn body_paragraph_texts(&self) -> Vec<String> {
        self.docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(p) => Some(paragraph_text(p)),
                _ => None,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serialize to `output`, overwriting any existing file.
    pub fn persist(&self, output: &Path) -> Result<(), LessonError> {
        let file = File::create(output).map_err(|e| LessonError::file_access(output, e))?;
        self.docx
            .clone()
            .build()
            .pack(file)
            .map_err(|e| LessonError::file_access(output, format!("Failed to pack DOCX: {e}")))?;
        debug!("Wrote {}", output.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Paragraph helpers
// ---------------------------------------------------------------------------

/// A single paragraph holding `text`, with line breaks at each `\n`.
pub fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(text_run(text))
}

/// A paragraph made of a bold label run followed by a plain value run.
pub fn labelled_paragraph(label: &str, value: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(label).bold())
        .add_run(text_run(value))
}

/// A paragraph holding only a bold run.
pub fn bold_paragraph(label: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(label).bold())
}

fn text_run(text: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line.trim_end_matches('\r'));
    }
    run
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            push_run_text(run, &mut out);
        }
    }
    out
}

fn push_run_text(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&unescape_text(&t.text)),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Text escaping
// ---------------------------------------------------------------------------

// Run text is kept in its XML-escaped form, the way `Text::new` stores it.

fn escape_paragraph(paragraph: &mut Paragraph) {
    for child in &mut paragraph.children {
        match child {
            ParagraphChild::Run(run) => escape_run(run),
            ParagraphChild::Hyperlink(link) => {
                for inner in &mut link.children {
                    if let ParagraphChild::Run(run) = inner {
                        escape_run(run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn escape_run(run: &mut Run) {
    for child in &mut run.children {
        if let RunChild::Text(t) = child {
            *t = Text::new(std::mem::take(&mut t.text));
        }
    }
}

#[allow(irrefutable_let_patterns)]
fn escape_table(table: &mut Table) {
    for row in &mut table.rows {
        let TableChild::TableRow(row) = row else {
            continue;
        };
        for cell in &mut row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            for content in &mut cell.children {
                match content {
                    TableCellContent::Paragraph(p) => escape_paragraph(p),
                    TableCellContent::Table(t) => escape_table(t),
                    _ => {}
                }
            }
        }
    }
}

/// Decode the entities `Text::new` produces back to plain text.
fn unescape_text(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    const ENTITIES: [(&str, &str); 7] = [
        ("&amp;", "&"),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&apos;", "'"),
        ("&#39;", "'"),
        ("&#xA;", "\n"),
    ];

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, plain)) => {
                out.push_str(plain);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
