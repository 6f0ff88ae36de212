//! Positional contract between the code and the template files.
//!
//! Cells are addressed by `(row, cell)` inside a table, tables by their order in
//! the document body. A template whose layout differs will have the wrong cells
//! overwritten without any error, so every index the code relies on lives here.

/// A `(row, cell)` position inside a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPos {
    pub row: usize,
    pub cell: usize,
}

impl CellPos {
    pub const fn new(row: usize, cell: usize) -> Self {
        Self { row, cell }
    }
}

// Introduction table (first table of every template, 2x4 label/value grid).
pub const INTRO_TABLE: usize = 0;
pub const INTRO_TEACHER: CellPos = CellPos::new(0, 1);
pub const INTRO_COURSE: CellPos = CellPos::new(0, 3);
pub const INTRO_UNIT: CellPos = CellPos::new(1, 1);
pub const INTRO_WEEK: CellPos = CellPos::new(1, 3);

// Shared terminology table of the lesson plan template.
pub const TERMINOLOGY_TABLE: usize = 1;
pub const TERMINOLOGY_CELL: CellPos = CellPos::new(1, 0);

// Day tables of the lesson plan template.
pub const ANCHOR_CELL: CellPos = CellPos::new(0, 0);
pub const DAY_AIMS: CellPos = CellPos::new(1, 1);
pub const DAY_INTRODUCTION: CellPos = CellPos::new(2, 1);
pub const DAY_LESSON_BODY: CellPos = CellPos::new(3, 1);
pub const DAY_CONCLUSION: CellPos = CellPos::new(4, 1);

/// Anchor texts recognised as day tables.
pub const WEEKDAYS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

pub const DOCX_EXTENSION: &str = ".docx";

/// The three documents produced per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    LessonPlan,
    Assessment,
    MarkingGuide,
}

impl OutputKind {
    pub const ALL: [OutputKind; 3] = [Self::LessonPlan, Self::Assessment, Self::MarkingGuide];

    /// File name of the template inside the template directory.
    pub fn template_file_name(self) -> &'static str {
        match self {
            Self::LessonPlan => "LESSON_PLAN_TEMPLATE.docx",
            Self::Assessment => "ASSESSMENT_TEMPLATE.docx",
            Self::MarkingGuide => "MARKING_GUIDE_TEMPLATE.docx",
        }
    }

    /// Base name of the generated file.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::LessonPlan => "lesson_plan",
            Self::Assessment => "assessment",
            Self::MarkingGuide => "marking_guide",
        }
    }

    pub fn output_file_name(self) -> String {
        format!("{}{DOCX_EXTENSION}", self.base_name())
    }
}

pub fn is_weekday(text: &str) -> bool {
    WEEKDAYS.iter().any(|d| d.eq_ignore_ascii_case(text.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_names() {
        assert_eq!(OutputKind::LessonPlan.output_file_name(), "lesson_plan.docx");
        assert_eq!(OutputKind::Assessment.output_file_name(), "assessment.docx");
        assert_eq!(OutputKind::MarkingGuide.output_file_name(), "marking_guide.docx");
    }

    #[test]
    fn test_is_weekday_ignores_case_and_padding() {
        assert!(is_weekday("monday"));
        assert!(is_weekday(" Friday "));
        assert!(!is_weekday("KEY CONCEPTS & TERMINOLOGY"));
    }
}
