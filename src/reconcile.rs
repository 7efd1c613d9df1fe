use crate::store::{self, ClassDraft, SchoolDraft, StoreError, StudentDraft};
use crate::workbook::{self, Row, Workbook};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Schools,
    Classes,
    Students,
}

impl SheetKind {
    pub fn sheet_name(self) -> &'static str {
        match self {
            SheetKind::Schools => "Schools",
            SheetKind::Classes => "Classes",
            SheetKind::Students => "Students",
        }
    }
}

pub const SHEET_ORDER: [SheetKind; 3] = [SheetKind::Schools, SheetKind::Classes, SheetKind::Students];

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub schools_created: usize,
    pub classes_created: usize,
    pub students_created: usize,
    pub errors: Vec<String>,
}

/// Whole-file failures. Nothing has been written when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("No file provided")]
    NoFile,
    #[error("File format not supported. Please upload an Excel (.xlsx) file.")]
    UnsupportedFormat,
    #[error("Error processing Excel file: {0:#}")]
    Unreadable(anyhow::Error),
}

impl ImportError {
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::NoFile => "no_file",
            ImportError::UnsupportedFormat => "unsupported_format",
            ImportError::Unreadable(_) => "workbook_unreadable",
        }
    }
}

enum RowOutcome {
    Blank,
    Created,
    Matched,
    Rejected(String),
}

pub fn import_path(conn: &Connection, path: Option<&Path>) -> Result<ImportReport, ImportError> {
    let path = path.ok_or(ImportError::NoFile)?;
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if !is_xlsx {
        return Err(ImportError::UnsupportedFormat);
    }

    let names: Vec<&str> = SHEET_ORDER.iter().map(|k| k.sheet_name()).collect();
    let book = workbook::read_xlsx(path, &names).map_err(ImportError::Unreadable)?;
    info!(path = %path.to_string_lossy(), "importing workbook");
    Ok(import_workbook(conn, &book))
}

pub fn import_workbook(conn: &Connection, book: &Workbook) -> ImportReport {
    let mut report = ImportReport::default();
    for kind in SHEET_ORDER {
        let Some(sheet) = book.sheet(kind.sheet_name()) else {
            debug!(sheet = kind.sheet_name(), "sheet not present");
            continue;
        };
        for row in &sheet.rows {
            let outcome = match kind {
                SheetKind::Schools => school_row(conn, row),
                SheetKind::Classes => class_row(conn, row),
                SheetKind::Students => student_row(conn, row),
            };
            match outcome {
                RowOutcome::Created => match kind {
                    SheetKind::Schools => report.schools_created += 1,
                    SheetKind::Classes => report.classes_created += 1,
                    SheetKind::Students => report.students_created += 1,
                },
                RowOutcome::Matched | RowOutcome::Blank => {}
                RowOutcome::Rejected(msg) => {
                    warn!(sheet = kind.sheet_name(), line = row.line, "{}", msg);
                    report.errors.push(msg);
                }
            }
        }
    }
    info!(
        schools = report.schools_created,
        classes = report.classes_created,
        students = report.students_created,
        errors = report.errors.len(),
        "import finished"
    );
    report
}

fn created_or_matched(created: bool) -> RowOutcome {
    if created {
        RowOutcome::Created
    } else {
        RowOutcome::Matched
    }
}

fn school_row(conn: &Connection, row: &Row) -> RowOutcome {
    let Some(name) = row.text("name") else {
        return RowOutcome::Blank;
    };
    let draft = SchoolDraft {
        name,
        address: row.text_or_empty("address"),
        phone: row.text_or_empty("phone"),
        email: row.text_or_empty("email"),
    };
    match store::get_or_create_school(conn, &draft) {
        Ok((_, created)) => created_or_matched(created),
        Err(e) => RowOutcome::Rejected(format!("Error creating school {}: {}", draft.name, e)),
    }
}

fn class_row(conn: &Connection, row: &Row) -> RowOutcome {
    let (Some(name), Some(school_name)) = (row.text("name"), row.text("school_name")) else {
        return RowOutcome::Blank;
    };
    resolve_class(conn, row, &name, &school_name)
        .unwrap_or_else(|e| RowOutcome::Rejected(format!("Error creating class {}: {}", name, e)))
}

fn resolve_class(
    conn: &Connection,
    row: &Row,
    name: &str,
    school_name: &str,
) -> Result<RowOutcome, StoreError> {
    let Some(school) = store::find_school_by_name(conn, school_name)? else {
        return Ok(RowOutcome::Rejected(format!(
            "School '{}' does not exist for class '{}'",
            school_name, name
        )));
    };
    let draft = ClassDraft {
        school_id: school.id,
        name: name.to_string(),
        grade_level: row.text_or_empty("grade_level"),
        academic_year: row.text_or_empty("academic_year"),
    };
    let (_, created) = store::get_or_create_class(conn, &draft)?;
    Ok(created_or_matched(created))
}

fn student_row(conn: &Connection, row: &Row) -> RowOutcome {
    let (Some(first_name), Some(last_name)) = (row.text("first_name"), row.text("last_name")) else {
        return RowOutcome::Blank;
    };
    resolve_student(conn, row, &first_name, &last_name).unwrap_or_else(|e| {
        RowOutcome::Rejected(format!(
            "Error creating student {} {}: {}",
            first_name, last_name, e
        ))
    })
}

fn resolve_student(
    conn: &Connection,
    row: &Row,
    first_name: &str,
    last_name: &str,
) -> Result<RowOutcome, StoreError> {
    let school_name = row.text_or_empty("school_name");
    let class_name = row.text_or_empty("class_name");

    let Some(school) = store::find_school_by_name(conn, &school_name)? else {
        return Ok(RowOutcome::Rejected(format!(
            "School '{}' does not exist for student '{} {}'",
            school_name, first_name, last_name
        )));
    };
    let Some(class) = store::find_class_by_name(conn, &school.id, &class_name)? else {
        return Ok(RowOutcome::Rejected(format!(
            "Class '{}' does not exist in school '{}' for student '{} {}'",
            class_name, school_name, first_name, last_name
        )));
    };

    let draft = StudentDraft {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        student_id: row.text_or_empty("student_id"),
        school_id: school.id,
        class_id: class.id,
        // Unparseable dates are dropped here; the single-record path rejects them.
        date_of_birth: row.date("date_of_birth"),
        email: row.text_or_empty("email"),
        address: row.text_or_empty("address"),
        parent_name: row.text_or_empty("parent_name"),
        parent_contact: row.text_or_empty("parent_contact"),
    };
    let (_, created) = store::get_or_create_student(conn, &draft)?;
    Ok(created_or_matched(created))
}
