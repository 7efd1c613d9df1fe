use crate::reconcile::SheetKind;
use anyhow::Context;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Note, Workbook, Worksheet};
use std::path::Path;

pub const INSTRUCTIONS_SHEET: &str = "Instructions";

pub const SCHOOL_COLUMNS: &[&str] = &["name", "address", "phone", "email"];
pub const CLASS_COLUMNS: &[&str] = &["school_name", "name", "grade_level", "academic_year"];
pub const STUDENT_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "student_id",
    "date_of_birth",
    "school_name",
    "class_name",
    "email",
    "address",
    "parent_name",
    "parent_contact",
];

const HEADER_FILL: u32 = 0x4F81BD;
const NOTE_AUTHOR: &str = "Template Generator";

const INSTRUCTION_LINES: &[&str] = &[
    "School Data Import Template Instructions",
    "",
    "This template contains three sheets that must be filled in the following order:",
    "",
    "1. Schools: Enter information about each school",
    "   - Each school must have a unique name",
    "",
    "2. Classes: Enter information about classes",
    "   - The school_name must match exactly with a name in the Schools sheet",
    "",
    "3. Students: Enter information about students",
    "   - The school_name must match a name in the Schools sheet",
    "   - The class_name must match a name in the Classes sheet for the given school",
    "   - The date_of_birth should be in YYYY-MM-DD format (e.g., 2008-05-12)",
    "",
    "Important Notes:",
    "- Do not modify the column headers",
    "- Do not add additional sheets",
    "- Make sure to fill in all required fields (name, school_name, class_name, first_name, last_name)",
];

#[derive(Debug, Clone)]
pub struct TemplateSummary {
    pub sheets: Vec<String>,
}

struct SheetSpec {
    kind: SheetKind,
    columns: &'static [&'static str],
    example: &'static [&'static str],
    note: &'static str,
}

const SHEETS: [SheetSpec; 3] = [
    SheetSpec {
        kind: SheetKind::Schools,
        columns: SCHOOL_COLUMNS,
        example: &["East High School", "123 Main St, Cityville", "555-1234", "info@easthigh.edu"],
        note: "Enter school information. Each school must have a unique name.",
    },
    SheetSpec {
        kind: SheetKind::Classes,
        columns: CLASS_COLUMNS,
        example: &["East High School", "Class 9A", "9", "2024-2025"],
        note: "Enter class information. The school_name must match exactly with a name in the Schools sheet.",
    },
    SheetSpec {
        kind: SheetKind::Students,
        columns: STUDENT_COLUMNS,
        example: &[
            "John",
            "Doe",
            "S12345",
            "2008-05-12",
            "East High School",
            "Class 9A",
            "john.doe@example.com",
            "456 Oak Rd, Townsville",
            "Jane Doe",
            "555-5678",
        ],
        note: "Enter student information. The school_name and class_name must match exactly with existing records.",
    },
];

pub fn write_template(out_path: &Path) -> anyhow::Result<TemplateSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let mut book = Workbook::new();
    let mut sheets = Vec::new();

    write_instructions(book.add_worksheet())?;
    sheets.push(INSTRUCTIONS_SHEET.to_string());

    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let body = Format::new().set_border(FormatBorder::Thin);

    for spec in &SHEETS {
        let ws = book.add_worksheet();
        ws.set_name(spec.kind.sheet_name())?;
        for (col, title) in spec.columns.iter().enumerate() {
            let col = col as u16;
            ws.write_string_with_format(0, col, *title, &header)?;
            ws.set_column_width(col, column_width(title))?;
        }
        for (col, value) in spec.example.iter().enumerate() {
            ws.write_string_with_format(1, col as u16, *value, &body)?;
        }
        let note = Note::new(spec.note).set_author(NOTE_AUTHOR);
        ws.insert_note(0, 0, &note)?;
        sheets.push(spec.kind.sheet_name().to_string());
    }

    book.save(out_path)
        .with_context(|| format!("failed to write template {}", out_path.to_string_lossy()))?;
    Ok(TemplateSummary { sheets })
}

fn write_instructions(ws: &mut Worksheet) -> anyhow::Result<()> {
    ws.set_name(INSTRUCTIONS_SHEET)?;
    let title = Format::new().set_bold().set_font_size(14);
    let bold = Format::new().set_bold();
    for (i, line) in INSTRUCTION_LINES.iter().enumerate() {
        let row = i as u32;
        if i == 0 {
            ws.write_string_with_format(row, 0, *line, &title)?;
        } else if line.starts_with("Important Notes:") {
            ws.write_string_with_format(row, 0, *line, &bold)?;
        } else if !line.is_empty() {
            ws.write_string(row, 0, *line)?;
        }
    }
    ws.set_column_width(0, 60)?;
    Ok(())
}

fn column_width(title: &str) -> f64 {
    (title.len() + 2).max(15) as f64
}
