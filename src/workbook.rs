use crate::dates;
use anyhow::{anyhow, Context};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(&self) -> Option<String> {
        let s = match self {
            Cell::Blank => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format(dates::STRICT_DATE_FORMAT).to_string(),
        };
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }

    pub fn date_lenient(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Number(n) => dates::from_excel_serial(*n),
            Cell::Text(s) => dates::parse_lenient(s),
            Cell::Blank | Cell::Bool(_) => None,
        }
    }
}

fn format_number(n: f64) -> String {
    // Whole numbers (grade 9, student id 12345) must not render as "9.0".
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Row {
    pub line: usize,
    cells: HashMap<String, Cell>,
}

impl Row {
    pub fn new<I, K>(line: usize, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: Into<String>,
    {
        Row {
            line,
            cells: cells.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.cells.get(column).and_then(Cell::text)
    }

    pub fn text_or_empty(&self, column: &str) -> String {
        self.text(column).unwrap_or_default()
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.cells.get(column).and_then(Cell::date_lenient)
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

// Every wanted sheet is parsed before any row is used.
pub fn read_xlsx(path: &Path, wanted: &[&str]) -> anyhow::Result<Workbook> {
    ensure_xlsx_container(path)?;

    let mut book: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("failed to open workbook {}", path.to_string_lossy()))?;
    let present = book.sheet_names();

    let mut sheets = Vec::new();
    for name in wanted {
        if !present.iter().any(|p| p == name) {
            continue;
        }
        let range = book
            .worksheet_range(name)
            .with_context(|| format!("failed to read sheet {}", name))?;
        sheets.push(sheet_from_range(name, &range));
    }
    Ok(Workbook::new(sheets))
}

fn ensure_xlsx_container(path: &Path) -> anyhow::Result<()> {
    let mut f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut sig = [0u8; 4];
    let read = f.read(&mut sig).context("failed to read file signature")?;
    if read < 4 || sig != [0x50, 0x4B, 0x03, 0x04] {
        return Err(anyhow!("file is not a zip-based xlsx workbook"));
    }
    let f = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(f).context("invalid zip archive")?;
    archive
        .by_name(WORKBOOK_PART)
        .with_context(|| format!("workbook missing {}", WORKBOOK_PART))?;
    Ok(())
}

fn sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let first_line = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let mut raw_rows = range.rows();
    let Some(header) = raw_rows.next() else {
        return Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        };
    };
    let headers: Vec<Option<String>> = header.iter().map(|d| cell_from_data(d).text()).collect();

    let mut rows = Vec::new();
    for (i, raw) in raw_rows.enumerate() {
        let mut cells: HashMap<String, Cell> = HashMap::new();
        for (col, data) in raw.iter().enumerate() {
            let Some(Some(column)) = headers.get(col) else {
                continue;
            };
            // Duplicate headers: the leftmost column wins.
            cells
                .entry(column.clone())
                .or_insert_with(|| cell_from_data(data));
        }
        rows.push(Row::new(first_line + i + 1, cells));
    }

    Sheet {
        name: name.to_string(),
        rows,
    }
}

fn cell_from_data(d: &Data) -> Cell {
    match d {
        Data::Empty | Data::Error(_) => Cell::Blank,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dates::from_excel_serial(dt.as_f64()) {
            Some(date) => Cell::Date(date),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match dates::parse_lenient(s) {
            Some(date) => Cell::Date(date),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
