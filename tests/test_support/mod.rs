#![allow(dead_code)]

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub struct Sidecar {
    pub child: Child,
    pub stdin: ChildStdin,
    pub reader: BufReader<ChildStdout>,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    spawn_sidecar_with_env(&[])
}

pub fn spawn_sidecar_with_env(envs: &[(&str, &str)]) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_schoolbookd");
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("SCHOOLBOOKD_WORKSPACE");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let mut child = cmd.spawn().expect("spawn schoolbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

impl Sidecar {
    pub fn request(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{}", payload).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        value
    }

    pub fn request_ok(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(id, method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or(serde_json::Value::Null)
    }

    /// Returns `(code, message)` of an expected failure.
    pub fn request_err(&mut self, id: &str, method: &str, params: serde_json::Value) -> (String, String) {
        let value = self.request(id, method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        let code = value["error"]["code"].as_str().unwrap_or("").to_string();
        let message = value["error"]["message"].as_str().unwrap_or("").to_string();
        (code, message)
    }

    pub fn select_workspace(&mut self, workspace: &Path) {
        let _ = self.request_ok(
            "ws",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
    }
}

/// A sheet as `(name, headers, rows)`; empty strings are left as blank cells.
pub type SheetData<'a> = (&'a str, &'a [&'a str], Vec<Vec<&'a str>>);

#[derive(Debug, Clone, Copy)]
pub enum TypedCell<'a> {
    Blank,
    Text(&'a str),
    Number(f64),
    /// Written as a real spreadsheet date with a `yyyy-mm-dd` number format.
    Date(u16, u8, u8),
}

pub type TypedSheetData<'a> = (&'a str, &'a [&'a str], Vec<Vec<TypedCell<'a>>>);

pub fn write_workbook(path: &Path, sheets: &[SheetData<'_>]) {
    let typed: Vec<TypedSheetData<'_>> = sheets
        .iter()
        .map(|(name, headers, rows)| {
            let rows: Vec<Vec<TypedCell<'_>>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|v| if v.is_empty() { TypedCell::Blank } else { TypedCell::Text(*v) })
                        .collect()
                })
                .collect();
            (*name, *headers, rows)
        })
        .collect();
    write_typed_workbook(path, &typed);
}

pub fn write_typed_workbook(path: &Path, sheets: &[TypedSheetData<'_>]) {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut book = Workbook::new();
    for (name, headers, rows) in sheets {
        let ws = book.add_worksheet();
        ws.set_name(*name).expect("sheet name");
        for (col, h) in headers.iter().enumerate() {
            ws.write_string(0, col as u16, *h).expect("header");
        }
        for (r, row) in rows.iter().enumerate() {
            let line = r as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match *cell {
                    TypedCell::Blank => {}
                    TypedCell::Text(v) => {
                        ws.write_string(line, col, v).expect("text cell");
                    }
                    TypedCell::Number(n) => {
                        ws.write_number(line, col, n).expect("number cell");
                    }
                    TypedCell::Date(y, m, d) => {
                        let dt = ExcelDateTime::from_ymd(y, m, d).expect("date");
                        ws.write_datetime_with_format(line, col, &dt, &date_format)
                            .expect("date cell");
                    }
                }
            }
        }
    }
    book.save(path).expect("save workbook");
}

pub const SCHOOL_HEADERS: &[&str] = &["name", "address", "phone", "email"];
pub const CLASS_HEADERS: &[&str] = &["school_name", "name", "grade_level", "academic_year"];
pub const STUDENT_HEADERS: &[&str] = &[
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
