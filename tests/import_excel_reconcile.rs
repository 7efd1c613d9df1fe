mod test_support;

use serde_json::json;
use test_support::{
    spawn_sidecar, temp_dir, write_typed_workbook, write_workbook, TypedCell, CLASS_HEADERS,
    SCHOOL_HEADERS, STUDENT_HEADERS,
};

fn student<'a>(first: &'a str, last: &'a str, dob: &'a str, school: &'a str, class: &'a str) -> Vec<&'a str> {
    vec![first, last, "", dob, school, class, "", "", "", ""]
}

#[test]
fn linked_sheets_create_one_of_each_and_reimport_is_idempotent() {
    let workspace = temp_dir("schoolbook-import-basic");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            ("Schools", SCHOOL_HEADERS, vec![vec!["A", "", "", ""]]),
            ("Classes", CLASS_HEADERS, vec![vec!["A", "C1", "", ""]]),
            (
                "Students",
                STUDENT_HEADERS,
                vec![student("J", "D", "", "A", "C1")],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);

    let first = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(
        first,
        json!({
            "schools_created": 1,
            "classes_created": 1,
            "students_created": 1,
            "errors": []
        })
    );

    let second = sc.request_ok("2", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(second["schools_created"], json!(0));
    assert_eq!(second["classes_created"], json!(0));
    assert_eq!(second["students_created"], json!(0));
    assert_eq!(second["errors"], json!([]));

    let students = sc.request_ok("3", "students.list", json!({}));
    assert_eq!(students["students"].as_array().map(|a| a.len()), Some(1));
}

#[test]
fn unresolved_references_are_reported_per_row() {
    let workspace = temp_dir("schoolbook-import-unresolved");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            ("Schools", SCHOOL_HEADERS, vec![vec!["A", "", "", ""]]),
            (
                "Classes",
                CLASS_HEADERS,
                vec![vec!["Nowhere", "C9", "", ""], vec!["A", "C1", "9", "2024-2025"]],
            ),
            (
                "Students",
                STUDENT_HEADERS,
                vec![
                    student("J", "D", "", "A", "C2"),
                    student("K", "E", "", "Ghost", "C1"),
                    student("L", "F", "", "A", "C1"),
                ],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));

    assert_eq!(report["schools_created"], json!(1));
    assert_eq!(report["classes_created"], json!(1));
    assert_eq!(report["students_created"], json!(1));
    assert_eq!(
        report["errors"],
        json!([
            "School 'Nowhere' does not exist for class 'C9'",
            "Class 'C2' does not exist in school 'A' for student 'J D'",
            "School 'Ghost' does not exist for student 'K E'"
        ])
    );
}

#[test]
fn blank_required_fields_are_skipped_without_errors() {
    let workspace = temp_dir("schoolbook-import-blank");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            (
                "Schools",
                SCHOOL_HEADERS,
                vec![vec!["A", "", "", ""], vec!["", "1 Nowhere Rd", "", ""]],
            ),
            ("Classes", CLASS_HEADERS, vec![vec!["", "Orphan", "", ""]]),
            (
                "Students",
                STUDENT_HEADERS,
                vec![student("", "D", "", "A", "C1")],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(
        report,
        json!({
            "schools_created": 1,
            "classes_created": 0,
            "students_created": 0,
            "errors": []
        })
    );
}

#[test]
fn malformed_birth_date_is_ignored_in_bulk_import() {
    let workspace = temp_dir("schoolbook-import-dob");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            ("Schools", SCHOOL_HEADERS, vec![vec!["A", "", "", ""]]),
            ("Classes", CLASS_HEADERS, vec![vec!["A", "C1", "", ""]]),
            (
                "Students",
                STUDENT_HEADERS,
                vec![
                    student("J", "D", "not-a-date", "A", "C1"),
                    student("K", "E", "2008-05-12", "A", "C1"),
                ],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(report["students_created"], json!(2));
    assert_eq!(report["errors"], json!([]));

    let students = sc.request_ok("2", "students.list", json!({}));
    let list = students["students"].as_array().expect("students");
    let j = list.iter().find(|s| s["first_name"] == "J").expect("J");
    let k = list.iter().find(|s| s["first_name"] == "K").expect("K");
    assert!(j["date_of_birth"].is_null());
    assert_eq!(k["date_of_birth"], json!("2008-05-12"));
    assert_eq!(j["student_id"], json!(""));
}

#[test]
fn missing_sheets_and_extra_columns_are_tolerated() {
    let workspace = temp_dir("schoolbook-import-partial");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            ("Notes", &["anything"][..], vec![vec!["ignored"]]),
            (
                "Schools",
                &["name", "motto"][..],
                vec![vec!["A", "Learn"], vec!["B", ""]],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(report["schools_created"], json!(2));
    assert_eq!(report["errors"], json!([]));
}

#[test]
fn whole_file_failures_return_a_single_error() {
    let workspace = temp_dir("schoolbook-import-fatal");
    let csv = workspace.join("data.csv");
    std::fs::write(&csv, "name\nA\n").expect("write csv");
    let fake = workspace.join("fake.xlsx");
    std::fs::write(&fake, "this is not a workbook").expect("write fake");

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);

    let (code, message) = sc.request_err("1", "import.excel", json!({}));
    assert_eq!(code, "no_file");
    assert_eq!(message, "No file provided");

    let (code, message) =
        sc.request_err("2", "import.excel", json!({ "path": csv.to_string_lossy() }));
    assert_eq!(code, "unsupported_format");
    assert!(message.contains(".xlsx"));

    let (code, message) =
        sc.request_err("3", "import.excel", json!({ "path": fake.to_string_lossy() }));
    assert_eq!(code, "workbook_unreadable");
    assert!(message.starts_with("Error processing Excel file:"));

    let schools = sc.request_ok("4", "schools.list", json!({}));
    assert_eq!(schools["schools"], json!([]));
}

#[test]
fn numeric_and_date_cells_are_normalized_on_import() {
    use TypedCell::{Blank, Date, Number, Text};

    let workspace = temp_dir("schoolbook-import-typed");
    let book = workspace.join("typed.xlsx");
    write_typed_workbook(
        &book,
        &[
            ("Schools", SCHOOL_HEADERS, vec![vec![Text("A")]]),
            (
                "Classes",
                CLASS_HEADERS,
                vec![vec![Text("A"), Number(9.0), Number(9.0), Text("2024-2025")]],
            ),
            (
                "Students",
                STUDENT_HEADERS,
                vec![vec![
                    Text("John"),
                    Text("Doe"),
                    Number(12345.0),
                    Date(2008, 5, 12),
                    Text("A"),
                    Number(9.0),
                    Blank,
                ]],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(
        report,
        json!({
            "schools_created": 1,
            "classes_created": 1,
            "students_created": 1,
            "errors": []
        })
    );

    let classes = sc.request_ok("2", "classes.list", json!({}));
    assert_eq!(classes["classes"][0]["name"], json!("9"));
    assert_eq!(classes["classes"][0]["grade_level"], json!("9"));

    let students = sc.request_ok("3", "students.list", json!({}));
    let student = &students["students"][0];
    assert_eq!(student["student_id"], json!("12345"));
    assert_eq!(student["date_of_birth"], json!("2008-05-12"));
    assert_eq!(student["class_name"], json!("9"));
}

#[test]
fn surrounding_whitespace_in_names_is_ignored_when_resolving() {
    let workspace = temp_dir("schoolbook-import-whitespace");
    let book = workspace.join("data.xlsx");
    write_workbook(
        &book,
        &[
            ("Schools", SCHOOL_HEADERS, vec![vec!["A", "", "", ""]]),
            ("Classes", CLASS_HEADERS, vec![vec![" A ", " C1 ", "", ""]]),
            (
                "Students",
                STUDENT_HEADERS,
                vec![student(" J ", "D", "", "A ", " C1")],
            ),
        ],
    );

    let mut sc = spawn_sidecar();
    sc.select_workspace(&workspace);
    let report = sc.request_ok("1", "import.excel", json!({ "path": book.to_string_lossy() }));
    assert_eq!(report["classes_created"], json!(1));
    assert_eq!(report["students_created"], json!(1));
    assert_eq!(report["errors"], json!([]));

    let students = sc.request_ok("2", "students.list", json!({}));
    assert_eq!(students["students"][0]["first_name"], json!("J"));
    assert_eq!(students["students"][0]["class_name"], json!("C1"));

    let class = sc.request_ok(
        "3",
        "add.class",
        json!({ "school_name": "  A", "name": "C2 " }),
    );
    assert_eq!(class["school_name"], json!("A"));
    assert_eq!(class["name"], json!("C2"));

    // Inner spacing and case still have to match exactly.
    let (code, message) =
        sc.request_err("4", "add.class", json!({ "school_name": "a", "name": "C3" }));
    assert_eq!(code, "not_found");
    assert_eq!(message, "School 'a' not found");
}
