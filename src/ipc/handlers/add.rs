use crate::ipc::helpers::{get_opt_str, get_str_or_empty, get_strict_date, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, ClassDraft, School, SchoolClass, SchoolDraft, StudentDraft};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

fn required(params: &Value, key: &str) -> Result<String, HandlerErr> {
    get_opt_str(params, key).ok_or_else(|| HandlerErr::new("bad_params", format!("{} is required", key)))
}

// Unlike bulk import, an unresolved name fails the whole request.
fn resolve_school(conn: &Connection, school_name: &str) -> Result<School, HandlerErr> {
    store::find_school_by_name(conn, school_name)?.ok_or_else(|| {
        HandlerErr::new("not_found", format!("School '{}' not found", school_name))
    })
}

fn resolve_class(
    conn: &Connection,
    school: &School,
    class_name: &str,
) -> Result<SchoolClass, HandlerErr> {
    store::find_class_by_name(conn, &school.id, class_name)?.ok_or_else(|| {
        HandlerErr::new(
            "not_found",
            format!("Class '{}' not found in school '{}'", class_name, school.name),
        )
    })
}

fn add_school(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let draft = SchoolDraft {
        name: required(params, "name")?,
        address: get_str_or_empty(params, "address"),
        phone: get_str_or_empty(params, "phone"),
        email: get_str_or_empty(params, "email"),
    };
    let school = store::create_school(conn, &draft)?;
    info!(school = %school.name, "school added");
    Ok(json!(school))
}

fn add_class(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let school_name = required(params, "school_name")?;
    let school = resolve_school(conn, &school_name)?;
    let draft = ClassDraft {
        school_id: school.id.clone(),
        name: required(params, "name")?,
        grade_level: get_str_or_empty(params, "grade_level"),
        academic_year: get_str_or_empty(params, "academic_year"),
    };
    let class = store::create_class(conn, &draft)?;
    info!(class = %class.name, school = %school.name, "class added");
    Ok(json!(class))
}

fn add_student(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let school_name = required(params, "school_name")?;
    let class_name = required(params, "class_name")?;
    let school = resolve_school(conn, &school_name)?;
    let class = resolve_class(conn, &school, &class_name)?;
    let date_of_birth = get_strict_date(params, "date_of_birth")?;

    let draft = StudentDraft {
        first_name: required(params, "first_name")?,
        last_name: required(params, "last_name")?,
        student_id: get_str_or_empty(params, "student_id"),
        school_id: school.id,
        class_id: class.id,
        date_of_birth,
        email: get_str_or_empty(params, "email"),
        address: get_str_or_empty(params, "address"),
        parent_name: get_str_or_empty(params, "parent_name"),
        parent_contact: get_str_or_empty(params, "parent_contact"),
    };
    let student = store::create_student(conn, &draft)?;
    info!(student = %student.id, class = %class.name, "student added");
    Ok(json!(student))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "add.school" => Some(with_db(state, req, add_school)),
        "add.class" => Some(with_db(state, req, add_class)),
        "add.student" => Some(with_db(state, req, add_student)),
        _ => None,
    }
}
