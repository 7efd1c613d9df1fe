use super::classes::class_not_found;
use super::schools::school_not_found;
use crate::ipc::envelope::ok;
use crate::ipc::helpers::{
    get_opt_str, get_patch_date, get_patch_str, get_required_str, get_str_or_empty,
    get_strict_date, respond, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, StudentDraft, StudentFilter, StudentPatch};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

fn student_not_found(id: &str) -> HandlerErr {
    HandlerErr::new("not_found", "student not found").with_details(json!({ "id": id }))
}

/// The class must exist and belong to `school_id`.
fn check_enrolment(conn: &Connection, school_id: &str, class_id: &str) -> Result<(), HandlerErr> {
    if store::get_school(conn, school_id)?.is_none() {
        return Err(school_not_found(school_id));
    }
    let class = store::get_class(conn, class_id)?.ok_or_else(|| class_not_found(class_id))?;
    if class.school_id != school_id {
        return Err(HandlerErr::new(
            "bad_params",
            format!("class '{}' does not belong to the given school", class.name),
        )
        .with_details(json!({ "class_id": class_id, "school_id": school_id })));
    }
    Ok(())
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };
    let filter = StudentFilter {
        school_id: get_opt_str(&req.params, "school_id"),
        class_id: get_opt_str(&req.params, "class_id"),
    };
    respond(
        &req.id,
        store::list_students(conn, &filter)
            .map(|students| json!({ "students": students }))
            .map_err(HandlerErr::from),
    )
}

fn students_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let student = store::get_student(conn, &id)?.ok_or_else(|| student_not_found(&id))?;
    Ok(json!({ "student": student }))
}

fn students_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let school_id = get_required_str(params, "school_id")?;
    let class_id = get_required_str(params, "class_id")?;
    let first_name = get_required_str(params, "first_name")?;
    let last_name = get_required_str(params, "last_name")?;
    let date_of_birth = get_strict_date(params, "date_of_birth")?;
    check_enrolment(conn, &school_id, &class_id)?;

    let student = store::create_student(
        conn,
        &StudentDraft {
            first_name,
            last_name,
            student_id: get_str_or_empty(params, "student_id"),
            school_id,
            class_id,
            date_of_birth,
            email: get_str_or_empty(params, "email"),
            address: get_str_or_empty(params, "address"),
            parent_name: get_str_or_empty(params, "parent_name"),
            parent_contact: get_str_or_empty(params, "parent_contact"),
        },
    )?;
    info!(student = %student.id, class = %student.class_name, "student created");
    Ok(json!({ "student": student }))
}

fn students_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let patch = StudentPatch {
        first_name: get_patch_str(params, "first_name"),
        last_name: get_patch_str(params, "last_name"),
        student_id: get_patch_str(params, "student_id"),
        school_id: get_patch_str(params, "school_id"),
        class_id: get_patch_str(params, "class_id"),
        date_of_birth: get_patch_date(params, "date_of_birth")?,
        email: get_patch_str(params, "email"),
        address: get_patch_str(params, "address"),
        parent_name: get_patch_str(params, "parent_name"),
        parent_contact: get_patch_str(params, "parent_contact"),
    };
    if patch.first_name.as_deref() == Some("") || patch.last_name.as_deref() == Some("") {
        return Err(HandlerErr::new("bad_params", "names must not be empty"));
    }

    let current = store::get_student(conn, &id)?.ok_or_else(|| student_not_found(&id))?;
    if patch.school_id.is_some() || patch.class_id.is_some() {
        let school_id = patch.school_id.as_deref().unwrap_or(&current.school_id);
        let class_id = patch.class_id.as_deref().unwrap_or(&current.class_id);
        check_enrolment(conn, school_id, class_id)?;
    }

    let student = store::update_student(conn, &id, &patch)?.ok_or_else(|| student_not_found(&id))?;
    Ok(json!({ "student": student }))
}

fn students_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    if !store::delete_student(conn, &id)? {
        return Err(student_not_found(&id));
    }
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(with_db(state, req, students_get)),
        "students.create" => Some(with_db(state, req, students_create)),
        "students.update" => Some(with_db(state, req, students_update)),
        "students.delete" => Some(with_db(state, req, students_delete)),
        _ => None,
    }
}
