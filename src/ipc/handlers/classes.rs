use super::schools::school_not_found;
use crate::ipc::envelope::ok;
use crate::ipc::helpers::{
    get_opt_str, get_patch_str, get_required_str, get_str_or_empty, respond, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, ClassDraft, ClassPatch, StudentFilter};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

pub(crate) fn class_not_found(id: &str) -> HandlerErr {
    HandlerErr::new("not_found", "class not found").with_details(json!({ "id": id }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };
    let school_id = get_opt_str(&req.params, "school_id");
    respond(
        &req.id,
        store::list_classes(conn, school_id.as_deref())
            .map(|classes| json!({ "classes": classes }))
            .map_err(HandlerErr::from),
    )
}

fn classes_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let class = store::get_class(conn, &id)?.ok_or_else(|| class_not_found(&id))?;
    Ok(json!({ "class": class }))
}

fn classes_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let school_id = get_required_str(params, "school_id")?;
    let name = get_required_str(params, "name")?;
    if store::get_school(conn, &school_id)?.is_none() {
        return Err(school_not_found(&school_id));
    }
    let class = store::create_class(
        conn,
        &ClassDraft {
            school_id,
            name,
            grade_level: get_str_or_empty(params, "grade_level"),
            academic_year: get_str_or_empty(params, "academic_year"),
        },
    )?;
    info!(class = %class.name, school = %class.school_name, "class created");
    Ok(json!({ "class": class }))
}

fn classes_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let patch = ClassPatch {
        school_id: get_patch_str(params, "school_id"),
        name: get_patch_str(params, "name"),
        grade_level: get_patch_str(params, "grade_level"),
        academic_year: get_patch_str(params, "academic_year"),
    };
    if patch.name.as_deref() == Some("") {
        return Err(HandlerErr::new("bad_params", "name must not be empty"));
    }

    let current = store::get_class(conn, &id)?.ok_or_else(|| class_not_found(&id))?;
    if let Some(target) = patch.school_id.as_deref() {
        if target != current.school_id {
            if store::get_school(conn, target)?.is_none() {
                return Err(school_not_found(target));
            }
            let enrolled = store::list_students(
                conn,
                &StudentFilter {
                    class_id: Some(id.clone()),
                    ..StudentFilter::default()
                },
            )?;
            if !enrolled.is_empty() {
                return Err(HandlerErr::new(
                    "bad_params",
                    "cannot move a class with students to another school",
                )
                .with_details(json!({ "student_count": enrolled.len() })));
            }
        }
    }

    let class = store::update_class(conn, &id, &patch)?.ok_or_else(|| class_not_found(&id))?;
    Ok(json!({ "class": class }))
}

fn classes_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    if !store::delete_class(conn, &id)? {
        return Err(class_not_found(&id));
    }
    info!(class_id = %id, "class deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.get" => Some(with_db(state, req, classes_get)),
        "classes.create" => Some(with_db(state, req, classes_create)),
        "classes.update" => Some(with_db(state, req, classes_update)),
        "classes.delete" => Some(with_db(state, req, classes_delete)),
        _ => None,
    }
}
