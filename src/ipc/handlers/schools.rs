use crate::ipc::envelope::ok;
use crate::ipc::helpers::{
    get_patch_str, get_required_str, get_str_or_empty, respond, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, SchoolDraft, SchoolPatch};
use rusqlite::Connection;
use serde_json::{json, Value};
use tracing::info;

pub(crate) fn school_not_found(id: &str) -> HandlerErr {
    HandlerErr::new("not_found", "school not found").with_details(json!({ "id": id }))
}

fn handle_schools_list(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "schools": [] }));
    };
    respond(
        &req.id,
        store::list_schools(conn)
            .map(|schools| json!({ "schools": schools }))
            .map_err(HandlerErr::from),
    )
}

fn schools_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let school = store::get_school(conn, &id)?.ok_or_else(|| school_not_found(&id))?;
    Ok(json!({ "school": school }))
}

fn schools_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let draft = SchoolDraft {
        name: get_required_str(params, "name")?,
        address: get_str_or_empty(params, "address"),
        phone: get_str_or_empty(params, "phone"),
        email: get_str_or_empty(params, "email"),
    };
    let school = store::create_school(conn, &draft)?;
    info!(school = %school.name, "school created");
    Ok(json!({ "school": school }))
}

fn schools_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let patch = SchoolPatch {
        name: get_patch_str(params, "name"),
        address: get_patch_str(params, "address"),
        phone: get_patch_str(params, "phone"),
        email: get_patch_str(params, "email"),
    };
    if patch.name.as_deref() == Some("") {
        return Err(HandlerErr::new("bad_params", "name must not be empty"));
    }
    let school = store::update_school(conn, &id, &patch)?.ok_or_else(|| school_not_found(&id))?;
    Ok(json!({ "school": school }))
}

fn schools_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    if !store::delete_school(conn, &id)? {
        return Err(school_not_found(&id));
    }
    info!(school_id = %id, "school deleted");
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "schools.list" => Some(handle_schools_list(state, req)),
        "schools.get" => Some(with_db(state, req, schools_get)),
        "schools.create" => Some(with_db(state, req, schools_create)),
        "schools.update" => Some(with_db(state, req, schools_update)),
        "schools.delete" => Some(with_db(state, req, schools_delete)),
        _ => None,
    }
}
