use crate::dates;
use crate::ipc::envelope::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreError;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::{json, Value};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(entity) => {
                HandlerErr::new("already_exists", e.to_string()).with_details(json!({ "entity": entity }))
            }
            StoreError::Sqlite(e) => HandlerErr::new("db_query_failed", e.to_string()),
        }
    }
}

pub fn respond(id: &str, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

pub fn require_db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub type DbHandler = fn(&Connection, &Value) -> Result<Value, HandlerErr>;

pub fn with_db(state: &mut AppState, req: &Request, f: DbHandler) -> Value {
    respond(&req.id, require_db(state).and_then(|conn| f(conn, &req.params)))
}

// Numbers are accepted so callers may send "student_id": 12345.
fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(value_text)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(value_text)
        .filter(|s| !s.is_empty())
}

pub fn get_str_or_empty(params: &Value, key: &str) -> String {
    get_opt_str(params, key).unwrap_or_default()
}

pub fn get_patch_str(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(value_text)
}

// Absent, null and "" mean no date.
pub fn get_strict_date(params: &Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => dates::parse_strict(s)
            .map(Some)
            .map_err(|e| HandlerErr::new("bad_date", format!("Invalid date format: {}", e))),
        Some(_) => Err(HandlerErr::new(
            "bad_date",
            "Invalid date format: expected a YYYY-MM-DD string",
        )),
    }
}

// Absent key leaves the date unchanged; null or "" clears it.
pub fn get_patch_date(params: &Value, key: &str) -> Result<Option<Option<NaiveDate>>, HandlerErr> {
    if params.get(key).is_none() {
        return Ok(None);
    }
    get_strict_date(params, key).map(Some)
}
