use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    json!({
        "id": id,
        "ok": false,
        "error": ErrorBody { code, message: message.into(), details },
    })
}

// No id to echo: the line never parsed into a request.
pub fn unaddressed_err(code: &str, message: impl Into<String>) -> Value {
    json!({
        "ok": false,
        "error": ErrorBody { code, message: message.into(), details: None },
    })
}
