use crate::ipc::helpers::{get_opt_str, get_required_str, respond, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::reconcile;
use crate::template;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn import_excel(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let path = get_opt_str(params, "path").map(PathBuf::from);
    match reconcile::import_path(conn, path.as_deref()) {
        Ok(report) => Ok(json!(report)),
        Err(e) => {
            warn!("import rejected: {}", e);
            let details = path.map(|p| json!({ "path": p.to_string_lossy() }));
            let mut herr = HandlerErr::new(e.code(), e.to_string());
            herr.details = details;
            Err(herr)
        }
    }
}

fn handle_import_template(_state: &mut AppState, req: &Request) -> Value {
    // Pure generation: no workspace needed.
    let result = get_required_str(&req.params, "outPath").and_then(|out| {
        let out_path = Path::new(&out);
        let summary = template::write_template(out_path).map_err(|e| {
            HandlerErr::new("write_failed", format!("{e:#}")).with_details(json!({ "path": out }))
        })?;
        info!(path = %out, "template written");
        Ok(json!({ "path": out, "sheets": summary.sheets }))
    });
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "import.excel" => Some(with_db(state, req, import_excel)),
        "import.template" => Some(handle_import_template(state, req)),
        _ => None,
    }
}
