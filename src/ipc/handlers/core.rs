use crate::db::DB_FILE_NAME;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn health(state: &AppState) -> serde_json::Value {
    json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace_display(),
        "storeFile": state.workspace.as_ref().map(|_| DB_FILE_NAME),
    })
}

fn workspace_select(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required_str(params, "path")?;
    if raw.is_empty() {
        return Err(HandlerErr::bad_params("path must not be empty"));
    }
    let path = PathBuf::from(raw);

    if let Err(e) = state.open_workspace(&path) {
        log::error!("event=workspace_select status=failed path={} error={e:#}", path.display());
        return Err(HandlerErr::storage("db_open_failed", e));
    }
    log::info!("event=workspace_select status=ok path={}", path.display());
    Ok(json!({ "workspacePath": state.workspace_display() }))
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, Ok(health(state)))
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, workspace_select(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
