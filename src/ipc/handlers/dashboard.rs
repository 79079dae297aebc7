use crate::dashboard;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_today, resolve_snapshot, to_json};
use crate::ipc::types::{AppState, Request};

fn dashboard_summary(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let today = get_today(params)?;
    let snap = resolve_snapshot(state, params)?;
    to_json(&dashboard::summarize(&snap, today))
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, dashboard_summary(state, &req.params))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        _ => None,
    }
}
