use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

type TryHandle = fn(&mut AppState, &Request) -> Option<serde_json::Value>;

const FAMILIES: [TryHandle; 7] = [
    handlers::core::try_handle,
    handlers::records::try_handle,
    handlers::students::try_handle,
    handlers::classes::try_handle,
    handlers::grades::try_handle,
    handlers::attendance::try_handle,
    handlers::dashboard::try_handle,
];

fn dispatch(state: &mut AppState, req: &Request) -> serde_json::Value {
    for try_handle in FAMILIES {
        if let Some(resp) = try_handle(state, req) {
            return resp;
        }
    }
    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    log::debug!("event=request id={} method={}", req.id, req.method);
    let resp = dispatch(state, &req);

    if resp.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = resp
            .pointer("/error/code")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        log::warn!(
            "event=request id={} method={} status=error code={}",
            req.id,
            req.method,
            code
        );
    }
    resp
}
