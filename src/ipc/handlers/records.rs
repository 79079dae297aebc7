use crate::db;
use crate::grades;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required, get_required_str, require_db, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::EntityKind;
use crate::normalize;
use rusqlite::Connection;
use serde_json::json;

fn parse_kind(params: &serde_json::Value) -> Result<EntityKind, HandlerErr> {
    let raw = get_required_str(params, "kind")?;
    EntityKind::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params("kind must be one of: student, class, assignment, grade, attendance")
            .with_details(json!({ "kind": raw }))
    })
}

fn records_normalize(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(params)?;
    let record = get_required(params, "record")?;
    Ok(json!({
        "kind": kind.as_str(),
        "record": to_json(&normalize::normalize(kind, record))?,
    }))
}

/// Replaces one whole collection in the workspace with normalized records.
fn records_import(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(params)?;
    let raw = get_required(params, "records")?;
    if !raw.is_array() {
        return Err(HandlerErr::bad_params("records must be an array"));
    }

    let stored = match kind {
        EntityKind::Student => {
            db::replace_students(conn, &normalize::normalize_all(raw, normalize::normalize_student))
        }
        EntityKind::Class => {
            db::replace_classes(conn, &normalize::normalize_all(raw, normalize::normalize_class))
        }
        EntityKind::Assignment => db::replace_assignments(
            conn,
            &normalize::normalize_all(raw, normalize::normalize_assignment),
        ),
        EntityKind::Grade => {
            let incoming = normalize::normalize_all(raw, normalize::normalize_grade);
            let assignments = db::list_assignments(conn)
                .map_err(|e| HandlerErr::storage("db_query_failed", e))?;
            grades::validate_grade_batch(&incoming, &assignments)?;
            db::replace_grades(conn, &incoming)
        }
        EntityKind::Attendance => db::replace_attendance(
            conn,
            &normalize::normalize_all(raw, normalize::normalize_attendance),
        ),
    }
    .map_err(|e| HandlerErr::storage("db_insert_failed", e))?;

    log::info!("event=records_import kind={} count={}", kind, stored);
    Ok(json!({ "kind": kind.as_str(), "count": stored }))
}

fn handle_records_normalize(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, records_normalize(&req.params))
}

fn handle_records_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| records_import(conn, &req.params));
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "records.normalize" => Some(handle_records_normalize(state, req)),
        "records.import" => Some(handle_records_import(state, req)),
        _ => None,
    }
}
