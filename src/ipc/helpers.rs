use crate::db;
use crate::ipc::error::HandlerErr;
use crate::ipc::types::AppState;
use crate::normalize::parse_day;
use crate::snapshot::Snapshot;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

const SNAPSHOT_KEYS: [&str; 5] = ["students", "classes", "assignments", "grades", "attendance"];

pub fn require_db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The string exactly as sent; search text is matched verbatim.
pub fn get_raw_str(params: &serde_json::Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn as_id(v: &serde_json::Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
}

pub fn get_optional_id(params: &serde_json::Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => as_id(v)
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be an integer id", key))),
    }
}

pub fn get_required_id(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    get_optional_id(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Numbers or numeric strings; blank input is rejected.
pub fn get_required_f64(params: &serde_json::Value, key: &str) -> Result<f64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|f| f.is_finite())
        .ok_or_else(|| {
            HandlerErr::bad_params(format!("{} must be a number", key))
                .with_details(serde_json::json!({ key: v }))
        })
}

pub fn get_required_date(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_day(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key))
            .with_details(serde_json::json!({ key: raw }))
    })
}

/// `params.today` when supplied, else the local calendar day.
pub fn get_today(params: &serde_json::Value) -> Result<NaiveDate, HandlerErr> {
    match get_optional_str(params, "today") {
        Some(_) => get_required_date(params, "today"),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn get_required<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a serde_json::Value, HandlerErr> {
    params
        .get(key)
        .filter(|v| !v.is_null())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Inline `params.records` wins over the workspace store.
pub fn resolve_snapshot(state: &AppState, params: &serde_json::Value) -> Result<Snapshot, HandlerErr> {
    if let Some(records) = params.get("records").filter(|v| !v.is_null()) {
        let Some(obj) = records.as_object() else {
            return Err(HandlerErr::bad_params("records must be an object"));
        };
        if let Some(bad) = SNAPSHOT_KEYS
            .iter()
            .find(|k| obj.get(**k).map(|v| !v.is_array() && !v.is_null()).unwrap_or(false))
        {
            return Err(HandlerErr::bad_params(format!("records.{} must be an array", bad)));
        }
        return Ok(Snapshot::from_raw(records));
    }

    let conn = require_db(state)?;
    db::load_snapshot(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))
}

pub fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(value).map_err(|e| HandlerErr::new("serialize_failed", e.to_string()))
}
