use crate::attendance;
use crate::db;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_optional_id, get_required_date, get_required_id, get_required_str, require_db,
    resolve_snapshot, to_json,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceRecord, AttendanceStatus};
use crate::roster;
use crate::snapshot::ById;
use rusqlite::Connection;
use serde_json::json;

fn parse_month_key(month: &str) -> Result<(i32, u32), HandlerErr> {
    let t = month.trim();
    let bad = || {
        HandlerErr::bad_params("month must be YYYY-MM").with_details(json!({ "month": t }))
    };
    let (y, m) = t.split_once('-').ok_or_else(bad)?;
    let year = y.parse::<i32>().map_err(|_| bad())?;
    let month_num = m.parse::<u32>().map_err(|_| bad())?;
    if !(1..=12).contains(&month_num) {
        return Err(HandlerErr::bad_params("month must be between 01 and 12")
            .with_details(json!({ "month": t })));
    }
    Ok((year, month_num))
}

fn parse_status(params: &serde_json::Value) -> Result<AttendanceStatus, HandlerErr> {
    let raw = get_required_str(params, "status")?;
    AttendanceStatus::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params("status must be one of: present, absent, late, excused")
            .with_details(json!({ "status": raw }))
    })
}

fn class_records(records: &[AttendanceRecord], class_id: i64) -> Vec<AttendanceRecord> {
    records
        .iter()
        .filter(|r| r.class_id == class_id)
        .cloned()
        .collect()
}

/// With a class: the per-student day sheet. Without one: school-wide stats,
/// with every student on file counted toward the indicator.
fn attendance_day(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_date(params, "date")?;
    let snap = resolve_snapshot(state, params)?;

    if let Some(class_id) = get_optional_id(params, "classId")? {
        let class = snap.class(class_id)?;
        let sheet = attendance::day_sheet(class, &snap.students, &snap.attendance, date);
        return to_json(&sheet);
    }

    let stats = attendance::daily_stats(date, &snap.attendance);
    Ok(json!({
        "date": date,
        "stats": to_json(&stats)?,
        "indicator": attendance::day_indicator_color(&stats, snap.students.len()),
    }))
}

fn attendance_month(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(params, "classId")?;
    let month_key = get_required_str(params, "month")?;
    let (year, month) = parse_month_key(&month_key)?;
    let snap = resolve_snapshot(state, params)?;
    let class = snap.class(class_id)?;

    // Only enrolled ids that resolve to a student count, as in the day sheet.
    let class_size = roster::class_roster(class, &snap.students).len();
    let records = class_records(&snap.attendance, class_id);
    let days = attendance::month_calendar(year, month, &records, class_size)
        .ok_or_else(|| {
            HandlerErr::bad_params("month is out of range").with_details(json!({ "month": month_key }))
        })?;
    Ok(json!({
        "classId": class_id,
        "month": format!("{:04}-{:02}", year, month),
        "classSize": class_size,
        "days": to_json(&days)?,
    }))
}

fn attendance_mark(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let class_id = get_required_id(params, "classId")?;
    let date = get_required_date(params, "date")?;
    let status = parse_status(params)?;

    let classes = db::list_classes(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    ById::new(&classes).resolve(class_id)?;
    let students = db::list_students(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    ById::new(&students).resolve(student_id)?;

    let existing =
        db::list_attendance(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    let mut record = attendance::attendance_mark(&existing, student_id, class_id, date, status);
    record.id = db::upsert_attendance(conn, &record)
        .map_err(|e| HandlerErr::storage("db_insert_failed", e))?;
    log::debug!(
        "event=attendance_mark student={} class={} date={} status={}",
        student_id,
        class_id,
        date,
        status.as_str()
    );
    Ok(json!({ "record": to_json(&record)? }))
}

fn handle_attendance_day(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, attendance_day(state, &req.params))
}

fn handle_attendance_month(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, attendance_month(state, &req.params))
}

fn handle_attendance_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| attendance_mark(conn, &req.params));
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.day" => Some(handle_attendance_day(state, req)),
        "attendance.month" => Some(handle_attendance_month(state, req)),
        "attendance.mark" => Some(handle_attendance_mark(state, req)),
        _ => None,
    }
}
