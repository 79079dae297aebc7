use crate::db;
use crate::error::CoreError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_optional_id, get_optional_str, get_raw_str, get_required, get_required_id,
    require_db, resolve_snapshot, to_json,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{EntityKind, Student};
use crate::normalize;
use crate::roster::{self, RosterQuery, SortDirection, SortKey};
use crate::validate;
use rusqlite::Connection;
use serde_json::json;

fn parse_roster_query(params: &serde_json::Value) -> Result<RosterQuery, HandlerErr> {
    let query = get_raw_str(params, "query");
    let sort = match get_optional_str(params, "sortBy") {
        None => None,
        Some(raw) => {
            let key = SortKey::parse(&raw).ok_or_else(|| {
                HandlerErr::bad_params(
                    "sortBy must be one of: name, email, grade, enrollmentDate, status",
                )
                .with_details(json!({ "sortBy": raw }))
            })?;
            let direction = match get_optional_str(params, "sortOrder") {
                None => SortDirection::Asc,
                Some(raw) => SortDirection::parse(&raw).ok_or_else(|| {
                    HandlerErr::bad_params("sortOrder must be asc or desc")
                        .with_details(json!({ "sortOrder": raw }))
                })?,
            };
            Some((key, direction))
        }
    };
    Ok(RosterQuery { query, sort })
}

fn students_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let q = parse_roster_query(params)?;
    let snap = resolve_snapshot(state, params)?;
    let base = match get_optional_id(params, "classId")? {
        Some(class_id) => roster::class_roster(snap.class(class_id)?, &snap.students),
        None => snap.students.clone(),
    };
    let students = roster::filter_and_sort(&base, &q);
    Ok(json!({
        "total": base.len(),
        "students": to_json(&students)?,
    }))
}

fn student_param(params: &serde_json::Value) -> Result<Student, HandlerErr> {
    Ok(normalize::normalize_student(get_required(params, "student")?))
}

fn students_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut student = student_param(params)?;
    student.id = 0;
    validate::validate_student(&student)?;
    student.id =
        db::insert_student(conn, &student).map_err(|e| HandlerErr::storage("db_insert_failed", e))?;
    log::info!("event=student_create id={}", student.id);
    Ok(json!({ "student": to_json(&student)? }))
}

fn students_update(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student = student_param(params)?;
    if student.id <= 0 {
        return Err(HandlerErr::bad_params("student.Id is required for update"));
    }
    validate::validate_student(&student)?;
    let changed =
        db::update_student(conn, &student).map_err(|e| HandlerErr::storage("db_update_failed", e))?;
    if !changed {
        return Err(CoreError::not_found(EntityKind::Student, student.id).into());
    }
    Ok(json!({ "student": to_json(&student)? }))
}

fn students_delete(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let removed =
        db::delete_student(conn, student_id).map_err(|e| HandlerErr::storage("db_delete_failed", e))?;
    if !removed {
        return Err(CoreError::not_found(EntityKind::Student, student_id).into());
    }
    log::info!("event=student_delete id={}", student_id);
    Ok(json!({ "ok": true }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, students_list(state, &req.params))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| students_create(conn, &req.params));
    respond(&req.id, result)
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| students_update(conn, &req.params));
    respond(&req.id, result)
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| students_delete(conn, &req.params));
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
