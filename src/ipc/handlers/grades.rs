use crate::db;
use crate::grades;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{
    get_required, get_required_f64, get_required_id, get_today, require_db, resolve_snapshot,
    to_json,
};
use crate::ipc::types::{AppState, Request};
use crate::normalize;
use crate::snapshot::ById;
use rusqlite::Connection;
use serde_json::json;

fn grades_letter(params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let score = get_required_f64(params, "score")?;
    let max_score = get_required_f64(params, "maxScore")?;
    Ok(json!({
        "letter": grades::letter_grade(score, max_score),
        "bucket": grades::grade_bucket(score, max_score),
    }))
}

fn grades_student_average(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let snap = resolve_snapshot(state, params)?;
    let average = grades::student_average(student_id, &snap.grades, &snap.assignments)?;
    let graded = snap.grades.iter().filter(|g| g.student_id == student_id).count();
    Ok(json!({
        "studentId": student_id,
        "average": average,
        "gradeCount": graded,
    }))
}

fn grades_sheet(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(params, "classId")?;
    let snap = resolve_snapshot(state, params)?;
    let sheet = grades::grade_sheet(snap.class(class_id)?, &snap)?;
    to_json(&sheet)
}

/// One grid edit: validated against the assignment maximum, then upserted.
fn grades_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_id(params, "studentId")?;
    let assignment_id = get_required_id(params, "assignmentId")?;
    let score = get_required_f64(params, "score")?;
    let today = get_today(params)?;

    let existing = db::list_grades(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    let assignments =
        db::list_assignments(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    let mut grade = grades::score_entry(
        &existing,
        &assignments,
        student_id,
        assignment_id,
        score,
        today,
    )?;
    grade.id = db::upsert_grade(conn, &grade).map_err(|e| HandlerErr::storage("db_insert_failed", e))?;

    let max_score = ById::new(&assignments)
        .get(assignment_id)
        .map(|a| a.max_score)
        .unwrap_or(0.0);
    Ok(json!({
        "grade": to_json(&grade)?,
        "letter": grades::letter_grade(grade.score, max_score),
        "bucket": grades::grade_bucket(grade.score, max_score),
    }))
}

/// Saves an edited grade book as one bulk replace.
fn grades_save_all(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let raw = get_required(params, "grades")?;
    if !raw.is_array() {
        return Err(HandlerErr::bad_params("grades must be an array"));
    }
    let incoming = normalize::normalize_all(raw, normalize::normalize_grade);
    let assignments =
        db::list_assignments(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    grades::validate_grade_batch(&incoming, &assignments)?;

    let saved =
        db::replace_grades(conn, &incoming).map_err(|e| HandlerErr::storage("db_insert_failed", e))?;
    log::info!("event=grades_save_all count={}", saved);
    Ok(json!({ "saved": saved }))
}

fn handle_grades_letter(_state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_letter(&req.params))
}

fn handle_grades_student_average(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_student_average(state, &req.params))
}

fn handle_grades_sheet(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, grades_sheet(state, &req.params))
}

fn handle_grades_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| grades_set(conn, &req.params));
    respond(&req.id, result)
}

fn handle_grades_save_all(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| grades_save_all(conn, &req.params));
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.letter" => Some(handle_grades_letter(state, req)),
        "grades.studentAverage" => Some(handle_grades_student_average(state, req)),
        "grades.sheet" => Some(handle_grades_sheet(state, req)),
        "grades.set" => Some(handle_grades_set(state, req)),
        "grades.saveAll" => Some(handle_grades_save_all(state, req)),
        _ => None,
    }
}
