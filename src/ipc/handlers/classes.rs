use crate::db;
use crate::error::CoreError;
use crate::ipc::error::{respond, HandlerErr};
use crate::ipc::helpers::{get_required, get_required_id, require_db, resolve_snapshot, to_json};
use crate::ipc::types::{AppState, Request};
use crate::model::EntityKind;
use crate::normalize;
use crate::roster;
use crate::snapshot::ById;
use rusqlite::Connection;
use serde_json::json;

const ROSTER_PREVIEW_LEN: usize = 3;

fn classes_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let snap = resolve_snapshot(state, params)?;
    let mut classes: Vec<serde_json::Value> = Vec::with_capacity(snap.classes.len());
    for c in &snap.classes {
        let enrolled = roster::class_roster(c, &snap.students);
        let preview: Vec<String> = enrolled
            .iter()
            .take(ROSTER_PREVIEW_LEN)
            .map(|s| s.full_name())
            .collect();
        classes.push(json!({
            "class": to_json(c)?,
            "studentCount": c.student_ids.len(),
            "rosterPreview": preview,
            "assignmentCount": roster::class_assignments(c.id, &snap.assignments).len(),
        }));
    }
    Ok(json!({ "classes": classes }))
}

fn classes_roster(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(params, "classId")?;
    let snap = resolve_snapshot(state, params)?;
    let class = snap.class(class_id)?;
    let students = roster::class_roster(class, &snap.students);
    let missing: Vec<i64> = class
        .student_ids
        .iter()
        .copied()
        .filter(|id| !students.iter().any(|s| s.id == *id))
        .collect();
    Ok(json!({
        "class": to_json(class)?,
        "students": to_json(&students)?,
        "unresolvedStudentIds": missing,
    }))
}

fn classes_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut class = normalize::normalize_class(get_required(params, "class")?);
    class.id = 0;
    if class.name.is_empty() {
        return Err(CoreError::rejected("name", "Class name is required").into());
    }
    class.id =
        db::insert_class(conn, &class).map_err(|e| HandlerErr::storage("db_insert_failed", e))?;
    log::info!("event=class_create id={} students={}", class.id, class.student_ids.len());
    Ok(json!({ "class": to_json(&class)? }))
}

fn assignments_create(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let mut assignment = normalize::normalize_assignment(get_required(params, "assignment")?);
    assignment.id = 0;
    if assignment.name.is_empty() {
        return Err(CoreError::rejected("name", "Assignment name is required").into());
    }
    if assignment.max_score <= 0.0 {
        return Err(CoreError::rejected("maxScore", "Max score must be greater than 0").into());
    }

    let classes = db::list_classes(conn).map_err(|e| HandlerErr::storage("db_query_failed", e))?;
    if ById::new(&classes).get(assignment.class_id).is_none() {
        return Err(CoreError::not_found(EntityKind::Class, assignment.class_id).into());
    }

    assignment.id = db::insert_assignment(conn, &assignment)
        .map_err(|e| HandlerErr::storage("db_insert_failed", e))?;
    Ok(json!({ "assignment": to_json(&assignment)? }))
}

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, classes_list(state, &req.params))
}

fn handle_classes_roster(state: &mut AppState, req: &Request) -> serde_json::Value {
    respond(&req.id, classes_roster(state, &req.params))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| classes_create(conn, &req.params));
    respond(&req.id, result)
}

fn handle_assignments_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = require_db(state).and_then(|conn| assignments_create(conn, &req.params));
    respond(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.roster" => Some(handle_classes_roster(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "assignments.create" => Some(handle_assignments_create(state, req)),
        _ => None,
    }
}
