//! Maps raw records from either naming scheme (camelCase or the `*_c`
//! suffixed table schema) onto the canonical model. Nothing past this module
//! reads raw field names.

use crate::model::{
    Assignment, AssignmentCategory, AttendanceRecord, AttendanceStatus, ClassSection, EntityKind,
    Grade, Student, StudentStatus,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalRecord {
    Student(Student),
    Class(ClassSection),
    Assignment(Assignment),
    Grade(Grade),
    Attendance(AttendanceRecord),
}

pub fn normalize(kind: EntityKind, raw: &Value) -> CanonicalRecord {
    match kind {
        EntityKind::Student => CanonicalRecord::Student(normalize_student(raw)),
        EntityKind::Class => CanonicalRecord::Class(normalize_class(raw)),
        EntityKind::Assignment => CanonicalRecord::Assignment(normalize_assignment(raw)),
        EntityKind::Grade => CanonicalRecord::Grade(normalize_grade(raw)),
        EntityKind::Attendance => CanonicalRecord::Attendance(normalize_attendance(raw)),
    }
}

/// Normalizes every element of a raw array. A non-array yields nothing.
pub fn normalize_all<T>(raw: &Value, f: fn(&Value) -> T) -> Vec<T> {
    raw.as_array()
        .map(|items| items.iter().map(f).collect())
        .unwrap_or_default()
}

pub fn normalize_student(raw: &Value) -> Student {
    let obj = raw.as_object();
    Student {
        id: record_id(obj),
        first_name: text(pick(obj, "firstName", "first_name_c")),
        last_name: text(pick(obj, "lastName", "last_name_c")),
        email: text(pick(obj, "email", "email_c")),
        grade: text(pick(obj, "grade", "grade_c")),
        date_of_birth: date(pick(obj, "dateOfBirth", "date_of_birth_c")),
        enrollment_date: date(pick(obj, "enrollmentDate", "enrollment_date_c")),
        status: pick(obj, "status", "status_c")
            .and_then(Value::as_str)
            .and_then(StudentStatus::parse)
            .unwrap_or_default(),
    }
}

pub fn normalize_class(raw: &Value) -> ClassSection {
    let obj = raw.as_object();
    ClassSection {
        id: record_id(obj),
        name: text(pick(obj, "name", "Name")),
        subject: text(pick(obj, "subject", "subject_c")),
        period: text(pick(obj, "period", "period_c")),
        room: text(pick(obj, "room", "room_c")),
        student_ids: id_list(pick(obj, "studentIds", "student_ids_c")),
    }
}

pub fn normalize_assignment(raw: &Value) -> Assignment {
    let obj = raw.as_object();
    Assignment {
        id: record_id(obj),
        class_id: reference(pick(obj, "classId", "class_id_c")),
        name: text(pick(obj, "name", "Name")),
        max_score: number(pick(obj, "maxScore", "max_score_c")),
        due_date: date(pick(obj, "dueDate", "due_date_c")),
        category: pick(obj, "category", "category_c")
            .and_then(Value::as_str)
            .and_then(AssignmentCategory::parse),
    }
}

pub fn normalize_grade(raw: &Value) -> Grade {
    let obj = raw.as_object();
    Grade {
        id: record_id(obj),
        student_id: reference(pick(obj, "studentId", "student_id_c")),
        assignment_id: reference(pick(obj, "assignmentId", "assignment_id_c")),
        score: number(pick(obj, "score", "score_c")),
        submitted_date: date(pick(obj, "submittedDate", "submitted_date_c")),
    }
}

pub fn normalize_attendance(raw: &Value) -> AttendanceRecord {
    let obj = raw.as_object();
    AttendanceRecord {
        id: record_id(obj),
        student_id: reference(pick(obj, "studentId", "student_id_c")),
        class_id: reference(pick(obj, "classId", "class_id_c")),
        date: date(pick(obj, "date", "date_c")),
        status: pick(obj, "status", "status_c")
            .and_then(Value::as_str)
            .and_then(AttendanceStatus::parse),
    }
}

fn pick<'a>(obj: Option<&'a Map<String, Value>>, canonical: &str, legacy: &str) -> Option<&'a Value> {
    let obj = obj?;
    match obj.get(canonical) {
        Some(v) if !v.is_null() => Some(v),
        _ => obj.get(legacy).filter(|v| !v.is_null()),
    }
}

fn record_id(obj: Option<&Map<String, Value>>) -> i64 {
    reference(pick(obj, "Id", "id"))
}

fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(v: Option<&Value>) -> f64 {
    let parsed = match v {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Integer ids, numeric strings, or lookup objects carrying an `Id`.
fn reference(v: Option<&Value>) -> i64 {
    match v {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
        Some(Value::Object(o)) => reference(o.get("Id").or_else(|| o.get("id"))),
        _ => 0,
    }
}

fn id_list(v: Option<&Value>) -> Vec<i64> {
    let candidates: Vec<i64> = match v {
        Some(Value::Array(items)) => items.iter().map(|i| reference(Some(i))).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().parse::<i64>().unwrap_or(0))
            .collect(),
        Some(other @ Value::Number(_)) => vec![reference(Some(other))],
        _ => Vec::new(),
    };

    let mut out: Vec<i64> = Vec::with_capacity(candidates.len());
    for id in candidates {
        if id > 0 && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Calendar day as written; time-of-day and offset are dropped.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_local().date());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
        .map(|dt| dt.date())
}

fn date(v: Option<&Value>) -> Option<NaiveDate> {
    v.and_then(Value::as_str).and_then(parse_day)
}
