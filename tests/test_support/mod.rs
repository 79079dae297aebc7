#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .env_remove("ROSTERD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

/// Spawns the sidecar and selects a fresh workspace.
pub fn spawn_with_workspace(prefix: &str) -> (Child, ChildStdin, BufReader<ChildStdout>, PathBuf) {
    let workspace = temp_dir(prefix);
    let (child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    (child, stdin, reader, workspace)
}

pub fn read_line_json(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response line");
    serde_json::from_str(line.trim()).expect("parse response json")
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let value = read_line_json(reader);
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or(serde_json::Value::Null)
}

/// Returns the error object after asserting the request failed with `code`.
pub fn request_err(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
    code: &str,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    let error = value.get("error").cloned().unwrap_or(serde_json::Value::Null);
    assert_eq!(
        error.get("code").and_then(|v| v.as_str()),
        Some(code),
        "{} wrong error: {}",
        method,
        error
    );
    error
}

/// Two students, one class enrolling both, and two assignments, imported in
/// the legacy `*_c` shape so the normalizer is exercised on the way in.
pub fn seed_school(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) {
    let _ = request_ok(
        stdin,
        reader,
        "seed-students",
        "records.import",
        json!({
            "kind": "students",
            "records": [
                {
                    "Id": 1, "first_name_c": "Ann", "last_name_c": "Lee",
                    "email_c": "ann.lee@school.test", "grade_c": "10th",
                    "date_of_birth_c": "2009-04-02", "enrollment_date_c": "2023-09-05",
                    "status_c": "active"
                },
                {
                    "Id": 2, "first_name_c": "Bob", "last_name_c": "Stone",
                    "email_c": "bob.stone@school.test", "grade_c": "11th",
                    "date_of_birth_c": "2008-01-15", "enrollment_date_c": "2022-09-01",
                    "status_c": "active"
                }
            ]
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "seed-classes",
        "records.import",
        json!({
            "kind": "classes",
            "records": [
                { "Id": 10, "Name": "Algebra", "subject_c": "Math", "period_c": "1", "room_c": "101", "student_ids_c": "1,2" }
            ]
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "seed-assignments",
        "records.import",
        json!({
            "kind": "assignments",
            "records": [
                { "Id": 100, "class_id_c": { "Id": 10, "Name": "Algebra" }, "Name": "Quiz 1", "max_score_c": 100, "due_date_c": "2024-03-01", "category_c": "quiz" },
                { "Id": 101, "class_id_c": 10, "Name": "Lab", "max_score_c": 30, "due_date_c": "2024-03-08", "category_c": "project" }
            ]
        }),
    );
}
