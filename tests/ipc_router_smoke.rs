mod test_support;

use serde_json::json;
use std::io::Write;
use test_support::{
    read_line_json, request, request_err, request_ok, seed_school, spawn_sidecar, temp_dir,
};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("rosterd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));

    let _ = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "students.list",
        json!({}),
        "no_workspace",
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(workspace.join("rosterd.sqlite3").is_file());
    seed_school(&mut stdin, &mut reader);

    let calls = [
        ("records.normalize", json!({ "kind": "grade", "record": { "student_id_c": 1, "assignment_id_c": 100, "score_c": 90 } })),
        ("students.list", json!({})),
        ("classes.list", json!({})),
        ("classes.roster", json!({ "classId": 10 })),
        ("grades.letter", json!({ "score": 45, "maxScore": 50 })),
        ("grades.studentAverage", json!({ "studentId": 1 })),
        ("grades.sheet", json!({ "classId": 10 })),
        ("attendance.day", json!({ "date": "2024-03-04" })),
        ("attendance.month", json!({ "classId": 10, "month": "2024-03" })),
        ("dashboard.summary", json!({ "today": "2024-03-04" })),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let id = format!("smoke-{}", i);
        let _ = request_ok(&mut stdin, &mut reader, &id, method, params);
    }

    let unknown = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "reports.export",
        json!({}),
        "not_implemented",
    );
    assert!(unknown
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .contains("reports.export"));

    writeln!(stdin, "{{not json").expect("write bad line");
    stdin.flush().expect("flush bad line");
    let bad = read_line_json(&mut reader);
    assert_eq!(bad.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(bad.pointer("/error/code").and_then(|v| v.as_str()), Some("bad_json"));

    // The loop keeps serving after a bad line.
    let again = request(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(again.get("ok").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let status = child.wait().expect("wait for sidecar");
    assert!(status.success());
}

#[test]
fn bad_params_are_reported_per_method() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_err(&mut stdin, &mut reader, "1", "workspace.select", json!({}), "bad_params");
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "records.normalize",
        json!({ "kind": "parent", "record": {} }),
        "bad_params",
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "grades.letter",
        json!({ "score": "ninety", "maxScore": 100 }),
        "bad_params",
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "sortBy": "shoeSize", "records": { "students": [] } }),
        "bad_params",
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "records": { "students": {} } }),
        "bad_params",
    );
}

#[test]
fn startup_workspace_comes_from_environment() {
    let workspace = temp_dir("rosterd-env-workspace");
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = std::process::Command::new(exe)
        .env("ROSTERD_WORKSPACE", &workspace)
        .env("ROSTERD_LOG", "debug")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let mut stdin = child.stdin.take().expect("child stdin");
    let mut reader = std::io::BufReader::new(child.stdout.take().expect("child stdout"));

    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health.get("workspacePath").and_then(|v| v.as_str()),
        Some(workspace.to_string_lossy().as_ref())
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(listed.get("total").and_then(|v| v.as_u64()), Some(0));
}
