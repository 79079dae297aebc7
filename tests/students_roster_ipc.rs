mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, seed_school, spawn_sidecar, spawn_with_workspace};

fn names(result: &serde_json::Value) -> Vec<String> {
    result
        .get("students")
        .and_then(|v| v.as_array())
        .expect("students")
        .iter()
        .map(|s| {
            format!(
                "{} {}",
                s.get("firstName").and_then(|v| v.as_str()).unwrap_or_default(),
                s.get("lastName").and_then(|v| v.as_str()).unwrap_or_default()
            )
        })
        .collect()
}

#[test]
fn students_list_filters_and_sorts() {
    let (_child, mut stdin, mut reader, _ws) = spawn_with_workspace("rosterd-students-list");
    seed_school(&mut stdin, &mut reader);

    let all = request_ok(&mut stdin, &mut reader, "1", "students.list", json!({}));
    assert_eq!(names(&all), vec!["Ann Lee", "Bob Stone"]);
    assert_eq!(all.get("total").and_then(|v| v.as_u64()), Some(2));

    let searched = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.list",
        json!({ "query": "LEE" }),
    );
    assert_eq!(names(&searched), vec!["Ann Lee"]);
    assert_eq!(searched.get("total").and_then(|v| v.as_u64()), Some(2));

    let by_email = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.list",
        json!({ "query": "stone@" }),
    );
    assert_eq!(names(&by_email), vec!["Bob Stone"]);

    let padded = request_ok(
        &mut stdin,
        &mut reader,
        "3b",
        "students.list",
        json!({ "query": "lee " }),
    );
    assert_eq!(names(&padded), Vec::<String>::new());

    let desc = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "sortBy": "name", "sortOrder": "desc" }),
    );
    assert_eq!(names(&desc), vec!["Bob Stone", "Ann Lee"]);

    let by_enrollment = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.list",
        json!({ "sortBy": "enrollmentDate" }),
    );
    assert_eq!(names(&by_enrollment), vec!["Bob Stone", "Ann Lee"]);

    let in_class = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.list",
        json!({ "classId": 10, "query": "bob" }),
    );
    assert_eq!(names(&in_class), vec!["Bob Stone"]);

    let _ = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "classId": 99 }),
        "not_found",
    );
}

#[test]
fn student_create_update_delete_roundtrip() {
    let (_child, mut stdin, mut reader, _ws) = spawn_with_workspace("rosterd-students-crud");
    seed_school(&mut stdin, &mut reader);

    let rejected = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({ "student": { "firstName": "Cy", "email": "cy-at-school" } }),
        "validation_rejected",
    );
    let fields: Vec<&str> = rejected
        .pointer("/details/fields")
        .and_then(|v| v.as_array())
        .expect("fields")
        .iter()
        .filter_map(|f| f.get("field").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec!["lastName", "email", "grade", "dateOfBirth", "enrollmentDate"]
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({ "student": {
            "firstName": "Cy", "lastName": "Park", "email": "cy.park@school.test",
            "grade": "9th", "dateOfBirth": "2010-06-30", "enrollmentDate": "2024-09-03T08:00:00Z"
        }}),
    );
    let student = created.get("student").expect("student");
    let new_id = student.get("id").and_then(|v| v.as_i64()).expect("id");
    assert!(new_id > 2);
    assert_eq!(
        student.get("enrollmentDate").and_then(|v| v.as_str()),
        Some("2024-09-03")
    );
    assert_eq!(student.get("status").and_then(|v| v.as_str()), Some("active"));

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.update",
        json!({ "student": {
            "Id": new_id, "first_name_c": "Cyrus", "last_name_c": "Park",
            "email_c": "cy.park@school.test", "grade_c": "9th",
            "date_of_birth_c": "2010-06-30", "enrollment_date_c": "2024-09-03",
            "status_c": "inactive"
        }}),
    );
    assert_eq!(
        updated.pointer("/student/firstName").and_then(|v| v.as_str()),
        Some("Cyrus")
    );
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.list",
        json!({ "query": "cyrus" }),
    );
    assert_eq!(
        listed.pointer("/students/0/status").and_then(|v| v.as_str()),
        Some("inactive")
    );

    let _ = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({ "student": {
            "id": 999, "firstName": "No", "lastName": "Body", "email": "no@body.test",
            "grade": "9th", "dateOfBirth": "2010-01-01", "enrollmentDate": "2024-01-01"
        }}),
        "not_found",
    );

    // Removing a student also drops their class enrollment.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "studentId": 2 }),
    );
    let roster = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "classes.roster",
        json!({ "classId": 10 }),
    );
    assert_eq!(names(&roster), vec!["Ann Lee"]);
    assert_eq!(
        roster.get("unresolvedStudentIds").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );
    let _ = request_err(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "studentId": 2 }),
        "not_found",
    );
}

#[test]
fn workspace_persists_across_sidecar_restarts() {
    let (mut child, mut stdin, mut reader, workspace) =
        spawn_with_workspace("rosterd-students-persist");
    seed_school(&mut stdin, &mut reader);
    drop(stdin);
    let _ = child.wait();

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({}));
    assert_eq!(names(&listed), vec!["Ann Lee", "Bob Stone"]);

    let classes = request_ok(&mut stdin, &mut reader, "3", "classes.list", json!({}));
    let first = classes.pointer("/classes/0").expect("class row");
    assert_eq!(first.pointer("/class/name").and_then(|v| v.as_str()), Some("Algebra"));
    assert_eq!(first.get("studentCount").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(first.get("assignmentCount").and_then(|v| v.as_u64()), Some(2));
    assert_eq!(
        first.get("rosterPreview"),
        Some(&json!(["Ann Lee", "Bob Stone"]))
    );
}

#[test]
fn inline_records_need_no_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "students.list",
        json!({
            "sortBy": "name",
            "records": {
                "students": [
                    { "Id": 1, "first_name_c": "Bob", "last_name_c": "Lee" },
                    { "id": 2, "firstName": "Ann", "lastName": "Lee" }
                ]
            }
        }),
    );
    assert_eq!(names(&listed), vec!["Ann Lee", "Bob Lee"]);
}
