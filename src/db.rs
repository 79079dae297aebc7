use crate::model::{
    Assignment, AssignmentCategory, AttendanceRecord, AttendanceStatus, ClassSection, Grade,
    Student, StudentStatus,
};
use crate::normalize::parse_day;
use crate::snapshot::Snapshot;
use anyhow::Context;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "rosterd.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.to_string_lossy()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// References between tables are weak: no foreign keys, no cascades.
pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            grade TEXT NOT NULL,
            date_of_birth TEXT,
            enrollment_date TEXT,
            status TEXT NOT NULL DEFAULT 'active'
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            subject TEXT NOT NULL,
            period TEXT NOT NULL,
            room TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS class_students(
            class_id INTEGER NOT NULL,
            student_id INTEGER NOT NULL,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY(class_id, student_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_class_students_student ON class_students(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS assignments(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            class_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            max_score REAL NOT NULL,
            due_date TEXT,
            category TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_assignments_class ON assignments(class_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            assignment_id INTEGER NOT NULL,
            score REAL NOT NULL,
            submitted_date TEXT,
            UNIQUE(student_id, assignment_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            class_id INTEGER NOT NULL,
            date TEXT,
            status TEXT,
            UNIQUE(student_id, class_id, date)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attendance_date ON attendance(date)",
        [],
    )?;

    Ok(())
}

fn day_text(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.format("%Y-%m-%d").to_string())
}

fn day_from(raw: Option<String>) -> Option<NaiveDate> {
    raw.as_deref().and_then(parse_day)
}

/// `None` lets SQLite assign the row id.
fn assigned(id: i64) -> Option<i64> {
    (id > 0).then_some(id)
}

pub fn list_students(conn: &Connection) -> anyhow::Result<Vec<Student>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, grade, date_of_birth, enrollment_date, status
         FROM students
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            let status: String = r.get(7)?;
            Ok(Student {
                id: r.get(0)?,
                first_name: r.get(1)?,
                last_name: r.get(2)?,
                email: r.get(3)?,
                grade: r.get(4)?,
                date_of_birth: day_from(r.get(5)?),
                enrollment_date: day_from(r.get(6)?),
                status: StudentStatus::parse(&status).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_classes(conn: &Connection) -> anyhow::Result<Vec<ClassSection>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, subject, period, room
         FROM classes
         ORDER BY id",
    )?;
    let mut classes = stmt
        .query_map([], |r| {
            Ok(ClassSection {
                id: r.get(0)?,
                name: r.get(1)?,
                subject: r.get(2)?,
                period: r.get(3)?,
                room: r.get(4)?,
                student_ids: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut members_stmt = conn.prepare(
        "SELECT student_id FROM class_students WHERE class_id = ? ORDER BY sort_order",
    )?;
    for c in classes.iter_mut() {
        c.student_ids = members_stmt
            .query_map([c.id], |r| r.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(classes)
}

pub fn list_assignments(conn: &Connection) -> anyhow::Result<Vec<Assignment>> {
    let mut stmt = conn.prepare(
        "SELECT id, class_id, name, max_score, due_date, category
         FROM assignments
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            let category: Option<String> = r.get(5)?;
            Ok(Assignment {
                id: r.get(0)?,
                class_id: r.get(1)?,
                name: r.get(2)?,
                max_score: r.get(3)?,
                due_date: day_from(r.get(4)?),
                category: category.as_deref().and_then(AssignmentCategory::parse),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_grades(conn: &Connection) -> anyhow::Result<Vec<Grade>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, assignment_id, score, submitted_date
         FROM grades
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            Ok(Grade {
                id: r.get(0)?,
                student_id: r.get(1)?,
                assignment_id: r.get(2)?,
                score: r.get(3)?,
                submitted_date: day_from(r.get(4)?),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_attendance(conn: &Connection) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_id, class_id, date, status
         FROM attendance
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |r| {
            let status: Option<String> = r.get(4)?;
            Ok(AttendanceRecord {
                id: r.get(0)?,
                student_id: r.get(1)?,
                class_id: r.get(2)?,
                date: day_from(r.get(3)?),
                status: status.as_deref().and_then(AttendanceStatus::parse),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn load_snapshot(conn: &Connection) -> anyhow::Result<Snapshot> {
    Ok(Snapshot {
        students: list_students(conn).context("list students")?,
        classes: list_classes(conn).context("list classes")?,
        assignments: list_assignments(conn).context("list assignments")?,
        grades: list_grades(conn).context("list grades")?,
        attendance: list_attendance(conn).context("list attendance")?,
    })
}

pub fn insert_student(conn: &Connection, s: &Student) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO students(id, first_name, last_name, email, grade, date_of_birth, enrollment_date, status)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            assigned(s.id),
            &s.first_name,
            &s.last_name,
            &s.email,
            &s.grade,
            day_text(s.date_of_birth),
            day_text(s.enrollment_date),
            s.status.as_str(),
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_student(conn: &Connection, s: &Student) -> anyhow::Result<bool> {
    let changed = conn.execute(
        "UPDATE students
         SET first_name = ?, last_name = ?, email = ?, grade = ?,
             date_of_birth = ?, enrollment_date = ?, status = ?
         WHERE id = ?",
        (
            &s.first_name,
            &s.last_name,
            &s.email,
            &s.grade,
            day_text(s.date_of_birth),
            day_text(s.enrollment_date),
            s.status.as_str(),
            s.id,
        ),
    )?;
    Ok(changed > 0)
}

/// Drops the student and their class enrollments. Grades and attendance are
/// left in place and surface as unresolved references.
pub fn delete_student(conn: &Connection, student_id: i64) -> anyhow::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute("DELETE FROM students WHERE id = ?", [student_id])?;
    tx.execute(
        "DELETE FROM class_students WHERE student_id = ?",
        [student_id],
    )?;
    tx.commit()?;
    Ok(removed > 0)
}

pub fn insert_class(conn: &Connection, c: &ClassSection) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO classes(id, name, subject, period, room) VALUES(?, ?, ?, ?, ?)",
        (assigned(c.id), &c.name, &c.subject, &c.period, &c.room),
    )?;
    let class_id = conn.last_insert_rowid();
    for (i, student_id) in c.student_ids.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO class_students(class_id, student_id, sort_order) VALUES(?, ?, ?)",
            (class_id, student_id, i as i64),
        )?;
    }
    Ok(class_id)
}

pub fn insert_assignment(conn: &Connection, a: &Assignment) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO assignments(id, class_id, name, max_score, due_date, category)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            assigned(a.id),
            a.class_id,
            &a.name,
            a.max_score,
            day_text(a.due_date),
            a.category.map(|c| c.as_str()),
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

fn insert_grade(conn: &Connection, g: &Grade) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO grades(id, student_id, assignment_id, score, submitted_date)
         VALUES(?, ?, ?, ?, ?)",
        (
            assigned(g.id),
            g.student_id,
            g.assignment_id,
            g.score,
            day_text(g.submitted_date),
        ),
    )?;
    Ok(())
}

fn insert_attendance(conn: &Connection, r: &AttendanceRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO attendance(id, student_id, class_id, date, status) VALUES(?, ?, ?, ?, ?)",
        (
            assigned(r.id),
            r.student_id,
            r.class_id,
            day_text(r.date),
            r.status.map(|s| s.as_str()),
        ),
    )?;
    Ok(())
}

/// Keyed on the (student, assignment) pair; returns the stored row id.
pub fn upsert_grade(conn: &Connection, g: &Grade) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO grades(student_id, assignment_id, score, submitted_date)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, assignment_id) DO UPDATE SET
           score = excluded.score,
           submitted_date = excluded.submitted_date",
        (
            g.student_id,
            g.assignment_id,
            g.score,
            day_text(g.submitted_date),
        ),
    )?;
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM grades WHERE student_id = ? AND assignment_id = ?",
            (g.student_id, g.assignment_id),
            |r| r.get(0),
        )
        .optional()?;
    id.context("grade row missing after upsert")
}

/// Keyed on the (student, class, date) triple; returns the stored row id.
pub fn upsert_attendance(conn: &Connection, r: &AttendanceRecord) -> anyhow::Result<i64> {
    let date = day_text(r.date);
    conn.execute(
        "INSERT INTO attendance(student_id, class_id, date, status)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(student_id, class_id, date) DO UPDATE SET
           status = excluded.status",
        (
            r.student_id,
            r.class_id,
            &date,
            r.status.map(|s| s.as_str()),
        ),
    )?;
    let id: Option<i64> = conn
        .query_row(
            "SELECT id FROM attendance WHERE student_id = ? AND class_id = ? AND date IS ?",
            (r.student_id, r.class_id, &date),
            |row| row.get(0),
        )
        .optional()?;
    id.context("attendance row missing after upsert")
}

pub fn replace_students(conn: &Connection, students: &[Student]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM students", [])?;
    for s in students {
        insert_student(&tx, s).with_context(|| format!("insert student {}", s.id))?;
    }
    tx.commit()?;
    Ok(students.len())
}

pub fn replace_classes(conn: &Connection, classes: &[ClassSection]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM class_students", [])?;
    tx.execute("DELETE FROM classes", [])?;
    for c in classes {
        insert_class(&tx, c).with_context(|| format!("insert class {}", c.id))?;
    }
    tx.commit()?;
    Ok(classes.len())
}

pub fn replace_assignments(conn: &Connection, assignments: &[Assignment]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM assignments", [])?;
    for a in assignments {
        insert_assignment(&tx, a).with_context(|| format!("insert assignment {}", a.id))?;
    }
    tx.commit()?;
    Ok(assignments.len())
}

/// Bulk replace used when a whole grade sheet is saved at once.
pub fn replace_grades(conn: &Connection, grades: &[Grade]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM grades", [])?;
    for g in grades {
        insert_grade(&tx, g).with_context(|| {
            format!(
                "insert grade student={} assignment={}",
                g.student_id, g.assignment_id
            )
        })?;
    }
    tx.commit()?;
    Ok(grades.len())
}

pub fn replace_attendance(conn: &Connection, records: &[AttendanceRecord]) -> anyhow::Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM attendance", [])?;
    for r in records {
        insert_attendance(&tx, r).with_context(|| {
            format!(
                "insert attendance student={} class={}",
                r.student_id, r.class_id
            )
        })?;
    }
    tx.commit()?;
    Ok(records.len())
}
