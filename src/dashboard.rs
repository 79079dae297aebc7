use crate::attendance;
use crate::grades;
use crate::model::{AttendanceRecord, Grade};
use crate::snapshot::{ById, Snapshot};
use chrono::NaiveDate;
use serde::Serialize;

pub const RECENT_ACTIVITY_LIMIT: usize = 5;
pub const UNKNOWN_STUDENT: &str = "Unknown student";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub kind: &'static str,
    pub student_id: i64,
    pub student_name: String,
    pub message: String,
    pub time: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub total_classes: usize,
    pub average_grade: i64,
    pub attendance_rate: i64,
    pub today: NaiveDate,
    pub today_attendance: Vec<AttendanceRecord>,
    pub recent_activity: Vec<ActivityEntry>,
}

/// The most recently submitted grades, newest first. Undated grades sort
/// last; ties keep input order.
pub fn recent_activity(snap: &Snapshot, limit: usize) -> Vec<ActivityEntry> {
    let mut recent: Vec<&Grade> = snap.grades.iter().collect();
    recent.sort_by(|a, b| b.submitted_date.cmp(&a.submitted_date));

    let students = ById::new(&snap.students);
    recent
        .into_iter()
        .take(limit)
        .map(|g| {
            let student_name = students
                .get(g.student_id)
                .map(|s| s.full_name())
                .unwrap_or_else(|| UNKNOWN_STUDENT.to_string());
            ActivityEntry {
                kind: "grade",
                student_id: g.student_id,
                message: format!("{student_name} received a grade"),
                student_name,
                time: g.submitted_date,
            }
        })
        .collect()
}

pub fn summarize(snap: &Snapshot, today: NaiveDate) -> DashboardSummary {
    DashboardSummary {
        total_students: snap.students.len(),
        total_classes: snap.classes.len(),
        average_grade: grades::class_average_grade(&snap.grades),
        attendance_rate: attendance::todays_rate(&snap.attendance, today),
        today,
        today_attendance: snap
            .attendance
            .iter()
            .filter(|r| r.date == Some(today))
            .cloned()
            .collect(),
        recent_activity: recent_activity(snap, RECENT_ACTIVITY_LIMIT),
    }
}
