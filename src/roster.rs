use crate::model::{Assignment, ClassSection, Student};
use std::cmp::Ordering;

/// Wire names: `name`, `email`, `grade`, `enrollmentDate`, `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Email,
    Grade,
    EnrollmentDate,
    Status,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" => Some(SortKey::Name),
            "email" => Some(SortKey::Email),
            "grade" => Some(SortKey::Grade),
            "enrollmentDate" => Some(SortKey::EnrollmentDate),
            "status" => Some(SortKey::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterQuery {
    pub query: String,
    pub sort: Option<(SortKey, SortDirection)>,
}

fn matches_query(s: &Student, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    s.full_name().to_lowercase().contains(needle)
        || s.email.to_lowercase().contains(needle)
        || s.grade.to_lowercase().contains(needle)
}

fn compare_by(key: SortKey, a: &Student, b: &Student) -> Ordering {
    match key {
        SortKey::Name => a
            .full_name()
            .to_lowercase()
            .cmp(&b.full_name().to_lowercase()),
        SortKey::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
        SortKey::Grade => a.grade.cmp(&b.grade),
        // A missing date orders like the empty string: before every date.
        SortKey::EnrollmentDate => a.enrollment_date.cmp(&b.enrollment_date),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

/// Filters and sorts a roster. The sort is stable in both directions: equal
/// keys keep their input order whether ascending or descending.
pub fn filter_and_sort(students: &[Student], q: &RosterQuery) -> Vec<Student> {
    let needle = q.query.to_lowercase();
    let mut out: Vec<Student> = students
        .iter()
        .filter(|s| matches_query(s, &needle))
        .cloned()
        .collect();

    if let Some((key, direction)) = q.sort {
        out.sort_by(|a, b| match direction {
            SortDirection::Asc => compare_by(key, a, b),
            SortDirection::Desc => compare_by(key, b, a),
        });
    }
    out
}

/// Enrolled students in student-list order. Ids with no matching student are
/// skipped.
pub fn class_roster(class: &ClassSection, students: &[Student]) -> Vec<Student> {
    students
        .iter()
        .filter(|s| class.enrolls(s.id))
        .cloned()
        .collect()
}

pub fn class_assignments(class_id: i64, assignments: &[Assignment]) -> Vec<Assignment> {
    assignments
        .iter()
        .filter(|a| a.class_id == class_id)
        .cloned()
        .collect()
}
