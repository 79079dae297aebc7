use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Student,
    Class,
    Assignment,
    Grade,
    Attendance,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Class => "class",
            EntityKind::Assignment => "assignment",
            EntityKind::Grade => "grade",
            EntityKind::Attendance => "attendance",
        }
    }

    /// Accepts singular or plural wire names ("student", "students").
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" | "students" => Some(EntityKind::Student),
            "class" | "classes" => Some(EntityKind::Class),
            "assignment" | "assignments" => Some(EntityKind::Assignment),
            "grade" | "grades" => Some(EntityKind::Grade),
            "attendance" => Some(EntityKind::Attendance),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Pending => "pending",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(StudentStatus::Active),
            "inactive" => Some(StudentStatus::Inactive),
            "pending" => Some(StudentStatus::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentCategory {
    Homework,
    Quiz,
    Test,
    Project,
    Participation,
}

impl AssignmentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentCategory::Homework => "homework",
            AssignmentCategory::Quiz => "quiz",
            AssignmentCategory::Test => "test",
            AssignmentCategory::Project => "project",
            AssignmentCategory::Participation => "participation",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "homework" => Some(AssignmentCategory::Homework),
            "quiz" => Some(AssignmentCategory::Quiz),
            "test" => Some(AssignmentCategory::Test),
            "project" => Some(AssignmentCategory::Project),
            "participation" => Some(AssignmentCategory::Participation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            "excused" => Some(AttendanceStatus::Excused),
            _ => None,
        }
    }
}

/// Identifier `0` means the store has not assigned one yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade: String,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_date: Option<NaiveDate>,
    pub status: StudentStatus,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSection {
    pub id: i64,
    pub name: String,
    pub subject: String,
    pub period: String,
    pub room: String,
    /// De-duplicated; first occurrence wins.
    pub student_ids: Vec<i64>,
}

impl ClassSection {
    pub fn enrolls(&self, student_id: i64) -> bool {
        self.student_ids.contains(&student_id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    pub max_score: f64,
    pub due_date: Option<NaiveDate>,
    pub category: Option<AssignmentCategory>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    pub score: f64,
    pub submitted_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub date: Option<NaiveDate>,
    /// `None` when the source carried a status we do not recognise.
    pub status: Option<AttendanceStatus>,
}
