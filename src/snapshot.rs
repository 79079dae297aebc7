use crate::error::CoreError;
use crate::model::{Assignment, AttendanceRecord, ClassSection, EntityKind, Grade, Student};
use crate::normalize;
use std::collections::HashMap;

/// Owned, point-in-time copy of every entity collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub students: Vec<Student>,
    pub classes: Vec<ClassSection>,
    pub assignments: Vec<Assignment>,
    pub grades: Vec<Grade>,
    pub attendance: Vec<AttendanceRecord>,
}

impl Snapshot {
    /// Builds a snapshot from raw arrays keyed by collection name. Missing
    /// collections are empty.
    pub fn from_raw(raw: &serde_json::Value) -> Self {
        let get = |key: &str| raw.get(key).cloned().unwrap_or(serde_json::Value::Null);
        Snapshot {
            students: normalize::normalize_all(&get("students"), normalize::normalize_student),
            classes: normalize::normalize_all(&get("classes"), normalize::normalize_class),
            assignments: normalize::normalize_all(
                &get("assignments"),
                normalize::normalize_assignment,
            ),
            grades: normalize::normalize_all(&get("grades"), normalize::normalize_grade),
            attendance: normalize::normalize_all(
                &get("attendance"),
                normalize::normalize_attendance,
            ),
        }
    }

    pub fn class(&self, class_id: i64) -> Result<&ClassSection, CoreError> {
        ById::new(&self.classes).resolve(class_id)
    }
}

pub trait Identified {
    const KIND: EntityKind;
    fn id(&self) -> i64;
}

impl Identified for Student {
    const KIND: EntityKind = EntityKind::Student;
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for ClassSection {
    const KIND: EntityKind = EntityKind::Class;
    fn id(&self) -> i64 {
        self.id
    }
}

impl Identified for Assignment {
    const KIND: EntityKind = EntityKind::Assignment;
    fn id(&self) -> i64 {
        self.id
    }
}

/// Lookup by identifier, built once per aggregation call.
/// With duplicate ids the first record wins, matching a linear scan.
pub struct ById<'a, T> {
    map: HashMap<i64, &'a T>,
}

impl<'a, T: Identified> ById<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        let mut map: HashMap<i64, &'a T> = HashMap::with_capacity(items.len());
        for item in items {
            map.entry(item.id()).or_insert(item);
        }
        Self { map }
    }

    pub fn get(&self, id: i64) -> Option<&'a T> {
        self.map.get(&id).copied()
    }

    pub fn resolve(&self, id: i64) -> Result<&'a T, CoreError> {
        self.get(id).ok_or_else(|| CoreError::not_found(T::KIND, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_raw_normalizes_each_collection() {
        let snap = Snapshot::from_raw(&json!({
            "students": [{ "Id": 1, "first_name_c": "Ann" }],
            "classes": [{ "Id": 2, "Name": "Biology", "student_ids_c": "1" }],
            "grades": "not an array"
        }));
        assert_eq!(snap.students.len(), 1);
        assert_eq!(snap.students[0].first_name, "Ann");
        assert_eq!(snap.classes[0].student_ids, vec![1]);
        assert!(snap.grades.is_empty());
        assert!(snap.attendance.is_empty());
    }

    #[test]
    fn by_id_reports_unresolved_reference() {
        let students = vec![
            Student {
                id: 1,
                first_name: "Ann".into(),
                ..Default::default()
            },
            Student {
                id: 1,
                first_name: "Shadow".into(),
                ..Default::default()
            },
        ];
        let idx = ById::new(&students);
        assert_eq!(idx.get(1).map(|s| s.first_name.as_str()), Some("Ann"));
        assert_eq!(
            idx.resolve(9).unwrap_err(),
            CoreError::not_found(EntityKind::Student, 9)
        );
    }
}
