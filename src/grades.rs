use crate::error::{CoreError, FieldError};
use crate::model::{Assignment, ClassSection, EntityKind, Grade};
use crate::roster;
use crate::snapshot::{ById, Snapshot};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

/// Presentation color class; always derived from a [`LetterGrade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeBucket {
    #[serde(rename = "grade-a")]
    A,
    #[serde(rename = "grade-b")]
    B,
    #[serde(rename = "grade-c")]
    C,
    #[serde(rename = "grade-d")]
    D,
    #[serde(rename = "grade-f")]
    F,
}

impl LetterGrade {
    pub fn bucket(self) -> GradeBucket {
        match self {
            LetterGrade::A => GradeBucket::A,
            LetterGrade::B => GradeBucket::B,
            LetterGrade::C => GradeBucket::C,
            LetterGrade::D => GradeBucket::D,
            LetterGrade::F => GradeBucket::F,
        }
    }
}

/// JS-style `Math.round`: halves round up.
pub fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// `None` when either side is zero or not a finite number.
pub fn letter_grade(score: f64, max_score: f64) -> Option<LetterGrade> {
    if score == 0.0 || max_score == 0.0 || !score.is_finite() || !max_score.is_finite() {
        return None;
    }
    let percentage = (score / max_score) * 100.0;
    let letter = if percentage >= 90.0 {
        LetterGrade::A
    } else if percentage >= 80.0 {
        LetterGrade::B
    } else if percentage >= 70.0 {
        LetterGrade::C
    } else if percentage >= 60.0 {
        LetterGrade::D
    } else {
        LetterGrade::F
    };
    Some(letter)
}

pub fn grade_bucket(score: f64, max_score: f64) -> Option<GradeBucket> {
    letter_grade(score, max_score).map(LetterGrade::bucket)
}

fn percent_of(score: f64, max_score: f64) -> f64 {
    if max_score > 0.0 {
        100.0 * score / max_score
    } else {
        0.0
    }
}

/// Mean of per-grade percentages for one student, rounded to an integer.
///
/// Each grade weighs the same regardless of its assignment's maximum. Returns
/// 0 when the student has no grades and `NotFound` when a grade points at an
/// assignment that is not in `assignments`.
pub fn student_average(
    student_id: i64,
    grades: &[Grade],
    assignments: &[Assignment],
) -> Result<i64, CoreError> {
    let by_id = ById::new(assignments);
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    for g in grades.iter().filter(|g| g.student_id == student_id) {
        let assignment = by_id.resolve(g.assignment_id)?;
        sum += percent_of(g.score, assignment.max_score);
        count += 1;
    }
    if count == 0 {
        return Ok(0);
    }
    Ok(round_half_up(sum / count as f64))
}

/// Rounded mean of raw scores across every grade passed in. This is the
/// dashboard figure and intentionally ignores assignment maximums.
pub fn class_average_grade(grades: &[Grade]) -> i64 {
    if grades.is_empty() {
        return 0;
    }
    let sum: f64 = grades.iter().map(|g| g.score).sum();
    round_half_up(sum / grades.len() as f64)
}

pub fn validate_score(score: f64, assignment: &Assignment) -> Result<(), CoreError> {
    if !score.is_finite() {
        return Err(CoreError::rejected("score", "Score must be a number"));
    }
    if score < 0.0 {
        return Err(CoreError::rejected("score", "Score cannot be negative"));
    }
    if score > assignment.max_score {
        return Err(CoreError::rejected(
            "score",
            format!("Score cannot exceed {} points", assignment.max_score),
        ));
    }
    Ok(())
}

/// The grade record to store for one grid edit.
///
/// An existing grade for the (student, assignment) pair keeps its id and
/// submission date; a new one is dated `today` and has id 0.
pub fn score_entry(
    grades: &[Grade],
    assignments: &[Assignment],
    student_id: i64,
    assignment_id: i64,
    score: f64,
    today: NaiveDate,
) -> Result<Grade, CoreError> {
    let assignment = ById::new(assignments).resolve(assignment_id)?;
    validate_score(score, assignment)?;

    let existing = grades
        .iter()
        .find(|g| g.student_id == student_id && g.assignment_id == assignment_id);
    Ok(match existing {
        Some(g) => Grade {
            score,
            ..g.clone()
        },
        None => Grade {
            id: 0,
            student_id,
            assignment_id,
            score,
            submitted_date: Some(today),
        },
    })
}

/// Checks a bulk replace before it is stored. Every rejected row is reported.
pub fn validate_grade_batch(grades: &[Grade], assignments: &[Assignment]) -> Result<(), CoreError> {
    let by_id = ById::new(assignments);
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    let mut fields: Vec<FieldError> = Vec::new();

    for (i, g) in grades.iter().enumerate() {
        let field = format!("grades[{i}]");
        let Some(assignment) = by_id.get(g.assignment_id) else {
            fields.push(FieldError::new(
                &field,
                format!("{} {} not found", EntityKind::Assignment, g.assignment_id),
            ));
            continue;
        };
        if let Err(CoreError::ValidationRejected { message, .. }) = validate_score(g.score, assignment)
        {
            fields.push(FieldError::new(&field, message));
        }
        if !seen.insert((g.student_id, g.assignment_id)) {
            fields.push(FieldError::new(
                &field,
                "duplicate grade for student and assignment",
            ));
        }
    }

    if fields.is_empty() {
        return Ok(());
    }
    Err(CoreError::ValidationRejected {
        message: format!("{} grade(s) rejected", fields.len()),
        fields,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCell {
    pub assignment_id: i64,
    pub score: Option<f64>,
    pub letter: Option<LetterGrade>,
    pub bucket: Option<GradeBucket>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheetRow {
    pub student_id: i64,
    pub display_name: String,
    pub cells: Vec<GradeCell>,
    pub average: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSheet {
    pub class_id: i64,
    pub class_name: String,
    pub assignments: Vec<Assignment>,
    pub rows: Vec<GradeSheetRow>,
}

/// Grade book for one class: a column per class assignment and a row per
/// enrolled student. Row averages span all of the student's grades.
pub fn grade_sheet(class: &ClassSection, snap: &Snapshot) -> Result<GradeSheet, CoreError> {
    let students = roster::class_roster(class, &snap.students);
    let assignments = roster::class_assignments(class.id, &snap.assignments);

    let mut rows: Vec<GradeSheetRow> = Vec::with_capacity(students.len());
    for s in &students {
        let cells = assignments
            .iter()
            .map(|a| {
                let score = snap
                    .grades
                    .iter()
                    .find(|g| g.student_id == s.id && g.assignment_id == a.id)
                    .map(|g| g.score);
                GradeCell {
                    assignment_id: a.id,
                    score,
                    letter: score.and_then(|v| letter_grade(v, a.max_score)),
                    bucket: score.and_then(|v| grade_bucket(v, a.max_score)),
                }
            })
            .collect();
        rows.push(GradeSheetRow {
            student_id: s.id,
            display_name: s.full_name(),
            cells,
            average: student_average(s.id, &snap.grades, &snap.assignments)?,
        });
    }

    Ok(GradeSheet {
        class_id: class.id,
        class_name: class.name.clone(),
        assignments,
        rows,
    })
}
