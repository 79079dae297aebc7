use crate::error::{CoreError, FieldError};
use crate::model::Student;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Student form rules. Every failing field is reported in one rejection.
pub fn validate_student(s: &Student) -> Result<(), CoreError> {
    let mut fields: Vec<FieldError> = Vec::new();

    if s.first_name.trim().is_empty() {
        fields.push(FieldError::new("firstName", "First name is required"));
    }
    if s.last_name.trim().is_empty() {
        fields.push(FieldError::new("lastName", "Last name is required"));
    }
    if s.email.trim().is_empty() {
        fields.push(FieldError::new("email", "Email is required"));
    } else if !is_valid_email(&s.email) {
        fields.push(FieldError::new("email", "Please enter a valid email address"));
    }
    if s.grade.trim().is_empty() {
        fields.push(FieldError::new("grade", "Grade is required"));
    }
    if s.date_of_birth.is_none() {
        fields.push(FieldError::new("dateOfBirth", "Date of birth is required"));
    }
    if s.enrollment_date.is_none() {
        fields.push(FieldError::new("enrollmentDate", "Enrollment date is required"));
    }

    if fields.is_empty() {
        return Ok(());
    }
    let message = if fields.len() == 1 {
        fields[0].message.clone()
    } else {
        format!("{} fields are invalid", fields.len())
    };
    Err(CoreError::ValidationRejected { message, fields })
}
