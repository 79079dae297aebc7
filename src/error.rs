use crate::model::EntityKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Failures surfaced by the derivation layer.
///
/// Aggregating zero records is not an error: those operations return their
/// zero value (0%, empty feed, zeroed counts).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("{message}")]
    ValidationRejected {
        message: String,
        fields: Vec<FieldError>,
    },
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        CoreError::NotFound { kind, id }
    }

    pub fn rejected(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        CoreError::ValidationRejected {
            fields: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "not_found",
            CoreError::ValidationRejected { .. } => "validation_rejected",
        }
    }

    pub fn details(&self) -> serde_json::Value {
        match self {
            CoreError::NotFound { kind, id } => serde_json::json!({
                "kind": kind.as_str(),
                "id": id,
            }),
            CoreError::ValidationRejected { fields, .. } => serde_json::json!({
                "fields": fields,
            }),
        }
    }
}
