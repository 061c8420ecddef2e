//! Error types for Qamus

use serde::ser::SerializeStruct;
use serde::Serialize;
use thiserror::Error;

/// A single schema violation found while validating caller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum QamusError {
    #[error("Invalid parameters: {}", join_fields(.0))]
    InvalidParameters(Vec<FieldViolation>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to fetch {0}")]
    FetchFailed(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

fn join_fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl QamusError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        QamusError::InvalidParameters(vec![FieldViolation::new(field, message)])
    }

    /// HTTP-style status code for the error kind.
    pub fn status(&self) -> u16 {
        match self {
            QamusError::InvalidParameters(_) => 400,
            QamusError::Auth(_) => 401,
            QamusError::NotFound(_) => 404,
            QamusError::FetchFailed(_) | QamusError::Unexpected(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QamusError::InvalidParameters(_) => "invalid_parameters",
            QamusError::NotFound(_) => "not_found",
            QamusError::FetchFailed(_) => "fetch_failed",
            QamusError::Auth(_) => "auth_error",
            QamusError::Unexpected(_) => "unexpected",
        }
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            QamusError::InvalidParameters(violations) => violations,
            _ => &[],
        }
    }
}

impl Serialize for QamusError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let violations = self.violations();
        let len = if violations.is_empty() { 3 } else { 4 };
        let mut state = serializer.serialize_struct("QamusError", len)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("message", &self.to_string())?;
        if !violations.is_empty() {
            state.serialize_field("details", violations)?;
        }
        state.end()
    }
}
