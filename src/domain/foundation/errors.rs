//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    InvalidFormat,

    // Not found errors
    SessionNotFound,
    CaseNotFound,
    NotificationNotFound,
    AvailabilityNotFound,

    // State errors
    InvalidStateTransition,
    DuplicateRequest,
    SlotUnavailable,

    // Authorization errors
    Forbidden,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::CaseNotFound => "CASE_NOT_FOUND",
            ErrorCode::NotificationNotFound => "NOTIFICATION_NOT_FOUND",
            ErrorCode::AvailabilityNotFound => "AVAILABILITY_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::DuplicateRequest => "DUPLICATE_REQUEST",
            ErrorCode::SlotUnavailable => "SLOT_UNAVAILABLE",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates an invalid-transition error carrying the current status.
    ///
    /// Callers that reject an operation because of the entity's current
    /// lifecycle status must use this constructor so the status always
    /// travels with the error.
    pub fn invalid_transition(
        current_status: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ErrorCode::InvalidStateTransition, message)
            .with_detail("current_status", current_status.to_string())
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Annotates which step of a multi-step workflow failed.
    pub fn with_step(self, step: impl Into<String>) -> Self {
        self.with_detail("step", step.into())
    }

    /// Returns true if this error represents a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::SessionNotFound
                | ErrorCode::CaseNotFound
                | ErrorCode::NotificationNotFound
                | ErrorCode::AvailabilityNotFound
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::EmptyField { .. } => ErrorCode::EmptyField,
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        };
        DomainError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("student");
        assert_eq!(format!("{}", err), "Field 'student' cannot be empty");
    }

    #[test]
    fn validation_error_invalid_format_displays_correctly() {
        let err = ValidationError::invalid_format("interval", "start must be before end");
        assert_eq!(
            format!("{}", err),
            "Field 'interval' has invalid format: start must be before end"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::SessionNotFound, "Session not found");
        assert_eq!(format!("{}", err), "[SESSION_NOT_FOUND] Session not found");
    }

    #[test]
    fn invalid_transition_carries_current_status() {
        let err = DomainError::invalid_transition("completed", "Session cannot be rescheduled");
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(
            err.details.get("current_status"),
            Some(&"completed".to_string())
        );
    }

    #[test]
    fn with_step_annotates_workflow_step() {
        let err = DomainError::new(ErrorCode::DatabaseError, "write failed")
            .with_step("session closed, but case update failed");
        assert_eq!(
            err.details.get("step"),
            Some(&"session closed, but case update failed".to_string())
        );
    }

    #[test]
    fn validation_error_converts_to_domain_error() {
        let err: DomainError = ValidationError::empty_field("kind").into();
        assert_eq!(err.code, ErrorCode::EmptyField);
    }

    #[test]
    fn is_not_found_covers_entity_codes() {
        assert!(DomainError::new(ErrorCode::CaseNotFound, "x").is_not_found());
        assert!(!DomainError::new(ErrorCode::Forbidden, "x").is_not_found());
    }
}
