//! Errors reported by a backing store
//!
//! An [`OperationError`] may carry an HTTP status. Whether it does decides how
//! the [`ChainMode`](crate::chain::ChainMode) routes it.
//!
//! # Example
//!
//! ```rust
//! use store_http::store::{FieldError, OperationError};
//!
//! let error = OperationError::validation(vec![FieldError::new("name", "Field required")]);
//! assert_eq!(error.status, Some(422));
//! assert!(error.has_status());
//!
//! let error = OperationError::internal("connection reset");
//! assert!(!error.has_status());
//! assert_eq!(error.status_code().as_u16(), 500);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl FieldError {
    /// Create a field error
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a store operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    /// Human-readable error message
    pub message: String,
    /// HTTP status declared by the store, if any
    pub status: Option<u16>,
    /// Field-level details, in the order the store reported them
    pub errors: Vec<FieldError>,
}

impl OperationError {
    /// Create an error with an explicit status
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            errors: Vec::new(),
        }
    }

    /// Validation failure (422) with field details
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            message: "Unprocessable Entity".to_string(),
            status: Some(StatusCode::UNPROCESSABLE_ENTITY.as_u16()),
            errors,
        }
    }

    /// Bad request (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST.as_u16(), message)
    }

    /// Permission denied (403)
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN.as_u16(), message)
    }

    /// Record not found (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND.as_u16(), message)
    }

    /// Conditional write precondition failed (412)
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::PRECONDITION_FAILED.as_u16(), message)
    }

    /// Operation not offered by the store (501)
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_IMPLEMENTED.as_u16(), message)
    }

    /// Unclassified failure with no declared status
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            errors: Vec::new(),
        }
    }

    /// Attach field details
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }

    /// Whether the store declared an HTTP status
    #[must_use]
    pub fn has_status(&self) -> bool {
        self.status.is_some()
    }

    /// Status to respond with: the declared one, or 500
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Default error body: `{message, errors?}`
    #[must_use]
    pub fn to_body(&self) -> Value {
        if self.errors.is_empty() {
            json!({ "message": self.message })
        } else {
            json!({ "message": self.message, "errors": self.errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_statuses() {
        assert_eq!(OperationError::bad_request("x").status, Some(400));
        assert_eq!(OperationError::forbidden("x").status, Some(403));
        assert_eq!(OperationError::not_found("x").status, Some(404));
        assert_eq!(OperationError::precondition_failed("x").status, Some(412));
        assert_eq!(OperationError::not_implemented("x").status, Some(501));
        assert_eq!(OperationError::internal("x").status, None);
    }

    #[test]
    fn test_status_code_fallback() {
        assert_eq!(
            OperationError::internal("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            OperationError::with_status(9999, "x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            OperationError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_body_without_field_errors() {
        let body = OperationError::not_found("No such person").to_body();
        assert_eq!(body, json!({ "message": "No such person" }));
    }

    #[test]
    fn test_body_with_field_errors() {
        let body = OperationError::validation(vec![
            FieldError::new("name", "Field required"),
            FieldError::new("age", "Must be a number"),
        ])
        .to_body();

        assert_eq!(
            body,
            json!({
                "message": "Unprocessable Entity",
                "errors": [
                    { "field": "name", "message": "Field required" },
                    { "field": "age", "message": "Must be a number" }
                ]
            })
        );
    }

    #[test]
    fn test_display_is_message() {
        assert_eq!(OperationError::forbidden("Nope").to_string(), "Nope");
    }
}
