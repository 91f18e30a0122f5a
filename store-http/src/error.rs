//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::store::OperationError;

/// Result type alias using the adapter error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the adapter
///
/// These are failures produced by the adapter itself (option parsing,
/// registration, configuration). Failures reported by a backing store are
/// carried by [`OperationError`](crate::store::OperationError) instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// A `sortBy` token named a field outside the store's sortable set
    #[error("Field selected for sorting invalid: {0}")]
    InvalidSortField(String),

    /// Handler requested for an operation kind the factory does not know
    #[error("Unknown operation '{0}': expected one of get, getQuery, put, post, delete")]
    UnknownOperation(String),

    /// Store has no public URL to derive routes from
    #[error("Routes can only be registered for a store with a public URL")]
    MissingPublicUrl,

    /// Store public URL does not end with a `:token`
    #[error("A store's URL needs to end with a :columned token representing its ID, this is not valid: {0}")]
    InvalidPublicUrl(String),

    /// Malformed request that never reached the store
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the router's body limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error renders with when it reaches the default error pipeline
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidSortField(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Config(_)
            | Error::UnknownOperation(_)
            | Error::MissingPublicUrl
            | Error::InvalidPublicUrl(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::InvalidSortField(_) => "INVALID_SORT_FIELD",
            Error::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Error::MissingPublicUrl | Error::InvalidPublicUrl(_) => "INVALID_PUBLIC_URL",
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Error::Io(_) => "IO_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            status: status.as_u16(),
        }
    }

    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't leak internals for server-side failures
        let message = if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse::with_code(status, self.code(), message)),
        )
            .into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// An error handed past the handler to the router's error pipeline
///
/// Its default response is inserted into the response extensions as well,
/// so outer middleware can tell a forwarded error from a direct one.
#[derive(Debug, Clone, Error)]
pub enum ForwardedError {
    /// The request was rejected before reaching the store
    #[error(transparent)]
    Request(Arc<Error>),

    /// The store failed and the chain mode forwarded the failure
    #[error(transparent)]
    Store(OperationError),
}

impl ForwardedError {
    /// Wrap an adapter error
    pub fn request(error: Error) -> Self {
        Self::Request(Arc::new(error))
    }

    /// HTTP status of the default response
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Request(error) => error.status_code(),
            Self::Store(error) => error.status_code(),
        }
    }
}

impl From<Error> for ForwardedError {
    fn from(error: Error) -> Self {
        Self::request(error)
    }
}

impl From<OperationError> for ForwardedError {
    fn from(error: OperationError) -> Self {
        Self::Store(error)
    }
}

impl IntoResponse for ForwardedError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = match &self {
            Self::Request(error) => {
                let message = if status.is_server_error() {
                    tracing::error!(code = error.code(), "{}", error);
                    "Internal server error".to_string()
                } else {
                    error.to_string()
                };
                (
                    status,
                    Json(ErrorResponse::with_code(status, error.code(), message)),
                )
                    .into_response()
            }
            Self::Store(error) if !error.has_status() => {
                tracing::error!("Unhandled store error: {}", error);
                (
                    status,
                    Json(ErrorResponse::new(status, "Internal server error")),
                )
                    .into_response()
            }
            Self::Store(error) => (status, Json(error.to_body())).into_response(),
        };
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sort_field_message() {
        let err = Error::InvalidSortField("weight".to_string());
        assert_eq!(err.to_string(), "Field selected for sorting invalid: weight");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_registration_errors_are_server_errors() {
        assert_eq!(
            Error::InvalidPublicUrl("/people".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::MissingPublicUrl.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_into_response() {
        let response = Error::BadRequest("body is not JSON".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_payload_too_large_into_response() {
        let err = Error::PayloadTooLarge("length limit exceeded".to_string());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_internal_into_response() {
        let response = Error::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_forwarded_store_error_keeps_status() {
        let response = ForwardedError::from(OperationError::not_found("gone")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(matches!(
            response.extensions().get::<ForwardedError>(),
            Some(ForwardedError::Store(e)) if e.message == "gone"
        ));
    }

    #[test]
    fn test_forwarded_statusless_error_is_500() {
        let response = ForwardedError::from(OperationError::internal("db down")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_forwarded_request_error() {
        let forwarded = ForwardedError::from(Error::InvalidSortField("weight".to_string()));
        assert_eq!(forwarded.status_code(), StatusCode::BAD_REQUEST);
        let response = forwarded.into_response();
        assert!(response.extensions().get::<ForwardedError>().is_some());
    }
}
