// Error handling module for the Tribe API
// Provides the closed error taxonomy and its HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};
use validator::{ValidationErrors, ValidationErrorsKind};

/// Main error type for the API
/// All services and handlers return Result<T, ApiError>
///
/// The set of variants is closed: every failure raised by the token service,
/// the authentication service, the authorization middleware and the account
/// operations is one of these kinds.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller-supplied input is missing or malformed for the named field
    /// Maps to HTTP 400 Bad Request
    #[error("Invalid or missing input: {0}")]
    InvalidInput(String),

    /// Well-formed request that violates a business rule
    /// Maps to HTTP 400 Bad Request
    #[error("{0}")]
    InvalidOperation(String),

    /// Referenced resource does not exist
    /// Maps to HTTP 404 Not Found
    #[error("{resource_type} does not exist: {identifier}")]
    NonExistentResource {
        resource_type: String,
        identifier: String,
    },

    /// Caller is not authenticated, or what they present no longer authorizes them
    /// Maps to HTTP 401 Unauthorized
    #[error("{0}")]
    Unauthorized(String),

    /// Required operational configuration is absent or invalid
    /// Aborts startup; never expected on the request path
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal failure
    /// Maps to HTTP 500, details are never sent to the client
    #[error("Server error: {0}")]
    Server(String),
}

/// Error body shared by every route
///
/// `{ "status": "error", "error": "<message>" }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: error.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Shorthand for a missing resource
    pub fn not_found(resource_type: &str, identifier: impl Into<String>) -> Self {
        ApiError::NonExistentResource {
            resource_type: resource_type.to_string(),
            identifier: identifier.into(),
        }
    }

    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logging level follows severity:
    /// - error!: server and configuration failures (500-level)
    /// - warn!: rejected credentials or tokens
    /// - debug!: expected client errors
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::InvalidInput(field) => {
                debug!("Invalid input for field: {}", field);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(self.to_string()))
            }
            ApiError::InvalidOperation(message) => {
                debug!("Rejected operation: {}", message);
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message.clone()))
            }
            ApiError::NonExistentResource { resource_type, identifier } => {
                debug!("Resource not found: {} {}", resource_type, identifier);
                (StatusCode::NOT_FOUND, ErrorResponse::new(self.to_string()))
            }
            ApiError::Unauthorized(message) => {
                warn!("Unauthorized request: {}", message);
                (StatusCode::UNAUTHORIZED, ErrorResponse::new(message.clone()))
            }
            ApiError::Configuration(message) => {
                error!("Configuration error reached a request: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal server error occurred"),
                )
            }
            ApiError::Server(message) => {
                // Full detail stays in the logs
                error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal server error occurred"),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::NonExistentResource { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert sqlx errors to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Server(format!("database: {}", error))
    }
}

/// Convert validator errors to ApiError, naming the first offending field
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::InvalidInput(first_invalid_field(&errors).unwrap_or_else(|| "data".to_string()))
    }
}

/// Walk nested validation errors down to a leaf field name
///
/// Keys are sorted so the reported field is stable across runs.
fn first_invalid_field(errors: &ValidationErrors) -> Option<String> {
    let map = errors.errors();
    let mut keys: Vec<&&'static str> = map.keys().collect();
    keys.sort();

    let key = keys.into_iter().next()?;
    match map.get(*key)? {
        ValidationErrorsKind::Field(_) => Some(key.to_string()),
        ValidationErrorsKind::Struct(inner) => {
            first_invalid_field(inner).or_else(|| Some(key.to_string()))
        }
        ValidationErrorsKind::List(items) => items
            .values()
            .next()
            .and_then(|inner| first_invalid_field(inner))
            .or_else(|| Some(key.to_string())),
    }
}
