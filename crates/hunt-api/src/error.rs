//! API error types and handling.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hunt_core::{db::DbError, ServiceError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Message returned for failures whose detail stays in the server log.
const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Malformed body, unknown option or a field that may not be set.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or expired session.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Conflict with existing state, e.g. a duplicate claim code.
    #[error("{0}")]
    Conflict(String),

    /// Validation error with field-level details.
    #[error("Validation failed")]
    ValidationError(ValidationErrorDetails),

    /// Too many recent failed claim attempts.
    #[error("Too many failed claim attempts. Try again in {retry_after_secs} seconds.")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account is disabled.
    #[error("Account disabled")]
    AccountDisabled,
}

/// Details for field-level validation errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetails {
    /// Overall validation error message.
    pub message: String,
    /// Field-specific errors.
    pub fields: HashMap<String, Vec<FieldError>>,
}

/// A single field validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Error code (e.g. "length", "range").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationErrorDetails {
    /// Creates a new validation error with a single field error.
    pub fn field(field: &str, code: &str, message: &str) -> Self {
        let mut fields = HashMap::new();
        fields.insert(
            field.to_string(),
            vec![FieldError {
                code: code.to_string(),
                message: message.to_string(),
            }],
        );
        Self::from_fields(fields)
    }

    /// Creates a validation error from multiple field errors.
    pub fn from_fields(fields: HashMap<String, Vec<FieldError>>) -> Self {
        let message = match fields.keys().next() {
            Some(field) if fields.len() == 1 => format!("Validation failed for field '{}'", field),
            _ => format!("Validation failed for {} fields", fields.len()),
        };
        Self { message, fields }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Human-readable error message.
    pub error: String,
    /// Error code for programmatic handling.
    pub code: String,
    /// Field errors for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Seconds until a rate-limited user may claim again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::AccountDisabled => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::AccountDisabled => "ACCOUNT_DISABLED",
        }
    }

    /// Creates a validation error for a single field.
    pub fn validation_field(field: &str, code: &str, message: &str) -> Self {
        ApiError::ValidationError(ValidationErrorDetails::field(field, code, message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut details = None;
        let mut retry_after_seconds = None;

        let message = match &self {
            ApiError::ValidationError(fields) => {
                details = serde_json::to_value(&fields.fields).ok();
                fields.message.clone()
            }
            ApiError::RateLimitExceeded { retry_after_secs } => {
                retry_after_seconds = Some(*retry_after_secs);
                self.to_string()
            }
            ApiError::Internal(detail) | ApiError::Database(detail) => {
                error!(code = self.error_code(), error = %detail, "Request failed");
                GENERIC_ERROR_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.error_code().to_string(),
            details,
            retry_after_seconds,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {} not found", entity, id))
            }
            DbError::Constraint(msg) => ApiError::Conflict(msg),
            err => ApiError::Database(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} not found: {}", entity, id))
            }
            ServiceError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::RateLimited { retry_after_secs } => {
                ApiError::RateLimitExceeded { retry_after_secs }
            }
            ServiceError::Database(err) => err.into(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields = err
            .field_errors()
            .into_iter()
            .map(|(field_name, field_errors)| {
                let errors = field_errors
                    .iter()
                    .map(|e| {
                        let code = e.code.to_string();
                        let message = e.message.clone().map(|m| m.to_string()).unwrap_or_else(|| {
                            format!("Field '{}' failed validation: {}", field_name, code)
                        });
                        FieldError { code, message }
                    })
                    .collect();
                (field_name.to_string(), errors)
            })
            .collect();

        ApiError::ValidationError(ValidationErrorDetails::from_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_of(ApiError::Forbidden("Admin access required".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Admin access required");
        assert_eq!(body["code"], "FORBIDDEN");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_errors_hide_detail() {
        let (status, body) =
            body_of(ApiError::Database("connection reset by peer".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_ERROR_MESSAGE);
        assert!(!body.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_rate_limit_carries_retry_after() {
        let (status, body) = body_of(ApiError::RateLimitExceeded {
            retry_after_secs: 42,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["retryAfterSeconds"], 42);
    }

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = ServiceError::InvalidArgument("bad clear type".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = ServiceError::not_found("User", "ghost@example.com").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = ServiceError::Conflict("already claimed".into()).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = ServiceError::Database(DbError::Constraint("dup".into())).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = ServiceError::Database(DbError::Query("boom".into())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_validation_error_details() {
        let (status, body) =
            body_of(ApiError::validation_field("points", "range", "Points must not be negative"))
                .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"]["points"][0]["code"], "range");
    }
}
