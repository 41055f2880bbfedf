//! Common error types and handling for Gatehouse

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub constraint: String,
    pub rejected_value: serde_json::Value,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        constraint: impl Into<String>,
        rejected_value: serde_json::Value,
    ) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            rejected_value,
        }
    }

    /// Flatten `validator` errors into one record per failed constraint,
    /// ordered by field name.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Vec<FieldError> {
        let mut records: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| FieldError {
                    field: field.to_string(),
                    constraint: failure.code.to_string(),
                    rejected_value: failure
                        .params
                        .get("value")
                        .cloned()
                        .unwrap_or(serde_json::Value::Null),
                })
            })
            .collect();
        records.sort_by(|a, b| a.field.cmp(&b.field).then(a.constraint.cmp(&b.constraint)));
        records
    }
}

/// Common error type for the Gatehouse application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Too many requests")]
    RateLimit,
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ValidationFailed(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal failures never leak their detail.
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors with full context
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
        }

        let body = match &self {
            Error::ValidationFailed(errors) => Json(json!({
                "message": self.public_message(),
                "errors": errors,
            })),
            _ => Json(json!({ "message": self.public_message() })),
        };

        (status, body).into_response()
    }
}
