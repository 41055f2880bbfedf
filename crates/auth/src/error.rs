//! Authentication errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::credentials::CredentialError;

/// Rejection raised by the session verifier and the permission gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credential in the request
    Credentials(CredentialError),
    /// Signature or structure check failed
    InvalidToken,
    /// Protected route, but no session row carries the token
    SessionNotFound,
    /// Token subject differs from the session owner
    InvalidSession,
    ExpiredSession,
    /// Gate reached without a bound identity
    NotAuthenticated,
    PermissionDenied,
    SessionLoadError,
    IdentityLoadError,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::SessionLoadError | AuthError::IdentityLoadError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::Credentials(e) => format!("Unauthorized, {}", e),
            AuthError::InvalidToken => "Unauthorized, invalid token".to_string(),
            AuthError::SessionNotFound => "Unauthorized, session not found".to_string(),
            AuthError::InvalidSession => "Unauthorized, invalid session".to_string(),
            AuthError::ExpiredSession => "Unauthorized, expired session".to_string(),
            AuthError::NotAuthenticated => "Unauthorized, authentication required".to_string(),
            AuthError::PermissionDenied => {
                "Unauthorized, permission access failed: you are not allowed!".to_string()
            }
            AuthError::SessionLoadError => "Failed to load session".to_string(),
            AuthError::IdentityLoadError => "Failed to load identity".to_string(),
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for AuthError {}

impl From<CredentialError> for AuthError {
    fn from(e: CredentialError) -> Self {
        AuthError::Credentials(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "message": self.message() }));
        (self.status_code(), body).into_response()
    }
}
