//! Token codec: HS256-signed claims carrying a subject and an expiry
//!
//! `verify_token` checks the signature and structure only. Expiry is left to
//! the caller, which compares `exp` against the clock after consulting the
//! session's stored expiry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decoded token payload. Carries no role data; roles are read live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (identity id)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Unique token id, so two tokens issued in the same second differ
    #[serde(default)]
    pub jti: String,
}

impl TokenClaims {
    pub fn subject(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// A freshly signed token and the instant it stops being valid
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn expires_at_unix(&self) -> i64 {
        self.expires_at.timestamp()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Sign a token for `subject` that expires `ttl` from now.
pub fn generate_token(
    subject: Uuid,
    secret: &str,
    ttl: chrono::Duration,
) -> Result<IssuedToken, TokenError> {
    let now = Utc::now();
    let expires_at = now + ttl;
    let claims = TokenClaims {
        sub: subject.to_string(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

/// Verify signature and structure, returning the claims even when expired.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed,
        }
    })
}
