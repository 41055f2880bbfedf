//! Concrete authentication backend
//!
//! Holds the signing configuration plus the session and identity stores,
//! and runs the session-verification and permission checks.

use std::sync::Arc;

use axum::http::request::Parts;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::credentials::extract_token;
use crate::error::AuthError;
use crate::jwt::{generate_token, verify_token, IssuedToken, TokenError};
use crate::pg::{PgIdentityReader, PgSessionStore};
use crate::session::{IdentityReader, SessionStore};

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    config: AuthConfig,
    sessions: Arc<dyn SessionStore>,
    identities: Arc<dyn IdentityReader>,
}

impl AuthBackend {
    pub fn new(
        config: AuthConfig,
        sessions: Arc<dyn SessionStore>,
        identities: Arc<dyn IdentityReader>,
    ) -> Self {
        Self {
            config,
            sessions,
            identities,
        }
    }

    /// Backend over the Postgres session and identity stores
    pub fn postgres(pool: PgPool, config: AuthConfig) -> Self {
        Self::new(
            config,
            Arc::new(PgSessionStore::new(pool.clone())),
            Arc::new(PgIdentityReader::new(pool)),
        )
    }

    #[mutants::skip] // Plain accessor
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn sessions(&self) -> &dyn SessionStore {
        self.sessions.as_ref()
    }

    /// Sign a token for `user_id` with the configured lifetime
    pub fn issue_token(&self, user_id: Uuid) -> Result<IssuedToken, TokenError> {
        generate_token(user_id, &self.config.jwt_secret, self.config.token_ttl)
    }

    /// Run the session verifier against a request.
    ///
    /// Steps run in a fixed order: extract the credential, load the session,
    /// verify the signature, match the subject, then check the stored expiry
    /// followed by the token's own expiry. `Ok(None)` means no session row
    /// carries the token; callers decide whether that is acceptable.
    pub async fn authorize(&self, parts: &Parts) -> Result<Option<AuthContext>, AuthError> {
        let token = extract_token(parts).map_err(|e| {
            tracing::debug!(error = %e, "Credential extraction failed");
            AuthError::from(e)
        })?;

        let session = self.sessions.get_by_token(&token).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load session");
            AuthError::SessionLoadError
        })?;

        let Some(session) = session else {
            return Ok(None);
        };

        let claims = verify_token(&token, &self.config.jwt_secret)
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.subject() != Some(session.user_id) {
            tracing::debug!(session_id = %session.id, "Token subject does not match session owner");
            return Err(AuthError::InvalidSession);
        }

        let now = Utc::now();
        if session.is_expired_at(now) || claims.is_expired_at(now) {
            tracing::debug!(session_id = %session.id, "Session expired");
            return Err(AuthError::ExpiredSession);
        }

        Ok(Some(AuthContext::from(&session)))
    }

    /// Check the identity's current role against an allow-list.
    ///
    /// The role is read from the identity store on every call.
    pub async fn check_permission(
        &self,
        context: &AuthContext,
        allowed: &[Uuid],
    ) -> Result<(), AuthError> {
        let role = self
            .identities
            .role_of(context.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %context.user_id, "Failed to load identity role");
                AuthError::IdentityLoadError
            })?;

        match role {
            Some(role_id) if allowed.contains(&role_id) => Ok(()),
            _ => {
                tracing::debug!(user_id = %context.user_id, "Permission denied");
                Err(AuthError::PermissionDenied)
            }
        }
    }
}
