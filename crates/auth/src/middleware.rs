//! Route decorations: session verification and role gates
//!
//! ```ignore
//! Router::new()
//!     .route("/v1/sessions", get(list_sessions))
//!     .route_layer(from_fn_with_state(RoleGate::new(auth.clone(), [ROLE_ADMIN]), permission_access))
//!     .route_layer(from_fn_with_state(auth, require_session))
//! ```
//!
//! Layers added later run first, so `require_session` binds the identity
//! before the gate reads it.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::AuthBackend;
use crate::context::AuthContext;
use crate::error::AuthError;

/// Reject the request unless it carries a live session
pub async fn require_session(
    State(backend): State<AuthBackend>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    let context = backend
        .authorize(&parts)
        .await?
        .ok_or(AuthError::SessionNotFound)?;
    parts.extensions.insert(context);

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Verify the session when one exists; a token with no session row passes
/// through without binding an identity
pub async fn optional_session(
    State(backend): State<AuthBackend>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let (mut parts, body) = request.into_parts();

    if let Some(context) = backend.authorize(&parts).await? {
        parts.extensions.insert(context);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Role allow-list for `permission_access`
#[derive(Clone)]
pub struct RoleGate {
    backend: AuthBackend,
    allowed: Arc<[Uuid]>,
}

impl RoleGate {
    pub fn new(backend: AuthBackend, allowed: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            backend,
            allowed: allowed.into_iter().collect(),
        }
    }
}

/// Permission gate. Requires an identity bound by the session middleware.
pub async fn permission_access(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AuthError::NotAuthenticated)?;

    gate.backend.check_permission(&context, &gate.allowed).await?;

    Ok(next.run(request).await)
}
