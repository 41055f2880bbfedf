//! Route definitions for Accounts domain API

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use gatehouse_auth::{permission_access, require_session, RoleGate, ROLE_ADMIN};

use super::handlers::{auth, sessions};
use super::middleware::AccountsState;

/// Create the credential-less auth flow routes
fn public_auth_routes() -> Router<AccountsState> {
    Router::new()
        .route("/v1/auth/sign-up", post(auth::sign_up))
        .route("/v1/auth/sign-in", post(auth::sign_in))
        .route("/v1/auth/verify-registration", post(auth::verify_registration))
}

/// Create the routes that need a live session
fn session_routes(state: &AccountsState) -> Router<AccountsState> {
    Router::new()
        .route("/v1/auth/verify-session", get(auth::verify_session))
        .route("/v1/auth/sign-out", post(auth::sign_out))
        .route_layer(from_fn_with_state(state.auth.clone(), require_session))
}

/// Create the admin-only session listing
fn admin_routes(state: &AccountsState) -> Router<AccountsState> {
    let gate = RoleGate::new(state.auth.clone(), [ROLE_ADMIN]);

    Router::new()
        .route("/v1/sessions", get(sessions::list_sessions))
        .route_layer(from_fn_with_state(gate, permission_access))
        .route_layer(from_fn_with_state(state.auth.clone(), require_session))
}

/// Create all Accounts domain API routes
pub fn routes(state: &AccountsState) -> Router<AccountsState> {
    Router::new()
        .merge(public_auth_routes())
        .merge(session_routes(state))
        .merge(admin_routes(state))
}
