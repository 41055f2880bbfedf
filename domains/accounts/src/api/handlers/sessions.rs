//! Session administration API handlers
//!
//! - GET /v1/sessions - Page through every session, newest first (admin only)

use axum::{
    extract::{Query, State},
    Json,
};
use gatehouse_auth::Session;
use gatehouse_common::{Error, ListResponse, Pagination, Result};

use crate::api::middleware::AccountsState;

/// GET /v1/sessions - List sessions
pub async fn list_sessions(
    State(state): State<AccountsState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ListResponse<Session>>> {
    let (sessions, total) = state
        .auth
        .sessions()
        .list(&pagination)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list sessions");
            Error::Internal(format!("Failed to list sessions: {}", e))
        })?;

    Ok(Json(ListResponse::new(
        "list data has been retrieved successfully",
        sessions,
        total,
    )))
}
