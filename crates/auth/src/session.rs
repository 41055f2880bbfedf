//! Session model and the storage contracts the verifier depends on

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::{ClientInfo, Pagination};
use serde::Serialize;
use uuid::Uuid;

use crate::jwt::IssuedToken;

/// One signed-in device or browser.
///
/// The stored `expires_at` is authoritative: a session past it is rejected
/// even while its token's own `exp` is still in the future.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: Uuid, issued: &IssuedToken, client: &ClientInfo) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            token: issued.token.clone(),
            expires_at: issued.expires_at,
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Server-side session ledger keyed by token
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), StoreError>;

    /// `None` when no session row carries this token
    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Remove the session matching both `user_id` and `token`.
    /// Other sessions of the same identity are untouched.
    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError>;

    /// Newest first, with the total row count
    async fn list(&self, pagination: &Pagination) -> Result<(Vec<Session>, i64), StoreError>;
}

/// Live role lookup for the permission gate. Never cached.
#[async_trait]
pub trait IdentityReader: Send + Sync {
    /// Current role of a non-deleted identity, `None` if it does not exist
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError>;
}
