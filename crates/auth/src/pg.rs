//! Postgres-backed session and identity stores
//!
//! Uses runtime `sqlx::query_as` (not macros) so the crate builds without a
//! live database.

use async_trait::async_trait;
use gatehouse_common::Pagination;
use sqlx::PgPool;
use uuid::Uuid;

use crate::session::{IdentityReader, Session, SessionStore, StoreError};

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token, expires_at, ip_address, user_agent, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, expires_at, ip_address, user_agent, created_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND token = $2")
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, pagination: &Pagination) -> Result<(Vec<Session>, i64), StoreError> {
        let sessions = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, expires_at, ip_address, user_agent, created_at
            FROM sessions
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await?;

        Ok((sessions, total))
    }
}

/// Role lookup against the `users` table (read model, role only)
#[derive(Clone)]
pub struct PgIdentityReader {
    pool: PgPool,
}

impl PgIdentityReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityReader for PgIdentityReader {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let role = sqlx::query_scalar::<_, Uuid>(
            "SELECT role_id FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }
}
