//! Postgres account store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::RepositoryError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::transactions::{
    activate_user_tx, consume_verification_tx, insert_user_tx, insert_verification_tx,
    USER_COLUMNS,
};
use super::AccountStore;
use crate::domain::entities::{User, VerificationRecord};

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_with_verification(
        &self,
        user: &User,
        record: &VerificationRecord,
    ) -> Result<(), RepositoryError> {
        // Drop without commit = rollback (RAII)
        let mut transaction = self.begin().await?;

        insert_user_tx(&mut transaction, user).await?;
        insert_verification_tx(&mut transaction, record).await?;

        transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit sign-up transaction");
            RepositoryError::Connection(e)
        })?;

        Ok(())
    }

    async fn get_verification(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<VerificationRecord>, RepositoryError> {
        let record = sqlx::query_as::<_, VerificationRecord>(
            r#"
            SELECT user_id, token, expires_at, consumed_at, created_at
            FROM user_verify_accounts
            WHERE user_id = $1 AND token = $2
            "#,
        )
        .bind(user_id)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn activate(
        &self,
        user_id: Uuid,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut transaction = self.begin().await?;

        consume_verification_tx(&mut transaction, user_id, token, at).await?;
        let user = activate_user_tx(&mut transaction, user_id, at).await?;

        transaction.commit().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to commit activation transaction");
            RepositoryError::Connection(e)
        })?;

        Ok(user)
    }
}
