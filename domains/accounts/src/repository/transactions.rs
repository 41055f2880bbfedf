//! Statements that run inside a caller-owned transaction

use chrono::{DateTime, Utc};
use gatehouse_common::RepositoryError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::{User, VerificationRecord};

pub(crate) const USER_COLUMNS: &str = "id, first_name, last_name, email, phone, password, role_id, \
     active_at, deleted_at, created_at, updated_at";

/// Insert an identity within an existing transaction.
pub async fn insert_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user: &User,
) -> std::result::Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO users (id, first_name, last_name, email, phone, password, role_id,
                           active_at, deleted_at, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(user.id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(&user.password)
    .bind(user.role_id)
    .bind(user.active_at)
    .bind(user.deleted_at)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(&mut **transaction)
    .await
    .map_err(RepositoryError::from_insert)?;
    Ok(())
}

/// Insert a verification record within an existing transaction.
pub async fn insert_verification_tx(
    transaction: &mut Transaction<'_, Postgres>,
    record: &VerificationRecord,
) -> std::result::Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO user_verify_accounts (user_id, token, expires_at, consumed_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(record.user_id)
    .bind(&record.token)
    .bind(record.expires_at)
    .bind(record.consumed_at)
    .bind(record.created_at)
    .execute(&mut **transaction)
    .await
    .map_err(RepositoryError::from_insert)?;
    Ok(())
}

/// Mark a verification record consumed within an existing transaction.
///
/// Returns `RepositoryError::NotFound` if the record does not exist
/// or has already been consumed (consumed_at IS NOT NULL).
pub async fn consume_verification_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    token: &str,
    at: DateTime<Utc>,
) -> std::result::Result<(), RepositoryError> {
    let result = sqlx::query(
        r#"
        UPDATE user_verify_accounts
        SET consumed_at = $3
        WHERE user_id = $1 AND token = $2 AND consumed_at IS NULL
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(at)
    .execute(&mut **transaction)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Set the activation timestamp within an existing transaction.
pub async fn activate_user_tx(
    transaction: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    at: DateTime<Utc>,
) -> std::result::Result<User, RepositoryError> {
    let query = format!(
        r#"
        UPDATE users
        SET active_at = $2, updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&mut **transaction)
        .await?
        .ok_or(RepositoryError::NotFound)
}
