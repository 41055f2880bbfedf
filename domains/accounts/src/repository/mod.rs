//! Repository implementations for the Accounts domain

pub mod mock;
pub mod transactions;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::RepositoryError;
use uuid::Uuid;

use crate::domain::entities::{User, VerificationRecord};

pub use transactions::{
    activate_user_tx, consume_verification_tx, insert_user_tx, insert_verification_tx,
};
pub use users::PgAccountStore;

/// Identity storage used by the auth flows.
///
/// Lookups return `None` when the row is absent so callers can tell a miss
/// from a storage failure.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Non-deleted identity by id
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Non-deleted identity by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Insert the identity and its verification record atomically.
    /// A duplicate email is `RepositoryError::AlreadyExists`.
    async fn create_with_verification(
        &self,
        user: &User,
        record: &VerificationRecord,
    ) -> Result<(), RepositoryError>;

    /// Verification record for `(user_id, token)`, consumed or not
    async fn get_verification(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<VerificationRecord>, RepositoryError>;

    /// Consume the record and set the activation timestamp atomically.
    /// `RepositoryError::NotFound` if the record was already consumed.
    async fn activate(
        &self,
        user_id: Uuid,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError>;
}
