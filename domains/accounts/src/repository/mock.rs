//! In-memory account store
//!
//! Mirrors `PgAccountStore`, including all-or-nothing sign-up and
//! single-use verification records. Also serves as the identity reader for
//! the permission gate so role changes are visible immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_auth::{IdentityReader, StoreError};
use gatehouse_common::RepositoryError;
use uuid::Uuid;

use super::AccountStore;
use crate::domain::entities::{User, VerificationRecord};

#[derive(Clone, Default)]
pub struct MockAccountStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    verifications: Arc<Mutex<Vec<VerificationRecord>>>,
    fail_verification_insert: Arc<AtomicBool>,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the verification-record insert of the next sign-ups fail
    pub fn set_fail_verification_insert(&self, fail: bool) {
        self.fail_verification_insert.store(fail, Ordering::SeqCst);
    }

    /// Insert an identity directly, bypassing sign-up
    pub fn insert_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn users(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.users().into_iter().find(|u| u.email == email)
    }

    pub fn verifications(&self) -> Vec<VerificationRecord> {
        self.verifications.lock().unwrap().clone()
    }

    pub fn set_role(&self, user_id: Uuid, role_id: Uuid) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&user_id) {
            user.role_id = role_id;
        }
    }

    /// Move every verification record of `user_id` into the past
    pub fn expire_verification(&self, user_id: Uuid) {
        for record in self.verifications.lock().unwrap().iter_mut() {
            if record.user_id == user_id {
                record.expires_at = Utc::now() - chrono::Duration::minutes(1);
            }
        }
    }

    fn find_user<F>(&self, predicate: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.deleted_at.is_none() && predicate(u))
            .cloned()
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_user(|u| u.id == id))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_user(|u| u.email == email))
    }

    async fn create_with_verification(
        &self,
        user: &User,
        record: &VerificationRecord,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::AlreadyExists);
        }
        if self.fail_verification_insert.load(Ordering::SeqCst) {
            // nothing has been written yet, so the failure leaves no trace
            return Err(RepositoryError::Connection(sqlx::Error::PoolTimedOut));
        }

        users.insert(user.id, user.clone());
        self.verifications.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn get_verification(
        &self,
        user_id: Uuid,
        token: &str,
    ) -> Result<Option<VerificationRecord>, RepositoryError> {
        Ok(self
            .verifications
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.token == token)
            .cloned())
    }

    async fn activate(
        &self,
        user_id: Uuid,
        token: &str,
        at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let mut verifications = self.verifications.lock().unwrap();

        let record = verifications
            .iter_mut()
            .find(|r| r.user_id == user_id && r.token == token && r.consumed_at.is_none())
            .ok_or(RepositoryError::NotFound)?;
        let user = users
            .get_mut(&user_id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(RepositoryError::NotFound)?;

        record.consumed_at = Some(at);
        user.active_at = Some(at);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl IdentityReader for MockAccountStore {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        Ok(self.find_user(|u| u.id == user_id).map(|u| u.role_id))
    }
}
