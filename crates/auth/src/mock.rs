//! In-memory session and identity stores
//!
//! Mirror the Postgres stores' semantics for tests and local runs without a
//! database. Every store can be switched to a failing mode to exercise the
//! store-error paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatehouse_common::Pagination;
use uuid::Uuid;

use crate::session::{IdentityReader, Session, SessionStore, StoreError};

#[derive(Clone, Default)]
pub struct MockSessionStore {
    sessions: Arc<Mutex<Vec<Session>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn sessions_for(&self, user_id: Uuid) -> Vec<Session> {
        self.sessions()
            .into_iter()
            .filter(|s| s.user_id == user_id)
            .collect()
    }

    /// Rewrite a stored session in place (e.g. to force expiry)
    pub fn update<F>(&self, token: &str, f: F)
    where
        F: FnOnce(&mut Session),
    {
        if let Some(session) = self
            .sessions
            .lock()
            .unwrap()
            .iter_mut()
            .find(|s| s.token == token)
        {
            f(session);
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("session store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), StoreError> {
        self.check()?;
        self.sessions.lock().unwrap().push(session.clone());
        Ok(())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        self.check()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn delete(&self, user_id: Uuid, token: &str) -> Result<bool, StoreError> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !(s.user_id == user_id && s.token == token));
        Ok(sessions.len() < before)
    }

    async fn list(&self, pagination: &Pagination) -> Result<(Vec<Session>, i64), StoreError> {
        self.check()?;
        let mut sessions = self.sessions();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = sessions.len() as i64;
        let page = sessions
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }
}

/// Role table keyed by identity id
#[derive(Clone, Default)]
pub struct MockIdentityReader {
    roles: Arc<Mutex<HashMap<Uuid, Uuid>>>,
    unavailable: Arc<AtomicBool>,
}

impl MockIdentityReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_role(&self, user_id: Uuid, role_id: Uuid) {
        self.roles.lock().unwrap().insert(user_id, role_id);
    }

    pub fn remove(&self, user_id: Uuid) {
        self.roles.lock().unwrap().remove(&user_id);
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityReader for MockIdentityReader {
    async fn role_of(&self, user_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("identity store offline".to_string()));
        }
        Ok(self.roles.lock().unwrap().get(&user_id).copied())
    }
}
