//! Identity bound to a request once its session is verified

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::session::Session;

/// Inserted into request extensions by the session middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for AuthContext {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id,
            session_id: session.id,
            expires_at: session.expires_at,
        }
    }
}
