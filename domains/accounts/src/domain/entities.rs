//! Domain entities for the Gatehouse accounts domain

use chrono::{DateTime, Utc};
use gatehouse_auth::{is_admin, IssuedToken, ROLE_USER};
use gatehouse_common::{PasswordError, PasswordHasher};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of the token mailed at sign-up
pub const VERIFICATION_TTL_DAYS: i64 = 1;

/// Identity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    /// Argon2 PHC string, never plaintext
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub role_id: Uuid,
    /// Set once the email address is verified
    pub active_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_at.is_some()
    }

    #[mutants::skip] // Delegates to gatehouse_auth::is_admin
    pub fn is_admin(&self) -> bool {
        is_admin(self.role_id)
    }
}

/// Registration input, still holding the plaintext password
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

impl NewUser {
    /// Build the identity to persist. The plaintext is hashed exactly once
    /// here and is dropped with `self`; a hashing failure aborts creation.
    pub fn before_create(self, hasher: &dyn PasswordHasher) -> Result<User, PasswordError> {
        let password = hasher.hash(&self.password)?;
        let now = Utc::now();

        Ok(User {
            id: Uuid::now_v7(),
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            password: Some(password),
            role_id: ROLE_USER,
            active_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// One-time link between an identity and its email verification token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerificationRecord {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn new(user_id: Uuid, issued: &IssuedToken) -> Self {
        Self {
            user_id,
            token: issued.token.clone(),
            expires_at: issued.expires_at,
            consumed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}
