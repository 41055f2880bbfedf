//! Session-backed authentication for Gatehouse
//!
//! Bearer tokens are HS256-signed and paired with a server-side session row,
//! so a token stops working the moment its session is deleted. Routes opt in
//! through the `require_session` / `optional_session` middleware and an
//! optional `RoleGate`, and read the bound identity with `AuthUser`.
//!
//! Everything is generic over any state `S` where `AuthBackend: FromRef<S>`.

mod backend;
mod config;
mod context;
mod credentials;
mod error;
mod extractors;
mod jwt;
mod middleware;
pub mod mock;
mod pg;
mod roles;
mod session;

pub use backend::AuthBackend;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use credentials::{extract_token, CredentialError};
pub use error::AuthError;
pub use extractors::{AuthUser, BearerToken, MaybeAuthUser};
pub use jwt::{generate_token, verify_token, IssuedToken, TokenClaims, TokenError};
pub use middleware::{optional_session, permission_access, require_session, RoleGate};
pub use pg::{PgIdentityReader, PgSessionStore};
pub use roles::{is_admin, ROLE_ADMIN, ROLE_USER};
pub use session::{IdentityReader, Session, SessionStore, StoreError};
