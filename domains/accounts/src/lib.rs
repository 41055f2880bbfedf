//! Accounts domain: identities, registration and sign-in flows, session listing

pub mod api;
pub mod domain;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;

// Re-export repository types
pub use repository::mock::MockAccountStore;
pub use repository::{
    activate_user_tx, consume_verification_tx, insert_user_tx, insert_verification_tx,
    AccountStore, PgAccountStore,
};

// Re-export API types
pub use api::routes;
pub use api::{AccountSettings, AccountsState};
