//! Shared utilities, configuration, and error handling for Gatehouse
//!
//! This crate provides common functionality used across the Gatehouse workspace:
//! - Configuration management following 12-factor principles
//! - Error taxonomy and HTTP response envelopes
//! - Validated request extractors, pagination, client information
//! - The password-hash collaborator

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod response;

pub use config::Config;
pub use crypto::{Argon2Hasher, PasswordError, PasswordHasher};
pub use db::RepositoryError;
pub use error::{Error, FieldError, Result};
pub use extractors::{ClientInfo, Pagination, ValidatedJson};
pub use response::{ApiResponse, ListMeta, ListResponse, MessageResponse};
