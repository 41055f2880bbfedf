//! HTTP handlers for the Accounts domain

pub mod auth;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing;
