//! Seeded role identifiers
//!
//! Must match the rows inserted by the `roles` migration.

use uuid::Uuid;

/// Administrators: may list every session
pub const ROLE_ADMIN: Uuid = Uuid::from_u128(0x01900000_0000_7000_8000_000000000001);

/// Regular accounts, assigned at sign-up
pub const ROLE_USER: Uuid = Uuid::from_u128(0x01900000_0000_7000_8000_000000000002);

pub fn is_admin(role_id: Uuid) -> bool {
    role_id == ROLE_ADMIN
}
