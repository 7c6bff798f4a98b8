//! Well-known role name constants.
//!
//! These must match the seed data in `20261019000003_create_access_tables.sql`.

/// May write every host, item and trigger.
pub const ROLE_ADMIN: &str = "admin";
/// Writes only what `host_permissions` grants.
pub const ROLE_USER: &str = "user";
