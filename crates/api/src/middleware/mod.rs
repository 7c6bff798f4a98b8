//! Request extractors shared by the handlers.
//!
//! - [`auth::AuthUser`]: extracts the authenticated user from a JWT Bearer token.

pub mod auth;
