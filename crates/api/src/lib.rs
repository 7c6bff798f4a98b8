//! Log trigger form server library.
//!
//! Exposes the building blocks (config, state, backend seams, error handling,
//! routes, view layer) so integration tests and the binary entrypoint can
//! both access them.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod view;
