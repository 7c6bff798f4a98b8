use std::sync::Arc;

use crate::backend::Services;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Trigger store, item lookups, permission checks, audit trail and settings.
    pub services: Services,
    /// Server configuration (read by the auth extractor and the form handler).
    pub config: Arc<ServerConfig>,
}
