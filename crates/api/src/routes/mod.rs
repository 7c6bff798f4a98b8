pub mod health;
pub mod trigger_form;

use axum::Router;

use crate::state::AppState;

/// Build the page route tree.
///
/// Route hierarchy:
///
/// ```text
/// /triggers/log-form                  display (GET), add/update (POST)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new().nest("/triggers", trigger_form::router())
}
