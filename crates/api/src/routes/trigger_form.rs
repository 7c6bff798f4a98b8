//! Route definitions for the log trigger form.

use axum::routing::get;
use axum::Router;

use crate::handlers::trigger_form;
use crate::state::AppState;

/// Routes mounted at `/triggers`.
///
/// ```text
/// GET  /log-form     render the form
/// POST /log-form     add or update, then close or re-render
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/log-form",
        get(trigger_form::show_form).post(trigger_form::submit_form),
    )
}
