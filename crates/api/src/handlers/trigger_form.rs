//! Handlers for the log trigger form.
//!
//! One page serves both display and submit. A request runs through field
//! validation and the item/trigger permission checks first; an `add` or
//! `update` action then composes the expression, checks access to every
//! item it references, persists the trigger and records the audit entry.
//! Anything short of a completed save falls through to the form.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use logtrigger_core::audit::{AuditAction, AuditEntry};
use logtrigger_core::error::CoreError;
use logtrigger_core::expression::{compose, decompose, referenced_items, ItemRef};
use logtrigger_core::form_fields::{RequestParams, TriggerForm, TriggerSave};
use logtrigger_core::trigger::{
    number_entries, Severity, TriggerStatus, TriggerType,
};
use logtrigger_core::types::DbId;

use crate::backend::{GatewayError, TriggerDraft};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::view::render::render_page;
use crate::view::trigger_form::{blank_page, close_form_page, form_page, TriggerFormModel};
use crate::view::Page;

/// Raw `name=value` pairs, repeated names included.
type Pairs = Vec<(String, String)>;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /triggers/log-form
pub async fn show_form(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<Pairs>,
) -> AppResult<Response> {
    handle_request(&state, &user, RequestParams::from_pairs(query)).await
}

/// POST /triggers/log-form
///
/// Query string and form body are merged; the body wins on conflicts.
pub async fn submit_form(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<Pairs>,
    Form(body): Form<Pairs>,
) -> AppResult<Response> {
    let params = RequestParams::from_pairs(query).merged_with(RequestParams::from_pairs(body));
    handle_request(&state, &user, params).await
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Result of an add/update action that did not fail terminally.
#[derive(Debug)]
enum SaveOutcome {
    Saved,
    /// Nothing was written; the message goes above the redisplayed form.
    Failed(String),
}

async fn handle_request(
    state: &AppState,
    user: &AuthUser,
    params: RequestParams,
) -> AppResult<Response> {
    let form = TriggerForm::from_params(&params)?;
    check_request_access(state, user, &form).await?;

    let mut error = None;
    if form.save_requested {
        match save(state, user, &form).await? {
            SaveOutcome::Saved => {
                return Ok(html(close_form_page(&state.config.form_opener_page)));
            }
            SaveOutcome::Failed(message) => error = Some(message),
        }
    }

    if !form.show_form {
        return Ok(html(blank_page(error.as_deref())));
    }

    let model = load_model(state, &form, error).await?;
    Ok(html(form_page(&model)))
}

fn html(page: Page) -> Response {
    Html(render_page(&page)).into_response()
}

/// Deny the whole request unless the user may write the posted item and
/// trigger.
async fn check_request_access(
    state: &AppState,
    user: &AuthUser,
    form: &TriggerForm,
) -> AppResult<()> {
    let permissions = &state.services.permissions;

    if let Some(item_id) = form.itemid {
        if !permissions.can_write_items(user.user_id, &[item_id]).await? {
            tracing::warn!(user_id = user.user_id, item_id, "Item write access denied");
            return Err(CoreError::access_denied().into());
        }
    }

    if let Some(trigger_id) = form.triggerid {
        if !permissions.can_write_trigger(user.user_id, trigger_id).await? {
            tracing::warn!(user_id = user.user_id, trigger_id, "Trigger write access denied");
            return Err(CoreError::access_denied().into());
        }
    }

    Ok(())
}

/// Deny unless every referenced item exists and is writable.
async fn check_expression_access(
    state: &AppState,
    user: &AuthUser,
    refs: &[ItemRef],
) -> AppResult<()> {
    let mut item_ids = Vec::with_capacity(refs.len());
    for item in refs {
        match state.services.items.resolve(&item.host, &item.key).await? {
            Some(id) => item_ids.push(id),
            None => {
                tracing::warn!(host = %item.host, key = %item.key, "Expression references unknown item");
                return Err(CoreError::access_denied().into());
            }
        }
    }

    if !state
        .services
        .permissions
        .can_write_items(user.user_id, &item_ids)
        .await?
    {
        tracing::warn!(user_id = user.user_id, "Expression item write access denied");
        return Err(CoreError::access_denied().into());
    }
    Ok(())
}

async fn save(state: &AppState, user: &AuthUser, form: &TriggerForm) -> AppResult<SaveOutcome> {
    let payload = form.save_payload()?;
    let failure_title = match form.triggerid {
        Some(_) => "Cannot update trigger",
        None => "Cannot add trigger",
    };

    let item = state
        .services
        .items
        .get(payload.itemid)
        .await?
        .ok_or_else(CoreError::access_denied)?;

    let composed = compose(&item.host, &item.key_, &payload.parts).and_then(|expression| {
        let refs = referenced_items(&expression)?;
        Ok((expression, refs))
    });
    let (expression, refs) = match composed {
        Ok(composed) => composed,
        Err(e) => {
            tracing::debug!(error = %e, item_id = item.id, "Expression composition failed");
            return Ok(SaveOutcome::Failed(format!("{failure_title}: {e}")));
        }
    };

    check_expression_access(state, user, &refs).await?;

    let draft = draft_from(&payload, expression);
    let result = match form.triggerid {
        Some(trigger_id) => update_trigger(state, trigger_id, draft).await,
        None => create_trigger(state, draft).await,
    };

    let (action, trigger_id, description) = match result {
        Ok(saved) => saved,
        Err(AppError::Gateway(GatewayError::Rejected(reason))) => {
            tracing::info!(reason = %reason, "Trigger save rejected");
            return Ok(SaveOutcome::Failed(format!("{failure_title}: {reason}")));
        }
        Err(e) => return Err(e),
    };

    record_audit(
        state,
        AuditEntry::trigger(user.user_id, action, trigger_id, &description),
    )
    .await;
    Ok(SaveOutcome::Saved)
}

fn draft_from(payload: &TriggerSave, expression: String) -> TriggerDraft {
    TriggerDraft {
        description: payload.description.clone(),
        expression,
        // Range-checked by `TriggerSave` validation.
        priority: payload.priority as i16,
        status: payload.status,
        trigger_type: TriggerType::MultiEventEnabled,
        comments: payload.comments.clone(),
        url: payload.url.clone(),
    }
}

async fn create_trigger(
    state: &AppState,
    draft: TriggerDraft,
) -> AppResult<(AuditAction, DbId, String)> {
    let trigger_id = state.services.triggers.create(&draft).await?;
    tracing::info!(trigger_id, description = %draft.description, "Trigger created");
    Ok((AuditAction::Add, trigger_id, draft.description))
}

/// Templated triggers keep their stored description and expression.
async fn update_trigger(
    state: &AppState,
    trigger_id: DbId,
    mut draft: TriggerDraft,
) -> AppResult<(AuditAction, DbId, String)> {
    let stored = state
        .services
        .triggers
        .get(trigger_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Trigger",
            id: trigger_id,
        })?;

    if stored.template_id.is_some() {
        if draft.description != stored.description || draft.expression != stored.expression {
            tracing::warn!(
                trigger_id,
                template_id = stored.template_id,
                "Templated trigger: submitted description/expression replaced by stored values"
            );
        }
        draft.description = stored.description;
        draft.expression = stored.expression;
    }

    state.services.triggers.update(trigger_id, &draft).await?;
    tracing::info!(trigger_id, description = %draft.description, "Trigger updated");
    Ok((AuditAction::Update, trigger_id, draft.description))
}

/// The mutation is already committed, so a failed audit write is only logged.
async fn record_audit(state: &AppState, entry: AuditEntry) {
    if let Err(e) = state.services.audit.record(&entry).await {
        tracing::error!(
            error = %e,
            user_id = entry.user_id,
            resource_id = entry.resource_id,
            "Failed to record audit entry"
        );
    }
}

// ---------------------------------------------------------------------------
// Form data
// ---------------------------------------------------------------------------

/// Fill the form from the request, or from the stored trigger when an
/// existing trigger is opened for the first time.
async fn load_model(
    state: &AppState,
    form: &TriggerForm,
    error: Option<String>,
) -> AppResult<TriggerFormModel> {
    let severity_names = state.services.settings.severity_names().await?;

    let item_label = match form.itemid {
        Some(item_id) => state
            .services
            .items
            .get(item_id)
            .await?
            .map(|item| item.display_name())
            .unwrap_or_default(),
        None => String::new(),
    };

    let mut model = TriggerFormModel {
        triggerid: form.triggerid,
        itemid: form.itemid,
        item_label,
        description: form.description.clone().unwrap_or_default(),
        priority: form.priority.unwrap_or(Severity::NotClassified),
        status: form.status.unwrap_or(TriggerStatus::Enabled),
        comments: form.comments.clone().unwrap_or_default(),
        url: form.url.clone().unwrap_or_default(),
        expressions: form.expressions.clone(),
        keys: form.keys.clone(),
        severity_names,
        error,
    };

    let Some(trigger_id) = form.triggerid.filter(|_| !form.form_refresh) else {
        return Ok(model);
    };
    let Some(stored) = state.services.triggers.get_log_trigger(trigger_id).await? else {
        return Ok(model);
    };

    model.description = stored.description;
    model.priority =
        Severity::from_code(stored.priority.into()).unwrap_or(Severity::NotClassified);
    model.status = TriggerStatus::from_code(stored.status.into());
    model.comments = stored.comments;
    model.url = stored.url;
    model.expressions = match decompose(&stored.expression) {
        Ok(parts) => number_entries(parts),
        Err(e) => {
            tracing::warn!(trigger_id, error = %e, "Stored expression could not be decomposed");
            Vec::new()
        }
    };

    Ok(model)
}
