#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use logtrigger_api::auth::jwt::{generate_access_token, JwtConfig};
use logtrigger_api::backend::{
    AuditRecorder, GatewayError, HealthProbe, ItemDirectory, PermissionGuard, Services,
    SettingsSource, TriggerDraft, TriggerGateway,
};
use logtrigger_api::config::ServerConfig;
use logtrigger_api::router::build_app_router;
use logtrigger_api::state::AppState;
use logtrigger_core::audit::AuditEntry;
use logtrigger_core::expression::referenced_items;
use logtrigger_core::roles::{ROLE_ADMIN, ROLE_USER};
use logtrigger_core::trigger::{ItemValueType, SeverityNames, TEXTUAL_VALUE_TYPES};
use logtrigger_core::types::DbId;
use logtrigger_db::models::item::ItemContext;
use logtrigger_db::models::trigger::Trigger;

pub const ADMIN_ID: DbId = 1;
pub const USER_ID: DbId = 2;

/// Item 100: `srv1:log[/var/log/syslog]`, a log item.
pub const SYSLOG_ITEM: DbId = 100;
/// Item 200: `srv2:log[/var/log/auth.log]`, a log item on another host.
pub const AUTH_ITEM: DbId = 200;
/// Item 300: `srv1:vfs.file.contents[/etc/passwd]`, a text item.
pub const PASSWD_ITEM: DbId = 300;
/// Item 400: `srv1:system.uname`, a character item.
pub const UNAME_ITEM: DbId = 400;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        form_opener_page: "items.php".to_string(),
        jwt: JwtConfig {
            secret: "log-trigger-integration-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryState {
    pub items: Vec<ItemContext>,
    pub triggers: Vec<Trigger>,
    /// `(trigger_id, item_id)` links.
    pub trigger_items: Vec<(DbId, DbId)>,
    pub admins: HashSet<DbId>,
    /// `(user_id, host_id)` read-write grants.
    pub grants: HashSet<(DbId, DbId)>,
    pub audit: Vec<AuditEntry>,
    pub fail_audit: bool,
    pub create_calls: usize,
    pub update_calls: usize,
    pub severity_names: Option<SeverityNames>,
    pub unhealthy: bool,
}

/// Backend keeping everything in memory, with call counters for
/// asserting that no persistence happened.
#[derive(Default)]
pub struct MemoryBackend {
    pub state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Two hosts with one log item each, plus a text and a character item
    /// on `srv1`. `ADMIN_ID` is an admin; `USER_ID` may write `srv1` only.
    pub fn seeded() -> Arc<Self> {
        let backend = Self::default();
        {
            let mut s = backend.state.lock().unwrap();
            s.items.push(item(SYSLOG_ITEM, 1, "srv1", "Server 1", "log[/var/log/syslog]"));
            s.items.push(item(AUTH_ITEM, 2, "srv2", "Server 2", "log[/var/log/auth.log]"));
            s.items.push(ItemContext {
                name: "Passwd contents".to_string(),
                value_type: ItemValueType::Text.code(),
                ..item(PASSWD_ITEM, 1, "srv1", "Server 1", "vfs.file.contents[/etc/passwd]")
            });
            s.items.push(ItemContext {
                name: "System information".to_string(),
                value_type: ItemValueType::Character.code(),
                ..item(UNAME_ITEM, 1, "srv1", "Server 1", "system.uname")
            });
            s.admins.insert(ADMIN_ID);
            s.grants.insert((USER_ID, 1));
        }
        Arc::new(backend)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Store a trigger directly, linking it to the items its expression uses.
    pub fn insert_trigger(
        &self,
        description: &str,
        expression: &str,
        template_id: Option<DbId>,
    ) -> DbId {
        self.with(|s| {
            let id = next_trigger_id(s);
            let item_ids = resolve_all(s, expression).expect("seeded expression items exist");
            s.triggers.push(trigger_row(id, description, expression, template_id));
            s.trigger_items.extend(item_ids.into_iter().map(|item_id| (id, item_id)));
            id
        })
    }

    pub fn trigger(&self, id: DbId) -> Option<Trigger> {
        self.with(|s| s.triggers.iter().find(|t| t.id == id).cloned())
    }
}

fn item(id: DbId, host_id: DbId, host: &str, host_name: &str, key: &str) -> ItemContext {
    ItemContext {
        id,
        name: "Log file".to_string(),
        key_: key.to_string(),
        value_type: ItemValueType::Log.code(),
        host_id,
        host: host.to_string(),
        host_name: host_name.to_string(),
        template_id: None,
        template_host_name: None,
    }
}

fn trigger_row(id: DbId, description: &str, expression: &str, template_id: Option<DbId>) -> Trigger {
    let now = chrono::Utc::now();
    Trigger {
        id,
        description: description.to_string(),
        expression: expression.to_string(),
        priority: 0,
        status: 0,
        trigger_type: 1,
        comments: String::new(),
        url: String::new(),
        template_id,
        created_at: now,
        updated_at: now,
    }
}

fn next_trigger_id(s: &MemoryState) -> DbId {
    s.triggers.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

fn resolve_all(s: &MemoryState, expression: &str) -> Result<Vec<DbId>, GatewayError> {
    let refs = referenced_items(expression).map_err(|e| GatewayError::Rejected(e.to_string()))?;
    refs.iter()
        .map(|r| {
            s.items
                .iter()
                .find(|i| i.host == r.host && i.key_ == r.key)
                .map(|i| i.id)
                .ok_or_else(|| GatewayError::Rejected(format!("Unknown item {}:{}", r.host, r.key)))
        })
        .collect()
}

fn apply_draft(row: &mut Trigger, draft: &TriggerDraft) {
    row.description = draft.description.clone();
    row.expression = draft.expression.clone();
    row.priority = draft.priority;
    row.status = draft.status.code();
    row.trigger_type = draft.trigger_type.code();
    row.comments = draft.comments.clone();
    row.url = draft.url.clone();
}

fn description_taken(s: &MemoryState, description: &str, exclude: Option<DbId>) -> bool {
    s.triggers
        .iter()
        .any(|t| t.description == description && Some(t.id) != exclude)
}

#[async_trait]
impl TriggerGateway for MemoryBackend {
    async fn get(&self, id: DbId) -> Result<Option<Trigger>, GatewayError> {
        Ok(self.trigger(id))
    }

    async fn get_log_trigger(&self, id: DbId) -> Result<Option<Trigger>, GatewayError> {
        Ok(self.with(|s| {
            let textual = s.trigger_items.iter().any(|(t, i)| {
                *t == id
                    && s.items.iter().any(|item| {
                        item.id == *i
                            && TEXTUAL_VALUE_TYPES.iter().any(|v| v.code() == item.value_type)
                    })
            });
            s.triggers
                .iter()
                .find(|t| t.id == id && textual)
                .cloned()
        }))
    }

    async fn create(&self, draft: &TriggerDraft) -> Result<DbId, GatewayError> {
        self.with(|s| {
            s.create_calls += 1;
            let item_ids = resolve_all(s, &draft.expression)?;
            if description_taken(s, &draft.description, None) {
                return Err(GatewayError::Rejected(format!(
                    "Trigger \"{}\" already exists on this host.",
                    draft.description
                )));
            }
            let id = next_trigger_id(s);
            let mut row = trigger_row(id, "", "", None);
            apply_draft(&mut row, draft);
            s.triggers.push(row);
            s.trigger_items.extend(item_ids.into_iter().map(|item_id| (id, item_id)));
            Ok(id)
        })
    }

    async fn update(&self, id: DbId, draft: &TriggerDraft) -> Result<(), GatewayError> {
        self.with(|s| {
            s.update_calls += 1;
            let item_ids = resolve_all(s, &draft.expression)?;
            if description_taken(s, &draft.description, Some(id)) {
                return Err(GatewayError::Rejected(format!(
                    "Trigger \"{}\" already exists on this host.",
                    draft.description
                )));
            }
            let row = s
                .triggers
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| GatewayError::Rejected(format!("Trigger {id} does not exist.")))?;
            apply_draft(row, draft);
            s.trigger_items.retain(|(t, _)| *t != id);
            s.trigger_items.extend(item_ids.into_iter().map(|item_id| (id, item_id)));
            Ok(())
        })
    }
}

#[async_trait]
impl ItemDirectory for MemoryBackend {
    async fn get(&self, id: DbId) -> Result<Option<ItemContext>, GatewayError> {
        Ok(self.with(|s| s.items.iter().find(|i| i.id == id).cloned()))
    }

    async fn resolve(&self, host: &str, key: &str) -> Result<Option<DbId>, GatewayError> {
        Ok(self.with(|s| {
            s.items
                .iter()
                .find(|i| i.host == host && i.key_ == key)
                .map(|i| i.id)
        }))
    }
}

fn can_write(s: &MemoryState, user_id: DbId, item_ids: &[DbId]) -> bool {
    !item_ids.is_empty()
        && item_ids.iter().all(|id| {
            s.items.iter().find(|i| i.id == *id).is_some_and(|item| {
                s.admins.contains(&user_id) || s.grants.contains(&(user_id, item.host_id))
            })
        })
}

#[async_trait]
impl PermissionGuard for MemoryBackend {
    async fn can_write_items(
        &self,
        user_id: DbId,
        item_ids: &[DbId],
    ) -> Result<bool, GatewayError> {
        Ok(self.with(|s| can_write(s, user_id, item_ids)))
    }

    async fn can_write_trigger(
        &self,
        user_id: DbId,
        trigger_id: DbId,
    ) -> Result<bool, GatewayError> {
        Ok(self.with(|s| {
            let item_ids: Vec<DbId> = s
                .trigger_items
                .iter()
                .filter(|(t, _)| *t == trigger_id)
                .map(|(_, i)| *i)
                .collect();
            can_write(s, user_id, &item_ids)
        }))
    }
}

#[async_trait]
impl AuditRecorder for MemoryBackend {
    async fn record(&self, entry: &AuditEntry) -> Result<(), GatewayError> {
        self.with(|s| {
            if s.fail_audit {
                return Err(GatewayError::Rejected("audit store unavailable".to_string()));
            }
            s.audit.push(entry.clone());
            Ok(())
        })
    }
}

#[async_trait]
impl SettingsSource for MemoryBackend {
    async fn severity_names(&self) -> Result<SeverityNames, GatewayError> {
        Ok(self.with(|s| s.severity_names.clone().unwrap_or_default()))
    }
}

#[async_trait]
impl HealthProbe for MemoryBackend {
    async fn is_healthy(&self) -> bool {
        self.with(|s| !s.unhealthy)
    }
}

// ---------------------------------------------------------------------------
// App and request helpers
// ---------------------------------------------------------------------------

/// Build the full application router over `backend`, with the same
/// middleware stack production uses.
pub fn build_test_app(backend: Arc<MemoryBackend>) -> Router {
    let config = test_config();
    let state = AppState {
        services: Services::from_backend(backend),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

pub fn admin_token() -> String {
    generate_access_token(ADMIN_ID, ROLE_ADMIN, &test_config().jwt).unwrap()
}

pub fn user_token() -> String {
    generate_access_token(USER_ID, ROLE_USER, &test_config().jwt).unwrap()
}

/// URL-encode `pairs` as a form body / query string.
pub fn encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", percent(k), percent(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn percent(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    app.oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: Router, token: &str, pairs: &[(&str, &str)]) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri("/triggers/log-form")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(encode(pairs)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
