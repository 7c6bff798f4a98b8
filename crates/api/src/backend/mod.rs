//! Seams between the trigger form workflow and its storage.
//!
//! The handlers only talk to the traits below. [`pg::PgBackend`] implements
//! all of them over the Postgres repositories; integration tests plug in an
//! in-memory implementation through [`Services::from_backend`].

pub mod pg;

use std::sync::Arc;

use async_trait::async_trait;
use logtrigger_core::audit::AuditEntry;
use logtrigger_core::trigger::{SeverityNames, TriggerStatus, TriggerType};
use logtrigger_core::types::DbId;
use logtrigger_db::models::item::ItemContext;
use logtrigger_db::models::trigger::Trigger;
use logtrigger_db::DbPool;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The store refused the mutation; nothing was written. The message is
    /// shown to the user next to the form.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Everything a create or update writes to a trigger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDraft {
    pub description: String,
    pub expression: String,
    pub priority: i16,
    pub status: TriggerStatus,
    pub trigger_type: TriggerType,
    pub comments: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Reads and writes triggers.
#[async_trait]
pub trait TriggerGateway: Send + Sync {
    async fn get(&self, id: DbId) -> Result<Option<Trigger>, GatewayError>;

    /// Like [`get`](Self::get), but only for triggers on log, text or
    /// character items.
    async fn get_log_trigger(&self, id: DbId) -> Result<Option<Trigger>, GatewayError>;

    /// Create a trigger and return its id.
    async fn create(&self, draft: &TriggerDraft) -> Result<DbId, GatewayError>;

    async fn update(&self, id: DbId, draft: &TriggerDraft) -> Result<(), GatewayError>;
}

/// Item lookups.
#[async_trait]
pub trait ItemDirectory: Send + Sync {
    async fn get(&self, id: DbId) -> Result<Option<ItemContext>, GatewayError>;

    /// Id of the item `key` on the host whose technical name is `host`.
    async fn resolve(&self, host: &str, key: &str) -> Result<Option<DbId>, GatewayError>;
}

/// Write-access checks. Unknown objects are never writable.
#[async_trait]
pub trait PermissionGuard: Send + Sync {
    /// `true` only if every item in `item_ids` is writable. An empty slice is
    /// not writable.
    async fn can_write_items(&self, user_id: DbId, item_ids: &[DbId])
        -> Result<bool, GatewayError>;

    async fn can_write_trigger(&self, user_id: DbId, trigger_id: DbId)
        -> Result<bool, GatewayError>;
}

/// Appends audit entries, each in its own transaction.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, entry: &AuditEntry) -> Result<(), GatewayError>;
}

/// Display settings.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn severity_names(&self) -> Result<SeverityNames, GatewayError>;
}

/// Liveness of the backing store.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn is_healthy(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Service bundle
// ---------------------------------------------------------------------------

/// The backend seams held in application state.
#[derive(Clone)]
pub struct Services {
    pub triggers: Arc<dyn TriggerGateway>,
    pub items: Arc<dyn ItemDirectory>,
    pub permissions: Arc<dyn PermissionGuard>,
    pub audit: Arc<dyn AuditRecorder>,
    pub settings: Arc<dyn SettingsSource>,
    pub health: Arc<dyn HealthProbe>,
}

impl Services {
    /// Serve every seam from one backend value.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TriggerGateway
            + ItemDirectory
            + PermissionGuard
            + AuditRecorder
            + SettingsSource
            + HealthProbe
            + 'static,
    {
        Self {
            triggers: backend.clone(),
            items: backend.clone(),
            permissions: backend.clone(),
            audit: backend.clone(),
            settings: backend.clone(),
            health: backend,
        }
    }

    /// Postgres-backed services.
    pub fn postgres(pool: DbPool) -> Self {
        Self::from_backend(Arc::new(pg::PgBackend::new(pool)))
    }
}
