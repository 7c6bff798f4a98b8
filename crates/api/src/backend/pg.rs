//! Postgres implementation of the backend seams.

use async_trait::async_trait;
use logtrigger_core::audit::AuditEntry;
use logtrigger_core::expression::referenced_items;
use logtrigger_core::trigger::{Severity, SeverityNames, TEXTUAL_VALUE_TYPES};
use logtrigger_core::types::DbId;
use logtrigger_db::models::audit::CreateAuditLog;
use logtrigger_db::models::item::ItemContext;
use logtrigger_db::models::trigger::{CreateTrigger, Trigger, UpdateTrigger};
use logtrigger_db::repositories::{
    AuditLogRepo, ItemRepo, PermissionRepo, SettingsRepo, TriggerRepo,
};
use logtrigger_db::DbPool;

use super::{
    AuditRecorder, GatewayError, HealthProbe, ItemDirectory, PermissionGuard, SettingsSource,
    TriggerDraft, TriggerGateway,
};

/// Serves every backend seam from one connection pool.
pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Resolve every item `expression` references, rejecting unknown keys.
    async fn expression_item_ids(&self, expression: &str) -> Result<Vec<DbId>, GatewayError> {
        let refs =
            referenced_items(expression).map_err(|e| GatewayError::Rejected(e.to_string()))?;

        let mut ids = Vec::with_capacity(refs.len());
        for item in refs {
            let id = ItemRepo::find_id_by_host_key(&self.pool, &item.host, &item.key)
                .await?
                .ok_or_else(|| {
                    GatewayError::Rejected(format!(
                        "Incorrect item key \"{}\" provided for trigger expression on \"{}\".",
                        item.key, item.host
                    ))
                })?;
            ids.push(id);
        }
        Ok(ids)
    }

    async fn ensure_unique_description(
        &self,
        description: &str,
        item_ids: &[DbId],
        exclude_id: Option<DbId>,
    ) -> Result<(), GatewayError> {
        if TriggerRepo::description_taken(&self.pool, description, item_ids, exclude_id).await? {
            return Err(GatewayError::Rejected(format!(
                "Trigger \"{description}\" already exists on this host."
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TriggerGateway for PgBackend {
    async fn get(&self, id: DbId) -> Result<Option<Trigger>, GatewayError> {
        Ok(TriggerRepo::find_by_id(&self.pool, id).await?)
    }

    async fn get_log_trigger(&self, id: DbId) -> Result<Option<Trigger>, GatewayError> {
        let value_types = TEXTUAL_VALUE_TYPES.map(|t| t.code());
        Ok(TriggerRepo::find_by_id_with_value_types(&self.pool, id, &value_types).await?)
    }

    async fn create(&self, draft: &TriggerDraft) -> Result<DbId, GatewayError> {
        let item_ids = self.expression_item_ids(&draft.expression).await?;
        self.ensure_unique_description(&draft.description, &item_ids, None)
            .await?;

        let input = CreateTrigger {
            description: draft.description.clone(),
            expression: draft.expression.clone(),
            priority: draft.priority,
            status: draft.status.code(),
            trigger_type: draft.trigger_type.code(),
            comments: draft.comments.clone(),
            url: draft.url.clone(),
            item_ids,
        };
        let trigger = TriggerRepo::create(&self.pool, &input).await?;
        Ok(trigger.id)
    }

    async fn update(&self, id: DbId, draft: &TriggerDraft) -> Result<(), GatewayError> {
        let item_ids = self.expression_item_ids(&draft.expression).await?;
        self.ensure_unique_description(&draft.description, &item_ids, Some(id))
            .await?;

        let input = UpdateTrigger {
            description: draft.description.clone(),
            expression: draft.expression.clone(),
            priority: draft.priority,
            status: draft.status.code(),
            trigger_type: draft.trigger_type.code(),
            comments: draft.comments.clone(),
            url: draft.url.clone(),
            item_ids,
        };
        TriggerRepo::update(&self.pool, id, &input)
            .await?
            .ok_or_else(|| GatewayError::Rejected(format!("Trigger {id} does not exist.")))?;
        Ok(())
    }
}

#[async_trait]
impl ItemDirectory for PgBackend {
    async fn get(&self, id: DbId) -> Result<Option<ItemContext>, GatewayError> {
        Ok(ItemRepo::find_context(&self.pool, id).await?)
    }

    async fn resolve(&self, host: &str, key: &str) -> Result<Option<DbId>, GatewayError> {
        Ok(ItemRepo::find_id_by_host_key(&self.pool, host, key).await?)
    }
}

#[async_trait]
impl PermissionGuard for PgBackend {
    async fn can_write_items(
        &self,
        user_id: DbId,
        item_ids: &[DbId],
    ) -> Result<bool, GatewayError> {
        Ok(PermissionRepo::can_write_items(&self.pool, user_id, item_ids).await?)
    }

    async fn can_write_trigger(
        &self,
        user_id: DbId,
        trigger_id: DbId,
    ) -> Result<bool, GatewayError> {
        Ok(PermissionRepo::can_write_trigger(&self.pool, user_id, trigger_id).await?)
    }
}

#[async_trait]
impl AuditRecorder for PgBackend {
    async fn record(&self, entry: &AuditEntry) -> Result<(), GatewayError> {
        let input = CreateAuditLog {
            user_id: Some(entry.user_id),
            action: entry.action.code(),
            resource_type: entry.resource.code(),
            resource_id: Some(entry.resource_id),
            details: entry.details.clone(),
        };
        AuditLogRepo::create(&self.pool, &input).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsSource for PgBackend {
    async fn severity_names(&self) -> Result<SeverityNames, GatewayError> {
        let keys: Vec<String> = Severity::ALL.iter().map(|s| s.setting_key()).collect();
        let rows = SettingsRepo::get_many(&self.pool, &keys).await?;

        let names = Severity::ALL.map(|severity| {
            let key = severity.setting_key();
            rows.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| severity.default_name().to_string())
        });
        Ok(SeverityNames::new(names))
    }
}

#[async_trait]
impl HealthProbe for PgBackend {
    async fn is_healthy(&self) -> bool {
        logtrigger_db::health_check(&self.pool).await.is_ok()
    }
}
