//! Audit log entity models and DTOs.
//!
//! Audit logs have no `updated_at` field (immutable records).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use logtrigger_core::types::{DbId, Timestamp};

/// A single audit log entry. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub action: i16,
    pub resource_type: i16,
    pub resource_id: Option<DbId>,
    pub details: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub action: i16,
    pub resource_type: i16,
    pub resource_id: Option<DbId>,
    pub details: String,
}
