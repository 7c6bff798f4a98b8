//! Trigger entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use logtrigger_core::types::{DbId, Timestamp};

/// A row from the `triggers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Trigger {
    pub id: DbId,
    pub description: String,
    pub expression: String,
    pub priority: i16,
    pub status: i16,
    pub trigger_type: i16,
    pub comments: String,
    pub url: String,
    pub template_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a trigger. `item_ids` are the items its expression
/// references.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrigger {
    pub description: String,
    pub expression: String,
    pub priority: i16,
    pub status: i16,
    pub trigger_type: i16,
    pub comments: String,
    pub url: String,
    pub item_ids: Vec<DbId>,
}

/// DTO for a full update of an existing trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTrigger {
    pub description: String,
    pub expression: String,
    pub priority: i16,
    pub status: i16,
    pub trigger_type: i16,
    pub comments: String,
    pub url: String,
    pub item_ids: Vec<DbId>,
}
