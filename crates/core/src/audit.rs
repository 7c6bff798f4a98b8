//! Audit trail constants and message formatting.
//!
//! This module lives in `core` (zero internal deps) so both the repository
//! layer and the form handler agree on codes and wording.

use serde::Serialize;

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Actions and resources
// ---------------------------------------------------------------------------

/// What happened to the audited resource. Codes match the `audit_logs.action`
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Add = 0,
    Update = 1,
}

impl AuditAction {
    pub fn code(self) -> i16 {
        self as i16
    }
}

/// Kind of resource an audit entry refers to. Codes match the
/// `audit_logs.resource_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditResource {
    Trigger = 13,
}

impl AuditResource {
    pub fn code(self) -> i16 {
        self as i16
    }
}

/// An audit entry ready to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub user_id: DbId,
    pub action: AuditAction,
    pub resource: AuditResource,
    pub resource_id: DbId,
    pub details: String,
}

impl AuditEntry {
    /// Entry describing a created or updated trigger.
    pub fn trigger(user_id: DbId, action: AuditAction, trigger_id: DbId, description: &str) -> Self {
        Self {
            user_id,
            action,
            resource: AuditResource::Trigger,
            resource_id: trigger_id,
            details: trigger_message(trigger_id, description),
        }
    }
}

/// `Trigger [<id>] [<description>]`.
pub fn trigger_message(trigger_id: DbId, description: &str) -> String {
    format!("Trigger [{trigger_id}] [{description}]")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
