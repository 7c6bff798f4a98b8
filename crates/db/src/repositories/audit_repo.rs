//! Repository for the append-only `audit_logs` table.

use sqlx::PgPool;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list returned by `audit_logs` inserts.
const COLUMNS: &str = "id, user_id, action, resource_type, resource_id, details, created_at";

/// Appends audit log entries.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append one entry inside its own transaction.
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO audit_logs (user_id, action, resource_type, resource_id, details) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        let log = sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.user_id)
            .bind(input.action)
            .bind(input.resource_type)
            .bind(input.resource_id)
            .bind(&input.details)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(log)
    }
}
