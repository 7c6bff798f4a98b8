//! Write-permission queries over `users`, `roles` and `host_permissions`.

use sqlx::PgPool;
use logtrigger_core::roles::ROLE_ADMIN;
use logtrigger_core::types::DbId;

/// `host_permissions.permission` value granting write access.
pub const PERM_READ_WRITE: i16 = 3;

/// Answers "may this user write that object?".
pub struct PermissionRepo;

impl PermissionRepo {
    /// Whether the user holds the admin role.
    pub async fn is_admin(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM users u JOIN roles r ON r.id = u.role_id \
                 WHERE u.id = $1 AND r.name = $2 \
             )",
        )
        .bind(user_id)
        .bind(ROLE_ADMIN)
        .fetch_one(pool)
        .await
    }

    /// Whether every item in `item_ids` exists and is writable by the user.
    /// An empty list is never writable.
    pub async fn can_write_items(
        pool: &PgPool,
        user_id: DbId,
        item_ids: &[DbId],
    ) -> Result<bool, sqlx::Error> {
        let mut wanted = item_ids.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        if wanted.is_empty() {
            return Ok(false);
        }

        let writable = if Self::is_admin(pool, user_id).await? {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items WHERE id = ANY($1)")
                .bind(&wanted)
                .fetch_one(pool)
                .await?
        } else {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM items i \
                 JOIN host_permissions hp \
                   ON hp.host_id = i.host_id AND hp.user_id = $1 AND hp.permission = $2 \
                 WHERE i.id = ANY($3)",
            )
            .bind(user_id)
            .bind(PERM_READ_WRITE)
            .bind(&wanted)
            .fetch_one(pool)
            .await?
        };

        Ok(writable == wanted.len() as i64)
    }

    /// Whether the user may write every item the trigger references. An
    /// unknown trigger, or one without item links, is not writable.
    pub async fn can_write_trigger(
        pool: &PgPool,
        user_id: DbId,
        trigger_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let item_ids = sqlx::query_scalar::<_, DbId>(
            "SELECT item_id FROM trigger_items WHERE trigger_id = $1",
        )
        .bind(trigger_id)
        .fetch_all(pool)
        .await?;

        Self::can_write_items(pool, user_id, &item_ids).await
    }
}
