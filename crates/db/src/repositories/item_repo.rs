//! Repository for the `items` table (joined with `hosts`).

use sqlx::PgPool;
use logtrigger_core::types::DbId;

use crate::models::item::ItemContext;

/// Provides read access to items for the trigger form.
pub struct ItemRepo;

impl ItemRepo {
    /// Find an item with its host and, for inherited items, the template host.
    pub async fn find_context(pool: &PgPool, id: DbId) -> Result<Option<ItemContext>, sqlx::Error> {
        sqlx::query_as::<_, ItemContext>(
            "SELECT i.id, i.name, i.key_, i.value_type, i.host_id, \
                    h.host, h.name AS host_name, i.template_id, \
                    th.name AS template_host_name \
             FROM items i \
             JOIN hosts h ON h.id = i.host_id \
             LEFT JOIN items ti ON ti.id = i.template_id \
             LEFT JOIN hosts th ON th.id = ti.host_id \
             WHERE i.id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Resolve the item `key` on the host with technical name `host`.
    pub async fn find_id_by_host_key(
        pool: &PgPool,
        host: &str,
        key: &str,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT i.id FROM items i \
             JOIN hosts h ON h.id = i.host_id \
             WHERE h.host = $1 AND i.key_ = $2",
        )
        .bind(host)
        .bind(key)
        .fetch_optional(pool)
        .await
    }
}
