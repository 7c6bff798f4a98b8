//! Repository for the `triggers` and `trigger_items` tables.

use sqlx::{PgPool, Postgres, Transaction};
use logtrigger_core::types::DbId;

use crate::models::trigger::{CreateTrigger, Trigger, UpdateTrigger};

/// Column list for `triggers` queries. `type` is a keyword in Rust, so it is
/// read as `trigger_type`.
const COLUMNS: &str = "id, description, expression, priority, status, \
     type AS trigger_type, comments, url, template_id, created_at, updated_at";

/// Provides CRUD operations for triggers.
pub struct TriggerRepo;

impl TriggerRepo {
    /// Find a trigger by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Trigger>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM triggers WHERE id = $1");
        sqlx::query_as::<_, Trigger>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a trigger by ID, but only if it references at least one item
    /// whose value type is in `value_types`.
    pub async fn find_by_id_with_value_types(
        pool: &PgPool,
        id: DbId,
        value_types: &[i16],
    ) -> Result<Option<Trigger>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM triggers t \
             WHERE t.id = $1 \
               AND EXISTS ( \
                   SELECT NULL FROM trigger_items ti \
                   JOIN items i ON i.id = ti.item_id \
                   WHERE ti.trigger_id = t.id AND i.value_type = ANY($2) \
               )"
        );
        sqlx::query_as::<_, Trigger>(&query)
            .bind(id)
            .bind(value_types)
            .fetch_optional(pool)
            .await
    }

    /// Whether another trigger with `description` already exists on any host
    /// owning one of `item_ids`.
    pub async fn description_taken(
        pool: &PgPool,
        description: &str,
        item_ids: &[DbId],
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
                 SELECT 1 FROM triggers t \
                 JOIN trigger_items ti ON ti.trigger_id = t.id \
                 JOIN items i ON i.id = ti.item_id \
                 WHERE t.description = $1 \
                   AND i.host_id IN (SELECT host_id FROM items WHERE id = ANY($2)) \
                   AND ($3::BIGINT IS NULL OR t.id <> $3) \
             )",
        )
        .bind(description)
        .bind(item_ids)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Insert a new trigger and its item links, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTrigger) -> Result<Trigger, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO triggers \
                (description, expression, priority, status, type, comments, url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let trigger = sqlx::query_as::<_, Trigger>(&query)
            .bind(&input.description)
            .bind(&input.expression)
            .bind(input.priority)
            .bind(input.status)
            .bind(input.trigger_type)
            .bind(&input.comments)
            .bind(&input.url)
            .fetch_one(&mut *tx)
            .await?;

        link_items(&mut tx, trigger.id, &input.item_ids).await?;
        tx.commit().await?;

        tracing::debug!(trigger_id = trigger.id, "Trigger row inserted");
        Ok(trigger)
    }

    /// Replace every editable column of a trigger and its item links.
    /// Returns `None` if no row with `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTrigger,
    ) -> Result<Option<Trigger>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE triggers SET \
                description = $2, \
                expression = $3, \
                priority = $4, \
                status = $5, \
                type = $6, \
                comments = $7, \
                url = $8, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let Some(trigger) = sqlx::query_as::<_, Trigger>(&query)
            .bind(id)
            .bind(&input.description)
            .bind(&input.expression)
            .bind(input.priority)
            .bind(input.status)
            .bind(input.trigger_type)
            .bind(&input.comments)
            .bind(&input.url)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM trigger_items WHERE trigger_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_items(&mut tx, id, &input.item_ids).await?;
        tx.commit().await?;

        Ok(Some(trigger))
    }
}

async fn link_items(
    tx: &mut Transaction<'_, Postgres>,
    trigger_id: DbId,
    item_ids: &[DbId],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO trigger_items (trigger_id, item_id) \
         SELECT $1, item_id FROM UNNEST($2::BIGINT[]) AS u(item_id) \
         ON CONFLICT DO NOTHING",
    )
    .bind(trigger_id)
    .bind(item_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
