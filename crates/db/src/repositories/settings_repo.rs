//! Repository for the key/value `settings` table.

use sqlx::PgPool;

/// Reads global display settings.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Fetch the values of `keys`. Keys without a row are simply absent.
    pub async fn get_many(
        pool: &PgPool,
        keys: &[String],
    ) -> Result<Vec<(String, String)>, sqlx::Error> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM settings WHERE key = ANY($1) ORDER BY key",
        )
        .bind(keys)
        .fetch_all(pool)
        .await
    }
}
