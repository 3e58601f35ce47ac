//! Repository for the `notification_preferences` table.

use sqlx::PgPool;

use courier_core::preferences::{CategoryOverrides, ChannelPrefs};
use courier_core::types::DbId;

use crate::models::preference::{PreferenceRow, UpdatePreferences};

/// Column list for `notification_preferences` queries.
const COLUMNS: &str = "id, user_id, channels, categories, \
    digest_frequency, digest_time, digest_day_of_week, \
    quiet_enabled, quiet_start_time, quiet_end_time, quiet_timezone, \
    created_at, updated_at";

/// Provides CRUD operations for per-user preference documents.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Fetch a user's preference row, if one exists.
    pub async fn get(pool: &PgPool, user_id: DbId) -> Result<Option<PreferenceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_preferences WHERE user_id = $1");
        sqlx::query_as::<_, PreferenceRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch a user's preferences, seeding the default document on first
    /// access.
    ///
    /// The insert races benignly with concurrent callers: `ON CONFLICT DO
    /// NOTHING` plus the follow-up select makes every caller see the same
    /// row.
    pub async fn get_or_create(pool: &PgPool, user_id: DbId) -> Result<PreferenceRow, sqlx::Error> {
        if let Some(row) = Self::get(pool, user_id).await? {
            return Ok(row);
        }

        sqlx::query(
            "INSERT INTO notification_preferences (user_id, channels, categories) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(default_channels())
        .bind(default_categories())
        .execute(pool)
        .await?;

        Self::get(pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Apply a partial update, creating the document first if the user has
    /// none.
    ///
    /// Each section merges independently via `COALESCE`; sections absent
    /// from the update keep their stored value. Unrelated concurrent edits
    /// (e.g. endpoint pruning) are never overwritten.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        update: &UpdatePreferences,
    ) -> Result<PreferenceRow, sqlx::Error> {
        let channels = update
            .channels
            .as_ref()
            .map(|c| serde_json::to_value(c).unwrap_or_default());
        let categories = update
            .categories
            .as_ref()
            .map(|c| serde_json::to_value(c).unwrap_or_default());
        let digest = update.digest.as_ref();
        let quiet = update.quiet_hours.as_ref();

        let query = format!(
            "INSERT INTO notification_preferences \
                (user_id, channels, categories, \
                 digest_frequency, digest_time, digest_day_of_week, \
                 quiet_enabled, quiet_start_time, quiet_end_time, quiet_timezone) \
             VALUES ($1, COALESCE($2, $11), COALESCE($3, $12), \
                 COALESCE($4, 'never'), COALESCE($5, '09:00'), COALESCE($6, 1::smallint), \
                 COALESCE($7, false), COALESCE($8, '22:00'), COALESCE($9, '08:00'), $10) \
             ON CONFLICT (user_id) DO UPDATE SET \
                channels = COALESCE($2, notification_preferences.channels), \
                categories = COALESCE($3, notification_preferences.categories), \
                digest_frequency = COALESCE($4, notification_preferences.digest_frequency), \
                digest_time = COALESCE($5, notification_preferences.digest_time), \
                digest_day_of_week = COALESCE($6, notification_preferences.digest_day_of_week), \
                quiet_enabled = COALESCE($7, notification_preferences.quiet_enabled), \
                quiet_start_time = COALESCE($8, notification_preferences.quiet_start_time), \
                quiet_end_time = COALESCE($9, notification_preferences.quiet_end_time), \
                quiet_timezone = COALESCE($10, notification_preferences.quiet_timezone), \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, PreferenceRow>(&query)
            .bind(user_id)
            .bind(channels)
            .bind(categories)
            .bind(digest.map(|d| d.frequency.as_str()))
            .bind(digest.map(|d| d.time.as_str()))
            .bind(digest.map(|d| d.day_of_week))
            .bind(quiet.map(|q| q.enabled))
            .bind(quiet.map(|q| q.start_time.as_str()))
            .bind(quiet.map(|q| q.end_time.as_str()))
            .bind(quiet.and_then(|q| q.timezone.as_deref()))
            .bind(default_channels())
            .bind(default_categories())
            .fetch_one(pool)
            .await
    }

    /// List all preference rows with the given digest frequency.
    ///
    /// The scheduler filters the send hour/weekday in Rust so the time
    /// comparison stays in one place (`courier_core::timeofday`).
    pub async fn list_by_digest_frequency(
        pool: &PgPool,
        frequency: &str,
    ) -> Result<Vec<PreferenceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notification_preferences \
             WHERE digest_frequency = $1 \
             ORDER BY user_id"
        );
        sqlx::query_as::<_, PreferenceRow>(&query)
            .bind(frequency)
            .fetch_all(pool)
            .await
    }
}

/// Default channels document for freshly seeded rows.
fn default_channels() -> serde_json::Value {
    serde_json::to_value(ChannelPrefs::default()).unwrap_or_default()
}

/// Default categories document for freshly seeded rows.
fn default_categories() -> serde_json::Value {
    serde_json::to_value(CategoryOverrides::default()).unwrap_or_default()
}
