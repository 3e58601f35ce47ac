//! Repository for the `push_subscriptions` table.

use sqlx::PgPool;

use courier_core::types::DbId;

use crate::models::push_subscription::{PushSubscription, RegisterPushSubscription};

/// Column list for `push_subscriptions` queries.
const COLUMNS: &str = "id, user_id, endpoint, p256dh, auth, expiration_time, \
    device_type, browser, last_used_at, created_at";

/// Provides CRUD operations for registered push endpoints.
pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// List a user's registered endpoints in registration order.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<PushSubscription>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_subscriptions \
             WHERE user_id = $1 \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Register an endpoint, refreshing keys if it is already known.
    ///
    /// Re-registering an existing endpoint (e.g. after a browser rotates
    /// subscription keys) updates the keys in place instead of duplicating
    /// the row.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        sub: &RegisterPushSubscription,
    ) -> Result<PushSubscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_subscriptions \
                (user_id, endpoint, p256dh, auth, expiration_time, device_type, browser) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id, endpoint) DO UPDATE SET \
                p256dh = EXCLUDED.p256dh, \
                auth = EXCLUDED.auth, \
                expiration_time = EXCLUDED.expiration_time, \
                device_type = COALESCE(EXCLUDED.device_type, push_subscriptions.device_type), \
                browser = COALESCE(EXCLUDED.browser, push_subscriptions.browser) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_id)
            .bind(&sub.endpoint)
            .bind(&sub.keys.p256dh)
            .bind(&sub.keys.auth)
            .bind(sub.expiration_time)
            .bind(&sub.device_type)
            .bind(&sub.browser)
            .fetch_one(pool)
            .await
    }

    /// Remove a single endpoint. Returns `true` if it existed.
    pub async fn remove(
        pool: &PgPool,
        user_id: DbId,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE user_id = $1 AND endpoint = $2")
                .bind(user_id)
                .bind(endpoint)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Prune a batch of permanently invalid endpoints in one statement.
    ///
    /// Called after push fan-out for every endpoint that answered 404/410.
    pub async fn remove_many(
        pool: &PgPool,
        user_id: DbId,
        endpoints: &[String],
    ) -> Result<u64, sqlx::Error> {
        if endpoints.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "DELETE FROM push_subscriptions WHERE user_id = $1 AND endpoint = ANY($2)",
        )
        .bind(user_id)
        .bind(endpoints)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Stamp `last_used_at` for endpoints that just accepted a delivery.
    pub async fn mark_used(
        pool: &PgPool,
        user_id: DbId,
        endpoints: &[String],
    ) -> Result<u64, sqlx::Error> {
        if endpoints.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            "UPDATE push_subscriptions SET last_used_at = NOW() \
             WHERE user_id = $1 AND endpoint = ANY($2)",
        )
        .bind(user_id)
        .bind(endpoints)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
