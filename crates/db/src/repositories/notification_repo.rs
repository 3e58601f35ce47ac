//! Repository for the `notifications` table.
//!
//! All read/update paths are single statements so concurrent dispatches,
//! user actions, and scheduler ticks stay atomic at row granularity.
//! Status moves `pending -> delivered` inside the same UPDATE that flips a
//! channel's delivered flag; `read` is set only by the explicit mark-read
//! and mark-clicked paths.

use sqlx::PgPool;

use courier_core::types::{DbId, Timestamp};

use crate::models::notification::{CreateNotification, Notification};

/// Column list for `notifications` queries.
const COLUMNS: &str = "id, recipient_id, sender_id, kind, category, priority, title, body, data, \
    status, is_read, read_at, is_clicked, clicked_at, \
    in_app_delivered, in_app_delivered_at, push_delivered, push_delivered_at, push_error, \
    email_delivered, email_delivered_at, email_error, email_include_in_digest, \
    group_key, group_count, expires_at, tenant_id, scheduled_for, \
    retry_count, last_retry_at, created_at";

/// Rows whose expiry has passed are hidden from listing and counting but
/// never purged here.
const NOT_EXPIRED: &str = "(expires_at IS NULL OR expires_at > NOW())";

/// Provides CRUD operations for notifications.
pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a fully routed notification, returning the persisted row.
    ///
    /// Delivered-at timestamps are stamped in SQL for whichever channels
    /// the dispatcher already resolved synchronously.
    pub async fn create(
        pool: &PgPool,
        input: &CreateNotification,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications \
                (recipient_id, sender_id, kind, category, priority, title, body, data, status, \
                 in_app_delivered, in_app_delivered_at, \
                 email_delivered, email_delivered_at, email_include_in_digest, \
                 group_key, group_count, expires_at, tenant_id, scheduled_for) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, \
                 $10, CASE WHEN $10 THEN NOW() END, \
                 $11, CASE WHEN $11 THEN NOW() END, $12, \
                 $13, $14, $15, $16, $17) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(input.recipient_id)
            .bind(input.sender_id)
            .bind(&input.kind)
            .bind(&input.category)
            .bind(&input.priority)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.data)
            .bind(&input.status)
            .bind(input.in_app_delivered)
            .bind(input.email_delivered)
            .bind(input.email_include_in_digest)
            .bind(&input.group_key)
            .bind(input.group_count)
            .bind(input.expires_at)
            .bind(&input.tenant_id)
            .bind(input.scheduled_for)
            .fetch_one(pool)
            .await
    }

    /// Fetch a notification by id, scoped to its recipient.
    pub async fn get(
        pool: &PgPool,
        notification_id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<Notification>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM notifications WHERE id = $1 AND recipient_id = $2");
        sqlx::query_as::<_, Notification>(&query)
            .bind(notification_id)
            .bind(recipient_id)
            .fetch_optional(pool)
            .await
    }

    /// List a recipient's notifications, newest first.
    ///
    /// Expired rows are excluded; `category` optionally narrows the result.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 \
               AND ($2::text IS NULL OR category = $2) \
               AND {NOT_EXPIRED} \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(category)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a recipient's unread, unexpired notifications.
    pub async fn unread_count(pool: &PgPool, recipient_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM notifications \
             WHERE recipient_id = $1 AND is_read = false AND {NOT_EXPIRED}"
        );
        let count: Option<i64> = sqlx::query_scalar(&query)
            .bind(recipient_id)
            .fetch_one(pool)
            .await?;
        Ok(count.unwrap_or(0))
    }

    /// Mark a single notification as read.
    ///
    /// Idempotent: a second call leaves `read_at` untouched. Returns `true`
    /// if the row exists for the given recipient.
    pub async fn mark_read(
        pool: &PgPool,
        notification_id: DbId,
        recipient_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = COALESCE(read_at, NOW()), status = 'read' \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a notification as clicked, which implies read.
    ///
    /// A click on an unread row stamps `clicked_at` and `read_at` from the
    /// same statement clock. Idempotent: existing timestamps are kept.
    /// Returns `true` if the row exists for the given recipient.
    pub async fn mark_clicked(
        pool: &PgPool,
        notification_id: DbId,
        recipient_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_clicked = true, clicked_at = COALESCE(clicked_at, NOW()), \
                 is_read = true, read_at = COALESCE(read_at, NOW()), status = 'read' \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(notification_id)
        .bind(recipient_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark all of a recipient's unread notifications as read, optionally
    /// restricted to one category. Returns the number of rows flipped.
    pub async fn mark_all_read(
        pool: &PgPool,
        recipient_id: DbId,
        category: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET is_read = true, read_at = NOW(), status = 'read' \
             WHERE recipient_id = $1 AND is_read = false \
               AND ($2::text IS NULL OR category = $2)",
        )
        .bind(recipient_id)
        .bind(category)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete a notification owned by the recipient.
    pub async fn delete(
        pool: &PgPool,
        notification_id: DbId,
        recipient_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(notification_id)
            .bind(recipient_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record the outcome of an async push fan-out.
    pub async fn set_push_result(
        pool: &PgPool,
        notification_id: DbId,
        delivered: bool,
        error: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE notifications \
             SET push_delivered = $2, \
                 push_delivered_at = CASE WHEN $2 THEN NOW() ELSE push_delivered_at END, \
                 push_error = $3, \
                 status = CASE WHEN $2 AND status = 'pending' THEN 'delivered' ELSE status END \
             WHERE id = $1",
        )
        .bind(notification_id)
        .bind(delivered)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed immediate email send.
    pub async fn set_email_error(
        pool: &PgPool,
        notification_id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE notifications SET email_error = $2 WHERE id = $1")
            .bind(notification_id)
            .bind(error)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Fetch a recipient's digest-eligible, still-undelivered rows created
    /// at or after `since`, newest first.
    pub async fn list_digest_pending(
        pool: &PgPool,
        recipient_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications \
             WHERE recipient_id = $1 \
               AND email_include_in_digest AND email_delivered = false \
               AND created_at >= $2 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(since)
            .fetch_all(pool)
            .await
    }

    /// Flip the email-delivered flag for every id in one batch.
    ///
    /// Only called after a confirmed digest send; the flag is what keeps a
    /// row out of every later digest scan.
    pub async fn mark_email_delivered(
        pool: &PgPool,
        notification_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET email_delivered = true, email_delivered_at = NOW(), \
                 status = CASE WHEN status = 'pending' THEN 'delivered' ELSE status END \
             WHERE id = ANY($1)",
        )
        .bind(notification_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
