//! Notification read/ack/preference surface.
//!
//! [`NotificationService`] is the interface consumed by API layers:
//! listing and unread counts, read/click acknowledgement, hard deletion,
//! preference reads and partial updates, and push endpoint registration.
//! Dispatching new notifications lives in
//! [`Dispatcher`](crate::dispatch::Dispatcher).

use serde::{Deserialize, Serialize};

use courier_core::taxonomy::Category;
use courier_core::types::DbId;
use courier_core::{CoreError, NotificationPreferences};
use courier_db::models::notification::Notification;
use courier_db::models::preference::UpdatePreferences;
use courier_db::models::push_subscription::{PushSubscription, RegisterPushSubscription};
use courier_db::repositories::{NotificationRepo, PreferenceRepo, PushSubscriptionRepo};
use courier_db::DbPool;

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A domain-level error (validation, not-found).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The endpoint to unregister is not in the user's subscription set.
    #[error("Push endpoint not registered: {0}")]
    EndpointNotFound(String),
}

/// Convenience type alias for service return values.
pub type ServiceResult<T> = Result<T, ServiceError>;

// ---------------------------------------------------------------------------
// Query / view types
// ---------------------------------------------------------------------------

/// Listing parameters for a recipient's notifications.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Optional category filter.
    pub category: Option<Category>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// A user's preference document together with the registered endpoints.
#[derive(Debug, Serialize)]
pub struct PreferencesView {
    pub preferences: NotificationPreferences,
    pub push_subscriptions: Vec<PushSubscription>,
}

// ---------------------------------------------------------------------------
// NotificationService
// ---------------------------------------------------------------------------

/// Read/ack/preference operations over the notification store.
#[derive(Clone)]
pub struct NotificationService {
    pool: DbPool,
}

impl NotificationService {
    /// Create a service over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List a user's notifications, newest first, excluding expired rows.
    pub async fn list(&self, user_id: DbId, query: &ListQuery) -> ServiceResult<Vec<Notification>> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);
        let category = query.category.map(|c| c.as_str());

        let notifications =
            NotificationRepo::list_for_recipient(&self.pool, user_id, category, limit, offset)
                .await?;
        Ok(notifications)
    }

    /// Count a user's unread, unexpired notifications.
    pub async fn unread_count(&self, user_id: DbId) -> ServiceResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, user_id).await?)
    }

    /// Mark a single notification as read. Repeat calls are no-ops.
    pub async fn mark_read(&self, notification_id: DbId, user_id: DbId) -> ServiceResult<()> {
        let found = NotificationRepo::mark_read(&self.pool, notification_id, user_id).await?;
        if !found {
            return Err(CoreError::NotFound {
                entity: "Notification",
                id: notification_id,
            }
            .into());
        }
        Ok(())
    }

    /// Mark a notification as clicked, which also marks it read.
    /// Repeat calls are no-ops and keep the original timestamps.
    pub async fn mark_clicked(&self, notification_id: DbId, user_id: DbId) -> ServiceResult<()> {
        let found = NotificationRepo::mark_clicked(&self.pool, notification_id, user_id).await?;
        if !found {
            return Err(CoreError::NotFound {
                entity: "Notification",
                id: notification_id,
            }
            .into());
        }
        Ok(())
    }

    /// Mark all of a user's unread notifications as read, optionally only
    /// those in one category. Returns the number of rows flipped.
    pub async fn mark_all_read(
        &self,
        user_id: DbId,
        category: Option<Category>,
    ) -> ServiceResult<u64> {
        let count =
            NotificationRepo::mark_all_read(&self.pool, user_id, category.map(|c| c.as_str()))
                .await?;
        Ok(count)
    }

    /// Hard-delete a notification owned by the user.
    pub async fn delete(&self, notification_id: DbId, user_id: DbId) -> ServiceResult<()> {
        let found = NotificationRepo::delete(&self.pool, notification_id, user_id).await?;
        if !found {
            return Err(CoreError::NotFound {
                entity: "Notification",
                id: notification_id,
            }
            .into());
        }
        Ok(())
    }

    /// Fetch a user's preferences, creating the default document on first
    /// read.
    pub async fn get_preferences(&self, user_id: DbId) -> ServiceResult<PreferencesView> {
        let row = PreferenceRepo::get_or_create(&self.pool, user_id).await?;
        let push_subscriptions = PushSubscriptionRepo::list_for_user(&self.pool, user_id).await?;
        Ok(PreferencesView {
            preferences: row.document(),
            push_subscriptions,
        })
    }

    /// Apply a partial preference update and return the merged document.
    pub async fn update_preferences(
        &self,
        user_id: DbId,
        update: &UpdatePreferences,
    ) -> ServiceResult<NotificationPreferences> {
        update.validate()?;
        let row = PreferenceRepo::update(&self.pool, user_id, update).await?;
        Ok(row.document())
    }

    /// Register (or refresh) a push endpoint for the user.
    pub async fn register_push_endpoint(
        &self,
        user_id: DbId,
        subscription: &RegisterPushSubscription,
    ) -> ServiceResult<PushSubscription> {
        subscription.validate()?;
        let sub = PushSubscriptionRepo::upsert(&self.pool, user_id, subscription).await?;
        tracing::info!(user_id, endpoint = %sub.endpoint, "Push endpoint registered");
        Ok(sub)
    }

    /// Remove a push endpoint from the user's subscription set.
    pub async fn unregister_push_endpoint(
        &self,
        user_id: DbId,
        endpoint: &str,
    ) -> ServiceResult<()> {
        let removed = PushSubscriptionRepo::remove(&self.pool, user_id, endpoint).await?;
        if !removed {
            return Err(ServiceError::EndpointNotFound(endpoint.to_string()));
        }
        tracing::info!(user_id, endpoint, "Push endpoint unregistered");
        Ok(())
    }
}
