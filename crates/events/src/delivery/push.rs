//! Push fan-out across a user's registered endpoints.
//!
//! One payload is built per notification and delivered to every endpoint
//! independently — a failure on one endpoint never aborts the others.
//! Endpoints answering HTTP 404/410 are collected and pruned from the
//! subscription set in a single batch after the fan-out completes.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use courier_db::models::notification::{Notification, NotificationData};
use courier_db::models::push_subscription::PushSubscription;
use courier_db::repositories::{NotificationRepo, PushSubscriptionRepo};
use courier_db::DbPool;

use crate::transport::{PushError, PushTransport};

/// Upper bound for a single endpoint attempt. An unresponsive endpoint is
/// a failure, not a hang.
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default icon shown when the notification carries no image.
const DEFAULT_ICON: &str = "/icons/notification-192.png";

/// Badge asset for platforms that render one.
const DEFAULT_BADGE: &str = "/icons/badge-72.png";

// ---------------------------------------------------------------------------
// PushFanout
// ---------------------------------------------------------------------------

/// Outcome of one fan-out pass over a user's endpoints.
#[derive(Debug, Default)]
pub struct PushFanout {
    /// Endpoints that accepted the delivery.
    pub delivered_to: usize,
    /// Endpoints attempted.
    pub total: usize,
    /// Endpoints that answered 404/410 and must be pruned.
    pub invalid_endpoints: Vec<String>,
    /// Endpoints that accepted, for `last_used_at` bookkeeping.
    pub delivered_endpoints: Vec<String>,
    /// The most recent non-invalid failure, if any.
    pub last_error: Option<String>,
}

impl PushFanout {
    /// A fan-out succeeds iff at least one endpoint accepted.
    pub fn success(&self) -> bool {
        self.delivered_to > 0
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Build the single payload delivered to every endpoint.
pub fn build_payload(notification: &Notification) -> serde_json::Value {
    let data: NotificationData =
        serde_json::from_value(notification.data.clone()).unwrap_or_default();

    serde_json::json!({
        "title": notification.title,
        "body": notification.body,
        "icon": data.image.as_deref().unwrap_or(DEFAULT_ICON),
        "badge": DEFAULT_BADGE,
        "url": data.url.as_deref().unwrap_or("/"),
        "data": notification.data,
        "timestamp": notification.created_at,
    })
}

// ---------------------------------------------------------------------------
// Fan-out
// ---------------------------------------------------------------------------

/// Per-endpoint attempt outcome, folded into the final [`PushFanout`].
enum Attempt {
    Delivered(String),
    Invalid(String),
    Failed(String, String),
}

/// Deliver a notification to every registered endpoint of one user.
///
/// Attempts run concurrently; each is bounded by [`ENDPOINT_TIMEOUT`].
/// The caller is responsible for pruning `invalid_endpoints` afterwards.
pub async fn send_to_user(
    transport: &dyn PushTransport,
    subscriptions: &[PushSubscription],
    notification: &Notification,
) -> PushFanout {
    let payload = build_payload(notification);

    let attempts = subscriptions.iter().map(|sub| {
        let payload = &payload;
        async move {
            let outcome =
                tokio::time::timeout(ENDPOINT_TIMEOUT, transport.deliver(sub, payload)).await;
            match outcome {
                Ok(Ok(())) => Attempt::Delivered(sub.endpoint.clone()),
                Ok(Err(e)) if e.is_gone() => {
                    tracing::debug!(
                        endpoint = %sub.endpoint,
                        status = e.status(),
                        "Push endpoint gone, queueing for pruning"
                    );
                    Attempt::Invalid(sub.endpoint.clone())
                }
                Ok(Err(e)) => Attempt::Failed(sub.endpoint.clone(), e.to_string()),
                Err(_) => Attempt::Failed(sub.endpoint.clone(), PushError::Timeout.to_string()),
            }
        }
    });

    let mut fanout = PushFanout {
        total: subscriptions.len(),
        ..Default::default()
    };

    for attempt in join_all(attempts).await {
        match attempt {
            Attempt::Delivered(endpoint) => {
                fanout.delivered_to += 1;
                fanout.delivered_endpoints.push(endpoint);
            }
            Attempt::Invalid(endpoint) => fanout.invalid_endpoints.push(endpoint),
            Attempt::Failed(endpoint, error) => {
                tracing::warn!(endpoint = %endpoint, error = %error, "Push delivery attempt failed");
                fanout.last_error = Some(error);
            }
        }
    }

    fanout
}

/// Fan out to a user's endpoints and record the outcome.
///
/// Spawned by the dispatcher after the record is persisted; the record's
/// push sub-state arrives via a targeted field update once the fan-out
/// settles. Repository failures here are logged, never propagated — push
/// is not allowed to fail a dispatch.
pub async fn deliver_and_record(
    pool: DbPool,
    transport: Arc<dyn PushTransport>,
    notification: Notification,
) {
    let user_id = notification.recipient_id;

    let subscriptions = match PushSubscriptionRepo::list_for_user(&pool, user_id).await {
        Ok(subs) => subs,
        Err(e) => {
            tracing::error!(user_id, error = %e, "Failed to load push subscriptions");
            return;
        }
    };

    if subscriptions.is_empty() {
        tracing::debug!(user_id, "No push subscriptions registered, skipping fan-out");
        return;
    }

    let fanout = send_to_user(transport.as_ref(), &subscriptions, &notification).await;

    if let Err(e) =
        PushSubscriptionRepo::remove_many(&pool, user_id, &fanout.invalid_endpoints).await
    {
        tracing::error!(user_id, error = %e, "Failed to prune invalid push endpoints");
    }
    if let Err(e) =
        PushSubscriptionRepo::mark_used(&pool, user_id, &fanout.delivered_endpoints).await
    {
        tracing::error!(user_id, error = %e, "Failed to stamp push endpoint usage");
    }

    let error = if fanout.success() {
        None
    } else {
        fanout.last_error.as_deref()
    };
    if let Err(e) =
        NotificationRepo::set_push_result(&pool, notification.id, fanout.success(), error).await
    {
        tracing::error!(
            notification_id = notification.id,
            error = %e,
            "Failed to record push fan-out outcome"
        );
    }

    tracing::info!(
        user_id,
        notification_id = notification.id,
        delivered_to = fanout.delivered_to,
        total = fanout.total,
        pruned = fanout.invalid_endpoints.len(),
        "Push fan-out completed"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
