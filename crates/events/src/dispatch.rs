//! Event-to-notification dispatch.
//!
//! [`Dispatcher`] is the orchestrator: given a recipient and an event
//! payload it loads (or lazily creates) the preference document, computes
//! the channel routing decision, drives the synchronous delivery paths,
//! and persists the notification record exactly once. Push fan-out and
//! immediate email run as spawned tasks; the returned record reflects only
//! the synchronous channels' outcome, with the async results arriving via
//! targeted field updates.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;

use courier_core::preferences::DigestFrequency;
use courier_core::taxonomy::{Category, NotificationStatus, Priority};
use courier_core::types::{DbId, Timestamp};
use courier_core::{Channel, CoreError, NotificationPreferences};
use courier_db::models::notification::{CreateNotification, Notification};
use courier_db::repositories::{AccountRepo, NotificationRepo, PreferenceRepo};
use courier_db::DbPool;

use crate::bus::{DispatchRequest, NotificationInput};
use crate::delivery::push;
use crate::transport::{EmailTransport, PushTransport, RealtimeTransport};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed dispatch.
///
/// Channel-level delivery failures never surface here; they are visible
/// only through the record's per-channel error fields.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The input payload failed validation.
    #[error("Invalid notification input: {0}")]
    Validation(#[from] CoreError),

    /// The preference document could not be loaded or created.
    #[error("Failed to load notification preferences: {0}")]
    Preferences(sqlx::Error),

    /// The notification record could not be persisted. A record that
    /// cannot be persisted is not considered delivered via any channel.
    #[error("Failed to persist notification: {0}")]
    Persistence(sqlx::Error),
}

// ---------------------------------------------------------------------------
// Channel plan
// ---------------------------------------------------------------------------

/// The per-channel routing decision for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPlan {
    pub in_app: bool,
    pub push: bool,
    pub email: bool,
    /// Email goes out now rather than waiting for a digest window.
    pub email_immediate: bool,
    /// Email is deferred for the digest scheduler to claim.
    pub include_in_digest: bool,
}

/// Compute the routing decision from the preference document.
///
/// Quiet hours suppress push only, and never for `urgent` priority.
/// Email is immediate when digests are off or the priority is urgent;
/// otherwise it is deferred. A disabled email channel forces
/// `include_in_digest` off regardless of digest settings.
pub fn plan_channels(
    prefs: &NotificationPreferences,
    category: Category,
    priority: Priority,
    now: &Timestamp,
) -> ChannelPlan {
    let in_app = prefs.should_send(Channel::InApp, category);
    let mut push = prefs.should_send(Channel::Push, category);
    let email = prefs.should_send(Channel::Email, category);

    if push && priority != Priority::Urgent && prefs.is_in_quiet_hours(now) {
        push = false;
    }

    let email_immediate = email
        && (prefs.digest.frequency == DigestFrequency::Never || priority == Priority::Urgent);

    ChannelPlan {
        in_app,
        push,
        email,
        email_immediate,
        include_in_digest: email && !email_immediate,
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes events to notification records and delivery channels.
pub struct Dispatcher {
    pool: DbPool,
    realtime: Arc<dyn RealtimeTransport>,
    push: Arc<dyn PushTransport>,
    email: Arc<dyn EmailTransport>,
}

impl Dispatcher {
    /// Create a dispatcher over the given pool and transports.
    pub fn new(
        pool: DbPool,
        realtime: Arc<dyn RealtimeTransport>,
        push: Arc<dyn PushTransport>,
        email: Arc<dyn EmailTransport>,
    ) -> Self {
        Self {
            pool,
            realtime,
            push,
            email,
        }
    }

    /// Run the dispatch loop over a bus subscription.
    ///
    /// Consumes [`DispatchRequest`]s until the channel closes (i.e. the
    /// [`DispatchBus`](crate::bus::DispatchBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<DispatchRequest>) {
        loop {
            match receiver.recv().await {
                Ok(request) => {
                    if let Err(e) = self.send(request.recipient_id, request.input).await {
                        tracing::error!(
                            recipient_id = request.recipient_id,
                            error = %e,
                            "Failed to dispatch notification"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Dispatcher lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Dispatch bus closed, dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Dispatch one event to one recipient.
    ///
    /// Returns the persisted record, or an error when validation,
    /// preference load, or the final save fails. An event is never
    /// silently dropped: every accepted input produces exactly one
    /// persisted row.
    pub async fn send(
        &self,
        recipient_id: DbId,
        input: NotificationInput,
    ) -> Result<Notification, DispatchError> {
        input.validate()?;

        let prefs_row = PreferenceRepo::get_or_create(&self.pool, recipient_id)
            .await
            .map_err(DispatchError::Preferences)?;
        let prefs = prefs_row.document();

        let category = input.category.unwrap_or_else(|| input.kind.default_category());
        let priority = input.priority.unwrap_or_default();
        let now = Utc::now();
        let plan = plan_channels(&prefs, category, priority, &now);

        // In-app delivery is "live" only: reach a connected session now or
        // leave the flag unset for the fetch path. No retry.
        let mut in_app_delivered = false;
        if plan.in_app && self.realtime.is_online(recipient_id).await {
            let payload = serde_json::json!({
                "kind": input.kind,
                "category": category,
                "title": &input.title,
                "body": &input.body,
                "data": &input.data,
                "timestamp": now,
            });
            in_app_delivered = self
                .realtime
                .send_to_user(recipient_id, "notification", &payload)
                .await
                > 0;
        }

        let status = if in_app_delivered || plan.email_immediate {
            NotificationStatus::Delivered
        } else {
            NotificationStatus::Pending
        };

        let create = CreateNotification {
            recipient_id,
            sender_id: input.sender_id,
            kind: input.kind.as_str().to_string(),
            category: category.as_str().to_string(),
            priority: priority.as_str().to_string(),
            title: input.title,
            body: input.body,
            data: serde_json::to_value(&input.data).unwrap_or_default(),
            status: status.as_str().to_string(),
            in_app_delivered,
            email_delivered: plan.email_immediate,
            email_include_in_digest: plan.include_in_digest,
            group_key: input.group_key,
            group_count: 1,
            expires_at: input.expires_at,
            tenant_id: input.tenant_id,
            scheduled_for: input.scheduled_for,
        };

        let notification = NotificationRepo::create(&self.pool, &create)
            .await
            .map_err(DispatchError::Persistence)?;

        if plan.push {
            tokio::spawn(push::deliver_and_record(
                self.pool.clone(),
                Arc::clone(&self.push),
                notification.clone(),
            ));
        }

        if plan.email_immediate {
            tokio::spawn(send_immediate_email(
                self.pool.clone(),
                Arc::clone(&self.email),
                notification.clone(),
                prefs.channels.email.address.clone(),
            ));
        }

        tracing::debug!(
            recipient_id,
            notification_id = notification.id,
            in_app = plan.in_app,
            push = plan.push,
            email_immediate = plan.email_immediate,
            digest = plan.include_in_digest,
            "Notification dispatched"
        );

        Ok(notification)
    }
}

/// Hand an immediate email to the transport collaborator.
///
/// The record's email flags were already set at insert time; a transport
/// failure only annotates the record, it never fails the dispatch.
async fn send_immediate_email(
    pool: DbPool,
    email: Arc<dyn EmailTransport>,
    notification: Notification,
    address_override: Option<String>,
) {
    let address = match address_override {
        Some(address) => Some(address),
        None => match AccountRepo::get(&pool, notification.recipient_id).await {
            Ok(account) => account.map(|a| a.email),
            Err(e) => {
                tracing::error!(
                    recipient_id = notification.recipient_id,
                    error = %e,
                    "Failed to resolve email address"
                );
                None
            }
        },
    };

    let Some(address) = address else {
        tracing::warn!(
            recipient_id = notification.recipient_id,
            "No email address on file, skipping immediate send"
        );
        return;
    };

    if let Err(e) = email
        .send(&address, &notification.title, &notification.body)
        .await
    {
        tracing::error!(
            notification_id = notification.id,
            error = %e,
            "Immediate email send failed"
        );
        if let Err(db_err) =
            NotificationRepo::set_email_error(&pool, notification.id, &e.to_string()).await
        {
            tracing::error!(
                notification_id = notification.id,
                error = %db_err,
                "Failed to record email error"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
