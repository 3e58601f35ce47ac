//! In-process dispatch bus backed by a `tokio::sync::broadcast` channel.
//!
//! Event producers publish [`DispatchRequest`]s; the
//! [`Dispatcher`](crate::dispatch::Dispatcher) consumes them in its run
//! loop. Producers that need the persisted record back call
//! [`Dispatcher::send`](crate::dispatch::Dispatcher::send) directly
//! instead — both paths are equivalent.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use courier_core::taxonomy::{Category, NotificationKind, Priority, MAX_BODY_LENGTH, MAX_TITLE_LENGTH};
use courier_core::types::{DbId, Timestamp};
use courier_core::CoreError;
use courier_db::models::notification::NotificationData;

// ---------------------------------------------------------------------------
// NotificationInput
// ---------------------------------------------------------------------------

/// The payload an event producer hands to the dispatcher.
///
/// Constructed via [`NotificationInput::new`] and enriched with the
/// builder methods; `category` and `priority` default from the kind when
/// not supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationInput {
    /// The event kind that produced this notification.
    pub kind: NotificationKind,

    /// Explicit category override; defaults from `kind` when `None`.
    pub category: Option<Category>,

    /// Delivery priority; defaults to `normal`.
    pub priority: Option<Priority>,

    pub title: String,
    pub body: String,

    /// Optional id of the user whose action produced the event. Absent for
    /// system events.
    pub sender_id: Option<DbId>,

    /// Structured content (entity reference, url, image, actions).
    pub data: NotificationData,

    /// Batching key for future coalescing; passed through unused.
    pub group_key: Option<String>,

    /// Expired records are hidden from listing and unread counts.
    pub expires_at: Option<Timestamp>,

    /// Opaque tenant tag, passed through unenforced.
    pub tenant_id: Option<String>,

    /// Future-send marker; passed through unscheduled.
    pub scheduled_for: Option<Timestamp>,
}

impl NotificationInput {
    /// Create an input with only the required kind and title.
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            category: None,
            priority: None,
            title: title.into(),
            body: String::new(),
            sender_id: None,
            data: NotificationData::default(),
            group_key: None,
            expires_at: None,
            tenant_id: None,
            scheduled_for: None,
        }
    }

    /// Set the body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Override the category derived from the kind.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the delivery priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attach the acting user.
    pub fn with_sender(mut self, sender_id: DbId) -> Self {
        self.sender_id = Some(sender_id);
        self
    }

    /// Set the structured content payload.
    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }

    /// Validate content lengths.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Title must not be empty".to_string()));
        }
        if self.title.chars().count() > MAX_TITLE_LENGTH {
            return Err(CoreError::Validation(format!(
                "Title exceeds {MAX_TITLE_LENGTH} characters"
            )));
        }
        if self.body.chars().count() > MAX_BODY_LENGTH {
            return Err(CoreError::Validation(format!(
                "Body exceeds {MAX_BODY_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DispatchRequest
// ---------------------------------------------------------------------------

/// A dispatch order published on the bus: one event for one recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub recipient_id: DbId,
    pub input: NotificationInput,
}

// ---------------------------------------------------------------------------
// DispatchBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for dispatch requests.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published request. Designed to be shared
/// via `Arc<DispatchBus>` across the application.
pub struct DispatchBus {
    sender: broadcast::Sender<DispatchRequest>,
}

impl DispatchBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a request to all current subscribers.
    ///
    /// If there are no active subscribers the request is silently dropped.
    pub fn publish(&self, request: DispatchRequest) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(request);
    }

    /// Subscribe to all requests published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatchRequest> {
        self.sender.subscribe()
    }
}

impl Default for DispatchBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
