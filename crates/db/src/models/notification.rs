//! Notification entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use courier_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
///
/// `kind`, `category`, `priority`, and `status` are stored as their
/// wire-format strings; parse with the `courier-core` taxonomy types where
/// typed access is needed.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub recipient_id: DbId,
    pub sender_id: Option<DbId>,
    pub kind: String,
    pub category: String,
    pub priority: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub status: String,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub is_clicked: bool,
    pub clicked_at: Option<Timestamp>,
    pub in_app_delivered: bool,
    pub in_app_delivered_at: Option<Timestamp>,
    pub push_delivered: bool,
    pub push_delivered_at: Option<Timestamp>,
    pub push_error: Option<String>,
    pub email_delivered: bool,
    pub email_delivered_at: Option<Timestamp>,
    pub email_error: Option<String>,
    pub email_include_in_digest: bool,
    pub group_key: Option<String>,
    pub group_count: i32,
    pub expires_at: Option<Timestamp>,
    pub tenant_id: Option<String>,
    pub scheduled_for: Option<Timestamp>,
    /// Reserved; no code path drives retries yet.
    pub retry_count: i32,
    /// Reserved; no code path drives retries yet.
    pub last_retry_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Content payload
// ---------------------------------------------------------------------------

/// Structured content stored in the `data` JSONB column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationData {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub actions: Vec<NotificationAction>,
    /// Free-form metadata passed through untouched.
    pub metadata: serde_json::Value,
}

/// A client-side action button attached to a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: Option<String>,
}

// ---------------------------------------------------------------------------
// Insert DTO
// ---------------------------------------------------------------------------

/// Insert DTO for a fully routed notification.
///
/// The dispatcher computes the per-channel decision and initial status
/// before the single insert; push delivery state always starts false and is
/// updated asynchronously after fan-out.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub recipient_id: DbId,
    pub sender_id: Option<DbId>,
    pub kind: String,
    pub category: String,
    pub priority: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub status: String,
    pub in_app_delivered: bool,
    pub email_delivered: bool,
    pub email_include_in_digest: bool,
    pub group_key: Option<String>,
    pub group_count: i32,
    pub expires_at: Option<Timestamp>,
    pub tenant_id: Option<String>,
    pub scheduled_for: Option<Timestamp>,
}
