//! Push subscription entity model and registration DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use courier_core::types::{DbId, Timestamp};
use courier_core::CoreError;

/// A row from the `push_subscriptions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushSubscription {
    pub id: DbId,
    pub user_id: DbId,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub expiration_time: Option<Timestamp>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub last_used_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Registration DTO
// ---------------------------------------------------------------------------

/// Encryption keys of a browser push subscription.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// DTO for registering (or refreshing) a push endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
    pub expiration_time: Option<Timestamp>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
}

impl RegisterPushSubscription {
    /// Reject subscriptions missing the endpoint or either key.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.endpoint.trim().is_empty() {
            return Err(CoreError::Validation(
                "Push subscription endpoint must not be empty".to_string(),
            ));
        }
        if self.keys.p256dh.trim().is_empty() || self.keys.auth.trim().is_empty() {
            return Err(CoreError::Validation(
                "Push subscription keys (p256dh, auth) must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
