//! Delivery channel taxonomy.
//!
//! Channel names must match the values stored in preference documents and
//! referenced by the dispatcher, push fan-out, and digest scheduler.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// In-app notification delivered over the live-session transport and stored
/// for the notification bell UI.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Browser/device push notification delivered to registered endpoints.
pub const CHANNEL_PUSH: &str = "push";

/// Email notification, immediate or batched into a digest.
pub const CHANNEL_EMAIL: &str = "email";

/// SMS notification. Modeled in preferences but not wired to a transport.
pub const CHANNEL_SMS: &str = "sms";

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// A delivery medium for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Push,
    InApp,
    Sms,
}

/// All channels, in preference-document order.
pub const ALL_CHANNELS: [Channel; 4] = [Channel::Email, Channel::Push, Channel::InApp, Channel::Sms];

impl Channel {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => CHANNEL_EMAIL,
            Self::Push => CHANNEL_PUSH,
            Self::InApp => CHANNEL_IN_APP,
            Self::Sms => CHANNEL_SMS,
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            CHANNEL_EMAIL => Ok(Self::Email),
            CHANNEL_PUSH => Ok(Self::Push),
            CHANNEL_IN_APP => Ok(Self::InApp),
            CHANNEL_SMS => Ok(Self::Sms),
            other => Err(CoreError::Validation(format!("Unknown channel: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
