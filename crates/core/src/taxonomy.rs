//! Notification kinds, categories, and priorities.
//!
//! Kinds are the closed set of events that can produce a notification.
//! Every kind maps to a default [`Category`]; callers may override the
//! category at dispatch time, but once a record is created its category
//! never changes.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a notification title, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of a notification body, in characters.
pub const MAX_BODY_LENGTH: usize = 500;

// ---------------------------------------------------------------------------
// NotificationKind
// ---------------------------------------------------------------------------

/// The event kind that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Mention,
    Reply,
    Share,
    Post,
    Message,
    Event,
    System,
    Announcement,
    Security,
}

impl NotificationKind {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
            Self::Mention => "mention",
            Self::Reply => "reply",
            Self::Share => "share",
            Self::Post => "post",
            Self::Message => "message",
            Self::Event => "event",
            Self::System => "system",
            Self::Announcement => "announcement",
            Self::Security => "security",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "follow" => Ok(Self::Follow),
            "mention" => Ok(Self::Mention),
            "reply" => Ok(Self::Reply),
            "share" => Ok(Self::Share),
            "post" => Ok(Self::Post),
            "message" => Ok(Self::Message),
            "event" => Ok(Self::Event),
            "system" => Ok(Self::System),
            "announcement" => Ok(Self::Announcement),
            "security" => Ok(Self::Security),
            other => Err(CoreError::Validation(format!(
                "Unknown notification kind: {other}"
            ))),
        }
    }

    /// The category a notification of this kind falls into when the caller
    /// does not supply one explicitly.
    pub fn default_category(&self) -> Category {
        match self {
            Self::Like | Self::Comment | Self::Follow | Self::Mention | Self::Reply => {
                Category::Social
            }
            Self::Share | Self::Post => Category::Content,
            Self::Message => Category::Messaging,
            Self::Event => Category::Events,
            // Everything else is a platform-level notice.
            _ => Category::System,
        }
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Coarse classification used for preference overrides and digest grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Social,
    Content,
    Messaging,
    Events,
    System,
    Marketing,
}

/// All categories, in preference-document order.
pub const ALL_CATEGORIES: [Category; 6] = [
    Category::Social,
    Category::Content,
    Category::Messaging,
    Category::Events,
    Category::System,
    Category::Marketing,
];

impl Category {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::Content => "content",
            Self::Messaging => "messaging",
            Self::Events => "events",
            Self::System => "system",
            Self::Marketing => "marketing",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "social" => Ok(Self::Social),
            "content" => Ok(Self::Content),
            "messaging" => Ok(Self::Messaging),
            "events" => Ok(Self::Events),
            "system" => Ok(Self::System),
            "marketing" => Ok(Self::Marketing),
            other => Err(CoreError::Validation(format!("Unknown category: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Delivery priority. `Urgent` bypasses quiet hours and digest deferral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(CoreError::Validation(format!("Unknown priority: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationStatus
// ---------------------------------------------------------------------------

/// Record lifecycle status.
///
/// Transitions: `pending → delivered` on the first channel delivery,
/// `→ read` on an explicit mark-read. `Sent` and `Failed` exist in the
/// stored enum but no code path sets them; they are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl NotificationStatus {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::Validation(format!("Unknown status: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_kinds_default_to_social() {
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Follow,
            NotificationKind::Mention,
            NotificationKind::Reply,
        ] {
            assert_eq!(kind.default_category(), Category::Social);
        }
    }

    #[test]
    fn content_kinds_default_to_content() {
        assert_eq!(NotificationKind::Share.default_category(), Category::Content);
        assert_eq!(NotificationKind::Post.default_category(), Category::Content);
    }

    #[test]
    fn message_and_event_kinds() {
        assert_eq!(
            NotificationKind::Message.default_category(),
            Category::Messaging
        );
        assert_eq!(NotificationKind::Event.default_category(), Category::Events);
    }

    #[test]
    fn remaining_kinds_default_to_system() {
        assert_eq!(NotificationKind::System.default_category(), Category::System);
        assert_eq!(
            NotificationKind::Announcement.default_category(),
            Category::System
        );
        assert_eq!(
            NotificationKind::Security.default_category(),
            Category::System
        );
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
    }

    #[test]
    fn kind_round_trip() {
        assert_eq!(
            NotificationKind::from_str("mention").unwrap(),
            NotificationKind::Mention
        );
        assert!(NotificationKind::from_str("poke").is_err());
    }
}
