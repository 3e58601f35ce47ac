//! Per-user notification preference document.
//!
//! [`NotificationPreferences`] is created lazily with a fixed default table
//! the first time a user's preferences are read or a dispatch targets a
//! user without one. Updates are partial-field merges applied by the
//! repository layer; this module only defines the document and its two
//! derived routing predicates, [`should_send`](NotificationPreferences::should_send)
//! and [`is_in_quiet_hours`](NotificationPreferences::is_in_quiet_hours).
//!
//! Default table:
//!
//! | Field                  | Default            |
//! |------------------------|--------------------|
//! | `channels.email`       | enabled            |
//! | `channels.push`        | enabled            |
//! | `channels.in_app`      | enabled            |
//! | `channels.sms`         | disabled           |
//! | `categories.*`         | no overrides       |
//! | `digest.frequency`     | `never`            |
//! | `digest.time`          | `"09:00"` (UTC)    |
//! | `digest.day_of_week`   | `1` (Monday)       |
//! | `quiet_hours`          | disabled, 22:00–08:00 |

use serde::{Deserialize, Serialize};

use crate::channels::Channel;
use crate::error::CoreError;
use crate::taxonomy::Category;
use crate::timeofday;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Channel settings
// ---------------------------------------------------------------------------

/// Master on/off switch for one channel, with an optional delivery address
/// (email address or phone number, depending on the channel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSetting {
    pub enabled: bool,
    pub address: Option<String>,
}

impl Default for ChannelSetting {
    fn default() -> Self {
        Self {
            enabled: true,
            address: None,
        }
    }
}

impl ChannelSetting {
    fn disabled() -> Self {
        Self {
            enabled: false,
            address: None,
        }
    }
}

/// Master toggles for all four channels. Every channel is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelPrefs {
    pub email: ChannelSetting,
    pub push: ChannelSetting,
    pub in_app: ChannelSetting,
    pub sms: ChannelSetting,
}

impl Default for ChannelPrefs {
    fn default() -> Self {
        Self {
            email: ChannelSetting::default(),
            push: ChannelSetting::default(),
            in_app: ChannelSetting::default(),
            sms: ChannelSetting::disabled(),
        }
    }
}

impl ChannelPrefs {
    /// The setting for a given channel.
    pub fn get(&self, channel: Channel) -> &ChannelSetting {
        match channel {
            Channel::Email => &self.email,
            Channel::Push => &self.push,
            Channel::InApp => &self.in_app,
            Channel::Sms => &self.sms,
        }
    }
}

// ---------------------------------------------------------------------------
// Category overrides
// ---------------------------------------------------------------------------

/// Per-channel override flags for one category. `None` means "allowed":
/// an override can only narrow delivery below an enabled master channel,
/// never widen past a disabled one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelOverrides {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub in_app: Option<bool>,
    pub sms: Option<bool>,
}

impl ChannelOverrides {
    /// The override for a given channel, if one is set.
    pub fn get(&self, channel: Channel) -> Option<bool> {
        match channel {
            Channel::Email => self.email,
            Channel::Push => self.push,
            Channel::InApp => self.in_app,
            Channel::Sms => self.sms,
        }
    }
}

/// Overrides for all six categories. Every category is always present;
/// a category with no overrides imposes no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOverrides {
    pub social: ChannelOverrides,
    pub content: ChannelOverrides,
    pub messaging: ChannelOverrides,
    pub events: ChannelOverrides,
    pub system: ChannelOverrides,
    pub marketing: ChannelOverrides,
}

impl CategoryOverrides {
    /// The overrides for a given category.
    pub fn get(&self, category: Category) -> &ChannelOverrides {
        match category {
            Category::Social => &self.social,
            Category::Content => &self.content,
            Category::Messaging => &self.messaging,
            Category::Events => &self.events,
            Category::System => &self.system,
            Category::Marketing => &self.marketing,
        }
    }
}

// ---------------------------------------------------------------------------
// Digest configuration
// ---------------------------------------------------------------------------

/// How often digest emails are batched for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    Daily,
    Weekly,
    /// No digest; enabled email notifications are sent immediately.
    #[default]
    Never,
}

impl DigestFrequency {
    /// Return the wire-format string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Never => "never",
        }
    }

    /// Parse from a wire-format string.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "never" => Ok(Self::Never),
            other => Err(CoreError::Validation(format!(
                "Unknown digest frequency: {other}"
            ))),
        }
    }
}

/// Digest cadence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub frequency: DigestFrequency,
    /// Send time as `"HH:mm"` (UTC). Matched at hour granularity.
    pub time: String,
    /// Weekday for weekly digests, 0 = Sunday through 6 = Saturday.
    pub day_of_week: i16,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            frequency: DigestFrequency::Never,
            time: "09:00".to_string(),
            day_of_week: 1,
        }
    }
}

impl DigestConfig {
    /// Validate the send time and weekday.
    pub fn validate(&self) -> Result<(), CoreError> {
        if timeofday::parse_hhmm(&self.time).is_none() {
            return Err(CoreError::Validation(format!(
                "Digest time must be HH:mm, got {:?}",
                self.time
            )));
        }
        if !(0..=6).contains(&self.day_of_week) {
            return Err(CoreError::Validation(format!(
                "Digest day_of_week must be 0-6, got {}",
                self.day_of_week
            )));
        }
        Ok(())
    }

    /// Whether this config's send time falls in the given UTC hour bucket.
    pub fn matches_hour(&self, hour: u16) -> bool {
        timeofday::parse_hhmm(&self.time)
            .map(|m| timeofday::hour_of(m) == hour)
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Quiet hours
// ---------------------------------------------------------------------------

/// A configured window during which non-urgent push delivery is suppressed.
///
/// The `timezone` field is stored but not applied; all comparisons use UTC
/// clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHours {
    pub enabled: bool,
    pub start_time: String,
    pub end_time: String,
    pub timezone: Option<String>,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: "22:00".to_string(),
            end_time: "08:00".to_string(),
            timezone: None,
        }
    }
}

impl QuietHours {
    /// Validate both window bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (label, value) in [("start_time", &self.start_time), ("end_time", &self.end_time)] {
            if timeofday::parse_hhmm(value).is_none() {
                return Err(CoreError::Validation(format!(
                    "Quiet hours {label} must be HH:mm, got {value:?}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NotificationPreferences
// ---------------------------------------------------------------------------

/// The full per-user preference document.
///
/// Push subscription endpoints are stored alongside this document in their
/// own table; see `courier-db`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub channels: ChannelPrefs,
    pub categories: CategoryOverrides,
    pub digest: DigestConfig,
    pub quiet_hours: QuietHours,
}

impl NotificationPreferences {
    /// Whether a notification of `category` may be delivered on `channel`.
    ///
    /// The master channel toggle short-circuits: a disabled channel never
    /// delivers regardless of category overrides. With the master enabled,
    /// the category-specific override applies if present, else delivery is
    /// allowed.
    pub fn should_send(&self, channel: Channel, category: Category) -> bool {
        if !self.channels.get(channel).enabled {
            return false;
        }
        self.categories.get(category).get(channel).unwrap_or(true)
    }

    /// Whether `now` (UTC) falls inside the configured quiet-hours window.
    ///
    /// Returns `false` when quiet hours are disabled or either bound fails
    /// to parse. The window is half-open: `[start, end)`, wrapping
    /// midnight when `start >= end`.
    pub fn is_in_quiet_hours(&self, now: &Timestamp) -> bool {
        if !self.quiet_hours.enabled {
            return false;
        }
        let (Some(start), Some(end)) = (
            timeofday::parse_hhmm(&self.quiet_hours.start_time),
            timeofday::parse_hhmm(&self.quiet_hours.end_time),
        ) else {
            return false;
        };
        timeofday::in_window(timeofday::minutes_of(now), start, end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn default_table_matches_contract() {
        let prefs = NotificationPreferences::default();
        assert!(prefs.channels.email.enabled);
        assert!(prefs.channels.push.enabled);
        assert!(prefs.channels.in_app.enabled);
        assert!(!prefs.channels.sms.enabled);
        assert_eq!(prefs.digest.frequency, DigestFrequency::Never);
        assert_eq!(prefs.digest.time, "09:00");
        assert!(!prefs.quiet_hours.enabled);
    }

    #[test]
    fn disabled_master_channel_blocks_every_category() {
        let mut prefs = NotificationPreferences::default();
        prefs.channels.push.enabled = false;
        // An explicit "allow" override cannot widen past a disabled master.
        prefs.categories.social.push = Some(true);

        for category in crate::taxonomy::ALL_CATEGORIES {
            assert!(!prefs.should_send(Channel::Push, category));
        }
    }

    #[test]
    fn missing_override_defaults_to_allowed() {
        let prefs = NotificationPreferences::default();
        for category in crate::taxonomy::ALL_CATEGORIES {
            assert!(prefs.should_send(Channel::Email, category));
        }
    }

    #[test]
    fn category_override_narrows_single_channel() {
        let mut prefs = NotificationPreferences::default();
        prefs.categories.marketing.email = Some(false);

        assert!(!prefs.should_send(Channel::Email, Category::Marketing));
        // Other categories and channels are untouched.
        assert!(prefs.should_send(Channel::Email, Category::Social));
        assert!(prefs.should_send(Channel::Push, Category::Marketing));
    }

    #[test]
    fn quiet_hours_disabled_never_suppresses() {
        let prefs = NotificationPreferences::default();
        assert!(!prefs.is_in_quiet_hours(&ts("2026-03-01T23:00:00Z")));
    }

    #[test]
    fn quiet_hours_wrapping_window() {
        let mut prefs = NotificationPreferences::default();
        prefs.quiet_hours = QuietHours {
            enabled: true,
            start_time: "22:00".into(),
            end_time: "08:00".into(),
            timezone: None,
        };
        assert!(prefs.is_in_quiet_hours(&ts("2026-03-01T23:00:00Z")));
        assert!(prefs.is_in_quiet_hours(&ts("2026-03-01T03:00:00Z")));
        assert!(!prefs.is_in_quiet_hours(&ts("2026-03-01T12:00:00Z")));
    }

    #[test]
    fn quiet_hours_non_wrapping_half_open() {
        let mut prefs = NotificationPreferences::default();
        prefs.quiet_hours = QuietHours {
            enabled: true,
            start_time: "09:00".into(),
            end_time: "17:00".into(),
            timezone: None,
        };
        assert!(prefs.is_in_quiet_hours(&ts("2026-03-01T10:00:00Z")));
        assert!(!prefs.is_in_quiet_hours(&ts("2026-03-01T08:59:00Z")));
        // The upper bound is exclusive.
        assert!(!prefs.is_in_quiet_hours(&ts("2026-03-01T17:00:00Z")));
    }

    #[test]
    fn unparseable_quiet_hours_fail_safe_to_not_suppressed() {
        let mut prefs = NotificationPreferences::default();
        prefs.quiet_hours = QuietHours {
            enabled: true,
            start_time: "late".into(),
            end_time: "08:00".into(),
            timezone: None,
        };
        assert!(!prefs.is_in_quiet_hours(&ts("2026-03-01T23:00:00Z")));
    }

    #[test]
    fn sparse_document_deserializes_with_all_keys() {
        // A document written before a field existed still loads, with
        // defaults filling the gaps.
        let prefs: NotificationPreferences =
            serde_json::from_str(r#"{"channels":{"sms":{"enabled":true}}}"#).unwrap();
        assert!(prefs.channels.sms.enabled);
        assert!(prefs.channels.email.enabled);
        assert_eq!(prefs.digest.frequency, DigestFrequency::Never);
    }

    #[test]
    fn digest_config_validation() {
        let mut cfg = DigestConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.time = "25:00".into();
        assert!(cfg.validate().is_err());
        cfg.time = "09:00".into();
        cfg.day_of_week = 7;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn digest_hour_matching() {
        let cfg = DigestConfig {
            frequency: DigestFrequency::Daily,
            time: "09:30".into(),
            day_of_week: 1,
        };
        assert!(cfg.matches_hour(9));
        assert!(!cfg.matches_hour(10));
    }
}
