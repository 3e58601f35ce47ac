//! Notification preference row model and update DTO.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use courier_core::preferences::{
    CategoryOverrides, ChannelPrefs, DigestConfig, DigestFrequency, NotificationPreferences,
    QuietHours,
};
use courier_core::types::{DbId, Timestamp};
use courier_core::CoreError;

/// A row from the `notification_preferences` table.
///
/// `channels` and `categories` are JSONB documents; the digest and
/// quiet-hours sections are flattened into columns so the digest scheduler
/// can filter on frequency in SQL.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PreferenceRow {
    pub id: DbId,
    pub user_id: DbId,
    pub channels: serde_json::Value,
    pub categories: serde_json::Value,
    pub digest_frequency: String,
    pub digest_time: String,
    pub digest_day_of_week: i16,
    pub quiet_enabled: bool,
    pub quiet_start_time: String,
    pub quiet_end_time: String,
    pub quiet_timezone: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PreferenceRow {
    /// Assemble the domain preference document from this row.
    ///
    /// JSONB sections that fail to decode fall back to the documented
    /// defaults rather than failing the read.
    pub fn document(&self) -> NotificationPreferences {
        let channels: ChannelPrefs =
            serde_json::from_value(self.channels.clone()).unwrap_or_default();
        let categories: CategoryOverrides =
            serde_json::from_value(self.categories.clone()).unwrap_or_default();

        NotificationPreferences {
            channels,
            categories,
            digest: DigestConfig {
                frequency: DigestFrequency::from_str(&self.digest_frequency)
                    .unwrap_or_default(),
                time: self.digest_time.clone(),
                day_of_week: self.digest_day_of_week,
            },
            quiet_hours: QuietHours {
                enabled: self.quiet_enabled,
                start_time: self.quiet_start_time.clone(),
                end_time: self.quiet_end_time.clone(),
                timezone: self.quiet_timezone.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Update DTO
// ---------------------------------------------------------------------------

/// Partial update for a preference document.
///
/// Each section is merged independently; omitted sections are left
/// untouched (COALESCE upsert, never a full-document overwrite).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferences {
    pub channels: Option<ChannelPrefs>,
    pub categories: Option<CategoryOverrides>,
    pub digest: Option<DigestConfig>,
    pub quiet_hours: Option<QuietHours>,
}

impl UpdatePreferences {
    /// Validate the sections that carry parseable time fields.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(digest) = &self.digest {
            digest.validate()?;
        }
        if let Some(quiet) = &self.quiet_hours {
            quiet.validate()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
