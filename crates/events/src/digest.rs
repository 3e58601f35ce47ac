//! Digest notification scheduler.
//!
//! [`DigestScheduler`] runs as a background task. The daily and weekly
//! scans tick independently: each scan matches users whose configured
//! digest time falls in the current UTC hour bucket (plus weekday for
//! weekly), collects their deferred, still-undelivered email rows inside
//! the lookback window, sends one batched summary, and flips the
//! email-delivered flag for every included row in a single update. That
//! flag flip is the only thing keeping a row out of later digests — a
//! failed send is naturally retried on the next matching tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use tokio_util::sync::CancellationToken;

use courier_core::preferences::{DigestConfig, DigestFrequency};
use courier_core::timeofday;
use courier_core::types::{DbId, Timestamp};
use courier_db::models::notification::Notification;
use courier_db::models::preference::PreferenceRow;
use courier_db::repositories::{AccountRepo, NotificationRepo, PreferenceRepo};
use courier_db::DbPool;

use crate::transport::{EmailError, EmailTransport};

/// How often each scan polls for due digests.
const DIGEST_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Items shown per category bucket before the "+N more" rollup.
const ITEMS_PER_BUCKET: usize = 5;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a single user's digest delivery.
#[derive(Debug, thiserror::Error)]
enum DigestError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("No email address on file")]
    NoAddress,
}

// ---------------------------------------------------------------------------
// DigestScheduler
// ---------------------------------------------------------------------------

/// Background service that batches deferred email into periodic digests.
pub struct DigestScheduler {
    pool: DbPool,
    email: Arc<dyn EmailTransport>,
    interval: Duration,
}

impl DigestScheduler {
    /// Create a new scheduler with the given pool and email transport.
    pub fn new(pool: DbPool, email: Arc<dyn EmailTransport>) -> Self {
        Self {
            pool,
            email,
            interval: DIGEST_CHECK_INTERVAL,
        }
    }

    /// Override the poll interval (used by binaries and tests).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the scheduler until the provided [`CancellationToken`] fires.
    ///
    /// The daily and weekly scans run as two independently ticking loops,
    /// not serialized against each other; in-flight scans finish after
    /// cancellation.
    pub async fn run(&self, cancel: CancellationToken) {
        tokio::join!(
            self.run_scan(DigestFrequency::Daily, cancel.clone()),
            self.run_scan(DigestFrequency::Weekly, cancel.clone()),
        );
    }

    /// Periodic loop for one frequency.
    async fn run_scan(&self, frequency: DigestFrequency, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(frequency = frequency.as_str(), "Digest scan cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan(frequency, Utc::now()).await {
                        tracing::error!(
                            frequency = frequency.as_str(),
                            error = %e,
                            "Digest scan failed"
                        );
                    }
                }
            }
        }
    }

    /// Match users due at `now` for one frequency and process each.
    ///
    /// A failure for one user is logged and skipped; it never aborts the
    /// batch for the remaining matched users.
    pub async fn scan(
        &self,
        frequency: DigestFrequency,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let rows = PreferenceRepo::list_by_digest_frequency(&self.pool, frequency.as_str()).await?;
        let due: Vec<PreferenceRow> = rows
            .into_iter()
            .filter(|row| digest_due(&row.document().digest, frequency, &now))
            .collect();

        let mut sent = 0usize;
        for row in &due {
            match self.send_digest(row, frequency, now).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(
                        user_id = row.user_id,
                        error = %e,
                        "Failed to send digest for user"
                    );
                }
            }
        }

        if !due.is_empty() {
            tracing::info!(
                frequency = frequency.as_str(),
                matched = due.len(),
                sent,
                "Digest scan completed"
            );
        }

        Ok(())
    }

    /// Deliver a digest for a single user.
    ///
    /// Returns `Ok(false)` when there was nothing to send. The flag flip
    /// happens only after the transport confirms the send.
    async fn send_digest(
        &self,
        row: &PreferenceRow,
        frequency: DigestFrequency,
        now: Timestamp,
    ) -> Result<bool, DigestError> {
        let since = now - lookback(frequency);
        let pending =
            NotificationRepo::list_digest_pending(&self.pool, row.user_id, since).await?;
        if pending.is_empty() {
            return Ok(false);
        }

        let address = match row.document().channels.email.address {
            Some(address) => address,
            None => AccountRepo::get(&self.pool, row.user_id)
                .await?
                .map(|a| a.email)
                .ok_or(DigestError::NoAddress)?,
        };

        let (subject, body) = render_digest(frequency, &pending);
        self.email.send(&address, &subject, &body).await?;

        let ids: Vec<DbId> = pending.iter().map(|n| n.id).collect();
        NotificationRepo::mark_email_delivered(&self.pool, &ids).await?;

        tracing::info!(
            user_id = row.user_id,
            notification_count = ids.len(),
            "Digest delivered"
        );
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Whether a digest config is due at `now` for the given frequency.
///
/// Matching is at hour granularity via the shared minutes-since-midnight
/// comparison; weekly additionally requires the UTC weekday (0 = Sunday).
pub fn digest_due(cfg: &DigestConfig, frequency: DigestFrequency, now: &Timestamp) -> bool {
    let hour = timeofday::hour_of(timeofday::minutes_of(now));
    if !cfg.matches_hour(hour) {
        return false;
    }
    match frequency {
        DigestFrequency::Daily => true,
        DigestFrequency::Weekly => {
            cfg.day_of_week == now.weekday().num_days_from_sunday() as i16
        }
        DigestFrequency::Never => false,
    }
}

/// Lookback window per frequency.
fn lookback(frequency: DigestFrequency) -> chrono::Duration {
    match frequency {
        DigestFrequency::Weekly => chrono::Duration::days(7),
        _ => chrono::Duration::days(1),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a plain-text digest grouped into social / content / other
/// buckets, capped at [`ITEMS_PER_BUCKET`] shown per bucket.
pub fn render_digest(
    frequency: DigestFrequency,
    notifications: &[Notification],
) -> (String, String) {
    let label = match frequency {
        DigestFrequency::Daily => "daily",
        DigestFrequency::Weekly => "weekly",
        DigestFrequency::Never => "pending",
    };
    let count = notifications.len();
    let plural = if count == 1 { "" } else { "s" };
    let subject = format!("Your {label} digest: {count} new notification{plural}");

    let mut social = Vec::new();
    let mut content = Vec::new();
    let mut other = Vec::new();
    for n in notifications {
        match n.category.as_str() {
            "social" => social.push(n),
            "content" => content.push(n),
            _ => other.push(n),
        }
    }

    let mut body = String::new();
    for (heading, bucket) in [
        ("Social", &social),
        ("Content", &content),
        ("Other updates", &other),
    ] {
        if bucket.is_empty() {
            continue;
        }
        body.push_str(&format!("{heading} ({})\n", bucket.len()));
        for n in bucket.iter().take(ITEMS_PER_BUCKET) {
            body.push_str(&format!("- {}\n", n.title));
        }
        if bucket.len() > ITEMS_PER_BUCKET {
            body.push_str(&format!("  +{} more\n", bucket.len() - ITEMS_PER_BUCKET));
        }
        body.push('\n');
    }

    (subject, body)
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

    fn cfg(frequency: DigestFrequency, time: &str, day_of_week: i16) -> DigestConfig {
        DigestConfig {
            frequency,
            time: time.into(),
            day_of_week,
        }
    }

    fn notification(category: &str, title: &str) -> Notification {
        Notification {
            id: 1,
            recipient_id: 7,
            sender_id: None,
            kind: "like".into(),
            category: category.into(),
            priority: "low".into(),
            title: title.into(),
            body: String::new(),
            data: serde_json::json!({}),
            status: "pending".into(),
            is_read: false,
            read_at: None,
            is_clicked: false,
            clicked_at: None,
            in_app_delivered: false,
            in_app_delivered_at: None,
            push_delivered: false,
            push_delivered_at: None,
            push_error: None,
            email_delivered: false,
            email_delivered_at: None,
            email_error: None,
            email_include_in_digest: true,
            group_key: None,
            group_count: 1,
            expires_at: None,
            tenant_id: None,
            scheduled_for: None,
            retry_count: 0,
            last_retry_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn daily_matches_hour_bucket_only() {
        let cfg = cfg(DigestFrequency::Daily, "09:30", 1);
        // 2026-03-02 is a Monday.
        assert!(digest_due(&cfg, DigestFrequency::Daily, &ts("2026-03-02T09:05:00Z")));
        assert!(!digest_due(&cfg, DigestFrequency::Daily, &ts("2026-03-02T10:05:00Z")));
    }

    #[test]
    fn weekly_requires_matching_weekday() {
        // day_of_week 1 = Monday; 2026-03-02 is a Monday, 2026-03-03 a Tuesday.
        let cfg = cfg(DigestFrequency::Weekly, "09:00", 1);
        assert!(digest_due(&cfg, DigestFrequency::Weekly, &ts("2026-03-02T09:45:00Z")));
        assert!(!digest_due(&cfg, DigestFrequency::Weekly, &ts("2026-03-03T09:45:00Z")));
    }

    #[test]
    fn never_frequency_is_never_due() {
        let cfg = cfg(DigestFrequency::Never, "09:00", 1);
        assert!(!digest_due(&cfg, DigestFrequency::Never, &ts("2026-03-02T09:00:00Z")));
    }

    #[test]
    fn render_groups_by_category_bucket() {
        let notifications = vec![
            notification("social", "Alice followed you"),
            notification("content", "Bob shared your post"),
            notification("system", "Password changed"),
        ];
        let (subject, body) = render_digest(DigestFrequency::Daily, &notifications);
        assert_eq!(subject, "Your daily digest: 3 new notifications");
        assert!(body.contains("Social (1)"));
        assert!(body.contains("- Alice followed you"));
        assert!(body.contains("Content (1)"));
        assert!(body.contains("Other updates (1)"));
    }

    #[test]
    fn render_caps_each_bucket_with_rollup() {
        let notifications: Vec<Notification> = (0..8)
            .map(|i| notification("social", &format!("Follow {i}")))
            .collect();
        let (_, body) = render_digest(DigestFrequency::Weekly, &notifications);
        assert!(body.contains("Social (8)"));
        assert!(body.contains("- Follow 4"));
        assert!(!body.contains("- Follow 5"));
        assert!(body.contains("+3 more"));
    }

    #[test]
    fn render_singular_subject() {
        let notifications = vec![notification("social", "One thing")];
        let (subject, _) = render_digest(DigestFrequency::Daily, &notifications);
        assert_eq!(subject, "Your daily digest: 1 new notification");
    }
}
