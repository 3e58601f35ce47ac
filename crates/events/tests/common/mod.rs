//! Shared fixtures: recording transport doubles and row seeding helpers.

// Each integration test binary compiles this module independently and
// uses a different subset of it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::Mutex;

use courier_core::types::DbId;
use courier_db::models::notification::{CreateNotification, Notification};
use courier_db::models::push_subscription::{PushKeys, PushSubscription, RegisterPushSubscription};
use courier_db::repositories::{NotificationRepo, PushSubscriptionRepo};
use courier_events::transport::{
    EmailError, EmailTransport, PushError, PushTransport, RealtimeTransport,
};

// ---------------------------------------------------------------------------
// Transport doubles
// ---------------------------------------------------------------------------

/// Realtime transport double with a fixed online flag.
pub struct FakeRealtime {
    pub online: bool,
    pub sent: Mutex<Vec<(DbId, String, serde_json::Value)>>,
}

impl FakeRealtime {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            online: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn offline() -> Arc<Self> {
        Arc::new(Self {
            online: false,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RealtimeTransport for FakeRealtime {
    async fn is_online(&self, _user_id: DbId) -> bool {
        self.online
    }

    async fn send_to_user(
        &self,
        user_id: DbId,
        event: &str,
        payload: &serde_json::Value,
    ) -> usize {
        if !self.online {
            return 0;
        }
        self.sent
            .lock()
            .await
            .push((user_id, event.to_string(), payload.clone()));
        1
    }
}

/// Push transport double answering a scripted status per endpoint
/// (missing endpoints accept the delivery).
pub struct FakePush {
    pub statuses: HashMap<String, u16>,
    pub attempts: Mutex<Vec<String>>,
}

impl FakePush {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            statuses: HashMap::new(),
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn scripted(statuses: &[(&str, u16)]) -> Arc<Self> {
        Arc::new(Self {
            statuses: statuses
                .iter()
                .map(|(e, s)| (e.to_string(), *s))
                .collect(),
            attempts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PushTransport for FakePush {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        _payload: &serde_json::Value,
    ) -> Result<(), PushError> {
        self.attempts
            .lock()
            .await
            .push(subscription.endpoint.clone());
        match self.statuses.get(&subscription.endpoint).copied() {
            None => Ok(()),
            Some(code) if (200..300).contains(&code) => Ok(()),
            Some(code) => Err(PushError::Status(code)),
        }
    }
}

/// Email transport double recording sends, optionally failing for
/// selected addresses.
pub struct FakeEmail {
    pub failing_addresses: Vec<String>,
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl FakeEmail {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            failing_addresses: Vec::new(),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_for(addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing_addresses: addresses.iter().map(|a| a.to_string()).collect(),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl EmailTransport for FakeEmail {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, EmailError> {
        if self.failing_addresses.iter().any(|a| a == to) {
            return Err(EmailError::Transport("mailbox unavailable".into()));
        }
        self.sent
            .lock()
            .await
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok("250 queued".to_string())
    }
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Await an async condition with a bounded poll loop.
///
/// Fire-and-forget tasks (push fan-out, immediate email) settle shortly
/// after dispatch returns; this keeps the assertions race-free.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    false
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Insert an account row and return its id.
pub async fn seed_account(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("seed account")
}

/// Insert a pending notification row directly, bypassing the dispatcher.
pub async fn seed_notification(
    pool: &PgPool,
    recipient_id: DbId,
    category: &str,
    title: &str,
) -> Notification {
    seed_row(pool, recipient_id, category, title, false, None).await
}

/// Insert a digest-eligible, undelivered notification row.
pub async fn seed_digest_notification(
    pool: &PgPool,
    recipient_id: DbId,
    category: &str,
    title: &str,
) -> Notification {
    seed_row(pool, recipient_id, category, title, true, None).await
}

/// Insert an already-expired notification row.
pub async fn seed_expired_notification(
    pool: &PgPool,
    recipient_id: DbId,
    category: &str,
    title: &str,
) -> Notification {
    let expired = chrono::Utc::now() - chrono::Duration::hours(1);
    seed_row(pool, recipient_id, category, title, false, Some(expired)).await
}

async fn seed_row(
    pool: &PgPool,
    recipient_id: DbId,
    category: &str,
    title: &str,
    include_in_digest: bool,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Notification {
    NotificationRepo::create(
        pool,
        &CreateNotification {
            recipient_id,
            sender_id: None,
            kind: "system".into(),
            category: category.into(),
            priority: "normal".into(),
            title: title.into(),
            body: String::new(),
            data: serde_json::json!({}),
            status: "pending".into(),
            in_app_delivered: false,
            email_delivered: false,
            email_include_in_digest: include_in_digest,
            group_key: None,
            group_count: 1,
            expires_at,
            tenant_id: None,
            scheduled_for: None,
        },
    )
    .await
    .expect("seed notification")
}

/// Register a push endpoint with valid keys.
pub async fn seed_subscription(pool: &PgPool, user_id: DbId, endpoint: &str) -> PushSubscription {
    PushSubscriptionRepo::upsert(
        pool,
        user_id,
        &RegisterPushSubscription {
            endpoint: endpoint.to_string(),
            keys: PushKeys {
                p256dh: "BNcW4...".into(),
                auth: "k9f2...".into(),
            },
            expiration_time: None,
            device_type: Some("desktop".into()),
            browser: Some("firefox".into()),
        },
    )
    .await
    .expect("seed subscription")
}
