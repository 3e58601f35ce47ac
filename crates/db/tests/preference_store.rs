//! Integration tests for the preference and push-subscription
//! repositories: lazy default seeding, section-wise merge semantics, and
//! batch endpoint pruning.

use sqlx::PgPool;

use courier_core::preferences::{DigestConfig, DigestFrequency, QuietHours};
use courier_core::types::DbId;
use courier_db::models::preference::UpdatePreferences;
use courier_db::models::push_subscription::{PushKeys, RegisterPushSubscription};
use courier_db::repositories::{PreferenceRepo, PushSubscriptionRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_account(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn subscription(endpoint: &str) -> RegisterPushSubscription {
    RegisterPushSubscription {
        endpoint: endpoint.into(),
        keys: PushKeys {
            p256dh: "BNcW4...".into(),
            auth: "k9f2...".into(),
        },
        expiration_time: None,
        device_type: None,
        browser: None,
    }
}

// ---------------------------------------------------------------------------
// Preference document
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn first_access_seeds_the_default_document(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;
    assert!(PreferenceRepo::get(&pool, user).await.unwrap().is_none());

    let row = PreferenceRepo::get_or_create(&pool, user).await.unwrap();
    let doc = row.document();
    assert!(doc.channels.email.enabled);
    assert!(doc.channels.push.enabled);
    assert!(doc.channels.in_app.enabled);
    assert!(!doc.channels.sms.enabled);
    assert_eq!(doc.digest.frequency, DigestFrequency::Never);
    assert!(!doc.quiet_hours.enabled);

    // A second access returns the same row, not a new one.
    let again = PreferenceRepo::get_or_create(&pool, user).await.unwrap();
    assert_eq!(again.id, row.id);
}

#[sqlx::test]
async fn update_merges_only_the_provided_sections(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;

    // An update against a missing document creates it with defaults for
    // the untouched sections.
    let row = PreferenceRepo::update(
        &pool,
        user,
        &UpdatePreferences {
            quiet_hours: Some(QuietHours {
                enabled: true,
                start_time: "21:00".into(),
                end_time: "07:00".into(),
                timezone: Some("Europe/Oslo".into()),
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(row.quiet_enabled);
    assert_eq!(row.digest_frequency, "never");

    // A later digest-only update must not clobber the quiet hours.
    let row = PreferenceRepo::update(
        &pool,
        user,
        &UpdatePreferences {
            digest: Some(DigestConfig {
                frequency: DigestFrequency::Daily,
                time: "07:30".into(),
                day_of_week: 1,
            }),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(row.digest_frequency, "daily");
    assert_eq!(row.digest_time, "07:30");
    assert!(row.quiet_enabled);
    assert_eq!(row.quiet_start_time, "21:00");
    assert_eq!(row.quiet_timezone.as_deref(), Some("Europe/Oslo"));
}

#[sqlx::test]
async fn frequency_listing_buckets_users_for_the_scheduler(pool: PgPool) {
    let daily_user = seed_account(&pool, "daily@example.org").await;
    let weekly_user = seed_account(&pool, "weekly@example.org").await;
    seed_account(&pool, "untouched@example.org").await;

    for (user, frequency) in [
        (daily_user, DigestFrequency::Daily),
        (weekly_user, DigestFrequency::Weekly),
    ] {
        PreferenceRepo::update(
            &pool,
            user,
            &UpdatePreferences {
                digest: Some(DigestConfig {
                    frequency,
                    time: "09:00".into(),
                    day_of_week: 1,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let daily = PreferenceRepo::list_by_digest_frequency(&pool, "daily")
        .await
        .unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].user_id, daily_user);

    let weekly = PreferenceRepo::list_by_digest_frequency(&pool, "weekly")
        .await
        .unwrap();
    assert_eq!(weekly.len(), 1);
    assert_eq!(weekly[0].user_id, weekly_user);
}

// ---------------------------------------------------------------------------
// Push subscriptions
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn reregistering_an_endpoint_refreshes_instead_of_duplicating(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;

    let first = PushSubscriptionRepo::upsert(&pool, user, &subscription("https://push.example.org/a"))
        .await
        .unwrap();

    let mut rotated = subscription("https://push.example.org/a");
    rotated.keys.p256dh = "BRotated...".into();
    let second = PushSubscriptionRepo::upsert(&pool, user, &rotated).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.p256dh, "BRotated...");
    assert_eq!(
        PushSubscriptionRepo::list_for_user(&pool, user).await.unwrap().len(),
        1
    );
}

#[sqlx::test]
async fn batch_prune_removes_only_the_listed_endpoints(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;
    for endpoint in ["https://p.example.org/a", "https://p.example.org/b", "https://p.example.org/c"] {
        PushSubscriptionRepo::upsert(&pool, user, &subscription(endpoint))
            .await
            .unwrap();
    }

    let pruned = PushSubscriptionRepo::remove_many(
        &pool,
        user,
        &["https://p.example.org/b".to_string(), "https://p.example.org/nope".to_string()],
    )
    .await
    .unwrap();
    assert_eq!(pruned, 1);

    let remaining = PushSubscriptionRepo::list_for_user(&pool, user).await.unwrap();
    let endpoints: Vec<&str> = remaining.iter().map(|s| s.endpoint.as_str()).collect();
    assert_eq!(endpoints, vec!["https://p.example.org/a", "https://p.example.org/c"]);
}

#[sqlx::test]
async fn successful_deliveries_stamp_last_used(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;
    PushSubscriptionRepo::upsert(&pool, user, &subscription("https://p.example.org/a"))
        .await
        .unwrap();

    let stamped =
        PushSubscriptionRepo::mark_used(&pool, user, &["https://p.example.org/a".to_string()])
            .await
            .unwrap();
    assert_eq!(stamped, 1);

    let subs = PushSubscriptionRepo::list_for_user(&pool, user).await.unwrap();
    assert!(subs[0].last_used_at.is_some());
}

#[sqlx::test]
async fn removing_an_unknown_endpoint_reports_absence(pool: PgPool) {
    let user = seed_account(&pool, "ada@example.org").await;
    assert!(!PushSubscriptionRepo::remove(&pool, user, "https://p.example.org/missing")
        .await
        .unwrap());
}
