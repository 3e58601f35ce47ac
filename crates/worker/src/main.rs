//! Digest worker entrypoint.
//!
//! Connects to the database, applies migrations, and runs the
//! [`DigestScheduler`] until SIGINT.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courier_events::delivery::smtp::{EmailConfig, SmtpMailer};
use courier_events::DigestScheduler;

mod config;

use config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_worker=debug,courier_events=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env()?;
    tracing::info!(
        digest_interval_secs = config.digest_interval_secs,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = courier_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    courier_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    courier_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    // --- Email transport ---
    let email_config = EmailConfig::from_env()
        .context("SMTP_HOST is not set; digest delivery requires an email transport")?;
    let mailer = Arc::new(SmtpMailer::new(email_config));

    // --- Digest scheduler ---
    let cancel = CancellationToken::new();
    let scheduler = DigestScheduler::new(pool, mailer)
        .with_interval(Duration::from_secs(config.digest_interval_secs));

    let scheduler_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });
    tracing::info!("Digest scheduler started");

    // --- Shutdown ---
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received, stopping digest scheduler");
    cancel.cancel();
    handle.await.context("Digest scheduler task panicked")?;

    Ok(())
}
