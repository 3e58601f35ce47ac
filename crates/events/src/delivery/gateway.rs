//! Push delivery via an HTTP push gateway.
//!
//! [`HttpPushGateway`] posts the payload and endpoint descriptor to a
//! relay service that speaks the Web Push protocol (VAPID signing and
//! payload encryption stay on that side of the boundary). The gateway
//! answers with the upstream push service's status code, which is what
//! drives endpoint pruning.

use std::time::Duration;

use async_trait::async_trait;

use courier_db::models::push_subscription::PushSubscription;

use crate::transport::{PushError, PushTransport};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the push gateway client.
#[derive(Debug, Clone)]
pub struct PushGatewayConfig {
    /// Base URL of the relay, e.g. `https://push-gateway.internal/v1/send`.
    pub url: String,
}

impl PushGatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `PUSH_GATEWAY_URL` is not set, signalling that
    /// push delivery is not configured and should be skipped.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("PUSH_GATEWAY_URL").ok()?;
        Some(Self { url })
    }
}

// ---------------------------------------------------------------------------
// HttpPushGateway
// ---------------------------------------------------------------------------

/// Default [`PushTransport`] adapter backed by `reqwest`.
pub struct HttpPushGateway {
    config: PushGatewayConfig,
    client: reqwest::Client,
}

impl HttpPushGateway {
    /// Create a new gateway client with a pre-configured HTTP client.
    pub fn new(config: PushGatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl PushTransport for HttpPushGateway {
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &serde_json::Value,
    ) -> Result<(), PushError> {
        let body = serde_json::json!({
            "endpoint": subscription.endpoint,
            "keys": {
                "p256dh": subscription.p256dh,
                "auth": subscription.auth,
            },
            "payload": payload,
        });

        let response = self
            .client
            .post(&self.config.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PushError::Timeout
                } else {
                    PushError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
