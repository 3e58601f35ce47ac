//! Boundary traits for external delivery collaborators.
//!
//! The live-session transport, push-protocol client, and outbound email
//! transport live outside this core. The engine only depends on these
//! traits; concrete adapters are wired at process start (see
//! [`delivery::smtp`](crate::delivery::smtp) and
//! [`delivery::gateway`](crate::delivery::gateway) for the defaults).

use async_trait::async_trait;

use courier_core::types::DbId;
use courier_db::models::push_subscription::PushSubscription;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for a single push endpoint delivery attempt.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The push service answered with a non-success HTTP status.
    #[error("Push endpoint returned HTTP {0}")]
    Status(u16),

    /// The attempt exceeded its upper time bound.
    #[error("Push delivery timed out")]
    Timeout,

    /// Network-level failure (DNS, connection, TLS, ...).
    #[error("Push transport error: {0}")]
    Transport(String),
}

impl PushError {
    /// The HTTP-like status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Whether the endpoint is permanently invalid and must be pruned.
    ///
    /// 404 and 410 are the only statuses interpreted this way; everything
    /// else keeps the endpoint registered.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Status(404) | Self::Status(410))
    }
}

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(String),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// Transport-level failure (connection, authentication, rejection).
    #[error("Email transport error: {0}")]
    Transport(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Live-session delivery for in-app notifications.
///
/// No delivery guarantee: in-app "delivery" means reaching a live
/// connection; offline recipients read via the poll/fetch path instead.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Whether the user currently has at least one live session.
    async fn is_online(&self, user_id: DbId) -> bool;

    /// Fire an event at every live session of the user.
    ///
    /// Returns the number of sessions reached.
    async fn send_to_user(&self, user_id: DbId, event: &str, payload: &serde_json::Value)
        -> usize;
}

/// Outbound push delivery to a single registered endpoint.
///
/// Implementations must bound each attempt; an unresponsive endpoint is a
/// failure, not a hang.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver a serialized payload to one endpoint.
    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &serde_json::Value,
    ) -> Result<(), PushError>;
}

/// Outbound email delivery.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send a rendered message, returning a transport message id.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, EmailError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gone_statuses_are_pruned() {
        assert!(PushError::Status(404).is_gone());
        assert!(PushError::Status(410).is_gone());
    }

    #[test]
    fn other_failures_keep_the_endpoint() {
        assert!(!PushError::Status(500).is_gone());
        assert!(!PushError::Status(429).is_gone());
        assert!(!PushError::Timeout.is_gone());
        assert!(!PushError::Transport("connection reset".into()).is_gone());
    }

    #[test]
    fn status_accessor() {
        assert_eq!(PushError::Status(410).status(), Some(410));
        assert_eq!(PushError::Timeout.status(), None);
    }
}
