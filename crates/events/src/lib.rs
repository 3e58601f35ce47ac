//! Courier delivery engine.
//!
//! This crate decides, for every generated event, which channels fire and
//! tracks the resulting per-channel delivery state:
//!
//! - [`DispatchBus`] — in-process publish/subscribe hub for dispatch
//!   requests, backed by `tokio::sync::broadcast`.
//! - [`Dispatcher`] — loads preferences, computes the channel routing
//!   decision (quiet hours, digest deferral), drives delivery, persists
//!   the notification record.
//! - [`transport`] — the boundary traits for the live-session, push, and
//!   email collaborators.
//! - [`delivery`] — push fan-out plus the default SMTP and push-gateway
//!   adapters.
//! - [`DigestScheduler`] — periodic batching of deferred email into
//!   daily/weekly digests.
//! - [`NotificationService`] — the read/ack/preference surface consumed
//!   by API layers.

pub mod bus;
pub mod delivery;
pub mod digest;
pub mod dispatch;
pub mod service;
pub mod transport;

pub use bus::{DispatchBus, DispatchRequest, NotificationInput};
pub use digest::DigestScheduler;
pub use dispatch::{DispatchError, Dispatcher};
pub use service::NotificationService;
pub use transport::{EmailTransport, PushTransport, RealtimeTransport};
