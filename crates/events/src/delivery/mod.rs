//! Delivery channels and default transport adapters.
//!
//! [`push`] implements the per-endpoint fan-out; [`gateway`] and [`smtp`]
//! are the default [`PushTransport`](crate::transport::PushTransport) and
//! [`EmailTransport`](crate::transport::EmailTransport) adapters.

pub mod gateway;
pub mod push;
pub mod smtp;
