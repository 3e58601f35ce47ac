//! Courier domain core.
//!
//! Zero-internal-dep crate holding the shared vocabulary of the
//! notification platform:
//!
//! - [`types`] — database id and timestamp aliases.
//! - [`channels`] — delivery channel taxonomy.
//! - [`taxonomy`] — notification kinds, categories, and priorities.
//! - [`timeofday`] — minutes-since-midnight arithmetic shared by quiet
//!   hours and digest-time matching.
//! - [`preferences`] — the per-user preference document and its derived
//!   routing predicates.
//! - [`error`] — [`CoreError`](error::CoreError).

pub mod channels;
pub mod error;
pub mod preferences;
pub mod taxonomy;
pub mod timeofday;
pub mod types;

pub use channels::Channel;
pub use error::CoreError;
pub use preferences::NotificationPreferences;
pub use taxonomy::{Category, NotificationKind, NotificationStatus, Priority};
