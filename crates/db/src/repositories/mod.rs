//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod account_repo;
pub mod notification_repo;
pub mod preference_repo;
pub mod push_subscription_repo;

pub use account_repo::AccountRepo;
pub use notification_repo::NotificationRepo;
pub use preference_repo::PreferenceRepo;
pub use push_subscription_repo::PushSubscriptionRepo;
