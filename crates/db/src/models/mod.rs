//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and partial updates

pub mod account;
pub mod notification;
pub mod preference;
pub mod push_subscription;
