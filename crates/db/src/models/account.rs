//! Account entity model.
//!
//! Accounts are owned by the account service; this core reads them only to
//! resolve digest recipient addresses.

use serde::Serialize;
use sqlx::FromRow;

use courier_core::types::{DbId, Timestamp};

/// A row from the `accounts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub email: String,
    pub created_at: Timestamp,
}
