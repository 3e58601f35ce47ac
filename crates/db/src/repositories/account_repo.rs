//! Read-only repository for the `accounts` table.
//!
//! Account rows are written by the account service; the notification core
//! only resolves recipient addresses from them.

use sqlx::PgPool;

use courier_core::types::DbId;

use crate::models::account::Account;

/// Column list for `accounts` queries.
const COLUMNS: &str = "id, email, created_at";

/// Read-only lookups against the account store.
pub struct AccountRepo;

impl AccountRepo {
    /// Fetch an account by id.
    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
