/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Digest scan poll interval in seconds (default: `3600`).
    pub digest_interval_secs: u64,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default  |
    /// |------------------------------|----------|
    /// | `DATABASE_URL`               | required |
    /// | `DIGEST_CHECK_INTERVAL_SECS` | `3600`   |
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let digest_interval_secs: u64 = std::env::var("DIGEST_CHECK_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .map_err(|_| anyhow::anyhow!("DIGEST_CHECK_INTERVAL_SECS must be a valid u64"))?;

        Ok(Self {
            database_url,
            digest_interval_secs,
        })
    }
}
