/// Process-level settings for the `hoard` binary.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SQLite URL of the content store.
    pub database_url: String,
    /// Byte ceiling for everything in the store; `None` is unlimited.
    pub store_quota_bytes: Option<u64>,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                     |
    /// |---------------------------|-----------------------------|
    /// | `HOARD_DATABASE_URL`      | `sqlite://hoard.db?mode=rwc` |
    /// | `HOARD_STORE_QUOTA_BYTES` | unset (no quota)            |
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("HOARD_DATABASE_URL").unwrap_or_else(|_| "sqlite://hoard.db?mode=rwc".into());

        let store_quota_bytes = std::env::var("HOARD_STORE_QUOTA_BYTES").ok().map(|v| {
            v.parse::<u64>()
                .expect("HOARD_STORE_QUOTA_BYTES must be a valid u64")
        });

        Self {
            database_url,
            store_quota_bytes,
        }
    }
}
