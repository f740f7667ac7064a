/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Cache defaults
pub const DEFAULT_CACHE_ENABLED: bool = true;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/Test.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 1;

// Persisted layout
pub const CACHE_STORE_NAME: &str = "Cache";
pub const CACHE_SCHEMA_VERSION: i64 = 1;

// HTTP defaults
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("resource-loader/", env!("CARGO_PKG_VERSION"));

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
