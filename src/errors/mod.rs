//! Centralized error handling for the resource loader
//!
//! The loading core speaks through the listener protocol (boolean flags and
//! absence of delivery), so these types never reach a `LoadListener`. They are
//! used on the far side of each boundary: opening the SQLite store, building
//! the HTTP client, reading configuration and probing image dimensions.
//!
//! # Error Categories
//!
//! - **Cache Errors**: SQLite connection, schema version and query failures
//! - **Transport Errors**: HTTP client construction and URL resolution
//! - **Configuration Errors**: Unreadable or invalid config files
//! - **Compose Errors**: Data URIs that cannot be decoded or measured
//!
//! # Usage
//!
//! ```rust
//! use resource_loader::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("missing [cache] section"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for cache backend Results
pub type CacheResult<T> = Result<T, CacheError>;

/// Convenience type alias for transport Results
pub type TransportResult<T> = Result<T, TransportError>;
