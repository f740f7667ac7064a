//! Pluggable persistent cache for loaded resources
//!
//! The cache maps a resource URL to the data URI produced for it. All
//! completions are delivered through a [`CacheListener`] rather than return
//! values: `on_open`, `on_get` and `on_put` each fire at most once per call.
//!
//! Backends:
//!
//! - [`PersistentCacheBackend`]: SQLite store `Cache` with a destructive
//!   upgrade when the stored schema version is older than the current one
//! - [`NullCacheBackend`]: stands in when no storage facility exists
//!
//! A single [`CacheHandle`] is constructed per process and shared by every
//! loader. It picks the backend lazily, on first use, and is never torn down.

use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::config::CacheConfig;

pub mod entity;
pub mod null;
pub mod persistent;

pub use null::NullCacheBackend;
pub use persistent::PersistentCacheBackend;

/// Receives cache completions.
pub trait CacheListener: Send {
    /// The open attempt triggered by this listener finished.
    fn on_open(&mut self, success: bool);

    /// A read finished. `found` is false for both a missing record and an
    /// empty stored value; `value` is empty whenever `found` is false.
    fn on_get(&mut self, found: bool, value: String);

    /// A write finished.
    fn on_put(&mut self, success: bool);
}

/// Asynchronous key/value store keyed by resource URL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Whether a storage facility exists at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Whether `get` and `put` may be called.
    fn is_ready(&self) -> bool;

    /// Open the store.
    ///
    /// Returns false when the open request could not be issued, in which case
    /// the listener is not called. Only the caller that triggers the single
    /// open attempt is guaranteed an `on_open`; a caller arriving while that
    /// attempt is still in flight receives nothing.
    async fn open(&self, listener: &mut dyn CacheListener) -> bool;

    /// Write `value` under `key`. Requires [`is_ready`](Self::is_ready).
    async fn put(&self, listener: &mut dyn CacheListener, key: &str, value: &str);

    /// Read the value under `key`. Requires [`is_ready`](Self::is_ready).
    async fn get(&self, listener: &mut dyn CacheListener, key: &str);
}

/// Process-wide shared cache handle.
///
/// Construct one per process and hand clones of the `Arc` to each loader.
/// The backend is chosen once, on the first call to [`backend`](Self::backend).
pub struct CacheHandle {
    config: CacheConfig,
    backend: OnceLock<Arc<dyn CacheBackend>>,
}

impl CacheHandle {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            backend: OnceLock::new(),
        }
    }

    /// A handle whose backend has already been chosen.
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        let handle = Self::new(CacheConfig::default());
        let _ = handle.backend.set(backend);
        handle
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        self.backend.get_or_init(|| detect_backend(&self.config))
    }
}

impl std::fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle")
            .field("config", &self.config)
            .field("initialized", &self.backend.get().is_some())
            .finish()
    }
}

fn detect_backend(config: &CacheConfig) -> Arc<dyn CacheBackend> {
    if !config.enabled {
        info!("Cache disabled by configuration, loading straight from the network");
        return Arc::new(NullCacheBackend);
    }
    if !config.database_url.starts_with("sqlite:") {
        info!(
            "No SQLite facility for '{}', loading straight from the network",
            config.database_url
        );
        return Arc::new(NullCacheBackend);
    }
    Arc::new(PersistentCacheBackend::new(config.clone()))
}
