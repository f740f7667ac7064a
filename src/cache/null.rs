//! Cache backend used when no storage facility exists

use async_trait::async_trait;
use tracing::warn;

use super::{CacheBackend, CacheListener};

/// Stand-in for an absent storage facility.
///
/// It is never ready and refuses to open. Loaders check
/// [`CacheBackend::is_available`] and skip it entirely, so reaching `get` or
/// `put` here is a programming error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCacheBackend;

#[async_trait]
impl CacheBackend for NullCacheBackend {
    fn is_available(&self) -> bool {
        false
    }

    fn is_ready(&self) -> bool {
        false
    }

    async fn open(&self, _listener: &mut dyn CacheListener) -> bool {
        false
    }

    async fn put(&self, listener: &mut dyn CacheListener, key: &str, _value: &str) {
        debug_assert!(false, "put on an unavailable cache");
        warn!("Ignoring put for '{}': no cache facility", key);
        listener.on_put(false);
    }

    async fn get(&self, listener: &mut dyn CacheListener, key: &str) {
        debug_assert!(false, "get on an unavailable cache");
        warn!("Ignoring get for '{}': no cache facility", key);
        listener.on_get(false, String::new());
    }
}
