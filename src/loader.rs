//! Cache-backed resource loader
//!
//! [`Loader::load`] has no return value. The result reaches the caller's
//! [`LoadListener`] as `on_load_data(url, data_uri)`, at most once per call.
//!
//! Each load walks these steps strictly in order, every step starting only
//! after the previous one has completed:
//!
//! 1. open the shared cache if it is not ready yet
//! 2. read the URL from the cache; a hit is delivered and the load ends
//! 3. on a miss, a failed open or an absent cache, GET the URL
//! 4. a `200` response with a `Content-Type` is encoded as a data URI and
//!    delivered, then written back to the cache without waiting on or
//!    surfacing the outcome
//!
//! Any other response ends the load silently: the listener is never called
//! and nothing is written. Loads cannot be cancelled and carry no timeout.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{CacheBackend, CacheHandle, CacheListener};
use crate::encoder;
use crate::event_hub::EventHub;
use crate::transport::{FetchEvent, FetchResponse, LOAD_EVENT, Transport};

/// Receives loaded resources.
pub trait LoadListener: Send {
    fn on_load_data(&mut self, url: &str, text: &str);
}

/// A single cache completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CacheOutcome {
    Opened(bool),
    Got { found: bool, value: String },
    Put(bool),
}

/// Continuation handed to the cache for one call.
///
/// It resolves at most once and the loader consumes the outcome exactly once.
/// An unresolved reply means the backend never answered; there is no
/// cancellation token to abandon it early.
#[derive(Debug, Default)]
struct CacheReply {
    outcome: Option<CacheOutcome>,
}

impl CacheReply {
    fn resolve(&mut self, outcome: CacheOutcome) {
        debug_assert!(self.outcome.is_none(), "cache reply resolved twice");
        self.outcome = Some(outcome);
    }

    fn take(&mut self) -> Option<CacheOutcome> {
        self.outcome.take()
    }
}

impl CacheListener for CacheReply {
    fn on_open(&mut self, success: bool) {
        self.resolve(CacheOutcome::Opened(success));
    }

    fn on_get(&mut self, found: bool, value: String) {
        self.resolve(CacheOutcome::Got { found, value });
    }

    fn on_put(&mut self, success: bool) {
        self.resolve(CacheOutcome::Put(success));
    }
}

enum CacheLookup {
    Hit(String),
    Miss,
    /// The open was joined while another caller's attempt was in flight.
    Stalled,
}

/// State for one `load` call, dropped once the call has finished.
struct LoadRequest {
    url: String,
    cache: Option<Arc<dyn CacheBackend>>,
}

pub struct Loader<L: LoadListener> {
    listener: L,
    cache: Arc<CacheHandle>,
    transport: Arc<dyn Transport>,
}

impl<L: LoadListener> Loader<L> {
    pub fn new(listener: L, cache: Arc<CacheHandle>, transport: Arc<dyn Transport>) -> Self {
        Self {
            listener,
            cache,
            transport,
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Load `url`, delivering the data URI to the listener.
    ///
    /// Taking `&mut self` keeps loads on one loader strictly sequential.
    pub async fn load(&mut self, url: &str) {
        let backend = Arc::clone(self.cache.backend());
        let request = LoadRequest {
            url: url.to_owned(),
            cache: backend.is_available().then_some(backend),
        };

        if let Some(cache) = &request.cache {
            match Self::lookup(cache.as_ref(), &request.url).await {
                CacheLookup::Hit(text) => {
                    debug!("Serving '{}' from cache", request.url);
                    self.listener.on_load_data(&request.url, &text);
                    return;
                }
                CacheLookup::Stalled => {
                    warn!(
                        "Cache open for '{}' joined another caller's attempt, nothing will be delivered",
                        request.url
                    );
                    return;
                }
                CacheLookup::Miss => {}
            }
        } else {
            debug!("No cache facility, fetching '{}' directly", request.url);
        }

        self.fetch(request).await;
    }

    async fn lookup(cache: &dyn CacheBackend, url: &str) -> CacheLookup {
        if !cache.is_ready() {
            let mut reply = CacheReply::default();
            if !cache.open(&mut reply).await {
                debug!("Cache open could not be issued for '{}'", url);
                return CacheLookup::Miss;
            }
            match reply.take() {
                Some(CacheOutcome::Opened(true)) => {}
                Some(CacheOutcome::Opened(false)) => {
                    debug!("Cache unavailable for '{}'", url);
                    return CacheLookup::Miss;
                }
                None => return CacheLookup::Stalled,
                Some(other) => {
                    debug_assert!(false, "open answered with {other:?}");
                    return CacheLookup::Miss;
                }
            }
        }

        let mut reply = CacheReply::default();
        cache.get(&mut reply, url).await;
        match reply.take() {
            Some(CacheOutcome::Got { found: true, value }) if !value.is_empty() => {
                CacheLookup::Hit(value)
            }
            _ => CacheLookup::Miss,
        }
    }

    async fn fetch(&mut self, request: LoadRequest) {
        let LoadRequest { url, cache } = request;

        let mut hub = EventHub::new(self.transport.send(&url));
        hub.register(LOAD_EVENT, true);

        let Some(event) = hub.target_mut().settle().await else {
            debug!("Request for '{}' settled without a load event", url);
            return;
        };

        let mut response = None;
        hub.dispatch(event, &mut |_: &str, event: FetchEvent| {
            if let FetchEvent::Load(loaded) = event {
                response = Some(loaded);
            }
        });

        let Some(text) = response.and_then(|response| Self::encode_response(&url, response))
        else {
            return;
        };

        self.listener.on_load_data(&url, &text);

        match cache {
            Some(cache) if cache.is_ready() => {
                let mut reply = CacheReply::default();
                cache.put(&mut reply, &url, &text).await;
                match reply.take() {
                    Some(CacheOutcome::Put(true)) => debug!("Wrote '{}' back to cache", url),
                    _ => debug!("Write-back of '{}' did not succeed", url),
                }
            }
            Some(_) => debug!("Cache not ready, skipping write-back of '{}'", url),
            None => {}
        }
    }

    fn encode_response(url: &str, response: FetchResponse) -> Option<String> {
        if response.status != 200 {
            debug!("Discarding '{}': status {}", url, response.status);
            return None;
        }
        let Some(content_type) = response.content_type.as_deref() else {
            debug!("Discarding '{}': no content type", url);
            return None;
        };
        Some(encoder::encode(content_type, &response.body))
    }
}

impl<L: LoadListener + std::fmt::Debug> std::fmt::Debug for Loader<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("listener", &self.listener)
            .field("cache", &self.cache)
            .finish()
    }
}
