//! Network transport collaborator
//!
//! A [`Transport`] starts an asynchronous binary GET and hands back a
//! [`FetchRequest`]. The request is a dispatch target: callers attach to the
//! event types they care about through an [`EventHub`](crate::event_hub::EventHub)
//! and the request emits exactly one event when it settles, either `load`
//! (any HTTP status) or `error` (the request never produced a response).
//! An event nobody is attached to is dropped.

use bytes::Bytes;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::future::Future;
use tracing::trace;

use crate::event_hub::{DispatchTarget, HostEvent};

pub mod http;

pub use http::HttpTransport;

pub const LOAD_EVENT: &str = "load";
pub const ERROR_EVENT: &str = "error";

/// A settled HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Value of the `Content-Type` header; `None` when absent or empty.
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type
                .filter(|value| !value.is_empty())
                .map(str::to_owned),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Load(FetchResponse),
    Error(String),
}

impl HostEvent for FetchEvent {
    fn event_type(&self) -> &str {
        match self {
            FetchEvent::Load(_) => LOAD_EVENT,
            FetchEvent::Error(_) => ERROR_EVENT,
        }
    }
}

/// An in-flight GET that settles exactly once.
pub struct FetchRequest {
    url: String,
    pending: Option<BoxFuture<'static, FetchEvent>>,
    attached: HashSet<String>,
}

impl FetchRequest {
    pub fn new<F>(url: impl Into<String>, exchange: F) -> Self
    where
        F: Future<Output = FetchEvent> + Send + 'static,
    {
        Self {
            url: url.into(),
            pending: Some(Box::pin(exchange)),
            attached: HashSet::new(),
        }
    }

    /// A request that has already settled with `event`.
    pub fn settled(url: impl Into<String>, event: FetchEvent) -> Self {
        Self::new(url, futures::future::ready(event))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_attached(&self, event_type: &str) -> bool {
        self.attached.contains(event_type)
    }

    /// Wait for the request to settle.
    ///
    /// Yields the event when a listener is attached for its type, and `None`
    /// when nobody is listening or the request was already consumed.
    pub async fn settle(&mut self) -> Option<FetchEvent> {
        let exchange = self.pending.take()?;
        let event = exchange.await;
        if self.attached.contains(event.event_type()) {
            Some(event)
        } else {
            trace!(
                "Dropping '{}' event for {}: no listener attached",
                event.event_type(),
                self.url
            );
            None
        }
    }
}

impl DispatchTarget for FetchRequest {
    fn attach(&mut self, event_type: &str) {
        self.attached.insert(event_type.to_string());
    }

    fn detach(&mut self, event_type: &str) {
        self.attached.remove(event_type);
    }
}

impl std::fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url)
            .field("settled", &self.pending.is_none())
            .field("attached", &self.attached)
            .finish()
    }
}

/// Issues binary GET requests.
pub trait Transport: Send + Sync {
    fn send(&self, url: &str) -> FetchRequest;
}
