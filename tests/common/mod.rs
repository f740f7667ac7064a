#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use resource_loader::cache::{CacheBackend, CacheListener};
use resource_loader::loader::LoadListener;
use resource_loader::transport::{FetchEvent, FetchRequest, FetchResponse, Transport};

/// Records every `on_load_data` delivery.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub deliveries: Vec<(String, String)>,
}

impl LoadListener for RecordingListener {
    fn on_load_data(&mut self, url: &str, text: &str) {
        self.deliveries.push((url.to_string(), text.to_string()));
    }
}

/// Cache completion as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCallback {
    Open(bool),
    Get(bool, String),
    Put(bool),
}

#[derive(Debug, Default)]
pub struct RecordingCacheListener {
    pub callbacks: Vec<CacheCallback>,
}

impl CacheListener for RecordingCacheListener {
    fn on_open(&mut self, success: bool) {
        self.callbacks.push(CacheCallback::Open(success));
    }

    fn on_get(&mut self, found: bool, value: String) {
        self.callbacks.push(CacheCallback::Get(found, value));
    }

    fn on_put(&mut self, success: bool) {
        self.callbacks.push(CacheCallback::Put(success));
    }
}

/// How a [`RecordingCache`] answers `open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenBehaviour {
    Succeed,
    Fail,
    /// Accept the request but never call `on_open`.
    NeverAnswer,
    /// Refuse to issue the request.
    Refuse,
}

/// In-memory cache backend that counts every call made on it.
pub struct RecordingCache {
    available: bool,
    open_behaviour: OpenBehaviour,
    ready: Mutex<bool>,
    entries: Mutex<HashMap<String, String>>,
    pub opens: Mutex<usize>,
    pub gets: Mutex<Vec<String>>,
    pub puts: Mutex<Vec<(String, String)>>,
}

impl RecordingCache {
    pub fn new(open_behaviour: OpenBehaviour) -> Self {
        Self {
            available: true,
            open_behaviour,
            ready: Mutex::new(false),
            entries: Mutex::new(HashMap::new()),
            opens: Mutex::new(0),
            gets: Mutex::new(Vec::new()),
            puts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(OpenBehaviour::Refuse)
        }
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn open_count(&self) -> usize {
        *self.opens.lock().unwrap()
    }

    pub fn get_keys(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn put_log(&self) -> Vec<(String, String)> {
        self.puts.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.open_count() + self.get_keys().len() + self.put_log().len()
    }
}

#[async_trait]
impl CacheBackend for RecordingCache {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap()
    }

    async fn open(&self, listener: &mut dyn CacheListener) -> bool {
        *self.opens.lock().unwrap() += 1;
        match self.open_behaviour {
            OpenBehaviour::Succeed => {
                *self.ready.lock().unwrap() = true;
                listener.on_open(true);
                true
            }
            OpenBehaviour::Fail => {
                listener.on_open(false);
                true
            }
            OpenBehaviour::NeverAnswer => true,
            OpenBehaviour::Refuse => false,
        }
    }

    async fn put(&self, listener: &mut dyn CacheListener, key: &str, value: &str) {
        assert!(self.is_ready(), "put before ready");
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        listener.on_put(true);
    }

    async fn get(&self, listener: &mut dyn CacheListener, key: &str) {
        assert!(self.is_ready(), "get before ready");
        self.gets.lock().unwrap().push(key.to_string());
        let value = self.entries.lock().unwrap().get(key).cloned();
        match value {
            Some(value) if !value.is_empty() => listener.on_get(true, value),
            _ => listener.on_get(false, String::new()),
        }
    }
}

/// Transport answering from a fixed table and recording each request.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: HashMap<String, FetchEvent>,
    pub sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            FetchEvent::Load(FetchResponse::new(status, content_type, body.to_vec())),
        );
        self
    }

    pub fn fail(mut self, url: &str, message: &str) -> Self {
        self.routes
            .insert(url.to_string(), FetchEvent::Error(message.to_string()));
        self
    }

    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, url: &str) -> FetchRequest {
        self.sent.lock().unwrap().push(url.to_string());
        let event = self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchEvent::Error(format!("no route for {url}")));
        FetchRequest::settled(url, event)
    }
}

/// Tiny PNG-ish payload with bytes outside the ASCII range.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0xFF, 0x00];
