//! Cache-backed resource loading
//!
//! Fetches remote binaries, turns them into `data:` URIs and keeps the
//! result in a persistent SQLite cache keyed by URL. Completions flow through
//! listener traits rather than return values:
//!
//! - [`loader::LoadListener`] receives `on_load_data(url, data_uri)`
//! - [`cache::CacheListener`] receives `on_open`, `on_get` and `on_put`
//! - [`event_hub::EventHub`] manages registrations on dispatch targets such
//!   as an in-flight [`transport::FetchRequest`]
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use resource_loader::{
//!     app::Application, cache::CacheHandle, config::Config, loader::Loader,
//!     transport::HttpTransport,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let cache = Arc::new(CacheHandle::new(config.cache.clone()));
//! let transport = Arc::new(HttpTransport::new(&config.http)?);
//!
//! let mut loader = Loader::new(Application::default(), cache, transport);
//! loader.load("https://example.com/logo.png").await;
//! for resource in loader.listener().loaded() {
//!     println!("{}", resource.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cache;
pub mod compose;
pub mod config;
pub mod encoder;
pub mod errors;
pub mod event_hub;
pub mod loader;
pub mod transport;
