//! End-to-end load flows against scripted cache and transport doubles.

mod common;

use std::sync::Arc;

use common::{OpenBehaviour, PNG_BYTES, RecordingCache, RecordingListener, ScriptedTransport};
use resource_loader::cache::{CacheHandle, NullCacheBackend};
use resource_loader::encoder;
use resource_loader::loader::Loader;

const IMAGE_URL: &str = "https://example.com/a.png";

fn loader_with(
    cache: Arc<RecordingCache>,
    transport: Arc<ScriptedTransport>,
) -> Loader<RecordingListener> {
    Loader::new(
        RecordingListener::default(),
        Arc::new(CacheHandle::with_backend(cache)),
        transport,
    )
}

fn png_transport() -> ScriptedTransport {
    ScriptedTransport::new().respond(IMAGE_URL, 200, Some("image/png"), PNG_BYTES)
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let cache = Arc::new(
        RecordingCache::new(OpenBehaviour::Succeed)
            .with_entry(IMAGE_URL, "data:image/png;base64,AAAA"),
    );
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert_eq!(
        loader.listener().deliveries,
        vec![(IMAGE_URL.to_string(), "data:image/png;base64,AAAA".to_string())]
    );
    assert!(transport.sent_urls().is_empty());
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_miss_fetches_delivers_and_writes_back() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    let expected = encoder::encode("image/png", PNG_BYTES);
    assert_eq!(
        loader.listener().deliveries,
        vec![(IMAGE_URL.to_string(), expected.clone())]
    );
    assert_eq!(transport.sent_urls(), vec![IMAGE_URL.to_string()]);
    assert_eq!(cache.get_keys(), vec![IMAGE_URL.to_string()]);
    assert_eq!(cache.put_log(), vec![(IMAGE_URL.to_string(), expected)]);
}

#[tokio::test]
async fn test_second_load_is_served_from_cache() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;
    loader.load(IMAGE_URL).await;

    let deliveries = &loader.listener().deliveries;
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0], deliveries[1]);
    assert_eq!(transport.sent_urls().len(), 1);
    // The store is opened once and stays ready.
    assert_eq!(cache.open_count(), 1);
}

#[tokio::test]
async fn test_unavailable_cache_goes_straight_to_network() {
    let cache = Arc::new(RecordingCache::unavailable());
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert_eq!(loader.listener().deliveries.len(), 1);
    assert_eq!(transport.sent_urls().len(), 1);
    assert_eq!(cache.total_calls(), 0);
}

#[tokio::test]
async fn test_null_backend_loads_from_network() {
    let transport = Arc::new(png_transport());
    let mut loader = Loader::new(
        RecordingListener::default(),
        Arc::new(CacheHandle::with_backend(Arc::new(NullCacheBackend))),
        transport.clone(),
    );

    loader.load(IMAGE_URL).await;

    assert_eq!(
        loader.listener().deliveries,
        vec![(
            IMAGE_URL.to_string(),
            encoder::encode("image/png", PNG_BYTES)
        )]
    );
}

#[tokio::test]
async fn test_failed_open_falls_back_to_network_without_write_back() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Fail));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert_eq!(loader.listener().deliveries.len(), 1);
    assert_eq!(cache.open_count(), 1);
    assert!(cache.get_keys().is_empty());
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_refused_open_falls_back_to_network() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Refuse));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert_eq!(loader.listener().deliveries.len(), 1);
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_unanswered_open_delivers_nothing() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::NeverAnswer));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert!(loader.listener().deliveries.is_empty());
    assert!(transport.sent_urls().is_empty());
}

#[tokio::test]
async fn test_non_200_is_silent() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport = Arc::new(ScriptedTransport::new().respond(
        IMAGE_URL,
        404,
        Some("text/html"),
        b"<h1>Not Found</h1>",
    ));
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert!(loader.listener().deliveries.is_empty());
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_missing_content_type_is_silent() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport =
        Arc::new(ScriptedTransport::new().respond(IMAGE_URL, 200, None, PNG_BYTES));
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert!(loader.listener().deliveries.is_empty());
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_network_error_is_silent() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport = Arc::new(ScriptedTransport::new().fail(IMAGE_URL, "connection refused"));
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert!(loader.listener().deliveries.is_empty());
    assert_eq!(transport.sent_urls().len(), 1);
    assert!(cache.put_log().is_empty());
}

#[tokio::test]
async fn test_empty_cached_value_counts_as_miss() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed).with_entry(IMAGE_URL, ""));
    let transport = Arc::new(png_transport());
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(IMAGE_URL).await;

    assert_eq!(transport.sent_urls().len(), 1);
    assert_eq!(
        loader.listener().deliveries[0].1,
        encoder::encode("image/png", PNG_BYTES)
    );
}

#[tokio::test]
async fn test_cache_key_is_the_url_as_given() {
    let relative = "img/a.png";
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let transport =
        Arc::new(ScriptedTransport::new().respond(relative, 200, Some("image/gif"), b"GIF89a"));
    let mut loader = loader_with(cache.clone(), transport.clone());

    loader.load(relative).await;

    assert_eq!(cache.get_keys(), vec![relative.to_string()]);
    assert_eq!(cache.put_log()[0].0, relative);
    assert_eq!(loader.listener().deliveries[0].0, relative);
}

#[tokio::test]
async fn test_loaders_share_one_cache() {
    let cache = Arc::new(RecordingCache::new(OpenBehaviour::Succeed));
    let handle = Arc::new(CacheHandle::with_backend(cache.clone()));
    let transport = Arc::new(png_transport());

    let mut first = Loader::new(RecordingListener::default(), handle.clone(), transport.clone());
    let mut second = Loader::new(RecordingListener::default(), handle, transport.clone());

    first.load(IMAGE_URL).await;
    second.load(IMAGE_URL).await;

    assert_eq!(first.listener().deliveries, second.listener().deliveries);
    assert_eq!(transport.sent_urls().len(), 1);
    assert_eq!(cache.open_count(), 1);
}
