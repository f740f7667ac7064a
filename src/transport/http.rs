//! HTTP transport built on a shared reqwest client.

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::{FetchEvent, FetchRequest, FetchResponse, Transport};
use crate::config::HttpConfig;
use crate::errors::{TransportError, TransportResult};

/// reqwest-backed transport.
///
/// Only a connect timeout is set: once connected, a transfer runs until it
/// completes or the connection fails.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|base| Url::parse(base).map_err(|e| TransportError::invalid_url(base, e)))
            .transpose()?;

        Ok(Self { client, base_url })
    }

    /// Resolve `url` against the configured base URL.
    pub fn resolve(&self, url: &str) -> TransportResult<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| TransportError::invalid_url(url, e))
    }

    async fn fetch(client: Client, url: Url) -> TransportResult<FetchResponse> {
        let response = client.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
        let body = response.bytes().await?;

        debug!(
            "GET {} -> {} ({} bytes, content-type {:?})",
            url,
            status,
            body.len(),
            content_type
        );
        Ok(FetchResponse::new(status, content_type.as_deref(), body))
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &str) -> FetchRequest {
        let resolved = self.resolve(url);
        let client = self.client.clone();

        FetchRequest::new(url, async move {
            let outcome = match resolved {
                Ok(url) => Self::fetch(client, url).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(response) => FetchEvent::Load(response),
                Err(e) => {
                    debug!("Request failed: {}", e);
                    FetchEvent::Error(e.to_string())
                }
            }
        })
    }
}
