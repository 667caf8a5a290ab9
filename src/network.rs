//! Network fetch abstraction and its `reqwest` implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;

use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// The network fetch facility.
///
/// Fails only on transport errors; any status code is a successful fetch.
#[async_trait]
pub trait Network: Send + Sync {
    /// Performs the request against the network.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Builds a pooled HTTP client.
fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .tcp_keepalive(Duration::from_secs(30))
        .build()
}

/// [`Network`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
    origin: Url,
}

impl HttpNetwork {
    /// Creates a network client for the given origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the origin is not an absolute URL or the HTTP
    /// client cannot be built.
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin).map_err(|e| Error::InvalidUrl(format!("{origin}: {e}")))?;
        Ok(Self {
            client: build_http_client()?,
            origin,
        })
    }

    /// Returns the origin relative paths are resolved against.
    #[must_use]
    pub const fn origin(&self) -> &Url {
        &self.origin
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let method = reqwest::Method::from_bytes(request.method().as_bytes())
            .map_err(|e| Error::Network(format!("invalid method {}: {e}", request.method())))?;

        log::debug!("{} {}", request.method(), request.url());
        let res = self
            .client
            .request(method, request.url().clone())
            .send()
            .await?;

        let status = res.status().as_u16();
        let url = res.url().to_string();
        let headers = res
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = res.bytes().await?;

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}
