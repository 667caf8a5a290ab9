//! Request and response values exchanged between the worker and its collaborators.

use bytes::Bytes;
use reqwest::Url;

use crate::error::{Error, Result};

/// An intercepted request.
///
/// Cache lookups match on method and the absolute URL minus its fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    url: Url,
}

impl Request {
    /// Creates a request with an explicit method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` is not an absolute URL.
    pub fn new(method: impl Into<String>, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self {
            method: method.into().to_ascii_uppercase(),
            url,
        })
    }

    /// Creates a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` is not an absolute URL.
    pub fn get(url: &str) -> Result<Self> {
        Self::new("GET", url)
    }

    /// Creates a `GET` request for `path` resolved against `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the path cannot be joined onto the origin.
    pub fn for_path(origin: &Url, path: &str) -> Result<Self> {
        let url = origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Self {
            method: "GET".to_string(),
            url,
        })
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the absolute request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the URL path, without query or fragment.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Returns the key this request is stored and looked up under.
    ///
    /// The fragment never reaches the server, so it is not part of the key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {url}", self.method)
    }
}

/// A response as produced by the network or replayed from a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL the response was produced for.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Response headers in received order.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Creates a `200 OK` response with the given body and no headers.
    #[must_use]
    pub fn ok(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the first header value with the given name, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ignores_query() {
        let req = Request::get("https://grannyb.example/api/qr?sku=81415711").unwrap();
        assert_eq!(req.path(), "/api/qr");
    }

    #[test]
    fn relative_urls_are_rejected() {
        assert!(matches!(
            Request::get("/granny-b-logo.png"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn for_path_joins_origin() {
        let origin = Url::parse("https://grannyb.example").unwrap();
        let req = Request::for_path(&origin, "/granny-b-tin.png").unwrap();
        assert_eq!(req.url().as_str(), "https://grannyb.example/granny-b-tin.png");
        assert_eq!(req.method(), "GET");
    }

    #[test]
    fn cache_key_includes_method() {
        let get = Request::get("https://grannyb.example/").unwrap();
        let head = Request::new("head", "https://grannyb.example/").unwrap();
        assert_eq!(get.cache_key(), "GET https://grannyb.example/");
        assert_ne!(get.cache_key(), head.cache_key());
    }

    #[test]
    fn cache_key_ignores_fragment() {
        let plain = Request::get("https://grannyb.example/granny-b-logo.png").unwrap();
        let anchored = Request::get("https://grannyb.example/granny-b-logo.png#top").unwrap();
        assert_eq!(plain.cache_key(), anchored.cache_key());
        assert_eq!(anchored.url().fragment(), Some("top"));
    }

    #[test]
    fn cache_key_keeps_query() {
        let a = Request::get("https://grannyb.example/?v=1").unwrap();
        let b = Request::get("https://grannyb.example/?v=2").unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn response_status_and_headers() {
        let mut res = Response::ok("https://grannyb.example/", "hi");
        assert!(res.is_ok());
        res.headers.push(("Content-Type".to_string(), "text/html".to_string()));
        assert_eq!(res.header("content-type"), Some("text/html"));
        res.status = 404;
        assert!(!res.is_ok());
    }
}
