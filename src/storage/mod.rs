//! Cache storage: named cache generations holding request→response pairs.
//!
//! A generation is created by [`CacheStorage::open`], filled once by
//! [`CacheStorage::put_all`] and later removed whole by
//! [`CacheStorage::delete`]. Lookups are exact matches on
//! [`Request::cache_key`].

mod disk;
mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::{Request, Response};

/// The cache storage facility.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Opens the named generation, creating it empty if absent.
    async fn open(&self, name: &str) -> Result<()>;

    /// Stores every entry in the named generation, or none of them on error.
    ///
    /// Creates the generation if it does not exist. Entries replace any
    /// previous response under the same key.
    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<()>;

    /// Looks a request up in one generation.
    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>>;

    /// Looks a request up across all generations in creation order.
    async fn match_request(&self, request: &Request) -> Result<Option<Response>>;

    /// Lists generation names in creation order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Deletes a generation. Returns false if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;
}
