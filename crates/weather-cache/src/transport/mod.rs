//! # Transport Module
//!
//! Wire-level access to the remote cache server. The manager and cache
//! handles only talk to a [`RemoteCacheTransport`], so implementations can be
//! swapped (REST over HTTP, in-memory for tests and dry runs).

pub mod in_memory;
pub mod rest;

use async_trait::async_trait;

use crate::admin::{AdminFlag, DefaultTemplate};
use crate::error::Result;

pub use in_memory::{InMemoryTransport, TransportCall};
pub use rest::RestTransport;

/// Operations the remote cache server must provide.
///
/// Values cross this boundary as encoded text; typing happens in
/// [`RemoteCache`](crate::cache::RemoteCache).
#[async_trait]
pub trait RemoteCacheTransport: Send + Sync {
    /// Check the server is reachable and the credentials are accepted
    async fn ping(&self) -> Result<()>;

    /// Whether a cache with this name exists on the server
    async fn cache_exists(&self, name: &str) -> Result<bool>;

    /// Create a cache from a template. Returns `false` when it already existed.
    async fn create_cache(
        &self,
        name: &str,
        template: DefaultTemplate,
        flags: &[AdminFlag],
    ) -> Result<bool>;

    /// Register (or replace) a protobuf schema file
    async fn register_schema(&self, name: &str, content: &str) -> Result<()>;

    /// Store an encoded value, `media_type` describes `payload`
    async fn put(&self, cache: &str, key: &str, payload: String, media_type: &str) -> Result<()>;

    /// Fetch an encoded value in the requested media type
    async fn get(&self, cache: &str, key: &str, media_type: &str) -> Result<Option<String>>;

    /// Returns `true` when an entry was removed
    async fn remove(&self, cache: &str, key: &str) -> Result<bool>;

    async fn size(&self, cache: &str) -> Result<u64>;

    async fn clear(&self, cache: &str) -> Result<()>;

    /// Run an Ickle query and return the matching values
    async fn query(&self, cache: &str, query: &str) -> Result<Vec<String>>;

    /// Release the connection. Later calls fail with `CacheError::Stopped`.
    async fn close(&self) -> Result<()>;
}
