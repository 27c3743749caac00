//! In-memory transport.
//!
//! Keeps caches and schemas in process and records every call in order, so
//! tests can assert on provisioning sequences. Queries are not evaluated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::RemoteCacheTransport;
use crate::admin::{AdminFlag, DefaultTemplate};
use crate::error::{CacheError, Result};

/// A call received by [`InMemoryTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Ping,
    CacheExists(String),
    CreateCache {
        name: String,
        template: DefaultTemplate,
        flags: Vec<AdminFlag>,
    },
    RegisterSchema(String),
    Put { cache: String, key: String },
    Get { cache: String, key: String },
    Remove { cache: String, key: String },
    Size(String),
    Clear(String),
    Query { cache: String, query: String },
    Close,
}

#[derive(Debug)]
struct StoredCache {
    template: DefaultTemplate,
    flags: Vec<AdminFlag>,
    entries: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct State {
    caches: HashMap<String, StoredCache>,
    schemas: HashMap<String, String>,
    calls: Vec<TransportCall>,
}

/// Process-local stand-in for a remote cache server
#[derive(Debug)]
pub struct InMemoryTransport {
    state: Mutex<State>,
    reachable: bool,
    closed: AtomicBool,
    fail_close: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            reachable: true,
            closed: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
        }
    }

    /// A transport whose server never answers
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Make the next `close` fail and leave the transport open
    pub fn fail_next_close(&self) {
        self.fail_close.store(true, Ordering::Release);
    }

    /// Calls received so far, oldest first
    pub async fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn schema(&self, name: &str) -> Option<String> {
        self.state.lock().await.schemas.get(name).cloned()
    }

    pub async fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.caches.keys().cloned().collect();
        names.sort();
        names
    }

    /// Template and flags a cache was created with
    pub async fn cache_definition(&self, name: &str) -> Option<(DefaultTemplate, Vec<AdminFlag>)> {
        self.state
            .lock()
            .await
            .caches
            .get(name)
            .map(|c| (c.template, c.flags.clone()))
    }

    /// Record a call and hand out the state, failing once closed
    async fn record(&self, call: TransportCall) -> Result<tokio::sync::MutexGuard<'_, State>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Stopped);
        }
        let mut state = self.state.lock().await;
        state.calls.push(call);
        Ok(state)
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn entries<'a>(state: &'a mut State, cache: &str) -> Result<&'a mut HashMap<String, String>> {
    state
        .caches
        .get_mut(cache)
        .map(|c| &mut c.entries)
        .ok_or_else(|| CacheError::CacheNotFound(cache.to_string()))
}

#[async_trait]
impl RemoteCacheTransport for InMemoryTransport {
    async fn ping(&self) -> Result<()> {
        let _state = self.record(TransportCall::Ping).await?;
        if self.reachable {
            Ok(())
        } else {
            Err(CacheError::Transport("connection refused".to_string()))
        }
    }

    async fn cache_exists(&self, name: &str) -> Result<bool> {
        let state = self.record(TransportCall::CacheExists(name.to_string())).await?;
        Ok(state.caches.contains_key(name))
    }

    async fn create_cache(
        &self,
        name: &str,
        template: DefaultTemplate,
        flags: &[AdminFlag],
    ) -> Result<bool> {
        let mut state = self
            .record(TransportCall::CreateCache {
                name: name.to_string(),
                template,
                flags: flags.to_vec(),
            })
            .await?;

        if state.caches.contains_key(name) {
            return Ok(false);
        }
        state.caches.insert(
            name.to_string(),
            StoredCache {
                template,
                flags: flags.to_vec(),
                entries: HashMap::new(),
            },
        );
        Ok(true)
    }

    async fn register_schema(&self, name: &str, content: &str) -> Result<()> {
        let mut state = self.record(TransportCall::RegisterSchema(name.to_string())).await?;
        state.schemas.insert(name.to_string(), content.to_string());
        Ok(())
    }

    async fn put(&self, cache: &str, key: &str, payload: String, _media_type: &str) -> Result<()> {
        let mut state = self
            .record(TransportCall::Put {
                cache: cache.to_string(),
                key: key.to_string(),
            })
            .await?;
        entries(&mut state, cache)?.insert(key.to_string(), payload);
        Ok(())
    }

    async fn get(&self, cache: &str, key: &str, _media_type: &str) -> Result<Option<String>> {
        let mut state = self
            .record(TransportCall::Get {
                cache: cache.to_string(),
                key: key.to_string(),
            })
            .await?;
        Ok(entries(&mut state, cache)?.get(key).cloned())
    }

    async fn remove(&self, cache: &str, key: &str) -> Result<bool> {
        let mut state = self
            .record(TransportCall::Remove {
                cache: cache.to_string(),
                key: key.to_string(),
            })
            .await?;
        Ok(entries(&mut state, cache)?.remove(key).is_some())
    }

    async fn size(&self, cache: &str) -> Result<u64> {
        let mut state = self.record(TransportCall::Size(cache.to_string())).await?;
        Ok(entries(&mut state, cache)?.len() as u64)
    }

    async fn clear(&self, cache: &str) -> Result<()> {
        let mut state = self.record(TransportCall::Clear(cache.to_string())).await?;
        entries(&mut state, cache)?.clear();
        Ok(())
    }

    async fn query(&self, cache: &str, query: &str) -> Result<Vec<String>> {
        let _state = self
            .record(TransportCall::Query {
                cache: cache.to_string(),
                query: query.to_string(),
            })
            .await?;
        Err(CacheError::Unsupported("queries need a real server".to_string()))
    }

    async fn close(&self) -> Result<()> {
        let _state = self.record(TransportCall::Close).await?;
        if self.fail_close.swap(false, Ordering::AcqRel) {
            return Err(CacheError::Transport("connection reset while closing".to_string()));
        }
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_once() {
        let transport = InMemoryTransport::new();
        assert!(transport
            .create_cache("weather", DefaultTemplate::DistSync, &[AdminFlag::Volatile])
            .await
            .unwrap());
        assert!(!transport
            .create_cache("weather", DefaultTemplate::Local, &[])
            .await
            .unwrap());

        assert_eq!(
            transport.cache_definition("weather").await,
            Some((DefaultTemplate::DistSync, vec![AdminFlag::Volatile]))
        );
    }

    #[tokio::test]
    async fn test_entries_need_cache() {
        let transport = InMemoryTransport::new();
        let result = transport.put("nope", "k", "1".to_string(), "text/plain").await;
        assert!(matches!(result, Err(CacheError::CacheNotFound(_))));
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_calls() {
        let transport = InMemoryTransport::new();
        transport.close().await.unwrap();

        assert!(matches!(transport.ping().await, Err(CacheError::Stopped)));
        assert_eq!(transport.calls().await, vec![TransportCall::Close]);
    }
}
