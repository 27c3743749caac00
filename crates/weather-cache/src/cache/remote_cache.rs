//! Typed handle to a named remote cache.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::CacheValue;
use crate::error::Result;
use crate::manager::ManagerInner;
use crate::query::IckleQuery;

/// A named cache on the remote server with text keys and `V` values.
///
/// Handles are cheap to clone. They share the manager's connection and stop
/// working once the manager is stopped.
pub struct RemoteCache<V> {
    name: Arc<str>,
    manager: Arc<ManagerInner>,
    _value: PhantomData<fn() -> V>,
}

impl<V: CacheValue> RemoteCache<V> {
    pub(crate) fn new(name: &str, manager: Arc<ManagerInner>) -> Self {
        Self {
            name: Arc::from(name),
            manager,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store a value, replacing any previous one
    pub async fn put(&self, key: &str, value: &V) -> Result<()> {
        let payload = value.encode()?;
        self.manager
            .transport()?
            .put(&self.name, key, payload, V::MEDIA_TYPE)
            .await?;
        tracing::trace!(cache = %self.name, key, "put");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        let payload = self
            .manager
            .transport()?
            .get(&self.name, key, V::MEDIA_TYPE)
            .await?;

        match payload {
            Some(payload) => Ok(Some(V::decode(&payload)?)),
            None => Ok(None),
        }
    }

    /// Remove an entry, returns whether it existed
    pub async fn remove(&self, key: &str) -> Result<bool> {
        self.manager.transport()?.remove(&self.name, key).await
    }

    pub async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Number of entries in the cache
    pub async fn size(&self) -> Result<u64> {
        self.manager.transport()?.size(&self.name).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.size().await? == 0)
    }

    pub async fn clear(&self) -> Result<()> {
        self.manager.transport()?.clear(&self.name).await
    }

    /// Run a query against this cache. `V` must be registered with the
    /// server through a schema for the server to evaluate it.
    pub async fn query(&self, query: &IckleQuery) -> Result<Vec<V>> {
        let ickle = query.to_string();
        tracing::debug!(cache = %self.name, query = %ickle, "Running query");

        let hits = self.manager.transport()?.query(&self.name, &ickle).await?;
        hits.iter().map(|hit| V::decode(hit)).collect()
    }
}

impl<V> Clone for RemoteCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            manager: self.manager.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> fmt::Debug for RemoteCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCache")
            .field("name", &self.name)
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}
