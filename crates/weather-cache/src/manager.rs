//! # Remote Cache Manager
//!
//! The connection handle. Owns the transport, hands out cache handles and
//! the administration API, and is stopped exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::admin::RemoteCacheAdmin;
use crate::cache::{CacheValue, RemoteCache};
use crate::config::ConnectionConfig;
use crate::error::{CacheError, Result};
use crate::transport::{RemoteCacheTransport, RestTransport};

/// State shared between the manager and every cache handle it created
pub(crate) struct ManagerInner {
    config: ConnectionConfig,
    transport: Arc<dyn RemoteCacheTransport>,
    started: AtomicBool,
}

impl ManagerInner {
    /// Transport for the next operation, or `Stopped` once the manager is stopped
    pub(crate) fn transport(&self) -> Result<&dyn RemoteCacheTransport> {
        if self.started.load(Ordering::Acquire) {
            Ok(self.transport.as_ref())
        } else {
            Err(CacheError::Stopped)
        }
    }
}

/// Connection to a remote cache server
#[derive(Clone)]
pub struct RemoteCacheManager {
    inner: Arc<ManagerInner>,
}

impl RemoteCacheManager {
    /// Connect to the configured servers over REST
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let transport = RestTransport::new(&config)?;
        Self::start(config, Arc::new(transport)).await
    }

    /// Start a manager on an existing transport. The server is pinged first,
    /// so an unreachable server or bad credentials fail here.
    pub async fn start(
        config: ConnectionConfig,
        transport: Arc<dyn RemoteCacheTransport>,
    ) -> Result<Self> {
        transport.ping().await?;

        tracing::info!(
            servers = ?config.servers,
            intelligence = %config.client_intelligence,
            "Remote cache manager started"
        );

        Ok(Self {
            inner: Arc::new(ManagerInner {
                config,
                transport,
                started: AtomicBool::new(true),
            }),
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Administrative operations (cache provisioning)
    pub fn administration(&self) -> RemoteCacheAdmin {
        RemoteCacheAdmin::new(self.inner.clone())
    }

    /// Handle to an existing cache
    pub async fn cache<V: CacheValue>(&self, name: &str) -> Result<RemoteCache<V>> {
        if !self.inner.transport()?.cache_exists(name).await? {
            return Err(CacheError::CacheNotFound(name.to_string()));
        }
        Ok(RemoteCache::new(name, self.inner.clone()))
    }

    /// Register a protobuf schema file with the server
    pub async fn register_schema(&self, name: &str, content: &str) -> Result<()> {
        self.inner.transport()?.register_schema(name, content).await?;
        tracing::debug!(schema = name, "Registered schema");
        Ok(())
    }

    /// Stop the manager. Cache handles obtained from it stop working.
    /// If the transport fails to close, the manager stays started.
    pub async fn stop(&self) -> Result<()> {
        if !self.inner.started.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.inner.transport.close().await {
            self.inner.started.store(true, Ordering::Release);
            tracing::warn!(error = %e, "Failed to close remote cache transport");
            return Err(e);
        }
        tracing::info!("Remote cache manager stopped");
        Ok(())
    }
}

impl std::fmt::Debug for RemoteCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCacheManager")
            .field("config", &self.inner.config)
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}
