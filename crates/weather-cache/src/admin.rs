//! # Administration API
//!
//! Server-side cache provisioning: templates, admin flags and the
//! get-or-create call used by the connector.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheValue, RemoteCache};
use crate::error::Result;
use crate::manager::ManagerInner;

/// Predefined server cache configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DefaultTemplate {
    Local,
    ReplSync,
    ReplAsync,
    /// Writes are synchronously propagated to the owners of each key
    #[default]
    DistSync,
    DistAsync,
    InvalidationSync,
    InvalidationAsync,
}

impl DefaultTemplate {
    /// Template name as known by the server
    pub fn template_name(&self) -> &'static str {
        match self {
            Self::Local => "org.infinispan.LOCAL",
            Self::ReplSync => "org.infinispan.REPL_SYNC",
            Self::ReplAsync => "org.infinispan.REPL_ASYNC",
            Self::DistSync => "org.infinispan.DIST_SYNC",
            Self::DistAsync => "org.infinispan.DIST_ASYNC",
            Self::InvalidationSync => "org.infinispan.INVALIDATION_SYNC",
            Self::InvalidationAsync => "org.infinispan.INVALIDATION_ASYNC",
        }
    }
}

impl fmt::Display for DefaultTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_name())
    }
}

/// Flags applied to administrative operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminFlag {
    /// The cache configuration is not persisted; it is gone after a restart
    Volatile,
}

impl AdminFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volatile => "VOLATILE",
        }
    }

    /// Header value for a set of flags, `None` when empty
    #[must_use]
    pub fn header_value(flags: &[Self]) -> Option<String> {
        if flags.is_empty() {
            return None;
        }
        Some(flags.iter().map(Self::as_str).collect::<Vec<_>>().join(","))
    }
}

/// Administrative operations, obtained from
/// [`RemoteCacheManager::administration`](crate::RemoteCacheManager::administration).
pub struct RemoteCacheAdmin {
    manager: Arc<ManagerInner>,
    flags: Vec<AdminFlag>,
}

impl RemoteCacheAdmin {
    pub(crate) const fn new(manager: Arc<ManagerInner>) -> Self {
        Self {
            manager,
            flags: Vec::new(),
        }
    }

    /// Apply flags to the following operations
    #[must_use]
    pub fn with_flags(mut self, flags: &[AdminFlag]) -> Self {
        for flag in flags {
            if !self.flags.contains(flag) {
                self.flags.push(*flag);
            }
        }
        self
    }

    pub fn flags(&self) -> &[AdminFlag] {
        &self.flags
    }

    /// Return the named cache, creating it from `template` if it does not
    /// exist yet. Calling this again never creates a second cache.
    pub async fn get_or_create_cache<V: CacheValue>(
        &self,
        name: &str,
        template: DefaultTemplate,
    ) -> Result<RemoteCache<V>> {
        let transport = self.manager.transport()?;

        if transport.cache_exists(name).await? {
            tracing::debug!(cache = name, "Cache already exists");
        } else {
            let created = transport.create_cache(name, template, &self.flags).await?;
            tracing::info!(
                cache = name,
                template = %template,
                flags = ?self.flags,
                created,
                "Provisioned cache"
            );
        }

        Ok(RemoteCache::new(name, self.manager.clone()))
    }
}
