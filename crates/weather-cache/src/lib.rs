//! # Weather Cache Library
//!
//! Client-side connector for an Infinispan-compatible remote cache server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CacheConnector                          │
//! │        connect → get_simple_cache / get_query_cache          │
//! │                       → shutdown                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   RemoteCacheManager                         │
//! │   administration() · cache() · register_schema() · stop()   │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   RemoteCache<V>        │   │   MarshallingContext         │
//! │ (typed cache handles)   │   │ (protobuf schema register)   │
//! └─────────────────────────┘   └──────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 RemoteCacheTransport                         │
//! │           RestTransport · InMemoryTransport                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use weather_cache::{CacheConnector, ConnectionConfig};
//!
//! let mut connector = CacheConnector::new(ConnectionConfig::from_env()?);
//! connector.connect().await?;
//!
//! let temperatures = connector.get_simple_cache().await?;
//! temperatures.put("Rome, Italy", &24.5).await?;
//!
//! let weather = connector.get_query_cache().await?;
//!
//! connector.shutdown().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod admin;
pub mod cache;
pub mod config;
pub mod connector;
pub mod error;
pub mod manager;
pub mod marshalling;
pub mod query;
pub mod transport;

// Re-export commonly used types
pub use admin::{AdminFlag, DefaultTemplate, RemoteCacheAdmin};
pub use cache::{CacheValue, RemoteCache};
pub use config::{ClientIntelligence, ConnectionConfig, ConnectionConfigBuilder, ServerAddress};
pub use connector::{CacheConnector, QUERY_CACHE_NAME, SIMPLE_CACHE_NAME};
pub use error::{CacheError, Result};
pub use manager::RemoteCacheManager;
pub use marshalling::{MarshallingContext, ProtoSchema};
pub use query::{IckleQuery, SortOrder};
pub use transport::{InMemoryTransport, RemoteCacheTransport, RestTransport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
