//! # Cache Module
//!
//! Typed handles to named caches living on the remote server.

pub mod remote_cache;
pub mod value;

pub use remote_cache::RemoteCache;
pub use value::{CacheValue, MEDIA_JSON, MEDIA_TEXT};
