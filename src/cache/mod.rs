//! Cache layer
//!
//! Public listing reads are cached in-process so repeated page views do not
//! hit the content API. Entries expire after the configured TTL and admin
//! writes invalidate the blog keys.
//!
//! # Usage
//!
//! ```rust,ignore
//! use techzone::cache::{create_cache, CacheLayer};
//! use techzone::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! let page = cache.get_or_fetch("blogs:list:page=1", fetch_page()).await?;
//! cache.delete_pattern("blogs:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
///
/// The generic methods make this trait unusable as `dyn CacheLayer`;
/// callers hold the concrete cache type.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache; it expires after the cache TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl))
}
