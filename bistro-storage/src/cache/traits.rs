//! Cache backend contract and cacheable value marker.

use async_trait::async_trait;
use bistro_core::{DirectoryResult, Restaurant};
use serde::{de::DeserializeOwned, Serialize};

use super::keys::CacheKey;

/// Marker trait for values the cache can hold.
///
/// Implemented for single listings and for top-N result sequences.
/// Implementations must be `Clone`, serde-serializable, and
/// `Send + Sync + 'static` for async compatibility.
pub trait Cacheable: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl Cacheable for Restaurant {}
impl Cacheable for Vec<Restaurant> {}

/// Cache backend contract.
///
/// Best-effort by design: a backend may lose entries, serve nothing,
/// or fail outright. Callers on best-effort paths absorb errors; the
/// read-through path degrades to the primary store instead of failing
/// the request.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Look up a value. `Ok(None)` is a miss.
    async fn get<T: Cacheable>(&self, key: &CacheKey) -> DirectoryResult<Option<T>>;

    /// Store a value, overwriting any existing entry under the key.
    async fn put<T: Cacheable>(&self, key: &CacheKey, value: &T) -> DirectoryResult<()>;

    /// Remove the entry under the key, if any.
    async fn delete(&self, key: &CacheKey) -> DirectoryResult<()>;

    /// Usage statistics.
    async fn stats(&self) -> DirectoryResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Backend for the cache-disabled mode.
///
/// Never consulted by the data manager's direct policy; exists so the
/// manager type stays generic without a real backend in play. Every
/// read is a miss and every write is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl CacheBackend for NullCache {
    async fn get<T: Cacheable>(&self, _key: &CacheKey) -> DirectoryResult<Option<T>> {
        Ok(None)
    }

    async fn put<T: Cacheable>(&self, _key: &CacheKey, _value: &T) -> DirectoryResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &CacheKey) -> DirectoryResult<()> {
        Ok(())
    }

    async fn stats(&self) -> DirectoryResult<CacheStats> {
        Ok(CacheStats::default())
    }
}
