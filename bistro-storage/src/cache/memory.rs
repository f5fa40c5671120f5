//! In-memory cache backend.

use async_trait::async_trait;
use bistro_core::{DirectoryError, DirectoryResult};
use std::collections::HashMap;
use std::sync::RwLock;

use super::keys::CacheKey;
use super::traits::{CacheBackend, CacheStats, Cacheable};

/// In-memory cache backend.
///
/// Stores serialized values under encoded keys. Thread-safe and safe
/// for concurrent overwrite: two racing misses that both repopulate
/// the same key simply write the same value twice.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: RwLock<HashMap<String, serde_json::Value>>,
    stats: RwLock<CacheStats>,
}

impl MemoryCacheBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> DirectoryError {
        DirectoryError::Cache {
            reason: "cache lock poisoned".to_string(),
        }
    }

    fn record_hit(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.hits += 1;
        }
    }

    fn record_miss(&self) {
        if let Ok(mut stats) = self.stats.write() {
            stats.misses += 1;
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn get<T: Cacheable>(&self, key: &CacheKey) -> DirectoryResult<Option<T>> {
        let cached = {
            let entries = self.entries.read().map_err(|_| Self::poisoned())?;
            entries.get(&key.encode()).cloned()
        };

        match cached {
            Some(value) => {
                let decoded =
                    serde_json::from_value(value).map_err(|e| DirectoryError::Cache {
                        reason: format!("cached value does not decode: {e}"),
                    })?;
                self.record_hit();
                Ok(Some(decoded))
            }
            None => {
                self.record_miss();
                Ok(None)
            }
        }
    }

    async fn put<T: Cacheable>(&self, key: &CacheKey, value: &T) -> DirectoryResult<()> {
        let encoded = serde_json::to_value(value).map_err(|e| DirectoryError::Cache {
            reason: format!("value does not encode: {e}"),
        })?;
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.insert(key.encode(), encoded);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> DirectoryResult<()> {
        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.remove(&key.encode());
        Ok(())
    }

    async fn stats(&self) -> DirectoryResult<CacheStats> {
        let entry_count = {
            let entries = self.entries.read().map_err(|_| Self::poisoned())?;
            entries.len() as u64
        };
        let mut stats = self
            .stats
            .read()
            .map_err(|_| Self::poisoned())?
            .clone();
        stats.entry_count = entry_count;
        Ok(stats)
    }
}
