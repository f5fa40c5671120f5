//! Primary store adapter contract and in-memory implementation.
//!
//! The primary store is the single source of truth for the directory:
//! a restaurant exists if and only if it has been created and not yet
//! deleted here. Cache state is derivative and may lag.

use async_trait::async_trait;
use bistro_core::{
    DirectoryError, DirectoryResult, QueryLimit, RatingTotals, Restaurant, RestaurantRecord,
    TopQuery,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// Primary store adapter contract.
///
/// Implementations must provide the atomicity guarantees the directory
/// relies on natively: the uniqueness condition of [`insert_new`] and
/// the lost-update-free counter fold of [`add_rating`]. The data
/// manager performs no locking of its own around these calls.
///
/// [`insert_new`]: RestaurantStore::insert_new
/// [`add_rating`]: RestaurantStore::add_rating
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Insert a new row under a name-uniqueness condition.
    ///
    /// Fails with [`DirectoryError::AlreadyExists`] when the name is
    /// taken, leaving the existing row untouched.
    async fn insert_new(&self, record: &RestaurantRecord) -> DirectoryResult<()>;

    /// Point read. `Ok(None)` is the not-found sentinel.
    async fn get(&self, name: &str) -> DirectoryResult<Option<RestaurantRecord>>;

    /// Point delete. Deleting an absent name is not an error at this
    /// layer.
    async fn delete(&self, name: &str) -> DirectoryResult<()>;

    /// Atomically fold one rating into the row's counters.
    ///
    /// Increments `rating_count` by 1 and `total_rate` by `value` in a
    /// single indivisible operation and returns the post-update
    /// counters. Fails with [`DirectoryError::NotFound`] when the row
    /// does not exist.
    async fn add_rating(&self, name: &str, value: f64) -> DirectoryResult<RatingTotals>;

    /// Overwrite the materialized mean-rating field.
    async fn set_rating(&self, name: &str, mean: f64) -> DirectoryResult<()>;

    /// Range query over a secondary index, descending by rating,
    /// truncated to `limit`. Tie-breaking among equal ratings is
    /// stable but implementation-defined.
    async fn query_top(
        &self,
        query: &TopQuery,
        limit: QueryLimit,
    ) -> DirectoryResult<Vec<Restaurant>>;
}

/// In-memory primary store.
///
/// The write lock plays the role of the store-native atomic-counter
/// primitive: a whole [`add_rating`](RestaurantStore::add_rating) fold
/// happens under one exclusive acquisition, so concurrent submissions
/// never lose an increment. No lock is held across an await point.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, RestaurantRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored restaurants.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Whether the store holds no restaurants.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all stored data.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.write() {
            records.clear();
        }
    }

    fn poisoned() -> DirectoryError {
        DirectoryError::Store {
            reason: "store lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn insert_new(&self, record: &RestaurantRecord) -> DirectoryResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        if records.contains_key(record.name()) {
            return Err(DirectoryError::AlreadyExists {
                name: record.name().to_string(),
            });
        }
        records.insert(record.name().to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> DirectoryResult<Option<RestaurantRecord>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> DirectoryResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.remove(name);
        Ok(())
    }

    async fn add_rating(&self, name: &str, value: f64) -> DirectoryResult<RatingTotals> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let record = records.get_mut(name).ok_or_else(|| DirectoryError::NotFound {
            name: name.to_string(),
        })?;
        record.rating_count += 1;
        record.total_rate += value;
        Ok(RatingTotals {
            rating_count: record.rating_count,
            total_rate: record.total_rate,
        })
    }

    async fn set_rating(&self, name: &str, mean: f64) -> DirectoryResult<()> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        let record = records.get_mut(name).ok_or_else(|| DirectoryError::NotFound {
            name: name.to_string(),
        })?;
        record.restaurant.rating = mean;
        Ok(())
    }

    async fn query_top(
        &self,
        query: &TopQuery,
        limit: QueryLimit,
    ) -> DirectoryResult<Vec<Restaurant>> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        let mut results: Vec<Restaurant> = records
            .values()
            .filter(|r| query.matches(&r.restaurant))
            .map(|r| r.restaurant.clone())
            .collect();

        // Descending by rating; equal ratings keep their relative order.
        results.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit.get() as usize);

        Ok(results)
    }
}
