//! Data manager: single point of cache policy.
//!
//! Every read and write between callers and the primary store goes
//! through here. The manager decides whether the cache is consulted,
//! refreshed, or invalidated; it holds no state of its own beyond the
//! adapter handles and performs no in-process locking, relying on the
//! atomicity each adapter exposes natively.
//!
//! The cache mode is fixed at construction: [`CachePolicy::Direct`]
//! reduces every operation to a plain primary-store call with no cache
//! interaction at all, [`CachePolicy::CacheAside`] adds cache-aside
//! reads, write-through refreshes and best-effort invalidation. The
//! observable primary-store effects are identical in both modes.

use bistro_core::{
    DirectoryResult, QueryLimit, RatingUpdate, Restaurant, RestaurantRecord, TopQuery,
};
use std::sync::Arc;

use crate::cache::{CacheBackend, CacheKey, NullCache};
use crate::rating;
use crate::store::RestaurantStore;

/// Cache strategy, selected once at construction.
#[derive(Debug)]
pub enum CachePolicy<C> {
    /// No cache: every operation is a pure store pass-through.
    Direct,
    /// Cache-aside reads with write-through refresh.
    CacheAside(Arc<C>),
}

/// Mediates every directory operation between the primary store and
/// the cache.
#[derive(Debug)]
pub struct DataManager<S, C = NullCache> {
    store: Arc<S>,
    policy: CachePolicy<C>,
}

impl<S: RestaurantStore> DataManager<S, NullCache> {
    /// Build a manager that never touches a cache.
    pub fn direct(store: Arc<S>) -> Self {
        Self {
            store,
            policy: CachePolicy::Direct,
        }
    }
}

impl<S, C> DataManager<S, C>
where
    S: RestaurantStore,
    C: CacheBackend,
{
    /// Build a manager with cache-aside reads over `cache`.
    pub fn cache_aside(store: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            store,
            policy: CachePolicy::CacheAside(cache),
        }
    }

    /// Whether this manager runs with a cache.
    pub fn is_cache_enabled(&self) -> bool {
        matches!(self.policy, CachePolicy::CacheAside(_))
    }

    /// The underlying primary store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a new restaurant listing.
    ///
    /// The initial rating is forced to zero. Fails with
    /// [`AlreadyExists`] when the name is taken, distinguishably from
    /// any other failure. On success the fresh listing is stored in
    /// the cache under its item key, best-effort.
    ///
    /// [`AlreadyExists`]: bistro_core::DirectoryError::AlreadyExists
    pub async fn create_restaurant(&self, restaurant: Restaurant) -> DirectoryResult<()> {
        let record = RestaurantRecord::new(restaurant);
        self.store.insert_new(&record).await?;

        if let CachePolicy::CacheAside(cache) = &self.policy {
            let listing = record.into_restaurant();
            let key = CacheKey::restaurant(&listing.name);
            if let Err(err) = cache.put(&key, &listing).await {
                tracing::warn!(key = %key, error = %err, "cache put after create failed");
            }
        }
        Ok(())
    }

    /// Delete a restaurant.
    ///
    /// Whether deleting an absent name is an error is the store
    /// adapter's policy, not decided here. On success the item-key
    /// entry is removed from the cache, best-effort. Cached list
    /// results that still carry the listing are left alone.
    pub async fn delete_restaurant(&self, name: &str) -> DirectoryResult<()> {
        self.store.delete(name).await?;

        if let CachePolicy::CacheAside(cache) = &self.policy {
            let key = CacheKey::restaurant(name);
            if let Err(err) = cache.delete(&key).await {
                tracing::warn!(key = %key, error = %err, "cache delete after store delete failed");
            }
        }
        Ok(())
    }

    /// Read one listing, cache first.
    ///
    /// A hit returns immediately with no store call. On a miss the
    /// store is read and a found listing populates the cache before
    /// returning. Absence is never cached - a negative entry would
    /// mask a subsequent create under the same name. A cache failure
    /// on the lookup degrades to a store read instead of failing the
    /// request.
    pub async fn get_restaurant(&self, name: &str) -> DirectoryResult<Option<Restaurant>> {
        let cache = match &self.policy {
            CachePolicy::CacheAside(cache) => cache,
            CachePolicy::Direct => {
                let record = self.store.get(name).await?;
                return Ok(record.map(RestaurantRecord::into_restaurant));
            }
        };

        let key = CacheKey::restaurant(name);
        match cache.get::<Restaurant>(&key).await {
            Ok(Some(listing)) => {
                tracing::debug!(key = %key, "cache hit");
                return Ok(Some(listing));
            }
            Ok(None) => tracing::debug!(key = %key, "cache miss"),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "cache read failed, falling back to store");
            }
        }

        match self.store.get(name).await? {
            Some(record) => {
                let listing = record.into_restaurant();
                if let Err(err) = cache.put(&key, &listing).await {
                    tracing::warn!(key = %key, error = %err, "cache populate after miss failed");
                }
                Ok(Some(listing))
            }
            None => Ok(None),
        }
    }

    /// Submit a rating and refresh the cached listing.
    ///
    /// Accumulation and mean recomputation follow the two-phase
    /// protocol in [`rating`]. The authoritative record is then
    /// re-read and, when found, overwrites the cached item entry - a
    /// refresh rather than an invalidation, keeping hot reads warm. A
    /// failed re-read does not fail the submission; the cache stays
    /// stale until the next miss-driven repopulation.
    pub async fn add_rating(&self, name: &str, value: f64) -> DirectoryResult<RatingUpdate> {
        let update = rating::submit_rating(self.store.as_ref(), name, value).await?;

        // Re-read regardless of mode so both modes issue the same
        // store calls; only the cache refresh is mode-dependent.
        match self.store.get(name).await {
            Ok(Some(record)) => {
                if let CachePolicy::CacheAside(cache) = &self.policy {
                    let listing = record.into_restaurant();
                    let key = CacheKey::restaurant(name);
                    if let Err(err) = cache.put(&key, &listing).await {
                        tracing::warn!(key = %key, error = %err, "cache refresh after rating failed");
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(restaurant = name, error = %err, "re-read after rating failed, cached entry may be stale");
            }
        }

        Ok(update)
    }

    /// Top-N restaurants of a cuisine, rating descending.
    pub async fn top_by_cuisine(
        &self,
        cuisine: &str,
        limit: QueryLimit,
    ) -> DirectoryResult<Vec<Restaurant>> {
        self.top(TopQuery::Cuisine(cuisine.to_string()), limit).await
    }

    /// Top-N restaurants in a region, rating descending.
    pub async fn top_by_region(
        &self,
        region: &str,
        limit: QueryLimit,
    ) -> DirectoryResult<Vec<Restaurant>> {
        self.top(TopQuery::Region(region.to_string()), limit).await
    }

    /// Top-N restaurants matching a region and a cuisine, rating
    /// descending.
    pub async fn top_by_region_and_cuisine(
        &self,
        region: &str,
        cuisine: &str,
        limit: QueryLimit,
    ) -> DirectoryResult<Vec<Restaurant>> {
        self.top(
            TopQuery::RegionAndCuisine(region.to_string(), cuisine.to_string()),
            limit,
        )
        .await
    }

    /// Read-through for list results.
    ///
    /// The composite key covers the query dimensions and the limit, so
    /// a cached larger result never serves a smaller request. A hit
    /// returns the cached sequence verbatim. List entries are never
    /// proactively invalidated by item writes; see the cache module
    /// docs for the staleness tradeoff.
    async fn top(&self, query: TopQuery, limit: QueryLimit) -> DirectoryResult<Vec<Restaurant>> {
        let key = CacheKey::top(&query, limit);

        if let CachePolicy::CacheAside(cache) = &self.policy {
            match cache.get::<Vec<Restaurant>>(&key).await {
                Ok(Some(listing)) => {
                    tracing::debug!(key = %key, "cache hit");
                    return Ok(listing);
                }
                Ok(None) => tracing::debug!(key = %key, "cache miss"),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "cache read failed, falling back to store");
                }
            }
        }

        let listing = self.store.query_top(&query, limit).await?;

        if let CachePolicy::CacheAside(cache) = &self.policy {
            if let Err(err) = cache.put(&key, &listing).await {
                tracing::warn!(key = %key, error = %err, "cache populate after query failed");
            }
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStats, Cacheable, MemoryCacheBackend};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use bistro_core::{DirectoryError, RatingTotals};
    use std::sync::atomic::{AtomicU64, Ordering};

    fn make_restaurant(name: &str, cuisine: &str, region: &str) -> Restaurant {
        Restaurant {
            name: name.to_string(),
            cuisine: cuisine.to_string(),
            region: region.to_string(),
            rating: 0.0,
        }
    }

    /// Store wrapper that counts point reads, for asserting which
    /// requests were served from the cache.
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicU64,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                gets: AtomicU64::new(0),
            }
        }

        fn get_count(&self) -> u64 {
            self.gets.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RestaurantStore for CountingStore {
        async fn insert_new(&self, record: &RestaurantRecord) -> DirectoryResult<()> {
            self.inner.insert_new(record).await
        }

        async fn get(&self, name: &str) -> DirectoryResult<Option<RestaurantRecord>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(name).await
        }

        async fn delete(&self, name: &str) -> DirectoryResult<()> {
            self.inner.delete(name).await
        }

        async fn add_rating(&self, name: &str, value: f64) -> DirectoryResult<RatingTotals> {
            self.inner.add_rating(name, value).await
        }

        async fn set_rating(&self, name: &str, mean: f64) -> DirectoryResult<()> {
            self.inner.set_rating(name, mean).await
        }

        async fn query_top(
            &self,
            query: &TopQuery,
            limit: QueryLimit,
        ) -> DirectoryResult<Vec<Restaurant>> {
            self.inner.query_top(query, limit).await
        }
    }

    /// Cache backend that fails every operation.
    struct FailingCache;

    fn cache_down() -> DirectoryError {
        DirectoryError::Cache {
            reason: "cluster unreachable".to_string(),
        }
    }

    #[async_trait]
    impl CacheBackend for FailingCache {
        async fn get<T: Cacheable>(&self, _key: &CacheKey) -> DirectoryResult<Option<T>> {
            Err(cache_down())
        }

        async fn put<T: Cacheable>(&self, _key: &CacheKey, _value: &T) -> DirectoryResult<()> {
            Err(cache_down())
        }

        async fn delete(&self, _key: &CacheKey) -> DirectoryResult<()> {
            Err(cache_down())
        }

        async fn stats(&self) -> DirectoryResult<CacheStats> {
            Err(cache_down())
        }
    }

    fn cached_manager() -> DataManager<CountingStore, MemoryCacheBackend> {
        DataManager::cache_aside(
            Arc::new(CountingStore::new()),
            Arc::new(MemoryCacheBackend::new()),
        )
    }

    #[tokio::test]
    async fn test_create_then_get_serves_from_cache() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        let listing = manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(listing.rating, 0.0);
        assert_eq!(listing.cuisine, "italian");

        // The read was a cache hit: no point read ever reached the store.
        assert_eq!(manager.store().get_count(), 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails_distinguishably() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        let result = manager
            .create_restaurant(make_restaurant("Pizzeria", "french", "SF"))
            .await;
        assert_eq!(
            result,
            Err(DirectoryError::AlreadyExists {
                name: "Pizzeria".to_string()
            })
        );

        // First record unmodified.
        let kept = manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(kept.cuisine, "italian");
    }

    #[tokio::test]
    async fn test_delete_then_get_not_found_then_recreate() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        manager.delete_restaurant("Pizzeria").await.unwrap();
        assert_eq!(manager.get_restaurant("Pizzeria").await.unwrap(), None);

        // No stale tombstone: the same name can be listed again.
        manager
            .create_restaurant(make_restaurant("Pizzeria", "french", "NY"))
            .await
            .unwrap();
        let listing = manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(listing.cuisine, "french");
    }

    #[tokio::test]
    async fn test_miss_populates_cache_but_absence_is_never_cached() {
        let manager = cached_manager();

        // Absent name: miss, store read, nothing cached.
        assert_eq!(manager.get_restaurant("Pizzeria").await.unwrap(), None);
        assert_eq!(manager.store().get_count(), 1);

        // Still absent: the store is consulted again, not a negative entry.
        assert_eq!(manager.get_restaurant("Pizzeria").await.unwrap(), None);
        assert_eq!(manager.store().get_count(), 2);

        // Create directly against the store, bypassing the manager's
        // create-time cache warm.
        manager
            .store()
            .insert_new(&RestaurantRecord::new(make_restaurant(
                "Pizzeria", "italian", "NY",
            )))
            .await
            .unwrap();

        // Miss populates the cache...
        assert!(manager.get_restaurant("Pizzeria").await.unwrap().is_some());
        assert_eq!(manager.store().get_count(), 3);

        // ...and the next read is a hit.
        assert!(manager.get_restaurant("Pizzeria").await.unwrap().is_some());
        assert_eq!(manager.store().get_count(), 3);
    }

    #[tokio::test]
    async fn test_add_rating_computes_average_and_refreshes_cache() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        manager.add_rating("Pizzeria", 4.0).await.unwrap();
        let update = manager.add_rating("Pizzeria", 5.0).await.unwrap();

        assert_eq!(update.rating, 4.5);
        assert_eq!(update.rating_count, 2);
        assert_eq!(update.total_rate, 9.0);
        assert!(update.mean_persisted);

        // The refreshed listing is served from cache.
        let reads_before = manager.store().get_count();
        let listing = manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(listing.rating, 4.5);
        assert_eq!(manager.store().get_count(), reads_before);
    }

    #[tokio::test]
    async fn test_add_rating_missing_restaurant_fails() {
        let manager = cached_manager();
        let result = manager.add_rating("Nowhere", 4.0).await;
        assert_eq!(
            result,
            Err(DirectoryError::NotFound {
                name: "Nowhere".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_list_cache_serves_stale_results_by_design() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("A", "italian", "NY"))
            .await
            .unwrap();
        manager
            .create_restaurant(make_restaurant("B", "italian", "NY"))
            .await
            .unwrap();

        let first = manager
            .top_by_cuisine("italian", QueryLimit::new(5))
            .await
            .unwrap();

        // A rating lands between the two list reads.
        manager.add_rating("B", 5.0).await.unwrap();

        let second = manager
            .top_by_cuisine("italian", QueryLimit::new(5))
            .await
            .unwrap();

        // Still the cached sequence, verbatim.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_distinct_limits_are_distinct_list_entries() {
        let manager = cached_manager();
        for name in ["A", "B", "C"] {
            manager
                .create_restaurant(make_restaurant(name, "italian", "NY"))
                .await
                .unwrap();
        }

        let five = manager
            .top_by_cuisine("italian", QueryLimit::new(5))
            .await
            .unwrap();
        assert_eq!(five.len(), 3);

        // A smaller limit is its own entry, not a trim of the cached
        // larger one.
        let two = manager
            .top_by_cuisine("italian", QueryLimit::new(2))
            .await
            .unwrap();
        assert_eq!(two.len(), 2);
    }

    #[tokio::test]
    async fn test_region_and_combined_queries_read_through() {
        let manager = cached_manager();
        manager
            .create_restaurant(make_restaurant("A", "italian", "NY"))
            .await
            .unwrap();
        manager
            .create_restaurant(make_restaurant("B", "french", "NY"))
            .await
            .unwrap();
        manager
            .create_restaurant(make_restaurant("C", "italian", "SF"))
            .await
            .unwrap();

        let ny = manager
            .top_by_region("NY", QueryLimit::default())
            .await
            .unwrap();
        assert_eq!(ny.len(), 2);

        let ny_italian = manager
            .top_by_region_and_cuisine("NY", "italian", QueryLimit::default())
            .await
            .unwrap();
        assert_eq!(ny_italian.len(), 1);
        assert_eq!(ny_italian[0].name, "A");
    }

    #[tokio::test]
    async fn test_cache_failures_never_fail_operations() {
        let store = Arc::new(CountingStore::new());
        let manager = DataManager::cache_aside(Arc::clone(&store), Arc::new(FailingCache));

        // Create succeeds despite the failed best-effort cache put.
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        // Read degrades to the store when the cache lookup errors.
        let listing = manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(listing.name, "Pizzeria");

        // Rating and delete also survive the broken cache.
        manager.add_rating("Pizzeria", 4.0).await.unwrap();
        let listing = manager
            .top_by_cuisine("italian", QueryLimit::default())
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);
        manager.delete_restaurant("Pizzeria").await.unwrap();
    }

    #[tokio::test]
    async fn test_direct_mode_never_consults_cache() {
        let store = Arc::new(CountingStore::new());
        let manager = DataManager::direct(Arc::clone(&store));
        assert!(!manager.is_cache_enabled());

        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        // Every read goes to the store.
        manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        manager.get_restaurant("Pizzeria").await.unwrap().unwrap();
        assert_eq!(store.get_count(), 2);

        // Same store effects as cache-aside mode for ratings.
        let update = manager.add_rating("Pizzeria", 4.0).await.unwrap();
        assert_eq!(update.rating, 4.0);
        let listing = manager
            .top_by_cuisine("italian", QueryLimit::default())
            .await
            .unwrap();
        assert_eq!(listing[0].rating, 4.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ratings_are_exact_through_manager() {
        let manager = Arc::new(DataManager::cache_aside(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCacheBackend::new()),
        ));
        manager
            .create_restaurant(make_restaurant("Pizzeria", "italian", "NY"))
            .await
            .unwrap();

        let values: Vec<f64> = (0..16).map(|v| (v % 5 + 1) as f64).collect();
        let expected_total: f64 = values.iter().sum();

        let mut handles = Vec::new();
        for value in values {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.add_rating("Pizzeria", value).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = manager.store().get("Pizzeria").await.unwrap().unwrap();
        assert_eq!(record.rating_count, 16);
        assert!((record.total_rate - expected_total).abs() < f64::EPSILON);
    }
}
