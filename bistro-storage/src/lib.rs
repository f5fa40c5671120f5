//! Bistro Storage - Store Trait, Cache Layer and Data Manager
//!
//! Defines the adapter contracts the directory core consumes (primary
//! store and cache), an in-memory implementation of each, and the
//! [`DataManager`] that mediates every read and write between them.

pub mod cache;
pub mod manager;
pub mod rating;
pub mod store;

pub use cache::{
    CacheBackend, CacheKey, CacheStats, Cacheable, MemoryCacheBackend, NullCache,
};
pub use manager::{CachePolicy, DataManager};
pub use rating::submit_rating;
pub use store::{MemoryStore, RestaurantStore};
