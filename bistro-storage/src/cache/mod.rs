//! Cache layer for the restaurant directory.
//!
//! Best-effort key-value cache over single listings and top-N query
//! results. The cache has no durability guarantee and no independent
//! lifecycle: entries are populated and refreshed solely as a side
//! effect of reads and writes orchestrated by the data manager.
//!
//! # Staleness tradeoff
//!
//! Item entries are refreshed or removed on every single-item write.
//! List entries are NOT: a cached top-N result stays as served until
//! it ages out of the backend or a miss repopulates it, even when a
//! rating or delete lands in between. That staleness is a deliberate
//! property of the design, not an invalidation bug.

pub mod keys;
pub mod memory;
pub mod traits;

pub use keys::CacheKey;
pub use memory::MemoryCacheBackend;
pub use traits::{CacheBackend, CacheStats, Cacheable, NullCache};
