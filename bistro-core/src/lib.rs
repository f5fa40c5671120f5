//! Bistro Core - Entity Types
//!
//! Pure data structures with no I/O. All other crates depend on this.
//! This crate contains the directory entities, the query vocabulary,
//! and the error taxonomy - no storage or cache logic.

pub mod entities;
pub mod error;
pub mod limit;

pub use entities::{RatingTotals, RatingUpdate, Restaurant, RestaurantRecord, TopQuery};
pub use error::{DirectoryError, DirectoryResult};
pub use limit::QueryLimit;
