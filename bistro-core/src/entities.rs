//! Core entity structures

use serde::{Deserialize, Serialize};

/// Restaurant - one directory listing as seen by callers.
///
/// The `name` is the sole identity key and is immutable once created.
/// `rating` is the current mean of all submitted ratings, `0.0` while
/// no ratings exist. The running counters behind the mean live in
/// [`RestaurantRecord`] and are never exposed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub region: String,
    pub rating: f64,
}

/// Primary-store row for a restaurant.
///
/// Carries the caller-facing listing plus the rating accumulation
/// counters. The counters are required to recompute the mean and are
/// dropped when the row is projected back to a [`Restaurant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantRecord {
    pub restaurant: Restaurant,
    pub rating_count: u64,
    pub total_rate: f64,
}

impl RestaurantRecord {
    /// Create a fresh row for a newly listed restaurant.
    ///
    /// The initial rating is forced to zero regardless of what the
    /// caller supplied, and both counters start empty.
    pub fn new(mut restaurant: Restaurant) -> Self {
        restaurant.rating = 0.0;
        Self {
            restaurant,
            rating_count: 0,
            total_rate: 0.0,
        }
    }

    /// Project the row to its caller-facing listing, dropping the counters.
    pub fn into_restaurant(self) -> Restaurant {
        self.restaurant
    }

    /// The restaurant name, i.e. the primary key of the row.
    pub fn name(&self) -> &str {
        &self.restaurant.name
    }
}

/// Post-update counter values returned by an atomic rating add.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingTotals {
    pub rating_count: u64,
    pub total_rate: f64,
}

impl RatingTotals {
    /// Mean rating implied by these counters, `0.0` when unrated.
    pub fn mean(&self) -> f64 {
        if self.rating_count == 0 {
            0.0
        } else {
            self.total_rate / self.rating_count as f64
        }
    }
}

/// Outcome of a full rating submission.
///
/// The counters are always exact. `mean_persisted` is false when the
/// mean-field write failed after a successful accumulation; the
/// submission still counts and the stored mean catches up on a later
/// submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub rating: f64,
    pub rating_count: u64,
    pub total_rate: f64,
    pub mean_persisted: bool,
}

/// Secondary-index dimension for a top-N query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopQuery {
    /// All restaurants of one cuisine.
    Cuisine(String),
    /// All restaurants in one region.
    Region(String),
    /// Restaurants matching both a region and a cuisine.
    RegionAndCuisine(String, String),
}

impl TopQuery {
    /// Whether a listing falls under this query's index key.
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        match self {
            Self::Cuisine(cuisine) => restaurant.cuisine == *cuisine,
            Self::Region(region) => restaurant.region == *region,
            Self::RegionAndCuisine(region, cuisine) => {
                restaurant.region == *region && restaurant.cuisine == *cuisine
            }
        }
    }
}
