//! Deterministic cache key derivation.
//!
//! Item keys are a fixed prefix plus the restaurant name. List keys
//! concatenate the ordered query dimensions and the limit with a
//! stable delimiter under a per-shape prefix. The prefixes keep item
//! and list entries in disjoint key spaces, and the limit being part
//! of the key means distinct limits are distinct entries - a cached
//! larger result is never trimmed to satisfy a smaller request.
//!
//! Query dimensions are categorical tokens (cuisine, region); they are
//! not expected to contain the delimiter.

use bistro_core::{QueryLimit, TopQuery};
use std::fmt;

const ITEM_PREFIX: &str = "restaurant:";
const CUISINE_PREFIX: &str = "top:cuisine:";
const REGION_PREFIX: &str = "top:region:";
const REGION_CUISINE_PREFIX: &str = "top:region-cuisine:";
const DELIMITER: char = '|';

/// A derived cache key for one cacheable shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Single listing, keyed by restaurant name.
    Restaurant { name: String },
    /// Top-N by cuisine.
    TopByCuisine { cuisine: String, limit: QueryLimit },
    /// Top-N by region.
    TopByRegion { region: String, limit: QueryLimit },
    /// Top-N by region and cuisine.
    TopByRegionAndCuisine {
        region: String,
        cuisine: String,
        limit: QueryLimit,
    },
}

impl CacheKey {
    /// Item key for a single listing.
    pub fn restaurant(name: &str) -> Self {
        Self::Restaurant {
            name: name.to_string(),
        }
    }

    /// List key for a top-N query.
    pub fn top(query: &TopQuery, limit: QueryLimit) -> Self {
        match query {
            TopQuery::Cuisine(cuisine) => Self::TopByCuisine {
                cuisine: cuisine.clone(),
                limit,
            },
            TopQuery::Region(region) => Self::TopByRegion {
                region: region.clone(),
                limit,
            },
            TopQuery::RegionAndCuisine(region, cuisine) => Self::TopByRegionAndCuisine {
                region: region.clone(),
                cuisine: cuisine.clone(),
                limit,
            },
        }
    }

    /// Encode to the wire key handed to the cache backend.
    pub fn encode(&self) -> String {
        match self {
            Self::Restaurant { name } => format!("{ITEM_PREFIX}{name}"),
            Self::TopByCuisine { cuisine, limit } => {
                format!("{CUISINE_PREFIX}{cuisine}{DELIMITER}{limit}")
            }
            Self::TopByRegion { region, limit } => {
                format!("{REGION_PREFIX}{region}{DELIMITER}{limit}")
            }
            Self::TopByRegionAndCuisine {
                region,
                cuisine,
                limit,
            } => format!(
                "{REGION_CUISINE_PREFIX}{region}{DELIMITER}{cuisine}{DELIMITER}{limit}"
            ),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
