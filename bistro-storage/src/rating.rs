//! Rating aggregation protocol.
//!
//! Folds one rating submission into a restaurant's running statistics
//! in two steps against the primary store:
//!
//! 1. a single atomic add of `rating_count += 1`, `total_rate += value`
//!    returning the post-update counters,
//! 2. a plain write of the mean computed from those returned counters
//!    (never from a separate re-read, which could race with another
//!    submission).
//!
//! The protocol is not linearizable end-to-end: under concurrent
//! submissions a later-computed mean can be overwritten by a stale one
//! whose second step executes after it. The counters themselves are
//! always exact, and the materialized mean converges once submissions
//! serialize. This staleness window is an accepted property of the
//! design, not something this module tries to lock away.

use bistro_core::{DirectoryError, DirectoryResult, RatingUpdate};

use crate::store::RestaurantStore;

/// Submit one rating for a restaurant.
///
/// A failure of the atomic add fails the whole submission (`NotFound`
/// when the restaurant does not exist). A failure of the subsequent
/// mean write does NOT: the accumulation is already durable, so the
/// submission reports success with `mean_persisted == false` and the
/// partial failure is logged.
pub async fn submit_rating<S>(store: &S, name: &str, value: f64) -> DirectoryResult<RatingUpdate>
where
    S: RestaurantStore + ?Sized,
{
    let totals = store.add_rating(name, value).await?;
    let mean = totals.mean();

    let mean_persisted = match store.set_rating(name, mean).await {
        Ok(()) => true,
        Err(err) => {
            let partial = DirectoryError::PartialFailure {
                name: name.to_string(),
                reason: err.to_string(),
            };
            tracing::warn!(restaurant = name, error = %partial, "mean write failed after accumulation");
            false
        }
    };

    Ok(RatingUpdate {
        rating: mean,
        rating_count: totals.rating_count,
        total_rate: totals.total_rate,
        mean_persisted,
    })
}
