//! Per-user interaction records and the site aggregates they feed.

use std::time::SystemTime;

use places_core::{
    Rating, RatingAggregate, ReviewKey, ReviewRecord, ReviewUpdate, SiteId, SiteStore, UserId,
};

use crate::LedgerError;

/// Source of interaction timestamps.
pub type Clock = fn() -> SystemTime;

/// Move a review's rating to `rating`, keeping `aggregate` in step.
///
/// A change between two scores is applied as a clear followed by a set.
/// Setting the current value again leaves the aggregate untouched.
pub fn apply_rating(review: &mut ReviewRecord, aggregate: &mut RatingAggregate, rating: Rating) {
    if review.rating == rating {
        return;
    }
    if let Some(previous) = review.rating.score() {
        aggregate.remove(previous);
    }
    if let Some(score) = rating.score() {
        aggregate.add(score);
    }
    review.rating = rating;
}

/// Records visits, likes, ratings and opinions for (user, site) pairs.
///
/// Every mutation goes through [`SiteStore::update_review`], so the review
/// record and the site's aggregates change together.
#[derive(Debug, Clone)]
pub struct ReviewLedger<S> {
    store: S,
    clock: Clock,
}

impl<S: SiteStore> ReviewLedger<S> {
    /// Wrap a storage capability, stamping records with the system clock.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self::with_clock(store, SystemTime::now)
    }

    /// Wrap a storage capability with a custom clock.
    #[must_use]
    pub const fn with_clock(store: S, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mark the site as visited by the user.
    ///
    /// The site's visit count only grows on the first visit; repeat calls
    /// refresh the timestamps.
    ///
    /// # Errors
    /// Returns [`LedgerError::NotFound`] when the site does not exist.
    pub fn register_visit(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
    ) -> Result<ReviewRecord, LedgerError> {
        let now = (self.clock)();
        self.apply(user_id, site_id, now, "register visit", &mut |review, stats| {
            if !review.visited {
                review.visited = true;
                stats.visit_count = stats.visit_count.saturating_add(1);
            }
            review.updated_at = now;
            stats.last_visit_at = Some(now);
        })
    }

    /// Flip the user's like for the site and adjust the like count.
    ///
    /// # Errors
    /// Returns [`LedgerError::NotFound`] when the site does not exist.
    pub fn toggle_like(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
    ) -> Result<ReviewRecord, LedgerError> {
        let now = (self.clock)();
        self.apply(user_id, site_id, now, "toggle like", &mut |review, stats| {
            review.liked = !review.liked;
            stats.like_count = if review.liked {
                stats.like_count.saturating_add(1)
            } else {
                stats.like_count.saturating_sub(1)
            };
            review.updated_at = now;
        })
    }

    /// Set, change or clear (with [`Rating::UNRATED`]) the user's rating.
    ///
    /// # Errors
    /// Returns [`LedgerError::InvalidRating`] for values above 10 and
    /// [`LedgerError::NotFound`] when the site does not exist.
    pub fn set_or_update_rating(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
        value: u8,
    ) -> Result<ReviewRecord, LedgerError> {
        let rating = Rating::new(value)?;
        let now = (self.clock)();
        self.apply(user_id, site_id, now, "record rating", &mut |review, stats| {
            apply_rating(review, &mut stats.rating, rating);
            review.updated_at = now;
        })
    }

    /// Store free-text opinion on the user's review of the site.
    ///
    /// # Errors
    /// Returns [`LedgerError::NotFound`] when the site does not exist.
    pub fn record_opinion(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
        opinion: &str,
    ) -> Result<ReviewRecord, LedgerError> {
        let now = (self.clock)();
        self.apply(user_id, site_id, now, "record opinion", &mut |review, _| {
            opinion.clone_into(&mut review.opinion);
            review.updated_at = now;
        })
    }

    /// Look up the user's review of the site.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn review(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
    ) -> Result<Option<ReviewRecord>, LedgerError> {
        let key = ReviewKey::new(user_id.clone(), site_id.clone());
        self.store
            .review(&key)
            .map_err(|source| LedgerError::Store {
                operation: "look up review",
                source,
            })
    }

    /// Delete every review record and zero the visit, like and rating
    /// aggregates they contributed to.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn reset(&self) -> Result<u64, LedgerError> {
        self.store
            .clear_reviews()
            .map_err(|source| LedgerError::Store {
                operation: "clear reviews",
                source,
            })
    }

    fn apply(
        &self,
        user_id: &UserId,
        site_id: &SiteId,
        now: SystemTime,
        operation: &'static str,
        update: &mut ReviewUpdate<'_>,
    ) -> Result<ReviewRecord, LedgerError> {
        let key = ReviewKey::new(user_id.clone(), site_id.clone());
        self.store
            .update_review(&key, now, update)
            .map_err(|source| LedgerError::Store { operation, source })?
            .ok_or_else(|| LedgerError::NotFound {
                site_id: site_id.clone(),
            })
    }
}
