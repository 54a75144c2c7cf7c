//! Storage capability for the site catalog, reviews and neighbour caches.
//!
//! The `SiteStore` trait is the single storage handle injected into every
//! engine component. Implementations own connection lifecycle; the engine
//! only issues point lookups, filtered scans and atomic updates through it.

use std::time::SystemTime;

use thiserror::Error;

use crate::{
    Categories, NeighborCache, ReviewKey, ReviewRecord, Site, SiteId, SiteStats, shares_category,
};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteSiteStore, SqliteSiteStoreError};

/// Errors surfaced by a [`SiteStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store failed to serve the request.
    #[error("storage backend failed: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// A stored document could not be decoded.
    #[error("stored document {key} is corrupt: {reason}")]
    Corrupt {
        /// Key of the unreadable document.
        key: String,
        /// Description of the problem.
        reason: String,
    },
}

/// Mutation applied atomically to a review record and its site's aggregates.
pub type ReviewUpdate<'a> = dyn FnMut(&mut ReviewRecord, &mut SiteStats) + 'a;

/// Access to persisted sites, reviews and neighbour caches.
///
/// Increment-style mutations go through [`SiteStore::update_review`], which
/// must apply the read-modify-write atomically so concurrent interactions on
/// the same site never lose updates.
pub trait SiteStore {
    /// Insert a site or replace the stored site with the same id.
    ///
    /// Replacing a site keeps its position in catalog order.
    fn put_site(&self, site: &Site) -> Result<(), StoreError>;

    /// Look up a site by id.
    fn site(&self, id: &SiteId) -> Result<Option<Site>, StoreError>;

    /// Snapshot of the whole catalog in catalog iteration order.
    ///
    /// The order is stable between calls while the catalog is unchanged.
    fn sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Sites sharing at least one of `categories`, excluding `exclude`,
    /// ordered by rating mean descending and truncated to `limit`.
    ///
    /// Sites with equal means keep catalog order.
    fn top_rated(
        &self,
        categories: &Categories,
        exclude: &SiteId,
        limit: usize,
    ) -> Result<Vec<Site>, StoreError>;

    /// Cached neighbour lists for a site, if computed.
    fn neighbors(&self, id: &SiteId) -> Result<Option<NeighborCache>, StoreError>;

    /// Insert or replace the neighbour cache entry for `cache.site_id`.
    fn put_neighbors(&self, cache: &NeighborCache) -> Result<(), StoreError>;

    /// Look up the review record for a user and site.
    fn review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>, StoreError>;

    /// Atomically read, modify and write a review record together with the
    /// aggregate fields of its site.
    ///
    /// A blank record stamped with `now` is created when none exists. Returns
    /// `Ok(None)` without writing anything when the site does not exist,
    /// otherwise the record as written.
    fn update_review(
        &self,
        key: &ReviewKey,
        now: SystemTime,
        update: &mut ReviewUpdate<'_>,
    ) -> Result<Option<ReviewRecord>, StoreError>;

    /// Delete every review record and return how many were removed.
    ///
    /// Visit, like and rating aggregates of every site are zeroed in the same
    /// step, since no record remains to account for them. Last-visit
    /// timestamps are kept.
    fn clear_reviews(&self) -> Result<u64, StoreError>;

    /// Delete every site, review and neighbour cache entry and return the
    /// number of sites removed.
    fn clear_catalog(&self) -> Result<u64, StoreError>;
}

/// Filter `sites` down to those sharing a category with `categories`,
/// excluding `exclude`, then keep the `limit` best rated in a stable order.
pub(crate) fn select_top_rated(
    sites: Vec<Site>,
    categories: &Categories,
    exclude: &SiteId,
    limit: usize,
) -> Vec<Site> {
    let mut matches: Vec<Site> = sites
        .into_iter()
        .filter(|site| &site.id != exclude && shares_category(categories, &site.categories))
        .collect();
    matches.sort_by(|a, b| b.stats.rating.mean.total_cmp(&a.stats.rating.mean));
    matches.truncate(limit);
    matches
}

impl<S: SiteStore + ?Sized> SiteStore for &S {
    fn put_site(&self, site: &Site) -> Result<(), StoreError> {
        (**self).put_site(site)
    }

    fn site(&self, id: &SiteId) -> Result<Option<Site>, StoreError> {
        (**self).site(id)
    }

    fn sites(&self) -> Result<Vec<Site>, StoreError> {
        (**self).sites()
    }

    fn top_rated(
        &self,
        categories: &Categories,
        exclude: &SiteId,
        limit: usize,
    ) -> Result<Vec<Site>, StoreError> {
        (**self).top_rated(categories, exclude, limit)
    }

    fn neighbors(&self, id: &SiteId) -> Result<Option<NeighborCache>, StoreError> {
        (**self).neighbors(id)
    }

    fn put_neighbors(&self, cache: &NeighborCache) -> Result<(), StoreError> {
        (**self).put_neighbors(cache)
    }

    fn review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>, StoreError> {
        (**self).review(key)
    }

    fn update_review(
        &self,
        key: &ReviewKey,
        now: SystemTime,
        update: &mut ReviewUpdate<'_>,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        (**self).update_review(key, now, update)
    }

    fn clear_reviews(&self) -> Result<u64, StoreError> {
        (**self).clear_reviews()
    }

    fn clear_catalog(&self) -> Result<u64, StoreError> {
        (**self).clear_catalog()
    }
}
