//! Nearest and similar neighbour computation over the site catalog.
//!
//! Every computation scans the whole catalog, so refreshing all sites costs
//! O(N²) distance evaluations. Tie-breaks depend on catalog iteration order;
//! a spatial or inverted category index would change which of several
//! equally ranked sites are kept.

use log::{debug, info, warn};
use places_core::{
    NEIGHBOR_LIMIT, NearSite, NeighborCache, Site, SiteId, SiteStore, haversine_km,
    shares_category, validate_location,
};
use serde::Serialize;

use crate::RecommendError;

/// Number of sites returned by [`RecommendationIndex::top_rated_related`]
/// when callers do not choose a limit.
pub const RELATED_LIMIT: usize = 5;

/// Outcome of a catalog-wide refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Sites whose cache entry was rewritten.
    pub refreshed: usize,
    /// Sites skipped because their computation failed.
    pub failures: Vec<RefreshFailure>,
}

/// A site whose neighbours could not be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshFailure {
    /// Site that was skipped.
    pub site_id: SiteId,
    /// Rendered error.
    pub reason: String,
}

/// Rank the nearest and similar sites for `target` against `catalog`.
///
/// `catalog` may contain `target` itself; it is never ranked against
/// itself. Candidates whose distance is not finite are skipped.
///
/// # Errors
/// Returns [`RecommendError::InvalidLocation`] when the target's
/// coordinates fall outside WGS84 bounds.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use places_core::{Site, SiteId};
/// use places_recommender::rank_neighbors;
///
/// let site = |id: &str, lat: f64, category: &str| {
///     Site::new(
///         SiteId::new(id).unwrap(),
///         id,
///         [category.to_owned()].into(),
///         Coord { x: 0.0, y: lat },
///     )
///     .unwrap()
/// };
/// let catalog = vec![site("a", 0.0, "food"), site("b", 2.0, "food"), site("c", 1.0, "park")];
/// let cache = rank_neighbors(&catalog[0], &catalog).unwrap();
/// let nearest: Vec<_> = cache.nearest.iter().map(|n| n.site_id.as_str()).collect();
/// assert_eq!(nearest, ["c", "b"]);
/// assert_eq!(cache.similar, [SiteId::new("b").unwrap()]);
/// ```
pub fn rank_neighbors(target: &Site, catalog: &[Site]) -> Result<NeighborCache, RecommendError> {
    validate_location(target.location).map_err(|source| RecommendError::InvalidLocation {
        site_id: target.id.clone(),
        source,
    })?;

    let mut nearest: Vec<NearSite> = catalog
        .iter()
        .filter(|candidate| candidate.id != target.id)
        .filter_map(|candidate| {
            let distance_km = haversine_km(target.location, candidate.location);
            if distance_km.is_finite() {
                Some(NearSite {
                    site_id: candidate.id.clone(),
                    distance_km,
                })
            } else {
                debug!(
                    "skipping site {} near {}: distance is not finite",
                    candidate.id, target.id
                );
                None
            }
        })
        .collect();
    nearest.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearest.truncate(NEIGHBOR_LIMIT);

    let mut similar: Vec<SiteId> = Vec::with_capacity(NEIGHBOR_LIMIT);
    for candidate in catalog {
        if similar.len() == NEIGHBOR_LIMIT {
            break;
        }
        if candidate.id == target.id || similar.contains(&candidate.id) {
            continue;
        }
        if shares_category(&target.categories, &candidate.categories) {
            similar.push(candidate.id.clone());
        }
    }

    Ok(NeighborCache {
        site_id: target.id.clone(),
        nearest,
        similar,
    })
}

/// Computes, caches and serves per-site neighbour lists.
#[derive(Debug, Clone)]
pub struct RecommendationIndex<S> {
    store: S,
}

impl<S: SiteStore> RecommendationIndex<S> {
    /// Wrap a storage capability.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Recompute and upsert the neighbour cache for one site.
    ///
    /// # Errors
    /// Returns [`RecommendError::NotFound`] without writing anything when the
    /// site is not in the catalog.
    pub fn compute_and_cache_neighbors(
        &self,
        site_id: &SiteId,
    ) -> Result<NeighborCache, RecommendError> {
        let catalog = self.store.sites().map_err(|source| RecommendError::Store {
            operation: "read catalog",
            source,
        })?;
        let target = catalog
            .iter()
            .find(|site| &site.id == site_id)
            .ok_or_else(|| RecommendError::NotFound {
                site_id: site_id.clone(),
            })?;
        let cache = rank_neighbors(target, &catalog)?;
        self.write(&cache)?;
        Ok(cache)
    }

    /// Recompute the neighbour cache of every site from one catalog
    /// snapshot.
    ///
    /// A failure for one site is logged and recorded in the report; the pass
    /// continues with the next site. Rerunning on an unchanged catalog writes
    /// identical caches.
    ///
    /// # Errors
    /// Fails only when the catalog itself cannot be read.
    pub fn refresh_all(&self) -> Result<RefreshReport, RecommendError> {
        let catalog = self.store.sites().map_err(|source| RecommendError::Store {
            operation: "read catalog",
            source,
        })?;
        let mut report = RefreshReport::default();
        for target in &catalog {
            match rank_neighbors(target, &catalog).and_then(|cache| self.write(&cache)) {
                Ok(()) => report.refreshed += 1,
                Err(err) => {
                    warn!("skipping neighbour refresh for site {}: {err}", target.id);
                    report.failures.push(RefreshFailure {
                        site_id: target.id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        info!(
            "refreshed neighbours for {} of {} sites",
            report.refreshed,
            catalog.len()
        );
        Ok(report)
    }

    /// Cached nearest sites, closest first. Empty when no cache entry exists.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn nearest_sites(&self, site_id: &SiteId) -> Result<Vec<NearSite>, RecommendError> {
        Ok(self
            .cached(site_id)?
            .map(|cache| cache.nearest)
            .unwrap_or_default())
    }

    /// Cached similar sites in catalog order. Empty when no cache entry
    /// exists.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn similar_sites(&self, site_id: &SiteId) -> Result<Vec<SiteId>, RecommendError> {
        Ok(self
            .cached(site_id)?
            .map(|cache| cache.similar)
            .unwrap_or_default())
    }

    /// Best-rated sites sharing a category with `site_id`, best first.
    ///
    /// Unlike the cached lists this is served straight from the store, so it
    /// reflects ratings recorded since the last refresh.
    ///
    /// # Errors
    /// Returns [`RecommendError::NotFound`] when the reference site is not
    /// in the catalog.
    pub fn top_rated_related(
        &self,
        site_id: &SiteId,
        limit: usize,
    ) -> Result<Vec<Site>, RecommendError> {
        let site = self
            .store
            .site(site_id)
            .map_err(|source| RecommendError::Store {
                operation: "look up site",
                source,
            })?
            .ok_or_else(|| RecommendError::NotFound {
                site_id: site_id.clone(),
            })?;
        self.store
            .top_rated(&site.categories, &site.id, limit)
            .map_err(|source| RecommendError::Store {
                operation: "scan top-rated sites",
                source,
            })
    }

    fn cached(&self, site_id: &SiteId) -> Result<Option<NeighborCache>, RecommendError> {
        self.store
            .neighbors(site_id)
            .map_err(|source| RecommendError::Store {
                operation: "read neighbour cache",
                source,
            })
    }

    fn write(&self, cache: &NeighborCache) -> Result<(), RecommendError> {
        self.store
            .put_neighbors(cache)
            .map_err(|source| RecommendError::Store {
                operation: "write neighbour cache",
                source,
            })
    }
}
