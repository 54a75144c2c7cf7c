//! Test-only, in-memory `SiteStore` implementation used by unit and behaviour
//! tests.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use crate::{
    Categories, NeighborCache, ReviewKey, ReviewRecord, Site, SiteId, SiteStats, SiteStore,
    StoreError,
    store::{ReviewUpdate, select_top_rated},
};

#[derive(Debug, Default)]
struct State {
    sites: Vec<Site>,
    reviews: HashMap<ReviewKey, ReviewRecord>,
    neighbors: HashMap<SiteId, NeighborCache>,
}

/// In-memory `SiteStore` implementation used in tests.
///
/// The store performs linear scans and is intended only for small datasets.
/// A single mutex serialises every operation, so updates are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create a store from a collection of sites, kept in iteration order.
    #[must_use]
    pub fn with_sites<I>(sites: I) -> Self
    where
        I: IntoIterator<Item = Site>,
    {
        Self {
            state: Mutex::new(State {
                sites: sites.into_iter().collect(),
                ..State::default()
            }),
        }
    }

    /// Number of stored review records.
    #[must_use]
    pub fn review_count(&self) -> usize {
        self.lock().reviews.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SiteStore for MemoryStore {
    fn put_site(&self, site: &Site) -> Result<(), StoreError> {
        let mut state = self.lock();
        match state.sites.iter_mut().find(|stored| stored.id == site.id) {
            Some(stored) => *stored = site.clone(),
            None => state.sites.push(site.clone()),
        }
        Ok(())
    }

    fn site(&self, id: &SiteId) -> Result<Option<Site>, StoreError> {
        Ok(self.lock().sites.iter().find(|site| &site.id == id).cloned())
    }

    fn sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.lock().sites.clone())
    }

    fn top_rated(
        &self,
        categories: &Categories,
        exclude: &SiteId,
        limit: usize,
    ) -> Result<Vec<Site>, StoreError> {
        let sites = self.lock().sites.clone();
        Ok(select_top_rated(sites, categories, exclude, limit))
    }

    fn neighbors(&self, id: &SiteId) -> Result<Option<NeighborCache>, StoreError> {
        Ok(self.lock().neighbors.get(id).cloned())
    }

    fn put_neighbors(&self, cache: &NeighborCache) -> Result<(), StoreError> {
        self.lock()
            .neighbors
            .insert(cache.site_id.clone(), cache.clone());
        Ok(())
    }

    fn review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self.lock().reviews.get(key).cloned())
    }

    fn update_review(
        &self,
        key: &ReviewKey,
        now: SystemTime,
        update: &mut ReviewUpdate<'_>,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(site) = state.sites.iter_mut().find(|site| site.id == key.site_id) else {
            return Ok(None);
        };
        let review = state
            .reviews
            .entry(key.clone())
            .or_insert_with(|| ReviewRecord::new(key.clone(), now));
        update(review, &mut site.stats);
        Ok(Some(review.clone()))
    }

    fn clear_reviews(&self) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let removed = state.reviews.len() as u64;
        state.reviews.clear();
        for site in &mut state.sites {
            site.stats = SiteStats {
                last_visit_at: site.stats.last_visit_at,
                ..SiteStats::default()
            };
        }
        Ok(removed)
    }

    fn clear_catalog(&self) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let removed = state.sites.len() as u64;
        *state = State::default();
        Ok(removed)
    }
}
