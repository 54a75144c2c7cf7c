//! Cached recommendation lists for a site.

use serde::{Deserialize, Serialize};

use crate::SiteId;

/// Maximum length of each cached neighbour list.
pub const NEIGHBOR_LIMIT: usize = 3;

/// A nearby site and its great-circle distance from the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearSite {
    /// Neighbouring site.
    pub site_id: SiteId,
    /// Haversine distance in kilometres.
    pub distance_km: f64,
}

/// Precomputed nearest and similar sites for one site.
///
/// Both lists are ordered and hold at most [`NEIGHBOR_LIMIT`] entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborCache {
    /// Site the lists were computed for.
    pub site_id: SiteId,
    /// Closest sites, nearest first.
    pub nearest: Vec<NearSite>,
    /// Sites sharing a category, in catalog order.
    pub similar: Vec<SiteId>,
}

impl NeighborCache {
    /// An entry with no neighbours.
    #[must_use]
    pub const fn empty(site_id: SiteId) -> Self {
        Self {
            site_id,
            nearest: Vec::new(),
            similar: Vec::new(),
        }
    }
}
