//! Facade crate for the places recommendation engine.
//!
//! This crate re-exports the core domain types together with the
//! recommendation index and review ledger. The SQLite store is exposed behind
//! the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use places_core::{
    Categories, EARTH_RADIUS_KM, IdError, NEIGHBOR_LIMIT, NearSite, NeighborCache, Rating,
    RatingAggregate, RatingError, ReviewKey, ReviewRecord, ReviewUpdate, Site, SiteDraft,
    SiteError, SiteId, SiteStats, SiteStore, StoreError, UserId, distance_km, haversine_km,
    shares_category,
};
pub use places_recommender::{
    LedgerError, RELATED_LIMIT, RecommendError, RecommendationIndex, RefreshFailure,
    RefreshReport, ReviewLedger, rank_neighbors,
};

#[cfg(feature = "store-sqlite")]
pub use places_core::{SqliteSiteStore, SqliteSiteStoreError};
