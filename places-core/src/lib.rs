//! Core domain types for the places recommendation engine.
//!
//! Sites, users, reviews and the rating aggregates live here together with
//! the pure geometry and similarity helpers used to rank neighbours. Storage
//! is abstracted behind [`SiteStore`]; a SQLite implementation ships behind
//! the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub mod aggregate;
mod distance;
mod ids;
mod neighbors;
mod review;
mod similarity;
mod site;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregate::{RatingAggregate, SiteStats};
pub use distance::{EARTH_RADIUS_KM, distance_km, haversine_km};
pub use ids::{IdError, MAX_ID_LEN, SiteId, UserId};
pub use neighbors::{NEIGHBOR_LIMIT, NearSite, NeighborCache};
pub use review::{MAX_RATING, Rating, RatingError, ReviewKey, ReviewRecord};
pub use similarity::shares_category;
pub use site::{Categories, Site, SiteDraft, SiteError, validate_location};
pub use store::{ReviewUpdate, SiteStore, StoreError};

#[cfg(feature = "store-sqlite")]
pub use store::{SqliteSiteStore, SqliteSiteStoreError};
