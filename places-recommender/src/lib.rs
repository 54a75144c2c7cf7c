//! Recommendation services for the places catalog.
//!
//! The crate provides two components that share one injected
//! [`SiteStore`](places_core::SiteStore):
//! - [`RecommendationIndex`] computes, for each site, its three nearest sites
//!   by great-circle distance and the first three sites sharing a category,
//!   caches both lists per site and serves them back.
//! - [`ReviewLedger`] records per-user visits, likes, ratings and opinions,
//!   keeping each site's visit, like and rating aggregates consistent.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use places_core::{Site, SiteId, SiteStore, SqliteSiteStore, UserId};
//! use places_recommender::{RecommendationIndex, ReviewLedger};
//!
//! let store = SqliteSiteStore::open_in_memory().expect("open store");
//! for (id, lat) in [("plaza", 4.598), ("museo", 4.602)] {
//!     let site = Site::new(
//!         SiteId::new(id).expect("site id"),
//!         id,
//!         ["culture".to_owned()].into(),
//!         Coord { x: -74.07, y: lat },
//!     )
//!     .expect("valid site");
//!     store.put_site(&site).expect("insert site");
//! }
//!
//! let plaza = SiteId::new("plaza").expect("site id");
//! let index = RecommendationIndex::new(&store);
//! index.refresh_all().expect("refresh");
//! assert_eq!(index.similar_sites(&plaza).expect("read").len(), 1);
//!
//! let ledger = ReviewLedger::new(&store);
//! let user = UserId::new("ana").expect("user id");
//! ledger.set_or_update_rating(&user, &plaza, 9).expect("rate");
//! ```

#![forbid(unsafe_code)]

mod error;
mod index;
mod ledger;

pub use error::{LedgerError, RecommendError};
pub use index::{RELATED_LIMIT, RecommendationIndex, RefreshFailure, RefreshReport, rank_neighbors};
pub use ledger::{Clock, ReviewLedger, apply_rating};
