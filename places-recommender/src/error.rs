//! Error types raised by the recommendation index and the review ledger.

use places_core::{RatingError, SiteError, SiteId, StoreError};
use thiserror::Error;

/// Errors raised while computing or serving neighbour recommendations.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The requested site is not in the catalog.
    #[error("site {site_id} does not exist")]
    NotFound {
        /// Identifier that was looked up.
        site_id: SiteId,
    },
    /// The target site's coordinates cannot be ranked against.
    #[error("site {site_id} has unusable coordinates")]
    InvalidLocation {
        /// Identifier of the affected site.
        site_id: SiteId,
        /// Validation failure for the stored coordinates.
        #[source]
        source: SiteError,
    },
    /// The storage capability failed.
    #[error("failed to {operation}")]
    Store {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from the store.
        #[source]
        source: StoreError,
    },
}

/// Errors raised while recording a user's interaction with a site.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The site being reviewed is not in the catalog.
    #[error("site {site_id} does not exist")]
    NotFound {
        /// Identifier that was looked up.
        site_id: SiteId,
    },
    /// The rating value was outside `0..=10`.
    #[error(transparent)]
    InvalidRating(#[from] RatingError),
    /// The storage capability failed.
    #[error("failed to {operation}")]
    Store {
        /// Description of the failed operation.
        operation: &'static str,
        /// Source error from the store.
        #[source]
        source: StoreError,
    },
}
