//! Per-user interaction records.
//!
//! A [`ReviewRecord`] captures everything one user has done with one site:
//! whether they visited it, whether they like it, the rating they gave and
//! any free-text opinion. Records are keyed by [`ReviewKey`].

use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SiteId, UserId};

/// Highest rating a user can give.
pub const MAX_RATING: u8 = 10;

/// A rating on the `0..=10` scale where `6` means "no rating set".
///
/// # Examples
/// ```
/// use places_core::Rating;
///
/// let rating = Rating::new(8).unwrap();
/// assert_eq!(rating.score(), Some(8));
/// assert_eq!(Rating::UNRATED.score(), None);
/// assert!(Rating::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

/// Errors returned by [`Rating::new`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RatingError {
    /// The value was above [`MAX_RATING`].
    #[error("rating {value} is outside the range 0..={MAX_RATING}")]
    OutOfRange {
        /// Value supplied by the caller.
        value: u8,
    },
}

impl Rating {
    /// Sentinel meaning the user has not rated the site.
    pub const UNRATED: Self = Self(6);

    /// Validate a raw rating value.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value > MAX_RATING {
            return Err(RatingError::OutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Raw value including the sentinel.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Value contributing to a site's aggregate, or `None` when unrated.
    #[must_use]
    pub const fn score(self) -> Option<u8> {
        if self.0 == Self::UNRATED.0 {
            None
        } else {
            Some(self.0)
        }
    }

    /// Whether this rating contributes to a site's aggregate.
    #[must_use]
    pub const fn is_set(self) -> bool {
        self.score().is_some()
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::UNRATED
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Composite identity of a [`ReviewRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewKey {
    /// User who owns the record.
    pub user_id: UserId,
    /// Site the record refers to.
    pub site_id: SiteId,
}

impl ReviewKey {
    /// Pair a user with a site.
    #[must_use]
    pub const fn new(user_id: UserId, site_id: SiteId) -> Self {
        Self { user_id, site_id }
    }
}

impl fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.site_id)
    }
}

/// One user's interaction state with one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// User and site this record belongs to.
    #[serde(flatten)]
    pub key: ReviewKey,
    /// The user has visited the site.
    pub visited: bool,
    /// The user currently likes the site.
    pub liked: bool,
    /// Current rating, [`Rating::UNRATED`] when none is set.
    pub rating: Rating,
    /// Free-text opinion.
    pub opinion: String,
    /// Time of the most recent interaction.
    pub updated_at: SystemTime,
}

impl ReviewRecord {
    /// A blank record created on the first interaction with a site.
    #[must_use]
    pub fn new(key: ReviewKey, now: SystemTime) -> Self {
        Self {
            key,
            visited: false,
            liked: false,
            rating: Rating::UNRATED,
            opinion: String::new(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Some(0))]
    #[case(5, Some(5))]
    #[case(6, None)]
    #[case(10, Some(10))]
    fn score_skips_sentinel(#[case] raw: u8, #[case] expected: Option<u8>) {
        assert_eq!(Rating::new(raw).map(Rating::score), Ok(expected));
    }

    #[rstest]
    fn rejects_values_above_ten() {
        assert_eq!(Rating::new(11), Err(RatingError::OutOfRange { value: 11 }));
    }

    #[rstest]
    fn new_records_start_blank() {
        let key = ReviewKey::new(
            UserId::new("ana").expect("user id"),
            SiteId::new("parque").expect("site id"),
        );
        let record = ReviewRecord::new(key, SystemTime::UNIX_EPOCH);
        assert!(!record.visited);
        assert!(!record.liked);
        assert_eq!(record.rating, Rating::UNRATED);
        assert!(record.opinion.is_empty());
    }
}
