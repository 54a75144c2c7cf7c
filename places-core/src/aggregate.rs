//! Running aggregate statistics kept on each site.
//!
//! The rating mean is recomputed from the previous mean and count on every
//! change rather than from a running sum. Repeated set/clear cycles therefore
//! accumulate floating-point drift; the aggregate is meant for display.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Mean rating and the number of ratings contributing to it.
///
/// # Examples
/// ```
/// use places_core::aggregate::RatingAggregate;
///
/// let mut rating = RatingAggregate::default();
/// rating.add(4);
/// rating.add(8);
/// assert_eq!((rating.count, rating.mean), (2, 6.0));
/// rating.remove(4);
/// assert_eq!((rating.count, rating.mean), (1, 8.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    /// Number of ratings currently contributing.
    pub count: u64,
    /// Mean of the contributing ratings; `0.0` when `count` is zero.
    pub mean: f64,
}

impl RatingAggregate {
    /// Fold a newly set rating into the aggregate.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "the mean is recomputed from the previous mean and count"
    )]
    pub fn add(&mut self, value: u8) {
        let count = self.count as f64;
        self.mean = (self.mean * count + f64::from(value)) / (count + 1.0);
        self.count += 1;
    }

    /// Withdraw a previously added rating from the aggregate.
    ///
    /// Withdrawing the last rating resets the mean to `0.0`. Withdrawing from
    /// an empty aggregate leaves it empty.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "the mean is recomputed from the previous mean and count"
    )]
    pub fn remove(&mut self, value: u8) {
        let remaining = self.count.saturating_sub(1);
        self.mean = if remaining > 0 {
            (self.mean * self.count as f64 - f64::from(value)) / remaining as f64
        } else {
            0.0
        };
        self.count = remaining;
    }
}

/// Aggregate fields of a site updated as interactions arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteStats {
    /// Distinct users who registered a visit.
    pub visit_count: u64,
    /// Users currently liking the site.
    pub like_count: u64,
    /// Rating mean and count.
    pub rating: RatingAggregate,
    /// Time of the most recent visit.
    pub last_visit_at: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn add_then_remove_follows_incremental_formula() {
        let mut rating = RatingAggregate::default();
        rating.add(4);
        assert_eq!(rating, RatingAggregate { count: 1, mean: 4.0 });
        rating.add(8);
        assert_eq!(rating, RatingAggregate { count: 2, mean: 6.0 });
        rating.remove(4);
        assert_eq!(rating, RatingAggregate { count: 1, mean: 8.0 });
        rating.remove(8);
        assert_eq!(rating, RatingAggregate::default());
    }

    #[rstest]
    fn removing_from_empty_stays_empty() {
        let mut rating = RatingAggregate::default();
        rating.remove(3);
        assert_eq!(rating, RatingAggregate::default());
    }

    #[rstest]
    #[case(&[10, 0, 5], 5.0)]
    #[case(&[7], 7.0)]
    #[case(&[1, 2, 3, 4], 2.5)]
    fn mean_tracks_inputs(#[case] values: &[u8], #[case] expected: f64) {
        let mut rating = RatingAggregate::default();
        for value in values {
            rating.add(*value);
        }
        assert_eq!(rating.count, values.len() as u64);
        assert!((rating.mean - expected).abs() < 1e-9, "mean {}", rating.mean);
    }
}
