//! Category overlap between sites.

use crate::Categories;

/// Whether two category sets share at least one label.
///
/// This is a gate, not a score: any overlap qualifies and the size of the
/// overlap is ignored.
///
/// # Examples
/// ```
/// use places_core::{Categories, shares_category};
///
/// let food: Categories = ["food".to_owned()].into();
/// let mixed: Categories = ["food".to_owned(), "museum".to_owned()].into();
/// let museum: Categories = ["museum".to_owned()].into();
/// assert!(shares_category(&food, &mixed));
/// assert!(!shares_category(&food, &museum));
/// ```
#[must_use]
pub fn shares_category(reference: &Categories, candidate: &Categories) -> bool {
    !reference.is_disjoint(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(labels: &[&str]) -> Categories {
        labels.iter().map(|label| (*label).to_owned()).collect()
    }

    #[rstest]
    #[case(&["food"], &["food"], true)]
    #[case(&["food", "bar"], &["museum", "bar"], true)]
    #[case(&["food"], &["museum"], false)]
    #[case(&["food"], &[], false)]
    fn gate_requires_any_shared_label(
        #[case] reference: &[&str],
        #[case] candidate: &[&str],
        #[case] expected: bool,
    ) {
        assert_eq!(shares_category(&set(reference), &set(candidate)), expected);
        assert_eq!(shares_category(&set(candidate), &set(reference)), expected);
    }

    #[rstest]
    fn labels_are_case_sensitive() {
        assert!(!shares_category(&set(&["Food"]), &set(&["food"])));
    }
}
