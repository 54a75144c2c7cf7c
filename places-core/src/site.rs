//! Sites in the catalog and the validation applied when ingesting them.

use std::{collections::BTreeSet, time::SystemTime};

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IdError, SiteId, SiteStats};

/// Category labels attached to a site. Order is irrelevant.
pub type Categories = BTreeSet<String>;

/// A point of interest users can visit, like and rate.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use places_core::{Site, SiteId};
///
/// # fn main() -> Result<(), places_core::SiteError> {
/// let site = Site::new(
///     SiteId::new("museo-botero").unwrap(),
///     "Museo Botero",
///     ["museum".to_owned()].into(),
///     Coord { x: -74.0732, y: 4.5967 },
/// )?;
/// assert_eq!(site.latitude(), 4.5967);
/// assert_eq!(site.stats.rating.count, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Unique key.
    pub id: SiteId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub details: String,
    /// Non-empty set of category labels.
    pub categories: Categories,
    /// Geographic position.
    pub location: Coord<f64>,
    /// Visit, like and rating aggregates.
    pub stats: SiteStats,
    /// Time the site entered the catalog.
    pub created_at: SystemTime,
}

/// Errors raised when a site fails validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SiteError {
    /// A required field was absent.
    #[error("site is missing required field `{field}`")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },
    /// The identifier was malformed.
    #[error("invalid site id: {0}")]
    InvalidId(#[from] IdError),
    /// The name was blank.
    #[error("site name must not be blank")]
    BlankName,
    /// No category labels remained after trimming blanks.
    #[error("site must have at least one category")]
    NoCategories,
    /// Latitude was outside `-90..=90` or not finite.
    #[error("latitude {value} is outside -90..=90")]
    LatitudeOutOfRange {
        /// Offending latitude.
        value: f64,
    },
    /// Longitude was outside `-180..=180` or not finite.
    #[error("longitude {value} is outside -180..=180")]
    LongitudeOutOfRange {
        /// Offending longitude.
        value: f64,
    },
}

/// Check that a coordinate lies within WGS84 bounds.
pub fn validate_location(location: Coord<f64>) -> Result<(), SiteError> {
    if !(-90.0..=90.0).contains(&location.y) {
        return Err(SiteError::LatitudeOutOfRange { value: location.y });
    }
    if !(-180.0..=180.0).contains(&location.x) {
        return Err(SiteError::LongitudeOutOfRange { value: location.x });
    }
    Ok(())
}

impl Site {
    /// Validate and construct a site with empty details and zeroed stats.
    pub fn new(
        id: SiteId,
        name: impl Into<String>,
        categories: Categories,
        location: Coord<f64>,
    ) -> Result<Self, SiteError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SiteError::BlankName);
        }
        let categories: Categories = categories
            .into_iter()
            .map(|label| label.trim().to_owned())
            .filter(|label| !label.is_empty())
            .collect();
        if categories.is_empty() {
            return Err(SiteError::NoCategories);
        }
        validate_location(location)?;
        Ok(Self {
            id,
            name,
            details: String::new(),
            categories,
            location,
            stats: SiteStats::default(),
            created_at: SystemTime::now(),
        })
    }

    /// Attach a free-text description.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Override the creation timestamp.
    #[must_use]
    pub fn created_at(mut self, at: SystemTime) -> Self {
        self.created_at = at;
        self
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }
}

/// A site document as it appears in an ingestion catalog.
///
/// Every field is optional at the parsing stage so that a missing field is
/// reported as [`SiteError::MissingField`] instead of a generic decode error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SiteDraft {
    /// Unique key.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Free-text description.
    #[serde(alias = "description")]
    pub details: Option<String>,
    /// Category labels.
    pub categories: Option<Vec<String>>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl SiteDraft {
    /// Validate every field and build a [`Site`] created at `now`.
    pub fn into_site(self, now: SystemTime) -> Result<Site, SiteError> {
        let id = self.id.ok_or(SiteError::MissingField { field: "id" })?;
        let name = self.name.ok_or(SiteError::MissingField { field: "name" })?;
        let categories = self
            .categories
            .ok_or(SiteError::MissingField {
                field: "categories",
            })?;
        let latitude = self
            .latitude
            .ok_or(SiteError::MissingField { field: "latitude" })?;
        let longitude = self
            .longitude
            .ok_or(SiteError::MissingField { field: "longitude" })?;

        let site = Site::new(
            SiteId::new(id)?,
            name,
            categories.into_iter().collect(),
            Coord {
                x: longitude,
                y: latitude,
            },
        )?;
        Ok(site
            .with_details(self.details.unwrap_or_default())
            .created_at(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn sample_draft() -> SiteDraft {
        SiteDraft {
            id: Some("cafe-1".into()),
            name: Some("Café".into()),
            details: Some("Coffee".into()),
            categories: Some(vec!["food".into(), " drinks ".into()]),
            latitude: Some(4.6),
            longitude: Some(-74.1),
        }
    }

    #[fixture]
    fn draft() -> SiteDraft {
        sample_draft()
    }

    #[rstest]
    fn draft_builds_site(draft: SiteDraft) {
        let site = draft.into_site(SystemTime::UNIX_EPOCH).expect("valid draft");
        assert_eq!(site.id.as_str(), "cafe-1");
        assert_eq!(site.details, "Coffee");
        assert_eq!(
            site.categories,
            Categories::from(["drinks".to_owned(), "food".to_owned()])
        );
        assert_eq!(site.created_at, SystemTime::UNIX_EPOCH);
        assert_eq!(site.stats, SiteStats::default());
    }

    #[rstest]
    #[case::id(SiteDraft { id: None, ..sample_draft() }, "id")]
    #[case::name(SiteDraft { name: None, ..sample_draft() }, "name")]
    #[case::categories(SiteDraft { categories: None, ..sample_draft() }, "categories")]
    #[case::latitude(SiteDraft { latitude: None, ..sample_draft() }, "latitude")]
    #[case::longitude(SiteDraft { longitude: None, ..sample_draft() }, "longitude")]
    fn draft_reports_missing_field(#[case] draft: SiteDraft, #[case] field: &'static str) {
        let err = draft
            .into_site(SystemTime::UNIX_EPOCH)
            .expect_err("missing field");
        assert_eq!(err, SiteError::MissingField { field });
    }

    #[rstest]
    fn details_are_optional(draft: SiteDraft) {
        let site = SiteDraft {
            details: None,
            ..draft
        }
        .into_site(SystemTime::UNIX_EPOCH)
        .expect("valid draft");
        assert!(site.details.is_empty());
    }

    #[rstest]
    #[case(Coord { x: 0.0, y: 90.5 })]
    #[case(Coord { x: 180.1, y: 0.0 })]
    #[case(Coord { x: 0.0, y: f64::NAN })]
    fn rejects_out_of_range_coordinates(#[case] location: Coord<f64>) {
        let id = SiteId::new("x").expect("id");
        let result = Site::new(id, "X", ["a".to_owned()].into(), location);
        assert!(result.is_err());
    }

    #[rstest]
    fn rejects_blank_categories() {
        let id = SiteId::new("x").expect("id");
        let result = Site::new(id, "X", ["  ".to_owned()].into(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(result, Err(SiteError::NoCategories));
    }

    #[rstest]
    fn draft_accepts_description_alias() {
        let draft: SiteDraft = serde_json::from_str(
            r#"{"id":"a","name":"A","description":"old field","categories":["x"],"latitude":1.0,"longitude":2.0}"#,
        )
        .expect("parse draft");
        assert_eq!(draft.details.as_deref(), Some("old field"));
    }
}
