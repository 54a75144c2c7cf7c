//! Opaque identifiers for sites and users.
//!
//! Identifiers are validated once at the boundary so the rest of the engine
//! can treat them as plain keys.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest identifier accepted by [`SiteId::new`] and [`UserId::new`].
pub const MAX_ID_LEN: usize = 128;

/// Errors returned when parsing an identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdError {
    /// The identifier was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// The identifier exceeded [`MAX_ID_LEN`] characters.
    #[error("identifier is {len} characters long; the limit is {MAX_ID_LEN}")]
    TooLong {
        /// Number of characters supplied.
        len: usize,
    },
    /// The identifier contained whitespace or control characters.
    #[error("identifier {raw:?} contains whitespace or control characters")]
    Malformed {
        /// Offending input.
        raw: String,
    },
}

fn validate(raw: &str) -> Result<(), IdError> {
    if raw.is_empty() {
        return Err(IdError::Empty);
    }
    let len = raw.chars().count();
    if len > MAX_ID_LEN {
        return Err(IdError::TooLong { len });
    }
    if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(IdError::Malformed {
            raw: raw.to_owned(),
        });
    }
    Ok(())
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
                let raw = raw.into();
                validate(&raw)?;
                Ok(Self(raw))
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_id!(
    /// Unique key of a site in the catalog.
    ///
    /// # Examples
    /// ```
    /// use places_core::SiteId;
    ///
    /// let id = SiteId::new("plaza-mayor").unwrap();
    /// assert_eq!(id.as_str(), "plaza-mayor");
    /// assert!(SiteId::new("two words").is_err());
    /// ```
    SiteId
);

opaque_id!(
    /// Unique key of a user interacting with sites.
    UserId
);
