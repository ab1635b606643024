//! Slug identifiers used for tool names and aliases.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Normalised identifier: ASCII letters, digits and underscore, stored lowercase.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validates `value` against `^[A-Za-z0-9_]+$` and lowercases it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSlug`] if the value is empty or
    /// contains characters outside the allowed set.
    pub fn new(value: impl Into<String>) -> ValidationResult<Self> {
        let value = value.into();
        validate_slug(&value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Slug {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for Slug {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

fn validate_slug(value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::InvalidSlug {
            value: String::new(),
            reason: "slug cannot be empty".into(),
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ValidationError::InvalidSlug {
            value: value.into(),
            reason: "slug must contain only letters, digits, or underscore".into(),
        });
    }

    Ok(())
}
