//! Tool kind literals.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role a registered callable plays inside a template environment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ToolKind {
    /// Transforms a value: `{{ value | name }}`.
    Filter,
    /// Evaluates a predicate: `{{ value is name }}`.
    Test,
    /// Called directly: `{{ name(args) }}`.
    Function,
}

impl ToolKind {
    /// All kinds, in declaration order.
    pub const ALL: [ToolKind; 3] = [Self::Filter, Self::Test, Self::Function];

    /// Returns the lowercase literal for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Test => "test",
            Self::Function => "function",
        }
    }
}

impl Display for ToolKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filter" => Ok(Self::Filter),
            "test" => Ok(Self::Test),
            "function" => Ok(Self::Function),
            other => Err(ValidationError::UnknownKind {
                value: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for ToolKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
