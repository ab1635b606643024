//! Shared error definitions for tool primitives.

use thiserror::Error;

/// Result alias used by primitive constructors.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Errors raised while validating tool metadata fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A name or alias did not satisfy the slug pattern.
    #[error("invalid slug `{value}`: {reason}")]
    InvalidSlug {
        /// The offending identifier string.
        value: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// The tool kind is not one of `filter`, `test`, or `function`.
    #[error("unknown tool kind `{value}`, expected one of filter, test, function")]
    UnknownKind {
        /// The rejected kind literal.
        value: String,
    },

    /// An example definition was malformed.
    #[error("invalid example: {reason}")]
    InvalidExample {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A metadata field failed validation.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl ValidationError {
    /// Convenience helper for field-level failures.
    #[must_use]
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
