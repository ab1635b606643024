//! Core shared types for template tool registration.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod example;
mod kind;
mod slug;

/// Validation error type and result alias shared across the workspace.
pub use error::{ValidationError, ValidationResult};
/// Usage example attached to a tool.
pub use example::{Example, ExampleBuilder};
/// Closed set of tool kinds.
pub use kind::ToolKind;
/// Normalised identifiers used as registry keys.
pub use slug::Slug;
