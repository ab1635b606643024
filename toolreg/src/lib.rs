//! Registry of template filters, tests, and functions.
//!
//! This facade bundles the toolreg crates behind feature flags. Functions are
//! registered with the `#[tool]` attribute or a
//! [`tools::ToolRegistrar`], described by metadata inferred from their doc
//! comments, and looked up by name or alias.

#![warn(missing_docs, clippy::pedantic)]

/// Shared primitives: slugs, tool kinds, and examples.
pub use toolreg_primitives as primitives;

/// Metadata, registry, and registrar (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use toolreg_core as tools;

/// TOML, module, and plugin loaders (enabled by `loaders` feature).
#[cfg(feature = "loaders")]
pub use toolreg_loaders as loaders;
