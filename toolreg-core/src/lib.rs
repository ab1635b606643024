//! Registration of template filters, tests, and functions.
//!
//! A [`Function`] is described by [`ToolMetadata`], built by the
//! [`MetadataFactory`] from the function's doc comment and the caller's
//! [`ToolOptions`], and stored in a [`ToolRegistry`] under its name and every
//! alias. The [`ToolRegistrar`] composes those steps; the
//! [`tool`] attribute submits functions for deferred registration
//! with [`ToolRegistrar::register_pending`].

#![warn(missing_docs, clippy::pedantic)]

extern crate self as toolreg_core;

pub mod docstring;
pub mod error;
pub mod factory;
pub mod function;
pub mod generate;
pub mod metadata;
pub mod pending;
pub mod registrar;
pub mod registry;
pub mod resolve;

pub use docstring::{Dialect, DocSection, SectionParser, StandardSectionParser};
pub use error::{RegistrationError, ToolError, ToolResult};
pub use factory::{MetadataFactory, ToolOptions};
pub use function::{Arguments, Function, Param, Signature};
pub use generate::{ExampleGenerator, ExampleStrategy};
pub use metadata::{DEFAULT_GROUP, ToolMetadata, ToolRecord};
pub use pending::PendingTool;
pub use registrar::{Decorated, ToolRegistrar};
pub use registry::{KeyCollision, RegisteredTool, ToolRegistry};
pub use resolve::{Resolver, Symbol, SymbolTable};
pub use toolreg_macros::tool;
pub use toolreg_primitives::{Example, Slug, ToolKind, ValidationError};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
    pub use once_cell::sync::Lazy;
    pub use serde_json::Value;
}
