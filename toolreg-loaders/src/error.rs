//! Error types for the loaders.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toolreg_core::{RegistrationError, ToolError};

/// Result alias for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors raised while loading tool definitions.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A definition file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A definition document or entry is not valid TOML for a tool record.
    #[error("failed to parse {origin}: {source}")]
    Parse {
        /// File path or entry name being parsed.
        origin: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The configured key path does not lead to a table.
    #[error("invalid key path `{key_path}` in {origin}")]
    InvalidKeyPath {
        /// The `/`-separated key path.
        key_path: String,
        /// File path or document name.
        origin: String,
    },

    /// The source is neither a definition file nor a directory.
    #[error("invalid source path: {path}")]
    InvalidSource {
        /// The offending path.
        path: PathBuf,
    },

    /// The source was loaded before and may not be loaded again.
    #[error("`{source_name}` is already loaded")]
    AlreadyLoaded {
        /// The repeated source.
        source_name: String,
    },

    /// No loader accepts the source.
    #[error("no suitable loader found for `{source_name}`")]
    NoLoader {
        /// The rejected source.
        source_name: String,
    },

    /// A tool entry failed validation or resolution.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A pending tool failed to register.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A plugin failed while registering its tools.
    #[error("plugin `{plugin}` failed: {source}")]
    Plugin {
        /// Plugin name.
        plugin: String,
        /// Registration failure reported by the plugin.
        #[source]
        source: RegistrationError,
    },
}
