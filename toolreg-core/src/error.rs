//! Errors produced by metadata construction, resolution, and invocation.

use thiserror::Error;
use toolreg_primitives::ValidationError;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by tool metadata handling and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Metadata failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The import path of a callable could not be determined.
    #[error("could not determine import path for `{function}`")]
    PathResolution {
        /// Name of the offending function.
        function: String,
    },

    /// An import path did not resolve to any known symbol.
    #[error("could not resolve `{path}`: {reason}")]
    Resolution {
        /// Dotted path that failed to resolve.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// An import path resolved, but not to a function.
    #[error("`{path}` resolved to a value that is not callable")]
    NotCallable {
        /// Dotted path that resolved to a plain value.
        path: String,
    },

    /// A required argument was neither passed positionally nor by keyword.
    #[error("missing argument `{name}` (position {position})")]
    MissingArgument {
        /// Parameter name.
        name: String,
        /// Zero-based positional index.
        position: usize,
    },

    /// An argument could not be converted to the parameter type.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Conversion failure details.
        reason: String,
    },

    /// The underlying callable failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the implementation.
        reason: String,
    },

    /// No example strategy is registered for a tool kind.
    #[error("no example generation strategy for tool kind `{kind}`")]
    NoExampleStrategy {
        /// The tool kind lacking a strategy.
        kind: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates a resolution error for `path`.
    #[must_use]
    pub fn resolution(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Failure to register a function; the function was not inserted.
#[derive(Debug, Error)]
#[error("failed to register `{function}`: {source}")]
pub struct RegistrationError {
    function: String,
    #[source]
    source: ToolError,
}

impl RegistrationError {
    /// Wraps `source` as a registration failure for `function`.
    #[must_use]
    pub fn new(function: impl Into<String>, source: ToolError) -> Self {
        Self {
            function: function.into(),
            source,
        }
    }

    /// Name of the function that failed to register.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The underlying cause.
    #[must_use]
    pub fn cause(&self) -> &ToolError {
        &self.source
    }

    /// Consumes the error and returns the underlying cause.
    #[must_use]
    pub fn into_cause(self) -> ToolError {
        self.source
    }
}
