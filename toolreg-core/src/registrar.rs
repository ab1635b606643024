//! Registration entry point tying a function to its metadata.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::RegistrationError;
use crate::factory::{MetadataFactory, ToolOptions};
use crate::function::Function;
use crate::metadata::ToolMetadata;
use crate::pending::PendingTool;
use crate::registry::ToolRegistry;

/// Outcome of [`ToolRegistrar::decorate`].
#[derive(Debug)]
pub struct Decorated {
    /// Pass-through wrapper around the original function.
    pub function: Function,
    /// Registered metadata, or why registration failed.
    pub outcome: Result<Arc<ToolMetadata>, RegistrationError>,
}

/// Builds metadata for functions and stores them in a [`ToolRegistry`].
#[derive(Clone, Debug)]
pub struct ToolRegistrar {
    registry: Arc<ToolRegistry>,
    factory: MetadataFactory,
}

impl Default for ToolRegistrar {
    fn default() -> Self {
        Self::new(ToolRegistry::global())
    }
}

impl ToolRegistrar {
    /// Creates a registrar writing into `registry`.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            factory: MetadataFactory::default(),
        }
    }

    /// Replaces the metadata factory.
    #[must_use]
    pub fn with_factory(mut self, factory: MetadataFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Target registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Builds metadata for `function` without touching the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] wrapping the factory failure.
    pub fn build_metadata(
        &self,
        function: &Function,
        options: &ToolOptions,
    ) -> Result<ToolMetadata, RegistrationError> {
        self.factory
            .build(function, options)
            .map_err(|source| RegistrationError::new(function.name(), source))
    }

    /// Builds metadata for `function` and registers both.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] if metadata cannot be built; the
    /// registry is left untouched in that case.
    pub fn register(
        &self,
        function: &Function,
        options: &ToolOptions,
    ) -> Result<Arc<ToolMetadata>, RegistrationError> {
        let metadata = Arc::new(self.build_metadata(function, options)?);
        self.registry.register(function.clone(), Arc::clone(&metadata));
        info!(
            tool = metadata.name(),
            kind = %metadata.kind(),
            import_path = metadata.import_path(),
            "registered tool"
        );
        Ok(metadata)
    }

    /// Registers `function` and returns a pass-through wrapper around it.
    ///
    /// The wrapper is returned whether or not registration succeeded, so the
    /// caller keeps a working function either way.
    #[must_use]
    pub fn decorate(&self, function: Function, options: &ToolOptions) -> Decorated {
        let outcome = self.register(&function, options);
        if let Err(err) = &outcome {
            warn!(function = err.function(), error = %err.cause(), "tool registration failed");
        }
        Decorated {
            function: function.passthrough(),
            outcome,
        }
    }

    /// Registers every tool submitted with `#[tool]`.
    ///
    /// Failures are logged and returned; the remaining tools still register.
    /// Calling this again re-registers the same objects and changes nothing.
    pub fn register_pending(&self) -> Vec<RegistrationError> {
        PendingTool::iter()
            .filter_map(|pending| self.register_pending_tool(pending).err())
            .inspect(|err| {
                warn!(function = err.function(), error = %err.cause(), "pending tool registration failed");
            })
            .collect()
    }

    /// Registers a single pending tool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] for an unknown kind literal or a
    /// metadata failure.
    pub fn register_pending_tool(
        &self,
        pending: &PendingTool,
    ) -> Result<Arc<ToolMetadata>, RegistrationError> {
        let function = pending.function();
        let options = pending
            .options()
            .map_err(|source| RegistrationError::new(function.name(), source))?;
        self.register(&function, &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};
    use toolreg_primitives::{ToolKind, ValidationError};

    use crate::error::ToolError;
    use crate::function::{Arguments, into_value};

    fn upper() -> Function {
        Function::builder("upper", |args: &Arguments| {
            let value: String = args.bind(0, "value")?;
            into_value(value.to_uppercase())
        })
        .module("demo::text")
        .doc("Convert string to uppercase.\n\nExamples:\n    >>> upper('hi')\n    'HI'\n")
        .build()
    }

    fn registrar() -> ToolRegistrar {
        ToolRegistrar::new(Arc::new(ToolRegistry::new()))
    }

    #[test]
    fn build_metadata_does_not_register() {
        let registrar = registrar();
        let metadata = registrar
            .build_metadata(&upper(), &ToolOptions::filter())
            .expect("metadata");
        assert_eq!(metadata.name(), "upper");
        assert!(registrar.registry().is_empty());
    }

    #[test]
    fn register_then_lookup() {
        let registrar = registrar();
        let function = upper();
        let metadata = registrar
            .register(&function, &ToolOptions::filter().group("text"))
            .expect("registered");

        let stored = registrar.registry().lookup("upper").expect("stored");
        assert!(Arc::ptr_eq(stored.metadata(), &metadata));
        assert!(Function::ptr_eq(stored.function(), &function));
        assert_eq!(stored.metadata().kind(), ToolKind::Filter);
    }

    #[test]
    fn failed_registration_leaves_registry_untouched() {
        let registrar = registrar();
        let err = registrar
            .register(&upper(), &ToolOptions::filter().name("Has Space"))
            .expect_err("bad name");

        assert_eq!(err.function(), "upper");
        assert!(matches!(
            err.cause(),
            ToolError::Validation(ValidationError::InvalidSlug { .. })
        ));
        assert!(registrar.registry().is_empty());
    }

    #[test]
    fn decorate_returns_passthrough_even_on_failure() {
        let registrar = registrar();
        let anonymous = Function::new("echo", |args: &Arguments| {
            Ok(args.args().first().cloned().unwrap_or(Value::Null))
        });

        let decorated = registrar.decorate(anonymous.clone(), &ToolOptions::function());
        assert!(matches!(
            decorated.outcome,
            Err(ref err) if matches!(err.cause(), ToolError::PathResolution { .. })
        ));

        let output = decorated.function.call(&Arguments::new().arg(7)).unwrap();
        assert_eq!(output, json!(7));
        let original = decorated.function.wrapped().expect("wrapped");
        assert!(Function::ptr_eq(original, &anonymous));
    }

    #[test]
    fn decorated_wrapper_keeps_metadata_of_original() {
        let registrar = registrar();
        let decorated = registrar.decorate(upper(), &ToolOptions::filter());
        assert!(decorated.outcome.is_ok());
        assert_eq!(decorated.function.name(), "upper");
        assert_eq!(decorated.function.module(), Some("demo::text"));
        assert_eq!(
            decorated.function.call(&Arguments::new().arg("hi")).unwrap(),
            json!("HI")
        );
    }

    #[test]
    fn unsupported_pending_kind_fails_before_registration() {
        let registrar = registrar();
        let pending = PendingTool {
            kind: "unsupported",
            name: None,
            group: None,
            description: None,
            icon: None,
            aliases: &[],
            required_packages: &[],
            examples: None,
            function: upper,
        };

        let err = registrar
            .register_pending_tool(&pending)
            .expect_err("unknown kind");
        assert!(matches!(
            err.cause(),
            ToolError::Validation(ValidationError::UnknownKind { value }) if value == "unsupported"
        ));
        assert!(registrar.registry().is_empty());
    }
}
