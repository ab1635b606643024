//! Loaders that register tools from external sources.
//!
//! [`ToolLoader`] dispatches a source string to the first loader accepting
//! it: TOML definition files or directories, modules holding
//! `#[tool]` functions, then named plugins.

#![warn(missing_docs, clippy::pedantic)]

pub mod error;
pub mod module;
pub mod plugin;
pub mod report;
pub mod toml_loader;

use std::sync::Arc;

use toolreg_core::{Resolver, ToolRegistrar};
use tracing::warn;

pub use error::{LoaderError, LoaderResult};
pub use module::ModuleLoader;
pub use plugin::{Plugin, PluginLoader};
pub use report::{LoadReport, SkippedTool};
pub use toml_loader::{TomlLoader, TomlLoaderConfig};

/// A source of tool registrations.
pub trait Loader: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether this loader understands `source`.
    fn can_load(&self, source: &str) -> bool;

    /// Registers the tools found in `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] if the source as a whole cannot be loaded.
    fn load(&mut self, source: &str) -> LoaderResult<LoadReport>;
}

/// Unified entry point over the TOML, module, and plugin loaders.
#[derive(Debug)]
pub struct ToolLoader {
    toml: TomlLoader,
    module: ModuleLoader,
    plugin: PluginLoader,
}

impl Default for ToolLoader {
    fn default() -> Self {
        Self::new(ToolRegistrar::default())
    }
}

impl ToolLoader {
    /// Creates loaders that all register through `registrar`.
    #[must_use]
    pub fn new(registrar: ToolRegistrar) -> Self {
        Self {
            toml: TomlLoader::new(Arc::clone(registrar.registry())),
            module: ModuleLoader::new(registrar.clone()),
            plugin: PluginLoader::new(registrar),
        }
    }

    /// Resolves TOML import paths through `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.toml = self.toml.with_resolver(resolver);
        self
    }

    /// Applies `config` to every TOML document.
    #[must_use]
    pub fn with_toml_config(mut self, config: TomlLoaderConfig) -> Self {
        self.toml = self.toml.with_config(config);
        self
    }

    /// Makes `plugin` loadable by name.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.plugin.add_plugin(plugin);
    }

    /// The TOML loader, for loading documents from memory.
    #[must_use]
    pub fn toml(&self) -> &TomlLoader {
        &self.toml
    }

    fn loaders(&mut self) -> [&mut dyn Loader; 3] {
        [&mut self.toml, &mut self.module, &mut self.plugin]
    }

    /// Loads `source` with the first loader that accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::NoLoader`] if no loader accepts the source, or
    /// the error of the loader that does.
    pub fn load(&mut self, source: &str) -> LoaderResult<LoadReport> {
        for loader in self.loaders() {
            if loader.can_load(source) {
                return loader.load(source).inspect_err(|err| {
                    warn!(loader = loader.name(), source, error = %err, "loader failed");
                });
            }
        }
        Err(LoaderError::NoLoader {
            source_name: source.to_owned(),
        })
    }

    /// Loads every source, recording failed sources as skipped and going on.
    pub fn load_many<I, S>(&mut self, sources: I) -> LoadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = LoadReport::new();
        for source in sources {
            let source = source.as_ref();
            match self.load(source) {
                Ok(loaded) => report.merge(loaded),
                Err(err) => {
                    warn!(source, error = %err, "failed to load source");
                    report.record_skipped(source, err);
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;
    use toolreg_core::{
        Arguments, Function, RegistrationError, SymbolTable, ToolMetadata, ToolOptions,
        ToolRegistry,
    };

    struct EchoPlugin;

    impl Plugin for EchoPlugin {
        fn name(&self) -> &str {
            "echo"
        }

        fn register_tools(
            &self,
            registrar: &ToolRegistrar,
        ) -> Result<Vec<Arc<ToolMetadata>>, RegistrationError> {
            let echo = Function::builder("echo", |args: &Arguments| {
                Ok(args.args().first().cloned().unwrap_or(Value::Null))
            })
            .module("plugins")
            .build();
            Ok(vec![registrar.register(&echo, &ToolOptions::function())?])
        }
    }

    fn loader() -> (ToolLoader, Arc<ToolRegistry>) {
        let registry = Arc::new(ToolRegistry::new());
        let symbols = SymbolTable::new();
        symbols.insert_function(
            "demo.identity",
            Function::new("identity", |args: &Arguments| {
                Ok(args.args().first().cloned().unwrap_or(Value::Null))
            }),
        );
        let mut loader = ToolLoader::new(ToolRegistrar::new(Arc::clone(&registry)))
            .with_resolver(Arc::new(symbols));
        loader.add_plugin(EchoPlugin);
        (loader, registry)
    }

    #[test]
    fn dispatches_to_accepting_loader() {
        let (mut loader, registry) = loader();
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("tools.toml");
        std::fs::write(
            &file,
            "[identity]\ntyp = \"function\"\nimport_path = \"demo.identity\"\n",
        )
        .expect("write");

        let report = loader.load(&file.display().to_string()).expect("toml");
        assert_eq!(report.registered(), ["identity"]);

        let report = loader.load("echo").expect("plugin");
        assert_eq!(report.registered(), ["echo"]);
        assert!(registry.contains("identity") && registry.contains("echo"));
    }

    #[test]
    fn unknown_source_has_no_loader() {
        let (mut loader, _) = loader();
        let err = loader.load("nothing-handles-this").expect_err("no loader");
        assert!(matches!(err, LoaderError::NoLoader { source_name } if source_name == "nothing-handles-this"));
    }

    #[test]
    fn load_many_continues_after_failures() {
        let (mut loader, registry) = loader();
        let report = loader.load_many(["echo", "missing", "echo"]);

        assert_eq!(report.registered(), ["echo"]);
        let skipped: Vec<_> = report.skipped().iter().map(|item| item.name.as_str()).collect();
        assert_eq!(skipped, ["missing", "echo"]);
        assert!(matches!(report.skipped()[1].error, LoaderError::AlreadyLoaded { .. }));
        assert_eq!(registry.len(), 1);
    }
}
