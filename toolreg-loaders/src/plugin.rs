//! Named plugins that register their own tools.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use toolreg_core::{RegistrationError, ToolMetadata, ToolRegistrar};
use tracing::info;

use crate::Loader;
use crate::error::{LoaderError, LoaderResult};
use crate::report::LoadReport;

/// A bundle of tools registered together.
pub trait Plugin: Send + Sync {
    /// Name the plugin is loaded by.
    fn name(&self) -> &str;

    /// Registers the plugin's tools and returns their metadata.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] encountered.
    fn register_tools(
        &self,
        registrar: &ToolRegistrar,
    ) -> Result<Vec<Arc<ToolMetadata>>, RegistrationError>;
}

/// Loads registered plugins by name, each at most once.
pub struct PluginLoader {
    registrar: ToolRegistrar,
    plugins: IndexMap<String, Box<dyn Plugin>>,
    loaded: HashSet<String>,
}

impl std::fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginLoader")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl PluginLoader {
    /// Creates a loader registering through `registrar`.
    #[must_use]
    pub fn new(registrar: ToolRegistrar) -> Self {
        Self {
            registrar,
            plugins: IndexMap::new(),
            loaded: HashSet::new(),
        }
    }

    /// Makes `plugin` available under its name, replacing any plugin with the
    /// same name.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.insert(plugin.name().to_owned(), Box::new(plugin));
    }

    /// Whether the plugin named `name` has been loaded.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }
}

impl Loader for PluginLoader {
    fn name(&self) -> &'static str {
        "plugin"
    }

    fn can_load(&self, source: &str) -> bool {
        self.plugins.contains_key(source)
    }

    fn load(&mut self, source: &str) -> LoaderResult<LoadReport> {
        if self.loaded.contains(source) {
            return Err(LoaderError::AlreadyLoaded {
                source_name: source.to_owned(),
            });
        }
        let plugin = self
            .plugins
            .get(source)
            .ok_or_else(|| LoaderError::NoLoader {
                source_name: source.to_owned(),
            })?;

        let tools = plugin
            .register_tools(&self.registrar)
            .map_err(|source| LoaderError::Plugin {
                plugin: plugin.name().to_owned(),
                source,
            })?;

        let mut report = LoadReport::new();
        for metadata in tools {
            report.record_registered(metadata.name());
        }
        info!(plugin = source, tools = report.registered().len(), "loaded plugin");
        self.loaded.insert(source.to_owned());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;
    use toolreg_core::{Arguments, Function, ToolOptions, ToolRegistry};

    struct TextPlugin;

    impl Plugin for TextPlugin {
        fn name(&self) -> &str {
            "text"
        }

        fn register_tools(
            &self,
            registrar: &ToolRegistrar,
        ) -> Result<Vec<Arc<ToolMetadata>>, RegistrationError> {
            let upper = Function::builder("upper", |args: &Arguments| {
                let value: String = args.bind(0, "value")?;
                Ok(Value::from(value.to_uppercase()))
            })
            .module("plugins::text")
            .build();
            Ok(vec![registrar.register(&upper, &ToolOptions::filter())?])
        }
    }

    struct BrokenPlugin;

    impl Plugin for BrokenPlugin {
        fn name(&self) -> &str {
            "broken"
        }

        fn register_tools(
            &self,
            registrar: &ToolRegistrar,
        ) -> Result<Vec<Arc<ToolMetadata>>, RegistrationError> {
            let anonymous = Function::new("anonymous", |_: &Arguments| Ok(Value::Null));
            Ok(vec![registrar.register(&anonymous, &ToolOptions::function())?])
        }
    }

    fn loader() -> PluginLoader {
        let mut loader = PluginLoader::new(ToolRegistrar::new(Arc::new(ToolRegistry::new())));
        loader.add_plugin(TextPlugin);
        loader.add_plugin(BrokenPlugin);
        loader
    }

    #[test]
    fn loads_plugin_once() {
        let mut loader = loader();
        assert!(loader.can_load("text"));
        assert!(!loader.can_load("missing"));

        let report = loader.load("text").expect("report");
        assert_eq!(report.registered(), ["upper"]);
        assert!(loader.is_loaded("text"));
        assert!(loader.registrar.registry().contains("upper"));

        let err = loader.load("text").expect_err("second load");
        assert!(matches!(err, LoaderError::AlreadyLoaded { source_name } if source_name == "text"));
    }

    #[test]
    fn plugin_failures_are_reported() {
        let mut loader = loader();
        let err = loader.load("broken").expect_err("broken plugin");
        assert!(matches!(err, LoaderError::Plugin { plugin, .. } if plugin == "broken"));
        assert!(!loader.is_loaded("broken"));
    }
}
