//! Registration of annotated functions grouped by module.

use std::collections::HashSet;

use toolreg_core::factory::import_path;
use toolreg_core::{PendingTool, ToolRegistrar};
use tracing::{debug, info, warn};

use crate::Loader;
use crate::error::LoaderResult;
use crate::report::LoadReport;

/// Registers the `#[tool]` functions defined under a module.
///
/// Sources are dotted module paths such as `my_crate.filters`; Rust paths
/// with `::` are accepted too.
#[derive(Debug)]
pub struct ModuleLoader {
    registrar: ToolRegistrar,
    loaded: HashSet<String>,
}

impl ModuleLoader {
    /// Creates a loader registering through `registrar`.
    #[must_use]
    pub fn new(registrar: ToolRegistrar) -> Self {
        Self {
            registrar,
            loaded: HashSet::new(),
        }
    }

    /// Whether `module` has been loaded already.
    #[must_use]
    pub fn is_loaded(&self, module: &str) -> bool {
        self.loaded.contains(&normalize(module))
    }

    fn pending_in(module: &str) -> impl Iterator<Item = &'static PendingTool> + '_ {
        PendingTool::iter().filter(move |pending| {
            import_path(&pending.function()).is_ok_and(|path| {
                path.strip_prefix(module)
                    .is_some_and(|rest| rest.starts_with('.'))
            })
        })
    }
}

fn normalize(module: &str) -> String {
    module.trim().replace("::", ".")
}

impl Loader for ModuleLoader {
    fn name(&self) -> &'static str {
        "module"
    }

    fn can_load(&self, source: &str) -> bool {
        let module = normalize(source);
        !module.is_empty() && Self::pending_in(&module).next().is_some()
    }

    fn load(&mut self, source: &str) -> LoaderResult<LoadReport> {
        let module = normalize(source);
        let mut report = LoadReport::new();
        if self.loaded.contains(&module) {
            debug!(module = %module, "module already loaded");
            return Ok(report);
        }

        for pending in Self::pending_in(&module) {
            match self.registrar.register_pending_tool(pending) {
                Ok(metadata) => {
                    info!(tool = metadata.name(), module = %module, "registered tool from module");
                    report.record_registered(metadata.name());
                }
                Err(err) => {
                    warn!(function = err.function(), module = %module, error = %err.cause(), "skipping tool");
                    report.record_skipped(err.function().to_owned(), err.into());
                }
            }
        }
        self.loaded.insert(module);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    use toolreg_core::{ToolRegistry, tool};

    use crate::error::LoaderError;

    /// Reverse a string.
    #[tool(kind = "filter", group = "text")]
    fn reverse(value: &str) -> String {
        value.chars().rev().collect()
    }

    /// Whether a number is even.
    #[tool(kind = "test")]
    fn even(value: i64) -> bool {
        value % 2 == 0
    }

    #[tool(kind = "unsupported")]
    fn unsupported() -> bool {
        true
    }

    fn loader() -> ModuleLoader {
        ModuleLoader::new(ToolRegistrar::new(Arc::new(ToolRegistry::new())))
    }

    #[test]
    fn loads_annotated_functions_of_module() {
        let mut loader = loader();
        let module = module_path!();
        assert!(loader.can_load(module));

        let report = loader.load(module).expect("report");
        let mut registered = report.registered().to_vec();
        registered.sort();
        assert_eq!(registered, ["even", "reverse"]);
        assert!(matches!(
            report.skipped(),
            [skipped] if skipped.name == "unsupported" && matches!(skipped.error, LoaderError::Registration(_))
        ));
        assert!(loader.is_loaded(module));

        let registry = loader.registrar.registry();
        assert_eq!(registry.lookup("reverse").unwrap().metadata().group(), "text");
    }

    #[test]
    fn repeated_loads_are_no_ops() {
        let mut loader = loader();
        let module = module_path!();
        loader.load(module).expect("first");
        let second = loader.load(module).expect("second");
        assert!(second.registered().is_empty());
        assert!(second.is_clean());
    }

    #[test]
    fn unknown_modules_cannot_be_loaded() {
        let loader = loader();
        assert!(!loader.can_load("no.such.module"));
        assert!(!loader.can_load(""));
    }
}
