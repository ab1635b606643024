//! Runtime registry mapping tool names and aliases to functions and metadata.

use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use toolreg_primitives::ToolKind;
use tracing::{debug, warn};

use crate::error::ToolResult;
use crate::function::{Arguments, Function};
use crate::metadata::ToolMetadata;

/// Function and metadata pair stored under every key of a tool.
#[derive(Clone, Debug)]
pub struct RegisteredTool {
    function: Function,
    metadata: Arc<ToolMetadata>,
}

impl RegisteredTool {
    /// Returns the registered function.
    #[must_use]
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &Arc<ToolMetadata> {
        &self.metadata
    }

    /// Invokes the registered function.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the function.
    pub fn call(&self, args: &Arguments) -> ToolResult<Value> {
        self.function.call(args)
    }

    /// Whether both entries hold the same function and metadata objects.
    #[must_use]
    pub fn same_as(&self, other: &RegisteredTool) -> bool {
        Function::ptr_eq(&self.function, &other.function) && Arc::ptr_eq(&self.metadata, &other.metadata)
    }
}

/// A key that moved from one tool to another during registration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyCollision {
    /// The reassigned registry key.
    pub key: String,
    /// Primary name of the tool that held the key before.
    pub previous: String,
    /// Primary name of the tool that holds it now.
    pub current: String,
}

/// Registry that stores tools keyed by name and alias, in insertion order.
///
/// Registering under an existing key replaces it. Aliases are independent
/// entries, so replacing a tool does not remove aliases left over from its
/// previous registration; [`ToolRegistry::dangling_aliases`] reports them.
#[derive(Default)]
pub struct ToolRegistry {
    inner: RwLock<IndexMap<String, RegisteredTool>>,
}

static GLOBAL: Lazy<Arc<ToolRegistry>> = Lazy::new(|| Arc::new(ToolRegistry::new()));

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("tool registry poisoned");
        let names: Vec<_> = inner.keys().cloned().collect();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use.
    #[must_use]
    pub fn global() -> Arc<ToolRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Stores `function` under the metadata name and each alias.
    ///
    /// Returns the keys that previously belonged to a different tool.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn register(
        &self,
        function: Function,
        metadata: impl Into<Arc<ToolMetadata>>,
    ) -> Vec<KeyCollision> {
        let entry = RegisteredTool {
            function,
            metadata: metadata.into(),
        };
        let name = entry.metadata.name().to_owned();
        let keys = std::iter::once(name.clone())
            .chain(entry.metadata.aliases().iter().map(ToString::to_string));

        let mut inner = self.inner.write().expect("tool registry poisoned");
        let mut collisions = Vec::new();
        for key in keys {
            if let Some(previous) = inner.insert(key.clone(), entry.clone()) {
                let previous = previous.metadata.name();
                if previous != name {
                    collisions.push(KeyCollision {
                        key,
                        previous: previous.to_owned(),
                        current: name.clone(),
                    });
                }
            }
        }
        drop(inner);

        for collision in &collisions {
            warn!(
                key = %collision.key,
                previous = %collision.previous,
                current = %collision.current,
                "registry key reassigned to a different tool"
            );
        }
        debug!(tool = %name, kind = %entry.metadata.kind(), "stored tool");
        collisions
    }

    /// Returns the entry under `name`, which may be a primary name or alias.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<RegisteredTool> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner.get(name).cloned()
    }

    /// Returns a snapshot of all entries, optionally limited to `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn get_all(&self, kind: Option<ToolKind>) -> IndexMap<String, RegisteredTool> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner
            .iter()
            .filter(|(_, entry)| kind.is_none_or(|kind| entry.metadata.kind() == kind))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Whether `name` is a registered key.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .read()
            .expect("tool registry poisoned")
            .contains_key(name)
    }

    /// Number of keys, aliases included.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("tool registry poisoned").len()
    }

    /// Whether the registry holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alias keys whose entry is no longer the one stored under its tool's
    /// primary name.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    #[must_use]
    pub fn dangling_aliases(&self) -> Vec<String> {
        let inner = self.inner.read().expect("tool registry poisoned");
        inner
            .iter()
            .filter(|(key, entry)| key.as_str() != entry.metadata.name())
            .filter(|(_, entry)| {
                inner
                    .get(entry.metadata.name())
                    .is_none_or(|primary| !Arc::ptr_eq(&primary.metadata, &entry.metadata))
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes every entry.
    ///
    /// # Panics
    ///
    /// Panics if the internal registry lock is poisoned.
    pub fn clear(&self) {
        self.inner.write().expect("tool registry poisoned").clear();
    }
}
