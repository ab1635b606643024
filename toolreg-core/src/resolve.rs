//! Resolution of dotted import paths to callables.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::error::{ToolError, ToolResult};
use crate::factory::import_path;
use crate::function::Function;
use crate::pending::PendingTool;

/// Object found at an import path.
#[derive(Clone, Debug)]
pub enum Symbol {
    /// An invocable function.
    Function(Function),
    /// A plain value that cannot be called.
    Value(Value),
}

/// Maps dotted paths to symbols.
pub trait Resolver: Send + Sync {
    /// Resolves `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Resolution`] if nothing is known at `path`.
    fn resolve(&self, path: &str) -> ToolResult<Symbol>;
}

/// In-memory [`Resolver`] backed by a path table.
#[derive(Default)]
pub struct SymbolTable {
    symbols: RwLock<HashMap<String, Symbol>>,
}

static GLOBAL: Lazy<Arc<SymbolTable>> = Lazy::new(|| Arc::new(SymbolTable::from_pending()));

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide table, seeded on first use with every function annotated
    /// with `#[tool]`.
    #[must_use]
    pub fn global() -> Arc<SymbolTable> {
        Arc::clone(&GLOBAL)
    }

    /// Builds a table from every pending tool submitted in this binary.
    #[must_use]
    pub fn from_pending() -> Self {
        let table = Self::new();
        for pending in PendingTool::iter() {
            let function = pending.function();
            match import_path(&function) {
                Ok(path) => table.insert_function(path, function),
                Err(err) => debug!(function = function.name(), error = %err, "pending tool has no import path"),
            }
        }
        table
    }

    /// Registers `function` under `path`, replacing any previous symbol.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_function(&self, path: impl Into<String>, function: Function) {
        self.insert(path.into(), Symbol::Function(function));
    }

    /// Registers a non-callable `value` under `path`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert_value(&self, path: impl Into<String>, value: Value) {
        self.insert(path.into(), Symbol::Value(value));
    }

    fn insert(&self, path: String, symbol: Symbol) {
        let mut symbols = self.symbols.write().expect("symbol table poisoned");
        symbols.insert(path, symbol);
    }

    /// Whether anything is registered at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.symbols
            .read()
            .is_ok_and(|symbols| symbols.contains_key(path))
    }
}

impl Resolver for SymbolTable {
    fn resolve(&self, path: &str) -> ToolResult<Symbol> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(ToolError::resolution(path, "malformed dotted path"));
        }

        let symbols = self
            .symbols
            .read()
            .map_err(|_| ToolError::resolution(path, "symbol table poisoned"))?;
        symbols
            .get(path)
            .cloned()
            .ok_or_else(|| ToolError::resolution(path, "no symbol is registered at this path"))
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<String> = self
            .symbols
            .read()
            .map(|symbols| symbols.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("SymbolTable").field("paths", &paths).finish()
    }
}
