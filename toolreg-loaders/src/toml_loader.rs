//! Tool definitions read from TOML documents.
//!
//! Each top-level table (or each table under the configured key path) names
//! one tool:
//!
//! ```toml
//! [upper]
//! typ = "filter"
//! group = "text"
//! import_path = "demo.text.upper"
//! description = "Convert string to uppercase"
//!
//! [upper.examples.basic]
//! template = "{{ 'hello' | upper }}"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use toolreg_core::{Resolver, SymbolTable, ToolError, ToolMetadata, ToolRecord, ToolRegistry};
use tracing::{debug, info, warn};

use crate::Loader;
use crate::error::{LoaderError, LoaderResult};
use crate::report::LoadReport;

const EXTENSION: &str = "toml";

/// Options applied to every document a [`TomlLoader`] reads.
#[derive(Clone, Debug, PartialEq)]
pub struct TomlLoaderConfig {
    /// `/`-separated path of the table holding the tool entries.
    pub key_path: Option<String>,
    /// Fields merged over every entry before validation.
    pub overrides: toml::Table,
    /// Whether directories are searched recursively.
    pub recursive: bool,
}

impl Default for TomlLoaderConfig {
    fn default() -> Self {
        Self {
            key_path: None,
            overrides: toml::Table::new(),
            recursive: true,
        }
    }
}

/// Registers tools described in TOML files.
pub struct TomlLoader {
    registry: Arc<ToolRegistry>,
    resolver: Arc<dyn Resolver>,
    config: TomlLoaderConfig,
    processed: HashSet<PathBuf>,
}

impl std::fmt::Debug for TomlLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlLoader")
            .field("config", &self.config)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

impl TomlLoader {
    /// Creates a loader registering into `registry` and resolving import
    /// paths through the process-wide symbol table.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            resolver: SymbolTable::global(),
            config: TomlLoaderConfig::default(),
            processed: HashSet::new(),
        }
    }

    /// Resolves import paths through `resolver` instead.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the document options.
    #[must_use]
    pub fn with_config(mut self, config: TomlLoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Current document options.
    #[must_use]
    pub fn config(&self) -> &TomlLoaderConfig {
        &self.config
    }

    /// Registers the tools defined in `text`; `origin` names it in logs.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Parse`] for malformed TOML and
    /// [`LoaderError::InvalidKeyPath`] if the key path leads nowhere. Invalid
    /// entries are skipped and listed in the report.
    pub fn load_str(&self, text: &str, origin: &str) -> LoaderResult<LoadReport> {
        let document: toml::Table = toml::from_str(text).map_err(|source| LoaderError::Parse {
            origin: origin.to_owned(),
            source,
        })?;
        let table = self.select(document, origin)?;

        let mut report = LoadReport::new();
        for (name, entry) in table {
            match self.load_entry(&name, entry) {
                Ok(metadata) => {
                    info!(tool = metadata.name(), origin, "registered tool from definition");
                    report.record_registered(metadata.name());
                }
                Err(err) => {
                    warn!(tool = %name, origin, error = %err, "skipping tool definition");
                    report.record_skipped(name, err);
                }
            }
        }
        Ok(report)
    }

    /// Registers the tools defined in the file at `path`.
    ///
    /// A file already processed by this loader is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the file cannot be read, plus the
    /// errors of [`TomlLoader::load_str`].
    pub fn load_file(&mut self, path: &Path) -> LoaderResult<LoadReport> {
        let id = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.processed.contains(&id) {
            debug!(path = %path.display(), "skipping already processed file");
            return Ok(LoadReport::new());
        }

        let text = fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let report = self.load_str(&text, &path.display().to_string())?;
        self.processed.insert(id);
        Ok(report)
    }

    /// Registers the tools of every `.toml` file under `dir`.
    ///
    /// Files that fail to load are recorded as skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the directory cannot be listed.
    pub fn load_dir(&mut self, dir: &Path) -> LoaderResult<LoadReport> {
        let mut files = Vec::new();
        collect_files(dir, self.config.recursive, &mut files)?;
        files.sort();

        let mut report = LoadReport::new();
        for file in files {
            match self.load_file(&file) {
                Ok(loaded) => report.merge(loaded),
                Err(err) => {
                    warn!(path = %file.display(), error = %err, "skipping definition file");
                    report.record_skipped(file.display().to_string(), err);
                }
            }
        }
        Ok(report)
    }

    fn select(&self, document: toml::Table, origin: &str) -> LoaderResult<toml::Table> {
        let Some(key_path) = &self.config.key_path else {
            return Ok(document);
        };

        let mut table = document;
        for key in key_path.split('/') {
            table = match table.remove(key) {
                Some(toml::Value::Table(nested)) if !nested.is_empty() => nested,
                _ => {
                    return Err(LoaderError::InvalidKeyPath {
                        key_path: key_path.clone(),
                        origin: origin.to_owned(),
                    });
                }
            };
        }
        Ok(table)
    }

    fn load_entry(&self, name: &str, mut entry: toml::Value) -> LoaderResult<Arc<ToolMetadata>> {
        if let toml::Value::Table(fields) = &mut entry {
            normalize_kind_key(fields);
            let mut overrides = self.config.overrides.clone();
            normalize_kind_key(&mut overrides);
            fields.extend(overrides);
        }
        let record = ToolRecord::deserialize(entry).map_err(|source| LoaderError::Parse {
            origin: name.to_owned(),
            source,
        })?;

        let metadata = Arc::new(ToolMetadata::from_record(name, record).map_err(ToolError::from)?);
        let function = metadata.resolve_with(self.resolver.as_ref())?;
        self.registry.register(function, Arc::clone(&metadata));
        Ok(metadata)
    }
}

/// Renames `type` to `typ` so an override of either spelling replaces the kind.
fn normalize_kind_key(table: &mut toml::Table) {
    if let Some(kind) = table.remove("type") {
        table.entry("typ").or_insert(kind);
    }
}

fn is_definition(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == EXTENSION)
}

fn collect_files(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> LoaderResult<()> {
    let entries = fs::read_dir(dir).map_err(|source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| LoaderError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, recursive, files)?;
            }
        } else if is_definition(&path) {
            files.push(path);
        }
    }
    Ok(())
}

impl Loader for TomlLoader {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn can_load(&self, source: &str) -> bool {
        let path = Path::new(source);
        (path.is_file() && is_definition(path)) || path.is_dir()
    }

    fn load(&mut self, source: &str) -> LoaderResult<LoadReport> {
        let path = Path::new(source);
        if path.is_file() {
            self.load_file(path)
        } else if path.is_dir() {
            self.load_dir(path)
        } else {
            Err(LoaderError::InvalidSource {
                path: path.to_path_buf(),
            })
        }
    }
}
