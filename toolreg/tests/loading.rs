use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use toolreg::loaders::{LoaderError, ToolLoader, TomlLoaderConfig};
use toolreg::tools::{Arguments, ToolKind, ToolRegistrar, ToolRegistry, tool};

/// Strip whitespace from both ends.
#[tool(kind = "filter", group = "text", crate = "toolreg::tools")]
fn strip(value: &str) -> String {
    value.trim().to_owned()
}

/// Whether a string is empty.
#[tool(kind = "test", crate = "toolreg::tools")]
fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

const DEFINITIONS: &str = r#"
[tools.trim]
typ = "filter"
import_path = "loading.strip"
description = "Trim a string"
aliases = ["strip_ws"]

[tools.trim.examples.basic]
template = "{{ '  a ' | trim }}"

[tools.empty]
type = "test"
import_path = "loading.blank"

[tools.ghost]
typ = "filter"
import_path = "loading.ghost"
"#;

fn fresh_loader() -> (ToolLoader, Arc<ToolRegistry>) {
    let registry = Arc::new(ToolRegistry::new());
    let loader = ToolLoader::new(ToolRegistrar::new(Arc::clone(&registry))).with_toml_config(
        TomlLoaderConfig {
            key_path: Some("tools".into()),
            ..TomlLoaderConfig::default()
        },
    );
    (loader, registry)
}

#[test]
fn toml_definitions_resolve_annotated_functions() {
    let (loader, registry) = fresh_loader();
    let report = loader
        .toml()
        .load_str(DEFINITIONS, "inline")
        .expect("document loads");

    assert_eq!(report.registered(), ["trim", "empty"]);
    assert_eq!(report.skipped().len(), 1);
    assert_eq!(report.skipped()[0].name, "ghost");

    let trim = registry.lookup("strip_ws").expect("alias");
    assert_eq!(trim.metadata().name(), "trim");
    assert_eq!(trim.metadata().examples()[0].title(), "basic");
    assert_eq!(
        trim.call(&Arguments::new().arg("  a ")).expect("call"),
        json!("a")
    );
    assert_eq!(
        registry.lookup("empty").unwrap().metadata().kind(),
        ToolKind::Test
    );
}

#[test]
fn records_round_trip_through_toml() {
    let (loader, registry) = fresh_loader();
    loader
        .toml()
        .load_str(DEFINITIONS, "inline")
        .expect("document loads");

    let original = registry.lookup("trim").unwrap().metadata().clone();
    let tools = BTreeMap::from([(original.name().to_owned(), original.to_record())]);
    let document = BTreeMap::from([("tools", tools)]);
    let text = toml::to_string(&document).expect("document serializes");

    let (reloader, reloaded) = fresh_loader();
    reloader.toml().load_str(&text, "exported").expect("reloads");
    assert_eq!(reloaded.lookup("trim").unwrap().metadata(), &original);
}

#[test]
fn modules_load_once_and_unknown_sources_fail() {
    let (mut loader, registry) = fresh_loader();

    let report = loader.load("loading").expect("module loads");
    let mut registered = report.registered().to_vec();
    registered.sort();
    assert_eq!(registered, ["blank", "strip"]);
    assert!(registry.contains("strip"));

    let again = loader.load("loading").expect("no-op");
    assert!(again.registered().is_empty());

    let err = loader.load("nowhere").expect_err("no loader");
    assert!(matches!(err, LoaderError::NoLoader { .. }));
}

#[test]
fn files_and_directories_load_through_the_facade() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("text.toml"), DEFINITIONS).expect("write");

    let (mut loader, registry) = fresh_loader();
    let report = loader.load_many([dir.path().display().to_string(), "missing.toml".to_owned()]);

    assert_eq!(report.registered(), ["trim", "empty"]);
    let skipped: Vec<_> = report.skipped().iter().map(|item| item.name.as_str()).collect();
    assert_eq!(skipped, ["ghost", "missing.toml"]);
    assert_eq!(registry.len(), 3);
}
