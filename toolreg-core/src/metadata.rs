//! Validated metadata describing a registered tool.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolreg_primitives::{Example, Slug, ToolKind, ValidationError, ValidationResult};

use crate::error::{ToolError, ToolResult};
use crate::function::{Arguments, Function};
use crate::resolve::{Resolver, Symbol, SymbolTable};

/// Group assigned when none is given.
pub const DEFAULT_GROUP: &str = "general";

/// Metadata describing a registered filter, test, or function.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMetadata {
    name: Slug,
    #[serde(rename = "typ", alias = "type")]
    kind: ToolKind,
    import_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default = "default_group")]
    group: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    required_packages: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<Slug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
}

fn default_group() -> String {
    DEFAULT_GROUP.to_owned()
}

impl ToolMetadata {
    /// Starts building metadata from its required fields.
    #[must_use]
    pub fn builder(
        name: impl Into<String>,
        kind: ToolKind,
        import_path: impl Into<String>,
    ) -> ToolMetadataBuilder {
        ToolMetadataBuilder {
            name: name.into(),
            kind,
            import_path: import_path.into(),
            description: None,
            group: None,
            examples: Vec::new(),
            required_packages: BTreeSet::new(),
            aliases: Vec::new(),
            icon: None,
        }
    }

    /// Builds metadata from a persisted record stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name, kind, or any alias is invalid.
    pub fn from_record(name: impl Into<String>, record: ToolRecord) -> ValidationResult<Self> {
        let kind = record.kind.parse::<ToolKind>()?;
        let mut builder = Self::builder(name, kind, record.import_path)
            .examples(record.examples.into_values().collect())
            .required_packages(record.required_packages)
            .aliases(record.aliases);
        if let Some(description) = record.description {
            builder = builder.description(description);
        }
        if let Some(group) = record.group {
            builder = builder.group(group);
        }
        if let Some(icon) = record.icon {
            builder = builder.icon(icon);
        }
        builder.build()
    }

    /// Exports the persisted record shape; the name becomes the table key.
    ///
    /// Examples are keyed by title, or `example_<n>` when untitled; a key
    /// already taken gets a `_2`, `_3`, ... suffix.
    #[must_use]
    pub fn to_record(&self) -> ToolRecord {
        let mut examples = IndexMap::new();
        for (idx, example) in self.examples.iter().enumerate() {
            let base = if example.title().is_empty() {
                format!("example_{}", idx + 1)
            } else {
                example.title().to_owned()
            };
            let mut key = base.clone();
            let mut suffix = 2;
            while examples.contains_key(&key) {
                key = format!("{base}_{suffix}");
                suffix += 1;
            }
            examples.insert(key, example.clone());
        }

        ToolRecord {
            kind: self.kind.as_str().to_owned(),
            import_path: self.import_path.clone(),
            group: Some(self.group.clone()),
            description: self.description.clone(),
            icon: self.icon.clone(),
            aliases: self.aliases.iter().map(ToString::to_string).collect(),
            required_packages: self.required_packages.iter().cloned().collect(),
            examples,
        }
    }

    /// Registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Tool kind.
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Dotted path the callable resolves from.
    #[must_use]
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Group or category.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Usage examples in order.
    #[must_use]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Declared package requirements.
    #[must_use]
    pub fn required_packages(&self) -> &BTreeSet<String> {
        &self.required_packages
    }

    /// Alternative registry keys.
    #[must_use]
    pub fn aliases(&self) -> &[Slug] {
        &self.aliases
    }

    /// Optional icon identifier.
    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Resolves the callable through the process-wide symbol table.
    ///
    /// # Errors
    ///
    /// See [`ToolMetadata::resolve_with`].
    pub fn resolve(&self) -> ToolResult<Function> {
        self.resolve_with(SymbolTable::global().as_ref())
    }

    /// Resolves the callable through `resolver`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Resolution`] if the import path is unknown and
    /// [`ToolError::NotCallable`] if it names a plain value.
    pub fn resolve_with(&self, resolver: &dyn Resolver) -> ToolResult<Function> {
        match resolver.resolve(&self.import_path)? {
            Symbol::Function(function) => Ok(function),
            Symbol::Value(_) => Err(ToolError::NotCallable {
                path: self.import_path.clone(),
            }),
        }
    }

    /// Resolves and invokes the callable through the process-wide symbol table.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors and, unchanged, any error from the callable.
    pub fn apply(&self, args: &Arguments) -> ToolResult<Value> {
        self.apply_with(SymbolTable::global().as_ref(), args)
    }

    /// Resolves the callable through `resolver` and invokes it.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors and, unchanged, any error from the callable.
    pub fn apply_with(&self, resolver: &dyn Resolver, args: &Arguments) -> ToolResult<Value> {
        self.resolve_with(resolver)?.call(args)
    }
}

/// Builder for [`ToolMetadata`]; validation happens in [`ToolMetadataBuilder::build`].
#[derive(Debug)]
pub struct ToolMetadataBuilder {
    name: String,
    kind: ToolKind,
    import_path: String,
    description: Option<String>,
    group: Option<String>,
    examples: Vec<Example>,
    required_packages: BTreeSet<String>,
    aliases: Vec<String>,
    icon: Option<String>,
}

impl ToolMetadataBuilder {
    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Replaces the example list.
    #[must_use]
    pub fn examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    /// Replaces the required package set.
    #[must_use]
    pub fn required_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the alias list.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the icon identifier.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Validates the fields and returns the metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidSlug`] for a bad name or alias and
    /// [`ValidationError::InvalidField`] for an empty import path.
    pub fn build(self) -> ValidationResult<ToolMetadata> {
        let name = Slug::new(self.name)?;
        let aliases = self
            .aliases
            .into_iter()
            .map(Slug::new)
            .collect::<ValidationResult<Vec<_>>>()?;

        if self.import_path.trim().is_empty() {
            return Err(ValidationError::field(
                "import_path",
                "import path cannot be empty",
            ));
        }

        Ok(ToolMetadata {
            name,
            kind: self.kind,
            import_path: self.import_path,
            description: self.description,
            group: self.group.unwrap_or_else(default_group),
            examples: self.examples,
            required_packages: self.required_packages,
            aliases,
            icon: self.icon,
        })
    }
}

/// Persisted shape of one tool, keyed by tool name in the enclosing table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    /// Kind literal; validated when converted into [`ToolMetadata`].
    #[serde(rename = "typ", alias = "type")]
    pub kind: String,
    /// Dotted path of the callable.
    pub import_path: String,
    /// Group or category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Description text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Alternative registry keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    /// Declared package requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_packages: Vec<String>,
    /// Examples keyed by example name.
    ///
    /// When read, an example without a `title` field takes its key as title.
    /// Titles are always written, so untitled examples stay untitled.
    #[serde(
        default,
        skip_serializing_if = "IndexMap::is_empty",
        with = "record_examples"
    )]
    pub examples: IndexMap<String, Example>,
}

mod record_examples {
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use toolreg_primitives::Example;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        template: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default)]
        markdown: bool,
    }

    pub(super) fn serialize<S>(
        examples: &IndexMap<String, Example>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: IndexMap<&str, Entry> = examples
            .iter()
            .map(|(key, example)| {
                let entry = Entry {
                    template: example.template().to_owned(),
                    title: Some(example.title().to_owned()),
                    description: example.description().map(ToOwned::to_owned),
                    markdown: example.markdown(),
                };
                (key.as_str(), entry)
            })
            .collect();
        entries.serialize(serializer)
    }

    pub(super) fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<IndexMap<String, Example>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = IndexMap::<String, Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|(key, entry)| {
                let mut builder = Example::builder(entry.template)
                    .title(entry.title.unwrap_or_else(|| key.clone()))
                    .markdown(entry.markdown);
                if let Some(description) = entry.description {
                    builder = builder.description(description);
                }
                (key, builder.build())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn upper_metadata() -> ToolMetadata {
        ToolMetadata::builder("upper", ToolKind::Filter, "demo.text.upper")
            .group("text")
            .aliases(["u"])
            .build()
            .expect("metadata")
    }

    #[test]
    fn builder_applies_defaults() {
        let metadata = ToolMetadata::builder("Valid_Name1", ToolKind::Test, "demo.valid")
            .build()
            .expect("metadata");

        assert_eq!(metadata.name(), "valid_name1");
        assert_eq!(metadata.group(), DEFAULT_GROUP);
        assert!(metadata.examples().is_empty());
        assert!(metadata.aliases().is_empty());
        assert_eq!(metadata.icon(), None);
    }

    #[test]
    fn rejects_bad_name_and_alias() {
        let err = ToolMetadata::builder("Has Space", ToolKind::Filter, "demo.x")
            .build()
            .expect_err("bad name");
        assert!(matches!(err, ValidationError::InvalidSlug { .. }));

        let err = ToolMetadata::builder("fine", ToolKind::Filter, "demo.x")
            .aliases(["bad-alias"])
            .build()
            .expect_err("bad alias");
        assert!(matches!(err, ValidationError::InvalidSlug { value, .. } if value == "bad-alias"));
    }

    #[test]
    fn rejects_empty_import_path() {
        let err = ToolMetadata::builder("fine", ToolKind::Filter, "  ")
            .build()
            .expect_err("empty path");
        assert!(matches!(err, ValidationError::InvalidField { field: "import_path", .. }));
    }

    #[test]
    fn record_accepts_type_alias_and_titles_examples() {
        let record: ToolRecord = serde_json::from_value(json!({
            "type": "filter",
            "import_path": "demo.text.upper",
            "examples": {
                "basic": { "template": "{{ 'hi' | upper }}" },
                "shout": { "template": "{{ 'x' | upper }}", "title": "Shouting" }
            }
        }))
        .expect("record");

        let metadata = ToolMetadata::from_record("upper", record).expect("metadata");
        assert_eq!(metadata.kind(), ToolKind::Filter);
        assert_eq!(metadata.examples()[0].title(), "basic");
        assert_eq!(metadata.examples()[1].title(), "Shouting");
    }

    #[test]
    fn record_with_unknown_kind_fails_validation() {
        let record = ToolRecord {
            kind: "macro".into(),
            import_path: "demo.x".into(),
            ..ToolRecord::default()
        };
        let err = ToolMetadata::from_record("x", record).expect_err("unknown kind");
        assert!(matches!(err, ValidationError::UnknownKind { .. }));
    }

    #[test]
    fn record_round_trips_through_metadata() {
        let metadata = upper_metadata();
        let rebuilt =
            ToolMetadata::from_record(metadata.name(), metadata.to_record()).expect("metadata");
        assert_eq!(rebuilt, metadata);
    }

    #[test]
    fn record_keeps_duplicate_and_untitled_examples() {
        let metadata = ToolMetadata::builder("upper", ToolKind::Filter, "demo.text.upper")
            .examples(vec![
                Example::builder("{{ 'a' | upper }}").title("basic").build(),
                Example::builder("{{ 'b' | upper }}").title("basic").build(),
                Example::new("{{ 'c' | upper }}"),
            ])
            .build()
            .expect("metadata");

        let record = metadata.to_record();
        let keys: Vec<_> = record.examples.keys().map(String::as_str).collect();
        assert_eq!(keys, ["basic", "basic_2", "example_3"]);

        let exported = serde_json::to_value(&record).expect("serialize");
        let reread: ToolRecord = serde_json::from_value(exported).expect("deserialize");
        let rebuilt = ToolMetadata::from_record("upper", reread).expect("metadata");
        assert_eq!(rebuilt, metadata);
        let titles: Vec<_> = rebuilt.examples().iter().map(Example::title).collect();
        assert_eq!(titles, ["basic", "basic", ""]);
    }

    #[test]
    fn resolves_through_injected_table() {
        let table = SymbolTable::new();
        table.insert_value("demo.text.upper", json!("not a function"));

        let err = upper_metadata().resolve_with(&table).expect_err("value");
        assert!(matches!(err, ToolError::NotCallable { .. }));

        let err = ToolMetadata::builder("lower", ToolKind::Filter, "demo.text.lower")
            .build()
            .expect("metadata")
            .resolve_with(&table)
            .expect_err("missing");
        assert!(matches!(err, ToolError::Resolution { .. }));
    }

    #[test]
    fn apply_propagates_callable_errors() {
        let table = SymbolTable::new();
        table.insert_function(
            "demo.text.upper",
            Function::new("upper", |_: &Arguments| Err(ToolError::execution("boom"))),
        );

        let err = upper_metadata()
            .apply_with(&table, &Arguments::new().arg("hi"))
            .expect_err("callable error");
        assert!(matches!(err, ToolError::Execution { reason } if reason == "boom"));
    }
}
