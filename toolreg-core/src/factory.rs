//! Builds [`ToolMetadata`] from a live function plus caller overrides.
//!
//! Every field follows the same precedence: an explicit option wins, then
//! whatever the doc comment yields, then the hard default. Lists are never
//! merged; explicit examples replace the inferred ones wholesale.

use std::sync::Arc;

use toolreg_primitives::{Example, ToolKind};
use tracing::debug;

use crate::docstring::{self, Dialect, DocSection, SectionParser, StandardSectionParser};
use crate::error::{ToolError, ToolResult};
use crate::function::Function;
use crate::metadata::ToolMetadata;

/// Registration overrides. Only the kind is required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOptions {
    kind: ToolKind,
    name: Option<String>,
    group: Option<String>,
    description: Option<String>,
    examples: Option<Vec<Example>>,
    required_packages: Option<Vec<String>>,
    aliases: Option<Vec<String>>,
    icon: Option<String>,
    dialect: Option<Dialect>,
}

impl ToolOptions {
    /// Creates options for `kind` with nothing overridden.
    #[must_use]
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            name: None,
            group: None,
            description: None,
            examples: None,
            required_packages: None,
            aliases: None,
            icon: None,
            dialect: None,
        }
    }

    /// Shorthand for `ToolOptions::new(ToolKind::Filter)`.
    #[must_use]
    pub fn filter() -> Self {
        Self::new(ToolKind::Filter)
    }

    /// Shorthand for `ToolOptions::new(ToolKind::Test)`.
    #[must_use]
    pub fn test() -> Self {
        Self::new(ToolKind::Test)
    }

    /// Shorthand for `ToolOptions::new(ToolKind::Function)`.
    #[must_use]
    pub fn function() -> Self {
        Self::new(ToolKind::Function)
    }

    /// Overrides the registry name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Overrides the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the inferred examples; an empty list clears them.
    #[must_use]
    pub fn examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = Some(examples);
        self
    }

    /// Sets the declared package requirements.
    #[must_use]
    pub fn required_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_packages = Some(packages.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the aliases.
    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(aliases.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the icon identifier.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Declares the doc comment dialect instead of detecting it.
    #[must_use]
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// The requested kind.
    #[must_use]
    pub const fn kind(&self) -> ToolKind {
        self.kind
    }
}

/// What the factory learned from a function before applying overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inspection {
    /// Dotted import path of the innermost function.
    pub import_path: String,
    /// Dialect used to parse the doc comment.
    pub dialect: Dialect,
    /// First free-text section, trimmed.
    pub description: Option<String>,
    /// Examples found in the doc comment.
    pub examples: Vec<Example>,
}

/// Returns the dotted import path of `function`, unwinding wrappers first.
///
/// Rust module separators (`::`) become dots and the qualname, when present,
/// replaces the plain name.
///
/// # Errors
///
/// Returns [`ToolError::PathResolution`] if the innermost function has no
/// known module.
pub fn import_path(function: &Function) -> ToolResult<String> {
    let original = function.innermost();
    let module = original
        .module()
        .filter(|module| !module.trim().is_empty())
        .ok_or_else(|| ToolError::PathResolution {
            function: original.name().to_owned(),
        })?;
    let local = original.qualname().unwrap_or_else(|| original.name());
    Ok(format!(
        "{}.{}",
        module.replace("::", "."),
        local.replace("::", ".")
    ))
}

/// Builds tool metadata from functions.
#[derive(Clone)]
pub struct MetadataFactory {
    parser: Arc<dyn SectionParser>,
}

impl Default for MetadataFactory {
    fn default() -> Self {
        Self::new(Arc::new(StandardSectionParser))
    }
}

impl std::fmt::Debug for MetadataFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataFactory").finish_non_exhaustive()
    }
}

impl MetadataFactory {
    /// Creates a factory using `parser` for doc comment sections.
    #[must_use]
    pub fn new(parser: Arc<dyn SectionParser>) -> Self {
        Self { parser }
    }

    /// Extracts the import path, description, and examples of `function`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::PathResolution`] if no import path can be built.
    pub fn inspect(&self, function: &Function, dialect: Option<Dialect>) -> ToolResult<Inspection> {
        let import_path = import_path(function)?;
        let doc = function.doc().unwrap_or_default();
        let dialect = dialect.unwrap_or_else(|| docstring::detect_dialect(doc));
        debug!(function = function.name(), %dialect, "parsing doc comment");

        let sections = self.parser.parse(doc, dialect);

        let description = sections.iter().find_map(|section| match section {
            DocSection::Text(text) => Some(text.trim().to_owned()),
            _ => None,
        });

        let snippets: Vec<_> = sections
            .iter()
            .filter_map(|section| match section {
                DocSection::Examples(snippets) => Some(snippets),
                _ => None,
            })
            .flatten()
            .collect();

        let single = snippets.len() == 1;
        let examples = snippets
            .into_iter()
            .enumerate()
            .map(|(idx, snippet)| {
                let title = if single {
                    "basic".to_owned()
                } else {
                    format!("example_{}", idx + 1)
                };
                Example::builder(snippet.text.clone())
                    .title(title)
                    .markdown(snippet.fenced)
                    .build()
            })
            .collect();

        Ok(Inspection {
            import_path,
            dialect,
            description: description.filter(|text| !text.is_empty()),
            examples,
        })
    }

    /// Builds metadata for `function`, merging `options` over inferred values.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::PathResolution`] if no import path can be built and
    /// [`ToolError::Validation`] if the merged fields are invalid.
    pub fn build(&self, function: &Function, options: &ToolOptions) -> ToolResult<ToolMetadata> {
        let inspection = self.inspect(function, options.dialect)?;

        let name = options
            .name
            .clone()
            .unwrap_or_else(|| function.name().to_owned());
        let examples = options.examples.clone().unwrap_or(inspection.examples);

        let mut builder = ToolMetadata::builder(name, options.kind, inspection.import_path)
            .examples(examples)
            .required_packages(options.required_packages.clone().unwrap_or_default())
            .aliases(options.aliases.clone().unwrap_or_default());

        if let Some(description) = options.description.clone().or(inspection.description) {
            builder = builder.description(description);
        }
        if let Some(group) = &options.group {
            builder = builder.group(group.clone());
        }
        if let Some(icon) = &options.icon {
            builder = builder.icon(icon.clone());
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::Value;
    use toolreg_primitives::ValidationError;

    use crate::function::Arguments;
    use crate::metadata::DEFAULT_GROUP;

    const UPPER_DOC: &str = "Convert string to uppercase.

Examples:
    >>> upper('hi')
    'HI'
";

    fn upper() -> Function {
        Function::builder("upper", |_: &Arguments| Ok(Value::Null))
            .module("demo::text")
            .doc(UPPER_DOC)
            .build()
    }

    #[test]
    fn import_path_unwinds_every_wrapper() {
        let inner = upper();
        let outer = Function::builder("decorated", |_: &Arguments| Ok(Value::Null))
            .wrapping(Function::builder("middle", |_: &Arguments| Ok(Value::Null))
                .wrapping(inner)
                .build())
            .build();

        assert_eq!(import_path(&outer).expect("path"), "demo.text.upper");
    }

    #[test]
    fn qualname_replaces_name_in_path() {
        let function = Function::builder("shout", |_: &Arguments| Ok(Value::Null))
            .module("demo::text")
            .qualname("Casing::shout")
            .build();
        assert_eq!(import_path(&function).expect("path"), "demo.text.Casing.shout");
    }

    #[test]
    fn anonymous_functions_have_no_path() {
        let function = Function::new("closure", |_: &Arguments| Ok(Value::Null));
        let err = MetadataFactory::default()
            .build(&function, &ToolOptions::filter())
            .expect_err("no module");
        assert!(matches!(err, ToolError::PathResolution { function } if function == "closure"));
    }

    #[test]
    fn infers_description_and_single_basic_example() {
        let metadata = MetadataFactory::default()
            .build(&upper(), &ToolOptions::filter().group("text"))
            .expect("metadata");

        assert_eq!(metadata.name(), "upper");
        assert_eq!(metadata.group(), "text");
        assert_eq!(metadata.import_path(), "demo.text.upper");
        assert_eq!(metadata.description(), Some("Convert string to uppercase."));
        assert_eq!(metadata.examples().len(), 1);
        assert_eq!(metadata.examples()[0].title(), "basic");
        assert_eq!(metadata.examples()[0].template(), ">>> upper('hi')\n'HI'");
    }

    #[test]
    fn numbers_multiple_examples_in_source_order() {
        let function = Function::builder("add", |_: &Arguments| Ok(Value::Null))
            .module("demo::math")
            .doc("Add.\n\nExamples:\n    >>> add(1, 2)\n\n    >>> add(3, 4)\n")
            .build();
        let metadata = MetadataFactory::default()
            .build(&function, &ToolOptions::function())
            .expect("metadata");

        let titles: Vec<_> = metadata.examples().iter().map(Example::title).collect();
        assert_eq!(titles, ["example_1", "example_2"]);
        assert_eq!(metadata.examples()[1].template(), ">>> add(3, 4)");
    }

    #[test]
    fn explicit_values_win_and_lists_are_not_merged() {
        let factory = MetadataFactory::default();

        let described = factory
            .build(&upper(), &ToolOptions::filter().description("D2"))
            .expect("metadata");
        assert_eq!(described.description(), Some("D2"));
        assert_eq!(described.examples().len(), 1);

        let cleared = factory
            .build(&upper(), &ToolOptions::filter().examples(Vec::new()))
            .expect("metadata");
        assert!(cleared.examples().is_empty());

        let replaced = factory
            .build(
                &upper(),
                &ToolOptions::filter().examples(vec![Example::new("{{ 'a' | upper }}")]),
            )
            .expect("metadata");
        assert_eq!(replaced.examples(), [Example::new("{{ 'a' | upper }}")]);
    }

    #[test]
    fn defaults_apply_without_doc_or_overrides() {
        let function = Function::builder("noop", |_: &Arguments| Ok(Value::Null))
            .module("demo")
            .build();
        let metadata = MetadataFactory::default()
            .build(&function, &ToolOptions::test())
            .expect("metadata");

        assert_eq!(metadata.description(), None);
        assert_eq!(metadata.group(), DEFAULT_GROUP);
        assert!(metadata.examples().is_empty());
        assert!(metadata.required_packages().is_empty());
        assert_eq!(metadata.icon(), None);
    }

    #[test]
    fn invalid_alias_surfaces_validation_error() {
        let err = MetadataFactory::default()
            .build(&upper(), &ToolOptions::filter().aliases(["bad-alias"]))
            .expect_err("bad alias");
        assert!(matches!(
            err,
            ToolError::Validation(ValidationError::InvalidSlug { .. })
        ));
    }

    #[test]
    fn declared_dialect_skips_detection() {
        let inspection = MetadataFactory::default()
            .inspect(&upper(), Some(Dialect::Plain))
            .expect("inspection");
        assert_eq!(inspection.dialect, Dialect::Plain);
        assert!(inspection.examples.is_empty());
        assert_eq!(inspection.description.as_deref(), Some(UPPER_DOC.trim()));
    }
}
