//! Registrations submitted by `#[tool]` and flushed at runtime.

use toolreg_primitives::{Example, ToolKind};

use crate::error::ToolResult;
use crate::factory::ToolOptions;
use crate::function::Function;

/// Example declared inside a `#[tool]` attribute.
#[derive(Debug)]
pub struct PendingExample {
    /// Template snippet.
    pub template: &'static str,
    /// Title, possibly empty.
    pub title: &'static str,
    /// Optional description.
    pub description: Option<&'static str>,
    /// Whether the template renders as a fenced block.
    pub markdown: bool,
}

impl PendingExample {
    fn to_example(&self) -> Example {
        let mut builder = Example::builder(self.template)
            .title(self.title)
            .markdown(self.markdown);
        if let Some(description) = self.description {
            builder = builder.description(description);
        }
        builder.build()
    }
}

/// Registration request emitted by the `#[tool]` attribute.
///
/// Values are kept as written in the attribute; the kind literal is only
/// validated when the request is turned into [`ToolOptions`].
#[derive(Debug)]
pub struct PendingTool {
    /// Kind literal.
    pub kind: &'static str,
    /// Name override.
    pub name: Option<&'static str>,
    /// Group override.
    pub group: Option<&'static str>,
    /// Description override.
    pub description: Option<&'static str>,
    /// Icon identifier.
    pub icon: Option<&'static str>,
    /// Alias list.
    pub aliases: &'static [&'static str],
    /// Declared package requirements.
    pub required_packages: &'static [&'static str],
    /// Explicit examples; `None` keeps the ones inferred from doc comments.
    pub examples: Option<&'static [PendingExample]>,
    /// Returns the annotated function's handle.
    pub function: fn() -> Function,
}

inventory::collect!(PendingTool);

impl PendingTool {
    /// Iterates every pending tool linked into the binary.
    pub fn iter() -> impl Iterator<Item = &'static PendingTool> {
        inventory::iter::<PendingTool>.into_iter()
    }

    /// Returns the annotated function.
    #[must_use]
    pub fn function(&self) -> Function {
        (self.function)()
    }

    /// Converts the attribute values into registration options.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ToolError::Validation`] if the kind literal is unknown.
    pub fn options(&self) -> ToolResult<ToolOptions> {
        let kind = self.kind.parse::<ToolKind>()?;
        let mut options = ToolOptions::new(kind)
            .aliases(self.aliases.iter().copied())
            .required_packages(self.required_packages.iter().copied());

        if let Some(name) = self.name {
            options = options.name(name);
        }
        if let Some(group) = self.group {
            options = options.group(group);
        }
        if let Some(description) = self.description {
            options = options.description(description);
        }
        if let Some(icon) = self.icon {
            options = options.icon(icon);
        }
        if let Some(examples) = self.examples {
            options = options.examples(examples.iter().map(PendingExample::to_example).collect());
        }
        Ok(options)
    }
}
