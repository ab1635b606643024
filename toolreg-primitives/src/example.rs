//! Usage examples attached to registered tools.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One usage example for a tool.
///
/// `template` holds the invocation snippet. When `markdown` is set the snippet
/// is meant to be rendered as a fenced code block rather than inline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ExampleFields")]
pub struct Example {
    template: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    markdown: bool,
}

impl Example {
    /// Creates an untitled, inline example.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self::builder(template).build()
    }

    /// Starts building an [`Example`].
    #[must_use]
    pub fn builder(template: impl Into<String>) -> ExampleBuilder {
        ExampleBuilder {
            template: template.into(),
            title: String::new(),
            description: None,
            markdown: false,
        }
    }

    /// Returns the template snippet.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the title, empty when unset.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether the template renders as a fenced block.
    #[must_use]
    pub const fn markdown(&self) -> bool {
        self.markdown
    }

    /// Returns a copy carrying `title`.
    #[must_use]
    pub fn retitled(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }
}

/// Builder for [`Example`].
#[derive(Debug)]
pub struct ExampleBuilder {
    template: String,
    title: String,
    description: Option<String>,
    markdown: bool,
}

impl ExampleBuilder {
    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets an optional description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the template as a fenced code block.
    #[must_use]
    pub fn markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    /// Consumes the builder and returns the example.
    #[must_use]
    pub fn build(self) -> Example {
        Example {
            template: self.template,
            title: self.title,
            description: self.description,
            markdown: self.markdown,
        }
    }
}

#[derive(Deserialize)]
struct ExampleFields {
    template: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    markdown: bool,
}

impl TryFrom<ExampleFields> for Example {
    type Error = ValidationError;

    fn try_from(fields: ExampleFields) -> Result<Self, Self::Error> {
        let template = fields.template.ok_or_else(|| ValidationError::InvalidExample {
            reason: "example template is required".into(),
        })?;
        Ok(Self {
            template,
            title: fields.title,
            description: fields.description,
            markdown: fields.markdown,
        })
    }
}
