//! Outcome of a load: registered names and skipped items.

use crate::error::LoaderError;

/// An item a loader gave up on while continuing with the rest.
#[derive(Debug)]
pub struct SkippedTool {
    /// Tool name, or the source name when a whole source failed.
    pub name: String,
    /// Why the item was skipped.
    pub error: LoaderError,
}

/// Outcome of a load: registered tool names and skipped items, in order.
#[derive(Debug, Default)]
pub struct LoadReport {
    registered: Vec<String>,
    skipped: Vec<SkippedTool>,
}

impl LoadReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a registered tool.
    pub fn record_registered(&mut self, name: impl Into<String>) {
        self.registered.push(name.into());
    }

    /// Records a skipped item.
    pub fn record_skipped(&mut self, name: impl Into<String>, error: LoaderError) {
        self.skipped.push(SkippedTool {
            name: name.into(),
            error,
        });
    }

    /// Appends everything from `other`.
    pub fn merge(&mut self, other: LoadReport) {
        self.registered.extend(other.registered);
        self.skipped.extend(other.skipped);
    }

    /// Names registered, in load order.
    #[must_use]
    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    /// Items skipped, in load order.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedTool] {
        &self.skipped
    }

    /// Whether nothing was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
