//! Docstring dialect detection and section extraction.
//!
//! Only the split the registry needs is performed: leading free text,
//! example blocks, and everything else as opaque named sections.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use toolreg_primitives::ValidationError;

/// Documentation convention a docstring is written in.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `Args:` / `Examples:` headers.
    Google,
    /// Headers underlined with dashes.
    Numpy,
    /// `:param x:` field lists.
    Sphinx,
    /// reStructuredText directives.
    Rst,
    /// Markdown headings, as written in rustdoc comments.
    Markdown,
    /// No recognised structure; the whole text is a description.
    Plain,
}

impl Dialect {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Numpy => "numpy",
            Self::Sphinx => "sphinx",
            Self::Rst => "rst",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "numpy" => Ok(Self::Numpy),
            "sphinx" => Ok(Self::Sphinx),
            "rst" => Ok(Self::Rst),
            "markdown" => Ok(Self::Markdown),
            "plain" => Ok(Self::Plain),
            other => Err(ValidationError::field(
                "dialect",
                format!("unknown docstring dialect `{other}`"),
            )),
        }
    }
}

// Evaluated top to bottom; reordering changes how ambiguous text classifies.
static DIALECT_RULES: Lazy<Vec<(Dialect, Vec<Regex>)>> = Lazy::new(|| {
    let compile = |patterns: &[&str]| {
        patterns
            .iter()
            .map(|p| Regex::new(p).expect("dialect pattern is valid"))
            .collect::<Vec<_>>()
    };
    vec![
        (
            Dialect::Google,
            compile(&[
                r"(?m)^\s*(Args|Arguments|Returns|Raises|Yields|Examples?):\s*$",
            ]),
        ),
        (
            Dialect::Numpy,
            compile(&[r"(?m)^\s*(Parameters|Returns|Raises|Examples?)\s*\n\s*-{3,}\s*$"]),
        ),
        (
            Dialect::Sphinx,
            compile(&[r":param\s+\w+:", r":returns?:", r":raises?\s+\w+:"]),
        ),
        (
            Dialect::Rst,
            compile(&[r"\.\.\s+[\w-]+::", r"(?m)^\s*\.\.\s+note::", r"(?m)^\s*\.\.\s+warning::"]),
        ),
        (Dialect::Markdown, compile(&[r"(?m)^#{1,6}\s+\w"])),
    ]
});

/// Detects the dialect of `docstring`, falling back to [`Dialect::Plain`].
#[must_use]
pub fn detect_dialect(docstring: &str) -> Dialect {
    let cleaned = docstring.trim();
    if cleaned.is_empty() {
        return Dialect::Plain;
    }

    DIALECT_RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(cleaned)))
        .map_or(Dialect::Plain, |(dialect, _)| *dialect)
}

/// One example block taken from an examples section.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExampleSnippet {
    /// Snippet text with fences removed.
    pub text: String,
    /// Whether the snippet was written as a fenced code block.
    pub fenced: bool,
}

/// A typed section of a parsed docstring.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DocSection {
    /// Free text.
    Text(String),
    /// Usage examples, in source order.
    Examples(Vec<ExampleSnippet>),
    /// Any other section (parameters, returns, notes, ...).
    Other {
        /// Section title as written.
        title: String,
        /// Section body, dedented.
        body: String,
    },
}

/// Splits docstrings into typed sections.
pub trait SectionParser: Send + Sync {
    /// Parses `text` written in `dialect` into ordered sections.
    fn parse(&self, text: &str, dialect: Dialect) -> Vec<DocSection>;
}

/// Built-in extractor covering every [`Dialect`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSectionParser;

impl SectionParser for StandardSectionParser {
    fn parse(&self, text: &str, dialect: Dialect) -> Vec<DocSection> {
        let text = clean(text);
        if text.is_empty() {
            return Vec::new();
        }
        if dialect == Dialect::Plain {
            return vec![DocSection::Text(text)];
        }

        let lines: Vec<&str> = text.lines().collect();
        let mut sections = Vec::new();
        let mut lead = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;
        let mut in_fence = false;
        let mut idx = 0;

        while idx < lines.len() {
            if lines[idx].trim_start().starts_with("```") {
                in_fence = !in_fence;
            } else if !in_fence {
                if let Some((title, consumed)) = header_at(&lines, idx, dialect) {
                    if let Some((prev_title, body)) = current.take() {
                        sections.push(finish_section(prev_title, &body));
                    }
                    current = Some((title, Vec::new()));
                    idx += consumed;
                    continue;
                }
            }

            match current.as_mut() {
                Some((_, body)) => body.push(lines[idx]),
                None => lead.push(lines[idx]),
            }
            idx += 1;
        }

        if let Some((title, body)) = current {
            sections.push(finish_section(title, &body));
        }

        let lead = lead.join("\n").trim().to_owned();
        if !lead.is_empty() {
            sections.insert(0, DocSection::Text(lead));
        }
        sections
    }
}

static GOOGLE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Za-z ]*):\s*$").expect("google header pattern is valid"));
static NUMPY_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("numpy rule pattern is valid"));
static SPHINX_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^:([A-Za-z]+)(\s+[^:]+)?:").expect("sphinx field pattern is valid")
});
static RST_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.\.\s+([\w-]+)::\s*(.*)$").expect("rst directive pattern is valid")
});
static RST_LITERAL_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Examples?)::\s*$").expect("rst literal pattern is valid"));
static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+?)\s*#*\s*$").expect("markdown heading pattern is valid"));

/// Returns the section title starting at `idx` and the number of lines the
/// header occupies.
fn header_at(lines: &[&str], idx: usize, dialect: Dialect) -> Option<(String, usize)> {
    let line = lines[idx];
    match dialect {
        Dialect::Google => GOOGLE_HEADER
            .captures(line)
            .map(|caps| (caps[1].to_owned(), 1)),
        Dialect::Numpy => {
            let next = lines.get(idx + 1)?;
            let title = line.trim();
            (!title.is_empty() && !line.starts_with(' ') && NUMPY_RULE.is_match(next))
                .then(|| (title.to_owned(), 2))
        }
        Dialect::Sphinx | Dialect::Rst => {
            if let Some(caps) = RST_DIRECTIVE.captures(line) {
                let directive = &caps[1];
                let argument = caps[2].trim();
                let title = match directive {
                    "code-block" | "code" | "doctest" => "Examples".to_owned(),
                    "rubric" if !argument.is_empty() => argument.to_owned(),
                    other => other.to_owned(),
                };
                return Some((title, 1));
            }
            if let Some(caps) = RST_LITERAL_HEADER.captures(line) {
                return Some((caps[1].to_owned(), 1));
            }
            if dialect == Dialect::Sphinx {
                return SPHINX_FIELD
                    .captures(line)
                    .map(|caps| (caps[1].to_owned(), 1));
            }
            None
        }
        Dialect::Markdown => MARKDOWN_HEADING
            .captures(line)
            .map(|caps| (caps[1].to_owned(), 1)),
        Dialect::Plain => None,
    }
}

fn finish_section(title: String, body: &[&str]) -> DocSection {
    let body = dedent(body);
    let lowered = title.to_ascii_lowercase();
    if lowered == "example" || lowered == "examples" {
        DocSection::Examples(split_examples(&body))
    } else {
        DocSection::Other {
            title,
            body: body.trim().to_owned(),
        }
    }
}

/// Splits an examples body into blank-line separated blocks; fenced blocks
/// are kept whole and unwrapped.
fn split_examples(body: &str) -> Vec<ExampleSnippet> {
    let mut snippets = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut fence: Option<Vec<&str>> = None;

    let flush = |block: &mut Vec<&str>, snippets: &mut Vec<ExampleSnippet>| {
        let text = dedent(block).trim().to_owned();
        if !text.is_empty() {
            snippets.push(ExampleSnippet {
                text,
                fenced: false,
            });
        }
        block.clear();
    };

    for line in body.lines() {
        let trimmed = line.trim_start();
        if let Some(inner) = fence.as_mut() {
            if trimmed.starts_with("```") {
                let text = dedent(inner).trim().to_owned();
                if !text.is_empty() {
                    snippets.push(ExampleSnippet { text, fenced: true });
                }
                fence = None;
            } else {
                inner.push(line);
            }
            continue;
        }

        if trimmed.starts_with("```") {
            flush(&mut block, &mut snippets);
            fence = Some(Vec::new());
        } else if trimmed.is_empty() {
            flush(&mut block, &mut snippets);
        } else {
            block.push(line);
        }
    }

    // unterminated fence: keep whatever was collected
    if let Some(inner) = fence {
        let text = dedent(&inner).trim().to_owned();
        if !text.is_empty() {
            snippets.push(ExampleSnippet { text, fenced: true });
        }
    }
    flush(&mut block, &mut snippets);
    snippets
}

/// Normalises raw documentation: the first line is trimmed, the rest are
/// dedented, and surrounding blank lines are dropped.
#[must_use]
pub fn clean(doc: &str) -> String {
    let mut lines = doc.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let rest = dedent(&rest);

    let joined = if rest.is_empty() {
        first.to_owned()
    } else {
        format!("{first}\n{rest}")
    };
    joined.trim_matches('\n').trim().to_owned()
}

fn dedent(lines: &[&str]) -> String {
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or_else(|| line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE: &str = "Convert string to uppercase.

Args:
    value: Input string

Examples:
    >>> upper('hello')
    'HELLO'

    >>> upper('Hello World')
    'HELLO WORLD'
";

    #[test]
    fn detects_dialects_in_priority_order() {
        assert_eq!(detect_dialect(GOOGLE), Dialect::Google);
        assert_eq!(
            detect_dialect("Sum.\n\nParameters\n----------\nx : int\n"),
            Dialect::Numpy
        );
        assert_eq!(detect_dialect("Sum.\n\n:param x: first\n"), Dialect::Sphinx);
        assert_eq!(detect_dialect("Sum.\n\n.. note:: careful\n"), Dialect::Rst);
        assert_eq!(detect_dialect("Sum.\n\n# Examples\n"), Dialect::Markdown);
        assert_eq!(detect_dialect("Just some words."), Dialect::Plain);
        assert_eq!(detect_dialect("   "), Dialect::Plain);
    }

    #[test]
    fn google_wins_over_sphinx_markers() {
        let doc = "Mixed.\n\nArgs:\n    x: value\n\n:param x: value\n";
        assert_eq!(detect_dialect(doc), Dialect::Google);
    }

    #[test]
    fn earlier_dialects_win_when_markers_mix() {
        let cases = [
            (
                "Mixed.\n\nParameters\n----------\nx : int\n\n:param x: value\n",
                Dialect::Numpy,
            ),
            ("Mixed.\n\n:param x: value\n\n.. note:: careful\n", Dialect::Sphinx),
            ("Mixed.\n\n.. note:: careful\n\n# Heading\n", Dialect::Rst),
        ];
        for (doc, expected) in cases {
            assert_eq!(detect_dialect(doc), expected, "{doc:?}");
        }
    }

    #[test]
    fn parses_google_sections() {
        let sections = StandardSectionParser.parse(GOOGLE, Dialect::Google);
        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections[0],
            DocSection::Text("Convert string to uppercase.".into())
        );
        assert!(matches!(&sections[1], DocSection::Other { title, .. } if title == "Args"));
        let DocSection::Examples(examples) = &sections[2] else {
            panic!("expected examples section");
        };
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].text, ">>> upper('hello')\n'HELLO'");
        assert!(!examples[0].fenced);
    }

    #[test]
    fn parses_markdown_fenced_examples() {
        let doc = "Joins items.\n\n# Examples\n\n```jinja\n{{ [1, 2] | join }}\n\n{{ x }}\n```\n";
        let sections = StandardSectionParser.parse(doc, detect_dialect(doc));
        let DocSection::Examples(examples) = &sections[1] else {
            panic!("expected examples section");
        };
        assert_eq!(examples.len(), 1);
        assert!(examples[0].fenced);
        assert_eq!(examples[0].text, "{{ [1, 2] | join }}\n\n{{ x }}");
    }

    #[test]
    fn parses_numpy_examples() {
        let doc = "Adds.\n\nExamples\n--------\n>>> add(1, 2)\n3\n";
        let sections = StandardSectionParser.parse(doc, Dialect::Numpy);
        assert_eq!(sections[0], DocSection::Text("Adds.".into()));
        assert!(matches!(&sections[1], DocSection::Examples(e) if e.len() == 1));
    }

    #[test]
    fn parses_rst_code_blocks_as_examples() {
        let doc = "Adds.\n\n.. code-block:: jinja\n\n    {{ 1 | add(2) }}\n";
        let sections = StandardSectionParser.parse(doc, Dialect::Rst);
        let DocSection::Examples(examples) = &sections[1] else {
            panic!("expected examples section");
        };
        assert_eq!(examples[0].text, "{{ 1 | add(2) }}");
    }

    #[test]
    fn plain_is_one_text_block() {
        let sections = StandardSectionParser.parse("  One.\n\n  Two.", Dialect::Plain);
        assert_eq!(sections, vec![DocSection::Text("One.\n\nTwo.".into())]);
    }

    #[test]
    fn clean_dedents_continuation_lines() {
        assert_eq!(clean("First.\n    more\n      nested\n"), "First.\nmore\n  nested");
        assert_eq!(clean(""), "");
    }
}
