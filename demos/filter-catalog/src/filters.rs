//! Text helpers exposed to templates.

use toolreg_core::tool;

/// Convert string to uppercase.
///
/// # Examples
///
/// ```jinja
/// {{ 'hello' | upper }}
/// ```
#[tool(kind = "filter", group = "text", aliases("u"))]
pub fn upper(value: &str) -> String {
    value.to_uppercase()
}

/// Turn text into a lowercase, dash-separated slug.
///
/// Runs of characters that are not ASCII alphanumeric collapse into a
/// single `separator`.
///
/// # Examples
///
/// ```jinja
/// {{ 'Hello, World!' | slugify }}
/// ```
///
/// ```jinja
/// {{ 'a b' | slugify(separator='_') }}
/// ```
#[tool(kind = "filter", group = "text", icon = "mdi:link-variant")]
pub fn slugify(value: &str, separator: Option<String>) -> String {
    let separator = separator.unwrap_or_else(|| "-".to_owned());
    value
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(&separator)
}

/// Truncate text to at most `length` characters, appending `end` when cut.
#[tool(
    kind = "filter",
    group = "text",
    example(template = "{{ 'abcdef' | truncate(3) }}", title = "short"),
    example(
        template = "{{ 'abcdef' | truncate(3, end='~') }}",
        title = "custom end",
        description = "Replaces the default ellipsis"
    )
)]
pub fn truncate(value: &str, length: usize, end: Option<String>) -> String {
    if value.chars().count() <= length {
        return value.to_owned();
    }
    let end = end.unwrap_or_else(|| "...".to_owned());
    value.chars().take(length).chain(end.chars()).collect()
}

/// Whether the value reads the same backwards.
///
/// Examples:
///     >>> palindrome('level')
///     True
#[tool(kind = "test", group = "text")]
pub fn palindrome(value: &str) -> bool {
    let chars: Vec<char> = value.chars().filter(|c| c.is_alphanumeric()).collect();
    chars.iter().eq(chars.iter().rev())
}

/// Split text into words.
#[tool(kind = "function", group = "text", required_packages("unicode"))]
pub fn words(text: &str, limit: Option<usize>) -> Vec<String> {
    text.split_whitespace()
        .take(limit.unwrap_or(usize::MAX))
        .map(ToOwned::to_owned)
        .collect()
}
