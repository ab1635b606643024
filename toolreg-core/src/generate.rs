//! Synthesises template usage examples from a tool's captured signature.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use toolreg_primitives::ToolKind;

use crate::error::{ToolError, ToolResult};
use crate::function::{Function, Param, Signature};
use crate::metadata::ToolMetadata;
use crate::registry::RegisteredTool;
use crate::resolve::Resolver;

const SAMPLE_TEXT: &str = "Hello, World!";
const SAMPLE_INT: i64 = 42;
#[allow(clippy::approx_constant)]
const SAMPLE_FLOAT: f64 = 3.14159;
const UNTYPED: &str = "example_text";

const INTEGERS: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
];
const SEQUENCES: &[&str] = &["Vec", "VecDeque", "HashSet", "BTreeSet", "IndexSet"];
const MAPS: &[&str] = &["HashMap", "BTreeMap", "IndexMap", "Map"];

/// Renders one example template for a tool.
pub trait ExampleStrategy: Send + Sync {
    /// Produces a template snippet showing how `metadata` is used.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the function cannot be described.
    fn generate(&self, metadata: &ToolMetadata, function: &Function) -> ToolResult<String>;
}

/// `{{ "Hello, World!"|name(k=v) }}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterStrategy;

/// `{{ 42 is name }}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestStrategy;

/// `{{ name(a, b) }}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FunctionStrategy;

impl ExampleStrategy for FilterStrategy {
    fn generate(&self, metadata: &ToolMetadata, function: &Function) -> ToolResult<String> {
        let (input, rest) = split_input(function);
        Ok(format!(
            "{{{{ {input}|{}{} }}}}",
            metadata.name(),
            call_suffix(rest)
        ))
    }
}

impl ExampleStrategy for TestStrategy {
    fn generate(&self, metadata: &ToolMetadata, function: &Function) -> ToolResult<String> {
        let (input, rest) = split_input(function);
        Ok(format!(
            "{{{{ {input} is {}{} }}}}",
            metadata.name(),
            call_suffix(rest)
        ))
    }
}

impl ExampleStrategy for FunctionStrategy {
    fn generate(&self, metadata: &ToolMetadata, function: &Function) -> ToolResult<String> {
        let args = call_args(params(function));
        Ok(format!("{{{{ {}({args}) }}}}", metadata.name()))
    }
}

fn params(function: &Function) -> &[Param] {
    function.signature().map(Signature::params).unwrap_or_default()
}

/// Piped input plus the parameters left for the call.
fn split_input(function: &Function) -> (String, &[Param]) {
    match params(function).split_first() {
        Some((first, rest)) => (sample_value(first.ty()).to_string(), rest),
        None => (Value::from(SAMPLE_TEXT).to_string(), &[][..]),
    }
}

fn call_suffix(params: &[Param]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!("({})", call_args(params))
    }
}

/// Required parameters positionally, optional ones as keywords.
fn call_args(params: &[Param]) -> String {
    params
        .iter()
        .map(|param| {
            let value = sample_value(param.ty());
            if param.is_optional() {
                format!("{}={value}", param.name())
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Returns a representative value for a Rust type as written.
///
/// References are looked through, `Option<T>` samples `T`, and collections
/// sample their element types. Unknown types yield `"example_<type>"`.
#[must_use]
pub fn sample_value(ty: &str) -> Value {
    let ty = ty.trim().trim_start_matches('&');

    if let Some(inner) = ty.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let element = inner.split(';').next().unwrap_or_default();
        return Value::Array(vec![sample_value(element)]);
    }
    if let Some(inner) = ty.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        if inner.is_empty() {
            return Value::Null;
        }
        return Value::Array(split_top_level(inner).into_iter().map(sample_value).collect());
    }

    let (base, args) = split_generics(ty);
    let base = base.rsplit("::").next().unwrap_or(base);
    match base {
        "" | "_" | "Value" => Value::from(UNTYPED),
        "str" | "String" => Value::from(SAMPLE_TEXT),
        "Cow" | "Box" | "Rc" | "Arc" | "Option" => {
            args.first().map_or_else(|| Value::from(UNTYPED), |inner| sample_value(inner))
        }
        "f32" | "f64" => Value::from(SAMPLE_FLOAT),
        "bool" => Value::Bool(true),
        "Path" | "PathBuf" => Value::from("/tmp/example"),
        _ if INTEGERS.contains(&base) => Value::from(SAMPLE_INT),
        _ if SEQUENCES.contains(&base) => match args.first() {
            Some(element) => Value::Array(vec![sample_value(element)]),
            None => Value::from(vec![1, 2, 3]),
        },
        _ if MAPS.contains(&base) => {
            let mut map = Map::new();
            if let [key, value] = args.as_slice() {
                let key = match sample_value(key) {
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                map.insert(key, sample_value(value));
            } else {
                map.insert("key".into(), Value::from("value"));
            }
            Value::Object(map)
        }
        other => Value::from(format!("example_{}", other.to_lowercase())),
    }
}

/// Splits `Base<A, B>` into `Base` and its top-level arguments.
fn split_generics(ty: &str) -> (&str, Vec<&str>) {
    match (ty.find('<'), ty.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let mut args = split_top_level(&ty[open + 1..close]);
            args.retain(|arg| !arg.starts_with('\''));
            (&ty[..open], args)
        }
        _ => (ty, Vec::new()),
    }
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(text[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// Picks an [`ExampleStrategy`] by tool kind.
#[derive(Clone)]
pub struct ExampleGenerator {
    strategies: HashMap<ToolKind, Arc<dyn ExampleStrategy>>,
}

impl Default for ExampleGenerator {
    fn default() -> Self {
        let mut generator = Self::empty();
        generator.add_strategy(ToolKind::Filter, FilterStrategy);
        generator.add_strategy(ToolKind::Test, TestStrategy);
        generator.add_strategy(ToolKind::Function, FunctionStrategy);
        generator
    }
}

impl std::fmt::Debug for ExampleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.strategies.keys().copied().collect();
        kinds.sort();
        f.debug_struct("ExampleGenerator")
            .field("kinds", &kinds)
            .finish()
    }
}

impl ExampleGenerator {
    /// Creates a generator with no strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Installs `strategy` for `kind`, replacing any previous one.
    pub fn add_strategy(&mut self, kind: ToolKind, strategy: impl ExampleStrategy + 'static) {
        self.strategies.insert(kind, Arc::new(strategy));
    }

    /// Generates an example for a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NoExampleStrategy`] if the tool's kind has no
    /// strategy, or whatever the strategy reports.
    pub fn generate(&self, tool: &RegisteredTool) -> ToolResult<String> {
        self.generate_with(tool.metadata(), tool.function())
    }

    /// Resolves the callable of `metadata` through `resolver` and generates an
    /// example for it.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors in addition to those of
    /// [`ExampleGenerator::generate`].
    pub fn generate_for(
        &self,
        metadata: &ToolMetadata,
        resolver: &dyn Resolver,
    ) -> ToolResult<String> {
        let function = metadata.resolve_with(resolver)?;
        self.generate_with(metadata, &function)
    }

    fn generate_with(&self, metadata: &ToolMetadata, function: &Function) -> ToolResult<String> {
        let strategy =
            self.strategies
                .get(&metadata.kind())
                .ok_or_else(|| ToolError::NoExampleStrategy {
                    kind: metadata.kind().to_string(),
                })?;
        strategy.generate(metadata, function)
    }
}
