//! Callable handles with the introspection data needed for registration.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{ToolError, ToolResult};

/// Body of a registered callable.
pub type ToolBody = dyn Fn(&Arguments) -> ToolResult<Value> + Send + Sync;

/// Positional and keyword arguments passed to a callable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: Map<String, Value>,
}

impl Arguments {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument list from positional values only.
    #[must_use]
    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keywords: Map::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    /// Returns the positional arguments.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword arguments.
    #[must_use]
    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.keywords
    }

    /// Binds the parameter at `position` (or keyword `name`) to `T`.
    ///
    /// A parameter that was not passed binds from `null`, so `Option<T>`
    /// parameters become `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::MissingArgument`] if the parameter was not passed
    /// and `T` cannot be built from `null`, or [`ToolError::InvalidArgument`]
    /// if the passed value does not deserialize into `T`.
    pub fn bind<T: DeserializeOwned>(&self, position: usize, name: &str) -> ToolResult<T> {
        let supplied = self
            .positional
            .get(position)
            .or_else(|| self.keywords.get(name));

        match supplied {
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|err| ToolError::InvalidArgument {
                    name: name.to_owned(),
                    reason: err.to_string(),
                })
            }
            None => serde_json::from_value(Value::Null).map_err(|_| ToolError::MissingArgument {
                name: name.to_owned(),
                position,
            }),
        }
    }
}

/// Converts a callable's return value into a JSON value.
///
/// # Errors
///
/// Returns [`ToolError::Execution`] if the value cannot be serialized.
pub fn into_value<T: Serialize>(value: T) -> ToolResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ToolError::execution(format!("could not serialize result: {err}")))
}

/// One parameter of a captured signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    name: String,
    ty: String,
    optional: bool,
}

impl Param {
    /// Creates a parameter; `Option<..>` types are treated as optional.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        let ty: String = ty.into();
        let compact: String = ty.chars().filter(|c| !c.is_whitespace()).collect();
        let optional = compact.starts_with("Option<")
            || compact.starts_with("std::option::Option<")
            || compact.starts_with("core::option::Option<");
        Self {
            name: name.into(),
            ty: compact,
            optional,
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type as written, with whitespace removed.
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Whether callers may omit the parameter.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Parameter list and return type of a callable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
    output: Option<String>,
}

impl Signature {
    /// Creates a signature from its parameters.
    #[must_use]
    pub fn new(params: Vec<Param>) -> Self {
        Self {
            params,
            output: None,
        }
    }

    /// Sets the return type text.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Returns the return type text, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }
}

/// Shared handle to a callable plus its introspection data.
///
/// Cloning is cheap; clones compare equal under [`Function::ptr_eq`].
#[derive(Clone)]
pub struct Function {
    inner: Arc<FunctionInner>,
}

struct FunctionInner {
    name: String,
    module: Option<String>,
    qualname: Option<String>,
    doc: Option<String>,
    signature: Option<Signature>,
    wrapped: Option<Function>,
    body: Arc<ToolBody>,
}

impl Function {
    /// Creates an anonymous function with no module or documentation.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        Self::builder(name, body).build()
    }

    /// Starts building a function.
    #[must_use]
    pub fn builder<F>(name: impl Into<String>, body: F) -> FunctionBuilder
    where
        F: Fn(&Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        FunctionBuilder {
            name: name.into(),
            module: None,
            qualname: None,
            doc: None,
            signature: None,
            wrapped: None,
            body: Arc::new(body),
        }
    }

    /// Wraps `inner`, copying its name, module, qualname, doc, and signature.
    ///
    /// The wrapper records `inner` as its wrapped function so the original can
    /// be recovered with [`Function::innermost`].
    #[must_use]
    pub fn wraps<F>(inner: &Function, body: F) -> Self
    where
        F: Fn(&Arguments) -> ToolResult<Value> + Send + Sync + 'static,
    {
        let source = &inner.inner;
        Self {
            inner: Arc::new(FunctionInner {
                name: source.name.clone(),
                module: source.module.clone(),
                qualname: source.qualname.clone(),
                doc: source.doc.clone(),
                signature: source.signature.clone(),
                wrapped: Some(inner.clone()),
                body: Arc::new(body),
            }),
        }
    }

    /// Returns a wrapper that forwards every call to `self` unchanged.
    #[must_use]
    pub fn passthrough(&self) -> Self {
        let target = self.clone();
        Self::wraps(self, move |args| target.call(args))
    }

    /// Invokes the callable.
    ///
    /// # Errors
    ///
    /// Propagates whatever error the body returns.
    pub fn call(&self, args: &Arguments) -> ToolResult<Value> {
        (self.inner.body)(args)
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Rust module path of the definition, if known.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.inner.module.as_deref()
    }

    /// Qualified name inside the module, if it differs from the name.
    #[must_use]
    pub fn qualname(&self) -> Option<&str> {
        self.inner.qualname.as_deref()
    }

    /// Documentation text.
    #[must_use]
    pub fn doc(&self) -> Option<&str> {
        self.inner.doc.as_deref()
    }

    /// Captured signature.
    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.inner.signature.as_ref()
    }

    /// The function this one wraps, if any.
    #[must_use]
    pub fn wrapped(&self) -> Option<&Function> {
        self.inner.wrapped.as_ref()
    }

    /// Follows the wrapper chain to the original function.
    #[must_use]
    pub fn innermost(&self) -> &Function {
        let mut current = self;
        while let Some(next) = current.wrapped() {
            current = next;
        }
        current
    }

    /// Whether both handles point at the same callable.
    #[must_use]
    pub fn ptr_eq(a: &Function, b: &Function) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.inner.name)
            .field("module", &self.inner.module)
            .field("qualname", &self.inner.qualname)
            .field("wrapped", &self.inner.wrapped.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Function`].
pub struct FunctionBuilder {
    name: String,
    module: Option<String>,
    qualname: Option<String>,
    doc: Option<String>,
    signature: Option<Signature>,
    wrapped: Option<Function>,
    body: Arc<ToolBody>,
}

impl FunctionBuilder {
    /// Sets the Rust module path (`crate::module`).
    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Sets the qualified name inside the module.
    #[must_use]
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = Some(qualname.into());
        self
    }

    /// Sets the documentation text.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Sets the captured signature.
    #[must_use]
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Records `inner` as the wrapped function without copying its metadata.
    #[must_use]
    pub fn wrapping(mut self, inner: Function) -> Self {
        self.wrapped = Some(inner);
        self
    }

    /// Finalises the function.
    #[must_use]
    pub fn build(self) -> Function {
        Function {
            inner: Arc::new(FunctionInner {
                name: self.name,
                module: self.module,
                qualname: self.qualname,
                doc: self.doc,
                signature: self.signature,
                wrapped: self.wrapped,
                body: self.body,
            }),
        }
    }
}

impl fmt::Debug for FunctionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBuilder")
            .field("name", &self.name)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn upper() -> Function {
        Function::builder("upper", |args: &Arguments| {
            let value: String = args.bind(0, "value")?;
            into_value(value.to_uppercase())
        })
        .module("demo::text")
        .doc("Uppercase a string.")
        .build()
    }

    #[test]
    fn binds_positional_and_keyword_arguments() {
        let args = Arguments::new().arg("first").kwarg("count", 3);
        let first: String = args.bind(0, "value").expect("positional");
        let count: u32 = args.bind(1, "count").expect("keyword");
        assert_eq!(first, "first");
        assert_eq!(count, 3);
    }

    #[test]
    fn missing_optional_binds_none() {
        let args = Arguments::new();
        let sep: Option<String> = args.bind(1, "sep").expect("optional");
        assert_eq!(sep, None);

        let err = args.bind::<String>(0, "value").expect_err("missing");
        assert!(matches!(err, ToolError::MissingArgument { position: 0, .. }));
    }

    #[test]
    fn wrong_type_is_invalid_argument() {
        let args = Arguments::new().arg(json!({"a": 1}));
        let err = args.bind::<String>(0, "value").expect_err("invalid");
        assert!(matches!(err, ToolError::InvalidArgument { name, .. } if name == "value"));
    }

    #[test]
    fn wrappers_forward_and_unwind() {
        let original = upper();
        let once = original.passthrough();
        let twice = once.passthrough();

        assert_eq!(twice.name(), "upper");
        assert_eq!(twice.doc(), Some("Uppercase a string."));
        assert!(Function::ptr_eq(twice.innermost(), &original));

        let out = twice.call(&Arguments::new().arg("hi")).expect("call");
        assert_eq!(out, json!("HI"));
    }

    #[test]
    fn option_params_are_optional() {
        let param = Param::new("sep", "Option < String >");
        assert!(param.is_optional());
        assert_eq!(param.ty(), "Option<String>");
        assert!(!Param::new("value", "&str").is_optional());
    }
}
