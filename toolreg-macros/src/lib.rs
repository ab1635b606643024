//! Procedural macros for tool registration.
//!
//! `#[tool]` leaves the annotated function untouched and submits a
//! pending registration describing it: the attribute values, the doc comment,
//! the module path, and the parameter list. Pending tools are registered when
//! the program calls `ToolRegistrar::register_pending`.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{
    Expr, ExprLit, FnArg, ItemFn, Lit, LitBool, LitStr, Meta, Pat, Path, ReturnType, Token, Type,
    parenthesized, parse_macro_input,
};

/// Registers a free function as a template filter, test, or function.
///
/// ```ignore
/// /// Convert string to uppercase.
/// ///
/// /// # Examples
/// ///
/// /// ```jinja
/// /// {{ 'hi' | upper }}
/// /// ```
/// #[tool(kind = "filter", group = "text", aliases("u"))]
/// pub fn upper(value: &str) -> String {
///     value.to_uppercase()
/// }
/// ```
///
/// Accepted arguments: `kind` (required), `name`, `group`, `description`,
/// `icon`, `aliases(..)`, `required_packages(..)`, any number of
/// `example(template = .., title = .., description = .., markdown = ..)`,
/// `examples()` to register with no examples at all, and `crate = ".."` to
/// name the path of the runtime crate when it is re-exported.
///
/// Parameters may be owned values deserializable from JSON, `&str`, `&[T]`,
/// `&Path`, or `&T`. The return value must serialize to JSON; a `Result`
/// return propagates its error as an execution failure.
#[proc_macro_attribute]
pub fn tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = ToolArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(&meta));
    parse_macro_input!(attr with parser);
    let function = parse_macro_input!(item as ItemFn);

    expand(&args, &function)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct ToolArgs {
    kind: Option<LitStr>,
    name: Option<LitStr>,
    group: Option<LitStr>,
    description: Option<LitStr>,
    icon: Option<LitStr>,
    aliases: Vec<LitStr>,
    required_packages: Vec<LitStr>,
    examples: Option<Vec<ExampleArgs>>,
    krate: Option<Path>,
}

struct ExampleArgs {
    template: LitStr,
    title: Option<LitStr>,
    description: Option<LitStr>,
    markdown: bool,
}

impl ToolArgs {
    fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if meta.path.is_ident("kind") {
            self.kind = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("group") {
            self.group = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("description") {
            self.description = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("icon") {
            self.icon = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("aliases") {
            self.aliases.extend(string_list(meta)?);
        } else if meta.path.is_ident("required_packages") {
            self.required_packages.extend(string_list(meta)?);
        } else if meta.path.is_ident("example") {
            let example = ExampleArgs::parse(meta)?;
            self.examples.get_or_insert_with(Vec::new).push(example);
        } else if meta.path.is_ident("examples") {
            let content;
            parenthesized!(content in meta.input);
            if !content.is_empty() {
                return Err(content.error("`examples()` takes no arguments; use `example(..)`"));
            }
            self.examples.get_or_insert_with(Vec::new);
        } else if meta.path.is_ident("crate") {
            let path: LitStr = meta.value()?.parse()?;
            self.krate = Some(path.parse()?);
        } else {
            return Err(meta.error("unsupported `#[tool]` argument"));
        }
        Ok(())
    }
}

impl ExampleArgs {
    fn parse(meta: &ParseNestedMeta<'_>) -> syn::Result<Self> {
        let mut template = None;
        let mut title = None;
        let mut description = None;
        let mut markdown = false;
        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("template") {
                template = Some(inner.value()?.parse()?);
            } else if inner.path.is_ident("title") {
                title = Some(inner.value()?.parse()?);
            } else if inner.path.is_ident("description") {
                description = Some(inner.value()?.parse()?);
            } else if inner.path.is_ident("markdown") {
                markdown = inner.value()?.parse::<LitBool>()?.value;
            } else {
                return Err(inner.error("unsupported example argument"));
            }
            Ok(())
        })?;

        let template = template.ok_or_else(|| meta.error("example requires `template`"))?;
        Ok(Self {
            template,
            title,
            description,
            markdown,
        })
    }
}

fn string_list(meta: &ParseNestedMeta<'_>) -> syn::Result<Vec<LitStr>> {
    let content;
    parenthesized!(content in meta.input);
    let items = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    Ok(items.into_iter().collect())
}

/// How a parameter is pulled out of the call arguments.
struct Binding {
    name: String,
    owned: TokenStream2,
    by_ref: bool,
    text: String,
}

fn binding(arg: &FnArg) -> syn::Result<Binding> {
    let FnArg::Typed(typed) = arg else {
        return Err(syn::Error::new_spanned(
            arg,
            "`#[tool]` only supports free functions",
        ));
    };
    let Pat::Ident(pat) = typed.pat.as_ref() else {
        return Err(syn::Error::new_spanned(
            &typed.pat,
            "`#[tool]` parameters must be plain identifiers",
        ));
    };
    let name = pat.ident.to_string();
    let name = name.trim_start_matches("r#").to_owned();
    let text = type_text(&typed.ty);

    match typed.ty.as_ref() {
        Type::Reference(reference) => {
            if reference.mutability.is_some() {
                return Err(syn::Error::new_spanned(
                    reference,
                    "`#[tool]` parameters cannot be mutable references",
                ));
            }
            let owned = match reference.elem.as_ref() {
                Type::Path(path) if path.path.is_ident("str") => quote!(::std::string::String),
                Type::Path(path) if last_ident_is(&path.path, "Path") => {
                    quote!(::std::path::PathBuf)
                }
                Type::Slice(slice) => {
                    let elem = &slice.elem;
                    quote!(::std::vec::Vec<#elem>)
                }
                elem => quote!(#elem),
            };
            Ok(Binding {
                name,
                owned,
                by_ref: true,
                text,
            })
        }
        ty => Ok(Binding {
            name,
            owned: quote!(#ty),
            by_ref: false,
            text,
        }),
    }
}

fn last_ident_is(path: &Path, ident: &str) -> bool {
    path.segments
        .last()
        .is_some_and(|segment| segment.ident == ident)
}

/// Type as written, without lifetimes.
fn type_text(ty: &Type) -> String {
    match ty {
        Type::Reference(reference) => format!("&{}", type_text(&reference.elem)),
        Type::Slice(slice) => format!("[{}]", type_text(&slice.elem)),
        Type::Paren(paren) => type_text(&paren.elem),
        other => quote!(#other).to_string().replace(' ', ""),
    }
}

fn doc_text(function: &ItemFn) -> String {
    let lines: Vec<String> = function
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(pair) => match &pair.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .flat_map(|chunk| {
            chunk
                .lines()
                .map(|line| line.strip_prefix(' ').unwrap_or(line).to_owned())
                .collect::<Vec<_>>()
        })
        .collect();
    lines.join("\n")
}

fn optional(value: Option<&LitStr>) -> TokenStream2 {
    match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    }
}

fn expand(args: &ToolArgs, function: &ItemFn) -> syn::Result<TokenStream2> {
    let sig = &function.sig;
    let kind = args
        .kind
        .as_ref()
        .ok_or_else(|| syn::Error::new(Span::call_site(), "`#[tool]` requires `kind`"))?;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "`#[tool]` functions must be synchronous",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "`#[tool]` functions cannot be generic",
        ));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(syn::Error::new_spanned(
            variadic,
            "`#[tool]` functions cannot be variadic",
        ));
    }

    let krate = args
        .krate
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::toolreg_core));
    let ident = &sig.ident;
    let fn_name = ident.to_string();
    let fn_name = fn_name.trim_start_matches("r#");

    let bindings = sig
        .inputs
        .iter()
        .map(binding)
        .collect::<syn::Result<Vec<_>>>()?;

    let locals: Vec<_> = (0..bindings.len())
        .map(|idx| format_ident!("__toolreg_arg_{}", idx))
        .collect();
    let binds = bindings.iter().zip(&locals).enumerate().map(|(idx, (binding, local))| {
        let owned = &binding.owned;
        let name = &binding.name;
        quote!(let #local: #owned = __toolreg_args.bind(#idx, #name)?;)
    });
    let call_args = bindings.iter().zip(&locals).map(|(binding, local)| {
        if binding.by_ref {
            quote!(&#local)
        } else {
            quote!(#local)
        }
    });
    let params = bindings.iter().map(|binding| {
        let name = &binding.name;
        let text = &binding.text;
        quote!(#krate::Param::new(#name, #text))
    });

    let (invoke, output) = match &sig.output {
        ReturnType::Default => (quote!(#ident(#(#call_args),*)), None),
        ReturnType::Type(_, ty) => {
            let text = type_text(ty);
            let invoke = match ty.as_ref() {
                Type::Path(path) if last_ident_is(&path.path, "ToolResult") => {
                    quote!(#ident(#(#call_args),*)?)
                }
                Type::Path(path) if last_ident_is(&path.path, "Result") => quote! {
                    #ident(#(#call_args),*)
                        .map_err(|err| #krate::ToolError::execution(err.to_string()))?
                },
                _ => quote!(#ident(#(#call_args),*)),
            };
            (invoke, Some(text))
        }
    };
    let signature = match output {
        Some(output) => quote!(#krate::Signature::new(vec![#(#params),*]).with_output(#output)),
        None => quote!(#krate::Signature::new(vec![#(#params),*])),
    };

    let doc = doc_text(function);
    let doc = (!doc.trim().is_empty()).then(|| quote!(.doc(#doc)));

    let name = optional(args.name.as_ref());
    let group = optional(args.group.as_ref());
    let description = optional(args.description.as_ref());
    let icon = optional(args.icon.as_ref());
    let aliases = &args.aliases;
    let packages = &args.required_packages;
    let examples = match &args.examples {
        None => quote!(::core::option::Option::None),
        Some(examples) => {
            let examples = examples.iter().map(|example| {
                let template = &example.template;
                let title = example
                    .title
                    .clone()
                    .unwrap_or_else(|| LitStr::new("", Span::call_site()));
                let description = optional(example.description.as_ref());
                let markdown = example.markdown;
                quote! {
                    #krate::pending::PendingExample {
                        template: #template,
                        title: #title,
                        description: #description,
                        markdown: #markdown,
                    }
                }
            });
            quote!(::core::option::Option::Some(&[#(#examples),*]))
        }
    };

    Ok(quote! {
        #function

        const _: () = {
            fn __toolreg_build() -> #krate::Function {
                #krate::Function::builder(
                    #fn_name,
                    |__toolreg_args: &#krate::Arguments| -> #krate::ToolResult<#krate::__private::Value> {
                        #(#binds)*
                        #krate::function::into_value(#invoke)
                    },
                )
                .module(::core::module_path!())
                #doc
                .signature(#signature)
                .build()
            }

            static __TOOLREG_FUNCTION: #krate::__private::Lazy<#krate::Function> =
                #krate::__private::Lazy::new(__toolreg_build);

            fn __toolreg_function() -> #krate::Function {
                #krate::Function::clone(&__TOOLREG_FUNCTION)
            }

            #krate::__private::inventory::submit! {
                #krate::PendingTool {
                    kind: #kind,
                    name: #name,
                    group: #group,
                    description: #description,
                    icon: #icon,
                    aliases: &[#(#aliases),*],
                    required_packages: &[#(#packages),*],
                    examples: #examples,
                    function: __toolreg_function,
                }
            }
        };
    })
}
