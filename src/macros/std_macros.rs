//! The standard macros.
//!
//! | name             | role       | expands to                                   |
//! |------------------|------------|----------------------------------------------|
//! | `stringify`      | expression | `(expr, "expr")`                             |
//! | `urlFromString`  | expression | `URL(string: "...")!`                        |
//! | `systemImage`    | expression | `Image(systemName: "...")`                   |
//! | `iCloudKeyValue` | accessor   | `get`/`set` backed by a key-value store      |

use crate::diagnostics::Rejection;
use crate::macros::extract::{self, BindingInfo, GenericType};
use crate::macros::validate::{validate_symbol_name, validate_url};
use crate::macros::{ExpansionSite, KeyValueStore, MacroDef, MacroEntry, MacroServices};
use crate::syntax::build::{
    accessor, call, cast, force_unwrap, identifier, infix, member, nil_literal,
    parenthesized, string_literal, tuple,
};
use crate::syntax::{AccessorKind, Argument, CastKind, Node, Span};
use tracing::debug;

// ===================================================================================================
// REGISTRY TABLE
// ===================================================================================================

/// Every macro the engine provides, in declaration order.
pub static STANDARD_MACROS: &[MacroEntry] = &[
    MacroEntry {
        name: "stringify",
        def: MacroDef::Expression(expand_stringify),
        signature: "#stringify<T>(_ value: T) -> (T, String)",
        summary: "Pairs an expression with its own source text.",
    },
    MacroEntry {
        name: "urlFromString",
        def: MacroDef::Expression(expand_url),
        signature: "#urlFromString(_ str: String) -> URL",
        summary: "Builds a URL from a literal checked at expansion time.",
    },
    MacroEntry {
        name: "systemImage",
        def: MacroDef::Expression(expand_system_image),
        signature: "#systemImage(_ str: String) -> Image",
        summary: "Builds an image from a symbol name checked against the catalog.",
    },
    MacroEntry {
        name: "iCloudKeyValue",
        def: MacroDef::Accessor(expand_key_value_accessors),
        signature: "@iCloudKeyValue<T>",
        summary: "Backs a variable with the ubiquitous key-value store.",
    },
];

// ===================================================================================================
// EXPRESSION MACROS
// ===================================================================================================

/// `#stringify(e)` => `(e, "e")`
fn expand_stringify(site: &ExpansionSite, _services: &MacroServices) -> Result<Node, Rejection> {
    let argument = extract::single_argument(site)?;
    let span = site.node.span;
    let text = string_literal(argument.to_string(), span);
    Ok(tuple(
        vec![Argument::unlabeled(argument.clone()), Argument::unlabeled(text)],
        span,
    ))
}

/// `#urlFromString("https://apple.com")` => `URL(string: "https://apple.com")!`
///
/// The force unwrap is safe: the literal was already checked here.
fn expand_url(site: &ExpansionSite, services: &MacroServices) -> Result<Node, Rejection> {
    let argument = extract::single_argument(site)?;
    let text = extract::string_literal_text(argument)?;
    validate_url(text, &services.url_policy).map_err(|failure| Rejection::at(failure, argument))?;

    let span = site.node.span;
    let construct = call(
        identifier("URL", span),
        vec![Argument::labeled("string", string_literal(text, span))],
        span,
    );
    Ok(force_unwrap(construct, span))
}

/// `#systemImage("calendar")` => `Image(systemName: "calendar")`
fn expand_system_image(site: &ExpansionSite, services: &MacroServices) -> Result<Node, Rejection> {
    let argument = extract::single_argument(site)?;
    let text = extract::string_literal_text(argument)?;
    validate_symbol_name(text, services.symbols.as_deref())
        .map_err(|failure| Rejection::at(failure, argument))?;

    let span = site.node.span;
    Ok(call(
        identifier("Image", span),
        vec![Argument::labeled("systemName", string_literal(text, span))],
        span,
    ))
}

// ===================================================================================================
// ACCESSOR MACROS
// ===================================================================================================

/// `@iCloudKeyValue<T> var name: T = init` => getter and setter reading and
/// writing key `"name"` of the configured store.
fn expand_key_value_accessors(
    site: &ExpansionSite,
    services: &MacroServices,
) -> Result<Vec<Node>, Rejection> {
    let value_type = extract::generic_type(site)?;

    let Some(declaration) = site.declaration.as_ref() else {
        return Ok(Vec::new());
    };
    let Some(binding) = extract::binding(declaration)? else {
        debug!(
            "{} attached to a {:?}; no accessors generated",
            site.macro_name,
            declaration.kind()
        );
        return Ok(Vec::new());
    };

    let span = site.node.span;
    Ok(vec![
        getter(&services.store, &value_type, &binding, span),
        setter(&services.store, &binding, span),
    ])
}

/// `get { (store.read(label: "name") as? T) ?? fallback }`
///
/// The fallback is `nil` for an optional `T`; otherwise it is the
/// initializer when there is one, and absent when there is not.
fn getter(store: &KeyValueStore, value_type: &GenericType, binding: &BindingInfo, span: Span) -> Node {
    let read = call(
        member(receiver(store, span), store.read_method.as_str(), span),
        vec![Argument::labeled(
            store.key_label.as_str(),
            string_literal(binding.name.as_str(), span),
        )],
        span,
    );
    let typed = parenthesized(
        cast(read, CastKind::Conditional, value_type.ty.clone(), span),
        span,
    );

    let fallback = if value_type.optional {
        Some(nil_literal(span))
    } else {
        binding.initializer.clone()
    };
    let body = match fallback {
        Some(fallback) => infix(typed, "??", fallback, span),
        None => typed,
    };
    accessor(AccessorKind::Get, vec![body], span)
}

/// `set { store.write(newValue, label: "name") }`
fn setter(store: &KeyValueStore, binding: &BindingInfo, span: Span) -> Node {
    let write = call(
        member(receiver(store, span), store.write_method.as_str(), span),
        vec![
            Argument::unlabeled(identifier("newValue", span)),
            Argument::labeled(
                store.key_label.as_str(),
                string_literal(binding.name.as_str(), span),
            ),
        ],
        span,
    );
    accessor(AccessorKind::Set, vec![write], span)
}

fn receiver(store: &KeyValueStore, span: Span) -> Node {
    store
        .receiver_members()
        .iter()
        .fold(identifier(store.receiver_root(), span), |base, name| member(base, name, span))
}
