//! Argument extractors.
//!
//! Each extractor narrows part of an expansion site to the shape a handler
//! needs, or returns a [`Rejection`] addressed to the node that does not fit.
//! Extractors are pure: the same tree always gives the same answer.

use crate::diagnostics::{MacroFailure, Rejection};
use crate::macros::ExpansionSite;
use crate::syntax::{Node, StringSegment};

/// Type names recognised as the optional wrapper when spelled generically.
const OPTIONAL_TYPE_NAMES: &[&str] = &["Optional", "Swift.Optional"];

/// The generic type argument of an attached macro.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericType {
    /// The value type with one optional layer removed.
    pub ty: Node,
    /// Whether the written argument was optional (`T?` or `Optional<T>`).
    pub optional: bool,
}

/// The single variable an accessor macro is attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingInfo {
    pub name: String,
    /// Initial value, kept as written.
    pub initializer: Option<Node>,
    pub binding: Node,
}

/// First argument expression of the site. Labels are ignored, as are any
/// further arguments.
pub fn single_argument(site: &ExpansionSite) -> Result<&Node, Rejection> {
    site.arguments()
        .first()
        .map(|argument| &argument.expression)
        .ok_or_else(|| Rejection::at(MacroFailure::MissingArgument, &site.node))
}

/// Text of a string literal made of exactly one static segment.
pub fn string_literal_text(argument: &Node) -> Result<&str, Rejection> {
    match argument.as_string_literal() {
        Some([StringSegment::Text(text)]) => Ok(text),
        _ => Err(Rejection::at(MacroFailure::ArgumentNotString, argument)),
    }
}

/// First generic argument of the site, with an optional wrapper peeled off.
pub fn generic_type(site: &ExpansionSite) -> Result<GenericType, Rejection> {
    let written = site
        .generic_arguments()
        .first()
        .ok_or_else(|| Rejection::at(MacroFailure::NoTypeDefined, &site.node))?;

    Ok(match unwrap_optional(written) {
        Some(inner) => GenericType {
            ty: inner.clone(),
            optional: true,
        },
        None => GenericType {
            ty: written.clone(),
            optional: false,
        },
    })
}

/// Inner type of `T?`, `Optional<T>` or `Swift.Optional<T>`.
///
/// Purely syntactic: a type alias for the optional wrapper is not seen
/// through.
pub fn unwrap_optional(ty: &Node) -> Option<&Node> {
    if let Some(inner) = ty.as_optional_type() {
        return Some(inner);
    }
    let reference = ty.as_type_reference()?;
    match reference.generic_arguments {
        [inner] if OPTIONAL_TYPE_NAMES.contains(&reference.name) => Some(inner),
        _ => None,
    }
}

/// The binding an accessor macro generates storage for.
///
/// `Ok(None)` means the declaration is not a variable declaration at all, in
/// which case the macro contributes nothing.
pub fn binding(declaration: &Node) -> Result<Option<BindingInfo>, Rejection> {
    let Some(variable) = declaration.as_variable_decl() else {
        return Ok(None);
    };

    let binding = match variable.bindings {
        [binding] => binding,
        _ => return Err(Rejection::at(MacroFailure::CannotGetBinding, declaration)),
    };
    let parts = binding
        .as_pattern_binding()
        .ok_or_else(|| Rejection::at(MacroFailure::CannotGetBinding, binding))?;
    let name = parts
        .pattern
        .as_identifier_pattern()
        .ok_or_else(|| Rejection::at(MacroFailure::CannotGetVariableName, parts.pattern))?;

    Ok(Some(BindingInfo {
        name: name.to_string(),
        initializer: parts.initializer.cloned(),
        binding: binding.clone(),
    }))
}
