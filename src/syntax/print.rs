//! Canonical source rendering.
//!
//! Rendering is deterministic and round-trips through the reader: parsing the
//! text of a parsed node and rendering it again gives the same text.

use super::{
    AccessorKind, Argument, BindingKeyword, CastKind, Node, StringSegment, Syntax, WithSpan,
};
use std::fmt::{self, Write};
use std::sync::Arc;

const INDENT: &str = "    ";

impl fmt::Display for WithSpan<Arc<Syntax>> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_syntax(f, self, 0)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{}: ", label)?;
        }
        write_node(f, &self.expression, 0)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    write_syntax(f, &node.value, depth)
}

fn write_syntax(f: &mut fmt::Formatter<'_>, syntax: &Syntax, depth: usize) -> fmt::Result {
    match syntax {
        Syntax::StringLiteral(segments) => write_string_literal(f, segments),
        Syntax::IntegerLiteral(digits) | Syntax::FloatLiteral(digits) => f.write_str(digits),
        Syntax::BooleanLiteral(value) => write!(f, "{}", value),
        Syntax::NilLiteral => f.write_str("nil"),
        Syntax::Identifier(name) | Syntax::IdentifierPattern(name) => f.write_str(name),
        Syntax::WildcardPattern => f.write_str("_"),
        Syntax::MemberAccess { base, member } => {
            if let Some(base) = base {
                write_node(f, base, depth)?;
            }
            write!(f, ".{}", member)
        }
        Syntax::Call { callee, arguments } => {
            write_node(f, callee, depth)?;
            write_arguments(f, arguments)
        }
        Syntax::Tuple(elements) => write_arguments(f, elements),
        Syntax::Prefix { operator, operand } => {
            f.write_str(operator)?;
            write_node(f, operand, depth)
        }
        Syntax::Infix { lhs, operator, rhs } => {
            write_node(f, lhs, depth)?;
            write!(f, " {} ", operator)?;
            write_node(f, rhs, depth)
        }
        Syntax::Cast {
            value,
            kind,
            target,
        } => {
            write_node(f, value, depth)?;
            let keyword = match kind {
                CastKind::Plain => "as",
                CastKind::Conditional => "as?",
                CastKind::Forced => "as!",
            };
            write!(f, " {} ", keyword)?;
            write_node(f, target, depth)
        }
        Syntax::ForceUnwrap(inner) => {
            write_node(f, inner, depth)?;
            f.write_char('!')
        }
        Syntax::MacroExpansion {
            name,
            generic_arguments,
            arguments,
        } => {
            write!(f, "#{}", name)?;
            write_generic_arguments(f, generic_arguments)?;
            write_arguments(f, arguments)
        }
        Syntax::TypeReference {
            name,
            generic_arguments,
        } => {
            f.write_str(name)?;
            write_generic_arguments(f, generic_arguments)
        }
        Syntax::OptionalType(wrapped) => {
            write_node(f, wrapped, depth)?;
            f.write_char('?')
        }
        Syntax::Attribute {
            name,
            generic_arguments,
            arguments,
        } => {
            write!(f, "@{}", name)?;
            write_generic_arguments(f, generic_arguments)?;
            if !arguments.is_empty() {
                write_arguments(f, arguments)?;
            }
            Ok(())
        }
        Syntax::VariableDecl {
            attributes,
            modifiers,
            keyword,
            bindings,
        } => {
            write_decl_prefix(f, attributes, modifiers, depth)?;
            f.write_str(match keyword {
                BindingKeyword::Let => "let ",
                BindingKeyword::Var => "var ",
            })?;
            for (i, binding) in bindings.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_node(f, binding, depth)?;
            }
            Ok(())
        }
        Syntax::FunctionDecl {
            attributes,
            modifiers,
            name,
            body,
        } => {
            write_decl_prefix(f, attributes, modifiers, depth)?;
            write!(f, "func {}() ", name)?;
            write_block(f, body, depth)
        }
        Syntax::PatternBinding {
            pattern,
            annotation,
            initializer,
            accessors,
        } => {
            write_node(f, pattern, depth)?;
            if let Some(annotation) = annotation {
                f.write_str(": ")?;
                write_node(f, annotation, depth)?;
            }
            if let Some(initializer) = initializer {
                f.write_str(" = ")?;
                write_node(f, initializer, depth)?;
            }
            if !accessors.is_empty() {
                f.write_char(' ')?;
                write_block(f, accessors, depth)?;
            }
            Ok(())
        }
        Syntax::TuplePattern(elements) => {
            f.write_char('(')?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_node(f, element, depth)?;
            }
            f.write_char(')')
        }
        Syntax::Accessor { kind, body } => {
            f.write_str(match kind {
                AccessorKind::Get => "get ",
                AccessorKind::Set => "set ",
            })?;
            write_block(f, body, depth)
        }
    }
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Argument]) -> fmt::Result {
    f.write_char('(')?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", argument)?;
    }
    f.write_char(')')
}

fn write_generic_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Node]) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_char('<')?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_node(f, argument, 0)?;
    }
    f.write_char('>')
}

fn write_decl_prefix(
    f: &mut fmt::Formatter<'_>,
    attributes: &[Node],
    modifiers: &[String],
    depth: usize,
) -> fmt::Result {
    for attribute in attributes {
        write_node(f, attribute, depth)?;
        f.write_char(' ')?;
    }
    for modifier in modifiers {
        write!(f, "{} ", modifier)?;
    }
    Ok(())
}

/// `{ ... }` with one statement per line, indented one level past `depth`.
fn write_block(f: &mut fmt::Formatter<'_>, statements: &[Node], depth: usize) -> fmt::Result {
    if statements.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{\n")?;
    for statement in statements {
        for _ in 0..=depth {
            f.write_str(INDENT)?;
        }
        write_node(f, statement, depth + 1)?;
        f.write_char('\n')?;
    }
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    f.write_char('}')
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, segments: &[StringSegment]) -> fmt::Result {
    f.write_char('"')?;
    for segment in segments {
        match segment {
            StringSegment::Text(text) => write_escaped(f, text)?,
            StringSegment::Interpolation(node) => {
                f.write_str("\\(")?;
                write_node(f, node, 0)?;
                f.write_char(')')?;
            }
        }
    }
    f.write_char('"')
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\u{{{:x}}}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::build::*;
    use super::super::{Argument, CastKind, Span};

    #[test]
    fn string_literals_are_escaped() {
        let node = string_literal("say \"hi\"\n", Span::default());
        assert_eq!(node.to_string(), r#""say \"hi\"\n""#);
    }

    #[test]
    fn getter_shape_renders_on_one_line() {
        let span = Span::default();
        let store = member_chain(&["Store", "default"], span).unwrap();
        let read = call(
            member(store, "object", span),
            vec![Argument::labeled("forKey", string_literal("city", span))],
            span,
        );
        let casted = parenthesized(
            cast(read, CastKind::Conditional, type_reference("String", vec![], span), span),
            span,
        );
        let with_default = infix(casted, "??", string_literal("Tokyo", span), span);
        assert_eq!(
            with_default.to_string(),
            r#"(Store.default.object(forKey: "city") as? String) ?? "Tokyo""#
        );
    }
}
