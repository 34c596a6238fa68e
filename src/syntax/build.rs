//! Constructors for synthesized fragments.
//!
//! Every helper takes the span the new node should report. Synthesized nodes
//! reuse the span of the expansion site so diagnostics raised later still
//! point at the macro use.

use super::{AccessorKind, Argument, CastKind, Node, Span, StringSegment, Syntax};

/// A string literal with a single static segment.
pub fn string_literal(text: impl Into<String>, span: Span) -> Node {
    Node::new(
        Syntax::StringLiteral(vec![StringSegment::Text(text.into())]),
        span,
    )
}

pub fn identifier(name: impl Into<String>, span: Span) -> Node {
    Node::new(Syntax::Identifier(name.into()), span)
}

pub fn nil_literal(span: Span) -> Node {
    Node::new(Syntax::NilLiteral, span)
}

pub fn member(base: Node, member: impl Into<String>, span: Span) -> Node {
    Node::new(
        Syntax::MemberAccess {
            base: Some(base),
            member: member.into(),
        },
        span,
    )
}

/// `a.b.c` from its dotted components. Returns `None` for an empty path.
pub fn member_chain<S: AsRef<str>>(path: &[S], span: Span) -> Option<Node> {
    let (head, rest) = path.split_first()?;
    let root = identifier(head.as_ref(), span);
    Some(
        rest.iter()
            .fold(root, |base, name| member(base, name.as_ref(), span)),
    )
}

pub fn call(callee: Node, arguments: Vec<Argument>, span: Span) -> Node {
    Node::new(Syntax::Call { callee, arguments }, span)
}

pub fn tuple(elements: Vec<Argument>, span: Span) -> Node {
    Node::new(Syntax::Tuple(elements), span)
}

/// `(inner)`
pub fn parenthesized(inner: Node, span: Span) -> Node {
    tuple(vec![Argument::unlabeled(inner)], span)
}

pub fn infix(lhs: Node, operator: impl Into<String>, rhs: Node, span: Span) -> Node {
    Node::new(
        Syntax::Infix {
            lhs,
            operator: operator.into(),
            rhs,
        },
        span,
    )
}

pub fn cast(value: Node, kind: CastKind, target: Node, span: Span) -> Node {
    Node::new(Syntax::Cast { value, kind, target }, span)
}

pub fn force_unwrap(inner: Node, span: Span) -> Node {
    Node::new(Syntax::ForceUnwrap(inner), span)
}

pub fn type_reference(name: impl Into<String>, generic_arguments: Vec<Node>, span: Span) -> Node {
    Node::new(
        Syntax::TypeReference {
            name: name.into(),
            generic_arguments,
        },
        span,
    )
}

pub fn accessor(kind: AccessorKind, body: Vec<Node>, span: Span) -> Node {
    Node::new(Syntax::Accessor { kind, body }, span)
}
