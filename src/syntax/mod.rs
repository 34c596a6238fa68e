//! Syntax node model for macro expansion sites.
//!
//! Nodes are immutable, shared (`Arc`) and carry the span they were read from.
//! A tree has no back-edges: identity is positional, so a handler can hold any
//! subtree without keeping the rest of the file alive.
//!
//! Narrowing is one method per shape (`as_string_literal`, `as_attribute`,
//! ...). Each returns `None` on a shape mismatch and never panics.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod build;
pub mod parser;
mod print;

pub use parser::{parse_accessor, parse_expression, parse_source, parse_type, SourceFile};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// A byte range in the source a node was read from.
///
/// # Examples
///
/// ```rust
/// use sigil::syntax::Span;
/// let span = Span::new(3, 8);
/// assert_eq!(span.len(), 5);
/// assert_eq!(span.to(Span::new(10, 12)), Span::new(3, 12));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        miette::SourceSpan::from(span.start..span.end)
    }
}

/// Wrapper for carrying source span information with any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithSpan<T> {
    pub value: T,
    pub span: Span,
}

/// Canonical syntax node: shared, immutable, spanned.
pub type Node = WithSpan<Arc<Syntax>>;

/// One argument of a call, tuple, macro expansion or attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub label: Option<String>,
    pub expression: Node,
}

impl Argument {
    pub fn unlabeled(expression: Node) -> Self {
        Self {
            label: None,
            expression,
        }
    }

    pub fn labeled(label: impl Into<String>, expression: Node) -> Self {
        Self {
            label: Some(label.into()),
            expression,
        }
    }
}

/// A piece of a string literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringSegment {
    /// Static text, already unescaped.
    Text(String),
    /// `\(expr)`
    Interpolation(Node),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastKind {
    /// `as`
    Plain,
    /// `as?`
    Conditional,
    /// `as!`
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingKeyword {
    Let,
    Var,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessorKind {
    Get,
    Set,
}

/// The shapes a syntax node can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Syntax {
    StringLiteral(Vec<StringSegment>),
    IntegerLiteral(String),
    FloatLiteral(String),
    BooleanLiteral(bool),
    NilLiteral,
    Identifier(String),
    /// `base.member`, or `.member` when the base is implicit.
    MemberAccess {
        base: Option<Node>,
        member: String,
    },
    Call {
        callee: Node,
        arguments: Vec<Argument>,
    },
    /// Parenthesized list; a single unlabeled element is a plain grouping.
    Tuple(Vec<Argument>),
    Prefix {
        operator: String,
        operand: Node,
    },
    /// Binary operators are kept unfolded, left to right in source order.
    Infix {
        lhs: Node,
        operator: String,
        rhs: Node,
    },
    Cast {
        value: Node,
        kind: CastKind,
        target: Node,
    },
    ForceUnwrap(Node),
    /// `#name<T>(args)`
    MacroExpansion {
        name: String,
        generic_arguments: Vec<Node>,
        arguments: Vec<Argument>,
    },
    /// `Name<Args>`; qualified names keep their dots (`Swift.Optional`).
    TypeReference {
        name: String,
        generic_arguments: Vec<Node>,
    },
    /// `T?`
    OptionalType(Node),
    /// `@name<T>(args)`
    Attribute {
        name: String,
        generic_arguments: Vec<Node>,
        arguments: Vec<Argument>,
    },
    VariableDecl {
        attributes: Vec<Node>,
        modifiers: Vec<String>,
        keyword: BindingKeyword,
        bindings: Vec<Node>,
    },
    FunctionDecl {
        attributes: Vec<Node>,
        modifiers: Vec<String>,
        name: String,
        body: Vec<Node>,
    },
    PatternBinding {
        pattern: Node,
        annotation: Option<Node>,
        initializer: Option<Node>,
        accessors: Vec<Node>,
    },
    IdentifierPattern(String),
    TuplePattern(Vec<Node>),
    WildcardPattern,
    Accessor {
        kind: AccessorKind,
        body: Vec<Node>,
    },
}

/// Fieldless tag for each [`Syntax`] shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    StringLiteral,
    IntegerLiteral,
    FloatLiteral,
    BooleanLiteral,
    NilLiteral,
    Identifier,
    MemberAccess,
    Call,
    Tuple,
    Prefix,
    Infix,
    Cast,
    ForceUnwrap,
    MacroExpansion,
    TypeReference,
    OptionalType,
    Attribute,
    VariableDecl,
    FunctionDecl,
    PatternBinding,
    IdentifierPattern,
    TuplePattern,
    WildcardPattern,
    Accessor,
}

impl NodeKind {
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::StringLiteral
                | NodeKind::IntegerLiteral
                | NodeKind::FloatLiteral
                | NodeKind::BooleanLiteral
                | NodeKind::NilLiteral
                | NodeKind::Identifier
                | NodeKind::MemberAccess
                | NodeKind::Call
                | NodeKind::Tuple
                | NodeKind::Prefix
                | NodeKind::Infix
                | NodeKind::Cast
                | NodeKind::ForceUnwrap
                | NodeKind::MacroExpansion
        )
    }

    pub fn is_declaration(self) -> bool {
        matches!(self, NodeKind::VariableDecl | NodeKind::FunctionDecl)
    }
}

// ============================================================================
// NARROWED VIEWS
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct TypeReferenceRef<'a> {
    pub name: &'a str,
    pub generic_arguments: &'a [Node],
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeRef<'a> {
    pub name: &'a str,
    pub generic_arguments: &'a [Node],
    pub arguments: &'a [Argument],
}

#[derive(Debug, Clone, Copy)]
pub struct MacroExpansionRef<'a> {
    pub name: &'a str,
    pub generic_arguments: &'a [Node],
    pub arguments: &'a [Argument],
}

#[derive(Debug, Clone, Copy)]
pub struct CallRef<'a> {
    pub callee: &'a Node,
    pub arguments: &'a [Argument],
}

#[derive(Debug, Clone, Copy)]
pub struct VariableDeclRef<'a> {
    pub attributes: &'a [Node],
    pub modifiers: &'a [String],
    pub keyword: BindingKeyword,
    pub bindings: &'a [Node],
}

#[derive(Debug, Clone, Copy)]
pub struct PatternBindingRef<'a> {
    pub pattern: &'a Node,
    pub annotation: Option<&'a Node>,
    pub initializer: Option<&'a Node>,
    pub accessors: &'a [Node],
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Syntax {
    pub fn kind(&self) -> NodeKind {
        match self {
            Syntax::StringLiteral(_) => NodeKind::StringLiteral,
            Syntax::IntegerLiteral(_) => NodeKind::IntegerLiteral,
            Syntax::FloatLiteral(_) => NodeKind::FloatLiteral,
            Syntax::BooleanLiteral(_) => NodeKind::BooleanLiteral,
            Syntax::NilLiteral => NodeKind::NilLiteral,
            Syntax::Identifier(_) => NodeKind::Identifier,
            Syntax::MemberAccess { .. } => NodeKind::MemberAccess,
            Syntax::Call { .. } => NodeKind::Call,
            Syntax::Tuple(_) => NodeKind::Tuple,
            Syntax::Prefix { .. } => NodeKind::Prefix,
            Syntax::Infix { .. } => NodeKind::Infix,
            Syntax::Cast { .. } => NodeKind::Cast,
            Syntax::ForceUnwrap(_) => NodeKind::ForceUnwrap,
            Syntax::MacroExpansion { .. } => NodeKind::MacroExpansion,
            Syntax::TypeReference { .. } => NodeKind::TypeReference,
            Syntax::OptionalType(_) => NodeKind::OptionalType,
            Syntax::Attribute { .. } => NodeKind::Attribute,
            Syntax::VariableDecl { .. } => NodeKind::VariableDecl,
            Syntax::FunctionDecl { .. } => NodeKind::FunctionDecl,
            Syntax::PatternBinding { .. } => NodeKind::PatternBinding,
            Syntax::IdentifierPattern(_) => NodeKind::IdentifierPattern,
            Syntax::TuplePattern(_) => NodeKind::TuplePattern,
            Syntax::WildcardPattern => NodeKind::WildcardPattern,
            Syntax::Accessor { .. } => NodeKind::Accessor,
        }
    }
}

impl Node {
    /// Wraps a syntax value into a node with the given span.
    pub fn new(syntax: Syntax, span: Span) -> Self {
        WithSpan {
            value: Arc::new(syntax),
            span,
        }
    }

    pub fn syntax(&self) -> &Syntax {
        &self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Node> {
        fn args<'a>(arguments: &'a [Argument]) -> impl Iterator<Item = &'a Node> + 'a {
            arguments.iter().map(|a| &a.expression)
        }

        match &*self.value {
            Syntax::StringLiteral(segments) => segments
                .iter()
                .filter_map(|s| match s {
                    StringSegment::Interpolation(node) => Some(node),
                    StringSegment::Text(_) => None,
                })
                .collect(),
            Syntax::IntegerLiteral(_)
            | Syntax::FloatLiteral(_)
            | Syntax::BooleanLiteral(_)
            | Syntax::NilLiteral
            | Syntax::Identifier(_)
            | Syntax::IdentifierPattern(_)
            | Syntax::WildcardPattern => Vec::new(),
            Syntax::MemberAccess { base, .. } => base.iter().collect(),
            Syntax::Call { callee, arguments } => {
                std::iter::once(callee).chain(args(arguments)).collect()
            }
            Syntax::Tuple(arguments) => args(arguments).collect(),
            Syntax::Prefix { operand, .. } => vec![operand],
            Syntax::Infix { lhs, rhs, .. } => vec![lhs, rhs],
            Syntax::Cast { value, target, .. } => vec![value, target],
            Syntax::ForceUnwrap(inner) | Syntax::OptionalType(inner) => vec![inner],
            Syntax::MacroExpansion {
                generic_arguments,
                arguments,
                ..
            }
            | Syntax::Attribute {
                generic_arguments,
                arguments,
                ..
            } => generic_arguments.iter().chain(args(arguments)).collect(),
            Syntax::TypeReference {
                generic_arguments, ..
            } => generic_arguments.iter().collect(),
            Syntax::VariableDecl {
                attributes,
                bindings,
                ..
            } => attributes.iter().chain(bindings.iter()).collect(),
            Syntax::FunctionDecl {
                attributes, body, ..
            } => attributes.iter().chain(body.iter()).collect(),
            Syntax::PatternBinding {
                pattern,
                annotation,
                initializer,
                accessors,
            } => std::iter::once(pattern)
                .chain(annotation.iter())
                .chain(initializer.iter())
                .chain(accessors.iter())
                .collect(),
            Syntax::TuplePattern(elements) => elements.iter().collect(),
            Syntax::Accessor { body, .. } => body.iter().collect(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn first_child_of_kind(&self, kind: NodeKind) -> Option<&Node> {
        self.children().into_iter().find(|c| c.kind() == kind)
    }

    /// Text of a leaf: identifier or pattern name, numeric literal digits, or
    /// the content of a string literal made of exactly one text segment.
    pub fn text(&self) -> Option<&str> {
        match &*self.value {
            Syntax::Identifier(name) | Syntax::IdentifierPattern(name) => Some(name),
            Syntax::IntegerLiteral(digits) | Syntax::FloatLiteral(digits) => Some(digits),
            Syntax::StringLiteral(segments) => match segments.as_slice() {
                [StringSegment::Text(text)] => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Narrowing
    // ------------------------------------------------------------------------

    pub fn as_string_literal(&self) -> Option<&[StringSegment]> {
        match &*self.value {
            Syntax::StringLiteral(segments) => Some(segments),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match &*self.value {
            Syntax::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<CallRef<'_>> {
        match &*self.value {
            Syntax::Call { callee, arguments } => Some(CallRef { callee, arguments }),
            _ => None,
        }
    }

    pub fn as_macro_expansion(&self) -> Option<MacroExpansionRef<'_>> {
        match &*self.value {
            Syntax::MacroExpansion {
                name,
                generic_arguments,
                arguments,
            } => Some(MacroExpansionRef {
                name,
                generic_arguments,
                arguments,
            }),
            _ => None,
        }
    }

    pub fn as_type_reference(&self) -> Option<TypeReferenceRef<'_>> {
        match &*self.value {
            Syntax::TypeReference {
                name,
                generic_arguments,
            } => Some(TypeReferenceRef {
                name,
                generic_arguments,
            }),
            _ => None,
        }
    }

    /// The wrapped type of `T?`.
    pub fn as_optional_type(&self) -> Option<&Node> {
        match &*self.value {
            Syntax::OptionalType(wrapped) => Some(wrapped),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<AttributeRef<'_>> {
        match &*self.value {
            Syntax::Attribute {
                name,
                generic_arguments,
                arguments,
            } => Some(AttributeRef {
                name,
                generic_arguments,
                arguments,
            }),
            _ => None,
        }
    }

    pub fn as_variable_decl(&self) -> Option<VariableDeclRef<'_>> {
        match &*self.value {
            Syntax::VariableDecl {
                attributes,
                modifiers,
                keyword,
                bindings,
            } => Some(VariableDeclRef {
                attributes,
                modifiers,
                keyword: *keyword,
                bindings,
            }),
            _ => None,
        }
    }

    pub fn as_pattern_binding(&self) -> Option<PatternBindingRef<'_>> {
        match &*self.value {
            Syntax::PatternBinding {
                pattern,
                annotation,
                initializer,
                accessors,
            } => Some(PatternBindingRef {
                pattern,
                annotation: annotation.as_ref(),
                initializer: initializer.as_ref(),
                accessors,
            }),
            _ => None,
        }
    }

    pub fn as_identifier_pattern(&self) -> Option<&str> {
        match &*self.value {
            Syntax::IdentifierPattern(name) => Some(name),
            _ => None,
        }
    }

    /// Attributes attached to a declaration, empty for anything else.
    pub fn attributes(&self) -> &[Node] {
        match &*self.value {
            Syntax::VariableDecl { attributes, .. } | Syntax::FunctionDecl { attributes, .. } => {
                attributes
            }
            _ => &[],
        }
    }

    /// Canonical source text of this node. Same as `to_string()`.
    pub fn source_text(&self) -> String {
        self.to_string()
    }
}
