//! # Sigil Macro Expansion System
//!
//! Expansion is a pure, synchronous, single-pass transformation of one
//! [`ExpansionSite`] into a synthesized fragment. Handlers read the site's
//! syntax tree, narrow its arguments with the extractors in [`extract`],
//! check business rules with the validators in [`validate`], and build a
//! replacement from the helpers in [`crate::syntax::build`].
//!
//! A handler never touches a diagnostic sink. It returns a [`Rejection`]
//! naming the failure and the node at fault, and the [`MacroExpander`] turns
//! that into exactly one diagnostic plus a typed [`ExpansionError`].
//!
//! Two roles exist:
//!
//! - **Expression** macros (`#name(args)`) replace the expansion expression
//!   with a single expression fragment.
//! - **Accessor** macros (`@name<T>` on a variable) produce a getter and a
//!   setter for the declaration they are attached to.

use crate::diagnostics::Rejection;
use crate::errors::SourceContext;
use crate::syntax::{Argument, Node, NodeKind};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

pub mod error;
mod expander;
pub mod extract;
mod registry;
mod std_macros;
pub mod validate;

pub use error::ExpansionError;
pub use expander::{MacroExpander, SiteOutcome};
pub use registry::{MacroEntry, MacroRegistry};
pub use std_macros::STANDARD_MACROS;
pub use validate::{SymbolCatalog, SymbolSet, UrlPolicy};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Handler for a freestanding expression macro.
pub type ExpressionMacroFn = fn(&ExpansionSite, &MacroServices) -> Result<Node, Rejection>;

/// Handler for an attached accessor macro.
pub type AccessorMacroFn = fn(&ExpansionSite, &MacroServices) -> Result<Vec<Node>, Rejection>;

/// A native macro definition.
#[derive(Clone, Copy)]
pub enum MacroDef {
    Expression(ExpressionMacroFn),
    Accessor(AccessorMacroFn),
}

impl MacroDef {
    pub fn role(&self) -> MacroRole {
        match self {
            MacroDef::Expression(_) => MacroRole::Expression,
            MacroDef::Accessor(_) => MacroRole::Accessor,
        }
    }
}

impl fmt::Debug for MacroDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroDef::Expression(_) => f.write_str("MacroDef::Expression(<fn>)"),
            MacroDef::Accessor(_) => f.write_str("MacroDef::Accessor(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroRole {
    /// `#name(args)`
    Expression,
    /// `@name<T>` on a declaration.
    Accessor,
}

impl fmt::Display for MacroRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroRole::Expression => f.write_str("expression"),
            MacroRole::Accessor => f.write_str("accessor"),
        }
    }
}

/// One macro invocation.
///
/// `node` is the `#name(...)` expression for freestanding sites and the
/// attribute for attached ones. Attached sites also carry the declaration
/// the attribute decorates.
#[derive(Debug, Clone)]
pub struct ExpansionSite {
    pub macro_name: String,
    pub role: MacroRole,
    pub node: Node,
    pub declaration: Option<Node>,
    pub source: SourceContext,
}

impl ExpansionSite {
    /// A site for a `#name(...)` expression. Returns `None` if `node` is not
    /// a macro expansion expression.
    pub fn freestanding(node: Node, source: SourceContext) -> Option<Self> {
        let macro_name = node.as_macro_expansion()?.name.to_string();
        Some(Self {
            macro_name,
            role: MacroRole::Expression,
            node,
            declaration: None,
            source,
        })
    }

    /// A site for an attribute attached to `declaration`. Returns `None` if
    /// `attribute` is not an attribute node.
    pub fn attached(attribute: Node, declaration: Node, source: SourceContext) -> Option<Self> {
        let macro_name = attribute.as_attribute()?.name.to_string();
        Some(Self {
            macro_name,
            role: MacroRole::Accessor,
            node: attribute,
            declaration: Some(declaration),
            source,
        })
    }

    /// Argument list of the invocation, possibly empty.
    pub fn arguments(&self) -> &[Argument] {
        if let Some(expansion) = self.node.as_macro_expansion() {
            return expansion.arguments;
        }
        match self.node.as_attribute() {
            Some(attribute) => attribute.arguments,
            None => &[],
        }
    }

    /// Generic arguments written on the invocation, possibly empty.
    pub fn generic_arguments(&self) -> &[Node] {
        if let Some(expansion) = self.node.as_macro_expansion() {
            return expansion.generic_arguments;
        }
        match self.node.as_attribute() {
            Some(attribute) => attribute.generic_arguments,
            None => &[],
        }
    }

    pub fn is_attached(&self) -> bool {
        self.node.kind() == NodeKind::Attribute
    }
}

/// What a successful expansion produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Replacement for the expansion expression.
    Expression(Node),
    /// Accessors for the attached declaration, getter first. Empty when the
    /// macro does not apply to the declaration.
    Accessors(Vec<Node>),
}

impl Expansion {
    /// Canonical source text; accessors are separated by newlines.
    pub fn render(&self) -> String {
        match self {
            Expansion::Expression(node) => node.to_string(),
            Expansion::Accessors(accessors) => accessors
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ============================================================================
// HOST CAPABILITIES
// ============================================================================

/// External key-value store the accessor macro reads and writes.
///
/// The receiver path always has at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyValueStore {
    /// First segment of the store instance path, e.g. `NSUbiquitousKeyValueStore`.
    receiver_root: String,
    /// Member accesses after the root, e.g. `default`.
    receiver_members: Vec<String>,
    pub read_method: String,
    pub write_method: String,
    pub key_label: String,
}

impl KeyValueStore {
    /// A store reached through `receiver`, a dotted path split into segments.
    /// Returns `None` for an empty path.
    pub fn new<I, S>(
        receiver: I,
        read_method: impl Into<String>,
        write_method: impl Into<String>,
        key_label: impl Into<String>,
    ) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = receiver.into_iter().map(Into::into);
        let receiver_root = segments.next()?;
        Some(Self {
            receiver_root,
            receiver_members: segments.collect(),
            read_method: read_method.into(),
            write_method: write_method.into(),
            key_label: key_label.into(),
        })
    }

    pub fn receiver_root(&self) -> &str {
        &self.receiver_root
    }

    pub fn receiver_members(&self) -> &[String] {
        &self.receiver_members
    }

    /// The receiver path joined with dots.
    pub fn receiver_path(&self) -> String {
        std::iter::once(self.receiver_root.as_str())
            .chain(self.receiver_members.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self {
            receiver_root: "NSUbiquitousKeyValueStore".into(),
            receiver_members: vec!["default".into()],
            read_method: "object".into(),
            write_method: "set".into(),
            key_label: "forKey".into(),
        }
    }
}

/// Capabilities injected into every handler.
#[derive(Clone, Default)]
pub struct MacroServices {
    pub url_policy: UrlPolicy,
    pub store: KeyValueStore,
    /// Symbol catalog; `None` skips symbol-name validation.
    pub symbols: Option<Arc<dyn SymbolCatalog>>,
}

impl MacroServices {
    pub fn with_symbols(mut self, catalog: Arc<dyn SymbolCatalog>) -> Self {
        self.symbols = Some(catalog);
        self
    }
}

impl fmt::Debug for MacroServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroServices")
            .field("url_policy", &self.url_policy)
            .field("store", &self.store)
            .field("symbols", &self.symbols.as_ref().map(|_| "<catalog>"))
            .finish()
    }
}
