//! Macro diagnostics.
//!
//! Every failed expansion produces exactly one [`MacroDiagnostic`], addressed
//! to the node that caused it, and hands it to the site's [`DiagnosticSink`].
//! Severity is always `error`: there is no warning path, every diagnosable
//! condition aborts the expansion that raised it.
//!
//! Identifiers are stable across runs and derive from the macro name and the
//! failure kind, e.g. `sigil::urlFromString.invalid_url_scheme`.

use crate::errors::SourceContext;
use crate::syntax::{Node, Span};
use miette::{Diagnostic, LabeledSpan, SourceCode};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Domain every diagnostic identifier is qualified with.
pub const DIAGNOSTIC_DOMAIN: &str = "sigil";

// ============================================================================
// FAILURE KINDS
// ============================================================================

/// Everything a handler can reject an expansion site for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MacroFailure {
    #[error("You need to provide the argument in the parameter")]
    MissingArgument,
    #[error("The argument you provided is not a String")]
    ArgumentNotString,
    #[error("You need to provide the value type as a generic argument")]
    NoTypeDefined,
    #[error("The declaration must bind exactly one variable")]
    CannotGetBinding,
    #[error("The variable must be bound to a simple name")]
    CannotGetVariableName,
    #[error("Cannot initialize an URL from your provided string")]
    InvalidUrl,
    #[error("{scheme} is not a supported protocol")]
    InvalidUrlScheme { scheme: String },
    #[error("The hostname of this URL is invalid")]
    InvalidUrlHost,
    #[error("\"{name}\" is not a known SF Symbol name")]
    InvalidSymbolName { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureCategory {
    /// The argument or declaration does not have the shape the macro needs.
    Structural,
    /// The shape is right but the content breaks a business rule.
    Domain,
}

impl MacroFailure {
    /// User-facing text.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::MissingArgument => "missing_argument",
            Self::ArgumentNotString => "argument_not_string",
            Self::NoTypeDefined => "no_type_defined",
            Self::CannotGetBinding => "cannot_get_binding",
            Self::CannotGetVariableName => "cannot_get_variable_name",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidUrlScheme { .. } => "invalid_url_scheme",
            Self::InvalidUrlHost => "invalid_url_host",
            Self::InvalidSymbolName { .. } => "invalid_symbol_name",
        }
    }

    pub fn category(&self) -> FailureCategory {
        match self {
            Self::MissingArgument
            | Self::ArgumentNotString
            | Self::NoTypeDefined
            | Self::CannotGetBinding
            | Self::CannotGetVariableName => FailureCategory::Structural,
            Self::InvalidUrl
            | Self::InvalidUrlScheme { .. }
            | Self::InvalidUrlHost
            | Self::InvalidSymbolName { .. } => FailureCategory::Domain,
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::MissingArgument => "argument missing here",
            Self::ArgumentNotString => "expected a plain string literal",
            Self::NoTypeDefined => "generic argument missing here",
            Self::CannotGetBinding => "expected a single binding",
            Self::CannotGetVariableName => "expected an identifier",
            Self::InvalidUrl => "not a URL",
            Self::InvalidUrlScheme { .. } => "unsupported scheme",
            Self::InvalidUrlHost => "missing or empty host",
            Self::InvalidSymbolName { .. } => "unknown symbol",
        }
    }
}

/// A failure together with the node it is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub failure: MacroFailure,
    pub span: Span,
}

impl Rejection {
    pub fn new(failure: MacroFailure, span: Span) -> Self {
        Self { failure, span }
    }

    pub fn at(failure: MacroFailure, node: &Node) -> Self {
        Self::new(failure, node.span)
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

impl From<Severity> for miette::Severity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => miette::Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Domain-qualified, stable message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DiagnosticId {
    pub domain: &'static str,
    pub id: String,
}

impl DiagnosticId {
    pub fn new(macro_name: &str, failure: &MacroFailure) -> Self {
        Self {
            domain: DIAGNOSTIC_DOMAIN,
            id: format!("{}.{}", macro_name, failure.code_suffix()),
        }
    }
}

impl fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.domain, self.id)
    }
}

/// One user-facing message about a failed expansion.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{failure}")]
pub struct MacroDiagnostic {
    pub macro_name: String,
    pub failure: MacroFailure,
    pub severity: Severity,
    pub id: DiagnosticId,
    pub span: Span,
    #[serde(skip)]
    context: Option<SourceContext>,
}

impl MacroDiagnostic {
    pub fn new(macro_name: impl Into<String>, rejection: Rejection) -> Self {
        let macro_name = macro_name.into();
        Self {
            id: DiagnosticId::new(&macro_name, &rejection.failure),
            macro_name,
            failure: rejection.failure,
            severity: Severity::Error,
            span: rejection.span,
            context: None,
        }
    }

    pub fn with_source(mut self, source: SourceContext) -> Self {
        self.context = Some(source);
        self
    }

    pub fn message(&self) -> String {
        self.failure.message()
    }

    pub fn source_context(&self) -> Option<&SourceContext> {
        self.context.as_ref()
    }

    /// `file:line:col: error[id]: message`, or without the location when the
    /// diagnostic has no source attached.
    pub fn render_plain(&self) -> String {
        match &self.context {
            Some(source) => {
                let (line, column) = source.line_col(self.span.start);
                format!(
                    "{}:{}:{}: {}[{}]: {}",
                    source.name(),
                    line,
                    column,
                    self.severity,
                    self.id,
                    self.failure
                )
            }
            None => format!("{}[{}]: {}", self.severity, self.id, self.failure),
        }
    }
}

impl Diagnostic for MacroDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.id))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(self.severity.into())
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let len = self.span.len().max(1);
        let label = LabeledSpan::new(
            Some(self.failure.primary_label().to_string()),
            self.span.start,
            len,
        );
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.context
            .as_ref()
            .map(|s| s.named_source() as &dyn SourceCode)
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Receiver for diagnostics raised while expanding one site.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: MacroDiagnostic);
}

impl DiagnosticSink for Vec<MacroDiagnostic> {
    fn emit(&mut self, diagnostic: MacroDiagnostic) {
        self.push(diagnostic);
    }
}

/// Ordered, site-local collection of diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticBuffer {
    diagnostics: Vec<MacroDiagnostic>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MacroDiagnostic> {
        self.diagnostics.iter()
    }

    pub fn as_slice(&self) -> &[MacroDiagnostic] {
        &self.diagnostics
    }

    pub fn into_vec(self) -> Vec<MacroDiagnostic> {
        self.diagnostics
    }
}

impl DiagnosticSink for DiagnosticBuffer {
    fn emit(&mut self, diagnostic: MacroDiagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl IntoIterator for DiagnosticBuffer {
    type Item = MacroDiagnostic;
    type IntoIter = std::vec::IntoIter<MacroDiagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_qualified_by_macro_and_kind() {
        let failure = MacroFailure::InvalidUrlScheme {
            scheme: "ftp".into(),
        };
        let id = DiagnosticId::new("urlFromString", &failure);
        assert_eq!(id.to_string(), "sigil::urlFromString.invalid_url_scheme");
        assert_eq!(failure.message(), "ftp is not a supported protocol");
    }

    #[test]
    fn categories_split_shape_from_content() {
        assert_eq!(
            MacroFailure::ArgumentNotString.category(),
            FailureCategory::Structural
        );
        assert_eq!(MacroFailure::InvalidUrlHost.category(), FailureCategory::Domain);
    }

    #[test]
    fn plain_rendering_includes_location_when_source_is_known() {
        let source = SourceContext::from_file("main.swift", "let a = 1\nlet u = #urlFromString(\"\")");
        let diagnostic = MacroDiagnostic::new(
            "urlFromString",
            Rejection::new(MacroFailure::InvalidUrl, Span::new(32, 34)),
        )
        .with_source(source);
        assert_eq!(
            diagnostic.render_plain(),
            "main.swift:2:23: error[sigil::urlFromString.invalid_url]: \
             Cannot initialize an URL from your provided string"
        );
    }

    #[test]
    fn severity_is_always_error() {
        let diagnostic = MacroDiagnostic::new(
            "systemImage",
            Rejection::new(MacroFailure::MissingArgument, Span::default()),
        );
        assert_eq!(diagnostic.severity(), Some(miette::Severity::Error));
        assert!(diagnostic.source_code().is_none());
    }
}
