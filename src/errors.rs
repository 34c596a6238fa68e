//! Sigil error handling.
//!
//! `SigilError` covers everything that stops the engine from producing
//! expansions at all: unreadable input, malformed source, bad configuration
//! and host contract violations. Per-site macro failures are not errors at
//! this level; they are diagnostics (see [`crate::diagnostics`]).

use crate::macros::ExpansionError;
use crate::syntax::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Shared, named source text for diagnostic rendering.
///
/// Cloning is cheap: every expansion site of a file holds the same context.
#[derive(Debug, Clone)]
pub struct SourceContext {
    name: Arc<str>,
    source: Arc<NamedSource<String>>,
}

impl SourceContext {
    /// Create a source context from real file content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            source: Arc::new(NamedSource::new(name.clone(), content.into())),
            name: name.into(),
        }
    }

    /// Create a fallback when real source is unavailable, e.g. for sites
    /// built by hand in tests.
    pub fn fallback(context: &str) -> Self {
        Self::from_file("fallback", format!("// {}", context))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &str {
        self.source.inner()
    }

    pub fn named_source(&self) -> &NamedSource<String> {
        &self.source
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let content = self.content();
        let offset = offset.min(content.len());
        let before = content.get(..offset).unwrap_or(content);
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        (line, column)
    }

    /// Convert to NamedSource for use with miette error reporting.
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::clone(&self.source)
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// ENGINE ERRORS
// ============================================================================

#[derive(Error, Diagnostic, Debug)]
pub enum SigilError {
    #[error("Parse error: {message}")]
    #[diagnostic(code(sigil::parse))]
    Parse {
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Cannot read '{path}'")]
    #[diagnostic(code(sigil::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(sigil::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Expansion(#[from] ExpansionError),
}

impl SigilError {
    pub fn parse(message: impl Into<String>, source: &SourceContext, span: Span) -> Self {
        SigilError::Parse {
            message: message.into(),
            src: source.to_named_source(),
            span: span.into(),
        }
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        SigilError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SigilError::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Stable classification used by fixtures and exit codes.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SigilError::Parse { .. } => "parse",
            SigilError::Io { .. } => "io",
            SigilError::Config { .. } => "config",
            SigilError::Expansion(_) => "expansion",
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: SigilError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
