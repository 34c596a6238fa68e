//! Sigil: checked, compile-time macro expansion.
//!
//! Source text is parsed into an immutable syntax tree ([`syntax`]), macro
//! sites are collected from it ([`sites`]), and each site is dispatched to a
//! registered handler ([`macros`]). A handler either returns the replacement
//! syntax or rejects the site, in which case exactly one
//! [`MacroDiagnostic`] is emitted.
//!
//! ```
//! use sigil::{collect_sites, parse_source, MacroExpander, MacroServices};
//!
//! let file = parse_source("demo.swift", "let u = #urlFromString(\"https://apple.com\")").unwrap();
//! let expander = MacroExpander::standard(MacroServices::default());
//! let outcomes = expander.expand_all(&collect_sites(&file, expander.registry())).unwrap();
//! assert_eq!(outcomes[0].result.as_ref().unwrap().render(), "URL(string: \"https://apple.com\")!");
//! ```

pub use crate::config::EngineConfig;
pub use crate::diagnostics::{DiagnosticBuffer, DiagnosticSink, MacroDiagnostic, MacroFailure, Rejection};
pub use crate::errors::{SigilError, SourceContext};
pub use crate::macros::{
    Expansion, ExpansionError, ExpansionSite, MacroExpander, MacroRegistry, MacroServices, SiteOutcome,
};
pub use crate::sites::collect_sites;
pub use crate::syntax::{parse_source, Node, SourceFile};

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod macros;
pub mod sites;
pub mod syntax;
