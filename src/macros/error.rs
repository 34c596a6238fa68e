//! Typed expansion failures.

use crate::diagnostics::MacroFailure;
use crate::macros::MacroRole;
use miette::Diagnostic;
use thiserror::Error;

/// Why an expansion site produced no fragment.
///
/// `Rejected` is the ordinary per-site failure: a diagnostic has already
/// been emitted and other sites proceed. The remaining variants mean the host
/// routed a site the engine cannot have been declared for; they carry no
/// diagnostic and abort the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ExpansionError {
    #[error("{macro_name}: {failure}")]
    #[diagnostic(code(sigil::expansion::rejected))]
    Rejected {
        macro_name: String,
        failure: MacroFailure,
    },

    #[error("no macro named '{name}' is registered")]
    #[diagnostic(
        code(sigil::expansion::unknown_macro),
        help("run `sigil list-macros` to see the available macros")
    )]
    UnknownMacro { name: String },

    #[error("macro '{name}' is an {expected} macro but was used as an {found} macro")]
    #[diagnostic(code(sigil::expansion::role_mismatch))]
    RoleMismatch {
        name: String,
        expected: MacroRole,
        found: MacroRole,
    },
}

impl ExpansionError {
    /// Fatal errors abort the batch instead of failing a single site.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ExpansionError::Rejected { .. })
    }

    pub fn failure(&self) -> Option<&MacroFailure> {
        match self {
            ExpansionError::Rejected { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
