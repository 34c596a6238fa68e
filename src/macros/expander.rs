//! Routes expansion sites to their handlers.
//!
//! ## Failure handling
//!
//! A handler rejection fails only its own site: the expander emits one
//! diagnostic for it to the site's sink and returns
//! [`ExpansionError::Rejected`]. Unknown names and role mismatches are host
//! contract violations; they emit nothing and stop a batch at that site.
//!
//! ## Concurrency
//!
//! Sites share no mutable state. Each batch entry point gives every site its
//! own [`DiagnosticBuffer`], so [`MacroExpander::expand_all_parallel`]
//! produces exactly what [`MacroExpander::expand_all`] does.

use crate::diagnostics::{DiagnosticBuffer, DiagnosticSink, MacroDiagnostic, Rejection};
use crate::macros::{
    Expansion, ExpansionError, ExpansionSite, MacroDef, MacroRegistry, MacroRole, MacroServices,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Result of one site within a batch.
#[derive(Debug, Clone)]
pub struct SiteOutcome {
    pub site: ExpansionSite,
    pub result: Result<Expansion, ExpansionError>,
    pub diagnostics: DiagnosticBuffer,
}

impl SiteOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Dispatcher from macro names to handlers.
#[derive(Debug, Clone)]
pub struct MacroExpander<'r> {
    registry: &'r MacroRegistry,
    services: MacroServices,
}

impl MacroExpander<'static> {
    /// An expander over the standard registry.
    pub fn standard(services: MacroServices) -> Self {
        Self::new(MacroRegistry::standard(), services)
    }
}

impl<'r> MacroExpander<'r> {
    pub fn new(registry: &'r MacroRegistry, services: MacroServices) -> Self {
        Self { registry, services }
    }

    pub fn registry(&self) -> &'r MacroRegistry {
        self.registry
    }

    pub fn services(&self) -> &MacroServices {
        &self.services
    }

    /// Expands one site. Diagnostics for a rejected site go to `sink`.
    pub fn expand(
        &self,
        site: &ExpansionSite,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Expansion, ExpansionError> {
        let entry = self
            .registry
            .lookup(&site.macro_name)
            .ok_or_else(|| ExpansionError::UnknownMacro {
                name: site.macro_name.clone(),
            })?;

        debug!(
            "Expanding {} macro '{}' at {}..{}",
            site.role, site.macro_name, site.node.span.start, site.node.span.end
        );

        let result = match (entry.def, site.role) {
            (MacroDef::Expression(handler), MacroRole::Expression) => {
                handler(site, &self.services).map(Expansion::Expression)
            }
            (MacroDef::Accessor(handler), MacroRole::Accessor) => {
                handler(site, &self.services).map(Expansion::Accessors)
            }
            (def, found) => {
                return Err(ExpansionError::RoleMismatch {
                    name: site.macro_name.clone(),
                    expected: def.role(),
                    found,
                })
            }
        };

        result.map_err(|rejection| self.reject(site, rejection, sink))
    }

    /// Expands every site in order, stopping at the first fatal error.
    pub fn expand_all(&self, sites: &[ExpansionSite]) -> Result<Vec<SiteOutcome>, ExpansionError> {
        let outcomes = sites
            .iter()
            .map(|site| self.outcome(site))
            .collect::<Result<Vec<_>, _>>()?;
        log_summary(&outcomes);
        Ok(outcomes)
    }

    /// Same result as [`expand_all`](Self::expand_all), computed on the rayon
    /// pool. When several sites are fatal the earliest one is reported.
    pub fn expand_all_parallel(
        &self,
        sites: &[ExpansionSite],
    ) -> Result<Vec<SiteOutcome>, ExpansionError> {
        let outcomes: Vec<Result<SiteOutcome, ExpansionError>> =
            sites.par_iter().map(|site| self.outcome(site)).collect();
        let outcomes = outcomes.into_iter().collect::<Result<Vec<_>, _>>()?;
        log_summary(&outcomes);
        Ok(outcomes)
    }

    fn outcome(&self, site: &ExpansionSite) -> Result<SiteOutcome, ExpansionError> {
        let mut diagnostics = DiagnosticBuffer::new();
        match self.expand(site, &mut diagnostics) {
            Err(error) if error.is_fatal() => {
                warn!("Aborting expansion batch: {error}");
                Err(error)
            }
            result => Ok(SiteOutcome {
                site: site.clone(),
                result,
                diagnostics,
            }),
        }
    }

    fn reject(
        &self,
        site: &ExpansionSite,
        rejection: Rejection,
        sink: &mut dyn DiagnosticSink,
    ) -> ExpansionError {
        let failure = rejection.failure.clone();
        let diagnostic =
            MacroDiagnostic::new(site.macro_name.as_str(), rejection).with_source(site.source.clone());
        debug!("Rejected '{}': {}", site.macro_name, diagnostic.id);
        sink.emit(diagnostic);
        ExpansionError::Rejected {
            macro_name: site.macro_name.clone(),
            failure,
        }
    }
}

fn log_summary(outcomes: &[SiteOutcome]) {
    let expanded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        "Expanded {} site(s): {} ok, {} rejected",
        outcomes.len(),
        expanded,
        outcomes.len() - expanded
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MacroFailure;
    use crate::errors::SourceContext;
    use crate::syntax::parse_expression;

    fn site(text: &str) -> ExpansionSite {
        let node = parse_expression(text).unwrap();
        ExpansionSite::freestanding(node, SourceContext::from_file("t.swift", text)).unwrap()
    }

    #[test]
    fn missing_argument_is_recoverable_for_every_expression_macro() {
        let expander = MacroExpander::standard(MacroServices::default());
        for name in ["stringify", "urlFromString", "systemImage"] {
            let mut sink: Vec<MacroDiagnostic> = Vec::new();
            let error = expander.expand(&site(&format!("#{}()", name)), &mut sink).unwrap_err();
            assert!(!error.is_fatal());
            assert_eq!(error.failure(), Some(&MacroFailure::MissingArgument));
            assert_eq!(sink.len(), 1);
            assert_eq!(sink[0].id.id, format!("{}.missing_argument", name));
        }
    }

    #[test]
    fn unknown_names_are_fatal_and_silent() {
        let expander = MacroExpander::standard(MacroServices::default());
        let mut sink: Vec<MacroDiagnostic> = Vec::new();
        let error = expander.expand(&site("#colorLiteral(1)"), &mut sink).unwrap_err();
        assert!(error.is_fatal());
        assert!(sink.is_empty());
    }

    #[test]
    fn freestanding_use_of_an_accessor_macro_is_a_role_mismatch() {
        let expander = MacroExpander::standard(MacroServices::default());
        let mut sink: Vec<MacroDiagnostic> = Vec::new();
        let error = expander
            .expand(&site("#iCloudKeyValue<String>()"), &mut sink)
            .unwrap_err();
        assert_eq!(
            error,
            ExpansionError::RoleMismatch {
                name: "iCloudKeyValue".into(),
                expected: MacroRole::Accessor,
                found: MacroRole::Expression,
            }
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn batches_stop_at_the_first_fatal_site() {
        let expander = MacroExpander::standard(MacroServices::default());
        let sites = vec![site("#stringify(1)"), site("#nope(1)"), site("#alsoNope(1)")];
        let error = expander.expand_all(&sites).unwrap_err();
        assert_eq!(error, ExpansionError::UnknownMacro { name: "nope".into() });
        let error = expander.expand_all_parallel(&sites).unwrap_err();
        assert_eq!(error, ExpansionError::UnknownMacro { name: "nope".into() });
    }
}
