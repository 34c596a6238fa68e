//! Shared helpers for the integration suites.

#![allow(dead_code)]

use sigil::diagnostics::MacroDiagnostic;
use sigil::macros::SymbolSet;
use sigil::{collect_sites, parse_source, Expansion, MacroExpander, MacroServices, SiteOutcome};
use std::sync::Arc;

/// Symbol names known to the test catalog.
pub const TEST_SYMBOLS: &[&str] = &["calendar", "star.fill", "person.crop.circle"];

pub fn services_with_catalog() -> MacroServices {
    MacroServices::default().with_symbols(Arc::new(SymbolSet::from_names(TEST_SYMBOLS.iter().copied())))
}

/// Parses `text` and expands every site in it.
pub fn expand_source(text: &str, services: MacroServices) -> Vec<SiteOutcome> {
    let file = parse_source("test.swift", text).expect("test source must parse");
    let expander = MacroExpander::standard(services);
    let sites = collect_sites(&file, expander.registry());
    expander.expand_all(&sites).expect("no fatal sites in test source")
}

/// The one outcome of a single-site source.
pub fn expand_one(text: &str, services: MacroServices) -> SiteOutcome {
    let mut outcomes = expand_source(text, services);
    assert_eq!(outcomes.len(), 1, "expected exactly one site in {text:?}");
    outcomes.remove(0)
}

/// Rendered replacement of a site that must succeed.
pub fn rendered(outcome: &SiteOutcome) -> String {
    match &outcome.result {
        Ok(expansion) => expansion.render(),
        Err(error) => panic!("expected {} to expand, got {error}", outcome.site.macro_name),
    }
}

pub fn accessors(outcome: &SiteOutcome) -> Vec<String> {
    match &outcome.result {
        Ok(Expansion::Accessors(nodes)) => nodes.iter().map(ToString::to_string).collect(),
        other => panic!("expected accessors, got {other:?}"),
    }
}

/// The single diagnostic of a rejected site.
pub fn only_diagnostic(outcome: &SiteOutcome) -> &MacroDiagnostic {
    assert!(!outcome.is_success(), "expected a rejection");
    assert_eq!(outcome.diagnostics.len(), 1, "exactly one diagnostic per failure");
    &outcome.diagnostics.as_slice()[0]
}
