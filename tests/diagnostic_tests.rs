//! Rendered diagnostic output.
//!
//! Reports are rendered with miette's uncolored graphical handler so the
//! assertions see the text a user would.

mod common;

use common::{expand_one, only_diagnostic, services_with_catalog};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use sigil::{parse_source, MacroServices, SigilError};

fn render(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .with_width(120)
        .render_report(&mut out, diagnostic)
        .unwrap();
    out
}

#[test]
fn macro_diagnostic_report_shows_code_message_and_label() {
    let outcome = expand_one(
        "let feed = #urlFromString(\"ftp://www.apple.com\")",
        MacroServices::default(),
    );
    let report = render(only_diagnostic(&outcome));
    assert!(report.contains("sigil::urlFromString.invalid_url_scheme"), "{report}");
    assert!(report.contains("ftp is not a supported protocol"), "{report}");
    assert!(report.contains("unsupported scheme"), "{report}");
    assert!(report.contains("test.swift:1:27"), "{report}");
    assert!(report.contains("#urlFromString(\"ftp://www.apple.com\")"), "{report}");
}

#[test]
fn symbol_diagnostic_points_at_the_literal() {
    let source = "let icon = #systemImage(\"dragon\")";
    let outcome = expand_one(source, services_with_catalog());
    let diagnostic = only_diagnostic(&outcome);
    let label = diagnostic.labels().unwrap().next().unwrap();
    assert_eq!(label.offset(), source.find("\"dragon\"").unwrap());
    assert_eq!(label.len(), "\"dragon\"".len());
    assert_eq!(label.label(), Some("unknown symbol"));
}

#[test]
fn accessor_diagnostics_render_against_the_attribute() {
    let outcome = expand_one("@iCloudKeyValue var count: Int = 0", MacroServices::default());
    let diagnostic = only_diagnostic(&outcome);
    assert_eq!(
        diagnostic.render_plain(),
        "test.swift:1:1: error[sigil::iCloudKeyValue.no_type_defined]: \
         You need to provide the value type as a generic argument"
    );
    let report = render(diagnostic);
    assert!(report.contains("generic argument missing here"), "{report}");
}

#[test]
fn diagnostics_serialize_with_their_failure_kind() {
    let outcome = expand_one("#urlFromString(\"https://\")", MacroServices::default());
    let value = serde_json::to_value(only_diagnostic(&outcome)).unwrap();
    assert_eq!(value["macro_name"], "urlFromString");
    assert_eq!(value["failure"]["kind"], "invalid_url_host");
    assert_eq!(value["severity"], "error");
}

#[test]
fn parse_errors_are_miette_reports() {
    let error = parse_source("broken.swift", "let = 3").unwrap_err();
    assert!(matches!(error, SigilError::Parse { .. }));
    assert_eq!(error.code().map(|c| c.to_string()).as_deref(), Some("sigil::parse"));
    let report = render(&error);
    assert!(report.contains("broken.swift"), "{report}");
    assert!(report.contains("let = 3"), "{report}");
}
