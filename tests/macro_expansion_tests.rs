//! End-to-end expansion: parse, collect sites, expand, inspect output.

mod common;

use common::{accessors, expand_one, expand_source, only_diagnostic, rendered, services_with_catalog};
use sigil::diagnostics::{FailureCategory, MacroFailure};
use sigil::macros::validate::{validate_url, UrlPolicy};
use sigil::syntax::parse_expression;
use sigil::{collect_sites, parse_source, ExpansionSite, MacroExpander, MacroServices, SourceContext};

// ---
// Freestanding URL macro
// ---

#[test]
fn url_from_valid_literal_force_constructs_the_same_text() {
    let outcome = expand_one(
        r#"let site = #urlFromString("https://apple.com")"#,
        MacroServices::default(),
    );
    assert_eq!(rendered(&outcome), r#"URL(string: "https://apple.com")!"#);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn url_with_unsupported_scheme_fails_with_one_diagnostic() {
    let outcome = expand_one(
        r#"let site = #urlFromString("ftp://www.apple.com")"#,
        MacroServices::default(),
    );
    let diagnostic = only_diagnostic(&outcome);
    assert_eq!(
        diagnostic.failure,
        MacroFailure::InvalidUrlScheme {
            scheme: "ftp".into()
        }
    );
    assert_eq!(diagnostic.id.to_string(), "sigil::urlFromString.invalid_url_scheme");
    assert_eq!(diagnostic.message(), "ftp is not a supported protocol");
    assert_eq!(
        outcome.result.as_ref().unwrap_err().failure(),
        Some(&diagnostic.failure)
    );
}

#[test]
fn url_failures_follow_parse_scheme_host_priority() {
    let policy = UrlPolicy::default();
    let scheme = |s: &str| MacroFailure::InvalidUrlScheme { scheme: s.into() };
    let cases: &[(&str, Result<(), MacroFailure>)] = &[
        ("https://apple.com", Ok(())),
        ("http://example.org/path?q=1#top", Ok(())),
        ("HTTPS://APPLE.COM", Ok(())),
        ("", Err(MacroFailure::InvalidUrl)),
        ("https://apple .com", Err(MacroFailure::InvalidUrl)),
        ("http://[::1", Err(MacroFailure::InvalidUrl)),
        ("apple.com", Err(scheme("?"))),
        ("ftp://www.apple.com", Err(scheme("ftp"))),
        ("mailto:someone@apple.com", Err(scheme("mailto"))),
        ("file:///etc/hosts", Err(scheme("file"))),
        // The scheme rule wins over the host rule.
        ("ftp://", Err(scheme("ftp"))),
        ("https://", Err(MacroFailure::InvalidUrlHost)),
        // No authority after the colon means no host.
        ("https:apple.com", Err(MacroFailure::InvalidUrlHost)),
        ("https:/apple.com", Err(MacroFailure::InvalidUrlHost)),
        ("https:\\\\apple.com", Err(MacroFailure::InvalidUrl)),
        ("http://apple.com\\path", Err(MacroFailure::InvalidUrl)),
    ];
    for (text, expected) in cases {
        assert_eq!(&validate_url(text, &policy), expected, "validating {text:?}");
    }
}

#[test]
fn url_policy_can_narrow_the_allowed_schemes() {
    let services = MacroServices {
        url_policy: UrlPolicy {
            allowed_schemes: vec!["https".into()],
        },
        ..MacroServices::default()
    };
    let outcome = expand_one(r#"#urlFromString("http://apple.com")"#, services);
    assert_eq!(
        only_diagnostic(&outcome).failure,
        MacroFailure::InvalidUrlScheme {
            scheme: "http".into()
        }
    );
}

#[test]
fn non_literal_arguments_are_structural_failures() {
    for source in [
        "#urlFromString(address)",
        r#"#urlFromString("https://\(host)")"#,
        r#"#systemImage("star" + suffix)"#,
    ] {
        let outcome = expand_one(source, MacroServices::default());
        let diagnostic = only_diagnostic(&outcome);
        assert_eq!(diagnostic.failure, MacroFailure::ArgumentNotString, "{source}");
        assert_eq!(diagnostic.failure.category(), FailureCategory::Structural);
    }
}

// ---
// Symbol images
// ---

#[test]
fn known_symbols_build_an_image() {
    let outcome = expand_one(r#"Label(icon: #systemImage("star.fill"))"#, services_with_catalog());
    assert_eq!(rendered(&outcome), r#"Image(systemName: "star.fill")"#);
}

#[test]
fn unknown_symbols_are_diagnosed_at_the_argument() {
    let source = r#"#systemImage("dragon")"#;
    let outcome = expand_one(source, services_with_catalog());
    let diagnostic = only_diagnostic(&outcome);
    assert_eq!(
        diagnostic.failure,
        MacroFailure::InvalidSymbolName {
            name: "dragon".into()
        }
    );
    assert_eq!(diagnostic.failure.category(), FailureCategory::Domain);
    assert_eq!(&source[diagnostic.span.start..diagnostic.span.end], r#""dragon""#);
}

#[test]
fn without_a_catalog_symbol_names_are_not_checked() {
    let outcome = expand_one(r#"#systemImage("dragon")"#, MacroServices::default());
    assert_eq!(rendered(&outcome), r#"Image(systemName: "dragon")"#);
}

#[test]
fn catalogs_can_be_plain_closures() {
    let services = MacroServices::default()
        .with_symbols(std::sync::Arc::new(|name: &str| name.starts_with("circle")));
    let ok = expand_one(r#"#systemImage("circle.fill")"#, services.clone());
    assert!(ok.is_success());
    let rejected = expand_one(r#"#systemImage("square")"#, services);
    assert!(!rejected.is_success());
}

// ---
// Stringify
// ---

#[test]
fn stringify_pairs_each_argument_with_its_text() {
    let outcome = expand_one("let pair = #stringify(width * 2 + offset)", MacroServices::default());
    assert_eq!(rendered(&outcome), r#"(width * 2 + offset, "width * 2 + offset")"#);
}

#[test]
fn stringify_text_is_stable_under_reparsing() {
    for source in [
        "a + b",
        r#"format(value, style: .short)"#,
        r#"items.first!.name ?? "none""#,
        "(x, y: -1)",
        r#"#urlFromString("https://apple.com")"#,
        "value as? Int",
    ] {
        let once = parse_expression(source).unwrap().to_string();
        let twice = parse_expression(&once).unwrap().to_string();
        assert_eq!(once, twice, "text of {source:?}");
    }
}

#[test]
fn stringify_escapes_string_arguments() {
    let outcome = expand_one(r#"#stringify("say \"hi\"")"#, MacroServices::default());
    assert_eq!(rendered(&outcome), r#"("say \"hi\"", "\"say \\\"hi\\\"\"")"#);
}

#[test]
fn missing_arguments_are_diagnosed_not_fatal() {
    let outcomes = expand_source(
        "#stringify()\n#urlFromString()\n#systemImage()",
        MacroServices::default(),
    );
    assert_eq!(outcomes.len(), 3);
    for outcome in &outcomes {
        let diagnostic = only_diagnostic(outcome);
        assert_eq!(diagnostic.failure, MacroFailure::MissingArgument);
        assert_eq!(diagnostic.span, outcome.site.node.span);
    }
}

// ---
// Accessor macro
// ---

#[test]
fn non_optional_value_falls_back_to_the_initializer() {
    let outcome = expand_one(
        r#"@iCloudKeyValue<String> var userCity: String = "Tokyo""#,
        MacroServices::default(),
    );
    assert_eq!(
        accessors(&outcome),
        [
            "get {\n    (NSUbiquitousKeyValueStore.default.object(forKey: \"userCity\") as? String) ?? \"Tokyo\"\n}",
            "set {\n    NSUbiquitousKeyValueStore.default.set(newValue, forKey: \"userCity\")\n}",
        ]
    );
}

#[test]
fn optional_value_falls_back_to_nil() {
    for source in [
        "@iCloudKeyValue<Optional<String>> var nickname: String?",
        "@iCloudKeyValue<Swift.Optional<String>> var nickname: String?",
        "@iCloudKeyValue<String?> var nickname: String?",
    ] {
        let outcome = expand_one(source, MacroServices::default());
        assert_eq!(
            accessors(&outcome)[0],
            "get {\n    (NSUbiquitousKeyValueStore.default.object(forKey: \"nickname\") as? String) ?? nil\n}",
            "{source}"
        );
    }
}

#[test]
fn optional_value_ignores_the_initializer() {
    let outcome = expand_one(
        r#"@iCloudKeyValue<String?> var motto: String? = "carpe diem""#,
        MacroServices::default(),
    );
    let getter = &accessors(&outcome)[0];
    assert!(getter.ends_with("as? String) ?? nil\n}"), "{getter}");
    assert!(!getter.contains("carpe diem"));
}

#[test]
fn non_optional_value_without_initializer_has_no_fallback() {
    let outcome = expand_one("@iCloudKeyValue<Int> var launches: Int", MacroServices::default());
    assert_eq!(
        accessors(&outcome)[0],
        "get {\n    (NSUbiquitousKeyValueStore.default.object(forKey: \"launches\") as? Int)\n}"
    );
}

#[test]
fn accessor_macro_requires_a_generic_type() {
    let outcome = expand_one("@iCloudKeyValue var launches: Int = 0", MacroServices::default());
    let diagnostic = only_diagnostic(&outcome);
    assert_eq!(diagnostic.failure, MacroFailure::NoTypeDefined);
    assert_eq!(diagnostic.span, outcome.site.node.span);
}

#[test]
fn accessor_macro_requires_one_simple_binding() {
    let outcome = expand_one("@iCloudKeyValue<Int> var a = 1, b = 2", MacroServices::default());
    assert_eq!(only_diagnostic(&outcome).failure, MacroFailure::CannotGetBinding);

    let outcome = expand_one("@iCloudKeyValue<Int> var (a, b): Int", MacroServices::default());
    assert_eq!(
        only_diagnostic(&outcome).failure,
        MacroFailure::CannotGetVariableName
    );
}

#[test]
fn accessor_macro_on_a_function_contributes_nothing() {
    let outcome = expand_one("@iCloudKeyValue<Int> func refresh() {}", MacroServices::default());
    assert!(accessors(&outcome).is_empty());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn unrelated_attributes_are_not_sites() {
    let outcomes = expand_source(
        "@MainActor @iCloudKeyValue<Bool> var synced: Bool = false",
        MacroServices::default(),
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].site.macro_name, "iCloudKeyValue");
}

// ---
// Batch properties
// ---

const MIXED_BATCH: &str = r#"
import SwiftUI

@iCloudKeyValue<String> var userCity: String = "Tokyo"
let good = #urlFromString("https://apple.com")
let bad = #urlFromString("ftp://www.apple.com")
let icon = #systemImage("dragon")
let pair = #stringify(good)
"#;

#[test]
fn failing_sites_do_not_affect_valid_ones() {
    let batch = expand_source(MIXED_BATCH, services_with_catalog());
    assert_eq!(batch.len(), 5);
    let ok: Vec<bool> = batch.iter().map(|o| o.is_success()).collect();
    assert_eq!(ok, [true, true, false, false, true]);

    let alone = expand_one(r#"#urlFromString("https://apple.com")"#, services_with_catalog());
    assert_eq!(rendered(&batch[1]), rendered(&alone));
    assert_eq!(rendered(&batch[4]), r#"(good, "good")"#);
}

#[test]
fn expansion_has_no_hidden_state() {
    let first = expand_source(MIXED_BATCH, services_with_catalog());
    let second = expand_source(MIXED_BATCH, services_with_catalog());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.result, b.result);
        let failures = |o: &sigil::SiteOutcome| o.diagnostics.iter().map(|d| d.failure.clone()).collect::<Vec<_>>();
        assert_eq!(failures(a), failures(b));
    }
}

#[test]
fn parallel_expansion_matches_sequential() {
    let file = parse_source("batch.swift", &MIXED_BATCH.repeat(20)).unwrap();
    let expander = MacroExpander::standard(services_with_catalog());
    let sites = collect_sites(&file, expander.registry());
    let sequential = expander.expand_all(&sites).unwrap();
    let parallel = expander.expand_all_parallel(&sites).unwrap();
    assert_eq!(sequential.len(), 100);
    for (a, b) in sequential.iter().zip(&parallel) {
        assert_eq!(a.site.node.span, b.site.node.span);
        assert_eq!(a.result, b.result);
        let ids = |o: &sigil::SiteOutcome| o.diagnostics.iter().map(|d| d.id.to_string()).collect::<Vec<_>>();
        assert_eq!(ids(a), ids(b));
    }
}

#[test]
fn builtin_pound_forms_leave_neighbouring_sites_alone() {
    let source = "let u = #urlFromString(\"https://apple.com\")\n\
                  print(#function)\n\
                  #warning(\"later\")";
    let outcomes = expand_source(source, MacroServices::default());
    assert_eq!(outcomes.len(), 1);
    assert_eq!(rendered(&outcomes[0]), r#"URL(string: "https://apple.com")!"#);
}

#[test]
fn hand_built_sites_with_unknown_names_abort_the_batch() {
    let expander = MacroExpander::standard(MacroServices::default());
    let text = "#warning(\"later\")";
    let node = parse_expression(text).unwrap();
    let unknown = ExpansionSite::freestanding(node, SourceContext::from_file("t.swift", text)).unwrap();
    let file = parse_source("t.swift", "#stringify(1)").unwrap();
    let mut sites = collect_sites(&file, expander.registry());
    sites.push(unknown);
    let error = expander.expand_all(&sites).unwrap_err();
    assert!(error.is_fatal());
    assert_eq!(error.to_string(), "no macro named 'warning' is registered");
}
