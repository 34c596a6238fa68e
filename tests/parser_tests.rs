// tests/parser_tests.rs

use sigil::syntax::{parse_accessor, parse_expression, parse_type, NodeKind, Syntax};
use sigil::{collect_sites, parse_source, MacroRegistry, SigilError};

const CLIENT: &str = include_str!("fixtures/client.swift");

#[test]
fn client_fixture_parses_into_top_level_items() {
    let file = parse_source("client.swift", CLIENT).unwrap();
    let kinds: Vec<NodeKind> = file.items.iter().map(|item| item.kind()).collect();
    // Imports are read and dropped.
    assert_eq!(kinds.len(), 11);
    assert_eq!(kinds.iter().filter(|k| **k == NodeKind::VariableDecl).count(), 9);
    assert_eq!(kinds.iter().filter(|k| **k == NodeKind::Call).count(), 2);
}

#[test]
fn client_fixture_has_every_kind_of_site() {
    let file = parse_source("client.swift", CLIENT).unwrap();
    let sites = collect_sites(&file, MacroRegistry::standard());
    let names: Vec<&str> = sites.iter().map(|s| s.macro_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "stringify",
            "urlFromString",
            "urlFromString",
            "systemImage",
            "systemImage",
            "iCloudKeyValue",
            "iCloudKeyValue",
        ]
    );
}

#[test]
fn attributes_on_their_own_line_attach_to_the_next_declaration() {
    let file = parse_source("t.swift", "@iCloudKeyValue<String>\nvar userCity: String = \"Tokyo\"").unwrap();
    assert_eq!(file.items.len(), 1);
    let decl = file.items[0].as_variable_decl().unwrap();
    assert_eq!(decl.attributes.len(), 1);
    let attribute = decl.attributes[0].as_attribute().unwrap();
    assert_eq!(attribute.name, "iCloudKeyValue");
    assert_eq!(attribute.generic_arguments[0].to_string(), "String");
}

#[test]
fn rendering_round_trips_through_the_reader() {
    for source in [
        r#"URL(string: "https://apple.com")!"#,
        r#"(NSUbiquitousKeyValueStore.default.object(forKey: "userCity") as? String) ?? "Tokyo""#,
        "items.first!.count + -offset",
        r#""tab\tnewline\nquote\"""#,
        "#stringify(a + b)",
        ".automatic",
    ] {
        let node = parse_expression(source).unwrap();
        assert_eq!(node.to_string(), source);
    }
}

#[test]
fn declarations_render_canonically() {
    let file = parse_source(
        "t.swift",
        "@iCloudKeyValue<Int?>   var   lastOpened :Int?\nprivate let (a, _) = pair",
    )
    .unwrap();
    assert_eq!(file.items[0].to_string(), "@iCloudKeyValue<Int?> var lastOpened: Int?");
    assert_eq!(file.items[1].to_string(), "private let (a, _) = pair");
}

#[test]
fn accessors_and_types_have_their_own_entry_points() {
    let getter = parse_accessor("get { store.object(forKey: \"k\") as? Int }").unwrap();
    assert_eq!(getter.kind(), NodeKind::Accessor);
    assert_eq!(getter.to_string(), "get {\n    store.object(forKey: \"k\") as? Int\n}");

    assert!(parse_type("Swift.Optional<[String]>").is_err());

    let nested = parse_type("Optional<Dictionary<String, Int>>").unwrap();
    assert_eq!(nested.to_string(), "Optional<Dictionary<String, Int>>");
}

#[test]
fn interpolations_are_kept_as_child_expressions() {
    let node = parse_expression(r#""area \(width * height) m2""#).unwrap();
    let Syntax::StringLiteral(segments) = node.syntax() else {
        panic!("expected a string literal");
    };
    assert_eq!(segments.len(), 3);
    assert_eq!(node.children()[0].to_string(), "width * height");
    assert_eq!(node.text(), None);
}

#[test]
fn spans_cover_the_source_text() {
    let source = "let homepage = #urlFromString(\"https://apple.com\")";
    let file = parse_source("t.swift", source).unwrap();
    let sites = collect_sites(&file, MacroRegistry::standard());
    let span = sites[0].node.span;
    assert_eq!(&source[span.start..span.end], "#urlFromString(\"https://apple.com\")");
}

#[test]
fn syntax_errors_report_a_location() {
    let error = parse_source("bad.swift", "let x = #urlFromString(\"https://apple.com\"").unwrap_err();
    let SigilError::Parse { span, .. } = &error else {
        panic!("expected a parse error, got {error:?}");
    };
    assert!(span.offset() > 0);
}
