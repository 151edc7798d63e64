use std::collections::HashMap;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Parser, Query, QueryCursor};
use tree_sitter_yaral::{GRAMMAR, HIGHLIGHTS_QUERY, LANGUAGE, NODE_TYPES};

const SOURCE: &str = r#"// Flags hosts contacting known bad domains.
rule bad_domains {
  meta:
    severity = "HIGH"
  events:
    re.regex($e.network.dns.questions.name, `.*\.evil$`)
    $e.principal.ip not in cidr %corp_ranges
  match:
    $host over 1h
  condition:
    $e and 5 > 1
}
"#;

fn highlights() -> HashMap<String, Vec<String>> {
    let language = Language::new(LANGUAGE);
    let query = Query::new(&language, HIGHLIGHTS_QUERY).unwrap();
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();
    let tree = parser.parse(SOURCE, None).unwrap();
    assert!(!tree.root_node().has_error(), "{}", tree.root_node().to_sexp());

    let mut by_capture: HashMap<String, Vec<String>> = HashMap::new();
    let mut cursor = QueryCursor::new();
    let mut captures = cursor.captures(&query, tree.root_node(), SOURCE.as_bytes());
    while let Some((m, index)) = captures.next() {
        let capture = m.captures[*index];
        let name = query.capture_names()[capture.index as usize];
        let text = capture.node.utf8_text(SOURCE.as_bytes()).unwrap();
        by_capture
            .entry(name.to_string())
            .or_default()
            .push(text.to_string());
    }
    by_capture
}

#[test]
fn highlights_query_compiles() {
    let language = Language::new(LANGUAGE);
    let query = Query::new(&language, HIGHLIGHTS_QUERY).unwrap();
    assert!(query.capture_names().contains(&"keyword"));
}

#[test]
fn highlights_cover_the_rule() {
    let captures = highlights();
    let has = |capture: &str, text: &str| {
        captures
            .get(capture)
            .is_some_and(|texts| texts.iter().any(|t| t == text))
    };

    assert!(has("keyword", "rule"));
    assert!(has("keyword", "events"));
    assert!(has("keyword.operator", "and"));
    assert!(has("keyword.modifier", "cidr"));
    assert!(has("function", "bad_domains"));
    assert!(has("module", "re"));
    assert!(has("function.call", "regex"));
    assert!(has("variable", "e"));
    assert!(has("property", ".principal.ip"));
    assert!(has("property", "severity"));
    assert!(has("constant", "corp_ranges"));
    assert!(has("string", "\"HIGH\""));
    assert!(has("number", "1h"));
    assert!(has("comment", "// Flags hosts contacting known bad domains."));
}

#[test]
fn node_types_name_real_node_kinds() {
    let language = Language::new(LANGUAGE);
    let node_types: serde_json::Value = serde_json::from_str(NODE_TYPES).unwrap();
    let node_types = node_types.as_array().unwrap();
    assert!(!node_types.is_empty());

    for node in node_types {
        let kind = node["type"].as_str().unwrap();
        let named = node["named"].as_bool().unwrap();
        assert_ne!(language.id_for_node_kind(kind, named), 0, "{kind}");
    }

    let roots: Vec<_> = node_types
        .iter()
        .filter(|node| node["root"] == true)
        .map(|node| node["type"].as_str().unwrap())
        .collect();
    assert_eq!(roots, ["source_file"]);
}

#[test]
fn grammar_is_the_yaral_grammar() {
    let grammar: serde_json::Value = serde_json::from_str(GRAMMAR).unwrap();
    assert_eq!(grammar["name"], "yaral");
    assert_eq!(grammar["word"], "identifier");
}
