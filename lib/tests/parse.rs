use tree_sitter::{InputEdit, Parser, Point, Tree};

fn parse(source: &str) -> Tree {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_yaral::LANGUAGE.into())
        .unwrap();
    parser.parse(source, None).unwrap()
}

const LOGIN_RULE: &str = r#"rule failed_logins {
  meta:
    author = "secops"
  events:
    $fail.metadata.event_type != "USER_LOGIN"
    $fail.principal.ip in %blocked_ips
  match:
    $user over 15m
  condition:
    $fail and $user
}
"#;

#[test]
fn rule_fields_are_exposed() {
    let tree = parse(LOGIN_RULE);
    let root = tree.root_node();
    assert_eq!(root.kind(), "source_file");
    assert!(!root.has_error(), "{}", root.to_sexp());

    let rule = root.named_child(0).unwrap();
    assert_eq!(rule.kind(), "rule_definition");
    let name = rule.child_by_field_name("name").unwrap();
    assert_eq!(name.utf8_text(LOGIN_RULE.as_bytes()).unwrap(), "failed_logins");

    let keys: Vec<_> = rule
        .named_children(&mut rule.walk())
        .filter(|child| child.kind() == "section")
        .map(|section| {
            let key = section.named_child(0).unwrap();
            key.utf8_text(LOGIN_RULE.as_bytes()).unwrap()
        })
        .collect();
    assert_eq!(keys, ["meta", "events", "match", "condition"]);
}

#[test]
fn binary_operator_is_a_field() {
    let source = "rule r { condition: $a or $b }";
    let tree = parse(source);
    let binary = tree
        .root_node()
        .descendant_for_byte_range(20, 28)
        .unwrap();
    assert_eq!(binary.kind(), "binary_expression");
    let operator = binary.child_by_field_name("operator").unwrap();
    assert_eq!(operator.kind(), "or");
    assert!(!operator.is_named());
    assert_eq!(
        binary
            .child_by_field_name("right")
            .unwrap()
            .utf8_text(source.as_bytes())
            .unwrap(),
        "$b"
    );
}

#[test]
fn keywords_need_a_word_boundary() {
    // `rules` and `overall` are identifiers, not keywords.
    let source = "rule rules { condition: $overall and $e }";
    let tree = parse(source);
    assert!(!tree.root_node().has_error(), "{}", tree.root_node().to_sexp());

    let source = "ruleset x {}";
    assert!(parse(source).root_node().has_error());
}

#[test]
fn equality_against_a_variable_is_an_assignment() {
    for (source, left) in [
        ("rule a { events: 1 = $x }", "integer_literal"),
        (r#"rule a { events: "a" = $x }"#, "interpreted_string_literal"),
        ("rule a { events: f() = $x }", "call_expression"),
        ("rule a { events: 1 + 2 = $x }", "binary_expression"),
        ("rule a { events: $x + 1 = $y }", "binary_expression"),
        ("rule a { events: $x[1] = $y }", "index_expression"),
    ] {
        let tree = parse(source);
        let root = tree.root_node();
        assert!(!root.has_error(), "{}", root.to_sexp());
        let section = root.named_child(0).unwrap().named_child(1).unwrap();
        let statement = section.named_child(1).unwrap();
        assert_eq!(statement.kind(), "assignment_statement", "{}", root.to_sexp());
        assert_eq!(statement.child_by_field_name("left").unwrap().kind(), left);
        assert_eq!(
            statement.child_by_field_name("right").unwrap().kind(),
            "variable_identifier"
        );
    }
}

#[test]
fn strings_keep_escapes_as_children() {
    let source = r#"rule r { events: $e.target.file.full_path = "C:\\Windows\\" }"#;
    let tree = parse(source);
    let root = tree.root_node();
    assert!(!root.has_error(), "{}", root.to_sexp());

    let mut cursor = root.walk();
    let mut escapes = 0;
    let mut visit = vec![root];
    while let Some(node) = visit.pop() {
        if node.kind() == "escape_sequence" {
            escapes += 1;
            assert_eq!(node.utf8_text(source.as_bytes()).unwrap(), "\\\\");
        }
        visit.extend(node.children(&mut cursor));
    }
    assert_eq!(escapes, 2);
}

#[test]
fn broken_rules_are_recovered() {
    let tree = parse("rule r { events: $e.x != }\nrule s {}");
    let root = tree.root_node();
    assert!(root.has_error());
    // The rule after the error still parses.
    let last = root.named_child(root.named_child_count() - 1).unwrap();
    assert_eq!(last.kind(), "rule_definition");

    let tree = parse("rule {");
    assert!(tree.root_node().has_error());
}

#[test]
fn unterminated_string_is_an_error() {
    let tree = parse("rule r { meta: author = \"unterminated\n}");
    assert!(tree.root_node().has_error());
}

#[test]
fn edits_reparse_incrementally() {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_yaral::LANGUAGE.into())
        .unwrap();

    let before = "rule r { condition: $a and $b }";
    let mut tree = parser.parse(before, None).unwrap();

    let after = "rule r { condition: $a or $b }";
    let start = before.find("and").unwrap();
    tree.edit(&InputEdit {
        start_byte: start,
        old_end_byte: start + 3,
        new_end_byte: start + 2,
        start_position: Point::new(0, start),
        old_end_position: Point::new(0, start + 3),
        new_end_position: Point::new(0, start + 2),
    });
    let new_tree = parser.parse(after, Some(&tree)).unwrap();
    assert!(!new_tree.root_node().has_error());
    assert_eq!(
        new_tree.root_node().to_sexp(),
        parser.parse(after, None).unwrap().root_node().to_sexp()
    );
    assert!(tree.changed_ranges(&new_tree).next().is_some());
}
