use std::{fs, path::Path};

use tree_sitter::Parser;

struct Example {
    name: String,
    input: String,
    output: String,
}

fn is_header(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '=')
}

fn is_divider(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

fn parse_examples(text: &str) -> Vec<Example> {
    let mut examples = Vec::new();
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        if !is_header(line) {
            continue;
        }
        let name = lines.next().unwrap_or_default().trim().to_string();
        lines.next();

        let mut input = String::new();
        for line in lines.by_ref() {
            if is_divider(line) {
                break;
            }
            input.push_str(line);
            input.push('\n');
        }

        let mut output = String::new();
        while let Some(line) = lines.next_if(|line| !is_header(line)) {
            output.push_str(line);
            output.push(' ');
        }

        examples.push(Example {
            name,
            input: input.trim().to_string(),
            output: normalize(&output),
        });
    }
    examples
}

fn normalize(sexp: &str) -> String {
    sexp.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" )", ")")
}

#[test]
fn corpus() {
    let _ = pretty_env_logger::formatted_builder()
        .is_test(true)
        .parse_env("RUST_LOG")
        .try_init();

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_yaral::LANGUAGE.into())
        .unwrap();

    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("test/corpus");
    let mut paths: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no corpus files in {}", dir.display());

    let mut failures = Vec::new();
    let mut count = 0;
    for path in paths {
        let text = fs::read_to_string(&path).unwrap();
        for example in parse_examples(&text) {
            count += 1;
            let tree = parser.parse(&example.input, None).unwrap();
            let actual = normalize(&tree.root_node().to_sexp());
            if actual == example.output {
                log::info!("ok: {}", example.name);
            } else {
                failures.push(format!(
                    "{}: {}\n  expected: {}\n  actual:   {}",
                    path.display(),
                    example.name,
                    example.output,
                    actual
                ));
            }
        }
    }

    assert!(count > 0);
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}
