use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use tree_sitter_yaral_generate::{generate, Config};

fn main() -> Result<()> {
    let manifest_dir =
        PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR is not set")?);
    let out_dir = PathBuf::from(env::var_os("OUT_DIR").context("OUT_DIR is not set")?);

    let grammar_path = manifest_dir.join("src").join("grammar.json");
    let config_path = manifest_dir.join("tree-sitter.json");
    println!("cargo:rerun-if-changed={}", grammar_path.display());
    println!("cargo:rerun-if-changed={}", config_path.display());

    let grammar = fs::read_to_string(&grammar_path)
        .with_context(|| format!("failed to read {}", grammar_path.display()))?;
    let config = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = Config::from_json(&config).context("invalid tree-sitter.json")?;

    let generated = generate(&grammar, &config).context("failed to generate the yaral parser")?;
    for conflict in &generated.unresolved_conflicts {
        println!("cargo:warning={conflict}");
    }

    let parser_path = out_dir.join("parser.rs");
    fs::write(&parser_path, generated.parser_source)
        .with_context(|| format!("failed to write {}", parser_path.display()))?;
    let node_types_path = out_dir.join("node-types.json");
    fs::write(&node_types_path, generated.node_types_json)
        .with_context(|| format!("failed to write {}", node_types_path.display()))?;
    Ok(())
}
