//! Compiles a tree-sitter `grammar.json` into static parse tables.
//!
//! [`generate`] runs the whole pipeline: the grammar is parsed and
//! prepared, LR(1) tables are built and minimized, and the result is
//! rendered as Rust source together with `node-types.json`.

pub mod config;
pub mod error;
pub mod grammar;
pub mod node_types;
pub mod prepare;
pub mod render;
pub mod tables;
pub mod token_set;

use log::{info, warn};

pub use crate::{
    config::Config,
    error::{GenerateError, GenerateResult},
    tables::UnresolvedConflict,
};

/// Everything the language crate's build script writes out.
#[derive(Debug)]
pub struct GeneratedParser {
    /// Rust items to be included next to the language ABI definitions.
    pub parser_source: String,
    pub node_types_json: String,
    /// Conflicts kept as parallel actions without being declared.
    pub unresolved_conflicts: Vec<UnresolvedConflict>,
}

pub fn generate(grammar_json: &str, config: &Config) -> GenerateResult<GeneratedParser> {
    let input = grammar::parse_grammar(grammar_json)?;
    config.grammar(&input.name)?;
    let version = config.version()?;

    let grammar = prepare::prepare_grammar(&input)?;
    let tables = tables::build_tables(&grammar)?;
    for conflict in &tables.unresolved_conflicts {
        warn!("{conflict}");
    }

    let parser_source = render::render_parser(&grammar, &tables, version)?;
    let node_types = node_types::generate_node_types(&grammar);
    let node_types_json = serde_json::to_string_pretty(&node_types)?;

    info!(
        "generated `{}`: {} symbols, {} states, {} unresolved conflicts",
        grammar.name,
        grammar.symbol_count(),
        tables.parse_table.states.len(),
        tables.unresolved_conflicts.len()
    );
    Ok(GeneratedParser {
        parser_source,
        node_types_json,
        unresolved_conflicts: tables.unresolved_conflicts,
    })
}
