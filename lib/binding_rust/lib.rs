//! This crate provides YARA-L 2.0 language support for the [tree-sitter] parsing library.
//!
//! Typically, you will use the [`LANGUAGE`] constant to add this language to a
//! tree-sitter [`Parser`], and then use the parser to parse some code:
//!
//! ```
//! let code = r#"
//! rule suspicious_login {
//!   events:
//!     $e.metadata.event_type != "USER_LOGIN"
//!   condition:
//!     $e and $f
//! }
//! "#;
//! let mut parser = tree_sitter::Parser::new();
//! let language = tree_sitter_yaral::LANGUAGE;
//! parser
//!     .set_language(&language.into())
//!     .expect("Error loading YARA-L parser");
//! let tree = parser.parse(code, None).unwrap();
//! assert!(!tree.root_node().has_error());
//! ```
//!
//! The parse tables are generated from `src/grammar.json` when the crate is
//! built, so the language object is plain static data.
//!
//! [`Parser`]: https://docs.rs/tree-sitter/*/tree_sitter/struct.Parser.html
//! [tree-sitter]: https://tree-sitter.github.io/

use tree_sitter_language::LanguageFn;

#[path = "../src_rust/mod.rs"]
mod grammar;

pub use grammar::language::TSLanguage;

/// Returns the YARA-L language object.
///
/// Every call returns the address of the same immutable `static`, so the
/// pointer is never null and may be shared freely between threads.
#[no_mangle]
pub extern "C" fn tree_sitter_yaral() -> *const TSLanguage {
    &grammar::parser::LANGUAGE.0
}

unsafe extern "C" fn raw_language() -> *const () {
    tree_sitter_yaral().cast()
}

/// The tree-sitter [`LanguageFn`] for this grammar.
pub const LANGUAGE: LanguageFn = unsafe { LanguageFn::from_raw(raw_language) };

/// The content of the [`node-types.json`] file for this grammar.
///
/// [`node-types.json`]: https://tree-sitter.github.io/tree-sitter/using-parsers/6-static-node-types
pub const NODE_TYPES: &str = include_str!(concat!(env!("OUT_DIR"), "/node-types.json"));

/// The syntax highlighting query for this language.
pub const HIGHLIGHTS_QUERY: &str = include_str!("../queries/highlights.scm");

/// The grammar the parse tables were generated from.
pub const GRAMMAR: &str = include_str!("../src/grammar.json");
