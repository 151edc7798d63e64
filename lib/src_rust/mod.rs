//! The YARA-L language object.
//!
//! `language` mirrors the runtime's ABI, `parser` fills it in from the
//! generated tables, and `lexer` provides the lex functions it points to.

pub mod language;
pub mod lexer;
pub mod parser;
