#![allow(dead_code, non_upper_case_globals, clippy::unreadable_literal)]

//! The generated parse tables and the language object built from them.
//!
//! `parser.rs` in `OUT_DIR` is written by the build script from
//! `src/grammar.json`.

use std::ffi::c_char;

use super::language::*;
use super::lexer::{ts_lex, ts_lex_keywords};

include!(concat!(env!("OUT_DIR"), "/parser.rs"));

const _: () = assert!(LANGUAGE_VERSION == LANGUAGE_VERSION_WITH_RESERVED_WORDS);

pub static LANGUAGE: StaticLanguage = StaticLanguage(TSLanguage {
    abi_version: LANGUAGE_VERSION,
    symbol_count: SYMBOL_COUNT as u32,
    alias_count: ALIAS_COUNT as u32,
    token_count: TOKEN_COUNT as u32,
    external_token_count: EXTERNAL_TOKEN_COUNT as u32,
    state_count: STATE_COUNT as u32,
    large_state_count: LARGE_STATE_COUNT as u32,
    production_id_count: PRODUCTION_ID_COUNT as u32,
    field_count: FIELD_COUNT as u32,
    max_alias_sequence_length: MAX_ALIAS_SEQUENCE_LENGTH as u16,
    parse_table: PARSE_TABLE.as_ptr().cast::<u16>(),
    small_parse_table: SMALL_PARSE_TABLE.as_ptr(),
    small_parse_table_map: SMALL_PARSE_TABLE_MAP.as_ptr(),
    parse_actions: PARSE_ACTIONS.as_ptr(),
    symbol_names: SYMBOL_NAMES.0.as_ptr(),
    field_names: FIELD_NAMES.0.as_ptr(),
    field_map_slices: FIELD_MAP_SLICES.as_ptr(),
    field_map_entries: FIELD_MAP_ENTRIES.as_ptr(),
    symbol_metadata: SYMBOL_METADATA.as_ptr(),
    public_symbol_map: PUBLIC_SYMBOL_MAP.as_ptr(),
    alias_map: NON_TERMINAL_ALIAS_MAP.as_ptr(),
    alias_sequences: ALIAS_SEQUENCES.as_ptr(),
    lex_modes: LEX_MODES.as_ptr(),
    lex_fn: Some(ts_lex),
    keyword_lex_fn: Some(ts_lex_keywords),
    keyword_capture_token: WORD_TOKEN,
    external_scanner: TSExternalScanner::NONE,
    primary_state_ids: PRIMARY_STATE_IDS.as_ptr(),
    name: LANGUAGE_NAME.as_ptr().cast::<c_char>(),
    reserved_words: RESERVED_WORDS.as_ptr(),
    max_reserved_word_set_size: 0,
    supertype_count: 0,
    supertype_symbols: SUPERTYPE_SYMBOLS.as_ptr(),
    supertype_map_slices: SUPERTYPE_MAP_SLICES.as_ptr(),
    supertype_map_entries: SUPERTYPE_MAP_ENTRIES.as_ptr(),
    metadata: LANGUAGE_METADATA,
});
