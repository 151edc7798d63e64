#![allow(dead_code, non_upper_case_globals, non_snake_case)]

//! `repr(C)` mirrors of the structures a generated language hands to the
//! tree-sitter runtime (ABI version 15), plus the `const fn` constructors
//! the generated tables are written with.
//!
//! The readers at the bottom implement the runtime's table lookups over a
//! language object. The runtime never calls them; they exist so the tables
//! can be inspected without going through a parser.

use std::ffi::{c_char, c_void};
use std::ptr;

pub type TSSymbol = u16;
pub type TSStateId = u16;
pub type TSFieldId = u16;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const LANGUAGE_VERSION_WITH_RESERVED_WORDS: u32 = 15;

pub const ts_builtin_sym_error: TSSymbol = u16::MAX;
pub const ts_builtin_sym_error_repeat: TSSymbol = ts_builtin_sym_error - 1;

pub type TSSymbolType = u32;
pub const TSSymbolTypeRegular: TSSymbolType = 0;
pub const TSSymbolTypeAnonymous: TSSymbolType = 1;
pub const TSSymbolTypeSupertype: TSSymbolType = 2;
pub const TSSymbolTypeAuxiliary: TSSymbolType = 3;

pub const TSParseActionTypeShift: u8 = 0;
pub const TSParseActionTypeReduce: u8 = 1;
pub const TSParseActionTypeAccept: u8 = 2;
pub const TSParseActionTypeRecover: u8 = 3;

// ---------------------------------------------------------------------------
// ABI structures
// ---------------------------------------------------------------------------

/// The lexer interface the runtime passes to `lex_fn` and `keyword_lex_fn`.
#[repr(C)]
pub struct TSLexer {
    pub lookahead: i32,
    pub result_symbol: TSSymbol,
    pub advance: Option<unsafe extern "C" fn(*mut TSLexer, bool)>,
    pub mark_end: Option<unsafe extern "C" fn(*mut TSLexer)>,
    pub get_column: Option<unsafe extern "C" fn(*mut TSLexer) -> u32>,
    pub is_at_included_range_start: Option<unsafe extern "C" fn(*const TSLexer) -> bool>,
    pub eof: Option<unsafe extern "C" fn(*const TSLexer) -> bool>,
    pub log: Option<unsafe extern "C" fn(*const TSLexer, *const c_char, ...)>,
}

/// The `external_scanner` member. YARA-L has no external tokens, so every
/// field stays empty.
#[repr(C)]
pub struct TSExternalScanner {
    pub states: *const bool,
    pub symbol_map: *const TSSymbol,
    pub create: Option<unsafe extern "C" fn() -> *mut c_void>,
    pub destroy: Option<unsafe extern "C" fn(*mut c_void)>,
    pub scan: Option<unsafe extern "C" fn(*mut c_void, *mut TSLexer, *const bool) -> bool>,
    pub serialize: Option<unsafe extern "C" fn(*mut c_void, *mut c_char) -> u32>,
    pub deserialize: Option<unsafe extern "C" fn(*mut c_void, *const c_char, u32)>,
}

impl TSExternalScanner {
    pub const NONE: Self = Self {
        states: ptr::null(),
        symbol_map: ptr::null(),
        create: None,
        destroy: None,
        scan: None,
        serialize: None,
        deserialize: None,
    };
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TSLanguageMetadata {
    pub major_version: u8,
    pub minor_version: u8,
    pub patch_version: u8,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TSLexerMode {
    pub lex_state: u16,
    pub external_lex_state: u16,
    pub reserved_word_set_id: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TSSymbolMetadata {
    pub visible: bool,
    pub named: bool,
    pub supertype: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TSFieldMapEntry {
    pub field_id: TSFieldId,
    pub child_index: u8,
    pub inherited: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TSMapSlice {
    pub index: u16,
    pub length: u16,
}

/// A parse action. Which member is live is given by `type_`, which every
/// member starts with.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TSParseAction {
    pub shift: TSParseActionShift,
    pub reduce: TSParseActionReduce,
    pub type_: u8,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TSParseActionShift {
    pub type_: u8,
    pub state: TSStateId,
    pub extra: bool,
    pub repetition: bool,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TSParseActionReduce {
    pub type_: u8,
    pub child_count: u8,
    pub symbol: TSSymbol,
    pub dynamic_precedence: i16,
    pub production_id: u16,
}

/// `parse_actions` holds runs of one header entry followed by `count`
/// actions.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TSParseActionEntry {
    pub action: TSParseAction,
    pub entry: TSParseActionEntryData,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TSParseActionEntryData {
    pub count: u8,
    pub reusable: bool,
}

/// The language object itself, field for field as the runtime reads it.
#[repr(C)]
pub struct TSLanguage {
    pub abi_version: u32,
    pub symbol_count: u32,
    pub alias_count: u32,
    pub token_count: u32,
    pub external_token_count: u32,
    pub state_count: u32,
    pub large_state_count: u32,
    pub production_id_count: u32,
    pub field_count: u32,
    pub max_alias_sequence_length: u16,
    pub parse_table: *const u16,
    pub small_parse_table: *const u16,
    pub small_parse_table_map: *const u32,
    pub parse_actions: *const TSParseActionEntry,
    pub symbol_names: *const *const c_char,
    pub field_names: *const *const c_char,
    pub field_map_slices: *const TSMapSlice,
    pub field_map_entries: *const TSFieldMapEntry,
    pub symbol_metadata: *const TSSymbolMetadata,
    pub public_symbol_map: *const TSSymbol,
    pub alias_map: *const u16,
    pub alias_sequences: *const TSSymbol,
    pub lex_modes: *const TSLexerMode,
    pub lex_fn: Option<unsafe extern "C" fn(*mut TSLexer, TSStateId) -> bool>,
    pub keyword_lex_fn: Option<unsafe extern "C" fn(*mut TSLexer, TSStateId) -> bool>,
    pub keyword_capture_token: TSSymbol,
    pub external_scanner: TSExternalScanner,
    pub primary_state_ids: *const TSStateId,
    pub name: *const c_char,
    pub reserved_words: *const TSSymbol,
    pub max_reserved_word_set_size: u16,
    pub supertype_count: u32,
    pub supertype_symbols: *const TSSymbol,
    pub supertype_map_slices: *const TSMapSlice,
    pub supertype_map_entries: *const TSSymbol,
    pub metadata: TSLanguageMetadata,
}

/// A language object that can live in a `static`.
///
/// Everything it points to is itself `static` and never written, so
/// sharing it between threads is sound.
#[repr(transparent)]
pub struct StaticLanguage(pub TSLanguage);

unsafe impl Sync for StaticLanguage {}

/// A table of NUL-terminated names, like `symbol_names`.
#[repr(transparent)]
pub struct NameTable<const N: usize>(pub [*const c_char; N]);

unsafe impl<const N: usize> Sync for NameTable<N> {}

// ---------------------------------------------------------------------------
// Compile-time layout assertions
// ---------------------------------------------------------------------------

const _: () = assert!(std::mem::size_of::<TSLexerMode>() == 6);
const _: () = assert!(std::mem::size_of::<TSParseActionReduce>() == 8);
const _: () = assert!(std::mem::size_of::<TSParseActionShift>() == 6);
const _: () = assert!(std::mem::size_of::<TSParseAction>() == 8);
const _: () = assert!(std::mem::size_of::<TSParseActionEntryData>() == 2);
const _: () = assert!(std::mem::size_of::<TSParseActionEntry>() == 8);
const _: () = assert!(std::mem::size_of::<TSLanguageMetadata>() == 3);
const _: () = assert!(std::mem::size_of::<TSSymbolMetadata>() == 3);
const _: () = assert!(std::mem::size_of::<TSFieldMapEntry>() == 4);
const _: () = assert!(std::mem::size_of::<TSMapSlice>() == 4);

// ---------------------------------------------------------------------------
// Table constructors
// ---------------------------------------------------------------------------

pub const fn entry(count: u8, reusable: bool) -> TSParseActionEntry {
    TSParseActionEntry {
        entry: TSParseActionEntryData { count, reusable },
    }
}

const fn shift_action(state: TSStateId, extra: bool, repetition: bool) -> TSParseActionEntry {
    TSParseActionEntry {
        action: TSParseAction {
            shift: TSParseActionShift {
                type_: TSParseActionTypeShift,
                state,
                extra,
                repetition,
            },
        },
    }
}

pub const fn shift(state: TSStateId) -> TSParseActionEntry {
    shift_action(state, false, false)
}

pub const fn shift_repeat(state: TSStateId) -> TSParseActionEntry {
    shift_action(state, false, true)
}

pub const fn shift_extra() -> TSParseActionEntry {
    shift_action(0, true, false)
}

pub const fn reduce(
    symbol: TSSymbol,
    child_count: u8,
    dynamic_precedence: i16,
    production_id: u16,
) -> TSParseActionEntry {
    TSParseActionEntry {
        action: TSParseAction {
            reduce: TSParseActionReduce {
                type_: TSParseActionTypeReduce,
                child_count,
                symbol,
                dynamic_precedence,
                production_id,
            },
        },
    }
}

pub const fn accept() -> TSParseActionEntry {
    TSParseActionEntry {
        action: TSParseAction {
            type_: TSParseActionTypeAccept,
        },
    }
}

pub const fn recover() -> TSParseActionEntry {
    TSParseActionEntry {
        action: TSParseAction {
            type_: TSParseActionTypeRecover,
        },
    }
}

pub const fn lex_mode(lex_state: u16) -> TSLexerMode {
    TSLexerMode {
        lex_state,
        external_lex_state: 0,
        reserved_word_set_id: 0,
    }
}

// ===========================================================================
// Table readers
// ===========================================================================

/// The actions for a terminal in a state.
#[derive(Clone, Copy)]
pub struct TableEntry {
    pub actions: *const TSParseAction,
    pub action_count: u32,
    pub is_reusable: bool,
}

/// For a terminal, the index of its entry in `parse_actions`; for a
/// non-terminal, the state to go to. Zero means nothing.
pub unsafe fn ts_language_lookup(
    self_: *const TSLanguage,
    state: TSStateId,
    symbol: TSSymbol,
) -> u16 {
    let l = &*self_;
    if u32::from(state) >= l.large_state_count {
        let index = *l
            .small_parse_table_map
            .add(usize::from(state) - l.large_state_count as usize);
        let mut data = l.small_parse_table.add(index as usize);
        let group_count = *data;
        data = data.add(1);
        for _ in 0..group_count {
            let section_value = *data;
            let symbol_count = *data.add(1);
            data = data.add(2);
            for _ in 0..symbol_count {
                if *data == symbol {
                    return section_value;
                }
                data = data.add(1);
            }
        }
        0
    } else {
        *l.parse_table
            .add(usize::from(state) * l.symbol_count as usize + usize::from(symbol))
    }
}

pub unsafe fn ts_language_table_entry(
    self_: *const TSLanguage,
    state: TSStateId,
    symbol: TSSymbol,
) -> TableEntry {
    let l = &*self_;
    if symbol == ts_builtin_sym_error || symbol == ts_builtin_sym_error_repeat {
        return TableEntry {
            actions: ptr::null(),
            action_count: 0,
            is_reusable: false,
        };
    }
    debug_assert!(u32::from(symbol) < l.token_count);
    let action_index = usize::from(ts_language_lookup(self_, state, symbol));
    let entry = (*l.parse_actions.add(action_index)).entry;
    TableEntry {
        actions: l.parse_actions.add(action_index + 1).cast::<TSParseAction>(),
        action_count: u32::from(entry.count),
        is_reusable: entry.reusable,
    }
}

pub unsafe fn ts_language_actions<'a>(
    self_: *const TSLanguage,
    state: TSStateId,
    symbol: TSSymbol,
) -> &'a [TSParseAction] {
    let entry = ts_language_table_entry(self_, state, symbol);
    if entry.action_count == 0 {
        return &[];
    }
    std::slice::from_raw_parts(entry.actions, entry.action_count as usize)
}

/// The state reached after `symbol` is consumed in `state`, or 0.
pub unsafe fn ts_language_next_state(
    self_: *const TSLanguage,
    state: TSStateId,
    symbol: TSSymbol,
) -> TSStateId {
    let l = &*self_;
    if symbol == ts_builtin_sym_error || symbol == ts_builtin_sym_error_repeat {
        0
    } else if u32::from(symbol) < l.token_count {
        match ts_language_actions(self_, state, symbol).last() {
            Some(action) if action.type_ == TSParseActionTypeShift => {
                if action.shift.extra {
                    state
                } else {
                    action.shift.state
                }
            }
            _ => 0,
        }
    } else {
        ts_language_lookup(self_, state, symbol)
    }
}

pub unsafe fn ts_language_symbol_metadata(
    self_: *const TSLanguage,
    symbol: TSSymbol,
) -> TSSymbolMetadata {
    if symbol == ts_builtin_sym_error {
        TSSymbolMetadata { visible: true, named: true, supertype: false }
    } else if symbol == ts_builtin_sym_error_repeat {
        TSSymbolMetadata { visible: false, named: false, supertype: false }
    } else {
        *(*self_).symbol_metadata.add(usize::from(symbol))
    }
}

pub unsafe fn ts_language_symbol_type(self_: *const TSLanguage, symbol: TSSymbol) -> TSSymbolType {
    let metadata = ts_language_symbol_metadata(self_, symbol);
    if metadata.named && metadata.visible {
        TSSymbolTypeRegular
    } else if metadata.visible {
        TSSymbolTypeAnonymous
    } else if metadata.supertype {
        TSSymbolTypeSupertype
    } else {
        TSSymbolTypeAuxiliary
    }
}

pub unsafe fn ts_language_symbol_name(self_: *const TSLanguage, symbol: TSSymbol) -> *const c_char {
    if symbol == ts_builtin_sym_error {
        b"ERROR\0".as_ptr().cast()
    } else if symbol == ts_builtin_sym_error_repeat {
        b"_ERROR\0".as_ptr().cast()
    } else if u32::from(symbol) < (*self_).symbol_count {
        *(*self_).symbol_names.add(usize::from(symbol))
    } else {
        ptr::null()
    }
}

pub unsafe fn ts_language_field_name_for_id(self_: *const TSLanguage, id: TSFieldId) -> *const c_char {
    let count = (*self_).field_count;
    if count > 0 && u32::from(id) <= count {
        *(*self_).field_names.add(usize::from(id))
    } else {
        ptr::null()
    }
}

/// The field entries of a production, empty when it has none.
pub unsafe fn ts_language_field_map<'a>(
    self_: *const TSLanguage,
    production_id: u16,
) -> &'a [TSFieldMapEntry] {
    let l = &*self_;
    if l.field_count == 0 {
        return &[];
    }
    let slice = *l.field_map_slices.add(usize::from(production_id));
    if slice.length == 0 {
        return &[];
    }
    std::slice::from_raw_parts(
        l.field_map_entries.add(usize::from(slice.index)),
        usize::from(slice.length),
    )
}

pub unsafe fn ts_language_lex_mode_for_state(self_: *const TSLanguage, state: TSStateId) -> TSLexerMode {
    *(*self_).lex_modes.add(usize::from(state))
}
