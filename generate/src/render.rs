//! Renders the prepared grammar and its tables as Rust source.
//!
//! The output is a list of items meant to be spliced into a module with
//! `include!`. It refers to the ABI types and the `const fn` action
//! constructors of the language crate, which must be in scope there.

use std::{collections::HashMap, fmt::Write};

use crate::{
    config::LanguageVersion,
    error::{GenerateError, GenerateResult},
    prepare::{PreparedGrammar, Symbol, SymbolType, VariableKind},
    tables::{ParseAction, ParseTableEntry, Tables},
};

/// Highest ABI version the rendered tables follow.
pub const LANGUAGE_VERSION: u32 = 15;

pub fn render_parser(
    grammar: &PreparedGrammar,
    tables: &Tables,
    version: LanguageVersion,
) -> GenerateResult<String> {
    let mut renderer = Renderer::new(grammar, tables, version);
    renderer.render()?;
    Ok(renderer.out)
}

struct Renderer<'a> {
    out: String,
    grammar: &'a PreparedGrammar,
    tables: &'a Tables,
    version: LanguageVersion,
    /// Constant names, indexed by dense symbol id.
    symbol_ids: Vec<String>,
    field_names: Vec<String>,
    /// Rendered `PARSE_ACTIONS` lines, and the index of each entry in it.
    action_lines: Vec<String>,
    action_indices: HashMap<&'a ParseTableEntry, usize>,
    next_action_index: usize,
}

impl<'a> Renderer<'a> {
    fn new(grammar: &'a PreparedGrammar, tables: &'a Tables, version: LanguageVersion) -> Self {
        let mut symbol_ids: Vec<String> = Vec::with_capacity(grammar.symbol_count());
        for symbol in grammar.symbols() {
            let base = symbol_identifier(grammar, symbol);
            let mut id = base.clone();
            let mut suffix = 1;
            while symbol_ids.contains(&id) {
                suffix += 1;
                id = format!("{base}{suffix}");
            }
            symbol_ids.push(id);
        }

        let mut field_names: Vec<String> = tables
            .parse_table
            .production_infos
            .iter()
            .flat_map(|info| info.field_map.keys().cloned())
            .collect();
        field_names.sort();
        field_names.dedup();

        Renderer {
            out: String::new(),
            grammar,
            tables,
            version,
            symbol_ids,
            field_names,
            action_lines: vec!["entry(0, false),".to_string()],
            action_indices: HashMap::new(),
            next_action_index: 1,
        }
    }

    fn render(&mut self) -> GenerateResult<()> {
        writeln!(
            self.out,
            "// Parse tables for `{}`, generated from grammar.json.\n",
            self.grammar.name
        )?;
        self.check_limits()?;
        self.render_counts()?;
        self.render_symbol_constants()?;
        self.render_symbol_names()?;
        self.render_symbol_metadata()?;
        self.render_public_symbol_map()?;
        self.render_fields()?;
        self.render_alias_tables()?;
        self.render_parse_tables()?;
        self.render_lex_modes()?;
        self.render_lex_state_tokens()?;
        self.render_keywords()?;
        self.render_language_info()?;
        Ok(())
    }

    fn check_limits(&self) -> GenerateResult<()> {
        let table = &self.tables.parse_table;
        let limits = [
            ("symbols", self.grammar.symbol_count(), usize::from(u16::MAX)),
            ("parse states", table.states.len(), usize::from(u16::MAX)),
            ("fields", self.field_names.len(), usize::from(u16::MAX)),
            ("production ids", table.production_infos.len(), usize::from(u16::MAX)),
            ("production length", table.max_production_length, usize::from(u8::MAX)),
            ("lex states", self.tables.lex_state_tokens.len(), usize::from(u16::MAX)),
        ];
        for (what, count, limit) in limits {
            if count > limit {
                return Err(GenerateError::TableLimit { what, count, limit });
            }
        }
        Ok(())
    }

    fn render_counts(&mut self) -> GenerateResult<()> {
        let table = &self.tables.parse_table;
        let counts = [
            ("STATE_COUNT", table.states.len()),
            ("LARGE_STATE_COUNT", table.large_state_count),
            ("SYMBOL_COUNT", self.grammar.symbol_count()),
            ("ALIAS_COUNT", 0),
            ("TOKEN_COUNT", self.grammar.token_count()),
            ("EXTERNAL_TOKEN_COUNT", 0),
            ("FIELD_COUNT", self.field_names.len()),
            ("MAX_ALIAS_SEQUENCE_LENGTH", table.max_production_length),
            ("PRODUCTION_ID_COUNT", table.production_infos.len()),
            ("LEX_STATE_COUNT", self.tables.lex_state_tokens.len()),
            ("TOKEN_SET_WORDS", self.token_set_words()),
        ];
        writeln!(self.out, "pub const LANGUAGE_VERSION: u32 = {LANGUAGE_VERSION};")?;
        for (name, value) in counts {
            writeln!(self.out, "pub const {name}: usize = {value};")?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn token_set_words(&self) -> usize {
        self.grammar.token_count().div_ceil(64)
    }

    fn render_symbol_constants(&mut self) -> GenerateResult<()> {
        for (id, name) in self.symbol_ids.iter().enumerate() {
            writeln!(self.out, "pub const {name}: TSSymbol = {id};")?;
        }
        writeln!(self.out)?;
        for (index, name) in self.field_names.iter().enumerate() {
            writeln!(
                self.out,
                "pub const field_{}: TSFieldId = {};",
                sanitize_identifier(name),
                index + 1
            )?;
        }
        let word = match self.grammar.word_token {
            Some(word) => self.symbol_ids[self.grammar.symbol_id(word)].clone(),
            None => "0".to_string(),
        };
        writeln!(self.out, "\npub const WORD_TOKEN: TSSymbol = {word};\n")?;
        Ok(())
    }

    fn render_symbol_names(&mut self) -> GenerateResult<()> {
        writeln!(self.out, "pub static SYMBOL_NAMES: NameTable<SYMBOL_COUNT> = NameTable([")?;
        for symbol in self.grammar.symbols() {
            let name = self.grammar.symbol_name(symbol);
            writeln!(self.out, "    {},", c_string(name))?;
        }
        writeln!(self.out, "]);\n")?;
        Ok(())
    }

    fn render_symbol_metadata(&mut self) -> GenerateResult<()> {
        writeln!(
            self.out,
            "pub static SYMBOL_METADATA: [TSSymbolMetadata; SYMBOL_COUNT] = ["
        )?;
        for symbol in self.grammar.symbols() {
            let (visible, named) = match symbol.kind {
                SymbolType::End => (false, true),
                _ => {
                    let kind = self.grammar.symbol_kind(symbol);
                    (kind.is_visible(), kind.is_named())
                }
            };
            writeln!(
                self.out,
                "    TSSymbolMetadata {{ visible: {visible}, named: {named}, supertype: false }},"
            )?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    /// Symbols that look the same to a tree consumer share one public symbol,
    /// like the opening and the immediate closing quote of a string.
    fn render_public_symbol_map(&mut self) -> GenerateResult<()> {
        writeln!(
            self.out,
            "pub static PUBLIC_SYMBOL_MAP: [TSSymbol; SYMBOL_COUNT] = ["
        )?;
        let symbols: Vec<Symbol> = self.grammar.symbols().collect();
        for symbol in &symbols {
            let public = symbols
                .iter()
                .find(|other| {
                    other.kind == symbol.kind
                        && self.grammar.symbol_name(**other) == self.grammar.symbol_name(*symbol)
                        && self.grammar.symbol_kind(**other) == self.grammar.symbol_kind(*symbol)
                })
                .unwrap_or(symbol);
            let id = self.grammar.symbol_id(*public);
            writeln!(self.out, "    {},", self.symbol_ids[id])?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    fn render_fields(&mut self) -> GenerateResult<()> {
        writeln!(
            self.out,
            "pub static FIELD_NAMES: NameTable<{{ FIELD_COUNT + 1 }}> = NameTable([\n    std::ptr::null(),"
        )?;
        for name in &self.field_names {
            writeln!(self.out, "    {},", c_string(name))?;
        }
        writeln!(self.out, "]);\n")?;

        // Identical field layouts share one run of entries.
        let mut runs: Vec<Vec<String>> = Vec::new();
        let mut slices = Vec::new();
        let mut entry_count = 0;
        let mut run_starts: Vec<usize> = Vec::new();
        for info in &self.tables.parse_table.production_infos {
            let mut run = Vec::new();
            for (name, locations) in &info.field_map {
                for location in locations {
                    run.push(format!(
                        "TSFieldMapEntry {{ field_id: field_{}, child_index: {}, inherited: {} }},",
                        sanitize_identifier(name),
                        location.index,
                        location.inherited
                    ));
                }
            }
            if run.is_empty() {
                slices.push((0, 0));
                continue;
            }
            let index = match runs.iter().position(|existing| *existing == run) {
                Some(position) => run_starts[position],
                None => {
                    let start = entry_count;
                    entry_count += run.len();
                    run_starts.push(start);
                    runs.push(run.clone());
                    start
                }
            };
            slices.push((index, run.len()));
        }
        if entry_count > usize::from(u16::MAX) {
            return Err(GenerateError::TableLimit {
                what: "field map entries",
                count: entry_count,
                limit: usize::from(u16::MAX),
            });
        }

        writeln!(
            self.out,
            "pub static FIELD_MAP_SLICES: [TSMapSlice; PRODUCTION_ID_COUNT] = ["
        )?;
        for (index, length) in slices {
            writeln!(self.out, "    TSMapSlice {{ index: {index}, length: {length} }},")?;
        }
        writeln!(self.out, "];\n")?;

        writeln!(
            self.out,
            "pub static FIELD_MAP_ENTRIES: [TSFieldMapEntry; {entry_count}] = ["
        )?;
        for line in runs.iter().flatten() {
            writeln!(self.out, "    {line}")?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    fn render_alias_tables(&mut self) -> GenerateResult<()> {
        writeln!(
            self.out,
            "pub static ALIAS_SEQUENCES: [TSSymbol; PRODUCTION_ID_COUNT * MAX_ALIAS_SEQUENCE_LENGTH] =\n    [0; PRODUCTION_ID_COUNT * MAX_ALIAS_SEQUENCE_LENGTH];"
        )?;
        writeln!(self.out, "pub static NON_TERMINAL_ALIAS_MAP: [u16; 1] = [0];\n")?;
        Ok(())
    }

    fn render_parse_tables(&mut self) -> GenerateResult<()> {
        let tables = self.tables;
        let table = &tables.parse_table;
        let symbol_count = self.grammar.symbol_count();

        writeln!(
            self.out,
            "pub static PARSE_TABLE: [[u16; SYMBOL_COUNT]; LARGE_STATE_COUNT] = ["
        )?;
        for (id, state) in table.states[..table.large_state_count].iter().enumerate() {
            let mut row = vec![0usize; symbol_count];
            for (symbol, entry) in &state.terminal_entries {
                row[self.grammar.symbol_id(*symbol)] = self.action_index(entry)?;
            }
            for (symbol, target) in &state.nonterminal_entries {
                row[self.grammar.symbol_id(*symbol)] = *target;
            }
            let row: Vec<String> = row.iter().map(usize::to_string).collect();
            writeln!(self.out, "    // state {id}\n    [{}],", row.join(", "))?;
        }
        writeln!(self.out, "];\n")?;

        let mut small_lines = Vec::new();
        let mut small_offsets: HashMap<Vec<(usize, Vec<usize>)>, usize> = HashMap::new();
        let mut small_map = Vec::new();
        let mut small_len = 0;
        for state in &table.states[table.large_state_count..] {
            let mut by_value: HashMap<(usize, bool), Vec<usize>> = HashMap::new();
            for (symbol, entry) in &state.terminal_entries {
                let value = self.action_index(entry)?;
                by_value
                    .entry((value, false))
                    .or_default()
                    .push(self.grammar.symbol_id(*symbol));
            }
            for (symbol, target) in &state.nonterminal_entries {
                by_value
                    .entry((*target, true))
                    .or_default()
                    .push(self.grammar.symbol_id(*symbol));
            }
            let mut groups: Vec<((usize, bool), Vec<usize>)> = by_value.into_iter().collect();
            for (_, symbols) in &mut groups {
                symbols.sort_unstable();
            }
            groups.sort_unstable_by_key(|((value, non_terminal), symbols)| {
                (symbols.len(), *non_terminal, *value, symbols[0])
            });
            let key: Vec<(usize, Vec<usize>)> = groups
                .into_iter()
                .map(|((value, _), symbols)| (value, symbols))
                .collect();

            if let Some(offset) = small_offsets.get(&key) {
                small_map.push(*offset);
                continue;
            }
            let offset = small_len;
            small_lines.push(format!("    // offset {offset}"));
            small_lines.push(format!("    {},", key.len()));
            for (value, symbols) in &key {
                let names: Vec<&str> = symbols.iter().map(|id| self.symbol_ids[*id].as_str()).collect();
                small_lines.push(format!("    {value}, {}, {},", symbols.len(), names.join(", ")));
                small_len += 2 + symbols.len();
            }
            small_len += 1;
            small_offsets.insert(key, offset);
            small_map.push(offset);
        }
        if small_len > u32::MAX as usize {
            return Err(GenerateError::TableLimit {
                what: "small parse table entries",
                count: small_len,
                limit: u32::MAX as usize,
            });
        }

        writeln!(self.out, "pub static SMALL_PARSE_TABLE: [u16; {small_len}] = [")?;
        for line in small_lines {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "];\n")?;

        writeln!(
            self.out,
            "pub static SMALL_PARSE_TABLE_MAP: [u32; STATE_COUNT - LARGE_STATE_COUNT] = ["
        )?;
        for chunk in small_map.chunks(16) {
            let offsets: Vec<String> = chunk.iter().map(usize::to_string).collect();
            writeln!(self.out, "    {},", offsets.join(", "))?;
        }
        writeln!(self.out, "];\n")?;

        writeln!(
            self.out,
            "pub static PARSE_ACTIONS: [TSParseActionEntry; {}] = [",
            self.next_action_index
        )?;
        for line in &self.action_lines {
            writeln!(self.out, "    {line}")?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    /// The index of `entry` in `PARSE_ACTIONS`, adding it on first use.
    fn action_index(&mut self, entry: &'a ParseTableEntry) -> GenerateResult<usize> {
        if let Some(index) = self.action_indices.get(entry) {
            return Ok(*index);
        }
        let index = self.next_action_index;
        let mut line = format!("entry({}, {}),", entry.actions.len(), entry.reusable);
        for action in &entry.actions {
            line.push(' ');
            line.push_str(&self.action_expression(action)?);
            line.push(',');
        }
        self.next_action_index += 1 + entry.actions.len();
        if self.next_action_index > usize::from(u16::MAX) {
            return Err(GenerateError::TableLimit {
                what: "parse action entries",
                count: self.next_action_index,
                limit: usize::from(u16::MAX),
            });
        }
        self.action_lines.push(line);
        self.action_indices.insert(entry, index);
        Ok(index)
    }

    fn action_expression(&self, action: &ParseAction) -> GenerateResult<String> {
        Ok(match action {
            ParseAction::Accept => "accept()".to_string(),
            ParseAction::Recover => "recover()".to_string(),
            ParseAction::ShiftExtra => "shift_extra()".to_string(),
            ParseAction::Shift {
                state,
                is_repetition: false,
            } => format!("shift({state})"),
            ParseAction::Shift {
                state,
                is_repetition: true,
            } => format!("shift_repeat({state})"),
            ParseAction::Reduce {
                symbol,
                child_count,
                dynamic_precedence,
                production_id,
            } => {
                let precedence = i16::try_from(*dynamic_precedence).map_err(|_| {
                    GenerateError::TableLimit {
                        what: "dynamic precedence",
                        count: dynamic_precedence.unsigned_abs() as usize,
                        limit: i16::MAX as usize,
                    }
                })?;
                format!(
                    "reduce({}, {child_count}, {precedence}, {production_id})",
                    self.symbol_ids[self.grammar.symbol_id(*symbol)]
                )
            }
        })
    }

    fn render_lex_modes(&mut self) -> GenerateResult<()> {
        let table = &self.tables.parse_table;
        writeln!(self.out, "pub static LEX_MODES: [TSLexerMode; STATE_COUNT] = [")?;
        for chunk in table.states.chunks(8) {
            let modes: Vec<String> = chunk
                .iter()
                .map(|state| format!("lex_mode({})", state.lex_state_id))
                .collect();
            writeln!(self.out, "    {},", modes.join(", "))?;
        }
        writeln!(self.out, "];\n")?;

        writeln!(
            self.out,
            "pub static PRIMARY_STATE_IDS: [TSStateId; STATE_COUNT] = ["
        )?;
        for chunk in table.primary_state_ids.chunks(16) {
            let ids: Vec<String> = chunk.iter().map(usize::to_string).collect();
            writeln!(self.out, "    {},", ids.join(", "))?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    /// One bitset per lex state. Bit 0 is `end`, bit `n` is symbol `n`.
    fn render_lex_state_tokens(&mut self) -> GenerateResult<()> {
        let words = self.token_set_words();
        writeln!(
            self.out,
            "pub static LEX_STATE_TOKENS: [[u64; TOKEN_SET_WORDS]; LEX_STATE_COUNT] = ["
        )?;
        for tokens in &self.tables.lex_state_tokens {
            let words: Vec<String> = tokens
                .words(words)
                .iter()
                .map(|word| format!("0x{word:016x}"))
                .collect();
            writeln!(self.out, "    [{}],", words.join(", "))?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    fn render_keywords(&mut self) -> GenerateResult<()> {
        let mut keywords: Vec<(&str, &str)> = self
            .grammar
            .keywords
            .iter()
            .map(|keyword| {
                (
                    self.grammar.symbol_name(*keyword),
                    self.symbol_ids[self.grammar.symbol_id(*keyword)].as_str(),
                )
            })
            .collect();
        keywords.sort_unstable();
        let longest = keywords.iter().map(|(text, _)| text.len()).max().unwrap_or(0);
        writeln!(self.out, "pub const MAX_KEYWORD_LENGTH: usize = {longest};")?;
        writeln!(
            self.out,
            "pub static KEYWORDS: [(&[u8], TSSymbol); {}] = [",
            keywords.len()
        )?;
        for (text, id) in keywords {
            writeln!(self.out, "    (b\"{}\", {id}),", escape_bytes(text))?;
        }
        writeln!(self.out, "];\n")?;
        Ok(())
    }

    fn render_language_info(&mut self) -> GenerateResult<()> {
        writeln!(self.out, "pub static RESERVED_WORDS: [TSSymbol; 0] = [];")?;
        writeln!(self.out, "pub static SUPERTYPE_SYMBOLS: [TSSymbol; 0] = [];")?;
        writeln!(self.out, "pub static SUPERTYPE_MAP_SLICES: [TSMapSlice; 0] = [];")?;
        writeln!(self.out, "pub static SUPERTYPE_MAP_ENTRIES: [TSSymbol; 0] = [];\n")?;
        writeln!(
            self.out,
            "pub const LANGUAGE_NAME: &[u8] = b\"{}\\0\";",
            escape_bytes(&self.grammar.name)
        )?;
        let LanguageVersion {
            major,
            minor,
            patch,
        } = self.version;
        writeln!(
            self.out,
            "pub const LANGUAGE_METADATA: TSLanguageMetadata = TSLanguageMetadata {{ major_version: {major}, minor_version: {minor}, patch_version: {patch} }};"
        )?;
        Ok(())
    }
}

fn symbol_identifier(grammar: &PreparedGrammar, symbol: Symbol) -> String {
    if symbol.kind == SymbolType::End {
        return "ts_builtin_sym_end".to_string();
    }
    let name = sanitize_identifier(grammar.symbol_name(symbol));
    match grammar.symbol_kind(symbol) {
        VariableKind::Auxiliary => format!("aux_sym_{name}"),
        VariableKind::Anonymous => format!("anon_sym_{name}"),
        VariableKind::Named | VariableKind::Hidden => format!("sym_{name}"),
    }
}

/// Spells out punctuation so every symbol name is a valid identifier.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            result.push(c);
            continue;
        }
        let replacement = match c {
            ' ' if name.len() == 1 => "SPACE",
            '~' => "TILDE",
            '`' => "BQUOTE",
            '!' => "BANG",
            '@' => "AT",
            '#' => "POUND",
            '$' => "DOLLAR",
            '%' => "PERCENT",
            '^' => "CARET",
            '&' => "AMP",
            '*' => "STAR",
            '(' => "LPAREN",
            ')' => "RPAREN",
            '-' => "DASH",
            '+' => "PLUS",
            '=' => "EQ",
            '{' => "LBRACE",
            '}' => "RBRACE",
            '[' => "LBRACK",
            ']' => "RBRACK",
            '\\' => "BSLASH",
            '|' => "PIPE",
            ':' => "COLON",
            ';' => "SEMI",
            '"' => "DQUOTE",
            '\'' => "SQUOTE",
            '<' => "LT",
            '>' => "GT",
            ',' => "COMMA",
            '.' => "DOT",
            '?' => "QMARK",
            '/' => "SLASH",
            '\n' => "LF",
            '\r' => "CR",
            '\t' => "TAB",
            '\0' => "NULL",
            _ => {
                let _ = write!(result, "u{:04x}", c as u32);
                continue;
            }
        };
        if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
        result.push_str(replacement);
    }
    result
}

fn escape_bytes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'"' => escaped.push_str("\\\""),
            b'\\' => escaped.push_str("\\\\"),
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            b'\t' => escaped.push_str("\\t"),
            0x20..=0x7e => escaped.push(char::from(byte)),
            _ => {
                let _ = write!(escaped, "\\x{byte:02x}");
            }
        }
    }
    escaped
}

/// A NUL-terminated byte string, as a C string pointer expression.
fn c_string(text: &str) -> String {
    format!("b\"{}\\0\".as_ptr() as *const c_char", escape_bytes(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{prepare::tests::prepare, tables::build_tables};

    const VERSION: LanguageVersion = LanguageVersion {
        major: 1,
        minor: 2,
        patch: 3,
    };

    fn render(json: &str) -> String {
        let grammar = prepare(json);
        let tables = build_tables(&grammar).unwrap();
        render_parser(&grammar, &tables, VERSION).unwrap()
    }

    const QUOTES: &str = r#"{
        "name": "quotes",
        "word": "name",
        "rules": {
            "document": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "_item"}},
            "_item": {"type": "CHOICE", "members": [
                {"type": "SYMBOL", "name": "string"},
                {"type": "SYMBOL", "name": "pair"}
            ]},
            "string": {"type": "SEQ", "members": [
                {"type": "STRING", "value": "\""},
                {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "name"}},
                {"type": "IMMEDIATE_TOKEN", "content": {"type": "STRING", "value": "\""}}
            ]},
            "pair": {"type": "SEQ", "members": [
                {"type": "FIELD", "name": "key", "content": {"type": "SYMBOL", "name": "name"}},
                {"type": "STRING", "value": "!="},
                {"type": "FIELD", "name": "value", "content": {"type": "STRING", "value": "nil"}}
            ]},
            "name": {"type": "PATTERN", "value": "[a-z]+"}
        }
    }"#;

    #[test]
    fn symbol_constants_follow_tree_sitter_naming() {
        let source = render(QUOTES);
        for line in [
            "pub const ts_builtin_sym_end: TSSymbol = 0;",
            "pub const anon_sym_DQUOTE: TSSymbol = 1;",
            "pub const sym_name: TSSymbol = 2;",
            "pub const anon_sym_DQUOTE2: TSSymbol = 3;",
            "pub const anon_sym_BANG_EQ: TSSymbol = 4;",
            "pub const anon_sym_nil: TSSymbol = 5;",
            "pub const sym_document: TSSymbol = 6;",
            "pub const field_key: TSFieldId = 1;",
            "pub const field_value: TSFieldId = 2;",
            "pub const WORD_TOKEN: TSSymbol = sym_name;",
        ] {
            assert!(source.contains(line), "missing `{line}` in:\n{source}");
        }
        assert!(source.contains("aux_sym_document_repeat1"));
        assert!(source.contains("aux_sym_string_repeat1"));
    }

    #[test]
    fn equal_symbols_share_a_public_symbol() {
        let source = render(QUOTES);
        let map = source
            .split("PUBLIC_SYMBOL_MAP")
            .nth(1)
            .and_then(|rest| rest.split("];").next())
            .unwrap();
        let entries: Vec<&str> = map
            .lines()
            .skip(1)
            .map(|line| line.trim().trim_end_matches(','))
            .collect();
        assert_eq!(entries[1], "anon_sym_DQUOTE");
        assert_eq!(entries[3], "anon_sym_DQUOTE");
        assert_eq!(entries[2], "sym_name");
    }

    #[test]
    fn keywords_and_metadata_are_rendered() {
        let source = render(QUOTES);
        assert!(source.contains("pub static KEYWORDS: [(&[u8], TSSymbol); 1] = [\n    (b\"nil\", anon_sym_nil),"));
        assert!(source.contains("pub const MAX_KEYWORD_LENGTH: usize = 3;"));
        assert!(source.contains("pub const LANGUAGE_NAME: &[u8] = b\"quotes\\0\";"));
        assert!(source.contains("major_version: 1, minor_version: 2, patch_version: 3"));
        assert!(source.contains("    b\"\\\"\\0\".as_ptr() as *const c_char,"));
        assert!(source.contains("PARSE_ACTIONS: [TSParseActionEntry;"));
        assert!(source.contains("    entry(0, false),\n"));
    }

    #[test]
    fn sanitizing_spells_out_punctuation() {
        assert_eq!(sanitize_identifier("<="), "LT_EQ");
        assert_eq!(sanitize_identifier("source_file"), "source_file");
        assert_eq!(sanitize_identifier(" "), "SPACE");
        assert_eq!(sanitize_identifier("a b"), "au0020b");
        assert_eq!(sanitize_identifier("é"), "u00e9");
    }
}
