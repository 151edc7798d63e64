#![allow(non_upper_case_globals)]

//! The lex functions behind `lex_fn` and `keyword_lex_fn`.
//!
//! The runtime calls `ts_lex` with the lex state of the current parse
//! state. Only tokens in that state's set (`LEX_STATE_TOKENS`) may be
//! returned. Identifier-shaped text always comes back as the word token;
//! the runtime then re-lexes it with `ts_lex_keywords` to see whether it
//! is a keyword.

use super::language::{TSLexer, TSStateId, TSSymbol};
use super::parser::*;

/// Longest match wins. Every accepted token moves the end mark, so a
/// failed attempt at a longer token falls back to the last accepted one.
struct Lexer {
    raw: *mut TSLexer,
    accepted: Option<TSSymbol>,
}

impl Lexer {
    /// # Safety
    ///
    /// `raw` must be the lexer the runtime passed to a lex function.
    unsafe fn new(raw: *mut TSLexer) -> Self {
        Lexer {
            raw,
            accepted: None,
        }
    }

    fn lookahead(&self) -> Option<char> {
        if self.eof() {
            return None;
        }
        let code = unsafe { (*self.raw).lookahead };
        char::from_u32(code as u32)
    }

    fn at(&self, expected: char) -> bool {
        self.lookahead() == Some(expected)
    }

    fn at_matching(&self, predicate: impl FnOnce(char) -> bool) -> bool {
        self.lookahead().is_some_and(predicate)
    }

    fn eof(&self) -> bool {
        match unsafe { (*self.raw).eof } {
            Some(eof) => unsafe { eof(self.raw) },
            None => true,
        }
    }

    fn advance(&mut self) {
        if let Some(advance) = unsafe { (*self.raw).advance } {
            unsafe { advance(self.raw, false) };
        }
    }

    /// Consumes a character without making it part of the token.
    fn skip(&mut self) {
        if let Some(advance) = unsafe { (*self.raw).advance } {
            unsafe { advance(self.raw, true) };
        }
    }

    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.at_matching(&predicate) {
            self.advance();
            count += 1;
        }
        count
    }

    fn accept(&mut self, symbol: TSSymbol) {
        self.accepted = Some(symbol);
        if let Some(mark_end) = unsafe { (*self.raw).mark_end } {
            unsafe { mark_end(self.raw) };
        }
    }

    fn finish(self) -> bool {
        match self.accepted {
            Some(symbol) => {
                unsafe { (*self.raw).result_symbol = symbol };
                true
            }
            None => false,
        }
    }
}

/// The tokens a lex state allows.
#[derive(Clone, Copy)]
struct ValidTokens(&'static [u64; TOKEN_SET_WORDS]);

impl ValidTokens {
    fn for_state(state: TSStateId) -> Option<Self> {
        LEX_STATE_TOKENS.get(usize::from(state)).map(ValidTokens)
    }

    fn contains(self, symbol: TSSymbol) -> bool {
        let symbol = usize::from(symbol);
        self.0
            .get(symbol / 64)
            .is_some_and(|word| (word >> (symbol % 64)) & 1 == 1)
    }

    fn in_string(self) -> bool {
        self.contains(sym__interpreted_string_literal_basic_content)
            || self.contains(sym_escape_sequence)
            || self.contains(anon_sym_DQUOTE2)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// # Safety
///
/// Must only be called by the tree-sitter runtime, with a valid lexer.
pub unsafe extern "C" fn ts_lex(lexer: *mut TSLexer, state: TSStateId) -> bool {
    let Some(valid) = ValidTokens::for_state(state) else {
        return false;
    };
    let mut lexer = Lexer::new(lexer);
    if valid.in_string() {
        lex_string_content(&mut lexer, valid);
    } else {
        lex_token(&mut lexer, valid);
    }
    lexer.finish()
}

/// # Safety
///
/// Must only be called by the tree-sitter runtime, with a valid lexer.
pub unsafe extern "C" fn ts_lex_keywords(lexer: *mut TSLexer, _state: TSStateId) -> bool {
    let mut lexer = Lexer::new(lexer);
    if !lexer.at_matching(is_identifier_start) {
        return false;
    }
    // Identifier characters are ASCII, so each one is a single byte.
    let mut word = [0u8; MAX_KEYWORD_LENGTH];
    let mut length = 0;
    while let Some(c) = lexer.lookahead().filter(|c| is_identifier_char(*c)) {
        if let Some(slot) = word.get_mut(length) {
            *slot = c as u8;
        }
        length += 1;
        lexer.advance();
    }
    if length <= MAX_KEYWORD_LENGTH {
        let word = &word[..length];
        if let Ok(index) = KEYWORDS.binary_search_by(|(keyword, _)| (*keyword).cmp(word)) {
            lexer.accept(KEYWORDS[index].1);
        }
    }
    lexer.finish()
}

fn lex_string_content(lexer: &mut Lexer, valid: ValidTokens) {
    // String content cannot hold a line break, so it lexes as padding.
    while lexer.at_matching(|c| c == '\n' || c == '\r') {
        lexer.skip();
    }
    match lexer.lookahead() {
        None => {
            if valid.contains(ts_builtin_sym_end) {
                lexer.accept(ts_builtin_sym_end);
            }
        }
        Some('"') => {
            lexer.advance();
            if valid.contains(anon_sym_DQUOTE2) {
                lexer.accept(anon_sym_DQUOTE2);
            } else if valid.contains(anon_sym_DQUOTE) {
                lexer.accept(anon_sym_DQUOTE);
            }
        }
        Some('\\') if valid.contains(sym_escape_sequence) => lex_escape_sequence(lexer),
        Some(_) if valid.contains(sym__interpreted_string_literal_basic_content) => {
            if lexer.advance_while(|c| !matches!(c, '"' | '\n' | '\\')) > 0 {
                lexer.accept(sym__interpreted_string_literal_basic_content);
            }
        }
        Some(_) => {}
    }
}

fn lex_escape_sequence(lexer: &mut Lexer) {
    lexer.advance();
    let (hex_digits, exact) = match lexer.lookahead() {
        None => return,
        Some('x') => (2, false),
        Some('u') => (4, true),
        Some('U') => (8, true),
        Some(c) if c.is_ascii_digit() => {
            // One digit is an escaped character, two or three an octal code.
            lexer.advance();
            lexer.accept(sym_escape_sequence);
            for _ in 0..2 {
                if !lexer.at_matching(|c| c.is_ascii_digit()) {
                    break;
                }
                lexer.advance();
                lexer.accept(sym_escape_sequence);
            }
            return;
        }
        Some(_) => {
            lexer.advance();
            lexer.accept(sym_escape_sequence);
            return;
        }
    };
    lexer.advance();
    let mut count = 0;
    while lexer.at_matching(|c| c.is_ascii_hexdigit()) && !(exact && count == hex_digits) {
        lexer.advance();
        count += 1;
    }
    if count >= hex_digits {
        lexer.accept(sym_escape_sequence);
    }
}

fn lex_token(lexer: &mut Lexer, valid: ValidTokens) {
    while lexer.at_matching(char::is_whitespace) {
        lexer.skip();
    }
    let Some(c) = lexer.lookahead() else {
        if valid.contains(ts_builtin_sym_end) {
            lexer.accept(ts_builtin_sym_end);
        }
        return;
    };

    let single = match c {
        '{' => Some(anon_sym_LBRACE),
        '}' => Some(anon_sym_RBRACE),
        ':' => Some(anon_sym_COLON),
        '=' => Some(anon_sym_EQ),
        '*' => Some(anon_sym_STAR),
        '+' => Some(anon_sym_PLUS),
        '-' => Some(anon_sym_DASH),
        '%' => Some(anon_sym_PERCENT),
        ',' => Some(anon_sym_COMMA),
        '[' => Some(anon_sym_LBRACK),
        ']' => Some(anon_sym_RBRACK),
        '(' => Some(anon_sym_LPAREN),
        ')' => Some(anon_sym_RPAREN),
        '$' => Some(anon_sym_DOLLAR),
        _ => None,
    };
    if let Some(symbol) = single {
        if valid.contains(symbol) {
            lexer.advance();
            lexer.accept(symbol);
        }
        return;
    }

    match c {
        c if is_identifier_start(c) => {
            if valid.contains(sym_identifier) {
                lexer.advance_while(is_identifier_char);
                lexer.accept(sym_identifier);
            }
        }
        c if c.is_ascii_digit() => lex_number(lexer, valid),
        '.' => lex_dot(lexer, valid),
        '/' => lex_slash(lexer, valid),
        '`' => {
            if valid.contains(sym_raw_string_literal) {
                lexer.advance();
                lexer.advance_while(|c| c != '`');
                if lexer.at('`') {
                    lexer.advance();
                    lexer.accept(sym_raw_string_literal);
                }
            }
        }
        '"' => {
            lexer.advance();
            if valid.contains(anon_sym_DQUOTE) {
                lexer.accept(anon_sym_DQUOTE);
            } else if valid.contains(anon_sym_DQUOTE2) {
                lexer.accept(anon_sym_DQUOTE2);
            }
        }
        '!' => lex_with_equals(lexer, valid, sym_not_operator, anon_sym_BANG_EQ),
        '<' => lex_with_equals(lexer, valid, anon_sym_LT, anon_sym_LT_EQ),
        '>' => lex_with_equals(lexer, valid, anon_sym_GT, anon_sym_GT_EQ),
        _ => {}
    }
}

/// `!`, `<` and `>`, each optionally followed by `=`.
fn lex_with_equals(lexer: &mut Lexer, valid: ValidTokens, short: TSSymbol, long: TSSymbol) {
    lexer.advance();
    if valid.contains(short) {
        lexer.accept(short);
    }
    if lexer.at('=') && valid.contains(long) {
        lexer.advance();
        lexer.accept(long);
    }
}

fn lex_number(lexer: &mut Lexer, valid: ValidTokens) {
    lexer.advance_while(|c| c.is_ascii_digit());
    if valid.contains(sym_integer_literal) {
        lexer.accept(sym_integer_literal);
    } else if valid.contains(sym_float_literal) {
        lexer.accept(sym_float_literal);
    }
    if lexer.at('.') && valid.contains(sym_float_literal) {
        lexer.advance();
        lexer.advance_while(|c| c.is_ascii_digit());
        lexer.accept(sym_float_literal);
    }
}

fn lex_dot(lexer: &mut Lexer, valid: ValidTokens) {
    lexer.advance();
    if valid.contains(anon_sym_DOT) {
        lexer.accept(anon_sym_DOT);
    }
    if lexer.at_matching(|c| c.is_ascii_alphabetic()) && valid.contains(sym_attribute_identifier) {
        lexer.advance_while(|c| is_identifier_char(c) || c == '.');
        lexer.accept(sym_attribute_identifier);
    } else if lexer.at_matching(|c| c.is_ascii_digit()) && valid.contains(sym_float_literal) {
        lexer.advance_while(|c| c.is_ascii_digit());
        lexer.accept(sym_float_literal);
    }
}

fn lex_slash(lexer: &mut Lexer, valid: ValidTokens) {
    lexer.advance();
    if valid.contains(anon_sym_SLASH) {
        lexer.accept(anon_sym_SLASH);
    }
    match lexer.lookahead() {
        Some('/') if valid.contains(sym_comment) => {
            lexer.advance();
            lex_line_comment(lexer);
        }
        Some('*') if valid.contains(sym_comment) => {
            lexer.advance();
            lex_block_comment(lexer);
        }
        Some(c) if c != '\\' && valid.contains(sym_regex_literal) => lex_regex(lexer),
        _ => {}
    }
}

/// Runs to the end of the line; a backslash continues it onto the next.
fn lex_line_comment(lexer: &mut Lexer) {
    while let Some(c) = lexer.lookahead() {
        match c {
            '\n' => break,
            '\\' => {
                lexer.advance_while(|c| c == '\\');
                if lexer.at('\r') {
                    lexer.advance();
                    if lexer.at('\n') {
                        lexer.advance();
                    }
                } else if !lexer.eof() {
                    lexer.advance();
                }
            }
            _ => lexer.advance(),
        }
    }
    lexer.accept(sym_comment);
}

fn lex_block_comment(lexer: &mut Lexer) {
    let mut after_star = false;
    while let Some(c) = lexer.lookahead() {
        lexer.advance();
        if after_star && c == '/' {
            lexer.accept(sym_comment);
            return;
        }
        after_star = c == '*';
    }
}

/// Called on the character after the opening `/`, which is neither `/`
/// nor `*`.
fn lex_regex(lexer: &mut Lexer) {
    lexer.advance();
    while let Some(c) = lexer.lookahead() {
        lexer.advance();
        match c {
            '/' => {
                lexer.accept(sym_regex_literal);
                return;
            }
            '\\' => {
                if lexer.at_matching(|c| c != '\n') {
                    lexer.advance();
                } else {
                    return;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A `TSLexer` over a string, standing in for the runtime.
    #[repr(C)]
    struct StringLexer {
        data: TSLexer,
        chars: Vec<char>,
        position: usize,
        token_start: usize,
        token_end: Option<usize>,
    }

    unsafe extern "C" fn advance(lexer: *mut TSLexer, skip: bool) {
        let lexer = &mut *lexer.cast::<StringLexer>();
        if lexer.position < lexer.chars.len() {
            lexer.position += 1;
        }
        if skip {
            lexer.token_start = lexer.position;
        }
        lexer.data.lookahead = lexer.chars.get(lexer.position).map_or(0, |c| *c as i32);
    }

    unsafe extern "C" fn mark_end(lexer: *mut TSLexer) {
        let lexer = &mut *lexer.cast::<StringLexer>();
        lexer.token_end = Some(lexer.position);
    }

    unsafe extern "C" fn eof(lexer: *const TSLexer) -> bool {
        let lexer = &*lexer.cast::<StringLexer>();
        lexer.position >= lexer.chars.len()
    }

    impl StringLexer {
        fn new(input: &str) -> Box<Self> {
            let chars: Vec<char> = input.chars().collect();
            Box::new(StringLexer {
                data: TSLexer {
                    lookahead: chars.first().map_or(0, |c| *c as i32),
                    result_symbol: 0,
                    advance: Some(advance),
                    mark_end: Some(mark_end),
                    get_column: None,
                    is_at_included_range_start: None,
                    eof: Some(eof),
                    log: None,
                },
                chars,
                position: 0,
                token_start: 0,
                token_end: None,
            })
        }

        fn raw(&mut self) -> *mut TSLexer {
            (self as *mut Self).cast()
        }

        fn text(&self) -> String {
            let end = self.token_end.unwrap_or(self.position);
            self.chars[self.token_start..end].iter().collect()
        }
    }

    /// The first lex state whose token set allows exactly what `accepts`
    /// requires.
    fn lex_state(accepts: impl Fn(ValidTokens) -> bool) -> TSStateId {
        (0..LEX_STATE_COUNT as TSStateId)
            .find(|state| ValidTokens::for_state(*state).is_some_and(&accepts))
            .expect("no such lex state")
    }

    fn lex(input: &str, state: TSStateId) -> Option<(TSSymbol, String)> {
        let mut lexer = StringLexer::new(input);
        let found = unsafe { ts_lex(lexer.raw(), state) };
        found.then(|| (lexer.data.result_symbol, lexer.text()))
    }

    fn expression_state() -> TSStateId {
        lex_state(|valid| {
            valid.contains(sym_integer_literal)
                && valid.contains(sym_regex_literal)
                && !valid.contains(anon_sym_SLASH)
        })
    }

    /// A state after an operand. The error state also allows `/` and `<=`,
    /// but it accepts a lone `!` as well, so it is ruled out.
    fn operator_state() -> TSStateId {
        lex_state(|valid| {
            valid.contains(anon_sym_SLASH)
                && valid.contains(anon_sym_LT_EQ)
                && !valid.contains(sym_not_operator)
        })
    }

    fn string_state() -> TSStateId {
        lex_state(|valid| valid.contains(sym_escape_sequence) && valid.contains(anon_sym_DQUOTE2))
    }

    #[test]
    fn the_error_state_lexes_everything_but_string_internals() {
        assert_eq!(lex("  rule", 0), Some((sym_identifier, "rule".into())));
        assert_eq!(lex("\"", 0), Some((anon_sym_DQUOTE, "\"".into())));
        assert_eq!(lex("", 0), Some((ts_builtin_sym_end, String::new())));
        assert_eq!(lex("  ", 0), Some((ts_builtin_sym_end, String::new())));
        assert_eq!(lex("#", 0), None);
    }

    #[test]
    fn numbers_prefer_integers() {
        let state = expression_state();
        assert_eq!(lex("42 ", state), Some((sym_integer_literal, "42".into())));
        assert_eq!(lex("4.2", state), Some((sym_float_literal, "4.2".into())));
        assert_eq!(lex("4.", state), Some((sym_float_literal, "4.".into())));
        assert_eq!(lex(".5", state), Some((sym_float_literal, ".5".into())));
        assert_eq!(lex("5m", state), Some((sym_integer_literal, "5".into())));
    }

    #[test]
    fn slashes_start_comments_and_regexes() {
        let state = expression_state();
        assert_eq!(lex("// note\nx", state), Some((sym_comment, "// note".into())));
        assert_eq!(
            lex("// one \\\n two\nx", state),
            Some((sym_comment, "// one \\\n two".into()))
        );
        assert_eq!(lex("/* a * b */ x", state), Some((sym_comment, "/* a * b */".into())));
        assert_eq!(lex("/ab\\/c/ nocase", state), Some((sym_regex_literal, "/ab\\/c/".into())));
        assert_eq!(lex("/unterminated", state), None);

        let state = operator_state();
        assert_eq!(lex("/ 2", state), Some((anon_sym_SLASH, "/".into())));
        assert_eq!(lex("/* open", state), Some((anon_sym_SLASH, "/".into())));
    }

    #[test]
    fn two_character_operators_win() {
        let state = operator_state();
        assert_eq!(lex("<= 3", state), Some((anon_sym_LT_EQ, "<=".into())));
        assert_eq!(lex("< 3", state), Some((anon_sym_LT, "<".into())));
        assert_eq!(lex(">=", state), Some((anon_sym_GT_EQ, ">=".into())));
        assert_eq!(lex("!=", state), Some((anon_sym_BANG_EQ, "!=".into())));
        assert_eq!(lex("!x", state), None);
    }

    #[test]
    fn operand_states_are_not_the_error_state() {
        let state = operator_state();
        assert_ne!(state, 0);
        assert_eq!(lex("!x", 0), Some((sym_not_operator, "!".into())));
    }

    #[test]
    fn attributes_follow_variables() {
        let state = lex_state(|valid| valid.contains(sym_attribute_identifier));
        assert_eq!(
            lex(".metadata.event_type = ", state),
            Some((sym_attribute_identifier, ".metadata.event_type".into()))
        );
    }

    #[test]
    fn raw_strings_span_lines() {
        let state = expression_state();
        assert_eq!(lex("`a\\b\nc`", state), Some((sym_raw_string_literal, "`a\\b\nc`".into())));
        assert_eq!(lex("`open", state), None);
    }

    #[test]
    fn string_content_keeps_spaces_and_stops_at_escapes() {
        let state = string_state();
        assert_eq!(
            lex(" hello // world\\n\"", state),
            Some((sym__interpreted_string_literal_basic_content, " hello // world".into()))
        );
        assert_eq!(lex("\\n rest", state), Some((sym_escape_sequence, "\\n".into())));
        assert_eq!(lex("\\123x", state), Some((sym_escape_sequence, "\\123".into())));
        assert_eq!(lex("\\x41g", state), Some((sym_escape_sequence, "\\x41".into())));
        assert_eq!(lex("\\u00e9z", state), Some((sym_escape_sequence, "\\u00e9".into())));
        assert_eq!(lex("\\x4", state), None);
        assert_eq!(lex("\"", state), Some((anon_sym_DQUOTE2, "\"".into())));
    }

    #[test]
    fn keywords_are_found_by_the_keyword_lexer() {
        let keyword = |input: &str| {
            let mut lexer = StringLexer::new(input);
            let found = unsafe { ts_lex_keywords(lexer.raw(), 0) };
            found.then(|| (lexer.data.result_symbol, lexer.text()))
        };
        assert_eq!(keyword("rule x"), Some((anon_sym_rule, "rule".into())));
        assert_eq!(keyword("null)"), Some((sym_null, "null".into())));
        assert_eq!(keyword("rules"), None);
        assert_eq!(keyword("$x"), None);
        // Longer than any keyword, but starting with one.
        assert_eq!(keyword("conditional_window_size"), None);
        assert_eq!(keyword("condition:"), Some((anon_sym_condition, "condition".into())));
    }

    #[test]
    fn keyword_table_is_sorted() {
        assert!(KEYWORDS.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_eq!(
            KEYWORDS.iter().map(|(keyword, _)| keyword.len()).max(),
            Some(MAX_KEYWORD_LENGTH)
        );
    }
}
