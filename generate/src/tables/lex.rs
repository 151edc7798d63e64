use std::collections::HashMap;

use super::ParseTable;
use crate::{prepare::PreparedGrammar, token_set::TokenSet};

/// Gives every parse state the id of the token set its lexer may return,
/// and marks which entries can be reused during incremental parsing.
///
/// Keywords are lexed as the word token and looked up afterwards, so a
/// state expecting a keyword gets the word token instead.
pub(super) fn assign_lex_states(table: &mut ParseTable, grammar: &PreparedGrammar) -> Vec<TokenSet> {
    let mut lex_sets = Vec::new();
    let mut lex_ids: HashMap<TokenSet, usize> = HashMap::new();

    for state in &mut table.states {
        let mut tokens = TokenSet::new();
        for symbol in state.terminal_entries.keys() {
            match grammar.word_token {
                Some(word) if grammar.is_keyword(*symbol) => tokens.insert(word),
                _ => tokens.insert(*symbol),
            };
        }
        state.lex_state_id = match lex_ids.get(&tokens) {
            Some(id) => *id,
            None => {
                let id = lex_sets.len();
                lex_ids.insert(tokens.clone(), id);
                lex_sets.push(tokens);
                id
            }
        };

        // A token is only safe to reuse when no other token valid here
        // could have claimed its first character.
        let terminals: Vec<_> = state.terminal_entries.keys().copied().collect();
        for (symbol, entry) in &mut state.terminal_entries {
            entry.reusable = match grammar.token(*symbol) {
                None => true,
                Some(token) => !terminals.iter().any(|other| {
                    other != symbol
                        && grammar
                            .token(*other)
                            .is_some_and(|other| other.pattern.overlaps(&token.pattern))
                }),
            };
        }
    }
    lex_sets
}

#[cfg(test)]
mod tests {
    use super::super::build_tables;
    use crate::prepare::{
        tests::{prepare, symbol},
        Symbol,
    };

    #[test]
    fn keywords_are_lexed_through_the_word_token() {
        let grammar = prepare(
            r#"{
                "name": "calls",
                "word": "identifier",
                "rules": {
                    "program": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "statement"}},
                    "statement": {"type": "CHOICE", "members": [
                        {"type": "SEQ", "members": [
                            {"type": "STRING", "value": "let"},
                            {"type": "SYMBOL", "name": "identifier"},
                            {"type": "STRING", "value": ";"}
                        ]},
                        {"type": "SEQ", "members": [
                            {"type": "SYMBOL", "name": "identifier"},
                            {"type": "STRING", "value": ";"}
                        ]}
                    ]},
                    "identifier": {"type": "PATTERN", "value": "[a-z]+"}
                }
            }"#,
        );
        let identifier = symbol(&grammar, "identifier");
        let keyword = symbol(&grammar, "let");
        assert_eq!(grammar.keywords, [keyword]);

        let tables = build_tables(&grammar).unwrap();
        for (state, tokens) in tables
            .parse_table
            .states
            .iter()
            .map(|s| (s, &tables.lex_state_tokens[s.lex_state_id]))
        {
            assert!(!tokens.contains(keyword));
            if state.terminal_entries.contains_key(&keyword) {
                assert!(tokens.contains(identifier));
                assert!(!state.terminal_entries[&keyword].reusable);
            }
            if let Some(end) = state.terminal_entries.get(&Symbol::END) {
                assert!(end.reusable);
            }
        }
        assert_eq!(tables.parse_table.states[0].lex_state_id, 0);
    }
}
