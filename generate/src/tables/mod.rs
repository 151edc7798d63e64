//! LR(1) parse tables and the per-state lexer configuration.
//!
//! Building happens in four steps: a canonical LR(1) automaton is
//! constructed with precedence-based conflict resolution, compatible states
//! are merged, states are reordered so the densest ones come first, and
//! each state is assigned the set of tokens the lexer may return in it.

mod build;
mod item;
mod lex;
mod minimize;

use std::{collections::BTreeMap, fmt};

use log::{debug, info};

use crate::{
    error::GenerateResult,
    prepare::{PreparedGrammar, Symbol},
    token_set::TokenSet,
};

pub const ERROR_STATE: usize = 0;
pub const START_STATE: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParseAction {
    Accept,
    Shift {
        state: usize,
        is_repetition: bool,
    },
    ShiftExtra,
    Recover,
    Reduce {
        symbol: Symbol,
        child_count: usize,
        dynamic_precedence: i32,
        production_id: usize,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParseTableEntry {
    pub actions: Vec<ParseAction>,
    pub reusable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ParseState {
    pub terminal_entries: BTreeMap<Symbol, ParseTableEntry>,
    pub nonterminal_entries: BTreeMap<Symbol, usize>,
    pub lex_state_id: usize,
    /// States built from the same items, ignoring lookaheads, share a core.
    pub core_id: usize,
}

impl ParseState {
    pub fn entry_count(&self) -> usize {
        self.terminal_entries.len() + self.nonterminal_entries.len()
    }

    fn remap_states(&mut self, map: &[usize]) {
        for entry in self.terminal_entries.values_mut() {
            for action in &mut entry.actions {
                if let ParseAction::Shift { state, .. } = action {
                    *state = map[*state];
                }
            }
        }
        for state in self.nonterminal_entries.values_mut() {
            *state = map[*state];
        }
    }
}

/// Where a field's node sits among the children of a reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldLocation {
    pub index: usize,
    /// The field belongs to a hidden child and is exposed through it.
    pub inherited: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProductionInfo {
    pub field_map: BTreeMap<String, Vec<FieldLocation>>,
}

#[derive(Debug, Default)]
pub struct ParseTable {
    pub states: Vec<ParseState>,
    /// Indexed by production id. Id 0 has no fields.
    pub production_infos: Vec<ProductionInfo>,
    pub max_production_length: usize,
    pub large_state_count: usize,
    /// For each state, the first state with the same core.
    pub primary_state_ids: Vec<usize>,
}

/// A conflict that neither precedence nor the grammar's `conflicts` list
/// settles. Both actions are kept, so the runtime explores them in parallel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedConflict {
    pub symbols: Vec<String>,
    pub lookahead: String,
    pub state: usize,
}

impl fmt::Display for UnresolvedConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved conflict for symbol sequence before `{}` in state {} between: {}",
            self.lookahead,
            self.state,
            self.symbols.join(", ")
        )
    }
}

#[derive(Debug)]
pub struct Tables {
    pub parse_table: ParseTable,
    /// Indexed by lex state id.
    pub lex_state_tokens: Vec<TokenSet>,
    pub unresolved_conflicts: Vec<UnresolvedConflict>,
}

/// Above this many entries a state is stored densely.
const LARGE_STATE_THRESHOLD: usize = 64;

pub fn build_tables(grammar: &PreparedGrammar) -> GenerateResult<Tables> {
    let (mut parse_table, unresolved_conflicts) = build::build_parse_table(grammar)?;
    let built = parse_table.states.len();

    minimize::minimize_parse_table(&mut parse_table, grammar);
    debug!(
        "minimized {} states to {}",
        built,
        parse_table.states.len()
    );

    reorder_states(&mut parse_table);
    let threshold = LARGE_STATE_THRESHOLD.min(grammar.symbol_count() / 2);
    parse_table.large_state_count = parse_table
        .states
        .iter()
        .enumerate()
        .take_while(|(id, state)| *id <= START_STATE || state.entry_count() > threshold)
        .count();
    parse_table.primary_state_ids = primary_state_ids(&parse_table.states);

    let lex_state_tokens = lex::assign_lex_states(&mut parse_table, grammar);

    info!(
        "built {} parse states ({} large) and {} lex states",
        parse_table.states.len(),
        parse_table.large_state_count,
        lex_state_tokens.len()
    );
    Ok(Tables {
        parse_table,
        lex_state_tokens,
        unresolved_conflicts,
    })
}

/// Keeps the error and start states in place and sorts the rest by
/// descending entry count.
fn reorder_states(table: &mut ParseTable) {
    let mut order: Vec<usize> = (0..table.states.len()).collect();
    order[START_STATE + 1..].sort_by_key(|id| std::cmp::Reverse(table.states[*id].entry_count()));

    let mut new_ids = vec![0; order.len()];
    for (new_id, old_id) in order.iter().enumerate() {
        new_ids[*old_id] = new_id;
    }

    let mut old_states: Vec<Option<ParseState>> =
        std::mem::take(&mut table.states).into_iter().map(Some).collect();
    table.states = order
        .iter()
        .filter_map(|old_id| old_states[*old_id].take())
        .collect();
    for state in &mut table.states {
        state.remap_states(&new_ids);
    }
}

fn primary_state_ids(states: &[ParseState]) -> Vec<usize> {
    let mut first_by_core = BTreeMap::new();
    states
        .iter()
        .enumerate()
        .map(|(id, state)| *first_by_core.entry(state.core_id).or_insert(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::tests::{prepare, symbol};

    const SUM: &str = r#"{
        "name": "sum",
        "extras": [{"type": "PATTERN", "value": "\\s"}],
        "rules": {
            "program": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "_expression"}},
            "_expression": {"type": "CHOICE", "members": [
                {"type": "SYMBOL", "name": "number"},
                {"type": "SYMBOL", "name": "sum"},
                {"type": "SYMBOL", "name": "product"}
            ]},
            "sum": {"type": "PREC_LEFT", "value": 1, "content": {"type": "SEQ", "members": [
                {"type": "FIELD", "name": "left", "content": {"type": "SYMBOL", "name": "_expression"}},
                {"type": "STRING", "value": "+"},
                {"type": "FIELD", "name": "right", "content": {"type": "SYMBOL", "name": "_expression"}}
            ]}},
            "product": {"type": "PREC_LEFT", "value": 2, "content": {"type": "SEQ", "members": [
                {"type": "FIELD", "name": "left", "content": {"type": "SYMBOL", "name": "_expression"}},
                {"type": "STRING", "value": "*"},
                {"type": "FIELD", "name": "right", "content": {"type": "SYMBOL", "name": "_expression"}}
            ]}},
            "number": {"type": "PATTERN", "value": "[0-9]+"}
        }
    }"#;

    #[test]
    fn precedence_settles_binary_operators() {
        let grammar = prepare(SUM);
        let tables = build_tables(&grammar).unwrap();
        assert!(tables.unresolved_conflicts.is_empty());

        let table = &tables.parse_table;
        assert!(table.states[ERROR_STATE]
            .terminal_entries
            .values()
            .all(|entry| matches!(
                entry.actions[..],
                [ParseAction::Recover] | [ParseAction::ShiftExtra]
            )));
        assert_eq!(
            table.states[START_STATE].terminal_entries[&Symbol::END].actions,
            [ParseAction::Reduce {
                symbol: grammar.start_symbol(),
                child_count: 0,
                dynamic_precedence: 0,
                production_id: 0,
            }]
        );

        // No state keeps more than one action for an operator.
        let plus = symbol(&grammar, "+");
        let star = symbol(&grammar, "*");
        for state in &table.states {
            for operator in [plus, star] {
                if let Some(entry) = state.terminal_entries.get(&operator) {
                    assert_eq!(entry.actions.len(), 1, "{entry:?}");
                }
            }
        }
    }

    #[test]
    fn fields_get_production_ids() {
        let grammar = prepare(SUM);
        let table = build_tables(&grammar).unwrap().parse_table;
        assert_eq!(table.production_infos[0], ProductionInfo::default());
        let with_fields = &table.production_infos[1];
        assert_eq!(
            with_fields.field_map["left"],
            [FieldLocation {
                index: 0,
                inherited: false
            }]
        );
        assert_eq!(
            with_fields.field_map["right"],
            [FieldLocation {
                index: 2,
                inherited: false
            }]
        );
        // `sum` and `product` share one field layout.
        assert_eq!(table.production_infos.len(), 2);
        assert_eq!(table.max_production_length, 3);
    }

    #[test]
    fn states_are_ordered_and_primary_ids_point_backwards() {
        let grammar = prepare(SUM);
        let table = build_tables(&grammar).unwrap().parse_table;
        let counts: Vec<_> = table.states[2..].iter().map(ParseState::entry_count).collect();
        assert!(counts.windows(2).all(|pair| pair[0] >= pair[1]));
        for (id, primary) in table.primary_state_ids.iter().enumerate() {
            assert!(*primary <= id);
            assert_eq!(table.states[*primary].core_id, table.states[id].core_id);
        }
        assert!(table.large_state_count >= 2);
    }
}
