use std::collections::BTreeMap;

use super::{ParseAction, ParseState, ParseTable, ParseTableEntry, ERROR_STATE, START_STATE};
use crate::prepare::{PreparedGrammar, Symbol, VariableKind};

pub(super) fn minimize_parse_table(table: &mut ParseTable, grammar: &PreparedGrammar) {
    merge_compatible_states(table, grammar);
    remove_unit_reductions(table, grammar);
    remove_unused_states(table);
}

/// Merges states that share a core whenever merging cannot change how any
/// valid input is lexed or parsed.
///
/// Groups start out as the cores and are split until every pair of states
/// in a group is compatible under the current grouping.
fn merge_compatible_states(table: &mut ParseTable, grammar: &PreparedGrammar) {
    let mut by_core: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (id, state) in table.states.iter().enumerate() {
        by_core.entry(state.core_id).or_default().push(id);
    }
    let mut groups: Vec<Vec<usize>> = by_core.into_values().collect();
    let mut group_of = vec![0; table.states.len()];
    assign_groups(&groups, &mut group_of);

    loop {
        let mut split_groups = Vec::with_capacity(groups.len());
        for group in &groups {
            let mut remaining = group.clone();
            while let Some((&first, rest)) = remaining.split_first() {
                let mut subgroup = vec![first];
                let mut left_over = Vec::new();
                for &state in rest {
                    if subgroup
                        .iter()
                        .all(|&other| states_compatible(table, grammar, &group_of, state, other))
                    {
                        subgroup.push(state);
                    } else {
                        left_over.push(state);
                    }
                }
                split_groups.push(subgroup);
                remaining = left_over;
            }
        }
        let done = split_groups.len() == groups.len();
        groups = split_groups;
        assign_groups(&groups, &mut group_of);
        if done {
            break;
        }
    }

    // Groups are numbered by their lowest state, so the error and start
    // states keep their ids.
    groups.sort_by_key(|group| group[0]);
    assign_groups(&groups, &mut group_of);

    let mut old_states = std::mem::take(&mut table.states);
    table.states = groups
        .iter()
        .map(|group| {
            let mut merged = ParseState {
                core_id: old_states[group[0]].core_id,
                ..ParseState::default()
            };
            for &member in group {
                let state = std::mem::take(&mut old_states[member]);
                for (symbol, entry) in state.terminal_entries {
                    merged.terminal_entries.entry(symbol).or_insert(entry);
                }
                for (symbol, target) in state.nonterminal_entries {
                    merged.nonterminal_entries.entry(symbol).or_insert(target);
                }
            }
            merged.remap_states(&group_of);
            merged
        })
        .collect();
}

/// Skips states whose only job is to reduce a single child to an invisible
/// symbol. Anything that would enter such a state goes straight to the goto
/// target of that symbol instead, so the hidden wrapper never gets built.
fn remove_unit_reductions(table: &mut ParseTable, grammar: &PreparedGrammar) {
    let unit_symbols: Vec<Option<Symbol>> = table
        .states
        .iter()
        .map(|state| unit_reduction_symbol(state, grammar))
        .collect();

    for state in &mut table.states {
        let redirect = |nonterminal_entries: &BTreeMap<Symbol, usize>, mut target: usize| {
            // Chains of unit states are followed until a real state is reached.
            for _ in 0..unit_symbols.len() {
                let Some(symbol) = unit_symbols[target] else {
                    break;
                };
                match nonterminal_entries.get(&symbol) {
                    Some(next) if *next != target => target = *next,
                    _ => break,
                }
            }
            target
        };

        let gotos = state.nonterminal_entries.clone();
        for entry in state.terminal_entries.values_mut() {
            for action in &mut entry.actions {
                if let ParseAction::Shift { state, .. } = action {
                    *state = redirect(&gotos, *state);
                }
            }
        }
        for target in state.nonterminal_entries.values_mut() {
            *target = redirect(&gotos, *target);
        }
    }
}

fn unit_reduction_symbol(state: &ParseState, grammar: &PreparedGrammar) -> Option<Symbol> {
    let mut unit_symbol = None;
    for action in state.terminal_entries.values().flat_map(|entry| &entry.actions) {
        match action {
            ParseAction::ShiftExtra => {}
            ParseAction::Reduce {
                symbol,
                child_count: 1,
                production_id: 0,
                ..
            } if grammar.variables[symbol.index].kind != VariableKind::Named
                && !grammar.extra_symbols.contains(symbol)
                && unit_symbol.map_or(true, |unit| unit == *symbol) =>
            {
                unit_symbol = Some(*symbol);
            }
            _ => return None,
        }
    }
    unit_symbol
}

/// Drops states nothing refers to any more. The error and start states
/// always stay.
fn remove_unused_states(table: &mut ParseTable) {
    let mut used = vec![false; table.states.len()];
    used[ERROR_STATE] = true;
    used[START_STATE] = true;
    for state in &table.states {
        for entry in state.terminal_entries.values() {
            for action in &entry.actions {
                if let ParseAction::Shift { state, .. } = action {
                    used[*state] = true;
                }
            }
        }
        for target in state.nonterminal_entries.values() {
            used[*target] = true;
        }
    }

    let mut new_ids = vec![0; table.states.len()];
    let mut next_id = 0;
    for (id, is_used) in used.iter().enumerate() {
        new_ids[id] = next_id;
        if *is_used {
            next_id += 1;
        }
    }

    let states = std::mem::take(&mut table.states);
    table.states = states
        .into_iter()
        .zip(&used)
        .filter_map(|(state, is_used)| is_used.then_some(state))
        .collect();
    for state in &mut table.states {
        state.remap_states(&new_ids);
    }
}

fn assign_groups(groups: &[Vec<usize>], group_of: &mut [usize]) {
    for (id, group) in groups.iter().enumerate() {
        for &state in group {
            group_of[state] = id;
        }
    }
}

fn states_compatible(
    table: &ParseTable,
    grammar: &PreparedGrammar,
    group_of: &[usize],
    left: usize,
    right: usize,
) -> bool {
    let left = &table.states[left];
    let right = &table.states[right];

    for (symbol, entry) in &left.terminal_entries {
        match right.terminal_entries.get(symbol) {
            Some(other) if !entries_match(entry, other, group_of) => return false,
            None if token_conflicts(grammar, *symbol, right) => return false,
            _ => {}
        }
    }
    for symbol in right.terminal_entries.keys() {
        if !left.terminal_entries.contains_key(symbol) && token_conflicts(grammar, *symbol, left) {
            return false;
        }
    }
    left.nonterminal_entries.iter().all(|(symbol, target)| {
        right
            .nonterminal_entries
            .get(symbol)
            .map_or(true, |other| group_of[*target] == group_of[*other])
    })
}

fn entries_match(left: &ParseTableEntry, right: &ParseTableEntry, group_of: &[usize]) -> bool {
    left.actions.len() == right.actions.len()
        && left
            .actions
            .iter()
            .zip(&right.actions)
            .all(|pair| match pair {
                (
                    ParseAction::Shift {
                        state: left_state,
                        is_repetition: left_repetition,
                    },
                    ParseAction::Shift {
                        state: right_state,
                        is_repetition: right_repetition,
                    },
                ) => {
                    group_of[*left_state] == group_of[*right_state]
                        && left_repetition == right_repetition
                }
                (left, right) => left == right,
            })
}

/// Whether making `token` valid in `state` could change what the lexer
/// returns there.
fn token_conflicts(grammar: &PreparedGrammar, token: Symbol, state: &ParseState) -> bool {
    let Some(new_token) = grammar.token(token) else {
        return false;
    };
    state.terminal_entries.keys().any(|existing| {
        grammar
            .token(*existing)
            .is_some_and(|existing| existing.pattern.overlaps(&new_token.pattern))
    })
}
