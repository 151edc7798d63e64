use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
};

use log::debug;

use super::{
    item::{ItemSet, ItemSetBuilder, ParseItem},
    FieldLocation, ParseAction, ParseState, ParseTable, ParseTableEntry, ProductionInfo,
    UnresolvedConflict, ERROR_STATE,
};
use crate::{
    error::{GenerateError, GenerateResult},
    prepare::{Associativity, PreparedGrammar, Production, Symbol, VariableKind},
};

/// Reductions that won the precedence comparison for one lookahead.
struct ReductionInfo {
    precedence: i32,
    has_left: bool,
    has_right: bool,
    has_non: bool,
}

impl ReductionInfo {
    fn new(precedence: i32, associativity: Option<Associativity>) -> Self {
        let mut info = ReductionInfo {
            precedence,
            has_left: false,
            has_right: false,
            has_non: false,
        };
        info.add(associativity);
        info
    }

    fn add(&mut self, associativity: Option<Associativity>) {
        match associativity {
            Some(Associativity::Left) => self.has_left = true,
            Some(Associativity::Right) => self.has_right = true,
            None => self.has_non = true,
        }
    }
}

struct ParseTableBuilder<'a> {
    grammar: &'a PreparedGrammar,
    items: ItemSetBuilder<'a>,
    kernels: Vec<ItemSet>,
    state_ids: HashMap<ItemSet, usize>,
    core_ids: HashMap<BTreeSet<ParseItem>, usize>,
    queue: VecDeque<usize>,
    table: ParseTable,
    /// Field names each variable exposes, including those of hidden children.
    field_sets: Vec<BTreeSet<String>>,
    unresolved: Vec<UnresolvedConflict>,
}

pub(super) fn build_parse_table(
    grammar: &PreparedGrammar,
) -> GenerateResult<(ParseTable, Vec<UnresolvedConflict>)> {
    let mut builder = ParseTableBuilder {
        grammar,
        items: ItemSetBuilder::new(grammar),
        kernels: Vec::new(),
        state_ids: HashMap::new(),
        core_ids: HashMap::new(),
        queue: VecDeque::new(),
        table: ParseTable {
            production_infos: vec![ProductionInfo::default()],
            ..ParseTable::default()
        },
        field_sets: field_sets(grammar),
        unresolved: Vec::new(),
    };

    builder.add_state(ItemSet::new());
    let mut start = ItemSet::new();
    start.insert(ParseItem::start(), std::iter::once(Symbol::END).collect());
    builder.add_state(start);

    while let Some(state_id) = builder.queue.pop_front() {
        let closure = builder.items.closure(&builder.kernels[state_id]);
        builder.add_actions(state_id, &closure);
    }
    builder.populate_error_state();

    debug!(
        "built {} LR(1) states with {} cores",
        builder.table.states.len(),
        builder.core_ids.len()
    );
    check_limit("parse states", builder.table.states.len())?;
    check_limit("production ids", builder.table.production_infos.len())?;
    Ok((builder.table, builder.unresolved))
}

fn check_limit(what: &'static str, count: usize) -> GenerateResult<()> {
    let limit = usize::from(u16::MAX);
    if count > limit {
        return Err(GenerateError::TableLimit { what, count, limit });
    }
    Ok(())
}

fn field_sets(grammar: &PreparedGrammar) -> Vec<BTreeSet<String>> {
    let mut sets = vec![BTreeSet::new(); grammar.variables.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (index, variable) in grammar.variables.iter().enumerate() {
            for step in variable.productions.iter().flat_map(|p| &p.steps) {
                if let Some(name) = &step.field_name {
                    changed |= sets[index].insert(name.clone());
                }
                let child = step.symbol;
                if child.is_non_terminal()
                    && child.index != index
                    && !grammar.variables[child.index].kind.is_visible()
                {
                    let inherited = sets[child.index].clone();
                    for name in inherited {
                        changed |= sets[index].insert(name);
                    }
                }
            }
        }
    }
    sets
}

impl ParseTableBuilder<'_> {
    fn add_state(&mut self, kernel: ItemSet) -> usize {
        if let Some(id) = self.state_ids.get(&kernel) {
            return *id;
        }
        let core: BTreeSet<ParseItem> = kernel.keys().copied().collect();
        let next_core_id = self.core_ids.len();
        let core_id = *self.core_ids.entry(core).or_insert(next_core_id);

        let id = self.table.states.len();
        self.table.states.push(ParseState {
            core_id,
            ..ParseState::default()
        });
        self.kernels.push(kernel.clone());
        self.state_ids.insert(kernel, id);
        self.queue.push_back(id);
        id
    }

    fn add_actions(&mut self, state_id: usize, closure: &ItemSet) {
        let mut successors: BTreeMap<Symbol, ItemSet> = BTreeMap::new();
        let mut terminal_entries: BTreeMap<Symbol, ParseTableEntry> = BTreeMap::new();
        let mut reductions: BTreeMap<Symbol, ReductionInfo> = BTreeMap::new();

        let mut completed = Vec::new();
        for (item, lookaheads) in closure {
            match self.items.next_symbol(*item) {
                Some(next) => {
                    successors
                        .entry(next)
                        .or_default()
                        .entry(item.successor())
                        .or_default()
                        .insert_all(lookaheads);
                }
                None => completed.push((item, lookaheads)),
            }
        }
        completed.sort_by(|(a, _), (b, _)| self.items.reduction_order(**a, **b));

        for (item, lookaheads) in completed {
            if item.is_augmented() {
                terminal_entries
                    .entry(Symbol::END)
                    .or_default()
                    .actions
                    .push(ParseAction::Accept);
                continue;
            }

            let action = self.reduce_action(*item);
            let precedence = self.items.precedence(*item);
            let associativity = self.items.associativity(*item);
            for lookahead in lookaheads.iter() {
                let entry = terminal_entries.entry(lookahead).or_default();
                let Some(info) = reductions.get_mut(&lookahead) else {
                    entry.actions.push(action);
                    reductions.insert(lookahead, ReductionInfo::new(precedence, associativity));
                    continue;
                };
                match precedence.cmp(&info.precedence) {
                    Ordering::Greater => {
                        entry.actions.clear();
                        entry.actions.push(action);
                        *info = ReductionInfo::new(precedence, associativity);
                    }
                    Ordering::Equal => {
                        if !entry.actions.contains(&action) {
                            entry.actions.push(action);
                        }
                        info.add(associativity);
                    }
                    Ordering::Less => {}
                }
            }
        }

        let mut nonterminal_entries = BTreeMap::new();
        for (symbol, kernel) in successors {
            let next_state = self.add_state(kernel);
            if symbol.is_non_terminal() {
                nonterminal_entries.insert(symbol, next_state);
            } else {
                terminal_entries
                    .entry(symbol)
                    .or_default()
                    .actions
                    .push(ParseAction::Shift {
                        state: next_state,
                        is_repetition: false,
                    });
            }
        }

        for (lookahead, entry) in &mut terminal_entries {
            if entry.actions.len() > 1 {
                self.handle_conflict(state_id, closure, *lookahead, entry, reductions.get(lookahead));
            }
        }

        for extra in &self.grammar.extra_symbols {
            terminal_entries
                .entry(*extra)
                .or_insert_with(|| ParseTableEntry {
                    actions: vec![ParseAction::ShiftExtra],
                    reusable: true,
                });
        }

        let state = &mut self.table.states[state_id];
        state.terminal_entries = terminal_entries;
        state.nonterminal_entries = nonterminal_entries;
    }

    /// Every token may start error recovery. Immediate tokens are left out
    /// because they only make sense directly after another token.
    fn populate_error_state(&mut self) {
        let grammar = self.grammar;
        let state = &mut self.table.states[ERROR_STATE];
        for terminal in grammar.terminals() {
            if grammar.token(terminal).is_some_and(|t| t.is_immediate) {
                continue;
            }
            state
                .terminal_entries
                .entry(terminal)
                .or_insert_with(|| ParseTableEntry {
                    actions: vec![ParseAction::Recover],
                    reusable: true,
                });
        }
    }

    fn handle_conflict(
        &mut self,
        state_id: usize,
        closure: &ItemSet,
        lookahead: Symbol,
        entry: &mut ParseTableEntry,
        reduction: Option<&ReductionInfo>,
    ) {
        let mut conflicting_items = Vec::new();
        let mut shift_items = Vec::new();
        for (item, lookaheads) in closure {
            if item.is_augmented() {
                continue;
            }
            match self.items.next_symbol(*item) {
                None if lookaheads.contains(lookahead) => conflicting_items.push(*item),
                Some(next) if item.step_index > 0 && self.items.first(next).contains(lookahead) => {
                    conflicting_items.push(*item);
                    shift_items.push(*item);
                }
                _ => {}
            }
        }

        let shift_index = entry
            .actions
            .iter()
            .position(|action| matches!(action, ParseAction::Shift { .. }));

        if let Some(index) = shift_index {
            // A repetition conflicting with itself is left to the runtime,
            // which prefers to keep the repetition going.
            let same_repetition = conflicting_items.first().is_some_and(|first| {
                self.grammar.variables[first.variable_index].kind == VariableKind::Auxiliary
                    && conflicting_items
                        .iter()
                        .all(|item| item.variable_index == first.variable_index)
            });
            if same_repetition {
                if let ParseAction::Shift { is_repetition, .. } = &mut entry.actions[index] {
                    *is_repetition = true;
                }
                return;
            }

            let reduce_precedence = reduction.map_or(0, |info| info.precedence);
            let mut shift_is_less = false;
            let mut shift_is_more = false;
            for item in &shift_items {
                match self.items.precedence(*item).cmp(&reduce_precedence) {
                    Ordering::Greater => shift_is_more = true,
                    Ordering::Less => shift_is_less = true,
                    Ordering::Equal => {}
                }
            }

            if shift_is_more && !shift_is_less {
                let shift = entry.actions[index];
                entry.actions = vec![shift];
            } else if shift_is_less && !shift_is_more {
                entry.actions.remove(index);
            } else if !shift_is_more && !shift_is_less {
                if let Some(info) = reduction {
                    match (info.has_left, info.has_non, info.has_right) {
                        (true, false, false) => {
                            entry.actions.remove(index);
                        }
                        (false, false, true) => {
                            let shift = entry.actions[index];
                            entry.actions = vec![shift];
                        }
                        _ => {}
                    }
                }
            }
        }

        if entry.actions.len() <= 1 {
            return;
        }

        let mut symbols: Vec<Symbol> = conflicting_items
            .iter()
            .map(|item| {
                let variable = &self.grammar.variables[item.variable_index];
                match (variable.kind, variable.parent) {
                    (VariableKind::Auxiliary, Some(parent)) => parent,
                    _ => Symbol::non_terminal(item.variable_index),
                }
            })
            .collect();
        symbols.sort_unstable();
        symbols.dedup();
        if self.grammar.expected_conflicts.contains(&symbols) {
            return;
        }

        let conflict = UnresolvedConflict {
            symbols: symbols
                .iter()
                .map(|s| self.grammar.symbol_name(*s).to_string())
                .collect(),
            lookahead: self.grammar.symbol_name(lookahead).to_string(),
            state: state_id,
        };
        if !self
            .unresolved
            .iter()
            .any(|c| c.symbols == conflict.symbols && c.lookahead == conflict.lookahead)
        {
            debug!("{conflict}");
            self.unresolved.push(conflict);
        }
    }

    fn reduce_action(&mut self, item: ParseItem) -> ParseAction {
        let grammar = self.grammar;
        let production = &grammar.variables[item.variable_index].productions[item.production_index];
        let child_count = production.steps.len();
        let dynamic_precedence = production.dynamic_precedence;
        let production_id = self.production_id(production);
        self.table.max_production_length = self.table.max_production_length.max(child_count);
        ParseAction::Reduce {
            symbol: Symbol::non_terminal(item.variable_index),
            child_count,
            dynamic_precedence,
            production_id,
        }
    }

    fn production_id(&mut self, production: &Production) -> usize {
        let mut info = ProductionInfo::default();
        for (index, step) in production.steps.iter().enumerate() {
            if let Some(name) = &step.field_name {
                info.field_map
                    .entry(name.clone())
                    .or_default()
                    .push(FieldLocation {
                        index,
                        inherited: false,
                    });
            }
            let child = step.symbol;
            if child.is_non_terminal() && !self.grammar.variables[child.index].kind.is_visible() {
                for name in &self.field_sets[child.index] {
                    info.field_map
                        .entry(name.clone())
                        .or_default()
                        .push(FieldLocation {
                            index,
                            inherited: true,
                        });
                }
            }
        }

        match self.table.production_infos.iter().position(|i| *i == info) {
            Some(id) => id,
            None => {
                self.table.production_infos.push(info);
                self.table.production_infos.len() - 1
            }
        }
    }
}
