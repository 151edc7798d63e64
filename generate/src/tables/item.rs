use std::{cmp::Ordering, collections::BTreeMap};

use crate::{
    prepare::{Associativity, PreparedGrammar, Production, ProductionStep, Symbol},
    token_set::TokenSet,
};

/// The variable index of the item `start' -> . start`.
pub(super) const AUGMENTED: usize = usize::MAX;

/// A production with a position marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(super) struct ParseItem {
    pub variable_index: usize,
    pub production_index: usize,
    pub step_index: usize,
}

/// Items and their lookaheads.
pub(super) type ItemSet = BTreeMap<ParseItem, TokenSet>;

impl ParseItem {
    pub fn start() -> Self {
        ParseItem {
            variable_index: AUGMENTED,
            production_index: 0,
            step_index: 0,
        }
    }

    pub fn is_augmented(self) -> bool {
        self.variable_index == AUGMENTED
    }

    pub fn successor(self) -> Self {
        ParseItem {
            step_index: self.step_index + 1,
            ..self
        }
    }
}

pub(super) struct ItemSetBuilder<'a> {
    grammar: &'a PreparedGrammar,
    augmented: Production,
    first: Vec<TokenSet>,
    nullable: Vec<bool>,
}

impl<'a> ItemSetBuilder<'a> {
    pub fn new(grammar: &'a PreparedGrammar) -> Self {
        let augmented = Production {
            steps: vec![ProductionStep {
                symbol: grammar.start_symbol(),
                precedence: 0,
                associativity: None,
                field_name: None,
            }],
            dynamic_precedence: 0,
        };

        let variable_count = grammar.variables.len();
        let mut first = vec![TokenSet::new(); variable_count];
        let mut nullable = vec![false; variable_count];
        let mut changed = true;
        while changed {
            changed = false;
            for (index, variable) in grammar.variables.iter().enumerate() {
                for production in &variable.productions {
                    let mut all_nullable = true;
                    for step in &production.steps {
                        if step.symbol.is_terminal() {
                            changed |= first[index].insert(step.symbol);
                            all_nullable = false;
                            break;
                        }
                        let child = step.symbol.index;
                        if child != index {
                            let child_first = first[child].clone();
                            changed |= first[index].insert_all(&child_first);
                        }
                        if !nullable[child] {
                            all_nullable = false;
                            break;
                        }
                    }
                    if all_nullable && !nullable[index] {
                        nullable[index] = true;
                        changed = true;
                    }
                }
            }
        }

        ItemSetBuilder {
            grammar,
            augmented,
            first,
            nullable,
        }
    }

    pub fn production(&self, item: ParseItem) -> &Production {
        if item.is_augmented() {
            &self.augmented
        } else {
            &self.grammar.variables[item.variable_index].productions[item.production_index]
        }
    }

    pub fn next_symbol(&self, item: ParseItem) -> Option<Symbol> {
        self.production(item)
            .steps
            .get(item.step_index)
            .map(|step| step.symbol)
    }

    fn previous_step(&self, item: ParseItem) -> Option<&ProductionStep> {
        let index = item.step_index.checked_sub(1)?;
        self.production(item).steps.get(index)
    }

    /// The precedence of the step just before the marker.
    pub fn precedence(&self, item: ParseItem) -> i32 {
        self.previous_step(item).map_or(0, |step| step.precedence)
    }

    pub fn associativity(&self, item: ParseItem) -> Option<Associativity> {
        self.previous_step(item).and_then(|step| step.associativity)
    }

    /// The order in which completed items contribute reductions to an entry.
    ///
    /// Items compare by marker position, then variable, then the shape of
    /// their production. The runtime lets the last reduction of a GLR split
    /// win when the branches merge again, so this order decides ambiguities.
    pub fn reduction_order(&self, a: ParseItem, b: ParseItem) -> Ordering {
        let (left, right) = (self.production(a), self.production(b));
        a.step_index
            .cmp(&b.step_index)
            .then_with(|| a.variable_index.cmp(&b.variable_index))
            .then_with(|| left.dynamic_precedence.cmp(&right.dynamic_precedence))
            .then_with(|| left.steps.len().cmp(&right.steps.len()))
            .then_with(|| self.precedence(a).cmp(&self.precedence(b)))
            .then_with(|| self.associativity(a).cmp(&self.associativity(b)))
            .then_with(|| {
                left.steps
                    .iter()
                    .zip(&right.steps)
                    .enumerate()
                    .map(|(i, (l, r))| {
                        if i < a.step_index {
                            l.field_name.cmp(&r.field_name)
                        } else {
                            l.symbol
                                .cmp(&r.symbol)
                                .then_with(|| l.precedence.cmp(&r.precedence))
                                .then_with(|| l.associativity.cmp(&r.associativity))
                                .then_with(|| l.field_name.cmp(&r.field_name))
                        }
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.production_index.cmp(&b.production_index))
    }

    /// The terminals that can begin `symbol`.
    pub fn first(&self, symbol: Symbol) -> TokenSet {
        if symbol.is_terminal() {
            std::iter::once(symbol).collect()
        } else {
            self.first[symbol.index].clone()
        }
    }

    fn first_of_sequence(&self, steps: &[ProductionStep]) -> (TokenSet, bool) {
        let mut result = TokenSet::new();
        for step in steps {
            if step.symbol.is_terminal() {
                result.insert(step.symbol);
                return (result, false);
            }
            result.insert_all(&self.first[step.symbol.index]);
            if !self.nullable[step.symbol.index] {
                return (result, false);
            }
        }
        (result, true)
    }

    /// Adds every item reachable through a non-terminal after a marker.
    pub fn closure(&self, kernel: &ItemSet) -> ItemSet {
        let mut result = kernel.clone();
        let mut stack: Vec<(ParseItem, TokenSet)> =
            kernel.iter().map(|(i, l)| (*i, l.clone())).collect();

        while let Some((item, lookaheads)) = stack.pop() {
            let Some(next) = self.next_symbol(item) else {
                continue;
            };
            if !next.is_non_terminal() {
                continue;
            }
            let rest = &self.production(item).steps[item.step_index + 1..];
            let (mut following, rest_nullable) = self.first_of_sequence(rest);
            if rest_nullable {
                following.insert_all(&lookaheads);
            }

            let variable = &self.grammar.variables[next.index];
            for production_index in 0..variable.productions.len() {
                let new_item = ParseItem {
                    variable_index: next.index,
                    production_index,
                    step_index: 0,
                };
                if result.entry(new_item).or_default().insert_all(&following) {
                    stack.push((new_item, following.clone()));
                }
            }
        }
        result
    }
}
