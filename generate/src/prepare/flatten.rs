use log::trace;

use super::{
    extract_tokens::{ExtractedGrammar, SyntaxRule},
    Associativity, PreparedGrammar, Production, ProductionStep, Symbol, SyntaxVariable,
};
use crate::error::{GenerateError, GenerateResult};

pub(super) fn flatten_grammar(grammar: ExtractedGrammar) -> GenerateResult<PreparedGrammar> {
    let mut variables = Vec::with_capacity(grammar.variables.len());
    for variable in grammar.variables {
        let mut productions: Vec<Production> = Vec::new();
        for rule in extract_choices(variable.rule) {
            let production = RuleFlattener::default().flatten(&rule);
            if !productions.contains(&production) {
                productions.push(production);
            }
        }
        trace!("{} has {} productions", variable.name, productions.len());
        variables.push(SyntaxVariable {
            name: variable.name,
            kind: variable.kind,
            productions,
            parent: variable.parent,
        });
    }

    for (index, variable) in variables.iter().enumerate().skip(1) {
        if variable.productions.iter().any(|p| p.steps.is_empty())
            && is_referenced(&variables, Symbol::non_terminal(index))
        {
            return Err(GenerateError::EmptyRule(variable.name.clone()));
        }
    }

    let mut expected_conflicts = grammar.expected_conflicts;
    expected_conflicts.sort();
    expected_conflicts.dedup();

    Ok(PreparedGrammar {
        name: grammar.name,
        tokens: grammar.tokens,
        variables,
        extra_symbols: grammar.extra_symbols,
        expected_conflicts,
        word_token: grammar.word_token,
        keywords: Vec::new(),
    })
}

fn is_referenced(variables: &[SyntaxVariable], symbol: Symbol) -> bool {
    variables
        .iter()
        .flat_map(|v| &v.productions)
        .flat_map(|p| &p.steps)
        .any(|step| step.symbol == symbol)
}

/// Expands every choice into a separate choice-free rule.
fn extract_choices(rule: SyntaxRule) -> Vec<SyntaxRule> {
    match rule {
        SyntaxRule::Seq(members) => {
            let mut sequences = vec![Vec::new()];
            for member in members {
                let alternatives = extract_choices(member);
                let mut next = Vec::with_capacity(sequences.len() * alternatives.len());
                for sequence in &sequences {
                    for alternative in &alternatives {
                        let mut extended: Vec<SyntaxRule> = sequence.clone();
                        extended.push(alternative.clone());
                        next.push(extended);
                    }
                }
                sequences = next;
            }
            sequences.into_iter().map(SyntaxRule::Seq).collect()
        }
        SyntaxRule::Choice(members) => members.into_iter().flat_map(extract_choices).collect(),
        SyntaxRule::Metadata { params, rule } => extract_choices(*rule)
            .into_iter()
            .map(|rule| SyntaxRule::Metadata {
                params: params.clone(),
                rule: Box::new(rule),
            })
            .collect(),
        rule => vec![rule],
    }
}

#[derive(Default)]
struct RuleFlattener {
    production: Production,
    precedence_stack: Vec<i32>,
    associativity_stack: Vec<Associativity>,
    field_name_stack: Vec<String>,
}

impl RuleFlattener {
    fn flatten(mut self, rule: &SyntaxRule) -> Production {
        self.apply(rule, true);
        self.production
    }

    /// Returns whether any step was pushed. A precedence that wraps the end
    /// of a rule stays on its last step; otherwise the last step takes the
    /// enclosing value, because that is what competes with the next token.
    fn apply(&mut self, rule: &SyntaxRule, at_end: bool) -> bool {
        match rule {
            SyntaxRule::Seq(members) => {
                let last = members.len().saturating_sub(1);
                let mut did_push = false;
                for (i, member) in members.iter().enumerate() {
                    did_push |= self.apply(member, at_end && i == last);
                }
                did_push
            }
            SyntaxRule::Metadata { params, rule } => {
                if let Some(precedence) = params.precedence {
                    self.precedence_stack.push(precedence);
                }
                if let Some(associativity) = params.associativity {
                    self.associativity_stack.push(associativity);
                }
                if let Some(field_name) = &params.field_name {
                    self.field_name_stack.push(field_name.clone());
                }
                if params.dynamic_precedence.abs() > self.production.dynamic_precedence.abs() {
                    self.production.dynamic_precedence = params.dynamic_precedence;
                }

                let did_push = self.apply(rule, at_end);

                if params.precedence.is_some() {
                    self.precedence_stack.pop();
                    if did_push && !at_end {
                        if let Some(step) = self.production.steps.last_mut() {
                            step.precedence = self.precedence_stack.last().copied().unwrap_or(0);
                        }
                    }
                }
                if params.associativity.is_some() {
                    self.associativity_stack.pop();
                    if did_push && !at_end {
                        if let Some(step) = self.production.steps.last_mut() {
                            step.associativity = self.associativity_stack.last().copied();
                        }
                    }
                }
                if params.field_name.is_some() {
                    self.field_name_stack.pop();
                }
                did_push
            }
            SyntaxRule::Symbol(symbol) => {
                self.production.steps.push(ProductionStep {
                    symbol: *symbol,
                    precedence: self.precedence_stack.last().copied().unwrap_or(0),
                    associativity: self.associativity_stack.last().copied(),
                    field_name: self.field_name_stack.last().cloned(),
                });
                true
            }
            // Choices and repetitions are gone by the time rules are flattened.
            SyntaxRule::Blank | SyntaxRule::Choice(_) | SyntaxRule::Repeat1(_) => false,
        }
    }
}
