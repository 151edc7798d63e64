use std::collections::HashMap;

use super::{
    extract_tokens::{ExtractedGrammar, ExtractedVariable, SyntaxRule},
    Symbol, VariableKind,
};

/// Replaces every `Repeat1` with an auxiliary variable shaped as a binary tree.
///
/// `x+` inside rule `list` becomes `list_repeat1 -> list_repeat1 list_repeat1 | x`.
/// A hidden rule whose whole body is a repetition becomes that tree itself
/// and turns auxiliary. Identical repetitions share one helper across the
/// whole grammar.
pub(super) fn expand_repeats(mut grammar: ExtractedGrammar) -> ExtractedGrammar {
    let mut expander = Expander {
        variable_count: grammar.variables.len(),
        auxiliary: Vec::new(),
        existing: HashMap::new(),
        current: 0,
        current_name: String::new(),
        repeat_count: 0,
    };

    for index in 0..grammar.variables.len() {
        let variable = &mut grammar.variables[index];
        expander.current = index;
        expander.current_name.clone_from(&variable.name);
        expander.repeat_count = 0;

        let rule = std::mem::replace(&mut variable.rule, SyntaxRule::Blank);
        variable.rule = match rule {
            SyntaxRule::Repeat1(inner) if variable.kind == VariableKind::Hidden => {
                variable.kind = VariableKind::Auxiliary;
                let inner = expander.expand(*inner);
                binary_tree(Symbol::non_terminal(index), inner)
            }
            rule => expander.expand(rule),
        };
    }

    grammar.variables.extend(expander.auxiliary);
    grammar
}

fn binary_tree(symbol: Symbol, inner: SyntaxRule) -> SyntaxRule {
    SyntaxRule::Choice(vec![
        SyntaxRule::Seq(vec![SyntaxRule::Symbol(symbol), SyntaxRule::Symbol(symbol)]),
        inner,
    ])
}

struct Expander {
    variable_count: usize,
    auxiliary: Vec<ExtractedVariable>,
    existing: HashMap<SyntaxRule, Symbol>,
    current: usize,
    current_name: String,
    repeat_count: usize,
}

impl Expander {
    fn expand(&mut self, rule: SyntaxRule) -> SyntaxRule {
        match rule {
            SyntaxRule::Seq(members) => {
                SyntaxRule::Seq(members.into_iter().map(|m| self.expand(m)).collect())
            }
            SyntaxRule::Choice(members) => {
                SyntaxRule::Choice(members.into_iter().map(|m| self.expand(m)).collect())
            }
            SyntaxRule::Metadata { params, rule } => SyntaxRule::Metadata {
                params,
                rule: Box::new(self.expand(*rule)),
            },
            SyntaxRule::Repeat1(inner) => {
                let inner = self.expand(*inner);
                if let Some(symbol) = self.existing.get(&inner) {
                    return SyntaxRule::Symbol(*symbol);
                }
                self.repeat_count += 1;
                let symbol = Symbol::non_terminal(self.variable_count + self.auxiliary.len());
                self.auxiliary.push(ExtractedVariable {
                    name: format!("{}_repeat{}", self.current_name, self.repeat_count),
                    kind: VariableKind::Auxiliary,
                    rule: binary_tree(symbol, inner.clone()),
                    parent: Some(Symbol::non_terminal(self.current)),
                });
                self.existing.insert(inner, symbol);
                SyntaxRule::Symbol(symbol)
            }
            rule => rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{grammar::parse_grammar, prepare::extract_tokens::extract_tokens};

    fn expand(json: &str) -> ExtractedGrammar {
        expand_repeats(extract_tokens(&parse_grammar(json).unwrap()).unwrap())
    }

    #[test]
    fn repeats_become_binary_tree_helpers() {
        let grammar = expand(
            r#"{
                "name": "demo",
                "rules": {
                    "list": {"type": "SEQ", "members": [
                        {"type": "REPEAT1", "content": {"type": "STRING", "value": "a"}},
                        {"type": "REPEAT", "content": {"type": "STRING", "value": "a"}},
                        {"type": "REPEAT", "content": {"type": "STRING", "value": "b"}}
                    ]}
                }
            }"#,
        );
        let names: Vec<_> = grammar.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["list", "list_repeat1", "list_repeat2"]);

        let helper = Symbol::non_terminal(1);
        assert_eq!(grammar.variables[1].parent, Some(Symbol::non_terminal(0)));
        assert_eq!(
            grammar.variables[1].rule,
            SyntaxRule::Choice(vec![
                SyntaxRule::Seq(vec![SyntaxRule::Symbol(helper), SyntaxRule::Symbol(helper)]),
                SyntaxRule::Symbol(Symbol::terminal(0)),
            ])
        );
        assert_eq!(
            grammar.variables[0].rule,
            SyntaxRule::Seq(vec![
                SyntaxRule::Symbol(helper),
                SyntaxRule::Choice(vec![SyntaxRule::Symbol(helper), SyntaxRule::Blank]),
                SyntaxRule::Choice(vec![
                    SyntaxRule::Symbol(Symbol::non_terminal(2)),
                    SyntaxRule::Blank
                ]),
            ])
        );
    }

    #[test]
    fn identical_repeats_share_a_helper_across_rules() {
        let grammar = expand(
            r#"{
                "name": "demo",
                "rules": {
                    "first": {"type": "REPEAT1", "content": {"type": "STRING", "value": "a"}},
                    "second": {"type": "SEQ", "members": [
                        {"type": "STRING", "value": "b"},
                        {"type": "REPEAT1", "content": {"type": "STRING", "value": "a"}}
                    ]}
                }
            }"#,
        );
        let names: Vec<_> = grammar.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "first_repeat1"]);
        assert_eq!(
            grammar.variables[1].rule,
            SyntaxRule::Seq(vec![
                SyntaxRule::Symbol(Symbol::terminal(1)),
                SyntaxRule::Symbol(Symbol::non_terminal(2)),
            ])
        );
    }

    #[test]
    fn hidden_repetitions_become_their_own_tree() {
        let grammar = expand(
            r#"{
                "name": "demo",
                "rules": {
                    "start": {"type": "SYMBOL", "name": "_items"},
                    "_items": {"type": "REPEAT1", "content": {"type": "STRING", "value": "x"}}
                }
            }"#,
        );
        assert_eq!(grammar.variables.len(), 2);
        assert_eq!(grammar.variables[1].kind, VariableKind::Auxiliary);
        assert_eq!(
            grammar.variables[1].rule,
            binary_tree(Symbol::non_terminal(1), SyntaxRule::Symbol(Symbol::terminal(0)))
        );
    }
}
