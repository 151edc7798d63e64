use std::collections::HashMap;

use super::{Associativity, LexicalToken, Symbol, TokenPattern, VariableKind};
use crate::{
    error::{GenerateError, GenerateResult},
    grammar::{InputGrammar, Rule},
};

/// A syntax rule whose terminals have been replaced by token symbols.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(super) enum SyntaxRule {
    Blank,
    Symbol(Symbol),
    Seq(Vec<SyntaxRule>),
    Choice(Vec<SyntaxRule>),
    /// One or more.
    Repeat1(Box<SyntaxRule>),
    Metadata {
        params: MetadataParams,
        rule: Box<SyntaxRule>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub(super) struct MetadataParams {
    pub precedence: Option<i32>,
    pub associativity: Option<Associativity>,
    pub dynamic_precedence: i32,
    pub field_name: Option<String>,
}

#[derive(Debug)]
pub(super) struct ExtractedVariable {
    pub name: String,
    pub kind: VariableKind,
    pub rule: SyntaxRule,
    pub parent: Option<Symbol>,
}

#[derive(Debug)]
pub(super) struct ExtractedGrammar {
    pub name: String,
    pub tokens: Vec<LexicalToken>,
    pub variables: Vec<ExtractedVariable>,
    pub extra_symbols: Vec<Symbol>,
    pub expected_conflicts: Vec<Vec<Symbol>>,
    pub word_token: Option<Symbol>,
}

pub(super) fn extract_tokens(input: &InputGrammar) -> GenerateResult<ExtractedGrammar> {
    let mut extractor = TokenExtractor::new(input);

    if input.variables[0].rule.is_token() {
        return Err(GenerateError::TokenStartRule(input.variables[0].name.clone()));
    }

    let mut variables = Vec::new();
    for variable in input.variables.iter().filter(|v| !v.rule.is_token()) {
        extractor.current_rule.clone_from(&variable.name);
        extractor.aux_token_count = 0;
        let rule = extractor.convert(&variable.rule)?;
        variables.push(ExtractedVariable {
            name: variable.name.clone(),
            kind: VariableKind::for_rule_name(&variable.name),
            rule,
            parent: None,
        });
    }

    let mut extra_symbols = Vec::new();
    extractor.current_rule = "extra".to_string();
    extractor.aux_token_count = 0;
    for rule in &input.extras {
        let symbol = match rule {
            Rule::Symbol { name } => {
                if !extractor.token_rules.contains_key(name.as_str()) {
                    return Err(GenerateError::NonTerminalExtra(name.clone()));
                }
                extractor.named_token(name)?
            }
            _ if is_lexical(rule) => extractor.anonymous_token(rule)?,
            _ => return Err(GenerateError::NonTerminalExtra(format!("{rule:?}"))),
        };
        if !extra_symbols.contains(&symbol) {
            extra_symbols.push(symbol);
        }
    }

    // Token rules nothing refers to still get symbols.
    for variable in input.variables.iter().filter(|v| v.rule.is_token()) {
        extractor.named_token(&variable.name)?;
    }

    let word_token = match &input.word_token {
        Some(name) if extractor.token_rules.contains_key(name.as_str()) => {
            Some(extractor.named_token(name)?)
        }
        Some(name) => return Err(GenerateError::InvalidWordToken(name.clone())),
        None => None,
    };

    let mut expected_conflicts = Vec::with_capacity(input.expected_conflicts.len());
    for names in &input.expected_conflicts {
        let mut conflict = Vec::with_capacity(names.len());
        for name in names {
            let index = extractor
                .syntax_indices
                .get(name.as_str())
                .ok_or_else(|| GenerateError::InvalidConflict(name.clone()))?;
            conflict.push(Symbol::non_terminal(*index));
        }
        conflict.sort_unstable();
        conflict.dedup();
        expected_conflicts.push(conflict);
    }

    Ok(ExtractedGrammar {
        name: input.name.clone(),
        tokens: extractor.tokens,
        variables,
        extra_symbols,
        expected_conflicts,
        word_token,
    })
}

fn is_lexical(rule: &Rule) -> bool {
    matches!(
        rule,
        Rule::String { .. } | Rule::Pattern { .. } | Rule::Token { .. } | Rule::ImmediateToken { .. }
    )
}

struct TokenExtractor<'a> {
    token_rules: HashMap<&'a str, &'a Rule>,
    syntax_indices: HashMap<&'a str, usize>,
    tokens: Vec<LexicalToken>,
    named_tokens: HashMap<String, usize>,
    anonymous_tokens: HashMap<(Rule, bool, i32), usize>,
    current_rule: String,
    aux_token_count: usize,
}

impl<'a> TokenExtractor<'a> {
    fn new(input: &'a InputGrammar) -> Self {
        let token_rules = input
            .variables
            .iter()
            .filter(|v| v.rule.is_token())
            .map(|v| (v.name.as_str(), &v.rule))
            .collect();
        let syntax_indices = input
            .variables
            .iter()
            .filter(|v| !v.rule.is_token())
            .enumerate()
            .map(|(i, v)| (v.name.as_str(), i))
            .collect();
        TokenExtractor {
            token_rules,
            syntax_indices,
            tokens: Vec::new(),
            named_tokens: HashMap::new(),
            anonymous_tokens: HashMap::new(),
            current_rule: String::new(),
            aux_token_count: 0,
        }
    }

    fn convert(&mut self, rule: &Rule) -> GenerateResult<SyntaxRule> {
        Ok(match rule {
            Rule::Blank => SyntaxRule::Blank,
            Rule::String { .. }
            | Rule::Pattern { .. }
            | Rule::Token { .. }
            | Rule::ImmediateToken { .. } => SyntaxRule::Symbol(self.anonymous_token(rule)?),
            Rule::Symbol { name } => SyntaxRule::Symbol(self.resolve(name)?),
            Rule::Seq { members } => SyntaxRule::Seq(self.convert_all(members)?),
            Rule::Choice { members } => SyntaxRule::Choice(self.convert_all(members)?),
            Rule::Repeat { content } => SyntaxRule::Choice(vec![
                SyntaxRule::Repeat1(Box::new(self.convert(content)?)),
                SyntaxRule::Blank,
            ]),
            Rule::Repeat1 { content } => SyntaxRule::Repeat1(Box::new(self.convert(content)?)),
            Rule::Field { name, content } => self.metadata(
                MetadataParams {
                    field_name: Some(name.clone()),
                    ..MetadataParams::default()
                },
                content,
            )?,
            Rule::Prec { value, content } => self.metadata(
                MetadataParams {
                    precedence: Some(value.integer()?),
                    ..MetadataParams::default()
                },
                content,
            )?,
            Rule::PrecLeft { value, content } => self.metadata(
                MetadataParams {
                    precedence: Some(value.integer()?),
                    associativity: Some(Associativity::Left),
                    ..MetadataParams::default()
                },
                content,
            )?,
            Rule::PrecRight { value, content } => self.metadata(
                MetadataParams {
                    precedence: Some(value.integer()?),
                    associativity: Some(Associativity::Right),
                    ..MetadataParams::default()
                },
                content,
            )?,
            Rule::PrecDynamic { value, content } => self.metadata(
                MetadataParams {
                    dynamic_precedence: *value,
                    ..MetadataParams::default()
                },
                content,
            )?,
            Rule::Alias { .. } => return Err(GenerateError::Unsupported("ALIAS".into())),
            Rule::Reserved { .. } => return Err(GenerateError::Unsupported("RESERVED".into())),
        })
    }

    fn convert_all(&mut self, members: &[Rule]) -> GenerateResult<Vec<SyntaxRule>> {
        members.iter().map(|member| self.convert(member)).collect()
    }

    fn metadata(&mut self, params: MetadataParams, content: &Rule) -> GenerateResult<SyntaxRule> {
        Ok(SyntaxRule::Metadata {
            params,
            rule: Box::new(self.convert(content)?),
        })
    }

    fn resolve(&mut self, name: &str) -> GenerateResult<Symbol> {
        if self.token_rules.contains_key(name) {
            return self.named_token(name);
        }
        match self.syntax_indices.get(name) {
            Some(index) => Ok(Symbol::non_terminal(*index)),
            None => Err(GenerateError::UndefinedSymbol {
                symbol: name.to_string(),
                rule: self.current_rule.clone(),
            }),
        }
    }

    fn named_token(&mut self, name: &str) -> GenerateResult<Symbol> {
        if let Some(index) = self.named_tokens.get(name) {
            return Ok(Symbol::terminal(*index));
        }
        let rule = self.token_rules[name];
        let (body, is_immediate, precedence) = unwrap_token(rule)?;
        let pattern = TokenPattern::new(name, &body)?;
        let index = self.tokens.len();
        self.tokens.push(LexicalToken {
            name: name.to_string(),
            kind: VariableKind::for_rule_name(name),
            rule: body,
            is_immediate,
            precedence,
            pattern,
        });
        self.named_tokens.insert(name.to_string(), index);
        Ok(Symbol::terminal(index))
    }

    fn anonymous_token(&mut self, rule: &Rule) -> GenerateResult<Symbol> {
        let (body, is_immediate, precedence) = unwrap_token(rule)?;
        let key = (body, is_immediate, precedence);
        if let Some(index) = self.anonymous_tokens.get(&key) {
            return Ok(Symbol::terminal(*index));
        }
        let (name, kind) = match &key.0 {
            Rule::String { value } => (value.clone(), VariableKind::Anonymous),
            _ => {
                self.aux_token_count += 1;
                let name = format!("{}_token{}", self.current_rule, self.aux_token_count);
                (name, VariableKind::Auxiliary)
            }
        };
        let pattern = TokenPattern::new(&name, &key.0)?;
        let index = self.tokens.len();
        self.tokens.push(LexicalToken {
            name,
            kind,
            rule: key.0.clone(),
            is_immediate,
            precedence,
            pattern,
        });
        self.anonymous_tokens.insert(key, index);
        Ok(Symbol::terminal(index))
    }
}

/// Strips `TOKEN`, `IMMEDIATE_TOKEN` and precedence wrappers from a token body.
fn unwrap_token(rule: &Rule) -> GenerateResult<(Rule, bool, i32)> {
    let mut rule = rule;
    let mut is_immediate = false;
    let mut precedence = 0;
    loop {
        rule = match rule {
            Rule::Token { content } => content,
            Rule::ImmediateToken { content } => {
                is_immediate = true;
                content
            }
            Rule::Prec { value, content }
            | Rule::PrecLeft { value, content }
            | Rule::PrecRight { value, content } => {
                precedence = value.integer()?;
                content
            }
            _ => return Ok((rule.clone(), is_immediate, precedence)),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse_grammar;

    fn extract(json: &str) -> GenerateResult<ExtractedGrammar> {
        extract_tokens(&parse_grammar(json).unwrap())
    }

    fn token_names(grammar: &ExtractedGrammar) -> Vec<&str> {
        grammar.tokens.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn strings_are_shared_and_immediate_strings_are_not() {
        let grammar = extract(
            r#"{
                "name": "demo",
                "rules": {
                    "string": {"type": "SEQ", "members": [
                        {"type": "STRING", "value": "\""},
                        {"type": "SYMBOL", "name": "content"},
                        {"type": "IMMEDIATE_TOKEN", "content": {"type": "STRING", "value": "\""}},
                        {"type": "STRING", "value": "\""}
                    ]},
                    "content": {"type": "IMMEDIATE_TOKEN", "content": {
                        "type": "PREC", "value": 1, "content": {"type": "PATTERN", "value": "[^\"]+"}
                    }}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(token_names(&grammar), ["\"", "content", "\""]);
        assert!(!grammar.tokens[0].is_immediate);
        assert!(grammar.tokens[1].is_immediate);
        assert_eq!(grammar.tokens[1].precedence, 1);
        assert_eq!(grammar.tokens[1].kind, VariableKind::Named);
        assert!(grammar.tokens[2].is_immediate);
        assert_eq!(grammar.tokens[2].kind, VariableKind::Anonymous);
    }

    #[test]
    fn unused_token_rules_and_extras_are_kept() {
        let grammar = extract(
            r#"{
                "name": "demo",
                "extras": [{"type": "SYMBOL", "name": "_space"}, {"type": "PATTERN", "value": "\\t"}],
                "rules": {
                    "start": {"type": "STRING", "value": "go"},
                    "_space": {"type": "TOKEN", "content": {"type": "PATTERN", "value": " "}},
                    "unused": {"type": "STRING", "value": "!"}
                }
            }"#,
        );
        assert!(matches!(grammar, Err(GenerateError::TokenStartRule(_))));

        let grammar = extract(
            r#"{
                "name": "demo",
                "extras": [{"type": "SYMBOL", "name": "_space"}, {"type": "PATTERN", "value": "\\t"}],
                "rules": {
                    "start": {"type": "SEQ", "members": [{"type": "STRING", "value": "go"}]},
                    "_space": {"type": "TOKEN", "content": {"type": "PATTERN", "value": " "}},
                    "unused": {"type": "STRING", "value": "!"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(token_names(&grammar), ["go", "_space", "extra_token1", "unused"]);
        assert_eq!(grammar.tokens[1].kind, VariableKind::Hidden);
        assert_eq!(grammar.tokens[2].kind, VariableKind::Auxiliary);
        assert_eq!(
            grammar.extra_symbols,
            [Symbol::terminal(1), Symbol::terminal(2)]
        );
    }

    #[test]
    fn undefined_symbols_name_their_rule() {
        let err = extract(
            r#"{
                "name": "demo",
                "rules": {"start": {"type": "SYMBOL", "name": "missing"}}
            }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UndefinedSymbol { symbol, rule } if symbol == "missing" && rule == "start"
        ));
    }

    #[test]
    fn repeat_is_one_or_more_or_blank() {
        let grammar = extract(
            r#"{
                "name": "demo",
                "rules": {"start": {"type": "REPEAT", "content": {"type": "STRING", "value": "x"}}}
            }"#,
        )
        .unwrap();
        assert_eq!(
            grammar.variables[0].rule,
            SyntaxRule::Choice(vec![
                SyntaxRule::Repeat1(Box::new(SyntaxRule::Symbol(Symbol::terminal(0)))),
                SyntaxRule::Blank,
            ])
        );
    }
}
