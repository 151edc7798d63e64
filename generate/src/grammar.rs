//! The `grammar.json` input format.
//!
//! Rules keep the declaration order of the JSON object because the first
//! rule is the start rule. This relies on `serde_json`'s `preserve_order`.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{GenerateError, GenerateResult};

/// One node of a rule tree, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    Blank,
    String {
        value: String,
    },
    Pattern {
        value: String,
        #[serde(default)]
        flags: Option<String>,
    },
    Symbol {
        name: String,
    },
    Seq {
        members: Vec<Rule>,
    },
    Choice {
        members: Vec<Rule>,
    },
    Repeat {
        content: Box<Rule>,
    },
    Repeat1 {
        content: Box<Rule>,
    },
    Field {
        name: String,
        content: Box<Rule>,
    },
    Prec {
        value: PrecedenceValue,
        content: Box<Rule>,
    },
    PrecLeft {
        value: PrecedenceValue,
        content: Box<Rule>,
    },
    PrecRight {
        value: PrecedenceValue,
        content: Box<Rule>,
    },
    PrecDynamic {
        value: i32,
        content: Box<Rule>,
    },
    Token {
        content: Box<Rule>,
    },
    ImmediateToken {
        content: Box<Rule>,
    },
    Alias {
        content: Box<Rule>,
        named: bool,
        value: String,
    },
    Reserved {
        context_name: String,
        content: Box<Rule>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum PrecedenceValue {
    Integer(i32),
    Name(String),
}

impl PrecedenceValue {
    pub fn integer(&self) -> GenerateResult<i32> {
        match self {
            PrecedenceValue::Integer(value) => Ok(*value),
            PrecedenceValue::Name(name) => Err(GenerateError::NamedPrecedence(name.clone())),
        }
    }
}

impl Rule {
    /// A rule whose whole body is lexical becomes a token named after the rule.
    pub fn is_token(&self) -> bool {
        matches!(
            self,
            Rule::String { .. }
                | Rule::Pattern { .. }
                | Rule::Token { .. }
                | Rule::ImmediateToken { .. }
        )
    }

    pub fn symbol_name(&self) -> Option<&str> {
        match self {
            Rule::Symbol { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub rule: Rule,
}

#[derive(Debug, Clone)]
pub struct InputGrammar {
    pub name: String,
    pub variables: Vec<Variable>,
    pub extras: Vec<Rule>,
    pub expected_conflicts: Vec<Vec<String>>,
    pub word_token: Option<String>,
    pub externals: Vec<Rule>,
    pub inline: Vec<String>,
    pub supertypes: Vec<String>,
    pub precedences: Vec<Vec<Rule>>,
    pub reserved: Map<String, Value>,
}

#[derive(Deserialize)]
struct GrammarJson {
    name: String,
    rules: Map<String, Value>,
    #[serde(default)]
    extras: Vec<Rule>,
    #[serde(default)]
    conflicts: Vec<Vec<Rule>>,
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    externals: Vec<Rule>,
    #[serde(default)]
    inline: Vec<String>,
    #[serde(default)]
    supertypes: Vec<String>,
    #[serde(default)]
    precedences: Vec<Vec<Rule>>,
    #[serde(default)]
    reserved: Map<String, Value>,
}

pub fn parse_grammar(json: &str) -> GenerateResult<InputGrammar> {
    let grammar: GrammarJson = serde_json::from_str(json)?;

    let mut variables = Vec::with_capacity(grammar.rules.len());
    for (name, value) in grammar.rules {
        let rule = serde_json::from_value(value).map_err(|source| GenerateError::InvalidRule {
            name: name.clone(),
            source,
        })?;
        variables.push(Variable { name, rule });
    }
    if variables.is_empty() {
        return Err(GenerateError::NoRules);
    }

    let mut expected_conflicts = Vec::with_capacity(grammar.conflicts.len());
    for conflict in &grammar.conflicts {
        let mut names = Vec::with_capacity(conflict.len());
        for rule in conflict {
            let name = rule
                .symbol_name()
                .ok_or_else(|| GenerateError::InvalidConflict(format!("{rule:?}")))?;
            names.push(name.to_string());
        }
        expected_conflicts.push(names);
    }

    Ok(InputGrammar {
        name: grammar.name,
        variables,
        extras: grammar.extras,
        expected_conflicts,
        word_token: grammar.word,
        externals: grammar.externals,
        inline: grammar.inline,
        supertypes: grammar.supertypes,
        precedences: grammar.precedences,
        reserved: grammar.reserved,
    })
}
