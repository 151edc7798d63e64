//! Turns an [`InputGrammar`] into the flat form the table builder works on.
//!
//! The passes run in order: lexical tokens are pulled out of the syntax
//! rules, repetitions become auxiliary binary-tree rules, and every
//! syntax rule is flattened into a list of productions.

mod expand_repeats;
mod extract_tokens;
mod flatten;
pub mod token_rules;

use std::fmt;

use log::debug;

use crate::{
    error::{GenerateError, GenerateResult},
    grammar::{InputGrammar, Rule},
};

pub use self::token_rules::TokenPattern;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolType {
    End,
    Terminal,
    NonTerminal,
}

/// A grammar symbol. Terminals index into [`PreparedGrammar::tokens`],
/// non-terminals into [`PreparedGrammar::variables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    pub kind: SymbolType,
    pub index: usize,
}

impl Symbol {
    pub const END: Symbol = Symbol {
        kind: SymbolType::End,
        index: 0,
    };

    pub fn terminal(index: usize) -> Self {
        Symbol {
            kind: SymbolType::Terminal,
            index,
        }
    }

    pub fn non_terminal(index: usize) -> Self {
        Symbol {
            kind: SymbolType::NonTerminal,
            index,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.kind != SymbolType::NonTerminal
    }

    pub fn is_non_terminal(self) -> bool {
        self.kind == SymbolType::NonTerminal
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableKind {
    /// Visible and named, e.g. `identifier`.
    Named,
    /// Named but starting with `_`, so it never shows up in trees.
    Hidden,
    /// A literal string such as `"{"`.
    Anonymous,
    /// Introduced by the generator: repetitions and inline patterns.
    Auxiliary,
}

impl VariableKind {
    pub fn is_visible(self) -> bool {
        matches!(self, VariableKind::Named | VariableKind::Anonymous)
    }

    pub fn is_named(self) -> bool {
        matches!(self, VariableKind::Named | VariableKind::Hidden)
    }

    pub(crate) fn for_rule_name(name: &str) -> Self {
        if name.starts_with('_') {
            VariableKind::Hidden
        } else {
            VariableKind::Named
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Associativity {
    Left,
    Right,
}

/// A lexical token of the prepared grammar.
#[derive(Clone, Debug)]
pub struct LexicalToken {
    pub name: String,
    pub kind: VariableKind,
    /// The token body with precedence and immediacy wrappers removed.
    pub rule: Rule,
    pub is_immediate: bool,
    pub precedence: i32,
    pub pattern: TokenPattern,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProductionStep {
    pub symbol: Symbol,
    pub precedence: i32,
    pub associativity: Option<Associativity>,
    pub field_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Production {
    pub steps: Vec<ProductionStep>,
    pub dynamic_precedence: i32,
}

#[derive(Clone, Debug)]
pub struct SyntaxVariable {
    pub name: String,
    pub kind: VariableKind,
    pub productions: Vec<Production>,
    /// For auxiliary repetitions, the rule whose body contained the repeat.
    pub parent: Option<Symbol>,
}

#[derive(Clone, Debug)]
pub struct PreparedGrammar {
    pub name: String,
    pub tokens: Vec<LexicalToken>,
    pub variables: Vec<SyntaxVariable>,
    pub extra_symbols: Vec<Symbol>,
    /// Each entry is sorted so it can be compared against a computed conflict.
    pub expected_conflicts: Vec<Vec<Symbol>>,
    pub word_token: Option<Symbol>,
    pub keywords: Vec<Symbol>,
}

impl PreparedGrammar {
    pub fn start_symbol(&self) -> Symbol {
        Symbol::non_terminal(0)
    }

    /// `end`, then every token, then every syntax variable.
    pub fn symbol_count(&self) -> usize {
        1 + self.tokens.len() + self.variables.len()
    }

    pub fn token_count(&self) -> usize {
        1 + self.tokens.len()
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        match symbol.kind {
            SymbolType::End => "end",
            SymbolType::Terminal => &self.tokens[symbol.index].name,
            SymbolType::NonTerminal => &self.variables[symbol.index].name,
        }
    }

    pub fn symbol_kind(&self, symbol: Symbol) -> VariableKind {
        match symbol.kind {
            SymbolType::End => VariableKind::Hidden,
            SymbolType::Terminal => self.tokens[symbol.index].kind,
            SymbolType::NonTerminal => self.variables[symbol.index].kind,
        }
    }

    /// The dense id used in the generated tables.
    pub fn symbol_id(&self, symbol: Symbol) -> usize {
        match symbol.kind {
            SymbolType::End => 0,
            SymbolType::Terminal => 1 + symbol.index,
            SymbolType::NonTerminal => self.token_count() + symbol.index,
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        std::iter::once(Symbol::END)
            .chain((0..self.tokens.len()).map(Symbol::terminal))
            .chain((0..self.variables.len()).map(Symbol::non_terminal))
    }

    pub fn terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        std::iter::once(Symbol::END).chain((0..self.tokens.len()).map(Symbol::terminal))
    }

    pub fn is_keyword(&self, symbol: Symbol) -> bool {
        self.keywords.contains(&symbol)
    }

    pub fn is_extra(&self, symbol: Symbol) -> bool {
        self.extra_symbols.contains(&symbol)
    }

    pub fn token(&self, symbol: Symbol) -> Option<&LexicalToken> {
        match symbol.kind {
            SymbolType::Terminal => self.tokens.get(symbol.index),
            _ => None,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableKind::Named => "named",
            VariableKind::Hidden => "hidden",
            VariableKind::Anonymous => "anonymous",
            VariableKind::Auxiliary => "auxiliary",
        };
        f.write_str(name)
    }
}

/// Runs every preparation pass.
pub fn prepare_grammar(input: &InputGrammar) -> GenerateResult<PreparedGrammar> {
    reject_unsupported(input)?;

    let extracted = extract_tokens::extract_tokens(input)?;
    let expanded = expand_repeats::expand_repeats(extracted);
    let mut grammar = flatten::flatten_grammar(expanded)?;
    grammar.keywords = token_rules::identify_keywords(&grammar)?;

    debug!(
        "prepared grammar `{}`: {} tokens, {} variables, {} keywords",
        grammar.name,
        grammar.tokens.len(),
        grammar.variables.len(),
        grammar.keywords.len()
    );
    Ok(grammar)
}

fn reject_unsupported(input: &InputGrammar) -> GenerateResult<()> {
    let unsupported = [
        ("externals", !input.externals.is_empty()),
        ("inline", !input.inline.is_empty()),
        ("supertypes", !input.supertypes.is_empty()),
        ("precedences", !input.precedences.is_empty()),
        ("reserved", !input.reserved.is_empty()),
    ];
    match unsupported.iter().find(|(_, present)| *present) {
        Some((feature, _)) => Err(GenerateError::Unsupported((*feature).to_string())),
        None => Ok(()),
    }
}
