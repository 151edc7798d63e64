//! Regular-expression views of token rules.
//!
//! The parse tables never run these expressions. They answer two questions
//! the builder has about tokens: which characters can start a token (for
//! reusability and state merging) and which strings are keywords.

use regex::Regex;
use regex_syntax::hir::{Class, ClassUnicode, ClassUnicodeRange, Hir, HirKind};

use super::{PreparedGrammar, Symbol, VariableKind};
use crate::{
    error::{GenerateError, GenerateResult},
    grammar::Rule,
};

#[derive(Clone, Debug)]
pub struct TokenPattern {
    pub source: String,
    pub first_chars: ClassUnicode,
}

impl TokenPattern {
    pub fn new(token_name: &str, rule: &Rule) -> GenerateResult<Self> {
        let source = regex_source(token_name, rule)?;
        let hir = regex_syntax::Parser::new()
            .parse(&source)
            .map_err(|e| GenerateError::InvalidPattern {
                token: token_name.to_string(),
                message: e.to_string(),
            })?;
        let first_chars = first_chars(&hir);
        Ok(TokenPattern {
            source,
            first_chars,
        })
    }

    /// Whether two tokens can start with the same character.
    pub fn overlaps(&self, other: &TokenPattern) -> bool {
        let mut shared = self.first_chars.clone();
        shared.intersect(&other.first_chars);
        !shared.ranges().is_empty()
    }

    pub fn matches_whole(&self, text: &str) -> GenerateResult<bool> {
        let regex = Regex::new(&format!("^(?:{})$", self.source)).map_err(|e| {
            GenerateError::InvalidPattern {
                token: text.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(regex.is_match(text))
    }
}

fn regex_source(token_name: &str, rule: &Rule) -> GenerateResult<String> {
    Ok(match rule {
        Rule::Blank => String::new(),
        Rule::String { value } => regex_syntax::escape(value),
        Rule::Pattern { value, flags } => match flags.as_deref() {
            Some(flags) if flags.contains('i') => format!("(?i:{value})"),
            _ => format!("(?:{value})"),
        },
        Rule::Seq { members } => {
            let mut source = String::new();
            for member in members {
                source.push_str(&regex_source(token_name, member)?);
            }
            source
        }
        Rule::Choice { members } => {
            let mut alternatives = Vec::with_capacity(members.len());
            for member in members {
                alternatives.push(regex_source(token_name, member)?);
            }
            format!("(?:{})", alternatives.join("|"))
        }
        Rule::Repeat { content } => format!("(?:{})*", regex_source(token_name, content)?),
        Rule::Repeat1 { content } => format!("(?:{})+", regex_source(token_name, content)?),
        Rule::Token { content }
        | Rule::ImmediateToken { content }
        | Rule::Field { content, .. }
        | Rule::Prec { content, .. }
        | Rule::PrecLeft { content, .. }
        | Rule::PrecRight { content, .. }
        | Rule::PrecDynamic { content, .. }
        | Rule::Reserved { content, .. }
        | Rule::Alias { content, .. } => regex_source(token_name, content)?,
        Rule::Symbol { name } => {
            return Err(GenerateError::SymbolInToken {
                token: token_name.to_string(),
                symbol: name.clone(),
            })
        }
    })
}

fn first_chars(hir: &Hir) -> ClassUnicode {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => ClassUnicode::empty(),
        HirKind::Literal(literal) => match std::str::from_utf8(&literal.0)
            .ok()
            .and_then(|s| s.chars().next())
        {
            Some(c) => ClassUnicode::new([ClassUnicodeRange::new(c, c)]),
            None => ClassUnicode::empty(),
        },
        HirKind::Class(Class::Unicode(class)) => class.clone(),
        HirKind::Class(Class::Bytes(class)) => ClassUnicode::new(
            class
                .ranges()
                .iter()
                .map(|r| ClassUnicodeRange::new(char::from(r.start()), char::from(r.end()))),
        ),
        HirKind::Repetition(repetition) => first_chars(&repetition.sub),
        HirKind::Capture(capture) => first_chars(&capture.sub),
        HirKind::Concat(parts) => {
            let mut result = ClassUnicode::empty();
            for part in parts {
                result.union(&first_chars(part));
                if !is_nullable(part) {
                    break;
                }
            }
            result
        }
        HirKind::Alternation(alternatives) => {
            let mut result = ClassUnicode::empty();
            for alternative in alternatives {
                result.union(&first_chars(alternative));
            }
            result
        }
    }
}

fn is_nullable(hir: &Hir) -> bool {
    hir.properties().minimum_len() == Some(0)
}

/// Literal tokens that the word token also matches are lexed through the
/// word token and then looked up in a keyword table.
pub(super) fn identify_keywords(grammar: &PreparedGrammar) -> GenerateResult<Vec<Symbol>> {
    let Some(word) = grammar.word_token else {
        return Ok(Vec::new());
    };
    let word_pattern = &grammar.tokens[word.index].pattern;

    let mut keywords = Vec::new();
    for (index, token) in grammar.tokens.iter().enumerate() {
        if index == word.index || token.is_immediate {
            continue;
        }
        let Rule::String { value } = &token.rule else {
            continue;
        };
        if token.kind == VariableKind::Auxiliary || value.is_empty() {
            continue;
        }
        if word_pattern.matches_whole(value)? {
            keywords.push(Symbol::terminal(index));
        }
    }
    Ok(keywords)
}
