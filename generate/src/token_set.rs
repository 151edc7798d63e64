use std::fmt;

use crate::prepare::{Symbol, SymbolType};

/// A set of terminals, stored as bits indexed by each symbol's dense id
/// (`end` is bit 0, token `i` is bit `i + 1`).
///
/// Words are only ever added when a bit in them is set, so two sets with
/// the same members always compare equal.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenSet {
    words: Vec<u64>,
}

fn position(symbol: Symbol) -> usize {
    debug_assert!(symbol.is_terminal(), "{symbol:?} is not a terminal");
    match symbol.kind {
        SymbolType::End => 0,
        _ => symbol.index + 1,
    }
}

fn symbol_at(position: usize) -> Symbol {
    if position == 0 {
        Symbol::END
    } else {
        Symbol::terminal(position - 1)
    }
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        let bit = position(symbol);
        self.words
            .get(bit / 64)
            .is_some_and(|word| word & (1u64 << (bit % 64)) != 0)
    }

    /// Returns whether the symbol was newly added.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let bit = position(symbol);
        if self.words.len() <= bit / 64 {
            self.words.resize(bit / 64 + 1, 0);
        }
        let word = &mut self.words[bit / 64];
        let mask = 1u64 << (bit % 64);
        let added = *word & mask == 0;
        *word |= mask;
        added
    }

    /// Returns whether any symbol was newly added.
    pub fn insert_all(&mut self, other: &TokenSet) -> bool {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut added = false;
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            added |= other & !*word != 0;
            *word |= other;
        }
        added
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| symbol_at(i * 64 + bit))
        })
    }

    /// The raw words, padded to `len` for a fixed-size table row.
    pub fn words(&self, len: usize) -> Vec<u64> {
        let mut words = self.words.clone();
        words.resize(len.max(words.len()), 0);
        words
    }
}

impl FromIterator<Symbol> for TokenSet {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_spanning_several_words() {
        let mut set = TokenSet::new();
        assert!(set.insert(Symbol::END));
        assert!(set.insert(Symbol::terminal(70)));
        assert!(!set.insert(Symbol::terminal(70)));
        assert!(set.contains(Symbol::terminal(70)));
        assert!(!set.contains(Symbol::terminal(69)));
        assert_eq!(set.iter().collect::<Vec<_>>(), [Symbol::END, Symbol::terminal(70)]);
        assert_eq!(set.words(3), [1, 1 << 7, 0]);

        let small: TokenSet = [Symbol::terminal(1)].into_iter().collect();
        let mut union = small.clone();
        assert!(union.insert_all(&set));
        assert!(!union.insert_all(&small));
        assert_eq!(union.len(), 3);
    }
}
