use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

use crate::Show;

/// A symbol of an alphabet, which is also the type of the symbols in a word. Symbols are
/// cheap to copy and can be ordered, hashed and displayed, nothing more is assumed about
/// them.
pub trait Symbol: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show {}
impl<S: PartialEq + Eq + Debug + Copy + Ord + PartialOrd + Hash + Show> Symbol for S {}

/// An alphabet is a finite, ordered collection of [`Symbol`]s. The order is fixed and gives
/// every symbol a dense index in `0..size()`, which transition tables and the minimization
/// engine use to address per-symbol data in flat arrays.
pub trait Alphabet: Clone + Debug {
    /// The type of symbols in this alphabet.
    type Symbol: Symbol;

    /// Type for an iterator over all symbols in the alphabet, in their fixed order.
    type Universe<'this>: Iterator<Item = Self::Symbol>
    where
        Self: 'this;

    /// Returns an iterator over all symbols in the alphabet, in their fixed order.
    fn universe(&self) -> Self::Universe<'_>;

    /// Returns true if the given symbol is present in the alphabet.
    fn contains(&self, symbol: Self::Symbol) -> bool;

    /// Returns the number of symbols in the alphabet.
    fn size(&self) -> usize;

    /// Returns the dense index of the given symbol, or `None` if the symbol is not part of
    /// the alphabet. For a contained symbol the index is less than [`Alphabet::size`] and
    /// `symbol_from_index` inverts it.
    fn symbol_to_index(&self, symbol: Self::Symbol) -> Option<usize>;

    /// Returns the symbol sitting at the given dense index. Panics if the index is not
    /// less than [`Alphabet::size`].
    fn symbol_from_index(&self, index: usize) -> Self::Symbol;

    /// Returns true if the alphabet contains no symbols.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<A: Alphabet> Alphabet for &A {
    type Symbol = A::Symbol;
    type Universe<'this>
        = A::Universe<'this>
    where
        Self: 'this;
    fn universe(&self) -> Self::Universe<'_> {
        A::universe(self)
    }
    fn contains(&self, symbol: Self::Symbol) -> bool {
        A::contains(self, symbol)
    }
    fn size(&self) -> usize {
        A::size(self)
    }
    fn symbol_to_index(&self, symbol: Self::Symbol) -> Option<usize> {
        A::symbol_to_index(self, symbol)
    }
    fn symbol_from_index(&self, index: usize) -> Self::Symbol {
        A::symbol_from_index(self, index)
    }
}

/// An alphabet where a [`Symbol`] is just a single `char`.
///
/// # Example
/// Assume we have a [`CharAlphabet`] over the symbols 'a' and 'b'. Then a **symbol** would
/// be just one of these characters, e.g. 'a', and its index is the position the character
/// has in the alphabet, i.e. 0 for 'a' and 1 for 'b'.
#[derive(Clone, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct CharAlphabet(pub(crate) Vec<char>);

impl CharAlphabet {
    /// Creates a new [`CharAlphabet`] of the given size. The symbols are just the first
    /// `size` letters of the alphabet, i.e. 'a' to 'z'.
    pub fn of_size(size: usize) -> Self {
        assert!(size < 26, "Alphabet is too large");
        Self((0..size).map(|i| (b'a' + i as u8) as char).collect())
    }

    /// Creates a new [`CharAlphabet`] from an iterator over the symbols.
    pub fn new<I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        Self(symbols.into_iter().collect())
    }
}

impl std::ops::Index<usize> for CharAlphabet {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<char>> for CharAlphabet {
    fn from(value: Vec<char>) -> Self {
        Self(value)
    }
}

impl FromIterator<char> for CharAlphabet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        Self(iter.into_iter().unique().sorted().collect())
    }
}

/// Helper macro for creating a [`CharAlphabet`]. Is called simply with a list of symbols
/// that are separated by commata.
///
/// # Examples
/// ```
/// use quotient::prelude::*;
/// let alphabet = alphabet!('a', 'b', 'c');
/// assert_eq!(alphabet.size(), 3);
/// ```
#[macro_export]
macro_rules! alphabet {
    ($($c:literal),* $(,)?) => {
        $crate::alphabet::CharAlphabet::new(vec![$($c),*])
    };
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
    {
        format!(
            "\"{}\"",
            iter.into_iter().map(|sym| sym.to_string()).join("")
        )
    }
}

impl Alphabet for CharAlphabet {
    type Symbol = char;

    type Universe<'this>
        = std::iter::Cloned<std::slice::Iter<'this, char>>
    where
        Self: 'this;

    fn universe(&self) -> Self::Universe<'_> {
        self.0.iter().cloned()
    }

    fn contains(&self, symbol: Self::Symbol) -> bool {
        self.0.contains(&symbol)
    }

    fn size(&self) -> usize {
        self.0.len()
    }

    fn symbol_to_index(&self, symbol: Self::Symbol) -> Option<usize> {
        self.0.iter().position(|c| *c == symbol)
    }

    fn symbol_from_index(&self, index: usize) -> Self::Symbol {
        assert!(index < self.size());
        self[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{Alphabet, CharAlphabet};

    #[test]
    fn char_alphabet_indexing() {
        let alphabet = CharAlphabet::of_size(3);
        assert_eq!(alphabet.size(), 3);
        assert_eq!(alphabet.symbol_to_index('b'), Some(1));
        assert_eq!(alphabet.symbol_to_index('z'), None);
        for (i, sym) in alphabet.universe().enumerate() {
            assert_eq!(alphabet.symbol_from_index(i), sym);
            assert_eq!(alphabet.symbol_to_index(sym), Some(i));
        }
    }

    #[test]
    fn from_iterator_dedups_and_sorts() {
        let alphabet: CharAlphabet = "abacaba".chars().collect();
        assert_eq!(alphabet.size(), 3);
        assert!(alphabet.contains('c'));
        assert_eq!(alphabet.symbol_from_index(0), 'a');
    }
}
