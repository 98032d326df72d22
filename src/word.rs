use itertools::Itertools;

use crate::{alphabet::Symbol, Show};

/// A finite sequence of symbols of type `S`. Implementations exist for the obvious
/// candidates such as string slices (over [`char`]), vectors and slices, which makes it
/// possible to pass a literal like `"abba"` anywhere a word over a
/// [`crate::CharAlphabet`] is expected.
pub trait FiniteWord<S> {
    /// Type of the iterator over the symbols making up the word.
    type Symbols<'this>: Iterator<Item = S>
    where
        Self: 'this;

    /// Returns an iterator over the symbols of the word.
    fn symbols(&self) -> Self::Symbols<'_>;

    /// Gives the length of the word, i.e. the number of symbols.
    fn len(&self) -> usize {
        self.symbols().count()
    }

    /// Returns `true` if the word is empty, i.e. has no symbols.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collects the symbols making up `self` into a vector.
    fn collect_vec(&self) -> Vec<S> {
        self.symbols().collect()
    }

    /// Converts the word to a string, using `ε` for the empty word.
    fn as_string(&self) -> String
    where
        S: Show,
    {
        let out = self.symbols().map(|a| a.show()).join("");
        if out.is_empty() {
            "ε".into()
        } else {
            out
        }
    }
}

impl<S, Fw: FiniteWord<S> + ?Sized> FiniteWord<S> for &Fw {
    type Symbols<'this>
        = Fw::Symbols<'this>
    where
        Self: 'this;

    fn symbols(&self) -> Self::Symbols<'_> {
        (*self).symbols()
    }

    fn len(&self) -> usize {
        (*self).len()
    }
}

impl FiniteWord<char> for str {
    type Symbols<'this> = std::str::Chars<'this>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }

    fn len(&self) -> usize {
        self.chars().count()
    }
}

impl FiniteWord<char> for String {
    type Symbols<'this> = std::str::Chars<'this>;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.chars()
    }

    fn len(&self) -> usize {
        self.chars().count()
    }
}

impl<S: Symbol> FiniteWord<S> for [S] {
    type Symbols<'this>
        = std::iter::Cloned<std::slice::Iter<'this, S>>
    where
        Self: 'this;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().cloned()
    }

    fn len(&self) -> usize {
        self.len()
    }
}

impl<S: Symbol, const N: usize> FiniteWord<S> for [S; N] {
    type Symbols<'this>
        = std::iter::Cloned<std::slice::Iter<'this, S>>
    where
        Self: 'this;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().cloned()
    }

    fn len(&self) -> usize {
        N
    }
}

impl<S: Symbol> FiniteWord<S> for Vec<S> {
    type Symbols<'this>
        = std::iter::Cloned<std::slice::Iter<'this, S>>
    where
        Self: 'this;

    fn symbols(&self) -> Self::Symbols<'_> {
        self.iter().cloned()
    }

    fn len(&self) -> usize {
        self.len()
    }
}
