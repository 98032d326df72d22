//! Minimization of deterministic finite-state machines through partition refinement.
//!
//! The heart of this crate is an implementation of the Paige/Tarjan partition refinement
//! scheme (with the Hopcroft-style smaller-half optimization): given a deterministic
//! transition system together with an initial classification of its states, it computes the
//! coarsest stable partition of the state set, that is the coarsest equivalence which refines
//! the initial classification and is compatible with the transition structure. Quotienting by
//! this equivalence yields the unique minimal machine that has the same behaviour as the
//! input, for every finite input word.
//!
//! Machines are represented through a small family of traits. A [`TransitionSystem`] has an
//! alphabet, a set of state indices and colors on its states and edges (a color is any type
//! implementing [`Color`], the absence of color is expressed with [`Void`]). The
//! [`transition_system::Deterministic`] trait provides the transition function as a lookup
//! `(state, symbol) -> Option<(successor, edge color)>`, where `None` marks an undefined
//! transition of a partial machine. [`Pointed`] designates an initial state and
//! [`transition_system::Sproutable`] allows growing a machine state by state, which is also
//! the interface through which minimization results are built. The canonical concrete
//! implementation is [`transition_system::DTS`], a dense table with one row per state,
//! indexed by the position a symbol has in the (finite, ordered) [`Alphabet`].
//!
//! On top of that, [`automaton::Initialized`] couples a transition system with an initial
//! state; [`automaton::DFA`], [`automaton::MooreMachine`] and [`automaton::MealyMachine`] are
//! the three classic readings of such a pointed machine. The [`minimization`] module exposes
//! the engine through two families of entry points: the strict ones
//! ([`minimization::minimize_dfa`] and friends) require a complete transition function and
//! fail on partial input, while the totalizing ones ([`minimization::minimize_partial_dfa`]
//! and friends) internally extend partial machines with an implicit absorbing sink state.
//! Unreachable parts of the input can be discarded before or after refinement, controlled by
//! [`minimization::PruningMode`].
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use quotient::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet,
        alphabet::{CharAlphabet, Symbol},
        automaton::{Initialized, MealyMachine, MooreMachine, DFA},
        math,
        minimization::{
            minimize_dfa, minimize_dfa_with, minimize_mealy, minimize_mealy_with,
            minimize_moore, minimize_moore_with, minimize_partial_dfa, minimize_partial_mealy,
            MinimizationError, PruningMode,
        },
        transition_system::{
            DefaultIdType, Deterministic, EdgeColor, ForAlphabet, IndexType, Sproutable,
            StateColor, StateIndex, SymbolOf, TSBuilder, DTS,
        },
        word::FiniteWord,
        Alphabet, Color, Pointed, Show, TransitionSystem, Void,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout
/// the crate and do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets.
pub mod alphabet;
pub use alphabet::Alphabet;

/// Defines finite words, which are the inputs that machines in this crate process.
pub mod word;

/// This module defines transition systems and successor functions and such.
pub mod transition_system;
pub use transition_system::{Deterministic, Pointed, TransitionSystem};

/// Defines pointed automata, i.e. combinations of a transition system with an initial state
/// and an interpretation of the colors.
pub mod automaton;

/// Contains the partition refinement engine together with the public minimization entry
/// points for the different machine kinds.
pub mod minimization;

use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;

/// A color is simply a type that can be used to color states or transitions.
pub trait Color: Clone + Eq + Hash + Debug {}

impl<T: Eq + Clone + Hash + Debug> Color for T {}

/// Represents the absence of a color. The idea is that this can be used when a transition
/// system does not need colors on its states or its edges. A [`automaton::DFA`] for example
/// colors its states with acceptance and has no use for edge colors, while for a
/// [`automaton::MealyMachine`] it is the other way around.
#[derive(Hash, Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Default)]
pub struct Void;

impl Debug for Void {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#")
    }
}

impl<C: Show> Show for (C, Void) {
    fn show(&self) -> String {
        self.0.show()
    }
}

impl<C: Show> Show for (Void, C) {
    fn show(&self) -> String {
        self.1.show()
    }
}

impl Show for (Void, Void) {
    fn show(&self) -> String {
        "-".to_string()
    }
}

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state index that should be
    /// for example q0, q1, q2, ... and for a transition (q0, a, q1) it should be (q0, a, q1).
    /// Just use something that makes sense. This is mainly used for debugging purposes.
    fn show(&self) -> String;
    /// Show a collection of the thing, for a collection of states this should be {q0, q1, q2, ...}
    /// and for a collection of transitions it should be {(q0, a, q1), (q1, b, q2), ...}.
    /// By default this is unimplemented.
    fn show_collection<'a, I>(_iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
        I::IntoIter: DoubleEndedIterator,
    {
        unimplemented!("This operation makes no sense.")
    }
}

impl Show for u32 {
    fn show(&self) -> String {
        self.to_string()
    }
    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
        I::IntoIter: DoubleEndedIterator,
    {
        format!(
            "[{}]",
            itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
        )
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
        I::IntoIter: DoubleEndedIterator,
    {
        format!(
            "[{}]",
            itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
        )
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for () {
    fn show(&self) -> String {
        "-".into()
    }
    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(_iter: I) -> String
    where
        Self: 'a,
        I::IntoIter: DoubleEndedIterator,
    {
        "-".to_string()
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        format!(
            "\"{}\"",
            itertools::Itertools::join(&mut self.iter().map(|x| x.show()), "")
        )
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
        I::IntoIter: DoubleEndedIterator,
    {
        format!(
            "{{{}}}",
            itertools::Itertools::join(&mut iter.into_iter().map(|x| x.show()), ", ")
        )
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show> Show for Option<S> {
    fn show(&self) -> String {
        match self {
            None => "".to_string(),
            Some(x) => x.show(),
        }
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }

    fn show_collection<'a, I: IntoIterator<Item = &'a Self>>(iter: I) -> String
    where
        Self: 'a,
        I::IntoIter: DoubleEndedIterator,
    {
        format!("{{{}}}", iter.into_iter().map(Show::show).join(", "))
    }
}

impl<S: Show> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::prelude::*;

    /// The six state example machine from the Wikipedia article on DFA minimization. Its
    /// minimal equivalent has the three classes {0, 1}, {2, 3, 4} and {5}.
    pub fn wiki_dfa() -> DFA<CharAlphabet> {
        TSBuilder::without_edge_colors()
            .with_state_colors([false, false, true, true, true, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 2),
                (1, 'a', 0),
                (1, 'b', 3),
                (2, 'a', 4),
                (2, 'b', 5),
                (3, 'a', 4),
                (3, 'b', 5),
                (4, 'a', 4),
                (4, 'b', 5),
                (5, 'a', 5),
                (5, 'b', 5),
            ])
            .into_dfa(0)
    }
}
