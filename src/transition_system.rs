use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;
use tracing::trace;

use crate::{alphabet::Alphabet, word::FiniteWord, Color, Show};

mod dts;
pub use dts::DTS;

mod builder;
pub use builder::TSBuilder;

mod sproutable;
pub use sproutable::{ForAlphabet, Sproutable};

mod reachable;
pub use reachable::ReachableStateIndices;

/// Implemented by types that can serve as the index of a state in a transition system.
pub trait IndexType: Copy + Eq + Hash + Ord + Debug {}

macro_rules! impl_integer_index_type {
    ($($t:ty),*) => {
        $(
            impl IndexType for $t {}
        )*
    }
}

impl_integer_index_type!(u8, u16, u32, u64, usize);

/// The default type for state indices, a plain unsigned 32 bit integer.
pub type DefaultIdType = u32;

/// Type alias to extract the state color of a transition system.
pub type StateColor<Ts> = <Ts as TransitionSystem>::StateColor;
/// Type alias to extract the edge color of a transition system.
pub type EdgeColor<Ts> = <Ts as TransitionSystem>::EdgeColor;
/// Type alias to extract the symbol type of the alphabet of a transition system.
pub type SymbolOf<Ts> = <<Ts as TransitionSystem>::Alphabet as Alphabet>::Symbol;
/// Type alias to extract the state index type of a transition system.
pub type StateIndex<Ts> = <Ts as TransitionSystem>::StateIndex;

/// A transition system is a finite collection of states, connected with directed edges which
/// are labeled with symbols of an [`Alphabet`]. Every state carries a color of type
/// [`TransitionSystem::StateColor`] and every edge one of type
/// [`TransitionSystem::EdgeColor`]; the absence of meaningful colors is expressed by
/// using [`crate::Void`].
///
/// This trait only provides access to the state set, the edge relation is exposed through
/// [`Deterministic`] as this crate deals exclusively with deterministic transition
/// structures.
pub trait TransitionSystem {
    /// The type of the underlying alphabet.
    type Alphabet: Alphabet;
    /// The type of the indices of the states of the transition system.
    type StateIndex: IndexType;
    /// The type of the colors of the states of the transition system.
    type StateColor: Color;
    /// The type of the colors of the edges of the transition system.
    type EdgeColor: Color;
    /// The type of the iterator over the state indices.
    type StateIndices<'this>: Iterator<Item = Self::StateIndex>
    where
        Self: 'this;

    /// Returns a reference to the alphabet of `self`.
    fn alphabet(&self) -> &Self::Alphabet;

    /// Returns an iterator over the state indices of `self`.
    fn state_indices(&self) -> Self::StateIndices<'_>;

    /// Returns the color of the given state, if it exists.
    fn state_color(&self, state: Self::StateIndex) -> Option<Self::StateColor>;

    /// Returns the number of states of `self`.
    fn size(&self) -> usize {
        self.state_indices().count()
    }

    /// Returns true if and only if there exists a state with the given index.
    fn contains_state_index(&self, index: Self::StateIndex) -> bool {
        self.state_indices().contains(&index)
    }

    /// Consumes `self` and sets the given `initial` to be the designated initial state,
    /// giving an [`crate::automaton::Initialized`] transition system.
    fn with_initial(self, initial: Self::StateIndex) -> crate::automaton::Initialized<Self>
    where
        Self: Sized,
    {
        crate::automaton::Initialized::from_parts(self, initial)
    }
}

/// A transition system with a deterministic transition function: for every state and every
/// symbol there is at most one outgoing transition. A pair `(successor, edge color)` is
/// returned for defined transitions, while `None` marks an undefined transition, which is
/// how partial machines are represented.
pub trait Deterministic: TransitionSystem {
    /// Returns the target state and edge color of the transition that leaves `state` with
    /// `symbol`, or `None` if the transition is undefined.
    fn transition(
        &self,
        state: Self::StateIndex,
        symbol: SymbolOf<Self>,
    ) -> Option<(Self::StateIndex, Self::EdgeColor)>;

    /// Returns the successor of `state` under `symbol`, if the transition is defined.
    fn successor_index(
        &self,
        state: Self::StateIndex,
        symbol: SymbolOf<Self>,
    ) -> Option<Self::StateIndex> {
        self.transition(state, symbol).map(|(q, _)| q)
    }

    /// Returns the color of the transition that leaves `state` with `symbol`, if it is
    /// defined.
    fn edge_color(&self, state: Self::StateIndex, symbol: SymbolOf<Self>) -> Option<Self::EdgeColor> {
        self.transition(state, symbol).map(|(_, c)| c)
    }

    /// Runs the given finite word from the given state and returns the state that is
    /// reached after reading all of it. If an undefined transition is hit along the way,
    /// `None` is returned.
    fn reached_state_index_from<W: FiniteWord<SymbolOf<Self>>>(
        &self,
        from: Self::StateIndex,
        word: W,
    ) -> Option<Self::StateIndex> {
        word.symbols()
            .try_fold(from, |state, sym| self.successor_index(state, sym))
    }

    /// Returns true if the transition function of `self` is total, i.e. every state has a
    /// defined transition for every symbol of the alphabet.
    fn is_complete(&self) -> bool {
        for state in self.state_indices() {
            for sym in self.alphabet().universe() {
                if self.transition(state, sym).is_none() {
                    trace!(
                        "state {:?} has no transition for symbol {}",
                        state,
                        sym.show()
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Returns an iterator over the indices of all states that are reachable from the
    /// given state, in breadth-first order. The given state itself is yielded first.
    fn reachable_state_indices_from(&self, from: Self::StateIndex) -> ReachableStateIndices<&Self>
    where
        Self: Sized,
    {
        ReachableStateIndices::new(self, from)
    }

    /// Returns an iterator over the indices of all states reachable from the initial
    /// state, in breadth-first order.
    fn reachable_state_indices(&self) -> ReachableStateIndices<&Self>
    where
        Self: Sized + Pointed,
    {
        self.reachable_state_indices_from(self.initial())
    }
}

/// A pointed transition system has a designated initial state.
pub trait Pointed: TransitionSystem {
    /// Returns the index of the initial state.
    fn initial(&self) -> Self::StateIndex;
}

impl<Ts: TransitionSystem> TransitionSystem for &Ts {
    type Alphabet = Ts::Alphabet;
    type StateIndex = Ts::StateIndex;
    type StateColor = Ts::StateColor;
    type EdgeColor = Ts::EdgeColor;
    type StateIndices<'this>
        = Ts::StateIndices<'this>
    where
        Self: 'this;

    fn alphabet(&self) -> &Self::Alphabet {
        Ts::alphabet(self)
    }
    fn state_indices(&self) -> Self::StateIndices<'_> {
        Ts::state_indices(self)
    }
    fn state_color(&self, state: Self::StateIndex) -> Option<Self::StateColor> {
        Ts::state_color(self, state)
    }
    fn size(&self) -> usize {
        Ts::size(self)
    }
}

impl<D: Deterministic> Deterministic for &D {
    fn transition(
        &self,
        state: Self::StateIndex,
        symbol: SymbolOf<Self>,
    ) -> Option<(Self::StateIndex, Self::EdgeColor)> {
        D::transition(self, state, symbol)
    }
}

impl<P: Pointed> Pointed for &P {
    fn initial(&self) -> Self::StateIndex {
        P::initial(self)
    }
}
