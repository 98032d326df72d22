use bit_set::BitSet;
use itertools::Itertools;

use crate::prelude::*;

/// Implemented by [`TransitionSystem`]s (TS) that can be created for a given [`Alphabet`],
/// which may be used in conjunction with [`Sproutable`] to successively grow a TS.
pub trait ForAlphabet<A: Alphabet>: Sized {
    /// Creates an instance of `Self` for the given [`Alphabet`]. The resulting TS should
    /// be empty.
    fn for_alphabet(from: A) -> Self;

    /// Creates an instance of `Self` for the given [`Alphabet`] and a hint for the number
    /// of states, allowing for preallocation of memory. The resulting TS should be empty.
    fn for_alphabet_size_hint(from: A, _size_hint: usize) -> Self {
        Self::for_alphabet(from)
    }
}

/// Trait for transition systems that allow insertion of states and transitions.
pub trait Sproutable: TransitionSystem {
    /// Adds a new state with the given color. The method returns the index of the newly
    /// created state.
    fn add_state(&mut self, color: StateColor<Self>) -> Self::StateIndex;

    /// Adds an edge from `source` to `target`, labeled with `symbol` and colored with
    /// `color`. If an edge for `symbol` already left `source`, it is replaced and its
    /// target and color are returned.
    ///
    /// Panics if one of the states does not exist or the symbol does not belong to the
    /// alphabet.
    fn add_edge(
        &mut self,
        source: Self::StateIndex,
        symbol: SymbolOf<Self>,
        color: EdgeColor<Self>,
        target: Self::StateIndex,
    ) -> Option<(Self::StateIndex, EdgeColor<Self>)>;

    /// Sets the color of the state with the given index. Panics if the state does not
    /// exist.
    fn set_state_color(&mut self, index: Self::StateIndex, color: StateColor<Self>);

    /// Adds new states with colors given by an iterator. For each provided color, a new
    /// state is created. Returns an iterator over the indices of the newly created states.
    fn extend_states<I: IntoIterator<Item = StateColor<Self>>>(
        &mut self,
        iter: I,
    ) -> impl Iterator<Item = Self::StateIndex> {
        iter.into_iter().map(move |color| self.add_state(color))
    }

    /// Turns `self` into a complete transition system by adding a sink state and
    /// redirecting all missing transitions to it. The sink is colored with `sink_color`,
    /// each newly introduced edge with `edge_color`. If `self` is already complete, it is
    /// left unchanged.
    fn complete_with_colors(&mut self, sink_color: Self::StateColor, edge_color: Self::EdgeColor)
    where
        Self: Deterministic + Sized,
    {
        if self.is_complete() {
            return;
        }

        let symbols = self.alphabet().universe().collect_vec();
        let sink = self.add_state(sink_color);
        for sym in &symbols {
            self.add_edge(sink, *sym, edge_color.clone(), sink);
        }

        let mut missing = BitSet::with_capacity(symbols.len());
        for state in self.state_indices().collect_vec() {
            missing.clear();
            for (position, sym) in symbols.iter().enumerate() {
                if self.transition(state, *sym).is_none() {
                    missing.insert(position);
                }
            }
            for position in missing.iter() {
                self.add_edge(state, symbols[position], edge_color.clone(), sink);
            }
        }
    }
}
