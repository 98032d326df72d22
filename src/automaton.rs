use std::fmt::Debug;

use crate::prelude::*;

/// Couples a deterministic transition system with a designated initial state. This is the
/// common shape of all automata in this crate, the different machine kinds are obtained by
/// reading the colors in a specific way, see [`DFA`], [`MooreMachine`] and
/// [`MealyMachine`].
///
/// All transition system traits are forwarded to the wrapped transition system, in
/// addition `Initialized` is [`Pointed`].
#[derive(Clone, PartialEq, Eq)]
pub struct Initialized<D: TransitionSystem> {
    ts: D,
    initial: D::StateIndex,
}

impl<D: TransitionSystem> Initialized<D> {
    /// Creates a new instance from the given transition system and initial state. Panics
    /// if the state does not exist.
    pub fn from_parts(ts: D, initial: D::StateIndex) -> Self {
        assert!(
            ts.contains_state_index(initial),
            "initial state {initial:?} does not exist"
        );
        Self { ts, initial }
    }

    /// Decomposes `self` into the underlying transition system and the initial state.
    pub fn into_parts(self) -> (D, D::StateIndex) {
        (self.ts, self.initial)
    }

    /// Returns a reference to the underlying transition system.
    pub fn ts(&self) -> &D {
        &self.ts
    }

    /// Gives a mutable reference to the underlying transition system.
    pub fn ts_mut(&mut self) -> &mut D {
        &mut self.ts
    }
}

impl<D: TransitionSystem + Debug> Debug for Initialized<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "initial state {:?} of", self.initial)?;
        self.ts.fmt(f)
    }
}

impl<D: TransitionSystem> TransitionSystem for Initialized<D> {
    type Alphabet = D::Alphabet;
    type StateIndex = D::StateIndex;
    type StateColor = D::StateColor;
    type EdgeColor = D::EdgeColor;
    type StateIndices<'this>
        = D::StateIndices<'this>
    where
        Self: 'this;

    fn alphabet(&self) -> &Self::Alphabet {
        self.ts.alphabet()
    }
    fn state_indices(&self) -> Self::StateIndices<'_> {
        self.ts.state_indices()
    }
    fn state_color(&self, state: Self::StateIndex) -> Option<Self::StateColor> {
        self.ts.state_color(state)
    }
    fn size(&self) -> usize {
        self.ts.size()
    }
    fn contains_state_index(&self, index: Self::StateIndex) -> bool {
        self.ts.contains_state_index(index)
    }
}

impl<D: Deterministic> Deterministic for Initialized<D> {
    fn transition(
        &self,
        state: Self::StateIndex,
        symbol: SymbolOf<Self>,
    ) -> Option<(Self::StateIndex, Self::EdgeColor)> {
        self.ts.transition(state, symbol)
    }
}

impl<D: TransitionSystem> Pointed for Initialized<D> {
    fn initial(&self) -> Self::StateIndex {
        self.initial
    }
}

impl<D: Sproutable> Sproutable for Initialized<D> {
    fn add_state(&mut self, color: StateColor<Self>) -> Self::StateIndex {
        self.ts.add_state(color)
    }

    fn add_edge(
        &mut self,
        source: Self::StateIndex,
        symbol: SymbolOf<Self>,
        color: EdgeColor<Self>,
        target: Self::StateIndex,
    ) -> Option<(Self::StateIndex, EdgeColor<Self>)> {
        self.ts.add_edge(source, symbol, color, target)
    }

    fn set_state_color(&mut self, index: Self::StateIndex, color: StateColor<Self>) {
        self.ts.set_state_color(index, color)
    }
}

/// A deterministic finite automaton over the alphabet `A`. States are colored with `bool`,
/// where `true` marks a state as accepting, edges carry no color. A word is accepted if
/// the run from the initial state ends in an accepting state, words whose run hits an
/// undefined transition are rejected.
pub type DFA<A = CharAlphabet> = Initialized<DTS<A, bool, Void>>;

/// A Moore machine over the alphabet `A`, which computes an output of type `Q` for every
/// input word, namely the color of the state reached on it. The output on the empty word
/// is the color of the initial state.
pub type MooreMachine<A = CharAlphabet, Q = usize> = Initialized<DTS<A, Q, Void>>;

/// A Mealy machine over the alphabet `A`. Outputs live on the edges, so running an input
/// word of length `n` through the machine emits a sequence of `n` colors of type `C`.
pub type MealyMachine<A = CharAlphabet, C = usize> = Initialized<DTS<A, Void, C>>;

impl<A: Alphabet> DFA<A> {
    /// Returns true if and only if `self` accepts the given word.
    pub fn accepts<W: FiniteWord<A::Symbol>>(&self, word: W) -> bool {
        self.reached_state_index_from(self.initial(), word)
            .and_then(|q| self.state_color(q))
            .unwrap_or(false)
    }
}

impl<A: Alphabet, Q: Color> MooreMachine<A, Q> {
    /// Runs the given word and returns the color of the state reached on it, or `None` if
    /// the run hits an undefined transition.
    pub fn output<W: FiniteWord<A::Symbol>>(&self, word: W) -> Option<Q> {
        self.reached_state_index_from(self.initial(), word)
            .and_then(|q| self.state_color(q))
    }
}

impl<A: Alphabet, C: Color> MealyMachine<A, C> {
    /// Runs the given input word and returns the full sequence of emitted edge colors, or
    /// `None` if the run hits an undefined transition before the input is exhausted.
    pub fn transduce<W: FiniteWord<A::Symbol>>(&self, input: W) -> Option<Vec<C>> {
        let mut state = self.initial();
        let mut out = Vec::with_capacity(input.len());
        for sym in input.symbols() {
            let (next, color) = self.transition(state, sym)?;
            out.push(color);
            state = next;
        }
        Some(out)
    }

    /// Attempts to run the given input word in `self`, returning the color of the last
    /// transition that is taken wrapped in `Some`. If no successful run on `input` is
    /// possible, or the input is empty, the function returns `None`.
    pub fn map<W: FiniteWord<A::Symbol>>(&self, input: W) -> Option<C> {
        self.transduce(input).and_then(|out| out.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn dfa_accepts() {
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 1), (0, 'b', 0), (1, 'a', 0), (1, 'b', 1)])
            .into_dfa(0);
        assert!(!dfa.accepts(""));
        assert!(dfa.accepts("a"));
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("aa"));
    }

    #[test]
    fn dfa_partial_rejects_undefined() {
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([true, true])
            .with_edges([(0, 'a', 1)])
            .with_alphabet_symbols(['a', 'b'])
            .into_dfa(0);
        assert!(dfa.accepts("a"));
        assert!(!dfa.accepts("b"));
    }

    #[test]
    fn moore_output() {
        let moore = TSBuilder::without_edge_colors()
            .with_state_colors([0usize, 1, 2])
            .with_edges([(0, 'a', 1), (1, 'a', 2), (2, 'a', 0)])
            .into_moore(0);
        assert_eq!(moore.output(""), Some(0));
        assert_eq!(moore.output("aa"), Some(2));
        assert_eq!(moore.output("aaaa"), Some(1));
        assert_eq!(moore.output("b"), None);
    }

    #[test]
    fn mealy_transduce() {
        let mealy = TSBuilder::without_state_colors()
            .with_transitions([(0, 'a', 'x', 1), (1, 'a', 'y', 0), (1, 'b', 'z', 1)])
            .into_mealy(0);
        assert_eq!(mealy.transduce(""), Some(vec![]));
        assert_eq!(mealy.transduce("aba"), Some(vec!['x', 'z', 'y']));
        assert_eq!(mealy.transduce("b"), None);
        assert_eq!(mealy.map("aa"), Some('y'));
        assert_eq!(mealy.map(""), None);
    }
}
