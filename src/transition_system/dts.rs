use crate::prelude::*;

/// A deterministic transition system backed by a dense table. Every state owns one row
/// with a slot per alphabet symbol, addressed through the dense index the symbol has in
/// the [`Alphabet`]. A slot holds the target state and the edge color of the transition,
/// or `None` if the transition is undefined, so partial machines are represented without
/// any extra bookkeeping.
///
/// This is the canonical implementation of [`Deterministic`] in this crate and the type
/// in which minimization results are materialized.
#[derive(Clone, PartialEq, Eq)]
pub struct DTS<A: Alphabet, Q = crate::Void, C = crate::Void> {
    pub(crate) alphabet: A,
    pub(crate) states: Vec<DTSState<Q, C>>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub(crate) struct DTSState<Q, C> {
    pub(crate) color: Q,
    pub(crate) edges: Vec<Option<(DefaultIdType, C)>>,
}

impl<A: Alphabet, Q: Color, C: Color> DTS<A, Q, C> {
    /// Creates an empty transition system over the given alphabet.
    pub fn new(alphabet: A) -> Self {
        Self {
            alphabet,
            states: Vec::new(),
        }
    }

    /// Creates an empty transition system, preallocating space for the given number of
    /// states.
    pub fn with_capacity(alphabet: A, states: usize) -> Self {
        Self {
            alphabet,
            states: Vec::with_capacity(states),
        }
    }

    /// Gives a [`TSBuilder`] which can be used to conveniently put together a transition
    /// system from lists of state colors and edges.
    pub fn builder() -> TSBuilder<Q, C> {
        TSBuilder::default()
    }

    /// Returns an iterator over all defined transitions of `self` as tuples of the form
    /// `(source, symbol, edge color, target)`.
    pub fn transitions(
        &self,
    ) -> impl Iterator<Item = (DefaultIdType, A::Symbol, C, DefaultIdType)> + '_ {
        self.states.iter().enumerate().flat_map(move |(q, state)| {
            state
                .edges
                .iter()
                .enumerate()
                .filter_map(move |(position, slot)| {
                    let (target, color) = slot.as_ref()?;
                    Some((
                        q as DefaultIdType,
                        self.alphabet.symbol_from_index(position),
                        color.clone(),
                        *target,
                    ))
                })
        })
    }
}

impl<A: Alphabet, Q: Color, C: Color> std::fmt::Debug for DTS<A, Q, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DTS over {:?} with {} states", self.alphabet, self.size())?;
        for (q, state) in self.states.iter().enumerate() {
            write!(f, "{q} [{:?}]", state.color)?;
            for (position, slot) in state.edges.iter().enumerate() {
                if let Some((target, color)) = slot {
                    write!(
                        f,
                        " {}/{:?}->{}",
                        self.alphabet.symbol_from_index(position).show(),
                        color,
                        target
                    )?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<A: Alphabet, Q: Color, C: Color> TransitionSystem for DTS<A, Q, C> {
    type Alphabet = A;
    type StateIndex = DefaultIdType;
    type StateColor = Q;
    type EdgeColor = C;
    type StateIndices<'this>
        = std::ops::Range<DefaultIdType>
    where
        Self: 'this;

    fn alphabet(&self) -> &Self::Alphabet {
        &self.alphabet
    }

    fn state_indices(&self) -> Self::StateIndices<'_> {
        0..(self.states.len() as DefaultIdType)
    }

    fn state_color(&self, state: Self::StateIndex) -> Option<Self::StateColor> {
        self.states.get(state as usize).map(|s| s.color.clone())
    }

    fn size(&self) -> usize {
        self.states.len()
    }

    fn contains_state_index(&self, index: Self::StateIndex) -> bool {
        (index as usize) < self.states.len()
    }
}

impl<A: Alphabet, Q: Color, C: Color> Deterministic for DTS<A, Q, C> {
    fn transition(
        &self,
        state: Self::StateIndex,
        symbol: SymbolOf<Self>,
    ) -> Option<(Self::StateIndex, Self::EdgeColor)> {
        let position = self.alphabet.symbol_to_index(symbol)?;
        self.states.get(state as usize)?.edges[position].clone()
    }
}

impl<A: Alphabet, Q: Color, C: Color> ForAlphabet<A> for DTS<A, Q, C> {
    fn for_alphabet(from: A) -> Self {
        Self::new(from)
    }

    fn for_alphabet_size_hint(from: A, size_hint: usize) -> Self {
        Self::with_capacity(from, size_hint)
    }
}

impl<A: Alphabet, Q: Color, C: Color> Sproutable for DTS<A, Q, C> {
    fn add_state(&mut self, color: StateColor<Self>) -> Self::StateIndex {
        let index = self.states.len();
        // the index type must be able to address one more state, which keeps room for
        // the sink that totalization may append
        assert!(
            index < DefaultIdType::MAX as usize,
            "state space exceeds the capacity of the index type"
        );
        self.states.push(DTSState {
            color,
            edges: vec![None; self.alphabet.size()],
        });
        index as DefaultIdType
    }

    fn add_edge(
        &mut self,
        source: Self::StateIndex,
        symbol: SymbolOf<Self>,
        color: EdgeColor<Self>,
        target: Self::StateIndex,
    ) -> Option<(Self::StateIndex, EdgeColor<Self>)> {
        assert!(
            self.contains_state_index(source) && self.contains_state_index(target),
            "cannot add edge between non-existent states {source:?} and {target:?}"
        );
        let position = self
            .alphabet
            .symbol_to_index(symbol)
            .expect("symbol does not belong to the alphabet");
        self.states[source as usize].edges[position].replace((target, color))
    }

    fn set_state_color(&mut self, index: Self::StateIndex, color: StateColor<Self>) {
        assert!(
            self.contains_state_index(index),
            "cannot set color of non-existent state {index:?}"
        );
        self.states[index as usize].color = color;
    }
}
