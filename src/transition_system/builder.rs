use crate::{math::Set, prelude::*};

/// Helper struct for the construction of transition systems. It stores a list of edges, a
/// list of state colors and a default color, the actual transition system is only put
/// together once one of the `into_` methods is called. The alphabet is inferred from the
/// symbols appearing on the edges, additional symbols can be forced in through
/// [`TSBuilder::with_alphabet_symbols`].
///
/// # Example
///
/// We want to create a DFA with two states 0 and 1 over the alphabet `['a', 'b']`, where
/// state 0 is initial and accepting and the word `b` leads to the rejecting state 1.
/// ```
/// use quotient::prelude::*;
///
/// let dfa = TSBuilder::without_edge_colors()
///     .with_state_colors([true, false]) // colors given in the order of the states
///     .with_edges([(0, 'a', 0), (0, 'b', 1), (1, 'a', 1), (1, 'b', 0)])
///     .into_dfa(0); // 0 is the initial state
/// assert!(dfa.accepts("aa"));
/// ```
pub struct TSBuilder<Q = Void, C = Void> {
    symbols: Set<char>,
    edges: Vec<(DefaultIdType, char, C, DefaultIdType)>,
    default: Option<Q>,
    colors: Vec<(DefaultIdType, Q)>,
}

impl<C> TSBuilder<Void, C> {
    /// Creates an empty instance of `Self`, where states are uncolored (have color [`Void`]).
    pub fn without_state_colors() -> Self {
        TSBuilder {
            symbols: Set::default(),
            edges: vec![],
            default: Some(Void),
            colors: vec![],
        }
    }
}

impl<Q> TSBuilder<Q, Void> {
    /// Creates an empty instance of `Self`, where edges are uncolored (have color [`Void`]).
    pub fn without_edge_colors() -> Self {
        TSBuilder {
            symbols: Set::default(),
            edges: vec![],
            default: None,
            colors: vec![],
        }
    }
}

impl TSBuilder<Void, Void> {
    /// Creates an empty instance of `Self`, where neither states nor edges have a color.
    pub fn without_colors() -> Self {
        Self {
            symbols: Set::default(),
            edges: vec![],
            default: Some(Void),
            colors: vec![],
        }
    }
}

impl<Q, C> Default for TSBuilder<Q, C> {
    fn default() -> Self {
        Self {
            symbols: Set::default(),
            edges: vec![],
            default: None,
            colors: vec![],
        }
    }
}

impl<Q: Color, C: Color> TSBuilder<Q, C> {
    /// Sets the default color for states that have no color specified.
    pub fn default_color(mut self, color: Q) -> Self {
        self.default = Some(color);
        self
    }

    /// By default, the only alphabet symbols in the transition system that is built are
    /// the ones that appear on at least one edge. This method can be used to force
    /// additional alphabet symbols to appear.
    pub fn with_alphabet_symbols<I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = char>,
    {
        self.symbols.extend(symbols);
        self
    }

    /// Adds a list of colors to `self`. The colors are assigned to the states in the
    /// order in which they are given, so the first color goes to state 0, the second to
    /// state 1 and so on.
    pub fn with_state_colors<I: IntoIterator<Item = Q>>(self, iter: I) -> Self {
        iter.into_iter()
            .enumerate()
            .fold(self, |acc, (i, x)| acc.color(i as DefaultIdType, x))
    }

    /// Assigns the given `color` to the state with the given index `idx`.
    pub fn color(mut self, idx: DefaultIdType, color: Q) -> Self {
        assert!(self.colors.iter().all(|(q, _c)| q != &idx));
        self.colors.push((idx, color));
        self
    }

    /// Adds a list of transitions to `self`, given as tuples of the form
    /// `(source, symbol, edge color, target)`. They are added in the order in which they
    /// are given, a transition that overlaps an earlier one replaces it.
    pub fn with_transitions<T>(mut self, iter: T) -> Self
    where
        T: IntoIterator<Item = (DefaultIdType, char, C, DefaultIdType)>,
    {
        self.edges.extend(iter);
        self
    }

    /// Builds an instance of [`DTS`] from `self`. States are created contiguously up to
    /// the highest index mentioned on an edge or in a color assignment.
    ///
    /// Panics if a state has no color and no default was set.
    pub fn into_dts(self) -> DTS<CharAlphabet, Q, C> {
        let alphabet = CharAlphabet::from_iter(
            self.edges
                .iter()
                .map(|(_, sym, _, _)| *sym)
                .chain(self.symbols),
        );

        let num_states = self
            .edges
            .iter()
            .flat_map(|(q, _, _, p)| [*q, *p])
            .chain(self.colors.iter().map(|(q, _)| *q))
            .max()
            .map(|max| max as usize + 1)
            .unwrap_or(0);
        let mut ts = DTS::for_alphabet_size_hint(alphabet, num_states);

        for i in 0..num_states {
            let i = i as DefaultIdType;
            let color = self
                .colors
                .iter()
                .find_map(|(q, c)| if *q == i { Some(c.clone()) } else { None })
                .or_else(|| self.default.clone())
                .unwrap_or_else(|| {
                    panic!("a default is needed as state {i} has no color")
                });
            ts.add_state(color);
        }

        for (q, sym, c, p) in self.edges {
            ts.add_edge(q, sym, c, p);
        }
        ts
    }

    /// Builds an instance of [`DTS`] from `self` and sets the given `initial` state as
    /// the designated initial state of the output object.
    pub fn into_dts_with_initial(
        self,
        initial: DefaultIdType,
    ) -> Initialized<DTS<CharAlphabet, Q, C>> {
        self.into_dts().with_initial(initial)
    }
}

impl<Q: Color> TSBuilder<Q, Void> {
    /// Adds a list of edges to `self`, given as tuples `(source, symbol, target)`. In
    /// comparison to [`TSBuilder::with_transitions`] the [`Void`] edge color is filled in
    /// automatically.
    pub fn with_edges<I>(mut self, iter: I) -> Self
    where
        I: IntoIterator<Item = (DefaultIdType, char, DefaultIdType)>,
    {
        self.edges
            .extend(iter.into_iter().map(|(q, sym, p)| (q, sym, Void, p)));
        self
    }

    /// Builds a [`MooreMachine`] from `self` with the given initial state.
    pub fn into_moore(self, initial: DefaultIdType) -> MooreMachine<CharAlphabet, Q> {
        self.into_dts().with_initial(initial)
    }
}

impl TSBuilder<bool, Void> {
    /// Turns `self` into a [`DFA`] with the given initial state.
    pub fn into_dfa(self, initial: DefaultIdType) -> DFA<CharAlphabet> {
        self.into_dts().with_initial(initial)
    }
}

impl<C: Color> TSBuilder<Void, C> {
    /// Builds a [`MealyMachine`] from `self` with the given initial state.
    pub fn into_mealy(self, initial: DefaultIdType) -> MealyMachine<CharAlphabet, C> {
        self.default_color(Void).into_dts().with_initial(initial)
    }
}
