pub(crate) mod partition_refinement;

use crate::prelude::*;
use thiserror::Error;

/// Controls how unreachable states are dealt with during minimization.
///
/// Refinement itself operates on the whole state set, whether reachable from the initial
/// state or not. Unreachable states can be cut away by restricting the input to its
/// reachable part before refinement runs, or by extracting only the reachable part of the
/// quotient afterwards, which is usually the cheaper option and the default. Both produce
/// the same machine. With [`PruningMode::DontPrune`] every class of the final partition
/// becomes a state, so the result is only guaranteed to be minimal if the input has no
/// unreachable states to begin with.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum PruningMode {
    /// Restrict the input to its reachable part before refining.
    PruneBefore,
    /// Refine the whole input, then extract only the reachable part of the quotient.
    #[default]
    PruneAfter,
    /// Keep one state for every class of the final partition.
    DontPrune,
}

/// The ways in which minimization can fail.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MinimizationError {
    /// The transition function of the input is not total. Returned by the strict entry
    /// points such as [`minimize_dfa`], the totalizing ones accept partial input.
    #[error("state {state} has no transition for symbol {symbol}")]
    Partial {
        /// The state in which the missing transition was encountered.
        state: String,
        /// The symbol for which no transition is defined.
        symbol: String,
    },
    /// The input is too large for the refinement data structure, which addresses states
    /// and transitions with `u32` indices.
    #[error("a machine with {0} states over {1} symbols exceeds the supported size")]
    StateLimitExceeded(usize, usize),
}

/// Computes the minimal [`DFA`] accepting the same language as `dfa`, using the default
/// [`PruningMode`].
///
/// The transition function of the input must be total, otherwise
/// [`MinimizationError::Partial`] is returned. Partial automata can be minimized with
/// [`minimize_partial_dfa`] instead.
///
/// # Example
/// ```
/// use quotient::prelude::*;
///
/// let dfa = TSBuilder::without_edge_colors()
///     .with_state_colors([true, true, false])
///     .with_edges([
///         (0, 'a', 1), (0, 'b', 2), (0, 'c', 0),
///         (1, 'a', 0), (1, 'b', 2), (1, 'c', 1),
///         (2, 'a', 2), (2, 'b', 2), (2, 'c', 2),
///     ])
///     .into_dfa(0);
///
/// let minimal = minimize_dfa(&dfa).unwrap();
/// assert_eq!(minimal.size(), 2);
/// assert!(minimal.accepts("aca"));
/// assert!(!minimal.accepts("ab"));
/// ```
pub fn minimize_dfa<A: Alphabet>(dfa: &DFA<A>) -> Result<DFA<A>, MinimizationError> {
    minimize_dfa_with(dfa, PruningMode::default())
}

/// Same as [`minimize_dfa`], with an explicit [`PruningMode`].
pub fn minimize_dfa_with<A: Alphabet>(
    dfa: &DFA<A>,
    pruning: PruningMode,
) -> Result<DFA<A>, MinimizationError> {
    partition_refinement::refine_complete(
        dfa,
        |q| dfa.state_color(q).expect("only existing states are classified"),
        pruning,
    )
}

/// Computes the minimal [`MooreMachine`] producing the same outputs as `moore`, using the
/// default [`PruningMode`]. Two states can be merged if they have the same color and no
/// input word takes them to states of differing color.
///
/// The transition function of the input must be total, otherwise
/// [`MinimizationError::Partial`] is returned.
///
/// # Example
/// ```
/// use quotient::prelude::*;
///
/// let moore = TSBuilder::default()
///     .with_state_colors([0usize, 1, 1])
///     .with_edges([(0, 'a', 1), (1, 'a', 2), (2, 'a', 2)])
///     .into_moore(0);
///
/// let minimal = minimize_moore(&moore).unwrap();
/// assert_eq!(minimal.size(), 2);
/// assert_eq!(minimal.output("aaa"), Some(1));
/// ```
pub fn minimize_moore<A: Alphabet, Q: Color>(
    moore: &MooreMachine<A, Q>,
) -> Result<MooreMachine<A, Q>, MinimizationError> {
    minimize_moore_with(moore, PruningMode::default())
}

/// Same as [`minimize_moore`], with an explicit [`PruningMode`].
pub fn minimize_moore_with<A: Alphabet, Q: Color>(
    moore: &MooreMachine<A, Q>,
    pruning: PruningMode,
) -> Result<MooreMachine<A, Q>, MinimizationError> {
    partition_refinement::refine_complete(
        moore,
        |q| moore.state_color(q).expect("only existing states are classified"),
        pruning,
    )
}

/// Computes the minimal [`MealyMachine`] producing the same output words as `mealy`,
/// using the default [`PruningMode`]. States are initially grouped by the tuple of edge
/// colors they emit, one entry per alphabet symbol.
///
/// The transition function of the input must be total, otherwise
/// [`MinimizationError::Partial`] is returned. Partial machines can be minimized with
/// [`minimize_partial_mealy`] instead.
pub fn minimize_mealy<A: Alphabet, C: Color>(
    mealy: &MealyMachine<A, C>,
) -> Result<MealyMachine<A, C>, MinimizationError> {
    minimize_mealy_with(mealy, PruningMode::default())
}

/// Same as [`minimize_mealy`], with an explicit [`PruningMode`].
pub fn minimize_mealy_with<A: Alphabet, C: Color>(
    mealy: &MealyMachine<A, C>,
    pruning: PruningMode,
) -> Result<MealyMachine<A, C>, MinimizationError> {
    partition_refinement::refine_complete(
        mealy,
        |q| partition_refinement::transition_signature(mealy, q),
        pruning,
    )
}

/// Computes the minimal [`DFA`] accepting the same language as the possibly partial
/// `dfa`, where words whose run is undefined at some point are rejected.
///
/// Internally the input is completed with a rejecting sink state that refinement treats
/// like any other state. The result is always restricted to its reachable part and may
/// itself be partial, transitions that only lead to certain rejection can be absent
/// from it.
///
/// # Example
/// ```
/// use quotient::prelude::*;
///
/// let dfa = TSBuilder::without_edge_colors()
///     .with_alphabet_symbols(['a', 'b'])
///     .with_state_colors([true, true])
///     .with_edges([(0, 'a', 1), (1, 'a', 0)])
///     .into_dfa(0);
///
/// let minimal = minimize_partial_dfa(&dfa).unwrap();
/// assert_eq!(minimal.size(), 1);
/// assert!(minimal.accepts("aa"));
/// assert!(!minimal.accepts("b"));
/// ```
pub fn minimize_partial_dfa<A: Alphabet>(dfa: &DFA<A>) -> Result<DFA<A>, MinimizationError> {
    partition_refinement::refine_partial(
        dfa,
        |q| dfa.state_color(q).expect("only existing states are classified"),
        false,
    )
}

/// Computes the minimal [`MealyMachine`] producing the same output words as the possibly
/// partial `mealy`. Output words are only defined for inputs whose run is defined, and
/// the minimal machine leaves exactly the same runs undefined.
///
/// Internally the input is completed with a sink state whose outgoing transitions carry
/// no output. The result is always restricted to its reachable part.
pub fn minimize_partial_mealy<A: Alphabet, C: Color>(
    mealy: &MealyMachine<A, C>,
) -> Result<MealyMachine<A, C>, MinimizationError> {
    let sink_signature = vec![None; mealy.alphabet().size()];
    partition_refinement::refine_partial(
        mealy,
        |q| partition_refinement::transition_signature(mealy, q),
        sink_signature,
    )
}

impl<A: Alphabet> DFA<A> {
    /// Computes the minimal [`DFA`] accepting the same language as `self`, see
    /// [`minimize_dfa`].
    ///
    /// # Example
    /// ```
    /// use quotient::prelude::*;
    ///
    /// let dfa = TSBuilder::without_edge_colors()
    ///     .with_state_colors([false, false])
    ///     .with_edges([(0, 'a', 1), (1, 'a', 0)])
    ///     .into_dfa(0);
    /// assert_eq!(dfa.minimized().unwrap().size(), 1);
    /// ```
    pub fn minimized(&self) -> Result<DFA<A>, MinimizationError> {
        minimize_dfa(self)
    }
}

impl<A: Alphabet, C: Color> MealyMachine<A, C> {
    /// Computes the minimal [`MealyMachine`] producing the same output words as `self`,
    /// see [`minimize_mealy`].
    pub fn minimized(&self) -> Result<MealyMachine<A, C>, MinimizationError> {
        minimize_mealy(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::tests::wiki_dfa;

    /// Three states over `a`, `b` and `c` where 0 and 1 are equivalent, so the minimal
    /// version has two states.
    fn three_letter_dfa() -> DFA {
        TSBuilder::without_edge_colors()
            .with_state_colors([true, true, false])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 2),
                (0, 'c', 0),
                (1, 'a', 0),
                (1, 'b', 2),
                (1, 'c', 1),
                (2, 'a', 2),
                (2, 'b', 2),
                (2, 'c', 2),
            ])
            .into_dfa(0)
    }

    /// All words over `symbols` of length at most `max_len`, including the empty word.
    fn words_up_to(symbols: &[char], max_len: usize) -> Vec<String> {
        let mut words = vec![String::new()];
        let mut start = 0;
        for _ in 0..max_len {
            let end = words.len();
            for i in start..end {
                for &sym in symbols {
                    let mut next = words[i].clone();
                    next.push(sym);
                    words.push(next);
                }
            }
            start = end;
        }
        words
    }

    fn random_complete_dfa(num_states: u32) -> DFA {
        let alphabet = CharAlphabet::of_size(2);
        let mut ts = DTS::for_alphabet_size_hint(alphabet.clone(), num_states as usize);
        for _ in 0..num_states {
            ts.add_state(fastrand::bool());
        }
        for q in 0..num_states {
            for sym in alphabet.universe() {
                ts.add_edge(q, sym, Void, fastrand::u32(..num_states));
            }
        }
        ts.with_initial(0)
    }

    fn random_partial_dfa(num_states: u32) -> DFA {
        let alphabet = CharAlphabet::of_size(2);
        let mut ts = DTS::for_alphabet_size_hint(alphabet.clone(), num_states as usize);
        for _ in 0..num_states {
            ts.add_state(fastrand::bool());
        }
        for q in 0..num_states {
            for sym in alphabet.universe() {
                if fastrand::u32(..4) > 0 {
                    ts.add_edge(q, sym, Void, fastrand::u32(..num_states));
                }
            }
        }
        ts.with_initial(0)
    }

    #[test]
    fn minimizes_complete_dfa() {
        let dfa = three_letter_dfa();
        let minimal = minimize_dfa(&dfa).unwrap();

        assert_eq!(minimal.size(), 2);
        assert!(minimal.accepts("aca"));
        assert!(!minimal.accepts("ab"));
        assert_eq!(
            minimal.reached_state_index_from(minimal.initial(), "a"),
            Some(minimal.initial())
        );
        assert_eq!(
            minimal.reached_state_index_from(minimal.initial(), "acaaca"),
            Some(minimal.initial())
        );
    }

    #[test]
    fn merges_states_with_equal_futures() {
        // Both branches off the initial state behave identically from the second
        // symbol on and must fold into one class.
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([false, false, false, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 2),
                (1, 'a', 3),
                (1, 'b', 3),
                (2, 'a', 3),
                (2, 'b', 3),
                (3, 'a', 3),
                (3, 'b', 3),
            ])
            .into_dfa(0);
        let minimal = minimize_dfa(&dfa).unwrap();

        assert_eq!(minimal.size(), 3);
        let left = minimal.reached_state_index_from(minimal.initial(), "a");
        let right = minimal.reached_state_index_from(minimal.initial(), "b");
        assert_eq!(left, right);
        assert_ne!(left, Some(minimal.initial()));
        for word in words_up_to(&['a', 'b'], 4) {
            assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "{word:?}");
        }
    }

    #[test]
    fn pruning_modes_agree_on_connected_input() {
        let dfa = three_letter_dfa();
        for pruning in [
            PruningMode::PruneBefore,
            PruningMode::PruneAfter,
            PruningMode::DontPrune,
        ] {
            let minimal = minimize_dfa_with(&dfa, pruning).unwrap();
            assert_eq!(minimal.size(), 2, "{pruning:?}");
            for word in words_up_to(&['a', 'b', 'c'], 4) {
                assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "{pruning:?} {word:?}");
            }
        }
    }

    #[test]
    fn minimized_wiki_dfa_has_three_states() {
        let dfa = wiki_dfa();
        let minimal = minimize_dfa(&dfa).unwrap();

        assert_eq!(minimal.size(), 3);
        for word in words_up_to(&['a', 'b'], 6) {
            assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "{word:?}");
        }
    }

    #[test]
    fn minimization_is_idempotent() {
        let minimal = minimize_dfa(&wiki_dfa()).unwrap();
        let again = minimize_dfa(&minimal).unwrap();

        assert_eq!(minimal.size(), again.size());
        for word in words_up_to(&['a', 'b'], 5) {
            assert_eq!(minimal.accepts(&word), again.accepts(&word));
        }
    }

    #[test]
    fn pruning_controls_unreachable_states() {
        // the six state machine from `wiki_dfa` plus a disconnected accepting state
        // that is equivalent to no other
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([false, false, true, true, true, false, true])
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
                (6, 'a', 6),
                (6, 'b', 6),
            ])
            .into_dfa(0);

        let kept = minimize_dfa_with(&dfa, PruningMode::DontPrune).unwrap();
        assert_eq!(kept.size(), 4);

        let before = minimize_dfa_with(&dfa, PruningMode::PruneBefore).unwrap();
        assert_eq!(before.size(), 3);

        // pruning after refinement walks the class graph exactly once, which suffices
        // since the partition is stable by then and classes reachable from the class of
        // the initial state only lead to reachable classes
        let after = minimize_dfa_with(&dfa, PruningMode::PruneAfter).unwrap();
        assert_eq!(after.size(), 3);

        for word in words_up_to(&['a', 'b'], 6) {
            assert_eq!(dfa.accepts(&word), kept.accepts(&word));
            assert_eq!(dfa.accepts(&word), before.accepts(&word));
            assert_eq!(dfa.accepts(&word), after.accepts(&word));
        }
    }

    #[test]
    fn strict_entry_points_reject_partial_input() {
        let dfa = TSBuilder::without_edge_colors()
            .with_alphabet_symbols(['a', 'b'])
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 1), (1, 'a', 0)])
            .into_dfa(0);

        let err = minimize_dfa(&dfa).unwrap_err();
        assert_eq!(
            err,
            MinimizationError::Partial {
                state: "0".to_string(),
                symbol: "b".to_string()
            }
        );
        assert!(minimize_dfa_with(&dfa, PruningMode::PruneBefore).is_err());
    }

    #[test]
    fn partial_dfa_collapses_to_single_live_state() {
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([true, true, true])
            .with_edges([(0, 'a', 0), (0, 'c', 1), (1, 'a', 1), (1, 'c', 0), (2, 'b', 2)])
            .into_dfa(0);

        let minimal = minimize_partial_dfa(&dfa).unwrap();
        assert_eq!(minimal.size(), 1);
        assert!(minimal.accepts("aca"));
        assert!(!minimal.accepts("ab"));
        assert_eq!(minimal.successor_index(minimal.initial(), 'a'), Some(minimal.initial()));
        assert_eq!(minimal.successor_index(minimal.initial(), 'b'), None);
    }

    #[test]
    fn totalizing_a_complete_dfa_changes_nothing() {
        let dfa = wiki_dfa();
        let minimal = minimize_partial_dfa(&dfa).unwrap();

        assert_eq!(minimal.size(), 3);
        assert!(minimal.is_complete());
        for word in words_up_to(&['a', 'b'], 6) {
            assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "{word:?}");
        }
    }

    #[test]
    fn mealy_states_merge_by_output_signature() {
        let mm = TSBuilder::without_state_colors()
            .with_transitions([
                (0, 'a', 'x', 1),
                (0, 'b', 'y', 2),
                (0, 'c', 'x', 0),
                (1, 'a', 'x', 0),
                (1, 'b', 'y', 2),
                (1, 'c', 'x', 1),
                (2, 'a', 'x', 2),
                (2, 'b', 'x', 2),
                (2, 'c', 'x', 2),
            ])
            .into_mealy(0);

        let minimal = minimize_mealy(&mm).unwrap();
        assert_eq!(minimal.size(), 2);
        assert_eq!(minimal.transduce("aca"), Some(vec!['x', 'x', 'x']));
        assert_eq!(minimal.transduce("ab"), Some(vec!['x', 'y']));

        let unpruned = minimize_mealy_with(&mm, PruningMode::DontPrune).unwrap();
        assert_eq!(unpruned.size(), 2);
    }

    #[test]
    fn partial_mealy_keeps_undefined_transitions() {
        let mm = TSBuilder::without_state_colors()
            .with_transitions([
                (0, 'a', 'x', 0),
                (0, 'c', 'x', 1),
                (1, 'a', 'x', 1),
                (1, 'c', 'x', 0),
                (2, 'b', 'x', 2),
            ])
            .into_mealy(0);

        let minimal = minimize_partial_mealy(&mm).unwrap();
        assert_eq!(minimal.size(), 1);
        assert_eq!(minimal.transduce("aca"), Some(vec!['x', 'x', 'x']));
        assert_eq!(minimal.transduce("b"), None);
        assert_eq!(minimal.transduce("ab"), None);
    }

    #[test]
    fn moore_states_merge_by_state_output() {
        let moore = TSBuilder::default()
            .with_state_colors([0usize, 1, 2, 1])
            .with_edges([(0, 'a', 1), (1, 'a', 2), (2, 'a', 3), (3, 'a', 2)])
            .into_moore(0);

        let minimal = minimize_moore(&moore).unwrap();
        assert_eq!(minimal.size(), 3);
        for n in 0..8 {
            let word: String = std::iter::repeat('a').take(n).collect();
            assert_eq!(moore.output(&word), minimal.output(&word), "{word:?}");
        }

        let unpruned = minimize_moore_with(&moore, PruningMode::DontPrune).unwrap();
        assert_eq!(unpruned.size(), 3);
    }

    #[test_log::test]
    fn randomized_dfas_keep_their_language() {
        for seed in 0..20 {
            fastrand::seed(seed);
            let dfa = random_complete_dfa(1 + fastrand::u32(..40));

            let minimal = minimize_dfa(&dfa).unwrap();
            assert!(minimal.size() <= dfa.size());
            for word in words_up_to(&['a', 'b'], 6) {
                assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "seed {seed} {word:?}");
            }

            let again = minimize_dfa(&minimal).unwrap();
            assert_eq!(minimal.size(), again.size(), "seed {seed}");
        }
    }

    #[test]
    fn randomized_pruning_modes_agree() {
        for seed in 100..110 {
            fastrand::seed(seed);
            let dfa = random_complete_dfa(1 + fastrand::u32(..25));

            let before = minimize_dfa_with(&dfa, PruningMode::PruneBefore).unwrap();
            let after = minimize_dfa_with(&dfa, PruningMode::PruneAfter).unwrap();
            let kept = minimize_dfa_with(&dfa, PruningMode::DontPrune).unwrap();

            assert_eq!(before.size(), after.size(), "seed {seed}");
            assert!(after.size() <= kept.size(), "seed {seed}");
            for word in words_up_to(&['a', 'b'], 5) {
                assert_eq!(before.accepts(&word), after.accepts(&word), "seed {seed}");
                assert_eq!(before.accepts(&word), kept.accepts(&word), "seed {seed}");
            }
        }
    }

    #[test]
    fn randomized_partial_dfas_keep_their_language() {
        for seed in 200..215 {
            fastrand::seed(seed);
            let dfa = random_partial_dfa(1 + fastrand::u32(..30));

            let minimal = minimize_partial_dfa(&dfa).unwrap();
            assert!(minimal.size() <= dfa.size() + 1, "seed {seed}");
            for word in words_up_to(&['a', 'b'], 6) {
                assert_eq!(dfa.accepts(&word), minimal.accepts(&word), "seed {seed} {word:?}");
            }

            let again = minimize_partial_dfa(&minimal).unwrap();
            assert_eq!(minimal.size(), again.size(), "seed {seed}");
        }
    }
}
