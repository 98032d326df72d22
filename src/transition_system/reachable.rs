use crate::{math::Set, prelude::*};
use std::collections::VecDeque;

/// Allows iterating over the indices of all states that are reachable from a given origin
/// in a deterministic transition system. States are emitted in breadth-first order and the
/// successors of a state are explored in alphabet order, so the emitted sequence is fully
/// determined by the transition structure. The origin itself is emitted first.
#[derive(Debug, Clone)]
pub struct ReachableStateIndices<Ts: TransitionSystem> {
    ts: Ts,
    seen: Set<Ts::StateIndex>,
    queue: VecDeque<Ts::StateIndex>,
}

impl<Ts: TransitionSystem> ReachableStateIndices<Ts> {
    /// Creates a new iterator over the states reachable from `origin`.
    pub fn new(ts: Ts, origin: Ts::StateIndex) -> Self {
        let seen = Set::from_iter([origin]);
        let queue = [origin].into_iter().collect();
        Self { ts, seen, queue }
    }
}

impl<Ts: Deterministic> Iterator for ReachableStateIndices<Ts> {
    type Item = Ts::StateIndex;

    fn next(&mut self) -> Option<Self::Item> {
        let q = self.queue.pop_front()?;
        for sym in self.ts.alphabet().universe() {
            if let Some(p) = self.ts.successor_index(q, sym) {
                if self.seen.insert(p) {
                    self.queue.push_back(p);
                }
            }
        }
        Some(q)
    }
}
