use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::time::Instant;

use log::debug;

use nwarust_utilities::Key;

use crate::Nwa;

impl Nwa {
    /// Removes the states that are not reachable from any of the sources.
    pub fn prune_unreachable_forward(&mut self, sources: &BTreeSet<Key>) {
        let reachable = self.reachable(sources, |nwa, state| nwa.forward_neighbours(state));
        self.retain_states(&reachable);
    }

    /// Removes the states from which none of the targets is reachable.
    pub fn prune_unreachable_backward(&mut self, targets: &BTreeSet<Key>) {
        let reachable = self.reachable(targets, |nwa, state| nwa.backward_neighbours(state));
        self.retain_states(&reachable);
    }

    /// Removes the states that are not reachable from an initial state.
    pub fn prune_unreachable_initial(&mut self) {
        let initial: BTreeSet<Key> = self.initial_states().collect();
        self.prune_unreachable_forward(&initial);
    }

    /// Removes the states from which no final state can be reached.
    pub fn prune_unreachable_final(&mut self) {
        let finals: BTreeSet<Key> = self.final_states().collect();
        self.prune_unreachable_backward(&finals);
    }

    /// Removes the states that are not on a path from an initial state to a final state.
    pub fn chop(&mut self) {
        self.prune_unreachable_initial();
        self.prune_unreachable_final();
    }

    /// Computes the states reachable from the given states in the graph
    /// defined by the neighbours function.
    fn reachable<F>(&self, start: &BTreeSet<Key>, neighbours: F) -> BTreeSet<Key>
    where
        F: Fn(&Nwa, Key) -> Vec<Key>,
    {
        let mut visited: BTreeSet<Key> = start.iter().copied().filter(|state| self.is_state(*state)).collect();
        let mut queue: VecDeque<Key> = visited.iter().copied().collect();

        while let Some(state) = queue.pop_front() {
            for next in neighbours(self, state) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        visited
    }

    /// The successors of a state when nesting is ignored. A return transition
    /// is an edge from both its exit and its call site to the return site.
    fn forward_neighbours(&self, state: Key) -> Vec<Key> {
        let trans = self.transitions();
        trans
            .internals_from(state)
            .map(|t| t.target)
            .chain(trans.calls_from(state).map(|t| t.entry))
            .chain(trans.returns_from(state).map(|t| t.return_site))
            .chain(trans.returns_with_call_site(state).map(|t| t.return_site))
            .collect()
    }

    fn backward_neighbours(&self, state: Key) -> Vec<Key> {
        let trans = self.transitions();
        trans
            .internals_to(state)
            .map(|t| t.source)
            .chain(trans.calls_to(state).map(|t| t.call_site))
            .chain(trans.returns_to(state).flat_map(|t| [t.exit, t.call_site]))
            .collect()
    }

    /// Removes every state outside of the given set, except the stuck state.
    fn retain_states(&mut self, keep: &BTreeSet<Key>) {
        let start = Instant::now();
        let removed: Vec<Key> = self
            .states()
            .filter(|state| !keep.contains(state) && !self.is_stuck_state(*state))
            .collect();

        for state in &removed {
            self.remove_state(*state);
        }

        debug!(
            "Pruned {} states, {} remain, took {:.3}s",
            removed.len(),
            self.size_states(),
            start.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use nwarust_utilities::KeyInterner;
    use test_log::test;

    use super::*;

    /// init -a-> mid -a-> fin, with dead ends on both sides and a call.
    fn automaton(interner: &mut KeyInterner) -> Nwa {
        let stuck = interner.key("stuck");
        let init = interner.key("init");
        let mid = interner.key("mid");
        let fin = interner.key("fin");
        let orphan = interner.key("orphan");
        let dead = interner.key("dead");
        let entry = interner.key("entry");
        let a = interner.key("a");

        let mut nwa = Nwa::with_stuck_state(stuck);
        nwa.add_initial_state(init);
        nwa.add_final_state(fin);
        nwa.add_internal_trans(init, a, mid);
        nwa.add_internal_trans(mid, a, fin);
        nwa.add_internal_trans(orphan, a, mid);
        nwa.add_internal_trans(mid, a, dead);
        nwa.add_call_trans(init, a, entry);
        nwa.add_return_trans(entry, init, a, fin);
        nwa
    }

    #[test]
    fn test_prune_unreachable_initial() {
        let mut interner = KeyInterner::new();
        let mut nwa = automaton(&mut interner);

        nwa.prune_unreachable_initial();

        assert!(!nwa.is_state(interner.key("orphan")));
        assert!(nwa.is_state(interner.key("dead")));
        assert!(nwa.is_state(interner.key("entry")));
        assert!(nwa.is_state(interner.key("stuck")));
    }

    #[test]
    fn test_prune_unreachable_final() {
        let mut interner = KeyInterner::new();
        let mut nwa = automaton(&mut interner);

        nwa.prune_unreachable_final();

        assert!(nwa.is_state(interner.key("orphan")));
        assert!(!nwa.is_state(interner.key("dead")));
        assert!(nwa.is_state(interner.key("entry")));
    }

    #[test]
    fn test_chop() {
        let mut interner = KeyInterner::new();
        let mut nwa = automaton(&mut interner);

        nwa.chop();

        // init, mid, fin, entry and the stuck state.
        assert_eq!(nwa.size_states(), 5);
        assert_eq!(nwa.size_internal_trans(), 2);
        assert_eq!(nwa.size_call_trans(), 1);
        assert_eq!(nwa.size_return_trans(), 1);
    }
}
