use std::collections::BTreeSet;

use log::debug;

use nwarust_utilities::Key;

use crate::Nwa;

impl Nwa {
    /// Stores in `self` the restriction of the operand to the given states,
    /// keeping only the transitions between them.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn project_states(&mut self, operand: &Nwa, states: &BTreeSet<Key>) {
        self.prepare_result("project");
        self.copy_states(operand, true, true);
        self.copy_transitions(operand);

        let removed: Vec<Key> = self.states().filter(|state| !states.contains(state)).collect();
        for state in removed {
            self.remove_state(state);
        }

        debug!(
            "Projection keeps {} of {} states",
            self.size_states(),
            operand.size_states()
        );
    }
}

#[cfg(test)]
mod tests {
    use nwarust_utilities::KeyInterner;
    use test_log::test;

    use super::*;

    #[test]
    fn test_project_states() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let p = interner.key("p");
        let q = interner.key("q");
        let r = interner.key("r");
        let a = interner.key("a");

        let mut operand = Nwa::new();
        operand.add_initial_state(p);
        operand.add_final_state(r);
        operand.add_internal_trans(p, a, q);
        operand.add_internal_trans(q, a, r);
        operand.add_call_trans(p, a, r);

        let mut result = Nwa::with_stuck_state(stuck);
        result.project_states(&operand, &BTreeSet::from([p, r]));

        // The stuck state is never removed.
        assert_eq!(result.size_states(), 3);
        assert!(!result.is_state(q));
        assert!(result.is_final_state(r));
        assert_eq!(result.size_internal_trans(), 0);
        assert_eq!(result.size_call_trans(), 1);
        assert_eq!(result.size_symbols(), 1);
    }
}
