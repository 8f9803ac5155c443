use std::time::Instant;

use log::debug;

use crate::Nwa;

impl Nwa {
    /// Stores the union of the two automata in `self`: the disjoint union of
    /// their states, symbols, transitions and initial and final states.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state or the operands share a state.
    pub fn union(&mut self, first: &Nwa, second: &Nwa) {
        assert!(
            !Nwa::overlap(first, second),
            "The operands of a union must not share states"
        );

        let start = Instant::now();
        self.prepare_result("union");
        self.copy_states(first, true, true);
        self.copy_states(second, true, true);
        self.copy_transitions(first);
        self.copy_transitions(second);

        debug!(
            "Union has {} states and {} transitions, took {:.3}s",
            self.size_states(),
            self.size_trans(),
            start.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use nwarust_utilities::KeyInterner;
    use test_log::test;

    use super::*;
    use crate::NestedWord;

    #[test]
    fn test_union() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let a = interner.key("a");
        let b = interner.key("b");

        let mut first = Nwa::new();
        first.add_initial_state(p);
        first.add_final_state(p);
        first.add_internal_trans(p, a, p);

        let mut second = Nwa::new();
        second.add_initial_state(q);
        second.add_final_state(q);
        second.add_internal_trans(q, b, q);

        let mut result = Nwa::with_stuck_state(interner.key("stuck"));
        result.union(&first, &second);

        assert_eq!(result.size_states(), 3);
        assert_eq!(result.size_initial_states(), 2);
        assert_eq!(result.size_internal_trans(), 2);

        let mut word = NestedWord::new();
        word.append_internal(a);
        word.append_internal(a);
        assert_eq!(result.is_member_nondet(&word), Ok(true));

        word.append_internal(b);
        assert_eq!(result.is_member_nondet(&word), Ok(false));
    }

    #[test]
    #[should_panic]
    fn test_union_of_overlapping_automata() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");

        let mut first = Nwa::new();
        first.add_state(p);

        let mut result = Nwa::with_stuck_state(interner.key("stuck"));
        result.union(&first, &first.clone());
    }
}
