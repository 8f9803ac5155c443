use std::time::Instant;

use log::debug;

use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;

use crate::Nwa;

impl Nwa {
    /// Stores the Kleene star of the operand in `self`.
    ///
    /// A fresh state, obtained from the interner, is the only initial and
    /// final state. It has epsilon transitions to the initial states of the
    /// operand and every final state of the operand has an epsilon transition
    /// back to it.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn star(&mut self, operand: &Nwa, interner: &mut KeyInterner) {
        let start = Instant::now();
        self.prepare_result("star");
        self.copy_states(operand, false, false);
        self.copy_transitions(operand);

        let hub = interner.fresh_key("star-start");
        self.add_initial_state(hub);
        self.add_final_state(hub);

        for initial in operand.initial_states().filter(|state| !operand.is_stuck_state(*state)) {
            self.add_internal_trans(hub, EPSILON, initial);
        }

        for last in operand.final_states().filter(|state| !operand.is_stuck_state(*state)) {
            self.add_internal_trans(last, EPSILON, hub);
        }

        debug!(
            "Star has {} states and {} transitions, took {:.3}s",
            self.size_states(),
            self.size_trans(),
            start.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::NestedWord;

    #[test]
    fn test_star() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let c = interner.key("c");
        let r = interner.key("r");

        // Accepts <c r>.
        let mut operand = Nwa::new();
        operand.add_initial_state(p);
        operand.add_final_state(q);
        operand.add_call_trans(p, c, p);
        operand.add_return_trans(p, p, r, q);

        let mut result = Nwa::with_stuck_state(interner.key("stuck"));
        result.star(&operand, &mut interner);

        let mut word = NestedWord::new();
        assert_eq!(result.is_member_nondet(&word), Ok(true));

        for _ in 0..3 {
            word.append_call(c);
            word.append_return(r);
            assert_eq!(result.is_member_nondet(&word), Ok(true));
        }

        word.append_call(c);
        assert_eq!(result.is_member_nondet(&word), Ok(false));
    }
}
