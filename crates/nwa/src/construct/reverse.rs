use std::time::Instant;

use log::debug;
use log::trace;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;

use crate::Nwa;

impl Nwa {
    /// Stores the reverse of the operand in `self`: it accepts exactly the
    /// reversed words, in which calls and returns swap roles.
    ///
    /// Internal transitions are reversed and initial and final states swap.
    /// A return x --[r/c]-> t becomes an epsilon transition from t to the
    /// state (t, c), named by the interner, and the call (t, c) --[r]-> x.
    /// Every call c --[a]-> e then yields the return e --[a/(t, c)]-> c, so
    /// the pushed state remembers the call site that the return expects.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn reverse(&mut self, operand: &Nwa, interner: &mut KeyInterner) {
        let start = Instant::now();
        self.prepare_result("reverse");
        self.copy_states(operand, false, false);

        let ordinary = |state: &Key| !operand.is_stuck_state(*state);
        self.add_all_initial_states(operand.final_states().filter(ordinary));
        self.add_all_final_states(operand.initial_states().filter(ordinary));

        for internal in operand.internal_trans() {
            if ordinary(&internal.source) && ordinary(&internal.target) {
                self.add_internal_trans(internal.target, internal.symbol, internal.source);
            }
        }

        for ret in operand.return_trans() {
            if ![ret.exit, ret.call_site, ret.return_site].iter().all(ordinary) {
                continue;
            }

            let pushed = interner.pair_key(ret.return_site, ret.call_site);
            trace!("Reversing {ret:?} through {pushed:?}");
            self.add_internal_trans(ret.return_site, EPSILON, pushed);
            self.add_call_trans(pushed, ret.symbol, ret.exit);

            for call in operand.transitions().calls_from(ret.call_site) {
                if ordinary(&call.entry) {
                    self.add_return_trans(call.entry, pushed, call.symbol, call.call_site);
                }
            }
        }

        debug!(
            "Reverse has {} states and {} transitions, took {:.3}s",
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
    fn test_reverse_internal() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let a = interner.key("a");
        let b = interner.key("b");

        let mut operand = Nwa::new();
        operand.add_initial_state(p);
        operand.add_final_state(q);
        operand.add_internal_trans(p, a, p);
        operand.add_internal_trans(p, b, q);

        let mut result = Nwa::with_stuck_state(interner.key("stuck"));
        result.reverse(&operand, &mut interner);

        assert!(result.is_initial_state(q));
        assert!(result.is_final_state(p));

        let mut word = NestedWord::new();
        word.append_internal(b);
        word.append_internal(a);
        word.append_internal(a);
        assert_eq!(result.is_member_nondet(&word), Ok(true));
        assert_eq!(operand.is_member_nondet(&word), Ok(false));
        assert_eq!(operand.is_member_nondet(&word.reversed()), Ok(true));
    }
}
