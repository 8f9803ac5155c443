use std::time::Instant;

use log::debug;

use nwarust_utilities::EPSILON;

use crate::Nwa;

impl Nwa {
    /// Stores the concatenation of the two automata in `self`. Every final
    /// state of `first` gets an epsilon transition to every initial state of
    /// `second`.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state or the operands share a state.
    pub fn concat(&mut self, first: &Nwa, second: &Nwa) {
        assert!(
            !Nwa::overlap(first, second),
            "The operands of a concatenation must not share states"
        );

        let start = Instant::now();
        self.prepare_result("concat");
        self.copy_states(first, true, false);
        self.copy_states(second, false, true);
        self.copy_transitions(first);
        self.copy_transitions(second);

        for source in first.final_states().filter(|state| !first.is_stuck_state(*state)) {
            for target in second.initial_states().filter(|state| !second.is_stuck_state(*state)) {
                self.add_internal_trans(source, EPSILON, target);
            }
        }

        debug!(
            "Concatenation has {} states and {} transitions, took {:.3}s",
            self.size_states(),
            self.size_trans(),
            start.elapsed().as_secs_f64()
        );
    }
}
