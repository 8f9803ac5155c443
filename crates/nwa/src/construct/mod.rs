//! The closure constructions of nested word automata.
//!
//! Every construction writes its result into `self`, which must have a
//! designated stuck state. Any previous content of `self` other than the
//! stuck state is discarded. Transitions of an operand that lead to its own
//! stuck state are not copied, they remain implicit in the result.

mod complement;
mod concat;
mod determinize;
mod intersect;
mod project;
mod reverse;
mod star;
mod union;

use nwarust_utilities::Key;

use crate::Call;
use crate::Internal;
use crate::Nwa;
use crate::Return;
use crate::StuckMode;

impl Nwa {
    /// Clears everything except the stuck state and returns it.
    ///
    /// # Panics
    ///
    /// When no stuck state is designated.
    fn prepare_result(&mut self, operation: &str) -> Key {
        let stuck = match self.stuck_mode() {
            StuckMode::Designated(stuck) => stuck,
            mode => panic!("The result of {operation} requires a stuck state, current mode is {mode:?}"),
        };

        self.clear();
        stuck
    }

    /// Copies the states, client information and symbols of the operand,
    /// except its stuck state. The initial and final designations are copied
    /// when requested.
    fn copy_states(&mut self, operand: &Nwa, initial: bool, finals: bool) {
        if let Some(stuck) = self.stuck_state() {
            debug_assert!(
                !operand.is_state(stuck) || operand.is_stuck_state(stuck),
                "The stuck state {stuck:?} of the result is an ordinary state of the operand"
            );
        }

        for state in operand.states().filter(|state| !operand.is_stuck_state(*state)) {
            self.add_state(state);
            if let Some(info) = operand.client_info(state) {
                self.set_client_info(state, info.clone());
            }
        }

        if initial {
            self.add_all_initial_states(operand.initial_states().filter(|state| !operand.is_stuck_state(*state)));
        }

        if finals {
            self.add_all_final_states(operand.final_states().filter(|state| !operand.is_stuck_state(*state)));
        }

        self.add_all_symbols(operand.symbols());
    }

    /// Copies the transitions of the operand that do not involve its stuck state.
    fn copy_transitions(&mut self, operand: &Nwa) {
        for Internal { source, symbol, target } in operand.internal_trans() {
            if !operand.is_stuck_state(source) && !operand.is_stuck_state(target) {
                self.add_internal_trans(source, symbol, target);
            }
        }

        for Call {
            call_site,
            symbol,
            entry,
        } in operand.call_trans()
        {
            if !operand.is_stuck_state(call_site) && !operand.is_stuck_state(entry) {
                self.add_call_trans(call_site, symbol, entry);
            }
        }

        for Return {
            exit,
            call_site,
            symbol,
            return_site,
        } in operand.return_trans()
        {
            if [exit, call_site, return_site]
                .iter()
                .all(|state| !operand.is_stuck_state(*state))
            {
                self.add_return_trans(exit, call_site, symbol, return_site);
            }
        }
    }
}
