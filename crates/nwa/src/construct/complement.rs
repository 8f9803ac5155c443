use log::debug;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;

use crate::ClientInfoHooks;
use crate::DefaultHooks;
use crate::Nwa;

impl Nwa {
    /// Stores the complement of the operand in `self`, with respect to the
    /// well-matched nested words over the alphabet of the operand.
    ///
    /// The operand is determinized and completed first. Afterwards `self` has
    /// no stuck state, the former stuck state is an ordinary final state.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn complement(&mut self, operand: &Nwa, interner: &mut KeyInterner) {
        self.complement_with(operand, interner, &mut DefaultHooks);
    }

    /// As [Nwa::complement], merging client information with the given hooks.
    pub fn complement_with<H: ClientInfoHooks>(&mut self, operand: &Nwa, interner: &mut KeyInterner, hooks: &mut H) {
        self.determinize_with(operand, interner, hooks);
        self.realize_implicit_trans();

        let finals: Vec<Key> = self.states().filter(|state| !self.is_final_state(*state)).collect();
        self.clear_final_states();
        self.add_all_final_states(finals);

        debug!(
            "Complement has {} states of which {} are final",
            self.size_states(),
            self.size_final_states()
        );
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::NestedWord;

    #[test]
    fn test_complement() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let a = interner.key("a");
        let c = interner.key("c");

        // Accepts <c c> a*.
        let mut operand = Nwa::new();
        operand.add_initial_state(p);
        operand.add_final_state(q);
        operand.add_call_trans(p, c, p);
        operand.add_return_trans(p, p, c, q);
        operand.add_internal_trans(q, a, q);

        let mut result = Nwa::with_stuck_state(interner.key("stuck"));
        result.complement(&operand, &mut interner);
        assert!(result.is_deterministic());

        let mut word = NestedWord::new();
        assert_eq!(result.simulate_word(&word), Ok(true));

        word.append_call(c);
        word.append_return(c);
        assert_eq!(result.simulate_word(&word), Ok(false));

        word.append_internal(a);
        assert_eq!(result.simulate_word(&word), Ok(false));

        word.append_call(c);
        word.append_return(c);
        assert_eq!(result.simulate_word(&word), Ok(true));
    }
}
