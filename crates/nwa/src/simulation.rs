use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::trace;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;

use crate::DefaultHooks;
use crate::NestedWord;
use crate::Nwa;
use crate::NwaError;
use crate::PositionKind;

/// A state together with the stack of call sites of the pending calls, the
/// most recent call on top.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Configuration {
    state: Key,
    calls: Vec<Key>,
}

impl Ord for Configuration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.state
            .cmp(&other.state)
            .then(self.calls.len().cmp(&other.calls.len()))
            .then_with(|| self.calls.cmp(&other.calls))
    }
}

impl PartialOrd for Configuration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Nwa {
    /// Returns true iff the nested word is accepted, determinizing the
    /// automaton first when it is not deterministic. The interner provides
    /// the keys of the determinized states.
    pub fn is_member(&self, word: &NestedWord, interner: &mut KeyInterner) -> Result<bool, NwaError> {
        if self.is_deterministic() {
            return self.simulate_word(word);
        }

        let mut deterministic = Nwa::with_stuck_state(interner.fresh_key("stuck"));
        deterministic.determinize_with(self, interner, &mut DefaultHooks);
        deterministic.simulate_word(word)
    }

    /// Follows the unique run of a deterministic automaton on the word from
    /// every initial state, and returns true iff one of them ends in a final
    /// state.
    ///
    /// For automata that are not deterministic only the first matching
    /// transition is followed. Words with pending calls or returns are
    /// rejected with [NwaError::UnbalancedWord].
    pub fn simulate_word(&self, word: &NestedWord) -> Result<bool, NwaError> {
        if let Some(position) = word.first_pending_return() {
            return Err(NwaError::UnbalancedWord { position });
        }

        if let Some(&position) = word.pending_calls().first() {
            return Err(NwaError::UnbalancedWord { position });
        }

        Ok(self.initial_states().any(|initial| self.simulate_from(initial, word)))
    }

    fn simulate_from(&self, initial: Key, word: &NestedWord) -> bool {
        let mut state = initial;
        let mut calls: Vec<Key> = Vec::new();

        for (index, position) in word.iter().enumerate() {
            if self.is_stuck_state(state) {
                return false;
            }

            let next = match position.kind {
                PositionKind::Internal => self.internal_targets(state, position.symbol).next(),
                PositionKind::Call => {
                    let entry = self.call_entries(state, position.symbol).next();
                    calls.push(state);
                    entry
                }
                PositionKind::Return => match calls.pop() {
                    Some(call_site) => self.return_targets(state, call_site, position.symbol).next(),
                    None => None,
                },
            };

            match next {
                Some(next) => state = next,
                None => {
                    trace!("Run from {initial:?} is stuck at position {index} in state {state:?}");
                    return false;
                }
            }
        }

        !self.is_stuck_state(state) && self.is_final_state(state)
    }

    /// Explores all runs of the automaton on the word simultaneously.
    ///
    /// Returns true iff some run ends in a final state with no pending calls.
    /// When the only runs that end in a final state have pending calls the
    /// word was not well-matched and [NwaError::PendingCallAccepted] is
    /// returned. A return without a pending call has no successor.
    pub fn is_member_nondet(&self, word: &NestedWord) -> Result<bool, NwaError> {
        let mut configurations: BTreeSet<Configuration> = self
            .initial_states()
            .map(|state| Configuration {
                state,
                calls: Vec::new(),
            })
            .collect();

        for position in word.iter() {
            let mut next = BTreeSet::new();

            for configuration in self.epsilon_close(&configurations) {
                match position.kind {
                    PositionKind::Internal => {
                        for target in self.internal_targets(configuration.state, position.symbol) {
                            next.insert(Configuration {
                                state: target,
                                calls: configuration.calls.clone(),
                            });
                        }
                    }
                    PositionKind::Call => {
                        for entry in self.call_entries(configuration.state, position.symbol) {
                            let mut calls = configuration.calls.clone();
                            calls.push(configuration.state);
                            next.insert(Configuration { state: entry, calls });
                        }
                    }
                    PositionKind::Return => {
                        if let Some((&call_site, rest)) = configuration.calls.split_last() {
                            for target in self.return_targets(configuration.state, call_site, position.symbol) {
                                next.insert(Configuration {
                                    state: target,
                                    calls: rest.to_vec(),
                                });
                            }
                        }
                    }
                }
            }

            trace!("{} configurations after {:?}", next.len(), position);
            configurations = next;
            if configurations.is_empty() {
                return Ok(false);
            }
        }

        let configurations = self.epsilon_close(&configurations);
        if configurations
            .iter()
            .any(|configuration| configuration.calls.is_empty() && self.is_final_state(configuration.state))
        {
            return Ok(true);
        }

        match configurations
            .iter()
            .find(|configuration| self.is_final_state(configuration.state))
        {
            Some(configuration) => Err(NwaError::PendingCallAccepted {
                pending: configuration.calls.len(),
            }),
            None => Ok(false),
        }
    }

    /// Extends every configuration with the states reachable by epsilon
    /// transitions, configurations in the stuck state are dropped.
    fn epsilon_close(&self, configurations: &BTreeSet<Configuration>) -> BTreeSet<Configuration> {
        let mut result = BTreeSet::new();
        for configuration in configurations {
            for state in self.epsilon_closure(configuration.state) {
                if !self.is_stuck_state(state) {
                    result.insert(Configuration {
                        state,
                        calls: configuration.calls.clone(),
                    });
                }
            }
        }

        result
    }
}
