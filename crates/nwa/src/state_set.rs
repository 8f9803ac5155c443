use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use nwarust_utilities::Key;

use crate::ClientInfoRef;

/// Whether the automaton has a designated stuck state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StuckMode {
    /// No stuck state, missing transitions simply do not exist.
    #[default]
    Absent,

    /// Missing transitions implicitly lead to the given stuck state.
    Designated(Key),

    /// The implicit transitions have been materialized, the former stuck state
    /// is an ordinary state.
    Realized,
}

/// The states of an automaton together with the initial, final and stuck designations.
#[derive(Clone, Debug, Default)]
pub struct StateSet {
    states: BTreeSet<Key>,
    initial_states: BTreeSet<Key>,
    final_states: BTreeSet<Key>,
    client_info: FxHashMap<Key, ClientInfoRef>,
    stuck: StuckMode,
}

impl StateSet {
    /// Creates a state set in which the given state is the stuck state.
    pub fn with_stuck_state(stuck: Key) -> StateSet {
        let mut result = StateSet::default();
        result.set_stuck_state(stuck);
        result
    }

    /// Returns true iff the state is in the set.
    pub fn is_state(&self, state: Key) -> bool {
        self.states.contains(&state)
    }

    /// Adds the given state, returns false if it was already present.
    pub fn add_state(&mut self, state: Key) -> bool {
        self.states.insert(state)
    }

    /// Removes the state together with its initial and final designations and
    /// client information. The stuck state can not be removed.
    pub fn remove_state(&mut self, state: Key) -> bool {
        if self.is_stuck_state(state) {
            return false;
        }

        self.initial_states.remove(&state);
        self.final_states.remove(&state);
        self.client_info.remove(&state);
        self.states.remove(&state)
    }

    /// Removes all states except for the stuck state.
    pub fn clear_states(&mut self) {
        self.states.clear();
        self.initial_states.clear();
        self.final_states.clear();
        self.client_info.clear();

        if let StuckMode::Designated(stuck) = self.stuck {
            self.states.insert(stuck);
        }
    }

    pub fn states(&self) -> impl Iterator<Item = Key> + '_ {
        self.states.iter().copied()
    }

    pub fn size_states(&self) -> usize {
        self.states.len()
    }

    pub fn is_initial_state(&self, state: Key) -> bool {
        self.initial_states.contains(&state)
    }

    /// Marks the state as initial, adding it as a state when necessary.
    pub fn add_initial_state(&mut self, state: Key) -> bool {
        self.states.insert(state);
        self.initial_states.insert(state)
    }

    pub fn remove_initial_state(&mut self, state: Key) -> bool {
        self.initial_states.remove(&state)
    }

    pub fn clear_initial_states(&mut self) {
        self.initial_states.clear();
    }

    pub fn initial_states(&self) -> impl Iterator<Item = Key> + '_ {
        self.initial_states.iter().copied()
    }

    pub fn size_initial_states(&self) -> usize {
        self.initial_states.len()
    }

    pub fn is_final_state(&self, state: Key) -> bool {
        self.final_states.contains(&state)
    }

    /// Marks the state as final, adding it as a state when necessary.
    pub fn add_final_state(&mut self, state: Key) -> bool {
        self.states.insert(state);
        self.final_states.insert(state)
    }

    pub fn remove_final_state(&mut self, state: Key) -> bool {
        self.final_states.remove(&state)
    }

    pub fn clear_final_states(&mut self) {
        self.final_states.clear();
    }

    pub fn final_states(&self) -> impl Iterator<Item = Key> + '_ {
        self.final_states.iter().copied()
    }

    pub fn size_final_states(&self) -> usize {
        self.final_states.len()
    }

    /// Returns the stuck mode of this set.
    pub fn stuck_mode(&self) -> StuckMode {
        self.stuck
    }

    /// Returns the stuck state, if one is designated.
    pub fn stuck_state(&self) -> Option<Key> {
        match self.stuck {
            StuckMode::Designated(stuck) => Some(stuck),
            _ => None,
        }
    }

    pub fn is_stuck_state(&self, state: Key) -> bool {
        self.stuck == StuckMode::Designated(state)
    }

    /// Designates the given state as the stuck state and adds it to the set.
    ///
    /// # Panics
    ///
    /// When a stuck state is already designated, the set was realized, or the
    /// state is already an ordinary state.
    pub fn set_stuck_state(&mut self, state: Key) {
        assert!(
            self.stuck == StuckMode::Absent,
            "A stuck state can only be set once, current mode is {:?}",
            self.stuck
        );
        assert!(
            !self.states.contains(&state),
            "The stuck state {state:?} is already an ordinary state"
        );

        self.states.insert(state);
        self.stuck = StuckMode::Designated(state);
    }

    /// Turns the stuck state into an ordinary state.
    pub(crate) fn realize(&mut self) {
        assert!(
            matches!(self.stuck, StuckMode::Designated(_)),
            "Only a designated stuck state can be realized, current mode is {:?}",
            self.stuck
        );
        self.stuck = StuckMode::Realized;
    }

    pub fn client_info(&self, state: Key) -> Option<&ClientInfoRef> {
        self.client_info.get(&state)
    }

    /// Attaches the client information to a state, returns false if the state does not exist.
    pub fn set_client_info(&mut self, state: Key, info: ClientInfoRef) -> bool {
        if !self.states.contains(&state) {
            return false;
        }

        self.client_info.insert(state, info);
        true
    }
}

/// Client information is not compared, payloads are opaque.
impl PartialEq for StateSet {
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
            && self.initial_states == other.initial_states
            && self.final_states == other.final_states
            && self.stuck == other.stuck
    }
}

impl Eq for StateSet {}
