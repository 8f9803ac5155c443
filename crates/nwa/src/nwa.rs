use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use log::debug;
use log::trace;

use nwarust_utilities::Key;
use nwarust_utilities::EPSILON;
use nwarust_utilities::WILD;

use crate::Call;
use crate::ClientInfoRef;
use crate::Internal;
use crate::Return;
use crate::StateSet;
use crate::StuckMode;
use crate::SymbolSet;
use crate::TransitionSet;

/// A nested word automaton: a finite automaton with internal transitions and
/// matched call and return transitions.
///
/// When a stuck state is designated every (state, symbol) pair without an
/// explicit outgoing transition of some kind implicitly leads to the stuck
/// state. These implicit transitions are never stored, see
/// [Nwa::realize_implicit_trans] to materialize them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Nwa {
    pub(crate) states: StateSet,
    pub(crate) symbols: SymbolSet,
    pub(crate) trans: TransitionSet,
}

impl Nwa {
    /// Creates an empty automaton without a stuck state.
    pub fn new() -> Nwa {
        Nwa::default()
    }

    /// Creates an empty automaton with the given stuck state.
    pub fn with_stuck_state(stuck: Key) -> Nwa {
        Nwa {
            states: StateSet::with_stuck_state(stuck),
            ..Default::default()
        }
    }

    /// Removes all states, symbols and transitions. The stuck state is kept.
    pub fn clear(&mut self) {
        self.trans.clear();
        self.symbols.clear_symbols();
        self.states.clear_states();
    }

    // Stuck state

    pub fn stuck_mode(&self) -> StuckMode {
        self.states.stuck_mode()
    }

    pub fn has_stuck_state(&self) -> bool {
        self.states.stuck_state().is_some()
    }

    pub fn stuck_state(&self) -> Option<Key> {
        self.states.stuck_state()
    }

    pub fn is_stuck_state(&self, state: Key) -> bool {
        self.states.is_stuck_state(state)
    }

    /// Designates the stuck state.
    ///
    /// # Panics
    ///
    /// When a stuck state was set before or the state is an ordinary state.
    pub fn set_stuck_state(&mut self, state: Key) {
        self.states.set_stuck_state(state);
    }

    // States

    pub fn is_state(&self, state: Key) -> bool {
        self.states.is_state(state)
    }

    /// Adds the state, returns false if it was already present.
    pub fn add_state(&mut self, state: Key) -> bool {
        self.states.add_state(state)
    }

    pub fn add_all_states(&mut self, states: impl IntoIterator<Item = Key>) {
        for state in states {
            self.states.add_state(state);
        }
    }

    /// Removes the state and every transition in which it occurs. Returns
    /// false if the state is absent or the stuck state.
    pub fn remove_state(&mut self, state: Key) -> bool {
        if !self.is_state(state) || self.is_stuck_state(state) {
            return false;
        }

        self.trans.remove_transitions_with_state(state);
        self.states.remove_state(state)
    }

    /// Removes all states and therefore all transitions. The stuck state is
    /// removed as well, a new one must be set before constructing into this
    /// automaton.
    pub fn clear_states(&mut self) {
        self.trans.clear();
        self.states = StateSet::default();
    }

    pub fn states(&self) -> impl Iterator<Item = Key> + '_ {
        self.states.states()
    }

    pub fn size_states(&self) -> usize {
        self.states.size_states()
    }

    pub fn is_initial_state(&self, state: Key) -> bool {
        self.states.is_initial_state(state)
    }

    pub fn add_initial_state(&mut self, state: Key) -> bool {
        self.states.add_initial_state(state)
    }

    pub fn add_all_initial_states(&mut self, states: impl IntoIterator<Item = Key>) {
        for state in states {
            self.states.add_initial_state(state);
        }
    }

    pub fn remove_initial_state(&mut self, state: Key) -> bool {
        self.states.remove_initial_state(state)
    }

    pub fn clear_initial_states(&mut self) {
        self.states.clear_initial_states();
    }

    pub fn initial_states(&self) -> impl Iterator<Item = Key> + '_ {
        self.states.initial_states()
    }

    pub fn size_initial_states(&self) -> usize {
        self.states.size_initial_states()
    }

    pub fn is_final_state(&self, state: Key) -> bool {
        self.states.is_final_state(state)
    }

    /// Marks the state as final. When it is the stuck state the implicit
    /// transitions are realized first, since words that end in it are then
    /// accepted.
    pub fn add_final_state(&mut self, state: Key) -> bool {
        if self.is_stuck_state(state) {
            self.realize_implicit_trans();
        }

        self.states.add_final_state(state)
    }

    pub fn add_all_final_states(&mut self, states: impl IntoIterator<Item = Key>) {
        for state in states {
            self.add_final_state(state);
        }
    }

    pub fn remove_final_state(&mut self, state: Key) -> bool {
        self.states.remove_final_state(state)
    }

    pub fn clear_final_states(&mut self) {
        self.states.clear_final_states();
    }

    pub fn final_states(&self) -> impl Iterator<Item = Key> + '_ {
        self.states.final_states()
    }

    pub fn size_final_states(&self) -> usize {
        self.states.size_final_states()
    }

    pub fn client_info(&self, state: Key) -> Option<&ClientInfoRef> {
        self.states.client_info(state)
    }

    /// Attaches client information to the state, returns false if the state does not exist.
    pub fn set_client_info(&mut self, state: Key, info: ClientInfoRef) -> bool {
        self.states.set_client_info(state, info)
    }

    // Symbols

    pub fn is_symbol(&self, symbol: Key) -> bool {
        self.symbols.is_symbol(symbol)
    }

    /// Adds the symbol to the alphabet, epsilon and wild are always rejected.
    pub fn add_symbol(&mut self, symbol: Key) -> bool {
        self.symbols.add_symbol(symbol)
    }

    pub fn add_all_symbols(&mut self, symbols: impl IntoIterator<Item = Key>) {
        for symbol in symbols {
            self.symbols.add_symbol(symbol);
        }
    }

    /// Removes the symbol and every transition labelled with it.
    pub fn remove_symbol(&mut self, symbol: Key) -> bool {
        if !self.symbols.remove_symbol(symbol) {
            return false;
        }

        self.trans.remove_transitions_with_symbol(symbol);
        true
    }

    /// Removes all symbols and the transitions labelled with them, only
    /// epsilon and wild transitions remain.
    pub fn clear_symbols(&mut self) {
        let symbols: Vec<Key> = self.symbols.symbols().collect();
        for symbol in symbols {
            self.remove_symbol(symbol);
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = Key> + '_ {
        self.symbols.symbols()
    }

    pub fn size_symbols(&self) -> usize {
        self.symbols.size_symbols()
    }

    // Transitions

    /// Adds the internal transition from --[symbol]-> to, adding the states
    /// and symbol when necessary.
    ///
    /// Returns false if the transition exists, or if it leaves the stuck state
    /// to another state.
    pub fn add_internal_trans(&mut self, from: Key, symbol: Key, to: Key) -> bool {
        let internal = Internal::new(from, symbol, to);
        if self.leaves_stuck_state(from, to) || self.trans.is_internal(&internal) {
            return false;
        }

        self.states.add_state(from);
        self.states.add_state(to);
        self.symbols.add_symbol(symbol);
        self.trans.add_internal(internal)
    }

    /// Adds the call transition call_site --[symbol]-> entry, epsilon calls are rejected.
    pub fn add_call_trans(&mut self, call_site: Key, symbol: Key, entry: Key) -> bool {
        let call = Call::new(call_site, symbol, entry);
        if symbol == EPSILON || self.leaves_stuck_state(call_site, entry) || self.trans.is_call(&call) {
            return false;
        }

        self.states.add_state(call_site);
        self.states.add_state(entry);
        self.symbols.add_symbol(symbol);
        self.trans.add_call(call)
    }

    /// Adds the return transition exit --[symbol/call_site]-> return_site,
    /// epsilon returns are rejected.
    pub fn add_return_trans(&mut self, exit: Key, call_site: Key, symbol: Key, return_site: Key) -> bool {
        let ret = Return::new(exit, call_site, symbol, return_site);
        if symbol == EPSILON || self.leaves_stuck_state(exit, return_site) || self.trans.is_return(&ret) {
            return false;
        }

        self.states.add_state(exit);
        self.states.add_state(call_site);
        self.states.add_state(return_site);
        self.symbols.add_symbol(symbol);
        self.trans.add_return(ret)
    }

    pub fn remove_internal_trans(&mut self, from: Key, symbol: Key, to: Key) -> bool {
        self.trans.remove_internal(&Internal::new(from, symbol, to))
    }

    pub fn remove_call_trans(&mut self, call_site: Key, symbol: Key, entry: Key) -> bool {
        self.trans.remove_call(&Call::new(call_site, symbol, entry))
    }

    pub fn remove_return_trans(&mut self, exit: Key, call_site: Key, symbol: Key, return_site: Key) -> bool {
        self.trans
            .remove_return(&Return::new(exit, call_site, symbol, return_site))
    }

    /// Removes the return transitions exit --[symbol/c]-> return_site for every call site c.
    pub fn remove_return_trans_any_pred(&mut self, exit: Key, symbol: Key, return_site: Key) -> bool {
        let matching: Vec<Return> = self
            .trans
            .returns_from_on(exit, symbol)
            .filter(|ret| ret.return_site == return_site)
            .collect();

        for ret in &matching {
            self.trans.remove_return(ret);
        }

        !matching.is_empty()
    }

    /// Removes all transitions.
    pub fn clear_trans(&mut self) {
        self.trans.clear();
    }

    pub fn internal_trans(&self) -> impl Iterator<Item = Internal> + '_ {
        self.trans.internals()
    }

    pub fn call_trans(&self) -> impl Iterator<Item = Call> + '_ {
        self.trans.calls()
    }

    pub fn return_trans(&self) -> impl Iterator<Item = Return> + '_ {
        self.trans.returns()
    }

    pub fn size_internal_trans(&self) -> usize {
        self.trans.size_internals()
    }

    pub fn size_call_trans(&self) -> usize {
        self.trans.size_calls()
    }

    pub fn size_return_trans(&self) -> usize {
        self.trans.size_returns()
    }

    pub fn size_trans(&self) -> usize {
        self.trans.size()
    }

    /// Gives access to the indexed transition relations.
    pub fn transitions(&self) -> &TransitionSet {
        &self.trans
    }

    /// Returns true iff some transition of any kind is labelled with symbol
    /// and leads from `from` to `to`.
    pub fn find_trans(&self, from: Key, symbol: Key, to: Key) -> bool {
        self.trans.find_trans(from, symbol, to)
    }

    /// Returns the label of some transition from `from` to `to`.
    pub fn symbol_between(&self, from: Key, to: Key) -> Option<Key> {
        self.trans
            .internals_from(from)
            .filter(|t| t.target == to)
            .map(|t| t.symbol)
            .chain(self.trans.calls_from(from).filter(|t| t.entry == to).map(|t| t.symbol))
            .chain(
                self.trans
                    .returns_from(from)
                    .filter(|t| t.return_site == to)
                    .map(|t| t.symbol),
            )
            .next()
    }

    /// Sources of the internal transitions into the state.
    pub fn predecessors(&self, state: Key) -> BTreeSet<Key> {
        self.trans.internals_to(state).map(|t| t.source).collect()
    }

    pub fn predecessors_on(&self, symbol: Key, state: Key) -> BTreeSet<Key> {
        self.trans.internals_to_on(symbol, state).map(|t| t.source).collect()
    }

    /// Targets of the internal transitions out of the state.
    pub fn successors(&self, state: Key) -> BTreeSet<Key> {
        self.trans.internals_from(state).map(|t| t.target).collect()
    }

    pub fn successors_on(&self, state: Key, symbol: Key) -> BTreeSet<Key> {
        self.trans.internals_from_on(state, symbol).map(|t| t.target).collect()
    }

    /// Call sites of the call transitions into the given entry.
    pub fn call_predecessors(&self, entry: Key) -> BTreeSet<Key> {
        self.trans.calls_to(entry).map(|t| t.call_site).collect()
    }

    pub fn call_predecessors_on(&self, symbol: Key, entry: Key) -> BTreeSet<Key> {
        self.trans.calls_to_on(symbol, entry).map(|t| t.call_site).collect()
    }

    /// Entries of the call transitions out of the given call site.
    pub fn call_successors(&self, call_site: Key) -> BTreeSet<Key> {
        self.trans.calls_from(call_site).map(|t| t.entry).collect()
    }

    pub fn call_successors_on(&self, call_site: Key, symbol: Key) -> BTreeSet<Key> {
        self.trans.calls_from_on(call_site, symbol).map(|t| t.entry).collect()
    }

    pub fn return_sites(&self, exit: Key, call_site: Key) -> BTreeSet<Key> {
        self.trans
            .returns_from(exit)
            .filter(|t| t.call_site == call_site)
            .map(|t| t.return_site)
            .collect()
    }

    pub fn return_sites_on(&self, exit: Key, call_site: Key, symbol: Key) -> BTreeSet<Key> {
        self.trans
            .returns_from_with(exit, call_site, symbol)
            .map(|t| t.return_site)
            .collect()
    }

    pub fn call_sites(&self, exit: Key, return_site: Key) -> BTreeSet<Key> {
        self.trans
            .returns_from(exit)
            .filter(|t| t.return_site == return_site)
            .map(|t| t.call_site)
            .collect()
    }

    pub fn call_sites_on(&self, exit: Key, symbol: Key, return_site: Key) -> BTreeSet<Key> {
        self.trans
            .returns_from_on(exit, symbol)
            .filter(|t| t.return_site == return_site)
            .map(|t| t.call_site)
            .collect()
    }

    pub fn exits(&self, call_site: Key, return_site: Key) -> BTreeSet<Key> {
        self.trans
            .returns_to(return_site)
            .filter(|t| t.call_site == call_site)
            .map(|t| t.exit)
            .collect()
    }

    pub fn exits_on(&self, call_site: Key, symbol: Key, return_site: Key) -> BTreeSet<Key> {
        self.trans
            .returns_to_on(symbol, return_site)
            .filter(|t| t.call_site == call_site)
            .map(|t| t.exit)
            .collect()
    }

    /// The targets reached from state by reading symbol with an internal
    /// transition, wild transitions match every symbol of the alphabet.
    pub fn internal_targets(&self, state: Key, symbol: Key) -> impl Iterator<Item = Key> + '_ {
        self.trans
            .internals_from(state)
            .filter(move |t| self.label_matches(t.symbol, symbol))
            .map(|t| t.target)
    }

    /// The entries reached from the call site by reading symbol.
    pub fn call_entries(&self, call_site: Key, symbol: Key) -> impl Iterator<Item = Key> + '_ {
        self.trans
            .calls_from(call_site)
            .filter(move |t| self.label_matches(t.symbol, symbol))
            .map(|t| t.entry)
    }

    /// The return sites reached from exit by reading symbol when call_site is on top of the stack.
    pub fn return_targets(&self, exit: Key, call_site: Key, symbol: Key) -> impl Iterator<Item = Key> + '_ {
        self.trans
            .returns_from(exit)
            .filter(move |t| t.call_site == call_site && self.label_matches(t.symbol, symbol))
            .map(|t| t.return_site)
    }

    /// Returns the states reachable from the given state using only epsilon
    /// transitions, including the state itself.
    pub fn epsilon_closure(&self, state: Key) -> BTreeSet<Key> {
        let mut closure = BTreeSet::from([state]);
        let mut stack = vec![state];

        while let Some(current) = stack.pop() {
            for internal in self.trans.internals_from_on(current, EPSILON) {
                if closure.insert(internal.target) {
                    stack.push(internal.target);
                }
            }
        }

        closure
    }

    // Structural operations

    /// Adds `duplicate` as a state that has a copy of every outgoing
    /// transition of `original`. This includes the return transitions in
    /// which `original` is the call site.
    pub fn duplicate_state_outgoing(&mut self, original: Key, duplicate: Key) {
        self.states.add_state(duplicate);
        if let Some(info) = self.client_info(original).cloned() {
            self.set_client_info(duplicate, info);
        }

        let internals: Vec<Internal> = self.trans.internals_from(original).collect();
        for t in internals {
            self.trans.add_internal(Internal::new(duplicate, t.symbol, t.target));
        }

        let calls: Vec<Call> = self.trans.calls_from(original).collect();
        for t in calls {
            self.trans.add_call(Call::new(duplicate, t.symbol, t.entry));
        }

        let returns: Vec<Return> = self
            .trans
            .returns_from(original)
            .chain(self.trans.returns_with_call_site(original))
            .collect();
        for t in returns {
            for exit in substitutes(t.exit, original, duplicate) {
                for call_site in substitutes(t.call_site, original, duplicate) {
                    self.trans
                        .add_return(Return::new(exit, call_site, t.symbol, t.return_site));
                }
            }
        }
    }

    /// Adds `duplicate` as a state that behaves exactly like `original`: it
    /// gets copies of all incoming and outgoing transitions and the same
    /// initial and final designations.
    pub fn duplicate_state(&mut self, original: Key, duplicate: Key) {
        self.duplicate_state_outgoing(original, duplicate);

        if self.is_initial_state(original) {
            self.add_initial_state(duplicate);
        }
        if self.is_final_state(original) {
            self.add_final_state(duplicate);
        }

        let internals: Vec<Internal> = self.trans.internals_to(original).collect();
        for t in internals {
            for source in substitutes(t.source, original, duplicate) {
                self.trans.add_internal(Internal::new(source, t.symbol, duplicate));
            }
        }

        let calls: Vec<Call> = self.trans.calls_to(original).collect();
        for t in calls {
            for call_site in substitutes(t.call_site, original, duplicate) {
                self.trans.add_call(Call::new(call_site, t.symbol, duplicate));
            }
        }

        let returns: Vec<Return> = self.trans.returns_to(original).collect();
        for t in returns {
            for exit in substitutes(t.exit, original, duplicate) {
                for call_site in substitutes(t.call_site, original, duplicate) {
                    self.trans.add_return(Return::new(exit, call_site, t.symbol, duplicate));
                }
            }
        }
    }

    /// Materializes every implicit transition to the stuck state, after which
    /// the stuck state is an ordinary state.
    ///
    /// # Panics
    ///
    /// When no stuck state is designated.
    pub fn realize_implicit_trans(&mut self) {
        let stuck = match self.stuck_mode() {
            StuckMode::Designated(stuck) => stuck,
            mode => panic!("Implicit transitions can only be realized with a stuck state, current mode is {mode:?}"),
        };

        let start = std::time::Instant::now();
        let states: Vec<Key> = self.states().collect();
        let symbols: Vec<Key> = self.symbols().collect();
        let mut added = 0;

        for &state in &states {
            for &symbol in &symbols {
                if self.internal_targets(state, symbol).next().is_none() {
                    self.trans.add_internal(Internal::new(state, symbol, stuck));
                    added += 1;
                }

                if self.call_entries(state, symbol).next().is_none() {
                    self.trans.add_call(Call::new(state, symbol, stuck));
                    added += 1;
                }
            }
        }

        for (&exit, &call_site) in states.iter().cartesian_product(&states) {
            for &symbol in &symbols {
                if self.return_targets(exit, call_site, symbol).next().is_none() {
                    self.trans.add_return(Return::new(exit, call_site, symbol, stuck));
                    added += 1;
                }
            }
        }

        self.states.realize();
        debug!(
            "Realized {added} implicit transitions in {:.3}s",
            start.elapsed().as_secs_f64()
        );
    }

    /// Returns true iff the automaton has exactly one initial state, no
    /// epsilon transitions and at most one transition of each kind for every
    /// state, symbol and, for returns, call site.
    pub fn is_deterministic(&self) -> bool {
        if self.size_initial_states() != 1 {
            return false;
        }

        for state in self.states() {
            if !has_unique_labels(self.trans.internals_from(state).map(|t| t.symbol)) {
                trace!("State {state:?} has nondeterministic internal transitions");
                return false;
            }

            if !has_unique_labels(self.trans.calls_from(state).map(|t| t.symbol)) {
                trace!("State {state:?} has nondeterministic call transitions");
                return false;
            }

            let mut returns: BTreeMap<Key, Vec<Key>> = BTreeMap::new();
            for ret in self.trans.returns_from(state) {
                returns.entry(ret.call_site).or_default().push(ret.symbol);
            }

            if !returns.into_values().all(|symbols| has_unique_labels(symbols.into_iter())) {
                trace!("State {state:?} has nondeterministic return transitions");
                return false;
            }
        }

        true
    }

    /// Removes the states that can never leave themselves: states that are
    /// neither initial, final nor stuck and whose outgoing transitions are all
    /// self loops. Returns the number of removed states.
    pub fn remove_implicit_transitions(&mut self) -> usize {
        let sinks: Vec<Key> = self
            .states()
            .filter(|&state| {
                !self.is_initial_state(state)
                    && !self.is_final_state(state)
                    && !self.is_stuck_state(state)
                    && self.trans.internals_from(state).all(|t| t.target == state)
                    && self.trans.calls_from(state).all(|t| t.entry == state)
                    && self.trans.returns_from(state).all(|t| t.return_site == state)
            })
            .collect();

        for state in &sinks {
            trace!("Removing sink state {state:?}");
            self.remove_state(*state);
        }

        debug!("Removed {} sink states", sinks.len());
        sinks.len()
    }

    /// Returns true iff the automata share a state, other than a stuck state
    /// that is the stuck state of both.
    pub fn overlap(first: &Nwa, second: &Nwa) -> bool {
        first
            .states()
            .filter(|state| second.is_state(*state))
            .any(|state| !(first.is_stuck_state(state) && second.is_stuck_state(state)))
    }

    /// Returns true iff a transition from `from` to `to` would leave the stuck state.
    fn leaves_stuck_state(&self, from: Key, to: Key) -> bool {
        self.is_stuck_state(from) && !self.is_stuck_state(to)
    }

    /// Returns true iff a transition labelled with `label` can read `symbol`.
    fn label_matches(&self, label: Key, symbol: Key) -> bool {
        label == symbol || (label == WILD && self.is_symbol(symbol))
    }
}

/// Returns the given state, and the duplicate when the state is the original.
fn substitutes(state: Key, original: Key, duplicate: Key) -> Vec<Key> {
    if state == original {
        vec![original, duplicate]
    } else {
        vec![state]
    }
}

/// Returns true iff no label occurs twice and a wild label occurs alone.
fn has_unique_labels(labels: impl Iterator<Item = Key>) -> bool {
    let mut seen = BTreeSet::new();
    for label in labels {
        if label == EPSILON || !seen.insert(label) {
            return false;
        }
    }

    !(seen.contains(&WILD) && seen.len() > 1)
}

impl fmt::Display for Nwa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print some information about the NWA.
        writeln!(f, "Number of states: {}", self.size_states())?;
        writeln!(f, "Number of symbols: {}", self.size_symbols())?;
        writeln!(f, "Number of internal transitions: {}", self.size_internal_trans())?;
        writeln!(f, "Number of call transitions: {}", self.size_call_trans())?;
        write!(f, "Number of return transitions: {}", self.size_return_trans())
    }
}

impl fmt::Debug for Nwa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self)?;
        writeln!(f, "Stuck: {:?}", self.stuck_mode())?;
        writeln!(f, "Initial states: {:?}", self.initial_states().collect::<Vec<_>>())?;
        writeln!(f, "Final states: {:?}", self.final_states().collect::<Vec<_>>())?;
        write!(f, "{:?}", self.trans)
    }
}

#[cfg(test)]
mod tests {
    use nwarust_utilities::KeyInterner;
    use test_log::test;

    use super::*;

    #[test]
    fn test_adding_transitions_adds_states_and_symbols() {
        let mut interner = KeyInterner::new();
        let q = interner.key("q");
        let r = interner.key("r");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        assert!(nwa.add_internal_trans(q, EPSILON, q));
        assert!(nwa.add_internal_trans(q, WILD, r));
        assert!(nwa.add_call_trans(q, a, r));
        assert!(!nwa.add_call_trans(q, EPSILON, r));
        assert!(!nwa.add_return_trans(r, q, EPSILON, q));

        assert_eq!(nwa.size_internal_trans(), 2);
        assert_eq!(nwa.size_symbols(), 1);
        assert!(nwa.is_state(q));
        assert!(nwa.is_state(r));
    }

    #[test]
    fn test_stuck_state_transitions() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let q = interner.key("q");
        let a = interner.key("a");

        let mut nwa = Nwa::with_stuck_state(stuck);
        assert!(!nwa.add_internal_trans(stuck, a, q));
        assert!(!nwa.add_call_trans(stuck, a, q));
        assert!(!nwa.add_return_trans(stuck, q, a, q));
        assert!(nwa.add_internal_trans(stuck, a, stuck));
        assert!(nwa.add_internal_trans(q, a, stuck));
        assert!(!nwa.remove_state(stuck));
    }

    #[test]
    fn test_remove_state_removes_transitions() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let r = interner.key("r");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        nwa.add_initial_state(q);
        nwa.add_final_state(q);
        nwa.add_internal_trans(p, a, q);
        nwa.add_call_trans(q, a, r);
        nwa.add_return_trans(r, q, a, p);
        nwa.add_return_trans(p, p, a, r);

        assert!(nwa.remove_state(q));
        assert!(!nwa.is_initial_state(q));
        assert!(!nwa.is_final_state(q));
        assert_eq!(nwa.size_internal_trans(), 0);
        assert_eq!(nwa.size_call_trans(), 0);
        assert_eq!(nwa.size_return_trans(), 1);

        assert!(nwa.remove_state(p));
        assert!(nwa.remove_state(r));
        assert!(nwa.remove_symbol(a));
        assert_eq!(nwa, Nwa::new());
    }

    #[test]
    fn test_realize_implicit_trans() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let q = interner.key("q");
        let a = interner.key("a");
        let b = interner.key("b");

        let mut nwa = Nwa::with_stuck_state(stuck);
        nwa.add_initial_state(q);
        nwa.add_internal_trans(q, a, q);
        nwa.add_symbol(b);

        nwa.realize_implicit_trans();

        assert_eq!(nwa.stuck_mode(), StuckMode::Realized);
        assert!(!nwa.has_stuck_state());
        assert!(nwa.is_state(stuck));

        // Every (state, symbol) pair has exactly one transition of each kind.
        for state in [q, stuck] {
            for symbol in [a, b] {
                assert_eq!(nwa.internal_targets(state, symbol).count(), 1);
                assert_eq!(nwa.call_entries(state, symbol).count(), 1);
                for call_site in [q, stuck] {
                    assert_eq!(nwa.return_targets(state, call_site, symbol).count(), 1);
                }
            }
        }
        assert!(nwa.is_deterministic());
    }

    #[test]
    fn test_final_stuck_state_is_realized() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let p = interner.key("p");
        let a = interner.key("a");
        let b = interner.key("b");

        let mut nwa = Nwa::with_stuck_state(stuck);
        nwa.add_initial_state(p);
        nwa.add_internal_trans(p, a, p);
        nwa.add_symbol(b);

        assert!(nwa.add_final_state(stuck));
        assert_eq!(nwa.stuck_mode(), StuckMode::Realized);
        assert!(nwa.is_final_state(stuck));
        assert!(nwa.find_trans(p, b, stuck));

        // Reading b falls into the former stuck state, which now accepts.
        let mut word = crate::NestedWord::new();
        word.append_internal(b);
        assert_eq!(nwa.is_member_nondet(&word), Ok(true));
        assert_eq!(nwa.is_member(&word, &mut interner), Ok(true));

        word = crate::NestedWord::new();
        word.append_internal(a);
        assert_eq!(nwa.is_member_nondet(&word), Ok(false));
    }

    #[test]
    fn test_clear_states_removes_stuck_state() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let p = interner.key("p");
        let a = interner.key("a");

        let mut nwa = Nwa::with_stuck_state(stuck);
        nwa.add_initial_state(p);
        nwa.add_internal_trans(p, a, stuck);

        nwa.clear_states();
        assert_eq!(nwa.size_states(), 0);
        assert_eq!(nwa.size_trans(), 0);
        assert_eq!(nwa.stuck_mode(), StuckMode::Absent);
        assert!(nwa.is_symbol(a));

        nwa.set_stuck_state(interner.key("other"));
        assert!(nwa.has_stuck_state());
    }

    #[test]
    #[should_panic]
    fn test_realize_without_stuck_state() {
        let mut nwa = Nwa::new();
        nwa.realize_implicit_trans();
    }

    #[test]
    fn test_is_deterministic() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        nwa.add_initial_state(p);
        nwa.add_internal_trans(p, a, q);
        nwa.add_return_trans(q, p, a, p);
        nwa.add_return_trans(q, q, a, q);
        assert!(nwa.is_deterministic());

        nwa.add_internal_trans(p, WILD, p);
        assert!(!nwa.is_deterministic());
        nwa.remove_internal_trans(p, WILD, p);

        nwa.add_internal_trans(q, EPSILON, p);
        assert!(!nwa.is_deterministic());
        nwa.remove_internal_trans(q, EPSILON, p);

        nwa.add_return_trans(q, p, a, q);
        assert!(!nwa.is_deterministic());
    }

    #[test]
    fn test_duplicate_state() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let d = interner.key("d");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        nwa.add_final_state(q);
        nwa.add_internal_trans(p, a, q);
        nwa.add_internal_trans(q, a, q);
        nwa.add_call_trans(q, a, p);
        nwa.add_return_trans(p, q, a, q);

        let mut outgoing = nwa.clone();
        outgoing.duplicate_state_outgoing(q, d);
        assert!(outgoing.find_trans(d, a, q));
        assert!(outgoing.find_trans(d, a, p));
        assert!(outgoing.transitions().is_return(&Return::new(p, d, a, q)));
        assert!(!outgoing.find_trans(p, a, d));
        assert!(!outgoing.is_final_state(d));

        nwa.duplicate_state(q, d);
        assert!(nwa.find_trans(p, a, d));
        assert!(nwa.find_trans(d, a, d));
        assert!(nwa.transitions().is_return(&Return::new(p, d, a, d)));
        assert!(nwa.is_final_state(d));
    }

    #[test]
    fn test_remove_implicit_transitions() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let sink = interner.key("sink");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        nwa.add_initial_state(p);
        nwa.add_final_state(p);
        nwa.add_internal_trans(p, a, sink);
        nwa.add_internal_trans(sink, a, sink);

        assert_eq!(nwa.remove_implicit_transitions(), 1);
        assert!(!nwa.is_state(sink));
        assert_eq!(nwa.size_trans(), 0);
    }

    #[test]
    fn test_overlap() {
        let mut interner = KeyInterner::new();
        let stuck = interner.key("stuck");
        let p = interner.key("p");
        let q = interner.key("q");

        let mut first = Nwa::with_stuck_state(stuck);
        first.add_state(p);
        let mut second = Nwa::with_stuck_state(stuck);
        second.add_state(q);
        assert!(!Nwa::overlap(&first, &second));

        second.add_state(p);
        assert!(Nwa::overlap(&first, &second));

        let mut third = Nwa::new();
        third.add_state(stuck);
        assert!(Nwa::overlap(&first, &third));
    }

    #[test]
    fn test_epsilon_closure() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let q = interner.key("q");
        let r = interner.key("r");
        let a = interner.key("a");

        let mut nwa = Nwa::new();
        nwa.add_internal_trans(p, EPSILON, q);
        nwa.add_internal_trans(q, EPSILON, p);
        nwa.add_internal_trans(q, a, r);

        assert_eq!(nwa.epsilon_closure(p), BTreeSet::from([p, q]));
        assert_eq!(nwa.epsilon_closure(r), BTreeSet::from([r]));
    }
}
