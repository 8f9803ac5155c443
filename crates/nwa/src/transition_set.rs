use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

use nwarust_utilities::Key;
use nwarust_utilities::EPSILON;

/// An internal transition: source --[symbol]-> target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Internal {
    pub source: Key,
    pub symbol: Key,
    pub target: Key,
}

/// A call transition: call_site --[symbol]-> entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Call {
    pub call_site: Key,
    pub symbol: Key,
    pub entry: Key,
}

/// A return transition: exit --[symbol/call_site]-> return_site, which can
/// only be taken when call_site is on top of the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Return {
    pub exit: Key,
    pub call_site: Key,
    pub symbol: Key,
    pub return_site: Key,
}

impl Internal {
    pub fn new(source: Key, symbol: Key, target: Key) -> Internal {
        Internal { source, symbol, target }
    }
}

impl Call {
    pub fn new(call_site: Key, symbol: Key, entry: Key) -> Call {
        Call {
            call_site,
            symbol,
            entry,
        }
    }
}

impl Return {
    pub fn new(exit: Key, call_site: Key, symbol: Key, return_site: Key) -> Return {
        Return {
            exit,
            call_site,
            symbol,
            return_site,
        }
    }
}

/// A secondary index from a state to the transitions in which it occupies a
/// specific column.
#[derive(Clone, Debug)]
struct Index<T> {
    map: FxHashMap<Key, BTreeSet<T>>,
}

impl<T: Copy + Ord> Index<T> {
    fn insert(&mut self, key: Key, value: T) {
        self.map.entry(key).or_default().insert(value);
    }

    fn remove(&mut self, key: Key, value: &T) {
        if let Some(set) = self.map.get_mut(&key) {
            set.remove(value);
            if set.is_empty() {
                self.map.remove(&key);
            }
        }
    }

    fn get(&self, key: Key) -> impl Iterator<Item = T> + '_ {
        self.map.get(&key).into_iter().flat_map(|set| set.iter().copied())
    }

    fn contains_key(&self, key: Key) -> bool {
        self.map.contains_key(&key)
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Index {
            map: FxHashMap::default(),
        }
    }
}

/// The internal, call and return relations of an automaton, each indexed by
/// every state column.
#[derive(Clone, Default)]
pub struct TransitionSet {
    internals: BTreeSet<Internal>,
    internals_by_source: Index<Internal>,
    internals_by_target: Index<Internal>,

    calls: BTreeSet<Call>,
    calls_by_call_site: Index<Call>,
    calls_by_entry: Index<Call>,

    returns: BTreeSet<Return>,
    returns_by_exit: Index<Return>,
    returns_by_call_site: Index<Return>,
    returns_by_return_site: Index<Return>,
}

impl TransitionSet {
    /// Adds an internal transition, returns false if it was already present.
    pub fn add_internal(&mut self, internal: Internal) -> bool {
        if !self.internals.insert(internal) {
            return false;
        }

        self.internals_by_source.insert(internal.source, internal);
        self.internals_by_target.insert(internal.target, internal);
        true
    }

    /// Adds a call transition, returns false if it was already present or is
    /// labelled with epsilon.
    pub fn add_call(&mut self, call: Call) -> bool {
        if call.symbol == EPSILON || !self.calls.insert(call) {
            return false;
        }

        self.calls_by_call_site.insert(call.call_site, call);
        self.calls_by_entry.insert(call.entry, call);
        true
    }

    /// Adds a return transition, returns false if it was already present or is
    /// labelled with epsilon.
    pub fn add_return(&mut self, ret: Return) -> bool {
        if ret.symbol == EPSILON || !self.returns.insert(ret) {
            return false;
        }

        self.returns_by_exit.insert(ret.exit, ret);
        self.returns_by_call_site.insert(ret.call_site, ret);
        self.returns_by_return_site.insert(ret.return_site, ret);
        true
    }

    pub fn remove_internal(&mut self, internal: &Internal) -> bool {
        if !self.internals.remove(internal) {
            return false;
        }

        self.internals_by_source.remove(internal.source, internal);
        self.internals_by_target.remove(internal.target, internal);
        true
    }

    pub fn remove_call(&mut self, call: &Call) -> bool {
        if !self.calls.remove(call) {
            return false;
        }

        self.calls_by_call_site.remove(call.call_site, call);
        self.calls_by_entry.remove(call.entry, call);
        true
    }

    pub fn remove_return(&mut self, ret: &Return) -> bool {
        if !self.returns.remove(ret) {
            return false;
        }

        self.returns_by_exit.remove(ret.exit, ret);
        self.returns_by_call_site.remove(ret.call_site, ret);
        self.returns_by_return_site.remove(ret.return_site, ret);
        true
    }

    /// Removes every transition in which the given state occurs, returns true
    /// iff at least one transition was removed.
    pub fn remove_transitions_with_state(&mut self, state: Key) -> bool {
        let internals: Vec<Internal> = self
            .internals_by_source
            .get(state)
            .chain(self.internals_by_target.get(state))
            .collect();
        let calls: Vec<Call> = self
            .calls_by_call_site
            .get(state)
            .chain(self.calls_by_entry.get(state))
            .collect();
        let returns: Vec<Return> = self
            .returns_by_exit
            .get(state)
            .chain(self.returns_by_call_site.get(state))
            .chain(self.returns_by_return_site.get(state))
            .collect();

        let mut removed = false;
        for internal in &internals {
            removed |= self.remove_internal(internal);
        }
        for call in &calls {
            removed |= self.remove_call(call);
        }
        for ret in &returns {
            removed |= self.remove_return(ret);
        }

        removed
    }

    /// Removes every transition labelled with the given symbol.
    pub fn remove_transitions_with_symbol(&mut self, symbol: Key) -> bool {
        let internals: Vec<Internal> = self.internals.iter().filter(|t| t.symbol == symbol).copied().collect();
        let calls: Vec<Call> = self.calls.iter().filter(|t| t.symbol == symbol).copied().collect();
        let returns: Vec<Return> = self.returns.iter().filter(|t| t.symbol == symbol).copied().collect();

        let removed = !internals.is_empty() || !calls.is_empty() || !returns.is_empty();
        for internal in &internals {
            self.remove_internal(internal);
        }
        for call in &calls {
            self.remove_call(call);
        }
        for ret in &returns {
            self.remove_return(ret);
        }

        removed
    }

    pub fn clear(&mut self) {
        self.internals.clear();
        self.internals_by_source.clear();
        self.internals_by_target.clear();

        self.calls.clear();
        self.calls_by_call_site.clear();
        self.calls_by_entry.clear();

        self.returns.clear();
        self.returns_by_exit.clear();
        self.returns_by_call_site.clear();
        self.returns_by_return_site.clear();
    }

    pub fn is_internal(&self, internal: &Internal) -> bool {
        self.internals.contains(internal)
    }

    pub fn is_call(&self, call: &Call) -> bool {
        self.calls.contains(call)
    }

    pub fn is_return(&self, ret: &Return) -> bool {
        self.returns.contains(ret)
    }

    pub fn internals(&self) -> impl Iterator<Item = Internal> + '_ {
        self.internals.iter().copied()
    }

    pub fn calls(&self) -> impl Iterator<Item = Call> + '_ {
        self.calls.iter().copied()
    }

    pub fn returns(&self) -> impl Iterator<Item = Return> + '_ {
        self.returns.iter().copied()
    }

    pub fn size_internals(&self) -> usize {
        self.internals.len()
    }

    pub fn size_calls(&self) -> usize {
        self.calls.len()
    }

    pub fn size_returns(&self) -> usize {
        self.returns.len()
    }

    pub fn size(&self) -> usize {
        self.internals.len() + self.calls.len() + self.returns.len()
    }

    pub fn internals_from(&self, source: Key) -> impl Iterator<Item = Internal> + '_ {
        self.internals_by_source.get(source)
    }

    pub fn internals_from_on(&self, source: Key, symbol: Key) -> impl Iterator<Item = Internal> + '_ {
        self.internals_from(source).filter(move |t| t.symbol == symbol)
    }

    pub fn internals_to(&self, target: Key) -> impl Iterator<Item = Internal> + '_ {
        self.internals_by_target.get(target)
    }

    pub fn internals_to_on(&self, symbol: Key, target: Key) -> impl Iterator<Item = Internal> + '_ {
        self.internals_to(target).filter(move |t| t.symbol == symbol)
    }

    pub fn internal_exists(&self, source: Key, symbol: Key) -> bool {
        self.internals_from_on(source, symbol).next().is_some()
    }

    pub fn calls_from(&self, call_site: Key) -> impl Iterator<Item = Call> + '_ {
        self.calls_by_call_site.get(call_site)
    }

    pub fn calls_from_on(&self, call_site: Key, symbol: Key) -> impl Iterator<Item = Call> + '_ {
        self.calls_from(call_site).filter(move |t| t.symbol == symbol)
    }

    pub fn calls_to(&self, entry: Key) -> impl Iterator<Item = Call> + '_ {
        self.calls_by_entry.get(entry)
    }

    pub fn calls_to_on(&self, symbol: Key, entry: Key) -> impl Iterator<Item = Call> + '_ {
        self.calls_to(entry).filter(move |t| t.symbol == symbol)
    }

    pub fn call_exists(&self, call_site: Key, symbol: Key) -> bool {
        self.calls_from_on(call_site, symbol).next().is_some()
    }

    pub fn returns_from(&self, exit: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_by_exit.get(exit)
    }

    pub fn returns_from_on(&self, exit: Key, symbol: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_from(exit).filter(move |t| t.symbol == symbol)
    }

    pub fn returns_from_with(&self, exit: Key, call_site: Key, symbol: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_from(exit)
            .filter(move |t| t.call_site == call_site && t.symbol == symbol)
    }

    pub fn returns_with_call_site(&self, call_site: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_by_call_site.get(call_site)
    }

    pub fn returns_to(&self, return_site: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_by_return_site.get(return_site)
    }

    pub fn returns_to_on(&self, symbol: Key, return_site: Key) -> impl Iterator<Item = Return> + '_ {
        self.returns_to(return_site).filter(move |t| t.symbol == symbol)
    }

    pub fn return_exists(&self, exit: Key, call_site: Key, symbol: Key) -> bool {
        self.returns_from_with(exit, call_site, symbol).next().is_some()
    }

    /// Returns true iff the state occurs in some return transition as call site.
    pub fn is_call_site_of_return(&self, state: Key) -> bool {
        self.returns_by_call_site.contains_key(state)
    }

    /// Returns true iff some transition of any kind with the given label leads
    /// from `from` to `to`. For return transitions both the exit and the call
    /// site count as source.
    pub fn find_trans(&self, from: Key, symbol: Key, to: Key) -> bool {
        self.is_internal(&Internal::new(from, symbol, to))
            || self.is_call(&Call::new(from, symbol, to))
            || self
                .returns_to_on(symbol, to)
                .any(|ret| ret.exit == from || ret.call_site == from)
    }
}

impl PartialEq for TransitionSet {
    fn eq(&self, other: &Self) -> bool {
        self.internals == other.internals && self.calls == other.calls && self.returns == other.returns
    }
}

impl Eq for TransitionSet {}

impl fmt::Debug for TransitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.internals {
            writeln!(f, "{:?} --[{:?}]-> {:?}", t.source, t.symbol, t.target)?;
        }
        for t in &self.calls {
            writeln!(f, "{:?} --[<{:?}]-> {:?}", t.call_site, t.symbol, t.entry)?;
        }
        for t in &self.returns {
            writeln!(f, "{:?} --[{:?}>/{:?}]-> {:?}", t.exit, t.symbol, t.call_site, t.return_site)?;
        }

        Ok(())
    }
}
