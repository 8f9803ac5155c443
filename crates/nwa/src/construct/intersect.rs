use std::collections::VecDeque;
use std::time::Instant;

use log::debug;
use log::trace;
use rustc_hash::FxHashMap;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;

use crate::ClientInfoHooks;
use crate::DefaultHooks;
use crate::Nwa;

/// A state of the product together with its two components.
#[derive(Clone, Copy, Debug)]
struct Pair {
    first: Key,
    second: Key,
    key: Key,
}

/// The bookkeeping of the product construction.
struct Product<'a, H> {
    first: &'a Nwa,
    second: &'a Nwa,
    interner: &'a mut KeyInterner,
    hooks: &'a mut H,

    /// The product state of every pair that was considered, `None` if the
    /// hooks rejected the pair.
    pairs: FxHashMap<(Key, Key), Option<Key>>,
    worklist: VecDeque<Pair>,
}

impl<H: ClientInfoHooks> Product<'_, H> {
    /// Returns the product state of (state1, state2), adding it to the result
    /// when it is new.
    fn state(&mut self, result: &mut Nwa, state1: Key, state2: Key) -> Option<Key> {
        if self.first.is_stuck_state(state1) || self.second.is_stuck_state(state2) {
            return None;
        }

        if let Some(key) = self.pairs.get(&(state1, state2)) {
            return *key;
        }

        let key = self
            .hooks
            .state_intersect(self.interner, self.first, state1, self.second, state2)
            .map(|(key, info)| {
                trace!("Product state {key:?} for ({state1:?}, {state2:?})");
                result.add_state(key);
                if let Some(info) = info {
                    result.set_client_info(key, info);
                }

                if self.first.is_initial_state(state1) && self.second.is_initial_state(state2) {
                    result.add_initial_state(key);
                }

                if self.first.is_final_state(state1) && self.second.is_final_state(state2) {
                    result.add_final_state(key);
                }

                self.worklist.push_back(Pair {
                    first: state1,
                    second: state2,
                    key,
                });
                key
            });

        self.pairs.insert((state1, state2), key);
        key
    }

    fn internals(&mut self, result: &mut Nwa, source: Pair) {
        let (first, second) = (self.first, self.second);

        // Epsilon transitions move one component at a time.
        for t1 in first.transitions().internals_from_on(source.first, EPSILON) {
            if let Some(target) = self.state(result, t1.target, source.second) {
                result.add_internal_trans(source.key, EPSILON, target);
            }
        }

        for t2 in second.transitions().internals_from_on(source.second, EPSILON) {
            if let Some(target) = self.state(result, source.first, t2.target) {
                result.add_internal_trans(source.key, EPSILON, target);
            }
        }

        for t1 in first.transitions().internals_from(source.first) {
            for t2 in second.transitions().internals_from(source.second) {
                if t1.symbol == EPSILON || t2.symbol == EPSILON {
                    continue;
                }

                let Some(symbol) = self.hooks.transition_intersect(first, t1.symbol, second, t2.symbol) else {
                    continue;
                };

                if let Some(target) = self.state(result, t1.target, t2.target) {
                    result.add_internal_trans(source.key, symbol, target);

                    if let Some(info) = self.hooks.intersect_client_info_internal(
                        first,
                        source.first,
                        t1.target,
                        second,
                        source.second,
                        t2.target,
                        symbol,
                        target,
                    ) {
                        result.set_client_info(target, info);
                    }
                }
            }
        }
    }

    fn calls(&mut self, result: &mut Nwa, source: Pair) {
        let (first, second) = (self.first, self.second);

        for t1 in first.transitions().calls_from(source.first) {
            for t2 in second.transitions().calls_from(source.second) {
                let Some(symbol) = self.hooks.transition_intersect(first, t1.symbol, second, t2.symbol) else {
                    continue;
                };

                if let Some(entry) = self.state(result, t1.entry, t2.entry) {
                    result.add_call_trans(source.key, symbol, entry);

                    if let Some(info) = self.hooks.intersect_client_info_call(
                        first,
                        source.first,
                        t1.entry,
                        second,
                        source.second,
                        t2.entry,
                        symbol,
                        entry,
                    ) {
                        result.set_client_info(entry, info);
                    }
                }
            }
        }
    }

    fn returns(&mut self, result: &mut Nwa, exit: Pair, call: Pair) {
        let (first, second) = (self.first, self.second);

        for t1 in first
            .transitions()
            .returns_from(exit.first)
            .filter(|t| t.call_site == call.first)
        {
            for t2 in second
                .transitions()
                .returns_from(exit.second)
                .filter(|t| t.call_site == call.second)
            {
                let Some(symbol) = self.hooks.transition_intersect(first, t1.symbol, second, t2.symbol) else {
                    continue;
                };

                if let Some(target) = self.state(result, t1.return_site, t2.return_site) {
                    result.add_return_trans(exit.key, call.key, symbol, target);

                    if let Some(info) = self.hooks.intersect_client_info_return(
                        first,
                        exit.first,
                        call.first,
                        t1.return_site,
                        second,
                        exit.second,
                        call.second,
                        t2.return_site,
                        symbol,
                        target,
                    ) {
                        result.set_client_info(target, info);
                    }
                }
            }
        }
    }
}

impl Nwa {
    /// Stores the product of the two automata in `self`, which accepts the
    /// intersection of their languages. Product states are named by the
    /// interner.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn intersect(&mut self, first: &Nwa, second: &Nwa, interner: &mut KeyInterner) {
        self.intersect_with(first, second, interner, &mut DefaultHooks);
    }

    /// As [Nwa::intersect], where the hooks decide which pairs of states and
    /// symbols are combined and compute the client information of the product.
    pub fn intersect_with<H: ClientInfoHooks>(
        &mut self,
        first: &Nwa,
        second: &Nwa,
        interner: &mut KeyInterner,
        hooks: &mut H,
    ) {
        let start = Instant::now();
        self.prepare_result("intersect");
        self.add_all_symbols(first.symbols().filter(|symbol| second.is_symbol(*symbol)));

        let mut product = Product {
            first,
            second,
            interner,
            hooks,
            pairs: FxHashMap::default(),
            worklist: VecDeque::new(),
        };

        for initial1 in first.initial_states() {
            for initial2 in second.initial_states() {
                product.state(self, initial1, initial2);
            }
        }

        // Every return transition combines an exit with a call site, so each
        // new state is combined with all states processed before it.
        let mut processed: Vec<Pair> = Vec::new();
        while let Some(pair) = product.worklist.pop_front() {
            product.internals(self, pair);
            product.calls(self, pair);

            processed.push(pair);
            for &other in &processed {
                product.returns(self, pair, other);
                if other.key != pair.key {
                    product.returns(self, other, pair);
                }
            }
        }

        debug!(
            "Intersection has {} states and {} transitions, took {:.3}s",
            self.size_states(),
            self.size_trans(),
            start.elapsed().as_secs_f64()
        );
    }
}
