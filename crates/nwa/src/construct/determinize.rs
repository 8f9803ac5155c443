use std::time::Instant;

use log::debug;
use log::trace;
use rustc_hash::FxHashMap;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;

use crate::ClientInfoHooks;
use crate::DefaultHooks;
use crate::Nwa;
use crate::Relation;

/// The bookkeeping of the subset construction.
///
/// A state of the determinized automaton is a relation over the states of the
/// operand. A pair (p, q) means that the operand can be in state q, and was
/// in state p at the last pending call, or at the start of the word when
/// there is no pending call.
struct Subsets<'a> {
    operand: &'a Nwa,
    interner: &'a mut KeyInterner,
    stuck: Key,

    relations: FxHashMap<Key, Relation>,
    worklist: Vec<Key>,
}

impl Subsets<'_> {
    /// Returns the state for the given relation, adding it to the result when
    /// it is new. The empty relation is the stuck state.
    fn state(&mut self, result: &mut Nwa, relation: Relation) -> Key {
        if relation.is_empty() {
            return self.stuck;
        }

        let key = self.interner.relation_key(relation.iter().copied());
        if !self.relations.contains_key(&key) {
            trace!("Determinized state {key:?} for {relation:?}");
            result.add_state(key);
            if relation.iter().any(|(_, state)| self.operand.is_final_state(*state)) {
                result.add_final_state(key);
            }

            self.relations.insert(key, relation);
            self.worklist.push(key);
        }

        key
    }

    /// Extends the relation with the epsilon closure of its second components.
    fn close(&self, relation: Relation) -> Relation {
        let mut result = Relation::new();
        for (origin, state) in relation {
            for target in self.operand.epsilon_closure(state) {
                if !self.operand.is_stuck_state(target) {
                    result.insert((origin, target));
                }
            }
        }

        result
    }

    fn internal(&self, source: &Relation, symbol: Key) -> Relation {
        let mut result = Relation::new();
        for &(origin, state) in source {
            for target in self.operand.internal_targets(state, symbol) {
                result.insert((origin, target));
            }
        }

        self.close(result)
    }

    /// The entry relation starts a new level, in which the call sites are the origins.
    fn call(&self, source: &Relation, symbol: Key) -> Relation {
        let mut result = Relation::new();
        for &(_, state) in source {
            for entry in self.operand.call_entries(state, symbol) {
                result.insert((state, entry));
            }
        }

        self.close(result)
    }

    /// Combines the relation at the exit with the relation at the matching call.
    fn ret(&self, exit: &Relation, call: &Relation, symbol: Key) -> Relation {
        let mut result = Relation::new();
        for &(origin, call_site) in call {
            for &(_, state) in exit.iter().filter(|(pushed, _)| *pushed == call_site) {
                for target in self.operand.return_targets(state, call_site, symbol) {
                    result.insert((origin, target));
                }
            }
        }

        self.close(result)
    }
}

impl Nwa {
    /// Stores in `self` a deterministic automaton that accepts the same
    /// well-matched nested words as the operand.
    ///
    /// The result has exactly one initial state, no epsilon transitions and
    /// at most one transition of each kind for every state and symbol.
    /// Transitions to the stuck state of `self` remain implicit.
    ///
    /// # Panics
    ///
    /// When `self` has no stuck state.
    pub fn determinize(&mut self, operand: &Nwa, interner: &mut KeyInterner) {
        self.determinize_with(operand, interner, &mut DefaultHooks);
    }

    /// As [Nwa::determinize], merging client information with the given hooks.
    pub fn determinize_with<H: ClientInfoHooks>(&mut self, operand: &Nwa, interner: &mut KeyInterner, hooks: &mut H) {
        let start = Instant::now();
        let stuck = self.prepare_result("determinize");
        self.add_all_symbols(operand.symbols());
        let symbols: Vec<Key> = operand.symbols().collect();

        let mut subsets = Subsets {
            operand,
            interner,
            stuck,
            relations: FxHashMap::default(),
            worklist: Vec::new(),
        };

        let initial = subsets.close(
            operand
                .initial_states()
                .filter(|state| !operand.is_stuck_state(*state))
                .map(|state| (state, state))
                .collect(),
        );
        let initial_key = subsets.state(self, initial.clone());
        self.add_initial_state(initial_key);
        if let Some(info) = hooks.merge_client_info(operand, &initial, initial_key) {
            self.set_client_info(initial_key, info);
        }

        // Every return transition combines an exit with a call site, so each
        // new state is combined with all states processed before it.
        let mut processed: Vec<Key> = Vec::new();
        while let Some(key) = subsets.worklist.pop() {
            let relation = subsets.relations[&key].clone();

            for &symbol in &symbols {
                let target = subsets.internal(&relation, symbol);
                let target_key = subsets.state(self, target.clone());
                if target_key != stuck {
                    self.add_internal_trans(key, symbol, target_key);
                    if let Some(info) = hooks.merge_client_info_internal(operand, &relation, &target, key, symbol, target_key)
                    {
                        self.set_client_info(target_key, info);
                    }
                }

                let entry = subsets.call(&relation, symbol);
                let entry_key = subsets.state(self, entry.clone());
                if entry_key != stuck {
                    self.add_call_trans(key, symbol, entry_key);
                    if let Some(info) = hooks.merge_client_info_call(operand, &relation, &entry, key, symbol, entry_key) {
                        self.set_client_info(entry_key, info);
                    }
                }
            }

            processed.push(key);
            for &other in &processed {
                let mut combinations = vec![(key, other)];
                if other != key {
                    combinations.push((other, key));
                }

                for (exit_key, call_key) in combinations {
                    let exit = subsets.relations[&exit_key].clone();
                    let call = subsets.relations[&call_key].clone();

                    for &symbol in &symbols {
                        let target = subsets.ret(&exit, &call, symbol);
                        let target_key = subsets.state(self, target.clone());
                        if target_key != stuck {
                            self.add_return_trans(exit_key, call_key, symbol, target_key);
                            if let Some(info) = hooks.merge_client_info_return(
                                operand, &exit, &call, &target, exit_key, call_key, symbol, target_key,
                            ) {
                                self.set_client_info(target_key, info);
                            }
                        }
                    }
                }
            }
        }

        debug!(
            "Determinized {} states into {} states, took {:.3}s",
            operand.size_states(),
            self.size_states(),
            start.elapsed().as_secs_f64()
        );
    }
}
