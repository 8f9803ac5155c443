use std::collections::VecDeque;
use std::time::Instant;

use log::debug;
use log::trace;
use rustc_hash::FxHashMap;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;
use nwarust_utilities::WILD;

use crate::NestedWord;
use crate::Nwa;

/// How a same-level path between two states was found.
#[derive(Clone, Copy, Debug)]
enum Derivation {
    /// The empty path from a state to itself.
    Empty,
    /// A shorter path followed by an internal transition.
    Internal { previous: Key, symbol: Key },
    /// A shorter path to a call site followed by a call, a same-level path from
    /// the entry to the exit and a matching return.
    Nested {
        call_site: Key,
        call_symbol: Key,
        entry: Key,
        exit: Key,
        return_symbol: Key,
    },
}

/// The pairs of states (p, q) such that some well-matched nested word leads
/// from p to q.
struct Summaries<'a> {
    nwa: &'a Nwa,

    /// The symbol used for wild transitions, none when the alphabet is empty.
    wild: Option<Key>,

    derivations: FxHashMap<(Key, Key), Derivation>,
    by_source: FxHashMap<Key, Vec<Key>>,
    by_target: FxHashMap<Key, Vec<Key>>,
    worklist: VecDeque<(Key, Key)>,
}

impl<'a> Summaries<'a> {
    fn new(nwa: &'a Nwa) -> Summaries<'a> {
        let mut result = Summaries {
            nwa,
            wild: nwa.symbols().next(),
            derivations: FxHashMap::default(),
            by_source: FxHashMap::default(),
            by_target: FxHashMap::default(),
            worklist: VecDeque::new(),
        };

        for state in nwa.states() {
            result.insert(state, state, Derivation::Empty);
        }

        result.saturate();
        result
    }

    fn insert(&mut self, source: Key, target: Key, derivation: Derivation) {
        if self.nwa.is_stuck_state(source) || self.nwa.is_stuck_state(target) {
            return;
        }

        if let std::collections::hash_map::Entry::Vacant(entry) = self.derivations.entry((source, target)) {
            entry.insert(derivation);
            self.by_source.entry(source).or_default().push(target);
            self.by_target.entry(target).or_default().push(source);
            self.worklist.push_back((source, target));
        }
    }

    /// Returns the symbol read by a transition with the given label, if any.
    fn label(&self, symbol: Key) -> Option<Key> {
        if symbol == WILD {
            self.wild
        } else {
            Some(symbol)
        }
    }

    fn saturate(&mut self) {
        let nwa = self.nwa;

        while let Some((source, target)) = self.worklist.pop_front() {
            for t in nwa.transitions().internals_from(target) {
                if let Some(symbol) = self.label(t.symbol) {
                    self.insert(
                        source,
                        t.target,
                        Derivation::Internal {
                            previous: target,
                            symbol,
                        },
                    );
                }
            }

            // The pair as the path to a call site.
            for call in nwa.transitions().calls_from(target) {
                let exits = self.by_source.get(&call.entry).cloned().unwrap_or_default();
                for exit in exits {
                    self.combine(source, target, call.symbol, call.entry, exit);
                }
            }

            // The pair as the path from an entry to an exit.
            for call in nwa.transitions().calls_to(source) {
                let origins = self.by_target.get(&call.call_site).cloned().unwrap_or_default();
                for origin in origins {
                    self.combine(origin, call.call_site, call.symbol, source, target);
                }
            }
        }
    }

    /// Adds the summaries that return from exit to the call site.
    fn combine(&mut self, origin: Key, call_site: Key, call_label: Key, entry: Key, exit: Key) {
        let Some(call_symbol) = self.label(call_label) else {
            return;
        };

        let nwa = self.nwa;
        for ret in nwa
            .transitions()
            .returns_from(exit)
            .filter(|ret| ret.call_site == call_site)
        {
            if let Some(return_symbol) = self.label(ret.symbol) {
                self.insert(
                    origin,
                    ret.return_site,
                    Derivation::Nested {
                        call_site,
                        call_symbol,
                        entry,
                        exit,
                        return_symbol,
                    },
                );
            }
        }
    }

    /// Returns a word that leads from source to target.
    fn word(&self, source: Key, target: Key, word: &mut NestedWord) {
        match self.derivations[&(source, target)] {
            Derivation::Empty => {}
            Derivation::Internal { previous, symbol } => {
                self.word(source, previous, word);
                if symbol != EPSILON {
                    word.append_internal(symbol);
                }
            }
            Derivation::Nested {
                call_site,
                call_symbol,
                entry,
                exit,
                return_symbol,
            } => {
                self.word(source, call_site, word);
                word.append_call(call_symbol);
                self.word(entry, exit, word);
                word.append_return(return_symbol);
            }
        }
    }

    /// Returns some pair of an initial and a final state connected by a same-level path.
    fn accepting_pair(&self) -> Option<(Key, Key)> {
        self.nwa.initial_states().find_map(|initial| {
            self.by_source.get(&initial).and_then(|targets| {
                targets
                    .iter()
                    .find(|target| self.nwa.is_final_state(**target))
                    .map(|target| (initial, *target))
            })
        })
    }
}

/// Returns true iff the automaton accepts the nested word.
pub fn language_contains(nwa: &Nwa, word: &NestedWord, interner: &mut KeyInterner) -> bool {
    matches!(nwa.is_member(word, interner), Ok(true))
}

/// Returns true iff the automaton accepts no well-matched nested word.
pub fn language_is_empty(nwa: &Nwa) -> bool {
    get_some_accepted_word(nwa).is_none()
}

/// Returns some well-matched nested word accepted by the automaton.
pub fn get_some_accepted_word(nwa: &Nwa) -> Option<NestedWord> {
    let start = Instant::now();
    let summaries = Summaries::new(nwa);
    debug!(
        "Computed {} summaries in {:.3}s",
        summaries.derivations.len(),
        start.elapsed().as_secs_f64()
    );

    let (initial, last) = summaries.accepting_pair()?;
    let mut word = NestedWord::new();
    summaries.word(initial, last, &mut word);
    trace!("Accepted word of length {}", word.len());
    Some(word)
}

/// Returns true iff every word accepted by `left` is accepted by `right`.
pub fn language_subset_eq(left: &Nwa, right: &Nwa, interner: &mut KeyInterner) -> bool {
    // The complement is taken with respect to the symbols of both automata.
    let mut extended = right.clone();
    extended.add_all_symbols(left.symbols());

    let mut complement = Nwa::with_stuck_state(interner.fresh_key("stuck"));
    complement.complement(&extended, interner);

    let mut product = Nwa::with_stuck_state(interner.fresh_key("stuck"));
    product.intersect(left, &complement, interner);

    language_is_empty(&product)
}

/// Returns true iff both automata accept the same nested words.
pub fn language_equals(first: &Nwa, second: &Nwa, interner: &mut KeyInterner) -> bool {
    language_subset_eq(first, second, interner) && language_subset_eq(second, first, interner)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// Accepts <c a* r>.
    fn calls_around_a(interner: &mut KeyInterner) -> Nwa {
        let p = interner.key("p");
        let e = interner.key("e");
        let f = interner.key("f");
        let a = interner.key("a");
        let c = interner.key("c");
        let r = interner.key("r");

        let mut nwa = Nwa::new();
        nwa.add_initial_state(p);
        nwa.add_final_state(f);
        nwa.add_call_trans(p, c, e);
        nwa.add_internal_trans(e, a, e);
        nwa.add_return_trans(e, p, r, f);
        nwa
    }

    #[test]
    fn test_get_some_accepted_word() {
        let mut interner = KeyInterner::new();
        let nwa = calls_around_a(&mut interner);

        let word = get_some_accepted_word(&nwa).expect("The language is not empty");
        assert_eq!(format!("{}", word.display(&interner)), "<c r>");
        assert!(language_contains(&nwa, &word, &mut interner));
        assert!(!language_is_empty(&nwa));
    }

    #[test]
    fn test_pending_calls_are_not_accepted() {
        let mut interner = KeyInterner::new();
        let p = interner.key("p");
        let e = interner.key("e");
        let c = interner.key("c");

        // Only accepts words with a pending call.
        let mut nwa = Nwa::new();
        nwa.add_initial_state(p);
        nwa.add_final_state(e);
        nwa.add_call_trans(p, c, e);

        assert!(language_is_empty(&nwa));
    }

    #[test]
    fn test_language_inclusion() {
        let mut interner = KeyInterner::new();
        let nwa = calls_around_a(&mut interner);
        let p = interner.key("p");
        let e = interner.key("e");
        let f = interner.key("f");
        let a = interner.key("a");
        let c = interner.key("c");
        let r = interner.key("r");

        // Accepts <c r> only.
        let mut smaller = Nwa::new();
        smaller.add_initial_state(p);
        smaller.add_final_state(f);
        smaller.add_call_trans(p, c, e);
        smaller.add_return_trans(e, p, r, f);

        assert!(language_subset_eq(&smaller, &nwa, &mut interner));
        assert!(!language_subset_eq(&nwa, &smaller, &mut interner));
        assert!(!language_equals(&nwa, &smaller, &mut interner));
        assert!(language_equals(&nwa, &nwa, &mut interner));

        // A symbol outside of the alphabet of the larger automaton.
        let b = interner.key("b");
        let mut other = smaller.clone();
        other.add_internal_trans(f, b, f);
        assert!(!language_subset_eq(&other, &nwa, &mut interner));

        smaller.add_internal_trans(e, a, e);
        assert!(language_equals(&nwa, &smaller, &mut interner));
    }
}
