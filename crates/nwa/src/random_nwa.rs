use rand::Rng;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;
use nwarust_utilities::WILD;

use crate::NestedWord;
use crate::Nwa;
use crate::PositionKind;

/// Generates an automaton with the desired number of states and symbols, in
/// which every state has at most `outdegree` outgoing transitions of random
/// kinds. State `s0` is initial and every state is final with probability
/// one third. Internal transitions are occasionally labelled with epsilon or
/// wild.
pub fn random_nwa<R: Rng>(
    rng: &mut R,
    interner: &mut KeyInterner,
    num_of_states: usize,
    num_of_symbols: usize,
    outdegree: usize,
) -> Nwa {
    let states: Vec<Key> = (0..num_of_states).map(|i| interner.key(&format!("s{i}"))).collect();
    let symbols: Vec<Key> = random_symbols(interner, num_of_symbols);

    let mut nwa = Nwa::new();
    nwa.add_all_states(states.iter().copied());
    nwa.add_all_symbols(symbols.iter().copied());
    if let Some(initial) = states.first() {
        nwa.add_initial_state(*initial);
    }

    if symbols.is_empty() {
        return nwa;
    }

    for &state in &states {
        if rng.random_ratio(1, 3) {
            nwa.add_final_state(state);
        }

        // Introduce outgoing transitions for this state based on the desired out degree.
        for _ in 0..rng.random_range(0..=outdegree) {
            let symbol = symbols[rng.random_range(0..symbols.len())];
            let target = states[rng.random_range(0..states.len())];

            match rng.random_range(0..3) {
                0 => {
                    let label = match rng.random_range(0..10) {
                        0 => EPSILON,
                        1 => WILD,
                        _ => symbol,
                    };
                    nwa.add_internal_trans(state, label, target);
                }
                1 => {
                    nwa.add_call_trans(state, symbol, target);
                }
                _ => {
                    let call_site = states[rng.random_range(0..states.len())];
                    nwa.add_return_trans(state, call_site, symbol, target);
                }
            }
        }
    }

    nwa
}

/// Returns the keys of the symbols `l0`, `l1`, ... used by the random generators.
pub fn random_symbols(interner: &mut KeyInterner, num_of_symbols: usize) -> Vec<Key> {
    (0..num_of_symbols).map(|i| interner.key(&format!("l{i}"))).collect()
}

/// Generates a nested word of the given length over the symbols. When
/// `well_matched` is true every call is matched by a later return, otherwise
/// the kinds of the positions are chosen uniformly.
pub fn random_nested_word<R: Rng>(rng: &mut R, symbols: &[Key], length: usize, well_matched: bool) -> NestedWord {
    let mut word = NestedWord::new();
    if symbols.is_empty() {
        return word;
    }

    let mut depth = 0usize;
    for index in 0..length {
        let symbol = symbols[rng.random_range(0..symbols.len())];
        let remaining = length - index;

        let kind = if !well_matched {
            match rng.random_range(0..3) {
                0 => PositionKind::Call,
                1 => PositionKind::Internal,
                _ => PositionKind::Return,
            }
        } else if depth >= remaining {
            PositionKind::Return
        } else {
            // Leave room to close every pending call.
            match rng.random_range(0..3) {
                0 if depth + 1 < remaining => PositionKind::Call,
                2 if depth > 0 => PositionKind::Return,
                _ => PositionKind::Internal,
            }
        };

        match kind {
            PositionKind::Call => depth += 1,
            PositionKind::Return => depth = depth.saturating_sub(1),
            PositionKind::Internal => {}
        }
        word.append(symbol, kind);
    }

    word
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_log::test;

    use super::*;

    #[test]
    fn test_random_nwa() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut interner = KeyInterner::new();

        let nwa = random_nwa(&mut rng, &mut interner, 10, 3, 3);
        assert_eq!(nwa.size_states(), 10);
        assert_eq!(nwa.size_symbols(), 3);
        assert_eq!(nwa.size_initial_states(), 1);
    }

    #[test]
    fn test_random_nested_word() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut interner = KeyInterner::new();
        let symbols = random_symbols(&mut interner, 2);

        for length in 0..20 {
            let word = random_nested_word(&mut rng, &symbols, length, true);
            assert_eq!(word.len(), length);
            assert!(word.is_well_matched(), "{:?}", word);
        }
    }
}
