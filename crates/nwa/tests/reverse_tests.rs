use rand::rngs::StdRng;
use rand::SeedableRng;
use test_case::test_case;

use nwarust_nwa::random_nested_word;
use nwarust_nwa::random_nwa;
use nwarust_nwa::random_symbols;
use nwarust_nwa::NestedWord;
use nwarust_nwa::Nwa;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::EPSILON;

/// The procedure call example: Start -a-> Call -<call-> Entry -b-> State -b->
/// Exit -ret>-> Return -a-> Finish.
fn figure(interner: &mut KeyInterner) -> Nwa {
    let start = interner.key("Start");
    let call = interner.key("Call");
    let entry = interner.key("Entry");
    let state = interner.key("State");
    let exit = interner.key("Exit");
    let ret = interner.key("Return");
    let finish = interner.key("Finish");

    let a = interner.key("a");
    let b = interner.key("b");
    let call_symbol = interner.key("call");
    let ret_symbol = interner.key("ret");

    let mut nwa = Nwa::new();
    nwa.add_initial_state(start);
    nwa.add_final_state(finish);
    nwa.add_internal_trans(start, a, call);
    nwa.add_call_trans(call, call_symbol, entry);
    nwa.add_internal_trans(entry, b, state);
    nwa.add_internal_trans(state, b, exit);
    nwa.add_return_trans(exit, call, ret_symbol, ret);
    nwa.add_internal_trans(ret, a, finish);
    nwa
}

fn figure_word(interner: &mut KeyInterner) -> NestedWord {
    let mut word = NestedWord::new();
    word.append_internal(interner.key("a"));
    word.append_call(interner.key("call"));
    word.append_internal(interner.key("b"));
    word.append_internal(interner.key("b"));
    word.append_return(interner.key("ret"));
    word.append_internal(interner.key("a"));
    word
}

#[test_log::test]
fn test_reverse_figure() {
    let mut interner = KeyInterner::new();
    let nwa = figure(&mut interner);
    let word = figure_word(&mut interner);

    let mut reversed = Nwa::with_stuck_state(interner.key("stuck"));
    reversed.reverse(&nwa, &mut interner);

    assert_eq!(
        format!("{}", word.reversed().display(&interner)),
        "a <ret b b call> a"
    );

    assert!(nwa.is_member(&word, &mut interner).unwrap());
    assert!(!reversed.is_member(&word, &mut interner).unwrap());

    assert!(reversed.is_member(&word.reversed(), &mut interner).unwrap());
    assert!(!nwa.is_member(&word.reversed(), &mut interner).unwrap());

    assert_eq!(nwa.is_member_nondet(&word), Ok(true));
    assert_eq!(reversed.is_member_nondet(&word.reversed()), Ok(true));
    assert_eq!(reversed.is_member_nondet(&word), Ok(false));
}

#[test_log::test]
fn test_reverse_twice() {
    let mut interner = KeyInterner::new();
    let nwa = figure(&mut interner);

    let mut reversed = Nwa::with_stuck_state(interner.key("stuck"));
    reversed.reverse(&nwa, &mut interner);

    let mut twice = Nwa::with_stuck_state(interner.key("stuck"));
    twice.reverse(&reversed, &mut interner);

    // Every reversal adds a state that remembers the call site and an epsilon
    // transition into it, next to the stuck state.
    assert_eq!(reversed.size_states(), nwa.size_states() + 2);
    assert_eq!(reversed.size_trans(), nwa.size_trans() + 1);
    assert_eq!(twice.size_states(), nwa.size_states() + 3);
    assert_eq!(twice.size_trans(), nwa.size_trans() + 2);
    assert!(nwarust_nwa::language_equals(&nwa, &twice, &mut interner));
}

/// Parses a word in which calls are written as `<c` and returns as `r>`.
fn parse_word(interner: &mut KeyInterner, text: &str) -> NestedWord {
    let mut word = NestedWord::new();
    for token in text.split_whitespace() {
        if let Some(name) = token.strip_prefix('<') {
            word.append_call(interner.key(name));
        } else if let Some(name) = token.strip_suffix('>') {
            word.append_return(interner.key(name));
        } else {
            word.append_internal(interner.key(token));
        }
    }
    word
}

#[test_log::test]
fn test_reverse_shared_entry() {
    let mut interner = KeyInterner::new();
    let start = interner.key("start");
    let left = interner.key("left");
    let right = interner.key("right");
    let entry = interner.key("entry");
    let body = interner.key("body");
    let done = interner.key("done");
    let c = interner.key("c");
    let d = interner.key("d");
    let x = interner.key("x");
    let r = interner.key("r");
    let s = interner.key("s");

    // Two call sites share the entry, the body and the return site. The
    // return symbol must agree with the call site.
    let mut nwa = Nwa::new();
    nwa.add_initial_state(start);
    nwa.add_final_state(done);
    nwa.add_internal_trans(start, EPSILON, left);
    nwa.add_internal_trans(start, EPSILON, right);
    nwa.add_call_trans(left, c, entry);
    nwa.add_call_trans(right, d, entry);
    nwa.add_internal_trans(entry, x, body);
    nwa.add_return_trans(body, left, r, done);
    nwa.add_return_trans(body, right, s, done);

    let mut reversed = Nwa::with_stuck_state(interner.key("stuck"));
    reversed.reverse(&nwa, &mut interner);

    for (text, expected) in [("<c x r>", true), ("<d x s>", true), ("<c x s>", false), ("<d x r>", false)] {
        let word = parse_word(&mut interner, text);
        let reversed_word = word.reversed();

        assert_eq!(nwa.is_member_nondet(&word), Ok(expected), "{text}");
        assert_eq!(reversed.is_member_nondet(&reversed_word), Ok(expected), "reverse of {text}");
        assert_eq!(reversed.is_member(&reversed_word, &mut interner), Ok(expected), "reverse of {text}");
    }
}

#[test_case(1 ; "seed 1")]
#[test_case(2 ; "seed 2")]
#[test_case(3 ; "seed 3")]
#[test_case(4 ; "seed 4")]
#[test_case(5 ; "seed 5")]
fn test_reverse_membership(seed: u64) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut interner = KeyInterner::new();
    let nwa = random_nwa(&mut rng, &mut interner, 4, 2, 3);
    let symbols = random_symbols(&mut interner, 2);

    let mut reversed = Nwa::with_stuck_state(interner.fresh_key("stuck"));
    reversed.reverse(&nwa, &mut interner);

    for length in 0..10 {
        let word = random_nested_word(&mut rng, &symbols, length, true);

        assert_eq!(
            nwa.is_member_nondet(&word),
            reversed.is_member_nondet(&word.reversed()),
            "The reverse disagrees on {}",
            word.display(&interner)
        );
    }
}
