use std::any::Any;
use std::fmt;
use std::rc::Rc;

use nwarust_utilities::Key;
use nwarust_utilities::KeyInterner;
use nwarust_utilities::WILD;

use crate::Nwa;

/// A payload that clients can attach to the states of an automaton.
pub trait ClientInfo: fmt::Debug + Any {
    /// Allows downcasting to the concrete payload type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: fmt::Debug + Any> ClientInfo for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Client information is shared between automata and never mutated after it
/// has been attached to a state.
pub type ClientInfoRef = Rc<dyn ClientInfo>;

/// A binary relation over states, used as the identity of determinized states.
pub type Relation = std::collections::BTreeSet<(Key, Key)>;

/// The customisation points of the product and subset constructions.
///
/// Every method has a default that always succeeds and produces no client
/// information. For the `intersect_client_info_*` and `merge_client_info_*`
/// hooks a returned payload replaces the payload of the `result` state, and
/// `None` leaves it untouched.
pub trait ClientInfoHooks {
    /// Decides whether the pair (state1, state2) becomes a state of the
    /// product and returns its key together with its initial payload.
    fn state_intersect(
        &mut self,
        interner: &mut KeyInterner,
        _first: &Nwa,
        state1: Key,
        _second: &Nwa,
        state2: Key,
    ) -> Option<(Key, Option<ClientInfoRef>)> {
        Some((interner.pair_key(state1, state2), None))
    }

    /// Returns the symbol labelling a product edge for the given symbols, if any.
    fn transition_intersect(&mut self, first: &Nwa, symbol1: Key, second: &Nwa, symbol2: Key) -> Option<Key> {
        if symbol1 == symbol2 {
            Some(symbol1)
        } else if symbol1 == WILD && first.is_symbol(symbol2) {
            Some(symbol2)
        } else if symbol2 == WILD && second.is_symbol(symbol1) {
            Some(symbol1)
        } else {
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn intersect_client_info_call(
        &mut self,
        _first: &Nwa,
        _call1: Key,
        _entry1: Key,
        _second: &Nwa,
        _call2: Key,
        _entry2: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn intersect_client_info_internal(
        &mut self,
        _first: &Nwa,
        _source1: Key,
        _target1: Key,
        _second: &Nwa,
        _source2: Key,
        _target2: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn intersect_client_info_return(
        &mut self,
        _first: &Nwa,
        _exit1: Key,
        _call1: Key,
        _return1: Key,
        _second: &Nwa,
        _exit2: Key,
        _call2: Key,
        _return2: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }

    /// Merges the payloads of the states in `relation` for a determinized initial state.
    fn merge_client_info(&mut self, _nwa: &Nwa, _relation: &Relation, _result: Key) -> Option<ClientInfoRef> {
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_client_info_call(
        &mut self,
        _nwa: &Nwa,
        _call: &Relation,
        _entry: &Relation,
        _call_state: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_client_info_internal(
        &mut self,
        _nwa: &Nwa,
        _source: &Relation,
        _target: &Relation,
        _source_state: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_client_info_return(
        &mut self,
        _nwa: &Nwa,
        _exit: &Relation,
        _call: &Relation,
        _ret: &Relation,
        _exit_state: Key,
        _call_state: Key,
        _symbol: Key,
        _result: Key,
    ) -> Option<ClientInfoRef> {
        None
    }
}

/// The hooks that keep no client information at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHooks;

impl ClientInfoHooks for DefaultHooks {}
