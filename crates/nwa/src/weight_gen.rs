use nwarust_utilities::Key;
use nwarust_utilities::WILD;

use crate::ClientInfoRef;
use crate::Nwa;

/// The kinds of edges of a pushdown system derived from an automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// An internal transition.
    Intra,
    /// A call transition.
    CallToEntry,
    /// The exit to return part of a return transition.
    ExitToRet,
    /// The call to return part of a return transition.
    CallToRet,
}

/// Computes the weights of the rules of a weighted pushdown system that is
/// derived from an automaton. The weight domain is chosen by the implementor.
pub trait WeightGen {
    type Weight: Clone;

    /// The neutral element of the weight domain.
    fn one(&self) -> Self::Weight;

    /// The weight of the edge from source to target labelled with symbol.
    #[allow(clippy::too_many_arguments)]
    fn weight(
        &mut self,
        _source: Key,
        _source_info: Option<&ClientInfoRef>,
        _symbol: Key,
        _kind: EdgeKind,
        _target: Key,
        _target_info: Option<&ClientInfoRef>,
    ) -> Self::Weight {
        self.one()
    }

    /// The weight of the rule that leaves a procedure from the given exit.
    fn exit_weight(&mut self, _source: Key, _source_info: Option<&ClientInfoRef>) -> Self::Weight {
        self.one()
    }

    /// The weight of an edge labelled with the wild symbol.
    fn wild_weight(
        &mut self,
        _source: Key,
        _source_info: Option<&ClientInfoRef>,
        _target: Key,
        _target_info: Option<&ClientInfoRef>,
    ) -> Self::Weight {
        self.one()
    }
}

/// Plain reachability, every edge has weight `true`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReachGen;

impl WeightGen for ReachGen {
    type Weight = bool;

    fn one(&self) -> bool {
        true
    }
}

/// An edge of the derived pushdown system together with its weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedEdge<W> {
    pub source: Key,
    pub symbol: Key,
    pub kind: EdgeKind,
    pub target: Key,
    pub weight: W,
}

/// All weighted edges of an automaton, and the weights of the exit rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedRules<W> {
    pub edges: Vec<WeightedEdge<W>>,
    pub exits: Vec<(Key, W)>,
}

impl Nwa {
    /// Computes the weights of the rules that a pushdown system derived from
    /// this automaton consists of.
    ///
    /// Internal and call transitions yield a single edge. Return transitions
    /// yield an exit to return edge, and a call to return edge that always
    /// has the neutral weight. Every state with an outgoing return transition
    /// has an exit rule.
    pub fn weighted_edges<G: WeightGen>(&self, generator: &mut G) -> WeightedRules<G::Weight> {
        let mut edges = Vec::new();

        for t in self.internal_trans() {
            let weight = self.edge_weight(generator, t.source, t.symbol, EdgeKind::Intra, t.target);
            edges.push(WeightedEdge {
                source: t.source,
                symbol: t.symbol,
                kind: EdgeKind::Intra,
                target: t.target,
                weight,
            });
        }

        for t in self.call_trans() {
            let weight = self.edge_weight(generator, t.call_site, t.symbol, EdgeKind::CallToEntry, t.entry);
            edges.push(WeightedEdge {
                source: t.call_site,
                symbol: t.symbol,
                kind: EdgeKind::CallToEntry,
                target: t.entry,
                weight,
            });
        }

        for t in self.return_trans() {
            let weight = self.edge_weight(generator, t.exit, t.symbol, EdgeKind::ExitToRet, t.return_site);
            edges.push(WeightedEdge {
                source: t.exit,
                symbol: t.symbol,
                kind: EdgeKind::ExitToRet,
                target: t.return_site,
                weight,
            });

            edges.push(WeightedEdge {
                source: t.call_site,
                symbol: t.symbol,
                kind: EdgeKind::CallToRet,
                target: t.return_site,
                weight: generator.one(),
            });
        }

        let exits = self
            .states()
            .filter(|state| self.transitions().returns_from(*state).next().is_some())
            .map(|state| (state, generator.exit_weight(state, self.client_info(state))))
            .collect();

        WeightedRules { edges, exits }
    }

    fn edge_weight<G: WeightGen>(&self, generator: &mut G, source: Key, symbol: Key, kind: EdgeKind, target: Key) -> G::Weight {
        let source_info = self.client_info(source);
        let target_info = self.client_info(target);

        if symbol == WILD {
            generator.wild_weight(source, source_info, target, target_info)
        } else {
            generator.weight(source, source_info, symbol, kind, target, target_info)
        }
    }
}
