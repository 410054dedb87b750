//! The conversion graph (C3): one directed edge per order, with tokens
//! (currencies) as vertices, projected onto a `petgraph::graph::DiGraph`
//! the same way the corpus this crate is grounded on projects an order book
//! onto a `DiGraph<TokenId, Weight>`. Currencies aren't already a dense
//! integer index the way token ids are, so `Graph` keeps a
//! `Currency -> NodeIndex` map alongside the `DiGraph` to translate between
//! the two.

use crate::decimal::{Decimal, CANONICAL_SCALE};
use crate::error::Result;
use crate::money::{Currency, Money};
use crate::order::{Order, OrderId, Side};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// A slice of an order's capacity, tagged `mandatory` (must be filled to
/// respect a fee-induced minimum) or `optional` (fillable up to the
/// order's remaining bound).
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeSegment {
    pub mandatory: bool,
    pub base: (Money, Money),
    pub quote: (Money, Money),
    pub gross_base: (Money, Money),
}

/// One directed edge in the conversion graph, wrapping a single order.
///
/// `base_capacity`, `quote_capacity`, and `gross_base_capacity` always
/// refer to the *order's own* base/quote currencies (not "source"/"target"
/// of the edge); `source_capacity`/`target_capacity` below translate that
/// into edge-direction terms for the search engine.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub from: Currency,
    pub to: Currency,
    pub side: Side,
    pub order: Rc<Order>,
    pub effective_rate: Decimal,
    pub base_capacity: (Money, Money),
    pub quote_capacity: (Money, Money),
    pub gross_base_capacity: (Money, Money),
    pub segments: Vec<EdgeSegment>,
}

impl GraphEdge {
    fn build(order: Rc<Order>) -> Result<Self> {
        let (from, to) = match order.side {
            Side::Buy => (order.pair.base.clone(), order.pair.quote.clone()),
            Side::Sell => (order.pair.quote.clone(), order.pair.base.clone()),
        };

        let base_min = order.bounds.min().clone();
        let base_max = order.bounds.max().clone();
        let quote_min = order.calculate_effective_quote_amount(&base_min, CANONICAL_SCALE)?;
        let quote_max = order.calculate_effective_quote_amount(&base_max, CANONICAL_SCALE)?;
        let gross_base_min = order.calculate_gross_base_spend(&base_min, CANONICAL_SCALE)?;
        let gross_base_max = order.calculate_gross_base_spend(&base_max, CANONICAL_SCALE)?;

        let effective_rate = match order.side {
            Side::Buy => quote_max.amount().div(&gross_base_max.amount(), CANONICAL_SCALE)?,
            Side::Sell => base_max.amount().div(&quote_max.amount(), CANONICAL_SCALE)?,
        };

        let mandatory = order.fee_policy.is_some() && !gross_base_min.amount().cmp_value(&base_min.amount()).is_eq();
        let segments = vec![EdgeSegment {
            mandatory,
            base: (base_min.clone(), base_max.clone()),
            quote: (quote_min.clone(), quote_max.clone()),
            gross_base: (gross_base_min.clone(), gross_base_max.clone()),
        }];

        Ok(GraphEdge {
            from,
            to,
            side: order.side,
            order,
            effective_rate,
            base_capacity: (base_min, base_max),
            quote_capacity: (quote_min, quote_max),
            gross_base_capacity: (gross_base_min, gross_base_max),
            segments,
        })
    }

    /// The capacity range in the currency the edge is traversed *from*.
    pub fn source_capacity(&self) -> &(Money, Money) {
        match self.side {
            Side::Buy => &self.gross_base_capacity,
            Side::Sell => &self.quote_capacity,
        }
    }

    /// The capacity range in the currency the edge is traversed *to*.
    pub fn target_capacity(&self) -> &(Money, Money) {
        match self.side {
            Side::Buy => &self.quote_capacity,
            Side::Sell => &self.base_capacity,
        }
    }

    /// The mandatory segment's source-currency range, if the order's fee
    /// policy induces one; otherwise falls back to the full capacity.
    pub fn mandatory_source_range(&self) -> (Money, Money) {
        for segment in &self.segments {
            if segment.mandatory {
                return match self.side {
                    Side::Buy => segment.gross_base.clone(),
                    Side::Sell => segment.quote.clone(),
                };
            }
        }
        self.source_capacity().clone()
    }
}

/// A projection of the order book onto a directed graph, currencies as
/// nodes and orders as edges.
type ConversionGraph = DiGraph<Currency, GraphEdge>;

/// The conversion graph: a `petgraph::graph::DiGraph` of currencies, with a
/// side map from currency to `NodeIndex` since currencies don't already
/// carry a dense integer identity to index by.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    inner: ConversionGraph,
    index: HashMap<Currency, NodeIndex>,
}

/// Looks up `currency`'s node, adding it to both the graph and the index
/// on first sight.
fn node_index(
    inner: &mut ConversionGraph,
    index: &mut HashMap<Currency, NodeIndex>,
    currency: &Currency,
) -> NodeIndex {
    if let Some(&existing) = index.get(currency) {
        return existing;
    }
    let added = inner.add_node(currency.clone());
    index.insert(currency.clone(), added);
    added
}

impl Graph {
    /// Builds a graph from an order book, one edge per order. Self-edges
    /// (which cannot arise from a valid `Order`, since `AssetPair` forbids
    /// `base == quote`, but are skipped here all the same) are ignored.
    pub fn build(orders: &[Order]) -> Result<Self> {
        let mut inner = ConversionGraph::new();
        let mut index = HashMap::new();

        for order in orders {
            let edge = GraphEdge::build(Rc::new(order.clone()))?;
            if edge.from == edge.to {
                continue;
            }
            let from = node_index(&mut inner, &mut index, &edge.from);
            let to = node_index(&mut inner, &mut index, &edge.to);
            inner.add_edge(from, to, edge);
        }

        log::debug!(
            "built graph with {} nodes and {} edges",
            inner.node_count(),
            inner.edge_count()
        );

        Ok(Graph { inner, index })
    }

    pub fn has_node(&self, currency: &Currency) -> bool {
        self.index.contains_key(currency)
    }

    /// The edges leaving `currency`, in the order `petgraph` stores them.
    pub fn edges_from(&self, currency: &Currency) -> Vec<GraphEdge> {
        match self.index.get(currency) {
            Some(&node) => self.inner.edges(node).map(|edge| edge.weight().clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Returns a graph with every edge whose order identity is in
    /// `excluded` removed.
    pub fn without_orders(&self, excluded: &HashSet<OrderId>) -> Graph {
        let mut inner = ConversionGraph::new();
        let mut index = HashMap::new();
        for edge_ref in self.inner.edge_references() {
            let edge = edge_ref.weight();
            if excluded.contains(&edge.order.id) {
                continue;
            }
            let from = node_index(&mut inner, &mut index, &edge.from);
            let to = node_index(&mut inner, &mut index, &edge.to);
            inner.add_edge(from, to, edge.clone());
        }
        Graph { inner, index }
    }

    /// Returns a graph where each edge's effective rate is multiplicatively
    /// penalized by `(1 - penalty)^usage[order]`, worsening repeatedly-used
    /// orders without removing them from consideration.
    pub fn with_order_penalties(
        &self,
        usage: &HashMap<OrderId, u32>,
        penalty: Decimal,
    ) -> Result<Graph> {
        let retained = Decimal::one().sub(&penalty, CANONICAL_SCALE)?;
        let mut inner = ConversionGraph::new();
        let mut index = HashMap::new();
        for edge_ref in self.inner.edge_references() {
            let edge = edge_ref.weight();
            let count = usage.get(&edge.order.id).copied().unwrap_or(0);
            let mut new_edge = edge.clone();
            if count > 0 {
                new_edge.effective_rate = edge
                    .effective_rate
                    .mul(&retained.powu(count, CANONICAL_SCALE)?, CANONICAL_SCALE)?;
            }
            let from = node_index(&mut inner, &mut index, &new_edge.from);
            let to = node_index(&mut inner, &mut index, &new_edge.to);
            inner.add_edge(from, to, new_edge);
        }
        Ok(Graph { inner, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> Currency {
        Currency::new("USD").unwrap()
    }
    fn btc() -> Currency {
        Currency::new("BTC").unwrap()
    }

    fn sell_order(id: usize) -> Order {
        crate::test_support::order(id, Side::Sell, usd(), btc(), "0.000033", "10", "10000")
    }

    #[test]
    fn build_indexes_edges_by_from_currency() {
        let orders = vec![sell_order(0)];
        let graph = Graph::build(&orders).unwrap();
        assert!(graph.has_node(&usd()));
        assert!(graph.has_node(&btc()));
        assert_eq!(graph.edges_from(&btc()).len(), 1);
        assert_eq!(graph.edges_from(&usd()).len(), 0);
    }

    #[test]
    fn without_orders_removes_matching_edges() {
        let orders = vec![sell_order(0), sell_order(1)];
        let graph = Graph::build(&orders).unwrap();
        let mut excluded = HashSet::new();
        excluded.insert(OrderId(0));
        let filtered = graph.without_orders(&excluded);
        assert_eq!(filtered.edges_from(&btc()).len(), 1);
        assert_eq!(filtered.edges_from(&btc())[0].order.id, OrderId(1));
    }

    #[test]
    fn with_order_penalties_worsens_rate_multiplicatively() {
        let orders = vec![sell_order(0)];
        let graph = Graph::build(&orders).unwrap();
        let mut usage = HashMap::new();
        usage.insert(OrderId(0), 2u32);
        let penalized = graph
            .with_order_penalties(&usage, Decimal::parse("0.15").unwrap())
            .unwrap();

        let original = graph.edges_from(&btc())[0].effective_rate;
        let worsened = penalized.edges_from(&btc())[0].effective_rate;
        assert!(worsened.cmp_value(&original) == std::cmp::Ordering::Less);
    }
}
