#![deny(clippy::unreadable_literal)]

mod clock;
mod decimal;
mod error;
mod graph;
mod guard;
mod materialize;
mod money;
mod moneymap;
mod orchestrator;
mod order;
mod ordering;
mod request;
mod result;
mod search;
#[cfg(test)]
mod test_support;
mod tolerance;

pub use crate::clock::{Clock, MonotonicClock};
pub use crate::decimal::{Decimal, CANONICAL_SCALE, MAX_SCALE};
pub use crate::error::{Error, Result};
pub use crate::graph::{EdgeSegment, Graph, GraphEdge};
pub use crate::guard::GuardReport;
pub use crate::materialize::{resolve_buy_fill, resolve_sell_leg_amounts, MaterializedLeg, MaterializedPath};
pub use crate::money::{AssetPair, Currency, ExchangeRate, Money};
pub use crate::moneymap::MoneyMap;
pub use crate::orchestrator::{find_execution_plans, find_execution_plans_with_clock, find_paths, find_paths_with_clock};
pub use crate::order::{FeeBreakdown, FeePolicy, Order, OrderBook, OrderBounds, OrderId, Side};
pub use crate::request::{HopLimits, PathSearchConfig, PathSearchConfigBuilder, PathSearchRequest, ToleranceWindow};
pub use crate::result::{ExecutionPlan, ExecutionStep, PathLeg, PathResult, SearchOutcome};
pub use crate::search::{CandidatePath, SearchEngine};
pub use crate::tolerance::DecimalTolerance;

/// API entry point: snapshot an order book once, then run as many path or
/// execution-plan searches against it as needed without re-validating or
/// re-indexing the book per call.
#[derive(Clone, Debug)]
pub struct OrderPath {
    order_book: OrderBook,
}

impl OrderPath {
    /// Takes ownership of a snapshot of orders. `OrderId`s are whatever the
    /// caller already assigned them; this crate never reassigns identity.
    pub fn new(order_book: impl IntoIterator<Item = Order>) -> Self {
        OrderPath {
            order_book: order_book.into_iter().collect(),
        }
    }

    /// The order book this instance was built from.
    pub fn order_book(&self) -> &[Order] {
        &self.order_book
    }

    /// Runs the linear Path Orchestrator (C8) against this book.
    pub fn find_paths(
        &self,
        config: PathSearchConfig,
        source: impl AsRef<str>,
        target: impl AsRef<str>,
    ) -> Result<SearchOutcome<PathResult>> {
        let request = PathSearchRequest::new(self.order_book.clone(), config, source, target)?;
        orchestrator::find_paths(&request)
    }

    /// Runs the Execution Plan Orchestrator (C9) against this book, in
    /// whichever mode `config.disjoint_plans` selects.
    pub fn find_execution_plans(
        &self,
        config: PathSearchConfig,
        source: impl AsRef<str>,
        target: impl AsRef<str>,
    ) -> Result<SearchOutcome<ExecutionPlan>> {
        let request = PathSearchRequest::new(self.order_book.clone(), config, source, target)?;
        orchestrator::find_execution_plans(&request)
    }
}
