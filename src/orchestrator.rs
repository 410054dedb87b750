//! Orchestration: wires the search engine (C4), leg materializer (C5), and
//! tolerance evaluator (C6) into the two entry points this crate exposes —
//! a single best-effort linear path search (C8) and a multi-plan search
//! that can run disjoint or reusable across iterations (C9).

use crate::clock::{Clock, MonotonicClock};
use crate::decimal::{Decimal, CANONICAL_SCALE};
use crate::error::Result;
use crate::graph::Graph;
use crate::guard::GuardReport;
use crate::materialize::{materialize_path, MaterializedPath};
use crate::money::{Currency, Money};
use crate::order::OrderId;
use crate::request::{PathSearchConfig, PathSearchRequest};
use crate::result::{ExecutionPlan, PathResult, SearchOutcome};
use crate::search::{CandidatePath, SearchEngine};
use crate::tolerance::{self, DecimalTolerance};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A materialized, tolerance-accepted candidate still carrying the
/// bookkeeping (`route_signature`, per-leg order identities via
/// `materialized`) that the external `PathResult`/`ExecutionPlan` types
/// deliberately don't expose.
#[derive(Clone)]
struct Accepted {
    materialized: MaterializedPath,
    tolerance: DecimalTolerance,
    cost: Decimal,
    route_signature: String,
}

fn materialize_and_evaluate(
    candidate: &CandidatePath,
    config: &PathSearchConfig,
) -> Result<Option<Accepted>> {
    let materialized = match materialize_path(&candidate.edges, &config.spend_amount)? {
        Some(m) => m,
        None => return Ok(None),
    };
    let accepted = tolerance::evaluate(
        &config.spend_amount,
        &materialized.total_spent,
        &config.tolerance_window,
    )?;
    match accepted {
        Some(tol) => Ok(Some(Accepted {
            route_signature: candidate.route_signature(),
            materialized,
            tolerance: tol,
            cost: candidate.cost,
        })),
        None => Ok(None),
    }
}

fn spend_upper_bound(config: &PathSearchConfig) -> Result<Money> {
    let factor = Decimal::one()
        .with_scale(CANONICAL_SCALE)?
        .add(&config.tolerance_window.max(), CANONICAL_SCALE)?;
    Money::new(
        config.spend_amount.amount().mul(&factor, CANONICAL_SCALE)?,
        config.spend_amount.currency().clone(),
    )
}

/// Orders that leave `source` directly but whose minimum fill already
/// exceeds the widest spend this request could ever commit are dropped
/// before search: they can never be entered from this seed amount.
fn incompatible_orders(graph: &Graph, source: &Currency, upper_bound: &Money) -> HashSet<OrderId> {
    let mut excluded = HashSet::new();
    for edge in graph.edges_from(source) {
        let (min, _) = edge.source_capacity();
        if min.currency() == upper_bound.currency()
            && min.amount().cmp_value(&upper_bound.amount()) == Ordering::Greater
        {
            excluded.insert(edge.order.id);
        }
    }
    excluded
}

fn compatible_graph(request: &PathSearchRequest) -> Result<Graph> {
    let graph = Graph::build(&request.order_book)?;
    let upper_bound = spend_upper_bound(&request.config)?;
    let excluded = incompatible_orders(&graph, &request.source, &upper_bound);
    Ok(if excluded.is_empty() {
        graph
    } else {
        graph.without_orders(&excluded)
    })
}

/// Runs the linear Path Orchestrator (C8) with the real monotonic clock.
pub fn find_paths(request: &PathSearchRequest) -> Result<SearchOutcome<PathResult>> {
    find_paths_with_clock(request, &MonotonicClock)
}

/// As [`find_paths`], but with an injectable clock (for deterministic guard
/// tests).
pub fn find_paths_with_clock<C: Clock>(
    request: &PathSearchRequest,
    clock: &C,
) -> Result<SearchOutcome<PathResult>> {
    let config = &request.config;
    let graph = compatible_graph(request)?;
    let engine = SearchEngine::new(&graph, clock);

    let (accepted, guard) = engine.run(&request.source, &request.target, config, |candidate| {
        materialize_and_evaluate(candidate, config)
    })?;

    let results = accepted
        .into_iter()
        .map(|a| PathResult::from_materialized(&a.materialized, a.cost, a.tolerance))
        .collect::<Result<Vec<_>>>()?;
    Ok(SearchOutcome::new(results, guard))
}

const REUSABLE_PENALTY_BPS: i64 = 15_00; // 0.15 at scale 4

/// Runs the Execution Plan Orchestrator (C9): up to `request.config.result_limit`
/// plans, found by running C4 repeatedly against a graph that evolves
/// between iterations. `request.config.disjoint_plans` picks the mode:
/// `true` removes an accepted plan's orders from the graph before the next
/// iteration, `false` keeps every order available but penalizes it by use.
pub fn find_execution_plans(request: &PathSearchRequest) -> Result<SearchOutcome<ExecutionPlan>> {
    find_execution_plans_with_clock(request, &MonotonicClock)
}

pub fn find_execution_plans_with_clock<C: Clock>(
    request: &PathSearchRequest,
    clock: &C,
) -> Result<SearchOutcome<ExecutionPlan>> {
    if request.config.disjoint_plans {
        disjoint_plans(request, clock)
    } else {
        reusable_plans(request, clock)
    }
}

fn single_result_config(config: &PathSearchConfig) -> PathSearchConfig {
    PathSearchConfig {
        result_limit: 1,
        ..config.clone()
    }
}

fn starting_guard(config: &PathSearchConfig) -> GuardReport {
    GuardReport {
        expansion_limit: config.max_expansions,
        visited_state_limit: config.max_visited_states,
        time_budget_limit: config.time_budget_ms,
        ..GuardReport::default()
    }
}

fn disjoint_plans<C: Clock>(
    request: &PathSearchRequest,
    clock: &C,
) -> Result<SearchOutcome<ExecutionPlan>> {
    let config = &request.config;
    let k = config.result_limit.max(1);
    let per_iteration = single_result_config(config);
    let mut graph = compatible_graph(request)?;
    let mut plans = Vec::new();
    let mut guard = starting_guard(config);

    for iteration in 0..k {
        log::trace!("disjoint plan search iteration {} of {}", iteration + 1, k);
        let engine = SearchEngine::new(&graph, clock);
        let (mut accepted, iter_guard) =
            engine.run(&request.source, &request.target, &per_iteration, |candidate| {
                materialize_and_evaluate(candidate, config)
            })?;
        guard.merge(&iter_guard);

        let plan = match accepted.pop() {
            Some(plan) => plan,
            None => {
                log::debug!("disjoint plan search exhausted after {} plan(s)", plans.len());
                break;
            }
        };

        let used: HashSet<OrderId> = plan
            .materialized
            .legs
            .iter()
            .map(|leg| leg.order_id)
            .collect();
        plans.push(ExecutionPlan::from_materialized(
            &plan.materialized,
            plan.cost,
            plan.tolerance,
        )?);
        graph = graph.without_orders(&used);

        if guard.any() {
            log::debug!("disjoint plan search stopped early on guard breach after {} plan(s)", plans.len());
            break;
        }
    }

    Ok(SearchOutcome::new(plans, guard))
}

fn reusable_plans<C: Clock>(
    request: &PathSearchRequest,
    clock: &C,
) -> Result<SearchOutcome<ExecutionPlan>> {
    let config = &request.config;
    let k = config.result_limit.max(1);
    let per_iteration = single_result_config(config);
    let original_graph = compatible_graph(request)?;
    let penalty = Decimal::from_scaled(REUSABLE_PENALTY_BPS, 4)?;

    let mut usage: HashMap<OrderId, u32> = HashMap::new();
    let mut accepted_signatures: HashSet<String> = HashSet::new();
    let mut accepted_costs: Vec<Decimal> = Vec::new();
    let mut plans = Vec::new();
    let mut guard = starting_guard(config);
    let mut consecutive_duplicates: u32 = 0;
    let max_iterations = k.saturating_mul(2);

    for iteration in 0..max_iterations {
        if plans.len() >= k || consecutive_duplicates as usize >= k {
            log::debug!(
                "reusable plan search stopping after {} plan(s), {} consecutive duplicate(s)",
                plans.len(),
                consecutive_duplicates
            );
            break;
        }

        log::trace!("reusable plan search iteration {} of {}", iteration + 1, max_iterations);
        let penalized = original_graph.with_order_penalties(&usage, penalty)?;
        let engine = SearchEngine::new(&penalized, clock);
        let (mut accepted, iter_guard) =
            engine.run(&request.source, &request.target, &per_iteration, |candidate| {
                materialize_and_evaluate(candidate, config)
            })?;
        guard.merge(&iter_guard);

        let plan = match accepted.pop() {
            Some(plan) => plan,
            None => {
                log::debug!("reusable plan search exhausted after {} plan(s)", plans.len());
                break;
            }
        };

        let is_duplicate = accepted_signatures.contains(&plan.route_signature)
            || accepted_costs
                .iter()
                .any(|cost| cost.cmp_value(&plan.cost) == Ordering::Equal);

        if is_duplicate {
            consecutive_duplicates += 1;
            for leg in &plan.materialized.legs {
                *usage.entry(leg.order_id).or_insert(0) += 1;
            }
            if guard.any() {
                log::debug!("reusable plan search stopped early on guard breach after {} plan(s)", plans.len());
                break;
            }
            continue;
        }

        consecutive_duplicates = 0;
        accepted_signatures.insert(plan.route_signature.clone());
        accepted_costs.push(plan.cost);
        plans.push(ExecutionPlan::from_materialized(
            &plan.materialized,
            plan.cost,
            plan.tolerance,
        )?);

        if guard.any() {
            log::debug!("reusable plan search stopped early on guard breach after {} plan(s)", plans.len());
            break;
        }
    }

    Ok(SearchOutcome::new(plans, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::money::{AssetPair, Currency as Cur, ExchangeRate};
    use crate::order::{Order, OrderBounds, OrderId as Oid, Side};
    use crate::request::{HopLimits, ToleranceWindow};

    fn cur(code: &str) -> Cur {
        Cur::new(code).unwrap()
    }
    fn money(amount: &str, currency: Cur) -> Money {
        Money::new(Decimal::parse(amount).unwrap(), currency).unwrap()
    }

    // `Side::Buy` gives `From = base, To = quote`.
    fn buy_order(id: usize, base: Cur, quote: Cur, rate: &str, min: &str, max: &str) -> Order {
        let pair = AssetPair::new(base.clone(), quote.clone()).unwrap();
        let bounds = OrderBounds::new(money(min, base.clone()), money(max, base)).unwrap();
        let rate = ExchangeRate::new(Decimal::parse(rate).unwrap(), pair.base.clone(), pair.quote.clone()).unwrap();
        Order::new(Oid(id), Side::Buy, pair, bounds, rate, None).unwrap()
    }

    fn request(
        orders: Vec<Order>,
        spend: Money,
        result_limit: usize,
        disjoint_plans: bool,
    ) -> PathSearchRequest {
        let config = PathSearchConfig::builder(spend)
            .hop_limits(HopLimits::new(1, 3).unwrap())
            .tolerance_window(ToleranceWindow::new(Decimal::zero(), Decimal::parse("0.1").unwrap()).unwrap())
            .result_limit(result_limit)
            .disjoint_plans(disjoint_plans)
            .build()
            .unwrap();
        PathSearchRequest::new(orders, config, "USD", "BTC").unwrap()
    }

    #[test]
    fn find_paths_accepts_a_direct_route_within_tolerance() {
        let orders = vec![buy_order(0, cur("USD"), cur("BTC"), "0.000033", "10", "10000")];
        let request = request(orders, money("100", cur("USD")), 1, true);
        let clock = FakeClock::new();

        let outcome = find_paths_with_clock(&request, &clock).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].route, vec![cur("USD"), cur("BTC")]);
        assert!(!outcome.guard_report.any());
    }

    #[test]
    fn find_paths_drops_orders_whose_minimum_exceeds_spend_capacity() {
        let orders = vec![buy_order(0, cur("USD"), cur("BTC"), "0.000033", "10000000", "20000000")];
        let request = request(orders, money("100", cur("USD")), 1, true);
        let clock = FakeClock::new();

        let outcome = find_paths_with_clock(&request, &clock).unwrap();
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn disjoint_plans_never_reuse_an_order_identity() {
        let orders = vec![
            buy_order(0, cur("USD"), cur("BTC"), "0.000033", "10", "10000"),
            buy_order(1, cur("USD"), cur("BTC"), "0.00003", "10", "10000"),
        ];
        let request = request(orders, money("100", cur("USD")), 2, true);
        let clock = FakeClock::new();

        let outcome = find_execution_plans_with_clock(&request, &clock).unwrap();
        assert_eq!(outcome.results.len(), 2);

        let mut seen_received = HashSet::new();
        for plan in &outcome.results {
            assert_eq!(plan.steps.len(), 1);
            seen_received.insert(plan.total_received.to_string());
        }
        assert_eq!(seen_received.len(), 2);
    }

    #[test]
    fn reusable_plans_stop_once_duplicates_dominate() {
        let orders = vec![buy_order(0, cur("USD"), cur("BTC"), "0.000033", "10", "10000")];
        let request = request(orders, money("100", cur("USD")), 3, false);
        let clock = FakeClock::new();

        let outcome = find_execution_plans_with_clock(&request, &clock).unwrap();
        // A single order can only ever produce one distinct route/cost, so
        // the very first repeat trips the consecutive-duplicate stop.
        assert_eq!(outcome.results.len(), 1);
    }
}
