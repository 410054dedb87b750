//! Best-first path search over the conversion graph (C4).
//!
//! The engine itself never materializes concrete amounts or evaluates
//! residual tolerance — both are delegated to the caller's acceptance
//! callback (see `orchestrator`), which runs leg materialization (C5) and
//! the tolerance evaluator (C6) and hands back whatever value `T` the
//! orchestrator wants recorded as a result. The engine only knows how to
//! rank candidate edge sequences and keep the best `K` of whatever the
//! callback accepts.

use crate::clock::Clock;
use crate::decimal::{Decimal, CANONICAL_SCALE};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphEdge};
use crate::guard::GuardReport;
use crate::money::{Currency, Money};
use crate::order::Side;
use crate::ordering::{BoundedResultSet, OrderKey};
use crate::request::PathSearchConfig;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// A candidate route the search has reached `target` with: an edge
/// sequence plus the cost/product bookkeeping and spend-range tracking
/// that produced it.
#[derive(Clone, Debug)]
pub struct CandidatePath {
    pub cost: Decimal,
    pub product: Decimal,
    pub hops: u32,
    pub edges: Vec<GraphEdge>,
    pub range: Option<(Money, Money)>,
    pub desired: Option<Money>,
}

impl CandidatePath {
    /// The node sequence this path visits, source to target.
    pub fn route(&self) -> Vec<Currency> {
        let mut route = Vec::with_capacity(self.edges.len() + 1);
        match self.edges.first() {
            Some(first) => route.push(first.from.clone()),
            None => return route,
        }
        for edge in &self.edges {
            route.push(edge.to.clone());
        }
        route
    }

    pub fn route_signature(&self) -> String {
        route_signature(&self.edges)
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "buy",
        Side::Sell => "sell",
    }
}

/// Canonical node+side+order-identity signature, used both as the
/// tie-break key and as the final route-dedup key.
fn route_signature(edges: &[GraphEdge]) -> String {
    let mut parts = Vec::with_capacity(edges.len() + 1);
    match edges.first() {
        Some(first) => parts.push(format!("node:{}", first.from.as_str())),
        None => return "node:".to_string(),
    }
    for edge in edges {
        parts.push(format!(
            "{}:{}:{}",
            edge.to.as_str(),
            side_label(edge.side),
            edge.order.id.0
        ));
    }
    parts.join("|")
}

/// Per-(node, signature) dominance record.
#[derive(Clone, Copy, Debug)]
struct StateRecord {
    cost: Decimal,
    hops: u32,
}

impl StateRecord {
    fn dominates(&self, other: &StateRecord) -> bool {
        self.cost.cmp_value(&other.cost) != Ordering::Greater && self.hops <= other.hops
    }
}

/// Labeled-segment signature over the active spend range and desired
/// amount, used for per-node dominance bookkeeping.
fn state_signature(range: &Option<(Money, Money)>, desired: &Option<Money>) -> String {
    let mut parts = Vec::with_capacity(3);
    match range {
        Some((min, max)) => {
            parts.push(format!(
                "rmin:{}:{}:{}",
                min.currency().as_str(),
                min.amount(),
                min.scale()
            ));
            parts.push(format!(
                "rmax:{}:{}:{}",
                max.currency().as_str(),
                max.amount(),
                max.scale()
            ));
        }
        None => parts.push("range:none".to_string()),
    }
    match desired {
        Some(d) => parts.push(format!(
            "desired:{}:{}:{}",
            d.currency().as_str(),
            d.amount(),
            d.scale()
        )),
        None => parts.push("desired:none".to_string()),
    }
    parts.join("|")
}

struct SearchState {
    node: Currency,
    cost: Decimal,
    product: Decimal,
    hops: u32,
    edges: Vec<GraphEdge>,
    range: Option<(Money, Money)>,
    desired: Option<Money>,
    visited: Rc<HashSet<Currency>>,
    key: OrderKey,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for SearchState {}
impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// `tgt_min + (value - src_min) / (src_max - src_min) * (tgt_max - tgt_min)`,
/// degenerating to `tgt_min` when the source range is a single point.
fn linear_map(
    value: Decimal,
    src_min: Decimal,
    src_max: Decimal,
    tgt_min: Decimal,
    tgt_max: Decimal,
    scale: u32,
) -> Result<Decimal> {
    if src_max.cmp_value(&src_min) != Ordering::Greater {
        return Ok(tgt_min);
    }
    let fraction = value.sub(&src_min, scale)?.div(&src_max.sub(&src_min, scale)?, scale)?;
    let span = tgt_max.sub(&tgt_min, scale)?;
    tgt_min.add(&fraction.mul(&span, scale)?, scale)
}

/// Intersects `range` with `edge`'s mandatory-segment-aware source
/// capacity, then projects the intersection into the target currency via
/// a linear map across the edge's (source min, max) -> (target min, max).
/// Returns `None` when the intersection is empty.
fn project_range(
    edge: &GraphEdge,
    range: &(Money, Money),
) -> Result<Option<(Money, Money)>> {
    let (cap_min, cap_max) = edge.mandatory_source_range();
    let (state_min, state_max) = range;
    if cap_min.currency() != state_min.currency() {
        return Err(Error::Input(format!(
            "spend range currency {} does not match edge capacity currency {}",
            state_min.currency(),
            cap_min.currency()
        )));
    }

    let inter_min = if state_min.amount().cmp_value(&cap_min.amount()) == Ordering::Less {
        cap_min.amount()
    } else {
        state_min.amount()
    };
    let inter_max = if state_max.amount().cmp_value(&cap_max.amount()) == Ordering::Greater {
        cap_max.amount()
    } else {
        state_max.amount()
    };
    if inter_min.cmp_value(&inter_max) == Ordering::Greater {
        return Ok(None);
    }

    let (tgt_min, tgt_max) = edge.target_capacity();
    let scale = CANONICAL_SCALE;
    let mapped_min = linear_map(inter_min, cap_min.amount(), cap_max.amount(), tgt_min.amount(), tgt_max.amount(), scale)?;
    let mapped_max = linear_map(inter_max, cap_min.amount(), cap_max.amount(), tgt_min.amount(), tgt_max.amount(), scale)?;
    let (lo, hi) = if mapped_min.cmp_value(&mapped_max) == Ordering::Greater {
        (mapped_max, mapped_min)
    } else {
        (mapped_min, mapped_max)
    };

    Ok(Some((
        Money::new(lo, edge.to.clone())?,
        Money::new(hi, edge.to.clone())?,
    )))
}

/// Clamps `desired` into the edge's intersected source range (recomputed
/// here rather than threaded through, since it is cheap relative to a
/// `Decimal` division), then maps it through the same linear map.
fn project_desired(edge: &GraphEdge, desired: &Money, range: &(Money, Money)) -> Result<Money> {
    let (cap_min, cap_max) = edge.mandatory_source_range();
    let (state_min, state_max) = range;
    let inter_min = if state_min.amount().cmp_value(&cap_min.amount()) == Ordering::Less {
        cap_min.amount()
    } else {
        state_min.amount()
    };
    let inter_max = if state_max.amount().cmp_value(&cap_max.amount()) == Ordering::Greater {
        cap_max.amount()
    } else {
        state_max.amount()
    };
    let clamped = if desired.amount().cmp_value(&inter_min) == Ordering::Less {
        inter_min
    } else if desired.amount().cmp_value(&inter_max) == Ordering::Greater {
        inter_max
    } else {
        desired.amount()
    };

    let (tgt_min, tgt_max) = edge.target_capacity();
    let mapped = linear_map(
        clamped,
        cap_min.amount(),
        cap_max.amount(),
        tgt_min.amount(),
        tgt_max.amount(),
        CANONICAL_SCALE,
    )?;
    Money::new(mapped, edge.to.clone())
}

/// Best-first search over a fixed [`Graph`], parameterized by the clock
/// used for wall-clock guard checks.
pub struct SearchEngine<'g, 'c, C: Clock> {
    graph: &'g Graph,
    clock: &'c C,
}

impl<'g, 'c, C: Clock> SearchEngine<'g, 'c, C> {
    pub fn new(graph: &'g Graph, clock: &'c C) -> Self {
        SearchEngine { graph, clock }
    }

    /// Runs the search from `source` to `target`. `accept` is invoked once
    /// per candidate that reaches `target` within `hopLimits`; returning
    /// `Ok(Some(value))` records `value` as a ranked result (subject to the
    /// `resultLimit`-bounded Top-K set), `Ok(None)` rejects the candidate
    /// without affecting the search, and `Err` aborts the search
    /// immediately (input/precision errors propagate per the error model).
    ///
    /// Missing `source` or `target` nodes yield an empty result set, not
    /// an error.
    pub fn run<T: Clone>(
        &self,
        source: &Currency,
        target: &Currency,
        config: &PathSearchConfig,
        mut accept: impl FnMut(&CandidatePath) -> Result<Option<T>>,
    ) -> Result<(Vec<T>, GuardReport)> {
        let started = self.clock.now();
        let mut guard = GuardReport {
            expansion_limit: config.max_expansions,
            visited_state_limit: config.max_visited_states,
            time_budget_limit: config.time_budget_ms,
            ..GuardReport::default()
        };

        if !self.graph.has_node(source) || !self.graph.has_node(target) {
            return Ok((Vec::new(), guard));
        }

        let tolerance = config.tolerance_window.heuristic(CANONICAL_SCALE)?;
        let one = Decimal::one().with_scale(CANONICAL_SCALE)?;
        let retained = one.sub(&tolerance, CANONICAL_SCALE)?;

        let spend = &config.spend_amount;
        let lower_factor = one.sub(&config.tolerance_window.min(), CANONICAL_SCALE)?;
        let upper_factor = one.add(&config.tolerance_window.max(), CANONICAL_SCALE)?;
        let range_min = Money::new(spend.amount().mul(&lower_factor, CANONICAL_SCALE)?, spend.currency().clone())?;
        let range_max = Money::new(spend.amount().mul(&upper_factor, CANONICAL_SCALE)?, spend.currency().clone())?;
        let initial_range: Option<(Money, Money)> = Some((range_min, range_max));
        let initial_desired: Option<Money> = Some(spend.clone());

        let mut insertion_counter: u64 = 0;
        let initial_key = OrderKey::new(one, 0, route_signature(&[]), insertion_counter);
        insertion_counter += 1;

        let mut visited = HashSet::new();
        visited.insert(source.clone());

        let mut heap: BinaryHeap<Reverse<SearchState>> = BinaryHeap::new();
        heap.push(Reverse(SearchState {
            node: source.clone(),
            cost: one,
            product: one,
            hops: 0,
            edges: Vec::new(),
            range: initial_range.clone(),
            desired: initial_desired.clone(),
            visited: Rc::new(visited),
            key: initial_key,
        }));

        let mut records: HashMap<(Currency, String), Vec<StateRecord>> = HashMap::new();
        records
            .entry((source.clone(), state_signature(&initial_range, &initial_desired)))
            .or_default()
            .push(StateRecord { cost: one, hops: 0 });
        let mut visited_state_count: u64 = 1;

        let mut best_target_cost: Option<Decimal> = None;
        let mut results: BoundedResultSet<T> = BoundedResultSet::new(config.result_limit);

        'main: while let Some(Reverse(state)) = heap.pop() {
            if let Some(budget_ms) = config.time_budget_ms {
                let elapsed = self.clock.now().duration_since(started);
                if elapsed >= Duration::from_millis(budget_ms) {
                    log::warn!("search time budget of {}ms reached after {} expansions", budget_ms, guard.expansions);
                    guard.time_budget_reached = true;
                    break 'main;
                }
            }
            if guard.expansions >= config.max_expansions {
                log::warn!("search expansion limit of {} reached", config.max_expansions);
                guard.expansions_reached = true;
                break 'main;
            }
            guard.expansions += 1;

            if state.node == *target {
                if state.hops >= config.hop_limits.min_hops {
                    let candidate = CandidatePath {
                        cost: state.cost,
                        product: state.product,
                        hops: state.hops,
                        edges: state.edges.clone(),
                        range: state.range.clone(),
                        desired: state.desired.clone(),
                    };
                    if let Some(value) = accept(&candidate)? {
                        best_target_cost = Some(match best_target_cost {
                            Some(existing) if existing.cmp_value(&state.cost) != Ordering::Greater => existing,
                            _ => state.cost,
                        });
                        results.offer(state.key.clone(), value);
                    }
                }
                continue;
            }

            if state.hops >= config.hop_limits.max_hops {
                continue;
            }

            for edge in &self.graph.edges_from(&state.node) {
                if state.visited.contains(&edge.to) {
                    continue;
                }
                if !edge.effective_rate.is_positive() {
                    continue;
                }

                let next_range = match &state.range {
                    Some(range) => match project_range(edge, range)? {
                        Some(r) => Some(r),
                        None => continue,
                    },
                    None => None,
                };
                let next_desired = match (&state.desired, &state.range) {
                    (Some(d), Some(range)) => Some(project_desired(edge, d, range)?),
                    (desired, None) => desired.clone(),
                    _ => None,
                };

                let next_cost = state.cost.div(&edge.effective_rate, CANONICAL_SCALE)?;
                let next_product = state.product.mul(&edge.effective_rate, CANONICAL_SCALE)?;
                let next_hops = state.hops + 1;

                let signature = state_signature(&next_range, &next_desired);
                let candidate_record = StateRecord {
                    cost: next_cost,
                    hops: next_hops,
                };
                let record_key = (edge.to.clone(), signature);

                if let Some(existing) = records.get(&record_key) {
                    if existing.iter().any(|r| r.dominates(&candidate_record)) {
                        continue;
                    }
                }

                let is_new_key = !records.contains_key(&record_key);
                if is_new_key && visited_state_count >= config.max_visited_states {
                    if !guard.visited_states_reached {
                        log::warn!("search visited-state limit of {} reached", config.max_visited_states);
                    }
                    guard.visited_states_reached = true;
                    continue;
                }

                if let Some(best) = best_target_cost {
                    let max_allowed = if tolerance.is_zero() {
                        best
                    } else {
                        best.div(&retained, CANONICAL_SCALE)?
                    };
                    if next_cost.cmp_value(&max_allowed) == Ordering::Greater {
                        continue;
                    }
                }

                let bucket = records.entry(record_key).or_default();
                if bucket.is_empty() {
                    visited_state_count += 1;
                }
                bucket.retain(|r| !candidate_record.dominates(r));
                bucket.push(candidate_record);

                let mut next_visited = (*state.visited).clone();
                next_visited.insert(edge.to.clone());

                let next_route_signature = format!(
                    "{}|{}:{}:{}",
                    state.key.route_signature,
                    edge.to.as_str(),
                    side_label(edge.side),
                    edge.order.id.0
                );
                let mut next_edges = state.edges.clone();
                next_edges.push(edge.clone());

                let key = OrderKey::new(next_cost, next_hops, next_route_signature, insertion_counter);
                insertion_counter += 1;

                heap.push(Reverse(SearchState {
                    node: edge.to.clone(),
                    cost: next_cost,
                    product: next_product,
                    hops: next_hops,
                    edges: next_edges,
                    range: next_range,
                    desired: next_desired,
                    visited: Rc::new(next_visited),
                    key,
                }));
            }
        }

        guard.elapsed_milliseconds = self.clock.now().duration_since(started).as_secs_f64() * 1000.0;

        if config.throw_on_guard_limit && guard.any() {
            return Err(Error::Guard(guard));
        }

        Ok((results.into_sorted_values(), guard))
    }
}
