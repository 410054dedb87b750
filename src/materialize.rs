//! Leg materialization (C5): turns an abstract edge sequence plus a spend
//! seed into concrete per-hop amounts, under order bounds and fee policies.
//!
//! Both resolution methods are bounded fixpoint iterations rather than
//! closed-form solves, because a fee policy can make the gross spend a
//! function of the very candidate amount being solved for.

use crate::decimal::{Decimal, CANONICAL_SCALE};
use crate::error::Result;
use crate::graph::GraphEdge;
use crate::money::Money;
use crate::moneymap::MoneyMap;
use crate::order::{FeeBreakdown, Order, OrderId, Side};
use std::cmp::Ordering;

const RELATIVE_CONVERGENCE_TOLERANCE_SCALE: u32 = 6;
const BUY_FILL_MAX_ITERATIONS: u32 = 12;
const SELL_FILL_MAX_ITERATIONS: u32 = 16;

/// One materialized hop.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializedLeg {
    pub order_id: OrderId,
    pub side: Side,
    pub from: crate::money::Currency,
    pub to: crate::money::Currency,
    pub spent: Money,
    pub received: Money,
    pub fees: FeeBreakdown,
}

/// A fully materialized path: the concrete amounts for every leg plus the
/// aggregated fee map.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializedPath {
    pub legs: Vec<MaterializedLeg>,
    pub total_spent: Money,
    pub total_received: Money,
    pub fee_breakdown: MoneyMap,
}

fn relative_tolerance() -> Result<Decimal> {
    Decimal::from_scaled(1, RELATIVE_CONVERGENCE_TOLERANCE_SCALE)
}

fn fill_buy(order: &Order, net: &Money, scale: u32) -> Result<(Money, Money, FeeBreakdown)> {
    let gross = order.calculate_gross_base_spend(net, scale)?;
    let quote = order.calculate_effective_quote_amount(net, scale)?;
    let fees = match &order.fee_policy {
        Some(policy) => {
            let raw_quote = order.calculate_quote_amount(net, scale)?;
            policy.calculate(order.side, net, &raw_quote)?
        }
        None => FeeBreakdown::none(),
    };
    Ok((gross, quote, fees))
}

/// Resolves a Buy-side fill: finds the largest base amount (within order
/// bounds) whose gross base spend (base + base fee) does not exceed
/// `gross_ceiling`, starting from `net_seed` and backing off by the
/// ceiling/gross ratio each time the ceiling is exceeded.
///
/// Returns `(grossBase, quote, fees, netBase)`, or `None` if no such
/// amount exists within [`BUY_FILL_MAX_ITERATIONS`] iterations.
pub fn resolve_buy_fill(
    order: &Order,
    net_seed: &Money,
    gross_ceiling: &Money,
) -> Result<Option<(Money, Money, FeeBreakdown, Money)>> {
    let scale = CANONICAL_SCALE;

    let (min_gross, _, _) = fill_buy(order, order.bounds.min(), scale)?;
    if min_gross.amount().cmp_value(&gross_ceiling.amount()) == Ordering::Greater {
        return Ok(None);
    }

    let mut net_candidate = order.bounds.clamp(net_seed)?;
    for _ in 0..BUY_FILL_MAX_ITERATIONS {
        let (gross, quote, fees) = fill_buy(order, &net_candidate, scale)?;
        if gross.amount().cmp_value(&gross_ceiling.amount()) != Ordering::Greater {
            return Ok(Some((gross, quote, fees, net_candidate)));
        }

        let ratio = gross_ceiling.amount().div(&gross.amount(), scale.max(16))?;
        if ratio.is_zero() {
            return Ok(None);
        }
        let scaled = net_candidate.amount().mul(&ratio, scale)?;
        let next_candidate = order.bounds.clamp(&Money::new(scaled, net_candidate.currency().clone())?)?;
        if next_candidate == net_candidate {
            return Ok(None);
        }
        net_candidate = next_candidate;
    }
    Ok(None)
}

fn fill_sell(
    order: &Order,
    base: &Money,
    scale: u32,
) -> Result<(Money, Money, Money, FeeBreakdown)> {
    let raw_quote = order.calculate_quote_amount(base, scale)?;
    let effective_quote = order.calculate_effective_quote_amount(base, scale)?;
    let fees = match &order.fee_policy {
        Some(policy) => policy.calculate(order.side, base, &raw_quote)?,
        None => FeeBreakdown::none(),
    };
    let gross_quote = match &fees.quote_fee {
        Some(fee) => raw_quote.add(fee, scale)?,
        None => raw_quote,
    };
    let net_base = match &fees.base_fee {
        Some(fee) => base.sub(fee, scale)?,
        None => base.clone(),
    };
    Ok((gross_quote, effective_quote, net_base, fees))
}

/// Resolves a Sell-side fill: finds the base amount whose effective quote
/// converges (within `10^-6` relative tolerance) on `target_effective_quote`,
/// while respecting `available_budget` (the gross quote actually spent, if
/// given) and order bounds.
///
/// Returns `(grossQuote, netBase, fees)`, or `None` if convergence fails
/// within [`SELL_FILL_MAX_ITERATIONS`] iterations.
pub fn resolve_sell_leg_amounts(
    order: &Order,
    target_effective_quote: &Money,
    available_budget: Option<&Money>,
) -> Result<Option<(Money, Money, FeeBreakdown)>> {
    let scale = CANONICAL_SCALE;

    if order.fee_policy.is_none() {
        let base_amount = target_effective_quote.amount().div(&order.rate.rate(), scale)?;
        let base = Money::new(base_amount, order.pair.base.clone())?;
        if !order.bounds.contains(&base) {
            return Ok(None);
        }
        if let Some(budget) = available_budget {
            if target_effective_quote.amount().cmp_value(&budget.amount()) == Ordering::Greater {
                return Ok(None);
            }
        }
        return Ok(Some((target_effective_quote.clone(), base, FeeBreakdown::none())));
    }

    let tolerance = relative_tolerance()?;
    let inverted = order.rate.invert(scale)?;
    let seed_amount = inverted.convert(target_effective_quote, scale)?.amount();
    let mut base = order.bounds.clamp(&Money::new(seed_amount, order.pair.base.clone())?)?;
    let mut target = target_effective_quote.clone();

    let mut converged = false;
    let mut last = fill_sell(order, &base, scale)?;

    for _ in 0..SELL_FILL_MAX_ITERATIONS {
        last = fill_sell(order, &base, scale)?;
        let (gross_quote, effective_quote, _net_base, _fees) = &last;

        if let Some(budget) = available_budget {
            let ceiling = budget.amount().add(&budget.amount().mul(&tolerance, scale)?, scale)?;
            if gross_quote.amount().cmp_value(&ceiling) == Ordering::Greater {
                let ratio = budget.amount().div(&gross_quote.amount(), scale.max(16))?;
                if ratio.is_zero() {
                    return Ok(None);
                }
                let scaled_base = base.amount().mul(&ratio, scale)?;
                let next_base = order.bounds.clamp(&Money::new(scaled_base, order.pair.base.clone())?)?;
                if next_base == base {
                    return Ok(None);
                }
                let scaled_target = target.amount().mul(&ratio, scale)?;
                target = Money::new(scaled_target, target.currency().clone())?;
                base = next_base;
                continue;
            }
        }

        let diff = if effective_quote.amount().cmp_value(&target.amount()) == Ordering::Less {
            target.amount().sub(&effective_quote.amount(), scale)?
        } else {
            effective_quote.amount().sub(&target.amount(), scale)?
        };
        let relative = if target.amount().is_zero() {
            diff
        } else {
            diff.div(&target.amount().abs(), scale)?
        };
        if relative.cmp_value(&tolerance) != Ordering::Greater {
            converged = true;
            break;
        }

        let ratio = target.amount().div(&effective_quote.amount(), scale)?;
        let scaled_base = base.amount().mul(&ratio, scale)?;
        let next_base = order.bounds.clamp(&Money::new(scaled_base, order.pair.base.clone())?)?;
        if next_base == base {
            return Ok(None);
        }
        base = next_base;
    }

    if !converged || !order.bounds.contains(&base) {
        return Ok(None);
    }

    let (gross_quote, _effective_quote, net_base, fees) = last;
    Ok(Some((gross_quote, net_base, fees)))
}

/// Materializes a full edge sequence, chaining each leg's received amount
/// into the next leg's spend. Returns `None` (not an error) when any leg
/// fails to resolve — a candidate path with no feasible materialization.
pub fn materialize_path(edges: &[GraphEdge], spend_amount: &Money) -> Result<Option<MaterializedPath>> {
    if edges.is_empty() {
        return Ok(None);
    }
    if spend_amount.amount().is_zero() || spend_amount.currency() != &edges[0].from {
        return Ok(None);
    }
    for pair in edges.windows(2) {
        if pair[0].to != pair[1].from {
            return Ok(None);
        }
    }

    let mut current = spend_amount.clone();
    let mut legs = Vec::with_capacity(edges.len());
    let mut fee_breakdown = MoneyMap::new();

    for edge in edges {
        let leg = match edge.side {
            Side::Buy => match resolve_buy_fill(&edge.order, &current, &current)? {
                Some((gross, quote, fees, _net)) => MaterializedLeg {
                    order_id: edge.order.id,
                    side: Side::Buy,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    spent: gross,
                    received: quote,
                    fees,
                },
                None => return Ok(None),
            },
            Side::Sell => match resolve_sell_leg_amounts(&edge.order, &current, Some(&current))? {
                Some((gross_quote, net_base, fees)) => MaterializedLeg {
                    order_id: edge.order.id,
                    side: Side::Sell,
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    spent: gross_quote,
                    received: net_base,
                    fees,
                },
                None => return Ok(None),
            },
        };

        fee_breakdown.merge_fee_breakdown(&leg.fees)?;
        current = leg.received.clone();
        legs.push(leg);
    }

    Ok(Some(MaterializedPath {
        total_spent: spend_amount.clone(),
        total_received: current,
        legs,
        fee_breakdown,
    }))
}
