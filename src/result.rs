//! The external result/outcome types (C6 boundary): `PathLeg`,
//! `ExecutionStep`, `PathResult`, `ExecutionPlan`, and `SearchOutcome<T>`.
//!
//! These are the only types an external adapter ever serializes. Everything
//! upstream of them (`CandidatePath`, `MaterializedLeg`, `MaterializedPath`)
//! is an internal working representation; these carry no order identity or
//! side, only what a caller needs to execute or display the result.

use crate::decimal::Decimal;
use crate::error::Result;
use crate::guard::GuardReport;
use crate::materialize::MaterializedPath;
use crate::money::{Currency, Money};
use crate::moneymap::MoneyMap;
use crate::order::FeeBreakdown;
use crate::tolerance::DecimalTolerance;
use serde::Serialize;

/// One hop's concrete amounts. Used both as a `PathResult` leg and as an
/// `ExecutionStep`; `sequence` is populated only in execution-plan contexts,
/// where a caller needs an explicit submission order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathLeg {
    pub from: Currency,
    pub to: Currency,
    pub spent: Money,
    pub received: Money,
    pub fees: MoneyMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

/// An `ExecutionStep` is a `PathLeg` with `sequence` populated.
pub type ExecutionStep = PathLeg;

fn fee_breakdown_to_map(fees: &FeeBreakdown) -> Result<MoneyMap> {
    let mut map = MoneyMap::new();
    map.merge_fee_breakdown(fees)?;
    Ok(map)
}

fn legs_from_materialized(materialized: &MaterializedPath, sequenced: bool) -> Result<Vec<PathLeg>> {
    materialized
        .legs
        .iter()
        .enumerate()
        .map(|(index, leg)| {
            Ok(PathLeg {
                from: leg.from.clone(),
                to: leg.to.clone(),
                spent: leg.spent.clone(),
                received: leg.received.clone(),
                fees: fee_breakdown_to_map(&leg.fees)?,
                sequence: if sequenced { Some(index as u32) } else { None },
            })
        })
        .collect()
}

fn route_from_materialized(materialized: &MaterializedPath) -> Vec<Currency> {
    let mut route = Vec::with_capacity(materialized.legs.len() + 1);
    if let Some(first) = materialized.legs.first() {
        route.push(first.from.clone());
    }
    for leg in &materialized.legs {
        route.push(leg.to.clone());
    }
    route
}

/// One candidate conversion path, fully materialized and tolerance-checked.
/// Emitted by the linear Path Orchestrator (C8).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub total_spent: Money,
    pub total_received: Money,
    pub cost: Decimal,
    pub hops: u32,
    pub legs: Vec<PathLeg>,
    pub route: Vec<Currency>,
    pub fee_breakdown: MoneyMap,
    pub residual_tolerance: Decimal,
}

impl PathResult {
    pub fn from_materialized(
        materialized: &MaterializedPath,
        cost: Decimal,
        tolerance: DecimalTolerance,
    ) -> Result<Self> {
        Ok(PathResult {
            total_spent: materialized.total_spent.clone(),
            total_received: materialized.total_received.clone(),
            cost,
            hops: materialized.legs.len() as u32,
            legs: legs_from_materialized(materialized, false)?,
            route: route_from_materialized(materialized),
            fee_breakdown: materialized.fee_breakdown.clone(),
            residual_tolerance: tolerance.value(),
        })
    }
}

/// One accepted plan out of a multi-iteration search run. Emitted by the
/// Execution Plan Orchestrator (C9), in either disjoint or reusable mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub total_spent: Money,
    pub total_received: Money,
    pub cost: Decimal,
    pub hops: u32,
    pub steps: Vec<ExecutionStep>,
    pub route: Vec<Currency>,
    pub fee_breakdown: MoneyMap,
    pub residual_tolerance: Decimal,
}

impl ExecutionPlan {
    pub fn from_materialized(
        materialized: &MaterializedPath,
        cost: Decimal,
        tolerance: DecimalTolerance,
    ) -> Result<Self> {
        Ok(ExecutionPlan {
            total_spent: materialized.total_spent.clone(),
            total_received: materialized.total_received.clone(),
            cost,
            hops: materialized.legs.len() as u32,
            steps: legs_from_materialized(materialized, true)?,
            route: route_from_materialized(materialized),
            fee_breakdown: materialized.fee_breakdown.clone(),
            residual_tolerance: tolerance.value(),
        })
    }

    /// The order identities used by this plan's steps is not carried on the
    /// external type itself (it has no order identity field); callers doing
    /// disjoint-mode exclusion should track it on the internal candidate,
    /// not here.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// `(results, guardReport)`: the single outcome shape both orchestrators
/// return.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome<T> {
    pub results: Vec<T>,
    pub guard_report: GuardReport,
}

impl<T> SearchOutcome<T> {
    pub fn new(results: Vec<T>, guard_report: GuardReport) -> Self {
        SearchOutcome { results, guard_report }
    }
}
