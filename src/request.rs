//! The request/config boundary: `ToleranceWindow`, `HopLimits`,
//! `PathSearchConfig`, and `PathSearchRequest`.
//!
//! Every numeric invariant is validated eagerly by a fallible builder,
//! rather than deferred to the hot loop that consumes it.

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::money::{Currency, Money};
use crate::order::OrderBook;
use std::cmp::Ordering;

/// A `[min, max)` window on residual spend tolerance, both in `[0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToleranceWindow {
    min: Decimal,
    max: Decimal,
}

impl ToleranceWindow {
    pub fn new(min: Decimal, max: Decimal) -> Result<Self> {
        let one = Decimal::one();
        for (name, value) in [("min", min), ("max", max)] {
            if value.is_negative() || value.cmp_value(&one) != Ordering::Less {
                return Err(Error::Input(format!(
                    "tolerance window {} must be in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if min.cmp_value(&max) == Ordering::Greater {
            return Err(Error::Input(format!(
                "tolerance window min ({}) exceeds max ({})",
                min, max
            )));
        }
        Ok(ToleranceWindow { min, max })
    }

    pub fn min(&self) -> Decimal {
        self.min
    }

    pub fn max(&self) -> Decimal {
        self.max
    }

    /// The single scalar the search engine prunes with: `max` when
    /// `max > min`, else `min`. Clamped to `[0, 1 - 10^-18]`.
    pub fn heuristic(&self, scale: u32) -> Result<Decimal> {
        let raw = if self.max.cmp_value(&self.min) == Ordering::Greater {
            self.max
        } else {
            self.min
        };
        let ceiling = Decimal::one().sub(&Decimal::from_scaled(1, scale.min(crate::decimal::MAX_SCALE))?, scale)?;
        Ok(if raw.cmp_value(&ceiling) == Ordering::Greater {
            ceiling
        } else {
            raw
        })
    }
}

impl Default for ToleranceWindow {
    fn default() -> Self {
        ToleranceWindow {
            min: Decimal::zero(),
            max: Decimal::zero(),
        }
    }
}

/// `[min_hops, max_hops]`, both `>= 1` and `min_hops <= max_hops`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HopLimits {
    pub min_hops: u32,
    pub max_hops: u32,
}

impl HopLimits {
    pub fn new(min_hops: u32, max_hops: u32) -> Result<Self> {
        if min_hops < 1 {
            return Err(Error::Input("minHops must be at least 1".into()));
        }
        if max_hops < min_hops {
            return Err(Error::Input(format!(
                "maxHops ({}) must be >= minHops ({})",
                max_hops, min_hops
            )));
        }
        Ok(HopLimits {
            min_hops,
            max_hops,
        })
    }
}

impl Default for HopLimits {
    fn default() -> Self {
        HopLimits {
            min_hops: 1,
            max_hops: 4,
        }
    }
}

/// Validated search configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSearchConfig {
    pub spend_amount: Money,
    pub tolerance_window: ToleranceWindow,
    pub hop_limits: HopLimits,
    pub result_limit: usize,
    pub max_expansions: u64,
    pub max_visited_states: u64,
    pub time_budget_ms: Option<u64>,
    pub throw_on_guard_limit: bool,
    pub disjoint_plans: bool,
}

impl PathSearchConfig {
    pub fn builder(spend_amount: Money) -> PathSearchConfigBuilder {
        PathSearchConfigBuilder {
            spend_amount,
            tolerance_window: ToleranceWindow::default(),
            hop_limits: HopLimits::default(),
            result_limit: 1,
            max_expansions: 10_000,
            max_visited_states: 10_000,
            time_budget_ms: None,
            throw_on_guard_limit: false,
            disjoint_plans: true,
        }
    }
}

/// Fallible builder for [`PathSearchConfig`]; `build()` is the single place
/// every numeric invariant is checked.
#[derive(Clone, Debug)]
pub struct PathSearchConfigBuilder {
    spend_amount: Money,
    tolerance_window: ToleranceWindow,
    hop_limits: HopLimits,
    result_limit: usize,
    max_expansions: u64,
    max_visited_states: u64,
    time_budget_ms: Option<u64>,
    throw_on_guard_limit: bool,
    disjoint_plans: bool,
}

impl PathSearchConfigBuilder {
    pub fn tolerance_window(mut self, window: ToleranceWindow) -> Self {
        self.tolerance_window = window;
        self
    }

    pub fn hop_limits(mut self, limits: HopLimits) -> Self {
        self.hop_limits = limits;
        self
    }

    pub fn result_limit(mut self, k: usize) -> Self {
        self.result_limit = k;
        self
    }

    pub fn max_expansions(mut self, limit: u64) -> Self {
        self.max_expansions = limit;
        self
    }

    pub fn max_visited_states(mut self, limit: u64) -> Self {
        self.max_visited_states = limit;
        self
    }

    pub fn time_budget_ms(mut self, budget: Option<u64>) -> Self {
        self.time_budget_ms = budget;
        self
    }

    pub fn throw_on_guard_limit(mut self, value: bool) -> Self {
        self.throw_on_guard_limit = value;
        self
    }

    pub fn disjoint_plans(mut self, value: bool) -> Self {
        self.disjoint_plans = value;
        self
    }

    pub fn build(self) -> Result<PathSearchConfig> {
        if self.result_limit < 1 {
            return Err(Error::Input("resultLimit must be at least 1".into()));
        }
        if self.max_expansions < 1 {
            return Err(Error::Input("maxExpansions must be at least 1".into()));
        }
        if self.max_visited_states < 1 {
            return Err(Error::Input("maxVisitedStates must be at least 1".into()));
        }
        if let Some(budget) = self.time_budget_ms {
            if budget < 1 {
                return Err(Error::Input("timeBudgetMs must be at least 1".into()));
            }
        }
        Ok(PathSearchConfig {
            spend_amount: self.spend_amount,
            tolerance_window: self.tolerance_window,
            hop_limits: self.hop_limits,
            result_limit: self.result_limit,
            max_expansions: self.max_expansions,
            max_visited_states: self.max_visited_states,
            time_budget_ms: self.time_budget_ms,
            throw_on_guard_limit: self.throw_on_guard_limit,
            disjoint_plans: self.disjoint_plans,
        })
    }
}

/// The single request type the core accepts.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSearchRequest {
    pub order_book: OrderBook,
    pub config: PathSearchConfig,
    pub source: Currency,
    pub target: Currency,
}

impl PathSearchRequest {
    pub fn new(
        order_book: OrderBook,
        config: PathSearchConfig,
        source: impl AsRef<str>,
        target: impl AsRef<str>,
    ) -> Result<Self> {
        let source = Currency::new(source)?;
        let target = Currency::new(target)?;
        Ok(PathSearchRequest {
            order_book,
            config,
            source,
            target,
        })
    }
}
