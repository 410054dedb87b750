//! Orders and fee policies (C2).

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use crate::money::{AssetPair, Currency, ExchangeRate, Money};
use serde::Serialize;
use std::cmp::Ordering;

/// A stable order identity, assigned by position in the snapshot `OrderBook`
/// that the graph was built from. Used anywhere "order identity" matters:
/// disjoint-plan exclusion sets and reusable-plan usage counts both key on
/// this.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize)]
pub struct OrderId(pub usize);

/// The side of the market an order sits on, relative to its `AssetPair`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum Side {
    /// Paying the pair's quote currency (plus any base fee in the gross
    /// spend) to receive the base currency.
    Buy,
    /// Paying the pair's base currency to receive the quote currency.
    Sell,
}

/// An inclusive `[min, max]` range of base-currency amounts an order will
/// fill.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBounds {
    min: Money,
    max: Money,
}

impl OrderBounds {
    pub fn new(min: Money, max: Money) -> Result<Self> {
        if min.currency() != max.currency() {
            return Err(Error::Input(format!(
                "order bounds currency mismatch: {} vs {}",
                min.currency(),
                max.currency()
            )));
        }
        if min.amount().cmp_value(&max.amount()) == Ordering::Greater {
            return Err(Error::Input(format!(
                "order bounds min ({}) exceeds max ({})",
                min, max
            )));
        }
        Ok(OrderBounds { min, max })
    }

    pub fn min(&self) -> &Money {
        &self.min
    }

    pub fn max(&self) -> &Money {
        &self.max
    }

    pub fn currency(&self) -> &Currency {
        self.min.currency()
    }

    pub fn scale(&self) -> u32 {
        self.min.scale().max(self.max.scale())
    }

    /// Inclusive membership test.
    pub fn contains(&self, money: &Money) -> bool {
        money.currency() == self.min.currency()
            && money.amount().cmp_value(&self.min.amount()) != Ordering::Less
            && money.amount().cmp_value(&self.max.amount()) != Ordering::Greater
    }

    /// Projects `money` into `[min, max]`.
    pub fn clamp(&self, money: &Money) -> Result<Money> {
        if money.currency() != self.min.currency() {
            return Err(Error::Input(format!(
                "cannot clamp {} against bounds in {}",
                money,
                self.min.currency()
            )));
        }
        if money.amount().cmp_value(&self.min.amount()) == Ordering::Less {
            Ok(self.min.clone())
        } else if money.amount().cmp_value(&self.max.amount()) == Ordering::Greater {
            Ok(self.max.clone())
        } else {
            Ok(money.clone())
        }
    }
}

/// Fees charged on either side of a fill. Either side may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub base_fee: Option<Money>,
    pub quote_fee: Option<Money>,
}

impl FeeBreakdown {
    pub fn none() -> Self {
        FeeBreakdown::default()
    }

    /// Adds matching-currency fee amounts together, at the larger of the
    /// two input scales.
    pub fn merge(&self, other: &FeeBreakdown) -> Result<FeeBreakdown> {
        Ok(FeeBreakdown {
            base_fee: merge_optional_money(&self.base_fee, &other.base_fee)?,
            quote_fee: merge_optional_money(&self.quote_fee, &other.quote_fee)?,
        })
    }
}

fn merge_optional_money(a: &Option<Money>, b: &Option<Money>) -> Result<Option<Money>> {
    match (a, b) {
        (None, None) => Ok(None),
        (Some(m), None) | (None, Some(m)) => Ok(Some(m.clone())),
        (Some(x), Some(y)) => {
            let scale = x.scale().max(y.scale());
            Ok(Some(x.add(y, scale)?))
        }
    }
}

/// A closed set of fee-policy variants, each exposing a stable fingerprint
/// used to make deterministic route signatures possible without inspecting
/// opaque policy state.
#[derive(Clone, Debug, PartialEq)]
pub enum FeePolicy {
    /// No fee is charged on either side.
    NoFee,
    /// A proportional fee, expressed in basis points, charged on the base
    /// and/or quote amount of a fill.
    FixedRate { base_bps: u32, quote_bps: u32 },
    /// A flat, amount-independent fee charged per fill.
    FlatPerFill {
        base_flat: Option<Money>,
        quote_flat: Option<Money>,
    },
}

impl FeePolicy {
    /// A stable, opaque identifier for this policy's configuration.
    pub fn fingerprint(&self) -> String {
        match self {
            FeePolicy::NoFee => "nofee".to_string(),
            FeePolicy::FixedRate {
                base_bps,
                quote_bps,
            } => format!("fixed:{}:{}", base_bps, quote_bps),
            FeePolicy::FlatPerFill {
                base_flat,
                quote_flat,
            } => format!(
                "flat:{}:{}",
                base_flat.as_ref().map(|m| m.to_string()).unwrap_or_default(),
                quote_flat.as_ref().map(|m| m.to_string()).unwrap_or_default(),
            ),
        }
    }

    /// Computes the fee breakdown for a fill of `base` against `quote`,
    /// both already at the scale the fee should be expressed at.
    pub fn calculate(&self, _side: Side, base: &Money, quote: &Money) -> Result<FeeBreakdown> {
        match self {
            FeePolicy::NoFee => Ok(FeeBreakdown::none()),
            FeePolicy::FixedRate {
                base_bps,
                quote_bps,
            } => {
                let base_fee = if *base_bps > 0 {
                    Some(bps_of(base, *base_bps)?)
                } else {
                    None
                };
                let quote_fee = if *quote_bps > 0 {
                    Some(bps_of(quote, *quote_bps)?)
                } else {
                    None
                };
                Ok(FeeBreakdown {
                    base_fee,
                    quote_fee,
                })
            }
            FeePolicy::FlatPerFill {
                base_flat,
                quote_flat,
            } => Ok(FeeBreakdown {
                base_fee: base_flat.clone(),
                quote_fee: quote_flat.clone(),
            }),
        }
    }
}

fn bps_of(money: &Money, bps: u32) -> Result<Money> {
    let bps_decimal = Decimal::from_scaled(bps as i64, 4)?; // bps / 10_000
    let fee_amount = money.amount().mul(&bps_decimal, money.scale())?;
    Money::new(fee_amount, money.currency().clone())
}

/// A single limit order: a directional willingness to trade within
/// `bounds` of the pair's base currency, at `rate`, subject to an optional
/// `fee_policy`.
#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub pair: AssetPair,
    pub bounds: OrderBounds,
    pub rate: ExchangeRate,
    pub fee_policy: Option<FeePolicy>,
}

impl Order {
    pub fn new(
        id: OrderId,
        side: Side,
        pair: AssetPair,
        bounds: OrderBounds,
        rate: ExchangeRate,
        fee_policy: Option<FeePolicy>,
    ) -> Result<Self> {
        if bounds.currency() != &pair.base {
            return Err(Error::Input(format!(
                "order bounds must be denominated in the pair's base currency {}, got {}",
                pair.base,
                bounds.currency()
            )));
        }
        if rate.base() != &pair.base || rate.quote() != &pair.quote {
            return Err(Error::Input(format!(
                "order rate must match pair {}/{}, got {}/{}",
                pair.base,
                pair.quote,
                rate.base(),
                rate.quote()
            )));
        }
        Ok(Order {
            id,
            side,
            pair,
            bounds,
            rate,
            fee_policy,
        })
    }

    /// `rate.convert(base)`: the raw quote amount before any fee.
    pub fn calculate_quote_amount(&self, base: &Money, scale: u32) -> Result<Money> {
        self.rate.convert(base, scale)
    }

    /// The quote amount the counterparty actually nets, after any quote
    /// fee is deducted.
    pub fn calculate_effective_quote_amount(&self, base: &Money, scale: u32) -> Result<Money> {
        let quote = self.calculate_quote_amount(base, scale)?;
        match self.fee_policy.as_ref().map(|p| p.calculate(self.side, base, &quote)).transpose()? {
            Some(FeeBreakdown {
                quote_fee: Some(fee),
                ..
            }) => quote.sub(&fee, scale),
            _ => Ok(quote),
        }
    }

    /// The base amount the taker must actually spend, after any base fee
    /// is added (gross = base + base fee).
    pub fn calculate_gross_base_spend(&self, base: &Money, scale: u32) -> Result<Money> {
        let quote = self.calculate_quote_amount(base, scale)?;
        match self.fee_policy.as_ref().map(|p| p.calculate(self.side, base, &quote)).transpose()? {
            Some(FeeBreakdown {
                base_fee: Some(fee),
                ..
            }) => base.add(&fee, scale),
            _ => Ok(base.clone()),
        }
    }
}

/// An ordered snapshot of orders. Index position is not significant to the
/// search; `OrderId` (assigned once, at ingestion) is the stable identity.
pub type OrderBook = Vec<Order>;
