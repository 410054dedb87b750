//! Arbitrary-precision(-ish) fixed-point decimal arithmetic (C1).
//!
//! The crate builds its `Decimal` value object on top of `rust_decimal`,
//! the 96-bit fixed-point primitive this corpus reaches for whenever it
//! needs exact monetary math (see e.g. the `rust_decimal` family of crates
//! used throughout sibling order-book and exchange-client crates in this
//! workspace's wider ecosystem). That primitive is not truly unbounded: its
//! mantissa caps precision at [`MAX_SCALE`] fractional digits. The crate's
//! `Precision` errors fire at that ceiling rather than at an unbounded one;
//! see `DESIGN.md` for the tradeoff this resolves.
//!
//! Every operation that can lose precision takes an explicit result scale
//! and rounds *half-up* to it: scale is never implicit, and every decimal
//! carries the scale it was asked for, trailing zeros included.

use crate::error::{Error, Result};
use rust_decimal::{Decimal as RawDecimal, RoundingStrategy};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The maximum scale (fractional digits) any `Decimal` in this crate can
/// carry. Bounded by `rust_decimal`'s 96-bit mantissa; see `DESIGN.md`.
pub const MAX_SCALE: u32 = 28;

/// The canonical scale used for cost, product, and tolerance arithmetic
/// throughout the search engine.
pub const CANONICAL_SCALE: u32 = 18;

/// An exact, explicitly-scaled decimal value.
///
/// `Decimal` never silently discards precision: every arithmetic method
/// that can round takes an explicit `result_scale` and rounds half-up to
/// it. Comparisons and equality are over mathematical value (scale is not
/// significant for ordering) — effectively lexicographic on normalized,
/// common-scale representations.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(RawDecimal);

impl Decimal {
    /// The value `0` at scale `0`.
    pub fn zero() -> Self {
        Decimal(RawDecimal::ZERO)
    }

    /// The value `1` at scale `0`.
    pub fn one() -> Self {
        Decimal(RawDecimal::ONE)
    }

    /// Parses a decimal literal of the form `[-]d+(\.d+)?`. Rejects
    /// scientific notation, empty input, and anything else that is not a
    /// plain fixed-point literal.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::Input("empty decimal literal".into()));
        }
        if input.contains(['e', 'E']) {
            return Err(Error::Input(format!(
                "scientific notation is not a valid decimal literal: {}",
                input
            )));
        }
        let parsed = RawDecimal::from_str(input)
            .map_err(|e| Error::Input(format!("malformed decimal literal {:?}: {}", input, e)))?;
        if parsed.scale() > MAX_SCALE {
            return Err(Error::Precision(format!(
                "literal {:?} exceeds maximum scale {}",
                input, MAX_SCALE
            )));
        }
        Ok(Decimal(parsed))
    }

    /// Builds a `Decimal` from an integer numerator over `10^scale`,
    /// e.g. `Decimal::from_scaled(12345, 2)` is `123.45`.
    pub fn from_scaled(numerator: i64, scale: u32) -> Result<Self> {
        if scale > MAX_SCALE {
            return Err(Error::Precision(format!(
                "requested scale {} exceeds maximum scale {}",
                scale, MAX_SCALE
            )));
        }
        Ok(Decimal(RawDecimal::new(numerator, scale)))
    }

    /// The number of fractional digits this value is displayed with.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_negative() && !self.is_zero()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    pub fn negate(&self) -> Self {
        Decimal(-self.0)
    }

    /// Re-scales this value to `result_scale`, rounding half-up. Does not
    /// change value identity beyond the rounding the new scale implies.
    pub fn with_scale(&self, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        Ok(Decimal(round_half_up(self.0, result_scale)))
    }

    /// `self + other`, rounded half-up to `result_scale`.
    pub fn add(&self, other: &Self, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        let raw = self
            .0
            .checked_add(other.0)
            .ok_or_else(|| Error::Precision("decimal addition overflowed".into()))?;
        Ok(Decimal(round_half_up(raw, result_scale)))
    }

    /// `self - other`, rounded half-up to `result_scale`.
    pub fn sub(&self, other: &Self, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        let raw = self
            .0
            .checked_sub(other.0)
            .ok_or_else(|| Error::Precision("decimal subtraction overflowed".into()))?;
        Ok(Decimal(round_half_up(raw, result_scale)))
    }

    /// `self * other`, rounded half-up to `result_scale`.
    pub fn mul(&self, other: &Self, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        let raw = self
            .0
            .checked_mul(other.0)
            .ok_or_else(|| Error::Precision("decimal multiplication overflowed".into()))?;
        Ok(Decimal(round_half_up(raw, result_scale)))
    }

    /// `self / other`, rounded half-up to `result_scale`. Division by zero
    /// is a `Precision` error, not a panic.
    pub fn div(&self, other: &Self, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        if other.is_zero() {
            return Err(Error::Precision("division by zero".into()));
        }
        let raw = self
            .0
            .checked_div(other.0)
            .ok_or_else(|| Error::Precision("decimal division overflowed".into()))?;
        Ok(Decimal(round_half_up(raw, result_scale)))
    }

    /// Raises `self` to a small non-negative integer power via repeated
    /// multiplication, rounding half-up to `result_scale` at each step.
    /// Used for the graph's usage-count order penalty `(1 - p)^u`, where
    /// `u` is a small per-order usage count.
    pub fn powu(&self, exponent: u32, result_scale: u32) -> Result<Self> {
        check_scale(result_scale)?;
        let mut acc = Decimal::one().with_scale(result_scale)?;
        for _ in 0..exponent {
            acc = acc.mul(self, result_scale)?;
        }
        Ok(acc)
    }

    pub fn cmp_value(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

fn check_scale(scale: u32) -> Result<()> {
    if scale > MAX_SCALE {
        Err(Error::Precision(format!(
            "requested scale {} exceeds maximum scale {}",
            scale, MAX_SCALE
        )))
    } else {
        Ok(())
    }
}

/// Rounds half-up. `rust_decimal`'s `MidpointAwayFromZero` strategy is
/// identical to half-up for the non-negative values this crate deals with
/// (money, rates, tolerances); it also does the right thing for the few
/// internally-signed intermediate values (e.g. residuals before `abs`).
fn round_half_up(value: RawDecimal, scale: u32) -> RawDecimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Decimal {
    /// `[-]d+\.d{s}`: trailing zeros preserved, no scientific notation, no
    /// locale-specific separators.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({})", self.0)
    }
}

/// Serializes as the plain fixed-point string (no scale field), matching
/// the "decimal string at scale 18" shape used for `cost` and
/// `residualTolerance` on the external result types.
impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
