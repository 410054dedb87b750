//! Currency-tagged monetary value objects (C1): `Currency`, `Money`,
//! `ExchangeRate`, and `AssetPair`.

use crate::decimal::Decimal;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A case-normalized currency code: 3-12 upper-case ASCII letters.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Currency(String);

impl Currency {
    /// Normalizes (trims, upper-cases) and validates a currency code.
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let trimmed = code.as_ref().trim();
        if trimmed.is_empty() {
            return Err(Error::Input("currency code must not be empty".into()));
        }
        let normalized = trimmed.to_ascii_uppercase();
        if !(3..=12).contains(&normalized.len()) || !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::Input(format!(
                "currency code must be 3-12 letters, got {:?}",
                trimmed
            )));
        }
        Ok(Currency(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-negative amount tagged with its currency.
#[derive(Clone, Debug, PartialEq)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self> {
        if amount.is_negative() {
            return Err(Error::Input(format!(
                "money amount must be non-negative, got {}",
                amount
            )));
        }
        Ok(Money { amount, currency })
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn scale(&self) -> u32 {
        self.amount.scale()
    }

    /// Re-scales the amount (half-up), keeping the same currency.
    pub fn with_scale(&self, scale: u32) -> Result<Self> {
        Ok(Money {
            amount: self.amount.with_scale(scale)?,
            currency: self.currency.clone(),
        })
    }

    fn assert_same_currency(&self, other: &Money) -> Result<()> {
        if self.currency != other.currency {
            Err(Error::Input(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )))
        } else {
            Ok(())
        }
    }

    pub fn add(&self, other: &Money, result_scale: u32) -> Result<Money> {
        self.assert_same_currency(other)?;
        Money::new(self.amount.add(&other.amount, result_scale)?, self.currency.clone())
    }

    pub fn sub(&self, other: &Money, result_scale: u32) -> Result<Money> {
        self.assert_same_currency(other)?;
        Money::new(self.amount.sub(&other.amount, result_scale)?, self.currency.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Money serializes as `{ currency, amount, scale }`, with `amount` kept as
/// a fixed-point string so trailing zeros and precision survive JSON
/// round-tripping.
impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Money", 3)?;
        s.serialize_field("currency", self.currency.as_str())?;
        s.serialize_field("amount", &self.amount.to_string())?;
        s.serialize_field("scale", &self.amount.scale())?;
        s.end()
    }
}

/// A directed conversion rate between a base and a quote currency.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeRate {
    rate: Decimal,
    base: Currency,
    quote: Currency,
}

impl ExchangeRate {
    pub fn new(rate: Decimal, base: Currency, quote: Currency) -> Result<Self> {
        if !rate.is_positive() {
            return Err(Error::Input(format!(
                "exchange rate must be strictly positive, got {}",
                rate
            )));
        }
        if base == quote {
            return Err(Error::Input(format!(
                "exchange rate base and quote must differ, both were {}",
                base
            )));
        }
        Ok(ExchangeRate { rate, base, quote })
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn base(&self) -> &Currency {
        &self.base
    }

    pub fn quote(&self) -> &Currency {
        &self.quote
    }

    /// Converts `base_money` (which must be denominated in `self.base`)
    /// into quote currency at `result_scale`.
    pub fn convert(&self, base_money: &Money, result_scale: u32) -> Result<Money> {
        if base_money.currency() != &self.base {
            return Err(Error::Input(format!(
                "expected money in {}, got {}",
                self.base,
                base_money.currency()
            )));
        }
        let amount = base_money.amount().mul(&self.rate, result_scale)?;
        Money::new(amount, self.quote.clone())
    }

    /// The inverse rate (quote -> base), computed at `result_scale`.
    pub fn invert(&self, result_scale: u32) -> Result<ExchangeRate> {
        let one = Decimal::one().with_scale(result_scale)?;
        let inverted = one.div(&self.rate, result_scale)?;
        ExchangeRate::new(inverted, self.quote.clone(), self.base.clone())
    }
}

/// A pair of distinct currencies: `(base, quote)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AssetPair {
    pub base: Currency,
    pub quote: Currency,
}

impl AssetPair {
    pub fn new(base: Currency, quote: Currency) -> Result<Self> {
        if base == quote {
            return Err(Error::Input(format!(
                "asset pair base and quote must differ, both were {}",
                base
            )));
        }
        Ok(AssetPair { base, quote })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::CANONICAL_SCALE;

    fn usd() -> Currency {
        Currency::new("usd").unwrap()
    }

    fn eur() -> Currency {
        Currency::new("eur").unwrap()
    }

    #[test]
    fn currency_normalizes_case_and_trims() {
        assert_eq!(Currency::new(" usd ").unwrap().as_str(), "USD");
    }

    #[test]
    fn currency_rejects_empty_and_out_of_range_lengths() {
        assert!(Currency::new("").is_err());
        assert!(Currency::new("us").is_err());
        assert!(Currency::new("a".repeat(13)).is_err());
        assert!(Currency::new("US1").is_err());
    }

    #[test]
    fn money_rejects_negative_amounts() {
        let amount = Decimal::parse("-1.0").unwrap();
        assert!(matches!(Money::new(amount, usd()), Err(Error::Input(_))));
    }

    #[test]
    fn money_arithmetic_requires_matching_currency() {
        let a = Money::new(Decimal::parse("1.0").unwrap(), usd()).unwrap();
        let b = Money::new(Decimal::parse("1.0").unwrap(), eur()).unwrap();
        assert!(matches!(a.add(&b, 2), Err(Error::Input(_))));
    }

    #[test]
    fn exchange_rate_requires_positive_rate_and_distinct_currencies() {
        assert!(ExchangeRate::new(Decimal::zero(), usd(), eur()).is_err());
        assert!(ExchangeRate::new(Decimal::one(), usd(), usd()).is_err());
    }

    #[test]
    fn convert_and_invert_round_trip() {
        let rate = ExchangeRate::new(Decimal::parse("0.92").unwrap(), usd(), eur()).unwrap();
        let base = Money::new(Decimal::parse("100.00").unwrap(), usd()).unwrap();
        let quote = rate.convert(&base, CANONICAL_SCALE).unwrap();
        assert_eq!(quote.currency(), &eur());

        let inverse = rate.invert(CANONICAL_SCALE).unwrap();
        let back = inverse.convert(&quote, 2).unwrap();
        assert_eq!(back.currency(), &usd());
        assert_eq!(back.amount().to_string(), "100.00");
    }
}
