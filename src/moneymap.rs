//! `MoneyMap`: a currency -> `Money` map, always iterated/serialized in
//! lexicographic currency order.

use crate::error::Result;
use crate::money::{Currency, Money};
use crate::order::FeeBreakdown;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MoneyMap(BTreeMap<Currency, Money>);

impl MoneyMap {
    pub fn new() -> Self {
        MoneyMap(BTreeMap::new())
    }

    pub fn get(&self, currency: &Currency) -> Option<&Money> {
        self.0.get(currency)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Currency, &Money)> {
        self.0.iter()
    }

    /// Adds `amount` into the bucket for its currency, at the larger of the
    /// two scales when a bucket already exists.
    pub fn add(&mut self, amount: &Money) -> Result<()> {
        match self.0.get(amount.currency()) {
            Some(existing) => {
                let scale = existing.scale().max(amount.scale());
                let merged = existing.add(amount, scale)?;
                self.0.insert(amount.currency().clone(), merged);
            }
            None => {
                self.0.insert(amount.currency().clone(), amount.clone());
            }
        }
        Ok(())
    }

    /// Folds a leg's fee breakdown into this map.
    pub fn merge_fee_breakdown(&mut self, fees: &FeeBreakdown) -> Result<()> {
        if let Some(fee) = &fees.base_fee {
            self.add(fee)?;
        }
        if let Some(fee) = &fees.quote_fee {
            self.add(fee)?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: &MoneyMap) -> Result<()> {
        for (_, amount) in other.iter() {
            self.add(amount)?;
        }
        Ok(())
    }
}

impl Serialize for MoneyMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (currency, amount) in &self.0 {
            map.serialize_entry(currency.as_str(), amount)?;
        }
        map.end()
    }
}
