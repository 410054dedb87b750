//! Small, shared test-fixture builders. Every module used to hand-roll its
//! own `cur`/`money`/order-builder trio in its own `#[cfg(test)]` block;
//! this gives them one place to reach for instead, kept to the same three
//! or four helpers those blocks already needed.

use crate::decimal::Decimal;
use crate::money::{AssetPair, Currency, ExchangeRate, Money};
use crate::order::{Order, OrderBounds, OrderId, Side};

pub fn cur(code: &str) -> Currency {
    Currency::new(code).unwrap()
}

pub fn money(amount: &str, currency: Currency) -> Money {
    Money::new(Decimal::parse(amount).unwrap(), currency).unwrap()
}

/// A single order on the `base`/`quote` pair. `bounds` (`min`, `max`) are
/// always denominated in `base`, per `Order::new`'s own invariant, whichever
/// `side` is given.
pub fn order(id: usize, side: Side, base: Currency, quote: Currency, rate: &str, min: &str, max: &str) -> Order {
    let pair = AssetPair::new(base.clone(), quote).unwrap();
    let bounds = OrderBounds::new(money(min, base.clone()), money(max, base)).unwrap();
    let rate = ExchangeRate::new(Decimal::parse(rate).unwrap(), pair.base.clone(), pair.quote.clone()).unwrap();
    Order::new(OrderId(id), side, pair, bounds, rate, None).unwrap()
}

/// A minimal one-order book: a direct `source -> target` buy edge at
/// `rate`, bounds `[min, max]` in `source`.
pub fn book(source: Currency, target: Currency, rate: &str, min: &str, max: &str) -> Vec<Order> {
    vec![order(0, Side::Buy, source, target, rate, min, max)]
}
