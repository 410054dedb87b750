//! Property-based laws: determinism, permutation invariance, monotonic-K
//! result sets, and decimal round-tripping.

use orderpath::*;
use proptest::prelude::*;

fn cur(code: &str) -> Currency {
    Currency::new(code).unwrap()
}
fn money(amount: &str, currency: Currency) -> Money {
    Money::new(Decimal::parse(amount).unwrap(), currency).unwrap()
}

fn sample_orders() -> Vec<Order> {
    let usd_eur = {
        let pair = AssetPair::new(cur("USD"), cur("EUR")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("USD")), money("2000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.91").unwrap(), cur("USD"), cur("EUR")).unwrap();
        Order::new(OrderId(0), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let eur_btc = {
        let pair = AssetPair::new(cur("EUR"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("EUR")), money("2000", cur("EUR"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.000021").unwrap(), cur("EUR"), cur("BTC")).unwrap();
        Order::new(OrderId(1), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let usd_btc = {
        let pair = AssetPair::new(cur("USD"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("USD")), money("2000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.0000195").unwrap(), cur("USD"), cur("BTC")).unwrap();
        Order::new(OrderId(2), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let usd_gbp = {
        let pair = AssetPair::new(cur("USD"), cur("GBP")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("USD")), money("2000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.79").unwrap(), cur("USD"), cur("GBP")).unwrap();
        Order::new(OrderId(3), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let gbp_btc = {
        let pair = AssetPair::new(cur("GBP"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("GBP")), money("2000", cur("GBP"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.000024").unwrap(), cur("GBP"), cur("BTC")).unwrap();
        Order::new(OrderId(4), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    vec![usd_eur, eur_btc, usd_btc, usd_gbp, gbp_btc]
}

fn config(result_limit: usize) -> PathSearchConfig {
    PathSearchConfig::builder(money("100", cur("USD")))
        .hop_limits(HopLimits::new(1, 3).unwrap())
        .tolerance_window(ToleranceWindow::new(Decimal::zero(), Decimal::parse("0.2").unwrap()).unwrap())
        .result_limit(result_limit)
        .build()
        .unwrap()
}

// Same request, run twice, produces byte-identical results: the search has
// no hidden ordering dependency on hash-map iteration or wall-clock jitter.
#[test]
fn search_is_deterministic_across_repeated_runs() {
    let engine = OrderPath::new(sample_orders());
    let first = engine.find_paths(config(3), "USD", "BTC").unwrap();
    let second = engine.find_paths(config(3), "USD", "BTC").unwrap();
    assert_eq!(first.results, second.results);
}

proptest! {
    // Shuffling the input order book (an `OrderId`-stable permutation of
    // the same orders) never changes the ranked result set: identity lives
    // on `OrderId`, not on array position.
    #[test]
    fn permuting_the_order_book_does_not_change_results(seed in 0u64..120) {
        let mut orders = sample_orders();
        // A small deterministic shuffle keyed by `seed`, avoiding any
        // randomness source this harness can't replay.
        let len = orders.len();
        for i in 0..len {
            let j = ((seed as usize).wrapping_add(i * 7)) % len;
            orders.swap(i, j);
        }

        let baseline = OrderPath::new(sample_orders())
            .find_paths(config(3), "USD", "BTC")
            .unwrap();
        let shuffled = OrderPath::new(orders)
            .find_paths(config(3), "USD", "BTC")
            .unwrap();

        prop_assert_eq!(baseline.results, shuffled.results);
    }

    // Raising `resultLimit` from K to K+1 only ever appends to the ranked
    // list; it never reorders or evicts the first K.
    #[test]
    fn increasing_result_limit_extends_rather_than_reorders(k in 1usize..4) {
        let engine = OrderPath::new(sample_orders());
        let smaller = engine.find_paths(config(k), "USD", "BTC").unwrap();
        let larger = engine.find_paths(config(k + 1), "USD", "BTC").unwrap();

        prop_assert!(larger.results.len() >= smaller.results.len());
        prop_assert_eq!(&larger.results[..smaller.results.len()], &smaller.results[..]);
    }

    // A decimal literal of the form `[-]d+(\.d+)?`, scale bounded by
    // `MAX_SCALE`, survives a parse/display round trip unchanged.
    #[test]
    fn decimal_round_trips_through_parse_and_display(
        whole in 0u64..1_000_000,
        frac in 0u32..1_000_000,
    ) {
        let literal = format!("{}.{:06}", whole, frac);
        let parsed = Decimal::parse(&literal).unwrap();
        prop_assert_eq!(parsed.to_string(), literal);
    }

    // `Money::add` is commutative for same-currency operands at a fixed
    // result scale.
    #[test]
    fn money_add_is_commutative(a in 0i64..1_000_000, b in 0i64..1_000_000) {
        let a = Money::new(Decimal::from_scaled(a, 2).unwrap(), cur("USD")).unwrap();
        let b = Money::new(Decimal::from_scaled(b, 2).unwrap(), cur("USD")).unwrap();
        let ab = a.add(&b, 2).unwrap();
        let ba = b.add(&a, 2).unwrap();
        prop_assert_eq!(ab, ba);
    }
}
