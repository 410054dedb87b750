//! Boundary scenarios S1-S10.

use orderpath::*;

fn cur(code: &str) -> Currency {
    Currency::new(code).unwrap()
}
fn money(amount: &str, currency: Currency) -> Money {
    Money::new(Decimal::parse(amount).unwrap(), currency).unwrap()
}
fn window(min: &str, max: &str) -> ToleranceWindow {
    ToleranceWindow::new(Decimal::parse(min).unwrap(), Decimal::parse(max).unwrap()).unwrap()
}

// `Side::Sell` edges run `From = quote, To = base`; pairing `base = BTC,
// quote = USD` gives a `USD -> BTC` edge as every scenario below needs.
fn sell_btc_for_usd(id: usize, rate: &str, min_base: &str, max_base: &str) -> Order {
    let pair = AssetPair::new(cur("BTC"), cur("USD")).unwrap();
    let bounds = OrderBounds::new(money(min_base, cur("BTC")), money(max_base, cur("BTC"))).unwrap();
    let rate = ExchangeRate::new(Decimal::parse(rate).unwrap(), cur("BTC"), cur("USD")).unwrap();
    Order::new(OrderId(id), Side::Sell, pair, bounds, rate, None).unwrap()
}

#[test]
fn s1_one_hop_direct_route() {
    // One Sell order USD->BTC (base=BTC, quote=USD), rate such that 100 USD
    // converts to 0.0033 BTC. `rate` on a Sell order is quote-per-base
    // (USD per BTC), so `1 / 0.000033 = 30303.03...`; pick a round rate that
    // produces the 0.00330000 BTC scenario exactly: 100 / rate = received.
    let order = sell_btc_for_usd(0, "30303.0303030303030303", "0.001", "10000");
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .hop_limits(HopLimits::new(1, 3).unwrap())
        .tolerance_window(window("0", "0.05"))
        .result_limit(1)
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert_eq!(outcome.results.len(), 1);
    let result = &outcome.results[0];
    assert_eq!(result.legs.len(), 1);
    assert_eq!(result.total_spent.currency(), &cur("USD"));
    assert_eq!(result.total_received.currency(), &cur("BTC"));
    assert_eq!(result.route, vec![cur("USD"), cur("BTC")]);
}

#[test]
fn s2_two_hop_route_through_an_intermediate_currency() {
    let usd_eur = {
        let pair = AssetPair::new(cur("USD"), cur("EUR")).unwrap();
        let bounds = OrderBounds::new(money("10", cur("USD")), money("1000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.92").unwrap(), cur("USD"), cur("EUR")).unwrap();
        Order::new(OrderId(0), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let eur_btc = {
        let pair = AssetPair::new(cur("EUR"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("5", cur("EUR")), money("500", cur("EUR"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.000020").unwrap(), cur("EUR"), cur("BTC")).unwrap();
        Order::new(OrderId(1), Side::Buy, pair, bounds, rate, None).unwrap()
    };

    let engine = OrderPath::new(vec![usd_eur, eur_btc]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .hop_limits(HopLimits::new(2, 2).unwrap())
        .tolerance_window(window("0", "0.10"))
        .result_limit(1)
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert_eq!(outcome.results.len(), 1);
    let result = &outcome.results[0];
    assert_eq!(result.route, vec![cur("USD"), cur("EUR"), cur("BTC")]);
    assert_eq!(result.hops, 2);
}

#[test]
fn s3_empty_order_book_yields_empty_outcome_not_error() {
    let engine = OrderPath::new(Vec::<Order>::new());
    let config = PathSearchConfig::builder(money("100", cur("USD"))).build().unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert!(outcome.results.is_empty());
    assert!(!outcome.guard_report.any());
}

#[test]
fn s4_source_asset_absent_from_graph() {
    let order = sell_btc_for_usd(0, "30303", "0.001", "10000");
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("EUR"))).build().unwrap();

    let outcome = engine.find_paths(config, "EUR", "BTC").unwrap();
    assert!(outcome.results.is_empty());
}

#[test]
fn s5_expansion_guard_trips_on_a_tight_budget() {
    let order = sell_btc_for_usd(0, "30303", "0.001", "10000");
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .max_expansions(1)
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert!(outcome.guard_report.expansions_reached);
    assert!(outcome.guard_report.any());
}

#[test]
fn s6_equal_cost_routes_ordered_lexicographically_by_signature() {
    let via_a = {
        let pair = AssetPair::new(cur("USD"), cur("AAA")).unwrap();
        let bounds = OrderBounds::new(money("10", cur("USD")), money("1000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::one(), cur("USD"), cur("AAA")).unwrap();
        Order::new(OrderId(0), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let a_to_btc = {
        let pair = AssetPair::new(cur("AAA"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("1", cur("AAA")), money("1000", cur("AAA"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.001").unwrap(), cur("AAA"), cur("BTC")).unwrap();
        Order::new(OrderId(1), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    // `via_z`'s bounds are deliberately wider than `via_a`'s: both hops
    // share the same rates (so the two routes tie on cost), but the wider
    // bounds project to a different spend range at `BTC`, keeping the two
    // routes from colliding on the search engine's per-node dominance key
    // and letting both survive to be ranked by route signature instead.
    let via_z = {
        let pair = AssetPair::new(cur("USD"), cur("ZZZ")).unwrap();
        let bounds = OrderBounds::new(money("10", cur("USD")), money("5000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::one(), cur("USD"), cur("ZZZ")).unwrap();
        Order::new(OrderId(2), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let z_to_btc = {
        let pair = AssetPair::new(cur("ZZZ"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("1", cur("ZZZ")), money("5000", cur("ZZZ"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.001").unwrap(), cur("ZZZ"), cur("BTC")).unwrap();
        Order::new(OrderId(3), Side::Buy, pair, bounds, rate, None).unwrap()
    };

    let engine = OrderPath::new(vec![via_a, a_to_btc, via_z, z_to_btc]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .hop_limits(HopLimits::new(2, 2).unwrap())
        .tolerance_window(window("0", "0.5"))
        .result_limit(2)
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].route, vec![cur("USD"), cur("AAA"), cur("BTC")]);
    assert_eq!(outcome.results[1].route, vec![cur("USD"), cur("ZZZ"), cur("BTC")]);
}

#[test]
fn s7_cycle_inducing_orders_cannot_reach_an_unconnected_target() {
    let usd_eur = {
        let pair = AssetPair::new(cur("USD"), cur("EUR")).unwrap();
        let bounds = OrderBounds::new(money("1", cur("USD")), money("1000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::one(), cur("USD"), cur("EUR")).unwrap();
        Order::new(OrderId(0), Side::Buy, pair, bounds, rate, None).unwrap()
    };
    let eur_usd = {
        let pair = AssetPair::new(cur("EUR"), cur("USD")).unwrap();
        let bounds = OrderBounds::new(money("1", cur("EUR")), money("1000", cur("EUR"))).unwrap();
        let rate = ExchangeRate::new(Decimal::one(), cur("EUR"), cur("USD")).unwrap();
        Order::new(OrderId(1), Side::Buy, pair, bounds, rate, None).unwrap()
    };

    let engine = OrderPath::new(vec![usd_eur, eur_usd]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .hop_limits(HopLimits::new(1, 10).unwrap())
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "JPY").unwrap();
    assert!(outcome.results.is_empty());
}

#[test]
fn s8_full_fee_leg_materializes_with_zero_net_received() {
    let order = {
        let pair = AssetPair::new(cur("USD"), cur("BTC")).unwrap();
        let bounds = OrderBounds::new(money("10", cur("USD")), money("1000", cur("USD"))).unwrap();
        let rate = ExchangeRate::new(Decimal::parse("0.0001").unwrap(), cur("USD"), cur("BTC")).unwrap();
        let fee_policy = FeePolicy::FixedRate {
            base_bps: 0,
            quote_bps: 10_000, // 100% of the quote amount
        };
        Order::new(OrderId(0), Side::Buy, pair, bounds, rate, Some(fee_policy)).unwrap()
    };
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .tolerance_window(window("0", "0"))
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC").unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].total_received.is_zero());
}

#[test]
fn s9_throw_on_guard_limit_raises_instead_of_returning_a_partial_outcome() {
    let order = sell_btc_for_usd(0, "30303", "0.001", "10000");
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .max_expansions(1)
        .throw_on_guard_limit(true)
        .build()
        .unwrap();

    let outcome = engine.find_paths(config, "USD", "BTC");
    assert!(matches!(outcome, Err(Error::Guard(_))));
}

#[test]
fn s10_disjoint_top_k_with_a_single_viable_order_stops_cleanly() {
    let order = sell_btc_for_usd(0, "30303", "0.001", "10000");
    let engine = OrderPath::new(vec![order]);
    let config = PathSearchConfig::builder(money("100", cur("USD")))
        .tolerance_window(window("0", "0.05"))
        .result_limit(3)
        .disjoint_plans(true)
        .build()
        .unwrap();

    let outcome = engine.find_execution_plans(config, "USD", "BTC").unwrap();
    assert_eq!(outcome.results.len(), 1);
}
