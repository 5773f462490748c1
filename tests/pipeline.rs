//! End-to-end pipeline tests over in-memory provider data.
//!
//! Events are built from the provider's JSON shape, scored, combined into
//! parlays and filtered for near-misses through the public API only.

use linesmith::strategy::near_miss::{find_near_misses, NearMissConfig};
use linesmith::strategy::odds::{american_to_decimal, american_to_implied_prob, devig_two_way};
use linesmith::strategy::parlay::{build_parlays, ParlayConfig};
use linesmith::strategy::{build_picks, sort_picks};
use linesmith::types::{Event, MarketFamily, ParlayTier};
use serde_json::json;
use std::collections::HashSet;

fn moneyline_event(id: &str, home: &str, away: &str, books: &[(&str, i32, i32)]) -> Event {
    let bookmakers: Vec<_> = books
        .iter()
        .map(|(key, h, a)| {
            json!({
                "key": key,
                "title": key,
                "markets": [{
                    "key": "h2h",
                    "outcomes": [
                        {"name": home, "price": h},
                        {"name": away, "price": a}
                    ]
                }]
            })
        })
        .collect();

    serde_json::from_value(json!({
        "id": id,
        "sport_key": "baseball_mlb",
        "commence_time": "2026-10-20T23:05:00Z",
        "home_team": home,
        "away_team": away,
        "bookmakers": bookmakers
    }))
    .unwrap()
}

#[test]
fn moneyline_consensus_and_best_price() {
    let event = moneyline_event("e1", "A", "B", &[("x", -120, 110), ("y", -123, 100)]);
    let picks = build_picks(&event, 0.25, 100.0, 2.5, 1.0, None);
    assert_eq!(picks.len(), 2);

    let raw_a = (american_to_implied_prob(-120) + american_to_implied_prob(-123)) / 2.0;
    let raw_b = (american_to_implied_prob(110) + american_to_implied_prob(100)) / 2.0;
    let (fair_a, fair_b) = devig_two_way(raw_a, raw_b).unwrap();
    assert!((fair_a - 0.5295).abs() < 2e-3);

    let a = picks.iter().find(|p| p.selection == "A").unwrap();
    assert_eq!(a.market, "moneyline");
    assert_eq!(a.family, MarketFamily::Moneyline);
    assert!((a.fair_prob - fair_a).abs() < 1e-12);
    assert_eq!(a.american_odds, -120);
    assert_eq!(a.decimal_odds, american_to_decimal(-120).unwrap());
    assert!(a.stake_units >= 0.0);

    let b = picks.iter().find(|p| p.selection == "B").unwrap();
    assert!((b.fair_prob - fair_b).abs() < 1e-12);
    assert_eq!(b.american_odds, 110);
    assert_eq!(b.book, "x");
}

#[test]
fn best_price_from_non_contributing_book() {
    // "solo" only quotes one side, so it cannot contribute to consensus,
    // but it still offers the best executable price for "A".
    let mut event = moneyline_event("e1", "A", "B", &[("x", -120, 110), ("y", -125, 105)]);
    let solo: linesmith::types::Bookmaker = serde_json::from_value(json!({
        "key": "solo",
        "markets": [{"key": "h2h", "outcomes": [{"name": "A", "price": 102}]}]
    }))
    .unwrap();
    event.bookmakers.push(solo);

    let picks = build_picks(&event, 0.25, 100.0, 2.5, 1.0, None);
    let a = picks.iter().find(|p| p.selection == "A").unwrap();
    assert_eq!(a.book, "solo");
    assert_eq!(a.american_odds, 102);

    let without = build_picks(
        &moneyline_event("e1", "A", "B", &[("x", -120, 110), ("y", -125, 105)]),
        0.25,
        100.0,
        2.5,
        1.0,
        None,
    );
    let a0 = without.iter().find(|p| p.selection == "A").unwrap();
    assert_eq!(a.fair_prob, a0.fair_prob);
    assert!(a.ev_per_unit > 0.0);
    assert!(a.stake_units > 0.0);
}

#[test]
fn full_slate_parlays_and_near_misses() {
    let events = [
        moneyline_event("e1", "Yankees", "Red Sox", &[("x", -120, 110), ("y", -118, 102)]),
        moneyline_event("e2", "Cubs", "Cardinals", &[("x", 135, -150), ("y", 140, -160)]),
        moneyline_event("e3", "Dodgers", "Giants", &[("x", -200, 175), ("y", -190, 165)]),
        moneyline_event("e4", "Mets", "Braves", &[("x", -102, -108), ("y", -105, -105)]),
    ];

    let mut picks: Vec<_> = events
        .iter()
        .flat_map(|e| build_picks(e, 0.25, 100.0, 2.5, 1.0, None))
        .collect();
    sort_picks(&mut picks);
    assert_eq!(picks.len(), 8);

    let parlays = build_parlays(&picks, &ParlayConfig::default());
    let tiers: Vec<_> = parlays.iter().map(|p| p.tier).collect();
    assert_eq!(tiers, vec![ParlayTier::Conservative, ParlayTier::Balanced, ParlayTier::Fun]);

    for parlay in &parlays {
        let ids: HashSet<_> = parlay.legs.iter().map(|l| l.event_id.as_str()).collect();
        assert_eq!(ids.len(), parlay.legs.len());
        let product: f64 = parlay.legs.iter().map(|l| l.decimal_odds).product();
        assert!((parlay.combined_decimal - product).abs() < 1e-9);
    }
    // 4 events → 4 / 3 = 1 → max(2, 1) = 2 legs
    assert_eq!(parlays[2].legs.len(), 2);

    let cfg = NearMissConfig::default();
    let near = find_near_misses(&picks, &cfg);
    assert!(near.len() <= cfg.limit);
    assert!(near
        .iter()
        .all(|p| p.ev_per_unit >= cfg.ev_floor && p.ev_per_unit < cfg.ev_ceiling));
    assert!(near.windows(2).all(|w| w[0].ev_per_unit >= w[1].ev_per_unit));
}

#[test]
fn single_event_yields_no_parlay() {
    let event = moneyline_event("only", "A", "B", &[("x", -120, 110)]);
    let picks = build_picks(&event, 0.25, 100.0, 2.5, 1.0, None);
    assert_eq!(picks.len(), 2);
    assert!(build_parlays(&picks, &ParlayConfig::default()).is_empty());
}

#[test]
fn totals_and_spreads_from_provider_json() {
    let event: Event = serde_json::from_value(json!({
        "id": "w1",
        "sport_key": "basketball_wnba",
        "commence_time": "2026-07-01T23:00:00Z",
        "home_team": "Las Vegas Aces",
        "away_team": "Seattle Storm",
        "bookmakers": [
            {
                "key": "fanduel",
                "markets": [
                    {"key": "spreads", "outcomes": [
                        {"name": "Las Vegas Aces", "price": -110, "point": -4.5},
                        {"name": "Seattle Storm", "price": -110, "point": 4.5}
                    ]},
                    {"key": "totals", "outcomes": [
                        {"name": "Over", "price": -112, "point": 164.5},
                        {"name": "Under", "price": -108, "point": 164.5}
                    ]}
                ]
            },
            {
                "key": "fliff",
                "markets": [
                    {"key": "spreads", "outcomes": [
                        {"name": "Las Vegas Aces", "price": -105, "point": -4.5},
                        {"name": "Seattle Storm", "price": -115, "point": 4.5}
                    ]},
                    {"key": "totals", "outcomes": [
                        {"name": "Over", "price": -110, "point": 165.5},
                        {"name": "Under", "price": -110, "point": 165.5},
                        {"name": "Over", "price": -110}
                    ]}
                ]
            }
        ]
    }))
    .unwrap();

    let allowed = vec!["fliff".to_string()];
    let picks = build_picks(&event, 0.25, 100.0, 2.5, 1.0, Some(&allowed));

    assert!(picks.iter().all(|p| p.book == "fliff"));
    let aces = picks.iter().find(|p| p.selection == "Las Vegas Aces -4.5").unwrap();
    assert_eq!(aces.american_odds, -105);
    assert_eq!(aces.family, MarketFamily::Spread);

    // fliff prices 165.5, which only fliff quotes; 164.5 has no fliff price
    let totals: Vec<_> = picks.iter().filter(|p| p.family == MarketFamily::Total).collect();
    assert_eq!(totals.len(), 2);
    assert!(totals.iter().all(|p| p.market == "total 165.5"));
    assert!(totals.iter().all(|p| (p.fair_prob - 0.5).abs() < 1e-12));
}
