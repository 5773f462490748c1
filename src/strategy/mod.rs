//! Strategy engine: pick scoring, Kelly sizing, parlays and near-misses.
//!
//! `PickBuilder` joins the aggregator's consensus fair probabilities with
//! the best executable prices and scores every selection that has both.

pub mod edge;
pub mod kelly;
pub mod model;
pub mod near_miss;
pub mod odds;
pub mod parlay;

use tracing::debug;

use crate::data::sports::supported_markets;
use crate::engine::aggregator::{
    best_prices, consensus, LineKey, PointConvention, SelectionKey, SideAliases, TwoWaySide,
};
use crate::types::{Event, MarketFamily, Pick};
use edge::{edge_pct, EdgeConfig};
use kelly::{expected_value_per_unit, kelly_stake_units, KellyConfig};
use model::{MarketAnchored, ProbabilityModel, SelectionContext};
use odds::american_to_decimal;

// ---------------------------------------------------------------------------
// Pick builder
// ---------------------------------------------------------------------------

/// Scores one event's quotes into ranked picks.
///
/// Construct once per run from configuration; `build_picks` is a pure
/// function of the event and the allowed pricing books.
pub struct PickBuilder {
    kelly: KellyConfig,
    edge: EdgeConfig,
    model: Box<dyn ProbabilityModel>,
    /// Requested player-prop market keys, filtered per sport at build time.
    prop_markets: Vec<String>,
}

impl PickBuilder {
    pub fn new(kelly: KellyConfig, edge: EdgeConfig) -> Self {
        Self {
            kelly,
            edge,
            model: Box::new(MarketAnchored),
            prop_markets: Vec::new(),
        }
    }

    /// Replace the market-anchored model.
    pub fn with_model(mut self, model: Box<dyn ProbabilityModel>) -> Self {
        self.model = model;
        self
    }

    /// Also score these player-prop markets where the sport supports them.
    pub fn with_prop_markets(mut self, markets: Vec<String>) -> Self {
        self.prop_markets = markets;
        self
    }

    pub fn kelly(&self) -> &KellyConfig {
        &self.kelly
    }

    pub fn edge(&self) -> &EdgeConfig {
        &self.edge
    }

    pub fn model(&self) -> &dyn ProbabilityModel {
        self.model.as_ref()
    }

    /// Market families scored for this event: the base three plus any
    /// requested props the sport supports.
    pub fn families_for(&self, event: &Event) -> Vec<MarketFamily> {
        let mut families = vec![MarketFamily::Moneyline, MarketFamily::Spread, MarketFamily::Total];
        if !self.prop_markets.is_empty() {
            families.extend(
                supported_markets(&event.sport_key, &self.prop_markets)
                    .iter()
                    .filter_map(|k| MarketFamily::from_key(k))
                    .filter(|f| matches!(f, MarketFamily::PlayerProp(_))),
            );
        }
        families
    }

    /// Score every supported market of `event`, ranked by EV then stake.
    ///
    /// `allowed_books` restricts where prices are taken from; fair values
    /// always use every book. `None` or an empty list allows all books.
    pub fn build_picks(&self, event: &Event, allowed_books: Option<&[String]>) -> Vec<Pick> {
        let mut picks: Vec<Pick> = self
            .families_for(event)
            .iter()
            .flat_map(|family| self.score_family(event, family, allowed_books))
            .collect();

        sort_picks(&mut picks);

        debug!(
            event_id = %event.id,
            picks = picks.len(),
            "Event scored"
        );

        picks
    }

    /// Score a single market family of `event`, ranked by EV then stake.
    pub fn build_market_picks(
        &self,
        event: &Event,
        family: &MarketFamily,
        allowed_books: Option<&[String]>,
    ) -> Vec<Pick> {
        let mut picks = self.score_family(event, family, allowed_books);
        sort_picks(&mut picks);
        picks
    }

    fn score_family(
        &self,
        event: &Event,
        family: &MarketFamily,
        allowed_books: Option<&[String]>,
    ) -> Vec<Pick> {
        let aliases = match family {
            MarketFamily::Moneyline | MarketFamily::Spread => SideAliases::for_participants(event),
            MarketFamily::Total | MarketFamily::PlayerProp(_) => SideAliases::over_under(),
        };
        let convention = PointConvention::for_family(family);

        let fair = consensus(&event.bookmakers, family, &aliases);
        let best = best_prices(&event.bookmakers, family, &aliases, allowed_books);

        let mut picks = Vec::new();
        for (line, pair) in &fair {
            for side in TwoWaySide::BOTH {
                let fair_prob = pair.get(side);
                if !(fair_prob > 0.0 && fair_prob < 1.0) {
                    continue;
                }

                let key = SelectionKey {
                    side,
                    line: LineKey {
                        subject: line.subject.clone(),
                        point: convention.side_point(line.point, side),
                    },
                };
                let Some(price) = best.get(&key) else {
                    debug!(
                        event_id = %event.id,
                        market = %family,
                        side = ?side,
                        "No allowed book quotes this exact line"
                    );
                    continue;
                };

                let Ok(decimal_odds) = american_to_decimal(price.price) else {
                    continue;
                };

                let outcome = aliases.label(side);
                let side_point = key.line.point.map(|p| p.value());
                let ctx = SelectionContext {
                    event,
                    family,
                    outcome,
                    subject: line.subject.as_deref(),
                    point: side_point,
                    fair_prob,
                };
                let model_prob = self.model.probability(&ctx);
                if !(model_prob > 0.0 && model_prob < 1.0) {
                    debug!(
                        event_id = %event.id,
                        model = self.model.name(),
                        model_prob,
                        "Model probability out of range"
                    );
                    continue;
                }

                let edge = edge_pct(model_prob, fair_prob);
                let (market, selection) =
                    labels(family, outcome, line.subject.as_deref(), line.point.map(|p| p.value()), side_point);

                picks.push(Pick {
                    event_id: event.id.clone(),
                    sport_key: event.sport_key.clone(),
                    commence_time: event.commence_time,
                    family: family.clone(),
                    reason: format!(
                        "Consensus fair {:.2}% from {} book(s); {} model; priced at {} ({}).",
                        fair_prob * 100.0,
                        pair.books,
                        self.model.name(),
                        price.price,
                        price.book,
                    ),
                    market,
                    selection,
                    book: price.book.clone(),
                    american_odds: price.price,
                    decimal_odds,
                    fair_prob,
                    model_prob,
                    edge_pct: edge,
                    ev_per_unit: expected_value_per_unit(model_prob, decimal_odds),
                    stake_units: kelly_stake_units(model_prob, decimal_odds, &self.kelly),
                    confidence: self.edge.tier_for(edge),
                });
            }
        }

        picks
    }
}

/// Market and selection labels for a scored side.
fn labels(
    family: &MarketFamily,
    outcome: &str,
    subject: Option<&str>,
    line_point: Option<f64>,
    side_point: Option<f64>,
) -> (String, String) {
    match (family, line_point, side_point) {
        (MarketFamily::Spread, Some(line), Some(own)) => (
            format!("spread {}", format_point(line, true)),
            format!("{outcome} {}", format_point(own, true)),
        ),
        (MarketFamily::Total, Some(line), _) => {
            let line = format_point(line, false);
            (format!("total {line}"), format!("{outcome} {line}"))
        }
        (MarketFamily::PlayerProp(key), Some(line), _) => {
            let line = format_point(line, false);
            let selection = match subject {
                Some(player) => format!("{player} {outcome} {line}"),
                None => format!("{outcome} {line}"),
            };
            (format!("{key} {line}"), selection)
        }
        _ => (family.to_string(), outcome.to_string()),
    }
}

/// Render a point with at least one decimal place ("9.0", "-4.5", "+3.0").
fn format_point(point: f64, signed: bool) -> String {
    // Collapse -0.0 so a pick'em spread prints "+0.0"
    let point = if point == 0.0 { 0.0 } else { point };
    let text = if point.fract() == 0.0 {
        format!("{point:.1}")
    } else {
        format!("{point}")
    };
    if signed && point >= 0.0 {
        format!("+{text}")
    } else {
        text
    }
}

/// Order picks by descending EV, ties broken by descending stake.
pub fn sort_picks(picks: &mut [Pick]) {
    picks.sort_by(|a, b| {
        b.ev_per_unit
            .total_cmp(&a.ev_per_unit)
            .then(b.stake_units.total_cmp(&a.stake_units))
    });
}

/// Score one event with the market-anchored model.
///
/// Convenience entry point over `PickBuilder` for callers that hold raw
/// settings rather than a configured builder. Only moneyline, spreads and
/// totals are scored here; player props are skipped even when the event
/// carries them. Use `PickBuilder::with_prop_markets` to score props.
pub fn build_picks(
    event: &Event,
    kelly_fraction: f64,
    bankroll_units: f64,
    edge_a_threshold: f64,
    edge_b_threshold: f64,
    allowed_books: Option<&[String]>,
) -> Vec<Pick> {
    PickBuilder::new(
        KellyConfig {
            fraction: kelly_fraction,
            bankroll_units,
        },
        EdgeConfig {
            a_threshold: edge_a_threshold,
            b_threshold: edge_b_threshold,
        },
    )
    .build_picks(event, allowed_books)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
