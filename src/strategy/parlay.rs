//! Parlay assembly.
//!
//! Takes the best pick per event, ranks those by EV, and fills fixed-size
//! buckets from the top of the list. Legs are priced as independent, so a
//! parlay never holds two legs from the same event.

use std::collections::HashMap;
use tracing::debug;

use crate::types::{Parlay, ParlayLeg, ParlayTier, Pick};

/// Maximum number of one-per-event candidates considered for legs.
pub const MAX_CANDIDATES: usize = 12;

const INDEPENDENCE_NOTE: &str =
    "Assumes independent legs; same-event correlation is not modeled.";

/// Leg counts for each bucket.
#[derive(Debug, Clone)]
pub struct ParlayConfig {
    pub conservative_legs: usize,
    pub balanced_legs: usize,
    /// Upper bound on the "Fun" bucket's leg count.
    pub fun_max_legs: usize,
}

impl Default for ParlayConfig {
    fn default() -> Self {
        Self {
            conservative_legs: 2,
            balanced_legs: 3,
            fun_max_legs: 4,
        }
    }
}

/// The highest-EV pick of each event, ranked by EV and capped at
/// `MAX_CANDIDATES`. On EV ties the earlier pick wins.
pub fn best_per_event(picks: &[Pick]) -> Vec<&Pick> {
    let mut order: Vec<&Pick> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for pick in picks {
        match index.get(pick.event_id.as_str()) {
            Some(&i) => {
                if pick.ev_per_unit > order[i].ev_per_unit {
                    order[i] = pick;
                }
            }
            None => {
                index.insert(pick.event_id.as_str(), order.len());
                order.push(pick);
            }
        }
    }

    order.sort_by(|a, b| b.ev_per_unit.total_cmp(&a.ev_per_unit));
    order.truncate(MAX_CANDIDATES);
    order
}

/// Build up to three parlays (Conservative, Balanced, Fun) from ranked picks.
///
/// A bucket needing more legs than there are distinct events is omitted,
/// as is any bucket configured below two legs.
pub fn build_parlays(picks: &[Pick], config: &ParlayConfig) -> Vec<Parlay> {
    let candidates = best_per_event(picks);
    let fun_legs = config
        .fun_max_legs
        .min((candidates.len() / 3).max(2));

    let buckets = [
        (ParlayTier::Conservative, config.conservative_legs),
        (ParlayTier::Balanced, config.balanced_legs),
        (ParlayTier::Fun, fun_legs),
    ];

    let mut parlays = Vec::new();
    for (tier, n_legs) in buckets {
        if n_legs < 2 || candidates.len() < n_legs {
            debug!(
                tier = %tier,
                needed = n_legs,
                available = candidates.len(),
                "Not enough distinct events for parlay"
            );
            continue;
        }
        parlays.push(combine(tier, &candidates[..n_legs]));
    }

    parlays
}

/// Price a set of legs as independent events.
fn combine(tier: ParlayTier, legs: &[&Pick]) -> Parlay {
    let est_hit_prob: f64 = legs.iter().map(|l| l.model_prob).product();
    let combined_decimal: f64 = legs.iter().map(|l| l.decimal_odds).product();
    let est_ev = est_hit_prob * (combined_decimal - 1.0) - (1.0 - est_hit_prob);

    let name = match tier {
        ParlayTier::Fun => tier.to_string(),
        _ => format!("{tier} {}-leg", legs.len()),
    };

    Parlay {
        tier,
        name,
        legs: legs
            .iter()
            .map(|l| ParlayLeg {
                event_id: l.event_id.clone(),
                selection: l.selection.clone(),
                american_odds: l.american_odds,
                decimal_odds: l.decimal_odds,
                book: l.book.clone(),
            })
            .collect(),
        combined_decimal,
        est_hit_prob,
        est_ev,
        notes: INDEPENDENCE_NOTE.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
