//! Expected value and fractional Kelly stake sizing.
//!
//! Stakes are expressed in bankroll units and rounded to cents with
//! `rust_decimal` (banker's rounding) so serialized slates carry clean
//! two-decimal values.

use rust_decimal::prelude::*;
use tracing::debug;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (0.25 = quarter-Kelly), in [0, 1].
    pub fraction: f64,
    /// Bankroll size in units.
    pub bankroll_units: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            fraction: 0.25,
            bankroll_units: 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculations
// ---------------------------------------------------------------------------

/// Expected profit per unit staked at `decimal_odds` when the win
/// probability is `model_prob`. Negative for most efficiently-priced quotes.
pub fn expected_value_per_unit(model_prob: f64, decimal_odds: f64) -> f64 {
    model_prob * (decimal_odds - 1.0) - (1.0 - model_prob)
}

/// Fractional Kelly stake in bankroll units.
///
/// Kelly formula: f* = (bp - q) / b
/// where:
///   b = net odds (decimal - 1)
///   p = model win probability
///   q = 1 - p
///
/// Never negative: a non-positive `b` or edge yields 0.
pub fn kelly_stake_units(model_prob: f64, decimal_odds: f64, config: &KellyConfig) -> f64 {
    let b = decimal_odds - 1.0;
    if b <= 0.0 {
        return 0.0;
    }

    let edge = b * model_prob - (1.0 - model_prob);
    let kelly = (edge / b).max(0.0);
    let raw = config.bankroll_units * kelly * config.fraction;

    let stake = round_units(raw).max(0.0);

    if stake > 0.0 {
        debug!(
            model_prob,
            decimal_odds,
            raw_kelly = format!("{:.2}%", kelly * 100.0),
            stake,
            "Stake sized"
        );
    }

    stake
}

/// Round to two decimal places.
fn round_units(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(2))
        .and_then(|d| d.to_f64())
        .unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
