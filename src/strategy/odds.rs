//! Odds conversions.
//!
//! American ↔ decimal ↔ implied probability, plus two-way de-vigging.
//! Implied probabilities produced here are raw (vig-inclusive).

use crate::types::PricingError;

/// Convert American odds to decimal odds (total return per unit staked).
pub fn american_to_decimal(odds: i32) -> Result<f64, PricingError> {
    if odds == 0 {
        return Err(PricingError::InvalidOdds("American odds cannot be 0".into()));
    }
    let o = f64::from(odds);
    if odds > 0 {
        Ok(1.0 + o / 100.0)
    } else {
        Ok(1.0 + 100.0 / o.abs())
    }
}

/// Convert decimal odds back to American odds, rounded to the nearest integer.
pub fn decimal_to_american(dec: f64) -> Result<i32, PricingError> {
    if !(dec > 1.0) {
        return Err(PricingError::InvalidOdds(format!(
            "decimal odds must be > 1, got {dec}"
        )));
    }
    if dec >= 2.0 {
        Ok(((dec - 1.0) * 100.0).round() as i32)
    } else {
        Ok((-100.0 / (dec - 1.0)).round() as i32)
    }
}

/// Raw implied probability of an American price.
///
/// `+150` → 0.40, `-150` → 0.60. Includes the bookmaker's margin.
pub fn american_to_implied_prob(odds: i32) -> f64 {
    let o = f64::from(odds);
    if odds > 0 {
        100.0 / (o + 100.0)
    } else {
        o.abs() / (o.abs() + 100.0)
    }
}

/// Convert a probability in (0, 1) to the fair American price.
pub fn implied_prob_to_american(p: f64) -> Result<i32, PricingError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(PricingError::InvalidProbability(p));
    }
    if p < 0.5 {
        Ok((100.0 * (1.0 - p) / p).round() as i32)
    } else {
        Ok((-100.0 * p / (1.0 - p)).round() as i32)
    }
}

/// Remove the margin from a two-way market by normalizing both sides to sum to 1.
pub fn devig_two_way(p_a: f64, p_b: f64) -> Result<(f64, f64), PricingError> {
    let sum = p_a + p_b;
    if !(sum > 0.0) {
        return Err(PricingError::DegenerateMarket(sum));
    }
    Ok((p_a / sum, p_b / sum))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
