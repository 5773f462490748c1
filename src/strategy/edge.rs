//! Edge measurement and confidence tiering.
//!
//! Edge is the gap between the model probability and the consensus fair
//! probability, in percentage points. Tiers are assigned against two
//! configured thresholds.

use crate::types::Confidence;

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Tier thresholds in percentage points. `a_threshold` must be >= `b_threshold`.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    pub a_threshold: f64,
    pub b_threshold: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            a_threshold: 2.5,
            b_threshold: 1.0,
        }
    }
}

impl EdgeConfig {
    /// Tier for a given edge: A at or above `a_threshold`, B at or above
    /// `b_threshold`, C otherwise.
    pub fn tier_for(&self, edge_pct: f64) -> Confidence {
        if edge_pct >= self.a_threshold {
            Confidence::A
        } else if edge_pct >= self.b_threshold {
            Confidence::B
        } else {
            Confidence::C
        }
    }
}

/// Edge in percentage points.
pub fn edge_pct(model_prob: f64, fair_prob: f64) -> f64 {
    (model_prob - fair_prob) * 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
