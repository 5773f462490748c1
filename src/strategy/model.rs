//! Probability models.
//!
//! A model maps a priced selection to a win probability. The shipped
//! `MarketAnchored` model simply trusts the consensus fair probability;
//! a predictive model plugs in here without touching aggregation,
//! EV or staking.

use crate::types::{Event, MarketFamily};

/// Everything a model may look at when scoring one selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub event: &'a Event,
    pub family: &'a MarketFamily,
    /// Canonical outcome label (participant name, "Over" or "Under").
    pub outcome: &'a str,
    /// Player for props, when the provider supplies one.
    pub subject: Option<&'a str>,
    pub point: Option<f64>,
    /// Consensus no-vig probability for this selection.
    pub fair_prob: f64,
}

/// Source of model win probabilities.
pub trait ProbabilityModel: Send + Sync {
    /// Win probability for the selection, in (0, 1).
    fn probability(&self, ctx: &SelectionContext<'_>) -> f64;

    /// Model name for logging and pick rationale.
    fn name(&self) -> &str;
}

/// Uses the market's own consensus as the model probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketAnchored;

impl ProbabilityModel for MarketAnchored {
    fn probability(&self, ctx: &SelectionContext<'_>) -> f64 {
        ctx.fair_prob
    }

    fn name(&self) -> &str {
        "market-anchored"
    }
}
