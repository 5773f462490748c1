//! Shared types for the LINESMITH engine.
//!
//! The input side mirrors the odds provider's event shape (events →
//! bookmakers → markets → outcomes). The output side holds the scored
//! records the engine emits: picks and parlays. Input records are never
//! mutated; output records are built once and handed out by value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Event input
// ---------------------------------------------------------------------------

/// A single scheduled contest with every bookmaker's quotes for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Provider sport key, e.g. "baseball_mlb".
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: Option<String>,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ {} ({})",
            self.sport_key,
            self.away_team,
            self.home_team,
            self.commence_time.format("%Y-%m-%d %H:%M UTC"),
        )
    }
}

impl Event {
    /// Helper to build a test/sample event with no quotes.
    #[cfg(test)]
    pub fn sample(home: &str, away: &str) -> Self {
        Event {
            id: "evt-001".to_string(),
            sport_key: "baseball_mlb".to_string(),
            sport_title: Some("MLB".to_string()),
            commence_time: Utc::now() + chrono::Duration::hours(6),
            home_team: home.to_string(),
            away_team: away.to_string(),
            bookmakers: Vec::new(),
        }
    }
}

/// One bookmaker's quote set for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    /// Bookmaker identifier, e.g. "draftkings".
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markets: Vec<BookMarket>,
}

/// One market (h2h, spreads, totals, player_*) as quoted by one bookmaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

/// A single quote: one bookmaker's American price for one outcome.
///
/// Every field is optional because books routinely omit some of them;
/// incomplete quotes are skipped during aggregation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub name: Option<String>,
    /// Signed American price. Zero is treated as malformed.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<i32>,
    /// Line value for spreads, totals and props. Absent for moneyline.
    #[serde(default, deserialize_with = "lenient_point")]
    pub point: Option<f64>,
    /// Subject of a player prop (the player's name).
    #[serde(default)]
    pub description: Option<String>,
}

impl Outcome {
    /// Convenience constructor for a fully-populated quote.
    pub fn new(name: &str, price: i32, point: Option<f64>) -> Self {
        Self {
            name: Some(name.to_string()),
            price: Some(price),
            point,
            description: None,
        }
    }
}

/// Integral JSON numbers (`-118`, `-118.0`) become a price; anything else
/// is dropped so one bad quote cannot fail the whole feed.
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integral_price))
}

fn integral_price(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let n = value.as_f64()?;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= f64::from(i32::MAX) {
        Some(n as i32)
    } else {
        None
    }
}

/// Numeric points only; strings and other shapes are dropped.
fn lenient_point<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_f64).filter(|p| p.is_finite()))
}

// ---------------------------------------------------------------------------
// Market families
// ---------------------------------------------------------------------------

/// The supported families of two-outcome markets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketFamily {
    Moneyline,
    Spread,
    Total,
    /// A player over/under market, keyed by the provider's market key.
    PlayerProp(String),
}

impl MarketFamily {
    /// The provider's market key for this family.
    pub fn key(&self) -> &str {
        match self {
            MarketFamily::Moneyline => "h2h",
            MarketFamily::Spread => "spreads",
            MarketFamily::Total => "totals",
            MarketFamily::PlayerProp(key) => key,
        }
    }

    /// Map a provider market key to a family. Unknown non-prop keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "h2h" => Some(MarketFamily::Moneyline),
            "spreads" => Some(MarketFamily::Spread),
            "totals" => Some(MarketFamily::Total),
            k if k.starts_with("player_") => Some(MarketFamily::PlayerProp(k.to_string())),
            _ => None,
        }
    }

    /// Whether quotes in this family must carry a point.
    pub fn requires_point(&self) -> bool {
        !matches!(self, MarketFamily::Moneyline)
    }
}

impl fmt::Display for MarketFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketFamily::Moneyline => write!(f, "moneyline"),
            MarketFamily::Spread => write!(f, "spread"),
            MarketFamily::Total => write!(f, "total"),
            MarketFamily::PlayerProp(key) => write!(f, "{key}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Picks
// ---------------------------------------------------------------------------

/// Confidence tier derived from edge thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    A,
    B,
    C,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::A => write!(f, "A"),
            Confidence::B => write!(f, "B"),
            Confidence::C => write!(f, "C"),
        }
    }
}

/// A scored single-selection recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pick {
    pub event_id: String,
    pub sport_key: String,
    pub commence_time: DateTime<Utc>,
    pub family: MarketFamily,
    /// Market label, e.g. "moneyline", "spread -3.5", "total 8.5".
    pub market: String,
    /// Selection label, e.g. "Yankees", "Yankees -1.5", "Over 8.5".
    pub selection: String,
    /// Bookmaker the price was taken from.
    pub book: String,
    pub american_odds: i32,
    pub decimal_odds: f64,
    /// Consensus no-vig probability across the whole market.
    pub fair_prob: f64,
    pub model_prob: f64,
    /// (model - fair) in percentage points.
    pub edge_pct: f64,
    pub ev_per_unit: f64,
    /// Recommended stake in bankroll units (>= 0).
    pub stake_units: f64,
    pub confidence: Confidence,
    pub reason: String,
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {:+} @ {} | fair {:.1}% | EV {:+.4} | stake {:.2}u | {}",
            self.selection,
            self.market,
            self.american_odds,
            self.book,
            self.fair_prob * 100.0,
            self.ev_per_unit,
            self.stake_units,
            self.confidence,
        )
    }
}

// ---------------------------------------------------------------------------
// Parlays
// ---------------------------------------------------------------------------

/// Named parlay buckets, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParlayTier {
    Conservative,
    Balanced,
    Fun,
}

impl fmt::Display for ParlayTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParlayTier::Conservative => write!(f, "Conservative"),
            ParlayTier::Balanced => write!(f, "Balanced"),
            ParlayTier::Fun => write!(f, "Fun"),
        }
    }
}

/// One leg of a parlay, copied out of the originating pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub event_id: String,
    pub selection: String,
    pub american_odds: i32,
    pub decimal_odds: f64,
    pub book: String,
}

/// A multi-leg combination bet priced under an independence assumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parlay {
    pub tier: ParlayTier,
    /// Display name, e.g. "Balanced 3-leg".
    pub name: String,
    pub legs: Vec<ParlayLeg>,
    pub combined_decimal: f64,
    pub est_hit_prob: f64,
    pub est_ev: f64,
    pub notes: String,
}

impl fmt::Display for Parlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let legs: Vec<&str> = self.legs.iter().map(|l| l.selection.as_str()).collect();
        write!(
            f,
            "{}: {} | dec {:.2} | hit {:.1}% | EV {:+.4}",
            self.name,
            legs.join(" + "),
            self.combined_decimal,
            self.est_hit_prob * 100.0,
            self.est_ev,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures raised by the odds-conversion layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid odds: {0}")]
    InvalidOdds(String),

    #[error("Invalid probability: {0} (must be strictly between 0 and 1)")]
    InvalidProbability(f64),

    #[error("Degenerate market: implied probabilities sum to {0}")]
    DegenerateMarket(f64),
}

/// Application-level error types for LINESMITH.
#[derive(Debug, thiserror::Error)]
pub enum LinesmithError {
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
