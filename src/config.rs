//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a partial (or missing) file still yields a
//! usable configuration. A handful of environment variables override file
//! values at startup; secrets are referenced by env-var name and resolved
//! via `std::env::var`. The engine itself only ever sees the resolved,
//! immutable values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::data::sports::resolve_sport_key;
use crate::platforms::odds_api::{OddsApiSettings, DEFAULT_BASE_URL};
use crate::strategy::edge::EdgeConfig;
use crate::strategy::kelly::KellyConfig;
use crate::strategy::near_miss::NearMissConfig;
use crate::strategy::parlay::ParlayConfig;
use crate::types::LinesmithError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub odds_api: OddsApiConfig,
    pub slate: SlateConfig,
    pub strategy: StrategyConfig,
    pub near_miss: NearMissSection,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OddsApiConfig {
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub base_url: String,
    pub regions: String,
    pub timeout_secs: u64,
}

impl Default for OddsApiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ODDS_API_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            regions: "us".to_string(),
            timeout_secs: 25,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SlateConfig {
    /// Sports to scan: provider keys or short aliases ("mlb").
    pub sports: Vec<String>,
    /// Bookmakers requested from the provider (fair-value universe).
    pub books: Vec<String>,
    /// Bookmakers allowed for pricing. Empty means any of `books`.
    pub price_books: Vec<String>,
    /// Requested markets; props are filtered per sport.
    pub markets: Vec<String>,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            sports: vec!["mlb".into(), "wnba".into(), "mls".into()],
            books: ["fliff", "betmgm", "draftkings", "fanduel", "caesars"]
                .iter()
                .map(|b| b.to_string())
                .collect(),
            price_books: Vec::new(),
            markets: vec!["h2h".into(), "spreads".into(), "totals".into()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StrategyConfig {
    pub kelly_fraction: f64,
    pub bankroll_units: f64,
    /// Edge (percentage points) for confidence tier A.
    pub edge_a_threshold: f64,
    /// Edge (percentage points) for confidence tier B.
    pub edge_b_threshold: f64,
    pub parlay_max_legs: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.25,
            bankroll_units: 100.0,
            edge_a_threshold: 2.5,
            edge_b_threshold: 1.0,
            parlay_max_legs: 4,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NearMissSection {
    pub ev_floor: f64,
    pub ev_ceiling: f64,
    pub limit: usize,
}

impl Default for NearMissSection {
    fn default() -> Self {
        let d = NearMissConfig::default();
        Self {
            ev_floor: d.ev_floor,
            ev_ceiling: d.ev_ceiling,
            limit: d.limit,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the latest slate JSON is written.
    pub slate_path: String,
    /// Also keep a timestamped copy of every slate here.
    pub archive_dir: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            slate_path: "linesmith_slate.json".to_string(),
            archive_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            debug!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    ///
    /// Recognised: `BOOKS`, `PRICE_BOOKS`, `SPORTS`, `MARKETS` (comma lists),
    /// `KELLY_FRACTION`, `EDGE_A_THRESHOLD`, `EDGE_B_THRESHOLD`,
    /// `PARLAY_MAX_LEGS`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BOOKS") {
            self.slate.books = split_list(&v);
        }
        if let Some(v) = get("PRICE_BOOKS") {
            self.slate.price_books = split_list(&v);
        }
        if let Some(v) = get("SPORTS") {
            self.slate.sports = split_list(&v);
        }
        if let Some(v) = get("MARKETS") {
            self.slate.markets = split_list(&v);
        }
        if let Some(v) = get("KELLY_FRACTION") {
            self.strategy.kelly_fraction = parse_var("KELLY_FRACTION", &v)?;
        }
        if let Some(v) = get("EDGE_A_THRESHOLD") {
            self.strategy.edge_a_threshold = parse_var("EDGE_A_THRESHOLD", &v)?;
        }
        if let Some(v) = get("EDGE_B_THRESHOLD") {
            self.strategy.edge_b_threshold = parse_var("EDGE_B_THRESHOLD", &v)?;
        }
        if let Some(v) = get("PARLAY_MAX_LEGS") {
            self.strategy.parlay_max_legs = parse_var("PARLAY_MAX_LEGS", &v)?;
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), LinesmithError> {
        let s = &self.strategy;
        if !(0.0..=1.0).contains(&s.kelly_fraction) {
            return Err(LinesmithError::Config(format!(
                "kelly_fraction must be in [0, 1], got {}",
                s.kelly_fraction
            )));
        }
        if !(s.bankroll_units > 0.0) {
            return Err(LinesmithError::Config(format!(
                "bankroll_units must be positive, got {}",
                s.bankroll_units
            )));
        }
        if s.edge_a_threshold < s.edge_b_threshold {
            return Err(LinesmithError::Config(format!(
                "edge_a_threshold ({}) must be >= edge_b_threshold ({})",
                s.edge_a_threshold, s.edge_b_threshold
            )));
        }
        let n = &self.near_miss;
        if !(n.ev_floor < n.ev_ceiling) {
            return Err(LinesmithError::Config(format!(
                "near-miss band [{}, {}) is empty",
                n.ev_floor, n.ev_ceiling
            )));
        }
        if self.slate.sports.is_empty() {
            return Err(LinesmithError::Config("no sports configured".into()));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    // -- Typed views for the engine --------------------------------------

    pub fn kelly(&self) -> KellyConfig {
        KellyConfig {
            fraction: self.strategy.kelly_fraction,
            bankroll_units: self.strategy.bankroll_units,
        }
    }

    pub fn edge(&self) -> EdgeConfig {
        EdgeConfig {
            a_threshold: self.strategy.edge_a_threshold,
            b_threshold: self.strategy.edge_b_threshold,
        }
    }

    pub fn parlays(&self) -> ParlayConfig {
        ParlayConfig {
            fun_max_legs: self.strategy.parlay_max_legs,
            ..ParlayConfig::default()
        }
    }

    pub fn near_misses(&self) -> NearMissConfig {
        NearMissConfig {
            ev_floor: self.near_miss.ev_floor,
            ev_ceiling: self.near_miss.ev_ceiling,
            limit: self.near_miss.limit,
        }
    }

    /// Provider sport keys with aliases resolved, duplicates removed.
    pub fn sport_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for key in self.slate.sports.iter().map(|s| resolve_sport_key(s)) {
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Player-prop keys among the requested markets.
    pub fn prop_markets(&self) -> Vec<String> {
        self.slate
            .markets
            .iter()
            .filter(|m| m.starts_with("player_"))
            .cloned()
            .collect()
    }

    pub fn odds_api_settings(&self) -> OddsApiSettings {
        OddsApiSettings {
            base_url: self.odds_api.base_url.clone(),
            regions: self.odds_api.regions.clone(),
            bookmakers: self.slate.books.clone(),
            timeout_secs: self.odds_api.timeout_secs,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .with_context(|| format!("Invalid value for {name}: {value}"))
}
