//! Slate runner: fetch, aggregate, score, combine.
//!
//! Fetches every configured sport from the odds provider concurrently,
//! scores each event independently, then merges the picks and derives
//! parlays and near-misses from the merged list. A sport whose fetch
//! fails is logged and skipped; the run only fails if every sport does.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::platforms::OddsProvider;
use crate::strategy::near_miss::{find_near_misses, NearMissConfig};
use crate::strategy::parlay::{build_parlays, ParlayConfig};
use crate::strategy::{sort_picks, PickBuilder};
use crate::types::{Event, LinesmithError, Parlay, Pick};

// ---------------------------------------------------------------------------
// Slate
// ---------------------------------------------------------------------------

/// Output of one run: every ranked pick plus the derived parlays and
/// near-misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slate {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Sports that were fetched successfully.
    pub sports: Vec<String>,
    pub events_scanned: usize,
    pub picks: Vec<Pick>,
    pub parlays: Vec<Parlay>,
    pub near_misses: Vec<Pick>,
}

impl Slate {
    /// Picks with positive expected value.
    pub fn positive_ev(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(|p| p.ev_per_unit > 0.0)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// What a run covers and how results are post-processed.
#[derive(Debug, Clone, Default)]
pub struct SlateSettings {
    /// Provider sport keys.
    pub sports: Vec<String>,
    /// Requested market keys (filtered per sport by the provider).
    pub markets: Vec<String>,
    /// Books allowed for pricing. Empty allows every book.
    pub price_books: Vec<String>,
    pub parlays: ParlayConfig,
    pub near_misses: NearMissConfig,
}

pub struct SlateRunner {
    provider: Box<dyn OddsProvider>,
    builder: PickBuilder,
    settings: SlateSettings,
}

impl SlateRunner {
    pub fn new(provider: Box<dyn OddsProvider>, builder: PickBuilder, settings: SlateSettings) -> Self {
        Self {
            provider,
            builder,
            settings,
        }
    }

    /// Wire a runner from application configuration.
    pub fn from_config(provider: Box<dyn OddsProvider>, cfg: &AppConfig) -> Self {
        let builder = PickBuilder::new(cfg.kelly(), cfg.edge()).with_prop_markets(cfg.prop_markets());
        let settings = SlateSettings {
            sports: cfg.sport_keys(),
            markets: cfg.slate.markets.clone(),
            price_books: cfg.slate.price_books.clone(),
            parlays: cfg.parlays(),
            near_misses: cfg.near_misses(),
        };
        Self::new(provider, builder, settings)
    }

    pub fn settings(&self) -> &SlateSettings {
        &self.settings
    }

    fn allowed_books(&self) -> Option<&[String]> {
        if self.settings.price_books.is_empty() {
            None
        } else {
            Some(&self.settings.price_books)
        }
    }

    /// Fetch every configured sport and build a slate.
    pub async fn run(&self) -> Result<Slate> {
        let fetches = self.settings.sports.iter().map(|sport| async move {
            let result = self.provider.fetch_events(sport, &self.settings.markets).await;
            (sport.clone(), result)
        });

        let mut events = Vec::new();
        let mut fetched = Vec::new();
        let mut last_error = None;

        for (sport, result) in join_all(fetches).await {
            match result {
                Ok(mut batch) => {
                    info!(sport_key = %sport, events = batch.len(), "Sport fetched");
                    events.append(&mut batch);
                    fetched.push(sport);
                }
                Err(e) => {
                    warn!(sport_key = %sport, error = %e, "Sport fetch failed, skipping");
                    last_error = Some(e.to_string());
                }
            }
        }

        if fetched.is_empty() {
            if let Some(message) = last_error {
                return Err(LinesmithError::Provider {
                    provider: "odds".to_string(),
                    message: format!("every sport fetch failed; last error: {message}"),
                }
                .into());
            }
        }

        Ok(self.assemble(&events, fetched))
    }

    /// Score already-fetched events into a slate. Pure apart from the
    /// slate id and timestamp.
    pub fn assemble(&self, events: &[Event], sports: Vec<String>) -> Slate {
        let allowed = self.allowed_books();

        let mut picks: Vec<Pick> = events
            .iter()
            .flat_map(|event| self.builder.build_picks(event, allowed))
            .collect();
        sort_picks(&mut picks);

        let parlays = build_parlays(&picks, &self.settings.parlays);
        let near_misses = find_near_misses(&picks, &self.settings.near_misses);

        info!(
            events = events.len(),
            picks = picks.len(),
            positive_ev = picks.iter().filter(|p| p.ev_per_unit > 0.0).count(),
            parlays = parlays.len(),
            near_misses = near_misses.len(),
            "Slate assembled"
        );

        Slate {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            sports,
            events_scanned: events.len(),
            picks,
            parlays,
            near_misses,
        }
    }
}

/// One-line human-readable explanation of a pick.
pub fn explain_pick(pick: &Pick) -> String {
    format!(
        "{} ({}) at {:+} on {}: Fair={:.1}%, Model={:.1}%, EV={:.3} per unit, stake {:.2}u [{}]. {}",
        pick.selection,
        pick.market,
        pick.american_odds,
        pick.book,
        pick.fair_prob * 100.0,
        pick.model_prob * 100.0,
        pick.ev_per_unit,
        pick.stake_units,
        pick.confidence,
        pick.reason,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
