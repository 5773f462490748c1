//! LINESMITH: consensus pricing and pick ranking for sportsbook markets.
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, fetches one slate from the odds provider, logs the results
//! and persists them to disk.

use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::info;

use linesmith::config::{self, AppConfig};
use linesmith::engine::runner::{explain_pick, SlateRunner};
use linesmith::platforms::odds_api::OddsApiClient;
use linesmith::platforms::OddsProvider;
use linesmith::storage;

/// How many top picks to log.
const TOP_PICKS: usize = 15;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let mut cfg = config::AppConfig::load_or_default(&config_path)?;
    cfg.apply_env_overrides()?;

    init_logging();
    cfg.validate()?;

    info!(
        config = %config_path,
        sports = ?cfg.sport_keys(),
        books = ?cfg.slate.books,
        price_books = ?cfg.slate.price_books,
        kelly_fraction = cfg.strategy.kelly_fraction,
        bankroll_units = cfg.strategy.bankroll_units,
        "LINESMITH starting up"
    );

    let api_key = AppConfig::resolve_env(&cfg.odds_api.api_key_env)
        .context("Odds API key is required")?;
    let provider = OddsApiClient::new(SecretString::new(api_key), cfg.odds_api_settings())?;
    info!(provider = provider.name(), "Odds provider ready");

    let runner = SlateRunner::from_config(Box::new(provider), &cfg);
    let slate = runner.run().await?;

    for pick in slate.picks.iter().take(TOP_PICKS) {
        info!(event_id = %pick.event_id, "{}", explain_pick(pick));
    }
    if slate.parlays.is_empty() {
        info!("Not enough distinct events to form parlays");
    }
    for parlay in &slate.parlays {
        info!(legs = parlay.legs.len(), "{parlay}");
    }
    for pick in &slate.near_misses {
        info!(ev = pick.ev_per_unit, "Near miss: {pick}");
    }

    storage::save_slate(&slate, Some(&cfg.output.slate_path))?;
    if let Some(dir) = &cfg.output.archive_dir {
        storage::archive_slate(&slate, dir)?;
    }
    info!(
        id = %slate.id,
        events = slate.events_scanned,
        picks = slate.picks.len(),
        positive_ev = slate.positive_ev().count(),
        path = %cfg.output.slate_path,
        "Slate written"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linesmith=info"));

    let json_logging = std::env::var("LINESMITH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
