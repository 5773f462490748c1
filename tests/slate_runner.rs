//! Slate runner against a fixture odds provider.
//!
//! The fixture provider serves fixed events per sport from memory and can
//! be told to fail specific sports, so the runner's merge and partial-failure
//! behaviour can be checked without network access.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use linesmith::config::AppConfig;
use linesmith::engine::runner::SlateRunner;
use linesmith::platforms::{OddsProvider, SportInfo};
use linesmith::storage;
use linesmith::types::Event;

/// In-memory odds provider.
struct FixtureProvider {
    events: HashMap<String, Vec<Event>>,
    failing: Vec<String>,
    /// Market lists each fetch was called with.
    requests: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl FixtureProvider {
    fn new() -> Self {
        Self {
            events: HashMap::new(),
            failing: Vec::new(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_sport(mut self, sport: &str, events: Vec<Event>) -> Self {
        self.events.insert(sport.to_string(), events);
        self
    }

    fn failing(mut self, sport: &str) -> Self {
        self.failing.push(sport.to_string());
        self
    }
}

#[async_trait]
impl OddsProvider for FixtureProvider {
    async fn list_sports(&self) -> Result<Vec<SportInfo>> {
        Ok(self
            .events
            .keys()
            .map(|k| SportInfo {
                key: k.clone(),
                group: String::new(),
                title: k.clone(),
                active: true,
            })
            .collect())
    }

    async fn fetch_events(&self, sport_key: &str, markets: &[String]) -> Result<Vec<Event>> {
        self.requests
            .lock()
            .unwrap()
            .push((sport_key.to_string(), markets.to_vec()));
        if self.failing.iter().any(|s| s == sport_key) {
            return Err(anyhow!("fixture failure for {sport_key}"));
        }
        Ok(self.events.get(sport_key).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn event(id: &str, sport: &str, books: &[(&str, i32, i32)]) -> Event {
    let bookmakers: Vec<_> = books
        .iter()
        .map(|(key, h, a)| {
            json!({
                "key": key,
                "markets": [{"key": "h2h", "outcomes": [
                    {"name": "Home Club", "price": h},
                    {"name": "Away Club", "price": a}
                ]}]
            })
        })
        .collect();
    serde_json::from_value(json!({
        "id": id,
        "sport_key": sport,
        "commence_time": "2026-10-21T01:00:00Z",
        "home_team": "Home Club",
        "away_team": "Away Club",
        "bookmakers": bookmakers
    }))
    .unwrap()
}

fn config(toml: &str) -> AppConfig {
    let cfg = AppConfig::from_toml(toml).unwrap();
    cfg.validate().unwrap();
    cfg
}

#[tokio::test]
async fn runs_configured_sports_and_builds_parlays() {
    let provider = FixtureProvider::new()
        .with_sport(
            "baseball_mlb",
            vec![
                event("m1", "baseball_mlb", &[("fliff", -120, 110), ("fanduel", -118, 100)]),
                event("m2", "baseball_mlb", &[("fliff", 130, -150), ("fanduel", 125, -145)]),
            ],
        )
        .with_sport(
            "basketball_wnba",
            vec![event("w1", "basketball_wnba", &[("fliff", -300, 240), ("fanduel", -280, 230)])],
        );
    let requests = provider.requests.clone();

    let cfg = config(
        r#"
        [slate]
        sports = ["mlb", "wnba"]
        markets = ["h2h", "player_points"]
        "#,
    );
    let runner = SlateRunner::from_config(Box::new(provider), &cfg);
    let slate = runner.run().await.unwrap();

    assert_eq!(slate.events_scanned, 3);
    assert_eq!(slate.picks.len(), 6);
    assert_eq!(slate.parlays.len(), 3);
    assert!(slate.picks.windows(2).all(|w| w[0].ev_per_unit >= w[1].ev_per_unit));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(_, m)| m.contains(&"h2h".to_string())));
}

#[tokio::test]
async fn partial_failure_keeps_other_sports() {
    let provider = FixtureProvider::new()
        .with_sport(
            "baseball_mlb",
            vec![event("m1", "baseball_mlb", &[("fliff", -120, 110)])],
        )
        .failing("soccer_usa_mls");

    let cfg = config(
        r#"
        [slate]
        sports = ["mlb", "mls"]
        price_books = ["fliff"]
        "#,
    );
    let slate = SlateRunner::from_config(Box::new(provider), &cfg)
        .run()
        .await
        .unwrap();

    assert_eq!(slate.sports, vec!["baseball_mlb".to_string()]);
    assert_eq!(slate.picks.len(), 2);
    assert!(slate.picks.iter().all(|p| p.book == "fliff"));
    assert!(slate.parlays.is_empty());
}

#[tokio::test]
async fn total_failure_surfaces() {
    let provider = FixtureProvider::new().failing("baseball_mlb");
    let cfg = config("[slate]\nsports = [\"mlb\"]\n");
    let result = SlateRunner::from_config(Box::new(provider), &cfg).run().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn slate_round_trips_through_storage() {
    let provider = FixtureProvider::new().with_sport(
        "baseball_mlb",
        vec![
            event("m1", "baseball_mlb", &[("fliff", -120, 110)]),
            event("m2", "baseball_mlb", &[("fliff", 105, -125)]),
        ],
    );
    let cfg = config("[slate]\nsports = [\"mlb\"]\n");
    let slate = SlateRunner::from_config(Box::new(provider), &cfg)
        .run()
        .await
        .unwrap();

    let dir = std::env::temp_dir().join(format!("linesmith_it_{}", slate.id));
    let latest = dir.join("latest.json").to_string_lossy().to_string();
    storage::save_slate(&slate, Some(&latest)).unwrap();
    let loaded = storage::load_slate(Some(&latest)).unwrap().unwrap();
    assert_eq!(loaded.id, slate.id);
    assert_eq!(loaded.picks.len(), slate.picks.len());
    assert_eq!(loaded.parlays.len(), slate.parlays.len());

    let archive = dir.join("archive").to_string_lossy().to_string();
    let archived = storage::archive_slate(&slate, &archive).unwrap();
    assert!(archived.exists());
    let newest = storage::latest_archived(&archive).unwrap().unwrap();
    assert_eq!(newest.id, slate.id);

    std::fs::remove_dir_all(&dir).unwrap();
}
