//! The Odds API (v4) integration.
//!
//! API docs: https://the-odds-api.com/liveapi/guides/v4/
//! Base URL: https://api.the-odds-api.com/v4
//! Auth: `apiKey` query parameter.
//!
//! Quotes are requested in American format. Market lists are filtered
//! per sport before the call; if the provider still rejects the list with
//! 422 (unsupported market for the sport), the call is retried once with
//! the base markets only.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::{OddsProvider, SportInfo};
use crate::data::sports::{base_markets, supported_markets};
use crate::types::Event;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const PROVIDER_NAME: &str = "the-odds-api";

/// Connection settings for the Odds API client.
#[derive(Debug, Clone)]
pub struct OddsApiSettings {
    pub base_url: String,
    /// Comma-separated provider regions, e.g. "us" or "us,us2".
    pub regions: String,
    /// Restrict responses to these bookmaker keys. Empty means all.
    pub bookmakers: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for OddsApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            regions: "us".to_string(),
            bookmakers: Vec::new(),
            timeout_secs: 25,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Odds API client.
pub struct OddsApiClient {
    http: Client,
    api_key: SecretString,
    settings: OddsApiSettings,
}

impl OddsApiClient {
    /// Create a new client. Fails if the API key is empty.
    pub fn new(api_key: SecretString, settings: OddsApiSettings) -> Result<Self> {
        if api_key.expose_secret().trim().is_empty() {
            anyhow::bail!("Missing Odds API key");
        }

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .user_agent("LINESMITH/0.1.0")
            .build()
            .context("Failed to build HTTP client for the Odds API")?;

        Ok(Self {
            http,
            api_key,
            settings,
        })
    }

    fn odds_url(&self, sport_key: &str) -> String {
        format!(
            "{}/sports/{}/odds",
            self.settings.base_url.trim_end_matches('/'),
            sport_key
        )
    }

    /// Query parameters for an odds request (API key excluded).
    fn odds_params(&self, markets: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("regions", self.settings.regions.clone()),
            ("markets", markets.join(",")),
            ("oddsFormat", "american".to_string()),
            ("dateFormat", "iso".to_string()),
        ];
        if !self.settings.bookmakers.is_empty() {
            params.push(("bookmakers", self.settings.bookmakers.join(",")));
        }
        params
    }

    async fn get_odds(&self, sport_key: &str, markets: &[String]) -> Result<reqwest::Response> {
        let url = self.odds_url(sport_key);
        debug!(url = %url, markets = %markets.join(","), "Fetching odds");

        self.http
            .get(&url)
            .query(&[("apiKey", self.api_key.expose_secret().as_str())])
            .query(&self.odds_params(markets))
            .send()
            .await
            .with_context(|| format!("Odds API request failed for {sport_key}"))
    }
}

#[async_trait]
impl OddsProvider for OddsApiClient {
    async fn list_sports(&self) -> Result<Vec<SportInfo>> {
        let url = format!("{}/sports", self.settings.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.expose_secret().as_str())])
            .send()
            .await
            .context("Odds API sports request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse Odds API sports response")
    }

    async fn fetch_events(&self, sport_key: &str, markets: &[String]) -> Result<Vec<Event>> {
        let filtered = supported_markets(sport_key, markets);
        let mut resp = self.get_odds(sport_key, &filtered).await?;

        if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
            warn!(
                sport_key,
                markets = %filtered.join(","),
                "Market list rejected, retrying with base markets"
            );
            resp = self.get_odds(sport_key, &base_markets()).await?;
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Odds API error {status} for {sport_key}: {body}");
        }

        if let Some(remaining) = resp
            .headers()
            .get("x-requests-remaining")
            .and_then(|v| v.to_str().ok())
        {
            debug!(sport_key, remaining, "Odds API quota");
        }

        let events: Vec<Event> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse Odds API events for {sport_key}"))?;

        info!(sport_key, events = events.len(), "Odds fetched");
        Ok(events)
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
