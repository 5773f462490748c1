//! Odds provider integrations.
//!
//! Defines the `OddsProvider` trait the slate runner consumes and the
//! Odds API implementation. The engine never talks to a provider itself;
//! it only sees the `Event`s a provider returns.

pub mod odds_api;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Event;

/// A sport the provider currently lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportInfo {
    pub key: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

/// Abstraction over sources of multi-bookmaker event quotes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Sports the provider can serve right now.
    async fn list_sports(&self) -> Result<Vec<SportInfo>>;

    /// Upcoming events with quotes for `markets` in one sport.
    ///
    /// Implementations filter `markets` to what the sport supports.
    async fn fetch_events(&self, sport_key: &str, markets: &[String]) -> Result<Vec<Event>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
