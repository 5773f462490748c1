//! Sport and market catalog.
//!
//! Maps short sport aliases ("mlb", "wnba") to provider sport keys and
//! decides which requested markets a sport can actually be queried for.
//! Player props are only offered for some sport families, and an
//! unsupported prop in a request makes the provider reject the whole
//! call, so requests are filtered here first.

use tracing::debug;

// ---------------------------------------------------------------------------
// Sport aliases
// ---------------------------------------------------------------------------

struct SportAlias {
    aliases: &'static [&'static str],
    sport_key: &'static str,
}

const SPORT_ALIASES: &[SportAlias] = &[
    SportAlias { aliases: &["mlb", "baseball"], sport_key: "baseball_mlb" },
    SportAlias { aliases: &["wnba"], sport_key: "basketball_wnba" },
    SportAlias { aliases: &["nba", "basketball"], sport_key: "basketball_nba" },
    SportAlias { aliases: &["ncaab"], sport_key: "basketball_ncaab" },
    SportAlias { aliases: &["nfl", "football"], sport_key: "americanfootball_nfl" },
    SportAlias { aliases: &["ncaaf"], sport_key: "americanfootball_ncaaf" },
    SportAlias { aliases: &["nhl", "hockey"], sport_key: "icehockey_nhl" },
    SportAlias { aliases: &["mls"], sport_key: "soccer_usa_mls" },
    SportAlias { aliases: &["epl", "premier league"], sport_key: "soccer_epl" },
];

/// Resolve a configured sport name to a provider sport key.
///
/// Known aliases map to their key; anything else (including full keys such
/// as "baseball_mlb") passes through unchanged, lowercased.
pub fn resolve_sport_key(name: &str) -> String {
    let n = name.trim().to_lowercase();
    SPORT_ALIASES
        .iter()
        .find(|sa| sa.aliases.contains(&n.as_str()))
        .map(|sa| sa.sport_key.to_string())
        .unwrap_or(n)
}

/// Sport family: the part of the key before the first underscore.
/// "baseball_mlb" → "baseball".
pub fn sport_family(sport_key: &str) -> &str {
    sport_key.split_once('_').map(|(f, _)| f).unwrap_or(sport_key)
}

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Markets every sport supports.
pub const BASE_MARKETS: [&str; 3] = ["h2h", "spreads", "totals"];

struct PropAllowlist {
    family: &'static str,
    markets: &'static [&'static str],
}

const PROP_ALLOWLISTS: &[PropAllowlist] = &[
    PropAllowlist {
        family: "baseball",
        markets: &["player_strikeouts", "player_hits", "player_home_runs", "player_rbis"],
    },
    PropAllowlist {
        family: "basketball",
        markets: &["player_points", "player_assists", "player_rebounds", "player_three_points_made"],
    },
    PropAllowlist {
        family: "americanfootball",
        markets: &[
            "player_passing_yards",
            "player_rushing_yards",
            "player_receiving_yards",
            "player_pass_tds",
            "player_rush_tds",
            "player_rec_tds",
        ],
    },
    PropAllowlist {
        family: "soccer",
        markets: &["player_saves", "player_shots_on_target"],
    },
];

/// Player-prop markets supported for a sport key.
pub fn supported_props(sport_key: &str) -> &'static [&'static str] {
    let family = sport_family(sport_key);
    PROP_ALLOWLISTS
        .iter()
        .find(|pa| pa.family == family)
        .map(|pa| pa.markets)
        .unwrap_or(&[])
}

/// Filter requested market keys down to what `sport_key` supports.
///
/// Base markets always pass; props pass only if allowlisted for the
/// sport; anything else is dropped. If nothing survives, the base markets
/// are returned so the request never comes back empty.
pub fn supported_markets(sport_key: &str, requested: &[String]) -> Vec<String> {
    let props = supported_props(sport_key);
    let mut out: Vec<String> = Vec::new();

    for m in requested.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
        let keep = BASE_MARKETS.contains(&m) || (m.starts_with("player_") && props.contains(&m));
        if keep {
            if !out.iter().any(|o| o == m) {
                out.push(m.to_string());
            }
        } else {
            debug!(sport_key, market = m, "Dropping unsupported market");
        }
    }

    if out.is_empty() {
        return base_markets();
    }
    out
}

/// The base markets as owned strings.
pub fn base_markets() -> Vec<String> {
    BASE_MARKETS.iter().map(|m| m.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
