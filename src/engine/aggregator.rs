//! Market aggregation.
//!
//! Two independent passes over one event's bookmaker quotes for one market
//! family:
//!
//! 1. **Consensus**: average every contributing book's raw implied
//!    probabilities per line, then de-vig the averages into a fair pair.
//!    Every book quoting both sides of a line contributes.
//! 2. **Best price**: the highest American price per (side, line) among
//!    the books allowed for execution, which may be a narrower set.
//!
//! Keeping the passes separate lets fairness be anchored to the whole
//! market while prices come only from the venues a user can actually bet.

use rust_decimal::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::strategy::odds::{american_to_implied_prob, devig_two_way};
use crate::types::{BookMarket, Bookmaker, Event, MarketFamily, Outcome};

// ---------------------------------------------------------------------------
// Sides and aliases
// ---------------------------------------------------------------------------

/// One of the two canonical sides of a two-outcome market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TwoWaySide {
    /// Home participant, or "Over".
    A,
    /// Away participant, or "Under".
    B,
}

impl TwoWaySide {
    pub const BOTH: [TwoWaySide; 2] = [TwoWaySide::A, TwoWaySide::B];

    fn index(self) -> usize {
        match self {
            TwoWaySide::A => 0,
            TwoWaySide::B => 1,
        }
    }
}

/// Per-event lookup from raw outcome labels to canonical sides.
///
/// Built once per event from its participant names. Lookups are
/// case-insensitive and ignore surrounding whitespace.
#[derive(Debug, Clone)]
pub struct SideAliases {
    labels: [String; 2],
    aliases: HashMap<String, TwoWaySide>,
}

impl SideAliases {
    /// Aliases that only recognise the two canonical labels themselves.
    pub fn new(side_a: &str, side_b: &str) -> Self {
        let mut aliases = HashMap::new();
        aliases.insert(normalize_label(side_a), TwoWaySide::A);
        aliases.insert(normalize_label(side_b), TwoWaySide::B);
        Self {
            labels: [side_a.to_string(), side_b.to_string()],
            aliases,
        }
    }

    /// Home/away aliases: the literal team names plus "home"/"away" tokens.
    pub fn for_participants(event: &Event) -> Self {
        let mut map = Self::new(&event.home_team, &event.away_team);
        map.aliases.insert("home".into(), TwoWaySide::A);
        map.aliases.insert("away".into(), TwoWaySide::B);
        map
    }

    /// The fixed "Over"/"Under" pair used by totals and props.
    pub fn over_under() -> Self {
        Self::new("Over", "Under")
    }

    /// Resolve a raw outcome label to its canonical side.
    pub fn resolve(&self, label: &str) -> Option<TwoWaySide> {
        self.aliases.get(&normalize_label(label)).copied()
    }

    /// Canonical label for a side.
    pub fn label(&self, side: TwoWaySide) -> &str {
        &self.labels[side.index()]
    }
}

fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Line keys
// ---------------------------------------------------------------------------

/// A point value quantized to hundredths so it can be used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(Decimal);

impl PointKey {
    /// Quantize a raw point. Non-finite values yield `None`.
    pub fn from_f64(point: f64) -> Option<Self> {
        Decimal::from_f64(point).map(|d| PointKey(d.round_dp(2).normalize()))
    }

    pub fn value(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// The same line seen from the other side (-3.5 ↔ +3.5).
    pub fn mirrored(&self) -> Self {
        PointKey((-self.0).normalize())
    }
}

/// Identifies one line of a market: the prop subject (if any) and the point
/// (absent for moneyline).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineKey {
    pub subject: Option<String>,
    pub point: Option<PointKey>,
}

/// How a family's two sides relate to the quoted point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointConvention {
    /// No point (moneyline).
    Unlined,
    /// Both sides quote the same number (totals, props).
    Shared,
    /// The second side quotes the negated number (spreads).
    Mirrored,
}

impl PointConvention {
    pub fn for_family(family: &MarketFamily) -> Self {
        match family {
            MarketFamily::Moneyline => PointConvention::Unlined,
            MarketFamily::Spread => PointConvention::Mirrored,
            MarketFamily::Total | MarketFamily::PlayerProp(_) => PointConvention::Shared,
        }
    }

    /// Convert between a consensus line (keyed from side A) and the point
    /// `side` actually quotes. The mapping is its own inverse.
    pub fn side_point(self, point: Option<PointKey>, side: TwoWaySide) -> Option<PointKey> {
        match (self, side, point) {
            (PointConvention::Unlined, _, _) => None,
            (PointConvention::Mirrored, TwoWaySide::B, Some(p)) => Some(p.mirrored()),
            (_, _, p) => p,
        }
    }
}

/// A quote that passed validation and alias resolution.
struct NormalizedQuote {
    side: TwoWaySide,
    price: i32,
    /// The point as quoted for this side.
    line: LineKey,
}

/// Validate and canonicalise one raw outcome. Incomplete records yield `None`.
fn normalize_quote(
    outcome: &Outcome,
    family: &MarketFamily,
    aliases: &SideAliases,
) -> Option<NormalizedQuote> {
    let side = aliases.resolve(outcome.name.as_deref()?)?;
    let price = outcome.price.filter(|p| *p != 0)?;

    let point = match PointConvention::for_family(family) {
        PointConvention::Unlined => None,
        _ => Some(PointKey::from_f64(outcome.point?)?),
    };

    let subject = match family {
        MarketFamily::PlayerProp(_) => outcome
            .description
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    };

    Some(NormalizedQuote {
        side,
        price,
        line: LineKey { subject, point },
    })
}

/// Whether a moneyline market carries a named outcome that is neither
/// participant, i.e. a three-way (home/draw/away) market.
fn is_three_way(market: &BookMarket, family: &MarketFamily, aliases: &SideAliases) -> bool {
    matches!(family, MarketFamily::Moneyline)
        && market
            .outcomes
            .iter()
            .filter_map(|o| o.name.as_deref())
            .any(|name| aliases.resolve(name).is_none())
}

/// Every outcome of `family` quoted by `book`. Three-way moneyline markets
/// are dropped whole: de-vigging two of three sides would inflate both.
fn family_outcomes<'a>(
    book: &'a Bookmaker,
    family: &'a MarketFamily,
    aliases: &'a SideAliases,
) -> impl Iterator<Item = &'a Outcome> + 'a {
    book.markets
        .iter()
        .filter(move |m| m.key == family.key())
        .filter(move |m| {
            let three_way = is_three_way(m, family, aliases);
            if three_way {
                debug!(book = %book.key, market = %m.key, "Skipping three-way market");
            }
            !three_way
        })
        .flat_map(|m| m.outcomes.iter())
}

// ---------------------------------------------------------------------------
// Consensus pass
// ---------------------------------------------------------------------------

/// Consensus no-vig probabilities for one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairPair {
    pub side_a: f64,
    pub side_b: f64,
    /// Number of bookmakers that quoted both sides.
    pub books: usize,
}

impl FairPair {
    pub fn get(&self, side: TwoWaySide) -> f64 {
        match side {
            TwoWaySide::A => self.side_a,
            TwoWaySide::B => self.side_b,
        }
    }
}

/// Running sums of raw implied probabilities for one line.
#[derive(Debug, Default)]
struct Bucket {
    raw_a: f64,
    raw_b: f64,
    count: usize,
}

/// Consensus fair probabilities per line across **all** bookmakers.
///
/// A book contributes to a line only when it quotes both sides of it.
/// Within one book, a repeated quote for the same side and line replaces
/// the earlier one.
pub fn consensus(
    bookmakers: &[Bookmaker],
    family: &MarketFamily,
    aliases: &SideAliases,
) -> BTreeMap<LineKey, FairPair> {
    let convention = PointConvention::for_family(family);
    let mut buckets: BTreeMap<LineKey, Bucket> = BTreeMap::new();

    for book in bookmakers {
        let mut quoted: HashMap<LineKey, [Option<i32>; 2]> = HashMap::new();

        for outcome in family_outcomes(book, family, aliases) {
            let Some(q) = normalize_quote(outcome, family, aliases) else {
                continue;
            };
            let line = LineKey {
                point: convention.side_point(q.line.point, q.side),
                subject: q.line.subject,
            };
            quoted.entry(line).or_default()[q.side.index()] = Some(q.price);
        }

        for (line, prices) in quoted {
            if let [Some(pa), Some(pb)] = prices {
                let bucket = buckets.entry(line).or_default();
                bucket.raw_a += american_to_implied_prob(pa);
                bucket.raw_b += american_to_implied_prob(pb);
                bucket.count += 1;
            }
        }
    }

    let mut fair = BTreeMap::new();
    for (line, bucket) in buckets {
        if bucket.count == 0 {
            continue;
        }
        let n = bucket.count as f64;
        match devig_two_way(bucket.raw_a / n, bucket.raw_b / n) {
            Ok((side_a, side_b)) => {
                fair.insert(
                    line,
                    FairPair {
                        side_a,
                        side_b,
                        books: bucket.count,
                    },
                );
            }
            Err(e) => debug!(market = %family, error = %e, "Skipping degenerate line"),
        }
    }

    fair
}

// ---------------------------------------------------------------------------
// Best-price pass
// ---------------------------------------------------------------------------

/// Identifies one executable selection: a side at the point it is quoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub side: TwoWaySide,
    pub line: LineKey,
}

/// The best available price for a selection and the book offering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPrice {
    pub price: i32,
    pub book: String,
}

/// Whether `book` may be used for pricing. An empty or absent filter allows all.
pub fn book_allowed(book: &str, allowed: Option<&[String]>) -> bool {
    match allowed {
        Some(list) if !list.is_empty() => list.iter().any(|b| b == book),
        _ => true,
    }
}

/// Highest American price per (side, quoted line) among allowed books.
/// Ties keep the first book seen.
pub fn best_prices(
    bookmakers: &[Bookmaker],
    family: &MarketFamily,
    aliases: &SideAliases,
    allowed: Option<&[String]>,
) -> HashMap<SelectionKey, BestPrice> {
    let mut best: HashMap<SelectionKey, BestPrice> = HashMap::new();
    let mut skipped = 0usize;

    for book in bookmakers.iter().filter(|b| book_allowed(&b.key, allowed)) {
        for outcome in family_outcomes(book, family, aliases) {
            let Some(q) = normalize_quote(outcome, family, aliases) else {
                skipped += 1;
                continue;
            };
            let key = SelectionKey {
                side: q.side,
                line: q.line,
            };
            match best.get(&key) {
                Some(current) if current.price >= q.price => {}
                _ => {
                    best.insert(
                        key,
                        BestPrice {
                            price: q.price,
                            book: book.key.clone(),
                        },
                    );
                }
            }
        }
    }

    if skipped > 0 {
        debug!(market = %family, skipped, "Skipped incomplete or unrecognised quotes");
    }

    best
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
