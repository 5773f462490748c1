//! Persistence layer.
//!
//! A run writes its slate to a single "latest" JSON file and, when an
//! archive directory is configured, also to a timestamped file so earlier
//! slates can be compared against closing lines later.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::engine::runner::Slate;

/// Default slate file path.
const DEFAULT_SLATE_FILE: &str = "linesmith_slate.json";

const ARCHIVE_PREFIX: &str = "slate-";

/// Save a slate to a JSON file, creating parent directories as needed.
pub fn save_slate(slate: &Slate, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SLATE_FILE);
    write_slate(slate, Path::new(path))?;
    debug!(path, picks = slate.picks.len(), "Slate saved");
    Ok(())
}

/// Load a slate from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_slate(path: Option<&str>) -> Result<Option<Slate>> {
    let path = path.unwrap_or(DEFAULT_SLATE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved slate found");
        return Ok(None);
    }

    let slate = read_slate(Path::new(path))?;
    info!(
        path,
        id = %slate.id,
        generated_at = %slate.generated_at,
        picks = slate.picks.len(),
        parlays = slate.parlays.len(),
        "Slate loaded from disk"
    );

    Ok(Some(slate))
}

/// Archive file name for a slate: generation time (UTC) then the short id,
/// so names sort chronologically.
pub fn archive_file_name(slate: &Slate) -> String {
    let id = slate.id.simple().to_string();
    format!(
        "{ARCHIVE_PREFIX}{}-{}.json",
        slate.generated_at.format("%Y%m%dT%H%M%SZ"),
        &id[..8]
    )
}

/// Write a slate into `dir` under its archive name and return the path.
pub fn archive_slate(slate: &Slate, dir: &str) -> Result<PathBuf> {
    let path = Path::new(dir).join(archive_file_name(slate));
    write_slate(slate, &path)?;
    info!(path = %path.display(), id = %slate.id, "Slate archived");
    Ok(path)
}

/// The most recently generated slate in an archive directory, if any.
pub fn latest_archived(dir: &str) -> Result<Option<Slate>> {
    if !Path::new(dir).is_dir() {
        return Ok(None);
    }

    let mut newest: Option<PathBuf> = None;
    for entry in std::fs::read_dir(dir).context(format!("Failed to list archive {dir}"))? {
        let path = entry?.path();
        let is_archive = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".json"));
        if is_archive && newest.as_ref().map_or(true, |n| path > *n) {
            newest = Some(path);
        }
    }

    newest.map(|path| read_slate(&path)).transpose()
}

fn write_slate(slate: &Slate, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(slate).context("Failed to serialise slate")?;
    std::fs::write(path, &json).context(format!("Failed to write slate to {}", path.display()))
}

fn read_slate(path: &Path) -> Result<Slate> {
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read slate from {}", path.display()))?;
    serde_json::from_str(&json).context(format!("Failed to parse slate from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::build_picks;
    use crate::strategy::parlay::{build_parlays, ParlayConfig};
    use crate::types::{BookMarket, Bookmaker, Event, Outcome};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("linesmith_test_{}", Uuid::new_v4()))
    }

    fn sample_slate() -> Slate {
        let mut events = Vec::new();
        for (i, (h, a)) in [(-120, 110), (135, -150), (-105, -115)].into_iter().enumerate() {
            let mut e = Event::sample("Home", "Away");
            e.id = format!("evt-{i}");
            e.bookmakers = vec![Bookmaker {
                key: "draftkings".into(),
                title: "DraftKings".into(),
                markets: vec![BookMarket {
                    key: "h2h".into(),
                    outcomes: vec![Outcome::new("Home", h, None), Outcome::new("Away", a, None)],
                }],
            }];
            events.push(e);
        }
        let picks: Vec<_> = events
            .iter()
            .flat_map(|e| build_picks(e, 0.25, 100.0, 2.5, 1.0, None))
            .collect();
        let parlays = build_parlays(&picks, &ParlayConfig::default());
        Slate {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            sports: vec!["baseball_mlb".into()],
            events_scanned: events.len(),
            near_misses: Vec::new(),
            picks,
            parlays,
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir();
        let path = dir.join("nested").join("latest.json");
        let path = path.to_string_lossy().to_string();
        let slate = sample_slate();
        save_slate(&slate, Some(&path)).unwrap();

        let loaded = load_slate(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.id, slate.id);
        assert_eq!(loaded.picks.len(), 6);
        assert_eq!(loaded.parlays.len(), slate.parlays.len());
        assert_eq!(loaded.picks[0].selection, slate.picks[0].selection);
        assert_eq!(loaded.picks[0].family, slate.picks[0].family);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let path = "/tmp/linesmith_nonexistent_slate_12345.json";
        assert!(load_slate(Some(path)).unwrap().is_none());
    }

    #[test]
    fn test_archive_file_name() {
        let mut slate = sample_slate();
        slate.generated_at = Utc.with_ymd_and_hms(2026, 7, 1, 18, 30, 5).unwrap();
        slate.id = Uuid::parse_str("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0").unwrap();
        assert_eq!(archive_file_name(&slate), "slate-20260701T183005Z-0f1e2d3c.json");
    }

    #[test]
    fn test_latest_archived_picks_newest() {
        let dir = temp_dir();
        let dir_str = dir.to_string_lossy().to_string();

        let mut older = sample_slate();
        older.generated_at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let mut newer = sample_slate();
        newer.generated_at = Utc.with_ymd_and_hms(2026, 7, 2, 12, 0, 0).unwrap();

        archive_slate(&newer, &dir_str).unwrap();
        archive_slate(&older, &dir_str).unwrap();
        std::fs::write(dir.join("notes.json"), "{ not a slate").unwrap();

        let latest = latest_archived(&dir_str).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_latest_archived_missing_dir() {
        let dir = temp_dir().to_string_lossy().to_string();
        assert!(latest_archived(&dir).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("corrupt.json").to_string_lossy().to_string();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_slate(Some(&path)).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
