//! Near-miss finder: picks that fall just short of positive EV.

use crate::types::Pick;

/// Half-open EV band `[ev_floor, ev_ceiling)` and result cap.
#[derive(Debug, Clone)]
pub struct NearMissConfig {
    pub ev_floor: f64,
    pub ev_ceiling: f64,
    pub limit: usize,
}

impl Default for NearMissConfig {
    fn default() -> Self {
        Self {
            ev_floor: -0.02,
            ev_ceiling: 0.0,
            limit: 10,
        }
    }
}

/// Picks with `ev_floor <= EV < ev_ceiling`, best first, at most `limit`.
pub fn find_near_misses(picks: &[Pick], config: &NearMissConfig) -> Vec<Pick> {
    let mut near: Vec<Pick> = picks
        .iter()
        .filter(|p| p.ev_per_unit >= config.ev_floor && p.ev_per_unit < config.ev_ceiling)
        .cloned()
        .collect();
    near.sort_by(|a, b| b.ev_per_unit.total_cmp(&a.ev_per_unit));
    near.truncate(config.limit);
    near
}
