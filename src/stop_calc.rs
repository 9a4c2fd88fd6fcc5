//! Conservative trailing-stop candidate computation
//!
//! Combines the recent swing pivot with an adaptive ATR distance and an
//! extra ATR buffer. Deterministic for identical inputs; the only state it
//! touches is the observability flag for the stacked wider-multiplier bonus.

use crate::config::TrailConfig;
use crate::types::{IndicatorSnapshot, Position, TrailState};

/// Pivot fallback distance when no swing extreme exists in the lookback.
const PIVOT_FALLBACK_ATR_MULT: f64 = 4.0;

/// ATR multiplier for the current regime. Strong trend (ADX at or above the
/// threshold) trails tighter; a weak or unknown regime trails wider. With
/// adaptive trailing disabled the strong multiplier applies throughout.
/// Stacked positions get a temporary extra bonus until ADX confirms
/// strength; the bonus is re-evaluated on every call, not sticky.
pub fn atr_multiplier(
    position: &Position,
    snapshot: &IndicatorSnapshot,
    trail_state: &mut TrailState,
    config: &TrailConfig,
) -> f64 {
    let trend_confirmed = snapshot
        .adx
        .is_some_and(|adx| adx >= config.adx_trend_min);

    let mut mult = if !config.use_adaptive_trail || trend_confirmed {
        config.trail_atr_mult_strong
    } else {
        config.trail_atr_mult_weak
    };

    if position.is_stacked && !trend_confirmed {
        mult += config.stacked_wider_mult_bonus;
        trail_state.stacked_wider_bonus_active = true;
    } else {
        trail_state.stacked_wider_bonus_active = false;
    }

    mult
}

/// Compute the candidate conservative stop for one update: the tighter of
/// pivot stop and ATR stop, pushed out by the configured ATR buffer.
pub fn candidate(
    position: &Position,
    snapshot: &IndicatorSnapshot,
    trail_state: &mut TrailState,
    config: &TrailConfig,
) -> f64 {
    let dir = position.side.direction();
    let atr = snapshot.atr.max(1e-12);
    let price = snapshot.current_price;

    let mult = atr_multiplier(position, snapshot, trail_state, config);

    let pivot = if position.side.is_long() {
        snapshot.pivot_low
    } else {
        snapshot.pivot_high
    };
    let pivot_stop = pivot.unwrap_or(price - dir * PIVOT_FALLBACK_ATR_MULT * atr);
    let atr_stop = price - dir * mult * atr;

    let pre_buffer = position.side.tighter_stop(pivot_stop, atr_stop);
    pre_buffer - dir * config.trail_buffer_mult * atr
}
