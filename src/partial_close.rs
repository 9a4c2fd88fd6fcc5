//! Stacked-trade partial close
//!
//! Stacked positions bank a configured fraction the first time the trade
//! reaches 1R. Fires at most once per position; order placement is the
//! execution collaborator's job.

use crate::config::TrailConfig;
use crate::types::{Position, TrailState};

/// R-multiple at which the one-time stacked partial close fires.
const PARTIAL_CLOSE_TRIGGER_R: f64 = 1.0;

/// Returns the fraction to close, or `None`. Sets `stacked_partial_done` on
/// fire; trailing continues to apply to the remaining size, and the stacked
/// wider-multiplier bonus expires independently via the ADX condition.
pub fn evaluate(
    position: &Position,
    trail_state: &mut TrailState,
    r_multiple: f64,
    config: &TrailConfig,
) -> Option<f64> {
    if !position.is_stacked || trail_state.stacked_partial_done {
        return None;
    }
    if r_multiple < PARTIAL_CLOSE_TRIGGER_R {
        return None;
    }

    trail_state.stacked_partial_done = true;
    tracing::debug!(
        symbol = %position.symbol,
        r_multiple,
        fraction = config.stacked_partial_close_pct,
        "Stacked partial close triggered"
    );
    Some(config.stacked_partial_close_pct)
}
