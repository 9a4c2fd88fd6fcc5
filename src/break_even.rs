//! Break-even gate
//!
//! Decides when a trade has proven itself and the stop should be locked a
//! small offset past entry. Arms at most once per position; afterwards
//! ordinary trailing may still tighten the stop further.

use crate::config::{BreakEvenPolicy, TrailConfig};
use crate::types::{Position, TrailState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakEvenOutcome {
    Skip,
    /// Move the stop to this break-even level, once.
    Arm(f64),
}

/// Has the position reached its break-even trigger? When an absolute-percent
/// trigger is configured it replaces the R trigger entirely.
pub fn gate_passed(position: &Position, current_price: f64, config: &TrailConfig) -> bool {
    if let Some(trigger_pct) = config.be_trigger_pct {
        let favorable_ret =
            position.side.direction() * (current_price / position.entry_price - 1.0);
        favorable_ret >= trigger_pct
    } else {
        position.r_multiple(current_price) >= config.be_trigger_r
    }
}

/// Evaluate the break-even gate for one update.
///
/// Under [`BreakEvenPolicy::AtTrigger`] the stop arms as soon as the trigger
/// passes; under [`BreakEvenPolicy::WithTrailing`] arming also waits out the
/// no-trail window so BE only fires when trailing is imminent.
pub fn evaluate(
    position: &Position,
    trail_state: &TrailState,
    current_price: f64,
    config: &TrailConfig,
) -> BreakEvenOutcome {
    if trail_state.be_applied {
        return BreakEvenOutcome::Skip;
    }
    if !gate_passed(position, current_price, config) {
        return BreakEvenOutcome::Skip;
    }
    if config.be_policy == BreakEvenPolicy::WithTrailing
        && trail_state.bars_since_entry < config.no_trail_bars
    {
        return BreakEvenOutcome::Skip;
    }

    let dir = position.side.direction();
    BreakEvenOutcome::Arm(position.entry_price * (1.0 + dir * config.be_sl_offset_pct))
}
