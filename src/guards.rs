//! Anti-whipsaw guard checks for proposed stop moves
//!
//! Every stop the engine wants to place passes through [`apply`]: minimum
//! move size, monotonic tightening, valid placement relative to live price,
//! and tick rounding toward the safe side. All checks are pure functions;
//! applying the same inputs twice yields the same outcome.

use crate::config::TrailConfig;
use crate::types::{GuardReason, IndicatorSnapshot, Side};

/// Result of the guard checks on one proposed stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardOutcome {
    /// Stop accepted, rounded to the venue tick. When the rounded price
    /// equals the current stop the caller treats this as NoChange and must
    /// not resubmit the order.
    Accepted(f64),
    Rejected(GuardReason),
}

/// Minimum absolute stop move at the given price. Uses the explicit
/// `min_sl_move_pct` override when configured, otherwise derives the
/// threshold from tick size and round-trip taker fees.
pub fn min_move_abs(price: f64, snapshot: &IndicatorSnapshot, config: &TrailConfig) -> f64 {
    let min_move_pct = config
        .min_sl_move_pct
        .unwrap_or_else(|| snapshot.tick_size_pct.max(2.0 * snapshot.taker_fee_pct));
    snapshot.tick_size_abs.max(min_move_pct * price)
}

/// Run all guard checks on a proposed stop.
///
/// `waive_min_move` is set for the first break-even move, which is a
/// one-time safety move rather than trailing churn; monotonicity and
/// placement validity still apply to it.
pub fn apply(
    current_stop: f64,
    proposed_stop: f64,
    price: f64,
    side: Side,
    snapshot: &IndicatorSnapshot,
    config: &TrailConfig,
    waive_min_move: bool,
) -> GuardOutcome {
    let dir = side.direction();

    // Anti-whipsaw: suppress micro-ratchet churn.
    if !waive_min_move {
        let delta = (proposed_stop - current_stop).abs();
        if delta < min_move_abs(price, snapshot, config) {
            return GuardOutcome::Rejected(GuardReason::TooSmallMove);
        }
    }

    // The stop is never relaxed once tightened.
    if dir * (proposed_stop - current_stop) < 0.0 {
        return GuardOutcome::Rejected(GuardReason::WouldLoosen);
    }

    // Never place a stop that would immediately trigger or cross price:
    // it must stay at least one tick on the protective side.
    if dir * (price - proposed_stop) < snapshot.tick_size_abs {
        return GuardOutcome::Rejected(GuardReason::InvalidPlacement);
    }

    // Round toward the safe side (down for longs, up for shorts), never
    // across price. If rounding lands behind the current stop, clamp back;
    // the caller then sees an idempotent accept.
    let mut rounded = round_to_tick(proposed_stop, snapshot.tick_size_abs, side);
    if dir * (rounded - current_stop) < 0.0 {
        rounded = current_stop;
    }

    GuardOutcome::Accepted(rounded)
}

/// Round a stop to the tick grid, away from live price. Values already on
/// the grid (within float tolerance) are snapped rather than stepped.
fn round_to_tick(value: f64, tick: f64, side: Side) -> f64 {
    if tick <= 0.0 {
        return value;
    }
    let steps = value / tick;
    let nearest = steps.round();
    let snapped = if (steps - nearest).abs() < 1e-9 * steps.abs().max(1.0) {
        nearest
    } else if side.is_long() {
        steps.floor()
    } else {
        steps.ceil()
    };
    snapped * tick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GuardReason;
    use approx::assert_relative_eq;

    fn snapshot(price: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            current_price: price,
            atr: 1.5,
            adx: Some(30.0),
            pivot_low: None,
            pivot_high: None,
            tick_size_abs: 0.01,
            tick_size_pct: 0.0001,
            taker_fee_pct: 0.0007,
        }
    }

    #[test]
    fn test_min_move_derived_from_fees() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        // max(tick_pct 0.0001, 2 * 0.0007) = 0.0014; 0.0014 * 106 = 0.1484
        assert_relative_eq!(min_move_abs(106.0, &snap, &config), 0.1484, epsilon = 1e-12);
    }

    #[test]
    fn test_min_move_floor_is_tick_size() {
        let snap = snapshot(1.0);
        let config = TrailConfig::default();
        // 0.0014 * 1.0 = 0.0014 < tick_size_abs
        assert_relative_eq!(min_move_abs(1.0, &snap, &config), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_override_wins() {
        let snap = snapshot(100.0);
        let config = TrailConfig::default().with_min_sl_move_pct(0.01);
        assert_relative_eq!(min_move_abs(100.0, &snap, &config), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_too_small_move_rejected() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let out = apply(102.50, 102.55, 106.0, Side::Buy, &snap, &config, false);
        assert_eq!(out, GuardOutcome::Rejected(GuardReason::TooSmallMove));
    }

    #[test]
    fn test_min_move_waived_for_break_even() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let out = apply(102.50, 102.55, 106.0, Side::Buy, &snap, &config, true);
        match out {
            GuardOutcome::Accepted(stop) => assert_relative_eq!(stop, 102.55, epsilon = 1e-9),
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn test_loosening_rejected_long() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let out = apply(103.0, 101.0, 106.0, Side::Buy, &snap, &config, false);
        assert_eq!(out, GuardOutcome::Rejected(GuardReason::WouldLoosen));
    }

    #[test]
    fn test_loosening_rejected_short() {
        let snap = snapshot(94.0);
        let config = TrailConfig::default();
        let out = apply(97.0, 99.0, 94.0, Side::Sell, &snap, &config, false);
        assert_eq!(out, GuardOutcome::Rejected(GuardReason::WouldLoosen));
    }

    #[test]
    fn test_stop_across_price_rejected() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let out = apply(103.0, 106.5, 106.0, Side::Buy, &snap, &config, false);
        assert_eq!(out, GuardOutcome::Rejected(GuardReason::InvalidPlacement));

        // Exactly at price is still invalid; one tick of clearance required.
        let out = apply(103.0, 106.0, 106.0, Side::Buy, &snap, &config, false);
        assert_eq!(out, GuardOutcome::Rejected(GuardReason::InvalidPlacement));
    }

    #[test]
    fn test_rounds_toward_safe_side() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        // 102.5532 floors to 102.55 on a 0.01 grid for a long
        let out = apply(100.1, 102.5532, 106.0, Side::Buy, &snap, &config, false);
        match out {
            GuardOutcome::Accepted(stop) => assert_relative_eq!(stop, 102.55, epsilon = 1e-9),
            other => panic!("expected accept, got {other:?}"),
        }

        // Mirror: 97.4468 ceils to 97.45 for a short
        let snap = snapshot(94.0);
        let out = apply(99.9, 97.4468, 94.0, Side::Sell, &snap, &config, false);
        match out {
            GuardOutcome::Accepted(stop) => assert_relative_eq!(stop, 97.45, epsilon = 1e-9),
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn test_on_grid_value_not_stepped() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let out = apply(100.1, 102.55, 106.0, Side::Buy, &snap, &config, false);
        match out {
            GuardOutcome::Accepted(stop) => assert_relative_eq!(stop, 102.55, epsilon = 1e-9),
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn test_idempotent_reapply() {
        let snap = snapshot(106.0);
        let config = TrailConfig::default();
        let first = apply(100.1, 102.55, 106.0, Side::Buy, &snap, &config, false);
        let second = apply(100.1, 102.55, 106.0, Side::Buy, &snap, &config, false);
        assert_eq!(first, second);
    }
}
