//! Trailing-stop orchestrator
//!
//! Runs the per-position decision process on each update: break-even gate,
//! no-trail window, stop calculation, guard checks, stacked partial close.
//! One [`Decision`] per call; guard rejections degrade to `NoChange` with
//! the reason recorded on the trail state. A fault in one position's
//! evaluation never affects another's.

use rayon::prelude::*;

use crate::break_even::{self, BreakEvenOutcome};
use crate::config::TrailConfig;
use crate::error::EngineError;
use crate::guards::{self, GuardOutcome};
use crate::types::{Decision, IndicatorSnapshot, Position, TrailState};
use crate::{partial_close, stop_calc};

/// One position's inputs for a batch update.
#[derive(Debug)]
pub struct UpdateRequest<'a> {
    pub position: &'a Position,
    pub trail_state: &'a mut TrailState,
    pub snapshot: IndicatorSnapshot,
    /// A new bar boundary occurred on the execution timeframe since the
    /// previous update.
    pub new_bar: bool,
}

/// Stateless orchestrator; all per-position state lives in [`TrailState`]
/// and all tunables arrive as a fully-resolved [`TrailConfig`] per call.
#[derive(Debug, Default)]
pub struct TrailingStopEngine;

impl TrailingStopEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate one open position against a fresh indicator snapshot.
    ///
    /// The position is borrowed read-only; applying an accepted stop or
    /// partial close is the execution collaborator's job. Only the
    /// documented flags on `trail_state` are mutated.
    pub fn update(
        &self,
        position: &Position,
        trail_state: &mut TrailState,
        snapshot: &IndicatorSnapshot,
        config: &TrailConfig,
        new_bar: bool,
    ) -> Result<Decision, EngineError> {
        // Global kill-switch for quick rollback.
        if config.trail_disabled {
            return Ok(Decision::NoChange);
        }

        position.validate()?;

        if new_bar {
            trail_state.bars_since_entry += 1;
        }

        let price = snapshot.current_price;
        let r_multiple = position.r_multiple(price);

        // Once the break-even trigger has been reached, ordinary trailing is
        // unlocked for the rest of the position's life.
        if break_even::gate_passed(position, price, config) {
            trail_state.trailing_activated = true;
        }

        let mut decision = Decision::NoChange;

        // Break-even is exempt from the no-trail window; the move still has
        // to respect monotonicity and placement, but not the minimum-move
        // threshold since it is a one-time safety move.
        if let BreakEvenOutcome::Arm(be_stop) =
            break_even::evaluate(position, trail_state, price, config)
        {
            match guards::apply(
                position.current_stop,
                be_stop,
                price,
                position.side,
                snapshot,
                config,
                true,
            ) {
                GuardOutcome::Accepted(stop) => {
                    trail_state.be_applied = true;
                    trail_state.last_guard_reason = None;
                    if stop != position.current_stop {
                        tracing::debug!(
                            symbol = %position.symbol,
                            stop,
                            r_multiple,
                            "Break-even armed"
                        );
                        decision = Decision::ArmBreakEven(stop);
                    }
                }
                GuardOutcome::Rejected(reason) => {
                    // Not armed; retried on a later update.
                    trail_state.last_guard_reason = Some(reason);
                    tracing::debug!(
                        symbol = %position.symbol,
                        ?reason,
                        "Break-even move rejected"
                    );
                }
            }
        }

        // Ordinary trailing: suppressed inside the no-trail window, gated on
        // the break-even trigger having been reached, and deferred to the
        // next update when break-even armed just now.
        if decision == Decision::NoChange
            && trail_state.trailing_activated
            && trail_state.bars_since_entry >= config.no_trail_bars
        {
            let proposed = stop_calc::candidate(position, snapshot, trail_state, config);
            match guards::apply(
                position.current_stop,
                proposed,
                price,
                position.side,
                snapshot,
                config,
                false,
            ) {
                GuardOutcome::Accepted(stop) if stop != position.current_stop => {
                    trail_state.last_guard_reason = None;
                    tracing::debug!(symbol = %position.symbol, stop, "Trailing stop tightened");
                    decision = Decision::SetStop(stop);
                }
                GuardOutcome::Accepted(_) => {
                    // Rounded back onto the current stop: no resubmission.
                    trail_state.last_guard_reason = None;
                }
                GuardOutcome::Rejected(reason) => {
                    trail_state.last_guard_reason = Some(reason);
                    tracing::debug!(
                        symbol = %position.symbol,
                        ?reason,
                        proposed,
                        "Trailing move rejected"
                    );
                }
            }
        }

        // Stacked partial close; the decision carries any stop computed
        // above for the remaining size.
        if let Some(fraction) = partial_close::evaluate(position, trail_state, r_multiple, config)
        {
            let stop = match decision {
                Decision::SetStop(s) | Decision::ArmBreakEven(s) => Some(s),
                _ => None,
            };
            decision = Decision::PartialClose { fraction, stop };
        }

        Ok(decision)
    }

    /// Evaluate a batch of independent positions in parallel. Each request
    /// touches only its own position and trail state, so no locking is
    /// needed; a per-position failure lands in that position's result slot
    /// only.
    pub fn update_all(
        &self,
        requests: &mut [UpdateRequest<'_>],
        config: &TrailConfig,
    ) -> Vec<Result<Decision, EngineError>> {
        requests
            .par_iter_mut()
            .map(|req| {
                self.update(
                    req.position,
                    req.trail_state,
                    &req.snapshot,
                    config,
                    req.new_bar,
                )
            })
            .collect()
    }
}
