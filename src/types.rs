//! Core data types used across the stop-loss engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Trading pair symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed direction: +1.0 for longs, -1.0 for shorts.
    ///
    /// All directional arithmetic in the engine is written once against this
    /// sign so the long and short paths cannot drift apart.
    #[inline]
    pub fn direction(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    #[inline]
    pub fn is_long(self) -> bool {
        matches!(self, Side::Buy)
    }

    /// Pick the more protective of two stop candidates: the higher floor for
    /// a long, the lower ceiling for a short.
    #[inline]
    pub fn tighter_stop(self, a: f64, b: f64) -> f64 {
        match self {
            Side::Buy => a.max(b),
            Side::Sell => a.min(b),
        }
    }
}

/// An open position as seen by the stop-loss engine.
///
/// The engine borrows a position for the duration of one update call and
/// never retains a reference; applying the resulting [`Decision`] (moving
/// `current_stop`, reducing `size`) is the order-execution collaborator's
/// job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub side: Side,
    pub entry_price: f64,
    /// Stop placed at entry time; defines the initial risk per unit.
    pub initial_stop: f64,
    pub current_stop: f64,
    pub size: f64,
    /// True when the position was built from multiple stacked entries
    /// (AA + VBM), eligible for partial close and wider trailing tolerance.
    pub is_stacked: bool,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Initial risk per unit, signed so a correctly placed stop yields a
    /// positive value for both sides.
    pub fn initial_risk_per_unit(&self) -> f64 {
        self.side.direction() * (self.entry_price - self.initial_stop)
    }

    /// Unrealized gain as a multiple of the initial per-unit risk.
    /// Positive means the trade has moved in the position's favor.
    ///
    /// Returns 0.0 when the initial risk is non-positive; callers that need
    /// R-multiple math must check [`Position::validate`] first.
    pub fn r_multiple(&self, current_price: f64) -> f64 {
        let risk = self.initial_risk_per_unit();
        if risk <= 0.0 {
            return 0.0;
        }
        self.side.direction() * (current_price - self.entry_price) / risk
    }

    /// A position with zero or inverted initial risk is invalid for
    /// R-multiple math and must never be trailed.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.initial_risk_per_unit() <= 0.0 {
            return Err(EngineError::InvalidPosition {
                symbol: self.symbol.clone(),
                entry_price: self.entry_price,
                initial_stop: self.initial_stop,
            });
        }
        Ok(())
    }

    /// Apply an accepted stop move. Exposed for the execution collaborator
    /// and for tests; the engine itself never mutates the position.
    pub fn set_stop(&mut self, new_stop: f64) {
        self.current_stop = new_stop;
    }
}

/// Mutable per-position trailing state, created when the position opens and
/// destroyed when it closes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrailState {
    /// Set once the break-even trigger has been reached; ordinary trailing
    /// is suppressed until then.
    pub trailing_activated: bool,
    /// Break-even stop has been armed; never re-armed afterwards.
    pub be_applied: bool,
    /// Completed bars on the execution timeframe since entry.
    pub bars_since_entry: u32,
    /// The stacked wider-multiplier bonus is currently in effect
    /// (stacked position, ADX still below the trend threshold).
    pub stacked_wider_bonus_active: bool,
    /// The one-time stacked partial close has already fired.
    pub stacked_partial_done: bool,
    /// Last guard rejection, kept for observability only.
    pub last_guard_reason: Option<GuardReason>,
}

impl TrailState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-bar inputs the engine consumes. Indicator values (Wilder ATR, ADX,
/// swing pivots over the configured lookback) are computed by an external
/// collaborator aligned to the S10 execution timeframe; the engine never
/// caches or recomputes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub current_price: f64,
    pub atr: f64,
    /// ADX trend strength; `None` early in a session counts as weak regime.
    pub adx: Option<f64>,
    /// Most recent swing low over the pivot lookback (long stops).
    pub pivot_low: Option<f64>,
    /// Most recent swing high over the pivot lookback (short stops).
    pub pivot_high: Option<f64>,
    /// Absolute price increment for this symbol/venue.
    pub tick_size_abs: f64,
    /// Tick size as a fraction of price.
    pub tick_size_pct: f64,
    /// Taker fee as a fraction, e.g. 0.0007 for 0.07%.
    pub taker_fee_pct: f64,
}

/// Reason a proposed stop move was rejected by the guard checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardReason {
    /// Move smaller than the anti-whipsaw minimum.
    TooSmallMove,
    /// Move would relax an already tightened stop.
    WouldLoosen,
    /// Stop would sit on the wrong side of (or too close to) live price.
    InvalidPlacement,
}

/// Outcome of one per-position update, consumed by the order-execution
/// collaborator. Produced fresh on every call; re-applying the same decision
/// is a no-op by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Nothing to do; any guard rejection reason is recorded on the
    /// [`TrailState`].
    NoChange,
    /// Move the protective stop to this price.
    SetStop(f64),
    /// One-time break-even move to this price.
    ArmBreakEven(f64),
    /// Close this fraction of the position, then move the stop for the
    /// remainder if one was computed this update.
    PartialClose { fraction: f64, stop: Option<f64> },
}
