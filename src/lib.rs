//! S10 Stop-Loss Management Engine
//!
//! Per-position stop management for the S10 strategy: break-even gating,
//! adaptive ATR/ADX trailing stops, anti-whipsaw guards, stacked-trade
//! partial closes, and a per-symbol small-loss cooldown.
//!
//! The engine is pure computation over already-fetched indicator snapshots:
//! no I/O, no caching, no order placement. On each update it borrows one
//! position and its trail state, consults the gate/calculator/guard chain,
//! and returns a single [`Decision`] for the order-execution collaborator.
//! Market data alignment, indicator computation (ATR, ADX, swing pivots),
//! entry signals, and order routing are external concerns.
//!
//! # Example
//! ```
//! use chrono::Utc;
//! use s10_trailing::{
//!     Decision, IndicatorSnapshot, Position, Side, Symbol, TrailConfig, TrailState,
//!     TrailingStopEngine,
//! };
//!
//! let engine = TrailingStopEngine::new();
//! let config = TrailConfig::default();
//! config.validate()?;
//!
//! let position = Position {
//!     symbol: Symbol::new("BTCUSDT"),
//!     side: Side::Buy,
//!     entry_price: 100.0,
//!     initial_stop: 98.0,
//!     current_stop: 98.0,
//!     size: 1.0,
//!     is_stacked: false,
//!     opened_at: Utc::now(),
//! };
//! let mut state = TrailState::new();
//! let snapshot = IndicatorSnapshot {
//!     current_price: 102.0,
//!     atr: 1.5,
//!     adx: Some(30.0),
//!     pivot_low: Some(99.0),
//!     pivot_high: None,
//!     tick_size_abs: 0.01,
//!     tick_size_pct: 0.0001,
//!     taker_fee_pct: 0.0007,
//! };
//!
//! // 1R reached: the stop locks in just past entry.
//! let decision = engine.update(&position, &mut state, &snapshot, &config, true)?;
//! assert!(matches!(decision, Decision::ArmBreakEven(_)));
//! # Ok::<(), s10_trailing::EngineError>(())
//! ```

pub mod break_even;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod guards;
pub mod partial_close;
pub mod stop_calc;
pub mod types;

pub use config::{BreakEvenPolicy, TrailConfig};
pub use cooldown::{CooldownRegistry, CooldownState};
pub use engine::{TrailingStopEngine, UpdateRequest};
pub use error::EngineError;
pub use guards::GuardOutcome;
pub use types::*;
