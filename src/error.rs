//! Error taxonomy for the stop-loss engine
//!
//! Only two conditions are surfaced to the caller as failures: an invalid
//! position and an inconsistent configuration. Guard rejections are local,
//! non-fatal, and degrade to `Decision::NoChange` with the reason recorded
//! on the trail state.

use thiserror::Error;

use crate::types::Symbol;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Zero or inverted initial risk; R-multiple math is undefined and the
    /// position must not be trailed.
    #[error(
        "invalid position {symbol}: initial risk per unit is not positive \
         (entry {entry_price}, initial stop {initial_stop})"
    )]
    InvalidPosition {
        symbol: Symbol,
        entry_price: f64,
        initial_stop: f64,
    },

    /// Rejected at config-resolution time, before any position is evaluated.
    #[error("inconsistent configuration: {0}")]
    InvalidConfig(String),
}
