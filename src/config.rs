//! S10 trailing-stop configuration
//!
//! The engine consumes a fully-resolved [`TrailConfig`] per update call;
//! reading config files and applying per-symbol/venue overrides is the
//! caller's job. All percentages are decimals (0.10% = 0.0010).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Which break-even policy is in force. The two policies are alternatives,
/// never blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakEvenPolicy {
    /// Arm break-even as soon as the trigger is reached, even inside the
    /// no-trail window.
    #[default]
    AtTrigger,
    /// Arm break-even only once ordinary trailing is imminent, i.e. the
    /// no-trail window has also elapsed.
    WithTrailing,
}

/// S10 Trailing Stop Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailConfig {
    // === Break-Even ===
    /// R-multiple required before arming break-even (default: 1.0)
    pub be_trigger_r: f64,
    /// Absolute-percent gain trigger; when set it replaces the R trigger
    pub be_trigger_pct: Option<f64>,
    /// Fractional offset from entry for the break-even stop (default: 0.0010)
    pub be_sl_offset_pct: f64,
    /// Break-even arming policy (default: at trigger)
    pub be_policy: BreakEvenPolicy,

    // === Trailing ===
    /// Bars after entry during which only BE may move the stop (default: 2)
    pub no_trail_bars: u32,
    /// Swing-pivot lookback, consumed by the external indicator provider
    pub pivot_lookback: u32,
    /// ATR multiplier in a strong trend regime (default: 2.0)
    pub trail_atr_mult_strong: f64,
    /// ATR multiplier in a weak regime (default: 2.8)
    pub trail_atr_mult_weak: f64,
    /// Extra ATR buffer beyond the candidate stop (default: 0.30)
    pub trail_buffer_mult: f64,
    /// ADX threshold separating strong from weak regime (default: 25)
    pub adx_trend_min: f64,
    /// Regime-based multiplier selection vs the fixed strong multiplier
    pub use_adaptive_trail: bool,
    /// Explicit minimum-move override; derived from tick + fees when absent
    pub min_sl_move_pct: Option<f64>,
    /// Global kill-switch: skip all stop management for quick rollback
    pub trail_disabled: bool,

    // === Stacked Trades ===
    /// Fraction of a stacked position closed at 1R (default: 0.25)
    pub stacked_partial_close_pct: f64,
    /// Extra ATR multiplier for stacked trades until ADX confirms strength
    pub stacked_wider_mult_bonus: f64,

    // === Small-Loss Cooldown ===
    pub cooldown_enabled: bool,
    /// Realized R below which a close counts as a small loss (default: 0.5)
    pub small_loss_r: f64,
    /// Consecutive small losses required to trigger (default: 3)
    pub cooldown_n: usize,
    /// Bounded outcome history length per symbol (default: 10)
    pub cooldown_m: usize,
    /// Suspension length in hours from the triggering close (default: 24)
    pub cooldown_duration_h: i64,
}

impl Default for TrailConfig {
    fn default() -> Self {
        TrailConfig {
            be_trigger_r: 1.0,
            be_trigger_pct: None,
            be_sl_offset_pct: 0.0010,
            be_policy: BreakEvenPolicy::AtTrigger,

            no_trail_bars: 2,
            pivot_lookback: 5,
            trail_atr_mult_strong: 2.0,
            trail_atr_mult_weak: 2.8,
            trail_buffer_mult: 0.30,
            adx_trend_min: 25.0,
            use_adaptive_trail: true,
            min_sl_move_pct: None,
            trail_disabled: false,

            stacked_partial_close_pct: 0.25,
            stacked_wider_mult_bonus: 0.25,

            cooldown_enabled: false,
            small_loss_r: 0.5,
            cooldown_n: 3,
            cooldown_m: 10,
            cooldown_duration_h: 24,
        }
    }
}

impl TrailConfig {
    /// Set the break-even R trigger
    pub fn with_be_trigger_r(mut self, trigger: f64) -> Self {
        self.be_trigger_r = trigger;
        self
    }

    /// Use an absolute-percent break-even trigger instead of the R trigger
    pub fn with_be_trigger_pct(mut self, trigger: f64) -> Self {
        self.be_trigger_pct = Some(trigger);
        self
    }

    /// Set the break-even arming policy
    pub fn with_be_policy(mut self, policy: BreakEvenPolicy) -> Self {
        self.be_policy = policy;
        self
    }

    /// Set the initial no-trail window in bars
    pub fn with_no_trail_bars(mut self, bars: u32) -> Self {
        self.no_trail_bars = bars;
        self
    }

    /// Set the strong/weak ATR multipliers
    pub fn with_atr_multipliers(mut self, strong: f64, weak: f64) -> Self {
        self.trail_atr_mult_strong = strong;
        self.trail_atr_mult_weak = weak;
        self
    }

    /// Toggle regime-based multiplier selection
    pub fn with_adaptive_trail(mut self, adaptive: bool) -> Self {
        self.use_adaptive_trail = adaptive;
        self
    }

    /// Override the derived minimum stop move
    pub fn with_min_sl_move_pct(mut self, pct: f64) -> Self {
        self.min_sl_move_pct = Some(pct);
        self
    }

    /// Enable the small-loss cooldown with the given streak parameters
    pub fn with_cooldown(mut self, n: usize, m: usize, duration_h: i64) -> Self {
        self.cooldown_enabled = true;
        self.cooldown_n = n;
        self.cooldown_m = m;
        self.cooldown_duration_h = duration_h;
        self
    }

    /// Reject inconsistent parameter sets at config-resolution time, before
    /// any position is evaluated.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.be_trigger_r <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "be_trigger_r must be positive, got {}",
                self.be_trigger_r
            )));
        }
        if let Some(pct) = self.be_trigger_pct {
            if pct <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "be_trigger_pct must be positive, got {pct}"
                )));
            }
        }
        if self.be_sl_offset_pct < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "be_sl_offset_pct must not be negative, got {}",
                self.be_sl_offset_pct
            )));
        }
        if self.trail_atr_mult_strong <= 0.0 || self.trail_atr_mult_weak <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "ATR multipliers must be positive, got strong {} / weak {}",
                self.trail_atr_mult_strong, self.trail_atr_mult_weak
            )));
        }
        if self.trail_buffer_mult < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "trail_buffer_mult must not be negative, got {}",
                self.trail_buffer_mult
            )));
        }
        if self.adx_trend_min <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "adx_trend_min must be positive, got {}",
                self.adx_trend_min
            )));
        }
        if let Some(pct) = self.min_sl_move_pct {
            if pct <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "min_sl_move_pct must be positive, got {pct}"
                )));
            }
        }
        if !(self.stacked_partial_close_pct > 0.0 && self.stacked_partial_close_pct <= 1.0) {
            return Err(EngineError::InvalidConfig(format!(
                "stacked_partial_close_pct must be in (0, 1], got {}",
                self.stacked_partial_close_pct
            )));
        }
        if self.stacked_wider_mult_bonus < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "stacked_wider_mult_bonus must not be negative, got {}",
                self.stacked_wider_mult_bonus
            )));
        }
        if self.cooldown_enabled {
            if self.cooldown_n == 0 || self.cooldown_m < self.cooldown_n {
                return Err(EngineError::InvalidConfig(format!(
                    "cooldown window must satisfy 1 <= n <= m, got n {} / m {}",
                    self.cooldown_n, self.cooldown_m
                )));
            }
            if self.cooldown_duration_h <= 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "cooldown_duration_h must be positive, got {}",
                    self.cooldown_duration_h
                )));
            }
        }
        Ok(())
    }
}
