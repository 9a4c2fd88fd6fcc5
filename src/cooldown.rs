//! Per-symbol small-loss cooldown tracking
//!
//! After a run of consecutive small losses on a symbol, new entries on that
//! symbol are suspended for a configured number of hours. The registry is an
//! explicitly owned value (never a module-level singleton) so callers and
//! tests can instantiate isolated registries; trade-close events write it,
//! entry-signal checks read it.
//!
//! States per symbol: Active, Cooling(until). The Cooling -> Active
//! transition is lazy: a query past the deadline simply reads as Active, no
//! background timer involved.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::config::TrailConfig;
use crate::types::Symbol;

/// Cooldown state of one symbol at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Active,
    Cooling(DateTime<Utc>),
}

/// Bounded outcome history plus the current suspension deadline for one
/// symbol. Lives for the trading session; reset explicitly.
#[derive(Debug, Clone, Default)]
pub struct CooldownRecord {
    /// Realized R of recent closes, oldest first, capped at `cooldown_m`.
    outcomes: VecDeque<f64>,
    cooling_until: Option<DateTime<Utc>>,
}

impl CooldownRecord {
    fn push_bounded(&mut self, realized_r: f64, max_len: usize) {
        self.outcomes.push_back(realized_r);
        while self.outcomes.len() > max_len {
            self.outcomes.pop_front();
        }
    }

    /// Length of the most-recent-first contiguous run of small losses.
    fn trailing_small_loss_streak(&self, small_loss_r: f64) -> usize {
        self.outcomes
            .iter()
            .rev()
            .take_while(|&&r| r < small_loss_r)
            .count()
    }

    fn state(&self, now: DateTime<Utc>) -> CooldownState {
        match self.cooling_until {
            Some(until) if now < until => CooldownState::Cooling(until),
            _ => CooldownState::Active,
        }
    }
}

/// Symbol-keyed cooldown registry, created once per trading session.
///
/// Mutation goes through `&mut self` (single writer); queries are `&self`
/// and observe a consistent bounded history. Callers that share the registry
/// across tasks wrap it in their own lock.
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    records: HashMap<Symbol, CooldownRecord>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a closed trade's realized R for the symbol, transitioning to
    /// Cooling when the most recent `cooldown_n` closes were all small
    /// losses. History is tracked even when the feature is disabled, for
    /// observability; the suspension itself only engages when enabled.
    pub fn record_close(
        &mut self,
        symbol: &Symbol,
        realized_r: f64,
        closed_at: DateTime<Utc>,
        config: &TrailConfig,
    ) {
        let record = self.records.entry(symbol.clone()).or_default();
        record.push_bounded(realized_r, config.cooldown_m.max(1));

        if !config.cooldown_enabled {
            return;
        }

        let streak = record.trailing_small_loss_streak(config.small_loss_r);
        if streak >= config.cooldown_n {
            let until = closed_at + Duration::hours(config.cooldown_duration_h);
            record.cooling_until = Some(until);
            tracing::warn!(
                %symbol,
                streak,
                until = %until,
                "Small-loss streak; suspending new entries"
            );
        }
    }

    /// May a new trade be opened on this symbol right now? Consulted by the
    /// entry-signal collaborator, not by the trailing engine.
    pub fn may_trade(&self, symbol: &Symbol, now: DateTime<Utc>, config: &TrailConfig) -> bool {
        if !config.cooldown_enabled {
            return true;
        }
        match self.records.get(symbol) {
            Some(record) => record.state(now) == CooldownState::Active,
            None => true,
        }
    }

    /// Current state for observability/dashboards.
    pub fn state(&self, symbol: &Symbol, now: DateTime<Utc>) -> CooldownState {
        self.records
            .get(symbol)
            .map(|r| r.state(now))
            .unwrap_or(CooldownState::Active)
    }

    /// Drop one symbol's history and any active suspension.
    pub fn reset(&mut self, symbol: &Symbol) {
        self.records.remove(symbol);
    }

    /// Session teardown: drop everything.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TrailConfig {
        TrailConfig::default().with_cooldown(3, 10, 24)
    }

    fn record_all(
        registry: &mut CooldownRegistry,
        symbol: &Symbol,
        outcomes: &[f64],
        closed_at: DateTime<Utc>,
        config: &TrailConfig,
    ) {
        for &r in outcomes {
            registry.record_close(symbol, r, closed_at, config);
        }
    }

    #[test]
    fn test_three_small_losses_trigger_cooldown() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = config();
        let now = Utc::now();

        record_all(&mut registry, &symbol, &[0.1, -0.2, 0.3], now, &config);

        assert!(!registry.may_trade(&symbol, now, &config));
        assert_eq!(
            registry.state(&symbol, now),
            CooldownState::Cooling(now + Duration::hours(24))
        );
    }

    #[test]
    fn test_winner_breaks_the_streak() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = config();
        let now = Utc::now();

        // 0.6R in the middle of the last three breaks the contiguous run
        record_all(&mut registry, &symbol, &[0.1, 0.6, 0.3], now, &config);

        assert!(registry.may_trade(&symbol, now, &config));
    }

    #[test]
    fn test_old_losses_beyond_streak_do_not_count() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = config();
        let now = Utc::now();

        // Two small losses, a winner, then two small losses: streak is 2
        record_all(
            &mut registry,
            &symbol,
            &[-0.3, -0.1, 0.8, 0.2, 0.1],
            now,
            &config,
        );

        assert!(registry.may_trade(&symbol, now, &config));
    }

    #[test]
    fn test_lazy_expiry() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = config();
        let closed_at = Utc::now();

        record_all(&mut registry, &symbol, &[0.1, 0.2, 0.3], closed_at, &config);
        assert!(!registry.may_trade(&symbol, closed_at, &config));

        let after = closed_at + Duration::hours(24) + Duration::seconds(1);
        assert!(registry.may_trade(&symbol, after, &config));
        assert_eq!(registry.state(&symbol, after), CooldownState::Active);
    }

    #[test]
    fn test_history_bounded_to_m() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let mut config = config();
        config.cooldown_m = 4;
        let now = Utc::now();

        // Eight winners then two small losses; history keeps only the last 4
        let outcomes = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.1, 0.2];
        record_all(&mut registry, &symbol, &outcomes, now, &config);

        let record = registry.records.get(&symbol).unwrap();
        assert_eq!(record.outcomes.len(), 4);
        assert_eq!(record.trailing_small_loss_streak(config.small_loss_r), 2);
    }

    #[test]
    fn test_disabled_always_allows() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = TrailConfig::default(); // cooldown_enabled = false
        let now = Utc::now();

        record_all(&mut registry, &symbol, &[0.1, 0.1, 0.1, 0.1], now, &config);
        assert!(registry.may_trade(&symbol, now, &config));

        // History is still tracked for observability
        assert_eq!(registry.records.get(&symbol).unwrap().outcomes.len(), 4);
    }

    #[test]
    fn test_unknown_symbol_is_active() {
        let registry = CooldownRegistry::new();
        let config = config();
        assert!(registry.may_trade(&Symbol::new("ETHUSDT"), Utc::now(), &config));
    }

    #[test]
    fn test_reset_clears_suspension() {
        let mut registry = CooldownRegistry::new();
        let symbol = Symbol::new("BTCUSDT");
        let config = config();
        let now = Utc::now();

        record_all(&mut registry, &symbol, &[0.1, 0.2, 0.3], now, &config);
        assert!(!registry.may_trade(&symbol, now, &config));

        registry.reset(&symbol);
        assert!(registry.may_trade(&symbol, now, &config));
    }
}
