//! Running accuracy metrics and the per-round rate history hook.
//!
//! [`MetricsAggregator`] keeps constant-size running weighted averages. The
//! averages alone cannot be replayed, so [`RateHistoryHook`] records the
//! underlying per-round rates for anyone who needs the series.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use types::{BALLS_PER_DRAW, FIRST_GENERATION, Generation, ModelMetrics, Round};

use crate::hooks::{HookContext, SimulationHook};
use crate::runner::{RetrainOutcome, RoundReport};

// =============================================================================
// MetricsAggregator
// =============================================================================

/// Fraction of predicted numbers that hit, over a whole population.
///
/// Returns 0 for an empty population.
#[inline]
pub fn match_rate(total_matches: usize, population: usize) -> f64 {
    if population == 0 {
        return 0.0;
    }
    total_matches as f64 / (BALLS_PER_DRAW * population) as f64
}

/// Running weighted accuracy tracker. Never reset during a run.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    metrics: ModelMetrics,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one round's rates into the averages.
    pub fn record(&mut self, round_rate: f64, random_rate: f64) -> ModelMetrics {
        let n = self.metrics.total_rounds as f64;
        let m = &mut self.metrics;
        m.accuracy = (m.accuracy * n + round_rate) / (n + 1.0);
        m.random_accuracy = (m.random_accuracy * n + random_rate) / (n + 1.0);
        m.total_rounds += 1;
        *m
    }

    /// Current averages.
    pub fn snapshot(&self) -> ModelMetrics {
        self.metrics
    }

    pub fn total_rounds(&self) -> u64 {
        self.metrics.total_rounds
    }
}

// =============================================================================
// RateHistoryHook
// =============================================================================

/// Agent and baseline hit rates for one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRates {
    pub round: Round,
    pub match_rate: f64,
    pub random_rate: f64,
}

/// Counters collected by [`RateHistoryHook`].
#[derive(Debug, Clone, Default)]
pub struct RateHistorySnapshot {
    /// Rounds observed.
    pub total_rounds: u64,
    /// Rounds in which at least one agent crossed the high-match threshold.
    pub high_match_rounds: u64,
    /// Best single-agent match count seen.
    pub best_match_count: u64,
    /// Successful retrains.
    pub retrain_successes: u64,
    /// Failed retrains.
    pub retrain_failures: u64,
    /// Latest generation announced.
    pub generation: Generation,
}

/// Built-in hook recording per-round rates and run counters.
///
/// Thread-safe via atomics and a mutex. History is bounded by `max_history`;
/// counters keep going after the history is full.
pub struct RateHistoryHook {
    rounds: AtomicU64,
    high_match_rounds: AtomicU64,
    best_matches: AtomicU64,
    retrain_successes: AtomicU64,
    retrain_failures: AtomicU64,
    generation: AtomicU64,
    history: Mutex<Vec<RoundRates>>,
    max_history: usize,
}

impl RateHistoryHook {
    /// Create a hook keeping up to 10 000 rounds of history.
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Create a hook with a custom history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            rounds: AtomicU64::new(0),
            high_match_rounds: AtomicU64::new(0),
            best_matches: AtomicU64::new(0),
            retrain_successes: AtomicU64::new(0),
            retrain_failures: AtomicU64::new(0),
            generation: AtomicU64::new(FIRST_GENERATION),
            history: Mutex::new(Vec::with_capacity(max_history.min(10_000))),
            max_history,
        }
    }

    /// Current counters.
    pub fn snapshot(&self) -> RateHistorySnapshot {
        RateHistorySnapshot {
            total_rounds: self.rounds.load(Ordering::Relaxed),
            high_match_rounds: self.high_match_rounds.load(Ordering::Relaxed),
            best_match_count: self.best_matches.load(Ordering::Relaxed),
            retrain_successes: self.retrain_successes.load(Ordering::Relaxed),
            retrain_failures: self.retrain_failures.load(Ordering::Relaxed),
            generation: self.generation.load(Ordering::Relaxed),
        }
    }

    /// Recorded per-round rates, oldest first.
    pub fn rates(&self) -> Vec<RoundRates> {
        self.history.lock().clone()
    }

    /// Recompute running averages from the recorded rates.
    ///
    /// Matches the simulation's own metrics as long as the history never
    /// overflowed.
    pub fn replay(&self) -> ModelMetrics {
        let mut aggregator = MetricsAggregator::new();
        for rates in self.history.lock().iter() {
            aggregator.record(rates.match_rate, rates.random_rate);
        }
        aggregator.snapshot()
    }

    /// Reset all counters and history.
    pub fn reset(&self) {
        self.rounds.store(0, Ordering::Relaxed);
        self.high_match_rounds.store(0, Ordering::Relaxed);
        self.best_matches.store(0, Ordering::Relaxed);
        self.retrain_successes.store(0, Ordering::Relaxed);
        self.retrain_failures.store(0, Ordering::Relaxed);
        self.generation.store(FIRST_GENERATION, Ordering::Relaxed);
        self.history.lock().clear();
    }

    /// Update peak value atomically (CAS loop).
    fn update_peak(peak: &AtomicU64, value: u64) {
        let mut current = peak.load(Ordering::Relaxed);
        while value > current {
            match peak.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for RateHistoryHook {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationHook for RateHistoryHook {
    fn name(&self) -> &str {
        "RateHistory"
    }

    fn on_round_end(&self, report: &RoundReport, _ctx: &HookContext) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
        if !report.high_matches.is_empty() {
            self.high_match_rounds.fetch_add(1, Ordering::Relaxed);
        }
        if let Some((_, best)) = report.best {
            Self::update_peak(&self.best_matches, best as u64);
        }

        let mut history = self.history.lock();
        if history.len() < self.max_history {
            history.push(RoundRates {
                round: report.round,
                match_rate: report.match_rate,
                random_rate: report.random_rate,
            });
        }
    }

    fn on_retrain(&self, outcome: &RetrainOutcome, _ctx: &HookContext) {
        let counter = match outcome {
            RetrainOutcome::Succeeded { .. } => &self.retrain_successes,
            RetrainOutcome::Failed { .. } => &self.retrain_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn on_generation(&self, generation: Generation, _ctx: &HookContext) {
        self.generation.store(generation, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictor::PredictorError;
    use types::AgentId;

    fn report(round: Round, match_rate: f64, random_rate: f64, best: usize) -> RoundReport {
        RoundReport {
            round,
            sequence_index: round + 1,
            total_matches: 0,
            match_rate,
            random_rate,
            best: Some((AgentId(1), best)),
            high_matches: if best >= 13 {
                vec![(AgentId(1), best)]
            } else {
                Vec::new()
            },
            retrain: None,
        }
    }

    #[test]
    fn test_single_perfect_round() {
        let mut agg = MetricsAggregator::new();
        let m = agg.record(1.0, 0.0);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.random_accuracy, 0.0);
        assert_eq!(m.total_rounds, 1);
    }

    #[test]
    fn test_running_average_equals_mean() {
        let rates = [0.2, 0.6, 0.4, 0.8];
        let mut agg = MetricsAggregator::new();
        for r in rates {
            agg.record(r, 1.0 - r);
        }
        let m = agg.snapshot();
        assert!((m.accuracy - 0.5).abs() < 1e-12);
        assert!((m.random_accuracy - 0.5).abs() < 1e-12);
        assert_eq!(agg.total_rounds(), 4);
    }

    #[test]
    fn test_match_rate() {
        assert_eq!(match_rate(30, 2), 1.0);
        assert!((match_rate(9, 2) - 0.3).abs() < 1e-12);
        assert_eq!(match_rate(5, 0), 0.0);
    }

    #[test]
    fn test_history_replay_matches_aggregator() {
        let hook = RateHistoryHook::new();
        let ctx = HookContext::new(0, 1);
        let mut agg = MetricsAggregator::new();

        for (round, (rate, random)) in [(0.4, 0.6), (0.6, 0.6), (0.9, 0.5)].into_iter().enumerate() {
            agg.record(rate, random);
            hook.on_round_end(&report(round as Round, rate, random, 10), &ctx);
        }

        let replayed = hook.replay();
        let direct = agg.snapshot();
        assert!((replayed.accuracy - direct.accuracy).abs() < 1e-12);
        assert!((replayed.random_accuracy - direct.random_accuracy).abs() < 1e-12);
        assert_eq!(replayed.total_rounds, 3);
        assert_eq!(hook.rates().len(), 3);
    }

    #[test]
    fn test_history_bounded_counters_unbounded() {
        let hook = RateHistoryHook::with_max_history(2);
        let ctx = HookContext::new(0, 1);
        for round in 0..5 {
            hook.on_round_end(&report(round, 0.5, 0.5, 13 + (round as usize % 3)), &ctx);
        }
        let snap = hook.snapshot();
        assert_eq!(hook.rates().len(), 2);
        assert_eq!(snap.total_rounds, 5);
        assert_eq!(snap.high_match_rounds, 5);
        assert_eq!(snap.best_match_count, 15);
    }

    #[test]
    fn test_retrain_and_generation_counters() {
        let hook = RateHistoryHook::new();
        assert_eq!(hook.snapshot().generation, 1);
        let ctx = HookContext::new(10, 1);
        hook.on_retrain(
            &RetrainOutcome::Failed {
                buffered: 10,
                error: PredictorError::EmptyBatch,
            },
            &ctx,
        );
        hook.on_generation(2, &ctx);

        let snap = hook.snapshot();
        assert_eq!(snap.retrain_failures, 1);
        assert_eq!(snap.retrain_successes, 0);
        assert_eq!(snap.generation, 2);

        hook.reset();
        assert_eq!(hook.snapshot().retrain_failures, 0);
        assert_eq!(hook.snapshot().generation, 1);
        assert!(hook.rates().is_empty());
    }
}
