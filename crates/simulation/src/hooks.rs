//! Simulation hooks: the reporting sink.
//!
//! Hooks are **observers**. They receive read-only views of simulation state
//! at lifecycle points and cannot modify it. Per-call state goes in an owned
//! [`HookContext`]; round results arrive as borrowed reports.
//!
//! # Example
//!
//! ```ignore
//! use simulation::{HookContext, RoundReport, SimulationHook};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct HitCounter {
//!     hits: AtomicU64,
//! }
//!
//! impl SimulationHook for HitCounter {
//!     fn name(&self) -> &str { "HitCounter" }
//!
//!     fn on_round_end(&self, report: &RoundReport, _ctx: &HookContext) {
//!         self.hits.fetch_add(report.total_matches as u64, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::Arc;

use types::{AgentId, BallSet, Generation, ModelMetrics, Round};

use crate::runner::{RetrainOutcome, RoundReport, SimulationPhase};

// ─────────────────────────────────────────────────────────────────────────────
// Hook Context
// ─────────────────────────────────────────────────────────────────────────────

/// Owned view of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    pub id: AgentId,
    pub score: f64,
    pub last_prediction: Option<BallSet>,
}

/// Context passed to hooks at each lifecycle point.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Rounds completed so far.
    pub round: Round,
    /// Current generation.
    pub generation: Generation,
    /// Engine phase at the time of the call.
    pub phase: SimulationPhase,
    /// Metrics snapshot.
    pub metrics: ModelMetrics,
    /// Agent summaries; empty unless the engine fills them.
    pub agents: Vec<AgentSummary>,
}

impl HookContext {
    /// Create a context with default metrics and no agents.
    pub fn new(round: Round, generation: Generation) -> Self {
        Self {
            round,
            generation,
            phase: SimulationPhase::Idle,
            metrics: ModelMetrics::default(),
            agents: Vec::new(),
        }
    }

    /// Set the phase.
    pub fn with_phase(mut self, phase: SimulationPhase) -> Self {
        self.phase = phase;
        self
    }

    /// Set the metrics snapshot.
    pub fn with_metrics(mut self, metrics: ModelMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the agent summaries.
    pub fn with_agents(mut self, agents: Vec<AgentSummary>) -> Self {
        self.agents = agents;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SimulationHook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for simulation observers.
///
/// Use interior mutability (`Mutex`, atomics) for hook-owned state.
///
/// # Lifecycle
///
/// ```text
/// Simulation.step()
///   ├─ agents evaluated, round committed
///   ├─ on_retrain()        ← only on retrain rounds, phase = Retraining
///   └─ on_round_end()      ← every committed round, phase = Idle
///
/// Simulation.advance_generation()
///   └─ on_generation()
///
/// Simulation.run(n)
///   └─ on_simulation_end() ← after the last round
/// ```
pub trait SimulationHook: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &str;

    /// Called after a round is committed.
    #[allow(unused_variables)]
    fn on_round_end(&self, report: &RoundReport, ctx: &HookContext) {}

    /// Called after a retraining attempt, successful or not.
    #[allow(unused_variables)]
    fn on_retrain(&self, outcome: &RetrainOutcome, ctx: &HookContext) {}

    /// Called when a new generation starts.
    #[allow(unused_variables)]
    fn on_generation(&self, generation: Generation, ctx: &HookContext) {}

    /// Called once when [`run`](crate::Simulation::run) completes.
    #[allow(unused_variables)]
    fn on_simulation_end(&self, metrics: &ModelMetrics) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Manages hook registration and sequential invocation.
///
/// Hooks are called in registration order.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn SimulationHook>>,
}

impl HookRunner {
    /// Create a new empty hook runner.
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook.
    pub fn add(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names for debugging.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn on_round_end(&self, report: &RoundReport, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_round_end(report, ctx);
        }
    }

    pub fn on_retrain(&self, outcome: &RetrainOutcome, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_retrain(outcome, ctx);
        }
    }

    pub fn on_generation(&self, generation: Generation, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_generation(generation, ctx);
        }
    }

    pub fn on_simulation_end(&self, metrics: &ModelMetrics) {
        for hook in &self.hooks {
            hook.on_simulation_end(metrics);
        }
    }
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRunner")
            .field("hooks", &self.hook_names())
            .finish()
    }
}

/// A no-op hook useful for testing.
#[derive(Debug, Default)]
pub struct NoOpHook;

impl SimulationHook for NoOpHook {
    fn name(&self) -> &str {
        "NoOp"
    }
}
