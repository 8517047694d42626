//! Simulation crate: the round loop of the draw forecasting gym.
//!
//! A [`Simulation`] replays a draw history one round per [`Simulation::step`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                Simulation.step()                 │
//! │                                                  │
//! │  1. Pick draw = history[round % len]             │
//! │  2. Per agent (parallel): weigh features,        │
//! │     predict, sample 15 unique numbers, sample    │
//! │     a random baseline, count matches             │
//! │  3. Commit in agent order: scores, evolution,    │
//! │     high-match logs                              │
//! │  4. Buffer draw + representative prediction      │
//! │  5. Update running metrics                       │
//! │  6. Advance round; retrain every N rounds        │
//! │  7. Hook: on_round_end                           │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use features::FeaturePipeline;
//! use predictor::{LinearPredictor, LinearPredictorConfig};
//! use simulation::{RateHistoryHook, Simulation, SimulationConfig};
//!
//! let pipeline = FeaturePipeline::default();
//! let model = LinearPredictor::new("baseline", pipeline.width(), 15, LinearPredictorConfig::default());
//! let mut sim = Simulation::new(history, model, pipeline, SimulationConfig::new(10).with_seed(42))?;
//!
//! let rates = Arc::new(RateHistoryHook::new());
//! sim.add_hook(rates.clone());
//! sim.run(500)?;
//! println!("accuracy {:.3} vs random {:.3}", sim.metrics().accuracy, sim.metrics().random_accuracy);
//! ```
//!
//! # Parallel Execution
//!
//! With the `parallel` feature, agents are evaluated via rayon. Evaluation
//! only reads shared state; outcomes are merged in agent order, so results
//! do not depend on the feature.

mod buffer;
pub mod config;
mod error;
mod history;
mod hooks;
mod metrics;
mod reward;
mod runner;
pub mod sampling;

pub use buffer::{BufferedRound, TrainingBuffer};
pub use config::SimulationConfig;
pub use error::{ContractViolation, Result, SimulationError};
pub use history::build_history;
pub use hooks::{AgentSummary, HookContext, HookRunner, NoOpHook, SimulationHook};
pub use metrics::{
    MetricsAggregator, RateHistoryHook, RateHistorySnapshot, RoundRates, match_rate,
};
pub use reward::reward;
pub use runner::{
    InferenceSnapshot, MIN_RETRAIN_INTERVAL, RetrainOutcome, RoundReport, Simulation,
    SimulationPhase, retrain_interval,
};
