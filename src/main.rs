//! Draw Gym - headless runner.
//!
//! Synthesizes a draw history, pre-trains the linear predictor on it, then
//! replays the history with a population of agents and prints a summary.
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` for per-round detail.

mod config;
mod history;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use features::{FeaturePipeline, PipelineConfig};
use predictor::{LinearPredictor, LinearPredictorConfig, TrainingExample};
use simulation::{RateHistoryHook, Simulation, SimulationConfig};
use types::{BALLS_PER_DRAW, DrawRecord, feature_names, idx};

use config::RunConfig;

/// Draw Gym - multi-agent draw forecasting simulation
#[derive(Parser, Debug)]
#[command(name = "draw-gym")]
#[command(about = "Replays a draw history with competing forecasting agents")]
#[command(version)]
struct Args {
    /// Rounds to run
    #[arg(long, env = "GYM_ROUNDS")]
    rounds: Option<u64>,

    /// Number of agents
    #[arg(long, env = "GYM_AGENTS")]
    agents: Option<usize>,

    /// Synthetic history length
    #[arg(long, env = "GYM_HISTORY")]
    history: Option<usize>,

    /// Rounds per generation (0 = never advance)
    #[arg(long, env = "GYM_GENERATION_LENGTH")]
    generation_length: Option<u64>,

    /// RNG seed
    #[arg(long, env = "GYM_SEED")]
    seed: Option<u64>,

    /// Pre-training epochs
    #[arg(long, env = "GYM_PRETRAIN_EPOCHS")]
    pretrain_epochs: Option<usize>,

    /// Predictor learning rate
    #[arg(long, env = "GYM_LEARNING_RATE")]
    learning_rate: Option<f64>,

    /// Evaluate agents sequentially (profiling)
    #[arg(long, env = "GYM_SEQUENTIAL")]
    sequential: bool,
}

impl Args {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::default()
            .with_seed(self.seed)
            .with_force_sequential(self.sequential);
        if let Some(rounds) = self.rounds {
            config = config.with_rounds(rounds);
        }
        if let Some(agents) = self.agents {
            config = config.with_population(agents);
        }
        if let Some(len) = self.history {
            config = config.with_history_len(len);
        }
        if let Some(len) = self.generation_length {
            config = config.with_generation_length(len);
        }
        if let Some(epochs) = self.pretrain_epochs {
            config = config.with_pretrain_epochs(epochs);
        }
        if let Some(rate) = self.learning_rate {
            config = config.with_learning_rate(rate);
        }
        config
    }
}

/// Full history as supervised examples: features in, ball block out.
fn training_examples(pipeline: &FeaturePipeline, history: &[DrawRecord]) -> Vec<TrainingExample> {
    pipeline
        .normalize(history)
        .into_iter()
        .map(|input| TrainingExample {
            target: input[idx::BALLS_START..idx::BALLS_START + BALLS_PER_DRAW].to_vec(),
            input,
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config();

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // ─────────────────────────────────────────────────────────────────────────
    // History, features, model
    // ─────────────────────────────────────────────────────────────────────────
    let history = history::synthesize(config.history_len, config.start_date, &mut rng)
        .context("failed to synthesize draw history")?;

    let pipeline = FeaturePipeline::new(
        PipelineConfig::default().with_windows(config.windows.clone()),
    )
    .context("invalid feature pipeline configuration")?;

    let model_config = LinearPredictorConfig {
        learning_rate: config.learning_rate,
        epochs: config.pretrain_epochs,
        ..LinearPredictorConfig::default()
    };
    let mut model = LinearPredictor::random(
        "draw-gym-linear",
        pipeline.width(),
        BALLS_PER_DRAW,
        model_config,
        config.init_scale,
        &mut rng,
    );

    if config.pretrain_epochs > 0 && !history.is_empty() {
        let fit = model
            .fit(&training_examples(&pipeline, &history))
            .context("pre-training failed")?;
        info!(examples = fit.examples, epochs = fit.epochs, loss = fit.loss, "model pre-trained");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Simulation
    // ─────────────────────────────────────────────────────────────────────────
    let mut sim_config = SimulationConfig::new(config.population)
        .with_force_sequential(config.force_sequential);
    if let Some(seed) = config.seed {
        sim_config = sim_config.with_seed(seed.wrapping_add(1));
    }

    let mut sim = Simulation::new(history, model, pipeline, sim_config)
        .context("failed to build simulation")?;
    let rates = Arc::new(RateHistoryHook::new());
    sim.add_hook(rates.clone());

    eprintln!("╔═══════════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Draw Gym - Headless Mode                                             ║");
    eprintln!("╠═══════════════════════════════════════════════════════════════════════╣");
    eprintln!(
        "║  History: {:6}  │  Rounds: {:7}  │  Agents: {:4}                  ║",
        sim.history().len(),
        config.rounds,
        config.population
    );
    eprintln!(
        "║  Features: {:5}  │  Retrain every: {:5}  │  Generation: {:5}       ║",
        sim.pipeline().width(),
        sim.retrain_interval(),
        config.generation_length
    );
    eprintln!("╚═══════════════════════════════════════════════════════════════════════╝");
    eprintln!();

    let start = Instant::now();
    let progress_every = (config.rounds / 10).max(1);

    for done in 1..=config.rounds {
        sim.step()
            .with_context(|| format!("round {} aborted", done - 1))?;

        if config.generation_boundary(done) {
            sim.advance_generation();
        }
        if done % progress_every == 0 {
            eprintln!(
                "  {:3}% ({}/{} rounds)  accuracy {:.4}",
                done * 100 / config.rounds,
                done,
                config.rounds,
                sim.metrics().accuracy
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Summary
    // ─────────────────────────────────────────────────────────────────────────
    let elapsed = start.elapsed();
    let metrics = sim.metrics();
    let counters = rates.snapshot();

    eprintln!();
    eprintln!("╔═══════════════════════════════════════════════════════════════════════╗");
    eprintln!("║  Simulation Complete                                                  ║");
    eprintln!("╠═══════════════════════════════════════════════════════════════════════╣");
    eprintln!(
        "║  Rounds: {:7}  │  Elapsed: {:6.2}s  │  Rate: {:8.0} rounds/s     ║",
        metrics.total_rounds,
        elapsed.as_secs_f64(),
        metrics.total_rounds as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    eprintln!(
        "║  Accuracy: {:.4}  │  Random: {:.4}  │  Edge: {:+.4}              ║",
        metrics.accuracy,
        metrics.random_accuracy,
        metrics.edge()
    );
    eprintln!(
        "║  Best match: {:2}  │  High-match rounds: {:5}  │  Generation: {:4}   ║",
        counters.best_match_count,
        counters.high_match_rounds,
        sim.generation()
    );
    eprintln!(
        "║  Retrains: {:4} ok / {:4} failed                                      ║",
        counters.retrain_successes, counters.retrain_failures
    );
    eprintln!("╠═══════════════════════════════════════════════════════════════════════╣");

    let mut ranked: Vec<_> = sim.agents().iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    for agent in ranked.iter().take(3) {
        let prediction = agent
            .last_prediction
            .map(|p| p.to_string())
            .unwrap_or_default();
        eprintln!(
            "║  {:>10}  score {:>12.0}  last {:<38}║",
            agent.id.to_string(),
            agent.score,
            prediction
        );
    }
    eprintln!("╚═══════════════════════════════════════════════════════════════════════╝");

    if let Some(snapshot) = sim.inference() {
        let names = feature_names(sim.pipeline().windows());
        let mut strongest: Vec<(&String, f64)> =
            names.iter().zip(snapshot.input.iter().copied()).collect();
        strongest.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        let top: Vec<String> = strongest
            .iter()
            .take(3)
            .map(|(name, value)| format!("{name}={value:.3}"))
            .collect();
        eprintln!("  Strongest inputs for {}: {}", snapshot.agent_id, top.join(", "));
    }

    for entry in sim.logs().iter().rev().take(5).rev() {
        eprintln!("  {}", entry.message);
    }

    Ok(())
}
