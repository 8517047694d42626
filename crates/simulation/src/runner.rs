//! Simulation runner: replays draw history one round per [`Simulation::step`].
//!
//! # Round Commit
//!
//! A round runs in two halves. Evaluation reads shared state only: agents
//! are scored against the round's draw (in parallel with the `parallel`
//! feature) and each returns an owned outcome. Commit then folds the
//! outcomes, in agent order, into scores, evolution records, logs, the
//! training buffer and the metrics. Any evaluation error aborts the round
//! before commit, and the RNG is rewound to its state at round start.
//!
//! # Randomness
//!
//! One seeded [`StdRng`] drives everything. Each round draws one sub-seed per
//! agent, in agent order, and every agent samples its candidate fill and its
//! random baseline from its own sub-stream. Results are therefore identical
//! for sequential and parallel evaluation.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use features::{FeaturePipeline, HistoryAnalysis, max_sequence_index};
use predictor::{FitReport, Predictor, PredictorError};
use types::{
    Agent, AgentId, BALLS_PER_DRAW, BallSet, DrawRecord, EvolutionRecord, FIRST_GENERATION,
    FeatureVector, Generation, LogEntry, MAX_WEIGHT, ModelMetrics, Round, SequenceIndex,
};

use crate::buffer::{BufferedRound, TrainingBuffer};
use crate::config::SimulationConfig;
use crate::error::{ContractViolation, Result, SimulationError};
use crate::hooks::{AgentSummary, HookContext, HookRunner, SimulationHook};
use crate::metrics::{MetricsAggregator, match_rate};
use crate::reward::reward;
use crate::sampling::{self, Exhausted};

/// Lower bound on the retrain interval.
pub const MIN_RETRAIN_INTERVAL: u64 = 10;

/// Rounds between retraining triggers for a history of `history_len` draws.
pub fn retrain_interval(history_len: usize) -> u64 {
    (history_len as u64 / 10).max(MIN_RETRAIN_INTERVAL)
}

// =============================================================================
// Public Types
// =============================================================================

/// Engine state. Between calls the engine is always `Idle`; the other
/// phases are visible to hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimulationPhase {
    #[default]
    Idle,
    RunningRound,
    Retraining,
}

/// Input and output of the representative agent's predictor call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceSnapshot {
    pub round: Round,
    pub agent_id: AgentId,
    /// Feature vector after the agent's weighting.
    pub input: Vec<f64>,
    /// Raw predictor scores.
    pub output: Vec<f64>,
    /// Prediction derived from the scores.
    pub prediction: BallSet,
}

/// Result of a retraining trigger. The buffer is cleared in both cases.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrainOutcome {
    Succeeded {
        buffered: usize,
        /// Mean hit rate of the buffered predictions.
        hit_rate: f64,
        report: FitReport,
    },
    Failed {
        buffered: usize,
        error: PredictorError,
    },
}

impl RetrainOutcome {
    /// Rounds that were in the buffer.
    pub fn buffered(&self) -> usize {
        match self {
            Self::Succeeded { buffered, .. } | Self::Failed { buffered, .. } => *buffered,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Summary of one committed round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    /// Zero-based round number.
    pub round: Round,
    /// Sequence index of the draw that was replayed.
    pub sequence_index: SequenceIndex,
    /// Matches summed over the population.
    pub total_matches: usize,
    /// Population hit rate this round.
    pub match_rate: f64,
    /// Random-baseline hit rate this round.
    pub random_rate: f64,
    /// Best agent and its match count (lowest id wins ties).
    pub best: Option<(AgentId, usize)>,
    /// Agents at or above the high-match threshold.
    pub high_matches: Vec<(AgentId, usize)>,
    /// Set when this round triggered retraining.
    pub retrain: Option<RetrainOutcome>,
}

// =============================================================================
// Round Internals
// =============================================================================

/// Everything one agent produced in one round. Owned, so evaluation never
/// writes to shared state.
struct AgentOutcome {
    agent_id: AgentId,
    prediction: BallSet,
    matches: usize,
    random_matches: usize,
    input: Vec<f64>,
    output: Vec<f64>,
}

/// Per-round totals, built by value in agent order.
#[derive(Debug, Default)]
struct RoundAccumulator {
    matches: usize,
    random_matches: usize,
    agents: usize,
    best: Option<(AgentId, usize)>,
    high_matches: Vec<(AgentId, usize)>,
}

impl RoundAccumulator {
    fn absorb(mut self, outcome: &AgentOutcome, high_match_threshold: usize) -> Self {
        self.matches += outcome.matches;
        self.random_matches += outcome.random_matches;
        self.agents += 1;

        let improves = match self.best {
            Some((_, best)) => outcome.matches > best,
            None => true,
        };
        if improves {
            self.best = Some((outcome.agent_id, outcome.matches));
        }
        if outcome.matches >= high_match_threshold {
            self.high_matches.push((outcome.agent_id, outcome.matches));
        }
        self
    }

    fn match_rate(&self) -> f64 {
        match_rate(self.matches, self.agents)
    }

    fn random_rate(&self) -> f64 {
        match_rate(self.random_matches, self.agents)
    }
}

fn evaluate_agent<P: Predictor + ?Sized>(
    predictor: &P,
    agent: &Agent,
    features: &[f64],
    actual: &BallSet,
    seed: u64,
    max_attempts: usize,
) -> Result<AgentOutcome> {
    let mut rng = StdRng::seed_from_u64(seed);

    let input = agent.weigh(features);
    let output = predictor.predict(&input);
    if output.len() != BALLS_PER_DRAW {
        return Err(ContractViolation::PredictorOutputs {
            expected: BALLS_PER_DRAW,
            actual: output.len(),
        }
        .into());
    }

    let exhausted = |e: Exhausted| SimulationError::SamplingExhausted {
        agent: agent.id,
        needed: e.missing,
        attempts: e.attempts,
    };
    let candidates = sampling::candidates_from_scores(&output);
    let prediction = sampling::fill_unique(&candidates, &mut rng, max_attempts).map_err(exhausted)?;
    let baseline = sampling::random_draw(&mut rng, max_attempts).map_err(exhausted)?;

    Ok(AgentOutcome {
        agent_id: agent.id,
        matches: prediction.match_count(actual),
        random_matches: baseline.match_count(actual),
        prediction,
        input,
        output,
    })
}

// =============================================================================
// Simulation
// =============================================================================

/// The multi-agent simulation engine.
///
/// Owns its history, agents, buffer and metrics exclusively. Rounds run
/// strictly one after another; retraining blocks the round that triggers it.
pub struct Simulation<P: Predictor = Box<dyn Predictor>> {
    config: SimulationConfig,
    pipeline: FeaturePipeline,
    predictor: P,

    history: Vec<DrawRecord>,
    /// `pipeline.normalize(&history)`, computed once.
    features: Vec<FeatureVector>,
    max_sequence_index: SequenceIndex,
    retrain_interval: u64,

    agents: Vec<Agent>,
    evolution: Vec<EvolutionRecord>,
    logs: Vec<LogEntry>,
    metrics: MetricsAggregator,
    buffer: TrainingBuffer,
    inference: Option<InferenceSnapshot>,

    round: Round,
    generation: Generation,
    phase: SimulationPhase,

    rng: StdRng,
    hooks: HookRunner,
}

impl<P: Predictor> Simulation<P> {
    /// Create a simulation over `history` and initialize the population.
    ///
    /// Fails with a [`ContractViolation`] when the history is empty, the
    /// population is empty or the predictor's widths do not fit the pipeline.
    pub fn new(
        history: Vec<DrawRecord>,
        predictor: P,
        pipeline: FeaturePipeline,
        config: SimulationConfig,
    ) -> Result<Self> {
        if history.is_empty() {
            return Err(ContractViolation::EmptyHistory.into());
        }
        if config.population == 0 {
            return Err(ContractViolation::EmptyPopulation.into());
        }
        if config.representative_agent >= config.population {
            return Err(ContractViolation::RepresentativeOutOfRange {
                index: config.representative_agent,
                population: config.population,
            }
            .into());
        }
        let width = pipeline.width();
        if predictor.n_inputs() != width {
            return Err(ContractViolation::FeatureWidth {
                predictor: predictor.n_inputs(),
                pipeline: width,
            }
            .into());
        }
        if predictor.n_outputs() != BALLS_PER_DRAW {
            return Err(ContractViolation::PredictorOutputs {
                expected: BALLS_PER_DRAW,
                actual: predictor.n_outputs(),
            }
            .into());
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let features = pipeline.normalize(&history);

        let mut sim = Self {
            max_sequence_index: max_sequence_index(&history),
            retrain_interval: retrain_interval(history.len()),
            config,
            pipeline,
            predictor,
            history,
            features,
            agents: Vec::new(),
            evolution: Vec::new(),
            logs: Vec::new(),
            metrics: MetricsAggregator::new(),
            buffer: TrainingBuffer::new(),
            inference: None,
            round: 0,
            generation: FIRST_GENERATION,
            phase: SimulationPhase::Idle,
            rng,
            hooks: HookRunner::new(),
        };
        sim.initialize_agents();

        info!(
            history = sim.history.len(),
            width,
            retrain_interval = sim.retrain_interval,
            model = sim.predictor.name(),
            "simulation ready"
        );
        Ok(sim)
    }

    /// Add a hook to observe simulation events.
    pub fn add_hook(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.add(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    // =========================================================================
    // Population & Generations
    // =========================================================================

    /// Replace the population with fresh agents: ids `1..=population`, zero
    /// score and uniform integer weights in `[0, MAX_WEIGHT]`.
    ///
    /// Evolution history, logs and metrics are kept.
    pub fn initialize_agents(&mut self) {
        let width = self.pipeline.width();
        let population = self.config.population;

        let mut agents = Vec::with_capacity(population);
        for id in 1..=population as u64 {
            let weights = (0..width)
                .map(|_| f64::from(self.rng.gen_range(0..=MAX_WEIGHT)))
                .collect();
            agents.push(Agent::new(AgentId(id), weights));
        }
        self.agents = agents;

        debug!(population, width, "agents initialized");
        self.logs
            .push(LogEntry::message(format!("Initialized {population} agents.")));
    }

    /// Start the next generation. Agent weights are left untouched.
    pub fn advance_generation(&mut self) -> Generation {
        let finished = self.generation;
        self.generation += 1;

        info!(finished, next = self.generation, "generation advanced");
        self.logs.push(LogEntry::message(format!(
            "Generation {finished} complete. Starting generation {}.",
            self.generation
        )));

        if !self.hooks.is_empty() {
            let ctx = self.hook_context();
            self.hooks.on_generation(self.generation, &ctx);
        }
        self.generation
    }

    // =========================================================================
    // Round Loop
    // =========================================================================

    /// Run one round.
    ///
    /// On error nothing is committed: scores, evolution, logs, buffer,
    /// metrics, the round counter and the RNG are as they were.
    pub fn step(&mut self) -> Result<RoundReport> {
        self.phase = SimulationPhase::RunningRound;
        let checkpoint = self.rng.clone();

        match self.evaluate_round() {
            Ok((position, outcomes)) => Ok(self.commit_round(position, outcomes)),
            Err(err) => {
                self.rng = checkpoint;
                self.phase = SimulationPhase::Idle;
                warn!(round = self.round, error = %err, "round rejected");
                Err(err)
            }
        }
    }

    /// Run `rounds` rounds, stopping at the first error.
    pub fn run(&mut self, rounds: u64) -> Result<Vec<RoundReport>> {
        let mut reports = Vec::with_capacity(rounds.min(10_000) as usize);
        for _ in 0..rounds {
            reports.push(self.step()?);
        }

        self.hooks.on_simulation_end(&self.metrics.snapshot());
        Ok(reports)
    }

    fn evaluate_round(&mut self) -> Result<(usize, Vec<AgentOutcome>)> {
        let position = (self.round % self.history.len() as u64) as usize;

        let jobs: Vec<(&Agent, u64)> = self
            .agents
            .iter()
            .map(|agent| (agent, self.rng.r#gen()))
            .collect();

        let predictor = &self.predictor;
        let features = &self.features[position];
        let actual = &self.history[position].balls;
        let max_attempts = self.config.max_sampling_attempts;

        let results = parallel::map_slice(
            &jobs,
            |(agent, seed)| evaluate_agent(predictor, agent, features, actual, *seed, max_attempts),
            self.config.force_sequential,
        );

        let outcomes = results.into_iter().collect::<Result<Vec<_>>>()?;
        Ok((position, outcomes))
    }

    fn commit_round(&mut self, position: usize, outcomes: Vec<AgentOutcome>) -> RoundReport {
        let round = self.round;
        let draw = self.history[position].clone();
        let threshold = self.config.high_match_threshold;

        let acc = outcomes
            .iter()
            .fold(RoundAccumulator::default(), |acc, o| acc.absorb(o, threshold));

        for (agent, outcome) in self.agents.iter_mut().zip(&outcomes) {
            agent.score += reward(outcome.matches);
            agent.last_prediction = Some(outcome.prediction);
            self.evolution.push(EvolutionRecord {
                generation: self.generation,
                agent_id: agent.id,
                score: agent.score,
            });
        }

        for &(agent_id, matches) in &acc.high_matches {
            info!(round, %agent_id, matches, "high match");
            self.logs.push(LogEntry::with_matches(
                format!(
                    "{agent_id} matched {matches} numbers on draw {}!",
                    draw.sequence_index
                ),
                matches,
            ));
        }

        if let Some(rep) = outcomes.into_iter().nth(self.config.representative_agent) {
            self.buffer.push(BufferedRound {
                draw: draw.clone(),
                prediction: rep.prediction,
            });
            self.inference = Some(InferenceSnapshot {
                round,
                agent_id: rep.agent_id,
                input: rep.input,
                output: rep.output,
                prediction: rep.prediction,
            });
        }

        let match_rate = acc.match_rate();
        let random_rate = acc.random_rate();
        self.metrics.record(match_rate, random_rate);

        debug!(
            round,
            sequence_index = draw.sequence_index,
            match_rate,
            random_rate,
            buffered = self.buffer.len(),
            "round committed"
        );

        self.round += 1;
        let retrain = if self.round % self.retrain_interval == 0 && !self.buffer.is_empty() {
            Some(self.retrain())
        } else {
            None
        };
        self.phase = SimulationPhase::Idle;

        let report = RoundReport {
            round,
            sequence_index: draw.sequence_index,
            total_matches: acc.matches,
            match_rate,
            random_rate,
            best: acc.best,
            high_matches: acc.high_matches,
            retrain,
        };

        if !self.hooks.is_empty() {
            let ctx = self.hook_context();
            self.hooks.on_round_end(&report, &ctx);
        }
        report
    }

    /// Fit the predictor on the buffered rounds, log the outcome and clear
    /// the buffer.
    ///
    /// The buffer is cleared on failure too, so a failed batch is lost.
    fn retrain(&mut self) -> RetrainOutcome {
        self.phase = SimulationPhase::Retraining;
        let buffered = self.buffer.len();
        let hit_rate = self.buffer.hit_rate();
        let examples = self.buffer.to_examples(&self.pipeline);

        let outcome = match self.predictor.incremental_fit(&examples) {
            Ok(report) => {
                info!(round = self.round, buffered, hit_rate, loss = report.loss, "model retrained");
                self.logs.push(LogEntry::message(format!(
                    "Model retrained on {buffered} rounds (buffered hit rate {:.1}%).",
                    hit_rate * 100.0
                )));
                RetrainOutcome::Succeeded {
                    buffered,
                    hit_rate,
                    report,
                }
            }
            Err(error) => {
                warn!(round = self.round, buffered, %error, "retraining failed");
                self.logs
                    .push(LogEntry::message(format!("Retraining failed: {error}")));
                RetrainOutcome::Failed { buffered, error }
            }
        };
        self.buffer.clear();

        if !self.hooks.is_empty() {
            let ctx = self.hook_context();
            self.hooks.on_retrain(&outcome, &ctx);
        }
        outcome
    }

    fn hook_context(&self) -> HookContext {
        let agents = self
            .agents
            .iter()
            .map(|a| AgentSummary {
                id: a.id,
                score: a.score,
                last_prediction: a.last_prediction,
            })
            .collect();
        HookContext::new(self.round, self.generation)
            .with_phase(self.phase)
            .with_metrics(self.metrics.snapshot())
            .with_agents(agents)
    }

    // =========================================================================
    // Read-only Views
    // =========================================================================

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// One record per agent per committed round.
    pub fn evolution(&self) -> &[EvolutionRecord] {
        &self.evolution
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn metrics(&self) -> ModelMetrics {
        self.metrics.snapshot()
    }

    pub fn buffer(&self) -> &TrainingBuffer {
        &self.buffer
    }

    /// Representative agent's last predictor call.
    pub fn inference(&self) -> Option<&InferenceSnapshot> {
        self.inference.as_ref()
    }

    /// Largest sequence index in the history.
    pub fn max_sequence_index(&self) -> SequenceIndex {
        self.max_sequence_index
    }

    pub fn retrain_interval(&self) -> u64 {
        self.retrain_interval
    }

    /// Rounds committed so far.
    pub fn round(&self) -> Round {
        self.round
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn history(&self) -> &[DrawRecord] {
        &self.history
    }

    /// Normalized history, aligned with [`history`](Self::history).
    pub fn feature_vectors(&self) -> &[FeatureVector] {
        &self.features
    }

    /// Draw the next [`step`](Self::step) will replay.
    pub fn next_draw(&self) -> &DrawRecord {
        &self.history[(self.round % self.history.len() as u64) as usize]
    }

    /// Frequency and calendar summary of the whole history.
    pub fn analyze(&self) -> HistoryAnalysis {
        self.pipeline.analyze(&self.history)
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use predictor::TrainingExample;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use types::Ball;

    /// Returns fixed scores; optionally fails every fit.
    struct FixedPredictor {
        n_inputs: usize,
        scores: Vec<f64>,
        fail_fit: bool,
        fits: usize,
        last_batch: usize,
    }

    impl FixedPredictor {
        fn new(n_inputs: usize, scores: Vec<f64>) -> Self {
            Self {
                n_inputs,
                scores,
                fail_fit: false,
                fits: 0,
                last_batch: 0,
            }
        }

        /// Scores that map exactly onto balls 1..=15.
        fn low(n_inputs: usize) -> Self {
            Self::new(n_inputs, (1..=15).map(|b| b as f64 / 25.0).collect())
        }

        fn failing(mut self) -> Self {
            self.fail_fit = true;
            self
        }
    }

    impl Predictor for FixedPredictor {
        fn predict(&self, _input: &[f64]) -> Vec<f64> {
            self.scores.clone()
        }

        fn incremental_fit(&mut self, examples: &[TrainingExample]) -> predictor::Result<FitReport> {
            if self.fail_fit {
                return Err(PredictorError::Diverged { epoch: 0 });
            }
            self.fits += 1;
            self.last_batch = examples.len();
            Ok(FitReport {
                examples: examples.len(),
                epochs: 1,
                loss: 0.1,
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn n_inputs(&self) -> usize {
            self.n_inputs
        }
    }

    /// Fixed mid scores, but the `fail_call`-th predict call (0-based)
    /// returns a short output.
    struct FlakyPredictor {
        n_inputs: usize,
        calls: AtomicUsize,
        fail_call: usize,
    }

    impl FlakyPredictor {
        fn new(n_inputs: usize, fail_call: usize) -> Self {
            Self {
                n_inputs,
                calls: AtomicUsize::new(0),
                fail_call,
            }
        }
    }

    impl Predictor for FlakyPredictor {
        fn predict(&self, _input: &[f64]) -> Vec<f64> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_call {
                vec![0.5; 2]
            } else {
                vec![0.5; 15]
            }
        }

        fn incremental_fit(&mut self, examples: &[TrainingExample]) -> predictor::Result<FitReport> {
            Ok(FitReport {
                examples: examples.len(),
                epochs: 1,
                loss: 0.1,
            })
        }

        fn name(&self) -> &str {
            "flaky"
        }

        fn n_inputs(&self) -> usize {
            self.n_inputs
        }
    }

    fn low() -> Vec<Ball> {
        (1..=15).collect()
    }

    fn history(len: u64) -> Vec<DrawRecord> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..len)
            .map(|i| DrawRecord::new(i + 1, start + chrono::Days::new(i * 2), &low()).unwrap())
            .collect()
    }

    fn sim(len: u64, predictor: FixedPredictor, population: usize) -> Simulation<FixedPredictor> {
        Simulation::new(
            history(len),
            predictor,
            FeaturePipeline::default(),
            SimulationConfig::new(population)
                .with_seed(7)
                .with_force_sequential(true),
        )
        .unwrap()
    }

    fn width() -> usize {
        FeaturePipeline::default().width()
    }

    #[test]
    fn test_retrain_interval() {
        assert_eq!(retrain_interval(0), 10);
        assert_eq!(retrain_interval(55), 10);
        assert_eq!(retrain_interval(100), 10);
        assert_eq!(retrain_interval(200), 20);
        assert_eq!(retrain_interval(1234), 123);
    }

    #[test]
    fn test_new_rejects_contract_violations() {
        let config = SimulationConfig::new(2).with_seed(1);
        let pipeline = FeaturePipeline::default();

        let err = Simulation::new(
            Vec::new(),
            FixedPredictor::low(width()),
            pipeline.clone(),
            config.clone(),
        )
        .err();
        assert_eq!(
            err,
            Some(SimulationError::Contract(ContractViolation::EmptyHistory))
        );

        let err = Simulation::new(
            history(3),
            FixedPredictor::low(10),
            pipeline.clone(),
            config.clone(),
        )
        .err();
        assert_eq!(
            err,
            Some(SimulationError::Contract(ContractViolation::FeatureWidth {
                predictor: 10,
                pipeline: 140
            }))
        );

        let err = Simulation::new(
            history(3),
            FixedPredictor::low(width()),
            pipeline.clone(),
            config.clone().with_population(0),
        )
        .err();
        assert_eq!(
            err,
            Some(SimulationError::Contract(ContractViolation::EmptyPopulation))
        );

        let err = Simulation::new(
            history(3),
            FixedPredictor::low(width()),
            pipeline,
            config.with_representative_agent(2),
        )
        .err();
        assert!(matches!(
            err,
            Some(SimulationError::Contract(
                ContractViolation::RepresentativeOutOfRange { .. }
            ))
        ));
    }

    #[test]
    fn test_initialize_agents() {
        let sim = sim(3, FixedPredictor::low(width()), 4);
        let ids: Vec<u64> = sim.agents().iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        for agent in sim.agents() {
            assert_eq!(agent.weights.len(), width());
            assert!(agent.weights.iter().all(|w| w.fract() == 0.0 && (0.0..=1000.0).contains(w)));
            assert_eq!(agent.score, 0.0);
        }
    }

    #[test]
    fn test_perfect_predictions_score_and_log() {
        let mut sim = sim(3, FixedPredictor::low(width()), 2);
        let report = sim.step().unwrap();

        assert_eq!(report.round, 0);
        assert_eq!(report.total_matches, 30);
        assert_eq!(report.match_rate, 1.0);
        assert_eq!(report.best, Some((AgentId(1), 15)));
        assert_eq!(report.high_matches.len(), 2);
        assert!(sim.agents().iter().all(|a| a.score == 8.0));

        let high: Vec<_> = sim.logs().iter().filter(|l| l.match_count.is_some()).collect();
        assert_eq!(high.len(), 2);
        assert_eq!(high[0].match_count, Some(15));

        let metrics = sim.metrics();
        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.total_rounds, 1);
        assert!(metrics.random_accuracy > 0.0 && metrics.random_accuracy <= 1.0);
    }

    #[test]
    fn test_replay_wraps_history() {
        let mut sim = sim(3, FixedPredictor::low(width()), 1);
        let seqs: Vec<u64> = sim
            .run(5)
            .unwrap()
            .iter()
            .map(|r| r.sequence_index)
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 1, 2]);
        assert_eq!(sim.next_draw().sequence_index, 3);
        assert_eq!(sim.round(), 5);
    }

    #[test]
    fn test_wrong_output_width_rejects_round() {
        let mut sim = sim(3, FixedPredictor::new(width(), vec![0.5; 3]), 2);
        let err = sim.step().unwrap_err();
        assert_eq!(
            err,
            SimulationError::Contract(ContractViolation::PredictorOutputs {
                expected: 15,
                actual: 3
            })
        );
        assert_eq!(sim.round(), 0);
        assert!(sim.evolution().is_empty());
        assert!(sim.buffer().is_empty());
        assert_eq!(sim.metrics().total_rounds, 0);
        assert!(sim.agents().iter().all(|a| a.score == 0.0));
        assert_eq!(sim.phase(), SimulationPhase::Idle);
    }

    #[test]
    fn test_sampling_exhaustion_rejects_round() {
        let history = history(3);
        let mut sim = Simulation::new(
            history,
            FixedPredictor::new(width(), vec![0.5; 15]),
            FeaturePipeline::default(),
            SimulationConfig::new(2)
                .with_seed(3)
                .with_max_sampling_attempts(0)
                .with_force_sequential(true),
        )
        .unwrap();

        // All scores nominate ball 13, leaving 14 to sample with no budget
        let err = sim.step().unwrap_err();
        assert_eq!(
            err,
            SimulationError::SamplingExhausted {
                agent: AgentId(1),
                needed: 14,
                attempts: 0
            }
        );
        assert!(sim.logs().iter().all(|l| l.match_count.is_none()));
        assert_eq!(sim.metrics().total_rounds, 0);
    }

    #[test]
    fn test_later_agent_failure_rejects_round_and_retry_matches() {
        let build = |fail_call| {
            Simulation::new(
                history(3),
                FlakyPredictor::new(width(), fail_call),
                FeaturePipeline::default(),
                SimulationConfig::new(3)
                    .with_seed(11)
                    .with_force_sequential(true),
            )
            .unwrap()
        };

        let mut clean = build(usize::MAX);
        clean.run(2).unwrap();

        // Round 0 uses calls 0..3; call 4 is agent 2 in round 1
        let mut flaky = build(4);
        flaky.step().unwrap();
        let after_first: Vec<f64> = flaky.agents().iter().map(|a| a.score).collect();

        let err = flaky.step().unwrap_err();
        assert_eq!(
            err,
            SimulationError::Contract(ContractViolation::PredictorOutputs {
                expected: 15,
                actual: 2
            })
        );
        assert_eq!(flaky.round(), 1);
        assert_eq!(flaky.evolution().len(), 3);
        assert_eq!(flaky.buffer().len(), 1);
        assert_eq!(flaky.metrics().total_rounds, 1);
        let scores: Vec<f64> = flaky.agents().iter().map(|a| a.score).collect();
        assert_eq!(scores, after_first);

        flaky.step().unwrap();
        assert_eq!(flaky.evolution(), clean.evolution());
        assert_eq!(flaky.agents(), clean.agents());
        assert_eq!(flaky.metrics(), clean.metrics());
        assert_eq!(
            flaky.inference().map(|s| s.prediction),
            clean.inference().map(|s| s.prediction)
        );
    }

    #[test]
    fn test_retrain_success_clears_buffer() {
        let mut sim = sim(10, FixedPredictor::low(width()), 2);
        assert_eq!(sim.retrain_interval(), 10);

        let reports = sim.run(9).unwrap();
        assert!(reports.iter().all(|r| r.retrain.is_none()));
        assert_eq!(sim.buffer().len(), 9);

        let report = sim.step().unwrap();
        let outcome = report.retrain.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.buffered(), 10);
        assert!(sim.buffer().is_empty());
        assert_eq!(sim.predictor().fits, 1);
        assert_eq!(sim.predictor().last_batch, 10);
        assert!(
            sim.logs()
                .iter()
                .any(|l| l.message == "Model retrained on 10 rounds (buffered hit rate 100.0%).")
        );
    }

    #[test]
    fn test_retrain_failure_logged_and_buffer_cleared() {
        let mut sim = sim(10, FixedPredictor::low(width()).failing(), 1);
        let reports = sim.run(10).unwrap();

        let outcome = reports[9].retrain.clone().unwrap();
        assert!(!outcome.is_success());
        assert!(sim.buffer().is_empty());
        assert!(
            sim.logs()
                .iter()
                .any(|l| l.message == "Retraining failed: loss diverged during epoch 0")
        );

        // Simulation keeps going
        sim.step().unwrap();
        assert_eq!(sim.buffer().len(), 1);
    }

    #[test]
    fn test_generation_advance() {
        let mut sim = sim(3, FixedPredictor::low(width()), 2);
        sim.step().unwrap();
        assert_eq!(sim.advance_generation(), 2);
        sim.step().unwrap();

        let generations: Vec<u64> = sim.evolution().iter().map(|e| e.generation).collect();
        assert_eq!(generations, vec![1, 1, 2, 2]);
        assert!(
            sim.logs()
                .iter()
                .any(|l| l.message == "Generation 1 complete. Starting generation 2.")
        );
    }

    #[test]
    fn test_evolution_scores_accumulate() {
        let mut sim = sim(3, FixedPredictor::low(width()), 2);
        sim.run(3).unwrap();
        let agent_one: Vec<f64> = sim
            .evolution()
            .iter()
            .filter(|e| e.agent_id == AgentId(1))
            .map(|e| e.score)
            .collect();
        assert_eq!(agent_one, vec![8.0, 16.0, 24.0]);
    }

    #[test]
    fn test_inference_snapshot() {
        let mut sim = sim(3, FixedPredictor::low(width()), 3);
        assert!(sim.inference().is_none());
        sim.step().unwrap();

        let snapshot = sim.inference().unwrap();
        assert_eq!(snapshot.agent_id, AgentId(1));
        assert_eq!(snapshot.input.len(), width());
        assert_eq!(snapshot.output.len(), 15);
        assert_eq!(snapshot.prediction.sorted(), BallSet::new(&low()).unwrap().sorted());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let scores = vec![0.5; 15];
        let mut a = sim(5, FixedPredictor::new(width(), scores.clone()), 3);
        let mut b = sim(5, FixedPredictor::new(width(), scores), 3);
        a.run(4).unwrap();
        b.run(4).unwrap();
        assert_eq!(a.evolution(), b.evolution());
        assert_eq!(a.metrics(), b.metrics());
        assert_eq!(a.agents(), b.agents());
    }

    #[test]
    fn test_reinitialize_keeps_history() {
        let mut sim = sim(3, FixedPredictor::low(width()), 2);
        sim.run(2).unwrap();
        sim.initialize_agents();
        assert!(sim.agents().iter().all(|a| a.score == 0.0 && a.last_prediction.is_none()));
        assert_eq!(sim.evolution().len(), 4);
        assert_eq!(sim.metrics().total_rounds, 2);
    }
}
