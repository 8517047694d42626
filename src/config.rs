//! Run configuration for the headless binary.

use chrono::NaiveDate;

use types::FREQUENCY_WINDOWS;

/// Everything one headless run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────
    /// Synthetic draws to generate.
    pub history_len: usize,
    /// Date of the first synthetic draw.
    pub start_date: NaiveDate,
    /// Frequency windows for the feature pipeline.
    pub windows: Vec<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Simulation
    // ─────────────────────────────────────────────────────────────────────────
    /// Rounds to run.
    pub rounds: u64,
    /// Population size.
    pub population: usize,
    /// Rounds per generation (0 = never advance).
    pub generation_length: u64,
    /// Master seed (`None` = entropy).
    pub seed: Option<u64>,
    /// Evaluate agents sequentially.
    pub force_sequential: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Model
    // ─────────────────────────────────────────────────────────────────────────
    /// Epochs of full training before the first round.
    pub pretrain_epochs: usize,
    /// SGD step size.
    pub learning_rate: f64,
    /// Half-width of the uniform weight initialization.
    pub init_scale: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            history_len: 500,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap_or(NaiveDate::MIN),
            windows: FREQUENCY_WINDOWS.to_vec(),
            rounds: 1000,
            population: 10,
            generation_length: 100,
            seed: None,
            force_sequential: false,
            pretrain_epochs: 20,
            learning_rate: 0.05,
            init_scale: 0.01,
        }
    }
}

impl RunConfig {
    pub fn with_history_len(mut self, len: usize) -> Self {
        self.history_len = len;
        self
    }

    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_generation_length(mut self, rounds: u64) -> Self {
        self.generation_length = rounds;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_force_sequential(mut self, force: bool) -> Self {
        self.force_sequential = force;
        self
    }

    pub fn with_pretrain_epochs(mut self, epochs: usize) -> Self {
        self.pretrain_epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Whether a generation ends after `rounds_done` rounds.
    pub fn generation_boundary(&self, rounds_done: u64) -> bool {
        self.generation_length > 0 && rounds_done > 0 && rounds_done % self.generation_length == 0
    }
}
