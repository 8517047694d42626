//! Simulation configuration options.

/// Configuration for the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of agents in the population.
    pub population: usize,

    /// Seed for agent weights, per-agent sampling streams and the baseline.
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Uniform draws allowed per unique-number sample before the round is
    /// rejected.
    pub max_sampling_attempts: usize,

    /// Match count at or above which a round is logged as a high match.
    pub high_match_threshold: usize,

    /// Population index whose prediction feeds the training buffer and the
    /// inference snapshot.
    pub representative_agent: usize,

    /// Evaluate agents sequentially even when the `parallel` feature is on.
    pub force_sequential: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population: 10,
            seed: None,
            max_sampling_attempts: 10_000,
            high_match_threshold: 13,
            representative_agent: 0,
            force_sequential: false,
        }
    }
}

impl SimulationConfig {
    /// Create a configuration with the given population size.
    pub fn new(population: usize) -> Self {
        Self {
            population,
            ..Default::default()
        }
    }

    /// Set the population size.
    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the sampling attempt budget.
    pub fn with_max_sampling_attempts(mut self, attempts: usize) -> Self {
        self.max_sampling_attempts = attempts;
        self
    }

    /// Set the high-match log threshold.
    pub fn with_high_match_threshold(mut self, threshold: usize) -> Self {
        self.high_match_threshold = threshold;
        self
    }

    /// Set the representative agent index.
    pub fn with_representative_agent(mut self, index: usize) -> Self {
        self.representative_agent = index;
        self
    }

    /// Force sequential agent evaluation.
    pub fn with_force_sequential(mut self, force: bool) -> Self {
        self.force_sequential = force;
        self
    }
}
