//! Online sigmoid-linear predictor.
//!
//! Computes `sigmoid(W*x + b)` per output slot and trains with mini-batch
//! gradient descent on binary cross-entropy. Small enough to retrain every
//! few rounds, which is all the simulation needs from a model.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "model_type": "sigmoid_linear",
//!   "model_name": "baseline",
//!   "n_inputs": 140,
//!   "n_outputs": 15,
//!   "weights": [[...140 weights...], ...15 rows...],
//!   "biases": [0.0, ...15 values...],
//!   "config": { "learning_rate": 0.05, "epochs": 20, "batch_size": 32, "l2": 0.0001 }
//! }
//! ```
//!
//! `config` is optional on load; a missing block gives the defaults.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{FitReport, Predictor, PredictorError, Result, TrainingExample, validate_examples};

const MODEL_TYPE: &str = "sigmoid_linear";

/// Probability clamp for the loss, keeps `ln` finite.
const EPS: f64 = 1e-12;

/// Training hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearPredictorConfig {
    /// Step size.
    pub learning_rate: f64,
    /// Epochs for a full [`LinearPredictor::fit`].
    pub epochs: usize,
    /// Mini-batch size.
    pub batch_size: usize,
    /// L2 penalty on weights (not biases).
    pub l2: f64,
}

impl Default for LinearPredictorConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 20,
            batch_size: 32,
            l2: 1e-4,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LinearPredictorJson {
    model_type: String,
    model_name: String,
    n_inputs: usize,
    n_outputs: usize,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    #[serde(default)]
    config: LinearPredictorConfig,
}

/// Multi-output logistic regressor.
#[derive(Debug, Clone)]
pub struct LinearPredictor {
    name: String,
    /// Weight matrix: [n_outputs][n_inputs].
    weights: Vec<Vec<f64>>,
    /// Bias vector: [n_outputs].
    biases: Vec<f64>,
    n_inputs: usize,
    config: LinearPredictorConfig,
}

impl LinearPredictor {
    /// Zero-initialized model (every output starts at 0.5).
    pub fn new(
        name: impl Into<String>,
        n_inputs: usize,
        n_outputs: usize,
        config: LinearPredictorConfig,
    ) -> Self {
        Self {
            name: name.into(),
            weights: vec![vec![0.0; n_inputs]; n_outputs],
            biases: vec![0.0; n_outputs],
            n_inputs,
            config,
        }
    }

    /// Model with small uniform random weights in `[-scale, scale]`.
    pub fn random<R: Rng>(
        name: impl Into<String>,
        n_inputs: usize,
        n_outputs: usize,
        config: LinearPredictorConfig,
        scale: f64,
        rng: &mut R,
    ) -> Self {
        let mut model = Self::new(name, n_inputs, n_outputs, config);
        let scale = scale.abs();
        if scale > 0.0 {
            for row in &mut model.weights {
                for w in row.iter_mut() {
                    *w = rng.gen_range(-scale..=scale);
                }
            }
        }
        model
    }

    /// Training configuration.
    pub fn config(&self) -> &LinearPredictorConfig {
        &self.config
    }

    /// Full training: `config.epochs` passes over `examples`.
    pub fn fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport> {
        self.train(examples, self.config.epochs.max(1))
    }

    /// Mean binary cross-entropy over `examples`.
    pub fn loss(&self, examples: &[TrainingExample]) -> f64 {
        if examples.is_empty() {
            return 0.0;
        }
        let total: f64 = examples
            .iter()
            .map(|ex| {
                let probs = self.predict(&ex.input);
                probs
                    .iter()
                    .zip(&ex.target)
                    .map(|(&p, &y)| {
                        let p = p.clamp(EPS, 1.0 - EPS);
                        -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
                    })
                    .sum::<f64>()
                    / probs.len().max(1) as f64
            })
            .sum();
        total / examples.len() as f64
    }

    /// Runs `epochs` passes. On divergence the parameters are restored to
    /// their state before the call.
    fn train(&mut self, examples: &[TrainingExample], epochs: usize) -> Result<FitReport> {
        validate_examples(examples, self.n_inputs, self.biases.len())?;

        let saved = (self.weights.clone(), self.biases.clone());
        let batch_size = self.config.batch_size.max(1);
        let mut loss = f64::NAN;
        for epoch in 0..epochs {
            for batch in examples.chunks(batch_size) {
                self.step(batch);
            }
            loss = self.loss(examples);
            if !loss.is_finite() {
                (self.weights, self.biases) = saved;
                warn!(model = %self.name, epoch, "fit diverged, parameters restored");
                return Err(PredictorError::Diverged { epoch });
            }
        }

        debug!(
            model = %self.name,
            examples = examples.len(),
            epochs,
            loss,
            "fit complete"
        );

        Ok(FitReport {
            examples: examples.len(),
            epochs,
            loss,
        })
    }

    /// One gradient step over a mini-batch.
    fn step(&mut self, batch: &[TrainingExample]) {
        let n_out = self.biases.len();
        let mut grad_w = vec![vec![0.0; self.n_inputs]; n_out];
        let mut grad_b = vec![0.0; n_out];

        for ex in batch {
            let probs = self.predict(&ex.input);
            for (k, (&p, &y)) in probs.iter().zip(&ex.target).enumerate() {
                // d(BCE)/dz for a sigmoid output
                let err = p - y;
                grad_b[k] += err;
                for (g, &x) in grad_w[k].iter_mut().zip(&ex.input) {
                    *g += err * x;
                }
            }
        }

        let scale = self.config.learning_rate / batch.len() as f64;
        for k in 0..n_out {
            for (w, g) in self.weights[k].iter_mut().zip(&grad_w[k]) {
                *w -= scale * g + self.config.learning_rate * self.config.l2 * *w;
            }
            self.biases[k] -= scale * grad_b[k];
        }
    }

    /// Load a model from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: LinearPredictorJson =
            serde_json::from_str(json).map_err(|e| PredictorError::Json(e.to_string()))?;

        if parsed.model_type != MODEL_TYPE {
            return Err(PredictorError::InvalidModel(format!(
                "expected model_type '{}', got '{}'",
                MODEL_TYPE, parsed.model_type
            )));
        }
        if parsed.weights.len() != parsed.n_outputs {
            return Err(PredictorError::InvalidModel(format!(
                "expected {} weight rows, got {}",
                parsed.n_outputs,
                parsed.weights.len()
            )));
        }
        if let Some((i, row)) = parsed
            .weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != parsed.n_inputs)
        {
            return Err(PredictorError::InvalidModel(format!(
                "weight row {} has {} elements, expected {}",
                i,
                row.len(),
                parsed.n_inputs
            )));
        }
        if parsed.biases.len() != parsed.n_outputs {
            return Err(PredictorError::InvalidModel(format!(
                "expected {} biases, got {}",
                parsed.n_outputs,
                parsed.biases.len()
            )));
        }

        Ok(Self {
            name: parsed.model_name,
            weights: parsed.weights,
            biases: parsed.biases,
            n_inputs: parsed.n_inputs,
            config: parsed.config,
        })
    }

    /// Serialize the parameters and training configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        let json = LinearPredictorJson {
            model_type: MODEL_TYPE.to_string(),
            model_name: self.name.clone(),
            n_inputs: self.n_inputs,
            n_outputs: self.biases.len(),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            config: self.config,
        };
        serde_json::to_string(&json).map_err(|e| PredictorError::Json(e.to_string()))
    }

    /// Replace the training configuration.
    pub fn with_config(mut self, config: LinearPredictorConfig) -> Self {
        self.config = config;
        self
    }
}

impl Predictor for LinearPredictor {
    fn predict(&self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.n_inputs, "input width mismatch");
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, b)| {
                let z = row
                    .iter()
                    .zip(input)
                    .map(|(w, x)| w * x)
                    .sum::<f64>()
                    + b;
                sigmoid(z)
            })
            .collect()
    }

    /// Single epoch over the batch.
    fn incremental_fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport> {
        self.train(examples, 1)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    fn n_outputs(&self) -> usize {
        self.biases.len()
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
