//! Predictor capability consumed by the simulation.
//!
//! The simulation treats the model as opaque: it asks for scores and hands
//! over batches for incremental training. Anything implementing
//! [`Predictor`] (a linear regressor, a lookup table, a neural net behind
//! FFI) can be plugged in.
//!
//! # Contract
//!
//! - `predict` input width equals [`Predictor::n_inputs`], which must equal the
//!   feature pipeline's width. A mismatch is a caller bug and is rejected
//!   before any round starts.
//! - `predict` output has [`Predictor::n_outputs`] probability-like scores,
//!   one per candidate slot.
//! - `incremental_fit` may fail; the caller decides what happens to the batch.
//!
//! # Usage
//!
//! ```ignore
//! use predictor::{LinearPredictor, LinearPredictorConfig, Predictor};
//!
//! let mut model = LinearPredictor::new("baseline", 140, 15, LinearPredictorConfig::default());
//! model.fit(&examples)?;
//! let scores = model.predict(&features);
//! ```

mod linear;

pub use linear::{LinearPredictor, LinearPredictorConfig};

use serde::{Deserialize, Serialize};

/// Result type for predictor operations.
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Errors raised while training or loading a predictor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("example {index}: input width {actual}, expected {expected}")]
    InputWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("example {index}: target width {actual}, expected {expected}")]
    TargetWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("training batch is empty")]
    EmptyBatch,

    #[error("loss diverged during epoch {epoch}")]
    Diverged { epoch: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("JSON error: {0}")]
    Json(String),
}

/// One supervised example: a feature vector and its target scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

/// Summary of a completed fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Examples seen per epoch.
    pub examples: usize,
    /// Epochs run.
    pub epochs: usize,
    /// Mean binary cross-entropy after the last epoch.
    pub loss: f64,
}

/// Stateful model capability: predict and incrementally fit.
///
/// Implementors must be `Send + Sync` so agents can query the model in
/// parallel within a round. Training takes `&mut self` and therefore never
/// overlaps with prediction.
pub trait Predictor: Send + Sync {
    /// Probability-like scores for one input vector.
    fn predict(&self, input: &[f64]) -> Vec<f64>;

    /// Update the model with a batch of examples.
    fn incremental_fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport>;

    /// Model name for logging.
    fn name(&self) -> &str;

    /// Expected input width.
    fn n_inputs(&self) -> usize;

    /// Output width.
    fn n_outputs(&self) -> usize {
        types::BALLS_PER_DRAW
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, input: &[f64]) -> Vec<f64> {
        (**self).predict(input)
    }

    fn incremental_fit(&mut self, examples: &[TrainingExample]) -> Result<FitReport> {
        (**self).incremental_fit(examples)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn n_inputs(&self) -> usize {
        (**self).n_inputs()
    }

    fn n_outputs(&self) -> usize {
        (**self).n_outputs()
    }
}

/// Check example shapes against a model's widths.
pub fn validate_examples(
    examples: &[TrainingExample],
    n_inputs: usize,
    n_outputs: usize,
) -> Result<()> {
    if examples.is_empty() {
        return Err(PredictorError::EmptyBatch);
    }
    for (index, example) in examples.iter().enumerate() {
        if example.input.len() != n_inputs {
            return Err(PredictorError::InputWidth {
                index,
                expected: n_inputs,
                actual: example.input.len(),
            });
        }
        if example.target.len() != n_outputs {
            return Err(PredictorError::TargetWidth {
                index,
                expected: n_outputs,
                actual: example.target.len(),
            });
        }
    }
    Ok(())
}
