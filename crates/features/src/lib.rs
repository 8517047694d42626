//! Feature engineering for draw histories.
//!
//! Converts raw [`DrawRecord`](types::DrawRecord) history into fixed-width
//! vectors for the predictor, and partially inverts them for reporting.
//!
//! # Modules
//!
//! - [`pipeline`] - [`FeaturePipeline`]: normalize / denormalize / analyze
//! - [`window`] - Trailing per-ball frequency window
//! - [`calendar`] - Date, season and weekday encodings
//!
//! # Example
//!
//! ```ignore
//! use features::FeaturePipeline;
//!
//! let pipeline = FeaturePipeline::default();
//! let vectors = pipeline.normalize(&history);
//! assert!(vectors.iter().all(|v| v.len() == pipeline.width()));
//! ```

pub mod calendar;
pub mod pipeline;
pub mod window;

pub use pipeline::{
    DenormalizedRow, FeaturePipeline, HistoryAnalysis, PipelineConfig, WindowFrequency,
    max_sequence_index,
};
pub use window::FrequencyWindow;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors from pipeline configuration or vector shape checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    #[error("at least one frequency window is required")]
    EmptyWindowSet,

    #[error("frequency windows must be non-zero")]
    ZeroWindow,

    #[error("frequency windows must be strictly ascending ({previous} then {next})")]
    WindowsNotAscending { previous: usize, next: usize },

    #[error("row {row}: feature vector has width {actual}, expected {expected}")]
    WidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
