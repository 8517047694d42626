//! Draw history → feature vectors, and the partial inverse.
//!
//! # Leakage
//!
//! Frequency features for record `i` are computed from the trailing slice
//! ending at `i` (inclusive). Windows are fed in history order and read
//! immediately after record `i` is pushed, so no record after `i` can
//! influence them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use types::features::{
    BALL_SCALE, SEASON_SCALE, SUM_SCALE, WEEKDAY_SCALE, feature_width, frequency_offset,
};
use types::{BALLS_PER_DRAW, DrawRecord, FREQUENCY_WINDOWS, FeatureVector, MAX_BALL, idx};

use crate::calendar::{N_SEASONS, N_WEEKDAYS, default_epoch, season_index, weekday_index, years_since};
use crate::window::FrequencyWindow;
use crate::{FeatureError, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Trailing window sizes, strictly ascending, all non-zero.
    pub windows: Vec<usize>,
    /// Reference date for the date feature.
    pub epoch: NaiveDate,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            windows: FREQUENCY_WINDOWS.to_vec(),
            epoch: default_epoch(),
        }
    }
}

impl PipelineConfig {
    /// Set the frequency windows.
    pub fn with_windows(mut self, windows: impl Into<Vec<usize>>) -> Self {
        self.windows = windows.into();
        self
    }

    /// Set the epoch date.
    pub fn with_epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = epoch;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(FeatureError::EmptyWindowSet);
        }
        if self.windows.contains(&0) {
            return Err(FeatureError::ZeroWindow);
        }
        if let Some(pair) = self.windows.windows(2).find(|w| w[0] >= w[1]) {
            return Err(FeatureError::WindowsNotAscending {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(())
    }
}

// =============================================================================
// Output Types
// =============================================================================

/// A feature vector with only the outcome fields restored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenormalizedRow {
    /// Ball block × 25, rounded. Not range-checked: predicted vectors may
    /// land outside `[1, 25]`.
    pub balls: [i64; BALLS_PER_DRAW],
    /// Date feature, still normalized.
    pub normalized_date: f64,
    /// Index feature × max index used, rounded.
    pub sequence_index: i64,
    /// Remaining fields (sum, season, weekday, frequencies), still normalized.
    pub passthrough: Vec<f64>,
}

/// Per-ball counts over one trailing window ending at the latest draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFrequency {
    /// Configured window size.
    pub window: usize,
    /// Draws actually covered (smaller than `window` for short histories).
    pub draws: usize,
    /// Occurrences per ball; index 0 is ball 1.
    pub counts: [u32; MAX_BALL as usize],
}

/// Aggregate view of a history for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryAnalysis {
    /// One entry per configured window, ascending.
    pub frequencies: Vec<WindowFrequency>,
    /// Draw counts per season index.
    pub season_counts: [usize; N_SEASONS],
    /// Draw counts per weekday index (Sunday = 0).
    pub weekday_counts: [usize; N_WEEKDAYS],
}

// =============================================================================
// FeaturePipeline
// =============================================================================

/// Deterministic mapping from draw history to fixed-width vectors.
///
/// Stateless between calls: every call rebuilds its windows from the
/// history it is given, so the same history always yields bit-identical
/// output.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    config: PipelineConfig,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }
}

impl FeaturePipeline {
    /// Create a pipeline, validating the window set.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Configured windows.
    pub fn windows(&self) -> &[usize] {
        &self.config.windows
    }

    /// Output vector width.
    pub fn width(&self) -> usize {
        feature_width(self.config.windows.len())
    }

    /// Normalize a history into one vector per record, positionally aligned.
    pub fn normalize(&self, history: &[DrawRecord]) -> Vec<FeatureVector> {
        let max_index = max_sequence_index(history);
        let index_scale = if max_index == 0 { 1.0 } else { max_index as f64 };

        let mut windows: Vec<FrequencyWindow> = self
            .config
            .windows
            .iter()
            .map(|&w| FrequencyWindow::new(w))
            .collect();

        let width = self.width();
        let vectors: Vec<FeatureVector> = history
            .iter()
            .map(|record| {
                for window in &mut windows {
                    window.push(record.balls);
                }
                self.encode(record, index_scale, &windows, width)
            })
            .collect();

        debug!(
            records = history.len(),
            width,
            max_index,
            "normalized draw history"
        );
        vectors
    }

    fn encode(
        &self,
        record: &DrawRecord,
        index_scale: f64,
        windows: &[FrequencyWindow],
        width: usize,
    ) -> FeatureVector {
        let mut v = vec![0.0; width];

        for (slot, ball) in v[idx::BALLS_START..idx::BALLS_START + BALLS_PER_DRAW]
            .iter_mut()
            .zip(record.balls.iter())
        {
            *slot = ball as f64 / BALL_SCALE;
        }

        v[idx::DATE] = years_since(record.draw_date, self.config.epoch);
        v[idx::INDEX] = record.sequence_index as f64 / index_scale;
        v[idx::SUM] = record.balls.sum() as f64 / SUM_SCALE;
        v[idx::SEASON] = season_index(record.draw_date) as f64 / SEASON_SCALE;
        v[idx::WEEKDAY] = weekday_index(record.draw_date) as f64 / WEEKDAY_SCALE;

        for (pos, window) in windows.iter().enumerate() {
            let start = frequency_offset(pos);
            for (slot, ball) in v[start..start + BALLS_PER_DRAW]
                .iter_mut()
                .zip(record.balls.iter())
            {
                *slot = window.frequency(ball);
            }
        }

        v
    }

    /// Restore the ball block and the index from normalized vectors.
    ///
    /// Everything else passes through normalized. `max_index_used` of 0 is
    /// treated as 1.
    pub fn denormalize(
        &self,
        vectors: &[FeatureVector],
        max_index_used: u64,
    ) -> Result<Vec<DenormalizedRow>> {
        let width = self.width();
        let index_scale = max_index_used.max(1) as f64;

        vectors
            .iter()
            .enumerate()
            .map(|(row, v)| {
                if v.len() != width {
                    return Err(FeatureError::WidthMismatch {
                        row,
                        expected: width,
                        actual: v.len(),
                    });
                }

                let mut balls = [0i64; BALLS_PER_DRAW];
                for (ball, value) in balls.iter_mut().zip(&v[idx::BALLS_START..]) {
                    *ball = (value * BALL_SCALE).round() as i64;
                }

                Ok(DenormalizedRow {
                    balls,
                    normalized_date: v[idx::DATE],
                    sequence_index: (v[idx::INDEX] * index_scale).round() as i64,
                    passthrough: v[idx::SUM..].to_vec(),
                })
            })
            .collect()
    }

    /// Frequency, season and weekday summary of a history.
    pub fn analyze(&self, history: &[DrawRecord]) -> HistoryAnalysis {
        let frequencies = self
            .config
            .windows
            .iter()
            .map(|&w| {
                let mut window = FrequencyWindow::new(w);
                let start = history.len().saturating_sub(w);
                for record in &history[start..] {
                    window.push(record.balls);
                }
                WindowFrequency {
                    window: w,
                    draws: window.len(),
                    counts: window.counts(),
                }
            })
            .collect();

        let mut season_counts = [0; N_SEASONS];
        let mut weekday_counts = [0; N_WEEKDAYS];
        for record in history {
            season_counts[season_index(record.draw_date) as usize] += 1;
            weekday_counts[weekday_index(record.draw_date) as usize] += 1;
        }

        HistoryAnalysis {
            frequencies,
            season_counts,
            weekday_counts,
        }
    }
}

/// Largest sequence index in a history (0 when empty).
pub fn max_sequence_index(history: &[DrawRecord]) -> u64 {
    history.iter().map(|r| r.sequence_index).max().unwrap_or(0)
}
