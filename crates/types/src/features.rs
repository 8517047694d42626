//! Feature vector layout shared by the pipeline, predictors and the engine.
//!
//! Single source of truth for where each feature lives, so the pipeline
//! that writes vectors and the code that reads them (denormalization,
//! training targets, predictor width checks) never disagree.
//!
//! # Layout
//!
//! ```text
//! [ 15 balls | date | index | sum | season | weekday | 15 × W frequencies ]
//!   0..15      15     16      17    18       19       20..20+15W
//! ```

use crate::{BALLS_PER_DRAW, MAX_BALL};

// =============================================================================
// Constants
// =============================================================================

/// Trailing window sizes (in draws) for frequency features, ascending.
pub const FREQUENCY_WINDOWS: &[usize] = &[3, 5, 7, 10, 15, 20, 50, 100];

/// Scalar features between the ball block and the frequency blocks.
pub const N_SCALAR_FEATURES: usize = 5;

/// Feature width for the default window set.
pub const N_DEFAULT_FEATURES: usize = feature_width(FREQUENCY_WINDOWS.len());

/// Divisor for ball values.
pub const BALL_SCALE: f64 = MAX_BALL as f64;

/// Divisor for the ball sum: balls per draw × highest ball.
pub const SUM_SCALE: f64 = (BALLS_PER_DRAW * MAX_BALL as usize) as f64;

/// Highest season index (seasons are 0..=3).
pub const SEASON_SCALE: f64 = 3.0;

/// Highest weekday index (Sunday = 0 .. Saturday = 6).
pub const WEEKDAY_SCALE: f64 = 6.0;

/// Days per year used by the date feature.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// A model-ready feature vector.
pub type FeatureVector = Vec<f64>;

// =============================================================================
// Feature Indices
// =============================================================================

/// Named feature indices.
pub mod idx {
    use crate::BALLS_PER_DRAW;

    /// First normalized ball.
    pub const BALLS_START: usize = 0;
    /// Years since the epoch date.
    pub const DATE: usize = BALLS_PER_DRAW;
    /// Sequence index / max sequence index.
    pub const INDEX: usize = DATE + 1;
    /// Ball sum / sum scale.
    pub const SUM: usize = INDEX + 1;
    /// Season / 3.
    pub const SEASON: usize = SUM + 1;
    /// Weekday / 6.
    pub const WEEKDAY: usize = SEASON + 1;
    /// First frequency value (window 0, ball 0).
    pub const FREQUENCY_START: usize = WEEKDAY + 1;
}

/// Total vector width for `n_windows` frequency windows.
pub const fn feature_width(n_windows: usize) -> usize {
    idx::FREQUENCY_START + BALLS_PER_DRAW * n_windows
}

/// Offset of the frequency block for window number `window_pos`.
#[inline]
pub const fn frequency_offset(window_pos: usize) -> usize {
    idx::FREQUENCY_START + BALLS_PER_DRAW * window_pos
}

/// Feature names in layout order, for logging and model introspection.
pub fn feature_names(windows: &[usize]) -> Vec<String> {
    let mut names = Vec::with_capacity(feature_width(windows.len()));
    names.extend((1..=BALLS_PER_DRAW).map(|i| format!("f_ball_{}", i)));
    names.extend(
        ["f_date", "f_index", "f_sum", "f_season", "f_weekday"]
            .iter()
            .map(|s| s.to_string()),
    );
    for window in windows {
        names.extend((1..=BALLS_PER_DRAW).map(|i| format!("f_freq_{}_ball_{}", window, i)));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_width() {
        assert_eq!(N_DEFAULT_FEATURES, 15 + 5 + 15 * 8);
        assert_eq!(idx::FREQUENCY_START, BALLS_PER_DRAW + N_SCALAR_FEATURES);
    }

    #[test]
    fn test_scales() {
        assert_eq!(SUM_SCALE, 375.0);
        assert_eq!(BALL_SCALE, 25.0);
    }

    #[test]
    fn test_names_match_width() {
        let names = feature_names(FREQUENCY_WINDOWS);
        assert_eq!(names.len(), N_DEFAULT_FEATURES);
        assert_eq!(names[idx::DATE], "f_date");
        assert_eq!(names[idx::WEEKDAY], "f_weekday");
        assert_eq!(names[frequency_offset(1)], "f_freq_5_ball_1");
    }

    #[test]
    fn test_windows_ascending() {
        assert!(FREQUENCY_WINDOWS.windows(2).all(|w| w[0] < w[1]));
    }
}
