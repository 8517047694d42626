//! Rolling buffer of observed rounds awaiting retraining.

use serde::{Deserialize, Serialize};

use features::FeaturePipeline;
use predictor::TrainingExample;
use types::{BALLS_PER_DRAW, BallSet, DrawRecord, idx};

/// One observed round: the actual draw and the representative prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedRound {
    pub draw: DrawRecord,
    pub prediction: BallSet,
}

impl BufferedRound {
    /// Hits of the buffered prediction against the actual draw.
    pub fn match_count(&self) -> usize {
        self.prediction.match_count(&self.draw.balls)
    }
}

/// Rounds accumulated since the last retraining trigger.
#[derive(Debug, Clone, Default)]
pub struct TrainingBuffer {
    rows: Vec<BufferedRound>,
}

impl TrainingBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a round.
    pub fn push(&mut self, row: BufferedRound) {
        self.rows.push(row);
    }

    /// Buffered rounds, oldest first.
    pub fn rows(&self) -> &[BufferedRound] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop every buffered round.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Mean per-number hit rate of the buffered predictions (0 when empty).
    pub fn hit_rate(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let hits: usize = self.rows.iter().map(BufferedRound::match_count).sum();
        hits as f64 / (self.rows.len() * BALLS_PER_DRAW) as f64
    }

    /// Run the buffered draws through `pipeline` and pair each vector with
    /// its own ball block as the target.
    ///
    /// Index and frequency features are relative to the buffer, not the full
    /// history.
    pub fn to_examples(&self, pipeline: &FeaturePipeline) -> Vec<TrainingExample> {
        let draws: Vec<DrawRecord> = self.rows.iter().map(|r| r.draw.clone()).collect();
        pipeline
            .normalize(&draws)
            .into_iter()
            .map(|input| {
                let target = input[idx::BALLS_START..idx::BALLS_START + BALLS_PER_DRAW].to_vec();
                TrainingExample { input, target }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use types::Ball;

    fn row(seq: u64, actual: &[Ball], predicted: &[Ball]) -> BufferedRound {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(seq);
        BufferedRound {
            draw: DrawRecord::new(seq, date, actual).unwrap(),
            prediction: BallSet::new(predicted).unwrap(),
        }
    }

    fn low() -> Vec<Ball> {
        (1..=15).collect()
    }

    fn high() -> Vec<Ball> {
        (11..=25).collect()
    }

    #[test]
    fn test_hit_rate() {
        let mut buffer = TrainingBuffer::new();
        assert_eq!(buffer.hit_rate(), 0.0);

        buffer.push(row(1, &low(), &low()));
        buffer.push(row(2, &low(), &high()));
        // 15 + 5 hits over 30 slots
        assert!((buffer.hit_rate() - 20.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_examples_target_ball_block() {
        let mut buffer = TrainingBuffer::new();
        buffer.push(row(1, &low(), &high()));
        buffer.push(row(2, &high(), &low()));

        let pipeline = FeaturePipeline::default();
        let examples = buffer.to_examples(&pipeline);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].input.len(), pipeline.width());
        assert_eq!(examples[1].target.len(), BALLS_PER_DRAW);
        assert!((examples[1].target[0] - 11.0 / 25.0).abs() < 1e-12);
        assert!((examples[1].target[14] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_clear() {
        let mut buffer = TrainingBuffer::new();
        buffer.push(row(1, &low(), &low()));
        assert_eq!(buffer.len(), 1);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.to_examples(&FeaturePipeline::default()).is_empty());
    }
}
