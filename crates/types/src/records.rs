//! Simulation-side records: agents, evolution history, audit log, metrics.

use serde::{Deserialize, Serialize};

use crate::{AgentId, BallSet, Generation};

/// Upper bound of an agent's per-feature confidence weight.
pub const MAX_WEIGHT: u16 = 1000;

/// Divisor applied to weights before they multiply a feature.
pub const WEIGHT_SCALE: f64 = MAX_WEIGHT as f64;

// =============================================================================
// Agent
// =============================================================================

/// A simulated forecaster with its own feature weighting and running score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    /// Accumulated reward. Unbounded and signed.
    pub score: f64,
    /// Most recent 15-number prediction; `None` until the first round.
    pub last_prediction: Option<BallSet>,
    /// Integer-valued confidence multipliers in `[0, MAX_WEIGHT]`, one per
    /// feature dimension.
    pub weights: Vec<f64>,
}

impl Agent {
    /// Create an agent with zero score and no prediction yet.
    pub fn new(id: AgentId, weights: Vec<f64>) -> Self {
        Self {
            id,
            score: 0.0,
            last_prediction: None,
            weights,
        }
    }

    /// Elementwise product of `features` and this agent's scaled weights.
    ///
    /// Callers must ensure `features.len() == self.weights.len()`.
    pub fn weigh(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(&self.weights)
            .map(|(f, w)| f * (w / WEIGHT_SCALE))
            .collect()
    }
}

// =============================================================================
// History Records
// =============================================================================

/// One agent's score after one round. Appended, never modified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvolutionRecord {
    pub generation: Generation,
    pub agent_id: AgentId,
    pub score: f64,
}

/// Audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    /// Set for high-match announcements.
    pub match_count: Option<usize>,
}

impl LogEntry {
    /// Plain message with no match count.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            match_count: None,
        }
    }

    /// Message announcing a match count.
    pub fn with_matches(message: impl Into<String>, match_count: usize) -> Self {
        Self {
            message: message.into(),
            match_count: Some(match_count),
        }
    }
}

/// Running accuracy of the agent population against a random baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Weighted mean of per-round agent match rates, in `[0, 1]`.
    pub accuracy: f64,
    /// Weighted mean of per-round random-baseline match rates, in `[0, 1]`.
    pub random_accuracy: f64,
    /// Rounds folded into the averages.
    pub total_rounds: u64,
}

impl ModelMetrics {
    /// Accuracy advantage over the random baseline.
    pub fn edge(&self) -> f64 {
        self.accuracy - self.random_accuracy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weigh_scales_by_thousand() {
        let agent = Agent::new(AgentId(1), vec![1000.0, 500.0, 0.0]);
        let weighted = agent.weigh(&[0.4, 0.4, 0.4]);
        assert!((weighted[0] - 0.4).abs() < 1e-12);
        assert!((weighted[1] - 0.2).abs() < 1e-12);
        assert_eq!(weighted[2], 0.0);
    }

    #[test]
    fn test_new_agent_is_blank() {
        let agent = Agent::new(AgentId(4), vec![1.0; 3]);
        assert_eq!(agent.score, 0.0);
        assert!(agent.last_prediction.is_none());
    }

    #[test]
    fn test_log_entry_constructors() {
        assert_eq!(LogEntry::message("hi").match_count, None);
        assert_eq!(LogEntry::with_matches("hit", 14).match_count, Some(14));
    }

    #[test]
    fn test_metrics_edge() {
        let metrics = ModelMetrics {
            accuracy: 0.62,
            random_accuracy: 0.6,
            total_rounds: 3,
        };
        assert!((metrics.edge() - 0.02).abs() < 1e-12);
        assert_eq!(ModelMetrics::default().total_rounds, 0);
    }
}
