//! Simulation errors.
//!
//! Retraining failures are not errors here: they are recovered inside the
//! round and surface as [`RetrainOutcome::Failed`](crate::RetrainOutcome).

use types::{AgentId, DrawError};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Caller bugs detected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("draw history is empty")]
    EmptyHistory,

    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("representative agent index {index} out of range for population {population}")]
    RepresentativeOutOfRange { index: usize, population: usize },

    #[error("predictor expects {predictor} inputs but the feature pipeline produces {pipeline}")]
    FeatureWidth { predictor: usize, pipeline: usize },

    #[error("predictor produced {actual} scores, expected {expected}")]
    PredictorOutputs { expected: usize, actual: usize },

    #[error("history record {position} is malformed: {source}")]
    InvalidRecord {
        position: usize,
        #[source]
        source: DrawError,
    },
}

/// Errors that abort a round (or a simulation setup) in full.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),

    #[error("{agent}: could not draw {needed} unique numbers within {attempts} attempts")]
    SamplingExhausted {
        agent: AgentId,
        needed: usize,
        attempts: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_display() {
        let err: SimulationError = ContractViolation::FeatureWidth {
            predictor: 10,
            pipeline: 140,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "contract violation: predictor expects 10 inputs but the feature pipeline produces 140"
        );
    }

    #[test]
    fn test_sampling_display() {
        let err = SimulationError::SamplingExhausted {
            agent: AgentId(3),
            needed: 4,
            attempts: 100,
        };
        assert_eq!(
            err.to_string(),
            "Agent(3): could not draw 4 unique numbers within 100 attempts"
        );
    }
}
