//! Identifier types for the forecasting gym.
//!
//! Newtypes keep agent ids from being confused with round counters or
//! sequence indices, all of which are plain integers underneath.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Time Types
// =============================================================================

/// Simulation round number (discrete step, starts at 0, never wraps).
pub type Round = u64;

/// Coarse generation counter advanced independently of rounds.
pub type Generation = u64;

/// Generation a fresh simulation starts in.
pub const FIRST_GENERATION: Generation = 1;

/// Identifier of a historical draw (the lottery's own contest number).
pub type SequenceIndex = u64;

// =============================================================================
// Core ID Types
// =============================================================================

/// Unique identifier for a forecasting agent.
///
/// Populations are numbered from 1, matching the order agents are created in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Agent({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId(7).to_string(), "Agent(7)");
    }

    #[test]
    fn test_agent_id_ordering() {
        let mut ids = vec![AgentId(3), AgentId(1), AgentId(2)];
        ids.sort();
        assert_eq!(ids, vec![AgentId(1), AgentId(2), AgentId(3)]);
        assert_eq!(u64::from(AgentId(9)), 9);
    }
}
