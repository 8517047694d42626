//! Core types for the draw forecasting gym.
//!
//! This crate provides the shared data types used across the workspace:
//! validated draws and ball sets, agent state, evolution/audit records and
//! the fixed feature-vector layout.

pub mod draw;
pub mod features;
pub mod ids;
pub mod records;

// =============================================================================
// Constants
// =============================================================================

/// Numbers drawn per contest.
pub const BALLS_PER_DRAW: usize = 15;

/// Lowest drawable number.
pub const MIN_BALL: Ball = 1;

/// Highest drawable number.
pub const MAX_BALL: Ball = 25;

/// Matches above this threshold earn a reward; at or below, a penalty.
pub const REWARD_THRESHOLD: usize = 12;

// =============================================================================
// Re-exports
// =============================================================================

pub use draw::{Ball, BallSet, DrawError, DrawRecord};
pub use features::{
    FREQUENCY_WINDOWS, FeatureVector, N_DEFAULT_FEATURES, feature_names, feature_width, idx,
};
pub use ids::{AgentId, FIRST_GENERATION, Generation, Round, SequenceIndex};
pub use records::{Agent, EvolutionRecord, LogEntry, MAX_WEIGHT, ModelMetrics, WEIGHT_SCALE};
