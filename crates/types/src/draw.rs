//! Draw records and validated ball sets.
//!
//! A [`BallSet`] is the only way a set of 15 numbers enters the system, so
//! every draw and every prediction satisfies the uniqueness/range invariant
//! by construction. Membership is kept as a bitmask alongside the ordered
//! numbers, which makes match counting a single `popcount`.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BALLS_PER_DRAW, MAX_BALL, MIN_BALL, SequenceIndex};

/// A single lottery number.
pub type Ball = u8;

/// Result type for draw validation.
pub type Result<T> = std::result::Result<T, DrawError>;

/// Reasons a set of numbers is not a valid draw or prediction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("expected {expected} balls, got {actual}")]
    WrongBallCount { expected: usize, actual: usize },

    #[error("ball {0} outside [{min}, {max}]", min = MIN_BALL, max = MAX_BALL)]
    BallOutOfRange(Ball),

    #[error("ball {0} appears more than once")]
    DuplicateBall(Ball),
}

// =============================================================================
// BallSet
// =============================================================================

/// Exactly [`BALLS_PER_DRAW`] unique numbers in `[MIN_BALL, MAX_BALL]`.
///
/// Insertion order is preserved (feature vectors encode balls in drawn
/// order); equality and hashing are order-sensitive for the same reason.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Ball>", into = "Vec<Ball>")]
pub struct BallSet {
    balls: [Ball; BALLS_PER_DRAW],
    /// Bit `b` is set when ball `b` is present.
    mask: u32,
}

impl BallSet {
    /// Validate and build a ball set from a slice.
    pub fn new(balls: &[Ball]) -> Result<Self> {
        if balls.len() != BALLS_PER_DRAW {
            return Err(DrawError::WrongBallCount {
                expected: BALLS_PER_DRAW,
                actual: balls.len(),
            });
        }

        let mut mask = 0u32;
        let mut ordered = [0; BALLS_PER_DRAW];
        for (slot, &ball) in ordered.iter_mut().zip(balls) {
            if !(MIN_BALL..=MAX_BALL).contains(&ball) {
                return Err(DrawError::BallOutOfRange(ball));
            }
            let bit = 1u32 << ball;
            if mask & bit != 0 {
                return Err(DrawError::DuplicateBall(ball));
            }
            mask |= bit;
            *slot = ball;
        }

        Ok(Self {
            balls: ordered,
            mask,
        })
    }

    /// Balls in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[Ball] {
        &self.balls
    }

    /// Iterate balls in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Ball> + '_ {
        self.balls.iter().copied()
    }

    /// Membership bitmask (bit `b` set for ball `b`).
    #[inline]
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Check whether a ball is in the set.
    #[inline]
    pub fn contains(&self, ball: Ball) -> bool {
        ball <= MAX_BALL && self.mask & (1u32 << ball) != 0
    }

    /// Size of the intersection with another set.
    #[inline]
    pub fn match_count(&self, other: &BallSet) -> usize {
        (self.mask & other.mask).count_ones() as usize
    }

    /// Sum of all balls.
    pub fn sum(&self) -> u32 {
        self.balls.iter().map(|&b| u32::from(b)).sum()
    }

    /// Balls in ascending order.
    pub fn sorted(&self) -> [Ball; BALLS_PER_DRAW] {
        let mut sorted = self.balls;
        sorted.sort_unstable();
        sorted
    }
}

impl TryFrom<Vec<Ball>> for BallSet {
    type Error = DrawError;

    fn try_from(balls: Vec<Ball>) -> Result<Self> {
        Self::new(&balls)
    }
}

impl From<BallSet> for Vec<Ball> {
    fn from(set: BallSet) -> Self {
        set.balls.to_vec()
    }
}

impl fmt::Debug for BallSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BallSet{:?}", self.balls)
    }
}

impl fmt::Display for BallSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ball) in self.sorted().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02}", ball)?;
        }
        Ok(())
    }
}

// =============================================================================
// DrawRecord
// =============================================================================

/// One historical draw. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Contest number; doubles as the round identifier during replay.
    pub sequence_index: SequenceIndex,
    /// Calendar date of the draw.
    pub draw_date: NaiveDate,
    /// The 15 drawn numbers, in drawn order.
    pub balls: BallSet,
}

impl DrawRecord {
    /// Build a record, validating the balls.
    pub fn new(sequence_index: SequenceIndex, draw_date: NaiveDate, balls: &[Ball]) -> Result<Self> {
        Ok(Self {
            sequence_index,
            draw_date,
            balls: BallSet::new(balls)?,
        })
    }
}
