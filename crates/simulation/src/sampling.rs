//! Unique-number sampling for predictions and the random baseline.
//!
//! Predictor scores only nominate candidates. Distinctness is enforced
//! afterwards by uniform rejection sampling, bounded by an explicit attempt
//! budget so a pathological RNG can never spin forever.

use rand::Rng;

use types::{BALLS_PER_DRAW, Ball, BallSet, MAX_BALL, MIN_BALL};

/// Sampling ran out of attempts before reaching [`BALLS_PER_DRAW`] numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted {
    /// Numbers still missing when the budget ran out.
    pub missing: usize,
    /// Attempts spent.
    pub attempts: usize,
}

/// Map predictor scores to candidate numbers.
///
/// Each score becomes `round(score × 25)` clamped to `[1, 25]`. Non-finite
/// scores nominate nothing. Duplicates are kept; [`fill_unique`] skips them.
pub fn candidates_from_scores(scores: &[f64]) -> Vec<Ball> {
    let scale = f64::from(MAX_BALL);
    scores
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| (s * scale).round().clamp(f64::from(MIN_BALL), scale) as Ball)
        .collect()
}

/// Build a [`BallSet`] from `candidates` (first occurrence wins), then top up
/// with uniform draws from `[1, 25]`, rejecting numbers already present.
///
/// At most `max_attempts` uniform draws are made.
pub fn fill_unique<R: Rng + ?Sized>(
    candidates: &[Ball],
    rng: &mut R,
    max_attempts: usize,
) -> Result<BallSet, Exhausted> {
    let mut picked = Vec::with_capacity(BALLS_PER_DRAW);
    let mut mask = 0u32;

    let mut take = |ball: Ball, picked: &mut Vec<Ball>| {
        let bit = 1u32 << ball;
        if mask & bit == 0 {
            mask |= bit;
            picked.push(ball);
        }
    };

    for &ball in candidates {
        if picked.len() == BALLS_PER_DRAW {
            break;
        }
        if (MIN_BALL..=MAX_BALL).contains(&ball) {
            take(ball, &mut picked);
        }
    }

    let mut attempts = 0;
    while picked.len() < BALLS_PER_DRAW {
        if attempts == max_attempts {
            return Err(Exhausted {
                missing: BALLS_PER_DRAW - picked.len(),
                attempts,
            });
        }
        attempts += 1;
        take(rng.gen_range(MIN_BALL..=MAX_BALL), &mut picked);
    }

    // Unique and in range by construction
    BallSet::new(&picked).map_err(|_| Exhausted {
        missing: BALLS_PER_DRAW,
        attempts,
    })
}

/// Uniform random prediction (the baseline).
pub fn random_draw<R: Rng + ?Sized>(rng: &mut R, max_attempts: usize) -> Result<BallSet, Exhausted> {
    fill_unique(&[], rng, max_attempts)
}
