//! Match count → score delta.
//!
//! Convex on both sides of [`REWARD_THRESHOLD`]: 13, 14 and 15 matches pay
//! 2, 4 and 8, while 12 matches costs 1 and zero matches costs 4096.

use types::REWARD_THRESHOLD;

/// Score delta for a prediction with `match_count` hits.
#[inline]
pub fn reward(match_count: usize) -> f64 {
    let threshold = REWARD_THRESHOLD as i32;
    let matches = match_count as i32;
    if matches > threshold {
        2f64.powi(matches - threshold)
    } else {
        -(2f64.powi(threshold - matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_above_threshold() {
        assert_eq!(reward(13), 2.0);
        assert_eq!(reward(14), 4.0);
        assert_eq!(reward(15), 8.0);
    }

    #[test]
    fn test_penalty_at_and_below_threshold() {
        assert_eq!(reward(12), -1.0);
        assert_eq!(reward(11), -2.0);
        assert_eq!(reward(9), -8.0);
        assert_eq!(reward(0), -4096.0);
    }

    #[test]
    fn test_reward_monotonic() {
        for m in 0..15 {
            assert!(reward(m) < reward(m + 1), "reward({m}) >= reward({})", m + 1);
        }
    }
}
