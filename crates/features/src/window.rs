//! Trailing frequency window over recent draws.
//!
//! Keeps the most recent `capacity` draws and per-ball occurrence counts,
//! updated incrementally on push so a full history pass costs O(n) per
//! window instead of rescanning each trailing slice.

use std::collections::VecDeque;

use types::{Ball, BallSet, MAX_BALL};

const N_SLOTS: usize = MAX_BALL as usize + 1;

/// Per-ball occurrence counts over the last `capacity` draws.
///
/// # Example
/// ```
/// use features::window::FrequencyWindow;
/// use types::BallSet;
///
/// let draw = BallSet::new(&(1..=15).collect::<Vec<_>>()).unwrap();
/// let mut window = FrequencyWindow::new(3);
/// window.push(draw);
/// window.push(draw);
/// assert_eq!(window.count(1), 2);
/// assert_eq!(window.distinct(), 15);
/// ```
#[derive(Debug, Clone)]
pub struct FrequencyWindow {
    draws: VecDeque<BallSet>,
    capacity: usize,
    /// Indexed by ball number; slot 0 unused.
    counts: [u32; N_SLOTS],
    /// Balls with a non-zero count.
    distinct: usize,
}

impl FrequencyWindow {
    /// Create an empty window.
    ///
    /// # Panics
    /// Panics if capacity is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FrequencyWindow capacity must be > 0");
        Self {
            draws: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            counts: [0; N_SLOTS],
            distinct: 0,
        }
    }

    /// Push a draw, evicting and returning the oldest one when full.
    pub fn push(&mut self, balls: BallSet) -> Option<BallSet> {
        let removed = if self.draws.len() >= self.capacity {
            self.draws.pop_front()
        } else {
            None
        };

        if let Some(old) = &removed {
            for ball in old.iter() {
                let slot = &mut self.counts[ball as usize];
                *slot -= 1;
                if *slot == 0 {
                    self.distinct -= 1;
                }
            }
        }

        for ball in balls.iter() {
            let slot = &mut self.counts[ball as usize];
            if *slot == 0 {
                self.distinct += 1;
            }
            *slot += 1;
        }
        self.draws.push_back(balls);

        removed
    }

    /// Occurrences of `ball` in the window.
    #[inline]
    pub fn count(&self, ball: Ball) -> u32 {
        self.counts.get(ball as usize).copied().unwrap_or(0)
    }

    /// Number of distinct balls seen in the window.
    #[inline]
    pub fn distinct(&self) -> usize {
        self.distinct
    }

    /// Occurrences of `ball` divided by the distinct-ball count.
    ///
    /// Returns 0.0 for an empty window.
    pub fn frequency(&self, ball: Ball) -> f64 {
        if self.distinct == 0 {
            0.0
        } else {
            self.count(ball) as f64 / self.distinct as f64
        }
    }

    /// Counts for balls `1..=MAX_BALL` (index 0 is ball 1).
    pub fn counts(&self) -> [u32; MAX_BALL as usize] {
        let mut out = [0; MAX_BALL as usize];
        out.copy_from_slice(&self.counts[1..]);
        out
    }

    /// Number of draws currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Check if the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Check if the window is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.draws.len() >= self.capacity
    }

    /// Window size in draws.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the window.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.counts = [0; N_SLOTS];
        self.distinct = 0;
    }
}
