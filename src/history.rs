//! Synthetic draw history for headless runs.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::Rng;
use rand::seq::index;

use simulation::build_history;
use types::{BALLS_PER_DRAW, Ball, DrawRecord, MAX_BALL};

/// `len` uniform draws, one per day Monday to Saturday, starting at `start`.
pub fn synthesize<R: Rng + ?Sized>(
    len: usize,
    start: NaiveDate,
    rng: &mut R,
) -> simulation::Result<Vec<DrawRecord>> {
    let mut date = start;
    let mut rows = Vec::with_capacity(len);

    for seq in 1..=len as u64 {
        if date.weekday() == Weekday::Sun {
            date = date + Days::new(1);
        }
        let balls: Vec<Ball> = index::sample(rng, usize::from(MAX_BALL), BALLS_PER_DRAW)
            .into_iter()
            .map(|i| i as Ball + 1)
            .collect();
        rows.push((seq, date, balls));
        date = date + Days::new(1);
    }

    build_history(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_synthesize_skips_sundays() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(); // Saturday
        let history = synthesize(8, start, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(history.len(), 8);
        assert!(history.iter().all(|r| r.draw_date.weekday() != Weekday::Sun));
        assert_eq!(history[1].draw_date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(history[7].sequence_index, 8);
    }

    #[test]
    fn test_synthesize_is_seeded() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let a = synthesize(5, start, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = synthesize(5, start, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
