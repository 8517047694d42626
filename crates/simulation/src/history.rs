//! Validated ingestion of raw history rows.

use chrono::NaiveDate;

use types::{Ball, DrawRecord, SequenceIndex};

use crate::error::{ContractViolation, Result, SimulationError};

/// Build a history from raw `(sequence index, date, balls)` rows.
///
/// The first malformed row aborts ingestion with
/// [`ContractViolation::InvalidRecord`].
pub fn build_history<I, B>(rows: I) -> Result<Vec<DrawRecord>>
where
    I: IntoIterator<Item = (SequenceIndex, NaiveDate, B)>,
    B: AsRef<[Ball]>,
{
    rows.into_iter()
        .enumerate()
        .map(|(position, (seq, date, balls))| {
            DrawRecord::new(seq, date, balls.as_ref())
                .map_err(|source| {
                    SimulationError::from(ContractViolation::InvalidRecord { position, source })
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::DrawError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_valid_rows() {
        let balls: Vec<Ball> = (1..=15).collect();
        let history = build_history(vec![(1, day(1), balls.clone()), (2, day(4), balls)]).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sequence_index, 2);
    }

    #[test]
    fn test_reports_first_bad_row() {
        let good: Vec<Ball> = (1..=15).collect();
        let mut dup = good.clone();
        dup[14] = 1;

        let err = build_history(vec![(1, day(1), good), (2, day(4), dup)]).unwrap_err();
        assert_eq!(
            err,
            SimulationError::Contract(ContractViolation::InvalidRecord {
                position: 1,
                source: DrawError::DuplicateBall(1),
            })
        );
    }

    #[test]
    fn test_out_of_range_ball() {
        let mut balls: Vec<Ball> = (1..=15).collect();
        balls[0] = 26;
        let err = build_history([(9, day(2), balls)]).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Contract(ContractViolation::InvalidRecord { position: 0, .. })
        ));
    }
}
