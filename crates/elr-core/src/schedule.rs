//! Batch slot computation and batch assembly.

use chrono::{DateTime, SubsecRound, TimeDelta, Timelike, Utc};
use elr_model::batch::MINUTES_PER_DAY;
use elr_model::{Batch, BatchOperation, ModelError, Report};
use tracing::debug;

use crate::error::ScheduleError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Earliest slot boundary of `batch` that is at least `min_duration_secs`
/// after `now`.
///
/// Slots fall `period` seconds apart starting at `initial_batch` local
/// time, `period` being `86400 / number_per_day`. The last slot of a day
/// is followed by the next day's `initial_batch` slot.
pub fn next_batch_time(
    batch: &Batch,
    now: DateTime<Utc>,
    min_duration_secs: i64,
) -> Result<DateTime<Utc>, ScheduleError> {
    if !(1..=MINUTES_PER_DAY).contains(&batch.number_per_day) {
        return Err(ScheduleError::SlotsPerDay {
            got: batch.number_per_day,
            max: MINUTES_PER_DAY,
        });
    }
    if min_duration_secs < 1 {
        return Err(ScheduleError::MinDuration(min_duration_secs));
    }

    let earliest = TimeDelta::try_seconds(min_duration_secs)
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(ScheduleError::OutOfRange {
            now,
            min_duration_secs,
        })?
        .with_timezone(&batch.time_zone);
    let seconds_of_day = i64::from(earliest.num_seconds_from_midnight());
    let initial = i64::from(batch.initial_batch.num_seconds_from_midnight());
    let period = i64::from(batch.period_seconds());
    let slots = i64::from(batch.number_per_day);

    let since_initial = (seconds_of_day - initial).rem_euclid(SECONDS_PER_DAY);
    let next_slot = since_initial / period + 1;
    let remaining = if next_slot >= slots {
        SECONDS_PER_DAY - since_initial
    } else {
        next_slot * period - since_initial
    };

    let next = TimeDelta::try_seconds(remaining)
        .and_then(|delta| earliest.checked_add_signed(delta))
        .ok_or(ScheduleError::OutOfRange {
            now,
            min_duration_secs,
        })?
        .trunc_subsecs(0)
        .with_timezone(&Utc);
    debug!(%now, %next, slots, "next batch time");
    Ok(next)
}

/// Groups the reports pending for one receiver into deliverable batches.
///
/// With [`BatchOperation::Merge`] every pending report is concatenated
/// into one; otherwise each stays separate. Reports larger than
/// `max_batch_size` are then split.
pub fn assemble_batch(reports: &[Report], batch: &Batch) -> Result<Vec<Report>, ModelError> {
    if reports.is_empty() {
        return Ok(Vec::new());
    }
    let grouped = match batch.operation {
        BatchOperation::Merge => vec![Report::merge(reports)?],
        BatchOperation::None => reports.to_vec(),
    };
    let mut assembled = Vec::with_capacity(grouped.len());
    for report in &grouped {
        assembled.extend(report.split(batch.max_batch_size)?);
    }
    Ok(assembled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use chrono_tz::America::Phoenix;

    fn four_a_day() -> Batch {
        Batch::new(4, NaiveTime::from_hms_opt(0, 0, 0).unwrap(), Phoenix)
    }

    #[test]
    fn next_slot_after_minimum_duration() {
        let now = Phoenix
            .with_ymd_and_hms(2024, 3, 1, 9, 15, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next = next_batch_time(&four_a_day(), now, 10).unwrap();
        assert_eq!(
            next.with_timezone(&Phoenix).naive_local().to_string(),
            "2024-03-01 12:00:00"
        );
    }

    #[test]
    fn boundary_is_never_reused() {
        let now = Phoenix
            .with_ymd_and_hms(2024, 3, 1, 11, 59, 50)
            .unwrap()
            .with_timezone(&Utc);
        let next = next_batch_time(&four_a_day(), now, 10).unwrap();
        assert_eq!(
            next.with_timezone(&Phoenix).naive_local().to_string(),
            "2024-03-01 18:00:00"
        );
    }

    #[test]
    fn wraps_to_next_day() {
        let batch = Batch::new(7, NaiveTime::from_hms_opt(1, 30, 0).unwrap(), Phoenix);
        let now = Phoenix
            .with_ymd_and_hms(2024, 3, 1, 23, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let next = next_batch_time(&batch, now, 1).unwrap();
        assert_eq!(
            next.with_timezone(&Phoenix).naive_local().to_string(),
            "2024-03-02 01:30:00"
        );
    }

    #[test]
    fn rejects_invalid_policy() {
        let now = Utc::now();
        let too_many = Batch::new(1441, NaiveTime::from_hms_opt(0, 0, 0).unwrap(), Phoenix);
        assert!(matches!(
            next_batch_time(&too_many, now, 10),
            Err(ScheduleError::SlotsPerDay { got: 1441, .. })
        ));
        assert!(matches!(
            next_batch_time(&four_a_day(), now, 0),
            Err(ScheduleError::MinDuration(0))
        ));
    }

    #[test]
    fn minimum_past_the_calendar_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        for min_duration_secs in [400_000_000_000_000, i64::MAX] {
            assert!(matches!(
                next_batch_time(&four_a_day(), now, min_duration_secs),
                Err(ScheduleError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn slot_just_before_the_last_representable_day() {
        let now = DateTime::<Utc>::MAX_UTC - TimeDelta::hours(1);
        assert!(matches!(
            next_batch_time(&four_a_day(), now, 10),
            Err(ScheduleError::OutOfRange { .. })
        ));
    }
}
