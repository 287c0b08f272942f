use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use elr_core::{assemble_batch, next_batch_time};
use elr_model::{Batch, BatchOperation, Element, Report, Schema, Topic};
use proptest::prelude::*;

const ZONES: &[Tz] = &[
    chrono_tz::UTC,
    chrono_tz::Etc::GMTPlus7,
    chrono_tz::Asia::Kolkata,
    chrono_tz::America::Phoenix,
];

fn report(schema: &Arc<Schema>, ids: &[&str]) -> Report {
    let rows: Vec<Vec<String>> = ids.iter().map(|id| vec![id.to_string()]).collect();
    Report::new(Arc::clone(schema), &rows, Vec::new()).unwrap()
}

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(
            "covid-19",
            Topic::new(Topic::COVID_19).unwrap(),
            vec![Element::new("message_id")],
        )
        .unwrap(),
    )
}

fn midnight_batch() -> Batch {
    Batch::new(1, NaiveTime::from_hms_opt(0, 0, 0).unwrap(), chrono_tz::UTC)
}

#[test]
fn merge_then_split() {
    let schema = schema();
    let pending = [
        report(&schema, &["1", "2"]),
        report(&schema, &["3"]),
        report(&schema, &["4", "5"]),
    ];
    let batch = midnight_batch()
        .with_operation(BatchOperation::Merge)
        .with_max_batch_size(2);

    let batches = assemble_batch(&pending, &batch).unwrap();
    let sizes: Vec<usize> = batches.iter().map(Report::item_count).collect();
    assert_eq!(sizes, [2, 2, 1]);
    let first = batches[0].column("message_id").unwrap().unwrap();
    assert_eq!(first, ["1", "2"]);
}

#[test]
fn without_merge_reports_stay_separate() {
    let schema = schema();
    let pending = [report(&schema, &["1", "2", "3"]), report(&schema, &["4"])];
    let batch = midnight_batch().with_max_batch_size(2);

    let sizes: Vec<usize> = assemble_batch(&pending, &batch)
        .unwrap()
        .iter()
        .map(Report::item_count)
        .collect();
    assert_eq!(sizes, [2, 1, 1]);
    assert!(assemble_batch(&[], &batch).unwrap().is_empty());
}

#[test]
fn spring_forward_counts_elapsed_seconds() {
    // New York skips 02:00-03:00 local on 2024-03-10.
    let zone = chrono_tz::America::New_York;
    let batch = Batch::new(4, NaiveTime::from_hms_opt(0, 0, 0).unwrap(), zone);
    let now = zone
        .with_ymd_and_hms(2024, 3, 10, 1, 0, 0)
        .unwrap()
        .with_timezone(&Utc);

    let next = next_batch_time(&batch, now, 10).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 10, 11, 0, 0).unwrap());
    assert_eq!(
        next.with_timezone(&zone).naive_local().to_string(),
        "2024-03-10 07:00:00"
    );
}

proptest! {
    #[test]
    fn next_batch_is_a_slot_after_the_minimum(
        seconds in 946_684_800i64..4_102_444_800,
        number_per_day in 1u32..=1440,
        initial_minute in 0u32..1440,
        min_duration in 1i64..200_000,
        zone in proptest::sample::select(ZONES),
    ) {
        let now = DateTime::<Utc>::from_timestamp(seconds, 0).unwrap();
        let initial = NaiveTime::from_hms_opt(initial_minute / 60, initial_minute % 60, 0).unwrap();
        let batch = Batch::new(number_per_day, initial, zone);

        let next = next_batch_time(&batch, now, min_duration).unwrap();
        let earliest = now + Duration::seconds(min_duration);
        prop_assert!(next >= earliest);
        prop_assert!(next - earliest <= Duration::seconds(86_400));
        prop_assert_eq!(next.nanosecond(), 0);

        let local = next.with_timezone(&zone);
        let since_initial = (i64::from(local.num_seconds_from_midnight())
            - i64::from(initial.num_seconds_from_midnight()))
            .rem_euclid(86_400);
        prop_assert_eq!(since_initial % i64::from(batch.period_seconds()), 0);
    }
}
